//! Parser for `ffmpeg -progress pipe:2` output.
//!
//! ffmpeg writes blocks of `key=value` lines, each closed by
//! `progress=continue` or, for the last one, `progress=end`.

use serde::Serialize;

/// Export progress in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportProgress {
    /// 0.0..=100.0
    pub percent: f64,
    /// ffmpeg's processing speed, e.g. `"41.2x"`.
    pub speed: Option<String>,
}

impl ExportProgress {
    /// Map this progress into the `[from, to]` slice of a larger operation.
    pub fn scaled(&self, from: f64, to: f64) -> ExportProgress {
        ExportProgress {
            percent: from + (to - from) * self.percent / 100.0,
            speed: self.speed.clone(),
        }
    }
}

/// Accumulates one progress block at a time.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    /// Expected output duration in seconds.
    duration: f64,
    out_time_us: Option<i64>,
    speed: Option<String>,
}

impl ProgressParser {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            out_time_us: None,
            speed: None,
        }
    }

    /// Feed one stderr line. Returns a report when the line closes a block.
    pub fn feed(&mut self, line: &str) -> Option<ExportProgress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();
        match key {
            "out_time_us" => {
                self.out_time_us = value.parse().ok();
                None
            }
            "speed" => {
                if value != "N/A" {
                    self.speed = Some(value.to_string());
                }
                None
            }
            "progress" if value == "end" => Some(self.report(100.0)),
            "progress" => {
                let us = self.out_time_us?;
                if self.duration <= 0.0 {
                    return None;
                }
                let percent = (us as f64 / 1_000_000.0 / self.duration * 100.0).clamp(0.0, 100.0);
                Some(self.report(percent))
            }
            _ => None,
        }
    }

    fn report(&self, percent: f64) -> ExportProgress {
        ExportProgress {
            percent,
            speed: self.speed.clone(),
        }
    }
}
