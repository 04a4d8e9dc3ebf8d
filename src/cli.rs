use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "splitforge")]
#[command(author, version, about = "Split a video into named segments and export them losslessly")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a media file, restoring its cached session if there is one
    Open {
        /// Media file to open
        #[arg(required = true)]
        file: PathBuf,

        /// Ignore any cached session and start with a single segment
        #[arg(long)]
        fresh: bool,
    },

    /// Show the markers and segments of the current session
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a split marker
    Mark {
        /// Time in seconds, or [hh:]mm:ss[.fff]
        #[arg(value_parser = parse_time)]
        time: f64,
    },

    /// Move a split marker
    MoveMarker {
        /// Marker id
        #[arg(required_unless_present = "at", conflicts_with = "at")]
        id: Option<String>,

        /// Select the marker nearest this time instead of by id
        #[arg(long, value_parser = parse_time)]
        at: Option<f64>,

        /// New time
        #[arg(long, value_parser = parse_time)]
        to: f64,
    },

    /// Remove a split marker, merging the segments on either side
    Unmark {
        /// Marker id
        #[arg(required_unless_present = "at", conflicts_with = "at")]
        id: Option<String>,

        /// Select the marker nearest this time instead of by id
        #[arg(long, value_parser = parse_time)]
        at: Option<f64>,
    },

    /// Rename a segment (an empty name restores the default)
    Rename {
        /// Segment position (1-based), @time inside it, or id
        segment: String,

        /// New name
        name: String,
    },

    /// Toggle whether a segment is included in exports
    Toggle {
        /// Segment position (1-based), @time inside it, or id
        segment: String,
    },

    /// Delete a segment, letting its neighbour absorb its span
    RemoveSegment {
        /// Segment position (1-based), @time inside it, or id
        segment: String,
    },

    /// Move the start and end of a segment
    SetBounds {
        /// Segment position (1-based), @time inside it, or id
        segment: String,

        #[arg(value_parser = parse_time)]
        start: f64,

        #[arg(value_parser = parse_time)]
        end: f64,
    },

    /// Losslessly cut one segment of the source into its own file
    Cut {
        /// The source file the session was opened with
        #[arg(required = true)]
        source: PathBuf,

        /// Segment position (1-based), @time inside it, or id
        segment: String,

        /// Output file (defaults to the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export all selected segments
    Export {
        /// The source file the session was opened with
        #[arg(required = true)]
        source: PathBuf,

        /// Join the selected segments into a single file
        #[arg(long)]
        merge: bool,
    },

    /// Forget the current session
    Clear,

    /// Check that required external tools are available
    CheckTools,

    /// Write a default configuration file
    InitConfig {
        /// Where to write it
        #[arg(default_value = "./splitforge.toml")]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display version information
    Version,
}

/// Parse `75.5`, `01:15.5` or `1:01:15.5` into seconds.
pub fn parse_time(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return Err(format!("invalid time '{s}': expected [hh:]mm:ss or seconds"));
    }

    let mut seconds = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let value: f64 = part
            .parse()
            .map_err(|_| format!("invalid time '{s}': '{part}' is not a number"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("invalid time '{s}'"));
        }
        let is_last = i == parts.len() - 1;
        if !is_last && value.fract() != 0.0 {
            return Err(format!("invalid time '{s}': only the seconds may be fractional"));
        }
        if i > 0 && value >= 60.0 {
            return Err(format!("invalid time '{s}': '{part}' must be below 60"));
        }
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}

/// Format seconds as `hh:mm:ss.fff`.
pub fn format_time(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round() as u64;
    let (h, rem) = (millis / 3_600_000, millis % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    let (s, ms) = (rem / 1000, rem % 1000);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}
