//! Marker and segment records.

use serde::{Deserialize, Serialize};
use splitforge_core::{MarkerId, SegmentId};

/// A point on the timeline where the partition is split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitMarker {
    pub id: MarkerId,
    /// Position in seconds.
    pub time: f64,
}

impl SplitMarker {
    /// Create a marker with a fresh id.
    pub fn new(time: f64) -> Self {
        Self {
            id: MarkerId::new(),
            time,
        }
    }
}

/// One contiguous, named, selectable interval of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub name: String,
    /// Inclusive start, in seconds.
    pub start_time: f64,
    /// End, in seconds. Always greater than `start_time`.
    pub end_time: f64,
    /// Whether the segment is part of the export scope.
    pub selected: bool,
}

impl Segment {
    /// Create a selected segment with a fresh id and the default name for
    /// position `index`.
    pub fn new(index: usize, start_time: f64, end_time: f64) -> Self {
        Self {
            id: SegmentId::new(),
            name: default_segment_name(index),
            start_time,
            end_time,
            selected: true,
        }
    }

    /// Length of the segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether `time` falls inside `[start_time, end_time)`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}

/// Positional default name: `"Segment 1"` for index 0.
pub fn default_segment_name(index: usize) -> String {
    format!("Segment {}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_are_one_based() {
        assert_eq!(default_segment_name(0), "Segment 1");
        assert_eq!(default_segment_name(9), "Segment 10");
    }

    #[test]
    fn new_segment_is_selected_with_default_name() {
        let seg = Segment::new(2, 10.0, 12.5);
        assert_eq!(seg.name, "Segment 3");
        assert!(seg.selected);
        assert_eq!(seg.duration(), 2.5);
    }

    #[test]
    fn contains_is_half_open() {
        let seg = Segment::new(0, 0.0, 30.0);
        assert!(seg.contains(0.0));
        assert!(seg.contains(29.999));
        assert!(!seg.contains(30.0));
    }

    #[test]
    fn segment_serializes_with_snake_case_fields() {
        let seg = Segment::new(0, 0.0, 30.0);
        let json = serde_json::to_value(&seg).unwrap();
        assert_eq!(json["start_time"], 0.0);
        assert_eq!(json["end_time"], 30.0);
        assert_eq!(json["selected"], true);
    }
}
