//! The timeline state value.
//!
//! A [`Timeline`] is immutable from the outside. Every edit is a method that
//! borrows the current value and returns a [`Transition`]: either the next
//! value, or a [`Rejection`] explaining why the edit was refused. Rejections
//! are ordinary outcomes, not errors; the caller decides whether to surface
//! them.

use std::fmt;

use serde::Serialize;
use splitforge_core::{MarkerId, SegmentId};

use crate::partition;
use crate::tolerance::{within, BOUNDARY_EPSILON, MARKER_EPSILON};
use crate::types::{Segment, SplitMarker};

/// Outcome of a timeline edit.
pub type Transition = std::result::Result<Timeline, Rejection>;

/// Why an edit was refused. The timeline it was applied to is unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// No source is loaded (duration is zero).
    NoTimeline,
    /// The time lies at or outside the open interval `(0, duration)`.
    OutOfRange { time: f64 },
    /// The time lies within [`MARKER_EPSILON`] of an existing marker.
    TooCloseToMarker { time: f64, existing: f64 },
    /// No marker has this id.
    MarkerNotFound(MarkerId),
    /// No segment has this id.
    SegmentNotFound(SegmentId),
    /// The partition must keep at least one segment.
    LastSegment,
    /// The requested range is empty, reversed or outside `[0, duration]`.
    InvalidRange { start: f64, end: f64 },
    /// The requested range would invade a neighbouring segment.
    NeighborConflict { boundary: f64 },
    /// The first segment must start at 0 and the last must end at the duration.
    OuterBoundary { time: f64 },
    /// The edit would leave a segment shorter than [`MARKER_EPSILON`].
    TooShort { start: f64, end: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoTimeline => write!(f, "no media duration is set"),
            Rejection::OutOfRange { time } => {
                write!(f, "{time:.3}s is outside the timeline")
            }
            Rejection::TooCloseToMarker { time, existing } => write!(
                f,
                "{time:.3}s is within {MARKER_EPSILON}s of the marker at {existing:.3}s"
            ),
            Rejection::MarkerNotFound(id) => write!(f, "marker not found: {id}"),
            Rejection::SegmentNotFound(id) => write!(f, "segment not found: {id}"),
            Rejection::LastSegment => write!(f, "cannot delete the only segment"),
            Rejection::InvalidRange { start, end } => {
                write!(f, "invalid range {start:.3}s..{end:.3}s")
            }
            Rejection::NeighborConflict { boundary } => write!(
                f,
                "range overlaps the neighbouring segment at {boundary:.3}s"
            ),
            Rejection::OuterBoundary { time } => write!(
                f,
                "the outer edge of the timeline cannot move (requested {time:.3}s)"
            ),
            Rejection::TooShort { start, end } => write!(
                f,
                "segment {start:.3}s..{end:.3}s would be shorter than {MARKER_EPSILON}s"
            ),
        }
    }
}

/// A broken invariant found by [`Timeline::check_invariants`].
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation(pub String);

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantViolation {}

/// Markers, segments and the duration they partition.
///
/// Invariants, checked by [`Timeline::check_invariants`]:
/// 1. markers are sorted, lie in `(0, duration)` and are at least
///    [`MARKER_EPSILON`] apart;
/// 2. segments cover `[0, duration]` without gaps or overlaps;
/// 3. there is exactly one more segment than markers;
/// 4. every segment has positive length.
///
/// A timeline with a non-positive duration is unloaded and has neither
/// markers nor segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    duration: f64,
    markers: Vec<SplitMarker>,
    segments: Vec<Segment>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::empty()
    }
}

impl Timeline {
    /// An unloaded timeline.
    pub fn empty() -> Self {
        Self {
            duration: 0.0,
            markers: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// A fresh timeline for a source of `duration` seconds: no markers and a
    /// single segment spanning everything.
    pub fn new(duration: f64) -> Self {
        Self::from_markers(duration, Vec::new())
    }

    /// Rebuild the partition from `markers`, keeping only the valid ones.
    pub fn from_markers(duration: f64, markers: Vec<SplitMarker>) -> Self {
        if duration <= 0.0 {
            return Self::empty();
        }
        let markers = partition::valid_markers(&markers, duration);
        let segments = partition::build(&markers, duration);
        Self {
            duration,
            markers,
            segments,
        }
    }

    /// Reassemble a timeline from stored parts, refusing inconsistent data.
    pub fn from_parts(
        duration: f64,
        markers: Vec<SplitMarker>,
        segments: Vec<Segment>,
    ) -> Result<Self, InvariantViolation> {
        let timeline = Self {
            duration,
            markers,
            segments,
        };
        timeline.check_invariants()?;
        Ok(timeline)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Markers, sorted by time.
    pub fn markers(&self) -> &[SplitMarker] {
        &self.markers
    }

    /// Segments, sorted by start time.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether a source duration has been set.
    pub fn is_loaded(&self) -> bool {
        self.duration > 0.0
    }

    pub fn marker_times(&self) -> Vec<f64> {
        self.markers.iter().map(|m| m.time).collect()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&SplitMarker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// The marker closest to `time`, if one lies within `epsilon`.
    pub fn marker_near(&self, time: f64, epsilon: f64) -> Option<&SplitMarker> {
        self.markers
            .iter()
            .filter(|m| within(m.time, time, epsilon))
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn segment_index(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    /// The segment covering `time`. The timeline's end belongs to the last
    /// segment.
    pub fn segment_at(&self, time: f64) -> Option<&Segment> {
        if time == self.duration {
            return self.segments.last();
        }
        self.segments.iter().find(|s| s.contains(time))
    }

    pub fn selected_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.selected)
    }

    /// Verify the partition invariants, returning the first violation.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let fail = |msg: String| Err(InvariantViolation(msg));

        if self.duration <= 0.0 {
            if self.markers.is_empty() && self.segments.is_empty() {
                return Ok(());
            }
            return fail("unloaded timeline holds markers or segments".into());
        }

        for pair in self.markers.windows(2) {
            if pair[1].time - pair[0].time < MARKER_EPSILON {
                return fail(format!(
                    "markers at {} and {} are closer than {MARKER_EPSILON}s or unsorted",
                    pair[0].time, pair[1].time
                ));
            }
        }
        if let Some(m) = self
            .markers
            .iter()
            .find(|m| m.time <= 0.0 || m.time >= self.duration)
        {
            return fail(format!("marker at {} is outside the timeline", m.time));
        }

        if self.segments.len() != self.markers.len() + 1 {
            return fail(format!(
                "{} segments for {} markers",
                self.segments.len(),
                self.markers.len()
            ));
        }

        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return fail("loaded timeline has no segments".into());
        };
        if first.start_time != 0.0 {
            return fail(format!("first segment starts at {}", first.start_time));
        }
        if last.end_time != self.duration {
            return fail(format!(
                "last segment ends at {} instead of {}",
                last.end_time, self.duration
            ));
        }
        for (index, seg) in self.segments.iter().enumerate() {
            if seg.end_time <= seg.start_time {
                return fail(format!("segment {} has non-positive length", index + 1));
            }
        }
        for (pair, marker) in self.segments.windows(2).zip(&self.markers) {
            if pair[0].end_time != pair[1].start_time {
                return fail(format!(
                    "gap or overlap between {} and {}",
                    pair[0].end_time, pair[1].start_time
                ));
            }
            if !within(pair[0].end_time, marker.time, BOUNDARY_EPSILON) {
                return fail(format!(
                    "boundary {} has no marker (nearest {})",
                    pair[0].end_time, marker.time
                ));
            }
        }

        Ok(())
    }

    /// Replace the marker set and rebuild every segment.
    pub(crate) fn rebuilt(&self, markers: Vec<SplitMarker>) -> Timeline {
        let next = Timeline::from_markers(self.duration, markers);
        next.debug_check();
        next
    }

    /// Keep the given segment geometry and re-derive the markers from it.
    pub(crate) fn resynced(&self, segments: Vec<Segment>) -> Timeline {
        let next = Timeline {
            duration: self.duration,
            markers: partition::derive_markers(&segments),
            segments,
        };
        next.debug_check();
        next
    }

    /// Keep markers and geometry, swap in edited segment attributes.
    pub(crate) fn with_segments(&self, segments: Vec<Segment>) -> Timeline {
        Timeline {
            duration: self.duration,
            markers: self.markers.clone(),
            segments,
        }
    }

    pub(crate) fn require_loaded(&self) -> Result<(), Rejection> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(Rejection::NoTimeline)
        }
    }

    fn debug_check(&self) {
        let checked = self.check_invariants();
        debug_assert!(checked.is_ok(), "timeline invariant broken: {checked:?}");
        if let Err(violation) = checked {
            tracing::error!("timeline invariant broken: {violation}");
        }
    }
}
