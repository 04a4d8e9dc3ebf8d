//! Segment operations.
//!
//! Renaming and toggling edit one segment in place. Deleting a segment goes
//! through the marker set and rebuilds. Editing a segment's boundaries is the
//! one operation that treats the segments as authoritative: it moves the
//! neighbouring edges in place and re-derives the markers afterwards.

use splitforge_core::SegmentId;

use crate::timeline::{Rejection, Timeline, Transition};
use crate::tolerance::{within, BOUNDARY_EPSILON, MARKER_EPSILON};
use crate::types::default_segment_name;

impl Timeline {
    /// Rename segment `id`. A blank name restores the positional default.
    pub fn rename_segment(&self, id: SegmentId, name: &str) -> Transition {
        let index = self
            .segment_index(id)
            .ok_or(Rejection::SegmentNotFound(id))?;

        let name = name.trim();
        let name = if name.is_empty() {
            default_segment_name(index)
        } else {
            name.to_string()
        };

        let mut segments = self.segments().to_vec();
        segments[index].name = name;
        Ok(self.with_segments(segments))
    }

    /// Flip whether segment `id` is part of the export scope.
    pub fn toggle_segment_selected(&self, id: SegmentId) -> Transition {
        let index = self
            .segment_index(id)
            .ok_or(Rejection::SegmentNotFound(id))?;

        let mut segments = self.segments().to_vec();
        segments[index].selected = !segments[index].selected;
        Ok(self.with_segments(segments))
    }

    /// Delete segment `id`, letting a neighbour absorb its span.
    ///
    /// The marker at the segment's start is removed when the segment does not
    /// start the timeline, so the previous segment grows over it. The first
    /// segment instead loses the marker at its end and merges into the next
    /// one. Either way the partition shrinks by exactly one segment.
    pub fn delete_segment(&self, id: SegmentId) -> Transition {
        if self.segments().len() == 1 {
            return Err(Rejection::LastSegment);
        }
        let segment = self.segment(id).ok_or(Rejection::SegmentNotFound(id))?;

        let boundary = if segment.start_time > 0.0 {
            segment.start_time
        } else if segment.end_time < self.duration() {
            segment.end_time
        } else {
            return Err(Rejection::LastSegment);
        };

        let markers = self
            .markers()
            .iter()
            .filter(|m| !within(m.time, boundary, BOUNDARY_EPSILON))
            .copied()
            .collect();
        tracing::debug!(%id, boundary, "segment deleted");
        Ok(self.rebuilt(markers))
    }

    /// Move the bounds of segment `id` to `new_start..new_end`.
    ///
    /// The segment may only shrink into its own span: the previous segment's
    /// end follows `new_start` and the next segment's start follows
    /// `new_end`. The first segment stays anchored at 0 and the last at the
    /// duration; requests within [`BOUNDARY_EPSILON`] of those edges snap to
    /// them. Markers are re-derived from the resulting boundaries.
    pub fn update_segment_time(&self, id: SegmentId, new_start: f64, new_end: f64) -> Transition {
        self.require_loaded()?;
        if !(new_start >= 0.0 && new_end <= self.duration() && new_start < new_end) {
            return Err(Rejection::InvalidRange {
                start: new_start,
                end: new_end,
            });
        }

        let index = self
            .segment_index(id)
            .ok_or(Rejection::SegmentNotFound(id))?;
        let segments = self.segments();
        let prev = index.checked_sub(1).map(|i| &segments[i]);
        let next = segments.get(index + 1);

        let mut start = new_start;
        let mut end = new_end;

        match prev {
            Some(prev) if start < prev.end_time => {
                return Err(Rejection::NeighborConflict {
                    boundary: prev.end_time,
                });
            }
            Some(_) => {}
            None if start > BOUNDARY_EPSILON => {
                return Err(Rejection::OuterBoundary { time: start });
            }
            None => start = 0.0,
        }

        match next {
            Some(next) if end > next.start_time => {
                return Err(Rejection::NeighborConflict {
                    boundary: next.start_time,
                });
            }
            Some(_) => {}
            None if end < self.duration() - BOUNDARY_EPSILON => {
                return Err(Rejection::OuterBoundary { time: end });
            }
            None => end = self.duration(),
        }

        if prev.is_some() && next.is_some() && end - start < MARKER_EPSILON {
            return Err(Rejection::TooShort { start, end });
        }

        let mut edited = segments.to_vec();
        edited[index].start_time = start;
        edited[index].end_time = end;
        if prev.is_some() {
            edited[index - 1].end_time = start;
        }
        if next.is_some() {
            edited[index + 1].start_time = end;
        }

        tracing::debug!(%id, start, end, "segment bounds updated");
        Ok(self.resynced(edited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SplitMarker;

    fn timeline(duration: f64, times: &[f64]) -> Timeline {
        Timeline::from_markers(duration, times.iter().map(|&t| SplitMarker::new(t)).collect())
    }

    fn spans(t: &Timeline) -> Vec<(f64, f64)> {
        t.segments()
            .iter()
            .map(|s| (s.start_time, s.end_time))
            .collect()
    }

    #[test]
    fn rename_keeps_id_and_geometry() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let id = t.segments()[1].id;
        let renamed = t.rename_segment(id, "Chorus").unwrap();
        assert_eq!(renamed.segment(id).unwrap().name, "Chorus");
        assert_eq!(spans(&renamed), spans(&t));
        assert_eq!(renamed.markers(), t.markers());
    }

    #[test]
    fn rename_blank_restores_default() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let id = t.segments()[2].id;
        let renamed = t.rename_segment(id, "Outro").unwrap();
        let reset = renamed.rename_segment(id, "   ").unwrap();
        assert_eq!(reset.segment(id).unwrap().name, "Segment 3");
    }

    #[test]
    fn rename_unknown_is_rejected() {
        let unknown = SegmentId::new();
        assert_eq!(
            Timeline::new(10.0).rename_segment(unknown, "x"),
            Err(Rejection::SegmentNotFound(unknown))
        );
    }

    #[test]
    fn toggle_flips_only_that_segment() {
        let t = timeline(100.0, &[50.0]);
        let id = t.segments()[0].id;
        let toggled = t.toggle_segment_selected(id).unwrap();
        assert!(!toggled.segment(id).unwrap().selected);
        assert!(toggled.segments()[1].selected);
        let back = toggled.toggle_segment_selected(id).unwrap();
        assert!(back.segment(id).unwrap().selected);
    }

    #[test]
    fn delete_first_segment_merges_into_next() {
        let t = timeline(100.0, &[70.0]);
        let merged = t.delete_segment(t.segments()[0].id).unwrap();
        assert_eq!(spans(&merged), vec![(0.0, 100.0)]);
        assert!(merged.markers().is_empty());
    }

    #[test]
    fn delete_last_segment_merges_into_previous() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let merged = t.delete_segment(t.segments()[2].id).unwrap();
        assert_eq!(spans(&merged), vec![(0.0, 30.0), (30.0, 100.0)]);
    }

    #[test]
    fn delete_middle_segment_removes_one_segment() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let merged = t.delete_segment(t.segments()[1].id).unwrap();
        assert_eq!(spans(&merged), vec![(0.0, 70.0), (70.0, 100.0)]);
    }

    #[test]
    fn delete_only_segment_is_rejected() {
        let t = Timeline::new(10.0);
        assert_eq!(
            t.delete_segment(t.segments()[0].id),
            Err(Rejection::LastSegment)
        );
    }

    #[test]
    fn delete_unknown_segment_is_rejected() {
        let unknown = SegmentId::new();
        assert_eq!(
            timeline(10.0, &[5.0]).delete_segment(unknown),
            Err(Rejection::SegmentNotFound(unknown))
        );
    }

    #[test]
    fn shrink_middle_segment_grows_neighbours() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let middle = t.segments()[1].clone();
        let edited = t.update_segment_time(middle.id, 40.0, 60.0).unwrap();
        assert_eq!(spans(&edited), vec![(0.0, 40.0), (40.0, 60.0), (60.0, 100.0)]);
        assert_eq!(edited.marker_times(), vec![40.0, 60.0]);
        assert_eq!(edited.segment(middle.id).unwrap().name, middle.name);
        assert_eq!(edited.segments()[0].id, t.segments()[0].id);
    }

    #[test]
    fn edit_keeps_renamed_neighbours() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let first = t.segments()[0].id;
        let t = t.rename_segment(first, "Intro").unwrap();
        let edited = t
            .update_segment_time(t.segments()[1].id, 35.0, 70.0)
            .unwrap();
        assert_eq!(edited.segment(first).unwrap().name, "Intro");
        assert_eq!(edited.segment(first).unwrap().end_time, 35.0);
    }

    #[test]
    fn edit_invading_previous_is_rejected() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let middle = t.segments()[1].id;
        assert_eq!(
            t.update_segment_time(middle, 20.0, 70.0),
            Err(Rejection::NeighborConflict { boundary: 30.0 })
        );
    }

    #[test]
    fn edit_invading_next_is_rejected() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let middle = t.segments()[1].id;
        assert_eq!(
            t.update_segment_time(middle, 30.0, 80.0),
            Err(Rejection::NeighborConflict { boundary: 70.0 })
        );
    }

    #[test]
    fn edit_with_bad_range_is_rejected() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let id = t.segments()[1].id;
        for (start, end) in [(-1.0, 50.0), (40.0, 101.0), (50.0, 50.0), (60.0, 40.0)] {
            assert!(matches!(
                t.update_segment_time(id, start, end),
                Err(Rejection::InvalidRange { .. })
            ));
        }
    }

    #[test]
    fn first_segment_stays_anchored_at_zero() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let first = t.segments()[0].id;
        assert_eq!(
            t.update_segment_time(first, 5.0, 30.0),
            Err(Rejection::OuterBoundary { time: 5.0 })
        );
        let snapped = t.update_segment_time(first, 0.005, 20.0).unwrap();
        assert_eq!(spans(&snapped), vec![(0.0, 20.0), (20.0, 70.0), (70.0, 100.0)]);
    }

    #[test]
    fn last_segment_stays_anchored_at_duration() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let last = t.segments()[2].id;
        assert_eq!(
            t.update_segment_time(last, 80.0, 90.0),
            Err(Rejection::OuterBoundary { time: 90.0 })
        );
        let edited = t.update_segment_time(last, 80.0, 100.0).unwrap();
        assert_eq!(edited.marker_times(), vec![30.0, 80.0]);
    }

    #[test]
    fn edit_leaving_sliver_is_rejected() {
        let t = timeline(100.0, &[30.0, 70.0]);
        let middle = t.segments()[1].id;
        assert!(matches!(
            t.update_segment_time(middle, 50.0, 50.05),
            Err(Rejection::TooShort { .. })
        ));
    }

    #[test]
    fn edit_unknown_segment_is_rejected() {
        let unknown = SegmentId::new();
        assert_eq!(
            timeline(100.0, &[50.0]).update_segment_time(unknown, 0.0, 50.0),
            Err(Rejection::SegmentNotFound(unknown))
        );
    }
}
