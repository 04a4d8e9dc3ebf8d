//! Partition builder: markers + duration → gapless segment list.
//!
//! This is the only place segments are created from scratch. Every rebuild
//! hands out fresh ids, positional default names and `selected = true`.

use crate::types::{Segment, SplitMarker};

/// Return the markers strictly inside `(0, duration)`, sorted by time.
pub fn valid_markers(markers: &[SplitMarker], duration: f64) -> Vec<SplitMarker> {
    let mut valid: Vec<SplitMarker> = markers
        .iter()
        .filter(|m| m.time > 0.0 && m.time < duration)
        .copied()
        .collect();
    valid.sort_by(|a, b| a.time.total_cmp(&b.time));
    valid
}

/// Build the segment partition of `[0, duration]` split at `markers`.
///
/// Markers at or beyond the bounds are dropped. Boundaries are not
/// de-duplicated: callers keep markers at least
/// [`MARKER_EPSILON`](crate::tolerance::MARKER_EPSILON) apart.
///
/// ```
/// use splitforge_timeline::{build, SplitMarker};
///
/// let segments = build(&[SplitMarker::new(70.0), SplitMarker::new(30.0)], 100.0);
/// let bounds: Vec<_> = segments.iter().map(|s| (s.start_time, s.end_time)).collect();
/// assert_eq!(bounds, vec![(0.0, 30.0), (30.0, 70.0), (70.0, 100.0)]);
/// ```
pub fn build(markers: &[SplitMarker], duration: f64) -> Vec<Segment> {
    if duration <= 0.0 {
        return Vec::new();
    }

    let boundaries: Vec<f64> = std::iter::once(0.0)
        .chain(valid_markers(markers, duration).into_iter().map(|m| m.time))
        .chain(std::iter::once(duration))
        .collect();

    boundaries
        .windows(2)
        .enumerate()
        .map(|(index, pair)| Segment::new(index, pair[0], pair[1]))
        .collect()
}

/// Derive one fresh marker per internal boundary of `segments`.
///
/// The first segment's start and the last segment's end are never markers.
pub fn derive_markers(segments: &[Segment]) -> Vec<SplitMarker> {
    segments
        .windows(2)
        .map(|pair| SplitMarker::new(pair[0].end_time))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(times: &[f64]) -> Vec<SplitMarker> {
        times.iter().map(|&t| SplitMarker::new(t)).collect()
    }

    fn spans(segments: &[Segment]) -> Vec<(f64, f64)> {
        segments.iter().map(|s| (s.start_time, s.end_time)).collect()
    }

    #[test]
    fn non_positive_duration_is_empty() {
        assert!(build(&markers(&[1.0]), 0.0).is_empty());
        assert!(build(&[], -5.0).is_empty());
    }

    #[test]
    fn no_markers_gives_one_segment() {
        let segs = build(&[], 42.0);
        assert_eq!(spans(&segs), vec![(0.0, 42.0)]);
        assert_eq!(segs[0].name, "Segment 1");
    }

    #[test]
    fn builds_three_segments_from_two_markers() {
        let segs = build(&markers(&[30.0, 70.0]), 100.0);
        assert_eq!(spans(&segs), vec![(0.0, 30.0), (30.0, 70.0), (70.0, 100.0)]);
        let names: Vec<&str> = segs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Segment 1", "Segment 2", "Segment 3"]);
        assert!(segs.iter().all(|s| s.selected));
    }

    #[test]
    fn unsorted_markers_are_sorted() {
        let segs = build(&markers(&[70.0, 10.0, 30.0]), 100.0);
        assert_eq!(
            spans(&segs),
            vec![(0.0, 10.0), (10.0, 30.0), (30.0, 70.0), (70.0, 100.0)]
        );
    }

    #[test]
    fn out_of_range_markers_are_dropped() {
        let segs = build(&markers(&[0.0, -3.0, 50.0, 100.0, 120.0]), 100.0);
        assert_eq!(spans(&segs), vec![(0.0, 50.0), (50.0, 100.0)]);
    }

    #[test]
    fn rebuild_hands_out_fresh_ids() {
        let m = markers(&[50.0]);
        let a = build(&m, 100.0);
        let b = build(&m, 100.0);
        assert_ne!(a[0].id, b[0].id);
        assert_eq!(spans(&a), spans(&b));
    }

    #[test]
    fn derive_markers_skips_outer_bounds() {
        let segs = build(&markers(&[30.0, 70.0]), 100.0);
        let derived: Vec<f64> = derive_markers(&segs).iter().map(|m| m.time).collect();
        assert_eq!(derived, vec![30.0, 70.0]);
        assert!(derive_markers(&build(&[], 10.0)).is_empty());
    }

    #[test]
    fn round_trip_reproduces_boundaries() {
        for times in [vec![], vec![12.5], vec![1.0, 2.0, 3.0, 99.0]] {
            let first = build(&markers(&times), 100.0);
            let second = build(&derive_markers(&first), 100.0);
            assert_eq!(spans(&first), spans(&second));
        }
    }

    #[test]
    fn valid_markers_filters_and_sorts() {
        let valid = valid_markers(&markers(&[5.0, 0.0, 2.0, 10.0]), 10.0);
        let times: Vec<f64> = valid.iter().map(|m| m.time).collect();
        assert_eq!(times, vec![2.0, 5.0]);
    }
}
