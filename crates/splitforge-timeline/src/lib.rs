//! splitforge-timeline: the split-marker and segment model of one media
//! timeline.
//!
//! A timeline of known duration is partitioned into contiguous segments by a
//! sorted set of split markers. Every edit is a pure function from one
//! [`Timeline`] to the next, returning a [`Rejection`] instead when the edit
//! would break the partition.
//!
//! # Examples
//!
//! ```
//! use splitforge_timeline::{Rejection, Timeline};
//!
//! let t = Timeline::new(100.0).add_marker(30.0).unwrap();
//! let t = t.add_marker(70.0).unwrap();
//! assert_eq!(t.segments().len(), 3);
//!
//! // Too close to the marker at 30s.
//! assert!(matches!(
//!     t.add_marker(30.05),
//!     Err(Rejection::TooCloseToMarker { .. })
//! ));
//!
//! let middle = t.segments()[1].id;
//! let t = t.delete_segment(middle).unwrap();
//! assert_eq!(t.segments().len(), 2);
//! ```

pub mod markers;
pub mod partition;
pub mod segments;
pub mod timeline;
pub mod tolerance;
pub mod types;

pub use partition::{build, derive_markers, valid_markers};
pub use timeline::{InvariantViolation, Rejection, Timeline, Transition};
pub use tolerance::{within, BOUNDARY_EPSILON, MARKER_EPSILON};
pub use types::{default_segment_name, Segment, SplitMarker};
