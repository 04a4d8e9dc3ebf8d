//! splitforge-core: shared error type and typed identifiers.
//!
//! This crate is the foundational dependency for the other splitforge
//! crates, providing type-safe identifiers for markers and segments and a
//! unified error type.
//!
//! # Examples
//!
//! ```
//! use splitforge_core::{Error, MarkerId, Result, SegmentId};
//!
//! let marker = MarkerId::new();
//! let segment = SegmentId::new();
//! assert_ne!(marker.to_string(), segment.to_string());
//!
//! let example = || -> Result<()> {
//!     Err(Error::not_found("segment", segment))
//! };
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::*;
