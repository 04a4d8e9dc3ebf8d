//! splitforge - mark split points on a media timeline and export the
//! resulting segments losslessly.
//!
//! This library crate wires the timeline model to configuration, the
//! session cache and the export tools. The `splitforge` binary is a thin
//! CLI over it.

pub mod cache;
pub mod config;
pub mod export;
pub mod store;
