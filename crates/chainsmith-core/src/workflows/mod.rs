//! # Workflows Module
//!
//! High-level assembly procedures, built on the [`crate::engine`] layer. These are the entry
//! points a driver program calls.
//!
//! ## Available Workflows
//!
//! - **Chain Growth** ([`chain`]) - Grow a linear chain of N monomer clones with optional
//!   random tilts between consecutive monomers
//! - **Pattern Fill** ([`fill`]) - Place one template copy on every point of a
//!   [`Pattern`](crate::core::patterns::pattern::Pattern), optionally randomly oriented
//! - **Packing Hand-off** ([`packing`]) - Validate a random-packing request and delegate it to
//!   an external [`PackingSolver`](packing::PackingSolver)
//!
//! Each workflow logs through `tracing` and reports progress through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter).

pub mod chain;
pub mod fill;
pub mod packing;
