//! # Spatial Patterns Module
//!
//! Finite, ordered point sets used to lay out copies of a template compound.
//!
//! ## Key Components
//!
//! - [`pattern`] - [`Pattern`](pattern::Pattern) generators over the unit disk, unit cube
//!   and unit sphere, plus uniform random placement
//! - [`lattice`] - Periodic point sets built from spacings, lattice vectors and a basis
//!
//! Every generator yields each point exactly once in a stable order, so a pattern can be
//! iterated any number of times with identical results.

pub mod lattice;
pub mod pattern;
