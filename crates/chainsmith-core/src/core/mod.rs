//! # Core Module
//!
//! Fundamental building blocks for anchor-based assembly.
//!
//! - **Entity Model** ([`models`]) - Hierarchical compounds of particles and ports, bonds,
//!   and the typed IDs that address them
//! - **Spatial Patterns** ([`patterns`]) - Finite point sets (disk, grids, sphere, random,
//!   lattice) used to place copies of an entity
//! - **Geometry** ([`utils`]) - Rotation helpers shared by the kernel and the engine
//!
//! Every transform on a [`models::compound::Compound`] is applied eagerly to the whole
//! affected subtree, so absolute positions are never stale.

pub mod models;
pub mod patterns;
pub mod utils;
