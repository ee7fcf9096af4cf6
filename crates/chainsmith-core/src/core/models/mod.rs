//! # Core Models Module
//!
//! Data structures for the composite entity model.
//!
//! ## Key Components
//!
//! - [`compound`] - The hierarchical container and the geometry kernel operating on it
//! - [`particle`] - Named point sites (atoms, beads)
//! - [`port`] - Oriented, single-use connection sites and their anchors
//! - [`topology`] - Bonds created when ports are consumed
//! - [`ids`] - Arena keys for particles, ports and nodes
//! - [`error`] - Errors raised while building or querying a compound
//!
//! ## Usage
//!
//! ```ignore
//! use chainsmith::core::models::{compound::Compound, particle::Particle, port::{Anchor, PortSpec}};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut monomer = Compound::new("CH2");
//! let root = monomer.root();
//! let carbon = monomer.add_particle(root, Some("C"), Particle::new("C", Point3::origin()))?;
//! monomer.add_port(
//!     root,
//!     Some("head"),
//!     PortSpec::new(Anchor::Particle(carbon), Vector3::new(0.0, 0.07, 0.0), Vector3::y()),
//! )?;
//! ```

pub mod compound;
pub mod error;
pub mod ids;
pub mod particle;
pub mod port;
pub mod topology;
