//! # Chainsmith Core Library
//!
//! An anchor-based molecular assembly engine. Small rigid fragments carrying oriented
//! connection sites (ports) are composed into monomers, polymers and multi-chain systems
//! by solving rigid-body alignments instead of editing coordinates by hand.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Compound`, `Particle`, `Port`),
//!   the rigid-body geometry kernel, and spatial pattern generators.
//!
//! - **[`engine`]: The Logic Core.** The alignment operator ("force overlap"), the chain
//!   growth state machine, configuration, progress reporting and the error types.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the engine: growing a
//!   chain from a monomer prototype, filling a system from a pattern, and handing a
//!   template off to an external packing solver.
//!
//! All operations are synchronous and deterministic given their inputs. Randomness is always
//! drawn from a caller-supplied [`rand::Rng`].

pub mod core;
pub mod engine;
pub mod workflows;
