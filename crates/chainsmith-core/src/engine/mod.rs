//! # Engine Module
//!
//! The assembly engine: the operations that change how entities relate to each other,
//! as opposed to the plain geometry of [`crate::core`].
//!
//! ## Architecture
//!
//! - **Alignment** ([`alignment`]) - The "force overlap" operator that docks one port onto
//!   another and consumes both
//! - **Chain Growth** ([`growth`]) - The `Growing -> Done` state machine that appends
//!   perturbed monomer clones one alignment at a time
//! - **Configuration** ([`config`]) - Chain and fill parameters with builder-style construction
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for drivers
//! - **Error Handling** ([`error`]) - The [`error::AssemblyError`] type shared by all
//!   engine and workflow operations
//!
//! Every fallible operation validates its inputs before touching any entity, so an error
//! always leaves the affected compounds exactly as they were.

pub mod alignment;
pub mod config;
pub mod error;
pub mod growth;
pub mod progress;
