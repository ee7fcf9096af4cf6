use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::error::ModelError;
use crate::core::models::ids::PortId;
use crate::core::patterns::lattice::LatticeError;
use crate::core::patterns::pattern::PatternError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("Port {port:?} has already been consumed by an alignment")]
    PortAlreadyUsed { port: PortId },

    #[error("No port labeled '{label}' on the monomer prototype")]
    PortNotFound { label: String },

    #[error("Ports cannot be aligned: {reason}")]
    IncompatiblePorts { reason: &'static str },

    #[error("Chain length must be at least 1, got {length}")]
    InvalidChainLength { length: usize },

    #[error("Perturbation bound must be a finite, non-negative angle, got {value}")]
    InvalidPerturbation { value: f64 },

    #[error("Invalid packing request: {reason}")]
    InvalidPackingRequest { reason: String },

    #[error("Entity model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Pattern error: {source}")]
    Pattern {
        #[from]
        source: PatternError,
    },

    #[error("Lattice error: {source}")]
    Lattice {
        #[from]
        source: LatticeError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
