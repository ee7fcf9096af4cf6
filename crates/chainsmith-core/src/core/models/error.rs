use super::ids::{NodeId, ParticleId, PortId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Label '{label}' is already taken in this scope")]
    LabelCollision { label: String },

    #[error("Compound node {0:?} does not exist")]
    NodeNotFound(NodeId),

    #[error("Particle {0:?} does not exist")]
    ParticleNotFound(ParticleId),

    #[error("Port {0:?} does not exist")]
    PortNotFound(PortId),

    #[error("Port orientation must be a finite, non-zero vector (got [{x}, {y}, {z}])")]
    DegenerateOrientation { x: f64, y: f64, z: f64 },
}
