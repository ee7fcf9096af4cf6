use super::ids::NodeId;
use nalgebra::Point3;

/// A named point site, the leaf of the entity hierarchy.
///
/// A particle stands for an atom, a coarse-grained bead, or any other site that carries
/// a position. Its identity (name) never changes after construction; only its position
/// is updated by the geometry kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// The element or type label (e.g., "C", "H", "CH2").
    pub name: String,
    /// The absolute position in nanometers.
    pub position: Point3<f64>,
    /// The node owning this particle, set on insertion into a compound.
    pub(crate) parent: Option<NodeId>,
}

impl Particle {
    /// Creates a detached particle.
    ///
    /// # Arguments
    ///
    /// * `name` - The element or type label.
    /// * `position` - The absolute position of the particle.
    pub fn new(name: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            position,
            parent: None,
        }
    }

    /// Returns the node that owns this particle, if it has been inserted into a compound.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}
