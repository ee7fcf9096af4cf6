use super::error::ModelError;
use super::ids::{NodeId, ParticleId};
use nalgebra::{Point3, Unit, Vector3};

/// The entity a port is attached to.
///
/// This is a relation, not ownership: the compound keeps a table from port ID to anchor,
/// and the anchor is only consulted for its current position (the pivot of alignments and
/// perturbations) and to decide whether an alignment forms a bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The port sits on a single particle.
    Particle(ParticleId),
    /// The port sits on a compound node; its position is the node's centroid.
    Node(NodeId),
}

/// Construction parameters for a port.
///
/// The port is created at `anchor position + offset`, facing along `orientation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortSpec {
    pub anchor: Anchor,
    pub offset: Vector3<f64>,
    pub orientation: Vector3<f64>,
}

impl PortSpec {
    pub fn new(anchor: Anchor, offset: Vector3<f64>, orientation: Vector3<f64>) -> Self {
        Self {
            anchor,
            offset,
            orientation,
        }
    }

    /// Creates a spec whose orientation points along the offset, away from the anchor.
    ///
    /// This is the usual layout for a bonding site placed half a bond length from its atom.
    pub fn outward(anchor: Anchor, offset: Vector3<f64>) -> Self {
        Self::new(anchor, offset, offset)
    }
}

/// An oriented, single-use connection site.
///
/// Position and orientation are kept in absolute coordinates and are updated together
/// with the rest of the owning subtree by every transform. Once an alignment consumes the
/// port it is marked as used and can no longer take part in another alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub(crate) position: Point3<f64>,
    pub(crate) orientation: Unit<Vector3<f64>>,
    pub(crate) used: bool,
    pub(crate) parent: Option<NodeId>,
}

impl Port {
    /// Creates a detached, unused port.
    ///
    /// # Arguments
    ///
    /// * `position` - The absolute point where the connection occurs.
    /// * `orientation` - The facing direction; normalized on construction.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DegenerateOrientation`] if `orientation` is zero or not finite.
    pub fn new(position: Point3<f64>, orientation: Vector3<f64>) -> Result<Self, ModelError> {
        let degenerate = || ModelError::DegenerateOrientation {
            x: orientation.x,
            y: orientation.y,
            z: orientation.z,
        };
        if !orientation.iter().all(|c| c.is_finite()) {
            return Err(degenerate());
        }
        let orientation = Unit::try_new(orientation, f64::EPSILON).ok_or_else(degenerate)?;
        Ok(Self {
            position,
            orientation,
            used: false,
            parent: None,
        })
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    pub fn orientation(&self) -> &Unit<Vector3<f64>> {
        &self.orientation
    }

    /// Returns `true` once an alignment has consumed this port.
    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn mark_used(&mut self) {
        self.used = true;
    }
}
