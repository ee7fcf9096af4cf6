use super::error::AssemblyError;
use crate::core::models::compound::{ChildRef, Compound};
use crate::core::models::error::ModelError;
use crate::core::models::ids::{NodeId, PortId};
use crate::core::models::port::{Anchor, Port};
use crate::core::models::topology::Bond;
use crate::core::utils::geometry;
use nalgebra::{Point3, Rotation3, Vector3};
use tracing::{debug, trace};

/// The rigid transform applied by an alignment, plus the bond it recorded.
///
/// The moving entity was first rotated by `rotation` about `pivot` (the moving port's anchor)
/// and then translated by `translation`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub rotation: Rotation3<f64>,
    pub pivot: Point3<f64>,
    pub translation: Vector3<f64>,
    pub bond: Option<Bond>,
}

fn solve(moving: &Port, pivot: Point3<f64>, target: &Port) -> Alignment {
    let rotation = geometry::rotation_to_antiparallel(moving.orientation(), target.orientation());
    let rotated = geometry::rotate_about(moving.position(), &rotation, &pivot);
    Alignment {
        rotation,
        pivot,
        translation: target.position() - rotated,
        bond: None,
    }
}

fn lookup_port(compound: &Compound, id: PortId) -> Result<&Port, AssemblyError> {
    compound
        .port(id)
        .ok_or_else(|| ModelError::PortNotFound(id).into())
}

fn ensure_unused(port: &Port, id: PortId) -> Result<(), AssemblyError> {
    if port.is_used() {
        return Err(AssemblyError::PortAlreadyUsed { port: id });
    }
    Ok(())
}

/// Docks `moving_port` of the `moving` compound onto `target_port` of `target`.
///
/// The whole `moving` compound is rotated about the moving port's anchor so that the port
/// faces exactly opposite to the target port, then translated so the two port positions
/// coincide. Both ports are consumed. No bond is recorded because the two particles live
/// in different compounds; use [`force_overlap_within`] after merging for that.
///
/// # Arguments
///
/// * `moving` - The compound to transform.
/// * `moving_port` - A port of `moving`.
/// * `target` - The compound that stays in place.
/// * `target_port` - A port of `target`.
///
/// # Return
///
/// The transform that was applied to `moving`.
///
/// # Errors
///
/// Returns [`AssemblyError::PortAlreadyUsed`] if either port was consumed earlier, or a
/// model error if a port ID is unknown. Neither compound is modified on error.
pub fn force_overlap(
    moving: &mut Compound,
    moving_port: PortId,
    target: &mut Compound,
    target_port: PortId,
) -> Result<Alignment, AssemblyError> {
    let m = lookup_port(moving, moving_port)?;
    let t = lookup_port(target, target_port)?;
    ensure_unused(m, moving_port)?;
    ensure_unused(t, target_port)?;
    let pivot = moving
        .anchor_position(moving_port)
        .ok_or(ModelError::PortNotFound(moving_port))?;

    let alignment = solve(m, pivot, t);
    let root = moving.root();
    moving.apply_rotation(root, &alignment.rotation, &alignment.pivot);
    moving.apply_translation(root, &alignment.translation);
    mark_used(moving, moving_port);
    mark_used(target, target_port);

    debug!(
        "Aligned port {:?} of '{}' onto port {:?} of '{}' (rotation angle {:.4} rad)",
        moving_port,
        moving.name(),
        target_port,
        target.name(),
        alignment.rotation.angle()
    );
    Ok(alignment)
}

/// Docks a port of the subtree rooted at `moving_node` onto another port of the same compound.
///
/// Only the `moving_node` subtree is transformed. When both ports are anchored on particles,
/// a bond between those two particles is recorded.
///
/// # Errors
///
/// - [`AssemblyError::IncompatiblePorts`] if the two ports are the same, the moving port is
///   not inside the moving subtree, or the target port is inside it.
/// - [`AssemblyError::PortAlreadyUsed`] if either port was consumed earlier.
/// - A model error for unknown IDs.
///
/// The compound is unchanged on error.
pub fn force_overlap_within(
    compound: &mut Compound,
    moving_node: NodeId,
    moving_port: PortId,
    target_port: PortId,
) -> Result<Alignment, AssemblyError> {
    if compound.node(moving_node).is_none() {
        return Err(ModelError::NodeNotFound(moving_node).into());
    }
    let m = lookup_port(compound, moving_port)?;
    let t = lookup_port(compound, target_port)?;

    if moving_port == target_port {
        return Err(AssemblyError::IncompatiblePorts {
            reason: "a port cannot be aligned onto itself",
        });
    }
    if !compound.contains(moving_node, ChildRef::Port(moving_port)) {
        return Err(AssemblyError::IncompatiblePorts {
            reason: "the moving port does not belong to the moving entity",
        });
    }
    if compound.contains(moving_node, ChildRef::Port(target_port)) {
        return Err(AssemblyError::IncompatiblePorts {
            reason: "both ports belong to the moving entity",
        });
    }
    ensure_unused(m, moving_port)?;
    ensure_unused(t, target_port)?;

    let pivot = compound
        .anchor_position(moving_port)
        .ok_or(ModelError::PortNotFound(moving_port))?;
    let bond = match (compound.anchor(moving_port), compound.anchor(target_port)) {
        (Some(Anchor::Particle(a)), Some(Anchor::Particle(b))) => Some(Bond::new(b, a)),
        _ => None,
    };

    let mut alignment = solve(m, pivot, t);
    compound.apply_rotation(moving_node, &alignment.rotation, &alignment.pivot);
    compound.apply_translation(moving_node, &alignment.translation);
    mark_used(compound, moving_port);
    mark_used(compound, target_port);
    if let Some(bond) = bond {
        compound.add_bond(bond.particle1_id, bond.particle2_id)?;
        trace!(
            "Recorded bond {:?} - {:?}",
            bond.particle1_id, bond.particle2_id
        );
    }
    alignment.bond = bond;

    debug!(
        "Aligned subtree {:?} onto port {:?} (rotation angle {:.4} rad)",
        moving_node,
        target_port,
        alignment.rotation.angle()
    );
    Ok(alignment)
}

fn mark_used(compound: &mut Compound, id: PortId) {
    if let Some(port) = compound.port_mut(id) {
        port.mark_used();
    }
}
