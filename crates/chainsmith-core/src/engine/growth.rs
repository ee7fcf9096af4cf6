use super::alignment::force_overlap_within;
use super::config::ChainConfig;
use super::error::AssemblyError;
use crate::core::models::compound::Compound;
use crate::core::models::error::ModelError;
use crate::core::models::ids::{NodeId, PortId};
use crate::core::utils::geometry::perpendicular_frame;
use nalgebra::Rotation3;
use rand::Rng;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthState {
    Growing,
    Done,
}

/// Incremental builder of a linear chain from a monomer prototype.
///
/// Each [`step`](ChainGrowth::step) appends one fresh clone of the prototype and docks its
/// head port onto the tail port of the previously appended monomer. The prototype itself is
/// never modified.
pub struct ChainGrowth<'p> {
    prototype: &'p Compound,
    config: ChainConfig,
    prototype_tail: PortId,
    chain: Compound,
    last: Option<NodeId>,
    appended: usize,
    state: GrowthState,
}

impl<'p> ChainGrowth<'p> {
    /// Validates the inputs and prepares an empty chain.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::InvalidChainLength`] for a zero length.
    /// - [`AssemblyError::InvalidPerturbation`] for a negative or non-finite bound.
    /// - [`AssemblyError::PortNotFound`] if the prototype lacks the head or tail label.
    /// - [`AssemblyError::PortAlreadyUsed`] if a prototype port was consumed already.
    /// - [`AssemblyError::IncompatiblePorts`] if head and tail name the same port.
    pub fn new(prototype: &'p Compound, config: &ChainConfig) -> Result<Self, AssemblyError> {
        if config.length == 0 {
            return Err(AssemblyError::InvalidChainLength {
                length: config.length,
            });
        }
        if !config.perturbation.is_finite() || config.perturbation < 0.0 {
            return Err(AssemblyError::InvalidPerturbation {
                value: config.perturbation,
            });
        }

        let root = prototype.root();
        let head = prototype
            .port_by_label(root, &config.head_port)
            .ok_or_else(|| AssemblyError::PortNotFound {
                label: config.head_port.clone(),
            })?;
        let tail = prototype
            .port_by_label(root, &config.tail_port)
            .ok_or_else(|| AssemblyError::PortNotFound {
                label: config.tail_port.clone(),
            })?;
        if head == tail {
            return Err(AssemblyError::IncompatiblePorts {
                reason: "head and tail must be distinct ports",
            });
        }
        for port in [head, tail] {
            if prototype.port(port).is_some_and(|p| p.is_used()) {
                return Err(AssemblyError::PortAlreadyUsed { port });
            }
        }

        Ok(Self {
            prototype,
            config: config.clone(),
            prototype_tail: tail,
            chain: Compound::new(&config.chain_name),
            last: None,
            appended: 0,
            state: GrowthState::Growing,
        })
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    /// Number of monomers appended so far.
    pub fn len(&self) -> usize {
        self.appended
    }

    pub fn is_empty(&self) -> bool {
        self.appended == 0
    }

    pub fn chain(&self) -> &Compound {
        &self.chain
    }

    /// Appends the next monomer.
    ///
    /// Randomness is drawn only when the perturbation bound is positive: two uniform angles
    /// in `[-δ, δ]` per appended monomer after the first. Stepping a finished chain is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::PortAlreadyUsed`] if the tail of the last monomer was consumed
    /// outside this builder. Ports are checked before the new monomer is inserted, so the chain
    /// is unchanged on error.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<GrowthState, AssemblyError> {
        if self.state == GrowthState::Done {
            return Ok(GrowthState::Done);
        }

        let mut current = self.prototype.clone();
        let label = format!("{}[$]", self.config.monomer_label);
        let root = self.chain.root();

        let node = match self.last {
            None => self.chain.add_compound(root, Some(&label), current)?,
            Some(last) => {
                let target = self.port_in(last, &self.config.tail_port)?;
                if self.chain.port(target).is_some_and(|p| p.is_used()) {
                    return Err(AssemblyError::PortAlreadyUsed { port: target });
                }
                if self.config.perturbation > 0.0 {
                    perturb_port(
                        &mut current,
                        self.prototype_tail,
                        self.config.perturbation,
                        rng,
                    )?;
                }
                let node = self.chain.add_compound(root, Some(&label), current)?;
                // The clone's head was validated unused in `new`; `target` lies outside `node`.
                let head = self.port_in(node, &self.config.head_port)?;
                force_overlap_within(&mut self.chain, node, head, target)?;
                node
            }
        };

        self.last = Some(node);
        self.appended += 1;
        trace!("Appended monomer {} of {}", self.appended, self.config.length);
        if self.appended == self.config.length {
            self.state = GrowthState::Done;
            debug!(
                "Chain '{}' complete with {} monomers",
                self.chain.name(),
                self.appended
            );
        }
        Ok(self.state)
    }

    /// Consumes the builder and returns the chain grown so far.
    pub fn finish(self) -> Compound {
        self.chain
    }

    fn port_in(&self, node: NodeId, label: &str) -> Result<PortId, AssemblyError> {
        self.chain
            .port_by_label(node, label)
            .ok_or_else(|| AssemblyError::PortNotFound {
                label: label.to_string(),
            })
    }
}

/// Tilts a port about its anchor by two independent uniform angles in `[-delta, delta]`.
///
/// The two rotation axes are perpendicular to the port orientation and to each other, so
/// the tilt never merely spins the port about its own direction.
pub(crate) fn perturb_port<R: Rng + ?Sized>(
    compound: &mut Compound,
    port: PortId,
    delta: f64,
    rng: &mut R,
) -> Result<(), AssemblyError> {
    let orientation = compound
        .port(port)
        .ok_or(ModelError::PortNotFound(port))?
        .orientation()
        .into_inner();
    let pivot = compound
        .anchor_position(port)
        .ok_or(ModelError::PortNotFound(port))?;
    let (u, w) = perpendicular_frame(&orientation);

    let first = Rotation3::from_axis_angle(&u, rng.gen_range(-delta..=delta));
    let second = Rotation3::from_axis_angle(&w, rng.gen_range(-delta..=delta));
    compound.rotate_port(port, &(second * first), &pivot)?;
    Ok(())
}
