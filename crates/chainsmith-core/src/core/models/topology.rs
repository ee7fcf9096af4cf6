use super::ids::ParticleId;

/// An unordered connection between two particles of the same compound.
///
/// Bonds are recorded when an alignment consumes two ports whose anchors are both
/// particles. They carry no order or parameters; force-field typing is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub particle1_id: ParticleId, // ID of the first particle
    pub particle2_id: ParticleId, // ID of the second particle
}

impl Bond {
    pub fn new(particle1_id: ParticleId, particle2_id: ParticleId) -> Self {
        Self {
            particle1_id,
            particle2_id,
        }
    }

    pub fn contains(&self, particle_id: ParticleId) -> bool {
        self.particle1_id == particle_id || self.particle2_id == particle_id
    }

    /// Returns the particle on the other end of the bond, if `particle_id` is one of its ends.
    pub fn partner(&self, particle_id: ParticleId) -> Option<ParticleId> {
        if self.particle1_id == particle_id {
            Some(self.particle2_id)
        } else if self.particle2_id == particle_id {
            Some(self.particle1_id)
        } else {
            None
        }
    }
}
