use crate::core::models::compound::Compound;
use crate::engine::error::AssemblyError;
use nalgebra::Vector3;
use tracing::{info, instrument};

/// A validated request to pack copies of a template into a box without overlaps.
#[derive(Debug, Clone)]
pub struct PackingRequest {
    template: Compound,
    replicas: usize,
    min_separation: f64,
    box_lengths: Vector3<f64>,
}

impl PackingRequest {
    /// Creates a packing request.
    ///
    /// # Arguments
    ///
    /// * `template` - The compound to replicate.
    /// * `replicas` - Number of copies to place, at least one.
    /// * `min_separation` - Minimum distance between particles of different copies.
    /// * `box_lengths` - Edge lengths of the axis-aligned box anchored at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidPackingRequest`] for a zero replica count, a
    /// non-positive separation, a non-positive box edge, or a template without particles.
    pub fn new(
        template: Compound,
        replicas: usize,
        min_separation: f64,
        box_lengths: Vector3<f64>,
    ) -> Result<Self, AssemblyError> {
        if replicas == 0 {
            return Err(invalid("replica count must be positive".to_string()));
        }
        if !(min_separation.is_finite() && min_separation > 0.0) {
            return Err(invalid(format!(
                "minimum separation must be positive, got {}",
                min_separation
            )));
        }
        if let Some(edge) = box_lengths
            .iter()
            .find(|edge| !(edge.is_finite() && **edge > 0.0))
        {
            return Err(invalid(format!("box edges must be positive, got {}", edge)));
        }
        if template.particle_count() == 0 {
            return Err(invalid("template has no particles".to_string()));
        }
        Ok(Self {
            template,
            replicas,
            min_separation,
            box_lengths,
        })
    }

    pub fn template(&self) -> &Compound {
        &self.template
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn min_separation(&self) -> f64 {
        self.min_separation
    }

    pub fn box_lengths(&self) -> &Vector3<f64> {
        &self.box_lengths
    }
}

fn invalid(reason: String) -> AssemblyError {
    AssemblyError::InvalidPackingRequest { reason }
}

/// An external random-packing engine.
///
/// Implementations receive a validated request and return a system holding `replicas`
/// copies of the template.
pub trait PackingSolver {
    type Error: std::error::Error;

    fn pack(&self, request: &PackingRequest) -> Result<Compound, Self::Error>;
}

/// Hands `request` to `solver` and returns the packed system.
#[instrument(skip_all, name = "packing_handoff")]
pub fn pack_with<S: PackingSolver>(
    solver: &S,
    request: &PackingRequest,
) -> Result<Compound, S::Error> {
    info!(
        "Handing {} copies of '{}' to the packing solver (box {:?}, separation {}).",
        request.replicas,
        request.template.name(),
        request.box_lengths.as_slice(),
        request.min_separation
    );
    let system = solver.pack(request)?;
    info!(
        "Packing solver returned '{}' with {} particles.",
        system.name(),
        system.particle_count()
    );
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use crate::core::patterns::pattern::Pattern;
    use crate::engine::config::FillOptions;
    use crate::engine::progress::ProgressReporter;
    use crate::workflows::fill::fill_pattern;
    use nalgebra::Point3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::Cell;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("mock solver failure")]
    struct MockError;

    /// Places copies on a cubic grid spanning the box, ignoring the separation.
    struct GridSolver {
        calls: Cell<usize>,
    }

    impl PackingSolver for GridSolver {
        type Error = AssemblyError;

        fn pack(&self, request: &PackingRequest) -> Result<Compound, Self::Error> {
            self.calls.set(self.calls.get() + 1);
            let side = (request.replicas() as f64).cbrt().ceil() as usize;
            let points: Vec<Point3<f64>> = Pattern::grid_3d(side, side, side)?
                .iter()
                .take(request.replicas())
                .map(|p| Point3::from(p.coords.component_mul(request.box_lengths())))
                .collect();
            fill_pattern(
                request.template(),
                &Pattern::from_points(points),
                &FillOptions::default(),
                &mut StdRng::seed_from_u64(0),
                &ProgressReporter::new(),
            )
        }
    }

    struct FailingSolver;

    impl PackingSolver for FailingSolver {
        type Error = MockError;

        fn pack(&self, _request: &PackingRequest) -> Result<Compound, Self::Error> {
            Err(MockError)
        }
    }

    fn argon() -> Compound {
        let mut compound = Compound::new("Ar");
        let root = compound.root();
        compound
            .add_particle(root, None, Particle::new("Ar", Point3::origin()))
            .unwrap();
        compound
    }

    mod validation {
        use super::*;

        #[test]
        fn valid_request_keeps_its_parameters() {
            let request =
                PackingRequest::new(argon(), 10, 0.2, Vector3::new(2.0, 2.0, 2.0)).unwrap();
            assert_eq!(request.replicas(), 10);
            assert_eq!(request.min_separation(), 0.2);
            assert_eq!(request.template().particle_count(), 1);
        }

        #[test]
        fn invalid_parameters_are_rejected() {
            let cases = [
                (0, 0.2, Vector3::new(1.0, 1.0, 1.0)),
                (5, 0.0, Vector3::new(1.0, 1.0, 1.0)),
                (5, f64::NAN, Vector3::new(1.0, 1.0, 1.0)),
                (5, 0.2, Vector3::new(1.0, -1.0, 1.0)),
                (5, 0.2, Vector3::new(1.0, 1.0, 0.0)),
            ];
            for (replicas, separation, box_lengths) in cases {
                assert!(matches!(
                    PackingRequest::new(argon(), replicas, separation, box_lengths),
                    Err(AssemblyError::InvalidPackingRequest { .. })
                ));
            }
        }

        #[test]
        fn empty_template_is_rejected() {
            let result =
                PackingRequest::new(Compound::new("Empty"), 1, 0.2, Vector3::new(1.0, 1.0, 1.0));
            assert!(matches!(
                result,
                Err(AssemblyError::InvalidPackingRequest { .. })
            ));
        }
    }

    #[test]
    fn pack_with_delegates_to_the_solver() {
        let solver = GridSolver {
            calls: Cell::new(0),
        };
        let request = PackingRequest::new(argon(), 5, 0.2, Vector3::new(3.0, 3.0, 3.0)).unwrap();
        let system = pack_with(&solver, &request).unwrap();
        assert_eq!(solver.calls.get(), 1);
        assert_eq!(system.particle_count(), 5);
        for p in system.positions() {
            assert!(p.iter().all(|&c| (0.0..3.0).contains(&c)));
        }
    }

    #[test]
    fn solver_errors_are_passed_through() {
        let request = PackingRequest::new(argon(), 1, 0.2, Vector3::new(1.0, 1.0, 1.0)).unwrap();
        assert!(pack_with(&FailingSolver, &request).is_err());
    }
}
