use crate::error::{CliError, Result};
use chainsmith::core::models::compound::Compound;
use chainsmith::core::models::ids::ParticleId;
use chainsmith::core::models::particle::Particle;
use chainsmith::core::models::port::{Anchor, PortSpec};
use chainsmith::core::patterns::lattice::Lattice;
use chainsmith::core::patterns::pattern::Pattern;
use chainsmith::core::utils::geometry::Axis;
use chainsmith::engine::error::AssemblyError;
use nalgebra::{Matrix3, Point3, Vector3};
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// A complete assembly recipe as read from a TOML file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub seed: Option<u64>,
    pub monomer: MonomerRecipe,
    #[serde(default)]
    pub chain: ChainRecipe,
    pub layout: Option<LayoutRecipe>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MonomerRecipe {
    pub name: String,
    pub particles: Vec<ParticleRecipe>,
    #[serde(default)]
    pub ports: Vec<PortRecipe>,
    /// Rotations applied, in order, after all particles and ports are placed.
    #[serde(default)]
    pub rotations: Vec<RotationRecipe>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParticleRecipe {
    pub name: String,
    pub position: [f64; 3],
    pub label: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PortRecipe {
    pub label: String,
    /// Index into the monomer's particle list.
    pub anchor: usize,
    pub offset: [f64; 3],
    /// Defaults to pointing along the offset.
    pub orientation: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RotationRecipe {
    pub axis: Axis,
    /// Angle in radians.
    pub angle: f64,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChainRecipe {
    pub length: Option<usize>,
    pub perturbation: Option<f64>,
    #[serde(rename = "head-port")]
    pub head_port: Option<String>,
    #[serde(rename = "tail-port")]
    pub tail_port: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutRecipe {
    pub pattern: PatternRecipe,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default, rename = "random-orientation")]
    pub random_orientation: bool,
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PatternRecipe {
    Single,
    Disk {
        n: usize,
    },
    #[serde(rename = "grid-2d")]
    Grid2d {
        nx: usize,
        ny: usize,
    },
    #[serde(rename = "grid-3d")]
    Grid3d {
        nx: usize,
        ny: usize,
        nz: usize,
    },
    Sphere {
        n: usize,
    },
    Random {
        n: usize,
    },
    Lattice {
        spacings: Vec<f64>,
        /// Lattice vectors as rows.
        vectors: Option<[[f64; 3]; 3]>,
        basis: Option<Vec<[f64; 3]>>,
        repeats: Vec<usize>,
    },
}

impl Recipe {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading recipe from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Applies `KEY=VALUE` overrides on top of the values read from the file.
    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Recipe(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "seed" => self.seed = Some(parse_value(key, value_str)?),
                "chain.length" => self.chain.length = Some(parse_value(key, value_str)?),
                "chain.perturbation" => {
                    self.chain.perturbation = Some(parse_value(key, value_str)?)
                }
                "chain.head-port" => self.chain.head_port = Some(value_str.to_string()),
                "chain.tail-port" => self.chain.tail_port = Some(value_str.to_string()),
                "layout.scale" => self.layout_mut(key)?.scale = parse_value(key, value_str)?,
                "layout.random-orientation" => {
                    self.layout_mut(key)?.random_orientation = parse_value(key, value_str)?
                }
                _ => {
                    return Err(CliError::Recipe(format!(
                        "Unsupported recipe key for --set: '{}'",
                        key
                    )));
                }
            }
            debug!("Recipe override applied: {} = {}", key, value_str);
        }
        Ok(())
    }

    fn layout_mut(&mut self, key: &str) -> Result<&mut LayoutRecipe> {
        self.layout.as_mut().ok_or_else(|| {
            CliError::Recipe(format!(
                "Cannot set '{}': the recipe has no [layout] section",
                key
            ))
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Recipe(format!("Invalid value for {}: '{}'", key, value_str))
    })
}

impl MonomerRecipe {
    /// Builds the monomer prototype.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Recipe`] for an empty particle list or an out-of-range anchor index,
    /// and model errors for duplicate labels or zero orientations.
    pub fn build(&self) -> Result<Compound> {
        if self.particles.is_empty() {
            return Err(CliError::Recipe(format!(
                "Monomer '{}' has no particles",
                self.name
            )));
        }

        let mut monomer = Compound::new(&self.name);
        let root = monomer.root();

        let mut particle_ids: Vec<ParticleId> = Vec::with_capacity(self.particles.len());
        for p in &self.particles {
            let particle = Particle::new(&p.name, Point3::from(p.position));
            particle_ids.push(monomer.add_particle(root, p.label.as_deref(), particle)?);
        }

        for port in &self.ports {
            let anchor = *particle_ids.get(port.anchor).ok_or_else(|| {
                CliError::Recipe(format!(
                    "Port '{}' is anchored on particle {}, but the monomer has only {} particles",
                    port.label,
                    port.anchor,
                    particle_ids.len()
                ))
            })?;
            let offset = Vector3::from(port.offset);
            let orientation = port.orientation.map(Vector3::from).unwrap_or(offset);
            monomer.add_port(
                root,
                Some(&port.label),
                PortSpec::new(Anchor::Particle(anchor), offset, orientation),
            )?;
        }

        for rotation in &self.rotations {
            monomer.rotate(rotation.axis, rotation.angle);
        }

        debug!(
            "Built monomer '{}' with {} particles and {} ports",
            self.name,
            monomer.particle_count(),
            monomer.port_count()
        );
        Ok(monomer)
    }
}

impl PatternRecipe {
    /// Generates the unit-sized point set. Only the `random` pattern draws from `rng`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Pattern> {
        let pattern = match self {
            PatternRecipe::Single => Pattern::from_points(vec![Point3::origin()]),
            PatternRecipe::Disk { n } => Pattern::disk(*n)?,
            PatternRecipe::Grid2d { nx, ny } => Pattern::grid_2d(*nx, *ny)?,
            PatternRecipe::Grid3d { nx, ny, nz } => Pattern::grid_3d(*nx, *ny, *nz)?,
            PatternRecipe::Sphere { n } => Pattern::sphere(*n)?,
            PatternRecipe::Random { n } => Pattern::random(*n, rng)?,
            PatternRecipe::Lattice {
                spacings,
                vectors,
                basis,
                repeats,
            } => {
                let vectors = vectors.map(|rows| {
                    Matrix3::from_rows(&[
                        Vector3::from(rows[0]).transpose(),
                        Vector3::from(rows[1]).transpose(),
                        Vector3::from(rows[2]).transpose(),
                    ])
                });
                let basis = basis
                    .as_ref()
                    .map(|points| points.iter().copied().map(Vector3::from).collect());
                Lattice::new(spacings, vectors, basis)
                    .and_then(|lattice| lattice.pattern(repeats))
                    .map_err(AssemblyError::from)?
            }
        };
        Ok(pattern)
    }
}
