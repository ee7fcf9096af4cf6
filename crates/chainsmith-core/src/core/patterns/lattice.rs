use super::pattern::Pattern;
use itertools::Itertools;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;
use tracing::debug;

const DETERMINANT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatticeError {
    #[error("Lattice dimension must be 1, 2 or 3, got {0}")]
    InvalidDimension(usize),
    #[error("Lattice spacing {index} must be positive and finite, got {value}")]
    NonPositiveSpacing { index: usize, value: f64 },
    #[error("Lattice vectors are linearly dependent (determinant {determinant})")]
    DegenerateVectors { determinant: f64 },
    #[error("Lattice vectors form a left-handed set (determinant {determinant})")]
    LeftHanded { determinant: f64 },
    #[error("Lattice vector {row} has components outside the lattice dimension")]
    OutOfPlaneVector { row: usize },
    #[error("Basis point {index} is invalid: {reason}")]
    InvalidBasis { index: usize, reason: &'static str },
    #[error("Expected {expected} repeat counts, got {actual}")]
    RepeatMismatch { expected: usize, actual: usize },
    #[error("Repeat count along lattice vector {index} must be positive")]
    ZeroRepeat { index: usize },
}

/// A periodic point set in one, two or three dimensions.
///
/// The dimension is the number of spacings. Lattice vectors are the rows of a 3x3 matrix of
/// which only the leading `d` rows are used; each is scaled by its spacing. Basis points are
/// fractional offsets inside the unit cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    spacings: Vec<f64>,
    vectors: Matrix3<f64>,
    basis: Vec<Vector3<f64>>,
}

impl Lattice {
    /// Creates a validated lattice.
    ///
    /// # Arguments
    ///
    /// * `spacings` - One positive spacing per lattice direction; its length sets the dimension.
    /// * `vectors` - Lattice vectors as matrix rows; defaults to the identity.
    /// * `basis` - Fractional basis points; defaults to a single point at the cell origin.
    ///
    /// # Errors
    ///
    /// Returns a [`LatticeError`] describing the first invalid input.
    pub fn new(
        spacings: &[f64],
        vectors: Option<Matrix3<f64>>,
        basis: Option<Vec<Vector3<f64>>>,
    ) -> Result<Self, LatticeError> {
        let dimension = spacings.len();
        if !(1..=3).contains(&dimension) {
            return Err(LatticeError::InvalidDimension(dimension));
        }
        for (index, &value) in spacings.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(LatticeError::NonPositiveSpacing { index, value });
            }
        }

        let vectors = vectors.unwrap_or_else(Matrix3::identity);
        for row in 0..dimension {
            if (dimension..3).any(|col| vectors[(row, col)] != 0.0) {
                return Err(LatticeError::OutOfPlaneVector { row });
            }
        }
        let determinant = leading_determinant(&vectors, dimension);
        if !determinant.is_finite() || determinant.abs() < DETERMINANT_TOLERANCE {
            return Err(LatticeError::DegenerateVectors { determinant });
        }
        if determinant < 0.0 {
            return Err(LatticeError::LeftHanded { determinant });
        }

        let basis = basis.unwrap_or_else(|| vec![Vector3::zeros()]);
        if basis.is_empty() {
            return Err(LatticeError::InvalidBasis {
                index: 0,
                reason: "at least one basis point is required",
            });
        }
        for (index, point) in basis.iter().enumerate() {
            if !point.iter().all(|c| c.is_finite() && (0.0..1.0).contains(c)) {
                return Err(LatticeError::InvalidBasis {
                    index,
                    reason: "fractional coordinates must lie in [0, 1)",
                });
            }
            if (dimension..3).any(|axis| point[axis] != 0.0) {
                return Err(LatticeError::InvalidBasis {
                    index,
                    reason: "coordinates beyond the lattice dimension must be zero",
                });
            }
        }

        Ok(Self {
            spacings: spacings.to_vec(),
            vectors,
            basis,
        })
    }

    pub fn dimension(&self) -> usize {
        self.spacings.len()
    }

    pub fn spacings(&self) -> &[f64] {
        &self.spacings
    }

    pub fn vectors(&self) -> &Matrix3<f64> {
        &self.vectors
    }

    pub fn basis(&self) -> &[Vector3<f64>] {
        &self.basis
    }

    /// Enumerates `repeats[0] * ... * repeats[d-1] * basis.len()` lattice points.
    ///
    /// Cells are visited with the first direction varying slowest; within a cell the basis
    /// points keep their given order.
    pub fn pattern(&self, repeats: &[usize]) -> Result<Pattern, LatticeError> {
        let dimension = self.dimension();
        if repeats.len() != dimension {
            return Err(LatticeError::RepeatMismatch {
                expected: dimension,
                actual: repeats.len(),
            });
        }
        if let Some(index) = repeats.iter().position(|&n| n == 0) {
            return Err(LatticeError::ZeroRepeat { index });
        }

        let cells: Vec<Vec<usize>> = repeats
            .iter()
            .map(|&n| 0..n)
            .multi_cartesian_product()
            .collect();

        let mut points = Vec::with_capacity(cells.len() * self.basis.len());
        for cell in &cells {
            for fractional in &self.basis {
                let mut position = Vector3::zeros();
                for axis in 0..dimension {
                    let row = self.vectors.row(axis).transpose();
                    position += row * ((cell[axis] as f64 + fractional[axis]) * self.spacings[axis]);
                }
                points.push(Point3::from(position));
            }
        }
        debug!(
            "Lattice of dimension {} produced {} points",
            dimension,
            points.len()
        );
        Ok(Pattern::from_points(points))
    }
}

fn leading_determinant(m: &Matrix3<f64>, dimension: usize) -> f64 {
    match dimension {
        1 => m[(0, 0)],
        2 => m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        _ => m.determinant(),
    }
}
