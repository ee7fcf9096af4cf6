use itertools::iproduct;
use nalgebra::Point3;
use rand::Rng;
use std::f64::consts::PI;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatternError {
    #[error("Invalid pattern parameter '{parameter}': {value}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
    },
}

/// An ordered, finite set of points.
///
/// Generators place points in the unit disk, the unit cube or on the unit sphere; callers
/// bring them to the desired size with [`Pattern::scale`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    points: Vec<Point3<f64>>,
}

fn require_count(parameter: &'static str, value: usize) -> Result<(), PatternError> {
    if value == 0 {
        return Err(PatternError::InvalidParameter {
            parameter,
            value: value.to_string(),
        });
    }
    Ok(())
}

impl Pattern {
    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// Places `n` points on the unit disk in the xy-plane with a sunflower layout.
    ///
    /// Point `i` sits at radius `sqrt(i / n)` and azimuth `i` times the golden angle, which
    /// spreads points evenly over the area. The first point is the disk center.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidParameter`] if `n` is zero.
    pub fn disk(n: usize) -> Result<Self, PatternError> {
        require_count("n", n)?;
        let golden_angle = PI * (3.0 - 5f64.sqrt());
        let points = (0..n)
            .map(|i| {
                let r = (i as f64 / n as f64).sqrt();
                let theta = i as f64 * golden_angle;
                Point3::new(r * theta.cos(), r * theta.sin(), 0.0)
            })
            .collect();
        trace!("Generated disk pattern with {} points", n);
        Ok(Self { points })
    }

    /// Places `nx * ny * nz` points on a regular grid in the unit cube.
    ///
    /// Points are `(i/nx, j/ny, k/nz)` for `i < nx`, `j < ny`, `k < nz`, with `i` varying
    /// slowest.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidParameter`] if any count is zero.
    pub fn grid_3d(nx: usize, ny: usize, nz: usize) -> Result<Self, PatternError> {
        require_count("nx", nx)?;
        require_count("ny", ny)?;
        require_count("nz", nz)?;
        let points = iproduct!(0..nx, 0..ny, 0..nz)
            .map(|(i, j, k)| {
                Point3::new(
                    i as f64 / nx as f64,
                    j as f64 / ny as f64,
                    k as f64 / nz as f64,
                )
            })
            .collect();
        Ok(Self { points })
    }

    /// Places `nx * ny` points on a regular grid in the unit square at `z = 0`.
    pub fn grid_2d(nx: usize, ny: usize) -> Result<Self, PatternError> {
        require_count("nx", nx)?;
        require_count("ny", ny)?;
        let points = iproduct!(0..nx, 0..ny)
            .map(|(i, j)| Point3::new(i as f64 / nx as f64, j as f64 / ny as f64, 0.0))
            .collect();
        Ok(Self { points })
    }

    /// Places `n` points on the unit sphere with a Fibonacci layout.
    ///
    /// Heights are evenly spaced in `(-1, 1)` and successive points advance by the golden
    /// angle around the z axis.
    pub fn sphere(n: usize) -> Result<Self, PatternError> {
        require_count("n", n)?;
        let phi = (1.0 + 5f64.sqrt()) / 2.0;
        let dz = 2.0 / n as f64;
        let points = (0..n)
            .map(|i| {
                let z = i as f64 * dz - 1.0 + dz / 2.0;
                let r = (1.0 - z * z).sqrt();
                let azimuth = i as f64 * 2.0 * PI / phi;
                Point3::new(r * azimuth.cos(), r * azimuth.sin(), z)
            })
            .collect();
        Ok(Self { points })
    }

    /// Draws `n` points uniformly from the unit cube.
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self, PatternError> {
        require_count("n", n)?;
        let points = (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                )
            })
            .collect();
        Ok(Self { points })
    }

    /// Multiplies every coordinate by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for point in &mut self.points {
            point.coords *= factor;
        }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3<f64>> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = &'a Point3<f64>;
    type IntoIter = std::slice::Iter<'a, Point3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
