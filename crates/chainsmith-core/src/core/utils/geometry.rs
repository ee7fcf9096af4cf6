use nalgebra::{Point3, Rotation3, Unit, Vector3};
use serde::Deserialize;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A Cartesian axis for the fixed-axis rotations of the geometry kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Returns the unit vector along this axis.
    pub fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    /// Returns the right-handed rotation by `angle` radians about this axis.
    pub fn rotation(self, angle: f64) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.unit(), angle)
    }
}

#[derive(Debug, Error)]
#[error("Invalid axis string")]
pub struct ParseAxisError;

impl FromStr for Axis {
    type Err = ParseAxisError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(ParseAxisError),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Axis::X => "x",
                Axis::Y => "y",
                Axis::Z => "z",
            }
        )
    }
}

pub fn rotation_to_align(from: &Vector3<f64>, to: &Vector3<f64>) -> Option<Rotation3<f64>> {
    Rotation3::rotation_between(from, to)
}

/// Returns a unit vector orthogonal to `v`.
///
/// The result depends only on `v`, so repeated calls with the same input pick the same
/// axis. `v` does not need to be normalized but must be non-zero.
pub fn orthogonal_axis(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let n = v.normalize();
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(helper - n * n.dot(&helper))
}

/// Returns two unit vectors that, together with `v`, form a right-handed orthonormal frame.
pub fn perpendicular_frame(v: &Vector3<f64>) -> (Unit<Vector3<f64>>, Unit<Vector3<f64>>) {
    let u = orthogonal_axis(v);
    let w = Unit::new_normalize(v.normalize().cross(&u));
    (u, w)
}

/// Computes the shortest-arc rotation that turns `from` into the direction opposite to `to`.
///
/// When `from` already points along `-to` the identity is returned. When `from` points
/// along `to` the rotation axis is undefined, so a half turn about [`orthogonal_axis`] of
/// `from` is used instead.
pub fn rotation_to_antiparallel(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    let target = -to;
    rotation_to_align(from, &target)
        .unwrap_or_else(|| Rotation3::from_axis_angle(&orthogonal_axis(from), PI))
}

/// Rotates `point` about `pivot`.
pub fn rotate_about(point: &Point3<f64>, rotation: &Rotation3<f64>, pivot: &Point3<f64>) -> Point3<f64> {
    pivot + rotation * (point - pivot)
}

/// Returns the arithmetic mean of `points`, or `None` for an empty slice.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
