use std::f64::consts::PI;

use detector_model::Frame;
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use tracing::{debug, instrument};

use crate::config::GeometryConfig;
use crate::error::GeometryError;

// Below this angle two axes are treated as already coincident.
const COINCIDENT_ANGLE: f64 = 1e-12;
const OPPOSITE_ANGLE_TOL: f64 = 1e-7;

/// An ordered triple of axes, expected to be orthonormal and right-handed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    pub z: Vector3<f64>,
}

impl Basis {
    pub fn new(x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>) -> Self {
        Self { x, y, z }
    }

    pub fn lab() -> Self {
        Self::new(Vector3::x(), Vector3::y(), Vector3::z())
    }

    /// (fast, slow, normal) of a panel frame.
    pub fn from_frame(frame: &Frame) -> Self {
        Self::new(frame.fast(), frame.slow(), frame.normal())
    }

    /// Axes as matrix columns.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.x, self.y, self.z])
    }

    fn validate(&self, which: &'static str, tol: f64) -> Result<(), GeometryError> {
        let m = self.matrix();
        let determinant = m.determinant();
        let drift = (m.transpose() * m - Matrix3::identity()).amax();
        if (determinant - 1.0).abs() > tol || drift > tol {
            return Err(GeometryError::NonOrthonormalBasis { which, determinant });
        }
        Ok(())
    }
}

/// Rotation `M` taking `original` onto `target`: `M·x = x′`, `M·y = y′`,
/// `M·z = z′`.
///
/// First x is swung onto x′ about their common perpendicular, then the result
/// is spun about x′ until z lands on z′.
#[instrument(skip_all)]
pub fn compute_frame_rotation(
    original: &Basis,
    target: &Basis,
    config: &GeometryConfig,
) -> Result<Rotation3<f64>, GeometryError> {
    let tol = config.basis_tolerance;
    original.validate("original", tol)?;
    target.validate("target", tol)?;

    let angle_x = original.x.angle(&target.x);
    let align_x = if angle_x < COINCIDENT_ANGLE {
        Rotation3::identity()
    } else if (PI - angle_x).abs() < OPPOSITE_ANGLE_TOL {
        // x′ ⟂ z′, so a half turn about z′ reverses x.
        Rotation3::from_axis_angle(&Unit::new_normalize(target.x.cross(&target.y)), PI)
    } else {
        match Unit::try_new(original.x.cross(&target.x), f64::EPSILON) {
            Some(axis) => Rotation3::from_axis_angle(&axis, angle_x),
            None => Rotation3::identity(),
        }
    };

    let z_once = align_x * original.z;
    let spin = target.x.dot(&z_once.cross(&target.z)).atan2(z_once.dot(&target.z));
    let align_z = Rotation3::from_axis_angle(&Unit::new_normalize(target.x), spin);

    let rotation = align_z * align_x;
    let determinant = rotation.matrix().determinant();
    if (determinant - 1.0).abs() > tol {
        return Err(GeometryError::NonOrthonormalBasis {
            which: "composed rotation",
            determinant,
        });
    }

    debug!(angle_x, spin, "computed frame rotation");
    Ok(rotation)
}
