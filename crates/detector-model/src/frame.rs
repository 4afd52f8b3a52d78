use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::Serialize;

use crate::error::ModelError;
use crate::Tolerance;

/// A right-handed panel reference frame: in-plane fast and slow unit axes plus
/// the position of the first pixel corner.
///
/// The normal is `fast × slow`. Construction rejects axes that are not
/// orthonormal, and every transformation offered here is rigid, so a `Frame`
/// stays orthonormal for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    fast: Vector3<f64>,
    slow: Vector3<f64>,
    origin: Vector3<f64>,
}

impl Frame {
    pub fn new(
        fast: Vector3<f64>,
        slow: Vector3<f64>,
        origin: Vector3<f64>,
    ) -> Result<Self, ModelError> {
        Self::with_tolerance(fast, slow, origin, &Tolerance::default())
    }

    pub fn with_tolerance(
        fast: Vector3<f64>,
        slow: Vector3<f64>,
        origin: Vector3<f64>,
        tol: &Tolerance,
    ) -> Result<Self, ModelError> {
        let fast_norm = fast.norm();
        let slow_norm = slow.norm();
        let dot = fast.dot(&slow);
        if !(tol.is_unit(fast_norm) && tol.is_unit(slow_norm) && tol.is_orthogonal(dot)) {
            return Err(ModelError::NonOrthonormalFrame {
                fast_norm,
                slow_norm,
                dot,
            });
        }
        Ok(Self { fast, slow, origin })
    }

    /// The laboratory frame itself: fast = +X, slow = +Y, origin at zero.
    pub fn lab() -> Self {
        Self {
            fast: Vector3::x(),
            slow: Vector3::y(),
            origin: Vector3::zeros(),
        }
    }

    pub fn fast(&self) -> Vector3<f64> {
        self.fast
    }

    pub fn slow(&self) -> Vector3<f64> {
        self.slow
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.origin
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.fast.cross(&self.slow).normalize()
    }

    /// Columns are fast, slow, normal.
    pub fn basis(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.fast, self.slow, self.normal()])
    }

    /// Rotate axes and origin about the laboratory origin.
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Self {
        Self {
            fast: rotation * self.fast,
            slow: rotation * self.slow,
            origin: rotation * self.origin,
        }
    }

    pub fn translated(&self, shift: &Vector3<f64>) -> Self {
        Self {
            origin: self.origin + shift,
            ..*self
        }
    }

    pub fn with_origin(&self, origin: Vector3<f64>) -> Self {
        Self { origin, ..*self }
    }

    /// Express a child frame, given in this frame's (fast, slow, normal)
    /// coordinates, in the laboratory frame.
    pub fn compose(&self, local: &Frame) -> Self {
        let basis = self.basis();
        Self {
            fast: basis * local.fast,
            slow: basis * local.slow,
            origin: self.origin + basis * local.origin,
        }
    }

    /// Inverse of [`compose`](Self::compose): express a laboratory frame in
    /// this frame's coordinates.
    pub fn relative(&self, lab: &Frame) -> Self {
        let inv = self.basis().transpose();
        Self {
            fast: inv * lab.fast,
            slow: inv * lab.slow,
            origin: inv * (lab.origin - self.origin),
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::lab()
    }
}
