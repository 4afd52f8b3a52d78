use nalgebra::{Unit, Vector3};
use serde::Serialize;

use crate::error::ModelError;

/// The incident beam, reduced to its unit direction in the laboratory frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Beam {
    direction: Unit<Vector3<f64>>,
}

impl Beam {
    /// Normalises `direction`; zero vectors are rejected.
    pub fn new(direction: Vector3<f64>) -> Result<Self, ModelError> {
        Unit::try_new(direction, 1e-15)
            .map(|direction| Self { direction })
            .ok_or(ModelError::ZeroBeamDirection)
    }

    pub fn from_unit(direction: Unit<Vector3<f64>>) -> Self {
        Self { direction }
    }

    pub fn unit_s0(&self) -> Vector3<f64> {
        self.direction.into_inner()
    }
}
