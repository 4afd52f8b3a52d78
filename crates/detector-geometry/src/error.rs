use detector_model::ModelError;
use nalgebra::Vector2;
use thiserror::Error;

/// Geometric invariant violations. None of these are transient; they point
/// at inconsistent caller-supplied geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{which} basis is not orthonormal right-handed (det = {determinant:.9})")]
    NonOrthonormalBasis {
        which: &'static str,
        determinant: f64,
    },

    #[error("panel {panel} is inconsistent with panel 0: {reason}")]
    InconsistentPanels { panel: usize, reason: String },

    #[error("beam lies within the plane of the detector panel (angle to normal {angle_deg:.3}°)")]
    BeamInPanelPlane { angle_deg: f64 },

    #[error("beam centre mismatch after translation: expected {expected:?}, got {actual:?} ({error_mm:.3e} mm)")]
    BeamCentreMismatch {
        expected: Vector2<f64>,
        actual: Vector2<f64>,
        error_mm: f64,
    },

    #[error("degenerate projection: {reason}")]
    DegenerateProjection { reason: String },

    #[error("plane fit failed: {reason}")]
    PlaneFitFailed { reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}
