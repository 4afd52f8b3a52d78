use thiserror::Error;

/// Failures raised while building or querying the detector model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("frame axes are not orthonormal: |fast|={fast_norm:.9}, |slow|={slow_norm:.9}, fast·slow={dot:.3e}")]
    NonOrthonormalFrame {
        fast_norm: f64,
        slow_norm: f64,
        dot: f64,
    },

    #[error("beam direction has zero length")]
    ZeroBeamDirection,

    #[error("panel index {index} out of range for detector with {len} panels")]
    PanelIndexOutOfRange { index: usize, len: usize },

    #[error("ray is parallel to panel '{panel}'")]
    RayParallelToPanel { panel: String },

    #[error("detector has no panels")]
    EmptyDetector,
}
