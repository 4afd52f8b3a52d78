//! Geometric model of a diffraction detector: panels, their reference frames,
//! an optional hierarchy root, and the incident beam.
//!
//! All lengths are millimetres in the laboratory frame.

pub mod beam;
pub mod detector;
pub mod error;
pub mod frame;
pub mod panel;

pub use beam::Beam;
pub use detector::{Detector, Layout};
pub use error::ModelError;
pub use frame::Frame;
pub use panel::Panel;

/// Tolerances used when validating model state.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Maximum deviation of |fast|, |slow| from 1 and of fast·slow from 0.
    pub orthonormality: f64,
    /// Denominators smaller than this mark a ray as parallel to a panel.
    pub ray_parallel: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            orthonormality: 1e-6,
            ray_parallel: 1e-12,
        }
    }
}

impl Tolerance {
    pub fn is_unit(&self, length: f64) -> bool {
        (length - 1.0).abs() < self.orthonormality
    }

    pub fn is_orthogonal(&self, dot: f64) -> bool {
        dot.abs() < self.orthonormality
    }
}

pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
