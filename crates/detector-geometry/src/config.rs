//! Thresholds for the geometry operations.

use serde::{Deserialize, Serialize};

/// Parameters of the consensus-axis clustering used by plane projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Neighbourhood radius over unit axis vectors.
    pub eps: f64,
    /// Minimum neighbourhood size (including the point itself) for a core point.
    pub min_samples: usize,
    /// Cluster sums whose mutual angle is within this many degrees of 180° are
    /// merged as the same axis seen with opposite polarity.
    pub antiparallel_window_deg: f64,
    /// Upper bound on merge passes.
    pub max_merge_passes: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            eps: 0.1,
            min_samples: 2,
            antiparallel_window_deg: 5.0,
            max_merge_passes: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Allowed deviation of a basis from orthonormal (determinant and MᵀM).
    pub basis_tolerance: f64,
    /// Obliquity at or above which a two-theta offset is assumed (degrees).
    pub two_theta_threshold_deg: f64,
    /// Largest acute angle between beam and panel normal that is not
    /// treated as the beam lying in the panel plane (degrees).
    pub max_beam_panel_angle_deg: f64,
    /// Allowed beam-centre error after repositioning (mm).
    pub beam_centre_tolerance_mm: f64,
    /// Agreement required between panel normals and distances of a flat
    /// multi-panel detector.
    pub consistency_tolerance: f64,
    pub clustering: ClusteringConfig,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            basis_tolerance: 1e-7,
            two_theta_threshold_deg: 5.0,
            max_beam_panel_angle_deg: 89.9,
            beam_centre_tolerance_mm: 1e-4,
            consistency_tolerance: 1e-6,
            clustering: ClusteringConfig::default(),
        }
    }
}

impl GeometryConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn two_theta_threshold(&self) -> f64 {
        self.two_theta_threshold_deg.to_radians()
    }

    pub fn max_beam_panel_angle(&self) -> f64 {
        self.max_beam_panel_angle_deg.to_radians()
    }
}
