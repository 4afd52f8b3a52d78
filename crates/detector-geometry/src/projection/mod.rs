//! Multi-panel detector projection onto a single best-fit plane.

pub mod cluster;
pub mod image;
pub mod plane;

pub use cluster::{AxisClusterer, ClusterLabel, Dbscan, NoClustering};
pub use image::{panel_projection_2d_from_axes, AffineMap2d};
pub use plane::{
    detector_projection_2d_axes, AxisSource, DetectorProjection, PanelProjection2d, ProjectionPlane,
};

use detector_model::Detector;
use tracing::instrument;

use crate::config::GeometryConfig;
use crate::error::GeometryError;

/// Pixel transform of every panel into the composite image, in detector
/// order.
#[instrument(skip_all, fields(panels = detector.len()))]
pub fn detector_image_transforms(
    detector: &Detector,
    clusterer: &dyn AxisClusterer,
    config: &GeometryConfig,
) -> Result<Vec<AffineMap2d>, GeometryError> {
    let projection = detector_projection_2d_axes(detector, clusterer, config)?;
    detector
        .iter()
        .zip(projection.panels())
        .map(|(panel, axes)| panel_projection_2d_from_axes(panel, &axes))
        .collect()
}
