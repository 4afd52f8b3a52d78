//! Geometry engine for diffraction detectors.
//!
//! - [`rotation`]: rotation between two orthonormal bases.
//! - [`distance`]: reset the sample-to-detector distance.
//! - [`beam_centre`]: reposition the detector for a requested beam centre,
//!   including two-theta offset geometries.
//! - [`projection`]: best-fit plane projection of a multi-panel detector and
//!   per-panel pixel transforms into that plane.

pub mod beam_centre;
pub mod config;
pub mod distance;
pub mod error;
pub mod projection;
pub mod rotation;

pub use beam_centre::{
    set_fast_slow_beam_centre_mm, set_mosflm_beam_centre, BeamCentreShift, TwoThetaOffset,
};
pub use config::{ClusteringConfig, GeometryConfig};
pub use distance::set_detector_distance;
pub use error::GeometryError;
pub use projection::{
    detector_image_transforms, detector_projection_2d_axes, panel_projection_2d_from_axes,
    AffineMap2d, AxisClusterer, AxisSource, Dbscan, DetectorProjection, NoClustering,
    PanelProjection2d, ProjectionPlane,
};
pub use rotation::{compute_frame_rotation, Basis};
