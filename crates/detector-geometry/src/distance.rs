use detector_model::{Detector, Frame, Layout};
use tracing::{info, instrument};

use crate::config::GeometryConfig;
use crate::error::GeometryError;

/// Move the detector along its normal so that `origin·normal == distance`.
///
/// Under a hierarchy only the root frame moves. A flat multi-panel detector
/// must already have every panel sharing panel 0's normal and distance;
/// each panel is then moved independently. Axes are untouched.
#[instrument(skip(detector, config))]
pub fn set_detector_distance(
    detector: &mut Detector,
    distance: f64,
    config: &GeometryConfig,
) -> Result<(), GeometryError> {
    if let Layout::Flat = detector.layout() {
        check_flat_consistency(detector, config.consistency_tolerance)?;
    }
    detector.apply_frame_delta(|frame| at_distance(frame, distance));
    info!(distance, panels = detector.len(), "detector distance set");
    Ok(())
}

fn at_distance(frame: &Frame, distance: f64) -> Frame {
    let normal = frame.normal();
    let origin = frame.origin();
    let along = origin.dot(&normal);
    let in_plane = origin - along * normal;
    frame.with_origin(distance * normal + in_plane)
}

fn check_flat_consistency(detector: &Detector, tol: f64) -> Result<(), GeometryError> {
    let Some((first, rest)) = detector.panels().split_first() else {
        return Ok(());
    };
    let normal = first.normal();
    let dist = first.directed_distance();
    for (i, panel) in rest.iter().enumerate() {
        let drift = (panel.normal() - normal).amax();
        if drift > tol {
            return Err(GeometryError::InconsistentPanels {
                panel: i + 1,
                reason: format!("normal differs by {drift:.3e}"),
            });
        }
        let delta = (panel.directed_distance() - dist).abs();
        if delta > tol {
            return Err(GeometryError::InconsistentPanels {
                panel: i + 1,
                reason: format!("distance differs by {delta:.3e} mm"),
            });
        }
    }
    Ok(())
}
