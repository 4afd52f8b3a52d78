use detector_model::{Beam, Detector, ModelError};
use nalgebra::{Rotation3, Unit, Vector2, Vector3};
use tracing::{debug, info, instrument};

use crate::config::GeometryConfig;
use crate::error::GeometryError;

/// Tilt of the detector assembly away from the direct beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoThetaOffset {
    pub axis: Unit<Vector3<f64>>,
    /// Radians.
    pub angle: f64,
}

impl TwoThetaOffset {
    /// Rotation taking the beam direction onto the (sign-matched) panel normal.
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.axis, self.angle)
    }
}

/// What [`set_fast_slow_beam_centre_mm`] did to the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamCentreShift {
    /// Panel the beam centre refers to.
    pub panel: usize,
    /// Translation applied in the untilted geometry.
    pub translation: Vector3<f64>,
    /// Lab position of the beam centre in the untilted geometry.
    pub beam_centre_lab: Vector3<f64>,
    pub two_theta: Option<TwoThetaOffset>,
}

/// Translate the detector so that the beam meets `panel_id` at
/// `beam_centre` = (fast, slow) mm.
///
/// Without an explicit panel the one hit by the beam (or by its reverse) is
/// used, falling back to panel 0. If the beam is 5° or more off the panel
/// normal the tilt is treated as a two-theta offset: it is undone, the
/// centre is set for the untilted detector, and the tilt is re-applied. On
/// error the detector is left as it was.
#[instrument(skip(detector, beam, config), fields(fast = beam_centre.x, slow = beam_centre.y))]
pub fn set_fast_slow_beam_centre_mm(
    detector: &mut Detector,
    beam: &Beam,
    beam_centre: Vector2<f64>,
    panel_id: Option<usize>,
    config: &GeometryConfig,
) -> Result<BeamCentreShift, GeometryError> {
    if detector.is_empty() {
        return Err(ModelError::EmptyDetector.into());
    }
    let s0 = beam.unit_s0();
    let panel_id = match panel_id {
        Some(id) => {
            detector.panel(id)?;
            id
        }
        None => detector
            .panel_intersection(&s0)
            .or_else(|| detector.panel_intersection(&-s0))
            .unwrap_or(0),
    };

    let normal = detector.panel(panel_id)?.normal();
    let facing = if normal.dot(&s0) < 0.0 { -normal } else { normal };
    let angle = s0.angle(&facing);
    if angle > config.max_beam_panel_angle() {
        return Err(GeometryError::BeamInPanelPlane {
            angle_deg: angle.to_degrees(),
        });
    }

    let two_theta = if angle >= config.two_theta_threshold() {
        Unit::try_new(s0.cross(&facing), f64::EPSILON).map(|axis| TwoThetaOffset { axis, angle })
    } else {
        None
    };
    debug!(
        panel_id,
        obliquity_deg = angle.to_degrees(),
        two_theta = two_theta.is_some(),
        "selected beam-centre panel"
    );

    let snapshot = detector.clone();
    let result = reposition(detector, &s0, beam_centre, panel_id, two_theta, config);
    match result {
        Ok(shift) => {
            info!(panel_id, translation = ?shift.translation, "beam centre set");
            Ok(shift)
        }
        Err(err) => {
            *detector = snapshot;
            Err(err)
        }
    }
}

fn reposition(
    detector: &mut Detector,
    s0: &Vector3<f64>,
    beam_centre: Vector2<f64>,
    panel_id: usize,
    two_theta: Option<TwoThetaOffset>,
    config: &GeometryConfig,
) -> Result<BeamCentreShift, GeometryError> {
    if let Some(offset) = &two_theta {
        detector.rotate(&offset.rotation().inverse());
    }

    let panel = detector.panel(panel_id)?;
    let beam_distance = panel.directed_distance() / s0.dot(&panel.normal());
    let beam_centre_lab = beam_distance * s0;
    let intersection_lab = panel.lab_coord(beam_centre);
    let translation = beam_centre_lab - intersection_lab;
    detector.translate(&translation);

    let actual = detector.panel(panel_id)?.bidirectional_ray_intersection(s0)?;
    let error_mm = (actual - beam_centre).norm();
    if !(error_mm < config.beam_centre_tolerance_mm) {
        return Err(GeometryError::BeamCentreMismatch {
            expected: beam_centre,
            actual,
            error_mm,
        });
    }

    if let Some(offset) = &two_theta {
        detector.rotate(&offset.rotation());
    }

    Ok(BeamCentreShift {
        panel: panel_id,
        translation,
        beam_centre_lab,
        two_theta,
    })
}

/// Beam centre given in (slow, fast) mm order.
pub fn set_mosflm_beam_centre(
    detector: &mut Detector,
    beam: &Beam,
    mosflm_beam_centre: Vector2<f64>,
    config: &GeometryConfig,
) -> Result<BeamCentreShift, GeometryError> {
    let fast_slow = Vector2::new(mosflm_beam_centre.y, mosflm_beam_centre.x);
    set_fast_slow_beam_centre_mm(detector, beam, fast_slow, None, config)
}
