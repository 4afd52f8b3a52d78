//! Canned detector layouts.
//!
//! All panels are 1000 × 1000 pixels of 0.1 mm with fast = +X and slow = -Y
//! before any tilt, so a panel is 100 mm square and its normal faces the
//! sample along -Z.

use detector_model::{Beam, Detector, Frame, Panel};
use nalgebra::{Matrix3, Rotation3, Vector3};

pub const PIXEL_SIZE: (f64, f64) = (0.1, 0.1);
pub const IMAGE_SIZE: (usize, usize) = (1000, 1000);
pub const PANEL_MM: f64 = 100.0;

// Exact half turn about +X: the lab frame becomes (+X, -Y, -Z).
fn frame(origin: Vector3<f64>) -> Frame {
    #[rustfmt::skip]
    let flip = Rotation3::from_matrix_unchecked(Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, -1.0, 0.0,
        0.0, 0.0, -1.0,
    ));
    Frame::lab().rotated(&flip).with_origin(origin)
}

pub fn panel(name: &str, origin: Vector3<f64>) -> Panel {
    Panel::new(name, frame(origin), PIXEL_SIZE, IMAGE_SIZE)
}

/// Beam along +Z.
pub fn beam() -> Beam {
    Beam::from_unit(Vector3::z_axis())
}

/// One panel centred on the beam at `distance`.
pub fn flat_single(distance: f64) -> Detector {
    Detector::new(vec![panel("single", Vector3::new(-50.0, 50.0, distance))])
}

/// Two side-by-side panels at `distance`, each with its own laboratory frame.
pub fn two_panel_flat(distance: f64) -> Detector {
    Detector::new(vec![
        panel("left", Vector3::new(-100.0, 50.0, distance)),
        panel("right", Vector3::new(0.0, 50.0, distance)),
    ])
}

/// The panels of [`two_panel_flat`] under a root frame at (0, 0, `distance`)
/// with axes (+X, -Y, -Z).
pub fn two_panel_hierarchy(distance: f64) -> Detector {
    let root = frame(Vector3::new(0.0, 0.0, distance));
    let local = |name: &str, x: f64| {
        let at = Frame::lab().with_origin(Vector3::new(x, -50.0, 0.0));
        Panel::new(name, at, PIXEL_SIZE, IMAGE_SIZE)
    };
    Detector::with_hierarchy(root, vec![local("left", -100.0), local("right", 0.0)])
}

/// A detector rotated rigidly about lab +X by `obliquity_deg` about the
/// sample, so that the beam meets the panels at that angle to the normal.
pub fn tilted_detector(obliquity_deg: f64, hierarchical: bool) -> Detector {
    let mut detector = if hierarchical {
        two_panel_hierarchy(200.0)
    } else {
        two_panel_flat(200.0)
    };
    detector.rotate(&Rotation3::from_axis_angle(&Vector3::x_axis(), obliquity_deg.to_radians()));
    detector
}
