//! Property-based tests for geometry invariants using the `proptest` crate.

use proptest::prelude::*;

use detector_geometry::{
    Basis, GeometryConfig, compute_frame_rotation, set_detector_distance,
    set_fast_slow_beam_centre_mm,
};
use nalgebra::{Matrix3, Rotation3, Vector2, Vector3};
use test_harness::assertions::assert_rotation;
use test_harness::builders::*;
use test_harness::oracle::check_rigid_assembly;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Arbitrary rotation from Euler angles.
fn arb_rotation() -> impl Strategy<Value = Rotation3<f64>> {
    (
        -std::f64::consts::PI..std::f64::consts::PI,
        -1.5f64..1.5,
        -std::f64::consts::PI..std::f64::consts::PI,
    )
        .prop_map(|(r, p, y)| Rotation3::from_euler_angles(r, p, y))
}

fn arb_basis() -> impl Strategy<Value = Basis> {
    arb_rotation().prop_map(|r| Basis::new(r * Vector3::x(), r * Vector3::y(), r * Vector3::z()))
}

/// Signed directed distance of a detector facing the sample.
fn arb_distance() -> impl Strategy<Value = f64> {
    -1000.0f64..-10.0
}

/// Beam centre inside a 100 mm panel.
fn arb_centre() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..PANEL_MM, 0.0f64..PANEL_MM)
}

const TOL: f64 = 1e-6;

// ---------------------------------------------------------------------------
// 1. Frame rotation maps every axis and is a proper rotation
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn frame_rotation_maps_axes(a in arb_basis(), b in arb_basis()) {
        let m = compute_frame_rotation(&a, &b, &GeometryConfig::default()).unwrap();
        prop_assert!((m * a.x - b.x).norm() < TOL, "x: {:?} vs {:?}", m * a.x, b.x);
        prop_assert!((m * a.y - b.y).norm() < TOL, "y: {:?} vs {:?}", m * a.y, b.y);
        prop_assert!((m * a.z - b.z).norm() < TOL, "z: {:?} vs {:?}", m * a.z, b.z);
        prop_assert!(assert_rotation(m.matrix(), TOL, "frame rotation").is_ok());
    }

    #[test]
    fn frame_rotation_of_basis_onto_itself_is_identity(a in arb_basis()) {
        let m = compute_frame_rotation(&a, &a, &GeometryConfig::default()).unwrap();
        prop_assert!((m.matrix() - Matrix3::identity()).amax() < TOL);
    }
}

// ---------------------------------------------------------------------------
// 2. Distance setter: exact distance, rigid hierarchy
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn distance_is_exact_and_rigid(tilt in -60.0f64..60.0, distance in arb_distance()) {
        let before = tilted_detector(tilt, true);
        let mut det = before.clone();
        set_detector_distance(&mut det, distance, &GeometryConfig::default()).unwrap();
        for p in &det {
            prop_assert!((p.directed_distance() - distance).abs() < 1e-9,
                "{}: {} vs {}", p.name(), p.directed_distance(), distance);
        }
        let verdict = check_rigid_assembly(&before, &det, 1e-9);
        prop_assert!(verdict.passed, "{}", verdict.detail);
    }
}

// ---------------------------------------------------------------------------
// 3. Beam centre is recovered by re-querying the beam intersection
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn beam_centre_is_recovered(
        (fast, slow) in arb_centre(),
        obliquity in 0.0f64..4.5,
        hierarchical in any::<bool>(),
    ) {
        let mut det = tilted_detector(obliquity, hierarchical);
        let centre = Vector2::new(fast, slow);
        let shift = set_fast_slow_beam_centre_mm(&mut det, &beam(), centre, Some(0), &GeometryConfig::default())
            .unwrap();
        prop_assert!(shift.two_theta.is_none());
        let xy = det.panels()[0].bidirectional_ray_intersection(&beam().unit_s0()).unwrap();
        prop_assert!((xy - centre).norm() < TOL, "{:?} vs {:?}", xy, centre);
    }
}
