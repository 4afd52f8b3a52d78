//! Integration tests for the detector model: hierarchy composition invariants
//! and the serialised view handed to export layers.

use nalgebra::{Rotation3, Vector3};
use proptest::prelude::*;

use detector_model::{Detector, Frame, Layout, Panel};

fn arb_rotation() -> impl Strategy<Value = Rotation3<f64>> {
    (-3.0f64..3.0, -3.0f64..3.0, -3.0f64..3.0).prop_map(|(a, b, c)| Rotation3::from_euler_angles(a, b, c))
}

fn arb_offset() -> impl Strategy<Value = Vector3<f64>> {
    (-500.0f64..500.0, -500.0f64..500.0, -500.0f64..500.0).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

fn make_frame(r: &Rotation3<f64>, origin: Vector3<f64>) -> Frame {
    Frame::new(r * Vector3::x(), r * Vector3::y(), origin).unwrap()
}

proptest! {
    #[test]
    fn root_motion_is_rigid(
        root_rot in arb_rotation(),
        root_origin in arb_offset(),
        shift in arb_offset(),
        turn in arb_rotation(),
    ) {
        let root = make_frame(&root_rot, root_origin);
        let panels = vec![
            Panel::new("a", Frame::lab(), (0.1, 0.1), (100, 100)),
            Panel::new("b", Frame::lab().translated(&Vector3::new(12.0, 0.0, 0.0)), (0.1, 0.1), (100, 100)),
        ];
        let mut det = Detector::with_hierarchy(root, panels);
        let before = (det.panel(1).unwrap().origin() - det.panel(0).unwrap().origin()).norm();

        det.translate(&shift);
        det.rotate(&turn);

        let after = (det.panel(1).unwrap().origin() - det.panel(0).unwrap().origin()).norm();
        prop_assert!((before - after).abs() < 1e-9, "panel spacing changed: {} -> {}", before, after);
        for p in &det {
            prop_assert!((p.fast_axis().norm() - 1.0).abs() < 1e-9);
            prop_assert!(p.fast_axis().dot(&p.slow_axis()).abs() < 1e-9);
        }
    }
}

#[test]
fn detector_serialises_layout_and_panels() {
    let root = Frame::new(Vector3::x(), -Vector3::y(), Vector3::new(0.0, 0.0, 100.0)).unwrap();
    let det = Detector::with_hierarchy(root, vec![Panel::new("p0", Frame::lab(), (0.172, 0.172), (487, 195))]);
    assert!(matches!(det.layout(), Layout::Hierarchy { .. }));

    let json = serde_json::to_value(&det).unwrap();
    assert_eq!(json["panels"][0]["name"], "p0");
    assert_eq!(json["panels"][0]["image_size"][0], 487);
    assert!(json["layout"]["Hierarchy"]["root"].is_object());
}
