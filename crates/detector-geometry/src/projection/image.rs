use detector_model::Panel;
use nalgebra::{Matrix2, Matrix3, Matrix3x4, Matrix4, Matrix4x3, Unit, Vector2, Vector3};
use serde::Serialize;
use tracing::trace;

use super::plane::PanelProjection2d;
use crate::error::GeometryError;

/// `target = rotation · (row, col) + translation`.
///
/// Targets are (row, col) pixels of the composite image, measured from the
/// centroid of the projected detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffineMap2d {
    pub rotation: Matrix2<f64>,
    pub translation: Vector2<f64>,
}

impl AffineMap2d {
    pub fn apply(&self, row: f64, col: f64) -> Vector2<f64> {
        self.rotation * Vector2::new(row, col) + self.translation
    }
}

/// Affine map from pixel (row, col) on `panel` to (row, col) on the
/// composite image, given the panel's projected origin and axes.
///
/// The chain is: panel pixels to panel-centred millimetres, then onto the
/// projection plane, then back to composite-image pixels of the same size.
pub fn panel_projection_2d_from_axes(
    panel: &Panel,
    axes: &PanelProjection2d,
) -> Result<AffineMap2d, GeometryError> {
    let (ps_f, ps_s) = panel.pixel_size();
    if !(ps_f > 0.0 && ps_s > 0.0) {
        return Err(GeometryError::DegenerateProjection {
            reason: format!("panel {} has pixel size ({ps_f}, {ps_s})", panel.name()),
        });
    }
    let (w, h) = panel.image_size();
    let half_w = (w as f64 - 1.0) / 2.0;
    let half_h = (h as f64 - 1.0) / 2.0;

    let fast = Vector3::new(axes.fast.x, axes.fast.y, 0.0);
    let slow = Vector3::new(axes.slow.x, axes.slow.y, 0.0);
    let origin = Vector3::new(axes.origin.x, axes.origin.y, 0.0);
    let centre = origin + half_h * ps_s * slow + half_w * ps_f * fast;
    let normal = Unit::try_new(slow.cross(&fast), 1e-12)
        .ok_or_else(|| GeometryError::DegenerateProjection {
            reason: format!("projected axes of panel {} are parallel", panel.name()),
        })?
        .into_inner();

    // Rows fast, -slow, normal: plane to panel-centred coordinates.
    let to_panel = Matrix3::from_rows(&[fast.transpose(), (-slow).transpose(), normal.transpose()]);
    let mut panel_to_plane = Matrix4::<f64>::identity();
    panel_to_plane
        .fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&to_panel.transpose());
    panel_to_plane.fixed_view_mut::<3, 1>(0, 3).copy_from(&centre);

    #[rustfmt::skip]
    let pixel_to_mm = Matrix4x3::new(
        0.0,   ps_f, -ps_f * half_w,
        -ps_s, 0.0,  ps_s * half_h,
        0.0,   0.0,  0.0,
        0.0,   0.0,  1.0,
    );
    #[rustfmt::skip]
    let mm_to_pixel = Matrix3x4::new(
        0.0,        1.0 / ps_s, 0.0, 0.0,
        1.0 / ps_f, 0.0,        0.0, 0.0,
        0.0,        0.0,        0.0, 1.0,
    );

    let t = mm_to_pixel * panel_to_plane * pixel_to_mm;
    trace!(panel = panel.name(), ?t, "panel image transform");
    Ok(AffineMap2d {
        rotation: Matrix2::new(t[(0, 0)], t[(0, 1)], t[(1, 0)], t[(1, 1)]),
        translation: Vector2::new(t[(0, 2)], t[(1, 2)]),
    })
}
