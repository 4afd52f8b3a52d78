use nalgebra::{Matrix3, Vector2, Vector3};
use serde::Serialize;

use crate::error::ModelError;
use crate::frame::Frame;
use crate::Tolerance;

/// A rigid rectangular sensor.
///
/// `frame` is the laboratory frame of the panel. `local` is the same frame
/// expressed relative to the parent hierarchy node; for panels of a flat
/// detector both are identical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    name: String,
    frame: Frame,
    local: Frame,
    /// (fast, slow) mm per pixel.
    pixel_size: (f64, f64),
    /// (fast, slow) pixel counts.
    image_size: (usize, usize),
}

impl Panel {
    pub fn new(
        name: impl Into<String>,
        frame: Frame,
        pixel_size: (f64, f64),
        image_size: (usize, usize),
    ) -> Self {
        Self {
            name: name.into(),
            frame,
            local: frame,
            pixel_size,
            image_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn local_frame(&self) -> &Frame {
        &self.local
    }

    pub(crate) fn set_frames(&mut self, frame: Frame, local: Frame) {
        self.frame = frame;
        self.local = local;
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.frame.origin()
    }

    pub fn fast_axis(&self) -> Vector3<f64> {
        self.frame.fast()
    }

    pub fn slow_axis(&self) -> Vector3<f64> {
        self.frame.slow()
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.frame.normal()
    }

    /// Signed distance from the laboratory origin along the panel normal.
    pub fn directed_distance(&self) -> f64 {
        self.origin().dot(&self.normal())
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        self.pixel_size
    }

    pub fn image_size(&self) -> (usize, usize) {
        self.image_size
    }

    pub fn image_size_mm(&self) -> (f64, f64) {
        (
            self.image_size.0 as f64 * self.pixel_size.0,
            self.image_size.1 as f64 * self.pixel_size.1,
        )
    }

    /// Laboratory position of a (fast, slow) millimetre coordinate.
    pub fn lab_coord(&self, xy: Vector2<f64>) -> Vector3<f64> {
        self.origin() + xy.x * self.fast_axis() + xy.y * self.slow_axis()
    }

    /// The four corners in laboratory space: origin, end of the fast edge,
    /// end of the slow edge, far corner.
    pub fn corners(&self) -> [Vector3<f64>; 4] {
        let (w, h) = self.image_size_mm();
        let o = self.origin();
        let f = w * self.fast_axis();
        let s = h * self.slow_axis();
        [o, o + f, o + s, o + f + s]
    }

    pub fn is_coord_valid(&self, xy: Vector2<f64>) -> bool {
        let (w, h) = self.image_size_mm();
        xy.x >= 0.0 && xy.x <= w && xy.y >= 0.0 && xy.y <= h
    }

    /// Solve `direction = a·fast + b·slow + c·origin`, i.e. the ray hits the
    /// panel plane at `direction / c`.
    fn ray_coefficients(&self, direction: &Vector3<f64>) -> Result<Vector3<f64>, ModelError> {
        let tol = Tolerance::default();
        let d = Matrix3::from_columns(&[self.fast_axis(), self.slow_axis(), self.origin()]);
        let v = d
            .try_inverse()
            .map(|inv| inv * direction)
            .filter(|v| v.z.abs() > tol.ray_parallel)
            .ok_or_else(|| ModelError::RayParallelToPanel {
                panel: self.name.clone(),
            })?;
        Ok(v)
    }

    /// (fast, slow) mm coordinate where the line through the laboratory origin
    /// along `direction` meets the panel plane, in either direction.
    pub fn bidirectional_ray_intersection(
        &self,
        direction: &Vector3<f64>,
    ) -> Result<Vector2<f64>, ModelError> {
        let v = self.ray_coefficients(direction)?;
        Ok(Vector2::new(v.x / v.z, v.y / v.z))
    }

    /// Like [`bidirectional_ray_intersection`](Self::bidirectional_ray_intersection)
    /// but only for rays travelling forward along `direction`. Returns the
    /// coordinate and the ray parameter of the hit.
    pub fn ray_intersection(&self, direction: &Vector3<f64>) -> Option<(Vector2<f64>, f64)> {
        let v = self.ray_coefficients(direction).ok()?;
        if v.z <= 0.0 {
            return None;
        }
        Some((Vector2::new(v.x / v.z, v.y / v.z), 1.0 / v.z))
    }
}
