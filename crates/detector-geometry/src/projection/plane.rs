//! Best-fit plane through a multi-panel detector and the 2D projection of
//! every panel onto it.

use std::f64::consts::PI;

use detector_model::{Detector, ModelError};
use nalgebra::{Matrix3, Unit, Vector2, Vector3};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::cluster::AxisClusterer;
use crate::config::{ClusteringConfig, GeometryConfig};
use crate::error::GeometryError;

/// How the in-plane X axis was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisSource {
    /// Consensus of clustered panel axes.
    Clustered,
    /// Edges between the outermost detector corners.
    Corners,
}

/// Orthonormal (x, y, normal) frame of the fitted plane, centred on the
/// centroid of all panel corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionPlane {
    pub centroid: Vector3<f64>,
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    pub normal: Vector3<f64>,
}

impl ProjectionPlane {
    pub fn project_point(&self, p: &Vector3<f64>) -> Vector2<f64> {
        self.project_vector(&(p - self.centroid))
    }

    pub fn project_vector(&self, v: &Vector3<f64>) -> Vector2<f64> {
        Vector2::new(v.dot(&self.x), v.dot(&self.y))
    }
}

/// One panel's origin and axes in plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelProjection2d {
    pub origin: Vector2<f64>,
    pub fast: Vector2<f64>,
    pub slow: Vector2<f64>,
}

/// Per-panel projections in detector order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorProjection {
    pub origin: Vec<Vector2<f64>>,
    pub fast: Vec<Vector2<f64>>,
    pub slow: Vec<Vector2<f64>>,
    pub plane: ProjectionPlane,
    pub axis_source: AxisSource,
}

impl DetectorProjection {
    pub fn len(&self) -> usize {
        self.origin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origin.is_empty()
    }

    pub fn panel(&self, index: usize) -> Option<PanelProjection2d> {
        Some(PanelProjection2d {
            origin: *self.origin.get(index)?,
            fast: *self.fast.get(index)?,
            slow: *self.slow.get(index)?,
        })
    }

    pub fn panels(&self) -> impl Iterator<Item = PanelProjection2d> + '_ {
        (0..self.len()).filter_map(|i| self.panel(i))
    }
}

/// Project panel origins and fast/slow axes onto the plane best fitting all
/// panel corners.
///
/// The plane X axis is the consensus in-plane direction nearest lab +X.
/// Consensus comes from clustering the panel axes when there are several
/// panels and `clusterer` yields at least two clusters, otherwise from the
/// outer corners of the assembly.
#[instrument(skip_all, fields(panels = detector.len()))]
pub fn detector_projection_2d_axes(
    detector: &Detector,
    clusterer: &dyn AxisClusterer,
    config: &GeometryConfig,
) -> Result<DetectorProjection, GeometryError> {
    if detector.is_empty() {
        return Err(ModelError::EmptyDetector.into());
    }

    let vertices: Vec<Vector3<f64>> = detector.iter().flat_map(|p| p.corners()).collect();
    let (centroid, normal) = fit_plane(&vertices)?;

    let (candidates, axis_source) = match clustered_axes(detector, clusterer, &config.clustering) {
        Some(axes) => (axes, AxisSource::Clustered),
        None => (corner_axes(&vertices, &centroid), AxisSource::Corners),
    };
    let plane = plane_frame(centroid, normal, &candidates)?;
    debug!(?axis_source, x = ?plane.x, normal = ?plane.normal, "projection plane fitted");

    let mut origin = Vec::with_capacity(detector.len());
    let mut fast = Vec::with_capacity(detector.len());
    let mut slow = Vec::with_capacity(detector.len());
    for panel in detector {
        origin.push(plane.project_point(&panel.origin()));
        fast.push(plane.project_vector(&panel.fast_axis()));
        slow.push(plane.project_vector(&panel.slow_axis()));
    }

    Ok(DetectorProjection {
        origin,
        fast,
        slow,
        plane,
        axis_source,
    })
}

/// Centroid and unit normal of the least-squares plane. The normal points
/// away from the summed vertex positions.
fn fit_plane(vertices: &[Vector3<f64>]) -> Result<(Vector3<f64>, Vector3<f64>), GeometryError> {
    let sum: Vector3<f64> = vertices.iter().sum();
    let centroid = sum / vertices.len() as f64;
    let scatter = vertices.iter().fold(Matrix3::zeros(), |acc, v| {
        let r = v - centroid;
        acc + r * r.transpose()
    });

    let svd = scatter.svd(true, false);
    let u = svd.u.ok_or_else(|| GeometryError::PlaneFitFailed {
        reason: "SVD did not produce U".into(),
    })?;
    let largest = svd.singular_values.max();
    let spanning = svd
        .singular_values
        .iter()
        .filter(|s| **s > 1e-12 * largest)
        .count();
    if largest <= 0.0 || spanning < 2 {
        return Err(GeometryError::PlaneFitFailed {
            reason: format!("panel corners span {spanning} dimension(s)"),
        });
    }

    let mut normal = u.column(svd.singular_values.imin()).into_owned().normalize();
    if normal.dot(&sum) > 0.0 {
        normal = -normal;
    }
    Ok((centroid, normal))
}

fn clustered_axes(
    detector: &Detector,
    clusterer: &dyn AxisClusterer,
    config: &ClusteringConfig,
) -> Option<Vec<Vector3<f64>>> {
    if detector.len() < 2 {
        return None;
    }
    let axes: Vec<Vector3<f64>> = detector
        .iter()
        .flat_map(|p| [p.fast_axis(), p.slow_axis()])
        .collect();
    let labels = clusterer.cluster(&axes, config.eps, config.min_samples)?;
    if labels.len() != axes.len() {
        warn!(expected = axes.len(), got = labels.len(), "clusterer returned wrong label count");
        return None;
    }

    let clusters = labels.iter().flatten().max().map_or(0, |m| m + 1);
    if clusters < 2 {
        warn!(clusters, "too few axis clusters, falling back to corners");
        return None;
    }

    let mut sums = vec![Vector3::zeros(); clusters];
    for (axis, label) in axes.iter().zip(&labels) {
        if let Some(c) = label {
            sums[*c] += axis;
        }
    }
    Some(merge_antiparallel(sums, config))
}

/// Fold together cluster sums that point in nearly opposite directions.
fn merge_antiparallel(mut sums: Vec<Vector3<f64>>, config: &ClusteringConfig) -> Vec<Vector3<f64>> {
    let lo = 180.0 - config.antiparallel_window_deg;
    let hi = 180.0 + config.antiparallel_window_deg;
    let mut passes = 0;
    while let Some((i, j)) = antiparallel_pair(&sums, lo, hi) {
        if passes == config.max_merge_passes {
            warn!(passes, remaining = sums.len(), "cluster merge pass cap reached");
            break;
        }
        let opposite = sums.remove(j);
        sums[i] -= opposite;
        passes += 1;
    }
    sums
}

fn antiparallel_pair(sums: &[Vector3<f64>], lo: f64, hi: f64) -> Option<(usize, usize)> {
    let len = sums.len();
    (0..len)
        .flat_map(|i| (i + 1..len).map(move |j| (i, j)))
        .find(|&(i, j)| {
            let angle = sums[i].angle(&sums[j]).to_degrees();
            lo < angle && angle < hi
        })
}

/// The two shortest edges from one outer corner to the other outer corners.
fn corner_axes(vertices: &[Vector3<f64>], centroid: &Vector3<f64>) -> Vec<Vector3<f64>> {
    let dists: Vec<f64> = vertices.iter().map(|v| (v - centroid).norm()).collect();
    let mut sorted = dists.clone();
    sorted.sort_by(f64::total_cmp);
    let threshold = sorted[sorted.len().saturating_sub(4)];

    let corners: Vec<Vector3<f64>> = vertices
        .iter()
        .zip(&dists)
        .filter(|(_, d)| **d >= threshold)
        .map(|(v, _)| *v)
        .collect();
    let mut axes: Vec<Vector3<f64>> = corners[1..].iter().map(|c| c - corners[0]).collect();
    axes.sort_by(|a, b| a.norm().total_cmp(&b.norm()));
    axes.truncate(2);
    axes
}

fn plane_frame(
    centroid: Vector3<f64>,
    normal: Vector3<f64>,
    candidates: &[Vector3<f64>],
) -> Result<ProjectionPlane, GeometryError> {
    let lab_x = Vector3::x();
    let acute = |v: &Vector3<f64>| {
        let a = v.angle(&lab_x);
        a.min(PI - a)
    };
    let x = candidates
        .iter()
        .filter(|v| v.norm() > f64::EPSILON)
        .min_by(|a, b| acute(a).total_cmp(&acute(b)))
        .copied()
        .ok_or_else(|| GeometryError::DegenerateProjection {
            reason: "no usable in-plane axis".into(),
        })?;
    let x = if x.dot(&lab_x) < 0.0 { -x } else { x };

    let y = Unit::try_new(normal.cross(&x), 1e-12)
        .ok_or_else(|| GeometryError::DegenerateProjection {
            reason: "consensus axis is parallel to the plane normal".into(),
        })?
        .into_inner();
    let x = y.cross(&normal).normalize();

    Ok(ProjectionPlane {
        centroid,
        x,
        y,
        normal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::cluster::{Dbscan, NoClustering};
    use approx::assert_relative_eq;
    use detector_model::{Frame, Panel};

    fn panel(fast: Vector3<f64>, slow: Vector3<f64>, origin: Vector3<f64>) -> Panel {
        Panel::new("p", Frame::new(fast, slow, origin).unwrap(), (0.1, 0.1), (1000, 500))
    }

    #[test]
    fn test_single_panel_axes() {
        let det = Detector::new(vec![panel(Vector3::x(), -Vector3::y(), Vector3::new(-50.0, 25.0, 200.0))]);
        let proj = detector_projection_2d_axes(&det, &Dbscan, &GeometryConfig::default()).unwrap();
        assert_eq!(proj.axis_source, AxisSource::Corners);
        assert_relative_eq!(proj.plane.normal, -Vector3::z(), epsilon = 1e-9);
        assert_relative_eq!(proj.fast[0], Vector2::new(1.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(proj.slow[0], Vector2::new(0.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(proj.origin[0], Vector2::new(-50.0, -25.0), epsilon = 1e-9);
    }

    #[test]
    fn test_colinear_corners_fail() {
        let vertices = vec![Vector3::x(), 2.0 * Vector3::x(), 3.0 * Vector3::x(), 4.0 * Vector3::x()];
        assert!(matches!(fit_plane(&vertices), Err(GeometryError::PlaneFitFailed { .. })));
    }

    #[test]
    fn test_empty_detector() {
        let err = detector_projection_2d_axes(&Detector::new(vec![]), &Dbscan, &GeometryConfig::default()).unwrap_err();
        assert_eq!(err, GeometryError::Model(ModelError::EmptyDetector));
    }

    #[test]
    fn test_inverted_panels_merge_into_one_axis() {
        // Two upright panels then two mounted upside down.
        let det = Detector::new(vec![
            panel(Vector3::x(), -Vector3::y(), Vector3::new(-200.0, 25.0, 200.0)),
            panel(Vector3::x(), -Vector3::y(), Vector3::new(-100.0, 25.0, 200.0)),
            panel(-Vector3::x(), Vector3::y(), Vector3::new(100.0, -25.0, 200.0)),
            panel(-Vector3::x(), Vector3::y(), Vector3::new(200.0, -25.0, 200.0)),
        ]);
        let proj = detector_projection_2d_axes(&det, &Dbscan, &GeometryConfig::default()).unwrap();
        assert_eq!(proj.axis_source, AxisSource::Clustered);
        assert_relative_eq!(proj.plane.x, Vector3::x(), epsilon = 1e-9);
        assert_relative_eq!(proj.fast[2], Vector2::new(-1.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(proj.slow[2], Vector2::new(0.0, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_absent_clusterer_uses_corners() {
        let det = Detector::new(vec![
            panel(Vector3::x(), -Vector3::y(), Vector3::new(-100.0, 25.0, 200.0)),
            panel(Vector3::x(), -Vector3::y(), Vector3::new(0.0, 25.0, 200.0)),
        ]);
        let proj = detector_projection_2d_axes(&det, &NoClustering, &GeometryConfig::default()).unwrap();
        assert_eq!(proj.axis_source, AxisSource::Corners);
        assert_relative_eq!(proj.plane.x, Vector3::x(), epsilon = 1e-9);
    }

    #[test]
    fn test_merge_respects_pass_cap() {
        let sums = vec![Vector3::x(), -Vector3::x(), Vector3::y(), -Vector3::y()];
        let capped = ClusteringConfig {
            max_merge_passes: 1,
            ..ClusteringConfig::default()
        };
        assert_eq!(merge_antiparallel(sums.clone(), &capped).len(), 3);
        let merged = merge_antiparallel(sums, &ClusteringConfig::default());
        assert_eq!(merged, vec![2.0 * Vector3::x(), 2.0 * Vector3::y()]);
    }

    #[test]
    fn test_noise_labels_are_ignored() {
        struct Fixed;
        impl AxisClusterer for Fixed {
            fn cluster(&self, _: &[Vector3<f64>], _: f64, _: usize) -> Option<Vec<Option<usize>>> {
                Some(vec![Some(0), Some(1), None, Some(1)])
            }
        }
        let det = Detector::new(vec![
            panel(Vector3::x(), -Vector3::y(), Vector3::new(-100.0, 25.0, 200.0)),
            panel(Vector3::y(), Vector3::x(), Vector3::new(0.0, 25.0, -200.0)),
        ]);
        let axes = clustered_axes(&det, &Fixed, &ClusteringConfig::default()).unwrap();
        assert_eq!(axes.len(), 2);
        assert_relative_eq!(axes[0], Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(axes[1], -Vector3::y() + Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_projection_panel_accessor() {
        let det = Detector::new(vec![panel(Vector3::x(), -Vector3::y(), Vector3::new(0.0, 0.0, 100.0))]);
        let proj = detector_projection_2d_axes(&det, &NoClustering, &GeometryConfig::default()).unwrap();
        assert_eq!(proj.panels().count(), 1);
        assert!(proj.panel(1).is_none());
    }
}
