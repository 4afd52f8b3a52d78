//! Density clustering of panel axis directions.

use nalgebra::Vector3;
use tracing::trace;

/// Cluster id of one input vector; `None` marks noise.
pub type ClusterLabel = Option<usize>;

/// Source of cluster labels for a set of axis vectors.
///
/// Returning `None` means the capability is unavailable; plane projection then
/// falls back to the corner method without reporting an error.
pub trait AxisClusterer {
    fn cluster(
        &self,
        vectors: &[Vector3<f64>],
        eps: f64,
        min_samples: usize,
    ) -> Option<Vec<ClusterLabel>>;
}

/// No clustering available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClustering;

impl AxisClusterer for NoClustering {
    fn cluster(&self, _: &[Vector3<f64>], _: f64, _: usize) -> Option<Vec<ClusterLabel>> {
        None
    }
}

/// DBSCAN over Euclidean distance.
///
/// A point is core when at least `min_samples` points (itself included) lie
/// within `eps`. Clusters are numbered in order of their first core point.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dbscan;

impl Dbscan {
    fn neighbours(vectors: &[Vector3<f64>], i: usize, eps: f64) -> Vec<usize> {
        vectors
            .iter()
            .enumerate()
            .filter(|(_, v)| (*v - vectors[i]).norm() <= eps)
            .map(|(j, _)| j)
            .collect()
    }
}

impl AxisClusterer for Dbscan {
    fn cluster(
        &self,
        vectors: &[Vector3<f64>],
        eps: f64,
        min_samples: usize,
    ) -> Option<Vec<ClusterLabel>> {
        let n = vectors.len();
        let mut labels: Vec<ClusterLabel> = vec![None; n];
        let mut visited = vec![false; n];
        let mut next = 0;

        for i in 0..n {
            if visited[i] {
                continue;
            }
            visited[i] = true;
            let seeds = Self::neighbours(vectors, i, eps);
            if seeds.len() < min_samples {
                continue;
            }

            let id = next;
            next += 1;
            labels[i] = Some(id);
            let mut queue = seeds;
            while let Some(j) = queue.pop() {
                if labels[j].is_none() {
                    labels[j] = Some(id);
                }
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                let reach = Self::neighbours(vectors, j, eps);
                if reach.len() >= min_samples {
                    queue.extend(reach.into_iter().filter(|&k| !visited[k] || labels[k].is_none()));
                }
            }
        }

        trace!(clusters = next, points = n, "dbscan finished");
        Some(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_groups_and_noise() {
        let v = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.99, 0.02, 0.0),
            Vector3::new(0.01, 0.99, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        let labels = Dbscan.cluster(&v, 0.1, 2).unwrap();
        assert_eq!(labels, vec![Some(0), Some(1), Some(0), Some(1), None]);
    }

    #[test]
    fn test_chain_is_density_connected() {
        let v: Vec<_> = (0..5).map(|i| Vector3::new(i as f64 * 0.08, 0.0, 0.0)).collect();
        let labels = Dbscan.cluster(&v, 0.1, 2).unwrap();
        assert!(labels.iter().all(|l| *l == Some(0)));
    }

    #[test]
    fn test_min_samples_counts_self() {
        let v = vec![Vector3::x(), Vector3::y()];
        assert_eq!(Dbscan.cluster(&v, 0.1, 1).unwrap(), vec![Some(0), Some(1)]);
        assert_eq!(Dbscan.cluster(&v, 0.1, 2).unwrap(), vec![None, None]);
    }

    #[test]
    fn test_no_clustering_is_absent() {
        assert!(NoClustering.cluster(&[Vector3::x()], 0.1, 2).is_none());
    }
}
