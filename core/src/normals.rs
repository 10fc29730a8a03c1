//! Normal estimation
//!
//! Per-point normals from PCA on the k-nearest-neighbor covariance
//! matrix. Consumers in this workspace (axis estimation) are invariant
//! to normal sign, so no orientation pass is performed.

use crate::point_cloud::PointCloud;
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

// Wrapper for RTree
struct PointWrapper(usize, Point3<f64>);

impl RTreeObject for PointWrapper {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.1.x, self.1.y, self.1.z])
    }
}

impl PointDistance for PointWrapper {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.1.x - point[0];
        let dy = self.1.y - point[1];
        let dz = self.1.z - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Estimate normals for the point cloud using K-nearest neighbors.
/// Uses PCA on the covariance matrix of each neighborhood and modifies
/// the cloud in place.
pub fn estimate_normals(pc: &mut PointCloud, k: usize) {
    if pc.is_empty() {
        return;
    }

    let wrappers: Vec<PointWrapper> = pc
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| PointWrapper(i, *p))
        .collect();

    let tree = RTree::bulk_load(wrappers);

    let normals: Vec<Vector3<f64>> = pc
        .points
        .par_iter()
        .map(|p| {
            let query_point = [p.x, p.y, p.z];
            let neighbors: Vec<&PointWrapper> =
                tree.nearest_neighbor_iter(&query_point).take(k).collect();

            if neighbors.len() < 3 {
                return Vector3::new(0.0, 0.0, 1.0); // Default up
            }

            let mut centroid = Vector3::zeros();
            for n in &neighbors {
                centroid += n.1.coords;
            }
            centroid /= neighbors.len() as f64;

            let mut cov = Matrix3::zeros();
            for n in &neighbors {
                let d = n.1.coords - centroid;
                cov += d * d.transpose();
            }
            cov /= neighbors.len() as f64;

            let eigen = SymmetricEigen::new(cov);

            // Smallest-eigenvalue eigenvector is the surface normal
            let mut min_val = f64::MAX;
            let mut min_idx = 0;
            for i in 0..3 {
                let val = eigen.eigenvalues[i];
                if val < min_val {
                    min_val = val;
                    min_idx = i;
                }
            }

            eigen.eigenvectors.column(min_idx).into_owned()
        })
        .collect();

    pc.normals = Some(normals);
}
