//! Robust cylinder fitting.
//!
//! A minimal sample is two oriented points: the cross product of their
//! normals fixes the axis direction, the closest approach of the two
//! normal lines fixes a point on the axis, and the mean perpendicular
//! distance of the sample fixes the radius. The winning candidate is
//! refit by unweighted least squares over its inlier set.

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use tireprof_core::{estimate_normals, PointCloud, Ransac, RobustConfig, RobustModel};

use crate::{Error, Result};

/// A 3D point with an associated unit surface normal.
#[derive(Debug, Clone, Copy)]
pub struct OrientedPoint {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

/// Estimated cylinder model.
///
/// Invariants: `axis_direction` has unit norm, `radius` is finite and
/// positive. `inliers` holds indices into the input point set.
#[derive(Debug, Clone)]
pub struct CylinderModel {
    pub axis_point: Point3<f64>,
    pub axis_direction: Vector3<f64>,
    pub radius: f64,
    pub inliers: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct CylinderFitConfig {
    /// Max |distance-to-axis − radius| for a point to count as an inlier.
    pub threshold: f64,
    pub max_iterations: usize,
    /// The fit fails when fewer than this fraction of points are inliers.
    pub min_inlier_fraction: f64,
    /// Neighborhood size for normal estimation when the cloud has none.
    pub normal_k: usize,
    /// Seed for the sampling RNG; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for CylinderFitConfig {
    fn default() -> Self {
        Self {
            threshold: 0.003,
            max_iterations: 5000,
            min_inlier_fraction: 0.05,
            normal_k: 16,
            seed: None,
        }
    }
}

/// Minimal-sample cylinder hypothesis tracked during RANSAC.
#[derive(Debug, Clone)]
pub struct CylinderCandidate {
    pub axis_point: Point3<f64>,
    pub axis_direction: Vector3<f64>,
    pub radius: f64,
}

/// Perpendicular distance from `point` to the line through `axis_point`
/// along unit `direction`.
fn axis_distance(point: &Point3<f64>, axis_point: &Point3<f64>, direction: &Vector3<f64>) -> f64 {
    (point - axis_point).cross(direction).norm()
}

pub struct CylinderEstimator;

impl RobustModel<OrientedPoint> for CylinderEstimator {
    type Model = CylinderCandidate;

    fn min_sample_size(&self) -> usize {
        2
    }

    fn estimate(&self, data: &[&OrientedPoint]) -> Option<Self::Model> {
        let a = data[0];
        let b = data[1];

        let axis = a.normal.cross(&b.normal);
        let axis_norm = axis.norm();
        if axis_norm < 1e-8 {
            // Parallel normals leave the axis unconstrained
            return None;
        }
        let axis = axis / axis_norm;

        // Closest approach of the two normal lines p + t*n. Both pass
        // through the axis for ideal cylinder samples.
        let d = b.position - a.position;
        let c = a.normal.dot(&b.normal);
        let denom = 1.0 - c * c;
        let da = d.dot(&a.normal);
        let db = d.dot(&b.normal);
        let t = (da - c * db) / denom;
        let s = (c * da - db) / denom;

        let on_a = a.position + a.normal * t;
        let on_b = b.position + b.normal * s;
        let axis_point = Point3::from((on_a.coords + on_b.coords) * 0.5);

        let radius = 0.5
            * (axis_distance(&a.position, &axis_point, &axis)
                + axis_distance(&b.position, &axis_point, &axis));
        if !radius.is_finite() || radius <= 0.0 {
            return None;
        }

        Some(CylinderCandidate {
            axis_point,
            axis_direction: axis,
            radius,
        })
    }

    fn compute_error(&self, model: &Self::Model, data: &OrientedPoint) -> f64 {
        (axis_distance(&data.position, &model.axis_point, &model.axis_direction) - model.radius)
            .abs()
    }
}

/// Fit a cylinder model to the point cloud.
///
/// Normals are taken from the cloud when present, otherwise estimated
/// from k-nearest-neighbor PCA first. Fails when no candidate axis
/// survives sampling, when the refit radius is not finite and positive,
/// or when the inlier fraction is below `min_inlier_fraction`.
pub fn fit_cylinder(cloud: &PointCloud, config: &CylinderFitConfig) -> Result<CylinderModel> {
    if cloud.len() < 3 {
        return Err(Error::FitFailed(format!(
            "need at least 3 points, got {}",
            cloud.len()
        )));
    }

    let data: Vec<OrientedPoint> = match &cloud.normals {
        Some(normals) => cloud
            .points
            .iter()
            .zip(normals)
            .map(|(p, n)| OrientedPoint {
                position: *p,
                normal: *n,
            })
            .collect(),
        None => {
            let mut oriented = cloud.clone();
            estimate_normals(&mut oriented, config.normal_k);
            let normals = oriented
                .normals
                .ok_or_else(|| Error::FitFailed("normal estimation produced nothing".into()))?;
            cloud
                .points
                .iter()
                .zip(&normals)
                .map(|(p, n)| OrientedPoint {
                    position: *p,
                    normal: *n,
                })
                .collect()
        }
    };

    let robust_config = RobustConfig {
        threshold: config.threshold,
        max_iterations: config.max_iterations,
        confidence: 0.99,
        min_sample_size: 2,
        seed: config.seed,
    };
    let result = Ransac::new(robust_config).run(&CylinderEstimator, &data);

    let inliers = result.inlier_indices();
    let candidate = result
        .model
        .ok_or_else(|| Error::FitFailed("no candidate axis survived sampling".into()))?;

    let min_inliers = ((cloud.len() as f64) * config.min_inlier_fraction).ceil() as usize;
    if inliers.len() < min_inliers.max(3) {
        return Err(Error::FitFailed(format!(
            "only {} of {} points within threshold {}",
            inliers.len(),
            cloud.len(),
            config.threshold
        )));
    }

    let model = refit(&data, inliers, &candidate)?;
    tracing::debug!(
        radius = model.radius,
        inliers = model.inliers.len(),
        "cylinder fit converged"
    );
    Ok(model)
}

/// Unweighted least-squares refit over the inlier set.
///
/// Cylinder normals are orthogonal to the axis, so the refined axis
/// direction is the smallest-eigenvalue eigenvector of the inlier
/// normal scatter matrix. Center and radius come from a linear (Kåsa)
/// circle fit of the inliers projected onto the axis-orthogonal plane.
fn refit(
    data: &[OrientedPoint],
    inliers: Vec<usize>,
    candidate: &CylinderCandidate,
) -> Result<CylinderModel> {
    let mut scatter = Matrix3::zeros();
    for &i in &inliers {
        let n = data[i].normal;
        scatter += n * n.transpose();
    }

    let eigen = SymmetricEigen::new(scatter);
    let mut min_val = f64::MAX;
    let mut min_idx = 0;
    for i in 0..3 {
        if eigen.eigenvalues[i] < min_val {
            min_val = eigen.eigenvalues[i];
            min_idx = i;
        }
    }
    let mut direction = eigen.eigenvectors.column(min_idx).into_owned();
    let norm = direction.norm();
    if norm < 1e-12 {
        return Err(Error::FitFailed("refit produced a zero-length axis".into()));
    }
    direction /= norm;
    // Keep the candidate's orientation so seeded runs stay stable
    if direction.dot(&candidate.axis_direction) < 0.0 {
        direction = -direction;
    }

    // Kåsa circle fit in the plane orthogonal to the axis:
    // x² + y² = A·x + B·y + C with A = 2cx, B = 2cy, C = r² − cx² − cy²
    let (u, v) = plane_basis(&direction);
    let origin = candidate.axis_point;

    let mut ata = Matrix3::zeros();
    let mut atb = Vector3::zeros();
    for &i in &inliers {
        let d = data[i].position - origin;
        let x = d.dot(&u);
        let y = d.dot(&v);
        let row = Vector3::new(x, y, 1.0);
        ata += row * row.transpose();
        atb += row * (x * x + y * y);
    }
    let solution = ata
        .try_inverse()
        .ok_or_else(|| Error::FitFailed("degenerate inlier configuration".into()))?
        * atb;

    let cx = solution[0] / 2.0;
    let cy = solution[1] / 2.0;
    let r_squared = solution[2] + cx * cx + cy * cy;
    if !r_squared.is_finite() || r_squared <= 0.0 {
        return Err(Error::FitFailed(
            "refit radius is not a positive finite number".into(),
        ));
    }

    Ok(CylinderModel {
        axis_point: origin + u * cx + v * cy,
        axis_direction: direction,
        radius: r_squared.sqrt(),
        inliers,
    })
}

/// Deterministic orthonormal basis of the plane orthogonal to unit `direction`.
fn plane_basis(direction: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let ax = direction.x.abs();
    let ay = direction.y.abs();
    let az = direction.z.abs();
    let pick = if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = direction.cross(&pick).normalize();
    let v = direction.cross(&u);
    (u, v)
}
