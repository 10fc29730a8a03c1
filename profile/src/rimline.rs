//! Rim-line baseline estimation.
//!
//! A linear model of the zero-reference height as a function of
//! arc-length, compensating for a tilted or uneven reference rim. Rim
//! points are assumed pre-vetted (manually picked or loaded from a
//! validated record); there is deliberately no outlier rejection here.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minimum number of rim reference points for a baseline fit.
pub const MIN_RIM_POINTS: usize = 3;

/// Linear zero baseline `z0(arc) = intercept + slope · arc`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RimBaseline {
    pub intercept: f64,
    pub slope: f64,
}

impl RimBaseline {
    /// Baseline height at the given arc-length.
    pub fn eval(&self, arc: f64) -> f64 {
        self.intercept + self.slope * arc
    }
}

/// Arc-length coordinate of each aligned point at the given radius:
/// `atan2(y, z) · radius`.
pub fn arc_lengths(points: &[Point3<f64>], radius: f64) -> Vec<f64> {
    points.iter().map(|p| p.y.atan2(p.z) * radius).collect()
}

/// Ordinary least squares of `z = intercept + slope · arc`.
pub fn fit_rimline(points: &[Point3<f64>], arc_lengths: &[f64]) -> Result<RimBaseline> {
    if points.len() < MIN_RIM_POINTS {
        return Err(Error::InsufficientRimPoints {
            got: points.len(),
            min: MIN_RIM_POINTS,
        });
    }
    if points.len() != arc_lengths.len() {
        return Err(Error::Core(tireprof_core::Error::InvalidInput(format!(
            "Arc-length count {} does not match point count {}",
            arc_lengths.len(),
            points.len()
        ))));
    }

    let n = points.len() as f64;
    let mean_arc = arc_lengths.iter().sum::<f64>() / n;
    let mean_z = points.iter().map(|p| p.z).sum::<f64>() / n;

    let mut s_arc_arc = 0.0;
    let mut s_arc_z = 0.0;
    for (p, &arc) in points.iter().zip(arc_lengths) {
        let d_arc = arc - mean_arc;
        s_arc_arc += d_arc * d_arc;
        s_arc_z += d_arc * (p.z - mean_z);
    }

    if s_arc_arc < 1e-12 {
        return Err(Error::DegenerateGeometry(
            "rim points span no arc length".into(),
        ));
    }

    let slope = s_arc_z / s_arc_arc;
    let intercept = mean_z - slope * mean_arc;
    Ok(RimBaseline { intercept, slope })
}
