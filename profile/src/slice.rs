//! Band slicing and axial profile aggregation.
//!
//! Selects a thin angular band of the aligned cloud (a simulated tape
//! laid across the tread), references each point against the rim
//! baseline, and bins the result along the axial coordinate.

use nalgebra::Point3;
use serde::Serialize;

use crate::rimline::RimBaseline;
use crate::{Error, Result};

/// Per-point cylindrical coordinates in the aligned frame.
///
/// Purely derived from the points and the fitted radius; recomputed
/// whenever needed.
#[derive(Debug, Clone)]
pub struct CylindricalFeatures {
    /// Axial coordinate (x).
    pub axial: Vec<f64>,
    /// Height above the axis plane (z).
    pub up: Vec<f64>,
    /// Planar radius √(y² + z²).
    pub planar_radius: Vec<f64>,
    /// Angular position atan2(y, z).
    pub theta: Vec<f64>,
    /// Arc-length θ · radius.
    pub arc: Vec<f64>,
    /// Radial deviation: planar radius − fitted radius.
    pub radial_deviation: Vec<f64>,
}

impl CylindricalFeatures {
    pub fn compute(points: &[Point3<f64>], radius: f64) -> Self {
        let n = points.len();
        let mut features = Self {
            axial: Vec::with_capacity(n),
            up: Vec::with_capacity(n),
            planar_radius: Vec::with_capacity(n),
            theta: Vec::with_capacity(n),
            arc: Vec::with_capacity(n),
            radial_deviation: Vec::with_capacity(n),
        };
        for p in points {
            let r = (p.y * p.y + p.z * p.z).sqrt();
            let theta = p.y.atan2(p.z);
            features.axial.push(p.x);
            features.up.push(p.z);
            features.planar_radius.push(r);
            features.theta.push(theta);
            features.arc.push(theta * radius);
            features.radial_deviation.push(r - radius);
        }
        features
    }

    pub fn len(&self) -> usize {
        self.axial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axial.is_empty()
    }
}

/// Which side of the reference plane the measurement band lies on.
///
/// Scan-orientation-dependent, so configurable rather than hardcoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RimSide {
    #[default]
    Positive,
    Negative,
}

impl RimSide {
    fn selects(self, up: f64) -> bool {
        match self {
            RimSide::Positive => up > 0.0,
            RimSide::Negative => up < 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SliceConfig {
    /// Half-width of the angular band, as an arc length.
    pub band_half_width: f64,
    /// Max |radial deviation| for a point to enter the band.
    pub radial_band: f64,
    pub side: RimSide,
    pub bin_count: usize,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            band_half_width: 0.01,
            radial_band: 0.05,
            side: RimSide::Positive,
            bin_count: 200,
        }
    }
}

/// One axial bin of the profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileBin {
    /// Mean axial coordinate of the samples in the bin.
    pub axial_center: f64,
    /// Mean baseline-relative deviation.
    pub mean_deviation: f64,
    /// Sample standard deviation of the baseline-relative deviation.
    pub std_deviation: f64,
    /// Mean radial deviation from the fitted cylinder.
    pub mean_radial_error: f64,
    pub samples: usize,
}

/// Profile bins ordered by ascending axial center. Empty bins are
/// dropped, not zero-filled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileTable {
    pub bins: Vec<ProfileBin>,
}

impl ProfileTable {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Indices of the points inside the angular/radial measurement band.
pub fn band_indices(features: &CylindricalFeatures, config: &SliceConfig) -> Vec<usize> {
    (0..features.len())
        .filter(|&i| {
            features.arc[i].abs() <= config.band_half_width
                && config.side.selects(features.up[i])
                && features.radial_deviation[i].abs() <= config.radial_band
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct BinAccumulator {
    sum_axial: f64,
    sum_dev: f64,
    sum_dev_squared: f64,
    sum_radial: f64,
    count: usize,
}

/// Slice the aligned cloud and aggregate an axial deviation profile.
///
/// The axial span of the selected points is split into `bin_count`
/// equal-width intervals; interior edges belong to the lower bin and
/// the lowest interval is closed on both ends.
pub fn slice_profile(
    points: &[Point3<f64>],
    radius: f64,
    baseline: &RimBaseline,
    config: &SliceConfig,
) -> Result<ProfileTable> {
    if config.bin_count == 0 {
        return Err(Error::Core(tireprof_core::Error::InvalidInput(
            "bin count must be positive".into(),
        )));
    }

    let features = CylindricalFeatures::compute(points, radius);
    let selected = band_indices(&features, config);
    if selected.is_empty() {
        return Err(Error::EmptySlice(
            "no points within the angular/radial band; widen the band or check alignment".into(),
        ));
    }
    tracing::debug!(
        selected = selected.len(),
        total = points.len(),
        "sliced measurement band"
    );

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &i in &selected {
        lo = lo.min(features.axial[i]);
        hi = hi.max(features.axial[i]);
    }
    let span = hi - lo;

    let mut accumulators = vec![BinAccumulator::default(); config.bin_count];
    for &i in &selected {
        let bin = if span <= 0.0 {
            0
        } else {
            let t = (features.axial[i] - lo) / span * config.bin_count as f64;
            (t.ceil() as usize)
                .saturating_sub(1)
                .min(config.bin_count - 1)
        };
        let deviation = features.up[i] - baseline.eval(features.arc[i]);
        let acc = &mut accumulators[bin];
        acc.sum_axial += features.axial[i];
        acc.sum_dev += deviation;
        acc.sum_dev_squared += deviation * deviation;
        acc.sum_radial += features.radial_deviation[i];
        acc.count += 1;
    }

    let bins = accumulators
        .iter()
        .filter(|acc| acc.count > 0)
        .map(|acc| {
            let n = acc.count as f64;
            let mean_deviation = acc.sum_dev / n;
            let variance = if acc.count > 1 {
                ((acc.sum_dev_squared - n * mean_deviation * mean_deviation) / (n - 1.0)).max(0.0)
            } else {
                0.0
            };
            ProfileBin {
                axial_center: acc.sum_axial / n,
                mean_deviation,
                std_deviation: variance.sqrt(),
                mean_radial_error: acc.sum_radial / n,
                samples: acc.count,
            }
        })
        .collect();

    Ok(ProfileTable { bins })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_baseline() -> RimBaseline {
        RimBaseline {
            intercept: 0.0,
            slope: 0.0,
        }
    }

    /// Points on the +Z crown of a radius-1 cylinder, axial 0..10.
    fn crown_points(n: usize) -> Vec<Point3<f64>> {
        (0..n)
            .map(|i| Point3::new(i as f64 * 10.0 / (n - 1) as f64, 0.0, 1.0))
            .collect()
    }

    #[test]
    fn test_uniform_points_fill_all_bins() {
        let points = crown_points(1000);
        let config = SliceConfig {
            band_half_width: 0.01,
            radial_band: 0.05,
            side: RimSide::Positive,
            bin_count: 10,
        };
        let baseline = RimBaseline {
            intercept: 1.0,
            slope: 0.0,
        };
        let profile = slice_profile(&points, 1.0, &baseline, &config).unwrap();

        assert_eq!(profile.len(), 10);
        let mut last_center = f64::NEG_INFINITY;
        for bin in &profile.bins {
            assert!(bin.mean_deviation.abs() < 1e-12);
            assert!(bin.std_deviation.abs() < 1e-12);
            assert!(bin.mean_radial_error.abs() < 1e-12);
            assert!(bin.axial_center > last_center);
            last_center = bin.axial_center;
        }
        let total: usize = profile.bins.iter().map(|b| b.samples).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn test_empty_slice_fails() {
        // Everything on the negative side of the reference plane
        let points: Vec<Point3<f64>> =
            (0..100).map(|i| Point3::new(i as f64, 0.0, -1.0)).collect();
        let config = SliceConfig {
            bin_count: 10,
            ..Default::default()
        };
        let result = slice_profile(&points, 1.0, &flat_baseline(), &config);
        assert!(matches!(result, Err(Error::EmptySlice(_))));

        // The same points pass when the band side is flipped
        let config = SliceConfig {
            side: RimSide::Negative,
            bin_count: 10,
            ..Default::default()
        };
        assert!(slice_profile(&points, 1.0, &flat_baseline(), &config).is_ok());
    }

    #[test]
    fn test_radial_band_excludes_far_points() {
        let mut points = crown_points(100);
        // A point far off the fitted surface must not enter the band
        points.push(Point3::new(5.0, 0.0, 2.0));
        let config = SliceConfig {
            band_half_width: 0.01,
            radial_band: 0.05,
            side: RimSide::Positive,
            bin_count: 5,
        };
        let profile = slice_profile(&points, 1.0, &flat_baseline(), &config).unwrap();
        let total: usize = profile.bins.iter().map(|b| b.samples).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_baseline_is_subtracted() {
        // Tilted rim: baseline z0(arc) = 1.0 + 0.5·arc; points sit
        // exactly on the cylinder surface, so deviations against the
        // baseline are -0.5·arc per point.
        let points = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
        ];
        let baseline = RimBaseline {
            intercept: 1.0,
            slope: 0.5,
        };
        let config = SliceConfig {
            band_half_width: 0.01,
            radial_band: 0.05,
            side: RimSide::Positive,
            bin_count: 3,
        };
        let profile = slice_profile(&points, 1.0, &baseline, &config).unwrap();
        // arc = 0 for all three points, so deviation = z − 1.0 = 0
        for bin in &profile.bins {
            assert!(bin.mean_deviation.abs() < 1e-12);
        }
    }

    #[test]
    fn test_singleton_bins_have_zero_std() {
        let points = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(10.0, 0.0, 1.0),
        ];
        let config = SliceConfig {
            band_half_width: 0.01,
            radial_band: 0.5,
            side: RimSide::Positive,
            bin_count: 4,
        };
        let profile = slice_profile(&points, 1.0, &flat_baseline(), &config).unwrap();
        assert_eq!(profile.len(), 2);
        for bin in &profile.bins {
            assert_eq!(bin.samples, 1);
            assert_eq!(bin.std_deviation, 0.0);
        }
    }

    #[test]
    fn test_empty_bins_are_dropped() {
        // Two clusters far apart leave interior bins empty
        let mut points = Vec::new();
        for i in 0..10 {
            points.push(Point3::new(i as f64 * 0.01, 0.0, 1.0));
            points.push(Point3::new(10.0 + i as f64 * 0.01, 0.0, 1.0));
        }
        let config = SliceConfig {
            band_half_width: 0.01,
            radial_band: 0.05,
            side: RimSide::Positive,
            bin_count: 20,
        };
        let profile = slice_profile(&points, 1.0, &flat_baseline(), &config).unwrap();
        assert_eq!(profile.len(), 2);
        let total: usize = profile.bins.iter().map(|b| b.samples).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_band_half_width_limits_arc() {
        // Points spread around the circumference; only those within the
        // tape stay
        let mut points = Vec::new();
        for i in -50i32..=50 {
            let theta = i as f64 * 0.01;
            points.push(Point3::new(0.0, theta.sin(), theta.cos()));
        }
        let features = CylindricalFeatures::compute(&points, 1.0);
        let config = SliceConfig {
            band_half_width: 0.105,
            radial_band: 0.05,
            side: RimSide::Positive,
            bin_count: 1,
        };
        let selected = band_indices(&features, &config);
        // |arc| = |theta| <= 0.105 keeps i in -10..=10
        assert_eq!(selected.len(), 21);
    }
}
