//! Run summary record.
//!
//! Plain structured snapshot of the fitted model and baseline for
//! external persistence; field names are the contract.

use serde::{Deserialize, Serialize};

use crate::cylinder::CylinderModel;
use crate::rimline::RimBaseline;

/// Cylinder parameters as persisted in a run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CylinderSummary {
    pub radius: f64,
    pub axis_point: [f64; 3],
    pub axis_direction: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub cylinder: CylinderSummary,
    pub rimline: RimBaseline,
}

impl RunSummary {
    pub fn new(model: &CylinderModel, baseline: &RimBaseline) -> Self {
        Self {
            cylinder: CylinderSummary {
                radius: model.radius,
                axis_point: [model.axis_point.x, model.axis_point.y, model.axis_point.z],
                axis_direction: [
                    model.axis_direction.x,
                    model.axis_direction.y,
                    model.axis_direction.z,
                ],
            },
            rimline: *baseline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_summary_captures_model_and_baseline() {
        let model = CylinderModel {
            axis_point: Point3::new(1.0, 2.0, 3.0),
            axis_direction: Vector3::x(),
            radius: 0.35,
            inliers: vec![0, 1, 2],
        };
        let baseline = RimBaseline {
            intercept: 2.0,
            slope: 0.5,
        };
        let summary = RunSummary::new(&model, &baseline);
        assert_eq!(summary.cylinder.radius, 0.35);
        assert_eq!(summary.cylinder.axis_point, [1.0, 2.0, 3.0]);
        assert_eq!(summary.cylinder.axis_direction, [1.0, 0.0, 0.0]);
        assert_eq!(summary.rimline.intercept, 2.0);
        assert_eq!(summary.rimline.slope, 0.5);
    }
}
