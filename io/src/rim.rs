//! Rim-point persistence.
//!
//! Rim picks are stored as a JSON record `{ "points": [[x, y, z], …] }`
//! in the aligned frame. The core does not care whether the record came
//! from an interactive picker or an earlier run.

use crate::Result;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RimPointsRecord {
    points: Vec<[f64; 3]>,
}

/// Load rim reference points from a JSON record.
pub fn load_rim_points(path: &Path) -> Result<Vec<Point3<f64>>> {
    let data = fs::read_to_string(path)?;
    let record: RimPointsRecord = serde_json::from_str(&data)?;
    Ok(record
        .points
        .into_iter()
        .map(|[x, y, z]| Point3::new(x, y, z))
        .collect())
}

/// Save rim reference points as a JSON record.
pub fn save_rim_points(path: &Path, points: &[Point3<f64>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let record = RimPointsRecord {
        points: points.iter().map(|p| [p.x, p.y, p.z]).collect(),
    };
    fs::write(path, serde_json::to_string_pretty(&record)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rim_points_round_trip() {
        let points = vec![
            Point3::new(0.0, 0.1, 0.35),
            Point3::new(0.0, -0.1, 0.35),
            Point3::new(0.0, 0.0, 0.36),
        ];
        let path = std::env::temp_dir().join("tireprof_rim_round_trip.json");
        save_rim_points(&path, &points).unwrap();

        let loaded = load_rim_points(&path).unwrap();
        assert_eq!(loaded, points);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_rim_points_record_shape() {
        let path = std::env::temp_dir().join("tireprof_rim_shape.json");
        fs::write(&path, r#"{ "points": [[1.0, 2.0, 3.0]] }"#).unwrap();
        let loaded = load_rim_points(&path).unwrap();
        assert_eq!(loaded, vec![Point3::new(1.0, 2.0, 3.0)]);
        let _ = fs::remove_file(path);
    }
}
