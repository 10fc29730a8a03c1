//! Run-summary persistence.

use crate::Result;
use std::fs;
use std::path::Path;
use tireprof_profile::RunSummary;

/// Save a run summary as pretty-printed JSON.
pub fn save_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}

/// Load a run summary from JSON.
pub fn load_summary(path: &Path) -> Result<RunSummary> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tireprof_profile::{CylinderSummary, RimBaseline};

    #[test]
    fn test_summary_round_trip() {
        let summary = RunSummary {
            cylinder: CylinderSummary {
                radius: 0.35,
                axis_point: [0.1, 0.2, 0.3],
                axis_direction: [1.0, 0.0, 0.0],
            },
            rimline: RimBaseline {
                intercept: 2.0,
                slope: 0.5,
            },
        };
        let path = std::env::temp_dir().join("tireprof_summary_round_trip.json");
        save_summary(&path, &summary).unwrap();

        let loaded = load_summary(&path).unwrap();
        assert_eq!(loaded.cylinder.radius, 0.35);
        assert_eq!(loaded.cylinder.axis_point, [0.1, 0.2, 0.3]);
        assert_eq!(loaded.rimline.slope, 0.5);

        let _ = fs::remove_file(path);
    }
}
