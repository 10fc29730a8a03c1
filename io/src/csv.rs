//! Profile-table CSV export.

use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tireprof_profile::ProfileTable;

/// Write a profile table as CSV, one row per bin.
pub fn write_profile_csv<W: Write>(writer: &mut W, profile: &ProfileTable) -> Result<()> {
    writeln!(writer, "x_center,z_mean,z_std,delta_r_mean,samples")?;
    for bin in &profile.bins {
        writeln!(
            writer,
            "{},{},{},{},{}",
            bin.axial_center,
            bin.mean_deviation,
            bin.std_deviation,
            bin.mean_radial_error,
            bin.samples
        )?;
    }
    Ok(())
}

/// Save a profile table as CSV on disk.
pub fn save_profile_csv(path: &Path, profile: &ProfileTable) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_profile_csv(&mut writer, profile)
}
