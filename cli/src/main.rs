//! Tire rim-line profiler.
//!
//! Fits a cylinder to a scanned tire, aligns it to a canonical frame,
//! references the tread against a rim-line baseline, and writes an
//! axial deviation profile (CSV + SVG) plus a run summary.
//!
//! # Usage
//!
//! ```bash
//! # Single scan
//! tireprof --input scans/tire.obj --rim-json picks/rim.json \
//!     --tape-width 0.02 --out results/
//!
//! # All *.obj / *.ply in a folder, reproducible
//! tireprof --batch scans/ --rim-json picks/rim.json \
//!     --tape-width 0.02 --seed 42 --out results/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tireprof_core::point_cloud::{voxel_down_sample, PointCloud};
use tireprof_io::{
    load_obj, load_ply, load_rim_points, sample_surface, save_ply, save_profile_csv,
    save_profile_svg, save_summary,
};
use tireprof_profile::slice::band_indices;
use tireprof_profile::{
    align_points, arc_lengths, fit_cylinder, fit_rimline, slice_profile, CylinderFitConfig,
    CylindricalFeatures, ReferenceSelector, RimSide, RunSummary, SliceConfig,
};

#[derive(Parser)]
#[command(name = "tireprof")]
#[command(about = "Tire rim-line profiler")]
struct Args {
    /// A single OBJ mesh or PLY point cloud
    #[arg(long)]
    input: Option<PathBuf>,

    /// Process all *.obj / *.ply in a folder
    #[arg(long)]
    batch: Option<PathBuf>,

    /// Output directory (one subfolder per scan)
    #[arg(long)]
    out: PathBuf,

    /// Rim picks in the aligned frame, JSON `{ "points": [[x,y,z], ...] }`
    #[arg(long)]
    rim_json: PathBuf,

    /// Width of the measurement tape (arc length)
    #[arg(long)]
    tape_width: f64,

    /// Max |radial deviation| inside the band
    #[arg(long, default_value_t = 0.05)]
    outer_band: f64,

    /// Number of axial bins
    #[arg(long, default_value_t = 200)]
    nbins: usize,

    /// RANSAC inlier threshold
    #[arg(long, default_value_t = 0.003)]
    ransac_thresh: f64,

    /// RANSAC iteration cap
    #[arg(long, default_value_t = 5000)]
    ransac_iters: usize,

    /// Voxel size for down-sampling, off when absent
    #[arg(long)]
    voxel: Option<f64>,

    /// Points sampled from a mesh surface
    #[arg(long, default_value_t = 200_000)]
    sample_points: usize,

    /// Base RNG seed; each scan gets seed + its index
    #[arg(long)]
    seed: Option<u64>,

    /// Side of the reference plane the tape lies on
    #[arg(long, value_enum, default_value = "positive")]
    side: SideArg,

    /// Dump the sliced band as slice_points.ply
    #[arg(long)]
    save_debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SideArg {
    Positive,
    Negative,
}

impl From<SideArg> for RimSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Positive => RimSide::Positive,
            SideArg::Negative => RimSide::Negative,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error(transparent)]
    Io(#[from] tireprof_io::Error),

    #[error(transparent)]
    Profile(#[from] tireprof_profile::Error),

    #[error("{0}")]
    Input(String),
}

fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let targets = match collect_targets(&args) {
        Ok(targets) => targets,
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(2);
        }
    };

    // Scans are independent; one failure must not abort the rest.
    let failures: usize = targets
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            let seed = args.seed.map(|s| s.wrapping_add(index as u64));
            match process_single(&args, path, seed) {
                Ok(out_dir) => {
                    tracing::info!(scan = %path.display(), out = %out_dir.display(), "done");
                    0
                }
                Err(err) => {
                    tracing::error!(scan = %path.display(), "{err}");
                    1
                }
            }
        })
        .sum();

    if failures > 0 {
        std::process::exit(1);
    }
}

fn collect_targets(args: &Args) -> Result<Vec<PathBuf>, PipelineError> {
    if let Some(dir) = &args.batch {
        let mut targets: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(tireprof_io::Error::from)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("obj") | Some("ply")
                )
            })
            .collect();
        targets.sort();
        if targets.is_empty() {
            return Err(PipelineError::Input(format!(
                "no *.obj or *.ply files in {}",
                dir.display()
            )));
        }
        Ok(targets)
    } else if let Some(input) = &args.input {
        Ok(vec![input.clone()])
    } else {
        Err(PipelineError::Input(
            "specify either --input or --batch".into(),
        ))
    }
}

fn load_cloud(args: &Args, path: &Path, seed: Option<u64>) -> Result<PointCloud, PipelineError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let cloud = match extension.as_deref() {
        Some("obj") => {
            let mesh = load_obj(path)?;
            sample_surface(&mesh, args.sample_points, seed)?
        }
        Some("ply") => load_ply(path)?,
        _ => {
            return Err(tireprof_io::Error::UnsupportedFormat(format!(
                "{} (expected .obj or .ply)",
                path.display()
            ))
            .into())
        }
    };
    Ok(match args.voxel {
        Some(voxel_size) => voxel_down_sample(&cloud, voxel_size),
        None => cloud,
    })
}

fn process_single(args: &Args, path: &Path, seed: Option<u64>) -> Result<PathBuf, PipelineError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scan");
    let out_dir = args.out.join(stem);
    fs::create_dir_all(&out_dir).map_err(tireprof_io::Error::from)?;

    tracing::info!(scan = %path.display(), "loading");
    let cloud = load_cloud(args, path, seed)?;
    tracing::info!(points = cloud.len(), "fitting cylinder");

    let fit_config = CylinderFitConfig {
        threshold: args.ransac_thresh,
        max_iterations: args.ransac_iters,
        seed,
        ..Default::default()
    };
    let model = fit_cylinder(&cloud, &fit_config)?;
    tracing::info!(radius = model.radius, inliers = model.inliers.len(), "cylinder fitted");

    let (aligned, _rotation, _translation) = align_points(
        &cloud.points,
        &model.axis_point,
        &model.axis_direction,
        ReferenceSelector::TopMost,
    )?;

    let rim_points = load_rim_points(&args.rim_json)?;
    let arcs = arc_lengths(&rim_points, model.radius);
    let baseline = fit_rimline(&rim_points, &arcs)?;
    tracing::info!(
        intercept = baseline.intercept,
        slope = baseline.slope,
        "rim line fitted"
    );

    let slice_config = SliceConfig {
        band_half_width: args.tape_width / 2.0,
        radial_band: args.outer_band,
        side: args.side.into(),
        bin_count: args.nbins,
    };
    let profile = slice_profile(&aligned, model.radius, &baseline, &slice_config)?;

    save_profile_csv(&out_dir.join("profile.csv"), &profile)?;
    save_profile_svg(&out_dir.join("profile.svg"), &profile)?;
    save_summary(
        &out_dir.join("summary.json"),
        &RunSummary::new(&model, &baseline),
    )?;

    if args.save_debug {
        let features = CylindricalFeatures::compute(&aligned, model.radius);
        let selected: Vec<_> = band_indices(&features, &slice_config)
            .into_iter()
            .map(|i| aligned[i])
            .collect();
        save_ply(
            &out_dir.join("slice_points.ply"),
            &PointCloud::new(selected),
        )?;
    }

    Ok(out_dir)
}
