//! Geometric estimation pipeline for tire-tread profiling.
//!
//! Takes an unordered point cloud sampled from a scanned tire and
//! produces a 1-D radial-deviation profile along the axle direction:
//!
//! 1. [`cylinder`]: robust cylinder estimation (RANSAC over oriented
//!    points, least-squares refit on the inlier set)
//! 2. [`align`]: rigid transform mapping the estimated axis to +X and
//!    the tire's 12 o'clock to +Z
//! 3. [`rimline`]: linear zero-baseline from picked rim points
//! 4. [`slice`]: thin angular band selection and axial binning
//!
//! All components are pure functions over immutable inputs; independent
//! scans can run on independent workers with per-worker seeds.

pub mod align;
pub mod cylinder;
pub mod rimline;
pub mod slice;
pub mod summary;

pub use align::{align_points, apply_transform, rotation_from_vectors, ReferenceSelector};
pub use cylinder::{fit_cylinder, CylinderFitConfig, CylinderModel, OrientedPoint};
pub use rimline::{arc_lengths, fit_rimline, RimBaseline};
pub use slice::{
    slice_profile, CylindricalFeatures, ProfileBin, ProfileTable, RimSide, SliceConfig,
};
pub use summary::{CylinderSummary, RunSummary};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cylinder fit did not converge: {0}")]
    FitFailed(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("At least {min} rim points are required, got {got}")]
    InsufficientRimPoints { got: usize, min: usize },

    #[error("Slice selection is empty: {0}")]
    EmptySlice(String),

    #[error("Core error: {0}")]
    Core(#[from] tireprof_core::Error),
}
