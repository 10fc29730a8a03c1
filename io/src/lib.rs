//! File I/O for the tire profiling pipeline.
//!
//! Supports:
//! - PLY (ASCII) point clouds with optional normals
//! - OBJ triangle meshes with uniform surface sampling
//! - Rim-point and run-summary JSON records
//! - Profile export as CSV and SVG

pub mod csv;
pub mod mesh;
pub mod ply;
pub mod rim;
pub mod summary;
pub mod svg;

pub use csv::{save_profile_csv, write_profile_csv};
pub use mesh::{load_obj, read_obj, sample_surface, TriangleMesh};
pub use ply::{load_ply, read_ply, save_ply, write_ply};
pub use rim::{load_rim_points, save_rim_points};
pub use summary::{load_summary, save_summary};
pub use svg::{profile_svg, save_profile_svg};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
