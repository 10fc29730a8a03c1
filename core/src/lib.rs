//! Core containers and estimation primitives for tire profiling.
//!
//! - [`PointCloud`]: 3D point container with optional per-point normals
//! - [`robust`]: generic RANSAC engine with an injectable seed
//! - [`normals`]: k-nearest-neighbor PCA normal estimation

pub mod normals;
pub mod point_cloud;
pub mod robust;

pub use normals::estimate_normals;
pub use point_cloud::PointCloud;
pub use robust::{Ransac, RobustConfig, RobustModel, RobustResult};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
