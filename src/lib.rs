//! Umbrella crate for the tire profiling workspace.
//!
//! Re-exports the member crates under short names:
//!
//! ```rust
//! use tireprof::profile::{fit_cylinder, CylinderFitConfig};
//! ```

pub use tireprof_core as core;
pub use tireprof_io as io;
pub use tireprof_profile as profile;
