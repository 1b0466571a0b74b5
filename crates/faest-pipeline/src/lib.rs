//! Resolution pipeline for the FAEST native library.
//!
//! Detects the platform, locates or builds `libfaest`, emits the
//! [`BuildDescriptor`](faest_ffi::BuildDescriptor), and checks the installed
//! headers against the declaration table.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{BindConfig, CONFIG_FILE_NAME};
pub use error::{PipelineError, Result};
pub use pipeline::{run, run_with, PipelineOptions, PipelineOutput};
