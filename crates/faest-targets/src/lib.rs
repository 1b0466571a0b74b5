//! Platform identification for the FAEST native-library pipeline.
//!
//! Maps the host (or an explicit cross-compilation target) onto a canonical
//! [`PlatformKey`] that keys the bundled library layout:
//!
//! - **Operating system:** linux, macos, windows, or unknown
//! - **Architecture:** normalized per OS (`aarch64` on linux, `arm64` on macos)
//! - **Library naming:** which file names count as a compiled `libfaest`

pub mod error;
pub mod naming;
pub mod parse;
pub mod platform;

pub use error::{Result, TargetError};
pub use naming::{LibraryNaming, LIBRARY_NAME};
pub use platform::{Architecture, OperatingSystem, PlatformKey};
