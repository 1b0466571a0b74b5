//! Native-library acquisition for the FAEST bindings.
//!
//! Finds a usable compiled `libfaest` and its headers, falling back to
//! cloning the upstream reference implementation and building it.
//!
//! # Architecture
//!
//! Resolution is an ordered cascade of [`ArtifactSource`]s:
//! - **Bundled** — prebuilt libraries shipped under `lib/<os>/<arch>`
//! - **Development** — `FAEST_BUILD_DIR` / `FAEST_SRC_DIR` overrides
//! - **Fallback build** — clone, bootstrap meson/ninja, compile
//!
//! All ambient state (environment variables, search paths) is captured once
//! into an [`AcquireContext`], and every subprocess goes through a
//! [`CommandRunner`] so stages can be exercised without touching the system.

pub mod context;
pub mod error;
pub mod locate;
pub mod process;
pub mod source;
pub mod tools;

// Re-exports for convenience.
pub use context::{
    AcquireContext, EnvSnapshot, Upstream, ARCHFLAGS_VAR, BUILD_DIR_VAR, DEFAULT_CLONE_DIR,
    DEFAULT_PYTHON, DEFAULT_REPOSITORY, HOST_PLATFORM_VAR, SRC_DIR_VAR,
};
pub use error::{AcquireError, Result};
pub use locate::{
    ArtifactLocation, ArtifactSource, BundledSource, DevelopmentSource, FallbackBuildSource,
    Locator, Origin, Probe,
};
pub use process::{CommandRunner, Invocation, ProcessOutput, SystemRunner};
#[cfg(any(test, feature = "test-support"))]
pub use process::{Scripted, ScriptedRunner};
pub use source::{BuildOutput, BuildState, SourceBuilder};
pub use tools::{ToolBootstrapper, ToolHandle};
