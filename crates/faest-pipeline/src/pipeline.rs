//! Resolution pipeline orchestrator.

use std::path::PathBuf;
use std::time::Instant;

use faest_acquire::{AcquireContext, ArtifactLocation, CommandRunner, Locator};
use faest_ffi::{check_headers, emit, BuildDescriptor};

use crate::error::Result;

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Check installed headers against the declaration table after emission.
    pub check_contract: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            check_contract: true,
        }
    }
}

/// Output of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Where the library was found or built.
    pub location: ArtifactLocation,
    /// Compile and link configuration for the FFI step.
    pub descriptor: BuildDescriptor,
    /// Headers verified by the contract check (empty when skipped).
    pub checked_headers: Vec<PathBuf>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

/// Run the full pipeline:
/// locate (bundled -> development -> fallback build) -> emit descriptor -> header contract check.
pub fn run(
    ctx: &AcquireContext,
    runner: &dyn CommandRunner,
    options: &PipelineOptions,
) -> Result<PipelineOutput> {
    run_with(&Locator::standard(), ctx, runner, options)
}

/// [`run`] with a caller-supplied locator.
pub fn run_with(
    locator: &Locator,
    ctx: &AcquireContext,
    runner: &dyn CommandRunner,
    options: &PipelineOptions,
) -> Result<PipelineOutput> {
    let start = Instant::now();
    tracing::info!(
        platform = %ctx.platform(),
        bundle_root = %ctx.bundle_root().display(),
        tiers = ?locator.tiers(),
        "resolving FAEST library"
    );

    // Stage 1: Locate (may clone and build)
    let location = locator.locate(ctx, runner)?;

    // Stage 2: Emit the build descriptor
    let descriptor = emit(&location, ctx);

    // Stage 3: Header contract check
    let checked_headers = if options.check_contract {
        check_headers(descriptor.include_dirs(), descriptor.declarations())?
    } else {
        tracing::warn!("header contract check skipped");
        Vec::new()
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(origin = %location.origin(), duration_ms, "resolution complete");

    Ok(PipelineOutput {
        location,
        descriptor,
        checked_headers,
        duration_ms,
    })
}
