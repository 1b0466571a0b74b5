//! Artifact location: an ordered cascade of library sources.
//!
//! Sources are tried in order. The first to return a location wins, an error
//! aborts the cascade, and if every source declines the locator fails with
//! [`AcquireError::MissingArtifact`] listing every path it checked.

use std::path::{Path, PathBuf};

use faest_targets::LibraryNaming;
use serde::Serialize;

use crate::context::{AcquireContext, BUILD_DIR_VAR, SRC_DIR_VAR};
use crate::error::{AcquireError, Result};
use crate::process::CommandRunner;
use crate::source::SourceBuilder;
use crate::tools::ToolBootstrapper;

/// Which tier supplied an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Prebuilt library shipped with the package.
    Bundled,
    /// External build named by the development overrides.
    DevelopmentEnv,
    /// Built from a fresh clone during this run.
    FreshlyBuilt,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bundled => "bundled",
            Self::DevelopmentEnv => "development",
            Self::FreshlyBuilt => "freshly built",
        };
        f.write_str(name)
    }
}

/// A validated library + header location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLocation {
    library_dir: PathBuf,
    include_dir: PathBuf,
    origin: Origin,
    libraries: Vec<String>,
}

impl ArtifactLocation {
    /// Accept a candidate only if `include_dir` exists and `library_dir`
    /// holds at least one recognized library file.
    pub fn accept(
        library_dir: &Path,
        include_dir: &Path,
        origin: Origin,
        naming: LibraryNaming,
    ) -> Option<Self> {
        if !include_dir.is_dir() {
            return None;
        }
        let libraries = naming.find_in(library_dir);
        if libraries.is_empty() {
            return None;
        }
        Some(ArtifactLocation {
            library_dir: library_dir.to_path_buf(),
            include_dir: include_dir.to_path_buf(),
            origin,
            libraries,
        })
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    pub fn include_dir(&self) -> &Path {
        &self.include_dir
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Library file names found in `library_dir`.
    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }
}

/// Paths examined during one locate run, in order.
#[derive(Debug, Default)]
pub struct Probe {
    checked: Vec<PathBuf>,
}

impl Probe {
    /// Record `path` and report whether it is an existing directory.
    pub fn check_dir(&mut self, path: &Path) -> bool {
        let exists = path.is_dir();
        tracing::debug!(path = %path.display(), exists, "probe");
        if !self.checked.iter().any(|p| p == path) {
            self.checked.push(path.to_path_buf());
        }
        exists
    }

    pub fn into_checked(self) -> Vec<PathBuf> {
        self.checked
    }
}

/// One tier of the resolution cascade.
pub trait ArtifactSource {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` passes to the next tier; `Err` aborts resolution.
    fn resolve(
        &self,
        ctx: &AcquireContext,
        runner: &dyn CommandRunner,
        probe: &mut Probe,
    ) -> Result<Option<ArtifactLocation>>;
}

/// Tier 1: prebuilt libraries under `lib/<os>/<arch>` plus `include/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSource;

impl ArtifactSource for BundledSource {
    fn name(&self) -> &'static str {
        "bundled"
    }

    fn resolve(
        &self,
        ctx: &AcquireContext,
        _runner: &dyn CommandRunner,
        probe: &mut Probe,
    ) -> Result<Option<ArtifactLocation>> {
        let Some(lib_dir) = ctx.bundled_lib_dir() else {
            tracing::debug!(platform = %ctx.platform(), "no bundled directory for platform");
            return Ok(None);
        };
        let include_dir = ctx.bundled_include_dir();
        if !probe.check_dir(&lib_dir) || !probe.check_dir(&include_dir) {
            return Ok(None);
        }
        Ok(ArtifactLocation::accept(
            &lib_dir,
            &include_dir,
            Origin::Bundled,
            ctx.naming(),
        ))
    }
}

/// Tier 2: an external build named by `FAEST_BUILD_DIR` / `FAEST_SRC_DIR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevelopmentSource;

impl ArtifactSource for DevelopmentSource {
    fn name(&self) -> &'static str {
        "development"
    }

    fn resolve(
        &self,
        ctx: &AcquireContext,
        _runner: &dyn CommandRunner,
        probe: &mut Probe,
    ) -> Result<Option<ArtifactLocation>> {
        let build_dir = ctx.dev_build_dir();
        let src_dir = ctx.dev_src_dir();

        if !probe.check_dir(&build_dir) {
            // Windows defers to the fallback tier, which reports the platform as unsupported.
            if !ctx.platform().os().supports_source_build() || !ctx.env().has_dev_overrides() {
                return Ok(None);
            }
            probe.check_dir(&src_dir);
            return Err(missing(
                probe,
                format!(
                    "FAEST build directory not found: {}\n{}",
                    build_dir.display(),
                    remediation(ctx)
                ),
            ));
        }

        if !probe.check_dir(&src_dir) {
            return Err(missing(
                probe,
                format!(
                    "FAEST source directory not found: {}\n{}",
                    src_dir.display(),
                    remediation(ctx)
                ),
            ));
        }

        match ArtifactLocation::accept(&build_dir, &src_dir, Origin::DevelopmentEnv, ctx.naming()) {
            Some(location) => Ok(Some(location)),
            None => Err(missing(
                probe,
                format!(
                    "no compiled FAEST library in {}; build faest-ref there first.\n{}",
                    build_dir.display(),
                    remediation(ctx)
                ),
            )),
        }
    }
}

/// Tier 3: clone the upstream source and build it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackBuildSource;

impl ArtifactSource for FallbackBuildSource {
    fn name(&self) -> &'static str {
        "fallback-build"
    }

    fn resolve(
        &self,
        ctx: &AcquireContext,
        runner: &dyn CommandRunner,
        probe: &mut Probe,
    ) -> Result<Option<ArtifactLocation>> {
        let platform = ctx.platform();
        if !platform.os().supports_source_build() {
            return Err(AcquireError::UnsupportedPlatform {
                platform: platform.to_string(),
                remediation: format!(
                    "Use a release that bundles prebuilt libraries under lib/windows/x64, \
                     or build faest-ref separately and set {BUILD_DIR_VAR} and {SRC_DIR_VAR}."
                ),
            });
        }

        let tools = ToolBootstrapper::new(ctx, runner);
        let meson = tools.ensure("meson")?;
        let ninja = match tools.ensure("ninja") {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "continuing without ninja");
                None
            }
        };

        let output = SourceBuilder::new(ctx, runner).build(&meson, ninja.as_ref())?;
        probe.check_dir(&output.build_dir);
        probe.check_dir(&output.source_dir);

        match ArtifactLocation::accept(
            &output.build_dir,
            &output.source_dir,
            Origin::FreshlyBuilt,
            ctx.naming(),
        ) {
            Some(location) => Ok(Some(location)),
            None => Err(missing(
                probe,
                format!(
                    "the build finished but produced no recognizable library in {}",
                    output.build_dir.display()
                ),
            )),
        }
    }
}

/// Runs the cascade of artifact sources.
pub struct Locator {
    sources: Vec<Box<dyn ArtifactSource>>,
}

impl Locator {
    /// Bundled, then development overrides, then fallback build.
    pub fn standard() -> Self {
        Self::with_sources(vec![
            Box::new(BundledSource),
            Box::new(DevelopmentSource),
            Box::new(FallbackBuildSource),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn ArtifactSource>>) -> Self {
        Locator { sources }
    }

    /// Names of the configured tiers, in order.
    pub fn tiers(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Return the first location any tier produces.
    pub fn locate(&self, ctx: &AcquireContext, runner: &dyn CommandRunner) -> Result<ArtifactLocation> {
        let mut probe = Probe::default();
        for source in &self.sources {
            tracing::debug!(tier = source.name(), "trying");
            if let Some(location) = source.resolve(ctx, runner, &mut probe)? {
                tracing::info!(
                    tier = source.name(),
                    library_dir = %location.library_dir().display(),
                    include_dir = %location.include_dir().display(),
                    "located FAEST library"
                );
                return Ok(location);
            }
        }
        Err(missing(&mut probe, remediation(ctx)))
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::standard()
    }
}

fn missing(probe: &mut Probe, remediation: String) -> AcquireError {
    AcquireError::MissingArtifact {
        checked: std::mem::take(probe).into_checked(),
        remediation,
    }
}

fn remediation(ctx: &AcquireContext) -> String {
    let bundle = match ctx.platform().bundle_subdir() {
        Some(sub) => ctx.bundle_root().join("lib").join(sub),
        None => ctx.bundle_root().join("lib").join("<os>").join("<arch>"),
    };
    format!(
        "For development, either:\n  \
         1. Set environment variables:\n     \
         export {BUILD_DIR_VAR}=/path/to/faest-ref/build\n     \
         export {SRC_DIR_VAR}=/path/to/faest-ref\n  \
         2. Or bundle prebuilt libraries under {} and headers under {}",
        bundle.display(),
        ctx.bundled_include_dir().display()
    )
}
