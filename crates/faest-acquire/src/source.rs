//! Source acquisition and the fallback build driver.
//!
//! Drives a single build through the states
//! `NoSource → Cloning → SourceReady → Configuring → Building → Built`,
//! stopping at `CloneFailed` or `BuildFailed` with the failing command's
//! captured stderr and what the user can do about it. Nothing is retried.

use std::path::PathBuf;

use crate::context::{AcquireContext, BUILD_DIR_VAR, SRC_DIR_VAR};
use crate::error::{AcquireError, Result};
use crate::process::{CommandRunner, Invocation, ProcessOutput};
use crate::tools::ToolHandle;

/// Build directory name inside the clone.
pub const BUILD_SUBDIR: &str = "build";

/// State of the source build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    NoSource,
    Cloning,
    SourceReady,
    Configuring,
    Building,
    Built,
    CloneFailed { stderr: String },
    BuildFailed { stderr: String },
}

/// Directories produced by a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// Root of the cloned source tree (holds the public headers).
    pub source_dir: PathBuf,
    /// Build output directory (holds the library and generated headers).
    pub build_dir: PathBuf,
}

/// Clones and builds the upstream reference implementation.
pub struct SourceBuilder<'a> {
    ctx: &'a AcquireContext,
    runner: &'a dyn CommandRunner,
    state: BuildState,
    history: Vec<BuildState>,
}

impl<'a> SourceBuilder<'a> {
    pub fn new(ctx: &'a AcquireContext, runner: &'a dyn CommandRunner) -> Self {
        SourceBuilder {
            ctx,
            runner,
            state: BuildState::NoSource,
            history: vec![BuildState::NoSource],
        }
    }

    /// Current state.
    pub fn state(&self) -> &BuildState {
        &self.state
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    fn transition(&mut self, next: BuildState) {
        tracing::info!(from = ?self.state, to = ?next, "source build");
        self.history.push(next.clone());
        self.state = next;
    }

    /// Ensure a local clone exists. No subprocess runs when it already does.
    pub fn acquire_source(&mut self) -> Result<PathBuf> {
        let clone_dir = self.ctx.clone_dir().to_path_buf();
        if clone_dir.exists() {
            tracing::debug!(path = %clone_dir.display(), "source already present");
            self.transition(BuildState::SourceReady);
            return Ok(clone_dir);
        }

        if let Some(parent) = clone_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.transition(BuildState::Cloning);
        let upstream = self.ctx.upstream_source();
        let mut inv = Invocation::new("git").args(["clone", "--depth", "1"]);
        if let Some(rev) = &upstream.revision {
            inv = inv.args(["--branch", rev.as_str()]);
        }
        let inv = inv
            .arg(upstream.repository.as_str())
            .arg(clone_dir.to_string_lossy());

        match self.runner.run(&inv) {
            Ok(out) if out.success => {
                self.transition(BuildState::SourceReady);
                Ok(clone_dir)
            }
            Ok(out) => Err(self.clone_failed(&inv, out.stderr)),
            Err(e) => Err(self.clone_failed(&inv, format!("failed to launch git: {e}"))),
        }
    }

    /// Run the whole state machine: clone, configure with meson, compile.
    ///
    /// `ninja` is preferred for compiling; without it (or if it cannot be
    /// launched) `meson compile` is used instead.
    pub fn build(&mut self, meson: &ToolHandle, ninja: Option<&ToolHandle>) -> Result<BuildOutput> {
        let source_dir = self.acquire_source()?;
        let build_dir = source_dir.join(BUILD_SUBDIR);

        self.transition(BuildState::Configuring);
        if build_dir.join("build.ninja").is_file() {
            tracing::debug!(path = %build_dir.display(), "build directory already configured");
        } else {
            let setup = Invocation::new(meson.program())
                .args(["setup", BUILD_SUBDIR, "--buildtype=release"])
                .current_dir(&source_dir);
            self.run_build_step(&setup)?;
        }

        self.transition(BuildState::Building);
        self.compile(meson, ninja, &source_dir)?;

        self.transition(BuildState::Built);
        Ok(BuildOutput {
            source_dir,
            build_dir,
        })
    }

    fn compile(
        &mut self,
        meson: &ToolHandle,
        ninja: Option<&ToolHandle>,
        source_dir: &std::path::Path,
    ) -> Result<()> {
        if let Some(ninja) = ninja {
            let inv = Invocation::new(ninja.program())
                .args(["-C", BUILD_SUBDIR])
                .current_dir(source_dir);
            match self.runner.run(&inv) {
                Ok(out) => return self.check_build_output(&inv, out),
                Err(e) => {
                    tracing::warn!(error = %e, "ninja could not be launched; falling back to meson compile");
                }
            }
        } else {
            tracing::warn!("ninja unavailable; falling back to meson compile");
        }

        let inv = Invocation::new(meson.program())
            .args(["compile", "-C", BUILD_SUBDIR])
            .current_dir(source_dir);
        self.run_build_step(&inv)
    }

    fn run_build_step(&mut self, inv: &Invocation) -> Result<()> {
        match self.runner.run(inv) {
            Ok(out) => self.check_build_output(inv, out),
            Err(e) => Err(self.build_failed(
                inv,
                format!("failed to launch {}: {e}", inv.program.display()),
            )),
        }
    }

    fn check_build_output(&mut self, inv: &Invocation, out: ProcessOutput) -> Result<()> {
        if out.success {
            Ok(())
        } else {
            // meson and ninja report compiler errors on stdout
            let captured = if out.stderr.trim().is_empty() {
                out.stdout
            } else {
                out.stderr
            };
            Err(self.build_failed(inv, captured))
        }
    }

    fn clone_failed(&mut self, inv: &Invocation, stderr: String) -> AcquireError {
        self.transition(BuildState::CloneFailed {
            stderr: stderr.clone(),
        });
        AcquireError::CloneFailed {
            command: inv.to_string(),
            stderr,
            remediation: format!(
                "Install git and check network access to {}, or point {BUILD_DIR_VAR} and \
                 {SRC_DIR_VAR} at an existing faest-ref build.",
                self.ctx.upstream_source().repository
            ),
        }
    }

    fn build_failed(&mut self, inv: &Invocation, stderr: String) -> AcquireError {
        self.transition(BuildState::BuildFailed {
            stderr: stderr.clone(),
        });
        AcquireError::BuildFailed {
            command: inv.to_string(),
            stderr,
            remediation: "Install a C compiler (cc, gcc or clang), or run \
                          `faest-bind clean --build-only` and retry."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EnvSnapshot, Upstream};
    use crate::process::{Scripted, ScriptedRunner};
    use faest_targets::PlatformKey;

    fn ctx(root: &std::path::Path) -> AcquireContext {
        AcquireContext::with_platform(
            root,
            EnvSnapshot::default(),
            PlatformKey::from_tokens("linux", "x86_64"),
        )
    }

    fn tool(name: &str) -> ToolHandle {
        ToolHandle::resolved(name, PathBuf::from(format!("/usr/bin/{name}")))
    }

    #[test]
    fn clone_skipped_when_present() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        std::fs::create_dir_all(ctx.clone_dir()).unwrap();
        let runner = ScriptedRunner::new();

        let mut builder = SourceBuilder::new(&ctx, &runner);
        builder.acquire_source().unwrap();
        builder.acquire_source().unwrap();
        assert!(runner.calls().is_empty());
        assert_eq!(builder.state(), &BuildState::SourceReady);
    }

    #[test]
    fn second_acquire_does_not_clone_again() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        let clone_dir = ctx.clone_dir().to_path_buf();
        let runner = ScriptedRunner::new().on_with(
            "git clone",
            Scripted::Succeed(String::new()),
            move |_| std::fs::create_dir_all(&clone_dir).unwrap(),
        );

        SourceBuilder::new(&ctx, &runner).acquire_source().unwrap();
        SourceBuilder::new(&ctx, &runner).acquire_source().unwrap();
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn clone_passes_revision() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path()).upstream(Upstream {
            repository: "https://example.invalid/faest-ref.git".into(),
            revision: Some("v2.0.4".into()),
        });
        let runner = ScriptedRunner::new().on("git clone", Scripted::Succeed(String::new()));

        SourceBuilder::new(&ctx, &runner).acquire_source().unwrap();
        let call = runner.calls()[0].to_string();
        assert!(call.starts_with(
            "git clone --depth 1 --branch v2.0.4 https://example.invalid/faest-ref.git"
        ));
    }

    #[test]
    fn clone_failure_is_terminal() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        let runner = ScriptedRunner::new().on(
            "git clone",
            Scripted::Fail("fatal: unable to access".into()),
        );

        let mut builder = SourceBuilder::new(&ctx, &runner);
        let err = builder.build(&tool("meson"), Some(&tool("ninja"))).unwrap_err();
        match &err {
            AcquireError::CloneFailed { stderr, remediation, .. } => {
                assert!(stderr.contains("unable to access"));
                assert!(remediation.contains("Install git"));
                assert!(remediation.contains("FAEST_BUILD_DIR"));
                assert!(remediation.contains("FAEST_SRC_DIR"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().ends_with("at an existing faest-ref build."));
        assert_eq!(
            builder.history(),
            &[
                BuildState::NoSource,
                BuildState::Cloning,
                BuildState::CloneFailed {
                    stderr: "fatal: unable to access".into()
                },
            ]
        );
        assert_eq!(Some(builder.state()), builder.history().last());
        assert!(!runner.ran("meson"));
    }

    #[test]
    fn missing_git_is_clone_failure() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        let runner = ScriptedRunner::new();

        let err = SourceBuilder::new(&ctx, &runner).acquire_source().unwrap_err();
        assert!(matches!(err, AcquireError::CloneFailed { ref stderr, .. } if stderr.contains("failed to launch git")));
        assert!(err.to_string().contains("Install git"));
    }

    #[test]
    fn full_build_with_ninja() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        std::fs::create_dir_all(ctx.clone_dir()).unwrap();
        let runner = ScriptedRunner::new()
            .on("meson setup", Scripted::Succeed(String::new()))
            .on("ninja -C build", Scripted::Succeed(String::new()));

        let mut builder = SourceBuilder::new(&ctx, &runner);
        let out = builder.build(&tool("meson"), Some(&tool("ninja"))).unwrap();
        assert_eq!(out.build_dir, ctx.fresh_build_dir());
        assert_eq!(builder.state(), &BuildState::Built);
        assert_eq!(
            builder.history(),
            &[
                BuildState::NoSource,
                BuildState::SourceReady,
                BuildState::Configuring,
                BuildState::Building,
                BuildState::Built,
            ]
        );
        let calls = runner.calls();
        assert_eq!(calls[0].current_dir.as_deref(), Some(ctx.clone_dir()));
        assert!(!runner.ran("meson compile"));
    }

    #[test]
    fn configured_build_skips_setup() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        std::fs::create_dir_all(ctx.fresh_build_dir()).unwrap();
        std::fs::write(ctx.fresh_build_dir().join("build.ninja"), b"rule cc").unwrap();
        let runner = ScriptedRunner::new().on("ninja", Scripted::Succeed(String::new()));

        SourceBuilder::new(&ctx, &runner)
            .build(&tool("meson"), Some(&tool("ninja")))
            .unwrap();
        assert!(!runner.ran("meson setup"));
    }

    #[test]
    fn falls_back_to_meson_compile_when_ninja_absent() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        std::fs::create_dir_all(ctx.clone_dir()).unwrap();
        let runner = ScriptedRunner::new()
            .on("meson setup", Scripted::Succeed(String::new()))
            .on("meson compile", Scripted::Succeed(String::new()));

        SourceBuilder::new(&ctx, &runner).build(&tool("meson"), None).unwrap();
        assert!(runner.ran("meson compile -C build"));
    }

    #[test]
    fn falls_back_when_ninja_cannot_launch() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        std::fs::create_dir_all(ctx.clone_dir()).unwrap();
        let runner = ScriptedRunner::new()
            .on("meson setup", Scripted::Succeed(String::new()))
            .on("meson compile", Scripted::Succeed(String::new()))
            .on("ninja", Scripted::NotFound);

        SourceBuilder::new(&ctx, &runner)
            .build(&tool("meson"), Some(&tool("ninja")))
            .unwrap();
        assert!(runner.ran("ninja -C build"));
        assert!(runner.ran("meson compile -C build"));
    }

    #[test]
    fn ninja_compile_error_does_not_fall_back() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        std::fs::create_dir_all(ctx.clone_dir()).unwrap();
        let runner = ScriptedRunner::new()
            .on("meson setup", Scripted::Succeed(String::new()))
            .on("ninja", Scripted::Fail("error: unknown type name 'uint8_t'".into()));

        let mut builder = SourceBuilder::new(&ctx, &runner);
        let err = builder.build(&tool("meson"), Some(&tool("ninja"))).unwrap_err();
        assert!(matches!(err, AcquireError::BuildFailed { ref stderr, .. } if stderr.contains("uint8_t")));
        assert!(!runner.ran("meson compile"));
        assert!(matches!(builder.state(), BuildState::BuildFailed { .. }));
    }

    #[test]
    fn configure_failure_is_build_failure() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ctx(root.path());
        std::fs::create_dir_all(ctx.clone_dir()).unwrap();
        let runner = ScriptedRunner::new()
            .on("meson setup", Scripted::Fail("ERROR: Unknown compiler(s)".into()));

        let err = SourceBuilder::new(&ctx, &runner)
            .build(&tool("meson"), Some(&tool("ninja")))
            .unwrap_err();
        match &err {
            AcquireError::BuildFailed { command, remediation, .. } => {
                assert!(command.contains("meson setup build"));
                assert!(remediation.contains("Install a C compiler"));
                assert!(remediation.contains("faest-bind clean --build-only"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!runner.ran("ninja"));
    }
}
