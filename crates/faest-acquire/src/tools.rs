//! On-demand bootstrapping of the external build toolchain.
//!
//! The fallback build needs a configure generator (meson) and prefers a
//! dedicated build runner (ninja). Both are installable through the Python
//! package installer, which places them in a user-local or interpreter-adjacent
//! scripts directory that may not be on `PATH`.

use std::path::{Path, PathBuf};

use faest_targets::OperatingSystem;

use crate::context::AcquireContext;
use crate::error::{AcquireError, Result};
use crate::process::{CommandRunner, Invocation};

/// A build tool and, once resolved, its executable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHandle {
    name: String,
    executable_path: Option<PathBuf>,
}

impl ToolHandle {
    /// A tool at a known path.
    pub fn resolved(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ToolHandle {
            name: name.into(),
            executable_path: Some(path.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executable_path(&self) -> Option<&Path> {
        self.executable_path.as_deref()
    }

    /// What to launch: the resolved path, or the bare name for `PATH` lookup.
    pub fn program(&self) -> PathBuf {
        self.executable_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }
}

/// Ensures build tools are runnable, installing them if necessary.
pub struct ToolBootstrapper<'a> {
    ctx: &'a AcquireContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> ToolBootstrapper<'a> {
    pub fn new(ctx: &'a AcquireContext, runner: &'a dyn CommandRunner) -> Self {
        ToolBootstrapper { ctx, runner }
    }

    /// Whether `<tool> --version` launches and exits zero.
    pub fn probe(&self, tool: &str) -> bool {
        let inv = Invocation::new(tool).arg("--version");
        match self.runner.run(&inv) {
            Ok(out) if out.success => {
                tracing::debug!(tool, version = out.stdout.trim(), "tool available");
                true
            }
            Ok(out) => {
                tracing::debug!(tool, stderr = out.stderr.trim(), "version query failed");
                false
            }
            Err(e) => {
                tracing::debug!(tool, error = %e, "tool not launchable");
                false
            }
        }
    }

    /// Make `tool` available, installing it on demand.
    pub fn ensure(&self, tool: &str) -> Result<ToolHandle> {
        if self.probe(tool) {
            let dirs = self.ctx.env().path.clone();
            return Ok(ToolHandle {
                name: tool.to_string(),
                executable_path: find_executable(tool, &dirs, self.ctx.platform().os()),
            });
        }

        tracing::info!(tool, "tool not found; installing");
        let installed = self.install(tool);

        let dirs = self.search_dirs();
        match find_executable(tool, &dirs, self.ctx.platform().os()) {
            Some(path) => {
                tracing::info!(tool, path = %path.display(), "resolved tool");
                Ok(ToolHandle {
                    name: tool.to_string(),
                    executable_path: Some(path),
                })
            }
            None => {
                let python = self.ctx.python_interpreter();
                let attempted = if installed {
                    format!("`{python} -m pip install {tool}` succeeded but no executable was found")
                } else {
                    format!("`{python} -m pip install --user {tool}` and `{python} -m pip install {tool}` both failed")
                };
                Err(AcquireError::ToolUnavailable {
                    tool: tool.to_string(),
                    remediation: format!(
                        "{attempted}. Searched: {}. Install {tool} manually and make sure it is on PATH.",
                        dirs.iter()
                            .map(|d| d.display().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })
            }
        }
    }

    /// Install through pip, first user-scoped, then once more without `--user`.
    fn install(&self, tool: &str) -> bool {
        let python = self.ctx.python_interpreter();
        let user = Invocation::new(python).args(["-m", "pip", "install", "--user", tool]);
        if self.succeeded(&user) {
            return true;
        }
        tracing::warn!(tool, "user install failed; retrying without --user");
        let plain = Invocation::new(python).args(["-m", "pip", "install", tool]);
        self.succeeded(&plain)
    }

    fn succeeded(&self, inv: &Invocation) -> bool {
        match self.runner.run(inv) {
            Ok(out) => {
                if !out.success {
                    tracing::debug!(command = %inv, stderr = out.stderr.trim(), "command failed");
                }
                out.success
            }
            Err(e) => {
                tracing::debug!(command = %inv, error = %e, "command not launchable");
                false
            }
        }
    }

    /// Executable search order: `PATH`, `~/.local/bin`, then the Python scripts directory.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.ctx.env().path.clone();
        if let Some(home) = &self.ctx.env().home {
            dirs.push(home.join(".local").join("bin"));
        }
        if let Some(scripts) = self.python_scripts_dir() {
            dirs.push(scripts);
        }
        dirs
    }

    fn python_scripts_dir(&self) -> Option<PathBuf> {
        let inv = Invocation::new(self.ctx.python_interpreter()).args([
            "-c",
            "import sysconfig; print(sysconfig.get_path('scripts'))",
        ]);
        let out = self.runner.run(&inv).ok().filter(|o| o.success)?;
        let line = out.stdout.trim();
        (!line.is_empty()).then(|| PathBuf::from(line))
    }
}

/// First `dirs` entry holding an executable file named `tool`.
pub fn find_executable(tool: &str, dirs: &[PathBuf], os: OperatingSystem) -> Option<PathBuf> {
    let file_name = match os {
        OperatingSystem::Windows => format!("{tool}.exe"),
        _ => tool.to_string(),
    };
    dirs.iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}
