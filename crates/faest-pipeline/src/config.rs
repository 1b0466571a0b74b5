//! `faest-bind.toml` configuration.
//!
//! Every field is optional. Environment variables captured in the
//! [`EnvSnapshot`] take precedence over the file, and the file over built-in
//! defaults.

use std::path::{Path, PathBuf};

use faest_acquire::{AcquireContext, EnvSnapshot, Upstream, DEFAULT_CLONE_DIR, DEFAULT_PYTHON};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// File name searched for when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "faest-bind.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BindConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// `[paths]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PathsConfig {
    /// Package root holding `lib/` and `include/`. Relative to the config file.
    #[serde(default)]
    pub bundle_root: Option<PathBuf>,
    /// Clone directory for the fallback build. Relative to the bundle root.
    #[serde(default)]
    pub clone_dir: Option<PathBuf>,
}

/// `[upstream]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub repository: Option<String>,
    /// Branch or tag to clone.
    #[serde(default)]
    pub revision: Option<String>,
}

/// `[tools]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolsConfig {
    /// Interpreter used to run `pip`.
    #[serde(default)]
    pub python: Option<String>,
}

impl BindConfig {
    /// Parse from TOML text; `path` is used in error messages only.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|error| PipelineError::Config {
            path: path.to_path_buf(),
            error,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Search upward from `start_dir` for `faest-bind.toml`, returning the
    /// config and the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading configuration");
                return Ok(Some((Self::load(&candidate)?, dir)));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Bundle root: `paths.bundle-root` resolved against `base_dir`, or `base_dir` itself.
    pub fn bundle_root(&self, base_dir: &Path) -> PathBuf {
        match &self.paths.bundle_root {
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        }
    }

    pub fn upstream(&self) -> Upstream {
        let defaults = Upstream::default();
        Upstream {
            repository: self
                .upstream
                .repository
                .clone()
                .unwrap_or(defaults.repository),
            revision: self.upstream.revision.clone().or(defaults.revision),
        }
    }

    /// Build the acquisition context for a run rooted at `base_dir`.
    pub fn context(&self, base_dir: &Path, env: EnvSnapshot) -> AcquireContext {
        let clone_dir = self
            .paths
            .clone_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLONE_DIR));
        AcquireContext::new(self.bundle_root(base_dir), env)
            .clone_dir_at(clone_dir)
            .upstream(self.upstream())
            .python(self.tools.python.as_deref().unwrap_or(DEFAULT_PYTHON))
    }
}
