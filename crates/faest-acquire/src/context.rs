//! Pipeline context: every piece of ambient state, captured once.
//!
//! Stages never read the process environment directly. They consult the
//! [`EnvSnapshot`] inside an [`AcquireContext`], which makes a run reproducible
//! and lets tests substitute any variable.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use faest_targets::{LibraryNaming, PlatformKey};

/// Build-output directory override.
pub const BUILD_DIR_VAR: &str = "FAEST_BUILD_DIR";
/// Source/header directory override.
pub const SRC_DIR_VAR: &str = "FAEST_SRC_DIR";
/// Cross-compilation target descriptor (`<os>-<os-version>-<arch>`).
pub const HOST_PLATFORM_VAR: &str = "FAEST_HOST_PLATFORM";
/// Cross-compilation architecture flags, appended to compile and link args.
pub const ARCHFLAGS_VAR: &str = "ARCHFLAGS";

/// Upstream reference implementation.
pub const DEFAULT_REPOSITORY: &str = "https://github.com/faest-sign/faest-ref.git";
/// Clone directory name, relative to the bundle root.
pub const DEFAULT_CLONE_DIR: &str = "faest-ref";
/// Interpreter used to run the package installer.
pub const DEFAULT_PYTHON: &str = "python3";

/// Snapshot of the environment variables the pipeline consults.
///
/// Empty values are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    /// `FAEST_BUILD_DIR`.
    pub build_dir: Option<PathBuf>,
    /// `FAEST_SRC_DIR`.
    pub src_dir: Option<PathBuf>,
    /// `FAEST_HOST_PLATFORM`.
    pub host_platform: Option<String>,
    /// `ARCHFLAGS`.
    pub archflags: Option<String>,
    /// `PATH`, split into entries.
    pub path: Vec<PathBuf>,
    /// `HOME` (or `USERPROFILE` on windows).
    pub home: Option<PathBuf>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        let vars: HashMap<String, OsString> = std::env::vars_os()
            .filter_map(|(k, v)| k.into_string().ok().map(|k| (k, v)))
            .collect();
        Self::from_map(&vars)
    }

    /// Build a snapshot from explicit variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OsString>,
    {
        let map: HashMap<String, OsString> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_map(&map)
    }

    fn from_map(vars: &HashMap<String, OsString>) -> Self {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();
        let get_string = |key: &str| get(key).and_then(|v| v.into_string().ok());

        EnvSnapshot {
            build_dir: get(BUILD_DIR_VAR).map(PathBuf::from),
            src_dir: get(SRC_DIR_VAR).map(PathBuf::from),
            host_platform: get_string(HOST_PLATFORM_VAR),
            archflags: get_string(ARCHFLAGS_VAR),
            path: get("PATH")
                .map(|p| std::env::split_paths(&p).collect())
                .unwrap_or_default(),
            home: get("HOME").or_else(|| get("USERPROFILE")).map(PathBuf::from),
        }
    }

    /// Whether either development override variable is set.
    pub fn has_dev_overrides(&self) -> bool {
        self.build_dir.is_some() || self.src_dir.is_some()
    }
}

/// Where the fallback build fetches its source from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Git repository URL.
    pub repository: String,
    /// Optional branch or tag passed to `git clone --branch`.
    pub revision: Option<String>,
}

impl Default for Upstream {
    fn default() -> Self {
        Upstream {
            repository: DEFAULT_REPOSITORY.to_string(),
            revision: None,
        }
    }
}

/// Immutable context threaded through every acquisition stage.
#[derive(Debug, Clone)]
pub struct AcquireContext {
    platform: PlatformKey,
    env: EnvSnapshot,
    bundle_root: PathBuf,
    clone_dir: PathBuf,
    upstream: Upstream,
    python: String,
}

impl AcquireContext {
    /// Create a context rooted at `bundle_root`, detecting the platform from
    /// the snapshot's cross-compilation descriptor or the host.
    pub fn new(bundle_root: impl Into<PathBuf>, env: EnvSnapshot) -> Self {
        let platform = PlatformKey::detect(env.host_platform.as_deref());
        Self::with_platform(bundle_root, env, platform)
    }

    /// Create a context for an already-known platform.
    pub fn with_platform(
        bundle_root: impl Into<PathBuf>,
        env: EnvSnapshot,
        platform: PlatformKey,
    ) -> Self {
        let bundle_root = bundle_root.into();
        let clone_dir = bundle_root.join(DEFAULT_CLONE_DIR);
        AcquireContext {
            platform,
            env,
            bundle_root,
            clone_dir,
            upstream: Upstream::default(),
            python: DEFAULT_PYTHON.to_string(),
        }
    }

    /// Override the clone directory. Relative paths are taken from the bundle root.
    pub fn clone_dir_at(mut self, dir: impl AsRef<Path>) -> Self {
        self.clone_dir = self.bundle_root.join(dir);
        self
    }

    pub fn upstream(mut self, upstream: Upstream) -> Self {
        self.upstream = upstream;
        self
    }

    pub fn python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn platform(&self) -> PlatformKey {
        self.platform
    }

    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    pub fn bundle_root(&self) -> &Path {
        &self.bundle_root
    }

    pub fn upstream_source(&self) -> &Upstream {
        &self.upstream
    }

    pub fn python_interpreter(&self) -> &str {
        &self.python
    }

    /// Library naming rules for the target OS.
    pub fn naming(&self) -> LibraryNaming {
        LibraryNaming::for_os(self.platform.os())
    }

    /// `<bundle_root>/lib/<os>/<arch>`, when the platform has a bundle key.
    pub fn bundled_lib_dir(&self) -> Option<PathBuf> {
        self.platform
            .bundle_subdir()
            .map(|sub| self.bundle_root.join("lib").join(sub))
    }

    /// `<bundle_root>/include`.
    pub fn bundled_include_dir(&self) -> PathBuf {
        self.bundle_root.join("include")
    }

    /// Development build directory: `FAEST_BUILD_DIR` or `<bundle_root>/../build`.
    pub fn dev_build_dir(&self) -> PathBuf {
        self.env
            .build_dir
            .clone()
            .unwrap_or_else(|| self.bundle_root.join("..").join("build"))
    }

    /// Development source directory: `FAEST_SRC_DIR` or `<bundle_root>/..`.
    pub fn dev_src_dir(&self) -> PathBuf {
        self.env
            .src_dir
            .clone()
            .unwrap_or_else(|| self.bundle_root.join(".."))
    }

    /// Local clone of the upstream source.
    pub fn clone_dir(&self) -> &Path {
        &self.clone_dir
    }

    /// Build output directory inside the clone.
    pub fn fresh_build_dir(&self) -> PathBuf {
        self.clone_dir.join("build")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reads_overrides() {
        let env = EnvSnapshot::from_vars([
            ("FAEST_BUILD_DIR", "/opt/faest/build"),
            ("FAEST_SRC_DIR", "/opt/faest"),
            ("FAEST_HOST_PLATFORM", "macosx-11.0-arm64"),
            ("ARCHFLAGS", "-arch arm64"),
            ("HOME", "/home/dev"),
        ]);
        assert_eq!(env.build_dir, Some(PathBuf::from("/opt/faest/build")));
        assert_eq!(env.src_dir, Some(PathBuf::from("/opt/faest")));
        assert_eq!(env.host_platform.as_deref(), Some("macosx-11.0-arm64"));
        assert_eq!(env.archflags.as_deref(), Some("-arch arm64"));
        assert_eq!(env.home, Some(PathBuf::from("/home/dev")));
        assert!(env.has_dev_overrides());
    }

    #[test]
    fn empty_values_are_unset() {
        let env = EnvSnapshot::from_vars([("FAEST_BUILD_DIR", ""), ("ARCHFLAGS", "")]);
        assert!(env.build_dir.is_none());
        assert!(env.archflags.is_none());
        assert!(!env.has_dev_overrides());
    }

    #[test]
    fn path_is_split() {
        let joined = std::env::join_paths(["/usr/bin", "/usr/local/bin"]).unwrap();
        let env = EnvSnapshot::from_vars([("PATH", joined)]);
        assert_eq!(
            env.path,
            vec![PathBuf::from("/usr/bin"), PathBuf::from("/usr/local/bin")]
        );
    }

    #[test]
    fn cross_target_sets_platform() {
        let env = EnvSnapshot::from_vars([("FAEST_HOST_PLATFORM", "linux-aarch64")]);
        let ctx = AcquireContext::new("/pkg", env);
        assert_eq!(ctx.platform().to_string(), "linux/aarch64");
        assert_eq!(
            ctx.bundled_lib_dir(),
            Some(PathBuf::from("/pkg/lib/linux/aarch64"))
        );
    }

    #[test]
    fn default_layout() {
        let ctx = AcquireContext::with_platform(
            "/pkg",
            EnvSnapshot::default(),
            PlatformKey::from_tokens("linux", "x86_64"),
        );
        assert_eq!(ctx.bundled_include_dir(), PathBuf::from("/pkg/include"));
        assert_eq!(ctx.dev_build_dir(), PathBuf::from("/pkg/../build"));
        assert_eq!(ctx.dev_src_dir(), PathBuf::from("/pkg/.."));
        assert_eq!(ctx.clone_dir(), Path::new("/pkg/faest-ref"));
        assert_eq!(ctx.fresh_build_dir(), PathBuf::from("/pkg/faest-ref/build"));
        assert_eq!(ctx.upstream_source().repository, DEFAULT_REPOSITORY);
    }

    #[test]
    fn clone_dir_relative_to_bundle_root() {
        let ctx = AcquireContext::with_platform(
            "/pkg",
            EnvSnapshot::default(),
            PlatformKey::from_tokens("linux", "x86_64"),
        )
        .clone_dir_at("vendor/faest-ref");
        assert_eq!(ctx.clone_dir(), Path::new("/pkg/vendor/faest-ref"));
    }
}
