//! Build descriptor emission.
//!
//! A [`BuildDescriptor`] is everything the FFI compilation step needs to
//! compile and link against the located library. It is produced only by
//! [`emit`], fully populated.

use std::path::{Path, PathBuf};

use faest_acquire::{AcquireContext, ArtifactLocation, Origin};
use faest_targets::{OperatingSystem, PlatformKey, LIBRARY_NAME};
use serde::Serialize;

use crate::contract::header_names;
use crate::declaration::DeclarationTable;
use crate::error::Result;

/// How the loader finds the shared library at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeSearch {
    /// Relative to the loading module (`$ORIGIN/...`, `@loader_path/...`).
    Relative { token: String },
    /// Absolute directories.
    Absolute { paths: Vec<PathBuf> },
    /// No runtime search path (windows, unknown platforms).
    None,
}

impl RuntimeSearch {
    /// Entries to pass as `-Wl,-rpath,<entry>`.
    pub fn rpath_entries(&self) -> Vec<String> {
        match self {
            Self::Relative { token } => vec![token.clone()],
            Self::Absolute { paths } => paths.iter().map(|p| p.display().to_string()).collect(),
            Self::None => Vec::new(),
        }
    }
}

/// Compile and link configuration for the FFI step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDescriptor {
    platform: PlatformKey,
    origin: Origin,
    library: String,
    library_dirs: Vec<PathBuf>,
    include_dirs: Vec<PathBuf>,
    runtime_search: RuntimeSearch,
    extra_compile_args: Vec<String>,
    extra_link_args: Vec<String>,
    headers: Vec<String>,
    declarations: DeclarationTable,
}

/// Build the descriptor for `location`. The platform, cross-compilation
/// flags, and bundle root come from `ctx`.
pub fn emit(location: &ArtifactLocation, ctx: &AcquireContext) -> BuildDescriptor {
    let platform = ctx.platform();
    let library_dir = location.library_dir().to_path_buf();

    let mut include_dirs = vec![library_dir.clone()];
    if location.include_dir() != library_dir {
        include_dirs.push(location.include_dir().to_path_buf());
    }

    let runtime_search = runtime_search(location, ctx.bundle_root(), platform.os());

    let arch_args: Vec<String> = ctx
        .env()
        .archflags
        .as_deref()
        .map(|flags| flags.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    if !arch_args.is_empty() {
        tracing::info!(flags = ?arch_args, "applying cross-compilation flags");
    }

    let declarations = DeclarationTable::standard();
    let descriptor = BuildDescriptor {
        platform,
        origin: location.origin(),
        library: LIBRARY_NAME.to_string(),
        library_dirs: vec![library_dir],
        include_dirs,
        runtime_search,
        extra_compile_args: arch_args.clone(),
        extra_link_args: arch_args,
        headers: header_names(&declarations),
        declarations,
    };
    tracing::debug!(runtime_search = ?descriptor.runtime_search, "emitted build descriptor");
    descriptor
}

fn runtime_search(location: &ArtifactLocation, bundle_root: &Path, os: OperatingSystem) -> RuntimeSearch {
    if !os.uses_rpath() {
        return RuntimeSearch::None;
    }
    let library_dir = location.library_dir();
    if location.origin() == Origin::Bundled {
        if let Ok(rel) = library_dir.strip_prefix(bundle_root) {
            let anchor = match os {
                OperatingSystem::Macos => "@loader_path",
                _ => "$ORIGIN",
            };
            return RuntimeSearch::Relative {
                token: format!("{anchor}/{}", rel.display()),
            };
        }
    }
    RuntimeSearch::Absolute {
        paths: vec![library_dir.to_path_buf()],
    }
}

impl BuildDescriptor {
    pub fn platform(&self) -> PlatformKey {
        self.platform
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Link name (`faest`).
    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn library_dirs(&self) -> &[PathBuf] {
        &self.library_dirs
    }

    /// Include directories in search order: build output first.
    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    pub fn runtime_search(&self) -> &RuntimeSearch {
        &self.runtime_search
    }

    pub fn extra_compile_args(&self) -> &[String] {
        &self.extra_compile_args
    }

    pub fn extra_link_args(&self) -> &[String] {
        &self.extra_link_args
    }

    /// Parameter-set headers the glue source includes.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn declarations(&self) -> &DeclarationTable {
        &self.declarations
    }

    /// Cargo build-script directives.
    ///
    /// Include directories are published as `cargo:include`, joined with the
    /// host path-list separator.
    pub fn cargo_directives(&self) -> String {
        let mut out = String::new();
        for dir in &self.library_dirs {
            out.push_str(&format!("cargo:rustc-link-search=native={}\n", dir.display()));
        }
        out.push_str(&format!("cargo:rustc-link-lib={}\n", self.library));
        for entry in self.runtime_search.rpath_entries() {
            out.push_str(&format!("cargo:rustc-link-arg=-Wl,-rpath,{entry}\n"));
        }
        for arg in &self.extra_link_args {
            out.push_str(&format!("cargo:rustc-link-arg={arg}\n"));
        }
        let separator = if cfg!(windows) { ";" } else { ":" };
        let includes: Vec<String> = self
            .include_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect();
        out.push_str(&format!("cargo:include={}\n", includes.join(separator)));
        out
    }

    /// C source for the glue translation unit: the header includes.
    pub fn glue_source(&self) -> String {
        self.declarations.includes()
    }

    /// The declaration table as C text.
    pub fn cdef(&self) -> String {
        self.declarations.cdef()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faest_acquire::EnvSnapshot;
    use faest_targets::LibraryNaming;

    fn ctx(root: &Path, os: &str, arch: &str, env: EnvSnapshot) -> AcquireContext {
        AcquireContext::with_platform(root, env, PlatformKey::from_tokens(os, arch))
    }

    fn location(lib_dir: &Path, include_dir: &Path, lib: &str, origin: Origin, os: OperatingSystem) -> ArtifactLocation {
        std::fs::create_dir_all(lib_dir).unwrap();
        std::fs::create_dir_all(include_dir).unwrap();
        std::fs::write(lib_dir.join(lib), b"lib").unwrap();
        ArtifactLocation::accept(lib_dir, include_dir, origin, LibraryNaming::for_os(os)).unwrap()
    }

    #[test]
    fn bundled_linux_uses_origin_token() {
        let root = tempfile::tempdir().unwrap();
        let loc = location(
            &root.path().join("lib/linux/x86_64"),
            &root.path().join("include"),
            "libfaest.so",
            Origin::Bundled,
            OperatingSystem::Linux,
        );
        let d = emit(&loc, &ctx(root.path(), "linux", "x86_64", EnvSnapshot::default()));

        assert_eq!(d.library(), "faest");
        assert_eq!(d.library_dirs(), [root.path().join("lib/linux/x86_64")]);
        assert_eq!(
            d.include_dirs(),
            [root.path().join("lib/linux/x86_64"), root.path().join("include")]
        );
        assert_eq!(
            d.runtime_search(),
            &RuntimeSearch::Relative {
                token: "$ORIGIN/lib/linux/x86_64".into()
            }
        );
        assert!(d.extra_compile_args().is_empty());
        assert_eq!(d.headers().len(), 12);
    }

    #[test]
    fn bundled_macos_uses_loader_path() {
        let root = tempfile::tempdir().unwrap();
        let loc = location(
            &root.path().join("lib/macos/arm64"),
            &root.path().join("include"),
            "libfaest.dylib",
            Origin::Bundled,
            OperatingSystem::Macos,
        );
        let d = emit(&loc, &ctx(root.path(), "darwin", "arm64", EnvSnapshot::default()));
        assert_eq!(d.runtime_search().rpath_entries(), ["@loader_path/lib/macos/arm64"]);
    }

    #[test]
    fn development_build_uses_absolute_path() {
        let root = tempfile::tempdir().unwrap();
        let build = root.path().join("faest-ref/build");
        let loc = location(
            &build,
            &root.path().join("faest-ref"),
            "libfaest.so",
            Origin::DevelopmentEnv,
            OperatingSystem::Linux,
        );
        let d = emit(&loc, &ctx(root.path(), "linux", "x86_64", EnvSnapshot::default()));
        assert_eq!(
            d.runtime_search(),
            &RuntimeSearch::Absolute {
                paths: vec![build.clone()]
            }
        );
        assert_eq!(d.include_dirs()[0], build);
    }

    #[test]
    fn windows_has_no_runtime_search() {
        let root = tempfile::tempdir().unwrap();
        let loc = location(
            &root.path().join("lib/windows/x64"),
            &root.path().join("include"),
            "faest.dll",
            Origin::Bundled,
            OperatingSystem::Windows,
        );
        let d = emit(&loc, &ctx(root.path(), "win32", "amd64", EnvSnapshot::default()));
        assert_eq!(d.runtime_search(), &RuntimeSearch::None);
        assert!(!d.cargo_directives().contains("rpath"));
    }

    #[test]
    fn same_library_and_include_dir_is_listed_once() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("faest");
        let loc = location(&dir, &dir, "libfaest.a", Origin::DevelopmentEnv, OperatingSystem::Linux);
        let d = emit(&loc, &ctx(root.path(), "linux", "x86_64", EnvSnapshot::default()));
        assert_eq!(d.include_dirs(), [dir]);
    }

    #[test]
    fn archflags_are_split_and_appended() {
        let root = tempfile::tempdir().unwrap();
        let loc = location(
            &root.path().join("lib/macos/arm64"),
            &root.path().join("include"),
            "libfaest.dylib",
            Origin::Bundled,
            OperatingSystem::Macos,
        );
        let env = EnvSnapshot {
            archflags: Some("-arch  arm64\t-mmacosx-version-min=11.0".into()),
            ..EnvSnapshot::default()
        };
        let d = emit(&loc, &ctx(root.path(), "macosx", "arm64", env));
        let expected = ["-arch", "arm64", "-mmacosx-version-min=11.0"];
        assert_eq!(d.extra_compile_args(), expected);
        assert_eq!(d.extra_link_args(), expected);
        assert!(d.cargo_directives().contains("cargo:rustc-link-arg=-arch\n"));
    }

    #[test]
    fn cargo_directives_for_bundled_linux() {
        let root = tempfile::tempdir().unwrap();
        let loc = location(
            &root.path().join("lib/linux/aarch64"),
            &root.path().join("include"),
            "libfaest.so",
            Origin::Bundled,
            OperatingSystem::Linux,
        );
        let d = emit(&loc, &ctx(root.path(), "linux", "aarch64", EnvSnapshot::default()));
        let lib = root.path().join("lib/linux/aarch64");
        let inc = root.path().join("include");
        assert_eq!(
            d.cargo_directives(),
            format!(
                "cargo:rustc-link-search=native={}\n\
                 cargo:rustc-link-lib=faest\n\
                 cargo:rustc-link-arg=-Wl,-rpath,$ORIGIN/lib/linux/aarch64\n\
                 cargo:include={}:{}\n",
                lib.display(),
                lib.display(),
                inc.display()
            )
        );
    }

    #[test]
    fn table_is_independent_of_origin() {
        let root = tempfile::tempdir().unwrap();
        let bundled = location(
            &root.path().join("lib/linux/x86_64"),
            &root.path().join("include"),
            "libfaest.so",
            Origin::Bundled,
            OperatingSystem::Linux,
        );
        let fresh = location(
            &root.path().join("faest-ref/build"),
            &root.path().join("faest-ref"),
            "libfaest.so",
            Origin::FreshlyBuilt,
            OperatingSystem::Linux,
        );
        let c = ctx(root.path(), "linux", "x86_64", EnvSnapshot::default());
        assert_eq!(emit(&bundled, &c).declarations(), emit(&fresh, &c).declarations());
        assert_eq!(emit(&fresh, &c).cdef().matches("#define").count(), 36);
    }

    #[test]
    fn json_shape() {
        let root = tempfile::tempdir().unwrap();
        let loc = location(
            &root.path().join("lib/linux/x86_64"),
            &root.path().join("include"),
            "libfaest.so",
            Origin::Bundled,
            OperatingSystem::Linux,
        );
        let d = emit(&loc, &ctx(root.path(), "linux", "x86_64", EnvSnapshot::default()));
        let json: serde_json::Value = serde_json::from_str(&d.to_json().unwrap()).unwrap();
        assert_eq!(json["library"], "faest");
        assert_eq!(json["origin"], "bundled");
        assert_eq!(json["runtime_search"]["kind"], "relative");
        assert_eq!(json["declarations"]["constants"].as_array().unwrap().len(), 36);
        assert_eq!(json["declarations"]["functions"].as_array().unwrap().len(), 60);
    }
}
