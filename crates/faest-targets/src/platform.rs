//! Canonical platform key.
//!
//! Combines an operating system and a normalized architecture into the key
//! used to pick a bundled library directory (`lib/<os-family>/<arch>`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TargetError;
use crate::parse::{parse_arch_token, parse_descriptor, parse_os_token};

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Linux,
    Macos,
    Windows,
    /// Anything else. No bundled directory is derivable.
    Unknown,
}

impl OperatingSystem {
    /// The operating system this process is running on.
    pub fn host() -> Self {
        parse_os_token(std::env::consts::OS)
    }

    /// Directory name under the bundled `lib/` root.
    pub fn family_dir(&self) -> Option<&'static str> {
        match self {
            Self::Linux => Some("linux"),
            Self::Macos => Some("macos"),
            Self::Windows => Some("windows"),
            Self::Unknown => None,
        }
    }

    /// Whether the library can be built from source on this OS.
    pub fn supports_source_build(&self) -> bool {
        !matches!(self, Self::Windows)
    }

    /// Whether runtime library search paths (rpath) apply.
    pub fn uses_rpath(&self) -> bool {
        matches!(self, Self::Linux | Self::Macos)
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family_dir().unwrap_or("unknown"))
    }
}

/// CPU architecture, already normalized for its operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86_64,
    /// 64-bit ARM as spelled on linux.
    Aarch64,
    /// 64-bit ARM as spelled on macos and windows.
    Arm64,
    Unknown,
}

impl Architecture {
    /// Directory name under `lib/<os-family>/`.
    ///
    /// Windows x86-64 bundles live under `x64`.
    pub fn dir_name(&self, os: OperatingSystem) -> Option<&'static str> {
        match (self, os) {
            (_, OperatingSystem::Unknown) | (Self::Unknown, _) => None,
            (Self::X86_64, OperatingSystem::Windows) => Some("x64"),
            (Self::X86_64, _) => Some("x86_64"),
            (Self::Aarch64, _) => Some("aarch64"),
            (Self::Arm64, _) => Some("arm64"),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Arm64 => "arm64",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The canonical platform key for one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformKey {
    os: OperatingSystem,
    arch: Architecture,
}

impl PlatformKey {
    /// Build a key from raw OS and architecture tokens, normalizing both.
    pub fn from_tokens(os_token: &str, arch_token: &str) -> Self {
        let os = parse_os_token(os_token);
        let arch = parse_arch_token(arch_token, os);
        PlatformKey { os, arch }
    }

    /// Introspect the host.
    pub fn host() -> Self {
        Self::from_tokens(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve the platform key, letting an explicit cross-compilation
    /// descriptor override host introspection.
    ///
    /// A descriptor that cannot be split into OS and architecture still
    /// contributes its OS token; the architecture becomes unknown.
    pub fn detect(cross_target: Option<&str>) -> Self {
        let key = match cross_target.map(str::trim).filter(|s| !s.is_empty()) {
            Some(descriptor) => match parse_descriptor(descriptor) {
                Ok(d) => Self::from_tokens(d.os, d.arch),
                Err(e) => {
                    tracing::warn!(descriptor, error = %e, "incomplete cross-compilation target");
                    let os = parse_os_token(descriptor);
                    PlatformKey {
                        os,
                        arch: Architecture::Unknown,
                    }
                }
            },
            None => Self::host(),
        };
        tracing::info!(
            platform = %key,
            cross = cross_target.is_some(),
            "identified platform"
        );
        key
    }

    /// Operating system.
    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    /// Normalized architecture.
    pub fn arch(&self) -> Architecture {
        self.arch
    }

    /// Relative bundled-library subdirectory (`<os-family>/<arch>`), if one
    /// can be derived for this platform.
    pub fn bundle_subdir(&self) -> Option<PathBuf> {
        let family = self.os.family_dir()?;
        let arch = self.arch.dir_name(self.os)?;
        Some(PathBuf::from(family).join(arch))
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.os {
            OperatingSystem::Unknown => f.write_str("unknown"),
            os => write!(f, "{os}/{}", self.arch),
        }
    }
}

impl FromStr for PlatformKey {
    type Err = TargetError;

    /// Strict parse of a descriptor such as `linux-x86_64` or `macosx-11.0-arm64`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = parse_descriptor(s)?;
        Ok(Self::from_tokens(d.os, d.arch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_x86_64_subdir() {
        let key = PlatformKey::from_tokens("linux", "x86_64");
        assert_eq!(key.bundle_subdir(), Some(PathBuf::from("linux/x86_64")));
        assert_eq!(key.to_string(), "linux/x86_64");
    }

    #[test]
    fn linux_arm_subdir() {
        let key = PlatformKey::from_tokens("linux", "arm64");
        assert_eq!(key.arch(), Architecture::Aarch64);
        assert_eq!(key.bundle_subdir(), Some(PathBuf::from("linux/aarch64")));
    }

    #[test]
    fn macos_arm_subdir() {
        let key = PlatformKey::from_tokens("darwin", "aarch64");
        assert_eq!(key.arch(), Architecture::Arm64);
        assert_eq!(key.bundle_subdir(), Some(PathBuf::from("macos/arm64")));
    }

    #[test]
    fn windows_amd64_subdir() {
        let key = PlatformKey::from_tokens("windows", "AMD64");
        assert_eq!(key.arch(), Architecture::X86_64);
        assert_eq!(key.bundle_subdir(), Some(PathBuf::from("windows/x64")));
        assert!(!key.os().supports_source_build());
        assert!(!key.os().uses_rpath());
    }

    #[test]
    fn unknown_os_has_no_subdir() {
        let key = PlatformKey::from_tokens("freebsd", "x86_64");
        assert_eq!(key.os(), OperatingSystem::Unknown);
        assert_eq!(key.arch(), Architecture::Unknown);
        assert!(key.bundle_subdir().is_none());
        assert_eq!(key.to_string(), "unknown");
    }

    #[test]
    fn unknown_arch_has_no_subdir() {
        let key = PlatformKey::from_tokens("linux", "riscv64");
        assert_eq!(key.arch(), Architecture::Unknown);
        assert!(key.bundle_subdir().is_none());
    }

    #[test]
    fn cross_target_overrides_host() {
        let key = PlatformKey::detect(Some("macosx-11.0-arm64"));
        assert_eq!(key.os(), OperatingSystem::Macos);
        assert_eq!(key.arch(), Architecture::Arm64);
    }

    #[test]
    fn blank_cross_target_falls_back_to_host() {
        assert_eq!(PlatformKey::detect(Some("  ")), PlatformKey::host());
        assert_eq!(PlatformKey::detect(None), PlatformKey::host());
    }

    #[test]
    fn incomplete_cross_target_keeps_os() {
        let key = PlatformKey::detect(Some("linux"));
        assert_eq!(key.os(), OperatingSystem::Linux);
        assert_eq!(key.arch(), Architecture::Unknown);
    }

    #[test]
    fn detection_is_idempotent() {
        let inputs = [
            None,
            Some("linux-x86_64"),
            Some("linux-aarch64"),
            Some("macosx-11.0-arm64"),
            Some("macosx-10.9-x86_64"),
            Some("win-amd64"),
        ];
        for input in inputs {
            let first = PlatformKey::detect(input);
            for _ in 0..3 {
                assert_eq!(PlatformKey::detect(input), first);
            }
        }
    }

    #[test]
    fn from_str_strict() {
        let key: PlatformKey = "linux-x86_64".parse().unwrap();
        assert_eq!(key, PlatformKey::from_tokens("linux", "x86_64"));
        assert!("".parse::<PlatformKey>().is_err());
        assert!("linux".parse::<PlatformKey>().is_err());
    }
}
