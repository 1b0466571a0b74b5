//! Parsing of explicit cross-compilation platform descriptors.
//!
//! A descriptor has the shape `<os>-<os-version>-<arch>`, for example
//! `macosx-11.0-arm64` or `linux-x86_64`. Only the first token (OS) and the
//! last token (architecture) are significant; any middle tokens are ignored.

use crate::error::{Result, TargetError};
use crate::platform::{Architecture, OperatingSystem};

/// The raw components of a platform descriptor, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor<'a> {
    /// OS token (e.g., "macosx", "linux", "win").
    pub os: &'a str,
    /// Architecture token (e.g., "arm64", "amd64").
    pub arch: &'a str,
}

/// Split a descriptor into its OS and architecture tokens.
pub fn parse_descriptor(input: &str) -> Result<Descriptor<'_>> {
    let tokens: Vec<&str> = input
        .trim()
        .split('-')
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => Err(TargetError::Empty),
        [_] => Err(TargetError::MissingArchitecture {
            descriptor: input.trim().to_string(),
        }),
        [os, .., arch] => Ok(Descriptor {
            os: *os,
            arch: *arch,
        }),
    }
}

/// Map an OS token onto an [`OperatingSystem`].
///
/// Accepts the spellings used by common toolchains: `linux`, `manylinux2014`,
/// `darwin`, `macos`, `macosx`, `win`, `win32`, `windows`.
pub fn parse_os_token(token: &str) -> OperatingSystem {
    let token = token.to_ascii_lowercase();
    if token.contains("linux") {
        OperatingSystem::Linux
    } else if token == "darwin" || token.starts_with("macos") {
        OperatingSystem::Macos
    } else if token.starts_with("win") {
        OperatingSystem::Windows
    } else {
        OperatingSystem::Unknown
    }
}

/// Map an architecture token onto an [`Architecture`] for the given OS.
///
/// The 64-bit ARM name is OS-specific: `aarch64` on linux, `arm64` elsewhere.
/// An unknown OS never carries an architecture.
pub fn parse_arch_token(token: &str, os: OperatingSystem) -> Architecture {
    if os == OperatingSystem::Unknown {
        return Architecture::Unknown;
    }
    match token.to_ascii_lowercase().as_str() {
        "x86_64" | "amd64" | "x64" => Architecture::X86_64,
        "aarch64" | "arm64" => match os {
            OperatingSystem::Linux => Architecture::Aarch64,
            _ => Architecture::Arm64,
        },
        _ => Architecture::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_part_descriptor() {
        let d = parse_descriptor("macosx-11.0-arm64").unwrap();
        assert_eq!(d.os, "macosx");
        assert_eq!(d.arch, "arm64");
    }

    #[test]
    fn two_part_descriptor() {
        let d = parse_descriptor("win-amd64").unwrap();
        assert_eq!(d.os, "win");
        assert_eq!(d.arch, "amd64");
    }

    #[test]
    fn empty_descriptor_rejected() {
        assert!(matches!(parse_descriptor("  "), Err(TargetError::Empty)));
        assert!(matches!(parse_descriptor("--"), Err(TargetError::Empty)));
    }

    #[test]
    fn os_only_descriptor_rejected() {
        let err = parse_descriptor("linux").unwrap_err();
        assert!(matches!(err, TargetError::MissingArchitecture { .. }));
    }

    #[test]
    fn os_tokens() {
        assert_eq!(parse_os_token("linux"), OperatingSystem::Linux);
        assert_eq!(parse_os_token("manylinux2014"), OperatingSystem::Linux);
        assert_eq!(parse_os_token("macosx"), OperatingSystem::Macos);
        assert_eq!(parse_os_token("Darwin"), OperatingSystem::Macos);
        assert_eq!(parse_os_token("win32"), OperatingSystem::Windows);
        assert_eq!(parse_os_token("freebsd"), OperatingSystem::Unknown);
    }

    #[test]
    fn arm_name_depends_on_os() {
        assert_eq!(
            parse_arch_token("arm64", OperatingSystem::Linux),
            Architecture::Aarch64
        );
        assert_eq!(
            parse_arch_token("aarch64", OperatingSystem::Macos),
            Architecture::Arm64
        );
    }

    #[test]
    fn amd64_is_x86_64() {
        assert_eq!(
            parse_arch_token("amd64", OperatingSystem::Windows),
            Architecture::X86_64
        );
        assert_eq!(
            parse_arch_token("AMD64", OperatingSystem::Linux),
            Architecture::X86_64
        );
    }

    #[test]
    fn unknown_os_has_no_arch() {
        assert_eq!(
            parse_arch_token("x86_64", OperatingSystem::Unknown),
            Architecture::Unknown
        );
    }
}
