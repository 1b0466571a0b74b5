//! Recognized file names for a compiled `libfaest`.

use std::path::Path;

use crate::platform::OperatingSystem;

/// Base name of the native library (linked as `-lfaest`).
pub const LIBRARY_NAME: &str = "faest";

/// File-name rules for compiled libraries on one operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryNaming {
    os: OperatingSystem,
}

impl LibraryNaming {
    pub fn for_os(os: OperatingSystem) -> Self {
        LibraryNaming { os }
    }

    /// Whether `file_name` is a shared, static, or dynamic build of the library.
    ///
    /// Versioned shared objects (`libfaest.so.1.0.0`) are accepted.
    pub fn matches(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        match self.os {
            OperatingSystem::Windows => {
                (lower.starts_with(LIBRARY_NAME) || lower.starts_with("libfaest"))
                    && lower.ends_with(".dll")
            }
            OperatingSystem::Macos => {
                lower.starts_with("libfaest")
                    && (lower.ends_with(".dylib") || lower.ends_with(".a"))
            }
            OperatingSystem::Linux | OperatingSystem::Unknown => {
                lower.starts_with("libfaest")
                    && (lower.ends_with(".so") || lower.contains(".so.") || lower.ends_with(".a"))
            }
        }
    }

    /// Canonical file names a build produces on this OS.
    pub fn example_names(&self) -> &'static [&'static str] {
        match self.os {
            OperatingSystem::Windows => &["faest.dll"],
            OperatingSystem::Macos => &["libfaest.dylib", "libfaest.a"],
            OperatingSystem::Linux | OperatingSystem::Unknown => &["libfaest.so", "libfaest.a"],
        }
    }

    /// Names of the library files directly inside `dir`, sorted.
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn find_in(&self, dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut found: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| self.matches(name))
            .collect();
        found.sort();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_names() {
        let n = LibraryNaming::for_os(OperatingSystem::Linux);
        assert!(n.matches("libfaest.so"));
        assert!(n.matches("libfaest.so.2"));
        assert!(n.matches("libfaest.a"));
        assert!(!n.matches("libfaest.dylib"));
        assert!(!n.matches("faest.dll"));
        assert!(!n.matches("libother.so"));
        assert!(!n.matches("libfaest.sources"));
    }

    #[test]
    fn macos_names() {
        let n = LibraryNaming::for_os(OperatingSystem::Macos);
        assert!(n.matches("libfaest.dylib"));
        assert!(n.matches("libfaest.1.dylib"));
        assert!(n.matches("libfaest.a"));
        assert!(!n.matches("libfaest.so"));
    }

    #[test]
    fn windows_names() {
        let n = LibraryNaming::for_os(OperatingSystem::Windows);
        assert!(n.matches("faest.dll"));
        assert!(n.matches("libfaest.dll"));
        assert!(n.matches("FAEST.DLL"));
        assert!(!n.matches("libfaest.so"));
    }

    #[test]
    fn example_names_are_recognized() {
        for os in [
            OperatingSystem::Linux,
            OperatingSystem::Macos,
            OperatingSystem::Windows,
        ] {
            let n = LibraryNaming::for_os(os);
            assert!(n.example_names().iter().all(|name| n.matches(name)));
        }
    }

    #[test]
    fn find_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("libfaest.so"), b"elf").unwrap();
        std::fs::write(dir.path().join("libfaest.a"), b"ar").unwrap();
        std::fs::write(dir.path().join("README"), b"text").unwrap();
        std::fs::create_dir(dir.path().join("libfaest.so.d")).unwrap();

        let n = LibraryNaming::for_os(OperatingSystem::Linux);
        assert_eq!(n.find_in(dir.path()), vec!["libfaest.a", "libfaest.so"]);
    }

    #[test]
    fn find_in_missing_directory() {
        let n = LibraryNaming::for_os(OperatingSystem::Linux);
        assert!(n.find_in(Path::new("/nonexistent/faest/lib")).is_empty());
    }
}
