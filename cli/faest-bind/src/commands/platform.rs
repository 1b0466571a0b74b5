//! `faest-bind platform` — show the platform key and bundle layout.

use anyhow::{Context, Result};
use faest_acquire::AcquireContext;
use faest_targets::{LibraryNaming, PlatformKey};

/// Print the detected platform, or the one named by `target`.
pub fn run(ctx: &AcquireContext, target: Option<&str>) -> Result<()> {
    let key = match target {
        Some(descriptor) => descriptor
            .parse::<PlatformKey>()
            .with_context(|| format!("invalid target '{descriptor}'"))?,
        None => ctx.platform(),
    };
    print!("{}", describe(key));
    Ok(())
}

pub fn describe(key: PlatformKey) -> String {
    let os = key.os();
    let bundle = match key.bundle_subdir() {
        Some(sub) => format!("lib/{}", sub.display()),
        None => "(none: no prebuilt libraries for this platform)".to_string(),
    };
    let names = LibraryNaming::for_os(os).example_names().join(", ");
    let build = if os.supports_source_build() {
        "supported"
    } else {
        "not supported"
    };
    format!(
        "Platform:       {key}\n\
         Bundle subdir:  {bundle}\n\
         Library names:  {names}\n\
         Source build:   {build}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use faest_acquire::EnvSnapshot;

    #[test]
    fn describe_linux() {
        let text = describe(PlatformKey::from_tokens("linux", "arm64"));
        assert!(text.contains("Platform:       linux/aarch64\n"));
        assert!(text.contains("Bundle subdir:  lib/linux/aarch64\n"));
        assert!(text.contains("libfaest.so"));
        assert!(text.contains("Source build:   supported\n"));
    }

    #[test]
    fn describe_windows() {
        let text = describe(PlatformKey::from_tokens("win", "amd64"));
        assert!(text.contains("Bundle subdir:  lib/windows/x64\n"));
        assert!(text.contains("faest.dll"));
        assert!(text.contains("Source build:   not supported\n"));
    }

    #[test]
    fn explicit_target_must_parse() {
        let ctx = AcquireContext::new("/pkg", EnvSnapshot::default());
        let err = run(&ctx, Some("")).unwrap_err();
        assert!(format!("{err:#}").contains("invalid target"));
        run(&ctx, Some("macosx-11.0-arm64")).unwrap();
    }
}
