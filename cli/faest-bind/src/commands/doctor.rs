//! `faest-bind doctor` — environment diagnostics.

use std::path::Path;

use anyhow::Result;
use faest_acquire::{AcquireContext, ArtifactLocation, CommandRunner, Invocation, Origin};

/// Print platform, resolution tier, and build tool status.
pub fn run(ctx: &AcquireContext, config_path: Option<&Path>, runner: &dyn CommandRunner) -> Result<()> {
    print!("{}", report(ctx, config_path, runner));
    Ok(())
}

pub fn report(ctx: &AcquireContext, config_path: Option<&Path>, runner: &dyn CommandRunner) -> String {
    let mut out = Vec::new();
    out.push("=== FAEST Bind Doctor ===".to_string());
    out.push(String::new());
    out.push(format!("faest-bind version: {}", env!("CARGO_PKG_VERSION")));
    out.push(String::new());

    let platform = ctx.platform();
    out.push("--- Platform ---".to_string());
    out.push(format!("  Platform:     {platform}"));
    match &ctx.env().host_platform {
        Some(target) => out.push(format!("  Cross target: {target}")),
        None => out.push("  Cross target: (host)".to_string()),
    }
    if let Some(flags) = &ctx.env().archflags {
        out.push(format!("  ARCHFLAGS:    {flags}"));
    }
    out.push(String::new());

    out.push("--- Configuration ---".to_string());
    match config_path {
        Some(path) => out.push(format!("  faest-bind.toml: {}", path.display())),
        None => out.push("  faest-bind.toml: not found (using defaults)".to_string()),
    }
    out.push(format!("  Bundle root: {}", ctx.bundle_root().display()));
    let upstream = ctx.upstream_source();
    match &upstream.revision {
        Some(rev) => out.push(format!("  Upstream:    {} ({rev})", upstream.repository)),
        None => out.push(format!("  Upstream:    {}", upstream.repository)),
    }
    out.push(String::new());

    out.push("--- Resolution Tiers ---".to_string());
    let bundled = match ctx.bundled_lib_dir() {
        Some(lib_dir) => tier_status(ctx, &lib_dir, &ctx.bundled_include_dir(), Origin::Bundled),
        None => "no bundle directory for this platform".to_string(),
    };
    out.push(format!("  bundled:        {bundled}"));
    let development = tier_status(ctx, &ctx.dev_build_dir(), &ctx.dev_src_dir(), Origin::DevelopmentEnv);
    let overrides = if ctx.env().has_dev_overrides() {
        ""
    } else {
        " [defaults]"
    };
    out.push(format!("  development:    {development}{overrides}"));
    let fallback = if !platform.os().supports_source_build() {
        "unsupported on this platform".to_string()
    } else if ctx.clone_dir().is_dir() {
        tier_status(ctx, &ctx.fresh_build_dir(), ctx.clone_dir(), Origin::FreshlyBuilt)
    } else {
        format!("will clone into {}", ctx.clone_dir().display())
    };
    out.push(format!("  fallback-build: {fallback}"));
    out.push(String::new());

    out.push("--- Build Tools ---".to_string());
    for tool in ["git", "meson", "ninja", ctx.python_interpreter()] {
        out.push(tool_status(runner, tool));
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn tier_status(ctx: &AcquireContext, lib_dir: &Path, include_dir: &Path, origin: Origin) -> String {
    match ArtifactLocation::accept(lib_dir, include_dir, origin, ctx.naming()) {
        Some(location) => format!(
            "ready ({} in {})",
            location.libraries().join(", "),
            lib_dir.display()
        ),
        None => format!("not available ({})", lib_dir.display()),
    }
}

fn tool_status(runner: &dyn CommandRunner, name: &str) -> String {
    match runner.run(&Invocation::new(name).arg("--version")) {
        Ok(output) if output.success => {
            // older pythons print the version on stderr
            let text = if output.stdout.trim().is_empty() {
                &output.stderr
            } else {
                &output.stdout
            };
            let first_line = text.lines().next().unwrap_or("(unknown version)");
            format!("  {name}: {first_line}")
        }
        Ok(_) => format!("  {name}: present but `--version` failed"),
        Err(_) => format!("  {name}: not found"),
    }
}
