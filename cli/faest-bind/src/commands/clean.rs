//! `faest-bind clean` — remove the fallback build's clone.

use std::fs;

use anyhow::Result;
use faest_acquire::AcquireContext;

/// Remove the upstream clone, or only its build directory with `build_only`.
pub fn run(ctx: &AcquireContext, build_only: bool) -> Result<()> {
    let target = if build_only {
        ctx.fresh_build_dir()
    } else {
        ctx.clone_dir().to_path_buf()
    };
    if target.exists() {
        fs::remove_dir_all(&target)?;
        println!("Removed {}", target.display());
    } else {
        println!("Already clean: {} does not exist", target.display());
    }
    Ok(())
}
