//! `faest-bind resolve` — run the pipeline and print the build descriptor.

use anyhow::{bail, Result};
use faest_acquire::{AcquireContext, CommandRunner};
use faest_ffi::RuntimeSearch;
use faest_pipeline::{PipelineOptions, PipelineOutput};

/// How the descriptor is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// `cargo:` build-script directives.
    Cargo,
    Json,
    /// The C declarations handed to the binding generator.
    Cdef,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "text" => Ok(Self::Text),
            "cargo" => Ok(Self::Cargo),
            "json" => Ok(Self::Json),
            "cdef" => Ok(Self::Cdef),
            other => bail!("unknown format '{other}' (expected text, cargo, json, or cdef)"),
        }
    }
}

/// Resolve the library and print the descriptor in `format`.
pub fn run(
    ctx: &AcquireContext,
    runner: &dyn CommandRunner,
    format: &str,
    skip_contract_check: bool,
) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let options = PipelineOptions {
        check_contract: !skip_contract_check,
    };
    let output = faest_pipeline::run(ctx, runner, &options)?;
    print!("{}", render(&output, format)?);
    Ok(())
}

pub fn render(output: &PipelineOutput, format: OutputFormat) -> Result<String> {
    let descriptor = &output.descriptor;
    let text = match format {
        OutputFormat::Text => summary(output),
        OutputFormat::Cargo => descriptor.cargo_directives(),
        OutputFormat::Json => format!("{}\n", descriptor.to_json()?),
        OutputFormat::Cdef => format!("{}\n{}", descriptor.glue_source(), descriptor.cdef()),
    };
    Ok(text)
}

fn summary(output: &PipelineOutput) -> String {
    let d = &output.descriptor;
    let join = |items: Vec<String>| {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(" ")
        }
    };

    let mut lines = vec![
        format!("FAEST library ({})", output.location.origin()),
        format!("  Platform:       {}", d.platform()),
        format!("  Library:        -l{}", d.library()),
        format!("  Files:          {}", output.location.libraries().join(", ")),
        format!(
            "  Library dirs:   {}",
            join(d.library_dirs().iter().map(|p| p.display().to_string()).collect())
        ),
        format!(
            "  Include dirs:   {}",
            join(d.include_dirs().iter().map(|p| p.display().to_string()).collect())
        ),
    ];
    let runtime = match d.runtime_search() {
        RuntimeSearch::None => "(none)".to_string(),
        search => search.rpath_entries().join(" "),
    };
    lines.push(format!("  Runtime search: {runtime}"));
    lines.push(format!("  Compile args:   {}", join(d.extra_compile_args().to_vec())));
    lines.push(format!("  Link args:      {}", join(d.extra_link_args().to_vec())));
    lines.push(format!(
        "  Declarations:   {} constants, {} functions",
        d.declarations().constants().len(),
        d.declarations().functions().len()
    ));
    let headers = if output.checked_headers.is_empty() {
        "contract check skipped".to_string()
    } else {
        format!("{} checked", output.checked_headers.len())
    };
    lines.push(format!("  Headers:        {headers}"));
    lines.push(format!("Resolved in {} ms", output.duration_ms));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
