//! `faest-bind declarations` — print the fixed declaration table.

use anyhow::{bail, Result};
use faest_ffi::{DeclarationTable, ParameterSet};

pub fn run(format: &str, sets: &[String]) -> Result<()> {
    let table = select(sets)?;
    print!("{}", render(&table, format)?);
    Ok(())
}

/// The full table, or only the named parameter sets in the order given.
pub fn select(names: &[String]) -> Result<DeclarationTable> {
    if names.is_empty() {
        return Ok(DeclarationTable::standard());
    }
    let mut sets: Vec<ParameterSet> = Vec::new();
    for name in names {
        let set: ParameterSet = name.parse()?;
        if !sets.contains(&set) {
            sets.push(set);
        }
    }
    Ok(DeclarationTable::for_sets(&sets))
}

/// Render `table` as C text (`cdef`) or JSON.
pub fn render(table: &DeclarationTable, format: &str) -> Result<String> {
    match format {
        "cdef" => Ok(table.cdef()),
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(table)?)),
        other => bail!("unknown format '{other}' (expected cdef or json)"),
    }
}
