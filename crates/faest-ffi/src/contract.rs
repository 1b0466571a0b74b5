//! Header contract check.
//!
//! Confirms the headers next to a located library declare the interface the
//! declaration table promises: every size constant with the same value and
//! every entry point with the same prototype. Bindings built against
//! mismatched headers would silently use wrong buffer sizes or argument
//! layouts.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::csig::CSignature;
use crate::declaration::DeclarationTable;
use crate::error::{FfiError, Result};

/// Check every parameter-set header reachable from `include_dirs` against
/// `table`. Returns the header paths that were checked.
pub fn check_headers(include_dirs: &[PathBuf], table: &DeclarationTable) -> Result<Vec<PathBuf>> {
    let mut mismatches = Vec::new();
    let mut checked = Vec::new();

    for set in table.parameter_sets() {
        let header = set.header();
        let Some(path) = find_header(include_dirs, &header) else {
            mismatches.push(format!("{header}: not found in any include directory"));
            continue;
        };
        tracing::debug!(header = %path.display(), "checking header");
        let text = std::fs::read_to_string(&path)?;
        let defines = parse_defines(&text);
        let prototypes = parse_prototypes(&text);

        for constant in table.constants().iter().filter(|c| c.parameter_set == set) {
            match defines.get(constant.name.as_str()) {
                None => mismatches.push(format!("{header}: {} is not defined", constant.name)),
                Some(&found) if found != constant.value => mismatches.push(format!(
                    "{header}: {} is {found}, expected {}",
                    constant.name, constant.value
                )),
                Some(_) => {}
            }
        }

        let prefix = format!("{}_", set.symbol_prefix());
        for function in table.functions().iter().filter(|f| f.name.starts_with(&prefix)) {
            match prototypes.get(function.name.as_str()) {
                Some(found) if found.same_shape(function) => {}
                Some(found) => mismatches.push(format!(
                    "{header}: {} is declared as `{found}`, expected `{function}`",
                    function.name
                )),
                None if declares_function(&text, &function.name) => mismatches.push(format!(
                    "{header}: {} has a declaration that could not be parsed",
                    function.name
                )),
                None => mismatches.push(format!("{header}: {} is not declared", function.name)),
            }
        }
        checked.push(path);
    }

    if mismatches.is_empty() {
        tracing::info!(headers = checked.len(), "header contract satisfied");
        Ok(checked)
    } else {
        Err(FfiError::ContractViolation { mismatches })
    }
}

fn find_header(include_dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    include_dirs
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Integer-valued `#define NAME VALUE` lines. Parenthesized values and
/// `U`/`L` suffixes are accepted; anything else is skipped.
fn parse_defines(text: &str) -> HashMap<&str, usize> {
    text.lines()
        .filter_map(|line| {
            let rest = line.trim_start().strip_prefix('#')?.trim_start();
            let rest = rest.strip_prefix("define")?;
            let mut parts = rest.split_whitespace();
            let name = parts.next()?;
            let value = parts.next()?;
            Some((name, parse_int(value)?))
        })
        .collect()
}

fn parse_int(token: &str) -> Option<usize> {
    let token = token.trim_start_matches('(').trim_end_matches(')');
    let digits = token.trim_end_matches(['u', 'U', 'l', 'L']);
    digits.parse().ok()
}

/// Export and calling-convention macros upstream wraps prototypes in.
const DECORATIONS: [&str; 2] = ["FAEST_EXPORT", "FAEST_CALLING_CONVENTION"];

/// Function prototypes declared in `text`, keyed by name. Preprocessor
/// lines, comments, and `extern "C"` braces are ignored; statements that are
/// not a supported declaration are skipped.
fn parse_prototypes(text: &str) -> HashMap<String, CSignature> {
    let code = strip_comments(text)
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';')
        .filter_map(|statement| {
            let statement = statement.rsplit(|c: char| c == '{' || c == '}').next().unwrap_or(statement);
            let cleaned = statement
                .split_whitespace()
                .filter(|word| !DECORATIONS.contains(word))
                .collect::<Vec<_>>()
                .join(" ");
            let sig = CSignature::parse(&cleaned).ok()?;
            Some((sig.name.clone(), sig))
        })
        .collect()
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        out.push(' ');
        rest = match rest[start + 2..].find("*/") {
            Some(end) => &rest[start + 2 + end + 2..],
            None => "",
        };
    }
    out.push_str(rest);
    out.lines()
        .map(|line| line.split("//").next().unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether `name` appears as an identifier immediately followed by `(`.
fn declares_function(text: &str, name: &str) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    text.match_indices(name).any(|(start, _)| {
        let before_ok = text[..start].chars().next_back().map_or(true, |c| !is_ident(c));
        let after = text[start + name.len()..].trim_start();
        before_ok && after.starts_with('(')
    })
}

/// Header file names for every parameter set in `table`.
pub fn header_names(table: &DeclarationTable) -> Vec<String> {
    table.parameter_sets().iter().map(|set| set.header()).collect()
}
