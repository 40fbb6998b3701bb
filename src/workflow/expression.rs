// SPDX-License-Identifier: MIT

//! `${{ ... }}` expression helpers

use once_cell::sync::Lazy;
use regex::Regex;

static STEP_OUTPUT_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"steps\.([A-Za-z_][A-Za-z0-9_\-]*)\.outputs\.").unwrap());

/// Wrap a raw expression body: `expr("github.ref")` -> `${{ github.ref }}`
pub fn expr(body: impl AsRef<str>) -> String {
    format!("${{{{ {} }}}}", body.as_ref().trim())
}

pub fn step_output(step_id: &str, name: &str) -> String {
    expr(format!("steps.{}.outputs.{}", step_id, name))
}

pub fn job_output(job_id: &str, name: &str) -> String {
    expr(format!("needs.{}.outputs.{}", job_id, name))
}

pub fn secret(name: &str) -> String {
    expr(format!("secrets.{}", name))
}

pub fn github(context: &str) -> String {
    expr(format!("github.{}", context))
}

/// Step ids referenced as `steps.<id>.outputs.*` inside `text`
pub fn referenced_steps(text: &str) -> Vec<&str> {
    STEP_OUTPUT_REF
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}
