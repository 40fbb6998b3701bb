// SPDX-License-Identifier: MIT

//! Project configuration
//!
//! Values come from the definition file (or code) and can be overridden by
//! `WORKFLOW_CDK_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CdkError, Result};

pub const ENV_OUTDIR: &str = "WORKFLOW_CDK_OUTDIR";
pub const ENV_CONTINUE_ON_ERROR: &str = "WORKFLOW_CDK_CONTINUE_ON_ERROR";
pub const ENV_ADDITIONAL_CHECKS: &str = "WORKFLOW_CDK_ADDITIONAL_CHECKS";
pub const ENV_FORMAT: &str = "WORKFLOW_CDK_FORMAT";
pub const ENV_MANIFEST: &str = "WORKFLOW_CDK_MANIFEST";

/// Serialization of the generated documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yml",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = CdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(CdkError::config(format!("Unknown output format: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory the workflow documents are written to
    pub outdir: PathBuf,
    /// Render and write even when validation reported errors
    pub continue_on_error_annotations: bool,
    /// Extra advisory checks (unpinned actions, missing timeouts, unknown
    /// permission scopes)
    pub additional_checks: bool,
    pub output_format: OutputFormat,
    /// Where to persist the manifest as JSON; not persisted if unset
    pub manifest_path: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from(".github/workflows"),
            continue_on_error_annotations: false,
            additional_checks: false,
            output_format: OutputFormat::Yaml,
            manifest_path: None,
        }
    }
}

impl ProjectConfig {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            ..Default::default()
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(outdir) = lookup(ENV_OUTDIR) {
            self.outdir = PathBuf::from(outdir);
        }
        if let Some(value) = lookup(ENV_CONTINUE_ON_ERROR) {
            self.continue_on_error_annotations = parse_bool(ENV_CONTINUE_ON_ERROR, &value)?;
        }
        if let Some(value) = lookup(ENV_ADDITIONAL_CHECKS) {
            self.additional_checks = parse_bool(ENV_ADDITIONAL_CHECKS, &value)?;
        }
        if let Some(value) = lookup(ENV_FORMAT) {
            self.output_format = value.parse()?;
        }
        if let Some(path) = lookup(ENV_MANIFEST) {
            self.manifest_path = Some(PathBuf::from(path));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CdkError::config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
