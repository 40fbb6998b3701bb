// SPDX-License-Identifier: MIT

//! YAML schema types for project definition files
//!
//! Workflows and jobs reuse the construct props directly, so a definition
//! reads like the workflow files it produces, plus an `id` on each entry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ProjectConfig;
use crate::error::{CdkError, Result};
use crate::workflow::{JobProps, Step, WorkflowProps};

/// Top-level project definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectDefinition {
    #[serde(default)]
    pub config: ProjectConfig,
    #[serde(default)]
    pub workflows: Vec<WorkflowDefinition>,
    /// File the definition was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(flatten)]
    pub props: WorkflowProps,
    #[serde(default)]
    pub jobs: Vec<JobDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobDefinition {
    pub id: String,
    #[serde(flatten)]
    pub props: JobProps,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

/// A step: exactly one of `uses` (`owner/repo@ref`) or `run`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepDefinition {
    pub id: String,
    pub name: Option<String>,
    pub uses: Option<String>,
    pub run: Option<String>,
    #[serde(default)]
    pub with: IndexMap<String, serde_json::Value>,
    #[serde(rename = "if")]
    pub condition: Option<String>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    pub shell: Option<String>,
    pub working_directory: Option<String>,
    pub continue_on_error: Option<bool>,
    pub timeout_minutes: Option<u32>,
}

impl StepDefinition {
    /// Build the unbound step this definition describes.
    pub fn to_step(&self) -> Result<Step> {
        let mut step = match (&self.uses, &self.run) {
            (Some(uses), None) => match uses.rsplit_once('@') {
                Some((action, version)) if !action.is_empty() && !version.is_empty() => {
                    Step::action(&self.id, action, version)
                }
                Some(_) => {
                    return Err(CdkError::config(format!(
                        "step '{}': malformed uses '{}'",
                        self.id, uses
                    )))
                }
                None => Step::uses(&self.id, uses),
            },
            (None, Some(run)) => {
                let mut step = Step::run(&self.id, run);
                if let Some(shell) = &self.shell {
                    step = step.shell(shell);
                }
                if let Some(dir) = &self.working_directory {
                    step = step.working_directory(dir);
                }
                step
            }
            (Some(_), Some(_)) => {
                return Err(CdkError::config(format!(
                    "step '{}' sets both 'uses' and 'run'",
                    self.id
                )))
            }
            (None, None) => {
                return Err(CdkError::config(format!(
                    "step '{}' needs either 'uses' or 'run'",
                    self.id
                )))
            }
        };

        if let Some(name) = &self.name {
            step = step.name(name);
        }
        for (key, value) in &self.with {
            step = step.with_raw(key, value.clone());
        }
        if let Some(condition) = &self.condition {
            step = step.condition(condition);
        }
        for (key, value) in &self.env {
            step = step.env(key, value);
        }
        if let Some(flag) = self.continue_on_error {
            step = step.continue_on_error(flag);
        }
        if let Some(minutes) = self.timeout_minutes {
            step = step.timeout_minutes(minutes);
        }
        Ok(step)
    }
}
