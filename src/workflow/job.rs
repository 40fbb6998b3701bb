// SPDX-License-Identifier: MIT

//! Job configuration and job-level validation

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::expression;
use super::permissions::Permissions;
use crate::construct::id::is_github_identifier;
use crate::construct::{ConstructKind, ConstructTree, Message, NodeId};
use crate::error::{CdkError, Result};

/// Runner selection (single label or label list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunsOn {
    Label(String),
    Labels(Vec<String>),
}

impl RunsOn {
    pub fn labels(&self) -> Vec<&str> {
        match self {
            RunsOn::Label(l) => vec![l.as_str()],
            RunsOn::Labels(v) => v.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels().iter().all(|l| l.trim().is_empty())
    }
}

impl Default for RunsOn {
    fn default() -> Self {
        RunsOn::Label("ubuntu-latest".to_string())
    }
}

impl From<&str> for RunsOn {
    fn from(label: &str) -> Self {
        RunsOn::Label(label.to_string())
    }
}

impl From<Vec<String>> for RunsOn {
    fn from(labels: Vec<String>) -> Self {
        RunsOn::Labels(labels)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Concurrency {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_in_progress: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunDefaults>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Strategy {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub matrix: IndexMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `needs: build` or `needs: [build, lint]`
#[derive(Deserialize)]
#[serde(untagged)]
enum NeedsForm {
    One(String),
    Many(Vec<String>),
}

fn deserialize_needs<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NeedsForm::deserialize(deserializer)? {
        NeedsForm::One(job) => vec![job],
        NeedsForm::Many(jobs) => jobs,
    })
}

/// Everything about a job except its steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JobProps {
    pub name: Option<String>,
    pub runs_on: RunsOn,
    /// Ids of sibling jobs that must finish first
    #[serde(deserialize_with = "deserialize_needs")]
    pub needs: Vec<String>,
    #[serde(rename = "if")]
    pub condition: Option<String>,
    pub environment: Option<Environment>,
    pub permissions: Option<Permissions>,
    pub concurrency: Option<Concurrency>,
    /// Output name -> expression
    pub outputs: IndexMap<String, String>,
    pub env: IndexMap<String, String>,
    pub defaults: Option<Defaults>,
    pub strategy: Option<Strategy>,
    pub timeout_minutes: Option<u32>,
    pub continue_on_error: Option<bool>,
}

impl JobProps {
    pub fn new(runs_on: impl Into<RunsOn>) -> Self {
        Self {
            runs_on: runs_on.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn needs(mut self, job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        if !self.needs.contains(&job_id) {
            self.needs.push(job_id);
        }
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn output(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), expression.into());
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Create a job under `workflow` and register its validators.
pub fn add_job(
    tree: &mut ConstructTree,
    workflow: NodeId,
    id: &str,
    props: JobProps,
) -> Result<NodeId> {
    if !matches!(tree.get(workflow)?.kind(), ConstructKind::Workflow(_)) {
        return Err(CdkError::wrong_kind(tree.path(workflow), "workflow"));
    }
    let job = tree.add_child(workflow, id, ConstructKind::Job(props))?;
    tree.add_validator(job, Box::new(validate_job))?;
    Ok(job)
}

/// Structural checks for a job. `needs` is checked by the resolver.
pub fn validate_job(tree: &ConstructTree, id: NodeId) -> Vec<Message> {
    let Ok(node) = tree.get(id) else {
        return vec![];
    };
    let ConstructKind::Job(job) = node.kind() else {
        return vec![];
    };

    let mut messages = Vec::new();
    if !is_github_identifier(node.id()) {
        messages.push(Message::error(format!(
            "job id '{}' must start with a letter or '_' and contain only letters, digits, '-' and '_'",
            node.id()
        )));
    }
    if job.runs_on.is_empty() {
        messages.push(Message::error(format!(
            "job '{}' has no runs-on label",
            node.id()
        )));
    }

    let step_ids: Vec<&str> = tree
        .children(id)
        .iter()
        .filter_map(|c| tree.get(*c).ok())
        .filter(|c| matches!(c.kind(), ConstructKind::Step(_)))
        .map(|c| c.id())
        .collect();
    if step_ids.is_empty() {
        messages.push(Message::error(format!(
            "job '{}' must have at least one step",
            node.id()
        )));
    }

    for (name, value) in &job.outputs {
        for referenced in expression::referenced_steps(value) {
            if !step_ids.contains(&referenced) {
                messages.push(Message::error(format!(
                    "output '{}' of job '{}' references unknown step '{}'",
                    name,
                    node.id(),
                    referenced
                )));
            }
        }
    }

    if job.timeout_minutes == Some(0) {
        messages.push(Message::warn(format!(
            "job '{}' has timeout-minutes 0",
            node.id()
        )));
    }
    messages
}
