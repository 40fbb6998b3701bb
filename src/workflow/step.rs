// SPDX-License-Identifier: MIT

//! Steps and their binding to jobs
//!
//! A [`Step`] is a plain value built by the caller (or by one of the
//! wrappers in [`crate::actions`]). Binding renders it into [`StepProps`]
//! and appends that as a child of the job. Each `Step` value can be bound
//! once.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::expression;
use crate::construct::id::{is_github_identifier, to_kebab_case};
use crate::construct::{ConstructKind, ConstructTree, Message, NodeId};
use crate::error::{CdkError, Result};

/// What a step executes
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Marketplace-style `uses: <action>@<version>`
    Action {
        action: String,
        version: Option<String>,
    },
    /// Inline `run:` command
    Command {
        run: String,
        shell: Option<String>,
        working_directory: Option<String>,
    },
}

/// Rendered form of a step as it is stored under its job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepProps {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(rename = "with", skip_serializing_if = "IndexMap::is_empty")]
    pub with: IndexMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
    /// Parameter keys that translated to the same output key
    #[serde(skip)]
    pub parameter_conflicts: Vec<String>,
}

impl StepProps {
    /// Ref part of `uses`, if any (`v4` for `actions/checkout@v4`)
    pub fn action_ref(&self) -> Option<&str> {
        self.uses
            .as_deref()
            .and_then(|u| u.rsplit_once('@'))
            .map(|(_, r)| r)
    }
}

/// Capability of being attached to exactly one job
pub trait Bindable {
    /// Attach to `job`, returning the new node.
    ///
    /// # Errors
    ///
    /// `Rebind` if already bound, `WrongKind` if `job` is not a job, and
    /// the id errors of [`ConstructTree::add_child`].
    fn bind(&mut self, tree: &mut ConstructTree, job: NodeId) -> Result<NodeId>;

    fn is_bound(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
struct Parameter {
    value: serde_json::Value,
    /// Emit the key as given instead of hyphenating it
    raw: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Binding {
    job_path: String,
    node: NodeId,
}

/// A step under construction
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    id: String,
    name: Option<String>,
    kind: StepKind,
    parameters: IndexMap<String, Parameter>,
    condition: Option<String>,
    env: IndexMap<String, String>,
    continue_on_error: Option<bool>,
    timeout_minutes: Option<u32>,
    binding: Option<Binding>,
}

impl Step {
    fn new(id: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind,
            parameters: IndexMap::new(),
            condition: None,
            env: IndexMap::new(),
            continue_on_error: None,
            timeout_minutes: None,
            binding: None,
        }
    }

    /// Step that uses an action without a pinned ref (local or docker actions)
    pub fn uses(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(
            id,
            StepKind::Action {
                action: action.into(),
                version: None,
            },
        )
    }

    pub fn action(
        id: impl Into<String>,
        action: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            StepKind::Action {
                action: action.into(),
                version: Some(version.into()),
            },
        )
    }

    /// Step that runs an inline command
    pub fn run(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(
            id,
            StepKind::Command {
                run: command.into(),
                shell: None,
                working_directory: None,
            },
        )
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the action ref. No effect on `run` steps.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        if let StepKind::Action { version: v, .. } = &mut self.kind {
            *v = Some(version.into());
        }
        self
    }

    /// Set a parameter. A `null` value counts as undefined and is dropped
    /// when the step is rendered.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(
            key.into(),
            Parameter {
                value: value.into(),
                raw: false,
            },
        );
        self
    }

    /// Set a parameter whose key is already the action's input name. The
    /// key is emitted unchanged; `null` is still dropped.
    pub fn with_raw(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(
            key.into(),
            Parameter {
                value: value.into(),
                raw: true,
            },
        );
        self
    }

    pub fn with_opt<V: Into<serde_json::Value>>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self.with(key, serde_json::Value::Null),
        }
    }

    /// Merge the fields of a serializable inputs struct as parameters.
    ///
    /// # Errors
    ///
    /// `Config` if `inputs` does not serialize to a map.
    pub fn with_inputs<T: Serialize>(mut self, inputs: &T) -> Result<Self> {
        match serde_json::to_value(inputs)? {
            serde_json::Value::Object(map) => {
                self.parameters.extend(
                    map.into_iter()
                        .map(|(key, value)| (key, Parameter { value, raw: false })),
                );
                Ok(self)
            }
            serde_json::Value::Null => Ok(self),
            other => Err(CdkError::config(format!(
                "step '{}' inputs must serialize to a map, got {}",
                self.id, other
            ))),
        }
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Shell for `run` steps. No effect on action steps.
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        if let StepKind::Command { shell: s, .. } = &mut self.kind {
            *s = Some(shell.into());
        }
        self
    }

    /// Working directory for `run` steps. No effect on action steps.
    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        if let StepKind::Command {
            working_directory, ..
        } = &mut self.kind
        {
            *working_directory = Some(dir.into());
        }
        self
    }

    pub fn continue_on_error(mut self, value: bool) -> Self {
        self.continue_on_error = Some(value);
        self
    }

    pub fn timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// Parameters as set, before key translation
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.parameters.iter().map(|(k, p)| (k.as_str(), &p.value))
    }

    /// Node of this step once bound
    pub fn node(&self) -> Option<NodeId> {
        self.binding.as_ref().map(|b| b.node)
    }

    /// Expression for one of this step's outputs. Names are not checked
    /// against what the action actually produces.
    pub fn output(&self, name: &str) -> String {
        expression::step_output(&self.id, name)
    }

    /// Render into the form stored under a job: resolved `uses`, undefined
    /// parameters dropped, keys hyphenated.
    pub fn render(&self) -> StepProps {
        let mut with = IndexMap::new();
        let mut origin: HashMap<String, &str> = HashMap::new();
        let mut parameter_conflicts = Vec::new();

        for (key, parameter) in &self.parameters {
            if parameter.value.is_null() {
                continue;
            }
            let translated = if parameter.raw {
                key.clone()
            } else {
                to_kebab_case(key)
            };
            if let Some(first) = origin.get(&translated) {
                parameter_conflicts.push(format!(
                    "parameters '{}' and '{}' both translate to '{}'",
                    first, key, translated
                ));
                continue;
            }
            origin.insert(translated.clone(), key);
            with.insert(translated, parameter.value.clone());
        }

        let mut props = StepProps {
            id: self.id.clone(),
            name: self.name.clone(),
            condition: self.condition.clone(),
            with,
            env: self.env.clone(),
            continue_on_error: self.continue_on_error,
            timeout_minutes: self.timeout_minutes,
            parameter_conflicts,
            ..Default::default()
        };

        match &self.kind {
            StepKind::Action { action, version } => {
                props.uses = Some(match version {
                    Some(v) => format!("{}@{}", action, v),
                    None => action.clone(),
                });
            }
            StepKind::Command {
                run,
                shell,
                working_directory,
            } => {
                props.run = Some(run.clone());
                props.shell = shell.clone();
                props.working_directory = working_directory.clone();
            }
        }

        props
    }
}

impl Bindable for Step {
    fn bind(&mut self, tree: &mut ConstructTree, job: NodeId) -> Result<NodeId> {
        if let Some(binding) = &self.binding {
            return Err(CdkError::Rebind {
                step: self.id.clone(),
                job: binding.job_path.clone(),
            });
        }
        if !matches!(tree.get(job)?.kind(), ConstructKind::Job(_)) {
            return Err(CdkError::wrong_kind(tree.path(job), "job"));
        }

        let node = tree.add_child(job, &self.id, ConstructKind::Step(self.render()))?;
        tree.add_validator(node, Box::new(validate_step))?;

        self.binding = Some(Binding {
            job_path: tree.path(job),
            node,
        });
        Ok(node)
    }

    fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// Structural checks for a bound step
pub fn validate_step(tree: &ConstructTree, id: NodeId) -> Vec<Message> {
    let Ok(node) = tree.get(id) else {
        return vec![];
    };
    let ConstructKind::Step(step) = node.kind() else {
        return vec![];
    };

    let mut messages = Vec::new();
    if !is_github_identifier(&step.id) {
        messages.push(Message::error(format!(
            "step id '{}' must start with a letter or '_' and contain only letters, digits, '-' and '_'",
            step.id
        )));
    }
    messages.extend(step.parameter_conflicts.iter().map(Message::error));
    if step.run.is_some() && !step.with.is_empty() {
        messages.push(Message::warn(format!(
            "step '{}' runs a command; its parameters are emitted but ignored by the runner",
            step.id
        )));
    }
    messages
}
