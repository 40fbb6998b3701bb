// SPDX-License-Identifier: MIT

//! Tree -> document rendering
//!
//! Documents borrow from the tree; field order here is the order of keys in
//! the output.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::construct::{ConstructKind, ConstructTree, NodeId};
use crate::error::{CdkError, Result};
use crate::workflow::{
    Concurrency, Defaults, Environment, JobProps, Permissions, RunsOn, StepProps, Strategy,
    Triggers, WorkflowProps,
};

/// First line of every generated YAML file
pub const YAML_HEADER: &str = "# Generated by workflow-cdk. DO NOT EDIT.\n";

#[derive(Debug, Serialize)]
pub struct WorkflowDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub on: &'a Triggers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<&'a Permissions>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: &'a IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<&'a Concurrency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<&'a Defaults>,
    /// Keyed by job id, in resolved order
    pub jobs: IndexMap<&'a str, JobDocument<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub runs_on: &'a RunsOn,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub needs: &'a [String],
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<&'a Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<&'a Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<&'a Concurrency>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: &'a IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: &'a IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<&'a Defaults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'a Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
    pub steps: Vec<&'a StepProps>,
}

fn workflow_props(tree: &ConstructTree, id: NodeId) -> Result<&WorkflowProps> {
    match tree.get(id)?.kind() {
        ConstructKind::Workflow(props) => Ok(props),
        _ => Err(CdkError::fatal(format!("'{}' is not a workflow", tree.path(id)))),
    }
}

fn job_props(tree: &ConstructTree, id: NodeId) -> Result<&JobProps> {
    match tree.get(id)?.kind() {
        ConstructKind::Job(props) => Ok(props),
        _ => Err(CdkError::fatal(format!("'{}' is not a job", tree.path(id)))),
    }
}

pub fn render_job(tree: &ConstructTree, job: NodeId) -> Result<JobDocument<'_>> {
    let props = job_props(tree, job)?;
    let mut steps = Vec::new();
    for child in tree.children(job) {
        if let ConstructKind::Step(step) = tree.get(*child)?.kind() {
            steps.push(step);
        }
    }

    Ok(JobDocument {
        name: props.name.as_deref(),
        runs_on: &props.runs_on,
        needs: &props.needs,
        condition: props.condition.as_deref(),
        permissions: props.permissions.as_ref(),
        environment: props.environment.as_ref(),
        concurrency: props.concurrency.as_ref(),
        outputs: &props.outputs,
        env: &props.env,
        defaults: props.defaults.as_ref(),
        strategy: props.strategy.as_ref(),
        timeout_minutes: props.timeout_minutes,
        continue_on_error: props.continue_on_error,
        steps,
    })
}

/// Build the document for `workflow` with its jobs in `order`.
pub fn render_workflow<'a>(
    tree: &'a ConstructTree,
    workflow: NodeId,
    order: &[NodeId],
) -> Result<WorkflowDocument<'a>> {
    let props = workflow_props(tree, workflow)?;
    let mut jobs = IndexMap::with_capacity(order.len());
    for job in order {
        if tree.parent(*job) != Some(workflow) {
            return Err(CdkError::fatal(format!(
                "job '{}' is not part of workflow '{}'",
                tree.path(*job),
                tree.path(workflow)
            )));
        }
        jobs.insert(tree.get(*job)?.id(), render_job(tree, *job)?);
    }

    Ok(WorkflowDocument {
        name: props.name.as_deref(),
        on: &props.triggers,
        permissions: props.permissions.as_ref(),
        env: &props.env,
        concurrency: props.concurrency.as_ref(),
        defaults: props.defaults.as_ref(),
        jobs,
    })
}

/// Serialize a document to text in `format`.
pub fn to_text(document: &WorkflowDocument<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(format!("{}{}", YAML_HEADER, serde_yaml::to_string(document)?)),
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(document)?;
            text.push('\n');
            Ok(text)
        }
    }
}
