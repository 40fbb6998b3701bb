// SPDX-License-Identifier: MIT

//! Workflow configuration and workflow-level validation

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::job::{Concurrency, Defaults};
use super::permissions::Permissions;
use super::triggers::Triggers;
use crate::construct::id::sanitize;
use crate::construct::{ConstructKind, ConstructTree, Message, NodeId};
use crate::error::{CdkError, Result};

/// Top-level settings of one workflow document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowProps {
    pub name: Option<String>,
    #[serde(rename = "on")]
    pub triggers: Triggers,
    pub permissions: Option<Permissions>,
    pub env: IndexMap<String, String>,
    pub concurrency: Option<Concurrency>,
    pub defaults: Option<Defaults>,
}

impl WorkflowProps {
    pub fn new(triggers: Triggers) -> Self {
        Self {
            triggers,
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = Some(concurrency);
        self
    }
}

/// Create a workflow under the project root and register its validators.
pub fn add_workflow(
    tree: &mut ConstructTree,
    project: NodeId,
    id: &str,
    props: WorkflowProps,
) -> Result<NodeId> {
    let is_root = matches!(tree.get(project)?.kind(), ConstructKind::Project)
        && tree.parent(project).is_none();
    if !is_root {
        return Err(CdkError::wrong_kind(tree.path(project), "project root"));
    }
    let workflow = tree.add_child(project, id, ConstructKind::Workflow(props))?;
    tree.add_validator(workflow, Box::new(validate_workflow))?;
    Ok(workflow)
}

/// File name (without extension) a workflow is written to
pub fn file_stem(tree: &ConstructTree, workflow: NodeId) -> String {
    tree.get(workflow)
        .map(|n| sanitize(n.id()))
        .unwrap_or_default()
}

/// Earlier sibling workflow whose file name collides with this one
pub fn colliding_sibling(tree: &ConstructTree, workflow: NodeId) -> Option<NodeId> {
    let parent = tree.parent(workflow)?;
    let stem = file_stem(tree, workflow);
    tree.children(parent)
        .iter()
        .take_while(|sibling| **sibling != workflow)
        .find(|sibling| {
            tree.get(**sibling)
                .is_ok_and(|n| matches!(n.kind(), ConstructKind::Workflow(_)))
                && file_stem(tree, **sibling) == stem
        })
        .copied()
}

pub fn validate_workflow(tree: &ConstructTree, id: NodeId) -> Vec<Message> {
    let Ok(node) = tree.get(id) else {
        return vec![];
    };
    let ConstructKind::Workflow(props) = node.kind() else {
        return vec![];
    };

    let mut messages = Vec::new();
    if props.triggers.is_empty() {
        messages.push(Message::error(format!(
            "workflow '{}' has no triggers",
            node.id()
        )));
    }

    let has_jobs = tree
        .children(id)
        .iter()
        .filter_map(|c| tree.get(*c).ok())
        .any(|c| matches!(c.kind(), ConstructKind::Job(_)));
    if !has_jobs {
        messages.push(Message::error(format!(
            "workflow '{}' must have at least one job",
            node.id()
        )));
    }

    if let Some(other) = colliding_sibling(tree, id) {
        messages.push(Message::error(format!(
            "workflow '{}' writes to the same file as '{}' ({})",
            node.id(),
            tree.get(other).map(|n| n.id()).unwrap_or_default(),
            file_stem(tree, id)
        )));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::triggers::PushTrigger;
    use crate::workflow::{add_job, JobProps};

    fn tree() -> ConstructTree {
        ConstructTree::new("project", ConstructKind::Project).unwrap()
    }

    fn push_main() -> WorkflowProps {
        WorkflowProps::new(Triggers::new().push(PushTrigger::branches(["main"])))
    }

    #[test]
    fn test_workflow_props_deserialize() {
        let yaml = r#"
            name: Build
            on:
              push:
                branches: [main]
            permissions:
              contents: read
        "#;
        let props: WorkflowProps = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(props.name.as_deref(), Some("Build"));
        assert_eq!(props.triggers.push.unwrap().branches, vec!["main"]);
        assert!(props.permissions.is_some());
    }

    #[test]
    fn test_add_workflow_only_under_root() {
        let mut tree = tree();
        let root = tree.root();
        let wf = add_workflow(&mut tree, root, "build", push_main()).unwrap();
        assert!(matches!(
            add_workflow(&mut tree, wf, "nested", push_main()),
            Err(CdkError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_empty_workflow_reports_errors() {
        let mut tree = tree();
        let root = tree.root();
        let wf = add_workflow(&mut tree, root, "build", WorkflowProps::default()).unwrap();
        let messages = validate_workflow(&tree, wf);
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "workflow 'build' has no triggers",
                "workflow 'build' must have at least one job"
            ]
        );
    }

    #[test]
    fn test_file_name_collision_reported_on_later_workflow() {
        let mut tree = tree();
        let root = tree.root();
        let first = add_workflow(&mut tree, root, "Build", push_main()).unwrap();
        let second = add_workflow(&mut tree, root, "build", push_main()).unwrap();
        for wf in [first, second] {
            add_job(&mut tree, wf, "job", JobProps::default()).unwrap();
        }

        assert!(validate_workflow(&tree, first).is_empty());
        let messages = validate_workflow(&tree, second);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("same file as 'Build'"));
        assert_eq!(colliding_sibling(&tree, second), Some(first));
    }

    #[test]
    fn test_file_stem_sanitizes() {
        let mut tree = tree();
        let root = tree.root();
        let wf = add_workflow(&mut tree, root, "Release.V2", push_main()).unwrap();
        assert_eq!(file_stem(&tree, wf), "release-v2");
    }
}
