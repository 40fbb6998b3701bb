// SPDX-License-Identifier: MIT

//! Advisory checks enabled by `ProjectConfig::additional_checks`

use crate::construct::{ConstructKind, ConstructTree, Message, NodeId};

use super::permissions::Permissions;

/// Refs that move under a pinned workflow
const MOVING_REFS: &[&str] = &["main", "master", "HEAD"];

fn scope_messages(what: &str, permissions: Option<&Permissions>) -> Vec<Message> {
    permissions
        .map(|p| p.unknown_scopes())
        .unwrap_or_default()
        .into_iter()
        .map(|scope| {
            Message::warn(format!(
                "{} requests unknown permission scope '{}'",
                what, scope
            ))
        })
        .collect()
}

/// Validator for any workflow, job or step node
pub fn additional_checks(tree: &ConstructTree, id: NodeId) -> Vec<Message> {
    let Ok(node) = tree.get(id) else {
        return vec![];
    };

    match node.kind() {
        ConstructKind::Workflow(props) => {
            scope_messages(&format!("workflow '{}'", node.id()), props.permissions.as_ref())
        }
        ConstructKind::Job(props) => {
            let mut messages =
                scope_messages(&format!("job '{}'", node.id()), props.permissions.as_ref());
            if props.timeout_minutes.is_none() {
                messages.push(Message::info(format!(
                    "job '{}' has no timeout-minutes; the runner default is 360",
                    node.id()
                )));
            }
            messages
        }
        ConstructKind::Step(step) => {
            let Some(uses) = step.uses.as_deref() else {
                return vec![];
            };
            // local and docker actions carry no ref
            if uses.starts_with("./") || uses.starts_with("docker://") {
                return vec![];
            }
            match step.action_ref() {
                Some(r) if !MOVING_REFS.contains(&r) => vec![],
                Some(r) => vec![Message::warn(format!(
                    "step '{}' uses '{}' at moving ref '{}'",
                    step.id, uses, r
                ))],
                None => vec![Message::warn(format!(
                    "step '{}' uses '{}' without a version",
                    step.id, uses
                ))],
            }
        }
        ConstructKind::Project => vec![],
    }
}
