// SPDX-License-Identifier: MIT

//! Validator registration and tree-wide aggregation

use serde::{Deserialize, Serialize};

use super::tree::{ConstructTree, NodeId};
use crate::error::Result;

/// Severity of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnnotationLevel {
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warning,
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for AnnotationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnnotationLevel::Info => "info",
            AnnotationLevel::Warning => "warn",
            AnnotationLevel::Error => "error",
        };
        f.pad(s)
    }
}

/// A finding returned by a validator, before it is tied to a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: AnnotationLevel,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: AnnotationLevel::Info,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            level: AnnotationLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: AnnotationLevel::Error,
            text: text.into(),
        }
    }
}

/// A leveled diagnostic attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub level: AnnotationLevel,
    pub message: String,
    /// Path of the source node, e.g. `project/build/test`
    #[serde(rename = "source")]
    pub path: String,
    #[serde(skip, default = "root_node")]
    pub node: NodeId,
}

fn root_node() -> NodeId {
    NodeId::ROOT
}

impl Annotation {
    pub fn new(tree: &ConstructTree, node: NodeId, message: Message) -> Self {
        Self {
            level: message.level,
            message: message.text,
            path: tree.path(node),
            node,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == AnnotationLevel::Error
    }
}

/// Pure check over the current tree state for one node
pub type Validator = Box<dyn Fn(&ConstructTree, NodeId) -> Vec<Message>>;

/// Run every registered validator, parents before children, validators in
/// registration order.
///
/// Findings are returned as data. Only an internal fault (a node id that
/// does not resolve) is an error.
pub fn validate_tree(tree: &ConstructTree) -> Result<Vec<Annotation>> {
    let mut annotations = Vec::new();
    for id in tree.walk() {
        let node = tree.get(id)?;
        for validator in node.validators() {
            annotations.extend(
                validator(tree, id)
                    .into_iter()
                    .map(|message| Annotation::new(tree, id, message)),
            );
        }
    }

    log::debug!(
        "Validation produced {} annotation(s), {} error(s)",
        annotations.len(),
        annotations.iter().filter(|a| a.is_error()).count()
    );
    Ok(annotations)
}

pub fn has_errors(annotations: &[Annotation]) -> bool {
    annotations.iter().any(Annotation::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ConstructKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_validate_tree_collects_in_preorder() {
        let mut tree = ConstructTree::new("project", ConstructKind::Project).unwrap();
        let root = tree.root();
        let a = tree.add_child(root, "a", ConstructKind::Project).unwrap();
        let b = tree.add_child(root, "b", ConstructKind::Project).unwrap();
        let a1 = tree.add_child(a, "a1", ConstructKind::Project).unwrap();

        for node in [b, a1, a, root] {
            tree.add_validator(
                node,
                Box::new(|tree: &ConstructTree, id: NodeId| {
                    vec![Message::info(tree.get(id).unwrap().id().to_string())]
                }),
            )
            .unwrap();
        }

        let annotations = validate_tree(&tree).unwrap();
        let order: Vec<&str> = annotations.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(order, vec!["project", "a", "a1", "b"]);
        assert_eq!(annotations[2].path, "project/a/a1");
    }

    #[test]
    fn test_validators_run_in_registration_order() {
        let mut tree = ConstructTree::new("project", ConstructKind::Project).unwrap();
        let root = tree.root();
        tree.add_validator(
            root,
            Box::new(|_: &ConstructTree, _: NodeId| vec![Message::warn("first")]),
        )
        .unwrap();
        tree.add_validator(
            root,
            Box::new(|_: &ConstructTree, _: NodeId| {
                vec![Message::error("second"), Message::info("third")]
            }),
        )
        .unwrap();

        let annotations = validate_tree(&tree).unwrap();
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0].level, AnnotationLevel::Warning);
        assert_eq!(annotations[1].level, AnnotationLevel::Error);
        assert!(has_errors(&annotations));
    }

    #[test]
    fn test_validate_tree_is_repeatable() {
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();

        let mut tree = ConstructTree::new("project", ConstructKind::Project).unwrap();
        let root = tree.root();
        tree.add_validator(
            root,
            Box::new(move |_: &ConstructTree, _: NodeId| {
                *counter.borrow_mut() += 1;
                vec![]
            }),
        )
        .unwrap();

        assert!(validate_tree(&tree).unwrap().is_empty());
        assert!(validate_tree(&tree).unwrap().is_empty());
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_annotation_serializes_level_names() {
        let tree = ConstructTree::new("project", ConstructKind::Project).unwrap();
        let annotation = Annotation::new(&tree, tree.root(), Message::warn("careful"));
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["level"], "warn");
        assert_eq!(json["message"], "careful");
        assert_eq!(json["source"], "project");
        assert!(json.get("node").is_none());
    }
}
