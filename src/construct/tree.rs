// SPDX-License-Identifier: MIT

//! Arena-backed construct tree
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. A node's
//! parent is fixed when it is inserted and nodes are never removed, so the
//! tree cannot acquire a cycle.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

use super::id::validate_id;
use super::validation::Validator;
use crate::error::{CdkError, Result};
use crate::workflow::{JobProps, StepProps, WorkflowProps};

/// Stable index of a node in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every tree
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node represents
#[derive(Debug, Clone)]
pub enum ConstructKind {
    Project,
    Workflow(WorkflowProps),
    Job(JobProps),
    Step(StepProps),
}

impl ConstructKind {
    pub fn label(&self) -> &'static str {
        match self {
            ConstructKind::Project => "project",
            ConstructKind::Workflow(_) => "workflow",
            ConstructKind::Job(_) => "job",
            ConstructKind::Step(_) => "step",
        }
    }
}

/// A single construct in the tree
pub struct Node {
    id: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    child_index: HashMap<String, NodeId>,
    kind: ConstructKind,
    validators: Vec<Validator>,
    metadata: IndexMap<String, serde_json::Value>,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &ConstructKind {
        &self.kind
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn metadata(&self) -> &IndexMap<String, serde_json::Value> {
        &self.metadata
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("kind", &self.kind)
            .field("validators", &self.validators.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// The whole construct tree
#[derive(Debug)]
pub struct ConstructTree {
    nodes: Vec<Node>,
}

impl ConstructTree {
    /// Create a tree holding only a root node.
    pub fn new(root_id: &str, kind: ConstructKind) -> Result<Self> {
        validate_id(root_id)?;
        Ok(Self {
            nodes: vec![Node {
                id: root_id.to_string(),
                parent: None,
                children: Vec::new(),
                child_index: HashMap::new(),
                kind,
                validators: Vec::new(),
                metadata: IndexMap::new(),
            }],
        })
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a new node under `parent`.
    ///
    /// # Errors
    ///
    /// `InvalidId` if the id is empty or uses disallowed characters,
    /// `DuplicateId` if a sibling already has it.
    pub fn add_child(&mut self, parent: NodeId, id: &str, kind: ConstructKind) -> Result<NodeId> {
        validate_id(id)?;
        let parent_node = self.get(parent)?;
        if parent_node.child_index.contains_key(id) {
            return Err(CdkError::duplicate_id(self.path(parent), id));
        }

        let node_id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            child_index: HashMap::new(),
            kind,
            validators: Vec::new(),
            metadata: IndexMap::new(),
        });

        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.push(node_id);
        parent_node.child_index.insert(id.to_string(), node_id);

        log::debug!("Added {} '{}'", self.nodes[node_id.0].kind.label(), self.path(node_id));
        Ok(node_id)
    }

    /// Look up a node, failing if the id does not belong to this tree.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| CdkError::fatal(format!("node {} is not part of this tree", id.0)))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| CdkError::fatal(format!("node {} is not part of this tree", id.0)))
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Result<&mut ConstructKind> {
        Ok(&mut self.get_mut(id)?.kind)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn find_child(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        self.nodes
            .get(parent.0)
            .and_then(|n| n.child_index.get(id).copied())
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// `/`-joined ids from the root down to `id`. Diagnostics only.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .filter_map(|n| self.nodes.get(n.0).map(|node| node.id.as_str()))
            .collect();
        if let Some(node) = self.nodes.get(id.0) {
            segments.push(&node.id);
        }
        segments.join("/")
    }

    /// Pre-order traversal: parent before children, children in insertion
    /// order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    pub fn add_validator(&mut self, id: NodeId, validator: Validator) -> Result<()> {
        self.get_mut(id)?.validators.push(validator);
        Ok(())
    }

    pub fn set_metadata(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<()> {
        self.get_mut(id)?.metadata.insert(key.into(), value);
        Ok(())
    }

    pub fn metadata(&self, id: NodeId, key: &str) -> Option<&serde_json::Value> {
        self.nodes.get(id.0).and_then(|n| n.metadata.get(key))
    }

    /// Closest ancestor (or the node itself) that is a workflow
    pub fn enclosing_workflow(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| {
                self.nodes
                    .get(n.0)
                    .is_some_and(|node| matches!(node.kind, ConstructKind::Workflow(_)))
            })
    }
}
