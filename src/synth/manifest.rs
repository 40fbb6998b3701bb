// SPDX-License-Identifier: MIT

//! Record of what a synth run produced

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::construct::{Annotation, AnnotationLevel, ConstructTree};

/// Per-workflow entry of the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowManifest {
    pub id: String,
    /// File name under the output directory, e.g. `build.yml`
    pub file_name: String,
    /// Full path, set once the file has been written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl WorkflowManifest {
    pub fn new(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            path: None,
            annotations: Vec::new(),
        }
    }

    pub fn has_error_annotation(&self) -> bool {
        self.annotations.iter().any(Annotation::is_error)
    }

    pub fn is_written(&self) -> bool {
        self.path.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Annotations not inside any workflow (project-level validators)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project: Vec<Annotation>,
    #[serde(default)]
    pub workflows: IndexMap<String, WorkflowManifest>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_workflow(&mut self, entry: WorkflowManifest) {
        self.workflows.insert(entry.id.clone(), entry);
    }

    pub fn workflow(&self, id: &str) -> Option<&WorkflowManifest> {
        self.workflows.get(id)
    }

    /// File the annotation under the workflow that contains its node, or
    /// under the project if there is none.
    pub fn record(&mut self, tree: &ConstructTree, annotation: Annotation) {
        let workflow_id = tree
            .enclosing_workflow(annotation.node)
            .and_then(|wf| tree.get(wf).ok())
            .map(|n| n.id().to_string());

        match workflow_id.and_then(|id| self.workflows.get_mut(&id)) {
            Some(entry) => entry.annotations.push(annotation),
            None => self.project.push(annotation),
        }
    }

    pub fn has_error_annotation(&self) -> bool {
        self.project.iter().any(Annotation::is_error)
            || self.workflows.values().any(WorkflowManifest::has_error_annotation)
    }

    /// Every annotation, project-level first, then per workflow in order
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.project
            .iter()
            .chain(self.workflows.values().flat_map(|w| w.annotations.iter()))
    }

    pub fn count(&self, level: AnnotationLevel) -> usize {
        self.annotations().filter(|a| a.level == level).count()
    }
}
