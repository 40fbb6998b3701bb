// SPDX-License-Identifier: MIT

//! Phase-by-phase synthesis over a finished tree
//!
//! Each phase is a separate call so the project can decide between them
//! whether to continue.

use std::collections::HashSet;
use std::fs;

use super::manifest::{Manifest, WorkflowManifest};
use super::render::{render_workflow, to_text};
use crate::config::ProjectConfig;
use crate::construct::{validate_tree, Annotation, ConstructKind, ConstructTree, NodeId};
use crate::error::Result;
use crate::workflow::{file_stem, resolve_workflow, Resolution};

/// A workflow document ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWorkflow {
    pub workflow: NodeId,
    pub id: String,
    pub file_name: String,
    pub contents: String,
}

pub struct Synthesizer<'a> {
    tree: &'a ConstructTree,
    config: &'a ProjectConfig,
}

impl<'a> Synthesizer<'a> {
    pub fn new(tree: &'a ConstructTree, config: &'a ProjectConfig) -> Self {
        Self { tree, config }
    }

    /// Workflows directly under the root, in insertion order
    pub fn workflows(&self) -> Vec<NodeId> {
        let root = self.tree.root();
        self.tree
            .children(root)
            .iter()
            .copied()
            .filter(|id| {
                self.tree
                    .get(*id)
                    .is_ok_and(|n| matches!(n.kind(), ConstructKind::Workflow(_)))
            })
            .collect()
    }

    pub fn file_name(&self, workflow: NodeId) -> String {
        format!(
            "{}.{}",
            file_stem(self.tree, workflow),
            self.config.output_format.extension()
        )
    }

    /// Manifest with one empty entry per workflow
    pub fn manifest(&self) -> Result<Manifest> {
        let mut manifest = Manifest::new();
        for workflow in self.workflows() {
            let id = self.tree.get(workflow)?.id();
            manifest.add_workflow(WorkflowManifest::new(id, self.file_name(workflow)));
        }
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<Vec<Annotation>> {
        log::info!("Validating {} construct(s)", self.tree.len());
        validate_tree(self.tree)
    }

    /// Resolve the job order of every workflow. Broken workflows come back
    /// with `order: None`; the others are unaffected.
    pub fn resolve(&self) -> Result<Vec<Resolution>> {
        let mut resolutions = Vec::new();
        for workflow in self.workflows() {
            let resolution = resolve_workflow(self.tree, workflow)?;
            if !resolution.is_resolved() {
                log::warn!(
                    "Skipping workflow '{}': job order could not be resolved",
                    self.tree.path(workflow)
                );
            }
            resolutions.push(resolution);
        }
        Ok(resolutions)
    }

    /// Render every resolved workflow.
    pub fn render(&self, resolutions: &[Resolution]) -> Result<Vec<RenderedWorkflow>> {
        let mut rendered = Vec::new();
        for resolution in resolutions {
            let Some(order) = &resolution.order else {
                continue;
            };
            let document = render_workflow(self.tree, resolution.workflow, order)?;
            let contents = to_text(&document, self.config.output_format)?;
            log::debug!(
                "Rendered workflow '{}' with {} job(s)",
                self.tree.path(resolution.workflow),
                order.len()
            );
            rendered.push(RenderedWorkflow {
                workflow: resolution.workflow,
                id: self.tree.get(resolution.workflow)?.id().to_string(),
                file_name: self.file_name(resolution.workflow),
                contents,
            });
        }
        Ok(rendered)
    }

    /// Write rendered documents to the output directory. Of several
    /// documents sharing a file name only the first is written.
    pub fn write(&self, rendered: &[RenderedWorkflow], manifest: &mut Manifest) -> Result<()> {
        if rendered.is_empty() {
            log::info!("Nothing to write");
            return Ok(());
        }
        fs::create_dir_all(&self.config.outdir)?;

        let mut taken = HashSet::new();
        for workflow in rendered {
            if !taken.insert(workflow.file_name.as_str()) {
                log::warn!(
                    "Not writing workflow '{}': {} was already written",
                    workflow.id,
                    workflow.file_name
                );
                continue;
            }
            let path = self.config.outdir.join(&workflow.file_name);
            fs::write(&path, &workflow.contents)?;
            log::info!("Wrote {}", path.display());

            if let Some(entry) = manifest.workflows.get_mut(&workflow.id) {
                entry.path = Some(path);
            }
        }
        Ok(())
    }

    /// Write the manifest as JSON if a manifest path is configured.
    pub fn persist_manifest(&self, manifest: &Manifest) -> Result<()> {
        let Some(path) = &self.config.manifest_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(manifest)?;
        json.push('\n');
        fs::write(path, json)?;
        log::info!("Wrote manifest {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::workflow::{add_job, add_workflow, JobProps, PushTrigger, Triggers, WorkflowProps};

    fn push() -> WorkflowProps {
        WorkflowProps::new(Triggers::new().push(PushTrigger::branches(["main"])))
    }

    fn tree() -> ConstructTree {
        let mut tree = ConstructTree::new("project", ConstructKind::Project).unwrap();
        let root = tree.root();
        let ok = add_workflow(&mut tree, root, "ok", push()).unwrap();
        add_job(&mut tree, ok, "build", JobProps::default()).unwrap();
        let broken = add_workflow(&mut tree, root, "broken", push()).unwrap();
        add_job(&mut tree, broken, "deploy", JobProps::default().needs("missing")).unwrap();
        tree
    }

    #[test]
    fn test_broken_workflow_does_not_block_siblings() {
        let tree = tree();
        let config = ProjectConfig::default();
        let synth = Synthesizer::new(&tree, &config);

        let resolutions = synth.resolve().unwrap();
        assert_eq!(resolutions.len(), 2);
        assert!(resolutions[0].is_resolved());
        assert!(!resolutions[1].is_resolved());

        let rendered = synth.render(&resolutions).unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].file_name, "ok.yml");
    }

    #[test]
    fn test_write_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let tree = tree();
        let mut config = ProjectConfig::new(dir.path().join("out"));
        config.output_format = OutputFormat::Json;
        config.manifest_path = Some(dir.path().join("meta/manifest.json"));
        let synth = Synthesizer::new(&tree, &config);

        let mut manifest = synth.manifest().unwrap();
        let rendered = synth.render(&synth.resolve().unwrap()).unwrap();
        synth.write(&rendered, &mut manifest).unwrap();
        synth.persist_manifest(&manifest).unwrap();

        assert!(dir.path().join("out/ok.json").exists());
        assert!(!dir.path().join("out/broken.json").exists());
        assert!(manifest.workflow("ok").unwrap().is_written());
        assert!(!manifest.workflow("broken").unwrap().is_written());

        let saved: Manifest = serde_json::from_str(
            &fs::read_to_string(dir.path().join("meta/manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved.workflows.len(), 2);
    }

    #[test]
    fn test_duplicate_file_names_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let tree = tree();
        let config = ProjectConfig::new(dir.path());
        let synth = Synthesizer::new(&tree, &config);
        let first = RenderedWorkflow {
            workflow: NodeId::ROOT,
            id: "Ok".to_string(),
            file_name: "ok.yml".to_string(),
            contents: "first\n".to_string(),
        };
        let second = RenderedWorkflow {
            id: "ok".to_string(),
            contents: "second\n".to_string(),
            ..first.clone()
        };

        let mut manifest = Manifest::new();
        synth.write(&[first, second], &mut manifest).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("ok.yml")).unwrap(),
            "first\n"
        );
    }
}
