// SPDX-License-Identifier: MIT

//! Root construct and synth orchestration
//!
//! A [`Project`] owns the construct tree. Workflows, jobs and steps are
//! added through it and addressed by typed handles; [`Project::synth`]
//! runs validate, resolve, render, write and finalize in that order.

use std::path::Path;

use crate::config::ProjectConfig;
use crate::construct::{
    has_errors, Annotation, AnnotationLevel, ConstructKind, ConstructTree, NodeId, Validator,
};
use crate::error::{CdkError, Result, ValidationError};
use crate::synth::{Manifest, SynthOutcome, Synthesizer};
use crate::workflow::{self, expression, Bindable, JobProps, Step, WorkflowProps};

/// Id of the root node of every project tree
pub const PROJECT_ID: &str = "project";

/// Handle to a workflow node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkflowHandle(NodeId);

impl WorkflowHandle {
    pub fn node(self) -> NodeId {
        self.0
    }
}

/// Handle to a job node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(NodeId);

impl JobHandle {
    pub fn node(self) -> NodeId {
        self.0
    }
}

/// What the finalize hook can see
#[derive(Debug)]
pub struct FinalizeContext<'a> {
    pub manifest: &'a Manifest,
    pub continue_on_error_annotations: bool,
    pub outdir: &'a Path,
    pub outcome: SynthOutcome,
}

pub type ValidationErrorHook = Box<dyn FnMut(ValidationError) -> Result<()>>;
pub type FinalizeHook = Box<dyn FnMut(&FinalizeContext<'_>) -> Result<()>>;

/// Callbacks for an embedding host
#[derive(Default)]
pub struct SynthHooks {
    /// Receives the validation error when a synth run aborts. Without it,
    /// `synth` returns the error instead.
    pub on_validation_error: Option<ValidationErrorHook>,
    /// Runs once at the end of every synth run that did not fail
    pub on_finalize: Option<FinalizeHook>,
}

impl SynthHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_validation_error<F>(mut self, hook: F) -> Self
    where
        F: FnMut(ValidationError) -> Result<()> + 'static,
    {
        self.on_validation_error = Some(Box::new(hook));
        self
    }

    pub fn on_finalize<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&FinalizeContext<'_>) -> Result<()> + 'static,
    {
        self.on_finalize = Some(Box::new(hook));
        self
    }
}

pub struct Project {
    tree: ConstructTree,
    config: ProjectConfig,
    hooks: SynthHooks,
    manifest: Manifest,
}

impl Project {
    pub fn new(config: ProjectConfig) -> Result<Self> {
        Ok(Self {
            tree: ConstructTree::new(PROJECT_ID, ConstructKind::Project)?,
            config,
            hooks: SynthHooks::default(),
            manifest: Manifest::new(),
        })
    }

    pub fn with_hooks(mut self, hooks: SynthHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn set_hooks(&mut self, hooks: SynthHooks) {
        self.hooks = hooks;
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn tree(&self) -> &ConstructTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConstructTree {
        &mut self.tree
    }

    /// Manifest of the most recent synth run
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn register_checks(&mut self, node: NodeId) -> Result<()> {
        if self.config.additional_checks {
            self.tree
                .add_validator(node, Box::new(workflow::additional_checks))?;
        }
        Ok(())
    }

    pub fn add_workflow(&mut self, id: &str, props: WorkflowProps) -> Result<WorkflowHandle> {
        let root = self.tree.root();
        let node = workflow::add_workflow(&mut self.tree, root, id, props)?;
        self.register_checks(node)?;
        Ok(WorkflowHandle(node))
    }

    pub fn add_job(
        &mut self,
        workflow: WorkflowHandle,
        id: &str,
        props: JobProps,
    ) -> Result<JobHandle> {
        let node = workflow::add_job(&mut self.tree, workflow.0, id, props)?;
        self.register_checks(node)?;
        Ok(JobHandle(node))
    }

    /// Bind `step` to `job`. The same `Step` value cannot be added twice.
    pub fn add_step(&mut self, job: JobHandle, step: &mut Step) -> Result<NodeId> {
        let node = step.bind(&mut self.tree, job.0)?;
        self.register_checks(node)?;
        Ok(node)
    }

    /// Make `job` need `on`. Both jobs must be in the same workflow.
    pub fn add_dependency(&mut self, job: JobHandle, on: JobHandle) -> Result<()> {
        if self.tree.parent(job.0) != self.tree.parent(on.0) {
            return Err(CdkError::config(format!(
                "'{}' cannot need '{}': jobs are in different workflows",
                self.tree.path(job.0),
                self.tree.path(on.0)
            )));
        }
        let needed = self.tree.get(on.0)?.id().to_string();
        let props = self.job_mut(job)?;
        if !props.needs.contains(&needed) {
            props.needs.push(needed);
        }
        Ok(())
    }

    pub fn add_validator(&mut self, node: NodeId, validator: Validator) -> Result<()> {
        self.tree.add_validator(node, validator)
    }

    pub fn workflow(&self, id: &str) -> Option<WorkflowHandle> {
        let root = self.tree.root();
        self.tree
            .find_child(root, id)
            .filter(|n| {
                self.tree
                    .get(*n)
                    .is_ok_and(|node| matches!(node.kind(), ConstructKind::Workflow(_)))
            })
            .map(WorkflowHandle)
    }

    pub fn job(&self, workflow: WorkflowHandle, id: &str) -> Option<JobHandle> {
        self.tree
            .find_child(workflow.0, id)
            .filter(|n| {
                self.tree
                    .get(*n)
                    .is_ok_and(|node| matches!(node.kind(), ConstructKind::Job(_)))
            })
            .map(JobHandle)
    }

    pub fn workflow_mut(&mut self, workflow: WorkflowHandle) -> Result<&mut WorkflowProps> {
        let path = self.tree.path(workflow.0);
        match self.tree.kind_mut(workflow.0)? {
            ConstructKind::Workflow(props) => Ok(props),
            _ => Err(CdkError::wrong_kind(path, "workflow")),
        }
    }

    pub fn job_mut(&mut self, job: JobHandle) -> Result<&mut JobProps> {
        let path = self.tree.path(job.0);
        match self.tree.kind_mut(job.0)? {
            ConstructKind::Job(props) => Ok(props),
            _ => Err(CdkError::wrong_kind(path, "job")),
        }
    }

    /// Expression referencing an output of `job` from a job that needs it
    pub fn job_output(&self, job: JobHandle, name: &str) -> Result<String> {
        Ok(expression::job_output(self.tree.get(job.0)?.id(), name))
    }

    /// Validate and resolve without writing anything. Returns every
    /// annotation either phase produced, validation first.
    pub fn validate(&self) -> Result<Vec<Annotation>> {
        let synthesizer = Synthesizer::new(&self.tree, &self.config);
        let mut annotations = synthesizer.validate()?;
        for resolution in synthesizer.resolve()? {
            annotations.extend(
                resolution
                    .messages
                    .into_iter()
                    .map(|message| Annotation::new(&self.tree, resolution.workflow, message)),
            );
        }
        Ok(annotations)
    }

    /// Synthesize every workflow to the configured output directory.
    ///
    /// # Errors
    ///
    /// `Validation` when validation aborts the run and no
    /// `on_validation_error` hook is set; I/O and serialization failures;
    /// whatever a hook returns.
    pub fn synth(&mut self) -> Result<SynthOutcome> {
        let synthesizer = Synthesizer::new(&self.tree, &self.config);
        let mut manifest = synthesizer.manifest()?;

        let annotations = synthesizer.validate()?;
        let failed = has_errors(&annotations);
        let validation_error = ValidationError::from_annotations(&annotations);
        for annotation in annotations {
            log_annotation(&annotation);
            manifest.record(&self.tree, annotation);
        }

        if failed && !self.config.continue_on_error_annotations {
            log::error!("{}", validation_error);
            synthesizer.persist_manifest(&manifest)?;
            self.manifest = manifest;
            match self.hooks.on_validation_error.as_mut() {
                Some(hook) => hook(validation_error)?,
                None => return Err(CdkError::Validation(validation_error)),
            }
            self.finalize(SynthOutcome::Aborted)?;
            return Ok(SynthOutcome::Aborted);
        }
        if failed {
            log::warn!(
                "Continuing despite {} validation error(s)",
                validation_error.len()
            );
        }

        let resolutions = synthesizer.resolve()?;
        for resolution in &resolutions {
            for message in &resolution.messages {
                let annotation = Annotation::new(&self.tree, resolution.workflow, message.clone());
                log_annotation(&annotation);
                manifest.record(&self.tree, annotation);
            }
        }

        let rendered = synthesizer.render(&resolutions)?;
        synthesizer.write(&rendered, &mut manifest)?;
        synthesizer.persist_manifest(&manifest)?;
        log::info!(
            "Synthesized {} of {} workflow(s) into {}",
            manifest.workflows.values().filter(|w| w.is_written()).count(),
            manifest.workflows.len(),
            self.config.outdir.display()
        );

        self.manifest = manifest;
        self.finalize(SynthOutcome::Completed)?;
        Ok(SynthOutcome::Completed)
    }

    fn finalize(&mut self, outcome: SynthOutcome) -> Result<()> {
        let Some(hook) = self.hooks.on_finalize.as_mut() else {
            return Ok(());
        };
        let context = FinalizeContext {
            manifest: &self.manifest,
            continue_on_error_annotations: self.config.continue_on_error_annotations,
            outdir: &self.config.outdir,
            outcome,
        };
        hook(&context)
    }
}

fn log_annotation(annotation: &Annotation) {
    match annotation.level {
        AnnotationLevel::Error => log::error!("[{}] {}", annotation.path, annotation.message),
        AnnotationLevel::Warning => log::warn!("[{}] {}", annotation.path, annotation.message),
        AnnotationLevel::Info => log::info!("[{}] {}", annotation.path, annotation.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::Message;
    use crate::workflow::{PushTrigger, Triggers};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn push_main() -> WorkflowProps {
        WorkflowProps::new(Triggers::new().push(PushTrigger::branches(["main"])))
    }

    fn project(dir: &Path) -> Project {
        Project::new(ProjectConfig::new(dir)).unwrap()
    }

    #[test]
    fn test_handles_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(dir.path());
        let wf = project.add_workflow("ci", push_main()).unwrap();
        let job = project.add_job(wf, "build", JobProps::default()).unwrap();

        assert_eq!(project.workflow("ci"), Some(wf));
        assert_eq!(project.workflow("missing"), None);
        assert_eq!(project.job(wf, "build"), Some(job));
        assert_eq!(project.tree().path(job.node()), "project/ci/build");
        assert!(matches!(
            project.add_job(wf, "build", JobProps::default()),
            Err(CdkError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_job_lookup_skips_other_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(dir.path());
        let wf = project.add_workflow("ci", push_main()).unwrap();
        project
            .tree_mut()
            .add_child(wf.node(), "notes", ConstructKind::Project)
            .unwrap();

        assert!(project.tree().find_child(wf.node(), "notes").is_some());
        assert_eq!(project.job(wf, "notes"), None);
    }

    #[test]
    fn test_add_dependency_and_job_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(dir.path());
        let wf = project.add_workflow("ci", push_main()).unwrap();
        let build = project.add_job(wf, "build", JobProps::default()).unwrap();
        let deploy = project.add_job(wf, "deploy", JobProps::default()).unwrap();

        project.add_dependency(deploy, build).unwrap();
        project.add_dependency(deploy, build).unwrap();
        assert_eq!(project.job_mut(deploy).unwrap().needs, vec!["build"]);
        assert_eq!(
            project.job_output(build, "version").unwrap(),
            "${{ needs.build.outputs.version }}"
        );

        let other = project.add_workflow("release", push_main()).unwrap();
        let publish = project.add_job(other, "publish", JobProps::default()).unwrap();
        assert!(matches!(
            project.add_dependency(publish, build),
            Err(CdkError::Config(_))
        ));
    }

    #[test]
    fn test_add_step_twice_is_rebind() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(dir.path());
        let wf = project.add_workflow("ci", push_main()).unwrap();
        let job = project.add_job(wf, "build", JobProps::default()).unwrap();
        let mut step = Step::run("test", "cargo test");
        project.add_step(job, &mut step).unwrap();
        assert!(matches!(
            project.add_step(job, &mut step),
            Err(CdkError::Rebind { .. })
        ));
    }

    #[test]
    fn test_workflow_mut_on_job_is_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(dir.path());
        let wf = project.add_workflow("ci", push_main()).unwrap();
        let job = project.add_job(wf, "build", JobProps::default()).unwrap();
        let disguised = WorkflowHandle(job.node());
        assert!(matches!(
            project.workflow_mut(disguised),
            Err(CdkError::WrongKind { .. })
        ));
        project.workflow_mut(wf).unwrap().name = Some("CI".to_string());
    }

    #[test]
    fn test_abort_without_hook_returns_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(&dir.path().join("out"));
        project.add_workflow("empty", push_main()).unwrap();

        let err = project.synth().unwrap_err();
        let validation = err.as_validation_error().unwrap();
        assert_eq!(validation.len(), 1);
        assert!(project.manifest().has_error_annotation());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_abort_with_hook_finalizes() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let hook_seen = Rc::clone(&seen);
        let finalize_seen = Rc::clone(&seen);
        let hooks = SynthHooks::new()
            .on_validation_error(move |err| {
                hook_seen.borrow_mut().push(format!("error:{}", err.len()));
                Ok(())
            })
            .on_finalize(move |ctx| {
                finalize_seen
                    .borrow_mut()
                    .push(format!("finalize:{:?}", ctx.outcome));
                Ok(())
            });
        let mut project = project(dir.path()).with_hooks(hooks);
        project.add_workflow("empty", push_main()).unwrap();

        assert_eq!(project.synth().unwrap(), SynthOutcome::Aborted);
        assert_eq!(*seen.borrow(), vec!["error:1", "finalize:Aborted"]);
    }

    #[test]
    fn test_custom_validator_annotations_reach_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(dir.path());
        let wf = project.add_workflow("ci", push_main()).unwrap();
        let job = project.add_job(wf, "build", JobProps::default()).unwrap();
        project
            .add_step(job, &mut Step::run("test", "cargo test"))
            .unwrap();
        project
            .add_validator(
                wf.node(),
                Box::new(|_: &ConstructTree, _: NodeId| {
                    vec![Message::warn("needs a review")]
                }),
            )
            .unwrap();

        assert_eq!(project.synth().unwrap(), SynthOutcome::Completed);
        let entry = project.manifest().workflow("ci").unwrap();
        assert_eq!(entry.annotations.len(), 1);
        assert_eq!(entry.annotations[0].message, "needs a review");
        assert!(entry.is_written());
    }

    #[test]
    fn test_additional_checks_registered_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ProjectConfig::new(dir.path());
        config.additional_checks = true;
        let mut project = Project::new(config).unwrap();
        let wf = project.add_workflow("ci", push_main()).unwrap();
        let job = project.add_job(wf, "build", JobProps::default()).unwrap();
        project
            .add_step(job, &mut Step::uses("checkout", "actions/checkout"))
            .unwrap();

        assert_eq!(project.synth().unwrap(), SynthOutcome::Completed);
        let manifest = project.manifest();
        assert_eq!(manifest.count(AnnotationLevel::Info), 1);
        assert_eq!(manifest.count(AnnotationLevel::Warning), 1);
    }
}
