// SPDX-License-Identifier: MIT

//! Workflow, job and step constructs
//!
//! This module provides:
//! - `WorkflowProps` / `JobProps` - typed settings stored on tree nodes
//! - `Step` and the `Bindable` capability that attaches it to a job
//! - the needs resolver that orders jobs inside a workflow

mod checks;
pub mod expression;
mod job;
mod permissions;
mod props;
pub mod resolver;
mod step;
mod triggers;

pub use checks::additional_checks;
pub use job::{
    add_job, validate_job, Concurrency, Defaults, Environment, JobProps, RunDefaults, RunsOn,
    Strategy,
};
pub use permissions::{PermissionLevel, PermissionPreset, Permissions, KNOWN_SCOPES};
pub use props::{add_workflow, colliding_sibling, file_stem, validate_workflow, WorkflowProps};
pub use resolver::{resolve_workflow, Resolution, ResolveIssue};
pub use step::{validate_step, Bindable, Step, StepKind, StepProps};
pub use triggers::{
    ActivityTrigger, CallSecret, InputType, PullRequestTrigger, PushTrigger, Schedule, Triggers,
    WorkflowCall, WorkflowDispatch, WorkflowInput,
};
