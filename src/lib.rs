// SPDX-License-Identifier: MIT

//! Declarative CI workflows as a construct tree
//!
//! Build a [`project::Project`] of workflows, jobs and steps, then call
//! `synth` to validate it and write one workflow file per workflow.

pub mod actions;
pub mod config;
pub mod construct;
pub mod definition;
pub mod error;
pub mod project;
pub mod synth;
pub mod workflow;

pub use config::{OutputFormat, ProjectConfig};
pub use error::{CdkError, Result, ValidationError};
pub use project::{FinalizeContext, JobHandle, Project, SynthHooks, WorkflowHandle};
pub use synth::{Manifest, SynthOutcome};
