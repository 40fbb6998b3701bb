// SPDX-License-Identifier: MIT

//! Synthesis: validate, resolve, render and write

mod manifest;
mod render;
mod synthesizer;

pub use manifest::{Manifest, WorkflowManifest};
pub use render::{render_job, render_workflow, to_text, JobDocument, WorkflowDocument, YAML_HEADER};
pub use synthesizer::{RenderedWorkflow, Synthesizer};

/// How a synth run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthOutcome {
    /// Every phase ran; workflows without errors were written
    Completed,
    /// Validation errors stopped the run before anything was written
    Aborted,
}
