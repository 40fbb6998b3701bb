// SPDX-License-Identifier: MIT

//! Declarative project definitions
//!
//! This module provides:
//! - `ProjectDefinition` and friends - the YAML schema
//! - `DefinitionLoader` - reads a definition and builds a `Project` from it

pub mod loader;
pub mod types;

pub use loader::DefinitionLoader;
pub use types::{JobDefinition, ProjectDefinition, StepDefinition, WorkflowDefinition};
