// SPDX-License-Identifier: MIT

//! Construct tree primitives
//!
//! This module provides:
//! - `ConstructTree` - the arena of nodes with scoped id uniqueness
//! - `Validator` / `validate_tree` - per-node checks and their aggregation
//! - id rules shared by every construct

pub mod id;
mod tree;
mod validation;

pub use tree::{ConstructKind, ConstructTree, Node, NodeId};
pub use validation::{has_errors, validate_tree, Annotation, AnnotationLevel, Message, Validator};
