// SPDX-License-Identifier: MIT

//! Typed error handling for workflow-cdk
//!
//! Build-time mistakes (bad ids, double binding) and fatal synthesis
//! failures are errors. Validation findings are not: they are collected as
//! annotations and only surface here, wrapped in [`ValidationError`], when a
//! synth run aborts because of them.

use std::fmt;

use thiserror::Error;

use crate::construct::{Annotation, AnnotationLevel};

/// Top-level error type for workflow-cdk
#[derive(Debug, Error)]
pub enum CdkError {
    /// A sibling already uses this id
    #[error("Duplicate id '{id}' under '{parent}'")]
    DuplicateId { parent: String, id: String },

    /// Id is empty or contains characters outside `[A-Za-z0-9_.-]`
    #[error("Invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// Step was already bound to a job
    #[error("Step '{step}' is already bound to job '{job}'")]
    Rebind { step: String, job: String },

    /// Node exists but is not the construct kind the operation needs
    #[error("'{path}' is not a {expected}")]
    WrongKind { path: String, expected: String },

    /// Validation produced error annotations and synthesis was aborted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unexpected internal invariant violation
    #[error("Fatal synthesis error: {0}")]
    Fatal(String),

    /// Configuration errors (bad env override, bad definition file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML serialization/parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CdkError>;

impl CdkError {
    /// Create a duplicate id error
    pub fn duplicate_id(parent: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            parent: parent.into(),
            id: id.into(),
        }
    }

    /// Create an invalid id error
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a wrong-kind error
    pub fn wrong_kind(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::WrongKind {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Create a fatal error
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True if this is a structured validation failure rather than an
    /// arbitrary error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn as_validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Aggregate of the error-level annotations found during the validate phase
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    errors: Vec<Annotation>,
}

impl ValidationError {
    /// Keep only the error-level annotations out of `annotations`.
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        Self {
            errors: annotations
                .iter()
                .filter(|a| a.level == AnnotationLevel::Error)
                .cloned()
                .collect(),
        }
    }

    pub fn errors(&self) -> &[Annotation] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  [{}] {}", error.path, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::NodeId;

    fn annotation(level: AnnotationLevel, message: &str) -> Annotation {
        Annotation {
            level,
            message: message.to_string(),
            path: "project/build".to_string(),
            node: NodeId::ROOT,
        }
    }

    #[test]
    fn test_validation_error_keeps_only_errors() {
        let annotations = vec![
            annotation(AnnotationLevel::Info, "fyi"),
            annotation(AnnotationLevel::Error, "broken"),
            annotation(AnnotationLevel::Warning, "careful"),
        ];
        let err = ValidationError::from_annotations(&annotations);
        assert_eq!(err.len(), 1);
        assert_eq!(err.errors()[0].message, "broken");
    }

    #[test]
    fn test_validation_error_display_lists_paths() {
        let err =
            ValidationError::from_annotations(&[annotation(AnnotationLevel::Error, "no jobs")]);
        let text = err.to_string();
        assert!(text.contains("1 error(s)"));
        assert!(text.contains("[project/build] no jobs"));
    }

    #[test]
    fn test_is_validation_error_predicate() {
        let validation: CdkError = ValidationError::from_annotations(&[]).into();
        assert!(validation.is_validation_error());
        assert!(validation.as_validation_error().is_some());

        let other = CdkError::fatal("boom");
        assert!(!other.is_validation_error());
        assert!(other.as_validation_error().is_none());
    }

    #[test]
    fn test_error_messages() {
        let err = CdkError::duplicate_id("project/build", "test");
        assert_eq!(err.to_string(), "Duplicate id 'test' under 'project/build'");

        let err = CdkError::invalid_id("a b", "contains ' '");
        assert!(err.to_string().contains("Invalid id 'a b'"));
    }
}
