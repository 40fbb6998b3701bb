// SPDX-License-Identifier: MIT

use serde::Serialize;

use super::action_step;
use crate::error::Result;
use crate::workflow::{expression, Step};

pub const UPLOAD_ARTIFACT_ACTION: &str = "actions/upload-artifact";
pub const DOWNLOAD_ARTIFACT_ACTION: &str = "actions/download-artifact";
pub const ARTIFACT_VERSION: &str = "v4";

// --- Upload ---

/// What upload-artifact does when `path` matches nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IfNoFilesFound {
    Warn,
    Error,
    Ignore,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadArtifactInputs {
    pub name: Option<String>,
    /// File, directory or glob; newline-separated for several
    pub path: String,
    pub if_no_files_found: Option<IfNoFilesFound>,
    pub retention_days: Option<u32>,
    /// 0 (none) to 9 (best)
    pub compression_level: Option<u8>,
    pub overwrite: Option<bool>,
    pub include_hidden_files: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArtifactOutputs {
    pub artifact_id: String,
    pub artifact_url: String,
}

impl UploadArtifactOutputs {
    pub fn of(step_id: &str) -> Self {
        Self {
            artifact_id: expression::step_output(step_id, "artifact-id"),
            artifact_url: expression::step_output(step_id, "artifact-url"),
        }
    }
}

pub fn upload_artifact(id: &str, inputs: &UploadArtifactInputs) -> Result<Step> {
    action_step(id, UPLOAD_ARTIFACT_ACTION, ARTIFACT_VERSION, inputs)
}

// --- Download ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadArtifactInputs {
    /// Downloads every artifact of the run when unset
    pub name: Option<String>,
    pub path: Option<String>,
    pub pattern: Option<String>,
    pub merge_multiple: Option<bool>,
    pub github_token: Option<String>,
    pub repository: Option<String>,
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifactOutputs {
    pub download_path: String,
}

impl DownloadArtifactOutputs {
    pub fn of(step_id: &str) -> Self {
        Self {
            download_path: expression::step_output(step_id, "download-path"),
        }
    }
}

pub fn download_artifact(id: &str, inputs: &DownloadArtifactInputs) -> Result<Step> {
    action_step(id, DOWNLOAD_ARTIFACT_ACTION, ARTIFACT_VERSION, inputs)
}
