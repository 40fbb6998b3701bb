// SPDX-License-Identifier: MIT

use serde::Serialize;

use super::action_step;
use crate::error::Result;
use crate::workflow::{expression, Step};

pub const SETUP_PYTHON_ACTION: &str = "actions/setup-python";
pub const SETUP_PYTHON_VERSION: &str = "v5";

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupPythonInputs {
    pub python_version: Option<String>,
    pub python_version_file: Option<String>,
    /// `pip`, `pipenv` or `poetry`
    pub cache: Option<String>,
    pub architecture: Option<String>,
    pub check_latest: Option<bool>,
    pub token: Option<String>,
    pub cache_dependency_path: Option<String>,
    pub update_environment: Option<bool>,
    pub allow_prereleases: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPythonOutputs {
    pub python_version: String,
    pub python_path: String,
    pub cache_hit: String,
}

impl SetupPythonOutputs {
    pub fn of(step_id: &str) -> Self {
        Self {
            python_version: expression::step_output(step_id, "python-version"),
            python_path: expression::step_output(step_id, "python-path"),
            cache_hit: expression::step_output(step_id, "cache-hit"),
        }
    }
}

pub fn setup_python(id: &str, inputs: &SetupPythonInputs) -> Result<Step> {
    action_step(id, SETUP_PYTHON_ACTION, SETUP_PYTHON_VERSION, inputs)
}
