// SPDX-License-Identifier: MIT

use serde::Serialize;

use super::action_step;
use crate::error::Result;
use crate::workflow::{expression, Step};

pub const SETUP_NODE_ACTION: &str = "actions/setup-node";
pub const SETUP_NODE_VERSION: &str = "v4";

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupNodeInputs {
    /// Version range, e.g. `20.x` or `lts/*`
    pub node_version: Option<String>,
    pub node_version_file: Option<String>,
    pub architecture: Option<String>,
    pub check_latest: Option<bool>,
    pub registry_url: Option<String>,
    pub scope: Option<String>,
    pub token: Option<String>,
    /// `npm`, `yarn` or `pnpm`
    pub cache: Option<String>,
    pub cache_dependency_path: Option<String>,
    pub always_auth: Option<bool>,
}

/// Output expressions of a setup-node step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupNodeOutputs {
    pub node_version: String,
    pub cache_hit: String,
}

impl SetupNodeOutputs {
    pub fn of(step_id: &str) -> Self {
        Self {
            node_version: expression::step_output(step_id, "node-version"),
            cache_hit: expression::step_output(step_id, "cache-hit"),
        }
    }
}

pub fn setup_node(id: &str, inputs: &SetupNodeInputs) -> Result<Step> {
    action_step(id, SETUP_NODE_ACTION, SETUP_NODE_VERSION, inputs)
}
