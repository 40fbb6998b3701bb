// SPDX-License-Identifier: MIT

use serde::Serialize;

use super::action_step;
use crate::error::Result;
use crate::workflow::{expression, Step};

pub const SETUP_GO_ACTION: &str = "actions/setup-go";
pub const SETUP_GO_VERSION: &str = "v5";

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupGoInputs {
    pub go_version: Option<String>,
    /// Usually `go.mod`
    pub go_version_file: Option<String>,
    pub check_latest: Option<bool>,
    pub token: Option<String>,
    pub cache: Option<bool>,
    pub cache_dependency_path: Option<String>,
    pub architecture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupGoOutputs {
    pub go_version: String,
    pub cache_hit: String,
}

impl SetupGoOutputs {
    pub fn of(step_id: &str) -> Self {
        Self {
            go_version: expression::step_output(step_id, "go-version"),
            cache_hit: expression::step_output(step_id, "cache-hit"),
        }
    }
}

pub fn setup_go(id: &str, inputs: &SetupGoInputs) -> Result<Step> {
    action_step(id, SETUP_GO_ACTION, SETUP_GO_VERSION, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setup_go_from_mod_file() {
        let inputs = SetupGoInputs {
            go_version_file: Some("go.mod".to_string()),
            cache: Some(false),
            ..Default::default()
        };
        let props = setup_go("go", &inputs).unwrap().render();
        assert_eq!(props.uses.as_deref(), Some("actions/setup-go@v5"));
        assert_eq!(props.with["go-version-file"], json!("go.mod"));
        assert_eq!(props.with["cache"], json!(false));
        assert_eq!(
            SetupGoOutputs::of("go").go_version,
            "${{ steps.go.outputs.go-version }}"
        );
    }
}
