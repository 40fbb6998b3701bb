// SPDX-License-Identifier: MIT

use serde::Serialize;

use super::action_step;
use crate::error::Result;
use crate::workflow::Step;

pub const CHECKOUT_ACTION: &str = "actions/checkout";
pub const CHECKOUT_VERSION: &str = "v4";

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutInputs {
    /// `owner/repo`; defaults to the repository running the workflow
    pub repository: Option<String>,
    /// Branch, tag or SHA
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub token: Option<String>,
    pub ssh_key: Option<String>,
    pub persist_credentials: Option<bool>,
    /// Relative path under `$GITHUB_WORKSPACE`
    pub path: Option<String>,
    pub clean: Option<bool>,
    pub sparse_checkout: Option<String>,
    /// `0` fetches all history
    pub fetch_depth: Option<u32>,
    pub fetch_tags: Option<bool>,
    pub lfs: Option<bool>,
    /// `true` or `recursive`
    pub submodules: Option<String>,
}

/// `actions/checkout` step
pub fn checkout(id: &str, inputs: &CheckoutInputs) -> Result<Step> {
    action_step(id, CHECKOUT_ACTION, CHECKOUT_VERSION, inputs)
}
