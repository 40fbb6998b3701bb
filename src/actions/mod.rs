// SPDX-License-Identifier: MIT

//! Typed wrappers for commonly used actions
//!
//! Each wrapper takes an inputs struct and returns an unbound [`Step`].
//! Input field names are snake_case and become kebab-case `with:` keys;
//! `None` fields are left out.

mod artifact;
mod checkout;
mod setup_go;
mod setup_node;
mod setup_python;

pub use artifact::{
    download_artifact, upload_artifact, DownloadArtifactInputs, DownloadArtifactOutputs,
    IfNoFilesFound, UploadArtifactInputs, UploadArtifactOutputs, ARTIFACT_VERSION,
    DOWNLOAD_ARTIFACT_ACTION, UPLOAD_ARTIFACT_ACTION,
};
pub use checkout::{checkout, CheckoutInputs, CHECKOUT_ACTION, CHECKOUT_VERSION};
pub use setup_go::{setup_go, SetupGoInputs, SetupGoOutputs, SETUP_GO_ACTION, SETUP_GO_VERSION};
pub use setup_node::{
    setup_node, SetupNodeInputs, SetupNodeOutputs, SETUP_NODE_ACTION, SETUP_NODE_VERSION,
};
pub use setup_python::{
    setup_python, SetupPythonInputs, SetupPythonOutputs, SETUP_PYTHON_ACTION,
    SETUP_PYTHON_VERSION,
};

use serde::Serialize;

use crate::error::Result;
use crate::workflow::Step;

fn action_step<T: Serialize>(id: &str, action: &str, version: &str, inputs: &T) -> Result<Step> {
    Step::action(id, action, version).with_inputs(inputs)
}
