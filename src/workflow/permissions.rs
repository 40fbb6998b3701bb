// SPDX-License-Identifier: MIT

//! GITHUB_TOKEN permission settings for workflows and jobs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scopes the runner recognises
pub const KNOWN_SCOPES: &[&str] = &[
    "actions",
    "attestations",
    "checks",
    "contents",
    "deployments",
    "discussions",
    "id-token",
    "issues",
    "packages",
    "pages",
    "pull-requests",
    "repository-projects",
    "security-events",
    "statuses",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Write,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPreset {
    ReadAll,
    WriteAll,
}

/// Either a blanket preset or a per-scope map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Permissions {
    Preset(PermissionPreset),
    Scoped(IndexMap<String, PermissionLevel>),
}

impl Permissions {
    pub fn read_all() -> Self {
        Self::Preset(PermissionPreset::ReadAll)
    }

    pub fn write_all() -> Self {
        Self::Preset(PermissionPreset::WriteAll)
    }

    pub fn scoped<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = (S, PermissionLevel)>,
        S: Into<String>,
    {
        Self::Scoped(scopes.into_iter().map(|(s, l)| (s.into(), l)).collect())
    }

    /// Scope names not in [`KNOWN_SCOPES`]
    pub fn unknown_scopes(&self) -> Vec<&str> {
        match self {
            Permissions::Preset(_) => vec![],
            Permissions::Scoped(map) => map
                .keys()
                .map(String::as_str)
                .filter(|s| !KNOWN_SCOPES.contains(s))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_serializes_as_string() {
        assert_eq!(
            serde_yaml::to_string(&Permissions::read_all()).unwrap(),
            "read-all\n"
        );
    }

    #[test]
    fn test_scoped_keeps_order() {
        let perms = Permissions::scoped([
            ("pull-requests", PermissionLevel::Write),
            ("contents", PermissionLevel::Read),
        ]);
        assert_eq!(
            serde_yaml::to_string(&perms).unwrap(),
            "pull-requests: write\ncontents: read\n"
        );
    }

    #[test]
    fn test_deserialize_both_forms() {
        let preset: Permissions = serde_yaml::from_str("write-all").unwrap();
        assert_eq!(preset, Permissions::write_all());

        let scoped: Permissions = serde_yaml::from_str("contents: read").unwrap();
        assert_eq!(
            scoped,
            Permissions::scoped([("contents", PermissionLevel::Read)])
        );
    }

    #[test]
    fn test_unknown_scopes() {
        let perms = Permissions::scoped([
            ("contents", PermissionLevel::Read),
            ("contnets", PermissionLevel::Write),
        ]);
        assert_eq!(perms.unknown_scopes(), vec!["contnets"]);
        assert!(Permissions::read_all().unknown_scopes().is_empty());
    }
}
