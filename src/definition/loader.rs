// SPDX-License-Identifier: MIT

//! Definition loader - YAML file loading and project building

use std::fs;
use std::path::Path;

use super::types::ProjectDefinition;
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::project::Project;

/// Loads project definitions from YAML files and builds them
pub struct DefinitionLoader;

impl DefinitionLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a project definition from a YAML file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ProjectDefinition> {
        let path = path.as_ref();
        log::debug!("Loading definition from {}", path.display());
        let content = fs::read_to_string(path)?;
        let mut def = Self::parse_yaml(&content)?;
        def.source = Some(path.to_path_buf());
        Ok(def)
    }

    /// Parse a project definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<ProjectDefinition> {
        let def: ProjectDefinition = serde_yaml::from_str(content)?;
        Ok(def)
    }

    /// Build a project from `def` using `config` instead of `def.config`.
    ///
    /// Build errors (bad ids, duplicates, malformed steps) propagate; they
    /// are not deferred to validation.
    pub fn build(&self, def: &ProjectDefinition, config: ProjectConfig) -> Result<Project> {
        let mut project = Project::new(config)?;
        if let Some(source) = &def.source {
            let root = project.tree().root();
            project.tree_mut().set_metadata(
                root,
                "source",
                serde_json::Value::String(source.display().to_string()),
            )?;
        }

        for wf_def in &def.workflows {
            let workflow = project.add_workflow(&wf_def.id, wf_def.props.clone())?;
            for job_def in &wf_def.jobs {
                let job = project.add_job(workflow, &job_def.id, job_def.props.clone())?;
                for step_def in &job_def.steps {
                    let mut step = step_def.to_step()?;
                    project.add_step(job, &mut step)?;
                }
            }
            log::info!(
                "Built workflow '{}' with {} job(s)",
                wf_def.id,
                wf_def.jobs.len()
            );
        }
        Ok(project)
    }
}

impl Default for DefinitionLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ConstructKind;
    use crate::error::CdkError;

    const DEFINITION: &str = r#"
config:
  outdir: out/workflows
  additional_checks: true

workflows:
  - id: ci
    on:
      pull_request: {}
    jobs:
      - id: lint
        steps:
          - id: clippy
            run: cargo clippy
      - id: test
        needs: [lint]
        steps:
          - id: checkout
            uses: actions/checkout@v4
          - id: test
            run: cargo test
"#;

    #[test]
    fn test_needs_as_single_job_id() {
        let yaml = r#"
workflows:
  - id: ci
    on:
      push: {}
    jobs:
      - id: build
        steps:
          - id: make
            run: make
      - id: deploy
        needs: build
        steps:
          - id: ship
            run: make deploy
"#;
        let def = DefinitionLoader::parse_yaml(yaml).unwrap();
        assert_eq!(def.workflows[0].jobs[1].props.needs, vec!["build"]);

        let project = DefinitionLoader::new()
            .build(&def, ProjectConfig::new("out"))
            .unwrap();
        assert!(project.validate().unwrap().is_empty());
    }

    #[test]
    fn test_parse_definition() {
        let def = DefinitionLoader::parse_yaml(DEFINITION).unwrap();
        assert_eq!(def.config.outdir, std::path::PathBuf::from("out/workflows"));
        assert!(def.config.additional_checks);
        assert_eq!(def.workflows.len(), 1);
        assert_eq!(def.workflows[0].jobs.len(), 2);
        assert!(def.workflows[0].props.triggers.pull_request.is_some());
        assert!(def.source.is_none());
    }

    #[test]
    fn test_build_definition() {
        let def = DefinitionLoader::parse_yaml(DEFINITION).unwrap();
        let project = DefinitionLoader::new()
            .build(&def, def.config.clone())
            .unwrap();

        let wf = project.workflow("ci").unwrap();
        let test = project.job(wf, "test").unwrap();
        let tree = project.tree();
        assert_eq!(tree.children(test.node()).len(), 2);
        match tree.get(test.node()).unwrap().kind() {
            ConstructKind::Job(props) => assert_eq!(props.needs, vec!["lint"]),
            other => panic!("expected job, got {}", other.label()),
        }
    }

    #[test]
    fn test_load_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        fs::write(&path, DEFINITION).unwrap();

        let loader = DefinitionLoader::new();
        let def = loader.load(&path).unwrap();
        let project = loader.build(&def, ProjectConfig::default()).unwrap();
        let root = project.tree().root();
        assert_eq!(
            project.tree().metadata(root, "source"),
            Some(&serde_json::Value::String(path.display().to_string()))
        );
    }

    #[test]
    fn test_duplicate_job_id_fails_build() {
        let yaml = r#"
workflows:
  - id: ci
    on:
      push: {}
    jobs:
      - id: build
      - id: build
"#;
        let def = DefinitionLoader::parse_yaml(yaml).unwrap();
        let result = DefinitionLoader::new().build(&def, ProjectConfig::default());
        assert!(matches!(result, Err(CdkError::DuplicateId { .. })));
    }

    #[test]
    fn test_invalid_yaml_is_yaml_error() {
        let result = DefinitionLoader::parse_yaml("workflows: [unclosed");
        assert!(matches!(result, Err(CdkError::Yaml(_))));
    }
}
