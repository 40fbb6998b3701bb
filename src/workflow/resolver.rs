// SPDX-License-Identifier: MIT

//! Job ordering from `needs` declarations
//!
//! Produces a topological order in which ties are broken by insertion
//! order, so the same tree always renders the same way.

use std::collections::{BTreeSet, HashMap};

use crate::construct::{ConstructKind, ConstructTree, Message, NodeId};
use crate::error::{CdkError, Result};

/// Problem that leaves a workflow's job order undefined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveIssue {
    UnknownDependency { job: String, needs: String },
    SelfDependency { job: String },
    /// Job ids along the cycle, first id repeated at the end
    Cycle(Vec<String>),
}

/// Order `units` (id, needs) and return indices into `units`.
pub fn resolve_order(
    units: &[(String, Vec<String>)],
) -> std::result::Result<Vec<usize>, Vec<ResolveIssue>> {
    let index: HashMap<&str, usize> = units
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.as_str(), i))
        .collect();

    let mut issues = Vec::new();
    // deps[i]: indices job i waits on; dependents[j]: jobs waiting on j
    let mut deps: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); units.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); units.len()];

    for (i, (id, needs)) in units.iter().enumerate() {
        for need in needs {
            match index.get(need.as_str()) {
                None => issues.push(ResolveIssue::UnknownDependency {
                    job: id.clone(),
                    needs: need.clone(),
                }),
                Some(&j) if j == i => issues.push(ResolveIssue::SelfDependency { job: id.clone() }),
                Some(&j) => {
                    if deps[i].insert(j) {
                        dependents[j].push(i);
                    }
                }
            }
        }
    }

    let mut remaining: Vec<usize> = deps.iter().map(BTreeSet::len).collect();
    let mut ready: BTreeSet<usize> = (0..units.len()).filter(|i| remaining[*i] == 0).collect();
    let mut order = Vec::with_capacity(units.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < units.len() {
        issues.push(ResolveIssue::Cycle(find_cycle(units, &deps, &remaining)));
    }

    if issues.is_empty() {
        Ok(order)
    } else {
        Err(issues)
    }
}

/// Walk unresolved jobs along their first unresolved dependency until one
/// repeats. Every unresolved job has such a dependency, so this terminates.
fn find_cycle(
    units: &[(String, Vec<String>)],
    deps: &[BTreeSet<usize>],
    remaining: &[usize],
) -> Vec<String> {
    let Some(start) = (0..units.len()).find(|i| remaining[*i] > 0) else {
        return vec![];
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let next = units[current].1.iter().find_map(|need| {
            units
                .iter()
                .position(|(id, _)| id == need)
                .filter(|j| *j != current && remaining[*j] > 0 && deps[current].contains(j))
        });
        let Some(next) = next else {
            break;
        };
        if let Some(pos) = path.iter().position(|p| *p == next) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|i| units[*i].0.clone()).collect();
            cycle.push(units[next].0.clone());
            return cycle;
        }
        path.push(next);
        current = next;
    }
    path.iter().map(|i| units[*i].0.clone()).collect()
}

/// Job order of one workflow, or the problems that prevent one
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub workflow: NodeId,
    /// Jobs in execution order; `None` if the needs graph is broken
    pub order: Option<Vec<NodeId>>,
    pub messages: Vec<Message>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.order.is_some()
    }
}

/// Resolve the needs graph of the jobs directly under `workflow`.
pub fn resolve_workflow(tree: &ConstructTree, workflow: NodeId) -> Result<Resolution> {
    let wf_node = tree.get(workflow)?;
    if !matches!(wf_node.kind(), ConstructKind::Workflow(_)) {
        return Err(CdkError::wrong_kind(tree.path(workflow), "workflow"));
    }

    let mut jobs = Vec::new();
    let mut units = Vec::new();
    for child in tree.children(workflow) {
        let node = tree.get(*child)?;
        if let ConstructKind::Job(props) = node.kind() {
            jobs.push(*child);
            units.push((node.id().to_string(), props.needs.clone()));
        }
    }

    match resolve_order(&units) {
        Ok(order) => Ok(Resolution {
            workflow,
            order: Some(order.into_iter().map(|i| jobs[i]).collect()),
            messages: vec![],
        }),
        Err(issues) => {
            let wf = wf_node.id();
            let messages = issues
                .into_iter()
                .map(|issue| match issue {
                    ResolveIssue::UnknownDependency { job, needs } => Message::error(format!(
                        "job '{}' in workflow '{}' needs unknown job '{}'",
                        job, wf, needs
                    )),
                    ResolveIssue::SelfDependency { job } => Message::error(format!(
                        "job '{}' in workflow '{}' needs itself",
                        job, wf
                    )),
                    ResolveIssue::Cycle(cycle) => Message::error(format!(
                        "dependency cycle in workflow '{}': {}",
                        wf,
                        cycle.join(" -> ")
                    )),
                })
                .collect();
            Ok(Resolution {
                workflow,
                order: None,
                messages,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(jobs: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        jobs.iter()
            .map(|(id, needs)| {
                (
                    id.to_string(),
                    needs.iter().map(|n| n.to_string()).collect(),
                )
            })
            .collect()
    }

    fn ids(units: &[(String, Vec<String>)], order: &[usize]) -> Vec<String> {
        order.iter().map(|i| units[*i].0.clone()).collect()
    }

    #[test]
    fn test_no_needs_keeps_insertion_order() {
        let u = units(&[("c", &[]), ("a", &[]), ("b", &[])]);
        assert_eq!(ids(&u, &resolve_order(&u).unwrap()), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_chain_a_b_c() {
        let u = units(&[("A", &[]), ("B", &["A"]), ("C", &["A", "B"])]);
        assert_eq!(ids(&u, &resolve_order(&u).unwrap()), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dependencies_move_ahead_of_earlier_jobs() {
        let u = units(&[("deploy", &["test", "build"]), ("test", &["build"]), ("build", &[])]);
        assert_eq!(
            ids(&u, &resolve_order(&u).unwrap()),
            vec!["build", "test", "deploy"]
        );
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        // y and x both become ready after root; y was inserted first
        let u = units(&[("y", &["root"]), ("root", &[]), ("x", &["root"]), ("z", &[])]);
        assert_eq!(
            ids(&u, &resolve_order(&u).unwrap()),
            vec!["root", "y", "x", "z"]
        );
    }

    #[test]
    fn test_every_job_after_its_needs() {
        let u = units(&[
            ("e", &["d", "b"]),
            ("d", &["a"]),
            ("c", &[]),
            ("b", &["c", "a"]),
            ("a", &[]),
        ]);
        let order = ids(&u, &resolve_order(&u).unwrap());
        assert_eq!(order.len(), u.len());
        for (id, needs) in &u {
            let pos = order.iter().position(|o| o == id).unwrap();
            for need in needs {
                let need_pos = order.iter().position(|o| o == need).unwrap();
                assert!(need_pos < pos, "{} must come after {}", id, need);
            }
        }
    }

    #[test]
    fn test_cycle_reported_once() {
        let u = units(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"]), ("d", &[])]);
        let issues = resolve_order(&u).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0],
            ResolveIssue::Cycle(vec![
                "a".to_string(),
                "c".to_string(),
                "b".to_string(),
                "a".to_string()
            ])
        );
    }

    #[test]
    fn test_cycle_behind_dependent_job() {
        // "top" waits on the cycle but is not part of it
        let u = units(&[("top", &["x"]), ("x", &["y"]), ("y", &["x"])]);
        let issues = resolve_order(&u).unwrap_err();
        assert_eq!(
            issues,
            vec![ResolveIssue::Cycle(vec![
                "x".to_string(),
                "y".to_string(),
                "x".to_string()
            ])]
        );
    }

    #[test]
    fn test_unknown_and_self_dependencies() {
        let u = units(&[("a", &["ghost"]), ("b", &["b"])]);
        let issues = resolve_order(&u).unwrap_err();
        assert_eq!(
            issues,
            vec![
                ResolveIssue::UnknownDependency {
                    job: "a".to_string(),
                    needs: "ghost".to_string()
                },
                ResolveIssue::SelfDependency {
                    job: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_needs_are_harmless() {
        let u = units(&[("a", &[]), ("b", &["a", "a"])]);
        assert_eq!(ids(&u, &resolve_order(&u).unwrap()), vec!["a", "b"]);
    }
}
