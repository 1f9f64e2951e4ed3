//! Shared export plumbing: the job-list computation and template rendering
//! every per-target exporter builds on (spec.md §4.6).

pub mod drake;
pub mod makeflow;
pub mod makefile;
pub mod sbatch;
pub mod shell;
pub mod torque;

use std::collections::HashSet;

use crate::error::Result;
use crate::job::Job;
use crate::template::{job_environment, default_engine, EngineKind};
use crate::workflow::Workflow;

/// Options common to every exporter. Target-specific toggles (shebang) live
/// alongside the ones every exporter reads.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Restrict output to outdated jobs and their transitive descendants.
    /// Ignored by targets whose host tool already handles staleness (Make,
    /// Makeflow, Drake — see spec.md §6's "Filter to outdated" column).
    pub outdated_only: bool,
    pub engine: EngineKind,
    pub shebang: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            outdated_only: true,
            engine: default_engine(),
            shebang: "#!/bin/bash".to_string(),
        }
    }
}

/// The job identifiers to emit, in canonical topological order, honoring
/// `outdated_only` when the target respects it.
pub(crate) fn job_list(workflow: &Workflow, outdated_only: bool) -> Result<Vec<String>> {
    if outdated_only {
        let outdated = crate::outdated::analyze(workflow)?;
        workflow.list_jobs(Some(&outdated))
    } else {
        workflow.list_jobs(None)
    }
}

/// Renders a job's template against its variable environment. `None` for
/// abstract jobs (no template).
pub(crate) fn render_body(job: &Job, engine: EngineKind) -> Result<Option<String>> {
    match &job.template {
        Some(template) => {
            let env = job_environment(job);
            Ok(Some(engine.render(template, &env)?))
        }
        None => Ok(None),
    }
}

/// Output paths produced by some job but never consumed by another: the
/// workflow's externally-visible results.
pub(crate) fn terminal_outputs(workflow: &Workflow) -> Vec<String> {
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut produced: HashSet<&str> = HashSet::new();
    for job in workflow.jobs() {
        consumed.extend(job.inputs.iter().map(String::as_str));
        produced.extend(job.outputs.iter().map(String::as_str));
    }
    workflow
        .list_paths()
        .into_iter()
        .filter(|p| produced.contains(p.as_str()) && !consumed.contains(p.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_outputs_excludes_intermediate_paths() {
        let mut w = Workflow::new("w").unwrap();
        w.add_job(["A"], ["B", "C"], Some("x".to_string()), None, None)
            .unwrap();
        w.add_job(["A", "C"], ["D"], Some("y".to_string()), None, None)
            .unwrap();
        assert_eq!(terminal_outputs(&w), vec!["B".to_string(), "D".to_string()]);
    }
}
