//! Outdatedness analysis: stats the filesystem for every path, flags jobs
//! locally outdated, then propagates staleness transitively through the
//! job-level DAG (spec.md §4.4).

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::time::SystemTime;

use tracing::debug;

use crate::error::{Result, SpateError};
use crate::workflow::Workflow;

fn stat(path: &str) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => {
            let modified = meta.modified().map_err(|e| SpateError::FilesystemError {
                path: path.to_string(),
                source: e,
            })?;
            Ok(Some(modified))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SpateError::FilesystemError {
            path: path.to_string(),
            source: e,
        }),
    }
}

fn is_locally_outdated(inputs: &[Option<SystemTime>], outputs: &[Option<SystemTime>]) -> bool {
    if !outputs.is_empty() && outputs.iter().any(Option::is_none) {
        return true; // (a) any output absent
    }

    match (inputs.is_empty(), outputs.is_empty()) {
        (false, false) => {
            // (b) stale if the newest input outpaces the oldest output.
            let max_input = inputs.iter().flatten().max();
            let min_output = outputs.iter().flatten().min();
            matches!((max_input, min_output), (Some(mi), Some(mo)) if mo < mi)
        }
        (false, true) => {
            // (c) sink job: runnable whenever any input exists.
            inputs.iter().any(Option::is_some)
        }
        (true, false) => false, // (d) source job, all outputs already present
        (true, true) => false,  // unreachable: EmptyJob is rejected at add_job
    }
}

/// Computes the set of outdated job identifiers. Tolerates missing files
/// (treated as absent); any other stat failure aborts the analysis.
pub fn analyze(workflow: &Workflow) -> Result<HashSet<String>> {
    let order = workflow.list_jobs(None)?;
    let mut outdated = HashSet::new();

    for id in &order {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own topological order");

        let input_stats = job
            .inputs
            .iter()
            .map(|p| stat(p))
            .collect::<Result<Vec<_>>>()?;
        let output_stats = job
            .outputs
            .iter()
            .map(|p| stat(p))
            .collect::<Result<Vec<_>>>()?;

        let mut flagged = is_locally_outdated(&input_stats, &output_stats);
        if !flagged {
            flagged = job.inputs.iter().any(|input| {
                workflow
                    .producer_of(input)
                    .is_some_and(|producer| outdated.contains(producer))
            });
        }

        if flagged {
            debug!(job = %id, "flagged outdated");
            outdated.insert(id.clone());
        }
    }

    Ok(outdated)
}
