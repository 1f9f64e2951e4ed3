//! Human-readable workflow introspection: one stanza per job showing its
//! inputs, identifier, and outputs, plus an outdated-count summary line
//! (spec.md §4.7).

use crate::error::{Result, SpateError};
use crate::outdated::analyze;
use crate::workflow::Workflow;

/// `echo` rendering options. `colorized` requires `decorated`: colorizing a
/// status marker that was never emitted makes no sense, so the combination
/// is rejected at the API boundary rather than silently ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoOptions {
    pub colorized: bool,
    pub decorated: bool,
    pub outdated_only: bool,
}

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

pub fn echo(workflow: &Workflow, options: &EchoOptions) -> Result<String> {
    if options.colorized && !options.decorated {
        return Err(SpateError::InvalidName(
            "echo: colorized=true requires decorated=true".to_string(),
        ));
    }

    let outdated = analyze(workflow)?;
    let ids = if options.outdated_only {
        workflow.list_jobs(Some(&outdated))?
    } else {
        workflow.list_jobs(None)?
    };

    let mut out = String::new();
    for id in &ids {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own job list");
        for input in &job.inputs {
            out.push_str(&format!("< {input}\n"));
        }

        let is_outdated = outdated.contains(id);
        if options.decorated {
            let marker = if is_outdated { '*' } else { '.' };
            if options.colorized {
                let color = if is_outdated { YELLOW } else { GREEN };
                out.push_str(&format!("{color}{marker} {id}{RESET}\n"));
            } else {
                out.push_str(&format!("{marker} {id}\n"));
            }
        } else {
            out.push_str(&format!("{id}\n"));
        }

        for output in &job.outputs {
            out.push_str(&format!("> {output}\n"));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "total: {} outdated jobs (out of {})\n",
        outdated.len(),
        workflow.number_of_jobs()
    ));
    Ok(out)
}
