//! Makeflow export: the same rule shape as GNU Make but with no phony
//! target, since Makeflow has no equivalent concept (spec.md §6).

use super::{job_list, render_body, ExportOptions};
use crate::error::Result;
use crate::workflow::Workflow;

pub fn to_makeflow(workflow: &Workflow, options: &ExportOptions) -> Result<String> {
    let ids = job_list(workflow, false)?;

    let mut out = String::new();
    for id in &ids {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own job list");
        let targets = job.outputs.join(" ");
        let prereqs = job.inputs.join(" ");
        out.push_str(&format!("{targets} : {prereqs}\n"));
        if let Some(body) = render_body(job, options.engine)? {
            for line in body.lines() {
                out.push_str(&format!("\t{line}\n"));
            }
        }
        out.push('\n');
    }

    Ok(out)
}
