//! SLURM sbatch export: a driver script that submits one array element per
//! job in topological order, capturing each returned job id to wire
//! `--dependency=afterok:<id>` for downstream submissions (spec.md §6).

use std::collections::HashSet;

use super::{job_list, render_body, ExportOptions};
use crate::error::Result;
use crate::workflow::Workflow;

pub fn to_sbatch(workflow: &Workflow, options: &ExportOptions) -> Result<String> {
    let ids = job_list(workflow, options.outdated_only)?;
    let id_set: HashSet<&str> = ids.iter().map(String::as_str).collect();

    let mut out = String::new();
    out.push_str("#!/bin/bash\nset -e\n\ndeclare -A SPATE_JOB_IDS\n\n");

    for id in &ids {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own job list");
        let body = render_body(job, options.engine)?.unwrap_or_default();

        out.push_str(&format!(
            "cat > \"{id}.sbatch\" <<'SPATE_EOF_{id}'\n#!/bin/bash\n#SBATCH --job-name={id}\n{body}\nSPATE_EOF_{id}\n\n",
        ));

        let mut deps: Vec<&str> = job
            .inputs
            .iter()
            .filter_map(|path| workflow.producer_of(path))
            .filter(|producer| *producer != id.as_str() && id_set.contains(producer))
            .collect();
        deps.sort_unstable();
        deps.dedup();

        let dependency_flag = if deps.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = deps
                .iter()
                .map(|dep| format!("${{SPATE_JOB_IDS[{dep}]}}"))
                .collect();
            format!(" --dependency=afterok:{}", parts.join(":"))
        };

        out.push_str(&format!(
            "SPATE_JOB_IDS[{id}]=$(sbatch --parsable{dependency_flag} \"{id}.sbatch\")\n\n"
        ));
    }

    Ok(out)
}
