//! TORQUE/PBS export: a single job-array submission, each workflow job
//! selected by array index inside a `case` block. Dependency ordering
//! between jobs is not expressed (spec.md §6's documented limitation).

use super::{job_list, render_body, ExportOptions};
use crate::error::Result;
use crate::workflow::Workflow;

pub fn to_torque(workflow: &Workflow, options: &ExportOptions) -> Result<String> {
    let ids = job_list(workflow, options.outdated_only)?;

    let mut out = String::new();
    out.push_str("#!/bin/bash\n");
    if !ids.is_empty() {
        out.push_str(&format!("#PBS -J 0-{}\n", ids.len() - 1));
    }
    out.push_str("#PBS -N spate\n\n");
    out.push_str("case \"$PBS_ARRAY_INDEX\" in\n");

    for (index, id) in ids.iter().enumerate() {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own job list");
        out.push_str(&format!("  {index}) # {id}\n"));
        if let Some(body) = render_body(job, options.engine)? {
            for line in body.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
        out.push_str("    ;;\n");
    }
    out.push_str("esac\n");

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_job_array_with_case_dispatch() {
        let mut w = Workflow::new("w").unwrap();
        w.add_job(
            ["A"],
            ["B"],
            Some("x".to_string()),
            Some("cp $INPUT $OUTPUT".to_string()),
            None,
        )
        .unwrap();

        let opts = ExportOptions {
            outdated_only: false,
            ..ExportOptions::default()
        };
        let text = to_torque(&w, &opts).unwrap();
        assert!(text.contains("#PBS -J 0-0\n"));
        assert!(text.contains("  0) # x\n    cp A B\n    ;;\n"));
    }

    #[test]
    fn empty_workflow_omits_array_range() {
        let w = Workflow::new("w").unwrap();
        let text = to_torque(&w, &ExportOptions::default()).unwrap();
        assert!(!text.contains("#PBS -J"));
    }
}
