//! GNU Make export: one rule per job, outputs as targets and inputs as
//! prerequisites, with a phony `all` depending on every terminal output
//! (spec.md §6). Make decides staleness itself, so this target never
//! filters to the outdated set.

use super::{job_list, render_body, terminal_outputs, ExportOptions};
use crate::error::Result;
use crate::workflow::Workflow;

pub fn to_make(workflow: &Workflow, options: &ExportOptions) -> Result<String> {
    let ids = job_list(workflow, false)?;
    let terminals = terminal_outputs(workflow);

    let mut phony: Vec<String> = vec!["all".to_string()];
    let mut out = String::new();

    let mut rules = String::new();
    for id in &ids {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own job list");
        let targets = if job.outputs.is_empty() {
            phony.push(id.clone());
            id.clone()
        } else {
            job.outputs.join(" ")
        };
        let prereqs = job.inputs.join(" ");
        rules.push_str(&format!("{targets}: {prereqs}\n"));
        if let Some(body) = render_body(job, options.engine)? {
            for line in body.lines() {
                rules.push_str(&format!("\t{line}\n"));
            }
        }
        rules.push('\n');
    }

    out.push_str(&format!(".PHONY: {}\n", phony.join(" ")));
    out.push_str(&format!("all: {}\n\n", terminals.join(" ")));
    out.push_str(&rules);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_phony_all_and_rule_per_job() {
        let mut w = Workflow::new("w").unwrap();
        w.add_job(
            ["A"],
            ["B", "C"],
            Some("x".to_string()),
            Some("produce $OUTPUTS".to_string()),
            None,
        )
        .unwrap();
        w.add_job(["A", "C"], ["D"], Some("y".to_string()), None, None)
            .unwrap();

        let text = to_make(&w, &ExportOptions::default()).unwrap();
        assert!(text.starts_with(".PHONY: all\n"));
        assert!(text.contains("all: B D\n\n"));
        assert!(text.contains("B C: A\n\tproduce B C\n"));
        assert!(text.contains("D: A C\n"));
    }

    #[test]
    fn sink_job_uses_identifier_as_phony_target() {
        let mut w = Workflow::new("w").unwrap();
        w.add_job(
            ["A"],
            Vec::<String>::new(),
            Some("archive".to_string()),
            None,
            None,
        )
        .unwrap();

        let text = to_make(&w, &ExportOptions::default()).unwrap();
        assert!(text.contains(".PHONY: all archive\n"));
        assert!(text.contains("archive: A\n"));
    }
}
