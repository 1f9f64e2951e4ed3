//! Drake export: one step per job, `out1, out2 <- in1, in2 [shell]` with a
//! two-space-indented body (spec.md §6).

use super::{job_list, render_body, ExportOptions};
use crate::error::Result;
use crate::workflow::Workflow;

pub fn to_drake(workflow: &Workflow, options: &ExportOptions) -> Result<String> {
    let ids = job_list(workflow, false)?;

    let mut out = String::new();
    for id in &ids {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own job list");
        let targets = job.outputs.join(", ");
        let sources = job.inputs.join(", ");
        out.push_str(&format!("{targets} <- {sources} [shell]\n"));
        if let Some(body) = render_body(job, options.engine)? {
            for line in body.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_arrow_step_with_shell_tag() {
        let mut w = Workflow::new("w").unwrap();
        w.add_job(
            ["A", "C"],
            ["D"],
            Some("y".to_string()),
            Some("merge $INPUTS > $OUTPUT".to_string()),
            None,
        )
        .unwrap();

        let text = to_drake(&w, &ExportOptions::default()).unwrap();
        assert_eq!(text, "D <- A, C [shell]\n  merge A C > D\n\n");
    }
}
