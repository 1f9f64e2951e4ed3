//! Plain shell script export: sequential execution in topological order,
//! each job's body separated by an `# <id>` comment (spec.md §6).

use super::{job_list, render_body, ExportOptions};
use crate::error::Result;
use crate::workflow::Workflow;

pub fn to_shell(workflow: &Workflow, options: &ExportOptions) -> Result<String> {
    let ids = job_list(workflow, options.outdated_only)?;

    let mut out = String::new();
    out.push_str(&options.shebang);
    out.push_str("\nset -e\n\n");

    for id in &ids {
        let job = workflow
            .get_job(id)
            .expect("id came from this workflow's own job list");
        out.push_str(&format!("# {id}\n"));
        if let Some(body) = render_body(job, options.engine)? {
            out.push_str(&body);
            if !body.ends_with('\n') {
                out.push('\n');
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
    fn renders_shebang_and_job_comments_in_order() {
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
        let text = to_shell(&w, &opts).unwrap();
        assert!(text.starts_with("#!/bin/bash\nset -e\n\n"));
        assert!(text.contains("# x\ncp A B\n"));
    }

    #[test]
    fn custom_shebang_is_honored() {
        let mut w = Workflow::new("w").unwrap();
        w.add_job(["A"], ["B"], Some("x".to_string()), None, None)
            .unwrap();

        let opts = ExportOptions {
            outdated_only: false,
            shebang: "#!/bin/sh".to_string(),
            ..ExportOptions::default()
        };
        let text = to_shell(&w, &opts).unwrap();
        assert!(text.starts_with("#!/bin/sh\n"));
    }
}
