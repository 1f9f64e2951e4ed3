use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, ExitCode, Stdio};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spate_core::export::{drake, makeflow, makefile, sbatch, shell, torque, ExportOptions};
use spate_core::{echo as echo_workflow, serialize, EchoOptions, Result, Workflow};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty workflow and save it to a file
    Init { name: String, file: PathBuf },
    /// Parse and validate a workflow file, printing a summary
    Load { file: PathBuf },
    /// Print a human-readable view of the workflow
    Echo {
        file: PathBuf,
        #[arg(long)]
        colorized: bool,
        #[arg(long)]
        decorated: bool,
        #[arg(long = "outdated-only")]
        outdated_only: bool,
    },
    /// Pipe a graph description of the workflow to an external layout program
    Draw {
        file: PathBuf,
        #[arg(long = "layout-program", default_value = "dot")]
        layout_program: String,
    },
    /// Export to a plain shell script
    ToShell {
        file: PathBuf,
        #[arg(long, default_value = "#!/bin/bash")]
        shebang: String,
        #[arg(long = "outdated-only")]
        outdated_only: bool,
    },
    /// Export to a GNU Makefile
    ToMake { file: PathBuf },
    /// Export to a Makeflow file
    ToMakeflow { file: PathBuf },
    /// Export to a Drake workflow
    ToDrake { file: PathBuf },
    /// Export to a SLURM sbatch driver script
    ToSbatch {
        file: PathBuf,
        #[arg(long = "outdated-only")]
        outdated_only: bool,
    },
    /// Export to a TORQUE/PBS job array script
    ToTorque {
        file: PathBuf,
        #[arg(long = "outdated-only")]
        outdated_only: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Init { name, file } => {
            let workflow = Workflow::new(name)?;
            serialize::save(&workflow, &file)?;
            println!(
                "Created empty workflow '{}' at {}",
                workflow.name(),
                file.display()
            );
        }
        Commands::Load { file } => {
            let workflow = serialize::load(&file)?;
            println!(
                "Loaded workflow '{}': {} jobs, {} paths",
                workflow.name(),
                workflow.number_of_jobs(),
                workflow.number_of_paths()
            );
        }
        Commands::Echo {
            file,
            colorized,
            decorated,
            outdated_only,
        } => {
            let workflow = serialize::load(&file)?;
            let options = EchoOptions {
                colorized,
                decorated,
                outdated_only,
            };
            print!("{}", echo_workflow(&workflow, &options)?);
        }
        Commands::Draw {
            file,
            layout_program,
        } => {
            let workflow = serialize::load(&file)?;
            draw(&workflow, &layout_program)?;
        }
        Commands::ToShell {
            file,
            shebang,
            outdated_only,
        } => {
            let workflow = serialize::load(&file)?;
            let options = ExportOptions {
                outdated_only,
                shebang,
                ..ExportOptions::default()
            };
            print!("{}", shell::to_shell(&workflow, &options)?);
        }
        Commands::ToMake { file } => {
            let workflow = serialize::load(&file)?;
            print!("{}", makefile::to_make(&workflow, &ExportOptions::default())?);
        }
        Commands::ToMakeflow { file } => {
            let workflow = serialize::load(&file)?;
            print!(
                "{}",
                makeflow::to_makeflow(&workflow, &ExportOptions::default())?
            );
        }
        Commands::ToDrake { file } => {
            let workflow = serialize::load(&file)?;
            print!("{}", drake::to_drake(&workflow, &ExportOptions::default())?);
        }
        Commands::ToSbatch {
            file,
            outdated_only,
        } => {
            let workflow = serialize::load(&file)?;
            let options = ExportOptions {
                outdated_only,
                ..ExportOptions::default()
            };
            print!("{}", sbatch::to_sbatch(&workflow, &options)?);
        }
        Commands::ToTorque {
            file,
            outdated_only,
        } => {
            let workflow = serialize::load(&file)?;
            let options = ExportOptions {
                outdated_only,
                ..ExportOptions::default()
            };
            print!("{}", torque::to_torque(&workflow, &options)?);
        }
    }
    Ok(())
}

/// Renders the bipartite job/path graph as a plain `digraph { ... }`
/// description and pipes it through an external layout program, copying its
/// stdout through unmodified.
fn draw(workflow: &Workflow, layout_program: &str) -> Result<()> {
    let description = graph_description(workflow);

    let mut child = Command::new(layout_program)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .spawn()
        .map_err(|e| spate_core::SpateError::FilesystemError {
            path: layout_program.to_string(),
            source: e,
        })?;

    child
        .stdin
        .as_mut()
        .expect("stdin was piped")
        .write_all(description.as_bytes())
        .map_err(|e| spate_core::SpateError::FilesystemError {
            path: layout_program.to_string(),
            source: e,
        })?;

    child
        .wait()
        .map_err(|e| spate_core::SpateError::FilesystemError {
            path: layout_program.to_string(),
            source: e,
        })?;
    Ok(())
}

fn graph_description(workflow: &Workflow) -> String {
    let mut out = String::from("digraph {\n");
    for job in workflow.jobs() {
        for input in &job.inputs {
            out.push_str(&format!("  \"{input}\" -> \"{}\";\n", job.identifier));
        }
        for output in &job.outputs {
            out.push_str(&format!("  \"{}\" -> \"{output}\";\n", job.identifier));
        }
    }
    out.push_str("}\n");
    out
}
