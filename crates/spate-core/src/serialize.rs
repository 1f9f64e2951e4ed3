//! Deterministic textual (de)serialization of a [`Workflow`] (spec.md §4.5).
//!
//! The on-disk shape is a YAML document: workflow name, then jobs in
//! topological order with paths in job-declaration order. A `.gz` file
//! suffix transparently gzip-compresses the same document (spec.md §6).

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{TimeZone, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpateError};
use crate::job::Job;
use crate::workflow::Workflow;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    name: String,
    jobs: Vec<JobDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JobDocument {
    id: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_yaml::Value>,
    created_at: i64,
}

fn io_err(path: &Path, source: std::io::Error) -> SpateError {
    SpateError::FilesystemError {
        path: path.display().to_string(),
        source,
    }
}

/// Renders a workflow to its canonical YAML document text.
pub fn to_document(workflow: &Workflow) -> Result<String> {
    let order = workflow.list_jobs(None)?;
    let jobs = order
        .iter()
        .map(|id| {
            let job = workflow
                .get_job(id)
                .expect("id came from this workflow's own job list");
            JobDocument {
                id: job.identifier.clone(),
                inputs: job.inputs.clone(),
                outputs: job.outputs.clone(),
                template: job.template.clone(),
                data: job.data.clone(),
                created_at: job.created_at.timestamp_millis(),
            }
        })
        .collect();

    let document = Document {
        name: workflow.name().to_string(),
        jobs,
    };
    serde_yaml::to_string(&document).map_err(|e| SpateError::SerializationError(e.to_string()))
}

/// Parses a workflow from document text, re-validating all six structural
/// invariants on reload.
pub fn from_document(text: &str) -> Result<Workflow> {
    let document: Document =
        serde_yaml::from_str(text).map_err(|e| SpateError::SerializationError(e.to_string()))?;

    let mut workflow = Workflow::new(document.name)?;
    let mut seen_ids = std::collections::HashSet::new();
    for job_doc in document.jobs {
        if !seen_ids.insert(job_doc.id.clone()) {
            return Err(SpateError::DuplicateJob(job_doc.id));
        }
        let created_at = Utc
            .timestamp_millis_opt(job_doc.created_at)
            .single()
            .ok_or_else(|| {
                SpateError::SerializationError(format!(
                    "job '{}' has an invalid created_at timestamp",
                    job_doc.id
                ))
            })?;
        workflow.register_job(Job {
            identifier: job_doc.id,
            inputs: job_doc.inputs,
            outputs: job_doc.outputs,
            template: job_doc.template,
            data: job_doc.data,
            created_at,
        })?;
    }
    workflow.validate()?;
    Ok(workflow)
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Saves a workflow to `path`, transparently gzipping when the path ends in
/// `.gz`.
pub fn save(workflow: &Workflow, path: &Path) -> Result<()> {
    let text = to_document(workflow)?;
    if is_gzip_path(path) {
        let file = fs::File::create(path).map_err(|e| io_err(path, e))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(text.as_bytes())
            .map_err(|e| io_err(path, e))?;
        encoder.finish().map_err(|e| io_err(path, e))?;
    } else {
        fs::write(path, text).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

/// Loads a workflow from `path`, transparently decompressing when the path
/// ends in `.gz`.
pub fn load(path: &Path) -> Result<Workflow> {
    let text = if is_gzip_path(path) {
        let file = fs::File::open(path).map_err(|e| io_err(path, e))?;
        let mut decoder = GzDecoder::new(file);
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .map_err(|e| io_err(path, e))?;
        text
    } else {
        fs::read_to_string(path).map_err(|e| io_err(path, e))?
    };
    from_document(&text)
}
