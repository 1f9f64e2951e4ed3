//! The single error family returned by every fallible operation in this crate.

use std::io;

/// The canonical error type for workflow construction, rendering, analysis,
/// and (de)serialization failures.
#[derive(Debug, thiserror::Error)]
pub enum SpateError {
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("job '{identifier}' has neither inputs nor outputs")]
    EmptyJob { identifier: String },

    #[error("job identifier '{0}' is already in use")]
    DuplicateJob(String),

    #[error("unknown job '{0}'")]
    UnknownJob(String),

    #[error("path '{path}' appears more than once in job '{job}'")]
    DuplicatePath { job: String, path: String },

    #[error("path '{path}' is already produced by job '{existing_producer}'")]
    DoubleProducer {
        path: String,
        existing_producer: String,
    },

    #[error("adding job '{0}' would introduce a cycle")]
    Cycle(String),

    #[error("template error: {0}")]
    TemplateError(String),

    #[error("filesystem error on '{path}': {source}")]
    FilesystemError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, SpateError>;
