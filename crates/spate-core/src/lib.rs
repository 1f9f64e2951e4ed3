//! Core library for composing file-based workflows into a bipartite DAG of
//! jobs and paths, analyzing filesystem outdatedness, and exporting to one
//! of several external execution environments.

pub mod echo;
pub mod error;
pub mod export;
pub mod job;
pub mod outdated;
pub mod path;
pub mod serialize;
pub mod template;
pub mod workflow;

pub use echo::{echo, EchoOptions};
pub use error::{Result, SpateError};
pub use export::ExportOptions;
pub use job::Job;
pub use path::PathList;
pub use template::EngineKind;
pub use workflow::Workflow;
