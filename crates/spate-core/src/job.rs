//! Job metadata: identifier, template, user payload, ordered paths, and a
//! creation timestamp used as a tiebreak during topological ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single job: a node in the bipartite DAG connecting input paths to
/// output paths via a (possibly absent) command template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub identifier: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_yaml::Value>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// A job with no template is *abstract*: structural only, nothing to
    /// render.
    pub fn is_abstract(&self) -> bool {
        self.template.is_none()
    }
}
