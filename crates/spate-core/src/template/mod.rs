//! Pluggable template substitution engines and the per-job variable
//! environment they render against (spec.md §4.3).

mod mustache;
mod simple;

use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};

use crate::error::Result;
use crate::job::Job;

/// A rendered variable: either a single string or an ordered list, the
/// latter usable by engines that support list iteration.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

/// The variable environment derived from one job's inputs and outputs
/// (spec.md §4.3's table).
#[derive(Debug, Clone, Default)]
pub struct Environment(BTreeMap<String, Value>);

impl Environment {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_scalar(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(Value::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        match self.0.get(name) {
            Some(Value::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }
}

fn insert_side(env: &mut BTreeMap<String, Value>, prefix: &str, paths: &[String]) {
    env.insert(
        prefix.to_string(),
        Value::Scalar(paths.first().cloned().unwrap_or_default()),
    );
    for (n, path) in paths.iter().enumerate() {
        env.insert(format!("{prefix}{n}"), Value::Scalar(path.clone()));
    }
    env.insert(format!("{prefix}S"), Value::List(paths.to_vec()));
    env.insert(format!("{prefix}N"), Value::Scalar(paths.len().to_string()));
}

/// Builds the variable environment for a job from its inputs and outputs.
pub fn job_environment(job: &Job) -> Environment {
    let mut map = BTreeMap::new();
    insert_side(&mut map, "INPUT", &job.inputs);
    insert_side(&mut map, "OUTPUT", &job.outputs);
    Environment(map)
}

/// The active substitution strategy.
pub trait TemplateEngine {
    fn render(&self, template: &str, env: &Environment) -> Result<String>;
}

/// Selects one of the two built-in engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    #[default]
    Simple,
    Mustache,
}

impl TemplateEngine for EngineKind {
    fn render(&self, template: &str, env: &Environment) -> Result<String> {
        match self {
            EngineKind::Simple => simple::SimpleEngine.render(template, env),
            EngineKind::Mustache => mustache::MustacheEngine.render(template, env),
        }
    }
}

static PROCESS_DEFAULT: OnceLock<Mutex<EngineKind>> = OnceLock::new();

fn default_slot() -> &'static Mutex<EngineKind> {
    PROCESS_DEFAULT.get_or_init(|| Mutex::new(EngineKind::default()))
}

/// Reads the process-wide default engine (spec.md §9: a convenience default,
/// not the sole source of truth — callers that want determinism under
/// concurrent mutation should pass an explicit `EngineKind` instead).
pub fn default_engine() -> EngineKind {
    *default_slot().lock().unwrap_or_else(|e| e.into_inner())
}

/// Sets the process-wide default engine. Swapping engines mid-export is
/// undefined; exporters snapshot the engine at call entry.
pub fn set_default_engine(kind: EngineKind) {
    *default_slot().lock().unwrap_or_else(|e| e.into_inner()) = kind;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job(inputs: &[&str], outputs: &[&str]) -> Job {
        Job {
            identifier: "j".to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            template: None,
            data: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn environment_exposes_scalars_lists_and_counts() {
        let env = job_environment(&job(&["A", "C"], &["D"]));
        assert_eq!(env.get_scalar("INPUT"), Some("A"));
        assert_eq!(env.get_scalar("INPUT0"), Some("A"));
        assert_eq!(env.get_scalar("INPUT1"), Some("C"));
        assert_eq!(env.get_list("INPUTS"), Some(&["A".to_string(), "C".to_string()][..]));
        assert_eq!(env.get_scalar("INPUTN"), Some("2"));
        assert_eq!(env.get_scalar("OUTPUT"), Some("D"));
        assert_eq!(env.get_scalar("OUTPUTN"), Some("1"));
    }

    #[test]
    fn environment_handles_empty_side() {
        let env = job_environment(&job(&[], &["D"]));
        assert_eq!(env.get_scalar("INPUT"), Some(""));
        assert_eq!(env.get_scalar("INPUTN"), Some("0"));
    }

    #[test]
    fn default_engine_round_trips() {
        set_default_engine(EngineKind::Mustache);
        assert_eq!(default_engine(), EngineKind::Mustache);
        set_default_engine(EngineKind::Simple);
        assert_eq!(default_engine(), EngineKind::Simple);
    }
}
