//! The bipartite DAG of jobs and paths: mutation, invariants, topological
//! ordering, and merging (spec.md §3–§4.1).

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use indexmap::IndexMap;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::error::{Result, SpateError};
use crate::job::Job;
use crate::path::{normalize, PathEntry, PathList};

/// A named collection of jobs and the paths they reference, maintained as a
/// bipartite DAG with the six structural invariants of spec.md §3.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    jobs: IndexMap<String, Job>,
    paths: IndexMap<String, PathEntry>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SpateError::InvalidName("name must not be empty".to_string()));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(SpateError::InvalidName(format!(
            "name '{name}' contains control characters"
        )));
    }
    Ok(())
}

impl Workflow {
    /// Creates an empty, named workflow.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Workflow {
            name,
            jobs: IndexMap::new(),
            paths: IndexMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_of_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn number_of_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn has_job(&self, identifier: &str) -> bool {
        self.jobs.contains_key(identifier)
    }

    pub fn get_job(&self, identifier: &str) -> Option<&Job> {
        self.jobs.get(identifier)
    }

    /// Paths in the order they were first inserted.
    pub fn list_paths(&self) -> Vec<String> {
        self.paths.keys().cloned().collect()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// The single job that produces `path`, if any.
    pub fn producer_of(&self, path: &str) -> Option<&str> {
        self.paths
            .get(path)?
            .producers
            .iter()
            .next()
            .map(|s| s.as_str())
    }

    fn fresh_identifier(&self) -> String {
        let mut k = 0usize;
        loop {
            let candidate = format!("job_{k}");
            if !self.jobs.contains_key(&candidate) {
                return candidate;
            }
            k += 1;
        }
    }

    /// Adds a job. `inputs` and `outputs` accept a single path or an
    /// ordered sequence via [`PathList`]. See spec.md §4.1 for the full
    /// contract and error taxonomy.
    pub fn add_job(
        &mut self,
        inputs: impl Into<PathList>,
        outputs: impl Into<PathList>,
        identifier: Option<String>,
        template: Option<String>,
        data: Option<serde_yaml::Value>,
    ) -> Result<String> {
        let inputs = inputs.into().into_normalized()?;
        let outputs = outputs.into().into_normalized()?;

        let identifier = match identifier {
            Some(id) => {
                validate_name(&id)?;
                if self.jobs.contains_key(&id) {
                    return Err(SpateError::DuplicateJob(id));
                }
                id
            }
            None => self.fresh_identifier(),
        };

        if inputs.is_empty() && outputs.is_empty() {
            return Err(SpateError::EmptyJob { identifier });
        }

        check_no_duplicates(&identifier, &inputs, &outputs)?;

        for output in &outputs {
            if let Some(entry) = self.paths.get(output) {
                if let Some(existing) = entry.producers.iter().next() {
                    return Err(SpateError::DoubleProducer {
                        path: output.clone(),
                        existing_producer: existing.clone(),
                    });
                }
            }
        }

        // Validate acyclicity of the prospective graph before committing
        // anything (spec.md §4.1: "a candidate edge set is computed before
        // mutation; the workflow is left untouched if any cycle would
        // appear").
        self.check_cycle_for_candidate(&identifier, &inputs, &outputs)?;

        for input in &inputs {
            self.paths
                .entry(input.clone())
                .or_default()
                .consumers
                .insert(identifier.clone());
        }
        for output in &outputs {
            self.paths
                .entry(output.clone())
                .or_default()
                .producers
                .insert(identifier.clone());
        }

        self.jobs.insert(
            identifier.clone(),
            Job {
                identifier: identifier.clone(),
                inputs,
                outputs,
                template,
                data,
                created_at: Utc::now(),
            },
        );

        debug!(job = %identifier, "added job");
        Ok(identifier)
    }

    /// Removes a job and drops any path left with neither producer nor
    /// consumer.
    pub fn remove_job(&mut self, identifier: &str) -> Result<Job> {
        let job = self
            .jobs
            .shift_remove(identifier)
            .ok_or_else(|| SpateError::UnknownJob(identifier.to_string()))?;

        for input in &job.inputs {
            if let Some(entry) = self.paths.get_mut(input) {
                entry.consumers.remove(identifier);
            }
        }
        for output in &job.outputs {
            if let Some(entry) = self.paths.get_mut(output) {
                entry.producers.remove(identifier);
            }
        }

        let orphaned: Vec<String> = self
            .paths
            .iter()
            .filter(|(_, entry)| entry.is_orphaned())
            .map(|(path, _)| path.clone())
            .collect();
        for path in orphaned {
            self.paths.shift_remove(&path);
        }

        debug!(job = %identifier, "removed job");
        Ok(job)
    }

    /// Every job, topologically ordered with ties broken by
    /// `(created_at asc, identifier asc)`. When `outdated` is provided, the
    /// result is filtered to jobs present in that set — callers pass the
    /// transitively-closed output of the outdatedness analyzer.
    pub fn list_jobs(&self, outdated: Option<&HashSet<String>>) -> Result<Vec<String>> {
        let order = self.topological_order()?;
        Ok(match outdated {
            Some(set) => order.into_iter().filter(|id| set.contains(id)).collect(),
            None => order,
        })
    }

    /// The job-level graph's adjacency: producer job id -> consumer job ids,
    /// derived from shared paths.
    fn job_adjacency(&self) -> HashMap<&str, Vec<&str>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = self
            .jobs
            .keys()
            .map(|id| (id.as_str(), Vec::new()))
            .collect();
        for entry in self.paths.values() {
            for producer in &entry.producers {
                for consumer in &entry.consumers {
                    adjacency.get_mut(producer.as_str()).unwrap().push(consumer.as_str());
                }
            }
        }
        adjacency
    }

    /// Kahn's algorithm with wave-local tiebreaking, as spec.md §4.1
    /// specifies: layers in dependency order, and within a layer jobs sort
    /// by `(created_at, identifier)`.
    fn topological_order(&self) -> Result<Vec<String>> {
        let adjacency = self.job_adjacency();
        let mut in_degree: HashMap<&str, usize> =
            self.jobs.keys().map(|id| (id.as_str(), 0)).collect();
        for consumers in adjacency.values() {
            for consumer in consumers {
                *in_degree.get_mut(consumer).unwrap() += 1;
            }
        }

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.jobs.len());
        while !ready.is_empty() {
            ready.sort_by_key(|id| {
                let job = &self.jobs[*id];
                (job.created_at, job.identifier.clone())
            });
            let wave = std::mem::take(&mut ready);
            for id in wave {
                order.push(id.to_string());
                for &dependent in &adjacency[id] {
                    let degree = in_degree.get_mut(dependent).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(dependent);
                    }
                }
            }
        }

        if order.len() != self.jobs.len() {
            return Err(SpateError::Cycle(
                "workflow graph contains a cycle".to_string(),
            ));
        }
        Ok(order)
    }

    /// Checks whether adding a job with the given (already-normalized)
    /// inputs/outputs would introduce a cycle, without mutating `self`.
    fn check_cycle_for_candidate(
        &self,
        identifier: &str,
        inputs: &[String],
        outputs: &[String],
    ) -> Result<()> {
        let mut adjacency = self.job_adjacency();

        // Predecessors: existing producers of our inputs feed into us.
        for input in inputs {
            if let Some(entry) = self.paths.get(input) {
                for producer in &entry.producers {
                    adjacency.get_mut(producer.as_str()).unwrap().push(identifier);
                }
            }
        }
        // Successors: existing consumers of our outputs depend on us.
        let mut our_out_edges = Vec::new();
        for output in outputs {
            if let Some(entry) = self.paths.get(output) {
                for consumer in &entry.consumers {
                    our_out_edges.push(consumer.as_str());
                }
            }
        }
        adjacency.insert(identifier, our_out_edges);

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for &id in adjacency.keys() {
            graph.add_node(id);
        }
        for (&from, tos) in &adjacency {
            for &to in tos {
                graph.add_edge(from, to, ());
            }
        }

        if is_cyclic_directed(&graph) {
            return Err(SpateError::Cycle(identifier.to_string()));
        }
        Ok(())
    }

    /// Re-checks all six structural invariants against the current state.
    /// Useful after loading a hand-edited document.
    pub fn validate(&self) -> Result<()> {
        for job in self.jobs.values() {
            check_no_duplicates(&job.identifier, &job.inputs, &job.outputs)?;
            if job.inputs.is_empty() && job.outputs.is_empty() {
                return Err(SpateError::EmptyJob {
                    identifier: job.identifier.clone(),
                });
            }
        }

        let mut producers: HashMap<&str, &str> = HashMap::new();
        for job in self.jobs.values() {
            for output in &job.outputs {
                if let Some(existing) = producers.insert(output.as_str(), job.identifier.as_str())
                {
                    return Err(SpateError::DoubleProducer {
                        path: output.clone(),
                        existing_producer: existing.to_string(),
                    });
                }
            }
        }

        self.topological_order()?;
        Ok(())
    }

    /// Unions two workflows. Every job identifier in `b` must be unused in
    /// `a`; the combined graph must still satisfy invariants 1–6. Returns a
    /// new workflow named after `a`; neither input is mutated.
    pub fn merge(a: &Workflow, b: &Workflow) -> Result<Workflow> {
        for id in b.jobs.keys() {
            if a.jobs.contains_key(id) {
                return Err(SpateError::DuplicateJob(id.clone()));
            }
        }

        let mut merged = Workflow {
            name: a.name.clone(),
            jobs: IndexMap::new(),
            paths: IndexMap::new(),
        };
        for job in a.jobs.values().chain(b.jobs.values()) {
            merged.register_job(job.clone())?;
        }
        merged.topological_order()?;
        Ok(merged)
    }

    /// Inserts a job as-is (preserving its `created_at`), registering its
    /// paths. Used by `merge` and the serializer, which need to reconstruct
    /// jobs exactly rather than re-derive timestamps.
    pub(crate) fn register_job(&mut self, job: Job) -> Result<()> {
        for output in &job.outputs {
            if let Some(entry) = self.paths.get(output) {
                if let Some(existing) = entry.producers.iter().next() {
                    return Err(SpateError::DoubleProducer {
                        path: output.clone(),
                        existing_producer: existing.clone(),
                    });
                }
            }
        }
        for input in &job.inputs {
            self.paths
                .entry(input.clone())
                .or_default()
                .consumers
                .insert(job.identifier.clone());
        }
        for output in &job.outputs {
            self.paths
                .entry(output.clone())
                .or_default()
                .producers
                .insert(job.identifier.clone());
        }
        self.jobs.insert(job.identifier.clone(), job);
        Ok(())
    }
}

fn check_no_duplicates(identifier: &str, inputs: &[String], outputs: &[String]) -> Result<()> {
    let mut seen_inputs = HashSet::new();
    for input in inputs {
        if !seen_inputs.insert(input.as_str()) {
            return Err(SpateError::DuplicatePath {
                job: identifier.to_string(),
                path: input.clone(),
            });
        }
    }
    let mut seen_outputs = HashSet::new();
    for output in outputs {
        if !seen_outputs.insert(output.as_str()) {
            return Err(SpateError::DuplicatePath {
                job: identifier.to_string(),
                path: output.clone(),
            });
        }
        if seen_inputs.contains(output.as_str()) {
            return Err(SpateError::DuplicatePath {
                job: identifier.to_string(),
                path: output.clone(),
            });
        }
    }
    Ok(())
}
