//! Dependency-graph validation: duplicate ids, dangling references,
//! cycle detection and entry-point analysis, plus a deterministic
//! topological order when the graph is sound.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use preflight_types::workflow::WorkflowSpec;

use super::{ValidationError, ValidationErrorKind, ValidationWarning, ValidationWarningKind};

/// Outcome of topology validation.
///
/// `topological_order` is present exactly when no errors were found; it
/// lists every task id in a valid execution order, seeded and tie-broken
/// by declaration order so the result is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topological_order: Option<Vec<String>>,
}

/// Validate the dependency topology of a workflow.
///
/// All findings are collected; the first error does not stop the pass.
pub fn validate_topology(spec: &WorkflowSpec) -> TopologyReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Duplicate task ids. First declaration wins for graph construction.
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (pos, task) in spec.tasks.iter().enumerate() {
        if index.contains_key(task.id.as_str()) {
            errors.push(ValidationError {
                kind: ValidationErrorKind::InvalidTask,
                task_id: Some(task.id.clone()),
                message: format!("duplicate task id '{}'", task.id),
            });
        } else {
            index.insert(task.id.as_str(), pos);
        }
    }

    // Dangling references: dependency-map keys and values must both name
    // declared tasks.
    let mut keys: Vec<&String> = spec.dependencies.keys().collect();
    keys.sort();
    for key in keys {
        if !index.contains_key(key.as_str()) {
            errors.push(ValidationError {
                kind: ValidationErrorKind::MissingDependency,
                task_id: Some(key.clone()),
                message: format!("dependency map references unknown task '{key}'"),
            });
        }
    }
    for task in &spec.tasks {
        for dep in spec.dependencies_of(&task.id) {
            if !index.contains_key(dep.as_str()) {
                errors.push(ValidationError {
                    kind: ValidationErrorKind::MissingDependency,
                    task_id: Some(task.id.clone()),
                    message: format!("task '{}' depends on unknown task '{dep}'", task.id),
                });
            }
        }
    }

    // Graph with nodes in declaration order, edges dep -> dependent.
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(spec.tasks.len(), 0);
    let nodes: Vec<NodeIndex> = spec.tasks.iter().map(|t| graph.add_node(t.id.as_str())).collect();
    for task in &spec.tasks {
        let Some(&to) = index.get(task.id.as_str()) else {
            continue;
        };
        for dep in spec.dependencies_of(&task.id) {
            if let Some(&from) = index.get(dep.as_str()) {
                graph.add_edge(nodes[from], nodes[to], ());
            }
        }
    }

    detect_cycles(spec, &index, &mut errors);

    // Entry points: tasks with no resolvable dependencies.
    let roots: Vec<&str> = spec
        .tasks
        .iter()
        .filter(|t| {
            index.get(t.id.as_str()).is_some_and(|&pos| {
                graph
                    .neighbors_directed(nodes[pos], Direction::Incoming)
                    .next()
                    .is_none()
            })
        })
        .map(|t| t.id.as_str())
        .collect();

    if roots.is_empty() && !spec.tasks.is_empty() {
        errors.push(ValidationError {
            kind: ValidationErrorKind::InvalidTask,
            task_id: None,
            message: "workflow has no entry point; every task has dependencies".to_string(),
        });
    } else if roots.len() > 1 {
        warnings.push(ValidationWarning {
            kind: ValidationWarningKind::MultipleEntryPoints,
            task_id: None,
            message: format!("workflow has {} entry points: {}", roots.len(), roots.join(", ")),
            remediation: Some(
                "consider a single entry task so execution order is unambiguous".to_string(),
            ),
        });
    }

    let topological_order = if errors.is_empty() {
        Some(kahn_order(spec, &graph, &nodes))
    } else {
        None
    };

    debug!(
        workflow = %spec.id,
        errors = errors.len(),
        warnings = warnings.len(),
        "topology validation finished"
    );

    TopologyReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        topological_order,
    }
}

/// Depth-first cycle search over the dependency edges.
///
/// Tasks are visited in declaration order; each back edge into the
/// recursion stack yields one error naming the task that closes the
/// cycle, so distinct cycles are each reported exactly once.
fn detect_cycles(
    spec: &WorkflowSpec,
    index: &HashMap<&str, usize>,
    errors: &mut Vec<ValidationError>,
) {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: HashSet<&str> = HashSet::new();

    fn dfs<'a>(
        spec: &'a WorkflowSpec,
        index: &HashMap<&str, usize>,
        task_id: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut HashSet<&'a str>,
        errors: &mut Vec<ValidationError>,
    ) {
        visited.insert(task_id);
        stack.insert(task_id);
        for dep in spec.dependencies_of(task_id) {
            if !index.contains_key(dep.as_str()) {
                continue;
            }
            if stack.contains(dep.as_str()) {
                errors.push(ValidationError {
                    kind: ValidationErrorKind::Cycle,
                    task_id: Some(task_id.to_string()),
                    message: format!(
                        "dependency cycle detected: task '{task_id}' reaches back to '{dep}'"
                    ),
                });
            } else if !visited.contains(dep.as_str()) {
                dfs(spec, index, dep, visited, stack, errors);
            }
        }
        stack.remove(task_id);
    }

    for task in &spec.tasks {
        if !visited.contains(task.id.as_str()) && index.contains_key(task.id.as_str()) {
            dfs(spec, index, &task.id, &mut visited, &mut stack, errors);
        }
    }
}

/// Kahn's algorithm with declaration-order tie-breaking.
///
/// Only called on an error-free graph, so the order always covers every
/// task.
fn kahn_order(spec: &WorkflowSpec, graph: &DiGraph<&str, ()>, nodes: &[NodeIndex]) -> Vec<String> {
    let mut in_degree: HashMap<NodeIndex, usize> = nodes
        .iter()
        .map(|&n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    let mut queue: VecDeque<NodeIndex> = nodes
        .iter()
        .copied()
        .filter(|n| in_degree[n] == 0)
        .collect();

    let mut order = Vec::with_capacity(spec.tasks.len());
    while let Some(node) = queue.pop_front() {
        order.push(graph[node].to_string());
        let mut freed: Vec<NodeIndex> = Vec::new();
        for dependent in graph.neighbors_directed(node, Direction::Outgoing) {
            let degree = in_degree
                .entry(dependent)
                .and_modify(|d| *d -= 1)
                .or_default();
            if *degree == 0 {
                freed.push(dependent);
            }
        }
        // Neighbor iteration order is an implementation detail of the
        // graph; re-sort freed nodes by declaration position.
        freed.sort();
        queue.extend(freed);
    }
    order
}
