//! Static workflow verification.
//!
//! Three independent passes over a parsed [`WorkflowSpec`]: dependency
//! topology ([`topology`]), safety policy ([`policy`]) and CRV gate
//! coverage ([`crv`]). Each pass returns a structured report; none of
//! them mutates the spec or talks to the outside world.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use preflight_types::testing::TestCase;
use preflight_types::workflow::WorkflowSpec;

pub mod crv;
pub mod policy;
pub mod topology;

/// Failure to load or parse a workflow or test-case document.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// Classifies a blocking topology finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Cycle,
    MissingDependency,
    InvalidTask,
}

/// Classifies an advisory topology or coverage finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationWarningKind {
    MultipleEntryPoints,
    MissingCrvGate,
}

/// A finding that renders the workflow undeployable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub message: String,
}

/// An advisory finding; the workflow can still deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub kind: ValidationWarningKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Parse a workflow specification from YAML text.
pub fn parse_workflow_yaml(yaml: &str) -> Result<WorkflowSpec, SpecError> {
    serde_yaml_ng::from_str(yaml).map_err(|source| SpecError::Parse {
        what: "workflow spec",
        source,
    })
}

/// Parse a test case from YAML text.
pub fn parse_test_case_yaml(yaml: &str) -> Result<TestCase, SpecError> {
    serde_yaml_ng::from_str(yaml).map_err(|source| SpecError::Parse {
        what: "test case",
        source,
    })
}

/// Load and parse a workflow specification from a YAML file.
pub fn load_workflow(path: &Path) -> Result<WorkflowSpec, SpecError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_workflow_yaml(&yaml)
}

/// Parse a workflow spec and immediately validate its topology.
pub fn parse_and_validate_workflow(
    yaml: &str,
) -> Result<(WorkflowSpec, topology::TopologyReport), SpecError> {
    let spec = parse_workflow_yaml(yaml)?;
    let report = topology::validate_topology(&spec);
    Ok((spec, report))
}

/// Load and parse a test case from a YAML file.
pub fn load_test_case(path: &Path) -> Result<TestCase, SpecError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_test_case_yaml(&yaml)
}
