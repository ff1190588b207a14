//! `preflight validate` — run all three validators over a workflow spec.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use preflight_core::collaborator::builtin::RuleChecker;
use preflight_core::validator::crv::validate_crv_rules;
use preflight_core::validator::policy::validate_policy;
use preflight_core::validator::topology::validate_topology;
use preflight_core::validator::{ValidationError, ValidationWarning, load_workflow};

/// Run the validators and print findings. Returns whether the workflow
/// is deployable.
pub fn handle_validate(file: &Path, json: bool, quiet: bool) -> Result<bool> {
    let spec = load_workflow(file)
        .with_context(|| format!("failed to load workflow from {}", file.display()))?;

    let topology = validate_topology(&spec);
    let policy = validate_policy(&spec, Some(&RuleChecker), None);
    let crv = validate_crv_rules(&spec);

    let valid = topology.valid && policy.valid;

    if json {
        let out = serde_json::json!({
            "workflow": spec.id,
            "valid": valid,
            "topology": topology,
            "policy": policy,
            "crv": crv,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(valid);
    }
    if quiet {
        return Ok(valid);
    }

    println!();
    println!(
        "  Workflow '{}' ({} tasks)",
        style(&spec.name).cyan(),
        spec.tasks.len()
    );
    println!();

    if !topology.errors.is_empty() || !policy.violations.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Kind").fg(Color::Red),
                Cell::new("Task"),
                Cell::new("Message"),
            ]);
        for error in &topology.errors {
            table.add_row(error_row(error));
        }
        for violation in &policy.violations {
            table.add_row(vec![
                Cell::new(format!("{:?}", violation.kind)),
                Cell::new(violation.task_ids.join(", ")),
                Cell::new(&violation.message),
            ]);
        }
        println!("{table}");
        println!();
    }

    let warnings: Vec<&ValidationWarning> = topology
        .warnings
        .iter()
        .chain(crv.warnings.iter())
        .collect();
    if !warnings.is_empty() || !policy.warnings.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Warning").fg(Color::Yellow),
                Cell::new("Task"),
                Cell::new("Message"),
            ]);
        for warning in warnings {
            table.add_row(vec![
                Cell::new(format!("{:?}", warning.kind)),
                Cell::new(warning.task_id.as_deref().unwrap_or("-")),
                Cell::new(&warning.message),
            ]);
        }
        for warning in &policy.warnings {
            let kind = warning
                .kind
                .map(|k| format!("{k:?}"))
                .unwrap_or_else(|| "Other".to_string());
            table.add_row(vec![
                Cell::new(kind),
                Cell::new(warning.task_ids.join(", ")),
                Cell::new(&warning.message),
            ]);
        }
        println!("{table}");
        println!();
    }

    if let Some(order) = &topology.topological_order {
        println!("  Execution order: {}", style(order.join(" -> ")).dim());
        println!();
    }

    if valid {
        println!("  {} Workflow is deployable", style("*").green().bold());
    } else {
        println!("  {} Workflow is NOT deployable", style("x").red().bold());
    }
    println!();

    Ok(valid)
}

fn error_row(error: &ValidationError) -> Vec<Cell> {
    vec![
        Cell::new(format!("{:?}", error.kind)),
        Cell::new(error.task_id.as_deref().unwrap_or("-")),
        Cell::new(&error.message),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_spec(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn valid_workflow_reports_deployable() {
        let file = write_spec(
            r#"
id: wf
name: sample
tasks:
  - id: a
    name: A
    type: action
dependencies: {}
"#,
        );
        assert!(handle_validate(file.path(), false, true).unwrap());
    }

    #[test]
    fn cyclic_workflow_is_not_deployable() {
        let file = write_spec(
            r#"
id: wf
name: cyclic
tasks:
  - id: a
    name: A
    type: action
  - id: b
    name: B
    type: action
dependencies:
  a: [b]
  b: [a]
"#,
        );
        assert!(!handle_validate(file.path(), true, false).unwrap());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(handle_validate(std::path::Path::new("/nonexistent.yaml"), false, true).is_err());
    }
}
