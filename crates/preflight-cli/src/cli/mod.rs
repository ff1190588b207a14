//! CLI command definitions and dispatch for the `preflight` binary.
//!
//! Uses clap derive macros for argument parsing. Each subcommand takes a
//! YAML document and prints either styled text or machine-readable JSON.

pub mod simulate;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use preflight_types::testing::TestMode;

/// Verify agent workflows before deployment.
#[derive(Parser)]
#[command(name = "preflight", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bridge tracing spans to an OpenTelemetry stdout exporter.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a workflow spec: topology, safety policy, CRV coverage.
    Validate {
        /// Path to the workflow YAML file.
        file: PathBuf,
    },

    /// Run a simulated test case against the built-in collaborators.
    Test {
        /// Path to the test case YAML file.
        file: PathBuf,

        /// Label for the run.
        #[arg(long, value_enum, default_value = "simulation")]
        mode: ModeArg,

        /// Use a gate that fails every validator (exercises the blocking path).
        #[arg(long)]
        fail_gate: bool,

        /// Print the Markdown evaluation report after the summary.
        #[arg(long)]
        report: bool,
    },

    /// Evaluate a single action against the policy guard.
    Simulate {
        /// Path to the policy simulation request YAML file.
        file: PathBuf,
    },
}

/// CLI-facing run mode.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    DryRun,
    Validation,
    Simulation,
}

impl From<ModeArg> for TestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::DryRun => TestMode::DryRun,
            ModeArg::Validation => TestMode::Validation,
            ModeArg::Simulation => TestMode::Simulation,
        }
    }
}
