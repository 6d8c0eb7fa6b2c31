//! # Relay Engine
//!
//! Executes declarative workflows against a capability registry. A workflow
//! is an ordered list of actions; each action names a registered capability
//! and supplies parameters that are either literals or references into an
//! earlier action's output. The engine resolves references, optionally fans
//! an action out over every element of an array parameter, applies the
//! confirmation gate, and assembles a structured success/failure report.
//!
//! ## Architecture
//!
//! - **`reference`**: reference grammar parsing and resolution against the
//!   per-run result store
//! - **`expand`**: map fan-out of one action into per-element invocations
//! - **`invoke`**: registry lookup, confirmation gate, outcome normalization
//! - **`executor`**: the ordered action loop and its state machine
//! - **`report`**: terminal response aggregation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_engine::{WorkflowExecutor, parse_workflow_file};
//! use relay_registry::CapabilityRegistry;
//!
//! let registry = CapabilityRegistry::new();
//! let workflow = parse_workflow_file("workflow.yaml")?;
//! let response = WorkflowExecutor::new(&registry).execute(&workflow).await;
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};

pub mod error;
pub mod executor;
pub mod expand;
pub mod invoke;
pub mod reference;
pub mod report;
pub mod store;

pub use error::EngineError;
pub use executor::{PlannedAction, WorkflowExecutor, validate_workflow};
pub use expand::expand_action;
pub use invoke::{ConfirmationRequest, InvokeOutcome, invoke_tool};
pub use reference::{ActionRef, resolve_parameters, resolve_value};
pub use store::ResultStore;

use relay_registry::CapabilityRegistry;
use relay_types::{Action, ExecutionResponse, RunReport, Workflow};

/// Executes a workflow against a registry and returns the terminal response.
pub async fn execute_workflow(workflow: &Workflow, registry: &CapabilityRegistry) -> ExecutionResponse {
    WorkflowExecutor::new(registry).execute(workflow).await
}

/// Executes a workflow, also returning the per-action timing report.
pub async fn execute_workflow_with_report(workflow: &Workflow, registry: &CapabilityRegistry) -> (ExecutionResponse, RunReport) {
    WorkflowExecutor::new(registry).execute_with_report(workflow).await
}

/// Validates a workflow and returns its plan preview without invoking
/// anything.
pub fn plan_workflow(workflow: &Workflow, registry: &CapabilityRegistry) -> Result<Vec<PlannedAction>, EngineError> {
    WorkflowExecutor::new(registry).plan(workflow)
}

/// Loads a workflow document from the filesystem.
///
/// Accepts YAML or JSON. Two document shapes are supported: a full workflow
/// object (`actions:` plus optional `options:`) or a bare action list, which
/// is wrapped into a workflow with default options.
pub fn parse_workflow_file(file_path: impl AsRef<Path>) -> Result<Workflow> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("failed to read workflow file: {}", file_path.display()))?;
    parse_workflow_str(&content).with_context(|| format!("failed to parse workflow file: {}", file_path.display()))
}

/// Parses a workflow document from an in-memory string.
pub fn parse_workflow_str(content: &str) -> Result<Workflow> {
    let document: serde_yaml::Value = serde_yaml::from_str(content).context("document is not valid YAML or JSON")?;

    match document {
        serde_yaml::Value::Sequence(_) => {
            let actions: Vec<Action> = serde_yaml::from_value(document).context("failed to parse bare action list")?;
            Ok(Workflow {
                actions,
                options: Default::default(),
            })
        }
        serde_yaml::Value::Mapping(ref mapping) if mapping.contains_key(&serde_yaml::Value::from("actions")) => {
            serde_yaml::from_value(document).context("failed to parse workflow object")
        }
        _ => anyhow::bail!("unsupported workflow document format; expected an object with an 'actions' list or a bare list of actions"),
    }
}
