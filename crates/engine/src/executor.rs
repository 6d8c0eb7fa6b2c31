//! Workflow executor: the ordered action loop and its state machine.
//!
//! Run lifecycle: `Pending → Running → {Suspended, Completed, Failed}`.
//! Per action: resolve parameters against the growing [`ResultStore`], expand
//! when mapped, invoke through the registry, then record the value or the
//! error. Actions execute strictly in declaration order because any action's
//! parameters may reference an earlier action's output; no dependency graph
//! is built. Within a mapped action the synthetic invocations are independent
//! and run concurrently, but the aggregated array is awaited in full (in
//! source order) before it is written back.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::expand::expand_action;
use crate::invoke::{ConfirmationRequest, InvokeOutcome, invoke_tool, to_argument_map};
use crate::reference::resolve_parameters;
use crate::report;
use crate::store::ResultStore;
use relay_registry::{CapabilityRegistry, Lookup};
use relay_types::workflow::validation::missing_required_parameters;
use relay_types::{Action, ActionStatus, ActionTiming, ExecutionResponse, ExecutionResult, FailurePolicy, RunReport, RunStatus, StepError, Workflow};

/// One row of a plan preview: what would run, without running it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAction {
    /// Action identifier.
    pub id: String,
    /// Capability the action names.
    pub tool: String,
    /// Whether the tool is present in the registry.
    pub registered: bool,
    /// Whether invocation will require confirmation.
    pub needs_confirmation: bool,
    /// Whether the action fans out per element.
    pub map: bool,
    /// Parameters as authored (references unresolved).
    pub parameters: IndexMap<String, Value>,
}

/// Terminal outcome of processing one action.
enum ActionOutcome {
    Recorded { value: Value, invocations: u32 },
    Errored(EngineError),
    Suspended(ConfirmationRequest),
}

/// Executes workflows against an explicitly supplied capability registry.
pub struct WorkflowExecutor<'registry> {
    registry: &'registry CapabilityRegistry,
}

impl<'registry> WorkflowExecutor<'registry> {
    /// Creates an executor bound to a registry.
    pub fn new(registry: &'registry CapabilityRegistry) -> Self {
        Self { registry }
    }

    /// Executes a workflow and returns the terminal response.
    pub async fn execute(&self, workflow: &Workflow) -> ExecutionResponse {
        self.execute_with_report(workflow).await.0
    }

    /// Executes a workflow, also returning the per-action timing report.
    pub async fn execute_with_report(&self, workflow: &Workflow) -> (ExecutionResponse, RunReport) {
        let mut run_report = RunReport {
            status: RunStatus::Pending,
            actions: Vec::new(),
        };

        if let Err(error) = validate_workflow(workflow) {
            run_report.status = RunStatus::Failed;
            return (report::validation_failure(&error), run_report);
        }

        if !workflow.options.execute {
            let plan = self.build_plan(workflow);
            run_report.status = RunStatus::Completed;
            return (report::plan_preview(&plan), run_report);
        }

        run_report.status = RunStatus::Running;
        info!(action_count = workflow.actions.len(), policy = ?workflow.options.policy, "workflow run started");

        let mut store = ResultStore::new();
        let mut results: Vec<ExecutionResult> = Vec::new();
        let mut errors: Vec<StepError> = Vec::new();

        for action in &workflow.actions {
            let started_at = Utc::now();
            let clock = Instant::now();
            let outcome = self.run_action(action, &store).await;
            let duration_ms = clock.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

            match outcome {
                ActionOutcome::Recorded { value, invocations } => {
                    debug!(action = %action.id, invocations, "action recorded");
                    store.record(&action.id, value.clone());
                    results.push(ExecutionResult {
                        action_id: action.id.clone(),
                        result: value,
                    });
                    run_report.actions.push(ActionTiming {
                        action_id: action.id.clone(),
                        status: ActionStatus::Recorded,
                        started_at,
                        duration_ms,
                        invocations,
                    });
                }
                ActionOutcome::Errored(error) => {
                    warn!(action = %action.id, error = %error, "action failed");
                    run_report.actions.push(ActionTiming {
                        action_id: action.id.clone(),
                        status: ActionStatus::Errored,
                        started_at,
                        duration_ms,
                        invocations: 0,
                    });
                    errors.push(StepError {
                        action_id: action.id.clone(),
                        error: error.to_string(),
                    });
                    if workflow.options.policy == FailurePolicy::FailFast {
                        run_report.status = RunStatus::Failed;
                        let response = report::run_failure(&action.id, &error, errors, workflow.options.debug);
                        return (response, run_report);
                    }
                }
                ActionOutcome::Suspended(request) => {
                    info!(action = %action.id, tool = %request.tool, "run suspended awaiting confirmation");
                    run_report.actions.push(ActionTiming {
                        action_id: action.id.clone(),
                        status: ActionStatus::AwaitingConfirmation,
                        started_at,
                        duration_ms,
                        invocations: 0,
                    });
                    run_report.status = RunStatus::Suspended;
                    return (report::suspension(&action.id, request), run_report);
                }
            }
        }

        run_report.status = RunStatus::Completed;
        info!(
            succeeded = results.len(),
            failed = errors.len(),
            "workflow run completed"
        );
        (report::completed(results, errors), run_report)
    }

    /// Validates the workflow and returns the plan preview rows.
    pub fn plan(&self, workflow: &Workflow) -> Result<Vec<PlannedAction>, EngineError> {
        validate_workflow(workflow)?;
        Ok(self.build_plan(workflow))
    }

    fn build_plan(&self, workflow: &Workflow) -> Vec<PlannedAction> {
        workflow
            .actions
            .iter()
            .map(|action| {
                let (registered, needs_confirmation) = match self.registry.lookup(&action.tool) {
                    Lookup::Found(capability) => (true, capability.needs_confirmation()),
                    Lookup::NotFound => (false, false),
                };
                PlannedAction {
                    id: action.id.clone(),
                    tool: action.tool.clone(),
                    registered,
                    needs_confirmation,
                    map: action.map,
                    parameters: action.parameters.clone(),
                }
            })
            .collect()
    }

    async fn run_action(&self, action: &Action, store: &ResultStore) -> ActionOutcome {
        if action.map {
            self.run_mapped_action(action, store).await
        } else {
            self.run_single_action(action, store).await
        }
    }

    async fn run_single_action(&self, action: &Action, store: &ResultStore) -> ActionOutcome {
        let resolved = match resolve_parameters(&action.parameters, store) {
            Ok(resolved) => resolved,
            Err(error) => return ActionOutcome::Errored(error),
        };

        match invoke_tool(&action.tool, &resolved, action.confirmed, self.registry).await {
            Ok(InvokeOutcome::Completed(value)) => ActionOutcome::Recorded { value, invocations: 1 },
            Ok(InvokeOutcome::ConfirmationRequired(request)) => ActionOutcome::Suspended(request),
            Err(error) => ActionOutcome::Errored(error),
        }
    }

    async fn run_mapped_action(&self, action: &Action, store: &ResultStore) -> ActionOutcome {
        let synthetic = match expand_action(action, store) {
            Ok(synthetic) => synthetic,
            Err(error) => return ActionOutcome::Errored(error),
        };

        // The gate depends only on the tool and the caller's acknowledgment,
        // so it is applied once for the whole fan-out rather than per element.
        match self.registry.lookup(&action.tool) {
            Lookup::NotFound => {
                return ActionOutcome::Errored(EngineError::ToolNotFound {
                    tool: action.tool.clone(),
                });
            }
            Lookup::Found(capability) if capability.needs_confirmation() && !action.confirmed => {
                let element_arguments: Vec<Value> = synthetic
                    .iter()
                    .map(|element| Value::Object(to_argument_map(&element.parameters)))
                    .collect();
                return ActionOutcome::Suspended(ConfirmationRequest {
                    tool: action.tool.clone(),
                    arguments: Value::Array(element_arguments),
                });
            }
            Lookup::Found(_) => {}
        }

        if synthetic.is_empty() {
            debug!(action = %action.id, "map fan-out over empty array; zero invocations");
            return ActionOutcome::Recorded {
                value: Value::Array(Vec::new()),
                invocations: 0,
            };
        }

        let invocation_count = synthetic.len();
        // The gate already passed above, so the per-element calls are
        // dispatched as confirmed. join_all preserves source order in its
        // output regardless of completion order.
        let invocations = synthetic
            .iter()
            .map(|element| invoke_tool(&action.tool, &element.parameters, true, self.registry));
        let outcomes = join_all(invocations).await;

        let mut aggregated = Vec::with_capacity(invocation_count);
        for outcome in outcomes {
            match outcome {
                Ok(InvokeOutcome::Completed(value)) => aggregated.push(value),
                Ok(InvokeOutcome::ConfirmationRequired(request)) => return ActionOutcome::Suspended(request),
                Err(error) => return ActionOutcome::Errored(error),
            }
        }

        ActionOutcome::Recorded {
            value: Value::Array(aggregated),
            invocations: invocation_count as u32,
        }
    }
}

/// Structural validation applied before any action executes.
///
/// Checks action id presence and uniqueness, tool name presence, and the
/// presence of parameters declared `required`. A violation aborts the run
/// with a validation error regardless of the failure policy.
pub fn validate_workflow(workflow: &Workflow) -> Result<(), EngineError> {
    let mut seen_ids: HashSet<&str> = HashSet::with_capacity(workflow.actions.len());

    for action in &workflow.actions {
        if action.id.trim().is_empty() {
            return Err(EngineError::validation(format!(
                "action naming tool '{}' is missing an id",
                action.tool
            )));
        }
        if action.tool.trim().is_empty() {
            return Err(EngineError::validation(format!("action '{}' is missing a tool name", action.id)));
        }
        if !seen_ids.insert(action.id.as_str()) {
            return Err(EngineError::validation(format!(
                "duplicate action identifier detected: '{}'",
                action.id
            )));
        }
        let missing = missing_required_parameters(action);
        if !missing.is_empty() {
            return Err(EngineError::validation(format!(
                "action '{}' is missing required parameters: {}",
                action.id,
                missing.join(", ")
            )));
        }
    }

    Ok(())
}
