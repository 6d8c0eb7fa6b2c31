//! Result aggregation: shaping the terminal [`ExecutionResponse`].
//!
//! The aggregator preserves action declaration order in both the results and
//! the errors lists. Under the collect policy a run whose every step erred
//! still reports overall success with an empty results list; that asymmetry
//! is intended — per-step errors are the collect-mode failure surface.

use serde_json::Value;

use crate::error::EngineError;
use crate::executor::PlannedAction;
use crate::invoke::ConfirmationRequest;
use relay_types::{ExecutionResponse, ExecutionResult, StepError};

/// Success envelope for a finished run (collect-mode errors included).
pub(crate) fn completed(results: Vec<ExecutionResult>, errors: Vec<StepError>) -> ExecutionResponse {
    ExecutionResponse::completed(results, errors)
}

/// Fail-fast envelope for a run aborted at `action_id`.
///
/// `details` carries the engine error verbatim; under debug mode an
/// invocation failure also retains the resolved parameters that caused it.
pub(crate) fn run_failure(action_id: &str, error: &EngineError, step_errors: Vec<StepError>, debug: bool) -> ExecutionResponse {
    ExecutionResponse::failed(
        format!("workflow execution failed at action '{action_id}'"),
        error_details(error, debug),
        step_errors,
    )
}

/// Envelope for a workflow rejected before any action executed.
pub(crate) fn validation_failure(error: &EngineError) -> ExecutionResponse {
    ExecutionResponse::failed("workflow validation failed", error.to_string(), Vec::new())
}

/// Suspension envelope for an action awaiting confirmation.
pub(crate) fn suspension(action_id: &str, request: ConfirmationRequest) -> ExecutionResponse {
    ExecutionResponse::confirmation_required(action_id, request.tool, request.arguments)
}

/// Preview envelope: one result row per planned action, nothing invoked.
pub(crate) fn plan_preview(plan: &[PlannedAction]) -> ExecutionResponse {
    let results = plan
        .iter()
        .map(|planned| ExecutionResult {
            action_id: planned.id.clone(),
            result: serde_json::to_value(planned).unwrap_or(Value::Null),
        })
        .collect();
    ExecutionResponse::completed(results, Vec::new())
}

fn error_details(error: &EngineError, debug: bool) -> String {
    match error {
        EngineError::Invocation { parameters, .. } if debug => {
            format!("{error} (parameters: {parameters})")
        }
        _ => error.to_string(),
    }
}
