//! Execution response envelopes and run reporting types.
//!
//! The wire shapes here are what callers see regardless of transport:
//! a success envelope with ordered per-action results (and, under the collect
//! policy, a parallel error list), a failure envelope with a top-level
//! error/detail pair, or a confirmation-required suspension that the caller
//! resubmits with explicit acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output of one succeeded action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Identifier of the action that produced this value.
    pub action_id: String,
    /// The value recorded under the action's id in the result store. For
    /// mapped actions this is the aggregated array in source order.
    pub result: Value,
}

/// Error recorded for one failed action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepError {
    /// Identifier of the action that failed.
    pub action_id: String,
    /// Error message preserving the offending tool, path, or field name.
    pub error: String,
}

/// Terminal response of a workflow execution.
///
/// Serialized untagged: the envelopes are distinguished by their fields, so
/// the JSON matches what transport adapters put on the wire directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExecutionResponse {
    /// The run was suspended awaiting caller confirmation.
    ConfirmationRequired(ConfirmationResponse),
    /// The run completed; under the collect policy this envelope may carry
    /// per-step errors alongside the successes.
    Completed(CompletedResponse),
    /// The run aborted under the fail-fast policy.
    Failed(FailedResponse),
}

impl ExecutionResponse {
    /// Builds the success envelope. `errors` is empty outside collect mode.
    pub fn completed(results: Vec<ExecutionResult>, errors: Vec<StepError>) -> Self {
        Self::Completed(CompletedResponse {
            success: true,
            results,
            errors,
        })
    }

    /// Builds the fail-fast failure envelope.
    pub fn failed(error: impl Into<String>, details: impl Into<String>, step_errors: Vec<StepError>) -> Self {
        Self::Failed(FailedResponse {
            success: false,
            error: error.into(),
            details: details.into(),
            step_errors: if step_errors.is_empty() { None } else { Some(step_errors) },
        })
    }

    /// Builds the confirmation suspension envelope.
    pub fn confirmation_required(action_id: impl Into<String>, tool: impl Into<String>, arguments: Value) -> Self {
        Self::ConfirmationRequired(ConfirmationResponse {
            success: false,
            confirmation_required: true,
            action_id: action_id.into(),
            tool: tool.into(),
            arguments,
        })
    }

    /// True for the completed envelope (including collect-mode runs where
    /// every step erred).
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Success envelope: ordered results plus collect-mode step errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedResponse {
    /// Always true, even when `errors` is non-empty and `results` is not.
    pub success: bool,
    /// Per-action outputs in declaration order.
    pub results: Vec<ExecutionResult>,
    /// Collect-mode per-step errors in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<StepError>,
}

/// Failure envelope produced under the fail-fast policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedResponse {
    /// Always false.
    pub success: bool,
    /// Short description naming the failing action.
    pub error: String,
    /// Underlying engine error text, verbatim.
    pub details: String,
    /// Step errors accumulated before the abort, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_errors: Option<Vec<StepError>>,
}

/// Suspension envelope for capabilities that require confirmation.
///
/// Carries the tool name and the fully resolved arguments so a
/// human-in-the-loop flow can present them and resubmit the workflow with
/// `confirmed: true` on the suspended action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    /// Always false; the workflow did not run to completion.
    pub success: bool,
    /// Marker distinguishing suspension from failure.
    pub confirmation_required: bool,
    /// Identifier of the suspended action.
    pub action_id: String,
    /// Capability awaiting confirmation.
    pub tool: String,
    /// Resolved arguments the capability would have been invoked with.
    pub arguments: Value,
}

/// Lifecycle status of one workflow run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Workflow received, nothing resolved yet.
    Pending,
    /// At least one action began resolution.
    Running,
    /// The run halted awaiting caller confirmation for one action.
    Suspended,
    /// All actions processed (successes and collected errors included).
    Completed,
    /// Aborted under the fail-fast policy.
    Failed,
}

/// Terminal status of one action within a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Output recorded in the result store.
    Recorded,
    /// The action failed to resolve, expand, or invoke.
    Errored,
    /// The action suspended awaiting confirmation.
    AwaitingConfirmation,
}

/// Timing entry for one processed action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionTiming {
    /// Identifier of the action.
    pub action_id: String,
    /// Terminal status.
    pub status: ActionStatus,
    /// Wall-clock start of the action's resolution.
    pub started_at: DateTime<Utc>,
    /// Total time spent resolving, expanding, and invoking.
    pub duration_ms: u64,
    /// Number of capability invocations (N for mapped actions, 1 otherwise,
    /// 0 when the action never reached invocation).
    pub invocations: u32,
}

/// Per-run execution report surfaced in debug output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Terminal run status.
    pub status: RunStatus,
    /// Timing entries in declaration order for every processed action.
    pub actions: Vec<ActionTiming>,
}
