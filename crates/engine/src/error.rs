//! Typed error taxonomy for workflow execution.
//!
//! Messages deliberately carry the offending tool, action, or field name
//! verbatim so callers (and their UIs) can surface the exact thing that
//! failed without re-parsing structured detail.

use serde_json::Value;
use thiserror::Error;

/// Errors produced while validating, resolving, expanding, or invoking
/// workflow actions.
///
/// A confirmation-required suspension is intentionally not represented here;
/// it is a first-class invoker outcome, not a failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The workflow is malformed; surfaced before any action executes.
    #[error("workflow validation failed: {0}")]
    Validation(String),

    /// The named tool is absent from the capability registry.
    #[error("tool '{tool}' was not found in the capability registry")]
    ToolNotFound {
        /// Name the lookup was attempted with.
        tool: String,
    },

    /// A parameter reference points at an action id with no recorded result.
    #[error("reference '{reference}' points at unknown action '{action_id}'")]
    ReferenceNotFound {
        /// Action id named by the reference.
        action_id: String,
        /// The reference expression as written.
        reference: String,
    },

    /// A field path walked into an object that lacks the next segment.
    #[error("field '{segment}' was not found while resolving '{path}'")]
    FieldNotFound {
        /// The reference expression as written.
        path: String,
        /// The segment that was missing.
        segment: String,
    },

    /// The invoked capability itself failed.
    #[error("tool '{tool}' failed: {message}")]
    Invocation {
        /// Capability that raised the failure.
        tool: String,
        /// Handler error message.
        message: String,
        /// Resolved arguments the invocation was attempted with, retained
        /// for diagnostics.
        parameters: Value,
    },

    /// A mapped action could not be fanned out.
    #[error("map action '{action_id}' {reason}")]
    Expansion {
        /// Identifier of the mapped action.
        action_id: String,
        /// Why expansion failed.
        reason: String,
    },
}

impl EngineError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an expansion error for the given action.
    pub fn expansion(action_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Expansion {
            action_id: action_id.into(),
            reason: reason.into(),
        }
    }
}
