//! Action invocation with the confirmation gate.
//!
//! The invoker looks the tool up in the capability registry, applies the
//! confirmation gate, and normalizes the handler's outcome. Suspension for
//! confirmation is a first-class [`InvokeOutcome`] variant, distinct from
//! both success and failure: the underlying capability is never called, and
//! the resolved arguments ride along so a human-in-the-loop flow can present
//! them and resubmit with `confirmed: true`.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value};
use tracing::debug;

use crate::error::EngineError;
use relay_registry::{CapabilityRegistry, Lookup};

/// Outcome of invoking one tool.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
    /// The capability ran and produced a value.
    Completed(Value),
    /// The capability requires confirmation the caller has not supplied.
    ConfirmationRequired(ConfirmationRequest),
}

/// Suspension payload carried back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    /// Capability awaiting confirmation.
    pub tool: String,
    /// Fully resolved arguments the invocation would use.
    pub arguments: Value,
}

/// Invokes `tool` with resolved arguments through the registry.
///
/// - Unknown tool: [`EngineError::ToolNotFound`] naming the tool.
/// - Confirmation required and not granted: suspension outcome, handler
///   untouched.
/// - Handler failure: [`EngineError::Invocation`] retaining the arguments
///   for diagnostics.
pub async fn invoke_tool(
    tool: &str,
    arguments: &IndexMap<String, Value>,
    confirmed: bool,
    registry: &CapabilityRegistry,
) -> Result<InvokeOutcome, EngineError> {
    let capability = match registry.lookup(tool) {
        Lookup::Found(capability) => capability,
        Lookup::NotFound => {
            return Err(EngineError::ToolNotFound { tool: tool.to_string() });
        }
    };

    if capability.needs_confirmation() && !confirmed {
        debug!(tool = %tool, "capability requires confirmation; suspending");
        return Ok(InvokeOutcome::ConfirmationRequired(ConfirmationRequest {
            tool: tool.to_string(),
            arguments: Value::Object(to_argument_map(arguments)),
        }));
    }

    let argument_map = to_argument_map(arguments);
    debug!(tool = %tool, argument_count = argument_map.len(), "invoking capability");
    match capability.handler().invoke(&argument_map).await {
        Ok(value) => Ok(InvokeOutcome::Completed(value)),
        Err(error) => Err(EngineError::Invocation {
            tool: tool.to_string(),
            message: error.to_string(),
            parameters: Value::Object(argument_map),
        }),
    }
}

/// Converts an ordered parameter map into the JSON object handlers receive.
pub fn to_argument_map(arguments: &IndexMap<String, Value>) -> JsonMap<String, Value> {
    arguments.iter().map(|(name, value)| (name.clone(), value.clone())).collect()
}
