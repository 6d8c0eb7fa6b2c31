//! Workflow and action schema definitions shared across the registry, engine,
//! and CLI.
//!
//! A [`Workflow`] is a declarative, ordered list of [`Action`]s. Each action
//! names a registered capability and supplies a parameter map whose values are
//! either JSON literals or string references into an earlier action's output
//! (`"create.id"`, `"search[*].email"`). The engine resolves references at
//! execution time; these types only carry them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod validation;

/// A declarative workflow submitted for execution.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Workflow {
    /// Ordered actions executed strictly in declaration order.
    ///
    /// Actions later in the list may reference the outputs of earlier ones,
    /// which is why the engine never reorders them. Action identifiers must
    /// be unique within a workflow.
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Run-level execution options (failure policy, preview mode, debug).
    #[serde(default)]
    pub options: ExecutionOptions,
}

/// One step of a workflow: a named call against a registered capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    /// Unique identifier within the workflow. Later actions use this handle
    /// to reference the action's output.
    pub id: String,

    /// Name of the capability to invoke, as registered in the capability
    /// table (for example, `get_user_by_id`).
    pub tool: String,

    /// Human-readable description surfaced in previews and reports.
    #[serde(default)]
    pub description: String,

    /// Named parameters passed to the capability.
    ///
    /// Values are JSON literals or reference strings resolved against prior
    /// action outputs. Authoring order is preserved; for mapped actions the
    /// first array-valued parameter (in this order) is the fan-out source.
    #[serde(default = "default_parameter_map")]
    pub parameters: IndexMap<String, Value>,

    /// Optional declarative metadata per parameter, used for validation and
    /// input-form generation.
    #[serde(default = "default_metadata_map", skip_serializing_if = "IndexMap::is_empty")]
    pub parameter_metadata: IndexMap<String, ParamSpec>,

    /// When true, the action fans out into one invocation per element of its
    /// array-valued parameter and the outputs are aggregated back under this
    /// action's id.
    #[serde(default)]
    pub map: bool,

    /// Caller acknowledgment for capabilities that require confirmation.
    ///
    /// Without this flag, invoking such a capability suspends the run with a
    /// confirmation-required response instead of executing it.
    #[serde(default)]
    pub confirmed: bool,
}

/// Declarative metadata for a single action parameter.
///
/// The engine enforces presence of `required` parameters before a run starts;
/// type and enumeration information is carried for input-form generation and
/// the optional declarative check in [`validation`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ParamSpec {
    /// Expected primitive type ("string", "number", "boolean", "array", ...).
    #[serde(default, rename = "type")]
    pub r#type: Option<String>,

    /// Whether the parameter must be present for the action to execute.
    #[serde(default)]
    pub required: bool,

    /// Enumerated set of allowed values, when constrained.
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<Value>,

    /// Regular expression a string value must match, when provided.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Human-readable description for generated forms.
    #[serde(default)]
    pub description: Option<String>,
}

/// Run-level options attached to a workflow submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionOptions {
    /// How a failing action affects the rest of the run.
    #[serde(default)]
    pub policy: FailurePolicy,

    /// When false, the workflow is validated and planned but nothing is
    /// invoked.
    #[serde(default = "default_true")]
    pub execute: bool,

    /// When true, error details retain the resolved parameters that caused a
    /// failure.
    #[serde(default)]
    pub debug: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::default(),
            execute: true,
            debug: false,
        }
    }
}

/// Failure handling policy for one workflow run.
///
/// The policy is a run-level choice, never a per-action one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record a per-step error for the failing action and keep executing the
    /// remaining actions. The run still completes with an overall success
    /// envelope carrying the error list.
    #[default]
    Collect,
    /// Abort the remaining actions on the first failure and return a single
    /// top-level error response.
    FailFast,
}

fn default_parameter_map() -> IndexMap<String, Value> {
    IndexMap::new()
}

fn default_metadata_map() -> IndexMap<String, ParamSpec> {
    IndexMap::new()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_basic_workflow() {
        let yaml_text = r#"
actions:
  - id: user
    tool: get_user_by_id
    parameters:
      userId: "2"
  - id: files
    tool: get_file_by_user_id
    parameters:
      userId: user.userId
"#;

        let workflow: Workflow = serde_yaml::from_str(yaml_text).expect("deserialize workflow");

        assert_eq!(workflow.actions.len(), 2);
        assert_eq!(workflow.actions[0].id, "user");
        assert_eq!(workflow.actions[0].tool, "get_user_by_id");
        assert_eq!(workflow.actions[1].parameters["userId"], json!("user.userId"));
        assert!(!workflow.actions[0].map);
        assert!(!workflow.actions[0].confirmed);
        assert_eq!(workflow.options, ExecutionOptions::default());
    }

    #[test]
    fn deserializes_mapped_action_with_metadata() {
        let json_text = r#"{
            "actions": [{
                "id": "notify",
                "tool": "send_email",
                "description": "Notify each owner",
                "parameters": { "to": "owners[*].email", "subject": "hello" },
                "parameter_metadata": {
                    "to": { "type": "string", "required": true },
                    "subject": { "type": "string", "enum": ["hello", "goodbye"] }
                },
                "map": true,
                "confirmed": true
            }],
            "options": { "policy": "fail_fast", "debug": true }
        }"#;

        let workflow: Workflow = serde_json::from_str(json_text).expect("deserialize workflow");
        let action = &workflow.actions[0];

        assert!(action.map);
        assert!(action.confirmed);
        assert!(action.parameter_metadata["to"].required);
        assert_eq!(action.parameter_metadata["subject"].enum_values.len(), 2);
        assert_eq!(workflow.options.policy, FailurePolicy::FailFast);
        assert!(workflow.options.execute);
        assert!(workflow.options.debug);
    }

    #[test]
    fn parameter_order_is_preserved() {
        let json_text = r#"{
            "actions": [{
                "id": "a",
                "tool": "t",
                "parameters": { "zeta": 1, "alpha": 2, "mid": 3 }
            }]
        }"#;

        let workflow: Workflow = serde_json::from_str(json_text).expect("deserialize workflow");
        let keys: Vec<&str> = workflow.actions[0].parameters.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn execution_options_default_to_collect_and_execute() {
        let options = ExecutionOptions::default();
        assert_eq!(options.policy, FailurePolicy::Collect);
        assert!(options.execute);
        assert!(!options.debug);
    }
}
