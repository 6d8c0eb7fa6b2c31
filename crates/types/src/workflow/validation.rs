//! Declarative parameter validation helpers shared across workflow consumers.
//!
//! The engine itself only enforces presence of required parameters before a
//! run starts; these routines let callers (form generators, CLIs) check a
//! candidate value against the fuller [`ParamSpec`] constraints.

use regex::Regex;
use serde_json::Value;

use super::{Action, ParamSpec};

/// Validate a JSON candidate against a parameter's declarative rules.
///
/// - Enumerations must include the candidate.
/// - Type tags are checked for the primitive JSON types; unknown tags pass.
/// - Patterns only apply to strings; a pattern on a non-string candidate is
///   a mismatch.
/// - Reference strings are not validated here; the caller decides whether a
///   value is a literal before applying type checks.
pub fn validate_candidate_value(candidate: &Value, spec: &ParamSpec) -> Result<(), String> {
    if !spec.enum_values.is_empty() {
        let matches_allowed = spec.enum_values.iter().any(|allowed| json_values_match(allowed, candidate));
        if !matches_allowed {
            return Err("value is not in the allowed set".to_string());
        }
    }

    if let Some(type_tag) = spec.r#type.as_deref()
        && !candidate_matches_type(candidate, type_tag)
    {
        return Err(format!("value does not match declared type '{}'", type_tag));
    }

    if let Some(pattern) = &spec.pattern {
        let Value::String(text) = candidate else {
            return Err("value must be text to satisfy a pattern rule".to_string());
        };
        let regex = Regex::new(pattern).map_err(|error| format!("invalid pattern '{}': {}", pattern, error))?;
        if !regex.is_match(text) {
            return Err(format!("value must match the pattern {}", pattern));
        }
    }

    Ok(())
}

/// Names of required parameters that are absent from the action's parameter
/// map. Presence only; a reference that later fails to resolve still counts
/// as present.
pub fn missing_required_parameters(action: &Action) -> Vec<String> {
    action
        .parameter_metadata
        .iter()
        .filter(|(name, spec)| spec.required && !action.parameters.contains_key(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect()
}

fn candidate_matches_type(candidate: &Value, type_tag: &str) -> bool {
    match type_tag {
        "string" => candidate.is_string(),
        "number" | "integer" => candidate.is_number(),
        "boolean" => candidate.is_boolean(),
        "array" => candidate.is_array(),
        "object" => candidate.is_object(),
        _ => true,
    }
}

fn json_values_match(expected: &Value, candidate: &Value) -> bool {
    if expected == candidate {
        return true;
    }
    match (expected, candidate) {
        (Value::String(expected_text), other) => expected_text == &other.to_string(),
        (other, Value::String(candidate_text)) => {
            if let Ok(parsed) = serde_json::from_str::<Value>(candidate_text) {
                other == &parsed
            } else {
                false
            }
        }
        _ => false,
    }
}
