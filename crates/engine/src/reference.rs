//! Reference expression parsing and resolution.
//!
//! Parameter values may reference a prior action's output instead of
//! supplying a literal. The grammar is small and explicit:
//!
//! - `create.id` — field path into the output recorded under `create`
//! - `create.owner.email` — nested field path
//! - `search[*].email` — wildcard extraction of a field from every element
//!   of an array output
//! - `search[*]` — the elements themselves
//!
//! Every segment is an identifier (`[A-Za-z_][A-Za-z0-9_-]*`), and a string
//! is only treated as a reference when the whole expression matches the
//! grammar with at least a wildcard or one path segment. Everything else is
//! a literal and passes through untouched. Parsing produces a typed
//! [`ActionRef`] consumed uniformly by resolution instead of ad-hoc string
//! splitting.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::EngineError;
use crate::store::ResultStore;

static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*)(\[\*\])?((?:\.[A-Za-z_][A-Za-z0-9_-]*)+)?$").expect("static reference pattern")
});

/// Parsed reference expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    /// Action id whose output the reference points into.
    pub action_id: String,
    /// True for the `id[*].path` wildcard form.
    pub wildcard: bool,
    /// Field path segments after the action id (may be empty for `id[*]`).
    pub path: Vec<String>,
    /// The expression as written, used verbatim in error messages.
    pub raw: String,
}

impl ActionRef {
    /// Parses a reference expression, returning `None` for anything that is
    /// not reference-shaped (those values are literals).
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = REFERENCE_PATTERN.captures(raw)?;
        let wildcard = captures.get(2).is_some();
        let path: Vec<String> = captures
            .get(3)
            .map(|segment_match| {
                segment_match
                    .as_str()
                    .split('.')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // A bare identifier carries no reference marker; treat it as a
        // literal so plain string parameters keep working.
        if !wildcard && path.is_empty() {
            return None;
        }

        Some(Self {
            action_id: captures.get(1).expect("action id capture").as_str().to_string(),
            wildcard,
            path,
            raw: raw.to_string(),
        })
    }
}

/// Resolves a parameter value against the result store.
///
/// Strings are resolved when reference-shaped and passed through otherwise;
/// arrays and objects are resolved recursively; every other JSON value is
/// returned unchanged. Resolution is pure: the store is never mutated and the
/// same expression may be resolved repeatedly.
pub fn resolve_value(value: &Value, store: &ResultStore) -> Result<Value, EngineError> {
    match value {
        Value::String(text) => match ActionRef::parse(text) {
            Some(reference) => resolve_reference(&reference, store),
            None => Ok(value.clone()),
        },
        Value::Array(items) => {
            let resolved: Result<Vec<Value>, EngineError> = items.iter().map(|item| resolve_value(item, store)).collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(map) => {
            let mut resolved_map = serde_json::Map::new();
            for (key, nested) in map {
                resolved_map.insert(key.clone(), resolve_value(nested, store)?);
            }
            Ok(Value::Object(resolved_map))
        }
        _ => Ok(value.clone()),
    }
}

/// Resolves an action's full parameter map, preserving declaration order.
pub fn resolve_parameters(parameters: &IndexMap<String, Value>, store: &ResultStore) -> Result<IndexMap<String, Value>, EngineError> {
    let mut resolved = IndexMap::with_capacity(parameters.len());
    for (name, value) in parameters {
        resolved.insert(name.clone(), resolve_value(value, store)?);
    }
    Ok(resolved)
}

/// Resolves a parsed reference against the store.
pub fn resolve_reference(reference: &ActionRef, store: &ResultStore) -> Result<Value, EngineError> {
    let Some(root) = store.get(&reference.action_id) else {
        return Err(EngineError::ReferenceNotFound {
            action_id: reference.action_id.clone(),
            reference: reference.raw.clone(),
        });
    };

    if reference.wildcard {
        // Non-array outputs are treated as a single-element array so the
        // wildcard form degrades gracefully.
        let elements: Vec<&Value> = match root {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let mut resolved = Vec::with_capacity(elements.len());
        for element in elements {
            resolved.push(walk_field_path(element, &reference.path, &reference.raw)?);
        }
        return Ok(Value::Array(resolved));
    }

    walk_field_path(root, &reference.path, &reference.raw)
}

/// Walks a field path through nested objects.
///
/// A missing key on an object is an error naming the segment; applying a
/// segment to anything that is not an object walks off the data and yields
/// null, which propagates into the invocation as a value. The invoked
/// capability's own validation decides whether null is acceptable.
fn walk_field_path(root: &Value, path: &[String], reference: &str) -> Result<Value, EngineError> {
    let mut current = root;
    for segment in path {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => {
                    return Err(EngineError::FieldNotFound {
                        path: reference.to_string(),
                        segment: segment.clone(),
                    });
                }
            },
            _ => return Ok(Value::Null),
        }
    }
    Ok(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(entries: &[(&str, Value)]) -> ResultStore {
        let mut store = ResultStore::new();
        for (id, value) in entries {
            store.record(*id, value.clone());
        }
        store
    }

    #[test]
    fn parses_field_path_reference() {
        let reference = ActionRef::parse("u.userId").expect("reference");
        assert_eq!(reference.action_id, "u");
        assert!(!reference.wildcard);
        assert_eq!(reference.path, vec!["userId"]);
    }

    #[test]
    fn parses_wildcard_reference() {
        let reference = ActionRef::parse("search[*].owner.email").expect("reference");
        assert_eq!(reference.action_id, "search");
        assert!(reference.wildcard);
        assert_eq!(reference.path, vec!["owner", "email"]);
    }

    #[test]
    fn parses_bare_wildcard() {
        let reference = ActionRef::parse("search[*]").expect("reference");
        assert!(reference.wildcard);
        assert!(reference.path.is_empty());
    }

    #[test]
    fn rejects_non_reference_shapes() {
        assert!(ActionRef::parse("plain").is_none());
        assert!(ActionRef::parse("hello world").is_none());
        assert!(ActionRef::parse("2").is_none());
        assert!(ActionRef::parse("a..b").is_none());
        assert!(ActionRef::parse("a.").is_none());
        assert!(ActionRef::parse("[*].x").is_none());
        assert!(ActionRef::parse("a[0].x").is_none());
        assert!(ActionRef::parse("jane@example.com").is_none());
    }

    #[test]
    fn literals_pass_through_unchanged() {
        let store = ResultStore::new();
        for literal in [json!("plain text"), json!(42), json!(true), json!(null), json!({"a": 1})] {
            assert_eq!(resolve_value(&literal, &store).expect("literal"), literal);
        }
    }

    #[test]
    fn resolves_field_path() {
        let store = store_with(&[("A", json!({"x": 5}))]);
        assert_eq!(resolve_value(&json!("A.x"), &store).expect("resolve"), json!(5));
    }

    #[test]
    fn missing_field_error_names_the_field() {
        let store = store_with(&[("A", json!({"y": 5}))]);
        let error = resolve_value(&json!("A.x"), &store).expect_err("missing field");
        assert!(error.to_string().contains("'x'"), "error should name the field: {error}");
        assert!(error.to_string().contains("A.x"), "error should carry the path: {error}");
    }

    #[test]
    fn unknown_action_id_errors() {
        let store = ResultStore::new();
        let error = resolve_value(&json!("ghost.id"), &store).expect_err("unknown action");
        assert!(matches!(error, EngineError::ReferenceNotFound { ref action_id, .. } if action_id == "ghost"));
        assert!(error.to_string().contains("ghost"));
    }

    #[test]
    fn wildcard_extracts_field_in_source_order() {
        let store = store_with(&[(
            "A",
            json!([
                {"email": "a@example.com"},
                {"email": "b@example.com"},
                {"email": "c@example.com"}
            ]),
        )]);

        let resolved = resolve_value(&json!("A[*].email"), &store).expect("wildcard");
        assert_eq!(resolved, json!(["a@example.com", "b@example.com", "c@example.com"]));
    }

    #[test]
    fn wildcard_over_non_array_wraps_single_element() {
        let store = store_with(&[("A", json!({"email": "solo@example.com"}))]);
        let resolved = resolve_value(&json!("A[*].email"), &store).expect("wildcard");
        assert_eq!(resolved, json!(["solo@example.com"]));
    }

    #[test]
    fn wildcard_with_empty_path_yields_elements() {
        let store = store_with(&[("A", json!([1, 2, 3]))]);
        let resolved = resolve_value(&json!("A[*]"), &store).expect("wildcard");
        assert_eq!(resolved, json!([1, 2, 3]));
    }

    #[test]
    fn field_applied_to_non_object_yields_null() {
        let store = store_with(&[("A", json!({"items": [1, 2]}))]);
        // Walking `.length` into an array is not an error; the value is null
        // and the invoked capability decides whether to reject it.
        let resolved = resolve_value(&json!("A.items.length"), &store).expect("resolve");
        assert_eq!(resolved, json!(null));

        let store = store_with(&[("A", json!({"id": "a-1"}))]);
        let resolved = resolve_value(&json!("A.id.inner"), &store).expect("resolve");
        assert_eq!(resolved, json!(null));
    }

    #[test]
    fn resolves_nested_containers_recursively() {
        let store = store_with(&[("u", json!({"userId": "2", "name": "Jane"}))]);
        let value = json!({
            "user": "u.userId",
            "tags": ["u.name", "literal"],
            "note": "left alone"
        });

        let resolved = resolve_value(&value, &store).expect("resolve");
        assert_eq!(resolved, json!({"user": "2", "tags": ["Jane", "literal"], "note": "left alone"}));
    }

    #[test]
    fn resolve_parameters_preserves_order() {
        let store = store_with(&[("u", json!({"id": "2"}))]);
        let mut parameters = IndexMap::new();
        parameters.insert("zeta".to_string(), json!("u.id"));
        parameters.insert("alpha".to_string(), json!("literal"));

        let resolved = resolve_parameters(&parameters, &store).expect("resolve parameters");
        let keys: Vec<&str> = resolved.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(resolved["zeta"], json!("2"));
    }

    #[test]
    fn resolution_is_repeatable() {
        let store = store_with(&[("A", json!({"x": 1}))]);
        let first = resolve_value(&json!("A.x"), &store).expect("first");
        let second = resolve_value(&json!("A.x"), &store).expect("second");
        assert_eq!(first, second);
    }
}
