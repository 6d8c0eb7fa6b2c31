//! Map expansion: fanning one action out over an array parameter.
//!
//! A mapped action resolves its parameters once, picks the fan-out source
//! (the first parameter, in declaration order, whose resolved value is an
//! array), and produces one synthetic unmapped action per element. Wildcard
//! references therefore select element `i` while scalar parameters broadcast
//! unchanged to every synthetic action.

use crate::error::EngineError;
use crate::reference::resolve_parameters;
use crate::store::ResultStore;
use relay_types::Action;

/// Expands a mapped action into synthetic unmapped actions, one per element
/// of its array-valued parameter.
///
/// The synthetic actions share the parent's id; the executor aggregates
/// their outputs into an array recorded under that single id. An empty
/// source array expands to zero actions, which is not an error.
pub fn expand_action(action: &Action, store: &ResultStore) -> Result<Vec<Action>, EngineError> {
    debug_assert!(action.map, "expand_action is only called for mapped actions");

    let resolved = resolve_parameters(&action.parameters, store)?;

    let source = resolved
        .iter()
        .find_map(|(name, value)| value.as_array().map(|items| (name.clone(), items.clone())));
    let Some((source_name, elements)) = source else {
        return Err(EngineError::expansion(&action.id, "has no array-valued parameter to fan out over"));
    };

    let synthetic = elements
        .into_iter()
        .map(|element| {
            let parameters = resolved
                .iter()
                .map(|(name, value)| {
                    let parameter = if *name == source_name { element.clone() } else { value.clone() };
                    (name.clone(), parameter)
                })
                .collect();
            Action {
                id: action.id.clone(),
                tool: action.tool.clone(),
                description: action.description.clone(),
                parameters,
                parameter_metadata: action.parameter_metadata.clone(),
                map: false,
                confirmed: action.confirmed,
            }
        })
        .collect();

    Ok(synthetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::{Value, json};

    fn mapped_action(parameters: Vec<(&str, Value)>) -> Action {
        Action {
            id: "notify".into(),
            tool: "send_email".into(),
            description: String::new(),
            parameters: parameters.into_iter().map(|(name, value)| (name.to_string(), value)).collect(),
            parameter_metadata: IndexMap::new(),
            map: true,
            confirmed: false,
        }
    }

    fn store_with_users() -> ResultStore {
        let mut store = ResultStore::new();
        store.record(
            "search",
            json!([
                {"email": "a@example.com"},
                {"email": "b@example.com"}
            ]),
        );
        store
    }

    #[test]
    fn expands_wildcard_parameter_per_element() {
        let action = mapped_action(vec![("to", json!("search[*].email")), ("subject", json!("hello"))]);
        let synthetic = expand_action(&action, &store_with_users()).expect("expand");

        assert_eq!(synthetic.len(), 2);
        assert_eq!(synthetic[0].parameters["to"], json!("a@example.com"));
        assert_eq!(synthetic[1].parameters["to"], json!("b@example.com"));
        // Scalars broadcast unchanged, synthetic actions are unmapped.
        assert!(synthetic.iter().all(|a| a.parameters["subject"] == json!("hello")));
        assert!(synthetic.iter().all(|a| !a.map));
        assert!(synthetic.iter().all(|a| a.id == "notify"));
    }

    #[test]
    fn expands_literal_array_parameter() {
        let action = mapped_action(vec![("to", json!(["x@example.com", "y@example.com", "z@example.com"]))]);
        let synthetic = expand_action(&action, &ResultStore::new()).expect("expand");

        assert_eq!(synthetic.len(), 3);
        assert_eq!(synthetic[2].parameters["to"], json!("z@example.com"));
    }

    #[test]
    fn first_array_parameter_in_declaration_order_is_the_source() {
        let action = mapped_action(vec![
            ("cc", json!(["fixed@example.com"])),
            ("to", json!(["a@example.com", "b@example.com"])),
        ]);
        let synthetic = expand_action(&action, &ResultStore::new()).expect("expand");

        // `cc` is declared first, so it drives cardinality and `to` broadcasts.
        assert_eq!(synthetic.len(), 1);
        assert_eq!(synthetic[0].parameters["cc"], json!("fixed@example.com"));
        assert_eq!(synthetic[0].parameters["to"], json!(["a@example.com", "b@example.com"]));
    }

    #[test]
    fn empty_source_array_expands_to_zero_actions() {
        let mut store = ResultStore::new();
        store.record("search", json!([]));
        let action = mapped_action(vec![("to", json!("search[*].email"))]);

        let synthetic = expand_action(&action, &store).expect("expand");
        assert!(synthetic.is_empty());
    }

    #[test]
    fn no_array_parameter_is_an_expansion_error() {
        let action = mapped_action(vec![("to", json!("someone@example.com"))]);
        let error = expand_action(&action, &ResultStore::new()).expect_err("no array source");

        assert!(matches!(error, EngineError::Expansion { .. }));
        assert!(error.to_string().contains("notify"));
    }

    #[test]
    fn resolution_errors_surface_from_expansion() {
        let action = mapped_action(vec![("to", json!("ghost[*].email"))]);
        let error = expand_action(&action, &ResultStore::new()).expect_err("unknown action");
        assert!(matches!(error, EngineError::ReferenceNotFound { .. }));
    }

}
