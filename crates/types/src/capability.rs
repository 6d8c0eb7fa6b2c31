//! Capability descriptor types consumed by the registry and engine.

use serde::{Deserialize, Serialize};

/// Describes one callable capability exposed through the registry.
///
/// The descriptor is the declarative half of a registered capability; the
/// runtime half (the handler that actually performs the call) lives in the
/// registry crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    /// Name the engine looks up (for example, `get_user_by_id`).
    pub name: String,

    /// Brief description of what the capability does.
    #[serde(default)]
    pub summary: String,

    /// When true, invocation suspends until the caller resubmits the action
    /// with `confirmed: true`.
    #[serde(default)]
    pub needs_confirmation: bool,

    /// How the capability is invoked.
    #[serde(default)]
    pub invocation: InvocationSpec,
}

/// Invocation method attached to a capability descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationSpec {
    /// HTTP request against a configured base URL. `path` may contain
    /// `{placeholder}` segments filled from the resolved arguments.
    Http {
        /// HTTP method (GET, POST, DELETE, PATCH, ...).
        method: String,
        /// Endpoint path template, e.g. `/users/{userId}/files`.
        path: String,
    },
    /// Echo the resolved arguments back as the result. Used for previews and
    /// test registries.
    #[default]
    Echo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_to_echo_invocation() {
        let json = r#"{ "name": "get_user_by_id" }"#;
        let descriptor: CapabilityDescriptor = serde_json::from_str(json).expect("deserialize descriptor");

        assert_eq!(descriptor.name, "get_user_by_id");
        assert!(!descriptor.needs_confirmation);
        assert_eq!(descriptor.invocation, InvocationSpec::Echo);
    }

    #[test]
    fn http_invocation_round_trips_from_yaml() {
        let yaml = r#"
name: get_file_by_user_id
summary: List files owned by a user
needs_confirmation: false
invocation:
  kind: http
  method: GET
  path: /users/{userId}/files
"#;
        let descriptor: CapabilityDescriptor = serde_yaml::from_str(yaml).expect("deserialize descriptor");

        match &descriptor.invocation {
            InvocationSpec::Http { method, path } => {
                assert_eq!(method, "GET");
                assert_eq!(path, "/users/{userId}/files");
            }
            other => panic!("expected http invocation, got {:?}", other),
        }
    }
}
