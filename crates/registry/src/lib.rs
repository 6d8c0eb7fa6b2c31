//! Capability registry: the table of callable functions the engine invokes.
//!
//! The registry maps a function name to a [`RegisteredCapability`] — a
//! declarative [`CapabilityDescriptor`] paired with the
//! [`CapabilityHandler`] that performs the call. Lookup returns an explicit
//! [`Lookup`] result rather than an option so call sites handle the missing
//! case deliberately.
//!
//! The registry is always passed as an explicit dependency into the engine;
//! there is no process-global table, which keeps test registries isolated.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

pub mod handler;
pub mod http;
pub mod manifest;

pub use handler::{CapabilityHandler, EchoHandler};
pub use http::{HttpHandler, HttpSettings};
pub use manifest::{CapabilityManifest, parse_manifest_file, parse_manifest_str};

use relay_types::{CapabilityDescriptor, InvocationSpec};

/// A descriptor paired with the handler that executes it.
#[derive(Clone)]
pub struct RegisteredCapability {
    descriptor: CapabilityDescriptor,
    handler: Arc<dyn CapabilityHandler>,
}

impl RegisteredCapability {
    /// Pairs a descriptor with its handler.
    pub fn new(descriptor: CapabilityDescriptor, handler: Arc<dyn CapabilityHandler>) -> Self {
        Self { descriptor, handler }
    }

    /// The declarative half of the capability.
    pub fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    /// The runtime half of the capability.
    pub fn handler(&self) -> &Arc<dyn CapabilityHandler> {
        &self.handler
    }

    /// Whether invocation requires explicit caller confirmation.
    pub fn needs_confirmation(&self) -> bool {
        self.descriptor.needs_confirmation
    }
}

impl std::fmt::Debug for RegisteredCapability {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RegisteredCapability")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Result of a registry lookup.
#[derive(Debug, Clone)]
pub enum Lookup<'registry> {
    /// The name is registered.
    Found(&'registry RegisteredCapability),
    /// No capability is registered under the requested name.
    NotFound,
}

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("capability '{name}' is already registered")]
    Duplicate { name: String },

    #[error("capability '{name}' declares an HTTP invocation but no base URL is configured")]
    MissingBaseUrl { name: String },
}

/// Ordered table of registered capabilities keyed by function name.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: IndexMap<String, RegisteredCapability>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor/handler pair. Names are unique; registering a
    /// duplicate is an error rather than a silent replacement.
    pub fn register(&mut self, descriptor: CapabilityDescriptor, handler: Arc<dyn CapabilityHandler>) -> Result<(), RegistryError> {
        if self.capabilities.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate {
                name: descriptor.name.clone(),
            });
        }
        debug!(capability = %descriptor.name, "registered capability");
        self.capabilities
            .insert(descriptor.name.clone(), RegisteredCapability::new(descriptor, handler));
        Ok(())
    }

    /// Looks up a capability by name.
    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.capabilities.get(name) {
            Some(capability) => Lookup::Found(capability),
            None => Lookup::NotFound,
        }
    }

    /// Iterates descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.capabilities.values().map(RegisteredCapability::descriptor)
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Builds a registry from a parsed manifest.
    ///
    /// HTTP-backed descriptors get an [`HttpHandler`] bound to the settings'
    /// base URL; echo descriptors get the shared [`EchoHandler`]. A manifest
    /// with HTTP entries and no base URL is rejected up front.
    pub fn from_manifest(manifest: CapabilityManifest, settings: Option<HttpSettings>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        let echo: Arc<dyn CapabilityHandler> = Arc::new(EchoHandler);

        for descriptor in manifest.capabilities {
            let handler: Arc<dyn CapabilityHandler> = match &descriptor.invocation {
                InvocationSpec::Http { method, path } => {
                    let Some(settings) = settings.as_ref() else {
                        return Err(RegistryError::MissingBaseUrl {
                            name: descriptor.name.clone(),
                        });
                    };
                    Arc::new(HttpHandler::new(settings.clone(), method.clone(), path.clone()))
                }
                InvocationSpec::Echo => Arc::clone(&echo),
            };
            registry.register(descriptor, handler)?;
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: name.to_string(),
            summary: String::new(),
            needs_confirmation: false,
            invocation: InvocationSpec::Echo,
        }
    }

    #[test]
    fn lookup_distinguishes_found_from_not_found() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(descriptor("get_user_by_id"), Arc::new(EchoHandler))
            .expect("register capability");

        assert!(matches!(registry.lookup("get_user_by_id"), Lookup::Found(_)));
        assert!(matches!(registry.lookup("missing_tool"), Lookup::NotFound));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(descriptor("get_user_by_id"), Arc::new(EchoHandler))
            .expect("first registration");

        let error = registry
            .register(descriptor("get_user_by_id"), Arc::new(EchoHandler))
            .expect_err("duplicate should fail");
        assert!(error.to_string().contains("get_user_by_id"));
    }

    #[test]
    fn descriptors_iterate_in_registration_order() {
        let mut registry = CapabilityRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(descriptor(name), Arc::new(EchoHandler)).expect("register");
        }

        let names: Vec<&str> = registry.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn manifest_with_http_entry_requires_base_url() {
        let manifest = CapabilityManifest {
            capabilities: vec![CapabilityDescriptor {
                name: "get_user_by_id".into(),
                summary: String::new(),
                needs_confirmation: false,
                invocation: InvocationSpec::Http {
                    method: "GET".into(),
                    path: "/users/{userId}".into(),
                },
            }],
        };

        let error = CapabilityRegistry::from_manifest(manifest, None).expect_err("missing base url should fail");
        assert!(matches!(error, RegistryError::MissingBaseUrl { .. }));
    }
}
