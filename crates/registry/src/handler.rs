//! Capability handler trait and the built-in echo implementation.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value};

/// Executes a single capability invocation.
///
/// Implementations may call HTTP endpoints, local functions, or anything
/// else; the engine only sees the resolved argument map going in and a JSON
/// value (or an error) coming out. Any error returned here is normalized by
/// the engine into an invocation failure carrying the handler's message.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Invoke the capability with fully resolved arguments.
    async fn invoke(&self, arguments: &JsonMap<String, Value>) -> Result<Value>;
}

/// A handler that returns a synthetic payload echoing its arguments.
///
/// Used for previews and for test registries that should not produce side
/// effects.
pub struct EchoHandler;

#[async_trait]
impl CapabilityHandler for EchoHandler {
    async fn invoke(&self, arguments: &JsonMap<String, Value>) -> Result<Value> {
        let mut payload = JsonMap::new();
        payload.insert("arguments".into(), Value::Object(arguments.clone()));
        payload.insert("status".into(), Value::String("ok".into()));
        Ok(Value::Object(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn echo_handler_reflects_arguments() {
        let mut arguments = JsonMap::new();
        arguments.insert("userId".into(), json!("2"));

        let result = EchoHandler.invoke(&arguments).await.expect("echo invoke");

        assert_eq!(result["status"], json!("ok"));
        assert_eq!(result["arguments"]["userId"], json!("2"));
    }
}
