//! Routes a tool call to its handler.

use std::sync::Arc;

use crate::types::{McpError, McpResult, ToolCallResult};

use super::arguments::CallRequest;
use super::registry::ToolRegistry;

/// Resolves, validates, and invokes tools from a shared registry.
///
/// Cloning is cheap; every connection gets its own copy.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Lookup, then validation, then the handler. A failure at any step
    /// skips the rest, so invalid calls never reach the handler.
    pub async fn dispatch(&self, request: CallRequest) -> McpResult<ToolCallResult> {
        let tool = self.registry.lookup(&request.name)?;
        let args = tool.descriptor.validate(&request.arguments)?;

        tracing::debug!("Calling tool {} with {} arguments", request.name, args.len());

        let text = tool.handler.call(args).await.map_err(|e| {
            tracing::warn!("Tool {} failed: {e:#}", request.name);
            McpError::HandlerError(format!("{e:#}"))
        })?;

        Ok(ToolCallResult::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::arguments::ValidatedArgs;
    use crate::tools::registry::ToolHandler;
    use crate::tools::schema::{ParameterSpec, ToolDescriptor};
    use crate::types::ArgumentProblem;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Greeter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolHandler for Greeter {
        async fn call(&self, args: ValidatedArgs) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = args.get_str("name").unwrap_or_default();
            if name == "nobody" {
                anyhow::bail!("nobody to greet");
            }
            let greeting = args.get_str("greeting").unwrap_or("Hello");
            Ok(format!("{greeting}, {name}!"))
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<Greeter>) {
        let greeter = Arc::new(Greeter::default());
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new("greet", "Say hello")
                    .param(ParameterSpec::string("name").required())
                    .param(ParameterSpec::string("greeting")),
                greeter.clone(),
            )
            .unwrap();
        (Dispatcher::new(Arc::new(registry)), greeter)
    }

    #[tokio::test]
    async fn test_optional_unset_reaches_handler_as_absent() {
        let (dispatcher, greeter) = dispatcher();
        let result = dispatcher
            .dispatch(CallRequest::new("greet").arg("name", "Ada"))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.texts().collect::<Vec<_>>(), vec!["Hello, Ada!"]);
        assert_eq!(greeter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_calls_never_reach_handler() {
        let (dispatcher, greeter) = dispatcher();

        let err = dispatcher.dispatch(CallRequest::new("greet")).await.unwrap_err();
        assert!(matches!(
            err,
            McpError::InvalidArgument { ref parameter, problem: ArgumentProblem::Missing, .. }
                if parameter == "name"
        ));

        let err = dispatcher
            .dispatch(CallRequest::new("wave").arg("name", "Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::UnknownTool(ref name) if name == "wave"));

        assert_eq!(greeter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_becomes_handler_error() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch(CallRequest::new("greet").arg("name", "nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::HandlerError(ref msg) if msg.contains("nobody to greet")));
    }
}
