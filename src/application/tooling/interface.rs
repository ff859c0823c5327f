use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolInvokeError;

/// Seam between the agent runtime and whatever actually hosts the tools.
/// Implementations carry the transport; the runtime only sees JSON in and
/// JSON out.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn invoke_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError>;
}
