use crate::tooling::{ToolExecutor, ToolInvokeError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

/// Tool bridge that forwards invocations to an HTTP endpoint hosting the
/// actual tools. The endpoint is expected to answer with an MCP-style result
/// envelope (`content` blocks plus an optional `isError` flag).
#[derive(Clone)]
pub struct HttpToolBridge {
    http: Client,
    base_url: String,
}

impl HttpToolBridge {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            http: client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, tool: &str) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        format!("{trimmed}/tools/{tool}")
    }
}

#[async_trait]
impl ToolExecutor for HttpToolBridge {
    async fn invoke_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        let url = self.endpoint(tool);
        debug!(tool, url = %url, "Forwarding tool invocation");

        let response = self
            .http
            .post(url)
            .json(&json!({ "tool": tool, "arguments": arguments }))
            .send()
            .await
            .map_err(|err| ToolInvokeError::Transport {
                tool: tool.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolInvokeError::Status {
                tool: tool.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| ToolInvokeError::Transport {
                tool: tool.to_string(),
                message: err.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|source| ToolInvokeError::InvalidJson {
            tool: tool.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths_correctly() {
        let bridge = HttpToolBridge::new("http://127.0.0.1:9300/");
        assert_eq!(
            bridge.endpoint("read_doc_contents"),
            "http://127.0.0.1:9300/tools/read_doc_contents"
        );
    }
}
