use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("tool '{tool}' transport error: {message}")]
    Transport { tool: String, message: String },
    #[error("tool '{tool}' endpoint answered with status {status}")]
    Status { tool: String, status: u16 },
    #[error("tool '{tool}' returned invalid JSON: {source}")]
    InvalidJson {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}
