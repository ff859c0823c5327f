use crate::client::ClientError;
use crate::tooling::ToolInvokeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("model output matched neither a Final Answer nor an Action block: {raw}")]
    UnrecognizedFormat { raw: String },
    #[error("agent exceeded the limit of {limit} tool interactions")]
    StepLimit { limit: usize },
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Client(err) => err.user_message(),
            AgentError::Tool(err) => err.user_message(),
            AgentError::UnrecognizedFormat { .. } => {
                "The model produced a reply that could not be understood. Try rephrasing your request."
                    .to_string()
            }
            AgentError::StepLimit { limit } => format!(
                "The agent stopped after {limit} tool calls without reaching an answer."
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("failed to execute tool '{tool}': {source}")]
    Execution {
        tool: String,
        #[source]
        source: ToolInvokeError,
    },
}

impl ToolError {
    pub fn user_message(&self) -> String {
        match self {
            ToolError::UnknownTool(name) => {
                format!("The tool \"{name}\" is not configured for this agent.")
            }
            ToolError::Execution { tool, source } => {
                format!("Executing tool \"{tool}\" failed: {source}")
            }
        }
    }
}
