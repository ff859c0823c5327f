use crate::agent::{Agent, AgentOptions, AgentStep};
use crate::client::{ChatClient, ChatRequest};
use crate::model::ModelProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize stdio response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct StdioRequest {
    prompt: String,
    model: Option<String>,
    system_prompt: Option<String>,
    session_id: Option<String>,
    #[serde(default)]
    agent: bool,
    #[serde(default)]
    max_tool_steps: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StdioResponse {
    session_id: Option<String>,
    content: Option<String>,
    error: Option<String>,
    tool_steps: Vec<AgentStep>,
}

impl StdioResponse {
    fn success(session_id: String, content: String, tool_steps: Vec<AgentStep>) -> Self {
        Self {
            session_id: Some(session_id),
            content: Some(content),
            error: None,
            tool_steps,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            session_id: None,
            content: None,
            error: Some(message.into()),
            tool_steps: Vec::new(),
        }
    }
}

/// JSON-lines surface: one request object per stdin line, one response
/// object per stdout line. The agent is optional; without a tool bridge the
/// surface still serves plain chat.
pub async fn run<P>(
    client: Arc<ChatClient<P>>,
    agent: Option<Arc<Agent<P>>>,
) -> Result<(), StdioError>
where
    P: ModelProvider + 'static,
{
    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received stdio line");

        match serde_json::from_str::<StdioRequest>(&line) {
            Ok(request) => {
                if request.prompt.trim().is_empty() {
                    write_response(&mut stdout, StdioResponse::error("prompt cannot be empty"))
                        .await?;
                    continue;
                }

                let response = if request.agent {
                    match &agent {
                        Some(agent) => run_agent_request(agent, request).await,
                        None => StdioResponse::error(
                            "agent mode is unavailable: no tool endpoint configured",
                        ),
                    }
                } else {
                    run_chat_request(&client, request).await
                };
                write_response(&mut stdout, response).await?;
            }
            Err(err) => {
                error!(%err, "Failed to parse stdio request");
                write_response(
                    &mut stdout,
                    StdioResponse::error(format!("invalid request: {err}")),
                )
                .await?;
            }
        }
    }

    info!("Stdio input closed; shutting down");
    Ok(())
}

async fn run_chat_request<P: ModelProvider>(
    client: &ChatClient<P>,
    request: StdioRequest,
) -> StdioResponse {
    let result = client
        .chat(ChatRequest {
            prompt: request.prompt,
            model: request.model,
            system_prompt: request.system_prompt,
            session_id: request.session_id,
        })
        .await;

    match result {
        Ok(result) => StdioResponse::success(result.session_id, result.content, Vec::new()),
        Err(err) => {
            error!(%err, "Chat request failed");
            StdioResponse::error(err.user_message())
        }
    }
}

async fn run_agent_request<P: ModelProvider>(
    agent: &Agent<P>,
    request: StdioRequest,
) -> StdioResponse {
    info!("Processing stdio agent request");
    let mut options = AgentOptions::default();
    options.model = request.model;
    options.system_prompt = request.system_prompt;
    options.session_id = request.session_id;
    if let Some(max_steps) = request.max_tool_steps {
        options.max_steps = max_steps;
    }

    match agent.run(request.prompt, options).await {
        Ok(outcome) => StdioResponse::success(outcome.session_id, outcome.answer, outcome.steps),
        Err(err) => {
            error!(%err, "Agent request failed");
            StdioResponse::error(err.user_message())
        }
    }
}

async fn write_response(
    stdout: &mut io::Stdout,
    response: StdioResponse,
) -> Result<(), StdioError> {
    let mut payload = serde_json::to_vec(&response)?;
    payload.push(b'\n');
    stdout.write_all(&payload).await?;
    stdout.flush().await?;
    Ok(())
}
