use super::directive::AgentDirective;
use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome, AgentStep};
use super::runtime::ToolRuntime;
use crate::client::{ChatClient, ChatRequest};
use crate::config::ToolConfig;
use crate::model::ModelProvider;
use crate::tooling::ToolExecutor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// On an unparseable turn the loop re-prompts once with a format reminder
/// before giving up, so a single sloppy reply does not abort the task.
const FORMAT_RETRIES_PER_TURN: usize = 1;

pub struct Agent<P: ModelProvider> {
    client: Arc<ChatClient<P>>,
    runtime: ToolRuntime,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(
        client: Arc<ChatClient<P>>,
        tools: Vec<ToolConfig>,
        bridge: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            client,
            runtime: ToolRuntime::new(tools, bridge),
        }
    }

    pub async fn run(
        &self,
        prompt: String,
        mut options: AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        info!("Agent run started");
        let mut session_id = options.session_id.clone();
        let mut steps = Vec::new();
        let model_override = options.model.clone();

        let instructions = self.runtime.compose_system_instructions();
        let system_prompt = match options.system_prompt.take() {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{existing}\n\n{instructions}")
            }
            _ => instructions,
        };

        let mut next_prompt = self.runtime.initial_prompt(prompt);
        let mut remaining_steps = options.max_steps;
        let mut system_prompt_to_send = Some(system_prompt);
        let mut format_retries = FORMAT_RETRIES_PER_TURN;

        loop {
            debug!(
                session = session_id.as_deref(),
                remaining_steps, "Submitting agent turn to model provider"
            );
            let request = ChatRequest {
                prompt: next_prompt.clone(),
                model: model_override.clone(),
                system_prompt: system_prompt_to_send.take(),
                session_id: session_id.clone(),
            };

            let result = self.client.chat(request).await?;
            session_id = Some(result.session_id.clone());

            match self.runtime.interpret(&result.content) {
                Ok(AgentDirective::Final { answer }) => {
                    info!(
                        session_id = result.session_id.as_str(),
                        "Agent returned final answer"
                    );
                    return Ok(AgentOutcome {
                        session_id: result.session_id,
                        answer,
                        steps,
                    });
                }
                Ok(AgentDirective::CallTool { tool, input }) => {
                    if remaining_steps == 0 {
                        warn!("Agent exceeded max tool interactions");
                        return Err(AgentError::StepLimit {
                            limit: options.max_steps,
                        });
                    }
                    remaining_steps -= 1;
                    format_retries = FORMAT_RETRIES_PER_TURN;

                    info!(tool = %tool, "Agent requested tool execution");
                    let execution = self.runtime.execute(&tool, input).await?;

                    steps.push(AgentStep {
                        tool: execution.tool.clone(),
                        input: execution.input.clone(),
                        success: execution.success,
                        output: execution.output.clone(),
                        message: execution.message.clone(),
                    });

                    next_prompt = self.runtime.observation_prompt(&execution);
                }
                Err(AgentError::UnrecognizedFormat { raw }) => {
                    if format_retries == 0 {
                        return Err(AgentError::UnrecognizedFormat { raw });
                    }
                    format_retries -= 1;
                    warn!("Model turn matched no directive; issuing corrective re-prompt");
                    next_prompt = self.runtime.corrective_prompt().to_string();
                }
                Err(other) => return Err(other),
            }
        }
    }
}
