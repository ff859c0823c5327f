use super::{ToolExecution, ToolRuntime};
use crate::config::ToolInputSpec;

const CORRECTIVE_PROMPT: &str = "Your previous reply did not follow the required format. \
Reply with either an Action line followed by an Action Input line, or a Final Answer line. \
Do not include anything else.";

impl ToolRuntime {
    /// Builds the ReAct protocol instructions plus the tool catalogue. The
    /// model never sees the registry directly; this text is its only view of
    /// what it may call.
    pub(crate) fn compose_system_instructions(&self) -> String {
        let mut lines = vec![
            "You are a document analysis assistant that answers user requests by calling tools."
                .to_string(),
            "Never invent document contents; every fact about a document must come from a tool Observation."
                .to_string(),
            String::new(),
            "Use exactly this format in every turn:".to_string(),
            "Thought: your reasoning about what to do next".to_string(),
            "Action: one tool name from the list below".to_string(),
            "Action Input: the input for that tool".to_string(),
            String::new(),
            "Then stop. The system will reply with:".to_string(),
            "Observation: the actual tool result".to_string(),
            "Never write the Observation yourself.".to_string(),
            String::new(),
            "When you have enough information, finish with:".to_string(),
            "Final Answer: your complete answer to the user".to_string(),
        ];

        if self.configs.is_empty() {
            lines.push(String::new());
            lines.push("No tools are currently configured; answer from the conversation alone.".to_string());
            return lines.join("\n");
        }

        lines.push(String::new());
        lines.push("Available tools:".to_string());
        for tool in &self.configs {
            let mut line = format!("- {}", tool.name);
            if let Some(description) = &tool.description {
                line.push_str(&format!(": {description}"));
            }
            line.push_str(&format!(" {}", describe_input(&tool.input)));
            lines.push(line);
        }

        lines.join("\n")
    }

    pub(crate) fn initial_prompt(&self, prompt: String) -> String {
        format!("Question: {prompt}")
    }

    /// Renders a tool execution as the Observation fed into the next turn.
    pub(crate) fn observation_prompt(&self, execution: &ToolExecution) -> String {
        let body = match &execution.message {
            Some(message) => message.clone(),
            None => serde_json::to_string(&execution.output)
                .unwrap_or_else(|_| "unrenderable tool output".to_string()),
        };
        if execution.success {
            format!("Observation: {body}")
        } else {
            format!("Observation: the tool reported an error: {body}")
        }
    }

    pub(crate) fn corrective_prompt(&self) -> &'static str {
        CORRECTIVE_PROMPT
    }
}

fn describe_input(spec: &ToolInputSpec) -> String {
    match spec {
        ToolInputSpec::NoArguments => "(Action Input: {})".to_string(),
        ToolInputSpec::SingleString { key, .. } => {
            format!("(Action Input: {{\"{key}\": \"...\"}})")
        }
        ToolInputSpec::Open => "(Action Input: a JSON object)".to_string(),
    }
}
