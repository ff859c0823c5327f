use serde_json::{Map, Value};

/// Normalized outcome of interpreting one model turn. Exactly one of the two
/// intents applies; a turn that expresses neither is a parse failure, not a
/// third variant.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDirective {
    Final {
        answer: String,
    },
    CallTool {
        tool: String,
        input: Map<String, Value>,
    },
}
