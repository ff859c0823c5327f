use super::runtime::ToolRuntime;
use super::*;
use crate::client::{ChatClient, ClientConfig};
use crate::config::default_tools;
use crate::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use crate::tooling::{ToolExecutor, ToolInvokeError};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
struct StubBridge {
    result: Value,
}

impl StubBridge {
    fn text_result(text: &str) -> Self {
        Self {
            result: json!({
                "content": [{ "type": "text", "text": text }],
                "isError": false
            }),
        }
    }
}

#[async_trait]
impl ToolExecutor for StubBridge {
    async fn invoke_tool(&self, _tool: &str, _arguments: Value) -> Result<Value, ToolInvokeError> {
        Ok(self.result.clone())
    }
}

#[derive(Clone)]
struct ScriptedProvider {
    responses: Arc<Mutex<Vec<String>>>,
    recordings: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().map(String::from).collect(),
            )),
            recordings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn requests(&self) -> Vec<ModelRequest> {
        self.recordings.lock().await.clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let mut responses = self.responses.lock().await;
        let response = responses.remove(0);
        let mut recordings = self.recordings.lock().await;
        recordings.push(request.clone());
        Ok(ModelResponse {
            content: response,
            session_id: request.session_id,
        })
    }
}

fn pdf_runtime() -> ToolRuntime {
    ToolRuntime::new(default_tools(), Arc::new(StubBridge::text_result("ok")))
}

fn pdf_agent(provider: ScriptedProvider, bridge: StubBridge) -> Agent<ScriptedProvider> {
    let client = ChatClient::new(provider, ClientConfig::new("gemini-2.0-flash-lite-001"));
    Agent::new(Arc::new(client), default_tools(), Arc::new(bridge))
}

#[test]
fn final_answer_beats_stale_action_block() {
    let runtime = pdf_runtime();
    let directive = runtime
        .interpret("Thought: x\nAction: foo\nAction Input: {}\nFinal Answer: done")
        .expect("parse succeeds");
    assert_eq!(
        directive,
        AgentDirective::Final {
            answer: "done".to_string()
        }
    );
}

#[test]
fn last_final_answer_marker_wins() {
    let runtime = pdf_runtime();
    let directive = runtime
        .interpret("Final Answer: draft\nsome revision\nFinal Answer: the real one")
        .expect("parse succeeds");
    assert_eq!(
        directive,
        AgentDirective::Final {
            answer: "the real one".to_string()
        }
    );
}

#[test]
fn action_pair_yields_normalized_call() {
    let runtime = pdf_runtime();
    let directive = runtime
        .interpret("Action: list_available_pdfs\nAction Input: {}")
        .expect("parse succeeds");
    assert_eq!(
        directive,
        AgentDirective::CallTool {
            tool: "list_available_pdfs".to_string(),
            input: Map::new(),
        }
    );
}

#[test]
fn markers_match_in_any_case() {
    let runtime = pdf_runtime();
    let directive = runtime
        .interpret("action: read_doc_contents\naction input: \"invoice.pdf\"")
        .expect("parse succeeds");
    let AgentDirective::CallTool { tool, input } = directive else {
        panic!("expected a tool call");
    };
    assert_eq!(tool, "read_doc_contents");
    assert_eq!(input.get("doc_id"), Some(&Value::String("invoice.pdf".into())));
}

#[test]
fn marker_free_text_is_unrecognized() {
    let runtime = pdf_runtime();
    let err = runtime
        .interpret("I am thinking about what to do next...")
        .expect_err("parse fails");
    assert!(matches!(err, AgentError::UnrecognizedFormat { .. }));
}

#[test]
fn zero_arg_tool_discards_hallucinated_input() {
    let runtime = pdf_runtime();
    let input = runtime
        .normalize_input("list_available_pdfs", &Value::String("some text".into()))
        .expect("known tool");
    assert!(input.is_empty());
}

#[test]
fn quoted_bare_string_becomes_single_key_mapping() {
    let runtime = pdf_runtime();
    let input = runtime
        .normalize_input("read_doc_contents", &Value::String("\"invoice.pdf\"".into()))
        .expect("known tool");
    assert_eq!(input.get("doc_id"), Some(&Value::String("invoice.pdf".into())));
    assert_eq!(input.len(), 1);
}

#[test]
fn well_shaped_mapping_is_returned_unchanged() {
    let runtime = pdf_runtime();
    let mut mapping = Map::new();
    mapping.insert("doc_id".to_string(), Value::String("invoice.pdf".into()));
    let input = runtime
        .normalize_input("read_doc_contents", &Value::Object(mapping.clone()))
        .expect("known tool");
    assert_eq!(input, mapping);
}

#[test]
fn unknown_tool_is_a_registry_error() {
    let runtime = pdf_runtime();
    let err = runtime
        .normalize_input("bogus_tool", &Value::String("{}".into()))
        .expect_err("unknown tool fails");
    assert!(matches!(err, ToolError::UnknownTool(name) if name == "bogus_tool"));
}

#[test]
fn interpretation_is_deterministic() {
    let runtime = pdf_runtime();
    let text = "Action: read_doc_contents\nAction Input: filename: invoice.pdf";
    let first = runtime.interpret(text).expect("parse succeeds");
    let second = runtime.interpret(text).expect("parse succeeds");
    assert_eq!(first, second);
}

#[tokio::test]
async fn agent_runs_tool_then_finishes() {
    let provider = ScriptedProvider::new(vec![
        "Thought: I should check the catalogue\nAction: list_available_pdfs\nAction Input: {}",
        "Final Answer: two PDFs are available",
    ]);
    let agent = pdf_agent(
        provider.clone(),
        StubBridge::text_result("a.pdf, b.pdf"),
    );

    let outcome = agent
        .run("what documents do we have?".into(), AgentOptions::default())
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.answer, "two PDFs are available");
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].tool, "list_available_pdfs");
    assert!(outcome.steps[0].success);
    assert_eq!(
        outcome.steps[0].message.as_deref(),
        Some("a.pdf, b.pdf")
    );

    let records = provider.requests().await;
    assert_eq!(records.len(), 2);
    assert!(
        records[0]
            .messages
            .iter()
            .any(|msg| msg.content.contains("Question: what documents do we have?"))
    );
    assert!(
        records[1]
            .messages
            .iter()
            .any(|msg| msg.content.contains("Observation: a.pdf, b.pdf"))
    );
}

#[tokio::test]
async fn corrective_reprompt_recovers_a_sloppy_turn() {
    let provider = ScriptedProvider::new(vec![
        "Let me think about this out loud instead of following the format.",
        "Final Answer: recovered",
    ]);
    let agent = pdf_agent(provider.clone(), StubBridge::text_result("unused"));

    let outcome = agent
        .run("hello".into(), AgentOptions::default())
        .await
        .expect("agent recovers");

    assert_eq!(outcome.answer, "recovered");
    assert!(outcome.steps.is_empty());

    let records = provider.requests().await;
    assert_eq!(records.len(), 2);
    assert!(
        records[1]
            .messages
            .iter()
            .any(|msg| msg.content.contains("did not follow the required format"))
    );
}

#[tokio::test]
async fn persistent_format_failure_propagates() {
    let provider = ScriptedProvider::new(vec!["no markers here", "still no markers"]);
    let agent = pdf_agent(provider, StubBridge::text_result("unused"));

    let err = agent
        .run("hello".into(), AgentOptions::default())
        .await
        .expect_err("agent gives up");
    assert!(matches!(err, AgentError::UnrecognizedFormat { .. }));
}

#[tokio::test]
async fn unknown_tool_request_aborts_the_run() {
    let provider = ScriptedProvider::new(vec!["Action: bogus_tool\nAction Input: {}"]);
    let agent = pdf_agent(provider, StubBridge::text_result("unused"));

    let err = agent
        .run("hello".into(), AgentOptions::default())
        .await
        .expect_err("agent fails");
    assert!(matches!(
        err,
        AgentError::Tool(ToolError::UnknownTool(name)) if name == "bogus_tool"
    ));
}

#[tokio::test]
async fn step_limit_stops_runaway_loops() {
    let provider = ScriptedProvider::new(vec![
        "Action: list_available_pdfs\nAction Input: {}",
        "Action: list_available_pdfs\nAction Input: {}",
    ]);
    let client = ChatClient::new(provider, ClientConfig::new("gemini-2.0-flash-lite-001"));
    let agent = Agent::new(
        Arc::new(client),
        default_tools(),
        Arc::new(StubBridge::text_result("a.pdf")),
    );

    let mut options = AgentOptions::default();
    options.max_steps = 1;
    let err = agent
        .run("loop forever".into(), options)
        .await
        .expect_err("limit reached");
    assert!(matches!(err, AgentError::StepLimit { limit: 1 }));
}

#[tokio::test]
async fn observation_reports_tool_errors() {
    let provider = ScriptedProvider::new(vec![
        "Action: read_doc_contents\nAction Input: missing.pdf",
        "Final Answer: the document does not exist",
    ]);
    let bridge = StubBridge {
        result: json!({
            "content": [{ "type": "text", "text": "no such document" }],
            "isError": true
        }),
    };
    let agent = pdf_agent(provider.clone(), bridge);

    let outcome = agent
        .run("read missing.pdf".into(), AgentOptions::default())
        .await
        .expect("agent succeeds");

    assert!(!outcome.steps[0].success);
    let records = provider.requests().await;
    assert!(
        records[1]
            .messages
            .iter()
            .any(|msg| msg.content.contains("the tool reported an error: no such document"))
    );
}
