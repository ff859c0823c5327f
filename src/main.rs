mod application;
mod config;
mod domain;
mod infrastructure;

pub use application::{agent, client, stdio, tooling};
pub use domain::types;
pub use infrastructure::{bridge, model};

use agent::{Agent, AgentOptions};
use bridge::HttpToolBridge;
use clap::{Parser, ValueEnum};
use client::{ChatClient, ChatRequest, ClientConfig};
use config::{AppConfig, DEFAULT_GEMINI_URL};
use model::GeminiClient;
use serde_json::json;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "docagent",
    version,
    about = "ReAct document-extraction agent for MCP-style tools, powered by Gemini"
)]
struct Cli {
    #[arg(long, default_value = DEFAULT_GEMINI_URL)]
    gemini_url: String,
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    session: Option<String>,
    #[arg(long)]
    prompt_file: Option<String>,
    /// HTTP endpoint hosting the tools; overrides `tools_url` from the config.
    #[arg(long)]
    tools_url: Option<String>,
    #[arg(long, value_enum, default_value_t = RunMode::Agent)]
    mode: RunMode,
    prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunMode {
    Agent,
    Chat,
    Stdio,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    dotenvy::dotenv().ok();
    info!("Starting docagent");

    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, session = ?cli.session, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let file_config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration using default path or defaults");
    }

    let api_key = std::env::var("GOOGLE_API_KEY")
        .map_err(|_| "GOOGLE_API_KEY not found in environment variables")?;

    debug!(gemini_url = %cli.gemini_url, "Creating Gemini provider");
    let provider = GeminiClient::new(cli.gemini_url.clone(), api_key);
    let mut client_config = ClientConfig::new(file_config.model.clone());
    if let Some(system_prompt) = cli.system.clone().or(file_config.system_prompt.clone()) {
        client_config = client_config.with_system_prompt(system_prompt);
    }
    let client = Arc::new(ChatClient::new(provider, client_config));

    let tools_url = cli.tools_url.clone().or(file_config.tools_url.clone());
    let make_agent = |client: &Arc<ChatClient<GeminiClient>>| {
        tools_url.as_deref().map(|url| {
            Arc::new(Agent::new(
                client.clone(),
                file_config.tools.clone(),
                Arc::new(HttpToolBridge::new(url)),
            ))
        })
    };

    info!(mode = ?cli.mode, "Running in selected mode");
    match cli.mode {
        RunMode::Agent => {
            let prompt = load_prompt(&cli)?;
            let Some(agent) = make_agent(&client) else {
                warn!("Agent mode requested without a tool endpoint");
                return Err("agent mode requires a tool endpoint (--tools-url or tools_url in config)".into());
            };
            let mut options = AgentOptions::default();
            options.session_id = cli.session.clone();
            options.system_prompt = cli.system.clone().or(file_config.system_prompt.clone());
            info!("Executing agent workflow");
            let outcome = agent.run(prompt, options).await?;
            let output = json!({
                "session_id": outcome.session_id,
                "content": outcome.answer,
                "tool_steps": outcome.steps,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        RunMode::Chat => {
            let prompt = load_prompt(&cli)?;
            info!("Dispatching single prompt via chat mode");
            let result = client
                .chat(ChatRequest {
                    prompt,
                    model: None,
                    system_prompt: None,
                    session_id: cli.session.clone(),
                })
                .await?;

            let output = json!({
                "session_id": result.session_id,
                "content": result.content,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        RunMode::Stdio => {
            info!("Entering stdio mode; awaiting JSON line input");
            let agent = make_agent(&client);
            stdio::run(client.clone(), agent).await?;
        }
    }

    info!("docagent finished");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return Ok(normalize_prompt(content));
    }

    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        let joined = cli.prompt.join(" ");
        return Ok(normalize_prompt(joined));
    }

    if atty::isnt(atty::Stream::Stdin) {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(normalize_prompt(buffer));
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, file, or stdin".into())
}

fn normalize_prompt(prompt: String) -> String {
    prompt.trim().to_string()
}
