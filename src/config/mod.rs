use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite-001";
const DEFAULT_CONFIG_PATH: &str = "config/agent.toml";

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub system_prompt: Option<String>,
    pub tools: Vec<ToolConfig>,
    pub tools_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    model: Option<String>,
    system_prompt: Option<String>,
    #[serde(default)]
    tools: Vec<RawTool>,
    tools_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolConfig {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub input: ToolInputSpec,
}

/// Declares the argument shape a tool expects. The normalizer consults this
/// to repair loosely formatted action inputs before dispatch.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ToolInputSpec {
    /// The tool takes no arguments; any supplied input is discarded.
    #[serde(rename = "none")]
    NoArguments,
    /// The tool takes exactly one required string argument named `key`.
    /// `aliases` are alternative labels the model may use for that key, and
    /// `extensions` are filename extensions that identify the expected value
    /// inside free-form text.
    #[serde(rename = "single")]
    SingleString {
        key: String,
        #[serde(default)]
        aliases: Vec<String>,
        #[serde(default)]
        extensions: Vec<String>,
    },
    /// Any JSON object is accepted as-is.
    #[default]
    #[serde(rename = "open")]
    Open,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTool {
    Name(String),
    Detailed {
        name: String,
        description: Option<String>,
        #[serde(default)]
        input: ToolInputSpec,
    },
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }

    pub fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            tools: default_tools(),
            tools_url: None,
        }
    }
}

/// The PDF toolset the agent ships with when no config file overrides it.
pub fn default_tools() -> Vec<ToolConfig> {
    vec![
        ToolConfig {
            name: "read_doc_contents".to_string(),
            description: Some("Read the text content of a stored PDF document".to_string()),
            input: ToolInputSpec::SingleString {
                key: "doc_id".to_string(),
                aliases: vec![
                    "filename".to_string(),
                    "file".to_string(),
                    "document".to_string(),
                    "doc".to_string(),
                ],
                extensions: vec!["pdf".to_string()],
            },
        },
        ToolConfig {
            name: "list_available_pdfs".to_string(),
            description: Some("List the PDF documents available for reading".to_string()),
            input: ToolInputSpec::NoArguments,
        },
    ]
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading agent configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let tools = if parsed.tools.is_empty() {
        default_tools()
    } else {
        parsed.tools.into_iter().map(ToolConfig::from).collect()
    };
    Ok(AppConfig {
        model: parsed.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        system_prompt: parsed.system_prompt,
        tools,
        tools_url: parsed.tools_url,
    })
}

impl From<RawTool> for ToolConfig {
    fn from(value: RawTool) -> Self {
        match value {
            RawTool::Name(name) => Self {
                name,
                description: None,
                input: ToolInputSpec::Open,
            },
            RawTool::Detailed {
                name,
                description,
                input,
            } => Self {
                name,
                description,
                input,
            },
        }
    }
}
