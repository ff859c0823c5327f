mod execution;
mod instructions;
mod normalizer;
mod parser;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ToolConfig;

pub(super) use super::directive::AgentDirective;
pub(super) use super::errors::{AgentError, ToolError};
pub(super) use serde_json::{Map, Value};

use crate::tooling::ToolExecutor;

pub(crate) use execution::ToolExecution;

/// Holds the tool registry and the executor bridge. All interpretation and
/// normalization methods are pure; only `execute` touches the bridge.
pub struct ToolRuntime {
    configs: Vec<ToolConfig>,
    index: HashMap<String, ToolConfig>,
    bridge: Arc<dyn ToolExecutor>,
}

impl ToolRuntime {
    pub fn new(configs: Vec<ToolConfig>, bridge: Arc<dyn ToolExecutor>) -> Self {
        let index = configs
            .iter()
            .cloned()
            .map(|cfg| (cfg.name.to_lowercase(), cfg))
            .collect();

        Self {
            configs,
            index,
            bridge,
        }
    }

    fn spec_for(&self, tool: &str) -> Option<&ToolConfig> {
        self.index.get(&tool.to_lowercase())
    }
}
