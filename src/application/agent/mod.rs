mod directive;
mod errors;
mod models;
mod runner;
mod runtime;

#[cfg(test)]
mod tests;

pub use directive::AgentDirective;
pub use errors::{AgentError, ToolError};
pub use models::{AgentOptions, AgentOutcome, AgentStep};
pub use runner::Agent;
pub(crate) use runtime::ToolRuntime;
