pub mod agent;
pub mod client;
pub mod stdio;
pub mod tooling;
