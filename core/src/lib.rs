pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod providers;
pub mod tools;
pub mod traits;

#[cfg(test)]
mod testing;

pub use agent::{AgentLoop, ContextBuilder, RunOutcome, ToolRegistry};
pub use config::*;
pub use error::{AgentError, ToolError};
pub use memory::*;
pub use providers::*;
pub use tools::*;
pub use traits::*;
