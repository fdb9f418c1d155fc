use thiserror::Error;

/// Errors that end a run and are handed back to the caller as-is.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Completion(#[from] anyhow::Error),

    #[error("message store is empty")]
    EmptyStore,

    #[error("tool `{0}` is already registered")]
    DuplicateToolName(String),

    #[error("stopped after {0} iterations without a final answer")]
    MaxIterations(usize),
}

/// Errors raised while executing a single tool call. These never abort a run:
/// the executor folds them into the tool-result message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool `{0}` not found")]
    UnknownTool(String),

    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool `{tool}` failed: {reason}")]
    Execution { tool: String, reason: String },
}

impl ToolError {
    pub fn invalid_arguments(tool: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn execution(tool: &str, reason: impl std::fmt::Display) -> Self {
        Self::Execution {
            tool: tool.to_string(),
            reason: reason.to_string(),
        }
    }
}
