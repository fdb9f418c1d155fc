pub mod context;
pub mod inline_calls;
pub mod loop_;
pub mod registry;

pub use context::{ContextBuilder, DEFAULT_REACT_PROMPT};
pub use loop_::{AgentLoop, DEFAULT_MAX_ITERATIONS, LoopState, RunOutcome, Transition, next_step};
pub use registry::ToolRegistry;
