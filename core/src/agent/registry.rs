use crate::error::{AgentError, ToolError};
use crate::traits::{ChatMessage, Tool, ToolCall, ToolSpec};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), AgentError> {
        if self.get(tool.name()).is_some() {
            return Err(AgentError::DuplicateToolName(tool.name().to_string()));
        }
        self.tools.push(Arc::from(tool));
        Ok(())
    }

    pub fn register_all(
        &mut self,
        tools: impl IntoIterator<Item = Box<dyn Tool>>,
    ) -> Result<(), AgentError> {
        tools.into_iter().try_for_each(|tool| self.register(tool))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn try_execute(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let args = parse_arguments(&call.name, &call.arguments)?;
        tool.execute(args).await
    }

    /// Runs one requested call and wraps the outcome as a tool-result message.
    /// Failures become the message content instead of an error.
    pub async fn execute(&self, call: &ToolCall) -> ChatMessage {
        let content = match self.try_execute(call).await {
            Ok(value) => {
                debug!(tool = %call.name, call_id = %call.id, "tool call succeeded");
                render_value(&value)
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, "tool call failed: {}", e);
                format!("Error: {}", e)
            }
        };

        ChatMessage::tool_result(call.id.clone(), content)
    }
}

fn parse_arguments(tool: &str, raw: &str) -> Result<serde_json::Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ToolError::invalid_arguments(tool, e))?;
    if !value.is_object() {
        return Err(ToolError::invalid_arguments(
            tool,
            format!("expected a JSON object, got {}", value),
        ));
    }
    Ok(value)
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
