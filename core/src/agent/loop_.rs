use crate::agent::{ContextBuilder, ToolRegistry, inline_calls};
use crate::error::AgentError;
use crate::memory::Conversation;
use crate::traits::{ChatMessage, ChatRequest, Provider};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Generate,
    Act,
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue,
    Halt,
}

/// Decides what follows a generate step: act on pending tool calls, or stop.
pub fn next_step(conversation: &Conversation) -> Result<Transition, AgentError> {
    let last = conversation.last()?;
    if last.pending_tool_calls().is_empty() {
        Ok(Transition::Halt)
    } else {
        Ok(Transition::Continue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub reply: String,
    pub generations: usize,
    pub tool_calls: usize,
}

pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    context_builder: ContextBuilder,
    tool_registry: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        context_builder: ContextBuilder,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            context_builder,
            tool_registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Answers a single message with no memory of earlier calls.
    pub async fn process(&self, message: &str) -> Result<String, AgentError> {
        let mut conversation = Conversation::new();
        self.respond(&mut conversation, message).await
    }

    /// Appends `message` as the human turn, runs to completion and returns the
    /// reply. Everything produced along the way stays in `conversation`.
    pub async fn respond(
        &self,
        conversation: &mut Conversation,
        message: &str,
    ) -> Result<String, AgentError> {
        conversation.append(ChatMessage::user(message));
        let outcome = self.run(conversation).await?;
        Ok(outcome.reply)
    }

    pub async fn run(&self, conversation: &mut Conversation) -> Result<RunOutcome, AgentError> {
        self.run_with(conversation, |_| {}).await
    }

    /// Drives generate/act until the model stops asking for tools.
    /// `observer` sees every message appended during the run, in order.
    pub async fn run_with<F>(
        &self,
        conversation: &mut Conversation,
        mut observer: F,
    ) -> Result<RunOutcome, AgentError>
    where
        F: FnMut(&ChatMessage),
    {
        conversation.last()?;

        let mut state = LoopState::Generate;
        let mut generations = 0;
        let mut tool_calls = 0;

        info!(
            provider = self.provider.name(),
            history = conversation.len(),
            "starting run"
        );

        loop {
            state = match state {
                LoopState::Generate => {
                    if generations == self.max_iterations {
                        return Err(AgentError::MaxIterations(self.max_iterations));
                    }
                    generations += 1;

                    let message = self.generate(conversation).await?;
                    debug!(
                        step = generations,
                        tool_calls = message.pending_tool_calls().len(),
                        "generated message"
                    );
                    observer(&message);
                    conversation.append(message);

                    match next_step(conversation)? {
                        Transition::Continue => LoopState::Act,
                        Transition::Halt => LoopState::Halt,
                    }
                }
                LoopState::Act => {
                    let calls = conversation.last()?.pending_tool_calls().to_vec();
                    for call in &calls {
                        let result = self.tool_registry.execute(call).await;
                        observer(&result);
                        conversation.append(result);
                    }
                    tool_calls += calls.len();
                    LoopState::Generate
                }
                LoopState::Halt => {
                    let reply = conversation.last()?.content.clone();
                    info!(generations, tool_calls, "run finished");
                    return Ok(RunOutcome {
                        reply,
                        generations,
                        tool_calls,
                    });
                }
            };
        }
    }

    async fn generate(&self, conversation: &Conversation) -> Result<ChatMessage, AgentError> {
        let messages = self.context_builder.build_messages(conversation.all());
        let tools = self.tool_registry.specs();
        let request = ChatRequest {
            messages: &messages,
            tools: if tools.is_empty() { None } else { Some(&tools) },
        };

        let mut response = self.provider.chat(request).await?;

        if !response.has_tool_calls()
            && !self.tool_registry.is_empty()
            && let Some(text) = response.text.take()
        {
            let (prose, calls) = inline_calls::extract(&text);
            if calls.is_empty() {
                response.text = Some(text);
            } else {
                debug!(count = calls.len(), "recovered inline tool calls");
                response.text = Some(prose);
                response.tool_calls = calls;
            }
        }

        Ok(response.into_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::context::DEFAULT_REACT_PROMPT;
    use crate::testing::ScriptedProvider;
    use crate::tools::arithmetic_tools;
    use crate::traits::Role;

    fn react_loop(provider: Arc<ScriptedProvider>) -> AgentLoop {
        let mut registry = ToolRegistry::new();
        registry.register_all(arithmetic_tools()).unwrap();
        AgentLoop::new(
            provider,
            ContextBuilder::new().with_system_prompt(DEFAULT_REACT_PROMPT),
            Arc::new(registry),
        )
    }

    fn plain_loop(provider: Arc<ScriptedProvider>) -> AgentLoop {
        AgentLoop::new(provider, ContextBuilder::new(), Arc::new(ToolRegistry::new()))
    }

    fn roles(conversation: &Conversation) -> Vec<Role> {
        conversation.all().iter().map(|m| m.role).collect()
    }

    #[test]
    fn transition_follows_last_message() {
        assert!(matches!(
            next_step(&Conversation::new()),
            Err(AgentError::EmptyStore)
        ));

        let mut conversation = Conversation::with_messages([ChatMessage::assistant("hi")]);
        assert_eq!(next_step(&conversation).unwrap(), Transition::Halt);

        conversation.append(ChatMessage::assistant_with_tool_calls(
            "",
            vec![crate::traits::ToolCall {
                id: "1".into(),
                name: "add".into(),
                arguments: "{}".into(),
            }],
        ));
        assert_eq!(next_step(&conversation).unwrap(), Transition::Continue);
    }

    #[tokio::test]
    async fn single_tool_round_then_halt() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .call_tools(&[("call_1", "add", r#"{"a": 2, "b": 2}"#)])
                .reply("2 + 2 = 4"),
        );
        let agent = react_loop(provider.clone());
        let mut conversation = Conversation::with_messages([ChatMessage::user("2+2")]);

        let outcome = agent.run(&mut conversation).await.unwrap();

        assert_eq!(outcome.reply, "2 + 2 = 4");
        assert_eq!(outcome.generations, 2);
        assert_eq!(outcome.tool_calls, 1);
        assert_eq!(
            roles(&conversation),
            [Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        let tool_msg = &conversation.all()[2];
        assert_eq!(tool_msg.content, "4");
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));

        let requests = provider.requests();
        assert_eq!(requests[0].tool_names, ["add", "subtract", "multiply"]);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[1].messages.len(), 4);
        assert!(conversation.all().iter().all(|m| m.role != Role::System));
    }

    #[tokio::test]
    async fn chained_rounds_with_unrelated_request() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .call_tools(&[("c1", "add", r#"{"a": 21, "b": 999}"#)])
                .call_tools(&[("c2", "multiply", r#"{"a": 1020, "b": 3}"#)])
                .reply(
                    "The result is 3060. Here's a joke: why do programmers prefer dark mode? \
                     Because light attracts bugs.",
                ),
        );
        let agent = react_loop(provider.clone());
        let mut conversation = Conversation::new();

        let mut seen = Vec::new();
        conversation.append(ChatMessage::user(
            "Add 21+999 and multiply the result by 3, also tell me a joke",
        ));
        let outcome = agent
            .run_with(&mut conversation, |m| seen.push(m.clone()))
            .await
            .unwrap();

        assert_eq!(outcome.generations, 3);
        assert_eq!(outcome.tool_calls, 2);
        assert!(outcome.reply.contains("3060"));
        assert!(outcome.reply.contains("joke"));

        let tool_results: Vec<&str> = conversation
            .all()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(tool_results, ["1020", "3060"]);
        assert_eq!(seen.as_slice(), &conversation.all()[1..]);
    }

    #[tokio::test]
    async fn every_request_in_a_step_gets_a_result_in_order() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .call_tools(&[
                    ("a", "multiply", r#"{"a": 6, "b": 7}"#),
                    ("b", "divide", r#"{"a": 4, "b": 2}"#),
                    ("c", "subtract", r#"{"a": "10", "b": 4}"#),
                ])
                .reply("42, no divide tool, and 6"),
        );
        let agent = react_loop(provider);
        let mut conversation = Conversation::with_messages([ChatMessage::user("go")]);

        agent.run(&mut conversation).await.unwrap();

        let results: Vec<(Option<&str>, &str)> = conversation.all()[2..5]
            .iter()
            .map(|m| (m.tool_call_id.as_deref(), m.content.as_str()))
            .collect();
        assert_eq!(
            results,
            [
                (Some("a"), "42"),
                (Some("b"), "Error: tool `divide` not found"),
                (Some("c"), "6"),
            ]
        );
        assert_eq!(conversation.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn completion_failure_aborts_the_run() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .call_tools(&[("c1", "add", r#"{"a": 1, "b": 1}"#)])
                .fail("OpenAI API error 401 Unauthorized: invalid key"),
        );
        let agent = react_loop(provider);
        let mut conversation = Conversation::with_messages([ChatMessage::user("1+1")]);

        let err = agent.run(&mut conversation).await.unwrap_err();

        assert!(matches!(err, AgentError::Completion(_)));
        assert_eq!(
            err.to_string(),
            "OpenAI API error 401 Unauthorized: invalid key"
        );
        assert_eq!(conversation.len(), 3);
    }

    #[tokio::test]
    async fn runaway_loop_is_bounded() {
        let mut script = ScriptedProvider::new();
        for i in 0..5 {
            let id = format!("c{i}");
            script = script.call_tools(&[(id.as_str(), "add", r#"{"a": 1, "b": 1}"#)]);
        }
        let agent = react_loop(Arc::new(script)).with_max_iterations(3);
        let mut conversation = Conversation::with_messages([ChatMessage::user("loop")]);

        let err = agent.run(&mut conversation).await.unwrap_err();

        assert!(matches!(err, AgentError::MaxIterations(3)));
        assert_eq!(conversation.len(), 1 + 3 * 2);
    }

    #[tokio::test]
    async fn empty_conversation_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new().reply("unused"));
        let agent = plain_loop(provider.clone());
        let err = agent.run(&mut Conversation::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyStore));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn second_turn_sends_full_history() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply("Nice to meet you, Ada.")
                .reply("Your name is Ada."),
        );
        let agent = plain_loop(provider.clone());
        let mut conversation = Conversation::new();

        agent
            .respond(&mut conversation, "My name is Ada")
            .await
            .unwrap();
        let reply = agent
            .respond(&mut conversation, "What is my name?")
            .await
            .unwrap();

        assert_eq!(reply, "Your name is Ada.");
        let requests = provider.requests();
        assert!(requests[0].tool_names.is_empty());
        let contents: Vec<&str> = requests[1]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            [
                "My name is Ada",
                "Nice to meet you, Ada.",
                "What is my name?"
            ]
        );
        assert_eq!(conversation.len(), 4);
    }

    #[tokio::test]
    async fn process_keeps_no_memory() {
        let provider = Arc::new(ScriptedProvider::new().reply("one").reply("two"));
        let agent = plain_loop(provider.clone());

        assert_eq!(agent.process("first").await.unwrap(), "one");
        assert_eq!(agent.process("second").await.unwrap(), "two");

        let requests = provider.requests();
        assert_eq!(requests[1].messages, [ChatMessage::user("second")]);
    }

    #[tokio::test]
    async fn inline_tool_calls_are_acted_on() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(r#"<tool_call>{"name": "add", "arguments": {"a": 2, "b": 2}}</tool_call>"#)
                .reply("4"),
        );
        let agent = react_loop(provider);
        let mut conversation = Conversation::with_messages([ChatMessage::user("2+2")]);

        let outcome = agent.run(&mut conversation).await.unwrap();

        assert_eq!(outcome.tool_calls, 1);
        let ai = &conversation.all()[1];
        assert_eq!(ai.content, "");
        assert_eq!(ai.pending_tool_calls()[0].name, "add");
        assert_eq!(conversation.all()[2].content, "4");
    }

    #[tokio::test]
    async fn unparseable_inline_block_leaves_reply_untouched() {
        let reply = "Use it like <tool_call>{name: add}</tool_call> to add.";
        let provider = Arc::new(ScriptedProvider::new().reply(reply));
        let agent = react_loop(provider);
        let mut conversation = Conversation::with_messages([ChatMessage::user("how?")]);

        let outcome = agent.run(&mut conversation).await.unwrap();

        assert_eq!(outcome.reply, reply);
        assert_eq!(outcome.tool_calls, 0);
        assert!(conversation.last().unwrap().tool_calls.is_none());
    }
}
