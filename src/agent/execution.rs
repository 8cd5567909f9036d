use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tools::{parse_tool_input, AgentTool, ToolError};
use crate::llm::{ChatMessage, ChatRequest, LlmError, LlmProvider, ToolCall};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Agent reached the maximum of {0} steps without a final answer")]
    StepLimit(usize),

    #[error("Agent returned an empty final answer")]
    EmptyAnswer,
}

/// One tool invocation and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    pub action_log: String,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    pub answer: String,
    pub steps: Vec<AgentStep>,
}

#[derive(Debug)]
enum LoopState {
    Reasoning { step: usize },
    Done(String),
}

/// Function-calling agent loop. Each model turn either requests tool
/// calls, which run in order and are fed back, or ends with a final text.
pub struct AgentExecutor {
    llm: Arc<dyn LlmProvider>,
    chat_model: String,
    temperature: f64,
    max_steps: usize,
    system_prefix: String,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn LlmProvider>, chat_model: impl Into<String>) -> Self {
        Self {
            llm,
            chat_model: chat_model.into(),
            temperature: 0.0,
            max_steps: 8,
            system_prefix: super::instructions::DEFAULT_SYSTEM_PREFIX.to_string(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.system_prefix = prefix.into();
        self
    }

    pub async fn run(
        &self,
        tools: &[Arc<dyn AgentTool>],
        input: &str,
    ) -> Result<AgentOutcome, AgentError> {
        let specs: Vec<_> = tools.iter().map(|tool| tool.spec()).collect();
        let mut messages = vec![
            ChatMessage::system(self.system_prefix.clone()),
            ChatMessage::user(input),
        ];
        let mut steps = Vec::new();
        let mut state = LoopState::Reasoning { step: 0 };

        loop {
            state = match state {
                LoopState::Done(answer) => return Ok(AgentOutcome { answer, steps }),
                LoopState::Reasoning { step } if step >= self.max_steps => {
                    tracing::warn!(max_steps = self.max_steps, "Agent step limit reached");
                    return Err(AgentError::StepLimit(self.max_steps));
                }
                LoopState::Reasoning { step } => {
                    tracing::debug!("Reasoning step {}/{}", step + 1, self.max_steps);
                    let request = ChatRequest::new(messages.clone())
                        .with_temperature(self.temperature)
                        .with_tools(specs.clone());
                    let completion = self.llm.chat(request, &self.chat_model).await?;

                    if completion.tool_calls.is_empty() {
                        let answer = completion.content.unwrap_or_default().trim().to_string();
                        if answer.is_empty() {
                            return Err(AgentError::EmptyAnswer);
                        }
                        LoopState::Done(answer)
                    } else {
                        messages.push(ChatMessage::assistant(
                            completion.content.clone(),
                            completion.tool_calls.clone(),
                        ));
                        for call in &completion.tool_calls {
                            let observation = invoke(tools, call).await?;
                            steps.push(AgentStep {
                                action_log: action_log(call, completion.content.as_deref()),
                                observation: observation.clone(),
                            });
                            messages.push(ChatMessage::tool(call.id.clone(), observation));
                        }
                        LoopState::Reasoning { step: step + 1 }
                    }
                }
            };
        }
    }
}

async fn invoke(tools: &[Arc<dyn AgentTool>], call: &ToolCall) -> Result<String, ToolError> {
    let name = call.function.name.as_str();
    match tools.iter().find(|tool| tool.name() == name) {
        Some(tool) => {
            tracing::info!(tool = name, "Executing tool");
            tool.call(&parse_tool_input(&call.function.arguments)).await
        }
        None => {
            tracing::warn!(tool = name, "Model requested unknown tool");
            Ok(format!("{name} is not a valid tool, try another one."))
        }
    }
}

fn action_log(call: &ToolCall, content: Option<&str>) -> String {
    let mut log = format!(
        "Invoking \"{}\" with {}",
        call.function.name, call.function.arguments
    );
    if let Some(text) = content.map(str::trim).filter(|text| !text.is_empty()) {
        log.push('\n');
        log.push_str(text);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedProvider;
    use crate::llm::ChatCompletion;
    use async_trait::async_trait;

    struct EchoTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl AgentTool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "echo"
        }

        async fn call(&self, input: &str) -> Result<String, ToolError> {
            Ok(format!("{} ({input})", self.reply))
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl AgentTool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        async fn call(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError {
                tool: "broken".to_string(),
                message: "upstream unavailable".to_string(),
            })
        }
    }

    fn tools() -> Vec<Arc<dyn AgentTool>> {
        vec![
            Arc::new(EchoTool { name: "document-1-QA", reply: "one" }),
            Arc::new(EchoTool { name: "document-2-QA", reply: "two" }),
        ]
    }

    fn call(id: &str, name: &str, input: &str) -> ToolCall {
        ToolCall::function(id, name, format!(r#"{{"input":"{input}"}}"#))
    }

    #[tokio::test]
    async fn steps_follow_invocation_order() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_chat(ChatCompletion::calls(vec![call("c1", "document-1-QA", "size")]));
        mock.push_chat(ChatCompletion::calls(vec![call("c2", "document-2-QA", "size")]));
        mock.push_chat_text("Document 2 is larger.");

        let outcome = AgentExecutor::new(mock.clone(), "gpt-4-0613")
            .run(&tools(), "compare")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Document 2 is larger.");
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.steps[0].observation, "one (size)");
        assert_eq!(outcome.steps[1].observation, "two (size)");
        assert_eq!(
            outcome.steps[0].action_log,
            r#"Invoking "document-1-QA" with {"input":"size"}"#
        );

        let requests = mock.chat_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].tools.len(), 2);
        let last = requests[2].messages.last().unwrap();
        assert_eq!(last.role, "tool");
        assert_eq!(last.tool_call_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn parallel_calls_in_one_turn_run_in_order() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_chat(ChatCompletion {
            content: Some("Checking both.".to_string()),
            tool_calls: vec![
                call("c1", "document-2-QA", "a"),
                call("c2", "document-1-QA", "b"),
            ],
        });
        mock.push_chat_text("done");

        let outcome = AgentExecutor::new(mock, "m").run(&tools(), "q").await.unwrap();
        let observations: Vec<_> = outcome.steps.iter().map(|s| s.observation.as_str()).collect();
        assert_eq!(observations, vec!["two (a)", "one (b)"]);
        assert!(outcome.steps[0].action_log.ends_with("\nChecking both."));
    }

    #[tokio::test]
    async fn unknown_tool_is_observed_not_fatal() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_chat(ChatCompletion::calls(vec![call("c1", "document-3-QA", "x")]));
        mock.push_chat_text("fine");

        let outcome = AgentExecutor::new(mock, "m").run(&tools(), "q").await.unwrap();
        assert_eq!(
            outcome.steps[0].observation,
            "document-3-QA is not a valid tool, try another one."
        );
    }

    #[tokio::test]
    async fn stops_after_max_steps() {
        let mock = Arc::new(ScriptedProvider::new());
        for i in 0..5 {
            mock.push_chat(ChatCompletion::calls(vec![call(&format!("c{i}"), "document-1-QA", "again")]));
        }

        let err = AgentExecutor::new(mock.clone(), "m")
            .with_max_steps(3)
            .run(&tools(), "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::StepLimit(3)));
        assert_eq!(mock.chat_calls(), 3);
    }

    #[tokio::test]
    async fn tool_failure_aborts_the_run() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_chat(ChatCompletion::calls(vec![call("c1", "broken", "x")]));

        let tools: Vec<Arc<dyn AgentTool>> = vec![Arc::new(BrokenTool)];
        let err = AgentExecutor::new(mock, "m").run(&tools, "q").await.unwrap_err();
        assert!(matches!(err, AgentError::Tool(_)));
    }

    #[tokio::test]
    async fn system_prefix_and_input_open_the_conversation() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_chat_text("answer");

        AgentExecutor::new(mock.clone(), "m")
            .with_system_prefix("prefix")
            .run(&tools(), "rendered question")
            .await
            .unwrap();

        let messages = &mock.chat_requests()[0].messages;
        assert_eq!(messages[0], ChatMessage::system("prefix"));
        assert_eq!(messages[1], ChatMessage::user("rendered question"));
    }
}
