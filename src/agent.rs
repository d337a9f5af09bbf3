//! Answering agent: a hosted chat model augmented with one retrieval tool.
//!
//! The agent runs a bounded decision loop against an OpenAI-compatible
//! `POST /chat/completions` endpoint. Each turn the model either answers
//! directly or emits a JSON tool call for `search_past_solutions`; the tool
//! result is fed back into the conversation and the loop continues. Plain
//! (non-JSON) model output is treated as the final answer, so a model that
//! ignores the protocol still produces a usable reply.
//!
//! The tool boundary never propagates failures: a broken store or provider
//! degrades to a descriptive string so a single bad search cannot abort the
//! model's turn.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;

/// One message in a conversation, chat-completions shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Session-scoped conversation history. Grows monotonically; never persisted.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

/// Greeting shown at the start of an interactive session.
pub const GREETING: &str = "Hello! Describe your error, and I'll check our history for a fix.";

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Parsed model output: either a final answer or a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    Final(String),
    ToolCall { name: String, args: Value },
}

/// Parse the model's reply. Accepts a bare JSON object or one embedded in
/// surrounding prose; anything else is the final answer verbatim.
pub fn parse_agent_decision(text: &str) -> AgentDecision {
    if let Some(json_value) = parse_json_from_text(text) {
        if let Some(decision) = parse_decision_from_value(&json_value) {
            return decision;
        }
    }
    AgentDecision::Final(text.trim().to_string())
}

fn parse_json_from_text(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end]).ok()
}

fn parse_decision_from_value(value: &Value) -> Option<AgentDecision> {
    let action_type = value
        .get("type")
        .or_else(|| value.get("action"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if action_type == "tool_call" {
        let name = value
            .get("tool_name")
            .or_else(|| value.get("name"))
            .or_else(|| value.get("tool"))
            .and_then(|v| v.as_str())?;
        let args = value
            .get("tool_args")
            .or_else(|| value.get("args"))
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        return Some(AgentDecision::ToolCall {
            name: name.to_string(),
            args,
        });
    }

    if action_type == "final" {
        let content = value
            .get("content")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        return Some(AgentDecision::Final(content));
    }

    None
}

/// System instructions describing the tool protocol.
fn agent_instructions() -> String {
    r#"You are a support-ticket assistant. You help engineers resolve new errors by consulting a database of past resolved tickets.

You have one tool available:
- search_past_solutions: Search the database for similar past resolved tickets. Arguments: {"query": "<error description>"}.

To call the tool, reply with exactly one JSON object and nothing else:
{"type": "tool_call", "tool_name": "search_past_solutions", "tool_args": {"query": "..."}}

To give your final answer, reply with:
{"type": "final", "content": "..."}

Search when the user describes an error you have not yet looked up. Ground your answer in the retrieved tickets when they are relevant; say so when nothing matches."#
        .to_string()
}

/// Chat-completions client for the hosted answering model.
pub struct ChatClient {
    model: String,
    base_url: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(format!("failed to build http client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
            client,
        })
    }

    /// Send the message history and return the assistant's reply text.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("chat API error {status}: {text}")));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))?;

        json.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Provider("chat response had no content".to_string()))
    }
}

/// The answering agent: chat model + retrieval tool + bounded loop.
pub struct TicketAgent {
    client: ChatClient,
    pipeline: Arc<Pipeline>,
    tool_k: i64,
    max_steps: usize,
}

impl TicketAgent {
    pub fn new(client: ChatClient, pipeline: Arc<Pipeline>, tool_k: i64, max_steps: usize) -> Self {
        Self {
            client,
            pipeline,
            tool_k,
            max_steps,
        }
    }

    /// Run one user turn: append the input, loop until the model produces a
    /// final answer (or the step budget runs out), and record the answer in
    /// the conversation.
    pub async fn respond(&self, conversation: &mut Conversation, user_input: &str) -> Result<String> {
        let mut messages = vec![ChatMessage::system(agent_instructions())];
        messages.extend_from_slice(conversation.messages());
        messages.push(ChatMessage::user(user_input));

        conversation.push(ChatMessage::user(user_input));

        let mut answer = String::new();

        for step in 0..self.max_steps {
            let reply = self.client.chat(&messages).await?;

            match parse_agent_decision(&reply) {
                AgentDecision::Final(content) => {
                    answer = content;
                    break;
                }
                AgentDecision::ToolCall { name, args } => {
                    tracing::debug!(step, tool = %name, "agent tool call");
                    let result = self.run_tool(&name, &args).await;
                    messages.push(ChatMessage::assistant(reply));
                    messages.push(ChatMessage::system(format!(
                        "Tool `{name}` result:\n{result}"
                    )));
                    // Keep the loop's last text as a fallback answer if the
                    // step budget runs out mid-search.
                    answer = result;
                }
            }
        }

        conversation.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }

    async fn run_tool(&self, name: &str, args: &Value) -> String {
        match name {
            "search_past_solutions" => {
                let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
                search_past_solutions(&self.pipeline, query, self.tool_k).await
            }
            other => format!("Unknown tool: {other}"),
        }
    }
}

/// The retrieval tool exposed to the answering agent.
///
/// Never fails: any underlying error is converted into a descriptive string
/// so the model's reasoning loop always completes.
pub async fn search_past_solutions(pipeline: &Pipeline, query: &str, k: i64) -> String {
    match pipeline.search(query, k).await {
        Ok(matches) if matches.is_empty() => "No matching past tickets found.".to_string(),
        Ok(matches) => matches
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n"),
        Err(e) => format!("Error searching database: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;

    #[test]
    fn plain_text_is_final() {
        let d = parse_agent_decision("Use NULLIF to guard the divisor.");
        assert_eq!(
            d,
            AgentDecision::Final("Use NULLIF to guard the divisor.".to_string())
        );
    }

    #[test]
    fn parses_tool_call() {
        let d = parse_agent_decision(
            r#"{"type": "tool_call", "tool_name": "search_past_solutions", "tool_args": {"query": "division by zero"}}"#,
        );
        match d {
            AgentDecision::ToolCall { name, args } => {
                assert_eq!(name, "search_past_solutions");
                assert_eq!(args["query"], "division by zero");
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn parses_final_json() {
        let d = parse_agent_decision(r#"{"type": "final", "content": "All done."}"#);
        assert_eq!(d, AgentDecision::Final("All done.".to_string()));
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let d = parse_agent_decision(
            "Let me check.\n{\"type\": \"tool_call\", \"tool_name\": \"search_past_solutions\", \"tool_args\": {\"query\": \"oom\"}}",
        );
        assert!(matches!(d, AgentDecision::ToolCall { .. }));
    }

    #[test]
    fn unrecognized_json_is_final_verbatim() {
        let text = r#"{"foo": "bar"}"#;
        let d = parse_agent_decision(text);
        assert_eq!(d, AgentDecision::Final(text.to_string()));
    }

    #[test]
    fn conversation_starts_with_greeting() {
        let c = Conversation::new();
        assert_eq!(c.messages().len(), 1);
        assert_eq!(c.messages()[0].role, "assistant");
        assert_eq!(c.messages()[0].content, GREETING);
    }

    /// Embedder that always fails; drives the tool's degraded path.
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing-test"
        }
        fn dims(&self) -> usize {
            8
        }
        async fn embed(&self, _texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            Err(crate::error::Error::Provider("connection refused".to_string()))
        }
    }

    /// Embedder returning a constant vector; enough for empty-store checks.
    struct ConstEmbedder;

    #[async_trait]
    impl Embedder for ConstEmbedder {
        fn model_name(&self) -> &str {
            "const-test"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn tool_degrades_to_error_string() {
        let pipeline = Pipeline::new(
            std::sync::Arc::new(FailingEmbedder),
            std::sync::Arc::new(InMemoryStore::new()),
            64,
        );
        let out = search_past_solutions(&pipeline, "division by zero", 2).await;
        assert!(out.starts_with("Error searching database:"), "got: {out}");
        assert!(out.contains("connection refused"));
    }

    #[tokio::test]
    async fn tool_reports_no_matches_on_empty_store() {
        let pipeline = Pipeline::new(
            std::sync::Arc::new(ConstEmbedder),
            std::sync::Arc::new(InMemoryStore::new()),
            64,
        );
        let out = search_past_solutions(&pipeline, "division by zero", 2).await;
        assert_eq!(out, "No matching past tickets found.");
    }

    #[tokio::test]
    async fn tool_never_raises_even_on_bad_k() {
        let pipeline = Pipeline::new(
            std::sync::Arc::new(ConstEmbedder),
            std::sync::Arc::new(InMemoryStore::new()),
            64,
        );
        let out = search_past_solutions(&pipeline, "division by zero", 0).await;
        assert!(out.starts_with("Error searching database:"));
    }
}
