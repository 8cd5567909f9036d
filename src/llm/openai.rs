use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::LlmError;
use super::provider::LlmProvider;
use super::types::{ChatCompletion, ChatRequest, ToolCall};
use crate::core::config::LlmSettings;

/// Client for the OpenAI HTTP API (or any server speaking the same
/// `/v1/chat/completions` and `/v1/embeddings` dialect).
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: Option<String>, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self::new(
            settings.base_url.clone(),
            settings.credential().map(str::to_string),
            client,
        ))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatCompletion, LlmError> {
        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
            if !request.tools.is_empty() {
                let tools: Vec<Value> = request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.parameters,
                            }
                        })
                    })
                    .collect();
                obj.insert("tools".to_string(), Value::Array(tools));
            }
        }

        let res = self.post("/v1/chat/completions").json(&body).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                endpoint: "chat",
                status,
                body: text,
            });
        }

        let payload: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        let message = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Decode("response has no choices".to_string()))?
            .message;

        Ok(ChatCompletion {
            content: message.content,
            tool_calls: message.tool_calls,
        })
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, LlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self.post("/v1/embeddings").json(&body).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                endpoint: "embeddings",
                status,
                body: text,
            });
        }

        let mut payload: EmbeddingResponse = res
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        payload.data.sort_by_key(|item| item.index);

        if payload.data.len() != inputs.len() {
            return Err(LlmError::Decode(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                payload.data.len()
            )));
        }

        Ok(payload.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{ChatMessage, ToolSpec};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    async fn spawn(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(base_url: String) -> OpenAiProvider {
        OpenAiProvider::new(base_url, Some("test-key".to_string()), Client::new())
    }

    #[tokio::test]
    async fn chat_sends_tools_and_parses_tool_calls() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(
                    headers.get("authorization").and_then(|v| v.to_str().ok()),
                    Some("Bearer test-key")
                );
                assert_eq!(body["model"], json!("gpt-4-0613"));
                assert_eq!(body["tools"][0]["function"]["name"], json!("document-1-QA"));
                let mut keys: Vec<&str> = body
                    .as_object()
                    .map(|obj| obj.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                keys.sort_unstable();
                assert_eq!(keys, ["messages", "model", "stream", "temperature", "tools"]);
                Json(json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_abc",
                                "type": "function",
                                "function": { "name": "document-1-QA", "arguments": "{\"input\":\"capital\"}" }
                            }]
                        }
                    }]
                }))
            }),
        );
        let base_url = spawn(app).await;

        let request = ChatRequest::new(vec![ChatMessage::user("compare")])
            .with_temperature(0.0)
            .with_tools(vec![ToolSpec {
                name: "document-1-QA".to_string(),
                description: "doc one".to_string(),
                parameters: json!({ "type": "object" }),
            }]);
        let completion = provider(base_url).chat(request, "gpt-4-0613").await.unwrap();

        assert_eq!(completion.content, None);
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].function.name, "document-1-QA");
        assert_eq!(completion.tool_calls[0].function.arguments, r#"{"input":"capital"}"#);
    }

    #[tokio::test]
    async fn embeddings_are_returned_in_input_order() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|Json(_body): Json<Value>| async move {
                Json(json!({
                    "data": [
                        { "index": 1, "embedding": [0.0, 1.0] },
                        { "index": 0, "embedding": [1.0, 0.0] }
                    ]
                }))
            }),
        );
        let base_url = spawn(app).await;

        let vectors = provider(base_url)
            .embed(&["a".to_string(), "b".to_string()], "text-embedding-ada-002")
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base_url = spawn(app).await;

        let err = provider(base_url)
            .embed(&["a".to_string()], "text-embedding-ada-002")
            .await
            .unwrap_err();
        match &err {
            LlmError::Status { status, body, .. } => {
                assert_eq!(*status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn empty_embedding_batch_skips_the_request() {
        let vectors = provider("http://127.0.0.1:9".to_string())
            .embed(&[], "text-embedding-ada-002")
            .await
            .unwrap();
        assert!(vectors.is_empty());
    }
}
