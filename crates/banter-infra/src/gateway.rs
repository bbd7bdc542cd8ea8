//! HTTP generation gateway for any OpenAI-compatible backend.
//!
//! A single [`HttpGateway`] serves Ollama, vLLM, LM Studio, and the hosted
//! OpenAI API from one codebase via a configurable base URL. Text goes
//! through `/chat/completions`, images through `/images/generations`.

use banter_core::gateway::GenerationGateway;
use banter_types::error::GatewayError;
use serde::Deserialize;
use serde_json::json;

/// OpenAI-compatible HTTP client for text and image generation.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Combine the rolling context and the instruction into one user turn.
    fn user_content(user_text: &str, context: &str) -> String {
        if context.is_empty() {
            user_text.to_string()
        } else {
            format!("Recent chat:\n{context}\n\n{user_text}")
        }
    }

    async fn post_json(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(format!("{endpoint} returned {status}: {detail}")));
        }
        Ok(response)
    }
}

impl GenerationGateway for HttpGateway {
    async fn complete(
        &self,
        user_text: &str,
        context: &str,
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": Self::user_content(user_text, context) },
            ],
        });

        let response: ChatResponse = self
            .post_json("/chat/completions", &body)
            .await?
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Malformed("response contained no choices".to_string()))
    }

    async fn render_image(&self, prompt: &str) -> Result<String, GatewayError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
        });

        let response: ImagesResponse = self
            .post_json("/images/generations", &body)
            .await?
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|datum| datum.url)
            .ok_or_else(|| GatewayError::Malformed("response contained no image url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = HttpGateway::new("http://localhost:11434/v1/", "llama3");
        assert_eq!(gateway.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn user_content_skips_empty_context() {
        assert_eq!(HttpGateway::user_content("hi there", ""), "hi there");
        let combined = HttpGateway::user_content("hi there", "alice: yo");
        assert!(combined.starts_with("Recent chat:\nalice: yo"));
        assert!(combined.ends_with("hi there"));
    }

    #[test]
    fn chat_response_parses() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hey"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content, "hey");
    }

    #[test]
    fn images_response_parses() {
        let parsed: ImagesResponse =
            serde_json::from_str(r#"{"data":[{"url":"http://x/y.png"}]}"#).unwrap();
        assert_eq!(parsed.data[0].url.as_deref(), Some("http://x/y.png"));
    }
}
