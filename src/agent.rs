//! LLM agent module for requirement summarization.
//!
//! Wraps the Anthropic Messages API behind the [`Generate`] trait and
//! collapses every per-item failure into a flagged fallback record, so a
//! single bad call never stops the batch.

use crate::summary::{truncate_with_ellipsis, SummaryRecord, MAX_SUMMARY_LEN};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("failed to parse response: {0}")]
    ParseError(String),
}

/// Opaque text-generation capability: one prompt in, one reply out.
#[async_trait]
pub trait Generate {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Anthropic Messages API response body, reduced to what we read.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Client for the Anthropic Messages API.
///
/// Built once and reused for every call in the batch.
pub struct AnthropicClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str, max_tokens: u32) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: "https://api.anthropic.com".to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        })
    }

    /// Point the client at a different API endpoint (used in tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Generate for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::RequestFailed(format!(
                "status {}: {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ParseError(e.to_string()))?;

        parsed
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AgentError::ParseError("empty content in response".to_string()))
    }
}

/// Summarize one requirement text, never failing.
///
/// Texts already within the length budget are returned verbatim with no
/// API call. Anything that goes wrong downstream (network, quota, a reply
/// that isn't the requested JSON) degrades to the deterministic fallback:
/// the first 39 characters of the original plus an ellipsis, flagged.
pub async fn summarize(
    generator: &dyn Generate,
    text: &str,
    badge_name: &str,
    req_number: &str,
) -> SummaryRecord {
    if text.chars().count() <= MAX_SUMMARY_LEN {
        return SummaryRecord::verbatim(text);
    }

    let prompt = build_prompt(text, badge_name, req_number);
    match request_summary(generator, &prompt).await {
        Ok(record) => enforce_length(record),
        Err(e) => SummaryRecord::fallback(text, &e.to_string()),
    }
}

async fn request_summary(
    generator: &dyn Generate,
    prompt: &str,
) -> Result<SummaryRecord, AgentError> {
    let reply = generator.generate(prompt).await?;
    let cleaned = strip_code_fence(&reply);
    serde_json::from_str(&cleaned)
        .map_err(|e| AgentError::ParseError(format!("{}: {}", e, cleaned)))
}

/// Cap the model's own summary at the length budget. A force-truncated
/// reply gets flagged unless the model already supplied a flag.
fn enforce_length(mut record: SummaryRecord) -> SummaryRecord {
    if record.summary.chars().count() > MAX_SUMMARY_LEN {
        record.summary = truncate_with_ellipsis(&record.summary);
        if record.flag.is_none() {
            record.flag = Some("auto-truncated".to_string());
        }
    }
    record
}

/// Build the summarization instruction for one requirement.
fn build_prompt(text: &str, badge_name: &str, req_number: &str) -> String {
    format!(
        r#"Summarize this Boy Scout merit badge requirement in EXACTLY 40 characters or less.
The summary should capture the core action/knowledge required.
Use abbreviations if needed (e.g., "Demo" for "Demonstrate", "Explain" for "Explain to your counselor").
Do NOT include the requirement number.
Do NOT use quotes around the summary.

Badge: {badge_name}
Requirement {req_number}: {text}

If critical information MUST be lost to fit 40 chars, add a note.

Respond in this exact JSON format:
{{"summary": "your 40 char max summary", "flag": null}}

Or if critical info is lost:
{{"summary": "your 40 char max summary", "flag": "brief note about what's lost"}}"#
    )
}

/// Strip a markdown code fence wrapper from a JSON reply, if present.
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();

    // Remove ```json ... ``` or ``` ... ```
    if trimmed.starts_with("```") {
        let without_prefix = if let Some(rest) = trimmed.strip_prefix("```json") {
            rest
        } else {
            &trimmed[3..]
        };

        if let Some(end_idx) = without_prefix.rfind("```") {
            return without_prefix[..end_idx].trim().to_string();
        }
        return without_prefix.trim().to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Scripted generator for exercising the summarizer without a server.
    struct ScriptedGenerator {
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: &str) -> Self {
            Self {
                reply: Err(error.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Generate for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(AgentError::RequestFailed(e.clone())),
            }
        }
    }

    fn long_text() -> String {
        "Demonstrate tying the bowline knot in under 15 seconds while blindfolded".to_string()
    }

    #[test]
    fn strips_json_fence() {
        let reply = "```json\n{\"summary\": \"Tie bowline fast\", \"flag\": null}\n```";
        assert_eq!(
            strip_code_fence(reply),
            "{\"summary\": \"Tie bowline fast\", \"flag\": null}"
        );
    }

    #[test]
    fn strips_bare_fence() {
        let reply = "```\n{\"summary\": \"x\", \"flag\": null}\n```";
        assert_eq!(strip_code_fence(reply), "{\"summary\": \"x\", \"flag\": null}");
    }

    #[test]
    fn unfenced_text_passes_through() {
        let reply = "  {\"summary\": \"x\", \"flag\": null}  ";
        assert_eq!(strip_code_fence(reply), "{\"summary\": \"x\", \"flag\": null}");
    }

    #[tokio::test]
    async fn short_text_short_circuits_without_a_call() {
        let generator = ScriptedGenerator::replying("unused");
        let record = summarize(&generator, "Tie a square knot", "Pioneering", "2a").await;
        assert_eq!(record, SummaryRecord::verbatim("Tie a square knot"));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn valid_reply_is_stored_as_is() {
        let generator =
            ScriptedGenerator::replying("{\"summary\": \"Tie bowline <15s blindfolded\", \"flag\": null}");
        let record = summarize(&generator, &long_text(), "Pioneering", "2a").await;
        assert_eq!(record.summary, "Tie bowline <15s blindfolded");
        assert_eq!(record.flag, None);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn fenced_reply_is_unwrapped_before_parsing() {
        let generator = ScriptedGenerator::replying(
            "```json\n{\"summary\": \"Tie bowline fast\", \"flag\": null}\n```",
        );
        let record = summarize(&generator, &long_text(), "Pioneering", "2a").await;
        assert_eq!(record.summary, "Tie bowline fast");
        assert_eq!(record.flag, None);
    }

    #[tokio::test]
    async fn overlong_reply_is_truncated_and_flagged() {
        let overlong = "a".repeat(55);
        let generator = ScriptedGenerator::replying(&format!(
            "{{\"summary\": \"{overlong}\", \"flag\": null}}"
        ));
        let record = summarize(&generator, &long_text(), "Pioneering", "2a").await;
        assert_eq!(record.summary.chars().count(), 40);
        assert!(record.summary.ends_with('…'));
        assert_eq!(record.flag.as_deref(), Some("auto-truncated"));
    }

    #[tokio::test]
    async fn model_flag_survives_truncation() {
        let overlong = "a".repeat(55);
        let generator = ScriptedGenerator::replying(&format!(
            "{{\"summary\": \"{overlong}\", \"flag\": \"dropped the time limit\"}}"
        ));
        let record = summarize(&generator, &long_text(), "Pioneering", "2a").await;
        assert_eq!(record.flag.as_deref(), Some("dropped the time limit"));
    }

    #[tokio::test]
    async fn request_failure_falls_back_to_truncation() {
        let generator = ScriptedGenerator::failing("connection refused");
        let record = summarize(&generator, &long_text(), "Pioneering", "2a").await;
        assert_eq!(record.summary, "Demonstrate tying the bowline knot in u…");
        let flag = record.flag.unwrap();
        assert!(flag.starts_with("API error: "));
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_to_truncation() {
        let generator = ScriptedGenerator::replying("Sure! Here is your summary: tie knots");
        let record = summarize(&generator, &long_text(), "Pioneering", "2a").await;
        assert_eq!(record.summary, "Demonstrate tying the bowline knot in u…");
        assert!(record.flag.unwrap().starts_with("API error: "));
    }

    #[tokio::test]
    async fn client_posts_to_messages_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "{\"summary\": \"ok\", \"flag\": null}"}]
            })))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("test-key", "claude-sonnet-4-20250514", 150)
            .unwrap()
            .with_endpoint(&server.uri());
        let reply = client.generate("prompt").await.unwrap();
        assert_eq!(reply, "{\"summary\": \"ok\", \"flag\": null}");
    }

    #[tokio::test]
    async fn client_surfaces_non_2xx_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(429).set_body_string("{\"error\": \"rate_limited\"}"),
            )
            .mount(&server)
            .await;

        let client = AnthropicClient::new("test-key", "claude-sonnet-4-20250514", 150)
            .unwrap()
            .with_endpoint(&server.uri());
        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn client_rejects_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("test-key", "claude-sonnet-4-20250514", 150)
            .unwrap()
            .with_endpoint(&server.uri());
        assert!(matches!(
            client.generate("prompt").await,
            Err(AgentError::ParseError(_))
        ));
    }
}
