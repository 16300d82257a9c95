//! OpenAI-compatible chat completions provider.
//!
//! Asks the model for a JSON object and runs the result through the exercise
//! schema. Any transport failure, non-2xx status, undecodable body, or schema
//! violation is returned as a [`ContentError`]; nothing is repaired.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use langdrill_core::content::{ExerciseContent, BLANK_MARKER};
use langdrill_core::error::ContentError;
use langdrill_core::params::GenerationParams;
use langdrill_core::traits::{ContentProvider, ContentRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const TEMPERATURE: f64 = 0.7;

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// System and user prompts for one request.
fn build_prompts(request: &ContentRequest) -> (String, String) {
    let topic = request
        .options
        .get("topic")
        .and_then(|v| v.as_str())
        .map(|t| format!(" Topic: {t}."))
        .unwrap_or_default();

    match &request.params {
        GenerationParams::Speech(p) => (
            format!(
                "Generate short, functional everyday phrases at A1/A2 level. \
                 Each phrase has at most {} words. \
                 Respond only with JSON of the form {{\"phrases\": [{{\"id\": string, \"target\": string}}]}}.",
                p.max_words
            ),
            format!("Make {} phrases for daily use.{topic}", p.count),
        ),
        GenerationParams::Prepositions(p) => (
            format!(
                "Create simple concrete sentences, each with exactly {} preposition blank(s). \
                 Use only these prepositions: {}. Mark every blank with the token '{BLANK_MARKER}'. \
                 Respond only with JSON of the form \
                 {{\"items\": [{{\"id\": string, \"tokens\": [string], \"answer\": [string]}}]}} \
                 where answer lists the missing prepositions in order.",
                p.blanks,
                p.allowed.join(", ")
            ),
            format!("Make {} items. Keep language concrete.{topic}", p.count),
        ),
        GenerationParams::SentenceTf(p) => {
            let mut flags = Vec::new();
            if p.inference {
                flags.push("Include at least one claim that needs a simple inference.");
            }
            if p.negation {
                flags.push("Sometimes phrase the claim with a negation.");
            }
            (
                "Create short, concrete passages with a single true/false claim about each; \
                 avoid relying on world knowledge. Respond only with JSON of the form \
                 {\"items\": [{\"id\": string, \"passage\": string, \"claim\": string, \"answer\": boolean}]}."
                    .to_string(),
                format!(
                    "Make {} items. Passages: {} sentence(s). {}{topic}",
                    p.count,
                    p.sentences,
                    flags.join(" ")
                ),
            )
        }
    }
}

#[async_trait]
impl ContentProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model, exercise = %request.exercise()))]
    async fn generate(&self, request: &ContentRequest) -> Result<ExerciseContent, ContentError> {
        let start = Instant::now();
        let (system, user) = build_prompts(request);

        let body = ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ContentError::Timeout {
                        after_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    ContentError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ContentError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Authentication(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Api {
                status,
                message: body,
            });
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ContentError::Malformed(format!("failed to parse response: {e}")))?;

        let raw = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ContentError::Malformed("response has no message content".into()))?;

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ContentError::Malformed(format!("content is not JSON: {e}")))?;

        let content = ExerciseContent::from_json(&request.params, value)?;
        tracing::debug!(
            items = content.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "content generated"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use langdrill_core::error::SchemaViolation;
    use langdrill_core::model::ExerciseKind;
    use langdrill_core::params::derive_params;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"content": content, "role": "assistant"}, "index": 0}],
            "model": "gpt-4o-mini",
            "usage": {"prompt_tokens": 40, "completion_tokens": 15, "total_tokens": 55}
        })
    }

    fn provider(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new("test-key", Some(server.uri()), None, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({"phrases": [
            {"id": "s0", "target": "Good morning"},
            {"id": "s1", "target": "I need help"},
            {"id": "s2", "target": "Thank you"}
        ]});

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&payload.to_string())))
            .mount(&server)
            .await;

        let request = ContentRequest::new(derive_params(ExerciseKind::Speech, 1));
        let content = provider(&server).generate(&request).await.unwrap();
        assert_eq!(content.exercise(), ExerciseKind::Speech);
        assert_eq!(content.len(), 3);
    }

    #[tokio::test]
    async fn blank_mismatch_fails_closed() {
        let server = MockServer::start().await;
        // Level 4 needs three blanks; the model returns one.
        let payload = serde_json::json!({"items": [
            {"id": "p0", "tokens": ["The", "book", "is", "{blank}", "the", "table"], "answer": ["on"]},
            {"id": "p1", "tokens": ["The", "book", "is", "{blank}", "the", "table"], "answer": ["on"]},
            {"id": "p2", "tokens": ["The", "book", "is", "{blank}", "the", "table"], "answer": ["on"]}
        ]});

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&payload.to_string())))
            .mount(&server)
            .await;

        let request = ContentRequest::new(derive_params(ExerciseKind::Prepositions, 4));
        let err = provider(&server).generate(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ContentError::Schema(SchemaViolation::BlankMismatch { expected: 3, .. })
        ));
    }

    #[tokio::test]
    async fn non_json_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Sure! Here are some items:")))
            .mount(&server)
            .await;

        let request = ContentRequest::new(derive_params(ExerciseKind::SentenceTf, 2));
        let err = provider(&server).generate(&request).await.unwrap_err();
        assert!(matches!(err, ContentError::Malformed(_)));
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let request = ContentRequest::new(derive_params(ExerciseKind::Speech, 3));
        let err = provider(&server).generate(&request).await.unwrap_err();
        assert!(matches!(err, ContentError::Malformed(_)));
    }

    #[tokio::test]
    async fn error_statuses_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let request = ContentRequest::new(derive_params(ExerciseKind::Speech, 1));
        let err = provider(&server).generate(&request).await.unwrap_err();
        assert!(matches!(err, ContentError::Api { status: 500, .. }));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;
        let err = provider(&server).generate(&request).await.unwrap_err();
        assert!(matches!(err, ContentError::Authentication(_)));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;
        let err = provider(&server).generate(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ContentError::RateLimited {
                retry_after_ms: 2000
            }
        ));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body("{}"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let provider =
            OpenAiProvider::new("k", Some(server.uri()), None, Duration::from_millis(200)).unwrap();
        let request = ContentRequest::new(derive_params(ExerciseKind::Speech, 1));
        let err = provider.generate(&request).await.unwrap_err();
        assert!(err.is_timeout(), "got {err:?}");
    }

    #[test]
    fn prompts_carry_parameters() {
        let (system, user) = build_prompts(&ContentRequest::new(derive_params(
            ExerciseKind::Prepositions,
            4,
        )));
        assert!(system.contains("exactly 3 preposition blank"));
        assert!(system.contains("in, on, at, under, over, between, behind"));
        assert!(system.contains("{blank}"));
        assert!(user.starts_with("Make 5 items"));

        let mut request = ContentRequest::new(derive_params(ExerciseKind::SentenceTf, 5));
        request
            .options
            .insert("topic".into(), serde_json::Value::String("cooking".into()));
        let (_, user) = build_prompts(&request);
        assert!(user.contains("2 sentence(s)"));
        assert!(user.contains("negation"));
        assert!(user.contains("Topic: cooking."));
    }

    #[test]
    fn debug_masks_key() {
        let provider =
            OpenAiProvider::new("sk-secret", None, None, Duration::from_secs(1)).unwrap();
        let debug = format!("{provider:?}");
        assert!(!debug.contains("sk-secret"));
        assert_eq!(provider.model(), DEFAULT_MODEL);
    }
}
