use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::error::ClassifyError;
use super::insights::ReviewInsights;
use super::prompt::{system_prompt, user_message};
use super::schema::{RESPONSE_SCHEMA, SCHEMA_NAME};
use crate::config::LlmConfig;

/// Longest provider error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// The one capability the pipeline needs from a model provider: turn a
/// review text into validated insights, or fail.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ReviewInsights, ClassifyError>;
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Classifier backed by an OpenAI-compatible chat-completions endpoint
/// using strict structured output.
#[derive(Debug, Clone)]
pub struct LlmClassifier {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl LlmClassifier {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("building HTTP client")?;

        // without a trailing slash `join` would replace the last segment
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)
            .with_context(|| format!("invalid base URL {}", config.base_url))?
            .join("chat/completions")
            .context("building chat/completions URL")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system_prompt: system_prompt(&config.subject),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": 0.0,
            "max_tokens": self.max_tokens,
            "n": 1,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": user_message(text) },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": RESPONSE_SCHEMA.clone(),
                },
            },
        })
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, text: &str) -> Result<ReviewInsights, ClassifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ClassifyError::EmptyResponse)?;

        debug!(bytes = content.len(), "model response received");
        ReviewInsights::from_model_output(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::insights::tests::{app_crash_json, refund_scam_json};
    use crate::classify::labels::{
        ChurnRiskLabel, EmotionLabel, IssueType, JourneyStage, ResolutionStatus, ReviewMention,
        ReviewTone, SentimentLabel,
    };
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LlmConfig {
        LlmConfig {
            api_key: Some("test-key".into()),
            model: "test-model".into(),
            // no trailing slash on purpose
            base_url: format!("{}/v1", server.uri()),
            timeout_secs: 5,
            max_tokens: 1000,
            subject: "Lyca Mobile".into(),
        }
    }

    fn chat_reply(content: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    #[tokio::test]
    async fn sends_deterministic_structured_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "temperature": 0.0,
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "review_insights", "strict": true }
                }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_reply(&refund_scam_json().to_string())),
            )
            .expect(1)
            .mount(&server)
            .await;

        let classifier = LlmClassifier::new(&config_for(&server)).unwrap();
        let insights = classifier
            .classify("Cancelled 3 months ago and still no refund, absolute scam")
            .await
            .unwrap();

        assert_eq!(insights.sentiment_label, SentimentLabel::Negative);
        assert!(insights.sentiment_score < -0.4);
        assert!(matches!(
            insights.primary_emotion,
            EmotionLabel::Betrayal | EmotionLabel::Anger | EmotionLabel::Frustration
        ));
        assert_eq!(insights.journey_stage, JourneyStage::PostExitRefund);
        assert_eq!(
            insights.primary_issue_type,
            IssueType::CancellationRefundIssue
        );
        assert_eq!(insights.resolution_status, ResolutionStatus::Unresolved);
        assert_eq!(insights.churn_risk, ChurnRiskLabel::High);
    }

    #[tokio::test]
    async fn app_crash_example_round_trips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_reply(&app_crash_json().to_string())),
            )
            .mount(&server)
            .await;

        let classifier = LlmClassifier::new(&config_for(&server)).unwrap();
        let insights = classifier
            .classify("I love Lyca, but the app crashes every time I try to top up")
            .await
            .unwrap();

        assert_eq!(
            insights.primary_mention,
            ReviewMention::AppWebsiteExperience
        );
        assert_eq!(insights.primary_issue_type, IssueType::AppWebsiteIssue);
        assert!(matches!(
            insights.review_tone,
            ReviewTone::Compliment | ReviewTone::Mixed
        ));
        assert!(matches!(
            insights.churn_risk,
            ChurnRiskLabel::Low | ChurnRiskLabel::Medium
        ));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let classifier = LlmClassifier::new(&config_for(&server)).unwrap();
        let err = classifier.classify("hello").await.unwrap_err();
        match err {
            ClassifyError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_and_invalid_content_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_reply(r#"{"sentiment_label":"furious"}"#)),
            )
            .mount(&server)
            .await;

        let classifier = LlmClassifier::new(&config_for(&server)).unwrap();
        let first = classifier.classify("hello").await.unwrap_err();
        assert_eq!(first.kind(), "empty_response");
        let second = classifier.classify("hello").await.unwrap_err();
        assert_eq!(second.kind(), "schema");
    }

    #[test]
    fn request_body_shape() {
        let cfg = LlmConfig {
            api_key: Some("k".into()),
            model: "m".into(),
            base_url: "http://localhost:1/v1/".into(),
            timeout_secs: 5,
            max_tokens: 321,
            subject: "Acme".into(),
        };
        let classifier = LlmClassifier::new(&cfg).unwrap();
        assert_eq!(
            classifier.endpoint.as_str(),
            "http://localhost:1/v1/chat/completions"
        );
        let body = classifier.request_body("text");
        assert_eq!(body["max_tokens"], 321);
        assert_eq!(body["messages"][1]["content"], "[REVIEW]\ntext");
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["additionalProperties"],
            false
        );
    }
}
