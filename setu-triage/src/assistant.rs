//! Emergency Assistant with Deterministic Fallback
//!
//! Wraps the LLM-backed emergency Q&A service (Ollama generate API). Any
//! failure (unreachable, timeout, non-success status, empty answer) yields a
//! static helpline message instead of an error, tagged with the reason so the
//! failure stays observable.
//!
//! Not part of triage decision-making.

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Prepended to every user message
pub const SAFETY_PREAMBLE: &str = "You are the Setu emergency assistant and follow national disaster-management safety rules.

RULES:
1. Always prioritize life safety first
2. Never claim government help has been dispatched
3. Never fabricate evacuation orders
4. Keep answers short and actionable (under 100 words)
5. Always include relevant helpline numbers

EMERGENCY HELPLINES:
- National Emergency: 112
- Fire: 101
- Ambulance: 108
- Police: 100
- Disaster Management Helpline: 1078

USER QUERY: ";

/// Returned whenever the assistant cannot answer
pub const FALLBACK_MESSAGE: &str = "AI Assistant temporarily unavailable.

For emergencies, call:
- Emergency: 112
- Fire: 101
- Ambulance: 108
- Police: 100
- Disaster Management: 1078";

/// Why the fallback message was returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// Connection refused / host unreachable
    Unreachable,
    /// No answer within the assistant timeout
    Timeout,
    /// Assistant answered with a non-success HTTP status
    BadStatus(u16),
    /// Assistant answered without any text
    EmptyResponse,
    /// Any other transport or decoding failure
    Transport(String),
}

/// Assistant outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    Answer {
        text: String,
        model: String,
        duration_ms: u64,
    },
    Fallback {
        text: &'static str,
        reason: FallbackReason,
    },
}

impl AssistantReply {
    pub fn fallback(reason: FallbackReason) -> Self {
        AssistantReply::Fallback {
            text: FALLBACK_MESSAGE,
            reason,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            AssistantReply::Answer { text, .. } => text,
            AssistantReply::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AssistantReply::Fallback { .. })
    }
}

/// Assistant readiness as seen from this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantStatus {
    pub online: bool,
    pub model_ready: bool,
    pub expected_model: String,
    pub available_models: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_ctx: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagsModel>,
}

#[derive(Debug, Deserialize)]
struct TagsModel {
    name: String,
}

/// Ollama-compatible assistant client
#[derive(Debug, Clone)]
pub struct AssistantClient {
    base_url: String,
    model: String,
    timeout: Duration,
    probe_timeout: Duration,
    http_client: Client,
}

impl AssistantClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        probe_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
            probe_timeout,
            http_client: Client::builder()
                .build()
                .context("Failed to build assistant HTTP client")?,
        })
    }

    /// Ask the assistant; never fails
    ///
    /// The whole exchange (connect, generate, decode) is bounded by the
    /// configured timeout.
    pub async fn ask(&self, message: &str) -> AssistantReply {
        let started = Instant::now();
        debug!(model = %self.model, chars = message.len(), "Calling assistant");

        let reply = match tokio::time::timeout(self.timeout, self.generate(message)).await {
            Ok(Ok(text)) => AssistantReply::Answer {
                text,
                model: self.model.clone(),
                duration_ms: started.elapsed().as_millis() as u64,
            },
            Ok(Err(reason)) => AssistantReply::fallback(reason),
            Err(_) => AssistantReply::fallback(FallbackReason::Timeout),
        };

        match &reply {
            AssistantReply::Answer { duration_ms, .. } => {
                info!(model = %self.model, duration_ms, "Assistant answered");
            }
            AssistantReply::Fallback { reason, .. } => {
                warn!(
                    model = %self.model,
                    reason = ?reason,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Assistant unavailable, returning fallback message"
                );
            }
        }

        reply
    }

    async fn generate(&self, message: &str) -> Result<String, FallbackReason> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: format!("{}{}", SAFETY_PREAMBLE, message.trim()),
            stream: false,
            options: GenerateOptions {
                temperature: 0.3,
                top_p: 0.9,
                num_ctx: 2048,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            return Err(FallbackReason::BadStatus(response.status().as_u16()));
        }

        let body: GenerateResponse = response.json().await.map_err(classify_transport_error)?;

        body.response
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(FallbackReason::EmptyResponse)
    }

    /// Check assistant reachability and whether the configured model is installed
    pub async fn probe(&self) -> AssistantStatus {
        let offline = AssistantStatus {
            online: false,
            model_ready: false,
            expected_model: self.model.clone(),
            available_models: Vec::new(),
        };

        let response = match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "Assistant probe returned error status");
                return offline;
            }
            Err(e) => {
                debug!(error = %e, "Assistant probe failed");
                return offline;
            }
        };

        let available_models: Vec<String> = match response.json::<TagsResponse>().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                debug!(error = %e, "Assistant tags response unreadable");
                Vec::new()
            }
        };

        let model_ready = available_models.iter().any(|name| name.contains(&self.model));

        AssistantStatus {
            online: true,
            model_ready,
            expected_model: self.model.clone(),
            available_models,
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> FallbackReason {
    if err.is_timeout() {
        FallbackReason::Timeout
    } else if err.is_connect() {
        FallbackReason::Unreachable
    } else {
        FallbackReason::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_text_is_static_message() {
        let reply = AssistantReply::fallback(FallbackReason::Timeout);
        assert!(reply.is_fallback());
        assert_eq!(reply.text(), FALLBACK_MESSAGE);
        assert!(reply.text().contains("112"));
    }

    #[test]
    fn test_preamble_lists_helplines() {
        assert!(SAFETY_PREAMBLE.contains("Never claim government help has been dispatched"));
        assert!(SAFETY_PREAMBLE.ends_with("USER QUERY: "));
    }

    #[test]
    fn test_fallback_reason_serialization() {
        let value = serde_json::to_value(FallbackReason::BadStatus(502)).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "bad_status", "detail": 502}));

        let value = serde_json::to_value(FallbackReason::Unreachable).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "unreachable"}));
    }

    #[tokio::test]
    async fn test_unreachable_assistant_falls_back() {
        let client = AssistantClient::new(
            "http://127.0.0.1:1",
            "setu-assistant",
            Duration::from_secs(2),
            Duration::from_millis(200),
        )
        .unwrap();

        let reply = client.ask("Where is the nearest shelter?").await;
        assert_eq!(reply, AssistantReply::fallback(FallbackReason::Unreachable));

        let status = client.probe().await;
        assert!(!status.online);
        assert!(!status.model_ready);
    }
}
