use crate::domain::model::{Credential, ModelHandle, ServiceError};
use crate::domain::ports::GenerativeService;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// REST client for the Gemini `generateContent` API.
///
/// Each request carries the handle's own credential in a header, so handles
/// bound to different keys can be used side by side.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, model)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[async_trait]
impl GenerativeService for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn bind(&self, credential: &Credential) -> Result<(), ServiceError> {
        let response = self
            .client
            .get(self.model_url())
            .header(API_KEY_HEADER, credential.expose())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }

    async fn generate(&self, handle: &ModelHandle, prompt: &str) -> Result<String, ServiceError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url,
                handle.model()
            ))
            .header(API_KEY_HEADER, handle.credential().expose())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let payload: GenerateResponse =
            response.json().await.map_err(|e| ServiceError::Unavailable {
                message: format!("unreadable response: {}", e),
            })?;
        response_text(payload)
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Unavailable {
        message: e.to_string(),
    }
}

/// Map an unsuccessful HTTP response to a service error.
pub fn classify_failure(status: StatusCode, body: &str) -> ServiceError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (
            envelope
                .error
                .message
                .unwrap_or_else(|| status.to_string()),
            envelope.error.status.unwrap_or_default(),
        ),
        Err(_) => (truncate(body, 200), String::new()),
    };
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message
    };

    if status == StatusCode::TOO_MANY_REQUESTS || api_status == "RESOURCE_EXHAUSTED" {
        ServiceError::QuotaExceeded { message }
    } else if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("API_KEY_INVALID")
    {
        ServiceError::InvalidCredential { message }
    } else if status.is_server_error() {
        ServiceError::Unavailable { message }
    } else {
        ServiceError::Rejected { message }
    }
}

fn response_text(payload: GenerateResponse) -> Result<String, ServiceError> {
    let Some(candidate) = payload.candidates.into_iter().next() else {
        let reason = payload
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(ServiceError::Rejected {
            message: format!("prompt blocked: {}", reason),
        });
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "EMPTY".to_string());
        return Err(ServiceError::Rejected {
            message: format!("empty response (finish reason: {})", reason),
        });
    }
    Ok(text.trim().to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quota_and_credential_errors() {
        let quota = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, quota),
            ServiceError::QuotaExceeded {
                message: "Quota exceeded".to_string()
            }
        );

        let invalid = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, invalid),
            ServiceError::InvalidCredential { .. }
        ));
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, ""),
            ServiceError::InvalidCredential { .. }
        ));
    }

    #[test]
    fn test_classify_other_errors() {
        assert!(matches!(
            classify_failure(StatusCode::SERVICE_UNAVAILABLE, "upstream down"),
            ServiceError::Unavailable { .. }
        ));
        let bad_request = r#"{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST, bad_request),
            ServiceError::Rejected {
                message: "Invalid JSON payload".to_string()
            }
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let payload: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Part one. "}, {"text": "Part two.\n"}], "role": "model"},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response_text(payload).unwrap(), "Part one. Part two.");
    }

    #[test]
    fn test_blocked_prompt_is_rejected() {
        let payload: GenerateResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(
            response_text(payload).unwrap_err(),
            ServiceError::Rejected {
                message: "prompt blocked: SAFETY".to_string()
            }
        );
    }
}
