use std::time::Duration;

use regex::Regex;
use reqwest::{header, Client};
use serde_json::Value;

use crate::config::ClassifierConfig;
use crate::error::{IdentifyError, Result};
use crate::models::RawClassification;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_START_MS: u64 = 250;
const ERROR_BODY_MAX_CHARS: usize = 500;
const DEPRECATION_MARKER: &str = "deprecated and no longer supported";

/// Client for the hosted image-classification endpoint. Sends raw image
/// bytes with a bearer credential and returns the top prediction.
#[derive(Clone, Debug)]
pub struct ClassifierClient {
    client: Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl ClassifierClient {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url,
            api_key: config.api_key,
            model_id: config.model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Classifies one image. Transient failures (unreachable endpoint, 5xx)
    /// are retried up to 3 total attempts with backoff starting at 250ms
    /// and doubling per retry; the last error is surfaced after exhaustion.
    pub async fn classify(&self, image: &[u8], content_type: &str) -> Result<RawClassification> {
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = BACKOFF_START_MS << (attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.classify_once(image, content_type).await {
                Ok(raw) => return Ok(raw),
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %err,
                        "classifier attempt failed, retrying"
                    );
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or_else(|| IdentifyError::UpstreamUnavailable {
            status: None,
            message: "classifier retries exhausted".to_string(),
        }))
    }

    async fn classify_once(&self, image: &[u8], content_type: &str) -> Result<RawClassification> {
        let url = format!("{}/models/{}", self.base_url, self.model_id);
        let content_type = if content_type.trim().is_empty() {
            "application/octet-stream"
        } else {
            content_type
        };

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, content_type)
            .body(image.to_vec())
            .send()
            .await
            .map_err(|err| IdentifyError::UpstreamUnavailable {
                status: None,
                message: format!("classifier endpoint unreachable: {err}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), &body));
        }

        let data =
            response
                .json::<Value>()
                .await
                .map_err(|err| IdentifyError::UpstreamUnavailable {
                    status: None,
                    message: format!("failed to decode classifier response: {err}"),
                })?;

        Ok(match top_prediction(&data) {
            Some((label, score)) => RawClassification { label, score },
            None => RawClassification {
                label: "Unknown".to_string(),
                score: 0.0,
            },
        })
    }
}

/// Maps a non-success HTTP response to the error taxonomy. A 410 carrying
/// the provider's deprecation message is fatal and actionable; 5xx is
/// transient; everything else is a hard rejection.
fn classify_http_error(status: u16, body: &str) -> IdentifyError {
    let sanitized = sanitize_error_body(body);

    if status == 410 && body.contains(DEPRECATION_MARKER) {
        return IdentifyError::UpstreamDeprecated(
            "the configured model is no longer served by the provider; \
             reconfigure ECOLENS_CLASSIFIER_MODEL_ID to a supported \
             image-classification model (e.g. facebook/deit-base-distilled-patch16-224)"
                .to_string(),
        );
    }

    if (500..600).contains(&status) {
        return IdentifyError::UpstreamUnavailable {
            status: Some(status),
            message: sanitized,
        };
    }

    // Prefer a JSON error field when the body parses, else the sanitized text.
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(sanitized);

    IdentifyError::UpstreamRejected { status, message }
}

/// Picks the top prediction out of the endpoint's response. Some models
/// return a flat `[{label, score}]` list, others nest it one level deeper.
fn top_prediction(data: &Value) -> Option<(String, f64)> {
    let first = data.as_array()?.first()?;
    let candidate = if first.is_array() {
        first.as_array()?.first()?
    } else {
        first
    };

    let label = candidate.get("label")?.as_str()?.to_string();
    let score = candidate.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    Some((label, score))
}

/// Strips classifier-specific formatting down to a single canonical label.
/// Many models return synonym lists like
/// "loggerhead, loggerhead turtle, Caretta caretta".
///
/// When the first segment trims to empty the whole trimmed label is kept,
/// and only a fully empty label becomes "Unknown".
pub fn clean_label(raw: &str) -> String {
    let first_segment = raw.split(',').next().unwrap_or("").trim();
    if !first_segment.is_empty() {
        return first_segment.to_string();
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn confidence_from_score(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Error bodies may be whole HTML pages. Strip markup, collapse whitespace
/// and truncate before the text reaches logs or error messages.
pub(crate) fn sanitize_error_body(body: &str) -> String {
    let tag_re = Regex::new(r"<[^>]*>").unwrap_or_else(|_| Regex::new("^$").unwrap());
    let ws_re = Regex::new(r"\s+").unwrap_or_else(|_| Regex::new("^$").unwrap());

    let no_tags = tag_re.replace_all(body, "");
    let collapsed = ws_re.replace_all(&no_tags, " ").trim().to_string();

    if collapsed.is_empty() {
        return "<empty body>".to_string();
    }
    if collapsed.chars().count() > ERROR_BODY_MAX_CHARS {
        let truncated: String = collapsed.chars().take(ERROR_BODY_MAX_CHARS).collect();
        return format!("{truncated}...");
    }
    collapsed
}
