//! Vision provider trait, the HTTP implementation, and test doubles.
//!
//! `VisionProvider` is the seam the recognition engine is generic over.
//! `HttpVisionProvider` speaks the annotate API over reqwest;
//! `StaticProvider` and `OfflineProvider` stand in for it in tests and
//! offline runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::IrisError;
use crate::types::Detection;

/// A scene-level label with the provider's confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelAnnotation {
    pub description: String,
    pub score: f64,
}

/// A localized object with the provider's confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectAnnotation {
    pub name: String,
    pub score: f64,
}

/// Everything a provider said about one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub labels: Vec<LabelAnnotation>,
    #[serde(default)]
    pub objects: Vec<ObjectAnnotation>,
}

impl ProviderResponse {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.objects.is_empty()
    }

    /// Flatten into the matcher's input: labels first, then objects,
    /// provider order preserved within each group.
    pub fn into_detections(self) -> Vec<Detection> {
        let mut detections = Vec::with_capacity(self.labels.len() + self.objects.len());
        for label in self.labels {
            detections.push(Detection::new(label.description, label.score));
        }
        for object in self.objects {
            detections.push(Detection::new(object.name, object.score));
        }
        detections
    }
}

#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<ProviderResponse, IrisError>;

    /// Short name for log lines.
    fn name(&self) -> &str;
}

/// Annotate-API client. Needs an API key; without one every classify call
/// reports the provider unavailable so callers drop to their fallbacks.
pub struct HttpVisionProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_results: u32,
}

impl HttpVisionProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, IrisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IrisError::ProviderUnavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.resolved_api_key(),
            max_results: config.max_results,
        })
    }
}

/// Request body for the annotate endpoint: one image, label detection and
/// object localization in a single round trip.
fn annotate_request(image: &[u8], max_results: u32) -> Value {
    serde_json::json!({
        "requests": [{
            "image": { "content": BASE64.encode(image) },
            "features": [
                { "type": "LABEL_DETECTION", "maxResults": max_results },
                { "type": "OBJECT_LOCALIZATION", "maxResults": max_results }
            ]
        }]
    })
}

/// Pull labels and objects out of an annotate response body.
fn parse_annotate_response(body: &Value) -> Result<ProviderResponse, IrisError> {
    let first = body
        .get("responses")
        .and_then(|r| r.get(0))
        .ok_or_else(|| IrisError::MalformedResponse("no responses array".to_string()))?;

    if let Some(error) = first.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unspecified provider error");
        return Err(IrisError::ProviderUnavailable(message.to_string()));
    }

    let mut response = ProviderResponse::default();

    if let Some(labels) = first.get("labelAnnotations").and_then(|l| l.as_array()) {
        for label in labels {
            let description = label.get("description").and_then(|d| d.as_str());
            let score = label.get("score").and_then(|s| s.as_f64());
            if let (Some(description), Some(score)) = (description, score) {
                response.labels.push(LabelAnnotation {
                    description: description.to_string(),
                    score,
                });
            }
        }
    }

    if let Some(objects) = first
        .get("localizedObjectAnnotations")
        .and_then(|o| o.as_array())
    {
        for object in objects {
            let name = object.get("name").and_then(|n| n.as_str());
            let score = object.get("score").and_then(|s| s.as_f64());
            if let (Some(name), Some(score)) = (name, score) {
                response.objects.push(ObjectAnnotation {
                    name: name.to_string(),
                    score,
                });
            }
        }
    }

    Ok(response)
}

#[async_trait]
impl VisionProvider for HttpVisionProvider {
    async fn classify(&self, image: &[u8]) -> Result<ProviderResponse, IrisError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            IrisError::ProviderUnavailable("no API key configured".to_string())
        })?;

        let url = format!("{}?key={}", self.endpoint, key);
        let body = annotate_request(image, self.max_results);

        debug!("sending annotate request for {} bytes", image.len());
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IrisError::ProviderUnavailable(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IrisError::ProviderUnavailable(format!(
                "provider returned {status}"
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| IrisError::MalformedResponse(format!("invalid JSON: {e}")))?;
        parse_annotate_response(&body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Canned provider for tests. Returns the same response every call and
/// counts how often it was asked.
pub struct StaticProvider {
    response: ProviderResponse,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn returning(response: ProviderResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_labels(labels: &[(&str, f64)]) -> Self {
        Self::returning(ProviderResponse {
            labels: labels
                .iter()
                .map(|(description, score)| LabelAnnotation {
                    description: description.to_string(),
                    score: *score,
                })
                .collect(),
            objects: Vec::new(),
        })
    }

    pub fn empty() -> Self {
        Self::returning(ProviderResponse::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionProvider for StaticProvider {
    async fn classify(&self, _image: &[u8]) -> Result<ProviderResponse, IrisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Provider that always reports itself unreachable. Backs offline mode
/// and the failure-path tests.
pub struct OfflineProvider;

#[async_trait]
impl VisionProvider for OfflineProvider {
    async fn classify(&self, _image: &[u8]) -> Result<ProviderResponse, IrisError> {
        Err(IrisError::ProviderUnavailable("offline mode".to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_extracts_labels_and_objects_in_order() {
        let body = json!({
            "responses": [{
                "labelAnnotations": [
                    { "description": "Mobile phone", "score": 0.92 },
                    { "description": "Gadget", "score": 0.81 }
                ],
                "localizedObjectAnnotations": [
                    { "name": "Phone", "score": 0.88 }
                ]
            }]
        });
        let response = parse_annotate_response(&body).expect("parse");
        let detections = response.into_detections();
        assert_eq!(detections.len(), 3);
        assert_eq!(detections[0].label, "Mobile phone");
        assert_eq!(detections[1].label, "Gadget");
        assert_eq!(detections[2].label, "Phone");
    }

    #[test]
    fn test_parse_skips_malformed_annotations() {
        let body = json!({
            "responses": [{
                "labelAnnotations": [
                    { "description": "Toaster" },
                    { "score": 0.9 },
                    { "description": "Blender", "score": 0.7 }
                ]
            }]
        });
        let response = parse_annotate_response(&body).expect("parse");
        assert_eq!(response.labels.len(), 1);
        assert_eq!(response.labels[0].description, "Blender");
    }

    #[test]
    fn test_parse_surfaces_provider_error() {
        let body = json!({
            "responses": [{ "error": { "message": "quota exceeded" } }]
        });
        let err = parse_annotate_response(&body).unwrap_err();
        assert!(matches!(err, IrisError::ProviderUnavailable(m) if m.contains("quota")));
    }

    #[test]
    fn test_parse_rejects_missing_responses() {
        let body = json!({ "unexpected": true });
        let err = parse_annotate_response(&body).unwrap_err();
        assert!(matches!(err, IrisError::MalformedResponse(_)));
    }

    #[test]
    fn test_empty_response_has_no_detections() {
        let body = json!({ "responses": [{}] });
        let response = parse_annotate_response(&body).expect("parse");
        assert!(response.is_empty());
        assert!(response.into_detections().is_empty());
    }

    #[test]
    fn test_annotate_request_carries_both_features() {
        let body = annotate_request(b"bytes", 10);
        let features = body["requests"][0]["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["type"], "LABEL_DETECTION");
        assert_eq!(features[1]["type"], "OBJECT_LOCALIZATION");
        assert_eq!(body["requests"][0]["image"]["content"], BASE64.encode(b"bytes"));
    }

    #[tokio::test]
    async fn test_static_provider_counts_calls() {
        let provider = StaticProvider::with_labels(&[("toaster", 0.9)]);
        assert_eq!(provider.call_count(), 0);
        provider.classify(b"img").await.expect("classify");
        provider.classify(b"img").await.expect("classify");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_offline_provider_is_always_unavailable() {
        let err = OfflineProvider.classify(b"img").await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_http_provider_without_key_is_unavailable() {
        let provider = HttpVisionProvider {
            client: reqwest::Client::new(),
            endpoint: "http://127.0.0.1:1".to_string(),
            api_key: None,
            max_results: 5,
        };
        let err = provider.classify(b"img").await.unwrap_err();
        assert!(matches!(err, IrisError::ProviderUnavailable(_)));
    }
}
