//! JSON bodies exchanged over the HTTP API.

use serde::{Deserialize, Serialize};

use crate::verdict::{ConfidenceLevel, Prediction, Verdict};

/// Number of characters kept in [`AnalysisResult::text_preview`].
pub const PREVIEW_CHARS: usize = 200;

/// Source reported when the client does not send one.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl AnalysisRequest {
    pub fn source_url(&self) -> &str {
        self.source_url.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }
}

/// Successful `/analyze` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Class index: 0 = Real, 1 = Fake.
    pub prediction: u8,
    pub prediction_label: Verdict,
    pub confidence: f32,
    pub confidence_percentage: String,
    pub confidence_level: ConfidenceLevel,
    pub text_preview: String,
    pub source_url: String,
    pub characters_analyzed: usize,
}

impl AnalysisResult {
    pub fn new(prediction: Prediction, text: &str, source_url: impl Into<String>) -> Self {
        Self {
            prediction: prediction.verdict.class_index(),
            prediction_label: prediction.verdict,
            confidence: prediction.confidence,
            confidence_percentage: prediction.percentage(),
            confidence_level: prediction.level(),
            text_preview: text_preview(text),
            source_url: source_url.into(),
            characters_analyzed: text.chars().count(),
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, with `...` appended when cut.
pub fn text_preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".into(),
            model_loaded: true,
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".into(),
            model_loaded: false,
            error: Some(error.into()),
        }
    }
}

/// Error body shared by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preview_keeps_short_text_verbatim() {
        assert_eq!(text_preview(""), "");
        assert_eq!(text_preview("short claim"), "short claim");

        let exact = "a".repeat(PREVIEW_CHARS);
        assert_eq!(text_preview(&exact), exact);
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "b".repeat(PREVIEW_CHARS + 1);
        let preview = text_preview(&long);
        assert_eq!(preview, format!("{}...", "b".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        // 250 two-byte characters.
        let text = "é".repeat(250);
        let preview = text_preview(&text);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.starts_with(&"é".repeat(PREVIEW_CHARS)));
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn request_defaults_source_url() {
        let req: AnalysisRequest = serde_json::from_value(json!({"text": "hello"})).unwrap();
        assert_eq!(req.source_url(), "Unknown");

        let req: AnalysisRequest =
            serde_json::from_value(json!({"text": "hello", "source_url": "https://example.org/a"}))
                .unwrap();
        assert_eq!(req.source_url(), "https://example.org/a");
    }

    #[test]
    fn result_carries_meta_fields() {
        let text = "Breaking: scientists confirm the moon is made of cheese.";
        let prediction = Prediction::new(1, 0.9).unwrap();
        let result = AnalysisResult::new(prediction, text, "https://example.org");

        assert_eq!(result.prediction, 1);
        assert_eq!(result.prediction_label, Verdict::Fake);
        assert_eq!(result.confidence_percentage, "90.00%");
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
        assert_eq!(result.text_preview, text);
        assert_eq!(result.characters_analyzed, text.chars().count());
        assert_eq!(result.source_url, "https://example.org");
    }

    #[test]
    fn characters_analyzed_is_char_count() {
        let text = "naïve café ☕";
        let result = AnalysisResult::new(Prediction::new(0, 0.6).unwrap(), text, UNKNOWN_SOURCE);
        assert_eq!(result.characters_analyzed, 12);
    }

    #[test]
    fn result_json_shape() {
        let result = AnalysisResult::new(Prediction::new(0, 0.5).unwrap(), "x", UNKNOWN_SOURCE);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["prediction"], 0);
        assert_eq!(value["prediction_label"], "Real");
        assert_eq!(value["confidence_percentage"], "50.00%");
        assert_eq!(value["confidence_level"], "Low");
        assert_eq!(value["source_url"], "Unknown");
        assert_eq!(value["characters_analyzed"], 1);
    }

    #[test]
    fn health_report_omits_error_when_healthy() {
        let healthy = serde_json::to_value(HealthReport::healthy()).unwrap();
        assert_eq!(healthy, json!({"status": "healthy", "model_loaded": true}));

        let unhealthy = serde_json::to_value(HealthReport::unhealthy("checkpoint missing")).unwrap();
        assert_eq!(
            unhealthy,
            json!({"status": "unhealthy", "model_loaded": false, "error": "checkpoint missing"})
        );
    }
}
