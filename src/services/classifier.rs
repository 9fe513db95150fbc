use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::models::mood_event::MoodLabel;

/// One classification: a label plus a confidence/intensity score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodReading {
    pub label: MoodLabel,
    pub score: f64,
}

/// Optional smarter classification capability. Injected so tests can
/// substitute a stub; the production impl is [`MessagesApiBackend`].
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    async fn classify(&self, text: &str) -> anyhow::Result<MoodReading>;
}

/// Maps free text to a mood reading. Never fails: any backend error is
/// absorbed by falling back to the keyword classifier.
#[derive(Clone)]
pub struct MoodClassifier {
    backend: Option<Arc<dyn ClassifierBackend>>,
}

impl MoodClassifier {
    /// Build from config once at startup. An empty API key means
    /// keyword-only mode.
    pub fn from_config(config: &Config) -> Self {
        if config.classifier_api_key.is_empty() {
            tracing::info!("No classifier API key configured, keyword classifier only");
            return Self::keyword_only();
        }
        match MessagesApiBackend::new(config) {
            Ok(backend) => Self {
                backend: Some(Arc::new(backend)),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build classifier backend, keyword classifier only");
                Self::keyword_only()
            }
        }
    }

    pub fn keyword_only() -> Self {
        Self { backend: None }
    }

    #[cfg(test)]
    pub fn with_backend(backend: Arc<dyn ClassifierBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub async fn classify(&self, text: Option<&str>) -> MoodReading {
        // The backend is only worth a round trip for non-empty text.
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return classify_keywords(None);
        };
        let Some(backend) = &self.backend else {
            return classify_keywords(Some(text));
        };
        match backend.classify(text).await {
            Ok(reading) => MoodReading {
                label: reading.label,
                score: reading.score.clamp(0.0, 1.0),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Classifier backend unavailable, using keyword fallback");
                classify_keywords(Some(text))
            }
        }
    }
}

// Keyword groups from the production corpus (French). Order matters:
// the first matching group wins.
const FATIGUE_KEYWORDS: &[&str] = &["seul", "triste", "fatigu", "épuis"];
const STRESS_KEYWORDS: &[&str] = &["stress", "angoiss", "tendu"];
const ENERGY_KEYWORDS: &[&str] = &["inspir", "bouger", "march", "sortir", "énerg"];
const JOY_KEYWORDS: &[&str] = &["heureux", "joyeux", "content", "bien"];

/// Deterministic keyword classifier: the no-text default and the fallback
/// for every backend failure.
pub fn classify_keywords(text: Option<&str>) -> MoodReading {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return MoodReading {
            label: MoodLabel::Calm,
            score: 0.5,
        };
    };

    let t = text.to_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| t.contains(k));

    let (label, score) = if matches_any(FATIGUE_KEYWORDS) {
        (MoodLabel::Fatigue, 0.3)
    } else if matches_any(STRESS_KEYWORDS) {
        (MoodLabel::Stress, 0.2)
    } else if matches_any(ENERGY_KEYWORDS) {
        (MoodLabel::Energy, 0.8)
    } else if matches_any(JOY_KEYWORDS) {
        (MoodLabel::Joy, 0.9)
    } else {
        (MoodLabel::Calm, 0.6)
    };

    MoodReading { label, score }
}

/// Anthropic-style messages API backend. One client, 30s timeout, single
/// attempt: a failed call falls straight back to the keyword classifier.
pub struct MessagesApiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl MessagesApiBackend {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: config.classifier_api_url.clone(),
            api_key: config.classifier_api_key.clone(),
            model: config.classifier_model.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct BackendReading {
    label: String,
    score: f64,
}

#[async_trait]
impl ClassifierBackend for MessagesApiBackend {
    async fn classify(&self, text: &str) -> anyhow::Result<MoodReading> {
        let prompt = format!(
            "You are an emotion classifier. Reply with a single JSON object \
             {{\"label\": string, \"score\": number}} where label is one of \
             [joy, calm, energy, fatigue, stress, lonely, social, reflective] \
             and score is in [0, 1]. Text: {text}"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": 256,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("classifier API error {}: {}", status, body);
        }

        let payload: serde_json::Value = response.json().await?;
        let content = payload["content"][0]["text"].as_str().unwrap_or("{}");

        let parsed: BackendReading = serde_json::from_str(content)?;
        let label = MoodLabel::parse(&parsed.label)
            .ok_or_else(|| anyhow::anyhow!("unknown mood label: {}", parsed.label))?;

        Ok(MoodReading {
            label,
            score: parsed.score,
        })
    }
}
