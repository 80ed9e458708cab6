//! Google Cloud Translation (v2 REST) adapter.
//! Uses browser `fetch()` via gloo-net.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::Deserialize;
use serde_json::json;

use chat_core::ports::{Detection, TranslationPort, TranslationResult};
use chat_types::{
    language::{Language, LanguageListing, SourceLanguage},
    ChatError, Result,
};

pub struct GoogleTranslator {
    api_key: String,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}?key={}", self.endpoint, path, self.api_key)
    }
}

async fn check(response: Response) -> Result<Response> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(ChatError::Translation(format!("HTTP {}: {}", status, text)))
}

#[async_trait(?Send)]
impl TranslationPort for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        target: &Language,
        source: &SourceLanguage,
    ) -> Result<TranslationResult> {
        let mut body = json!({
            "q": text,
            "target": target.code(),
            "format": "text",
        });
        if let Some(source) = source.known() {
            body["source"] = json!(source.code());
        }

        let response = Request::post(&self.url(""))
            .header("Content-Type", "application/json")
            .json(&body)
            .map_err(|e| ChatError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        let data: TranslateResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| ChatError::Translation(e.to_string()))?;
        parse_translation(data)
    }

    async fn detect(&self, text: &str) -> Result<Detection> {
        let response = Request::post(&self.url("/detect"))
            .header("Content-Type", "application/json")
            .json(&json!({ "q": text }))
            .map_err(|e| ChatError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        let data: DetectResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| ChatError::Translation(e.to_string()))?;
        parse_detection(data)
    }

    async fn languages(&self, display: &Language) -> Result<Vec<LanguageListing>> {
        let url = format!("{}&target={}", self.url("/languages"), display.code());
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        let data: LanguagesResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| ChatError::Translation(e.to_string()))?;
        Ok(data
            .data
            .languages
            .into_iter()
            .map(|l| LanguageListing {
                name: l.name.unwrap_or_else(|| l.language.clone()),
                code: Language::new(l.language),
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "google"
    }
}

// ─── Response types ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationEntry {
    translated_text: String,
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectResponse {
    data: DetectData,
}

#[derive(Debug, Deserialize)]
struct DetectData {
    detections: Vec<Vec<DetectionEntry>>,
}

#[derive(Debug, Deserialize)]
struct DetectionEntry {
    language: String,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct LanguagesResponse {
    data: LanguagesData,
}

#[derive(Debug, Deserialize)]
struct LanguagesData {
    languages: Vec<LanguageEntry>,
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    language: String,
    name: Option<String>,
}

pub(crate) fn parse_translation(data: TranslateResponse) -> Result<TranslationResult> {
    let entry = data
        .data
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::Translation("no translations in response".to_string()))?;
    Ok(TranslationResult {
        translated_text: entry.translated_text,
        detected_language: entry.detected_source_language.map(Language::new),
    })
}

pub(crate) fn parse_detection(data: DetectResponse) -> Result<Detection> {
    let entry = data
        .data
        .detections
        .into_iter()
        .next()
        .and_then(|d| d.into_iter().next())
        .ok_or_else(|| ChatError::Translation("no detections in response".to_string()))?;
    Ok(Detection {
        language: Language::new(entry.language),
        confidence: entry.confidence,
    })
}
