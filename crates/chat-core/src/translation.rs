//! Translation gateway.
//!
//! Wraps a [`TranslationPort`] with the rules every caller relies on:
//! empty text and same-language requests never reach the backend, and a
//! failed call degrades to the original text instead of an error.

use std::rc::Rc;

use chat_types::language::{Language, LanguageListing, SourceLanguage, SUPPORTED_LANGUAGES};

use crate::ports::{Detection, TranslationPort};

/// What the UI gets back from a translation: always some text to show.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub translated_text: String,
    pub detected_language: Option<Language>,
    /// Set when the backend failed and `translated_text` is the original.
    pub error: Option<String>,
}

impl TranslationOutcome {
    fn passthrough(text: &str, source: &SourceLanguage) -> Self {
        Self {
            translated_text: text.to_string(),
            detected_language: source.known().cloned(),
            error: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Clone)]
pub struct TranslationGateway {
    port: Rc<dyn TranslationPort>,
}

impl TranslationGateway {
    pub fn new(port: Rc<dyn TranslationPort>) -> Self {
        Self { port }
    }

    pub fn backend_name(&self) -> &str {
        self.port.backend_name()
    }

    /// Translate `text` into `target`. One backend call at most, no retries.
    pub async fn translate(
        &self,
        text: &str,
        target: &Language,
        source: &SourceLanguage,
    ) -> TranslationOutcome {
        if text.trim().is_empty() || source.known() == Some(target) {
            return TranslationOutcome::passthrough(text, source);
        }

        match self.port.translate(text, target, source).await {
            Ok(result) => TranslationOutcome {
                translated_text: result.translated_text,
                detected_language: result
                    .detected_language
                    .or_else(|| source.known().cloned()),
                error: None,
            },
            Err(e) => {
                log::warn!("[translate] {} -> {} failed: {}", self.port.backend_name(), target, e);
                TranslationOutcome {
                    translated_text: text.to_string(),
                    detected_language: source.known().cloned(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Detect the language of `text`, assuming English with zero confidence
    /// when the text is empty or the backend fails.
    pub async fn detect_language(&self, text: &str) -> Detection {
        let fallback = Detection {
            language: Language::english(),
            confidence: 0.0,
        };
        if text.trim().is_empty() {
            return fallback;
        }
        match self.port.detect(text).await {
            Ok(detection) => detection,
            Err(e) => {
                log::warn!("[translate] language detection failed: {}", e);
                fallback
            }
        }
    }

    /// Backend language list, or the built-in catalog if the backend fails.
    pub async fn supported_languages(&self) -> Vec<LanguageListing> {
        match self.port.languages(&Language::english()).await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => builtin_languages(),
            Err(e) => {
                log::warn!("[translate] language list unavailable, using built-in: {}", e);
                builtin_languages()
            }
        }
    }
}

pub fn builtin_languages() -> Vec<LanguageListing> {
    SUPPORTED_LANGUAGES.iter().map(LanguageListing::from).collect()
}
