//! Picks the text a viewer sees for a message.

use chat_types::{language::Language, message::Message};

use crate::translation_cache::TranslationCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Send-time translation stored with the message.
    Persisted,
    /// The message was written in the viewer's language.
    Original,
    /// Lazily translated for this viewer.
    Cached,
    /// Original text shown while a translation is outstanding or unavailable.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayText<'a> {
    pub text: &'a str,
    pub source: TextSource,
}

impl DisplayText<'_> {
    pub fn needs_translation(&self) -> bool {
        self.source == TextSource::Fallback
    }
}

/// Resolve a message for `viewer`: persisted translation, then original if
/// it is already in the viewer's language, then cache, then original.
pub fn resolve_display<'a>(
    message: &'a Message,
    viewer: &Language,
    cache: &'a TranslationCache,
) -> DisplayText<'a> {
    if let Some(text) = message.translation_for(viewer) {
        return DisplayText {
            text,
            source: TextSource::Persisted,
        };
    }
    resolve_local(
        &message.id,
        &message.original_text,
        message.original_language.as_ref(),
        viewer,
        cache,
    )
}

/// Same policy for text that never had a persisted translation, such as
/// bot prompts.
pub fn resolve_local<'a>(
    key: &str,
    original: &'a str,
    original_language: Option<&Language>,
    viewer: &Language,
    cache: &'a TranslationCache,
) -> DisplayText<'a> {
    if original_language == Some(viewer) {
        return DisplayText {
            text: original,
            source: TextSource::Original,
        };
    }
    if cache.language() == viewer {
        if let Some(text) = cache.get(key) {
            return DisplayText {
                text,
                source: TextSource::Cached,
            };
        }
    }
    DisplayText {
        text: original,
        source: TextSource::Fallback,
    }
}
