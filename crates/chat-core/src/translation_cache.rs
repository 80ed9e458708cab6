//! Per-viewer cache of lazily requested translations.
//!
//! The cache maps a message id to its text in the viewer's current language.
//! Misses produce a [`TranslationRequest`] that the caller runs in the
//! background; completions come back over the cache's own channel and are
//! folded in by [`TranslationCache::pump`] on the next render.
//!
//! Every language change bumps a generation counter and empties the cache.
//! In-flight requests are not cancelled: their completions carry the old
//! generation and are dropped when they arrive.

use std::collections::{HashMap, HashSet};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use chat_types::language::{Language, SourceLanguage};

use crate::translation::{TranslationGateway, TranslationOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationCompletion {
    pub key: String,
    pub generation: u64,
    pub outcome: TranslationOutcome,
}

/// A cache miss waiting to be run. Holds its own reply channel so it can be
/// moved into a spawned task.
pub struct TranslationRequest {
    pub key: String,
    pub text: String,
    pub target: Language,
    pub generation: u64,
    reply: UnboundedSender<TranslationCompletion>,
}

impl TranslationRequest {
    /// Translate from auto-detected source into the cache's language and
    /// post the result back to the cache.
    pub async fn run(self, gateway: TranslationGateway) {
        let outcome = gateway
            .translate(&self.text, &self.target, &SourceLanguage::Auto)
            .await;
        let completion = TranslationCompletion {
            key: self.key,
            generation: self.generation,
            outcome,
        };
        if self.reply.unbounded_send(completion).is_err() {
            log::debug!("[cache] viewer gone, dropping translation");
        }
    }
}

pub struct TranslationCache {
    language: Language,
    generation: u64,
    entries: HashMap<String, String>,
    in_flight: HashSet<String>,
    // Failed keys are not retried until the language changes.
    failed: HashSet<String>,
    tx: UnboundedSender<TranslationCompletion>,
    rx: UnboundedReceiver<TranslationCompletion>,
}

impl TranslationCache {
    pub fn new(language: Language) -> Self {
        let (tx, rx) = mpsc::unbounded();
        Self {
            language,
            generation: 0,
            entries: HashMap::new(),
            in_flight: HashSet::new(),
            failed: HashSet::new(),
            tx,
            rx,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    pub fn has_failed(&self, key: &str) -> bool {
        self.failed.contains(key)
    }

    /// Register a miss. `None` if the key is cached, in flight, failed in
    /// this generation, or the text is blank.
    pub fn request(&mut self, key: &str, text: &str) -> Option<TranslationRequest> {
        if text.trim().is_empty()
            || self.entries.contains_key(key)
            || self.in_flight.contains(key)
            || self.failed.contains(key)
        {
            return None;
        }
        self.in_flight.insert(key.to_string());
        Some(TranslationRequest {
            key: key.to_string(),
            text: text.to_string(),
            target: self.language.clone(),
            generation: self.generation,
            reply: self.tx.clone(),
        })
    }

    /// Fold one completion in. Returns true if a new entry became visible.
    pub fn apply(&mut self, completion: TranslationCompletion) -> bool {
        if completion.generation != self.generation {
            log::debug!(
                "[cache] discarding stale translation for {} (gen {} != {})",
                completion.key,
                completion.generation,
                self.generation
            );
            return false;
        }
        self.in_flight.remove(&completion.key);
        if completion.outcome.is_fallback() {
            self.failed.insert(completion.key);
            return false;
        }
        self.entries
            .insert(completion.key, completion.outcome.translated_text);
        true
    }

    /// Apply every completion that has arrived. Returns how many entries changed.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(Some(completion)) = self.rx.try_next() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Switch the viewer language: everything cached is for the old
    /// language, so drop it all and start a new generation.
    pub fn set_language(&mut self, language: Language) -> bool {
        if language == self.language {
            return false;
        }
        log::info!("[cache] language {} -> {}", self.language, language);
        self.language = language;
        self.generation += 1;
        self.entries.clear();
        self.in_flight.clear();
        self.failed.clear();
        true
    }
}
