use chat_core::bot_flow::{BotFlow, BotInput, BotLine, PreChatProfile};
use chat_core::display::{resolve_local, TextSource};
use chat_core::translation_cache::{TranslationCache, TranslationRequest};
use chat_types::language::Language;
use chat_types::message::SenderType;
use chat_types::Result;

/// A transcript line ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PreChatLine {
    pub id: String,
    pub from_bot: bool,
    pub text: String,
    pub source: TextSource,
}

/// The bot questionnaire plus a cache that shows its prompts in the
/// language the visitor picked.
pub struct PreChatState {
    flow: BotFlow,
    cache: TranslationCache,
    pub input_text: String,
}

impl Default for PreChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl PreChatState {
    pub fn new() -> Self {
        Self {
            flow: BotFlow::new(),
            cache: TranslationCache::new(Language::english()),
            input_text: String::new(),
        }
    }

    pub fn flow(&self) -> &BotFlow {
        &self.flow
    }

    /// Language bot prompts are currently shown in.
    pub fn display_language(&self) -> Language {
        self.flow
            .selected_language()
            .cloned()
            .unwrap_or_else(Language::english)
    }

    /// Feed one input. Rejected inputs leave the flow unchanged.
    pub fn handle(&mut self, input: BotInput) -> Result<()> {
        if let Err(e) = self.flow.handle(input) {
            log::warn!("[prechat] input rejected in {:?}: {}", self.flow.state(), e);
            return Err(e);
        }
        self.cache.set_language(self.display_language());
        Ok(())
    }

    /// Send the typed answer, if any.
    pub fn submit_text(&mut self) -> Result<bool> {
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return Ok(false);
        }
        self.handle(BotInput::Text(text))?;
        self.input_text.clear();
        Ok(true)
    }

    pub fn profile(&self) -> Option<PreChatProfile> {
        self.flow.profile()
    }

    /// Apply translations that came back. True if any line changed.
    pub fn poll(&mut self) -> bool {
        self.cache.pump() > 0
    }

    /// Cache misses for bot prompts not yet shown in the picked language.
    pub fn pending_translations(&mut self) -> Vec<TranslationRequest> {
        let viewer = self.display_language();
        let misses: Vec<(String, String)> = self
            .flow
            .transcript()
            .iter()
            .filter(|line| line.sender_type == SenderType::Bot)
            .filter(|line| {
                resolve_local(&line.id, &line.text, line.language.as_ref(), &viewer, &self.cache)
                    .needs_translation()
            })
            .map(|line| (line.id.clone(), line.text.clone()))
            .collect();

        misses
            .into_iter()
            .filter_map(|(id, text)| self.cache.request(&id, &text))
            .collect()
    }

    pub fn lines(&self) -> Vec<PreChatLine> {
        let viewer = self.display_language();
        self.flow
            .transcript()
            .iter()
            .map(|line| self.render_line(line, &viewer))
            .collect()
    }

    fn render_line(&self, line: &BotLine, viewer: &Language) -> PreChatLine {
        if line.sender_type != SenderType::Bot {
            return PreChatLine {
                id: line.id.clone(),
                from_bot: false,
                text: line.text.clone(),
                source: TextSource::Original,
            };
        }
        let shown = resolve_local(&line.id, &line.text, line.language.as_ref(), viewer, &self.cache);
        PreChatLine {
            id: line.id.clone(),
            from_bot: true,
            text: shown.text.to_string(),
            source: shown.source,
        }
    }
}
