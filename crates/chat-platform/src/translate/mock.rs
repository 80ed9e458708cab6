//! Offline translator for development and demos.
//!
//! Knows "hello" and "thank you" in a few dozen languages; anything else
//! comes back tagged with the target code, e.g. `[ES] good morning`.

use async_trait::async_trait;

use chat_core::ports::{Detection, TranslationPort, TranslationResult};
use chat_core::translation::builtin_languages;
use chat_types::{
    language::{Language, LanguageListing, SourceLanguage},
    Result,
};

const HELLO: &[(&str, &str)] = &[
    ("es", "hola"),
    ("fr", "bonjour"),
    ("de", "hallo"),
    ("it", "ciao"),
    ("pt", "olá"),
    ("ru", "привет"),
    ("zh", "你好"),
    ("ja", "こんにちは"),
    ("ko", "안녕하세요"),
    ("ar", "مرحبا"),
    ("hi", "नमस्ते"),
    ("tr", "merhaba"),
    ("nl", "hallo"),
    ("sv", "hej"),
    ("da", "hej"),
    ("no", "hei"),
    ("fi", "hei"),
    ("pl", "cześć"),
    ("cs", "ahoj"),
    ("hu", "szia"),
    ("ro", "salut"),
    ("bg", "здравей"),
    ("hr", "zdravo"),
    ("sk", "ahoj"),
    ("sl", "zdravo"),
    ("et", "tere"),
    ("lv", "sveiki"),
    ("lt", "labas"),
    ("mt", "bonġu"),
    ("el", "γεια"),
    ("he", "שלום"),
    ("th", "สวัสดี"),
    ("vi", "xin chào"),
    ("id", "halo"),
    ("ms", "halo"),
    ("fil", "kumusta"),
    ("bn", "হ্যালো"),
    ("ur", "ہیلو"),
    ("fa", "سلام"),
    ("am", "ሰላም"),
    ("sw", "jambo"),
    ("zu", "sawubona"),
];

const THANK_YOU: &[(&str, &str)] = &[
    ("es", "gracias"),
    ("fr", "merci"),
    ("de", "danke"),
    ("it", "grazie"),
    ("pt", "obrigado"),
    ("ru", "спасибо"),
    ("zh", "谢谢"),
    ("ja", "ありがとう"),
    ("ko", "감사합니다"),
    ("ar", "شكرا"),
    ("hi", "धन्यवाद"),
    ("tr", "teşekkürler"),
    ("nl", "dank je"),
    ("sv", "tack"),
    ("da", "tak"),
    ("no", "takk"),
    ("fi", "kiitos"),
    ("pl", "dziękuję"),
    ("cs", "děkuji"),
    ("hu", "köszönöm"),
    ("ro", "mulțumesc"),
    ("bg", "благодаря"),
    ("hr", "hvala"),
    ("sk", "ďakujem"),
    ("sl", "hvala"),
    ("et", "aitäh"),
    ("lv", "paldies"),
    ("lt", "ačiū"),
    ("mt", "grazzi"),
    ("el", "ευχαριστώ"),
    ("he", "תודה"),
    ("th", "ขอบคุณ"),
    ("vi", "cảm ơn"),
    ("id", "terima kasih"),
    ("ms", "terima kasih"),
    ("fil", "salamat"),
    ("bn", "ধন্যবাদ"),
    ("ur", "شکریہ"),
    ("fa", "متشکرم"),
    ("am", "አመሰግናለሁ"),
    ("sw", "asante"),
    ("zu", "ngiyabonga"),
];

#[derive(Debug, Default)]
pub struct MockTranslator;

impl MockTranslator {
    pub fn new() -> Self {
        Self
    }

    fn phrase(text: &str, target: &Language) -> Option<&'static str> {
        let table = match text.trim().to_lowercase().as_str() {
            "hello" => HELLO,
            "thank you" => THANK_YOU,
            _ => return None,
        };
        table
            .iter()
            .find(|(code, _)| *code == target.code())
            .map(|(_, phrase)| *phrase)
    }
}

/// Carry the input's leading capital over to the phrase ("Hello" → "Hola").
fn match_case(input: &str, phrase: &str) -> String {
    let capitalized = input.trim().chars().next().map_or(false, char::is_uppercase);
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) if capitalized => first.to_uppercase().chain(chars).collect(),
        _ => phrase.to_string(),
    }
}

#[async_trait(?Send)]
impl TranslationPort for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        target: &Language,
        _source: &SourceLanguage,
    ) -> Result<TranslationResult> {
        let translated_text = match Self::phrase(text, target) {
            Some(phrase) => match_case(text, phrase),
            None => format!("[{}] {}", target.code().to_uppercase(), text),
        };
        Ok(TranslationResult {
            translated_text,
            detected_language: Some(Language::english()),
        })
    }

    async fn detect(&self, _text: &str) -> Result<Detection> {
        Ok(Detection {
            language: Language::english(),
            confidence: 0.8,
        })
    }

    async fn languages(&self, _display: &Language) -> Result<Vec<LanguageListing>> {
        Ok(builtin_languages())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}
