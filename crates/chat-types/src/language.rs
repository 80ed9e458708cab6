use std::fmt;

use serde::{Deserialize, Serialize};

/// A language code as understood by the translation backend (`en`, `es`, `fil`, ...).
///
/// Codes are normalized to trimmed lowercase on construction so `"ES"` and
/// `"es"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_lowercase())
    }

    pub fn english() -> Self {
        Self::new("en")
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// English display name, falling back to the raw code.
    pub fn name(&self) -> &str {
        language_name(&self.0)
    }

    pub fn native_name(&self) -> &str {
        native_language_name(&self.0)
    }

    pub fn is_supported(&self) -> bool {
        find_language(&self.0).is_some()
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Source language of a translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    /// Let the backend detect the language.
    Auto,
    Known(Language),
}

impl SourceLanguage {
    pub fn known(&self) -> Option<&Language> {
        match self {
            SourceLanguage::Auto => None,
            SourceLanguage::Known(lang) => Some(lang),
        }
    }
}

impl From<Language> for SourceLanguage {
    fn from(lang: Language) -> Self {
        SourceLanguage::Known(lang)
    }
}

impl From<Option<Language>> for SourceLanguage {
    fn from(lang: Option<Language>) -> Self {
        lang.map_or(SourceLanguage::Auto, SourceLanguage::Known)
    }
}

/// Catalog entry for a supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

/// Languages offered in the pickers when the backend list is unavailable.
pub const SUPPORTED_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo { code: "en", name: "English", native_name: "English" },
    LanguageInfo { code: "es", name: "Spanish", native_name: "Español" },
    LanguageInfo { code: "fr", name: "French", native_name: "Français" },
    LanguageInfo { code: "de", name: "German", native_name: "Deutsch" },
    LanguageInfo { code: "it", name: "Italian", native_name: "Italiano" },
    LanguageInfo { code: "pt", name: "Portuguese", native_name: "Português" },
    LanguageInfo { code: "ru", name: "Russian", native_name: "Русский" },
    LanguageInfo { code: "zh", name: "Chinese (Simplified)", native_name: "中文" },
    LanguageInfo { code: "ja", name: "Japanese", native_name: "日本語" },
    LanguageInfo { code: "ko", name: "Korean", native_name: "한국어" },
    LanguageInfo { code: "ar", name: "Arabic", native_name: "العربية" },
    LanguageInfo { code: "hi", name: "Hindi", native_name: "हिन्दी" },
    LanguageInfo { code: "tr", name: "Turkish", native_name: "Türkçe" },
    LanguageInfo { code: "nl", name: "Dutch", native_name: "Nederlands" },
    LanguageInfo { code: "sv", name: "Swedish", native_name: "Svenska" },
    LanguageInfo { code: "da", name: "Danish", native_name: "Dansk" },
    LanguageInfo { code: "no", name: "Norwegian", native_name: "Norsk" },
    LanguageInfo { code: "fi", name: "Finnish", native_name: "Suomi" },
    LanguageInfo { code: "pl", name: "Polish", native_name: "Polski" },
    LanguageInfo { code: "cs", name: "Czech", native_name: "Čeština" },
    LanguageInfo { code: "hu", name: "Hungarian", native_name: "Magyar" },
    LanguageInfo { code: "ro", name: "Romanian", native_name: "Română" },
    LanguageInfo { code: "bg", name: "Bulgarian", native_name: "Български" },
    LanguageInfo { code: "hr", name: "Croatian", native_name: "Hrvatski" },
    LanguageInfo { code: "sk", name: "Slovak", native_name: "Slovenčina" },
    LanguageInfo { code: "sl", name: "Slovenian", native_name: "Slovenščina" },
    LanguageInfo { code: "et", name: "Estonian", native_name: "Eesti" },
    LanguageInfo { code: "lv", name: "Latvian", native_name: "Latviešu" },
    LanguageInfo { code: "lt", name: "Lithuanian", native_name: "Lietuvių" },
    LanguageInfo { code: "mt", name: "Maltese", native_name: "Malti" },
    LanguageInfo { code: "el", name: "Greek", native_name: "Ελληνικά" },
    LanguageInfo { code: "he", name: "Hebrew", native_name: "עברית" },
    LanguageInfo { code: "th", name: "Thai", native_name: "ไทย" },
    LanguageInfo { code: "vi", name: "Vietnamese", native_name: "Tiếng Việt" },
    LanguageInfo { code: "id", name: "Indonesian", native_name: "Bahasa Indonesia" },
    LanguageInfo { code: "ms", name: "Malay", native_name: "Bahasa Melayu" },
    LanguageInfo { code: "fil", name: "Filipino", native_name: "Filipino" },
    LanguageInfo { code: "bn", name: "Bengali", native_name: "বাংলা" },
    LanguageInfo { code: "ur", name: "Urdu", native_name: "اردو" },
    LanguageInfo { code: "fa", name: "Persian", native_name: "فارسی" },
    LanguageInfo { code: "am", name: "Amharic", native_name: "አማርኛ" },
    LanguageInfo { code: "sw", name: "Swahili", native_name: "Kiswahili" },
    LanguageInfo { code: "zu", name: "Zulu", native_name: "isiZulu" },
    LanguageInfo { code: "af", name: "Afrikaans", native_name: "Afrikaans" },
    LanguageInfo { code: "sq", name: "Albanian", native_name: "Shqip" },
    LanguageInfo { code: "hy", name: "Armenian", native_name: "Հայերեն" },
    LanguageInfo { code: "az", name: "Azerbaijani", native_name: "Azərbaycan" },
    LanguageInfo { code: "eu", name: "Basque", native_name: "Euskara" },
    LanguageInfo { code: "be", name: "Belarusian", native_name: "Беларуская" },
    LanguageInfo { code: "bs", name: "Bosnian", native_name: "Bosanski" },
    LanguageInfo { code: "ca", name: "Catalan", native_name: "Català" },
    LanguageInfo { code: "cy", name: "Welsh", native_name: "Cymraeg" },
    LanguageInfo { code: "eo", name: "Esperanto", native_name: "Esperanto" },
    LanguageInfo { code: "fo", name: "Faroese", native_name: "Føroyskt" },
    LanguageInfo { code: "gl", name: "Galician", native_name: "Galego" },
    LanguageInfo { code: "ka", name: "Georgian", native_name: "ქართული" },
    LanguageInfo { code: "gu", name: "Gujarati", native_name: "ગુજરાતી" },
    LanguageInfo { code: "ha", name: "Hausa", native_name: "Hausa" },
    LanguageInfo { code: "is", name: "Icelandic", native_name: "Íslenska" },
    LanguageInfo { code: "ig", name: "Igbo", native_name: "Igbo" },
    LanguageInfo { code: "ga", name: "Irish", native_name: "Gaeilge" },
    LanguageInfo { code: "jw", name: "Javanese", native_name: "Basa Jawa" },
    LanguageInfo { code: "kn", name: "Kannada", native_name: "ಕನ್ನಡ" },
    LanguageInfo { code: "kk", name: "Kazakh", native_name: "Қазақ" },
    LanguageInfo { code: "km", name: "Khmer", native_name: "ខ្មែរ" },
    LanguageInfo { code: "ky", name: "Kyrgyz", native_name: "Кыргызча" },
    LanguageInfo { code: "lo", name: "Lao", native_name: "ລາວ" },
    LanguageInfo { code: "la", name: "Latin", native_name: "Latina" },
    LanguageInfo { code: "lb", name: "Luxembourgish", native_name: "Lëtzebuergesch" },
    LanguageInfo { code: "mk", name: "Macedonian", native_name: "Македонски" },
    LanguageInfo { code: "mg", name: "Malagasy", native_name: "Malagasy" },
    LanguageInfo { code: "ml", name: "Malayalam", native_name: "മലയാളം" },
    LanguageInfo { code: "mi", name: "Maori", native_name: "Māori" },
    LanguageInfo { code: "mr", name: "Marathi", native_name: "मराठी" },
    LanguageInfo { code: "mn", name: "Mongolian", native_name: "Монгол" },
    LanguageInfo { code: "ne", name: "Nepali", native_name: "नेपाली" },
    LanguageInfo { code: "or", name: "Odia", native_name: "ଓଡ଼ିଆ" },
    LanguageInfo { code: "ps", name: "Pashto", native_name: "پښتو" },
    LanguageInfo { code: "pa", name: "Punjabi", native_name: "ਪੰਜਾਬੀ" },
    LanguageInfo { code: "qu", name: "Quechua", native_name: "Runasimi" },
    LanguageInfo { code: "rw", name: "Kinyarwanda", native_name: "Kinyarwanda" },
    LanguageInfo { code: "sm", name: "Samoan", native_name: "Gagana Samoa" },
    LanguageInfo { code: "gd", name: "Scottish Gaelic", native_name: "Gàidhlig" },
    LanguageInfo { code: "nso", name: "Sepedi", native_name: "Sepedi" },
    LanguageInfo { code: "sr", name: "Serbian", native_name: "Српски" },
    LanguageInfo { code: "st", name: "Sesotho", native_name: "Sesotho" },
    LanguageInfo { code: "sn", name: "Shona", native_name: "chiShona" },
    LanguageInfo { code: "sd", name: "Sindhi", native_name: "سنڌي" },
    LanguageInfo { code: "si", name: "Sinhala", native_name: "සිංහල" },
    LanguageInfo { code: "so", name: "Somali", native_name: "Soomaali" },
    LanguageInfo { code: "su", name: "Sundanese", native_name: "Basa Sunda" },
    LanguageInfo { code: "tg", name: "Tajik", native_name: "Тоҷикӣ" },
    LanguageInfo { code: "ta", name: "Tamil", native_name: "தமிழ்" },
    LanguageInfo { code: "te", name: "Telugu", native_name: "తెలుగు" },
    LanguageInfo { code: "tk", name: "Turkmen", native_name: "Türkmen" },
    LanguageInfo { code: "uk", name: "Ukrainian", native_name: "Українська" },
    LanguageInfo { code: "uz", name: "Uzbek", native_name: "O'zbek" },
    LanguageInfo { code: "xh", name: "Xhosa", native_name: "isiXhosa" },
    LanguageInfo { code: "yi", name: "Yiddish", native_name: "יידיש" },
    LanguageInfo { code: "yo", name: "Yoruba", native_name: "Yorùbá" },
];

pub fn find_language(code: &str) -> Option<&'static LanguageInfo> {
    let code = code.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|info| info.code.eq_ignore_ascii_case(code))
}

pub fn language_name(code: &str) -> &str {
    find_language(code).map_or(code, |info| info.name)
}

pub fn native_language_name(code: &str) -> &str {
    find_language(code).map_or(code, |info| info.native_name)
}

/// A language as reported by the translation backend's language listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageListing {
    pub code: Language,
    pub name: String,
}

impl From<&LanguageInfo> for LanguageListing {
    fn from(info: &LanguageInfo) -> Self {
        Self {
            code: Language::new(info.code),
            name: info.name.to_string(),
        }
    }
}
