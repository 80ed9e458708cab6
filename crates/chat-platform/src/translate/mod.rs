pub mod google;
pub mod mock;

use std::rc::Rc;

use chat_core::ports::TranslationPort;
use chat_types::config::{TranslationConfig, TranslationProvider};

pub use google::GoogleTranslator;
pub use mock::MockTranslator;

/// Build the backend the config asks for. Google without an API key falls
/// back to the mock.
pub fn create_translator(config: &TranslationConfig) -> Rc<dyn TranslationPort> {
    match config.effective_provider() {
        TranslationProvider::Google => Rc::new(GoogleTranslator::new(config.api_key.clone(), config.endpoint())),
        TranslationProvider::Mock => {
            if config.provider == TranslationProvider::Google {
                log::warn!("[translate] no Google API key configured, using mock translations");
            }
            Rc::new(MockTranslator::new())
        }
    }
}
