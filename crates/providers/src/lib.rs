//! Chat-completion provider implementations for hoploop.
//!
//! All providers implement the `hoploop_core::Provider` trait.

pub mod openai_compat;

use std::sync::Arc;

use hoploop_config::AppConfig;
use hoploop_core::Provider;

pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// Every supported backend speaks the OpenAI chat-completions dialect, so the
/// provider name only labels logs and the base URL selects the endpoint.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_named_provider() {
        let config = AppConfig {
            provider: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config);
        assert_eq!(provider.name(), "openai");
    }
}
