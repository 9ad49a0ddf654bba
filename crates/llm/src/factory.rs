//! LLM provider factory.
//!
//! Creates LLM clients from application configuration: provider resolution,
//! endpoint defaults, and request timeouts.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use pathway_core::config::LlmSettings;
use pathway_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client from provider settings.
///
/// # Errors
/// Returns `AppError::Config` for unknown or unimplemented providers and
/// `AppError::Llm` if client initialization fails.
pub fn create_client(settings: &LlmSettings, timeout: Duration) -> AppResult<Arc<dyn LlmClient>> {
    match settings.provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or("http://localhost:11434");
            let client = OllamaClient::new(base_url, &settings.model, timeout)?;
            Ok(Arc::new(client))
        }
        other => Err(AppError::Config(format!(
            "Unknown LLM provider: {}. Supported: ollama",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let settings = LlmSettings::default();
        let client = create_client(&settings, Duration::from_secs(30)).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider() {
        let settings = LlmSettings {
            provider: "unknown".to_string(),
            endpoint: None,
            model: "m".to_string(),
        };
        assert!(create_client(&settings, Duration::from_secs(30)).is_err());
    }

    #[test]
    fn test_custom_endpoint() {
        let settings = LlmSettings {
            provider: "ollama".to_string(),
            endpoint: Some("http://localhost:8080".to_string()),
            model: "llama3.2".to_string(),
        };
        assert!(create_client(&settings, Duration::from_secs(30)).is_ok());
    }
}
