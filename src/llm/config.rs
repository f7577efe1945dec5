//! Enhancement provider configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the enhancement provider chain.
///
/// Providers without a credential are skipped, so a config with only a
/// Hugging Face key goes straight to Hugging Face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct EnhancerConfig {
    /// Groq API key; absence removes Groq from the chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_api_key: Option<String>,
    /// Groq model for enhancement
    #[serde(default = "default_groq_model")]
    #[prefer(default = "llama-3.3-70b-versatile")]
    pub groq_model: String,
    /// Groq chat completions endpoint
    #[serde(default = "default_groq_endpoint")]
    #[prefer(default = "https://api.groq.com/openai/v1/chat/completions")]
    pub groq_endpoint: String,
    /// Hugging Face API key; absence removes Hugging Face from the chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_api_key: Option<String>,
    /// Hugging Face model for enhancement
    #[serde(default = "default_hf_model")]
    #[prefer(default = "mistralai/Mixtral-8x7B-Instruct-v0.1")]
    pub hf_model: String,
    /// Hugging Face Inference API base URL (model name is appended)
    #[serde(default = "default_hf_endpoint")]
    #[prefer(default = "https://api-inference.huggingface.co/models")]
    pub hf_endpoint: String,
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_groq_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_hf_model() -> String {
    "mistralai/Mixtral-8x7B-Instruct-v0.1".to_string()
}

fn default_hf_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl EnhancerConfig {
    /// Base default without env overrides (used internally to avoid recursion).
    pub(crate) fn base_default() -> Self {
        Self {
            groq_api_key: None,
            groq_model: default_groq_model(),
            groq_endpoint: default_groq_endpoint(),
            hf_api_key: None,
            hf_model: default_hf_model(),
            hf_endpoint: default_hf_endpoint(),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `GROQ_API_KEY`: enables the Groq provider
    /// - `GROQ_MODEL`: Groq model name
    /// - `HUGGINGFACE_API_KEY`: enables the Hugging Face provider
    /// - `HF_MODEL`: Hugging Face model name
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.is_empty() {
                self.groq_api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            if !model.is_empty() {
                self.groq_model = model;
            }
        }
        if let Ok(key) = std::env::var("HUGGINGFACE_API_KEY") {
            if !key.is_empty() {
                self.hf_api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("HF_MODEL") {
            if !model.is_empty() {
                self.hf_model = model;
            }
        }
        self
    }

    /// Whether any provider in the chain has a credential.
    pub fn has_any_provider(&self) -> bool {
        self.groq_api_key.is_some() || self.hf_api_key.is_some()
    }

    /// Check if this matches the base defaults (ignoring env overrides).
    pub fn is_default(&self) -> bool {
        *self == Self::base_default()
    }

    pub fn with_groq_key(mut self, key: &str) -> Self {
        self.groq_api_key = Some(key.to_string());
        self
    }

    pub fn with_hf_key(mut self, key: &str) -> Self {
        self.hf_api_key = Some(key.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_default_has_no_credentials() {
        let config = EnhancerConfig::base_default();
        assert!(config.groq_api_key.is_none());
        assert!(config.hf_api_key.is_none());
        assert!(!config.has_any_provider());
        assert_eq!(config.groq_model, "llama-3.3-70b-versatile");
        assert!(config.hf_model.contains("Mixtral"));
    }

    #[test]
    fn builder_keys_enable_providers() {
        let config = EnhancerConfig::base_default().with_hf_key("hf_test");
        assert!(config.has_any_provider());
        assert!(config.groq_api_key.is_none());
        assert_eq!(config.hf_api_key.as_deref(), Some("hf_test"));
    }
}
