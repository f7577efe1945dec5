//! LLM client for article enhancement.
//!
//! Providers are tried in chain order, skipping any without a credential:
//! Groq's OpenAI-compatible chat completions first, then the Hugging Face
//! Inference API. The first provider to return content wins; its output is
//! then length-validated before being accepted.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::EnhancerConfig;
use super::prompts::{build_enhancement_prompt, SYSTEM_PROMPT};
use crate::models::ReferenceDocument;

/// Minimum accepted enhancement length in characters. Anything shorter is
/// treated as a refusal or a degenerate completion.
pub const MIN_ENHANCEMENT_LENGTH: usize = 100;

/// Groq request timeout.
const GROQ_TIMEOUT: Duration = Duration::from_secs(60);

/// Hugging Face request timeout. Inference API cold starts are slow.
const HF_TIMEOUT: Duration = Duration::from_secs(120);

/// Enhancement failures.
#[derive(Debug, Error)]
pub enum EnhanceError {
    /// Every configured provider failed, or none had a credential.
    #[error("no enhancement provider available: set GROQ_API_KEY or HUGGINGFACE_API_KEY")]
    NoProviderAvailable {
        /// Failure from the last provider tried, when any ran.
        #[source]
        source: Option<Box<EnhanceError>>,
    },

    #[error("connection to {provider} failed: {message}")]
    Connection {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    /// The hosted model is still warming up. Worth retrying later; the
    /// client itself never retries.
    #[error("model is loading, try again in a few minutes: {0}")]
    ModelLoading(String),

    #[error("enhancement too short: {length} chars (minimum {MIN_ENHANCEMENT_LENGTH})")]
    InsufficientEnhancement { length: usize },
}

impl EnhanceError {
    /// True when the failure is a transient model warm-up.
    pub fn is_model_loading(&self) -> bool {
        match self {
            Self::ModelLoading(_) => true,
            Self::NoProviderAvailable {
                source: Some(inner),
            } => inner.is_model_loading(),
            _ => false,
        }
    }
}

/// Providers in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Groq,
    HuggingFace,
}

impl Provider {
    fn name(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::HuggingFace => "huggingface",
        }
    }
}

/// Client for the enhancement provider chain.
pub struct EnhancementClient {
    config: EnhancerConfig,
    groq_client: Client,
    hf_client: Client,
}

/// Groq chat completions request.
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct GroqChoiceMessage {
    content: String,
}

/// Hugging Face Inference API request.
#[derive(Debug, Serialize)]
struct HfRequest {
    inputs: String,
    parameters: HfParameters,
}

#[derive(Debug, Serialize)]
struct HfParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct HfGeneration {
    generated_text: String,
}

impl EnhancementClient {
    /// Create a new enhancement client with the given configuration.
    pub fn new(config: EnhancerConfig) -> Self {
        let groq_client = Client::builder()
            .timeout(GROQ_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        let hf_client = Client::builder()
            .timeout(HF_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            groq_client,
            hf_client,
        }
    }

    /// Get the config.
    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    /// Providers with a credential, in chain order.
    fn available_providers(&self) -> Vec<Provider> {
        let mut providers = Vec::new();
        if self.config.groq_api_key.is_some() {
            providers.push(Provider::Groq);
        }
        if self.config.hf_api_key.is_some() {
            providers.push(Provider::HuggingFace);
        }
        providers
    }

    /// Names of configured providers, for status output.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.available_providers()
            .into_iter()
            .map(|p| p.name())
            .collect()
    }

    /// Rewrite an article using the provider chain.
    ///
    /// The prompt bundles the original with the reference articles. A
    /// provider failure falls through to the next provider; the winning
    /// completion must clear [`MIN_ENHANCEMENT_LENGTH`] or the whole
    /// enhancement fails with [`EnhanceError::InsufficientEnhancement`].
    pub async fn enhance(
        &self,
        original_html: &str,
        references: &[ReferenceDocument],
    ) -> Result<String, EnhanceError> {
        let prompt = build_enhancement_prompt(original_html, references);
        debug!(
            prompt_chars = prompt.len(),
            references = references.len(),
            "built enhancement prompt"
        );

        let enhanced = self.run_provider_chain(&prompt).await?;
        validate_enhancement(enhanced)
    }

    async fn run_provider_chain(&self, prompt: &str) -> Result<String, EnhanceError> {
        let mut last_error: Option<EnhanceError> = None;

        for provider in self.available_providers() {
            let outcome = match provider {
                Provider::Groq => self.call_groq(prompt).await,
                Provider::HuggingFace => self.call_huggingface(prompt).await,
            };

            match outcome {
                Ok(content) => {
                    info!(
                        provider = provider.name(),
                        chars = content.len(),
                        "enhancement generated"
                    );
                    return Ok(content);
                }
                Err(e) => {
                    warn!("{} enhancement failed: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(EnhanceError::NoProviderAvailable {
            source: last_error.map(Box::new),
        })
    }

    async fn call_groq(&self, prompt: &str) -> Result<String, EnhanceError> {
        let api_key = self
            .config
            .groq_api_key
            .as_deref()
            .ok_or(EnhanceError::NoProviderAvailable { source: None })?;

        debug!(model = %self.config.groq_model, "calling Groq");

        let request = GroqRequest {
            model: self.config.groq_model.clone(),
            messages: vec![
                GroqMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                GroqMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.7,
            max_tokens: 4000,
            top_p: 1.0,
            stream: false,
        };

        let resp = self
            .groq_client
            .post(&self.config.groq_endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EnhanceError::Connection {
                provider: "groq",
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EnhanceError::Api {
                provider: "groq",
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: GroqResponse = resp.json().await.map_err(|e| EnhanceError::Parse {
            provider: "groq",
            message: e.to_string(),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| EnhanceError::Parse {
                provider: "groq",
                message: "response contained no choices".to_string(),
            })
    }

    async fn call_huggingface(&self, prompt: &str) -> Result<String, EnhanceError> {
        let api_key = self
            .config
            .hf_api_key
            .as_deref()
            .ok_or(EnhanceError::NoProviderAvailable { source: None })?;

        let url = format!(
            "{}/{}",
            self.config.hf_endpoint.trim_end_matches('/'),
            self.config.hf_model
        );
        debug!(model = %self.config.hf_model, "calling Hugging Face");

        let request = HfRequest {
            inputs: prompt.to_string(),
            parameters: HfParameters {
                max_new_tokens: 2000,
                temperature: 0.7,
                top_p: 0.95,
                return_full_text: false,
            },
        };

        let resp = self
            .hf_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EnhanceError::Connection {
                provider: "huggingface",
                message: e.to_string(),
            })?;

        // 503 means the model is spinning up, not that the request was bad
        if resp.status().as_u16() == 503 {
            let body = resp.text().await.unwrap_or_default();
            return Err(EnhanceError::ModelLoading(body));
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EnhanceError::Api {
                provider: "huggingface",
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let generations: Vec<HfGeneration> =
            resp.json().await.map_err(|e| EnhanceError::Parse {
                provider: "huggingface",
                message: e.to_string(),
            })?;

        generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| EnhanceError::Parse {
                provider: "huggingface",
                message: "response contained no generations".to_string(),
            })
    }
}

/// Reject completions too short to be a rewritten article.
fn validate_enhancement(enhanced: String) -> Result<String, EnhanceError> {
    let length = enhanced.chars().count();
    if length < MIN_ENHANCEMENT_LENGTH {
        return Err(EnhanceError::InsufficientEnhancement { length });
    }
    Ok(enhanced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(groq: Option<&str>, hf: Option<&str>) -> EnhancerConfig {
        let mut config = EnhancerConfig::base_default();
        config.groq_api_key = groq.map(String::from);
        config.hf_api_key = hf.map(String::from);
        config
    }

    #[test]
    fn chain_order_is_groq_then_huggingface() {
        let client = EnhancementClient::new(config_with(Some("gsk"), Some("hf")));
        assert_eq!(client.provider_names(), vec!["groq", "huggingface"]);
    }

    #[test]
    fn secondary_only_credential_skips_primary() {
        let client = EnhancementClient::new(config_with(None, Some("hf")));
        assert_eq!(client.provider_names(), vec!["huggingface"]);
    }

    #[tokio::test]
    async fn no_credentials_fails_without_any_call() {
        let client = EnhancementClient::new(config_with(None, None));
        let result = client.enhance("<p>original content</p>", &[]).await;

        match result {
            Err(EnhanceError::NoProviderAvailable { source: None }) => {}
            Err(other) => panic!("expected NoProviderAvailable, got {}", other),
            Ok(_) => panic!("expected NoProviderAvailable, got success"),
        }
    }

    #[test]
    fn short_completion_is_insufficient() {
        let fifty_chars = "a".repeat(50);
        match validate_enhancement(fifty_chars) {
            Err(EnhanceError::InsufficientEnhancement { length }) => assert_eq!(length, 50),
            other => panic!("expected InsufficientEnhancement, got {:?}", other.is_ok()),
        }

        let long = "<h2>Title</h2>".to_string() + &"<p>paragraph</p>".repeat(20);
        assert!(validate_enhancement(long).is_ok());
    }

    #[test]
    fn model_loading_is_detectable_through_chain_error() {
        let inner = EnhanceError::ModelLoading("warming up".to_string());
        assert!(inner.is_model_loading());

        let wrapped = EnhanceError::NoProviderAvailable {
            source: Some(Box::new(inner)),
        };
        assert!(wrapped.is_model_loading());

        let plain = EnhanceError::NoProviderAvailable { source: None };
        assert!(!plain.is_model_loading());
    }
}
