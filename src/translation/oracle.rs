/*!
 * Translation oracle abstraction.
 *
 * The reconciler only needs "prompt in, text out" with a temperature and a
 * seed. `ProviderOracle` adapts the concrete LLM clients to that shape.
 */

use async_trait::async_trait;
use log::debug;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::ollama::{ChatRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};

/// One text-generation request
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    /// System instructions
    pub system: String,
    /// User prompt carrying the lyric block
    pub prompt: String,
    /// Sampling temperature for this attempt
    pub temperature: f32,
    /// Fixed sampling seed
    pub seed: u64,
}

/// A text-generation service
#[async_trait]
pub trait TranslationOracle: Send + Sync {
    /// Generate a completion for the request
    ///
    /// Implementations issue exactly one upstream call per invocation.
    async fn generate(&self, request: &OracleRequest) -> Result<String, ProviderError>;
}

/// Oracle backed by one of the configured LLM providers
#[derive(Debug)]
pub enum ProviderOracle {
    /// OpenAI or an OpenAI-compatible server (LM Studio)
    OpenAI { client: OpenAI, model: String },
    /// Ollama chat API
    Ollama { client: Ollama, model: String },
}

impl ProviderOracle {
    /// Build the oracle for the active provider of a translation config
    pub fn from_config(config: &TranslationConfig) -> Self {
        let model = config.get_model();
        let endpoint = config.get_endpoint();
        let timeout_secs = config.get_timeout_secs();

        match config.provider {
            TranslationProvider::OpenAI | TranslationProvider::LMStudio => Self::OpenAI {
                client: OpenAI::new(config.get_api_key(), endpoint, model.clone(), timeout_secs),
                model,
            },
            TranslationProvider::Ollama => Self::Ollama {
                client: Ollama::new(endpoint, timeout_secs),
                model,
            },
        }
    }

    /// Model name used for requests
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Check that the provider is reachable
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match self {
            Self::OpenAI { client, .. } => client.test_connection().await,
            Self::Ollama { client, .. } => client.test_connection().await,
        }
    }
}

#[async_trait]
impl TranslationOracle for ProviderOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<String, ProviderError> {
        debug!(
            "Oracle request to {} (temperature {:.1}, seed {})",
            self.model(), request.temperature, request.seed
        );

        match self {
            Self::OpenAI { client, model } => {
                let chat = OpenAIRequest::new(model.clone())
                    .add_message("system", request.system.clone())
                    .add_message("user", request.prompt.clone())
                    .temperature(request.temperature)
                    .seed(request.seed);
                let response = client.complete(chat).await?;
                Ok(OpenAI::extract_text(&response))
            }
            Self::Ollama { client, model } => {
                let chat = ChatRequest::new(model.clone())
                    .add_message("system", request.system.clone())
                    .add_message("user", request.prompt.clone())
                    .temperature(request.temperature)
                    .seed(request.seed);
                let response = client.complete(chat).await?;
                Ok(Ollama::extract_text(&response))
            }
        }
    }
}
