//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait and an HTTP implementation for
//! OpenAI-compatible `/embeddings` endpoints. The provider is created via
//! [`create_provider`] from configuration.

pub mod remote;

use anyhow::Result;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous. Callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched requests.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Identifier of the model producing the vectors, recorded alongside stored items.
    fn model(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// `provider` is the full endpoint URL. Only `http://` and `https://` URLs are accepted.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    let url = config.provider.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("unsupported embedding provider: {url}. Expected an http(s) endpoint URL");
    }
    if config.model.is_empty() {
        anyhow::bail!("embedding model must not be empty");
    }
    Ok(Box::new(remote::RemoteEmbeddingProvider::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;

    #[test]
    fn create_provider_accepts_http_urls() {
        let config = EmbeddingConfig::default();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model(), config.model);
    }

    #[test]
    fn create_provider_rejects_other_schemes() {
        let config = EmbeddingConfig {
            provider: "local".into(),
            ..EmbeddingConfig::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("unsupported embedding provider"));
    }
}
