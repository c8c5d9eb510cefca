//! Embedding provider trait and dimension enforcement

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Produces dense vector embeddings for text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order.
    ///
    /// The default implementation embeds sequentially; providers with a
    /// native batch endpoint should override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Wraps a provider and rejects vectors whose length differs from the
/// collection's configured dimensionality.
///
/// Every embedding entering the store passes through this check, so a
/// model swap that changes dimensions fails loudly instead of silently
/// corrupting similarity scores.
#[derive(Clone)]
pub struct DimensionChecked {
    inner: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
}

impl DimensionChecked {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, dimensions: usize) -> Self {
        Self { inner, dimensions }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn check(&self, vector: Vec<f32>) -> Result<Vec<f32>> {
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                got: vector.len(),
                expected: self.dimensions,
            });
        }
        Ok(vector)
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.inner.embed(text).await?;
        self.check(vector)
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.inner.embed_batch(texts).await?;
        vectors.into_iter().map(|v| self.check(v)).collect()
    }
}
