//! Deterministic test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use docqa_rag::{CompletionModel, EmbeddingProvider, RagError, Result};

pub const DIM: usize = 256;

/// Bag-of-words embedder: each lowercase token is hashed into one of `DIM`
/// buckets, so texts sharing words land close together.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
        {
            let hash = token
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x100_0000_01b3));
            v[(hash % DIM as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Fails every call the way a rate-limited remote provider would.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::ServiceError { provider: "mock".into(), message: "rate limited".into() })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Returns one vector fewer than requested.
pub struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(KeywordEmbedder::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|t| KeywordEmbedder::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Indexes `DIM`-wide vectors but embeds queries one dimension wider.
pub struct WideQueryEmbedder;

#[async_trait]
impl EmbeddingProvider for WideQueryEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = KeywordEmbedder::vector(text);
        v.push(1.0);
        Ok(v)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| KeywordEmbedder::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Replies with a fixed answer and records every prompt it receives.
pub struct RecordingModel {
    reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), prompts: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl CompletionModel for RecordingModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Fails every completion.
pub struct FailingModel;

#[async_trait]
impl CompletionModel for FailingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::ServiceError { provider: "mock".into(), message: "upstream 503".into() })
    }

    fn name(&self) -> &str {
        "failing"
    }
}
