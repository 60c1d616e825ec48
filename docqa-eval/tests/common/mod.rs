//! Deterministic providers for harness tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docqa_rag::{CompletionModel, EmbeddingProvider, Result};

pub const DIM: usize = 256;

/// Bag-of-words embedder hashing lowercase tokens into `DIM` buckets.
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

/// Always gives the same answer.
pub struct FixedModel(pub &'static str);

#[async_trait]
impl CompletionModel for FixedModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// A judge replying with canned JSON chosen by the kind of prompt it sees.
pub struct ScriptedJudge {
    pub noncommittal: bool,
}

#[async_trait]
impl CompletionModel for ScriptedJudge {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let reply = if prompt.contains("noncommittal") {
            format!(
                r#"{{"questions": ["How is a model created?", "How is a model created in SageMaker?", "What is a model created by?"], "noncommittal": {}}}"#,
                u8::from(self.noncommittal)
            )
        } else if prompt.contains(r#""TP""#) {
            r#"{"TP": ["a model is created by calling CreateModel"], "FP": [], "FN": []}"#.to_string()
        } else if prompt.contains(r#""verdict""#) {
            r#"{"reason": "names the API", "verdict": 1}"#.to_string()
        } else if prompt.contains("classifications") {
            "```json\n{\"classifications\": [{\"statement\": \"CreateModel creates it\", \"attributed\": 1}, {\"statement\": \"It is free\", \"attributed\": 0}]}\n```".to_string()
        } else if prompt.contains("entities") {
            r#"{"entities": ["CreateModel"]}"#.to_string()
        } else {
            "unexpected prompt".to_string()
        };
        Ok(reply)
    }

    fn name(&self) -> &str {
        "scripted-judge"
    }
}

/// A judge that never replies with JSON.
pub struct ChattyJudge;

#[async_trait]
impl CompletionModel for ChattyJudge {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok("I think the answer looks good overall.".to_string())
    }

    fn name(&self) -> &str {
        "chatty-judge"
    }
}
