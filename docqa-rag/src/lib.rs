//! # docqa-rag
//!
//! Retrieval-augmented question answering over a local Markdown corpus.
//!
//! ## Overview
//!
//! - [`DocumentLoader`] reads `*.md` files into [`Document`]s
//! - [`RecursiveChunker`] splits them into overlapping [`Chunk`]s
//! - [`EmbeddingProvider`] turns text into vectors ([`openai::OpenAIEmbeddingProvider`])
//! - [`VectorIndex`] holds the vectors in memory for k-NN search
//! - [`Retriever`] wires load → chunk → embed → index and answers top-k queries
//! - [`AnswerPipeline`] renders retrieved context into a prompt for a [`CompletionModel`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{
//!     AnswerPipeline, RagConfig, Retriever, build_completion_model, build_embedding_provider,
//! };
//!
//! let config = RagConfig::builder().base_path("./docs").build()?;
//! let retriever =
//!     Arc::new(Retriever::from_config(&config, build_embedding_provider(&config)?).await?);
//! let pipeline = AnswerPipeline::new(retriever, build_completion_model(&config)?);
//! println!("{}", pipeline.answer("How is a model created?").await?);
//! ```
//!
//! ## Features
//!
//! - `openai` (default): OpenAI embeddings and chat completions over `reqwest`

pub mod answer;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod prompt;
pub mod retriever;

#[cfg(feature = "openai")]
pub mod openai;

pub use answer::{Answer, AnswerPipeline, parse_completion};
pub use chunking::{Chunker, RecursiveChunker};
pub use completion::{CompletionModel, build_completion_model};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SOURCE_KEY, SearchResult};
pub use embedding::{EmbeddingBackend, EmbeddingProvider, build_embedding_provider};
pub use error::{RagError, Result};
pub use index::{DistanceMetric, VectorIndex, cosine_similarity};
pub use loader::{DocumentLoader, markdown_to_text};
pub use prompt::{PromptTemplate, RAG_PROMPT_TEMPLATE, format_context};
pub use retriever::Retriever;
