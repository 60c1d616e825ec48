//! Integration tests for the retriever and answer pipeline using
//! deterministic in-process providers.

mod common;

use std::fs;
use std::sync::Arc;

use common::{
    FailingEmbedder, FailingModel, KeywordEmbedder, RecordingModel, ShortBatchEmbedder, WideQueryEmbedder,
};
use docqa_rag::{
    AnswerPipeline, Chunk, Chunker, DistanceMetric, Document, RagConfig, RagError, RecursiveChunker,
    Retriever,
};
use tempfile::TempDir;

fn corpus_chunks() -> Vec<Chunk> {
    let chunker = RecursiveChunker::new(500, 100).unwrap();
    chunker.chunk_all(&[
        Document::new("models.md", "The model is created by calling CreateModel.", "/c/models.md"),
        Document::new("endpoints.md", "Endpoints serve real-time inference traffic.", "/c/endpoints.md"),
        Document::new("training.md", "Training jobs write artifacts to S3.", "/c/training.md"),
    ])
}

async fn retriever(k: usize) -> Retriever {
    Retriever::build(corpus_chunks(), Arc::new(KeywordEmbedder), k, DistanceMetric::Cosine)
        .await
        .unwrap()
}

#[tokio::test]
async fn nearest_chunk_shares_the_query_words() {
    let retriever = retriever(1).await;
    let chunks = retriever.retrieve("How is a model created?").await.unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "The model is created by calling CreateModel.");
    assert_eq!(chunks[0].source(), Some("/c/models.md"));
}

#[tokio::test]
async fn k_larger_than_corpus_returns_everything() {
    let retriever = Retriever::build(
        corpus_chunks().into_iter().take(2).collect(),
        Arc::new(KeywordEmbedder),
        5,
        DistanceMetric::Cosine,
    )
    .await
    .unwrap();

    assert_eq!(retriever.retrieve("anything").await.unwrap().len(), 2);
}

#[tokio::test]
async fn search_reports_ascending_distances() {
    let retriever = retriever(3).await;
    let results = retriever.search("How is a model created?").await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn zero_k_is_config_error() {
    let err = Retriever::build(corpus_chunks(), Arc::new(KeywordEmbedder), 0, DistanceMetric::Cosine)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[tokio::test]
async fn embedding_failure_aborts_build_unchanged() {
    let err = Retriever::build(corpus_chunks(), Arc::new(FailingEmbedder), 1, DistanceMetric::Cosine)
        .await
        .unwrap_err();
    match err {
        RagError::ServiceError { provider, message } => {
            assert_eq!(provider, "mock");
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn short_embedding_batch_is_service_error() {
    let err = Retriever::build(corpus_chunks(), Arc::new(ShortBatchEmbedder), 1, DistanceMetric::Cosine)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::ServiceError { .. }));
}

#[tokio::test]
async fn query_dimension_mismatch_is_service_error() {
    let retriever =
        Retriever::build(corpus_chunks(), Arc::new(WideQueryEmbedder), 2, DistanceMetric::Cosine)
            .await
            .unwrap();
    match retriever.search("How is a model created?").await {
        Err(RagError::ServiceError { provider, message }) => {
            assert_eq!(provider, "embedding");
            assert!(message.contains("257"), "{message}");
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(results) => panic!("expected an error, got {} results", results.len()),
    }
}

#[tokio::test]
async fn empty_corpus_returns_no_chunks() {
    let retriever =
        Retriever::build(Vec::new(), Arc::new(KeywordEmbedder), 3, DistanceMetric::Cosine).await.unwrap();
    assert!(retriever.retrieve("How is a model created?").await.unwrap().is_empty());
}

#[tokio::test]
async fn from_config_indexes_markdown_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("models.md"), "# Models\n\nThe model is created by calling CreateModel.\n")
        .unwrap();
    fs::write(dir.path().join("endpoints.md"), "# Endpoints\n\nEndpoints serve inference traffic.\n")
        .unwrap();
    fs::write(dir.path().join("notes.txt"), "not part of the corpus").unwrap();

    let config = RagConfig::builder().base_path(dir.path()).k_items(5).build().unwrap();
    let retriever = Retriever::from_config(&config, Arc::new(KeywordEmbedder)).await.unwrap();

    assert_eq!(retriever.index().len(), 2);
    let chunks = retriever.retrieve("How is a model created?").await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].text.contains("CreateModel"));
}

#[tokio::test]
async fn from_config_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let config = RagConfig::builder().base_path(dir.path().join("absent")).build().unwrap();
    let err = Retriever::from_config(&config, Arc::new(KeywordEmbedder)).await.unwrap_err();
    assert!(matches!(err, RagError::IoError { .. }));
}

#[tokio::test]
async fn answer_renders_question_and_context_into_prompt() {
    let model = Arc::new(RecordingModel::new("  A model is created with CreateModel.\n"));
    let pipeline = AnswerPipeline::new(Arc::new(retriever(1).await), model.clone());

    let answer = pipeline.answer("How is a model created?").await.unwrap();
    assert_eq!(answer, "A model is created with CreateModel.");

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Question: How is a model created?"));
    assert!(prompts[0].contains("Context: The model is created by calling CreateModel."));
}

#[tokio::test]
async fn answer_with_contexts_returns_retrieved_passages() {
    let model = Arc::new(RecordingModel::new("By calling CreateModel."));
    let pipeline = AnswerPipeline::new(Arc::new(retriever(2).await), model);

    let answer = pipeline.answer_with_contexts("How is a model created?").await.unwrap();
    assert_eq!(answer.text, "By calling CreateModel.");
    assert_eq!(answer.contexts.len(), 2);
    assert_eq!(answer.contexts[0], "The model is created by calling CreateModel.");
}

#[tokio::test]
async fn question_with_braces_is_not_reexpanded() {
    let model = Arc::new(RecordingModel::new("ok"));
    let pipeline = AnswerPipeline::new(Arc::new(retriever(1).await), model.clone());

    pipeline.answer("What does {context} mean?").await.unwrap();
    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].contains("Question: What does {context} mean?"));
}

#[tokio::test]
async fn completion_failure_propagates_unchanged() {
    let pipeline = AnswerPipeline::new(Arc::new(retriever(1).await), Arc::new(FailingModel));
    let err = pipeline.answer("How is a model created?").await.unwrap_err();
    assert!(matches!(err, RagError::ServiceError { ref message, .. } if message == "upstream 503"));
}

#[tokio::test]
async fn custom_template_requires_both_placeholders() {
    let pipeline = AnswerPipeline::new(Arc::new(retriever(1).await), Arc::new(FailingModel));
    match pipeline.with_template("Just answer {question}") {
        Err(RagError::ConfigError(_)) => {}
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("template without {{context}} was accepted"),
    }
}
