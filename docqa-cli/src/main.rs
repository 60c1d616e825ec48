//! docqa - answer questions over a Markdown corpus and evaluate the answers.
//!
//! # Commands
//!
//! ```bash
//! # Answer the built-in question (the default command)
//! docqa
//!
//! # Answer a question of your own
//! docqa ask "How do I deploy a model to an endpoint?"
//!
//! # Show what the retriever finds for a query
//! docqa retrieve "When SageMaker creates a model, what happens?"
//!
//! # Score the pipeline on a question file and write a heatmap
//! docqa eval --questions questions.json --heatmap scores.svg
//! ```
//!
//! Requires `OPENAI_API_KEY`, read from the environment or a `.env` file.
//! Set `RUST_LOG=docqa_rag=debug` to trace the pipeline on stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use docqa_eval::{ContextSource, EvalQuestion, Heatmap, RagEvaluator};
use docqa_rag::{
    AnswerPipeline, DistanceMetric, EmbeddingBackend, RagConfig, Retriever, build_completion_model,
    build_embedding_provider,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// The question answered when no subcommand is given.
const DEFAULT_QUESTION: &str = "When SageMaker creates a model, what happens?";

/// Characters of chunk text shown by `retrieve`.
const PREVIEW_CHARS: usize = 100;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Retrieval-augmented question answering over Markdown documentation")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides for the pipeline configuration; unset flags keep the defaults.
#[derive(Args)]
struct ConfigArgs {
    /// Directory holding the Markdown corpus
    #[arg(long, global = true)]
    base_path: Option<PathBuf>,

    /// File-name glob selecting corpus files (prefix with **/ to recurse)
    #[arg(long, global = true)]
    glob: Option<String>,

    /// Maximum chunk size in characters
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Characters shared between consecutive chunks
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    /// Chat-completion model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Embedding backend (derived from --model when omitted)
    #[arg(long, global = true)]
    embedding_backend: Option<EmbeddingBackend>,

    /// Embedding model
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Number of chunks retrieved per question
    #[arg(short, long = "k-items", global = true)]
    k: Option<usize>,

    /// Distance metric: "cosine" or "l2"
    #[arg(long, global = true)]
    distance: Option<DistanceMetric>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true)]
    openai_base_url: Option<String>,
}

impl ConfigArgs {
    fn into_config(self) -> Result<RagConfig> {
        let mut builder = RagConfig::builder();
        if let Some(path) = self.base_path {
            builder = builder.base_path(path);
        }
        if let Some(glob) = self.glob {
            builder = builder.glob(glob);
        }
        if let Some(size) = self.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = self.chunk_overlap {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(model) = self.model {
            builder = builder.model_name(model);
        }
        if let Some(backend) = self.embedding_backend {
            builder = builder.embedding_backend(backend);
        }
        if let Some(model) = self.embedding_model {
            builder = builder.embedding_model(model);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(k) = self.k {
            builder = builder.k_items(k);
        }
        if let Some(metric) = self.distance {
            builder = builder.distance_metric(metric);
        }
        if let Some(url) = self.openai_base_url {
            builder = builder.openai_base_url(url);
        }
        builder.build().context("invalid configuration")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question (the default command)
    Ask {
        /// Question to answer
        question: Option<String>,
    },

    /// Show the chunks retrieved for a query
    Retrieve {
        /// Query text
        query: Option<String>,
    },

    /// Score the pipeline on a set of questions with ground truths
    Eval {
        /// JSON array of {"question", "ground_truths"} objects
        #[arg(short, long)]
        questions: PathBuf,

        /// Write the score report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write a heatmap (.svg is labelled and annotated, .png is the bare grid)
        #[arg(long)]
        heatmap: Option<PathBuf>,

        /// Judge model for LLM-scored metrics (defaults to --model)
        #[arg(long)]
        judge_model: Option<String>,

        /// Where evaluated contexts come from
        #[arg(long, value_enum, default_value_t = ContextArg::Reretrieve)]
        contexts: ContextArg,

        /// Questions generated per answer for answer_relevancy
        #[arg(long, default_value_t = docqa_eval::DEFAULT_STRICTNESS)]
        strictness: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ContextArg {
    /// Retrieve again after answering
    Reretrieve,
    /// Use the contexts the answer was generated from
    FromAnswer,
}

impl From<ContextArg> for ContextSource {
    fn from(arg: ContextArg) -> Self {
        match arg {
            ContextArg::Reretrieve => ContextSource::Reretrieve,
            ContextArg::FromAnswer => ContextSource::FromAnswer,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.into_config()?;
    info!(base_path = %config.base_path.display(), model = %config.model_name, "starting docqa");

    match cli.command.unwrap_or(Commands::Ask { question: None }) {
        Commands::Ask { question } => {
            let question = question.as_deref().unwrap_or(DEFAULT_QUESTION);
            let retriever = Arc::new(build_retriever(&config).await?);
            let pipeline = AnswerPipeline::new(retriever, build_completion_model(&config)?);
            let answer = pipeline.answer(question).await.context("failed to answer question")?;
            println!("{answer}");
        }

        Commands::Retrieve { query } => {
            let query = query.as_deref().unwrap_or(DEFAULT_QUESTION);
            let retriever = build_retriever(&config).await?;
            let chunks = retriever.retrieve(query).await.context("retrieval failed")?;

            println!("Number of retrieved documents: {}", chunks.len());
            if let Some(first) = chunks.first() {
                println!("Source of first document: {}", first.source().unwrap_or("<unknown>"));
                let preview: String = first.text.chars().take(PREVIEW_CHARS).collect();
                println!("Content: {preview}");
            }
        }

        Commands::Eval { questions, report, heatmap, judge_model, contexts, strictness } => {
            let items = EvalQuestion::load_all(&questions)?;
            let embeddings = build_embedding_provider(&config)?;
            let retriever = Arc::new(
                Retriever::from_config(&config, embeddings.clone())
                    .await
                    .context("failed to build retriever")?,
            );
            let pipeline =
                Arc::new(AnswerPipeline::new(retriever.clone(), build_completion_model(&config)?));

            let mut judge_config = config.clone();
            if let Some(model) = judge_model {
                judge_config.model_name = model;
            }
            let judge = build_completion_model(&judge_config)?;

            let evaluator = RagEvaluator::new(pipeline, retriever, judge, embeddings)
                .with_context_source(contexts.into())
                .with_strictness(strictness);
            let scores = evaluator.run(&items).await.context("evaluation failed")?;

            print!("{}", scores.to_table());
            if let Some(path) = report {
                scores.save_json(&path)?;
            }
            if let Some(path) = heatmap {
                Heatmap::from_report(&scores).save(&path)?;
            }
        }
    }

    Ok(())
}

async fn build_retriever(config: &RagConfig) -> Result<Retriever> {
    let embeddings = build_embedding_provider(config)?;
    Retriever::from_config(config, embeddings).await.context("failed to build retriever")
}
