//! Retrieval orchestrator: owns the corpus/index pair and runs the ingestion
//! and query paths.
//!
//! State is an optional immutable [`IndexSnapshot`] behind an `RwLock`.
//! Readers clone the `Arc` and work on that snapshot; a rebuild prepares its
//! snapshot off-lock and swaps it in with one short write, so a query sees
//! either the old corpus and index or the new pair, never a mix.

use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use docqa_core::chunker::build_corpus;
use docqa_core::config::Settings;
use docqa_core::document::DocumentLoader;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, Generator, PairScorer, TokenCounter};
use docqa_core::types::{Chunk, Document, QueryResult, QueryStatus, RankedHit, SearchHit};
use docqa_rerank::Reranker;
use docqa_vector::FlatIndex;

pub mod assemble;

pub use assemble::{render_prompt, AssembledPrompt, ContextAssembler};

/// A corpus and the index built from it. `corpus[i]` is index row `i`.
pub struct IndexSnapshot {
    corpus: Vec<Chunk>,
    index: FlatIndex,
}

impl IndexSnapshot {
    pub fn corpus(&self) -> &[Chunk] { &self.corpus }
    pub fn index(&self) -> &FlatIndex { &self.index }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Empty,
    Indexed { chunks: usize, dim: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub dim: usize,
    pub embedder_id: String,
    pub elapsed_ms: u64,
}

pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    reranker: Reranker,
    generator: Arc<dyn Generator>,
    assembler: ContextAssembler,
    settings: Settings,
    state: RwLock<Option<Arc<IndexSnapshot>>>,
    rebuild: Mutex<()>,
}

/// Blocking-pool failures (panics) are reported as the stage's backend being unavailable.
async fn run_blocking<T, F>(f: F, unavailable: fn(String) -> Error) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(unavailable(format!("{e:#}"))),
        Err(join) => Err(unavailable(join.to_string())),
    }
}

fn embed_corpus(embedder: &dyn Embedder, texts: &[String], batch_size: usize) -> anyhow::Result<Vec<Vec<f32>>> {
    let batches = texts
        .par_chunks(batch_size)
        .map(|batch| embedder.embed_batch(batch))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
    anyhow::ensure!(
        vectors.len() == texts.len(),
        "embedder returned {} vectors for {} texts",
        vectors.len(),
        texts.len()
    );
    Ok(vectors)
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        scorer: Arc<dyn PairScorer>,
        generator: Arc<dyn Generator>,
        token_counter: Arc<dyn TokenCounter>,
        settings: Settings,
    ) -> Result<Self> {
        settings.validate()?;
        let assembler = ContextAssembler::new(token_counter, settings.context.clone());
        Ok(Self {
            embedder,
            reranker: Reranker::new(scorer),
            generator,
            assembler,
            settings,
            state: RwLock::new(None),
            rebuild: Mutex::new(()),
        })
    }

    /// Construct every collaborator from settings with the default factories.
    ///
    /// Remote backends create blocking HTTP clients, so call this outside an
    /// async runtime.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = docqa_embed::get_default_embedder(&settings.embedding)
            .map_err(|e| Error::EmbeddingUnavailable(format!("{e:#}")))?;
        let scorer = docqa_rerank::get_default_scorer(&settings.reranker)
            .map_err(|e| Error::RerankUnavailable(format!("{e:#}")))?;
        let (generator, counter) = docqa_generate::get_default_generator(&settings.generation)
            .map_err(|e| Error::GenerationUnavailable(format!("{e:#}")))?;
        Self::new(Arc::from(embedder), scorer, generator, counter, settings)
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub async fn snapshot(&self) -> Option<Arc<IndexSnapshot>> { self.state.read().await.clone() }

    pub async fn state(&self) -> PipelineState {
        match self.snapshot().await {
            Some(snap) => PipelineState::Indexed { chunks: snap.corpus.len(), dim: snap.index.dim() },
            None => PipelineState::Empty,
        }
    }

    /// Load files (directories are walked) and rebuild from them.
    pub async fn ingest_paths(&self, paths: Vec<PathBuf>) -> Result<IngestReport> {
        let docs = tokio::task::spawn_blocking(move || DocumentLoader::new().load_paths(&paths))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))??;
        self.ingest(docs).await
    }

    /// Replace the corpus and index with ones built from `docs`.
    ///
    /// An empty result (no documents, or only blank text) leaves the pipeline
    /// `Empty`. On any error, or if this future is dropped before completing,
    /// the previous snapshot stays in place.
    pub async fn ingest(&self, docs: Vec<Document>) -> Result<IngestReport> {
        let _rebuilding = self.rebuild.lock().await;
        let start = Instant::now();
        let corpus = build_corpus(&docs, &self.settings.chunking)?;

        if corpus.is_empty() {
            *self.state.write().await = None;
            info!(documents = docs.len(), "Ingested empty corpus; index cleared");
            return Ok(IngestReport {
                documents: docs.len(),
                chunks: 0,
                dim: 0,
                embedder_id: self.embedder.embedder_id().to_string(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }

        let texts: Vec<String> = corpus.iter().map(|c| c.text.clone()).collect();
        let embedder = Arc::clone(&self.embedder);
        let batch_size = self.settings.retrieval.embed_batch_size;
        let vectors = run_blocking(move || embed_corpus(embedder.as_ref(), &texts, batch_size), Error::EmbeddingUnavailable).await?;

        let index = FlatIndex::build(&vectors, self.settings.retrieval.metric)?;
        if index.dim() != self.embedder.dim() {
            return Err(Error::DimensionMismatch {
                what: format!("embeddings from {}", self.embedder.embedder_id()),
                expected: self.embedder.dim(),
                found: index.dim(),
            });
        }

        let snapshot = IndexSnapshot { corpus, index };
        let report = IngestReport {
            documents: docs.len(),
            chunks: snapshot.corpus.len(),
            dim: snapshot.index.dim(),
            embedder_id: self.embedder.embedder_id().to_string(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        *self.state.write().await = Some(Arc::new(snapshot));
        info!(
            documents = report.documents,
            chunks = report.chunks,
            dim = report.dim,
            embedder_id = %report.embedder_id,
            elapsed_ms = report.elapsed_ms,
            "Index rebuilt"
        );
        Ok(report)
    }

    async fn search_in(&self, snap: &IndexSnapshot, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let query_vec = run_blocking(move || embedder.embed_one(&text), Error::EmbeddingUnavailable).await?;
        let neighbors = snap.index.search(&query_vec, top_k)?;
        Ok(neighbors
            .into_iter()
            .map(|n| SearchHit { chunk: snap.corpus[n.row].clone(), distance: n.distance })
            .collect())
    }

    async fn rank_in(&self, snap: &IndexSnapshot, query: &str, top_k: usize, rerank_top_n: usize) -> Result<Vec<RankedHit>> {
        let hits = self.search_in(snap, query, top_k).await?;
        debug!(candidates = hits.len(), "First-stage search done");
        let candidates: Vec<Chunk> = hits.into_iter().map(|h| h.chunk).collect();
        let reranker = self.reranker.clone();
        let text = query.to_string();
        let mut ranked = run_blocking(move || reranker.rerank(&text, candidates), Error::RerankUnavailable).await?;
        ranked.truncate(rerank_top_n);
        Ok(ranked)
    }

    /// First-stage nearest neighbours, ascending by distance.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let snap = self.snapshot().await.ok_or(Error::IndexNotBuilt)?;
        self.search_in(&snap, query, top_k).await
    }

    /// Search then rerank, keeping the best `rerank_top_n`.
    pub async fn rank(&self, query: &str, top_k: usize, rerank_top_n: usize) -> Result<Vec<RankedHit>> {
        let snap = self.snapshot().await.ok_or(Error::IndexNotBuilt)?;
        self.rank_in(&snap, query, top_k, rerank_top_n).await
    }

    /// Answer with the configured `top_k` and `rerank_top_n`.
    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        let retrieval = &self.settings.retrieval;
        self.query_with(question, retrieval.top_k, retrieval.rerank_top_n).await
    }

    /// Full query path. Before any successful ingest this returns the
    /// not-indexed sentinel instead of an error.
    pub async fn query_with(&self, question: &str, top_k: usize, rerank_top_n: usize) -> Result<QueryResult> {
        let Some(snap) = self.snapshot().await else {
            debug!("Query before ingest; returning not-indexed result");
            return Ok(QueryResult::not_indexed());
        };
        let start = Instant::now();
        let ranked = self.rank_in(&snap, question, top_k, rerank_top_n).await?;
        let assembled = self
            .assembler
            .assemble(question, &ranked, rerank_top_n, self.settings.context.max_prompt_tokens)
            .map_err(|e| Error::GenerationUnavailable(format!("prompt budgeting failed: {e:#}")))?;

        let generator = Arc::clone(&self.generator);
        let params = self.settings.generation.params();
        let prompt = assembled.prompt;
        let timeout_secs = self.settings.generation.timeout_secs;
        let generation = run_blocking(move || generator.generate(&prompt, &params), Error::GenerationUnavailable);
        let answer_text = match tokio::time::timeout(Duration::from_secs(timeout_secs), generation).await {
            Ok(answer) => answer?,
            Err(_) => {
                warn!(timeout_secs, "Generation timed out");
                return Err(Error::Timeout(format!("generation exceeded {timeout_secs}s")));
            }
        };
        info!(sources = assembled.sources.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Answered query");
        Ok(QueryResult { status: QueryStatus::Answered, answer_text, sources: assembled.sources })
    }
}
