//! Second-stage reranking.
//!
//! First-stage search is cheap and recall-oriented; the reranker re-scores the
//! small candidate set pair by pair with a more precise model. Scores are in
//! the scorer's own units and are never mixed with first-stage distances.

use anyhow::Result;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

use docqa_core::config::{RerankerBackend, RerankerSettings};
use docqa_core::traits::PairScorer;
use docqa_core::types::{Chunk, RankedHit};

pub mod cross_encoder;
pub mod lexical;

pub use cross_encoder::CrossEncoderScorer;
pub use lexical::LexicalScorer;

#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn PairScorer>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn PairScorer>) -> Self { Self { scorer } }

    /// Score every `(query, candidate)` pair and order by descending score.
    /// Equal scores keep the candidates' input order.
    pub fn rerank(&self, query: &str, candidates: Vec<Chunk>) -> Result<Vec<RankedHit>> {
        let scores = candidates
            .par_iter()
            .map(|c| self.scorer.score(query, &c.text))
            .collect::<Result<Vec<f32>>>()?;
        let mut ranked: Vec<RankedHit> = candidates
            .into_iter()
            .zip(scores)
            .map(|(chunk, score)| {
                let relevance_score = if score.is_nan() {
                    warn!(ordinal = chunk.ordinal, "Scorer returned NaN, ranking last");
                    f32::NEG_INFINITY
                } else {
                    // -0.0 and 0.0 must tie under total_cmp.
                    score + 0.0
                };
                RankedHit { chunk, relevance_score }
            })
            .collect();
        // `sort_by` is stable.
        ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        debug!(candidates = ranked.len(), "Reranked candidates");
        Ok(ranked)
    }
}

/// Build the scorer selected by settings.
pub fn get_default_scorer(settings: &RerankerSettings) -> Result<Arc<dyn PairScorer>> {
    match settings.backend {
        RerankerBackend::Lexical => { info!("Using lexical reranker"); Ok(Arc::new(LexicalScorer)) }
        RerankerBackend::CrossEncoder => {
            let dir = docqa_embed::weights::resolve_model_dir(
                settings.model_dir.as_deref(),
                &["APP_RERANKER_DIR"],
                &["../models/ms-marco-MiniLM-L-6-v2", "models/ms-marco-MiniLM-L-6-v2"],
            )?;
            Ok(Arc::new(CrossEncoderScorer::new(&dir, settings.max_len)?))
        }
    }
}
