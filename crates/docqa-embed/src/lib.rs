use anyhow::Result;
use std::hash::{Hash, Hasher};
use tracing::info;
use twox_hash::XxHash64;

use docqa_core::config::{BackendKind, EmbeddingSettings};
use docqa_core::traits::Embedder;

pub mod bert;
pub mod device;
pub mod pool;
pub mod remote;
pub mod tokenize;
pub mod weights;

pub use bert::BertEmbedder;
pub use pool::masked_mean_l2;
pub use remote::RemoteEmbedder;

pub const FAKE_EMBEDDING_DIM: usize = 384;

/// Deterministic hash-bucket embedder: every whitespace token adds weight to
/// one bucket, then the vector is L2-normalised. Texts sharing tokens end up
/// close in L2, which is enough to exercise retrieval without a model.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake:xxhash:d{}", dim) } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Build the embedder selected by settings. `APP_USE_FAKE_EMBEDDINGS=1`
/// overrides the backend with [`FakeEmbedder`].
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() { info!("Using FakeEmbedder"); return Ok(Box::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM))); }
    match settings.backend {
        BackendKind::Local => {
            let dir = weights::resolve_model_dir(
                settings.model_dir.as_deref(),
                &["APP_MODEL_DIR", "MODEL_DIR"],
                &["../models/all-MiniLM-L6-v2", "models/all-MiniLM-L6-v2"],
            )?;
            Ok(Box::new(BertEmbedder::new(&dir, settings.max_len)?))
        }
        BackendKind::Remote => Ok(Box::new(RemoteEmbedder::new(settings)?)),
    }
}
