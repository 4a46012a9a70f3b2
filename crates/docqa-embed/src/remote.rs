//! REST embedding backend speaking the `models/{model}:embedContent` protocol.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde_json::json;
use std::time::Duration;

use docqa_core::config::EmbeddingSettings;
use docqa_core::traits::Embedder;

pub struct RemoteEmbedder {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    dim: usize,
    id: String,
}

impl RemoteEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("embedding.api_key is required for the remote backend"))?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let url = format!("{}/models/{}:embedContent", settings.api_url.trim_end_matches('/'), settings.model);
        Ok(Self {
            client,
            url,
            api_key,
            model: settings.model.clone(),
            dim: settings.dim,
            id: format!("remote:{}:d{}", settings.model, settings.dim),
        })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] }
        });
        let res = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .context("embedding request failed")?
            .error_for_status()?;
        let payload: serde_json::Value = res.json()?;
        let values = payload["embedding"]["values"]
            .as_array()
            .ok_or_else(|| anyhow!("embedding response has no embedding.values"))?;
        let vector = values
            .iter()
            .map(|v| v.as_f64().map(|x| x as f32).ok_or_else(|| anyhow!("non-numeric embedding value")))
            .collect::<Result<Vec<f32>>>()?;
        if vector.len() != self.dim {
            return Err(anyhow!("dim mismatch: got {} expected {}", vector.len(), self.dim));
        }
        Ok(vector)
    }
}

impl Embedder for RemoteEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}
