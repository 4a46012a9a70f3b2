//! REST generation backend speaking the `models/{model}:generateContent` protocol.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde_json::json;
use std::time::Duration;

use docqa_core::config::GenerationSettings;
use docqa_core::traits::{GenerationParams, Generator};

pub struct RemoteGenerator {
    client: Client,
    url: String,
    api_key: String,
}

impl RemoteGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("generation.api_key is required for the remote backend"))?;
        let client = Client::builder().timeout(Duration::from_secs(settings.timeout_secs)).build()?;
        let url = format!("{}/models/{}:generateContent", settings.api_url.trim_end_matches('/'), settings.model);
        Ok(Self { client, url, api_key })
    }
}

impl Generator for RemoteGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let mut config = json!({ "maxOutputTokens": params.max_new_tokens });
        config["temperature"] = if params.do_sample { json!(params.temperature) } else { json!(0.0) };
        if let Some(top_p) = params.top_p {
            config["topP"] = json!(top_p);
        }
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": config
        });
        let res = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .context("generation request failed")?
            .error_for_status()?;
        let payload: serde_json::Value = res.json()?;
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| anyhow!("generation response has no candidate text"))
    }
}
