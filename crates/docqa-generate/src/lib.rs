use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use docqa_core::config::{BackendKind, GenerationSettings};
use docqa_core::traits::{GenerationParams, Generator, TokenCounter, WhitespaceTokenCounter};

pub mod remote;
pub mod t5;
pub mod tokens;

pub use remote::RemoteGenerator;
pub use t5::T5Generator;
pub use tokens::HfTokenCounter;

/// Deterministic stand-in: answers with the first line of the prompt's
/// context block, or a fixed reply when the prompt has no context.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeGenerator;

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let context = prompt
            .split_once("context:\n")
            .and_then(|(_, rest)| rest.split_once("\n\nQuestion:"))
            .map(|(ctx, _)| ctx.trim())
            .unwrap_or("");
        let answer = context.lines().next().filter(|l| !l.trim().is_empty()).unwrap_or("I don't know.");
        Ok(answer.split_whitespace().take(params.max_new_tokens).collect::<Vec<_>>().join(" "))
    }
}

fn use_fake_generator() -> bool {
    std::env::var("APP_USE_FAKE_GENERATOR").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Build the generator selected by settings along with the token counter its
/// prompts should be budgeted with. `APP_USE_FAKE_GENERATOR=1` selects
/// [`FakeGenerator`] with whitespace counting.
pub fn get_default_generator(settings: &GenerationSettings) -> Result<(Arc<dyn Generator>, Arc<dyn TokenCounter>)> {
    if use_fake_generator() {
        info!("Using FakeGenerator");
        return Ok((Arc::new(FakeGenerator), Arc::new(WhitespaceTokenCounter)));
    }
    match settings.backend {
        BackendKind::Local => {
            let dir = docqa_embed::weights::resolve_model_dir(
                settings.model_dir.as_deref(),
                &["APP_GENERATOR_DIR"],
                &["../models/flan-t5-small", "models/flan-t5-small"],
            )?;
            let generator = T5Generator::new(&dir)?;
            let counter = HfTokenCounter::new(generator.tokenizer().clone())?;
            Ok((Arc::new(generator), Arc::new(counter)))
        }
        BackendKind::Remote => {
            info!(model = %settings.model, "Using remote generator");
            Ok((Arc::new(RemoteGenerator::new(settings)?), Arc::new(WhitespaceTokenCounter)))
        }
    }
}
