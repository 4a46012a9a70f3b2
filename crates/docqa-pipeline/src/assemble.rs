//! Prompt assembly under a token budget.
//!
//! The instruction template and question are never cut. Context is built from
//! whole chunks in rank order; the first chunk that would overflow the budget
//! ends the context. Only when not even the top chunk fits is it cut mid-text.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use docqa_core::config::ContextSettings;
use docqa_core::traits::TokenCounter;
use docqa_core::types::{RankedHit, SourceRef};

#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub prompt: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Clone)]
pub struct ContextAssembler {
    counter: Arc<dyn TokenCounter>,
    settings: ContextSettings,
}

pub fn render_prompt(question: &str, context: &str) -> String {
    format!("Answer the question based on the following context:\n{context}\n\nQuestion: {question}\nAnswer:")
}

fn snippet(text: &str, max_chars: usize) -> String { text.chars().take(max_chars).collect() }

impl ContextAssembler {
    pub fn new(counter: Arc<dyn TokenCounter>, settings: ContextSettings) -> Self { Self { counter, settings } }

    fn fits(&self, question: &str, context: &str, max_prompt_tokens: usize) -> Result<(String, bool)> {
        let prompt = render_prompt(question, context);
        let fits = self.counter.count(&prompt)? <= max_prompt_tokens;
        Ok((prompt, fits))
    }

    /// Cut `text` so the prompt around it fits; `None` if nothing non-blank fits.
    fn cut_to_fit(&self, question: &str, text: &str, max_prompt_tokens: usize) -> Result<Option<String>> {
        let overhead = self.counter.count(&render_prompt(question, ""))?;
        let mut budget = max_prompt_tokens.saturating_sub(overhead);
        while budget > 0 {
            let cut = self.counter.truncate(text, budget)?;
            if cut.trim().is_empty() {
                return Ok(None);
            }
            let used = self.counter.count(&render_prompt(question, &cut))?;
            if used <= max_prompt_tokens {
                return Ok(Some(cut));
            }
            // Token merges at the cut can cost more than predicted; shrink by the overflow.
            budget = budget.saturating_sub(used - max_prompt_tokens);
        }
        Ok(None)
    }

    /// Build the prompt from the first `top_n` hits, keeping its token count
    /// within `max_prompt_tokens` whenever the bare template allows it.
    pub fn assemble(&self, question: &str, hits: &[RankedHit], top_n: usize, max_prompt_tokens: usize) -> Result<AssembledPrompt> {
        let separator = self.settings.separator.as_str();
        let mut included: Vec<(&RankedHit, String)> = Vec::new();
        let mut prompt = render_prompt(question, "");

        for hit in hits.iter().take(top_n) {
            let context = {
                let mut parts: Vec<&str> = included.iter().map(|(_, text)| text.as_str()).collect();
                parts.push(&hit.chunk.text);
                parts.join(separator)
            };
            let (candidate, fits) = self.fits(question, &context, max_prompt_tokens)?;
            if !fits {
                debug!(ordinal = hit.chunk.ordinal, included = included.len(), "Context budget reached");
                break;
            }
            prompt = candidate;
            included.push((hit, hit.chunk.text.clone()));
        }

        if included.is_empty() {
            if let Some(top) = hits.first().filter(|_| top_n > 0) {
                match self.cut_to_fit(question, &top.chunk.text, max_prompt_tokens)? {
                    Some(cut) => {
                        prompt = render_prompt(question, &cut);
                        included.push((top, cut));
                    }
                    None => warn!(max_prompt_tokens, "Prompt template alone exceeds the token budget"),
                }
            }
        }

        let sources = included
            .iter()
            .map(|(hit, text)| SourceRef {
                source_id: hit.chunk.source_id.clone(),
                page: hit.chunk.page,
                snippet: snippet(text, self.settings.snippet_chars),
            })
            .collect();
        Ok(AssembledPrompt { prompt, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_char_safe() {
        assert_eq!(snippet("héllo wörld", 4), "héll");
        assert_eq!(snippet("ab", 10), "ab");
    }
}
