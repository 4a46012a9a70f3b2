use docqa_core::traits::PairScorer;

/// Fraction of query terms that occur in the passage (case-insensitive).
///
/// Model-free and deterministic; useful offline and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalScorer;

fn terms(text: &str) -> Vec<String> {
    let mut out: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    out.sort();
    out.dedup();
    out
}

impl PairScorer for LexicalScorer {
    fn score(&self, query: &str, passage: &str) -> anyhow::Result<f32> {
        let query_terms = terms(query);
        if query_terms.is_empty() { return Ok(0.0); }
        let passage_terms = terms(passage);
        let hits = query_terms.iter().filter(|t| passage_terms.binary_search(t).is_ok()).count();
        Ok(hits as f32 / query_terms.len() as f32)
    }
}
