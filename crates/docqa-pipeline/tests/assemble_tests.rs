use std::sync::Arc;

use docqa_core::config::ContextSettings;
use docqa_core::traits::{TokenCounter, WhitespaceTokenCounter};
use docqa_core::types::{Chunk, RankedHit};
use docqa_pipeline::{render_prompt, ContextAssembler};

fn hit(ordinal: usize, text: &str, page: Option<u32>) -> RankedHit {
    RankedHit {
        chunk: Chunk { text: text.to_string(), source_id: "manual.pdf".to_string(), page, ordinal },
        relevance_score: 1.0 / (ordinal as f32 + 1.0),
    }
}

fn assembler() -> ContextAssembler { ContextAssembler::new(Arc::new(WhitespaceTokenCounter), ContextSettings::default()) }

fn overhead(question: &str) -> usize { WhitespaceTokenCounter.count(&render_prompt(question, "")).expect("count") }

#[test]
fn large_budget_keeps_all_top_n_in_rank_order() {
    let hits = vec![hit(4, "alpha beta", Some(2)), hit(1, "gamma", None), hit(9, "delta epsilon", Some(7))];
    let out = assembler().assemble("what?", &hits, 3, 10_000).expect("assemble");
    assert_eq!(out.prompt, render_prompt("what?", "alpha beta\ngamma\ndelta epsilon"));
    let pages: Vec<Option<u32>> = out.sources.iter().map(|s| s.page).collect();
    assert_eq!(pages, vec![Some(2), None, Some(7)]);
}

#[test]
fn only_top_n_hits_are_used() {
    let hits = vec![hit(0, "one", None), hit(1, "two", None), hit(2, "three", None)];
    let out = assembler().assemble("q", &hits, 2, 10_000).expect("assemble");
    assert!(out.prompt.contains("one\ntwo"));
    assert!(!out.prompt.contains("three"));
    assert_eq!(out.sources.len(), 2);
}

#[test]
fn lowest_ranked_chunk_is_dropped_before_cutting() {
    let hits = vec![
        hit(0, "a1 a2 a3 a4 a5", None),
        hit(1, "b1 b2 b3 b4 b5", None),
        hit(2, "c1 c2 c3 c4 c5", None),
    ];
    let max = overhead("q") + 12;
    let out = assembler().assemble("q", &hits, 3, max).expect("assemble");
    assert_eq!(out.prompt, render_prompt("q", "a1 a2 a3 a4 a5\nb1 b2 b3 b4 b5"));
    assert_eq!(out.sources.len(), 2);
    assert!(WhitespaceTokenCounter.count(&out.prompt).expect("count") <= max);
}

#[test]
fn top_chunk_is_cut_when_nothing_else_fits() {
    let hits = vec![hit(0, "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10", Some(3)), hit(1, "other", None)];
    let max = overhead("q") + 4;
    let out = assembler().assemble("q", &hits, 2, max).expect("assemble");
    assert_eq!(out.prompt, render_prompt("q", "w1 w2 w3 w4"));
    assert_eq!(out.sources.len(), 1);
    assert_eq!(out.sources[0].snippet, "w1 w2 w3 w4");
    assert_eq!(out.sources[0].page, Some(3));
}

#[test]
fn template_is_never_cut() {
    let hits = vec![hit(0, "some context", None)];
    let out = assembler().assemble("a fairly long question", &hits, 1, 3).expect("assemble");
    assert_eq!(out.prompt, render_prompt("a fairly long question", ""));
    assert!(out.sources.is_empty());
}

#[test]
fn snippets_are_capped() {
    let settings = ContextSettings { snippet_chars: 5, ..ContextSettings::default() };
    let assembler = ContextAssembler::new(Arc::new(WhitespaceTokenCounter), settings);
    let out = assembler.assemble("q", &[hit(0, "alphabet soup", None)], 1, 10_000).expect("assemble");
    assert_eq!(out.sources[0].snippet, "alpha");
    assert_eq!(out.sources[0].to_string(), "manual.pdf: alpha");
}

#[test]
fn no_hits_gives_bare_prompt() {
    let out = assembler().assemble("q", &[], 3, 400).expect("assemble");
    assert_eq!(out.prompt, render_prompt("q", ""));
    assert!(out.sources.is_empty());
}

#[test]
fn cut_chunk_is_a_verbatim_prefix() {
    let hits = vec![hit(0, "w1\nw2\tw3 w4 w5 w6", None)];
    let max = overhead("q") + 2;
    let out = assembler().assemble("q", &hits, 1, max).expect("assemble");
    assert_eq!(out.prompt, render_prompt("q", "w1\nw2"));
    assert_eq!(out.sources[0].snippet, "w1\nw2");
    assert!(hits[0].chunk.text.starts_with(&out.sources[0].snippet));
}
