use std::env;

use docqa_cli::{ingest_with_progress, init_tracing, load_settings, parse_args};
use docqa_pipeline::RetrievalPipeline;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args[1..])?;
    let Some(query_text) = cli.query.clone().filter(|_| !cli.paths.is_empty()) else {
        eprintln!("Usage: {} <file-or-dir>... --query \"<query>\" [--top-k N] [--rerank-top-n N]", args[0]);
        eprintln!("Example: {} ./docs --query 'water filter' --top-k 10", args[0]);
        std::process::exit(1);
    };
    let settings = load_settings(&cli)?;
    let (top_k, rerank_top_n) = (settings.retrieval.top_k, settings.retrieval.rerank_top_n);
    let pipeline = RetrievalPipeline::from_settings(settings)?;
    let rt = tokio::runtime::Runtime::new()?;
    ingest_with_progress(&rt, &pipeline, cli.paths)?;

    println!("🔍 docqa-search\n==============");
    println!("Query: {}", query_text);
    let hits = rt.block_on(pipeline.search(&query_text, top_k))?;
    println!("\n🔍 First stage: {} results", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let page = hit.chunk.page.map(|p| format!(" page={}", p)).unwrap_or_default();
        println!("\n  {}. distance={:.4}  #{}  {}{}", i + 1, hit.distance, hit.chunk.ordinal, hit.chunk.source_id, page);
        println!("     📝 {}", hit.chunk.text.trim());
    }

    let ranked = rt.block_on(pipeline.rank(&query_text, top_k, rerank_top_n))?;
    println!("\n🎯 Reranked: top {}", ranked.len());
    for (i, hit) in ranked.iter().enumerate() {
        println!("  {}. score={:.4}  #{}  {}", i + 1, hit.relevance_score, hit.chunk.ordinal, hit.chunk.source_id);
    }
    Ok(())
}
