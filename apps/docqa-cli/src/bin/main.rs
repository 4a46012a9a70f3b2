use std::env;
use std::io::{self, BufRead, Write};

use docqa_cli::{ingest_with_progress, init_tracing, load_settings, parse_args};
use docqa_core::types::QueryResult;
use docqa_pipeline::RetrievalPipeline;

fn print_result(result: &QueryResult) {
    println!("\n💬 Answer:\n{}", result.answer_text);
    if !result.sources.is_empty() {
        println!("\n📄 Sources:");
        for source in &result.sources { println!("  - {}", source); }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args[1..])?;
    if cli.paths.is_empty() {
        eprintln!("Usage: {} <file-or-dir>... [--query \"<question>\"] [--top-k N] [--rerank-top-n N]", args[0]);
        eprintln!("Example: {} ./docs --query 'How do I purify water?'", args[0]);
        std::process::exit(1);
    }
    let settings = load_settings(&cli)?;
    let pipeline = RetrievalPipeline::from_settings(settings)?;
    let rt = tokio::runtime::Runtime::new()?;
    ingest_with_progress(&rt, &pipeline, cli.paths)?;

    if let Some(question) = cli.query {
        let result = rt.block_on(pipeline.query(&question))?;
        print_result(&result);
        return Ok(());
    }

    println!("Ask a question (empty line or 'exit' to quit).");
    let stdin = io::stdin();
    loop {
        print!("\n❓ ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 { break; }
        let question = line.trim();
        if question.is_empty() || question.eq_ignore_ascii_case("exit") { break; }
        match rt.block_on(pipeline.query(question)) {
            Ok(result) => print_result(&result),
            Err(e) => tracing::error!(error = %e, "Query failed"),
        }
    }
    Ok(())
}
