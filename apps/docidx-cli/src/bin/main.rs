use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docidx_core::config::{expand_path, Config};
use docidx_core::data_processor::DataProcessor;
use docidx_embed::get_default_embedder;
use docidx_hybrid::Retriever;

const DEFAULT_K: usize = 5;

fn usage(prog: &str) -> ! {
    eprintln!("Usage: {prog} query [docs-dir] \"<query>\" [k]");
    eprintln!("       {prog} chunks [docs-dir]");
    std::process::exit(1)
}

fn parse_args() -> (String, String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() { usage(&prog) }
    let cmd = args.remove(0);
    (prog, cmd, args)
}

fn docs_dir(config: &Config, arg: Option<&String>) -> PathBuf {
    match arg {
        Some(dir) => expand_path(dir),
        None => expand_path(config.get::<String>("data.docs_dir").unwrap_or_else(|_| "./docs".to_string())),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {e:#}"); e })?;
    let (prog, cmd, args) = parse_args();
    let processor = DataProcessor::new();
    match cmd.as_str() {
        "chunks" => {
            let dir = docs_dir(&config, args.first());
            for doc in processor.process_directory(&dir)? {
                let source = doc.field("source").and_then(|v| v.as_str()).unwrap_or("?");
                let words = doc.content().split_whitespace().count();
                println!("{source}\t{words} words\t{}", doc.content().lines().next().unwrap_or(""));
            }
        }
        "query" => {
            // query <dir> <text> [k] | query <text> [k]
            let (dir_arg, rest) = match args.len() {
                0 => usage(&prog),
                1 => (None, &args[..]),
                _ if args[1].parse::<usize>().is_ok() && args.len() == 2 => (None, &args[..]),
                _ => (args.first(), &args[1..]),
            };
            let query = rest[0].as_str();
            let k = match rest.get(1) {
                Some(raw) => raw.parse::<usize>().map_err(|_| anyhow::anyhow!("k must be a positive integer, got {raw:?}"))?,
                None => DEFAULT_K,
            };

            let dir = docs_dir(&config, dir_arg);
            let chunks = processor.process_directory(&dir)?;
            tracing::info!(dir = %dir.display(), chunks = chunks.len(), "loaded documents");

            let embedder = get_default_embedder(&config.embedding()?)?;
            let mut retriever = Retriever::from_settings(&config.retrieval()?, embedder)?;
            retriever.add_documents(chunks)?;

            let hits = retriever.search(query, k)?;
            if hits.is_empty() { println!("No results."); }
            for (rank, hit) in hits.iter().enumerate() {
                let source = hit.document.field("source").and_then(|v| v.as_str()).unwrap_or("?");
                let preview: String = hit.document.content().chars().take(120).collect();
                println!("{:>2}. [{:.5}] {source} ({})\n    {}", rank + 1, hit.score, hit.document.id().unwrap_or("-"), preview.replace('\n', " "));
            }
        }
        _ => { eprintln!("Unknown command: {cmd}"); usage(&prog) }
    }
    Ok(())
}
