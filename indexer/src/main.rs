mod corpus;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use lexsearch_core::builder::build_snapshot_with;
use lexsearch_core::config::{MIN_TERM_LEN, TOP_K};
use lexsearch_core::persist::{load_doc_urls, load_snapshot, save_doc_urls, save_snapshot, IndexPaths};
use lexsearch_core::{QueryService, Tokenizer};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect a TF-IDF index snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from crawler JSON/JSONL output (file or directory)
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Stopword list, one word per line (defaults to the built-in English list)
        #[arg(long)]
        stopwords: Option<String>,
        /// Shortest term kept as a vocabulary dimension
        #[arg(long, default_value_t = MIN_TERM_LEN)]
        min_term_len: usize,
    },
    /// Show the IDF and postings list of a term
    Inspect {
        /// Index directory path
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long)]
        term: String,
    },
    /// Run one query against a built index
    Query {
        /// Index directory path
        #[arg(long, default_value = "./index")]
        index: String,
        /// Maximum number of results (at most 5)
        #[arg(long, default_value_t = TOP_K)]
        k: usize,
        text: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords, min_term_len } => {
            build_index(&input, &output, stopwords.as_deref(), min_term_len)
        }
        Commands::Inspect { index, term } => inspect(&index, &term),
        Commands::Query { index, k, text } => query(&index, k, &text),
    }
}

fn build_index(input: &str, output: &str, stopwords: Option<&str>, min_term_len: usize) -> Result<()> {
    let tokenizer = match stopwords {
        Some(path) => Tokenizer::from_stopword_file(path)?,
        None => Tokenizer::english(),
    };
    let corpus = corpus::load_corpus(Path::new(input))?;
    tracing::info!(num_docs = corpus.documents.len(), "ingested documents");

    let snapshot = build_snapshot_with(&corpus.documents, &tokenizer, min_term_len)?;
    let out_paths = IndexPaths::new(output);
    save_snapshot(&out_paths, &snapshot)?;
    save_doc_urls(&out_paths, &corpus.urls)?;

    tracing::info!(output, snapshot = %snapshot.meta().snapshot_id, "index build complete");
    Ok(())
}

fn inspect(index: &str, term: &str) -> Result<()> {
    let snapshot = load_snapshot(&IndexPaths::new(index))?;
    // normalize the way the corpus was normalized
    let tokens = snapshot.tokenizer().tokenize(term);
    let Some(normalized) = tokens.first() else {
        bail!("{term:?} normalizes to nothing (stopword or punctuation only)");
    };
    let Some(idf) = snapshot.vectorizer().idf(normalized) else {
        println!("{normalized}: not in vocabulary");
        return Ok(());
    };
    let postings = snapshot.inverted_index().postings(normalized).unwrap_or_default();
    println!("{normalized}: idf={idf:.4} df={}", postings.len());
    for p in postings {
        println!("  doc {:>6}  weight {:.6}", p.doc_id, p.weight);
    }
    Ok(())
}

fn query(index: &str, k: usize, text: &str) -> Result<()> {
    let paths = IndexPaths::new(index);
    let snapshot = load_snapshot(&paths)?;
    let urls = load_doc_urls(&paths).unwrap_or_default();
    let service = QueryService::new(Arc::new(snapshot)).with_top_k(k);

    let results = service.answer(Some(text))?;
    if results.is_empty() {
        println!("no results");
    }
    for (rank, hit) in results.iter().enumerate() {
        let url = urls.get(&hit.doc_id).map(String::as_str).unwrap_or("-");
        println!("{:>2}. doc {:>6}  score {:.4}  {}", rank + 1, hit.doc_id, hit.score, url);
    }
    Ok(())
}
