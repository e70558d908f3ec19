//! `vdb`: manage and search collections from the command line.
//!
//! ```bash
//! vdb create docs --hybrid
//! vdb index docs ./notes --hybrid
//! vdb hybrid docs "how do I rotate keys" -n 5
//! vdb --memory index docs ./notes --query "rotate keys"
//! ```

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vdb_core::config::{expand_path, Config, Settings};
use vdb_core::data_processor::DataProcessor;
use vdb_core::{
    Embedder, HybridSearchOptions, HybridSearchRequest, Record, Rerank, SearchOptions, SearchResult, VectorDatabase,
    VectorDocument,
};
use vdb_embed::get_default_embedder;
use vdb_qdrant::{MemoryStore, QdrantVectorDatabase};

const INSERT_BATCH: usize = 64;

#[derive(Parser)]
#[command(name = "vdb", version, about = "Vector collections on Qdrant")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Use a throwaway in-process store instead of Qdrant
    #[arg(long, global = true)]
    memory: bool,

    /// Log at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List collections
    Collections,
    /// Create a collection (no-op if it exists)
    Create {
        name: String,
        /// Vector dimension; defaults to the embedder's
        #[arg(long)]
        dim: Option<usize>,
        /// Add a sparse text field for hybrid search
        #[arg(long)]
        hybrid: bool,
    },
    /// Drop a collection (no-op if missing)
    Drop { name: String },
    /// Report whether a collection exists
    Exists { name: String },
    /// Insert documents from a JSON-lines file; missing vectors are embedded
    Insert {
        name: String,
        file: String,
        #[arg(long)]
        hybrid: bool,
    },
    /// Chunk, embed and insert the text files under a directory
    Index {
        name: String,
        /// Defaults to `data.dir` from the configuration
        dir: Option<String>,
        #[arg(long)]
        hybrid: bool,
        /// Stop after this many files
        #[arg(long)]
        limit: Option<usize>,
        /// Run a search once indexing is done
        #[arg(long)]
        query: Option<String>,
    },
    /// Dense similarity search
    Search {
        name: String,
        text: String,
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Dense + keyword search fused with reciprocal rank fusion
    Hybrid {
        name: String,
        text: String,
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        /// RRF smoothing constant; defaults to search.rrf_k
        #[arg(long)]
        k: Option<f32>,
    },
    /// Delete documents by id
    Delete {
        name: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Fetch stored records
    Query {
        name: String,
        #[arg(long, default_value = "")]
        filter: String,
        /// Comma separated payload fields; all when omitted
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    let config = Config::load().context("loading configuration")?;
    let settings = Settings::from_config(&config)?;
    info!("environment '{}', qdrant at {}", config.env_name(), settings.qdrant.url);

    let db: Box<dyn VectorDatabase> = if cli.memory {
        Box::new(QdrantVectorDatabase::with_store(MemoryStore::new(), settings.search.clone()))
    } else {
        Box::new(QdrantVectorDatabase::connect(&settings)?)
    };
    let embedder = get_default_embedder()?;

    run(&cli, &config, db.as_ref(), embedder.as_ref(), &settings).await
}

async fn run(
    cli: &Cli,
    config: &Config,
    db: &dyn VectorDatabase,
    embedder: &dyn Embedder,
    settings: &Settings,
) -> Result<()> {
    match &cli.command {
        Command::Collections => {
            let names = db.list_collections().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                names.iter().for_each(|n| println!("{n}"));
            }
        }
        Command::Create { name, dim, hybrid } => {
            let dim = dim.unwrap_or_else(|| embedder.dim());
            if *hybrid {
                db.create_hybrid_collection(name, dim).await?;
            } else {
                db.create_collection(name, dim).await?;
            }
            println!("collection '{name}' ready (dim={dim}, hybrid={hybrid})");
        }
        Command::Drop { name } => {
            db.drop_collection(name).await?;
            println!("collection '{name}' dropped");
        }
        Command::Exists { name } => {
            let exists = db.has_collection(name).await?;
            if cli.json {
                println!("{}", serde_json::json!({ "collection": name, "exists": exists }));
            } else {
                println!("{exists}");
            }
        }
        Command::Insert { name, file, hybrid } => {
            let docs = read_jsonl(&expand_path(file))?;
            let n = store_documents(db, embedder, name, docs, *hybrid).await?;
            println!("inserted {n} documents into '{name}'");
        }
        Command::Index { name, dir, hybrid, limit, query } => {
            let dir: PathBuf = match dir {
                Some(d) => expand_path(d),
                None => config.get_path("data.dir")?.context("no directory given and data.dir is not set")?,
            };
            if !dir.is_dir() {
                bail!("{} is not a directory", dir.display());
            }
            let processor = DataProcessor::new();
            let docs = match limit {
                Some(l) => processor.process_directory_limited(&dir, *l)?,
                None => processor.process_directory(&dir)?,
            };
            if *hybrid {
                db.create_hybrid_collection(name, embedder.dim()).await?;
            } else {
                db.create_collection(name, embedder.dim()).await?;
            }
            let n = store_documents(db, embedder, name, docs, *hybrid).await?;
            println!("indexed {n} chunks from {} into '{name}'", dir.display());

            if let Some(text) = query {
                let results = if *hybrid {
                    hybrid_search(db, embedder, name, text, 10, None).await?
                } else {
                    dense_search(db, embedder, name, text, 10, None).await?
                };
                print_results(cli.json, &results)?;
            }
        }
        Command::Search { name, text, limit, threshold } => {
            let results = dense_search(db, embedder, name, text, *limit, *threshold).await?;
            print_results(cli.json, &results)?;
        }
        Command::Hybrid { name, text, limit, k } => {
            let k = k.unwrap_or(settings.search.rrf_k);
            let results = hybrid_search(db, embedder, name, text, *limit, Some(k)).await?;
            print_results(cli.json, &results)?;
        }
        Command::Delete { name, ids } => {
            db.delete(name, ids).await?;
            println!("deleted {} ids from '{name}'", ids.len());
        }
        Command::Query { name, filter, fields, limit } => {
            let records = db.query(name, filter, fields, *limit).await?;
            print_records(cli.json, &records)?;
        }
    }
    Ok(())
}

fn read_jsonl(path: &Path) -> Result<Vec<VectorDocument>> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut docs = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: VectorDocument =
            serde_json::from_str(&line).with_context(|| format!("{}:{}: bad document", path.display(), i + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Embed documents without a vector, then insert in batches.
async fn store_documents(
    db: &dyn VectorDatabase,
    embedder: &dyn Embedder,
    name: &str,
    mut docs: Vec<VectorDocument>,
    hybrid: bool,
) -> Result<usize> {
    let missing: Vec<usize> = docs.iter().enumerate().filter(|(_, d)| d.vector.is_empty()).map(|(i, _)| i).collect();
    if !missing.is_empty() {
        let texts: Vec<String> = missing.iter().map(|&i| docs[i].content.clone()).collect();
        let vectors = embedder.embed_batch(&texts)?;
        for (i, v) in missing.into_iter().zip(vectors) {
            docs[i].vector = v;
        }
    }
    for batch in docs.chunks(INSERT_BATCH) {
        if hybrid {
            db.insert_hybrid(name, batch).await?;
        } else {
            db.insert(name, batch).await?;
        }
        info!("inserted batch of {} into '{}'", batch.len(), name);
    }
    Ok(docs.len())
}

async fn dense_search(
    db: &dyn VectorDatabase,
    embedder: &dyn Embedder,
    name: &str,
    text: &str,
    limit: usize,
    threshold: Option<f32>,
) -> Result<Vec<SearchResult>> {
    let vector = embed_one(embedder, text)?;
    Ok(db.search(name, &vector, SearchOptions { top_k: limit, threshold }).await?)
}

async fn hybrid_search(
    db: &dyn VectorDatabase,
    embedder: &dyn Embedder,
    name: &str,
    text: &str,
    limit: usize,
    k: Option<f32>,
) -> Result<Vec<SearchResult>> {
    let vector = embed_one(embedder, text)?;
    let requests = vec![HybridSearchRequest::dense(vector, limit), HybridSearchRequest::text(text, limit)];
    let options = HybridSearchOptions { limit, rerank: k.map(|k| Rerank::Rrf { k }) };
    Ok(db.hybrid_search(name, &requests, options).await?)
}

fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed_batch(&[text.to_string()])?
        .into_iter()
        .next()
        .context("embedder returned no vector")
}

fn print_results(json: bool, results: &[SearchResult]) -> Result<()> {
    if json {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.document.id,
                    "score": r.score,
                    "relativePath": r.document.relative_path,
                    "startLine": r.document.start_line,
                    "endLine": r.document.end_line,
                    "content": r.document.content,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("no results");
    }
    for (i, r) in results.iter().enumerate() {
        let d = &r.document;
        println!("{:>2}. [{:.4}] {}  {}:{}-{}", i + 1, r.score, d.id, d.relative_path, d.start_line, d.end_line);
        if let Some(first) = d.content.lines().find(|l| !l.trim().is_empty()) {
            let snippet: String = first.trim().chars().take(100).collect();
            println!("    {snippet}");
        }
    }
    Ok(())
}

fn print_records(json: bool, records: &[Record]) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        for r in records {
            println!("{}", serde_json::Value::Object(r.clone()));
        }
    }
    Ok(())
}
