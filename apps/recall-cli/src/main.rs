use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use recall_core::config::Config;
use recall_core::data_processor::{ChunkingConfig, DataProcessor};
use recall_core::traits::Embedder;
use recall_core::types::CorpusRecord;
use recall_embed::{default_embedder, EmbedderConfig};
use recall_retrieval::{RetrievalConfig, RetrievalEngine};
use recall_vector::{CorpusWriter, LanceCorpusSource, StorageConfig};

const USAGE: &str = "Usage:
  recall ingest [dir] --partition <id> [--limit <files>]
  recall query \"<text>\" --partition <id> [--k <n>]";

const EMBED_BATCH: usize = 64;

#[derive(Debug, Default)]
struct Args {
    positional: Option<String>,
    partition: Option<String>,
    k: Option<usize>,
    limit: Option<usize>,
}

fn parse_args(raw: &[String]) -> Result<Args> {
    let mut args = Args::default();
    let mut i = 0;
    while i < raw.len() {
        let value = |i: usize| raw.get(i + 1).with_context(|| format!("{} requires a value", raw[i]));
        match raw[i].as_str() {
            "--partition" | "-p" => { args.partition = Some(value(i)?.clone()); i += 1; }
            "--k" | "-k" => { args.k = Some(value(i)?.parse().context("--k requires a number")?); i += 1; }
            "--limit" => { args.limit = Some(value(i)?.parse().context("--limit requires a number")?); i += 1; }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}\n{USAGE}"),
            other => args.positional = Some(other.to_string()),
        }
        i += 1;
    }
    Ok(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::load().context("loading configuration")?;
    let mut raw: Vec<String> = env::args().skip(1).collect();
    if raw.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = raw.remove(0);
    let args = parse_args(&raw)?;
    let storage = StorageConfig::from_config(&config)?;
    let embedding: EmbedderConfig = config.get_or_default("embedding")?;
    let partition = args.partition.clone().with_context(|| format!("--partition is required\n{USAGE}"))?;

    match cmd.as_str() {
        "ingest" => ingest(&config, &storage, &embedding, &partition, &args).await,
        "query" => query(&config, &storage, &embedding, &partition, &args).await,
        other => bail!("unknown command {other}\n{USAGE}"),
    }
}

async fn ingest(
    config: &Config,
    storage: &StorageConfig,
    embedding: &EmbedderConfig,
    partition: &str,
    args: &Args,
) -> Result<()> {
    let data_dir = args.positional.as_ref().map_or_else(|| storage.raw_txt_path(), PathBuf::from);
    info!(dir = %data_dir.display(), partition, "ingesting");

    let chunking: ChunkingConfig = config.get_or_default("chunking")?;
    let documents = DataProcessor::with_config(chunking).process_directory_limited(&data_dir, args.limit)?;
    if documents.is_empty() {
        println!("No passages found under {}", data_dir.display());
        return Ok(());
    }

    let embedder = default_embedder(embedding)?;
    let mut records = Vec::with_capacity(documents.len());
    for batch in documents.chunks(EMBED_BATCH) {
        let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await.context("embedding passages")?;
        if vectors.len() != batch.len() {
            bail!("embedder returned {} vectors for {} passages", vectors.len(), batch.len());
        }
        records.extend(batch.iter().cloned().zip(vectors).map(|(doc, v)| CorpusRecord::new(doc, v)));
    }

    let lancedb_path = storage.lancedb_path();
    fs::create_dir_all(&lancedb_path)?;
    let writer = CorpusWriter::open(&lancedb_path.to_string_lossy(), &storage.documents_table, embedder.dim())
        .await?
        .with_progress(true);
    let written = writer.replace_partition(partition, &records).await?;
    println!("Ingested {written} passages into partition {partition}");
    Ok(())
}

async fn query(
    config: &Config,
    storage: &StorageConfig,
    embedding: &EmbedderConfig,
    partition: &str,
    args: &Args,
) -> Result<()> {
    let Some(text) = args.positional.as_deref() else {
        bail!("query text is required\n{USAGE}");
    };
    let retrieval = RetrievalConfig::from_config(config)?;
    let k = args.k.unwrap_or(retrieval.k);

    let source = LanceCorpusSource::open(&storage.lancedb_path().to_string_lossy(), &storage.documents_table).await?;
    let embedder = default_embedder(embedding)?;
    let engine = RetrievalEngine::from_source(&source, partition, embedder, retrieval).await?;
    let hits = engine.retrieve_ranked(text, k).await?;

    if hits.is_empty() {
        println!("No relevant passages for \"{text}\"");
        return Ok(());
    }
    println!("{} passages for \"{text}\"", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let doc = &hit.document;
        println!("\n  {}. score={:.4}  id={}  group={}  stage={:?}", i + 1, hit.score, doc.id, doc.group_id, hit.stage);
        println!("     {}", doc.text.replace('\n', " "));
    }
    Ok(())
}
