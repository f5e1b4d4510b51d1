use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpusclean::pipeline::Pipeline;
use corpusclean_core::{PipelineConfig, RawPage, ShingleMode};
use corpusclean_local::{FixedClassifier, HttpClassifier, HtmlExtractor, JsonlSink};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "corpusclean")]
#[command(about = "Clean scraped web pages into a deduplicated plain-text corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the extract → classify → dedup pipeline over a JSONL batch.
    Run(RunCmd),
    /// Print version info.
    Version,
}

#[derive(clap::Args, Debug)]
struct RunCmd {
    /// Input JSONL of raw pages: {"id"?, "url"?, "html"} per line.
    #[arg(long)]
    input: PathBuf,
    /// Output JSONL of accepted documents (append-only, commit order).
    #[arg(long)]
    output: PathBuf,
    /// Scoring endpoint (POST {"text"} -> {"score"}). Without it every
    /// document scores `--fixed-score`.
    #[arg(long, env = "CORPUSCLEAN_CLASSIFIER_URL")]
    classifier_url: Option<String>,
    /// Constant score used when no classifier endpoint is configured.
    #[arg(long, default_value_t = 1.0)]
    fixed_score: f64,
    /// Word or char shingles.
    #[arg(long, default_value = "word")]
    shingle_mode: String,
    #[arg(long, default_value_t = 3)]
    shingle_width: usize,
    /// MinHash signature length k (= bands * rows).
    #[arg(long, default_value_t = 128)]
    signature_len: usize,
    #[arg(long, default_value_t = 32)]
    bands: usize,
    #[arg(long, default_value_t = 4)]
    rows_per_band: usize,
    /// Estimated-Jaccard cutoff; strictly greater counts as duplicate.
    #[arg(long, default_value_t = 0.8)]
    similarity_threshold: f64,
    /// Minimum classifier confidence to keep a document.
    #[arg(long, default_value_t = 0.5)]
    min_confidence: f64,
    #[arg(long, default_value_t = 2)]
    retry_limit: u32,
    #[arg(long, default_value_t = 42)]
    hash_seed: u64,
    #[arg(long, default_value_t = 10_000)]
    classifier_timeout_ms: u64,
    #[arg(long, default_value_t = 8)]
    workers: usize,
    /// Also list every rejected document (id + reason) in the summary.
    #[arg(long)]
    report_rejections: bool,
}

fn parse_mode(s: &str) -> Result<ShingleMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "word" => Ok(ShingleMode::Word),
        "char" => Ok(ShingleMode::Char),
        other => anyhow::bail!("unknown shingle mode: {other} (expected word|char)"),
    }
}

fn read_pages(path: &PathBuf) -> Result<Vec<RawPage>> {
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut pages = Vec::new();
    for (lineno, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let page: RawPage = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: bad page record", path.display(), lineno + 1))?;
        pages.push(page);
    }
    Ok(pages)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Version => {
            println!(
                "{}",
                serde_json::json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                })
            );
            Ok(())
        }
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunCmd) -> Result<()> {
    let config = PipelineConfig {
        shingle_mode: parse_mode(&args.shingle_mode)?,
        shingle_width: args.shingle_width,
        signature_len: args.signature_len,
        bands: args.bands,
        rows_per_band: args.rows_per_band,
        similarity_threshold: args.similarity_threshold,
        min_confidence: args.min_confidence,
        retry_limit: args.retry_limit,
        hash_seed: args.hash_seed,
        classifier_timeout_ms: args.classifier_timeout_ms,
        worker_count: args.workers,
        ..Default::default()
    };

    let classifier: Arc<dyn corpusclean_core::Classifier> = match &args.classifier_url {
        Some(url) => Arc::new(HttpClassifier::new(
            reqwest::Client::new(),
            url.clone(),
            config.classifier_timeout(),
        )),
        None => Arc::new(FixedClassifier::new(args.fixed_score)),
    };
    let pipeline = Pipeline::new(config, Arc::new(HtmlExtractor::default()), classifier)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let pages = read_pages(&args.input)?;
    let mut sink =
        JsonlSink::create(&args.output).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let report = pipeline
        .run(pages, &mut sink)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let mut summary = serde_json::json!({ "stats": report.stats });
    if args.report_rejections {
        summary["rejections"] = serde_json::to_value(&report.rejections)?;
    }
    println!("{summary}");
    Ok(())
}
