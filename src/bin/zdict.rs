use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;
use serde_json::json;
use zdict::bytes::{hex_preview, preview, printable_ratio};
use zdict::corpus::load_samples;
use zdict::{
    validate_dictionary, CancelToken, Codec, CompressionLevel, DictionaryHeader, IngestConfig,
    SegmentOrder, Trainer, TrainerConfig, ZstdCodec,
};

const DEFAULT_OUTPUT: &str = "dictionary.bin";
const DEFAULT_SAMPLE_SEED: u64 = 0x5a44_4943_5453_4545; // "ZDICTSEE"

#[derive(Parser, Debug)]
#[command(author, version, about = "Shared compression dictionary toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a dictionary from sample files
    Train(TrainArgs),
    /// Inspect a dictionary file
    Info(InfoArgs),
    /// Measure how well a dictionary compresses sample files
    Eval(EvalArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    /// Highest-benefit segment first
    First,
    /// Highest-benefit segment last
    Last,
}

impl From<OrderArg> for SegmentOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::First => SegmentOrder::MostBenefitFirst,
            OrderArg::Last => SegmentOrder::MostBenefitLast,
        }
    }
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Files or directories to ingest
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output path for the dictionary
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// JSON training configuration; flags override its fields
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum dictionary size in bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<usize>,

    /// Window width used for frequency analysis
    #[arg(long, value_name = "BYTES")]
    hash_bytes: Option<usize>,

    /// Dictionary id written in Zstandard container mode
    #[arg(long, value_name = "ID")]
    dict_id: Option<u32>,

    /// Emit a standard Zstandard dictionary instead of raw content
    #[arg(long)]
    compat: bool,

    /// Compression level (fastest, default, better, best)
    #[arg(long, value_name = "LEVEL")]
    level: Option<CompressionLevel>,

    /// Minimum number of samples a segment must appear in
    #[arg(long, value_name = "COUNT")]
    min_samples: Option<usize>,

    /// Placement of the highest-benefit segment
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Split files into samples of this many bytes (0 = whole file)
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Train on a random subset of at most this many samples
    #[arg(long, value_name = "COUNT")]
    sample_limit: Option<usize>,

    /// Seed for --sample-limit
    #[arg(long, value_name = "SEED", default_value_t = DEFAULT_SAMPLE_SEED)]
    seed: u64,

    /// Write training metrics as JSON
    #[arg(long, value_name = "PATH")]
    metrics: Option<PathBuf>,

    /// Round-trip every sample through zstd with the new dictionary
    #[arg(long)]
    verify: bool,

    /// Limit Rayon worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Disable progress logging and the spinner
    #[arg(long)]
    no_progress: bool,

    /// Disable recursive directory traversal
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Dictionary file to inspect
    dictionary: PathBuf,

    /// Emit JSON instead of human-readable output
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Dictionary file to evaluate
    #[arg(short = 'd', long, value_name = "PATH")]
    dictionary: PathBuf,

    /// Files or directories holding samples
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Compression level (fastest, default, better, best)
    #[arg(long, value_name = "LEVEL", default_value = "default")]
    level: CompressionLevel,

    /// Split files into samples of this many bytes (0 = whole file)
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    chunk_size: usize,

    /// Emit JSON instead of human-readable output
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Info(args) => run_info(&args),
        Commands::Eval(args) => run_eval(&args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn trainer_config(args: &TrainArgs) -> Result<TrainerConfig> {
    let mut cfg = match &args.config {
        Some(path) => TrainerConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TrainerConfig::default(),
    };
    if let Some(max_size) = args.max_size {
        cfg.max_dict_size = max_size;
    }
    if let Some(hash_bytes) = args.hash_bytes {
        cfg.hash_bytes = hash_bytes;
    }
    if let Some(dict_id) = args.dict_id {
        cfg.dict_id = dict_id;
    }
    if args.compat {
        cfg.compat_mode = true;
    }
    if let Some(level) = args.level {
        cfg.level = level;
    }
    if let Some(min_samples) = args.min_samples {
        cfg.min_sample_count = min_samples;
    }
    if let Some(order) = args.order {
        cfg.segment_order = order.into();
    }
    cfg.show_progress = !args.no_progress;
    cfg.validate()?;
    Ok(cfg)
}

fn subsample(samples: Vec<Vec<u8>>, limit: usize, seed: u64) -> Vec<Vec<u8>> {
    if limit == 0 || samples.len() <= limit {
        return samples;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keep = sample(&mut rng, samples.len(), limit).into_vec();
    keep.sort_unstable();
    let mut picked = Vec::with_capacity(keep.len());
    let mut next = keep.into_iter().peekable();
    for (index, data) in samples.into_iter().enumerate() {
        if next.peek() == Some(&index) {
            picked.push(data);
            next.next();
        }
    }
    picked
}

fn run_train(args: TrainArgs) -> Result<()> {
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("unable to configure Rayon thread pool")?;
    }

    let trainer_cfg = trainer_config(&args)?;
    let ingest_cfg = IngestConfig {
        chunk_size: args.chunk_size.unwrap_or(0),
        recursive: !args.no_recursive,
        follow_symlinks: args.follow_symlinks,
    };

    let samples =
        load_samples(&args.inputs, &ingest_cfg).with_context(|| "failed to load samples")?;
    let loaded = samples.len();
    let samples = match args.sample_limit {
        Some(limit) => subsample(samples, limit, args.seed),
        None => samples,
    };
    let corpus_bytes: usize = samples.iter().map(Vec::len).sum();
    info!(
        "loaded {} sample(s) totalling {:.2} MiB (using {})",
        loaded,
        bytes_to_mebibytes(corpus_bytes),
        samples.len()
    );

    let spinner = if args.no_progress {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} training dictionary... {elapsed}")
            .context("invalid progress template")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    let trainer = Trainer::new(trainer_cfg.clone());
    let start = Instant::now();
    let mut summary: Box<dyn Write> = if args.no_progress {
        Box::new(io::sink())
    } else {
        Box::new(io::stderr())
    };
    let outcome = trainer.train_with_output(&samples, &mut summary);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let artifacts = match outcome {
        Ok(artifacts) => artifacts,
        Err(err) if err.is_empty_dictionary() => {
            warn!("{err}; compress without a dictionary");
            bail!("no dictionary written to {}", args.output.display());
        }
        Err(err) => return Err(err).context("training failed"),
    };
    let elapsed = start.elapsed();

    fs::write(&args.output, artifacts.dictionary.as_bytes())
        .with_context(|| format!("failed to write dictionary to {}", args.output.display()))?;

    if let Some(path) = &args.metrics {
        let json = serde_json::to_string_pretty(&artifacts.metrics)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    }

    let kind = if artifacts.dictionary.is_compat() {
        "zstd"
    } else {
        "raw"
    };
    info!(
        "training complete: segments={} size={} duration={elapsed:.2?}",
        artifacts.dictionary.segments(),
        artifacts.dictionary.len()
    );
    println!(
        "wrote {kind} dictionary of {} bytes ({} segments) to {}",
        artifacts.dictionary.len(),
        artifacts.dictionary.segments(),
        args.output.display()
    );
    println!(
        "   corpus {:.2} MiB | duration {:.2?} | stop {:?}",
        bytes_to_mebibytes(corpus_bytes),
        elapsed,
        artifacts.metrics.stop_reason
    );

    if args.verify {
        let report = validate_dictionary(
            &ZstdCodec,
            artifacts.dictionary.as_bytes(),
            &samples,
            trainer_cfg.level,
            &CancelToken::new(),
            &mut io::stdout(),
        )
        .context("dictionary verification failed")?;
        println!(
            "   verified {} sample(s): ratio {:.3}",
            report.samples.len(),
            report.ratio()
        );
    }

    Ok(())
}

fn run_info(args: &InfoArgs) -> Result<()> {
    let data = fs::read(&args.dictionary)
        .with_context(|| format!("failed to read {}", args.dictionary.display()))?;
    let header = DictionaryHeader::parse(&data)
        .with_context(|| format!("failed to parse {}", args.dictionary.display()))?;
    let content = &data[header.header_len..];
    let kind = if header.compat { "zstd" } else { "raw" };
    let leading = if printable_ratio(content) >= 0.8 {
        preview(content, 64)
    } else {
        hex_preview(content, 32)
    };

    if args.json {
        let summary = json!({
            "path": args.dictionary.display().to_string(),
            "kind": kind,
            "size": data.len(),
            "dict_id": header.dict_id,
            "header_bytes": header.header_len,
            "content_bytes": header.content_len,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Kind         : {kind}");
        println!("Size         : {}", data.len());
        if header.compat {
            println!("Dict id      : {}", header.dict_id);
        }
        println!("Header bytes : {}", header.header_len);
        println!("Content bytes: {}", header.content_len);
        println!("Content      : {leading}");
    }
    Ok(())
}

fn run_eval(args: &EvalArgs) -> Result<()> {
    let dict = fs::read(&args.dictionary)
        .with_context(|| format!("failed to read {}", args.dictionary.display()))?;
    let ingest_cfg = IngestConfig {
        chunk_size: args.chunk_size,
        ..IngestConfig::default()
    };
    let samples =
        load_samples(&args.inputs, &ingest_cfg).with_context(|| "failed to load samples")?;

    let mut sink = io::sink();
    let report = validate_dictionary(
        &ZstdCodec,
        &dict,
        &samples,
        args.level,
        &CancelToken::new(),
        &mut sink,
    )
    .context("dictionary evaluation failed")?;

    let mut baseline = 0usize;
    for (index, data) in samples.iter().enumerate() {
        let packed = ZstdCodec
            .compress(data, &[], args.level)
            .with_context(|| format!("failed to compress sample {index} without dictionary"))?;
        baseline += packed.len();
    }

    if args.json {
        let summary = json!({
            "dictionary": args.dictionary.display().to_string(),
            "dict_bytes": dict.len(),
            "level": args.level,
            "samples": report.samples.len(),
            "raw_bytes": report.raw_bytes,
            "compressed_bytes": report.compressed_bytes,
            "baseline_bytes": baseline,
            "ratio": report.ratio(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Samples         : {}", report.samples.len());
        println!("Raw bytes       : {}", report.raw_bytes);
        println!("With dictionary : {}", report.compressed_bytes);
        println!("Without         : {baseline}");
        println!("Ratio           : {:.3}", report.ratio());
    }
    Ok(())
}

fn bytes_to_mebibytes(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
