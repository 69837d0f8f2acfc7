mod reports;
mod source;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use source::JsonFileDeckSource;
use threshold_engine::constants::TARGET_PRESETS;
use threshold_engine::{
    AnalysisRequest, Evaluator, EvaluatorConfig, ReliabilityEngine, ThresholdReport, TurnOverride,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for terminals
    Console,
    /// Markdown tables
    Markdown,
    /// Machine-readable JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "threshold-cli", version)]
#[command(about = "Odds of meeting each spell's elemental threshold from a deck's sites")]
struct Args {
    /// Deck JSON file (bare card array or {"name", "cards"}); `-` reads stdin
    #[arg(long)]
    deck: PathBuf,

    /// Reliability target in [0, 1]; presets are 0.8, 0.9 and 0.95
    #[arg(long, default_value_t = 0.9)]
    target: f64,

    /// Turn to evaluate every goal at, or `auto` for each goal's own turn
    #[arg(long, default_value_t = TurnOverride::Auto)]
    turn: TurnOverride,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Evaluator configuration JSON (trials, caps, cache size, seed, deadline)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible simulation; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Monte Carlo trials per evaluation; overrides the config file
    #[arg(long)]
    trials: Option<u32>,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Exit with status 1 when any goal misses the target
    #[arg(long)]
    strict: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref(), args.seed, args.trials)?;
    let request = AnalysisRequest::new(args.target, args.turn)?;
    if !TARGET_PRESETS
        .iter()
        .any(|preset| (preset - request.target).abs() < f64::EPSILON)
    {
        log::info!("using custom target {:.3}", request.target);
    }

    let evaluator = Evaluator::new(config)?;
    let mut engine = ReliabilityEngine::new(JsonFileDeckSource::new(&args.deck), evaluator);
    log::debug!("reading deck from {}", engine.source().path().display());

    let start_time = Instant::now();
    let report = engine
        .analyze(&request)
        .with_context(|| format!("failed to analyze {}", args.deck.display()))?;
    let duration = start_time.elapsed();
    log::debug!(
        "{} evaluations computed, cache {:?}",
        engine.evaluator().computations(),
        engine.evaluator().cache_stats()
    );

    write_report(&args, &report, duration)?;

    if args.strict && !report.all_pass() {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_config(
    path: Option<&Path>,
    seed: Option<u64>,
    trials: Option<u32>,
) -> Result<EvaluatorConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EvaluatorConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EvaluatorConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some(trials) = trials {
        config.trials = trials;
    }
    config.validate()?;
    Ok(config)
}

fn write_report(args: &Args, report: &ThresholdReport, duration: Duration) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => reports::generate_json_report(
            output_target.writer(),
            report,
            chrono::Utc::now(),
            duration,
        )?,
        ReportFormat::Markdown => {
            reports::generate_markdown_report(output_target.writer(), report)?;
        }
        ReportFormat::Console => {
            reports::generate_console_report(output_target.writer(), report, duration)?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
