//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use prospector_core::{BatchProgress, Pipeline, score_breakdown};
use prospector_shared::{
    AppConfig, EnrichmentResult, ExtractedCompany, IcpCriteria, init_config, load_config,
    load_config_from, validate_api_key,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Prospector: rank companies by how well they fit your Ideal Customer Profile.
#[derive(Parser)]
#[command(
    name = "prospector",
    version,
    about = "Enrich company names or URLs with web facts and score them against an ICP.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.prospector/prospector.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Result output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

/// ICP criteria, from a JSON file and/or flags. Flags add to the file's lists
/// and override its size bounds.
#[derive(Args, Debug, Default)]
pub(crate) struct IcpArgs {
    /// JSON file holding the ICP.
    #[arg(long)]
    pub icp: Option<PathBuf>,

    /// Target industry (repeatable).
    #[arg(long = "industry")]
    pub industries: Vec<String>,

    /// Target geography (repeatable).
    #[arg(long = "geography")]
    pub geographies: Vec<String>,

    /// Minimum company size (employees).
    #[arg(long)]
    pub size_min: Option<u64>,

    /// Maximum company size (employees).
    #[arg(long)]
    pub size_max: Option<u64>,

    /// Keyword describing the profile (repeatable).
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich a batch of company names or URLs and rank them.
    Enrich {
        /// Company names or website URLs.
        targets: Vec<String>,

        /// File with one target per line (blank lines and # comments ignored).
        #[arg(long)]
        targets_file: Option<PathBuf>,

        #[command(flatten)]
        icp: IcpArgs,

        /// Output format.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Enrich a single company name or URL.
    EnrichOne {
        /// Company name or website URL.
        target: String,

        #[command(flatten)]
        icp: IcpArgs,

        /// Output format.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Score an already-extracted company record (JSON) against an ICP.
    Score {
        /// JSON file holding the company record.
        #[arg(long)]
        company: PathBuf,

        #[command(flatten)]
        icp: IcpArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so results can be piped.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "prospector=info",
        1 => "prospector=debug",
        _ => "prospector=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Enrich {
            targets,
            targets_file,
            icp,
            format,
        } => cmd_enrich(config_path.as_deref(), targets, targets_file.as_deref(), &icp, format).await,
        Command::EnrichOne {
            target,
            icp,
            format,
        } => cmd_enrich_one(config_path.as_deref(), &target, &icp, format).await,
        Command::Score { company, icp } => cmd_score(&company, &icp),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Build the ICP from `--icp` plus flags, and validate it.
fn build_icp(args: &IcpArgs) -> Result<IcpCriteria> {
    let mut icp = match &args.icp {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("cannot read ICP file {}", path.display()))?;
            serde_json::from_str::<IcpCriteria>(&raw)
                .wrap_err_with(|| format!("invalid ICP JSON in {}", path.display()))?
        }
        None => IcpCriteria::default(),
    };

    icp.industries.extend(args.industries.iter().cloned());
    icp.geographies.extend(args.geographies.iter().cloned());
    icp.keywords.extend(args.keywords.iter().cloned());
    if args.size_min.is_some() {
        icp.company_size_min = args.size_min;
    }
    if args.size_max.is_some() {
        icp.company_size_max = args.size_max;
    }

    icp.validate()?;
    Ok(icp)
}

/// Targets from positional args followed by the targets file.
fn collect_targets(mut targets: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read targets file {}", path.display()))?;
        targets.extend(parse_targets(&raw));
    }
    if targets.is_empty() {
        return Err(eyre!("no targets given: pass names/URLs or --targets-file"));
    }
    Ok(targets)
}

fn parse_targets(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
}

async fn cmd_enrich(
    config_path: Option<&Path>,
    targets: Vec<String>,
    targets_file: Option<&Path>,
    icp_args: &IcpArgs,
    format: OutputFormat,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    validate_api_key(&config)?;

    let icp = build_icp(icp_args)?;
    let targets = collect_targets(targets, targets_file)?;
    let pipeline = Pipeline::from_config(&config)?;

    info!(targets = targets.len(), "enriching batch");

    // Ctrl-C stops the batch after the current target; partial results are still printed.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current target");
            on_signal.cancel();
        }
    });

    let progress = CliProgress::new(targets.len());
    let report = pipeline.run_batch(&targets, &icp, &progress, &cancel).await;
    progress.finish();

    print_results(&report.results, format)?;

    if !report.skipped.is_empty() {
        eprintln!();
        eprintln!("  Skipped {} target(s):", report.skipped.len());
        for skipped in &report.skipped {
            eprintln!("    {}: {}", skipped.target, skipped.reason);
        }
    }
    if report.cancelled {
        eprintln!("  Batch cancelled; showing partial results.");
    }
    eprintln!("  Time: {:.1}s", report.elapsed.as_secs_f64());

    Ok(())
}

async fn cmd_enrich_one(
    config_path: Option<&Path>,
    target: &str,
    icp_args: &IcpArgs,
    format: OutputFormat,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    validate_api_key(&config)?;

    let icp = build_icp(icp_args)?;
    let pipeline = Pipeline::from_config(&config)?;

    let result = pipeline.enrich_one(target, &icp).await?;
    print_results(std::slice::from_ref(&result), format)
}

fn cmd_score(company_path: &Path, icp_args: &IcpArgs) -> Result<()> {
    let raw = std::fs::read_to_string(company_path)
        .wrap_err_with(|| format!("cannot read company file {}", company_path.display()))?;
    let company: ExtractedCompany = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("invalid company JSON in {}", company_path.display()))?;
    if company.name.trim().is_empty() {
        return Err(eyre!("company record has an empty name"));
    }

    let icp = build_icp(icp_args)?;
    let breakdown = score_breakdown(&company, &icp);

    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "name": company.name,
        "confidence": breakdown.confidence(),
        "awarded": breakdown.awarded(),
        "max_score": breakdown.max_score(),
        "criteria": breakdown.outcomes,
    }))?);

    Ok(())
}

fn print_results(results: &[EnrichmentResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        OutputFormat::Table => {
            println!();
            println!("  {:>5}  {:<28} {:<22} {:<20} {:>7}", "SCORE", "NAME", "INDUSTRY", "LOCATION", "STAFF");
            for r in results {
                let c = &r.company;
                println!(
                    "  {:>5}  {:<28} {:<22} {:<20} {:>7}",
                    r.confidence,
                    clip(&c.name, 28),
                    clip(c.industry.as_deref().unwrap_or("-"), 22),
                    clip(c.location.as_deref().unwrap_or("-"), 20),
                    c.employee_count.map_or_else(|| "-".to_string(), |n| n.to_string()),
                );
            }
            println!();
        }
    }
    Ok(())
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {wide_msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BatchProgress for CliProgress {
    fn target_started(&self, _index: usize, _total: usize, target: &str) {
        self.bar.set_message(format!("Enriching {target}"));
    }

    fn target_finished(&self, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
