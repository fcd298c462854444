use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use fireshark_core::analysis::correlation::collect_anomalies;
use fireshark_core::{AnalysisConfig, QualityGrade, Report, analyze_log_files};
use glob::glob;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FIRESHARK_BUILD_COMMIT"),
    " ",
    env!("FIRESHARK_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  fireshark log analyse capture.txt -o report.json\n  fireshark log analyze 'captures/*.txt' --stdout --pretty\n  fireshark log analyse a.txt b.txt --channel 0 --list-issues -o report.json";

#[derive(Parser, Debug)]
#[command(name = "fireshark")]
#[command(version = VERSION)]
#[command(
    about = "Offline auditor for FireWire isochronous audio captures (CIP / AM824).",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on bus analyzer text logs.
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
}

#[derive(Subcommand, Debug)]
enum LogCommands {
    /// Analyse one or more logs and generate a versioned JSON report.
    #[command(alias = "analyze")]
    #[command(after_help = EXAMPLES)]
    Analyse(AnalyseArgs),
}

#[derive(Args, Debug)]
struct AnalyseArgs {
    /// Log files or glob patterns, concatenated in the given order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code on DBC discontinuities or a quality grade below good
    #[arg(long)]
    strict: bool,

    /// List discontinuities, quality issues and audio anomalies after analysis
    #[arg(long)]
    list_issues: bool,

    /// Analysis config file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restrict audio analyses to one isochronous channel
    #[arg(long)]
    channel: Option<u32>,

    /// Keep the packets at the capture edges
    #[arg(long)]
    no_trim: bool,

    /// Click detector threshold (normalized amplitude)
    #[arg(long)]
    click_threshold: Option<f64>,

    /// Keep the epoch timestamp so reports are byte-for-byte reproducible
    #[arg(long)]
    deterministic: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Log { command } => match command {
            LogCommands::Analyse(args) => cmd_log_analyse(args),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "fireshark=warn",
        1 => "fireshark=info",
        _ => "fireshark=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        // Keep the context chain: "analysis failed: I/O error: ..."
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_log_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let inputs = resolve_inputs(&args.inputs)?;
    let config = build_config(&args)?;
    let report_path = if args.stdout {
        None
    } else {
        Some(args.report.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };
    if let Some(path) = report_path.as_deref() {
        ensure_report_differs(path, &inputs)?;
    }

    debug!(inputs = inputs.len(), "analysing logs");
    let mut rep = analyze_log_files(&inputs, &config).context("log analysis failed")?;
    if !args.deterministic {
        rep.generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("failed to format report timestamp")?;
    }
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            info!(path = %path.display(), "report written");
            if !args.quiet {
                eprintln!("OK: report written -> {}", path.display());
            }
        }
    }

    if args.list_issues && !args.quiet {
        print_issues(&rep);
    }
    if args.strict && has_issues(&rep) {
        return Err(CliError::new(
            "audio stream issues detected",
            Some("use --list-issues to inspect".to_string()),
        ));
    }
    Ok(())
}

fn build_config(args: &AnalyseArgs) -> Result<AnalysisConfig, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => AnalysisConfig::load(path).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("config is a JSON object; every field is optional".to_string()),
            )
        })?,
        None => AnalysisConfig::default(),
    };
    if let Some(channel) = args.channel {
        config.channel = Some(channel);
    }
    if args.no_trim {
        config.trim_edges = false;
    }
    if let Some(threshold) = args.click_threshold {
        config.click_threshold = threshold;
    }
    config.validate().map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("thresholds must be positive numbers".to_string()),
        )
    })?;
    Ok(config)
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn has_issues(rep: &Report) -> bool {
    !rep.dbc.discontinuities.is_empty()
        || matches!(rep.quality.grade, QualityGrade::Fair | QualityGrade::Poor)
}

fn print_issues(rep: &Report) {
    let anomalies = collect_anomalies(
        rep.boundaries.available(),
        rep.spectral.available(),
        rep.clicks.available(),
    );
    if rep.dbc.discontinuities.is_empty() && rep.quality.issues.is_empty() && anomalies.is_empty()
    {
        eprintln!("No issues found.");
        return;
    }

    if !rep.dbc.discontinuities.is_empty() {
        eprintln!("DBC discontinuities:");
        for disc in &rep.dbc.discontinuities {
            eprintln!(
                "  channel {} packet {}: {}",
                disc.channel, disc.packet_index, disc.description
            );
        }
    }
    if !rep.quality.issues.is_empty() {
        eprintln!(
            "Quality issues (score {}, {:?}):",
            rep.quality.score, rep.quality.grade
        );
        for issue in &rep.quality.issues {
            eprintln!("  {}", issue);
        }
    }
    if !anomalies.is_empty() {
        eprintln!("Audio anomalies:");
        for anomaly in &anomalies {
            eprintln!("  {}", anomaly.describe());
        }
    }
}

fn ensure_report_differs(report_path: &Path, inputs: &[PathBuf]) -> Result<(), CliError> {
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A report into a directory that does not exist yet cannot clobber an input.
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    let report_target = report_dir.join(file_name);

    for input in inputs {
        let input_abs = fs::canonicalize(input)
            .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
        if report_target == input_abs {
            return Err(CliError::new(
                format!(
                    "report path must differ from input: {}",
                    report_path.display()
                ),
                Some("choose a different output path".to_string()),
            ));
        }
    }
    Ok(())
}

/// Expand glob patterns (sorted matches) and check plain paths, keeping
/// argument order.
fn resolve_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    let mut resolved = Vec::new();
    for input in inputs {
        let pattern = input.to_string_lossy();
        if is_glob_pattern(&pattern) {
            resolved.extend(expand_pattern(&pattern)?);
        } else {
            validate_input_file(input)?;
            resolved.push(input.clone());
        }
    }
    Ok(resolved)
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let paths = glob(pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }
    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    matches.sort();
    debug!(pattern, matches = matches.len(), "expanded input pattern");
    Ok(matches)
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a bus analyzer text log".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a bus analyzer text log, or a glob pattern for several".to_string()),
        ));
    }
    Ok(())
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
