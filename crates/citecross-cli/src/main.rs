use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use citecross_core::config_file::{self, ConfigFile};
use citecross_core::{CrossReferenceMatcher, ProgressEvent};
use citecross_ingest::Comparison;
use citecross_parsing::{NameParser, ParsingConfig, ParsingConfigBuilder};
use citecross_reporting::{DEFAULT_OUTPUT_FILE, ExportFormat, build_report, export_report};

mod output;

use output::ColorMode;

const CANDIDATES_ENV: &str = "CITECROSS_CANDIDATES_DIR";
const SUBJECTS_ENV: &str = "CITECROSS_SUBJECTS_DIR";
const OUTPUT_ENV: &str = "CITECROSS_OUTPUT";

/// Faculty citation cross-reference - find where subject documents' citation
/// names appear inside candidate PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare every subject PDF against every candidate PDF and write a report
    Compare(CompareArgs),

    /// Show the name and citation names parsed from one subject PDF
    Names {
        /// Subject PDF to parse
        pdf: PathBuf,

        /// Path to a TOML config file (replaces the default lookup)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Dump the text extracted from one PDF
    Extract {
        /// PDF to extract
        pdf: PathBuf,

        /// Write the text to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Directory of candidate PDFs to search
    candidates_dir: Option<PathBuf>,

    /// Directory of subject PDFs (one person per document)
    subjects_dir: Option<PathBuf>,

    /// Path of the report file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format: xlsx, csv, json or md
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Path to a TOML config file (replaces the default lookup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum characters per excerpt
    #[arg(long)]
    max_excerpt_chars: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Only print warnings and the final summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compare(args) => compare(args),
        Command::Names {
            pdf,
            config,
            no_color,
        } => names(&pdf, config.as_deref(), ColorMode(!no_color)),
        Command::Extract { pdf, output } => extract(&pdf, output.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// `--config` replaces the platform/CWD cascade entirely.
fn load_config_file(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            config_file::load_from_path(path)
                .with_context(|| format!("Could not parse config file {}", path.display()))
        }
        None => Ok(config_file::load_config()),
    }
}

/// Command line beats environment, environment beats config file.
fn resolve_path(
    cli: Option<PathBuf>,
    env: Option<String>,
    config: Option<String>,
) -> Option<PathBuf> {
    cli.or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .or_else(|| config.map(PathBuf::from))
}

/// `--format`, then the output file's extension, then `[output] format`,
/// then xlsx.
fn resolve_format(
    flag: Option<ExportFormat>,
    output_path: &Path,
    config: Option<&str>,
) -> anyhow::Result<ExportFormat> {
    if let Some(format) = flag {
        return Ok(format);
    }
    if let Some(format) = ExportFormat::from_path(output_path) {
        return Ok(format);
    }
    match config {
        Some(value) => value
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Invalid [output] format: {}", e)),
        None => Ok(ExportFormat::default()),
    }
}

fn parsing_config(config: &ConfigFile) -> anyhow::Result<ParsingConfig> {
    let section = config.parsing.clone().unwrap_or_default();
    ParsingConfigBuilder::from_section(&section)
        .build()
        .context("Invalid [parsing] configuration")
}

fn compare(args: CompareArgs) -> anyhow::Result<()> {
    let config = load_config_file(args.config.as_deref())?;
    let input = config.input.clone().unwrap_or_default();
    let output_section = config.output.clone().unwrap_or_default();

    let candidates_dir = resolve_path(
        args.candidates_dir,
        std::env::var(CANDIDATES_ENV).ok(),
        input.candidates_dir,
    )
    .with_context(|| {
        format!("No candidates directory given (argument, {CANDIDATES_ENV} or [input] candidates_dir)")
    })?;
    let subjects_dir = resolve_path(
        args.subjects_dir,
        std::env::var(SUBJECTS_ENV).ok(),
        input.subjects_dir,
    )
    .with_context(|| {
        format!("No subjects directory given (argument, {SUBJECTS_ENV} or [input] subjects_dir)")
    })?;
    let output_path = resolve_path(args.output, std::env::var(OUTPUT_ENV).ok(), output_section.path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
    let format = resolve_format(args.format, &output_path, output_section.format.as_deref())?;

    let parsing = parsing_config(&config)?;
    let mut matching = config.matching.clone().unwrap_or_default().to_builder();
    if let Some(n) = args.max_excerpt_chars {
        matching = matching.max_excerpt_chars(n);
    }
    let matching = matching.build().context("Invalid [matching] configuration")?;

    tracing::debug!(
        candidates = %candidates_dir.display(),
        subjects = %subjects_dir.display(),
        output = %output_path.display(),
        format = format.extension(),
        "starting comparison"
    );

    let backend = citecross_ingest::default_backend()?;
    let comparison = Comparison::new(backend.as_ref())
        .with_parser(NameParser::with_config(parsing))
        .with_matcher(CrossReferenceMatcher::with_config(matching));

    let color = ColorMode(!args.no_color);
    let quiet = args.quiet;
    let bar_style =
        ProgressStyle::with_template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")?
            .progress_chars("=> ");
    let mut bar: Option<ProgressBar> = None;

    let outcome = comparison
        .run(&candidates_dir, &subjects_dir, |event| {
            let is_warning = matches!(
                event,
                ProgressEvent::SubjectSkipped { .. } | ProgressEvent::ExtractionFailed { .. }
            );
            if quiet && !is_warning {
                return;
            }
            match event {
                ProgressEvent::ScanningCandidates { total } if total > 0 => {
                    let pb = ProgressBar::new(total as u64);
                    pb.set_style(bar_style.clone());
                    bar = Some(pb);
                    return;
                }
                ProgressEvent::CandidateScanned { ref file, .. } => {
                    if let Some(ref pb) = bar {
                        pb.set_message(file.clone());
                        pb.inc(1);
                        return;
                    }
                }
                _ => {}
            }
            let mut stderr = std::io::stderr();
            match bar {
                Some(ref pb) => pb.suspend(|| {
                    let _ = output::print_progress(&mut stderr, &event, color);
                }),
                None => {
                    let _ = output::print_progress(&mut stderr, &event, color);
                }
            }
        })
        .context("Comparison failed")?;

    if let Some(pb) = bar.take() {
        pb.finish_and_clear();
    }

    let report = build_report(&outcome.registry, &outcome.candidate_ids);
    export_report(&report, format, &output_path)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let mut stdout = std::io::stdout();
    output::print_summary(
        &mut stdout,
        &outcome.registry,
        &outcome.stats,
        &output_path,
        color,
    )?;

    Ok(())
}

fn names(pdf: &Path, config: Option<&Path>, color: ColorMode) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("File not found: {}", pdf.display());
    }
    let config = load_config_file(config)?;
    let parser = NameParser::with_config(parsing_config(&config)?);

    let backend = citecross_ingest::default_backend()?;
    let text = backend
        .extract_text(pdf)
        .with_context(|| format!("Failed to extract text from {}", pdf.display()))?;

    let file_name = pdf
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| pdf.display().to_string());

    let mut stdout = std::io::stdout();
    output::print_parsed_names(&mut stdout, &file_name, &parser.parse(&text), color)?;
    Ok(())
}

fn extract(pdf: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("File not found: {}", pdf.display());
    }
    let backend = citecross_ingest::default_backend()?;
    let text = backend
        .extract_text(pdf)
        .with_context(|| format!("Failed to extract text from {}", pdf.display()))?;

    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} characters to {}",
                text.chars().count(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
