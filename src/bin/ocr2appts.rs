use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use schedule_ocr_extract::{
    ColumnSpec, ExternalTimeLabel, ExtractOptions, ExtractionReport, LayoutMode, QualityMode,
    detect_columns, extract_appointments, extract_time_labels, read_ocr_document,
    report_to_csv_string, report_to_json_string,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "ocr2appts",
    version,
    about = "Extract practice appointments from schedule screenshot OCR output"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract appointments and write CSV or JSON output.
    Extract(ExtractArgs),
    /// Print detected columns and time labels as JSON for editing.
    Columns(InspectArgs),
    /// Print time labels in percent form for reuse against other crops.
    TimeLabels(InspectArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Auto,
    Calendar,
    Tabular,
}

#[derive(Debug, Args)]
struct TuningArgs {
    /// Force a layout instead of detecting it.
    #[arg(long, value_enum, default_value_t = LayoutArg::Auto)]
    layout: LayoutArg,

    /// Vertical window of one appointment card, in pixels.
    #[arg(long)]
    cluster_tolerance: Option<f32>,

    /// Max label distance for a single isolated column, in pixels.
    #[arg(long)]
    isolated_time_distance: Option<f32>,

    /// Max label distance for labels shared by several columns, in pixels.
    #[arg(long)]
    shared_time_distance: Option<f32>,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Input OCR JSON path.
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input OCR JSON path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path.
    #[arg(short, long)]
    output: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Edited column in format name:x_start,x_end. Repeatable; skips column detection.
    #[arg(long = "column")]
    columns: Vec<String>,

    /// JSON file of percent time labels from an earlier `time-labels` run.
    #[arg(long)]
    time_labels: Option<PathBuf>,

    /// Fail when any appointment falls below the review threshold.
    #[arg(long, conflicts_with = "skip_ambiguous")]
    strict: bool,

    /// Drop appointments below the review threshold.
    #[arg(long, conflicts_with = "strict")]
    skip_ambiguous: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn read_time_labels(path: &Path) -> Result<Vec<ExternalTimeLabel>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse time labels in '{}'", path.display()))
}

fn tuned_options(tuning: &TuningArgs) -> ExtractOptions {
    let layout_mode = match tuning.layout {
        LayoutArg::Auto => LayoutMode::AutoDetect,
        LayoutArg::Calendar => LayoutMode::Calendar,
        LayoutArg::Tabular => LayoutMode::Tabular,
    };

    let defaults = ExtractOptions::default();
    ExtractOptions {
        layout_mode,
        cluster_tolerance: tuning.cluster_tolerance.unwrap_or(defaults.cluster_tolerance),
        isolated_time_distance: tuning
            .isolated_time_distance
            .unwrap_or(defaults.isolated_time_distance),
        shared_time_distance: tuning
            .shared_time_distance
            .unwrap_or(defaults.shared_time_distance),
        ..defaults
    }
}

fn parse_options(args: &ExtractArgs, image_width: f32) -> Result<ExtractOptions> {
    let columns = args
        .columns
        .iter()
        .enumerate()
        .map(|(index, value)| {
            ColumnSpec::from_str(value)
                .map(|spec| spec.to_column(index, image_width))
                .map_err(|error| anyhow!("invalid column: {error}"))
                .with_context(|| format!("failed to parse --column '{value}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let time_labels = args
        .time_labels
        .as_deref()
        .map(read_time_labels)
        .transpose()?
        .unwrap_or_default();

    let delimiter = u8::try_from(args.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow!("delimiter must be a single ASCII character"))?;

    let quality_mode = if args.strict {
        QualityMode::Strict
    } else if args.skip_ambiguous {
        QualityMode::SkipAmbiguous
    } else {
        QualityMode::BestEffort
    };

    Ok(ExtractOptions {
        quality_mode,
        delimiter,
        columns,
        time_labels,
        ..tuned_options(&args.tuning)
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} column={:?} row={:?} confidence={:?}: {}",
                warning.code, warning.column, warning.row, warning.confidence, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let document = read_ocr_document(&args.input)
        .with_context(|| format!("failed to read OCR output '{}'", args.input.display()))?;
    let image_width = document.image_width.unwrap_or_else(|| {
        document
            .fragments
            .iter()
            .map(|fragment| fragment.bounding_box.x + fragment.bounding_box.width)
            .fold(0.0, f32::max)
    });
    let options = parse_options(args, image_width)?;

    let report = extract_appointments(&document, &options).with_context(|| {
        format!(
            "failed to extract appointments from '{}'",
            args.input.display()
        )
    })?;

    let rendered = match args.format {
        OutputFormat::Json => report_to_json_string(&report)?,
        OutputFormat::Csv => report_to_csv_string(&report, &options)?,
    };
    std::fs::write(&args.output, rendered)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;

    Ok(report)
}

fn run_inspect(args: &InspectArgs, labels_only: bool) -> Result<()> {
    let document = read_ocr_document(&args.input)
        .with_context(|| format!("failed to read OCR output '{}'", args.input.display()))?;
    let options = tuned_options(&args.tuning);
    options.validate()?;
    let json = if labels_only {
        serde_json::to_string_pretty(&extract_time_labels(&document, &options))?
    } else {
        serde_json::to_string_pretty(&detect_columns(&document, &options))?
    };
    println!("{json}");
    Ok(())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("schedule_ocr_extract=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.appointment_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Columns(args) => finish(run_inspect(&args, false)),
        Commands::TimeLabels(args) => finish(run_inspect(&args, true)),
    }
}

fn finish(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
