//! VitalView CLI - Command-line interface for the VitalView charting core
//!
//! Commands:
//! - render: Render a preset chart from a relay response to SVG
//! - hover: Resolve the hover panel at a pointer position
//! - aggregate: Print aggregated buckets as JSON
//! - presets: List chart presets and granularity options

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vitalview::config::ChartConfig;
use vitalview::granularity::find_option;
use vitalview::types::{parse_utc_offset, SeriesKind};
use vitalview::{aggregate_series, chart_from_json, ChartError, VERSION};

/// VitalView - Health time-series charts from wearable relay data
#[derive(Parser)]
#[command(name = "vitalview")]
#[command(version = VERSION)]
#[command(about = "Aggregate and chart heart-rate and sleep series", long_about = None)]
struct Cli {
    /// Log verbosity (written to stderr)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a preset chart to SVG
    Render {
        /// Relay response file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Preset name, e.g. heart_rate or sleep_score
        #[arg(short, long)]
        preset: String,

        /// Granularity key, overriding the preset's
        #[arg(short, long)]
        granularity: Option<String>,

        /// Outer chart width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Dashboard configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Local zone, e.g. +02:00 (overrides the configuration)
        #[arg(long)]
        utc_offset: Option<String>,

        /// Draw the hover overlay for a pointer at this plot x
        #[arg(long, allow_hyphen_values = true)]
        hover_x: Option<f64>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Resolve the hover panel for a pointer position
    Hover {
        /// Relay response file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Preset name
        #[arg(short, long)]
        preset: String,

        /// Pointer x in plot pixels
        #[arg(short, long, allow_hyphen_values = true)]
        x: f64,

        /// Granularity key, overriding the preset's
        #[arg(short, long)]
        granularity: Option<String>,

        /// Dashboard configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Local zone, e.g. +02:00
        #[arg(long)]
        utc_offset: Option<String>,
    },

    /// Print aggregated buckets as JSON
    Aggregate {
        /// Relay response file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Series kind
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Metric to aggregate
        #[arg(long, default_value = "value")]
        value_key: String,

        /// Granularity key
        #[arg(short, long, default_value = "fine")]
        granularity: String,

        /// Dashboard configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Local zone, e.g. +02:00
        #[arg(long)]
        utc_offset: Option<String>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// List chart presets and granularity options
    Presets {
        /// Dashboard configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Heartrate,
    Sleep,
}

impl From<KindArg> for SeriesKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Heartrate => SeriesKind::Heartrate,
            KindArg::Sleep => SeriesKind::Sleep,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(cli.log_level))
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VitalCliError> {
    match cli.command {
        Commands::Render {
            input,
            preset,
            granularity,
            width,
            config,
            utc_offset,
            hover_x,
            output,
        } => {
            let mut config = load_config(config.as_deref(), utc_offset)?;
            if let Some(width) = width {
                config.layout.width = width;
            }
            let body = read_input(&input)?;
            let chart = chart_from_json(&config, &preset, &body, granularity.as_deref(), hover_x)?;
            write_output(&output, &chart.render_svg()?)
        }

        Commands::Hover {
            input,
            preset,
            x,
            granularity,
            config,
            utc_offset,
        } => {
            let config = load_config(config.as_deref(), utc_offset)?;
            let body = read_input(&input)?;
            let chart = chart_from_json(&config, &preset, &body, granularity.as_deref(), Some(x))?;
            let json = match chart.overlay() {
                Some(overlay) => serde_json::to_string_pretty(overlay)?,
                None => serde_json::to_string_pretty(&chart.hover())?,
            };
            println!("{}", json);
            Ok(())
        }

        Commands::Aggregate {
            input,
            kind,
            value_key,
            granularity,
            config,
            utc_offset,
            pretty,
        } => {
            let config = load_config(config.as_deref(), utc_offset)?;
            let width = find_option(&config.granularity_options, &granularity)?.width()?;
            let body = read_input(&input)?;
            let buckets =
                aggregate_series(kind.into(), &body, &value_key, width, &config.zone()?)?;

            let json = if pretty {
                serde_json::to_string_pretty(&buckets)?
            } else {
                serde_json::to_string(&buckets)?
            };
            println!("{}", json);
            Ok(())
        }

        Commands::Presets { config, json } => cmd_presets(config.as_deref(), json),
    }
}

fn cmd_presets(config: Option<&Path>, json: bool) -> Result<(), VitalCliError> {
    let config = load_config(config, None)?;

    if json {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    println!("Presets");
    println!("=======");
    for (name, preset) in &config.presets {
        println!(
            "  {:<16} {} ({}, {})",
            name,
            preset.title,
            preset.kind.as_str(),
            preset.value_key
        );
    }
    println!("\nGranularity options:");
    for option in &config.granularity_options {
        let marker = if option.key == config.default_granularity {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {:<16} {} [{} min]{}",
            option.key, option.label, option.bucket_width_minutes, marker
        );
    }
    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>, utc_offset: Option<String>) -> Result<ChartConfig, VitalCliError> {
    let mut config = match path {
        Some(path) => ChartConfig::from_json(&fs::read_to_string(path)?)?,
        None => ChartConfig::default(),
    };
    if let Some(offset) = utc_offset {
        parse_utc_offset(&offset)?;
        config.utc_offset = offset;
    }
    Ok(config)
}

fn read_input(input: &Path) -> Result<String, VitalCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), VitalCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum VitalCliError {
    Io(io::Error),
    Chart(ChartError),
    Json(serde_json::Error),
}

impl From<io::Error> for VitalCliError {
    fn from(e: io::Error) -> Self {
        VitalCliError::Io(e)
    }
}

impl From<ChartError> for VitalCliError {
    fn from(e: ChartError) -> Self {
        VitalCliError::Chart(e)
    }
}

impl From<serde_json::Error> for VitalCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalCliError> for CliError {
    fn from(e: VitalCliError) -> Self {
        match e {
            VitalCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalCliError::Chart(e) => {
                let (code, hint) = match &e {
                    ChartError::FetchFailure(_) | ChartError::MissingCredential => {
                        ("FETCH_ERROR", "Check the relay response and credentials")
                    }
                    ChartError::InvalidResponse(_) | ChartError::JsonError(_) => (
                        "INVALID_RESPONSE",
                        "Input must be a JSON array or an object with a `data` array",
                    ),
                    ChartError::InvalidGranularity(_) | ChartError::UnknownGranularity(_) => {
                        ("GRANULARITY_ERROR", "Run 'vitalview presets' for valid keys")
                    }
                    ChartError::InvalidOffset(_) => {
                        ("OFFSET_ERROR", "Use UTC or an offset such as +02:00")
                    }
                    ChartError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'vitalview presets' to inspect the configuration")
                    }
                    ChartError::RenderError(_) => ("RENDER_ERROR", "Check the layout size"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}
