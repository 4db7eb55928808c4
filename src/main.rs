//! SHM Trace Agent CLI
//!
//! Modal trace aggregation for structural health monitoring.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use shm_trace_agent::{
    config::{Config, DEFAULT_LOG_FILTER},
    core::{
        aggregate_full_series, process_days, run_all, summarize_daily, ExportFormat,
        InitializationDays, LabelAggregation, ReportBuilder, TargetResult, TrackingOutcome,
        TrackingTarget,
    },
    runlog::{create_shared_log_with_persistence, RunLog},
    source::{Axis, DayRecordQuery, DayRecordSource, JsonDirSource, SensorType, TemperatureSource},
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shm-trace")]
#[command(version = VERSION)]
#[command(about = "Modal trace aggregation for structural health monitoring", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Channel selection shared by the one-off commands.
#[derive(Args)]
struct ChannelArgs {
    /// Structure identifier
    #[arg(long)]
    structure: String,

    /// Sensor group identifier
    #[arg(long)]
    group: String,

    /// Sensor type (deck, accelerometer_v2, accelerometer_shape, deck_short or 1-4)
    #[arg(long)]
    sensor_type: SensorType,

    /// Axis (X, Y or Z), required for accelerometers
    #[arg(long)]
    axis: Option<Axis>,

    /// Export directory to read from (defaults to the configured source path)
    #[arg(long)]
    source: Option<PathBuf>,
}

impl ChannelArgs {
    fn query(&self) -> DayRecordQuery {
        DayRecordQuery {
            structure_id: self.structure.clone(),
            group_id: self.group.clone(),
            sensor_type: self.sensor_type,
            axis: self.axis,
        }
    }

    fn target(
        &self,
        expected_sensor_count: i64,
        initialization_days: InitializationDays,
    ) -> TrackingTarget {
        TrackingTarget {
            name: format!("{}-{}", self.structure, self.group),
            structure_id: self.structure.clone(),
            group_id: self.group.clone(),
            sensor_type: self.sensor_type,
            axis: self.axis,
            expected_sensor_count,
            initialization_days,
        }
    }

    fn source(&self, config: &Config) -> JsonDirSource {
        JsonDirSource::new(self.source.clone().unwrap_or_else(|| config.source_path.clone()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured target and export tracking reports
    Run {
        /// Only run the target with this name
        #[arg(long)]
        target: Option<String>,

        /// Output directory for reports
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: ExportFormat,
    },

    /// Aggregate trace labels for one channel
    Traces {
        #[command(flatten)]
        channel: ChannelArgs,

        /// Restrict aggregation to an initialization window of this many days
        #[arg(long)]
        init_days: Option<i64>,

        /// Sensor count a day needs to join the initialization window
        #[arg(long, default_value = "1")]
        expected_sensors: i64,
    },

    /// Split raw peak vectors into initialization and tracking segments
    Peaks {
        #[command(flatten)]
        channel: ChannelArgs,

        /// Initialization window length in days
        #[arg(long)]
        init_days: i64,

        /// Sensor count a day needs to join the initialization window
        #[arg(long)]
        expected_sensors: i64,
    },

    /// Show daily temperature statistics for a structure
    Temperatures {
        /// Structure identifier
        #[arg(long)]
        structure: String,

        /// Export directory to read from (defaults to the configured source path)
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Show cumulative run statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let loaded = Config::load_from(&config_path);
    init_logging(
        loaded
            .as_ref()
            .map(|c| c.log_filter.as_str())
            .unwrap_or(DEFAULT_LOG_FILTER),
    );

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration {config_path:?}: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run {
            target,
            output,
            format,
        } => cmd_run(&config, &config_path, target, output, format),
        Commands::Traces {
            channel,
            init_days,
            expected_sensors,
        } => cmd_traces(&config, &channel, init_days, expected_sensors),
        Commands::Peaks {
            channel,
            init_days,
            expected_sensors,
        } => cmd_peaks(&config, &channel, init_days, expected_sensors),
        Commands::Temperatures { structure, source } => {
            cmd_temperatures(&config, &structure, source)
        }
        Commands::Status => cmd_status(&config),
        Commands::Config => cmd_config(&config, &config_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Install the global tracing subscriber.
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(
    config: &Config,
    config_path: &Path,
    target: Option<String>,
    output: Option<PathBuf>,
    format: ExportFormat,
) -> Result<()> {
    let targets: Vec<TrackingTarget> = match target {
        Some(name) => vec![config
            .target(&name)
            .cloned()
            .with_context(|| format!("no target named '{name}' in {config_path:?}"))?],
        None => config.targets.clone(),
    };

    if targets.is_empty() {
        bail!("no tracking targets configured in {config_path:?}");
    }

    config
        .ensure_directories()
        .context("creating export and data directories")?;

    println!("SHM Trace Agent v{VERSION}");
    println!("  Source: {:?}", config.source_path);
    println!("  Targets: {}", targets.len());
    println!();

    let run_log = create_shared_log_with_persistence(config.run_stats_path());
    let source = JsonDirSource::new(&config.source_path);
    let builder = ReportBuilder::new();
    tracing::info!("Report instance ID: {}", builder.instance_id());

    let mut reports = Vec::new();
    for TargetResult { target, result } in run_all(&source, &targets) {
        match result {
            Ok(outcome) => {
                run_log.record_outcome(&outcome);
                print_outcome(&outcome);
                reports.push(builder.build(&outcome));
            }
            Err(e) => {
                run_log.record_failure();
                eprintln!("[{target}] failed: {e}");
            }
        }
    }

    if !reports.is_empty() {
        let export_dir = output.unwrap_or_else(|| config.export_path.clone());
        std::fs::create_dir_all(&export_dir)
            .with_context(|| format!("creating {export_dir:?}"))?;

        let export_path = export_dir.join(format!(
            "tracking_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            format.extension()
        ));
        let body = format.render(&reports).context("serializing reports")?;
        std::fs::write(&export_path, body).with_context(|| format!("writing {export_path:?}"))?;

        run_log.record_reports_exported(reports.len() as u64);
        println!("Exported {} reports to {:?}", reports.len(), export_path);
    }

    if let Err(e) = run_log.save() {
        tracing::warn!("Could not save run stats: {e}");
    }

    println!();
    println!("{}", run_log.summary());
    Ok(())
}

fn print_outcome(outcome: &TrackingOutcome) {
    let window = &outcome.window;
    println!("[{}] {} day records", outcome.target, outcome.day_count);
    if outcome.target.initialization_days.is_disabled() {
        println!("  Initialization: disabled");
    } else {
        println!(
            "  Initialization: {} days accepted, {} skipped, tracking from day #{}",
            window.accepted_count(),
            window.skipped_indices.len(),
            window.boundary + 1
        );
    }
    print_labels(&outcome.labels);
    println!(
        "  Peak vectors: {} initialization, {} tracking",
        outcome.peaks.initialization.len(),
        outcome.peaks.tracking.len()
    );
    println!();
}

fn print_labels(labels: &LabelAggregation) {
    for series in labels.series.values() {
        println!(
            "  Trace {}: {:.5} Hz (σ {:.5}, {} points)",
            series.label,
            series.mean_frequency,
            series.frequency_std_dev,
            series.len()
        );
    }
    println!("  Outliers: {}", labels.outlier_count());
}

fn cmd_traces(
    config: &Config,
    channel: &ChannelArgs,
    init_days: Option<i64>,
    expected_sensors: i64,
) -> Result<()> {
    let source = channel.source(config);

    let labels = match init_days {
        Some(days) => {
            let target = channel.target(expected_sensors, InitializationDays::from_raw(days)?);
            target.validate()?;
            let days = source.fetch_day_records(&target.query())?;
            process_days(&target, &days)?.labels
        }
        None => aggregate_full_series(&source, &channel.query())?,
    };

    println!(
        "Traces for structure {} group {} ({})",
        channel.structure, channel.group, channel.sensor_type
    );
    print_labels(&labels);

    if let Some(shapes) = labels.mean_shapes() {
        for (label, shape) in shapes {
            let formatted: Vec<String> = shape.iter().map(|v| format!("{v:.4}")).collect();
            println!("  Mean shape {label}: [{}]", formatted.join(", "));
        }
    }
    Ok(())
}

fn cmd_peaks(
    config: &Config,
    channel: &ChannelArgs,
    init_days: i64,
    expected_sensors: i64,
) -> Result<()> {
    let source = channel.source(config);
    let target = channel.target(expected_sensors, InitializationDays::from_raw(init_days)?);
    target.validate()?;

    let days = source.fetch_day_records(&target.query())?;
    let outcome = process_days(&target, &days)?;
    let peaks = &outcome.peaks;

    println!("Peak vectors for {}", target);
    println!("  Initialization days: {}", peaks.initialization.len());
    if let (Some(first), Some(last)) = (peaks.initialization.first(), peaks.initialization.last()) {
        println!(
            "    {} .. {}",
            first.date.format("%Y-%m-%d"),
            last.date.format("%Y-%m-%d")
        );
    }
    println!("  Tracking days: {}", peaks.tracking.len());
    if let (Some(first), Some(last)) = (peaks.tracking.first(), peaks.tracking.last()) {
        println!(
            "    {} .. {}",
            first.date.format("%Y-%m-%d"),
            last.date.format("%Y-%m-%d")
        );
    }
    match peaks.sample_rate() {
        Some(rate) => println!("  Sample rate: {rate} Hz"),
        None => println!("  Sample rate: not reported for {}", target.sensor_type),
    }
    Ok(())
}

fn cmd_temperatures(config: &Config, structure: &str, source: Option<PathBuf>) -> Result<()> {
    let source = JsonDirSource::new(source.unwrap_or_else(|| config.source_path.clone()));
    let readings = source.fetch_temperatures(structure)?;
    let summary = summarize_daily(&readings);

    if summary.is_empty() {
        println!("No temperature data found in {:?}", source.root());
        return Ok(());
    }

    println!("{:<12} {:>8} {:>8} {:>8} {:>8}", "Day", "Avg", "Min", "Max", "Samples");
    for day in summary {
        println!(
            "{:<12} {:>8.2} {:>8.2} {:>8.2} {:>8}",
            day.day.format("%Y-%m-%d").to_string(),
            day.avg,
            day.min,
            day.max,
            day.samples
        );
    }
    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("SHM Trace Agent Status");
    println!("======================");
    println!();

    println!("Configuration:");
    println!("  Source path: {:?}", config.source_path);
    println!("  Export path: {:?}", config.export_path);
    println!("  Targets: {}", config.targets.len());
    for target in &config.targets {
        println!(
            "    - {} (expected sensors: {}, initialization: {})",
            target, target.expected_sensor_count, target.initialization_days
        );
    }
    println!();

    let stats_path = config.run_stats_path();
    if stats_path.exists() {
        let log = RunLog::with_persistence(stats_path);
        println!("{}", log.summary());
    } else {
        println!("No previous run data found.");
    }
    Ok(())
}

fn cmd_config(config: &Config, config_path: &Path) -> Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {config_path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).context("serializing configuration")?
    );
    Ok(())
}
