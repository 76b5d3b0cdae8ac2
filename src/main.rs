use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use perf_observer::config::PipelineConfig;
use perf_observer::data::error::PipelineError;
use perf_observer::data::loader::{discover_workloads, load_file, workload_id};
use perf_observer::data::registry::{DatasetRegistry, WorkloadInput};
use perf_observer::{chart, report};

/// Clean, resample and summarise per-workload benchmark logs.
#[derive(Parser)]
#[command(name = "perf-observer", version, about)]
struct Cli {
    /// Directory holding one log file per workload.
    #[arg(default_value = ".")]
    input: PathBuf,

    /// Where tables and charts are written.
    #[arg(long, short = 'o', default_value = "output")]
    output: PathBuf,

    /// JSON pipeline configuration.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Samples trimmed from each end of every workload.
    #[arg(long)]
    trim: Option<usize>,

    /// Resample bucket width in seconds.
    #[arg(long)]
    bucket_secs: Option<u64>,

    /// Worker threads across workloads (0 = one per CPU).
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Skip PNG chart rendering.
    #[arg(long)]
    no_charts: bool,

    /// Also write each workload's resampled series as CSV.
    #[arg(long)]
    export_series: bool,

    /// Debug logging.
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(trim) = self.trim {
            config.trim_count = trim;
        }
        if let Some(secs) = self.bucket_secs {
            config.bucket_width_secs = secs;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn load_inputs(dir: &Path) -> Result<Vec<WorkloadInput>> {
    let files = discover_workloads(dir)?;
    info!("{} workload file(s) in {}", files.len(), dir.display());

    Ok(files
        .iter()
        .map(|path| {
            let id = workload_id(path);
            let raw = load_file(path).map_err(|err| {
                warn!("{}: {err:#}", path.display());
                PipelineError::Load(format!("{err:#}"))
            });
            (id, raw)
        })
        .collect())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = cli.pipeline_config()?;
    info!(
        "trim {} samples, {}s buckets, {} job(s)",
        config.trim_count, config.bucket_width_secs, config.jobs
    );

    let inputs = load_inputs(&cli.input)?;
    let registry = DatasetRegistry::build(inputs, &config)?;
    if registry.is_empty() {
        warn!("no workload logs found in {}", cli.input.display());
    }

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    report::write_summary(&registry, &cli.output.join("summary.csv"))?;
    report::write_run_report(&registry, &cli.output.join("run_report.csv"))?;

    if cli.export_series {
        let written = report::write_series(&registry, &cli.output.join("series"))?;
        info!("exported {} series", written.len());
    }

    if !cli.no_charts {
        let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string();
        let written = chart::workload::render_all(&registry, &cli.output, &stamp)?;
        info!("rendered {} chart(s)", written.len());
    }

    print!("{}", report::render_run_report(&registry));
    Ok(())
}
