use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};

use perfgraph::{
    ComparisonLabels, FormatSelection, PercentileSelection, RenderConfig, Scheduler, VariableMode,
    load_table,
};

#[derive(Parser, Debug)]
#[command(name = "perfgraph", version, about = "Draw charts from benchmark result tables")]
struct Cli {
    /// Result table (.csv or .json).
    table: PathBuf,

    /// Column on the x-axis.
    #[arg(long, value_enum, default_value_t = ModeArg::Threads)]
    mode: ModeArg,

    /// Shortcut for `--mode size`.
    #[arg(short = 's', long = "size", conflicts_with = "mode")]
    size: bool,

    /// Output formats.
    #[arg(long, value_enum, default_value_t = FormatArg::Both)]
    format: FormatArg,

    /// Worker threads (1 renders serially). Defaults to the host's parallelism.
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,

    /// Existing, writable directory receiving the charts.
    #[arg(short = 'o', long = "output", default_value = ".")]
    output: PathBuf,

    /// Overlay the 95th latency percentile.
    #[arg(long)]
    p95: bool,

    /// Overlay the 98th latency percentile.
    #[arg(long)]
    p98: bool,

    /// Overlay the 99th latency percentile.
    #[arg(long)]
    p99: bool,

    /// Overlay every latency percentile.
    #[arg(long)]
    percentiles: bool,

    /// Do not shade error regions.
    #[arg(long)]
    no_error_region: bool,

    /// Second result table to overlay for comparison.
    #[arg(long = "compare")]
    compare: Option<PathBuf>,

    /// Legend labels of the two data sets, comma separated.
    #[arg(long, value_delimiter = ',', num_args = 2, requires = "compare")]
    labels: Vec<String>,

    /// Overlay regression curves (size mode only).
    #[arg(long)]
    regression: bool,

    /// Log per-task details.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Threads,
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Svg,
    Png,
    Both,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    check_output_dir(&cli.output)?;
    let config = render_config(&cli)?;

    let table = load_table(&cli.table)?;
    let comparison = cli.compare.as_deref().map(load_table).transpose()?;

    let scheduler = Scheduler::new(&config)?;
    scheduler.controller().install()?;
    let summary = scheduler.run(&table, comparison.as_ref())?;

    match summary.completion_line(&config.output_dir) {
        Some(line) => println!("{line}"),
        // The interrupt handler reports the run and exits the process.
        None => loop {
            std::thread::park();
        },
    }
    Ok(())
}

fn render_config(cli: &Cli) -> anyhow::Result<RenderConfig> {
    let mode = match (cli.size, cli.mode) {
        (true, _) | (false, ModeArg::Size) => VariableMode::Size,
        (false, ModeArg::Threads) => VariableMode::Threads,
    };
    if cli.regression && mode != VariableMode::Size {
        anyhow::bail!("--regression requires --mode size");
    }

    let percentiles = if cli.percentiles {
        PercentileSelection::all()
    } else {
        PercentileSelection {
            p95: cli.p95,
            p98: cli.p98,
            p99: cli.p99,
        }
    };
    let comparison = cli.compare.as_ref().map(|_| match cli.labels.as_slice() {
        [primary, secondary] => ComparisonLabels {
            primary: primary.clone(),
            secondary: secondary.clone(),
        },
        _ => ComparisonLabels::default(),
    });

    let mut config = RenderConfig::new(&cli.output);
    config.mode = mode;
    config.formats = match cli.format {
        FormatArg::Svg => FormatSelection::Svg,
        FormatArg::Png => FormatSelection::Png,
        FormatArg::Both => FormatSelection::Both,
    };
    config.percentiles = percentiles;
    config.error_regions = !cli.no_error_region;
    config.comparison = comparison;
    config.regression = cli.regression;
    if let Some(jobs) = cli.jobs {
        config.workers = jobs;
    }
    config.validate()?;
    Ok(config)
}

fn check_output_dir(dir: &Path) -> anyhow::Result<()> {
    let meta = std::fs::metadata(dir)
        .with_context(|| format!("output directory '{}' does not exist", dir.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("output path '{}' is not a directory", dir.display());
    }
    let marker = dir.join(".perfgraph-write-check");
    std::fs::write(&marker, b"")
        .with_context(|| format!("output directory '{}' is not writable", dir.display()))?;
    let _ = std::fs::remove_file(&marker);
    Ok(())
}
