use clap::{Parser, Subcommand};
use lustre_bench::bench::{
    BenchmarkBatch, LargeFileBatch, StripingController, ThroughputBenchmark, UniformSizeSampler,
};
use lustre_bench::config::persistence::ResultsStorage;
use lustre_bench::config::BenchConfig;
use lustre_bench::error::user_friendly_message;
use lustre_bench::exec::SystemRunner;
use lustre_bench::io::LargeFileGenerator;
use lustre_bench::util::BlockSize;
use lustre_bench::{logging, report, LustreBenchError, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "lustre-bench", version, about = "Lustre scratch filesystem benchmarks")]
struct Cli {
    /// Config file (default: <config dir>/lustre-bench/lustre-bench.toml)
    #[arg(long, env = "LUSTRE_BENCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Mount path under test
    #[arg(long, env = "SCRATCH_PATH", global = true)]
    mount: Option<PathBuf>,

    /// Batch job input location, logged at startup
    #[arg(long, env = "INPUT_PATH", global = true, hide_env_values = true)]
    input: Option<PathBuf>,

    /// Batch job output location, logged at startup
    #[arg(long, env = "OUTPUT_PATH", global = true, hide_env_values = true)]
    output_path: Option<PathBuf>,

    /// Result records and charts (default: <mount>/performance_results)
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Skip the page-cache drop (unprivileged runs; results are warm-cache)
    #[arg(long, global = true)]
    no_drop_caches: bool,

    /// Hide progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Cold-cache write/read throughput over several file sizes
    Perf {
        /// Comma-separated sizes in MB
        #[arg(long, value_delimiter = ',')]
        sizes: Option<Vec<u64>>,
        #[arg(long)]
        block_size: Option<BlockSize>,
        /// Skip the SVG chart
        #[arg(long)]
        no_chart: bool,
    },
    /// Write timing before and after striping across all OSTs
    Stripe {
        #[arg(long)]
        size_gb: Option<u64>,
        #[arg(long)]
        block_size: Option<BlockSize>,
    },
    /// Fill a directory with randomly sized zero archives
    Generate {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        min_gb: Option<u64>,
        #[arg(long)]
        max_gb: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
        /// Output directory (default: the mount path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print stripe layout and OST usage of the mount
    Info,
}

fn load_config(cli: &Cli) -> Result<BenchConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchConfig::load_from(path)?,
        None => BenchConfig::load()?,
    };

    if let Some(mount) = &cli.mount {
        config = config.with_mount_path(mount.clone());
    }
    if cli.input.is_some() {
        config.input_path = cli.input.clone();
    }
    if cli.output_path.is_some() {
        config.output_path = cli.output_path.clone();
    }
    if let Some(dir) = &cli.results_dir {
        config = config.with_results_dir(dir.clone());
    }
    if cli.no_drop_caches {
        config = config.with_drop_caches(false);
    }
    if cli.no_progress {
        config = config.with_show_progress(false);
    }

    match &cli.command {
        Command::Perf {
            sizes,
            block_size,
            no_chart,
        } => {
            if let Some(sizes) = sizes {
                config = config.with_sizes_mb(sizes.clone());
            }
            if let Some(block_size) = block_size {
                config = config.with_block_size(block_size.clone());
            }
            if *no_chart {
                config.render_chart = false;
            }
        }
        Command::Stripe {
            size_gb,
            block_size,
        } => {
            if let Some(size_gb) = size_gb {
                config.stripe.size_gb = *size_gb;
            }
            if let Some(block_size) = block_size {
                config.stripe.block_size = block_size.clone();
            }
        }
        Command::Generate {
            count,
            min_gb,
            max_gb,
            seed,
            output,
        } => {
            let generate = &mut config.generate;
            generate.count = count.unwrap_or(generate.count);
            generate.min_gb = min_gb.unwrap_or(generate.min_gb);
            generate.max_gb = max_gb.unwrap_or(generate.max_gb);
            generate.seed = seed.or(generate.seed);
            if output.is_some() {
                generate.output_dir = output.clone();
            }
        }
        Command::Info => {}
    }

    config.validate()?;
    // Generation creates its output directory itself
    if !matches!(cli.command, Command::Generate { .. }) {
        config.validate_mount()?;
    }
    Ok(config)
}

fn system_runner(config: &BenchConfig) -> Result<SystemRunner> {
    let span = logging::component_span("runner", &config.mount_path);
    Ok(SystemRunner::new(span).with_timeout(config.command_timeout()?))
}

async fn run_perf(config: &BenchConfig) -> Result<()> {
    let bench = ThroughputBenchmark::from_config(
        system_runner(config)?,
        config,
        logging::component_span("throughput", &config.mount_path),
    );
    let run = BenchmarkBatch::new(&bench, config.block_size.clone())
        .with_progress(config.show_progress)
        .run_batch(&config.sizes_mb)
        .await?;

    let storage = ResultsStorage::new(config.results_dir());
    let record = storage.persist(&run)?;
    println!("{}", report::run_summary(&run));
    println!("Results saved to {}", record.display());

    if config.render_chart {
        if !report::is_available() {
            warn!("chart support not compiled in, skipping chart");
            return Ok(());
        }
        // Results are already on disk; a chart failure only warns
        match report::render_chart(&run, storage.results_dir()) {
            Ok(chart) => println!("Chart saved to {}", chart.display()),
            Err(e) => warn!(error = %e, "chart rendering failed"),
        }
    }
    Ok(())
}

async fn run_stripe(config: &BenchConfig) -> Result<()> {
    let bench = ThroughputBenchmark::from_config(
        system_runner(config)?,
        config,
        logging::component_span("striping", &config.mount_path),
    );
    let controller = StripingController::new(bench);
    let comparison = controller
        .compare(
            &config.mount_path,
            config.stripe.size_gb,
            &config.stripe.block_size,
        )
        .await?;
    println!("{}", report::stripe_summary(&comparison));
    Ok(())
}

async fn run_generate(config: &BenchConfig) -> Result<()> {
    let settings = config.generate.clone();
    let output_dir = config.generate_output_dir();
    let show_progress = config.show_progress;
    let mount = config.mount_path.clone();

    let artifacts = tokio::task::spawn_blocking(move || {
        let generator = LargeFileGenerator::new(
            settings.compression_level,
            logging::component_span("generator", &mount),
        );
        let sampler = UniformSizeSampler::new(settings.min_gb, settings.max_gb, settings.seed)?;
        LargeFileBatch::new(
            generator,
            sampler,
            settings.count,
            output_dir,
            logging::component_span("batch", &mount),
        )
        .with_progress(show_progress)
        .run()
    })
    .await
    .map_err(|e| LustreBenchError::Resource(format!("generation task failed: {}", e)))??;

    for artifact in &artifacts {
        println!(
            "{}  {} GB target, {:.2} GB archived",
            artifact.path.display(),
            artifact.size_gb,
            artifact.archive_gb()
        );
    }
    Ok(())
}

async fn run_info(config: &BenchConfig) -> Result<()> {
    let bench = ThroughputBenchmark::from_config(
        system_runner(config)?,
        config,
        logging::component_span("striping", &config.mount_path),
    );
    let controller = StripingController::new(bench);
    println!("{}", controller.get_stripe_info(&config.mount_path).await?);
    println!("{}", controller.get_ost_usage().await?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    info!(
        mount = %config.mount_path.display(),
        input = ?config.input_path,
        output = ?config.output_path,
        drop_caches = config.drop_caches,
        "lustre-bench starting"
    );

    match cli.command {
        Command::Perf { .. } => run_perf(&config).await,
        Command::Stripe { .. } => run_stripe(&config).await,
        Command::Generate { .. } => run_generate(&config).await,
        Command::Info => run_info(&config).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "lustre-bench failed");
            eprintln!("Error: {}", user_friendly_message(&e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_generate_accepts_missing_mount() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("absent.toml");
        let mount = dir.path().join("not_yet_created");
        let cli = parse(&[
            "lustre-bench",
            "--config",
            config_file.to_str().unwrap(),
            "--mount",
            mount.to_str().unwrap(),
            "generate",
            "--count",
            "2",
        ]);

        let config = load_config(&cli).unwrap();
        assert_eq!(config.generate.count, 2);
        assert_eq!(config.generate_output_dir(), mount);
        assert!(!mount.exists());
    }

    #[test]
    fn test_benchmarks_require_existing_mount() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("absent.toml");
        let mount = dir.path().join("not_yet_created");

        for sub in ["perf", "stripe", "info"] {
            let cli = parse(&[
                "lustre-bench",
                "--config",
                config_file.to_str().unwrap(),
                "--mount",
                mount.to_str().unwrap(),
                sub,
            ]);
            match load_config(&cli) {
                Err(LustreBenchError::ConfigError(msg)) => {
                    assert!(msg.contains("does not exist"), "{}: {}", sub, msg)
                }
                other => panic!("{}: unexpected result {:?}", sub, other.map(|_| ())),
            }
        }
    }
}
