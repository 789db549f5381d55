//! Binary entry point for the synchronization sweep tool.
//!
//! This module is excluded from mutation testing because its behavior is process setup and exit
//! status mapping, which can only be observed from a subprocess.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use argh::FromArgs;
use fork_join::ExecutionContext;
use sync_sweep::{
    DataGenerator, Kernel, KernelPlan, ResultSink, SweepConfig, SweepDriver, SweepError,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Measures the numeric kernels of one family with every synchronization strategy over a grid
/// of input sizes and thread counts.
#[derive(FromArgs)]
struct Args {
    /// kernel to sweep: 1 min_find, 2 dot_product, 3 integration, 4 minimax,
    /// 5 minimax_triangular, 6 array_sum, 7 minimax_nested, 8 cycle_modes
    #[argh(positional)]
    kernel: Kernel,

    /// path of the measurement records (default: results/<kernel>/output.csv)
    #[argh(option)]
    output: Option<PathBuf>,

    /// path of the correctness diagnostics (default: diagnostics.csv next to the output)
    #[argh(option)]
    diagnostics: Option<PathBuf>,

    /// how many times the whole sweep is repeated (default: kernel specific)
    #[argh(option)]
    repetitions: Option<NonZero<u32>>,

    /// upper limit for the measured thread counts
    #[argh(option)]
    max_threads: Option<NonZero<usize>>,

    /// seed of the dataset generator (default: random, logged at startup)
    #[argh(option)]
    seed: Option<u64>,

    /// log every size configuration
    #[argh(switch, short = 'v')]
    verbose: bool,
}

const DEFAULT_FILTER: &str = "sync_sweep=info,fork_join=info";
const VERBOSE_FILTER: &str = "sync_sweep=debug,fork_join=debug";

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e, SweepError::Kernel(_)) {
                error!(error = %e, "kernel rejected its input");
            } else {
                error!(error = %e, "sweep failed");
            }

            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg_attr(test, mutants::skip)]
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg_attr(test, mutants::skip)]
fn run(args: &Args) -> Result<(), SweepError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| Path::new("results").join(args.kernel.to_string()).join("output.csv"));

    let diagnostics = args.diagnostics.clone().unwrap_or_else(|| {
        output
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join("diagnostics.csv")
    });

    let records = create(&output)?;
    let diagnostics_file = create(&diagnostics)?;

    let mut config = SweepConfig::detect();
    config.repetitions = args.repetitions;
    config.max_threads = args.max_threads;

    let data = args
        .seed
        .map_or_else(DataGenerator::from_entropy, DataGenerator::from_seed);

    info!(
        kernel = %args.kernel,
        output = %output.display(),
        diagnostics = %diagnostics.display(),
        hardware_threads = config.hardware_threads.get(),
        seed = data.seed(),
        "sync_sweep starting"
    );

    let plan = KernelPlan::new(args.kernel, &config);

    let mut context = ExecutionContext::new(config.hardware_threads);
    let sink = ResultSink::new(records, diagnostics_file);

    let mut driver = SweepDriver::new(&mut context, sink, data, config);
    driver.run(&plan)?;

    Ok(())
}

/// Creates (or truncates) a file for buffered writing, creating missing parent directories.
fn create(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(BufWriter::new(File::create(path)?))
}
