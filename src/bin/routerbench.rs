use clap::Parser;
use routerbench::cli::{run_cli, Cli};
use routerbench::logging::{init_logging, LogConfig};
use std::io;
use std::process::ExitCode;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(not(feature = "jemalloc"))]
#[global_allocator]
static GLOBAL: routerbench::memory::CountingAllocator = routerbench::memory::CountingAllocator;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env().with_verbosity(cli.verbose);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: {e:#}");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run_cli(&cli, &mut out) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
