use std::process::ExitCode;

use bulk_loader::prelude::{load_all, LoadOpt};
use clap::Parser;

fn main() -> ExitCode {
    let opt = LoadOpt::parse();

    let config = match opt.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = match runtime.block_on(load_all(&config)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if report.is_success() {
        return ExitCode::SUCCESS;
    }
    for failure in report.failures() {
        eprintln!("error: {}", failure);
    }
    if config.keep_going {
        eprintln!("{}", report);
    }
    ExitCode::FAILURE
}
