//! `roi-crop`: 以 ROI 为中心的定长块裁剪命令行工具.

mod args;
mod result;
mod runner;

use std::process::ExitCode;

use clap::Parser;

use args::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = utils::init_logger(cli.verbose, cli.quiet) {
        eprintln!("cannot install logger: {e}");
    }

    match runner::run(&cli.command) {
        Ok((summary, failed)) => {
            if let Err(e) = summary.analyze() {
                log::error!("cannot print summary: {e}");
            }
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
