use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::info;

/// svm assembler: translates assembly source into svm bytecode
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Assembly source file
    input: PathBuf,

    /// Output file for bytecode
    output: PathBuf,
}

fn main() -> ExitCode {
    let Args { input, output } = match Args::try_parse() {
        Ok(v) => v,
        Err(e) => {
            _ = e.print();

            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    svmc::init_logging();

    match svmc::assemble_file(&input, &output) {
        Ok(len) => {
            info!(len, "assembled {}", input.display());

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");

            ExitCode::FAILURE
        }
    }
}
