use std::{io, path::PathBuf, process::ExitCode};

use clap::Parser;
use svm_base::{
    program::Program,
    runner::{Runner, Signal},
};
use tracing::debug;

/// svm engine: loads svm bytecode, executes it and prints the operand stack
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// File to execute
    file: PathBuf,

    /// Do not execute file, print its listing
    #[arg(short, long)]
    no_exec: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(v) => v,
        Err(e) => {
            _ = e.print();

            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    svmc::init_logging();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");

            ExitCode::FAILURE
        }
    }
}

/// Runtime faults are reported here and are not errors, the stack is
/// printed either way.
fn run(Args { file, no_exec }: Args) -> Result<(), svmc::Error> {
    let program = Program::load_file(&file)?;
    let stdout = io::stdout().lock();

    if no_exec {
        return svmc::write_listing(program.as_bytes(), stdout);
    }

    let mut svm = Runner::new(program);

    match svm.run_to_end() {
        Signal::Fault(f) => eprintln!("runtime-error: {f}"),
        sig => debug!(?sig, pc = svm.context.pc, "stopped"),
    }

    svmc::write_stack(&svm.context.stack, stdout)
}
