//! Shared pieces of the `svmas` and `svmrun` command line tools.

use std::{
    fmt::Write as _,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use svm_base::{
    parser::{Parser, ParserError},
    program::LoadError,
    vm::{FixedStack, STACK_MAX},
};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs stderr log subscriber. Verbosity is taken from `RUST_LOG`,
/// `warn` if unset or invalid.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Front end errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Assembly error, already rendered since it borrows the source text.
    #[error("{}:{line}: {message}", path.display())]
    Translate {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("cannot decode program: {0}")]
    Decode(#[from] ParserError),
    /// Command output could not be written.
    #[error(transparent)]
    Output(#[from] io::Error),
}

/// Translates `input` source file into `output` binary. The output file is
/// only touched if translation succeeded. Returns bytecode length.
///
/// Source is not required to be UTF-8, invalid bytes are replaced and only
/// matter if they end up in a token.
pub fn assemble_file(input: &Path, output: &Path) -> Result<usize, Error> {
    let bytes = fs::read(input).map_err(|source| Error::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8_lossy(&bytes);

    let bytecode = svm_as::translate(&source).map_err(|e| Error::Translate {
        path: input.to_path_buf(),
        line: e.line,
        message: e.kind.to_string(),
    })?;

    fs::write(output, &bytecode).map_err(|source| Error::Write {
        path: output.to_path_buf(),
        source,
    })?;
    debug!(output = %output.display(), len = bytecode.len(), "bytecode written");

    Ok(bytecode.len())
}

/// Renders operand stack from top to bottom, space separated.
///
/// ```
/// # use svm_base::vm::{FixedStack, STACK_MAX};
/// let mut stack = FixedStack::<i32, STACK_MAX>::new();
/// for v in [1, -2, 3] {
///     stack.push(v).unwrap();
/// }
/// assert_eq!(svmc::format_stack(&stack), "3 -2 1");
/// ```
pub fn format_stack(stack: &FixedStack<i32, STACK_MAX>) -> String {
    let mut out = String::new();
    for (i, v) in stack.iter_top_down().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // writing into a String cannot fail
        _ = write!(out, "{v}");
    }
    out
}

/// Writes [`format_stack`] line to `out`.
pub fn write_stack<W: Write>(
    stack: &FixedStack<i32, STACK_MAX>,
    mut out: W,
) -> Result<(), Error> {
    writeln!(out, "{}", format_stack(stack))?;
    out.flush()?;

    Ok(())
}

/// Writes `offset: MNEMONIC [operand]` for every instruction of `bytecode`.
/// Stops on the first undecodable instruction, everything before it is
/// already written.
pub fn write_listing<W: Write>(bytecode: &[u8], mut out: W) -> Result<(), Error> {
    for item in Parser::new(bytecode) {
        let (offset, instr) = item?;
        writeln!(out, "{offset}: {instr}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing() {
        #[rustfmt::skip]
        let code = [
            0x01, 0x2A, 0x00, 0x00, 0x00, // PUSH 42
            0x30, 0x00, 0x00, 0x00, 0x00, // STORE 0
            0x03,                         // DUP
            0xFF,                         // HALT
        ];
        let mut out = Vec::new();

        write_listing(&code, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0: PUSH 42\n5: STORE 0\n10: DUP\n11: HALT\n"
        );
    }

    #[test]
    fn listing_stops_on_bad_byte() {
        let mut out = Vec::new();

        let err = write_listing(&[0x03, 0x07, 0x03], &mut out).unwrap_err();

        assert_eq!(String::from_utf8(out).unwrap(), "0: DUP\n");
        assert_eq!(err.to_string(), "cannot decode program: unknown opcode 0x07 @ 1..1");
    }

    #[test]
    fn empty_stack() {
        assert_eq!(format_stack(&FixedStack::new()), "");

        let mut out = Vec::new();
        write_stack(&FixedStack::new(), &mut out).unwrap();
        assert_eq!(out, b"\n");
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stack_write_failure() {
        let mut stack = FixedStack::new();
        stack.push(5).unwrap();

        let err = write_stack(&stack, Closed).unwrap_err();

        assert!(matches!(err, Error::Output(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn load_message() {
        let err = Error::from(LoadError::TooLarge { len: 70000 });
        assert_eq!(err.to_string(), "program is 70000 bytes, limit is 65536");
    }

    #[test]
    fn translate_message() {
        let err = Error::Translate {
            path: PathBuf::from("prog.asm"),
            line: 3,
            message: "unknown label `f`".into(),
        };
        assert_eq!(err.to_string(), "prog.asm:3: unknown label `f`");
    }
}
