//! Program buffer and loader.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

/// Maximum program length in bytes.
pub const PROGRAM_MAX: usize = 65536;

/// Fixed-capacity buffer holding the binary instruction stream.
#[derive(Clone)]
pub struct Program {
    buffer: Box<[u8]>,
    len: usize,
}

impl Program {
    /// Creates cleared program buffer.
    pub fn new() -> Self {
        Self {
            buffer: vec![0; PROGRAM_MAX].into_boxed_slice(),
            len: 0,
        }
    }

    /// Copies `bytes` into a new program.
    ///
    /// ```
    /// # use svm_base::program::{Program, PROGRAM_MAX, LoadError};
    /// let program = Program::from_bytes(&[0x01, 0x2A, 0x00, 0x00, 0x00]).unwrap();
    /// assert_eq!(program.len(), 5);
    ///
    /// let big = vec![0xFF; PROGRAM_MAX + 1];
    /// assert!(matches!(Program::from_bytes(&big), Err(LoadError::TooLarge { .. })));
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() > PROGRAM_MAX {
            return Err(LoadError::TooLarge { len: bytes.len() });
        }
        let mut program = Self::new();
        program.buffer[..bytes.len()].copy_from_slice(bytes);
        program.len = bytes.len();

        Ok(program)
    }

    /// Reads program file. See [`Program::load_from`].
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut program = Self::new();
        program.load_from(file)?;
        debug!(path = %path.display(), len = program.len, "program loaded");

        Ok(program)
    }

    /// Replaces buffer content with bytes from `reader`, up to [`PROGRAM_MAX`].
    /// Anything past the capacity is ignored. On error the program is left empty.
    pub fn load_from<R: Read>(&mut self, mut reader: R) -> Result<usize, LoadError> {
        self.clear();

        let mut filled = 0;
        while filled < PROGRAM_MAX {
            match reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LoadError::Read(e)),
            }
        }

        if filled == PROGRAM_MAX {
            let mut probe = [0u8; 1];
            if matches!(reader.read(&mut probe), Ok(n) if n > 0) {
                warn!("program is longer than {PROGRAM_MAX} bytes, the rest is ignored");
            }
        }
        self.len = filled;

        Ok(filled)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.buffer[..self.len].fill(0);
        self.len = 0;
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Program {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Program").field("len", &self.len).finish()
    }
}

/// Errors of [`Program`] loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read program: {0}")]
    Read(#[from] io::Error),
    #[error("program is {len} bytes, limit is {PROGRAM_MAX}")]
    TooLarge { len: usize },
}
