use svm_base::{opcode::OPCode, parser::Instruction, program::PROGRAM_MAX};
use thiserror::Error;
use tracing::debug;

use crate::{
    labels::{LabelError, LabelTable, LABELS_MAX},
    lex::{parse_number, Line},
};

/// Represents translation context: known labels and address counter.
///
/// [`Context::populate`] is the first pass, [`Context::generate`] the second.
/// Both must see the same lines.
///
/// # Example
/// ```
/// # use svm_as::{writer::Context, lex::Lex};
/// #
/// let lines: Vec<_> = Lex::new("JMP skip\nPUSH 99\nskip: HALT").collect();
///
/// let ctx = Context::new().populate(lines.iter()).unwrap();
///
/// assert_eq!(ctx.labels.get("skip"), Some(10));
/// assert_eq!(ctx.count, 11);
/// assert_eq!(
///     ctx.generate(lines.iter()),
///     Ok(vec![0x20, 0x0A, 0x00, 0x00, 0x00, 0x01, 0x63, 0x00, 0x00, 0x00, 0xFF]),
/// );
/// ```
#[derive(Default, Clone, Debug)]
pub struct Context<'a> {
    pub labels: LabelTable<'a>,
    /// Address of the next instruction.
    pub count: u32,
}

impl<'a> Context<'a> {
    /// Creates empty context
    pub fn new() -> Self {
        Default::default()
    }

    /// First pass. Records labels at the current address and advances it by
    /// every instruction's encoded length. It using builder pattern.
    pub fn populate<'b, I>(mut self, lines: I) -> Result<Self, BytecodeError<'a>>
    where
        I: IntoIterator<Item = &'b Line<'a>>,
        'a: 'b,
    {
        for line in lines {
            let err = |kind| BytecodeError {
                line: line.number,
                kind,
            };

            if let Some(label) = line.label {
                self.labels
                    .define(label, self.count)
                    .map_err(|e| match e {
                        LabelError::Duplicate => err(BytecodeErrorKind::DuplicateLabel(label)),
                        LabelError::Full => err(BytecodeErrorKind::TooManyLabels),
                    })?;
            }

            let Some(mnemonic) = line.mnemonic else {
                continue;
            };
            let Some(opcode) = OPCode::from_mnemonic(mnemonic) else {
                return Err(err(BytecodeErrorKind::OPCode(mnemonic)));
            };

            let next = self.count as usize + opcode.encoded_len();
            if next > PROGRAM_MAX {
                return Err(err(BytecodeErrorKind::TooLarge));
            }
            self.count = next as u32;
        }

        debug!(labels = self.labels.len(), bytes = self.count, "first pass done");

        Ok(self)
    }

    /// Second pass. Generates svm bytecode by known context without mutating it.
    ///
    /// Operand is a number if the whole token parses as one, otherwise it is
    /// a label name.
    pub fn generate<'b, I>(&self, lines: I) -> Result<Vec<u8>, BytecodeError<'a>>
    where
        I: IntoIterator<Item = &'b Line<'a>>,
        'a: 'b,
    {
        let mut buffer = Vec::with_capacity(self.count as usize);

        for line in lines {
            let err = |kind| BytecodeError {
                line: line.number,
                kind,
            };

            let Some(mnemonic) = line.mnemonic else {
                continue;
            };
            let Some(opcode) = OPCode::from_mnemonic(mnemonic) else {
                return Err(err(BytecodeErrorKind::OPCode(mnemonic)));
            };

            let operand = if opcode.has_operand() {
                let Some(token) = line.operand else {
                    return Err(err(BytecodeErrorKind::MissingOperand(opcode)));
                };
                let value = match parse_number(token) {
                    Some(v) => v,
                    None => match self.labels.get(token) {
                        Some(addr) => addr as i32,
                        None => return Err(err(BytecodeErrorKind::Label(token))),
                    },
                };
                Some(value)
            } else {
                None
            };

            Instruction::new(opcode, operand).encode_into(&mut buffer);
        }

        debug!(bytes = buffer.len(), "second pass done");

        Ok(buffer)
    }
}

/// Translation error with the 1-based line it happened on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct BytecodeError<'a> {
    pub line: usize,
    pub kind: BytecodeErrorKind<'a>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BytecodeErrorKind<'a> {
    #[error("unknown mnemonic `{0}`")]
    OPCode(&'a str),
    #[error("`{}` expects an operand", .0.mnemonic())]
    MissingOperand(OPCode),
    #[error("unknown label `{0}`")]
    Label(&'a str),
    #[error("label `{0}` is already defined")]
    DuplicateLabel(&'a str),
    #[error("too many labels, limit is {LABELS_MAX}")]
    TooManyLabels,
    #[error("program exceeds {PROGRAM_MAX} bytes")]
    TooLarge,
}
