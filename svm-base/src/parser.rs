//! Binary program format.
//!
//! There is no header. Instructions are concatenated directly: one opcode
//! byte, then a 4-byte little-endian two's-complement operand if the opcode
//! requires one (see [`OPCode::operand`]).
//!
//! # Examples
//!
//! ```
//! # use svm_base::{opcode::OPCode, parser::{Parser, ParserError, Instruction}};
//! let file: &[u8] = &[
//!     0x01, 0x02, 0x00, 0x00, 0x00, // PUSH 2
//!     0x10,                         // ADD
//!     0xFF,                         // HALT
//! ];
//! let instrs: Result<Vec<Instruction>, ParserError> = Parser::new(file)
//!     .into_iter() // -> ParserIter
//!     .map(|r| r.map(|(_, instr)| instr))
//!     .collect();
//!
//! assert_eq!(instrs.unwrap(), &[
//!     Instruction::new(OPCode::Push, Some(2)),
//!     Instruction::new(OPCode::Add, None),
//!     Instruction::new(OPCode::Halt, None),
//! ]);
//! ```

use core::fmt;

use thiserror::Error;

use crate::opcode::{OPCode, OPERAND_LEN};

/// Decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OPCode,
    pub operand: Option<i32>,
}

impl Instruction {
    pub fn new(opcode: OPCode, operand: Option<i32>) -> Self {
        Self { opcode, operand }
    }

    /// Encoded length in bytes.
    #[inline(always)]
    pub fn encoded_len(&self) -> usize {
        self.opcode.encoded_len()
    }

    /// Appends encoded instruction to `buffer`. The operand is written only
    /// if the opcode requires one, a missing one is written as zero.
    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.push(self.opcode.as_raw());
        if self.opcode.has_operand() {
            buffer.extend_from_slice(&self.operand.unwrap_or_default().to_le_bytes());
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(v) if self.opcode.has_operand() => write!(f, "{} {v}", self.opcode.mnemonic()),
            _ => f.write_str(self.opcode.mnemonic()),
        }
    }
}

/// Reads a little-endian `i32` at `offset`, [`None`] if less than 4 bytes remain.
#[inline]
pub fn read_i32_le(buffer: &[u8], offset: usize) -> Option<i32> {
    let end = offset.checked_add(OPERAND_LEN)?;
    buffer
        .get(offset..end)
        .map(|v| i32::from_le_bytes([v[0], v[1], v[2], v[3]]))
}

/// Basic Parser. Can be tuned into iterator using [`Parser::into_iter`].
pub struct Parser<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Parser<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::at(buffer, 0)
    }

    /// Creates parser that starts decoding at `offset`.
    pub fn at(buffer: &'a [u8], offset: usize) -> Self {
        Self { buffer, offset }
    }

    /// Offset of the next byte to decode.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Parses and return next [`Instruction`]. If there no more instructions will return
    /// [`ParserErrorKind::EOF`].
    ///
    /// On error offset is left on the byte that failed: the opcode byte for an
    /// unknown opcode, the first operand byte for a truncated operand.
    pub fn next_instr(&mut self) -> Result<Instruction, ParserError> {
        let start = self.offset;

        let Some(raw) = self.buffer.get(start).copied() else {
            return Err(ParserError {
                kind: ParserErrorKind::EOF,
                start,
                offset: start,
            });
        };
        let Some(opcode) = OPCode::from_raw(raw) else {
            return Err(ParserError {
                kind: ParserErrorKind::UnknownOpcode(raw),
                start,
                offset: start,
            });
        };
        self.offset += 1;

        if !opcode.has_operand() {
            return Ok(Instruction::new(opcode, None));
        }

        let Some(operand) = read_i32_le(self.buffer, self.offset) else {
            return Err(ParserError {
                kind: ParserErrorKind::TruncatedOperand {
                    opcode,
                    remaining: self.buffer.len() - self.offset,
                },
                start,
                offset: self.offset,
            });
        };
        self.offset += OPERAND_LEN;

        Ok(Instruction::new(opcode, Some(operand)))
    }
}

impl<'a> IntoIterator for Parser<'a> {
    type IntoIter = ParserIter<'a>;
    type Item = <Self::IntoIter as Iterator>::Item;

    fn into_iter(self) -> Self::IntoIter {
        ParserIter(self)
    }
}

/// Iterator wrapper over [`Parser`]. Yields instructions together with
/// their offset. Stops after the first error.
pub struct ParserIter<'a>(Parser<'a>);

impl<'a> Iterator for ParserIter<'a> {
    type Item = Result<(usize, Instruction), ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.0.offset();
        match self.0.next_instr() {
            Err(ParserError {
                kind: ParserErrorKind::EOF,
                ..
            }) => None,
            Err(e) => {
                // fuse: skip the rest of the buffer
                self.0.offset = self.0.buffer.len();
                Some(Err(e))
            }
            Ok(instr) => Some(Ok((start, instr))),
        }
    }
}

/// Represents error that may occurs while parsing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} @ {start}..{offset}")]
pub struct ParserError {
    pub kind: ParserErrorKind,
    /// Offset of the opcode byte of the failed instruction.
    pub start: usize,
    pub offset: usize,
}

/// Represents a error kind that may occur while parsing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParserErrorKind {
    /// Unexpected end of file
    #[error("end of file")]
    EOF,
    /// Byte is not a known opcode
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),
    /// Operand needs 4 bytes, fewer are left
    #[error("truncated {} operand, {remaining} of 4 bytes left", opcode.mnemonic())]
    TruncatedOperand { opcode: OPCode, remaining: usize },
}
