//! # SVM stack machine
//!
//! This crate contains base things of svm. svm bytecode goes through 4 stages
//! to be executed:
//!
//! 1. [`program`] -- loader stage. Reads the binary file into a fixed-size buffer.
//! 2. [`parser`] -- decodes bytes at a given offset into [`Instruction`]s.
//! 3. [`vm`] -- virtual environment. Allocates operand stack, return stack and memory.
//! 4. [`runner`] -- execute decoded instructions one by one.
//!
//! # Example
//! Opcode list can be found in [`OPCode`] enum.
//!
//! ```
//! # use svm_base::{program::*, runner::*};
//! #
//! let bytecode = &[
//!     0x40, 0x06, 0x00, 0x00, 0x00, // call  f
//!     0xFF,                         // halt
//!                                   // f:
//!     0x01, 0x07, 0x00, 0x00, 0x00, // push  7
//!     0x41,                         // ret
//! ];
//!
//! let mut svm = Runner::new(Program::from_bytes(bytecode).unwrap());
//!
//! match svm.run_to_end() {
//!     Signal::Halted | Signal::EOF => {}
//!     Signal::Fault(f) => panic!("runtime-error: {f}"),
//!     Signal::Continue => unreachable!(),
//! }
//!
//! assert_eq!(svm.context.stack.as_slice(), &[7]);
//! ```
//!
//! # Binary format
//!
//! First byte is OPCODE. Instructions with an operand are followed by 4 bytes
//! of little-endian two's-complement integer. There is no header, program starts
//! at offset 0 and is at most [`PROGRAM_MAX`] bytes.
//!
//! | Mnemonic | Opcode | Operand |
//! |----------|--------|---------|
//! | `PUSH`   | `0x01` | imm32   |
//! | `POP`    | `0x02` | --      |
//! | `DUP`    | `0x03` | --      |
//! | `ADD`    | `0x10` | --      |
//! | `SUB`    | `0x11` | --      |
//! | `MUL`    | `0x12` | --      |
//! | `DIV`    | `0x13` | --      |
//! | `CMP`    | `0x14` | --      |
//! | `JMP`    | `0x20` | addr32  |
//! | `JZ`     | `0x21` | addr32  |
//! | `JNZ`    | `0x22` | addr32  |
//! | `STORE`  | `0x30` | addr32  |
//! | `LOAD`   | `0x31` | addr32  |
//! | `CALL`   | `0x40` | addr32  |
//! | `RET`    | `0x41` | --      |
//! | `HALT`   | `0xFF` | --      |
//!
//! ## Machine
//!
//! | Part         | Capacity                         |
//! |--------------|----------------------------------|
//! | Operand stack| [`STACK_MAX`] `i32`s             |
//! | Return stack | [`RET_STACK_MAX`] addresses      |
//! | Memory       | [`MEM_SIZE`] `i32` cells         |
//!
//! Any overflow, underflow, bad memory index, truncated operand, division by
//! zero or unknown opcode stops the machine with a [`runner::Fault`].

// doc imports
#[allow(unused_imports)]
use {opcode::*, parser::*, program::*, vm::*};

pub mod opcode;
pub mod parser;
pub mod program;
pub mod runner;
pub mod vm;
