//! Fetch-decode-execute engine.
//!
//! It decodes instructions straight from the [`Program`] bytes and runs them
//! against a [`VMContext`]. See [`Runner`] docs for more.

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    opcode::OPCode,
    parser::{Parser, ParserErrorKind},
    program::Program,
    vm::VMContext,
};

/// Simple runner
///
/// # Example
/// ```
/// # use svm_base::{program::Program, runner::{Runner, Signal}};
/// #
/// let code = Program::from_bytes(&[
///     0x01, 0x02, 0x00, 0x00, 0x00, // PUSH 2
///     0x01, 0x03, 0x00, 0x00, 0x00, // PUSH 3
///     0x10,                         // ADD
///     0xFF,                         // HALT
/// ]).unwrap();
///
/// let mut vm = Runner::new(code);
/// let sig = loop {
///     match vm.run() {
///         Signal::Continue => {},
///         s => break s,
///     }
/// };
/// assert_eq!(sig, Signal::Halted);
/// assert_eq!(vm.context.stack.as_slice(), &[5]);
/// ```
#[derive(Debug)]
pub struct Runner {
    pub program: Program,
    pub context: VMContext,
    stopped: Option<Signal>,
}

/// Type of returned signal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// All ok, instruction executed
    Continue,
    /// `HALT` executed
    Halted,
    /// Program counter reached the end of program
    EOF,
    /// Execution stopped on a fault
    Fault(Fault),
}

/// Runtime fault together with the offset of the faulting instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{kind} at pc={pc}")]
pub struct Fault {
    pub kind: FaultKind,
    pub pc: usize,
}

/// Kind of runtime fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("return stack overflow")]
    ReturnStackOverflow,
    #[error("return stack underflow")]
    ReturnStackUnderflow,
    #[error("{} invalid memory index {index}", opcode.mnemonic())]
    MemoryOutOfBounds { opcode: OPCode, index: i32 },
    #[error("{} operand out of bounds", opcode.mnemonic())]
    TruncatedOperand { opcode: OPCode },
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),
}

impl Runner {
    /// Creates runner for loaded program: fresh context, `pc = 0`, running.
    pub fn new(program: Program) -> Self {
        let mut context = VMContext::new();
        context.running = true;

        Self {
            program,
            context,
            stopped: None,
        }
    }

    /// Puts runner back to the state right after [`Runner::new`].
    pub fn reset(&mut self) {
        self.context.reset();
        self.context.running = true;
        self.stopped = None;
    }

    /// Execute one instruction and go to next. Once a terminal signal was
    /// returned every further call returns it again.
    ///
    /// # Example usage
    /// ```
    /// # use svm_base::{program::Program, runner::*};
    /// #
    /// let code = Program::from_bytes(&[0x02]).unwrap(); // POP
    ///
    /// let mut vm = Runner::new(code);
    /// assert_eq!(vm.run(), Signal::Fault(Fault { kind: FaultKind::StackUnderflow, pc: 0 }));
    /// assert!(!vm.context.running);
    /// ```
    pub fn run(&mut self) -> Signal {
        if let Some(sig) = self.stopped {
            return sig;
        }

        let pc = self.context.pc;
        if !self.context.running || pc >= self.program.len() {
            return self.stop(Signal::EOF);
        }

        let mut parser = Parser::at(self.program.as_bytes(), pc);
        let instr = match parser.next_instr() {
            Ok(instr) => instr,
            Err(e) => {
                self.context.pc = pc + 1;
                let kind = match e.kind {
                    ParserErrorKind::UnknownOpcode(raw) => FaultKind::UnknownOpcode(raw),
                    ParserErrorKind::TruncatedOperand { opcode, .. } => {
                        FaultKind::TruncatedOperand { opcode }
                    }
                    ParserErrorKind::EOF => return self.stop(Signal::EOF),
                };
                return self.fault(kind, pc);
            }
        };
        self.context.pc = parser.offset();

        trace!(pc, %instr, depth = self.context.stack.len(), "exec");

        match self.execute(instr.opcode, instr.operand.unwrap_or_default()) {
            Ok(true) => Signal::Continue,
            Ok(false) => self.stop(Signal::Halted),
            Err(kind) => self.fault(kind, pc),
        }
    }

    /// Runs until a terminal signal and returns it.
    pub fn run_to_end(&mut self) -> Signal {
        loop {
            match self.run() {
                Signal::Continue => continue,
                sig => break sig,
            }
        }
    }

    /// Executes decoded instruction. `Ok(false)` stops the machine.
    fn execute(&mut self, opcode: OPCode, operand: i32) -> Result<bool, FaultKind> {
        let ctx = &mut self.context;
        // jump targets are unsigned byte offsets
        let addr = operand as u32;

        match opcode {
            OPCode::Push => push(ctx, operand)?,
            OPCode::Pop => {
                pop(ctx)?;
            }
            OPCode::Dup => {
                let top = ctx.stack.top().ok_or(FaultKind::StackUnderflow)?;
                push(ctx, top)?;
            }

            OPCode::Add | OPCode::Sub | OPCode::Mul | OPCode::Div | OPCode::Cmp => {
                let b = pop(ctx)?;
                let a = pop(ctx)?;
                let val = match opcode {
                    OPCode::Div if b == 0 => return Err(FaultKind::DivisionByZero),

                    OPCode::Add => a.wrapping_add(b),
                    OPCode::Sub => a.wrapping_sub(b),
                    OPCode::Mul => a.wrapping_mul(b),
                    OPCode::Div => a.wrapping_div(b),
                    OPCode::Cmp => i32::from(a < b),

                    _ => unreachable!(),
                };
                push(ctx, val)?;
            }

            OPCode::Jmp => ctx.pc = addr as usize,
            OPCode::Jz | OPCode::Jnz => {
                let cond = pop(ctx)?;
                let taken = match opcode {
                    OPCode::Jz => cond == 0,
                    OPCode::Jnz => cond != 0,

                    _ => unreachable!(),
                };
                if taken {
                    ctx.pc = addr as usize;
                }
            }

            OPCode::Store => {
                let val = pop(ctx)?;
                let Some(cell) = ctx.memory.get_mut(operand) else {
                    return Err(FaultKind::MemoryOutOfBounds { opcode, index: operand });
                };
                *cell = val;
            }
            OPCode::Load => {
                let Some(val) = ctx.memory.get(operand) else {
                    return Err(FaultKind::MemoryOutOfBounds { opcode, index: operand });
                };
                push(ctx, val)?;
            }

            OPCode::Call => {
                // pc already points past the operand
                let ret = ctx.pc as u32;
                ctx.ret_stack
                    .push(ret)
                    .map_err(|_| FaultKind::ReturnStackOverflow)?;
                ctx.pc = addr as usize;
            }
            OPCode::Ret => {
                let ret = ctx
                    .ret_stack
                    .pop()
                    .ok_or(FaultKind::ReturnStackUnderflow)?;
                ctx.pc = ret as usize;
            }

            OPCode::Halt => return Ok(false),
        }

        Ok(true)
    }

    fn fault(&mut self, kind: FaultKind, pc: usize) -> Signal {
        let fault = Fault { kind, pc };
        debug!(%fault, "execution stopped");
        self.stop(Signal::Fault(fault))
    }

    fn stop(&mut self, sig: Signal) -> Signal {
        self.context.running = false;
        self.stopped = Some(sig);
        sig
    }
}

#[inline]
fn push(ctx: &mut VMContext, v: i32) -> Result<(), FaultKind> {
    ctx.stack.push(v).map_err(|_| FaultKind::StackOverflow)
}

#[inline]
fn pop(ctx: &mut VMContext) -> Result<i32, FaultKind> {
    ctx.stack.pop().ok_or(FaultKind::StackUnderflow)
}
