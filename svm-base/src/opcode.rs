//! Instruction set definition.
//!
//! Every opcode is one byte. Whether an instruction carries a 4-byte operand
//! depends only on the opcode, see [`OperandKind`].
use svm_base_proc_upper::upper;

/// Length of an encoded operand in bytes.
pub const OPERAND_LEN: usize = 4;

/// read macro or code bellow.
///
/// ```ignore
/// enum Bar {
///     Addr32 => [
///         /// doc line (exactly one)
///         Jmp = 0x20, // mnemonic "JMP", carries an address operand
///     ],
/// }
/// ```
macro_rules! impl_opcodes {
    ($(#[$m:meta])* $v:vis enum $name:ident { $($kind:ident => [ $(#[doc = $doc:literal] $var:ident = $code:literal),* $(,)? ] ),* $(,)? }) => {
        $(#[$m])*
        $v enum $name {$(
            $(
                #[doc = $doc] $var = $code,
            )*
        )*}

        impl $name {
            /// Array of all variants.
            pub const VARIANTS: &'static [$name] = &[$($(Self::$var, )*)*];

            /// Get mnemonic of variant, as written in assembly source.
            pub const fn mnemonic(self) -> &'static str {
                match self {$($(
                    Self::$var => upper!($var),
                )*)*}
            }

            /// Get kind of operand that follows the opcode byte.
            pub const fn operand(self) -> OperandKind {
                match self {$($(
                    Self::$var => OperandKind::$kind,
                )*)*}
            }

            /// Try get opcode by raw byte.
            pub const fn from_raw(raw: u8) -> Option<Self> {
                match raw {
                    $($(
                        $code => Some(Self::$var),
                    )*)*
                    _ => None,
                }
            }
        }
    };
}

/// Kind of the operand embedded after an opcode byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandKind {
    /// No operand, instruction is 1 byte long.
    Implied,
    /// 32-bit signed literal.
    Imm32,
    /// 32-bit address: a byte offset into the program or a memory index.
    Addr32,
}

impl OperandKind {
    /// Number of bytes the operand takes in the instruction stream.
    #[inline(always)]
    pub const fn len(self) -> usize {
        match self {
            Self::Implied => 0,
            Self::Imm32 | Self::Addr32 => OPERAND_LEN,
        }
    }
}

impl_opcodes! {
    /// Represents opcode. Can be obtained from raw byte using [`OPCode::from_raw`]
    /// or from mnemonic using [`OPCode::from_mnemonic`].
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    #[repr(u8)]
    pub enum OPCode {
        Imm32 => [
            /// Push the literal operand.
            Push = 0x01,
        ],
        Implied => [
            /// Remove the top of the stack.
            Pop = 0x02,
            /// Duplicate the top of the stack.
            Dup = 0x03,
            /// Pop `b`, pop `a`, push `a + b`.
            Add = 0x10,
            /// Pop `b`, pop `a`, push `a - b`.
            Sub = 0x11,
            /// Pop `b`, pop `a`, push `a * b`.
            Mul = 0x12,
            /// Pop `b`, pop `a`, push `a / b`. Signals on zero divisor.
            Div = 0x13,
            /// Pop `b`, pop `a`, push `1` if `a < b` else `0`.
            Cmp = 0x14,
        ],
        Addr32 => [
            /// Jump to position.
            Jmp = 0x20,
            /// Pop condition, jump to position if it is zero.
            Jz = 0x21,
            /// Pop condition, jump to position if it is not zero.
            Jnz = 0x22,
            /// Pop value into memory cell.
            Store = 0x30,
            /// Push value of memory cell.
            Load = 0x31,
            /// Push return address to the return stack and jump to position.
            Call = 0x40,
        ],
        Implied => [
            /// Pop the return stack and jump there.
            Ret = 0x41,
            /// Stop execution process.
            Halt = 0xFF,
        ],
    }
}

impl OPCode {
    /// Returns raw opcode byte.
    #[inline(always)]
    pub fn as_raw(self) -> u8 {
        self as u8
    }

    /// Try get opcode by its mnemonic. Mnemonics are case-sensitive.
    ///
    /// ```
    /// # use svm_base::opcode::OPCode;
    /// assert_eq!(OPCode::from_mnemonic("JNZ"), Some(OPCode::Jnz));
    /// assert_eq!(OPCode::from_mnemonic("jnz"), None);
    /// ```
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|op| op.mnemonic() == mnemonic)
            .copied()
    }

    /// Returns `true` if opcode is followed by a 4-byte operand.
    #[inline(always)]
    pub fn has_operand(self) -> bool {
        self.operand() != OperandKind::Implied
    }

    /// Full encoded length of the instruction in bytes.
    #[inline(always)]
    pub fn encoded_len(self) -> usize {
        1 + self.operand().len()
    }
}
