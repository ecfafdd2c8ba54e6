use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::DecodeError;

/// Index into the register file. Always less than 8.
pub type Register = usize;

const REGISTER_MASK: u32 = 0b111;
const IMMEDIATE_MASK: u32 = 0x01FF_FFFF;
const OPCODE_SHIFT: u32 = 28;
const IMMEDIATE_REGISTER_SHIFT: u32 = 25;

pub const OP_CONDITIONAL_MOVE: u32 = 0;
pub const OP_ARRAY_INDEX: u32 = 1;
pub const OP_ARRAY_AMENDMENT: u32 = 2;
pub const OP_ADDITION: u32 = 3;
pub const OP_MULTIPLICATION: u32 = 4;
pub const OP_DIVISION: u32 = 5;
pub const OP_NOT_AND: u32 = 6;
pub const OP_HALT: u32 = 7;
pub const OP_ALLOCATION: u32 = 8;
pub const OP_ABANDONMENT: u32 = 9;
pub const OP_OUTPUT: u32 = 10;
pub const OP_INPUT: u32 = 11;
pub const OP_LOAD_PROGRAM: u32 = 12;
pub const OP_ORTHOGRAPHY: u32 = 13;

/// The opcode nibble, bits 31-28.
pub fn opcode(word: u32) -> u32 {
    word >> OPCODE_SHIFT
}
/// Register A, bits 8-6.
pub fn reg_a(word: u32) -> Register {
    ((word >> 6) & REGISTER_MASK) as Register
}
/// Register B, bits 5-3.
pub fn reg_b(word: u32) -> Register {
    ((word >> 3) & REGISTER_MASK) as Register
}
/// Register C, bits 2-0.
pub fn reg_c(word: u32) -> Register {
    (word & REGISTER_MASK) as Register
}
/// Orthography's target register, bits 27-25.
pub fn immediate_register(word: u32) -> Register {
    ((word >> IMMEDIATE_REGISTER_SHIFT) & REGISTER_MASK) as Register
}
/// Orthography's value, bits 24-0.
pub fn immediate_value(word: u32) -> u32 {
    word & IMMEDIATE_MASK
}

/// A decoded instruction. Fields name registers, except Orthography's
/// `value`, which is the literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    ConditionalMove { a: Register, b: Register, c: Register },
    ArrayIndex { a: Register, b: Register, c: Register },
    ArrayAmendment { a: Register, b: Register, c: Register },
    Addition { a: Register, b: Register, c: Register },
    Multiplication { a: Register, b: Register, c: Register },
    Division { a: Register, b: Register, c: Register },
    NotAnd { a: Register, b: Register, c: Register },
    Halt,
    Allocation { b: Register, c: Register },
    Abandonment { c: Register },
    Output { c: Register },
    Input { c: Register },
    LoadProgram { b: Register, c: Register },
    Orthography { a: Register, value: u32 },
}

impl Operation {
    pub fn decode(word: u32) -> Result<Operation, DecodeError> {
        use Operation::*;
        let (a, b, c) = (reg_a(word), reg_b(word), reg_c(word));
        Ok(match opcode(word) {
            OP_CONDITIONAL_MOVE => ConditionalMove { a, b, c },
            OP_ARRAY_INDEX => ArrayIndex { a, b, c },
            OP_ARRAY_AMENDMENT => ArrayAmendment { a, b, c },
            OP_ADDITION => Addition { a, b, c },
            OP_MULTIPLICATION => Multiplication { a, b, c },
            OP_DIVISION => Division { a, b, c },
            OP_NOT_AND => NotAnd { a, b, c },
            OP_HALT => Halt,
            OP_ALLOCATION => Allocation { b, c },
            OP_ABANDONMENT => Abandonment { c },
            OP_OUTPUT => Output { c },
            OP_INPUT => Input { c },
            OP_LOAD_PROGRAM => LoadProgram { b, c },
            OP_ORTHOGRAPHY => Orthography {
                a: immediate_register(word),
                value: immediate_value(word),
            },
            undefined => return Err(DecodeError { opcode: undefined }),
        })
    }

    /// Turn this back into an instruction word. Register fields are masked to
    /// 3 bits and Orthography's value to 25 bits; everything else is zero.
    pub fn encode(self) -> u32 {
        use Operation::*;
        fn abc(op: u32, a: Register, b: Register, c: Register) -> u32 {
            (op << OPCODE_SHIFT)
                | ((a as u32 & REGISTER_MASK) << 6)
                | ((b as u32 & REGISTER_MASK) << 3)
                | (c as u32 & REGISTER_MASK)
        }
        match self {
            ConditionalMove { a, b, c } => abc(OP_CONDITIONAL_MOVE, a, b, c),
            ArrayIndex { a, b, c } => abc(OP_ARRAY_INDEX, a, b, c),
            ArrayAmendment { a, b, c } => abc(OP_ARRAY_AMENDMENT, a, b, c),
            Addition { a, b, c } => abc(OP_ADDITION, a, b, c),
            Multiplication { a, b, c } => abc(OP_MULTIPLICATION, a, b, c),
            Division { a, b, c } => abc(OP_DIVISION, a, b, c),
            NotAnd { a, b, c } => abc(OP_NOT_AND, a, b, c),
            Halt => abc(OP_HALT, 0, 0, 0),
            Allocation { b, c } => abc(OP_ALLOCATION, 0, b, c),
            Abandonment { c } => abc(OP_ABANDONMENT, 0, 0, c),
            Output { c } => abc(OP_OUTPUT, 0, 0, c),
            Input { c } => abc(OP_INPUT, 0, 0, c),
            LoadProgram { b, c } => abc(OP_LOAD_PROGRAM, 0, b, c),
            Orthography { a, value } => {
                (OP_ORTHOGRAPHY << OPCODE_SHIFT)
                    | ((a as u32 & REGISTER_MASK) << IMMEDIATE_REGISTER_SHIFT)
                    | (value & IMMEDIATE_MASK)
            }
        }
    }
}

impl Display for Operation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        use Operation::*;
        match self {
            ConditionalMove { a, b, c } => write!(fmt, "cmov r{a}, r{b}, r{c}"),
            ArrayIndex { a, b, c } => write!(fmt, "load r{a}, [r{b}][r{c}]"),
            ArrayAmendment { a, b, c } => write!(fmt, "store [r{a}][r{b}], r{c}"),
            Addition { a, b, c } => write!(fmt, "add r{a}, r{b}, r{c}"),
            Multiplication { a, b, c } => write!(fmt, "mul r{a}, r{b}, r{c}"),
            Division { a, b, c } => write!(fmt, "div r{a}, r{b}, r{c}"),
            NotAnd { a, b, c } => write!(fmt, "nand r{a}, r{b}, r{c}"),
            Halt => write!(fmt, "halt"),
            Allocation { b, c } => write!(fmt, "alloc r{b}, r{c}"),
            Abandonment { c } => write!(fmt, "free r{c}"),
            Output { c } => write!(fmt, "out r{c}"),
            Input { c } => write!(fmt, "in r{c}"),
            LoadProgram { b, c } => write!(fmt, "jmp r{b}, r{c}"),
            Orthography { a, value } => write!(fmt, "imm r{a}, {value:#X}"),
        }
    }
}
