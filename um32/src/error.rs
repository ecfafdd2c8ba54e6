use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::Handle;

/// The top nibble of an instruction word named an opcode that doesn't exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("undefined opcode {opcode}")]
pub struct DecodeError {
    pub opcode: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryFault {
    /// The handle was never handed out (or names the program array where
    /// that isn't allowed).
    #[error("invalid handle {handle}")]
    InvalidHandle { handle: Handle },
    #[error("offset {offset} is out of bounds for array {handle} of length {len}")]
    OutOfBounds {
        handle: Handle,
        offset: u32,
        len: usize,
    },
    /// The handle was handed out once, but has since been abandoned.
    #[error("array {handle} was used after being abandoned")]
    UseAfterFree { handle: Handle },
    /// Out of handles, or the array asked for is too big to make.
    #[error("out of memory for a new array")]
    Exhausted,
}

/// The host broke its side of the I/O contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("host supplied {value}, which is not a byte")]
    ByteOutOfRange { value: u32 },
    #[error("host went away while the machine was waiting on it")]
    Disconnected,
    #[error("console I/O failed: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for ProtocolError {
    fn from(error: std::io::Error) -> ProtocolError {
        ProtocolError::Io {
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Memory(#[from] MemoryFault),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A fatal error, along with where the machine was when it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct Fault {
    pub kind: FaultKind,
    /// The opcode nibble being executed, if the fetch itself succeeded.
    pub opcode: Option<u32>,
    pub pc: u32,
}

impl Display for Fault {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self.opcode {
            Some(opcode) => write!(
                fmt,
                "{kind} (opcode {opcode} at PC {pc:08X})",
                kind = self.kind,
                pc = self.pc
            ),
            None => write!(
                fmt,
                "{kind} (fetching at PC {pc:08X})",
                kind = self.kind,
                pc = self.pc
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("program image is {len} bytes long, which isn't a whole number of words")]
    Truncated { len: usize },
}

/// A session that never got going.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("couldn't spawn a thread for the machine")]
    Spawn(#[source] std::io::Error),
}
