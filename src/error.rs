//! Error type shared by every layer of the interpreter
//!
//! Every variant is fatal for the running session: nothing in the core retries
//! or recovers. Errors travel up to `Interpreter::interpret_all` and from there
//! to whoever hosts the session (the console binary or a server connection).

use thiserror::Error;

use crate::instruction::OperandCount;

#[derive(Error, Debug)]
pub enum ZError {
    #[error("memory access out of range: {width} byte(s) at {address:#06x}, memory size {len:#06x}")]
    OutOfBounds { address: u32, width: u32, len: usize },

    #[error("attempt to read routine at non packed address {0:#06x}")]
    UnpackedRoutine(u32),

    #[error("routine at {address:#06x} declares {count} locals (max 15)")]
    TooManyLocals { address: u32, count: u8 },

    #[error("call stack underflow")]
    CallStackUnderflow,

    #[error("evaluation stack underflow in routine at {0:#06x}")]
    StackUnderflow(u32),

    #[error("local variable {var} out of range: routine has {count} locals")]
    LocalOutOfRange { var: u8, count: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("illegal opcode {class:?}:{opcode:#04x} at {address:#06x}")]
    IllegalOpcode {
        class: OperandCount,
        opcode: u8,
        address: u32,
    },

    #[error("{name} expects {expected} operand(s), got {got}")]
    OperandCount {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("invalid object number {0}")]
    InvalidObject(u16),

    #[error("property {property} not found on object {object}")]
    MissingProperty { object: u16, property: u16 },

    #[error("invalid property: {0}")]
    InvalidProperty(String),

    #[error("abbreviation nesting too deep at {0:#06x}")]
    AbbreviationDepth(u32),

    #[error("text '{0}' does not fit in an encoded word")]
    EncodeOverflow(String),

    #[error("story file: {0}")]
    Story(String),

    #[error("unsupported story version {0} (only version 3 is supported)")]
    UnsupportedVersion(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ZError>;
