use std::fmt::{Display, Error, Formatter};
use std::ops::Deref;

use log::trace;

use crate::error::Result;
use crate::memory::{Cursor, Memory};
use crate::opcode_tables;

/// Operand types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandType {
    /// Large constant (2 bytes)
    LargeConstant,
    /// Small constant (1 byte)
    SmallConstant,
    /// Variable number
    Variable,
    /// Omitted (not present)
    Omitted,
}

impl OperandType {
    /// Parse operand type from 2-bit value
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => OperandType::LargeConstant,
            0b01 => OperandType::SmallConstant,
            0b10 => OperandType::Variable,
            _ => OperandType::Omitted,
        }
    }

    /// Size in bytes of an operand of this type
    pub fn size(&self) -> u32 {
        match self {
            OperandType::LargeConstant => 2,
            OperandType::SmallConstant => 1,
            OperandType::Variable => 1,
            OperandType::Omitted => 0,
        }
    }
}

/// Instruction forms (v3 has no extended form)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstructionForm {
    Long,
    Short,
    Variable,
}

/// Operand count categories
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandCount {
    OP0,
    OP1,
    OP2,
    VAR,
}

/// An instruction's opcode and operands as they appear in the story.
///
/// Decoding stops after the operands. Store and branch bytes belong to the
/// handlers, which read them from the pc while they execute.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Address of the opcode byte
    pub address: u32,
    /// Opcode number within its class
    pub opcode: u8,
    pub form: InstructionForm,
    pub operand_count: OperandCount,
    pub operand_types: Vec<OperandType>,
    /// Operand values as encoded; variable operands hold the variable number
    pub operands: Vec<u16>,
    /// Bytes consumed: opcode, type byte and operands
    pub size: u32,
}

impl Instruction {
    /// Decode the instruction under `cursor` and leave the cursor after its operands
    pub fn decode<M: Deref<Target = Memory>>(cursor: &mut Cursor<M>) -> Result<Instruction> {
        let address = cursor.position();
        let opcode_byte = cursor.read_byte()?;

        let form = match opcode_byte >> 6 {
            0b11 => InstructionForm::Variable,
            0b10 => InstructionForm::Short,
            _ => InstructionForm::Long,
        };

        let (opcode, operand_count, operand_types) = match form {
            InstructionForm::Long => {
                let kind = |bit: u8| {
                    if opcode_byte & bit != 0 {
                        OperandType::Variable
                    } else {
                        OperandType::SmallConstant
                    }
                };
                (
                    opcode_byte & 0x1F,
                    OperandCount::OP2,
                    vec![kind(0x40), kind(0x20)],
                )
            }
            InstructionForm::Short => {
                let kind = OperandType::from_bits(opcode_byte >> 4);
                if kind == OperandType::Omitted {
                    (opcode_byte & 0x0F, OperandCount::OP0, vec![])
                } else {
                    (opcode_byte & 0x0F, OperandCount::OP1, vec![kind])
                }
            }
            InstructionForm::Variable => {
                let count = if opcode_byte & 0x20 == 0 {
                    OperandCount::OP2
                } else {
                    OperandCount::VAR
                };
                let types_byte = cursor.read_byte()?;
                let types = (0..4)
                    .map(|i| OperandType::from_bits(types_byte >> (6 - 2 * i)))
                    .take_while(|t| *t != OperandType::Omitted)
                    .collect();
                (opcode_byte & 0x1F, count, types)
            }
        };

        let mut operands = Vec::with_capacity(operand_types.len());
        for kind in &operand_types {
            let value = match kind {
                OperandType::LargeConstant => cursor.read_word()?,
                _ => cursor.read_byte()? as u16,
            };
            operands.push(value);
        }

        let instruction = Instruction {
            address,
            opcode,
            form,
            operand_count,
            operand_types,
            operands,
            size: cursor.position() - address,
        };
        trace!("{}", instruction);
        Ok(instruction)
    }

    pub fn name(&self) -> &'static str {
        opcode_tables::name(self.operand_count, self.opcode)
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(f, "{:05x}: {}", self.address, self.name())?;
        for (kind, value) in self.operand_types.iter().zip(&self.operands) {
            match kind {
                OperandType::Variable if *value == 0 => write!(f, " (SP)")?,
                OperandType::Variable if *value < 16 => write!(f, " L{:02x}", value - 1)?,
                OperandType::Variable => write!(f, " G{:02x}", value - 16)?,
                _ => write!(f, " #{:04x}", value)?,
            }
        }
        Ok(())
    }
}
