//! The fetch/decode/dispatch engine.
//!
//! The pc is a byte address into `memory`; every fetch borrows a short-lived
//! `Cursor` at the pc and writes the cursor's final position back. Handlers in
//! the `opcodes_*` modules read their own store and branch bytes through
//! `store_return` and `branch`, so after a handler runs the pc already points
//! at the next instruction.

use std::fmt::{self, Display, Formatter};

use log::{debug, info, trace, warn};

use crate::config::{InterpreterConfig, StackSemantics};
use crate::dictionary::Dictionary;
use crate::error::{Result, ZError};
use crate::header::Header;
use crate::instruction::{Instruction, OperandCount, OperandType};
use crate::io_device::ZIODevice;
use crate::memory::Memory;
use crate::opcode_tables::{self, JE, JE_OPCODE};
use crate::routine::{CallStack, Routine};
use crate::zobject::{ObjectTable, ZObject};
use crate::zrand::ZRand;

/// First global variable number
const FIRST_GLOBAL: u8 = 0x10;

/// Output streams the story can switch between
#[derive(Debug)]
pub(crate) struct OutputStreams {
    pub(crate) screen: bool,
    /// Active stream 3 tables, innermost last
    pub(crate) tables: Vec<u32>,
}

impl Default for OutputStreams {
    fn default() -> Self {
        OutputStreams {
            screen: true,
            tables: Vec::new(),
        }
    }
}

pub struct Interpreter {
    pub memory: Memory,
    pub header: Header,
    pub pc: u32,
    pub stack: CallStack,
    pub objects: ObjectTable,
    /// Short names of every object, for `print_obj`
    pub object_names: Vec<ZObject>,
    pub dictionary: Dictionary,
    pub(crate) io: Box<dyn ZIODevice>,
    pub(crate) rng: ZRand,
    pub(crate) config: InterpreterConfig,
    pub(crate) streams: OutputStreams,
    /// The story file as loaded, for `restart` and `verify`
    pub(crate) original: Vec<u8>,
    quitted: bool,
    instruction_count: u64,
}

impl Interpreter {
    /// Build an interpreter for the story image. Fails before any instruction
    /// runs if the header, object table or dictionary can't be read.
    pub fn new(bytes: Vec<u8>, io: Box<dyn ZIODevice>, config: InterpreterConfig) -> Result<Interpreter> {
        let header = Header::new(&bytes)?;
        let original = bytes.clone();
        let memory = Memory::new(bytes);
        let objects = ObjectTable::new(&memory, &header)?;
        let object_names = objects.name_cache(&memory, &header)?;
        let dictionary = Dictionary::new(&memory, &header)?;
        let rng = match config.random_seed {
            Some(seed) => ZRand::new_predictable(seed),
            None => ZRand::new_uniform(),
        };
        let pc = header.initial_pc as u32;
        info!(
            "loaded release {} serial {}: {} objects, start at {:#06x}, {:?} stack",
            header.release,
            header.serial,
            object_names.len(),
            pc,
            config.stack_semantics
        );

        Ok(Interpreter {
            memory,
            header,
            pc,
            stack: CallStack::new(Routine::main(pc)),
            objects,
            object_names,
            dictionary,
            io,
            rng,
            config,
            streams: OutputStreams::default(),
            original,
            quitted: false,
            instruction_count: 0,
        })
    }

    pub fn quitted(&self) -> bool {
        self.quitted
    }

    pub(crate) fn set_quitted(&mut self) {
        self.quitted = true;
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Next byte at the pc, advancing it
    pub fn next_byte(&mut self) -> Result<u8> {
        let mut cursor = self.memory.cursor(self.pc);
        let value = cursor.read_byte()?;
        self.pc = cursor.position();
        Ok(value)
    }

    fn global_address(&self, var: u8) -> u32 {
        self.header.global_variables as u32 + (var - FIRST_GLOBAL) as u32 * 2
    }

    /// Read a variable. Variable 0 pops the evaluation stack, or peeks at it
    /// with legacy stack semantics.
    pub fn read_variable(&mut self, var: u8) -> Result<u16> {
        let value = match var {
            0 => match self.config.stack_semantics {
                StackSemantics::Standard => self.stack.top_mut()?.pop()?,
                StackSemantics::Legacy => self.stack.top()?.peek()?,
            },
            1..=15 => self.stack.top()?.local(var)?,
            _ => self.memory.word_at(self.global_address(var))?,
        };
        trace!("read var {:02x} = {:04x}", var, value);
        Ok(value)
    }

    /// Write a variable. Variable 0 pushes onto the evaluation stack.
    pub fn write_variable(&mut self, var: u8, value: u16) -> Result<()> {
        trace!("write var {:02x} = {:04x}", var, value);
        match var {
            0 => {
                self.stack.top_mut()?.push(value);
                Ok(())
            }
            1..=15 => self.stack.top_mut()?.set_local(var, value),
            _ => {
                let addr = self.global_address(var);
                self.memory.write_word_at(addr, value)
            }
        }
    }

    /// Read a variable named by an operand (`load`, `inc_chk`, ...). The
    /// stack is looked at, never popped.
    pub fn read_indirect(&mut self, var: u8) -> Result<u16> {
        match var {
            0 => self.stack.top()?.peek(),
            _ => self.read_variable(var),
        }
    }

    /// Write a variable named by an operand (`store`, `pull`, ...). With
    /// standard stack semantics the stack top is replaced in place.
    pub fn write_indirect(&mut self, var: u8, value: u16) -> Result<()> {
        match (var, self.config.stack_semantics) {
            (0, StackSemantics::Standard) => {
                *self.stack.top_mut()?.peek_mut()? = value;
                Ok(())
            }
            _ => self.write_variable(var, value),
        }
    }

    /// Add a signed delta to a variable in place and return the new value
    pub fn update_variable(&mut self, var: u8, delta: i16) -> Result<u16> {
        if var == 0 {
            let slot = self.stack.top_mut()?.peek_mut()?;
            *slot = (*slot as i16).wrapping_add(delta) as u16;
            return Ok(*slot);
        }
        let value = (self.read_variable(var)? as i16).wrapping_add(delta) as u16;
        self.write_variable(var, value)?;
        Ok(value)
    }

    /// Store a result into the variable named by the next byte
    pub fn store_return(&mut self, value: u16) -> Result<()> {
        let var = self.next_byte()?;
        self.write_variable(var, value)
    }

    /// Consume a branch descriptor and take the branch if `condition` matches it
    pub fn branch(&mut self, condition: bool) -> Result<()> {
        let first = self.next_byte()?;
        let on_true = first & 0x80 != 0;
        let offset = if first & 0x40 != 0 {
            (first & 0x3F) as i16
        } else {
            let second = self.next_byte()?;
            let raw = ((first as u16 & 0x3F) << 8) | second as u16;
            // sign-extend 14 bits
            ((raw << 2) as i16) >> 2
        };

        if condition != on_true {
            return Ok(());
        }
        match offset {
            0 => self.return_with(0),
            1 => self.return_with(1),
            _ => {
                debug!("branch {} -> offset {}", condition, offset);
                self.jump_relative(offset)
            }
        }
    }

    /// Move the pc to pc + offset - 2, the target rule shared by branches and `jump`
    pub fn jump_relative(&mut self, offset: i16) -> Result<()> {
        let target = self.pc as i64 + offset as i64 - 2;
        if target < 0 || target >= self.memory.len() as i64 {
            return Err(ZError::OutOfBounds {
                address: target as u32,
                width: 1,
                len: self.memory.len(),
            });
        }
        trace!("jump {:05x} -> {:05x}", self.pc, target);
        self.pc = target as u32;
        Ok(())
    }

    /// Pop the current frame, resume the caller and store `value` through the
    /// store byte of the call
    pub fn return_with(&mut self, value: u16) -> Result<()> {
        let frame = self.stack.pop()?;
        debug!(
            "return {:04x} from {:#06x} to {:#06x}",
            value, frame.address, frame.return_address
        );
        self.pc = frame.return_address;
        self.store_return(value)
    }

    /// Resolve operand values; variable operands are read left to right
    pub fn resolve_operands(&mut self, inst: &Instruction) -> Result<Vec<u16>> {
        let mut values = Vec::with_capacity(inst.operands.len());
        for (kind, raw) in inst.operand_types.iter().zip(&inst.operands) {
            let value = match kind {
                OperandType::Variable => self.read_variable(*raw as u8)?,
                _ => *raw,
            };
            values.push(value);
        }
        Ok(values)
    }

    fn dispatch(&mut self, inst: &Instruction, operands: &[u16]) -> Result<()> {
        let illegal = || ZError::IllegalOpcode {
            class: inst.operand_count,
            opcode: inst.opcode,
            address: inst.address,
        };
        match inst.operand_count {
            OperandCount::OP0 => {
                let op = opcode_tables::zero_op(inst.opcode).ok_or_else(illegal)?;
                (op.handler)(self)
            }
            OperandCount::OP1 => {
                let op = opcode_tables::one_op(inst.opcode).ok_or_else(illegal)?;
                (op.handler)(self, operands[0])
            }
            OperandCount::OP2 if inst.opcode == JE_OPCODE => {
                if operands.is_empty() || operands.len() > 4 {
                    return Err(ZError::OperandCount {
                        name: JE.name,
                        expected: "1 to 4",
                        got: operands.len(),
                    });
                }
                (JE.handler)(self, operands)
            }
            OperandCount::OP2 => {
                let op = opcode_tables::two_op(inst.opcode).ok_or_else(illegal)?;
                match operands {
                    [a, b] => (op.handler)(self, *a, *b),
                    _ => Err(ZError::OperandCount {
                        name: op.name,
                        expected: "2",
                        got: operands.len(),
                    }),
                }
            }
            OperandCount::VAR => {
                let op = opcode_tables::var_op(inst.opcode).ok_or_else(illegal)?;
                (op.handler)(self, operands)
            }
        }
    }

    /// Execute one instruction
    pub fn interpret(&mut self) -> Result<()> {
        let mut cursor = self.memory.cursor(self.pc);
        let inst = Instruction::decode(&mut cursor)?;
        self.pc = cursor.position();
        let operands = self.resolve_operands(&inst)?;
        trace!("{} {:04x?}", inst, operands);
        self.dispatch(&inst, &operands)?;
        self.instruction_count += 1;
        Ok(())
    }

    /// Run until `quit` (or the configured instruction limit). The first error
    /// ends the run.
    pub fn interpret_all(&mut self) -> Result<()> {
        let limit = self.config.instruction_limit.filter(|l| *l > 0);
        while !self.quitted {
            if let Some(limit) = limit {
                if self.instruction_count >= limit {
                    warn!("stopping after {} instructions", limit);
                    break;
                }
            }
            self.interpret()?;
        }
        info!("finished after {} instructions", self.instruction_count);
        Ok(())
    }

    /// Send text to the active output stream. While a stream 3 table is
    /// open, text goes only to the table.
    pub fn output_text(&mut self, text: &str) -> Result<()> {
        if let Some(&table) = self.streams.tables.last() {
            let count = self.memory.word_at(table)?;
            let mut addr = table + 2 + count as u32;
            for ch in text.chars() {
                let zscii = match ch {
                    '\n' => 13,
                    c if c.is_ascii() => c as u8,
                    _ => b'?',
                };
                self.memory.write_byte_at(addr, zscii)?;
                addr += 1;
            }
            let written = (addr - table - 2) as u16;
            return self.memory.write_word_at(table, written);
        }
        if self.streams.screen {
            self.io.print(text)?;
        }
        Ok(())
    }

    /// One-line summary of where execution stopped, for fatal error reports
    pub fn state_dump(&self) -> String {
        self.to_string()
    }
}

impl Display for Interpreter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pc {:#06x}, {} frame(s), {} instruction(s) executed",
            self.pc,
            self.stack.len(),
            self.instruction_count
        )?;
        for (depth, frame) in self.stack.iter().enumerate().rev() {
            writeln!(f, "  #{} {}", depth, frame)?;
        }
        Ok(())
    }
}
