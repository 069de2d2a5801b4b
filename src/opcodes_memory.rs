/// Memory operations
///
/// - Variable operations (load, store) where the operand names the variable
/// - Word operations (loadw, storew) at base + 2 * index
/// - Byte operations (loadb, storeb) at base + index
use log::debug;

use crate::error::{Result, ZError};
use crate::interpreter::Interpreter;

fn operand_count(name: &'static str, expected: &'static str, got: usize) -> ZError {
    ZError::OperandCount {
        name,
        expected,
        got,
    }
}

impl Interpreter {
    pub fn op_load(&mut self, var: u16) -> Result<()> {
        let value = self.read_indirect(var as u8)?;
        debug!("load {:02x} = {:04x}", var, value);
        self.store_return(value)
    }

    pub fn op_store(&mut self, var: u16, value: u16) -> Result<()> {
        debug!("store {:02x} = {:04x}", var, value);
        self.write_indirect(var as u8, value)
    }

    pub fn op_loadw(&mut self, base: u16, index: u16) -> Result<()> {
        let addr = base.wrapping_add(index.wrapping_mul(2)) as u32;
        let value = self.memory.word_at(addr)?;
        debug!("loadw {:04x}[{}] = {:04x}", base, index, value);
        self.store_return(value)
    }

    pub fn op_loadb(&mut self, base: u16, index: u16) -> Result<()> {
        let addr = base.wrapping_add(index) as u32;
        let value = self.memory.byte_at(addr)?;
        debug!("loadb {:04x}[{}] = {:02x}", base, index, value);
        self.store_return(value as u16)
    }

    pub fn op_storew(&mut self, operands: &[u16]) -> Result<()> {
        let &[base, index, value] = operands else {
            return Err(operand_count("storew", "3", operands.len()));
        };
        let addr = base.wrapping_add(index.wrapping_mul(2)) as u32;
        debug!("storew {:04x}[{}] = {:04x}", base, index, value);
        self.memory.write_word_at(addr, value)
    }

    pub fn op_storeb(&mut self, operands: &[u16]) -> Result<()> {
        let &[base, index, value] = operands else {
            return Err(operand_count("storeb", "3", operands.len()));
        };
        let addr = base.wrapping_add(index) as u32;
        debug!("storeb {:04x}[{}] = {:02x}", base, index, value as u8);
        self.memory.write_byte_at(addr, value as u8)
    }
}
