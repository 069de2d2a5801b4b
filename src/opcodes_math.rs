/// Arithmetic, bitwise and comparison operations
///
/// Values are 16-bit words. `add`, `sub` and `mul` wrap; `div` and `mod`
/// treat their operands as signed and truncate toward zero. Comparisons feed
/// their result to the branch protocol.
use log::debug;

use crate::error::{Result, ZError};
use crate::interpreter::Interpreter;

impl Interpreter {
    // ---- 2OP ARITHMETIC ----

    pub fn op_add(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("add {} {}", a as i16, b as i16);
        self.store_return(a.wrapping_add(b))
    }

    pub fn op_sub(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("sub {} {}", a as i16, b as i16);
        self.store_return(a.wrapping_sub(b))
    }

    pub fn op_mul(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("mul {} {}", a as i16, b as i16);
        self.store_return(a.wrapping_mul(b))
    }

    pub fn op_div(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("div {} {}", a as i16, b as i16);
        if b == 0 {
            return Err(ZError::DivisionByZero);
        }
        self.store_return((a as i16).wrapping_div(b as i16) as u16)
    }

    pub fn op_mod(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("mod {} {}", a as i16, b as i16);
        if b == 0 {
            return Err(ZError::ModuloByZero);
        }
        self.store_return((a as i16).wrapping_rem(b as i16) as u16)
    }

    // ---- BITWISE ----

    pub fn op_or(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("or {:04x} {:04x}", a, b);
        self.store_return(a | b)
    }

    pub fn op_and(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("and {:04x} {:04x}", a, b);
        self.store_return(a & b)
    }

    pub fn op_not(&mut self, a: u16) -> Result<()> {
        debug!("not {:04x}", a);
        self.store_return(!a)
    }

    /// Branch if every bit set in `flags` is set in `bitmap`
    pub fn op_test(&mut self, bitmap: u16, flags: u16) -> Result<()> {
        debug!("test {:04x} {:04x}", bitmap, flags);
        self.branch(bitmap & flags == flags)
    }

    // ---- COMPARISONS ----

    pub fn op_jz(&mut self, a: u16) -> Result<()> {
        debug!("jz {}", a);
        self.branch(a == 0)
    }

    /// Branch if the first operand equals any of the others
    pub fn op_je(&mut self, operands: &[u16]) -> Result<()> {
        debug!("je {:?}", operands);
        let (first, rest) = operands.split_first().ok_or(ZError::OperandCount {
            name: "je",
            expected: "1 to 4",
            got: 0,
        })?;
        self.branch(rest.contains(first))
    }

    pub fn op_jl(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("jl {} {}", a as i16, b as i16);
        self.branch((a as i16) < (b as i16))
    }

    pub fn op_jg(&mut self, a: u16, b: u16) -> Result<()> {
        debug!("jg {} {}", a as i16, b as i16);
        self.branch((a as i16) > (b as i16))
    }

    // ---- INCREMENT / DECREMENT ----
    //
    // The operand names the variable; it is updated in place.

    pub fn op_inc(&mut self, var: u16) -> Result<()> {
        debug!("inc {:02x}", var);
        self.update_variable(var as u8, 1).map(|_| ())
    }

    pub fn op_dec(&mut self, var: u16) -> Result<()> {
        debug!("dec {:02x}", var);
        self.update_variable(var as u8, -1).map(|_| ())
    }

    pub fn op_inc_chk(&mut self, var: u16, value: u16) -> Result<()> {
        let new = self.update_variable(var as u8, 1)?;
        debug!("inc_chk {:02x} -> {} > {}", var, new as i16, value as i16);
        self.branch((new as i16) > (value as i16))
    }

    pub fn op_dec_chk(&mut self, var: u16, value: u16) -> Result<()> {
        let new = self.update_variable(var as u8, -1)?;
        debug!("dec_chk {:02x} -> {} < {}", var, new as i16, value as i16);
        self.branch((new as i16) < (value as i16))
    }
}
