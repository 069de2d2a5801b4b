/// Stack, routine call and session control operations
///
/// - Routine calls and returns (call, ret, rtrue, rfalse, ret_popped)
/// - Evaluation stack manipulation (push, pull, pop)
/// - Unconditional jump
/// - Session control (quit, restart, verify, and the save/restore stubs)
use log::{debug, info};

use crate::config::StackSemantics;
use crate::error::{Result, ZError};
use crate::header::HEADER_SIZE;
use crate::interpreter::{Interpreter, OutputStreams};
use crate::memory::unpack;
use crate::routine::{CallStack, Routine};

impl Interpreter {
    // ---- CALL / RETURN ----

    /// Call the routine at the packed address in operand 0 with the rest as
    /// arguments. Calling address 0 stores false without making a frame.
    pub fn op_call(&mut self, operands: &[u16]) -> Result<()> {
        let (&packed, args) = operands.split_first().ok_or(ZError::OperandCount {
            name: "call",
            expected: "1 to 4",
            got: 0,
        })?;
        if packed == 0 {
            debug!("call 0 -> false");
            return self.store_return(0);
        }

        // The frame's return address is the call's store byte
        let mut cursor = self.memory.cursor(unpack(packed));
        let mut frame = Routine::new(&mut cursor, self.pc)?;
        frame.apply_arguments(args);
        debug!(
            "call {:#06x} {:04x?} -> locals {:04x?}",
            frame.address,
            args,
            frame.locals()
        );
        self.pc = cursor.position();
        self.stack.push(frame);
        Ok(())
    }

    pub fn op_ret(&mut self, value: u16) -> Result<()> {
        debug!("ret {:04x}", value);
        self.return_with(value)
    }

    pub fn op_rtrue(&mut self) -> Result<()> {
        debug!("rtrue");
        self.return_with(1)
    }

    pub fn op_rfalse(&mut self) -> Result<()> {
        debug!("rfalse");
        self.return_with(0)
    }

    pub fn op_ret_popped(&mut self) -> Result<()> {
        let value = self.stack.top_mut()?.pop()?;
        debug!("ret_popped {:04x}", value);
        self.return_with(value)
    }

    // ---- STACK ----

    pub fn op_push(&mut self, operands: &[u16]) -> Result<()> {
        let &[value] = operands else {
            return Err(ZError::OperandCount {
                name: "push",
                expected: "1",
                got: operands.len(),
            });
        };
        debug!("push {:04x}", value);
        self.stack.top_mut()?.push(value);
        Ok(())
    }

    /// Pop the stack into the variable named by operand 0. Legacy stack
    /// semantics drop the value instead.
    pub fn op_pull(&mut self, operands: &[u16]) -> Result<()> {
        let &[var] = operands else {
            return Err(ZError::OperandCount {
                name: "pull",
                expected: "1",
                got: operands.len(),
            });
        };
        let value = self.stack.top_mut()?.pop()?;
        match self.config.stack_semantics {
            StackSemantics::Standard => {
                debug!("pull {:02x} = {:04x}", var, value);
                self.write_indirect(var as u8, value)
            }
            StackSemantics::Legacy => {
                debug!("pull (discarding {:04x})", value);
                Ok(())
            }
        }
    }

    pub fn op_pop(&mut self) -> Result<()> {
        let value = self.stack.top_mut()?.pop()?;
        debug!("pop {:04x}", value);
        Ok(())
    }

    // ---- JUMP ----

    pub fn op_jump(&mut self, offset: u16) -> Result<()> {
        debug!("jump {}", offset as i16);
        self.jump_relative(offset as i16)
    }

    pub fn op_nop(&mut self) -> Result<()> {
        Ok(())
    }

    // ---- SESSION ----

    pub fn op_quit(&mut self) -> Result<()> {
        info!("quit");
        self.set_quitted();
        Ok(())
    }

    /// Reload dynamic memory from the story file and start over
    pub fn op_restart(&mut self) -> Result<()> {
        info!("restart");
        let dynamic = (self.header.base_static_mem as usize).clamp(HEADER_SIZE, self.original.len());
        self.memory.restore_prefix(&self.original[..dynamic])?;
        self.pc = self.header.initial_pc as u32;
        self.stack = CallStack::new(Routine::main(self.pc));
        self.streams = OutputStreams::default();
        Ok(())
    }

    /// Branch if the story file checksum matches the header
    pub fn op_verify(&mut self) -> Result<()> {
        let end = match self.header.len_file {
            0 => self.original.len(),
            len => len.min(self.original.len()),
        };
        let sum = self
            .original
            .get(HEADER_SIZE..end)
            .unwrap_or_default()
            .iter()
            .fold(0u16, |acc, b| acc.wrapping_add(*b as u16));
        debug!(
            "verify: checksum {:04x}, header {:04x}",
            sum, self.header.checksum_file
        );
        self.branch(sum == self.header.checksum_file)
    }

    /// Saving is not supported; the story sees a failed save
    pub fn op_save(&mut self) -> Result<()> {
        info!("save requested, not supported");
        self.branch(false)
    }

    pub fn op_restore(&mut self) -> Result<()> {
        info!("restore requested, not supported");
        self.branch(false)
    }
}
