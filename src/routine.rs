use std::fmt::{Display, Error, Formatter};
use std::ops::Deref;

use log::trace;

use crate::error::{Result, ZError};
use crate::memory::{is_packed, Cursor, Memory};

const MAX_LOCALS: u8 = 15;

/// A Routine frame: one activation of a routine on the call stack.
///
/// Locals and the evaluation stack share `values`: the first `num_locals`
/// entries are the local variables, everything past them is the stack. Stack
/// operations never reach into the locals prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    /// Byte address of the routine header
    pub address: u32,
    /// Where the caller resumes; it points at the call's store byte
    pub return_address: u32,
    num_locals: usize,
    values: Vec<u16>,
}

impl Routine {
    /// Read a routine header (locals count, then that many initial values)
    /// from `cursor`, leaving the cursor on the first instruction
    pub fn new<M: Deref<Target = Memory>>(cursor: &mut Cursor<M>, return_address: u32) -> Result<Routine> {
        let address = cursor.position();
        if !is_packed(address) {
            return Err(ZError::UnpackedRoutine(address));
        }

        let count = cursor.read_byte()?;
        if count > MAX_LOCALS {
            return Err(ZError::TooManyLocals { address, count });
        }

        let mut values = Vec::with_capacity(count as usize + 8);
        for _ in 0..count {
            values.push(cursor.read_word()?);
        }
        trace!("routine {:#06x}: {} locals {:?}", address, count, values);

        Ok(Routine {
            address,
            return_address,
            num_locals: count as usize,
            values,
        })
    }

    /// The bottom frame. v3 stories start at a bare instruction address, so the
    /// main frame has no locals and nowhere to return to.
    pub fn main(initial_pc: u32) -> Routine {
        Routine {
            address: initial_pc,
            return_address: 0,
            num_locals: 0,
            values: Vec::new(),
        }
    }

    /// Overwrite the first locals with call arguments; surplus arguments are dropped
    pub fn apply_arguments(&mut self, args: &[u16]) {
        for (slot, arg) in self.values[..self.num_locals].iter_mut().zip(args) {
            *slot = *arg;
        }
    }

    pub fn num_locals(&self) -> usize {
        self.num_locals
    }

    pub fn locals(&self) -> &[u16] {
        &self.values[..self.num_locals]
    }

    /// The evaluation stack, bottom first
    pub fn stack(&self) -> &[u16] {
        &self.values[self.num_locals..]
    }

    fn local_index(&self, var: u8) -> Result<usize> {
        match var {
            1..=15 if (var as usize) <= self.num_locals => Ok(var as usize - 1),
            _ => Err(ZError::LocalOutOfRange {
                var,
                count: self.num_locals,
            }),
        }
    }

    /// Local variable by variable number (1..=15)
    pub fn local(&self, var: u8) -> Result<u16> {
        Ok(self.values[self.local_index(var)?])
    }

    pub fn local_mut(&mut self, var: u8) -> Result<&mut u16> {
        let i = self.local_index(var)?;
        Ok(&mut self.values[i])
    }

    pub fn set_local(&mut self, var: u8, value: u16) -> Result<()> {
        *self.local_mut(var)? = value;
        Ok(())
    }

    pub fn push(&mut self, value: u16) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Result<u16> {
        if self.values.len() <= self.num_locals {
            return Err(ZError::StackUnderflow(self.address));
        }
        self.values.pop().ok_or(ZError::StackUnderflow(self.address))
    }

    pub fn peek(&self) -> Result<u16> {
        self.stack()
            .last()
            .copied()
            .ok_or(ZError::StackUnderflow(self.address))
    }

    pub fn peek_mut(&mut self) -> Result<&mut u16> {
        if self.values.len() <= self.num_locals {
            return Err(ZError::StackUnderflow(self.address));
        }
        self.values
            .last_mut()
            .ok_or(ZError::StackUnderflow(self.address))
    }
}

impl Display for Routine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(
            f,
            "routine {:#06x} (returns to {:#06x}) locals {:04x?} stack {:04x?}",
            self.address,
            self.return_address,
            self.locals(),
            self.stack()
        )
    }
}

/// Frames, innermost last. Never empty: the main frame can't be popped.
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<Routine>,
}

impl CallStack {
    pub fn new(main: Routine) -> CallStack {
        CallStack { frames: vec![main] }
    }

    pub fn push(&mut self, frame: Routine) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Result<Routine> {
        if self.frames.len() <= 1 {
            return Err(ZError::CallStackUnderflow);
        }
        self.frames.pop().ok_or(ZError::CallStackUnderflow)
    }

    pub fn top(&self) -> Result<&Routine> {
        self.frames.last().ok_or(ZError::CallStackUnderflow)
    }

    pub fn top_mut(&mut self) -> Result<&mut Routine> {
        self.frames.last_mut().ok_or(ZError::CallStackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the bottom (main) up
    pub fn iter(&self) -> std::slice::Iter<'_, Routine> {
        self.frames.iter()
    }
}
