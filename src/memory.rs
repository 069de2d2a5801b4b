//! Story memory and the sequential cursor used to walk it
//!
//! `Memory` owns the whole story image. Everything that reads the image
//! sequentially (instruction fetch, routine headers, Z-strings) does so through
//! a `Cursor`, a position that borrows the memory instead of copying it.
//!
//! All multi-byte values are big-endian. Any access that would run past the end
//! of the image is an `OutOfBounds` error rather than a wrap or a panic.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::{Result, ZError};

/// Byte address of a v3 packed routine or string address
pub fn unpack(packed: u16) -> u32 {
    packed as u32 * 2
}

/// True when `address` could have come from `unpack`
pub fn is_packed(address: u32) -> bool {
    address % 2 == 0
}

pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(bytes: Vec<u8>) -> Self {
        Memory { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn check(&self, address: u32, width: u32) -> Result<usize> {
        if address as u64 + width as u64 > self.bytes.len() as u64 {
            return Err(ZError::OutOfBounds {
                address,
                width,
                len: self.bytes.len(),
            });
        }
        Ok(address as usize)
    }

    pub fn byte_at(&self, address: u32) -> Result<u8> {
        let i = self.check(address, 1)?;
        Ok(self.bytes[i])
    }

    pub fn word_at(&self, address: u32) -> Result<u16> {
        let i = self.check(address, 2)?;
        Ok(u16::from_be_bytes([self.bytes[i], self.bytes[i + 1]]))
    }

    pub fn u32_at(&self, address: u32) -> Result<u32> {
        let i = self.check(address, 4)?;
        Ok(u32::from_be_bytes([
            self.bytes[i],
            self.bytes[i + 1],
            self.bytes[i + 2],
            self.bytes[i + 3],
        ]))
    }

    pub fn write_byte_at(&mut self, address: u32, value: u8) -> Result<()> {
        let i = self.check(address, 1)?;
        self.bytes[i] = value;
        Ok(())
    }

    pub fn write_word_at(&mut self, address: u32, value: u16) -> Result<()> {
        let i = self.check(address, 2)?;
        self.bytes[i..i + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Borrow `len` bytes starting at `address`
    pub fn slice(&self, address: u32, len: u32) -> Result<&[u8]> {
        let i = self.check(address, len)?;
        Ok(&self.bytes[i..i + len as usize])
    }

    pub fn slice_mut(&mut self, address: u32, len: u32) -> Result<&mut [u8]> {
        let i = self.check(address, len)?;
        Ok(&mut self.bytes[i..i + len as usize])
    }

    /// Overwrite the start of memory with `image` (used by restart)
    pub fn restore_prefix(&mut self, image: &[u8]) -> Result<()> {
        self.slice_mut(0, image.len() as u32)?.copy_from_slice(image);
        Ok(())
    }

    pub fn cursor(&self, address: u32) -> Cursor<&Memory> {
        Cursor {
            memory: self,
            pos: address,
        }
    }

    pub fn cursor_mut(&mut self, address: u32) -> Cursor<&mut Memory> {
        Cursor {
            memory: self,
            pos: address,
        }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memory({:#06x} bytes)", self.bytes.len())
    }
}

/// A position inside a `Memory`. Reads and writes advance the position by the
/// access width; peeks leave it alone.
pub struct Cursor<M> {
    memory: M,
    pos: u32,
}

impl<M: Deref<Target = Memory>> Cursor<M> {
    pub fn position(&self) -> u32 {
        self.pos
    }

    pub fn set_position(&mut self, pos: u32) {
        self.pos = pos;
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn peek_byte(&self) -> Result<u8> {
        self.memory.byte_at(self.pos)
    }

    pub fn peek_word(&self) -> Result<u16> {
        self.memory.word_at(self.pos)
    }

    pub fn peek_u32(&self) -> Result<u32> {
        self.memory.u32_at(self.pos)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let value = self.memory.byte_at(self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    pub fn read_word(&mut self) -> Result<u16> {
        let value = self.memory.word_at(self.pos)?;
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.memory.u32_at(self.pos)?;
        self.pos += 4;
        Ok(value)
    }
}

impl<M: DerefMut<Target = Memory>> Cursor<M> {
    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.memory.write_byte_at(self.pos, value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_word(&mut self, value: u16) -> Result<()> {
        self.memory.write_word_at(self.pos, value)?;
        self.pos += 2;
        Ok(())
    }
}
