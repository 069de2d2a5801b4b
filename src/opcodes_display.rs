/// Text output operations
///
/// Every printing opcode ends up in `Interpreter::output_text`, which honours
/// output stream redirection before handing text to the I/O device.
use log::debug;

use crate::error::{Result, ZError};
use crate::interpreter::Interpreter;
use crate::memory::unpack;
use crate::text;

/// Global holding the current location object
const LOCATION_GLOBAL: u8 = 0x10;
const SCORE_GLOBAL: u8 = 0x11;
const MOVES_GLOBAL: u8 = 0x12;

impl Interpreter {
    /// Print the Z-string that follows the opcode
    pub fn op_print(&mut self) -> Result<()> {
        let mut cursor = self.memory.cursor(self.pc);
        let text = text::decode(&mut cursor, &self.header)?;
        self.pc = cursor.position();
        debug!("print {:?}", text);
        self.output_text(&text)
    }

    pub fn op_print_ret(&mut self) -> Result<()> {
        self.op_print()?;
        self.output_text("\n")?;
        self.return_with(1)
    }

    pub fn op_new_line(&mut self) -> Result<()> {
        self.output_text("\n")
    }

    pub fn op_print_addr(&mut self, addr: u16) -> Result<()> {
        let text = text::decode_at(&self.memory, addr as u32, &self.header)?;
        debug!("print_addr {:04x} {:?}", addr, text);
        self.output_text(&text)
    }

    pub fn op_print_paddr(&mut self, packed: u16) -> Result<()> {
        let text = text::decode_at(&self.memory, unpack(packed), &self.header)?;
        debug!("print_paddr {:04x} {:?}", packed, text);
        self.output_text(&text)
    }

    pub fn op_print_obj(&mut self, obj: u16) -> Result<()> {
        let name = obj
            .checked_sub(1)
            .and_then(|i| self.object_names.get(i as usize))
            .map(|o| o.name.clone())
            .ok_or(ZError::InvalidObject(obj))?;
        debug!("print_obj {} {:?}", obj, name);
        self.output_text(&name)
    }

    pub fn op_print_char(&mut self, operands: &[u16]) -> Result<()> {
        let &[zscii, ..] = operands else {
            return Err(ZError::OperandCount {
                name: "print_char",
                expected: "1",
                got: operands.len(),
            });
        };
        let ch = match zscii {
            13 => '\n',
            32..=126 => zscii as u8 as char,
            _ => '?',
        };
        self.output_text(&ch.to_string())
    }

    pub fn op_print_num(&mut self, operands: &[u16]) -> Result<()> {
        let &[value, ..] = operands else {
            return Err(ZError::OperandCount {
                name: "print_num",
                expected: "1",
                got: operands.len(),
            });
        };
        self.output_text(&(value as i16).to_string())
    }

    /// Show the v3 status line: location name on the left, score and moves
    /// (or the time) on the right
    pub fn op_show_status(&mut self) -> Result<()> {
        let location = self.read_variable(LOCATION_GLOBAL)?;
        let name = location
            .checked_sub(1)
            .and_then(|i| self.object_names.get(i as usize))
            .map(|o| o.name.clone())
            .unwrap_or_default();
        let first = self.read_variable(SCORE_GLOBAL)?;
        let second = self.read_variable(MOVES_GLOBAL)?;
        let right = if self.header.is_time_game() {
            format!("{}:{:02}", first, second)
        } else {
            format!("Score: {}  Moves: {}", first as i16, second)
        };
        debug!("show_status {:?} {:?}", name, right);
        self.io.show_status(&name, &right)
    }

    pub fn op_split_window(&mut self, operands: &[u16]) -> Result<()> {
        debug!("split_window {:?} (ignored)", operands);
        Ok(())
    }

    pub fn op_set_window(&mut self, operands: &[u16]) -> Result<()> {
        debug!("set_window {:?} (ignored)", operands);
        Ok(())
    }
}
