/// Input/Output operations
///
/// - Line input (sread) with tokenisation through the dictionary
/// - Random numbers
/// - Output stream selection, including redirection into a memory table
/// - Input stream and sound effects, which v3 stories may issue but which
///   have no effect here
use log::{debug, warn};

use crate::error::{Result, ZError};
use crate::interpreter::Interpreter;
use crate::zrand::ZRand;

impl Interpreter {
    /// Read a line into the text buffer and tokenise it into the parse buffer
    pub fn op_sread(&mut self, operands: &[u16]) -> Result<()> {
        let &[text_buffer, parse_buffer, ..] = operands else {
            return Err(ZError::OperandCount {
                name: "sread",
                expected: "2",
                got: operands.len(),
            });
        };
        // v3 redraws the status line before every read
        self.op_show_status()?;

        let line = self.io.read_line()?.to_lowercase();
        let text = text_buffer as u32;
        let max = self.memory.byte_at(text)?.saturating_sub(1) as usize;
        let stored: String = line
            .chars()
            .map(|c| if (' '..='~').contains(&c) { c } else { '?' })
            .take(max)
            .collect();
        debug!("sread {:?} into {:04x}, parse {:04x}", stored, text, parse_buffer);

        let mut cursor = self.memory.cursor_mut(text + 1);
        for byte in stored.bytes() {
            cursor.write_byte(byte)?;
        }
        cursor.write_byte(0)?;

        self.dictionary
            .tokenise(&mut self.memory, &stored, parse_buffer as u32)
    }

    /// Positive range: uniform 1..=range. Negative: reseed predictably with
    /// |range|. Zero: reseed from entropy. Reseeding stores 0.
    pub fn op_random(&mut self, operands: &[u16]) -> Result<()> {
        let &[range, ..] = operands else {
            return Err(ZError::OperandCount {
                name: "random",
                expected: "1",
                got: operands.len(),
            });
        };
        let range = range as i16;
        let value = match range {
            r if r > 0 => self.rng.gen_range(r as u16),
            0 => {
                self.rng = ZRand::new_uniform();
                0
            }
            r => {
                self.rng = ZRand::new_predictable(r.unsigned_abs() as u64);
                0
            }
        };
        debug!("random {} = {}", range, value);
        self.store_return(value)
    }

    pub fn op_output_stream(&mut self, operands: &[u16]) -> Result<()> {
        let &[stream, ..] = operands else {
            return Err(ZError::OperandCount {
                name: "output_stream",
                expected: "1 or 2",
                got: operands.len(),
            });
        };
        let stream = stream as i16;
        debug!("output_stream {:?}", operands);
        match stream {
            1 => self.streams.screen = true,
            -1 => self.streams.screen = false,
            2 | -2 => debug!("transcript stream ignored"),
            3 => {
                let table = operands.get(1).copied().ok_or(ZError::OperandCount {
                    name: "output_stream",
                    expected: "2",
                    got: operands.len(),
                })? as u32;
                self.memory.write_word_at(table, 0)?;
                self.streams.tables.push(table);
            }
            -3 => {
                if let Some(table) = self.streams.tables.pop() {
                    debug!(
                        "closed stream 3 table {:04x} with {} bytes",
                        table,
                        self.memory.word_at(table)?
                    );
                } else {
                    warn!("output_stream -3 with no open table");
                }
            }
            0 => {}
            other => warn!("output_stream {} not supported", other),
        }
        Ok(())
    }

    pub fn op_input_stream(&mut self, operands: &[u16]) -> Result<()> {
        debug!("input_stream {:?} (ignored)", operands);
        Ok(())
    }

    pub fn op_sound_effect(&mut self, operands: &[u16]) -> Result<()> {
        debug!("sound_effect {:?} (ignored)", operands);
        Ok(())
    }
}
