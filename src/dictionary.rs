/// Dictionary lookup and input tokenisation for v3 story files
///
/// Layout: separator count, separator characters, entry length, entry count
/// (word), then the entries sorted by their encoded text. Each v3 entry starts
/// with the two encoded words (6 z-characters) followed by game data.
use std::cmp::Ordering;

use log::debug;

use crate::error::Result;
use crate::header::Header;
use crate::memory::Memory;
use crate::text;

/// Bytes per parse buffer entry: dictionary address, word length, text position
const PARSE_ENTRY_SIZE: u32 = 4;

#[derive(Debug, Clone)]
pub struct Dictionary {
    pub address: u32,
    pub separators: Vec<u8>,
    pub entry_length: u8,
    pub entry_count: u16,
    entries: u32,
}

/// One word found in the player's input
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// Offset of the word within the input line
    pub position: usize,
}

impl Dictionary {
    pub fn new(memory: &Memory, header: &Header) -> Result<Dictionary> {
        let address = header.dictionary as u32;
        let sep_count = memory.byte_at(address)?;
        let separators = memory.slice(address + 1, sep_count as u32)?.to_vec();
        let entry_start = address + 1 + sep_count as u32;
        let entry_length = memory.byte_at(entry_start)?;
        let entry_count = memory.word_at(entry_start + 1)?;
        debug!(
            "dictionary at {:#06x}: {} entries of {} bytes, separators {:?}",
            address,
            entry_count,
            entry_length,
            String::from_utf8_lossy(&separators)
        );

        Ok(Dictionary {
            address,
            separators,
            entry_length,
            entry_count,
            entries: entry_start + 3,
        })
    }

    /// Address of the entry for `word`, or 0 when it isn't in the dictionary
    pub fn lookup(&self, memory: &Memory, word: &str) -> Result<u16> {
        let key = text::encode(word);

        // Binary search (dictionary is sorted)
        let mut low = 0u32;
        let mut high = self.entry_count as u32;
        while low < high {
            let mid = (low + high) / 2;
            let addr = self.entries + mid * self.entry_length as u32;
            let entry = [memory.word_at(addr)?, memory.word_at(addr + 2)?];
            match key.cmp(&entry) {
                Ordering::Less => high = mid,
                Ordering::Greater => low = mid + 1,
                Ordering::Equal => {
                    debug!("dictionary: '{}' found at {:04x}", word, addr);
                    return Ok(addr as u16);
                }
            }
        }

        debug!("dictionary: '{}' not found", word);
        Ok(0)
    }

    /// Split a line into words. Spaces separate words; each separator
    /// character is a word of its own.
    pub fn split(&self, line: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;
        for (i, ch) in line.char_indices() {
            let is_separator = ch.is_ascii() && self.separators.contains(&(ch as u8));
            if ch == ' ' || is_separator {
                if let Some(s) = start.take() {
                    tokens.push(Token {
                        text: line[s..i].to_string(),
                        position: s,
                    });
                }
                if is_separator {
                    tokens.push(Token {
                        text: ch.to_string(),
                        position: i,
                    });
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            tokens.push(Token {
                text: line[s..].to_string(),
                position: s,
            });
        }
        tokens
    }

    /// Fill a parse buffer for `line`. Byte 0 of the buffer holds the maximum
    /// number of words, byte 1 receives the count, then one 4-byte entry per
    /// word. Positions are 1-based to account for the text buffer's length byte.
    pub fn tokenise(&self, memory: &mut Memory, line: &str, parse_buffer: u32) -> Result<()> {
        let max_words = memory.byte_at(parse_buffer)? as usize;
        let tokens = self.split(line);
        let count = tokens.len().min(max_words);

        memory.write_byte_at(parse_buffer + 1, count as u8)?;
        for (i, token) in tokens.iter().take(count).enumerate() {
            let entry = parse_buffer + 2 + i as u32 * PARSE_ENTRY_SIZE;
            let found = self.lookup(memory, &token.text)?;
            memory.write_word_at(entry, found)?;
            memory.write_byte_at(entry + 2, token.text.len() as u8)?;
            memory.write_byte_at(entry + 3, token.position as u8 + 1)?;
        }
        debug!("tokenised {:?} into {} words", line, count);
        Ok(())
    }
}
