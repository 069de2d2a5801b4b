//! Z-string codec for version 3 story files
//!
//! A Z-string is a run of big-endian words, each packing three 5-bit codes.
//! The top bit of a word marks the last word of the string. Codes 6..=31 index
//! one of three alphabet rows, 4 and 5 shift the next character into row 1 or
//! row 2, 1..=3 introduce an abbreviation and 0 is a space. Row 2 slot 0 starts
//! a 10-bit escape: the next two codes are the high and low halves of a ZSCII
//! value.

use std::ops::Deref;

use bitreader::BitReader;
use log::trace;

use crate::error::{Result, ZError};
use crate::header::Header;
use crate::memory::{Cursor, Memory};

/// The three alphabet rows (v3 only, no custom alphabet tables)
pub const ALPHABETS: [&[u8; 26]; 3] = [
    b"abcdefghijklmnopqrstuvwxyz",
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    b" \n0123456789.,!?_#'\"/\\-:()",
];

/// Number of words in an encoded dictionary word
pub const ENCODED_WORDS: usize = 2;

/// Codes that fit in `ENCODED_WORDS` words
pub const ENCODED_CODES: usize = ENCODED_WORDS * 3;

const PADDING: u8 = 0x05;

/// Abbreviations inside abbreviations are illegal; this bounds malformed stories
const MAX_ABBREVIATION_DEPTH: u8 = 3;

/// v3 shifts last one character; there is no shift lock, so every character
/// drops back to row 0
const LOCKED_ALPHABET: usize = 0;

/// What the previous code asked the decoder to do with the next one
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Nothing,
    Abbreviation(u8),
    EscapeHigh,
    EscapeLow(u16),
}

/// Split a Z-string word into its end marker and three codes
fn unpack_word(word: u16) -> Result<(bool, [u8; 3])> {
    let bytes = word.to_be_bytes();
    let mut reader = BitReader::new(&bytes);
    let malformed = |e: bitreader::BitReaderError| {
        ZError::Story(format!("malformed z-string word {word:04x}: {e}"))
    };
    let last = reader.read_u8(1).map_err(malformed)? == 1;
    let mut codes = [0u8; 3];
    for code in codes.iter_mut() {
        *code = reader.read_u8(5).map_err(malformed)?;
    }
    Ok((last, codes))
}

fn zscii_to_char(value: u16) -> char {
    match value {
        13 => '\n',
        32..=126 => value as u8 as char,
        _ => '?',
    }
}

/// Decode the Z-string under `cursor`, leaving the cursor just past its last word
pub fn decode<M: Deref<Target = Memory>>(cursor: &mut Cursor<M>, header: &Header) -> Result<String> {
    decode_with_depth(cursor, header.abbrev_table as u32, 0)
}

/// Decode the Z-string at a byte address
pub fn decode_at(memory: &Memory, address: u32, header: &Header) -> Result<String> {
    decode(&mut memory.cursor(address), header)
}

fn decode_with_depth<M: Deref<Target = Memory>>(
    cursor: &mut Cursor<M>,
    abbrev_table: u32,
    depth: u8,
) -> Result<String> {
    if depth > MAX_ABBREVIATION_DEPTH {
        return Err(ZError::AbbreviationDepth(cursor.position()));
    }

    let mut result = String::new();
    let mut alphabet = LOCKED_ALPHABET;
    let mut pending = Pending::Nothing;

    loop {
        let word = cursor.read_word()?;
        let (last, codes) = unpack_word(word)?;
        trace!("z-word {:04x} = {:?}, last={}", word, codes, last);

        for code in codes {
            match pending {
                Pending::Abbreviation(block) => {
                    pending = Pending::Nothing;
                    let entry = 32 * (block as u32 - 1) + code as u32;
                    let string_addr = cursor.memory().word_at(abbrev_table + entry * 2)? as u32 * 2;
                    let mut abbrev = cursor.memory().cursor(string_addr);
                    result.push_str(&decode_with_depth(&mut abbrev, abbrev_table, depth + 1)?);
                    alphabet = LOCKED_ALPHABET;
                }
                Pending::EscapeHigh => {
                    pending = Pending::EscapeLow((code as u16) << 5);
                }
                Pending::EscapeLow(high) => {
                    pending = Pending::Nothing;
                    result.push(zscii_to_char(high | code as u16));
                }
                Pending::Nothing => match code {
                    0 => result.push(' '),
                    1..=3 => pending = Pending::Abbreviation(code),
                    4 | 5 => alphabet = (code - 3) as usize,
                    _ => {
                        let index = (code - 6) as usize;
                        if alphabet == 2 && index == 0 {
                            pending = Pending::EscapeHigh;
                        } else {
                            result.push(ALPHABETS[alphabet][index] as char);
                        }
                        alphabet = LOCKED_ALPHABET;
                    }
                },
            }
        }

        if last {
            break;
        }
    }

    Ok(result)
}

/// Codes needed for one character of input
fn codes_for(ch: char, out: &mut Vec<u8>) {
    if ch == ' ' {
        out.push(0);
        return;
    }
    let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
    if let Some(i) = ALPHABETS[0].iter().position(|c| *c == byte) {
        out.push(i as u8 + 6);
        return;
    }
    out.push(5);
    match ALPHABETS[2].iter().skip(1).position(|c| *c == byte) {
        Some(i) => out.push(i as u8 + 7),
        None => out.extend_from_slice(&[6, byte >> 5, byte & 0x1F]),
    }
}

fn encode_codes(text: &str) -> Vec<u8> {
    let mut codes = Vec::with_capacity(ENCODED_CODES);
    for ch in text.to_lowercase().chars() {
        codes_for(ch, &mut codes);
    }
    codes
}

fn pack_codes(codes: &[u8]) -> [u16; ENCODED_WORDS] {
    let mut words = [0u16; ENCODED_WORDS];
    for (i, word) in words.iter_mut().enumerate() {
        for slot in 0..3 {
            let code = codes.get(i * 3 + slot).copied().unwrap_or(PADDING);
            *word |= (code as u16 & 0x1F) << (10 - 5 * slot);
        }
    }
    words[ENCODED_WORDS - 1] |= 0x8000;
    words
}

/// Encode `text` as a dictionary word, lower-casing it first. Codes past the
/// sixth are dropped, even when that splits a shift or escape sequence.
pub fn encode(text: &str) -> [u16; ENCODED_WORDS] {
    let codes = encode_codes(text);
    pack_codes(&codes[..codes.len().min(ENCODED_CODES)])
}

/// Like `encode`, but text that needs more than six codes is an error
pub fn try_encode(text: &str) -> Result<[u16; ENCODED_WORDS]> {
    let codes = encode_codes(text);
    if codes.len() > ENCODED_CODES {
        return Err(ZError::EncodeOverflow(text.to_string()));
    }
    Ok(pack_codes(&codes))
}
