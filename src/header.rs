use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::error::{Result, ZError};

pub const HEADER_SIZE: usize = 64;

pub struct Header {
    pub version: u8,
    pub flags1: u8,
    pub release: u16,
    pub serial: String,
    pub base_high_mem: u16,
    pub base_static_mem: u16,
    pub initial_pc: u16,
    pub abbrev_table: u16,
    pub len_file: usize,
    pub checksum_file: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub global_variables: u16,
}

fn word(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

impl Header {
    pub fn new(bytes: &[u8]) -> Result<Header> {
        if bytes.len() < HEADER_SIZE {
            return Err(ZError::Story(format!(
                "image is {} bytes, too small for a header",
                bytes.len()
            )));
        }
        if bytes[0] != 3 {
            return Err(ZError::UnsupportedVersion(bytes[0]));
        }

        Ok(Header {
            version: bytes[0],
            flags1: bytes[1],
            release: word(bytes, 2),
            serial: bytes[0x12..0x18].iter().map(|b| *b as char).collect(),
            base_high_mem: word(bytes, 4),
            base_static_mem: word(bytes, 0x0E),
            initial_pc: word(bytes, 6),
            abbrev_table: word(bytes, 0x18),
            len_file: word(bytes, 0x1A) as usize * 2,
            checksum_file: word(bytes, 0x1C),
            dictionary: word(bytes, 0x08),
            object_table_addr: word(bytes, 0x0A),
            global_variables: word(bytes, 0x0C),
        })
    }

    /// Status line shows hours:minutes instead of score/moves
    pub fn is_time_game(&self) -> bool {
        self.flags1 & 0x02 != 0
    }
}

/// Three lines, as printed by `grue3 --header`
impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        writeln!(
            f,
            "v{} release {} serial {} ({})",
            self.version,
            self.release,
            self.serial,
            if self.is_time_game() { "time" } else { "score" }
        )?;
        writeln!(
            f,
            "pc {:#06x} dictionary {:#06x} objects {:#06x} globals {:#06x} abbreviations {:#06x}",
            self.initial_pc,
            self.dictionary,
            self.object_table_addr,
            self.global_variables,
            self.abbrev_table
        )?;
        writeln!(
            f,
            "static {:#06x} high {:#06x} length {:#x} checksum {:#06x}",
            self.base_static_mem, self.base_high_mem, self.len_file, self.checksum_file
        )
    }
}
