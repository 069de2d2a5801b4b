//! Builds small version 3 story images for tests.
//!
//! The image is 8K with a fixed layout: abbreviations at 0x40, globals at
//! 0x100, the object table at 0x2e0, the dictionary at 0x800 and code from
//! 0x1000 (the initial pc). Instruction bytes are written by hand in the tests.
#![allow(dead_code)]

pub const STORY_SIZE: usize = 0x2000;
pub const ABBREVIATIONS: u16 = 0x40;
pub const GLOBALS: u16 = 0x100;
pub const OBJECTS: u16 = 0x2E0;
pub const DICTIONARY: u16 = 0x800;
pub const STATIC_BASE: u16 = 0x800;
pub const INITIAL_PC: u16 = 0x1000;

pub const SEPARATORS: &[u8] = b",.";
const DICT_ENTRY_LENGTH: u8 = 7;

const ROW2: &[u8] = b"\n0123456789.,!?_#'\"/\\-:()";

/// Z-string codes for `text`: a-z from row 0, space as code 0, row 2
/// punctuation after a shift, anything else through the 10-bit escape
fn zcodes(text: &str) -> Vec<u8> {
    let mut codes = Vec::new();
    for b in text.to_lowercase().bytes() {
        match b {
            b'a'..=b'z' => codes.push(b - b'a' + 6),
            b' ' => codes.push(0),
            _ => match ROW2.iter().position(|c| *c == b) {
                Some(i) => codes.extend_from_slice(&[5, i as u8 + 7]),
                None => codes.extend_from_slice(&[5, 6, b >> 5, b & 0x1F]),
            },
        }
    }
    codes
}

fn pack(codes: &[u8]) -> Vec<u16> {
    let mut words: Vec<u16> = codes
        .chunks(3)
        .map(|c| {
            let code = |i: usize| c.get(i).copied().unwrap_or(5) as u16;
            code(0) << 10 | code(1) << 5 | code(2)
        })
        .collect();
    if words.is_empty() {
        words.push(5 << 10 | 5 << 5 | 5);
    }
    if let Some(last) = words.last_mut() {
        *last |= 0x8000;
    }
    words
}

/// A complete Z-string
pub fn zstring(text: &str) -> Vec<u16> {
    pack(&zcodes(text))
}

/// Dictionary key: the first six codes in two words
pub fn dict_key(word: &str) -> [u16; 2] {
    let mut codes = zcodes(word);
    codes.resize(6, 5);
    let words = pack(&codes);
    [words[0], words[1]]
}

pub fn zstring_bytes(text: &str) -> Vec<u8> {
    zstring(text).iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Words in the prompt loop's dictionary
pub const LOOP_WORDS: [&str; 4] = ["look", "open", "mailbox", "quit"];

/// A story that prints "> ", reads a line and answers "ok" until the first
/// word is "quit", then prints "bye" and quits
pub fn prompt_loop_story() -> Vec<u8> {
    let mut code = vec![0xB2];
    code.extend(zstring_bytes("> "));
    // sread #600 #680
    code.extend([0xE4, 0x0F, 0x06, 0x00, 0x06, 0x80]);
    // loadw #680 #1 -> sp
    code.extend([0xCF, 0x1F, 0x06, 0x80, 0x01, 0x00]);
    // je sp "quit" ?(+9)
    let quit = StoryBuilder::entry_address(&LOOP_WORDS, "quit").to_be_bytes();
    code.extend([0xC1, 0x8F, 0x00, quit[0], quit[1], 0xC9]);
    // print "ok"; new_line; jump back to the prompt
    code.push(0xB2);
    code.extend(zstring_bytes("ok"));
    code.push(0xBB);
    let back = (-(code.len() as i16) - 1).to_be_bytes();
    code.extend([0x8C, back[0], back[1]]);
    // print "bye"; new_line; quit
    code.push(0xB2);
    code.extend(zstring_bytes("bye"));
    code.extend([0xBB, 0xBA]);

    StoryBuilder::new()
        .words(&LOOP_WORDS)
        .at(0x600, &[40])
        .at(0x680, &[4])
        .code(&code)
        .build()
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSpec {
    pub name: &'static str,
    pub parent: u8,
    pub sibling: u8,
    pub child: u8,
    pub attributes: [u8; 4],
    /// (property number, data); written in descending order
    pub properties: Vec<(u8, Vec<u8>)>,
}

pub struct StoryBuilder {
    bytes: Vec<u8>,
    objects: Vec<ObjectSpec>,
    words: Vec<String>,
}

impl Default for StoryBuilder {
    fn default() -> Self {
        StoryBuilder::new()
    }
}

impl StoryBuilder {
    pub fn new() -> StoryBuilder {
        StoryBuilder {
            bytes: vec![0; STORY_SIZE],
            objects: Vec::new(),
            words: Vec::new(),
        }
    }

    /// Raw bytes at an address
    pub fn at(mut self, addr: u16, data: &[u8]) -> StoryBuilder {
        let a = addr as usize;
        self.bytes[a..a + data.len()].copy_from_slice(data);
        self
    }

    pub fn word(self, addr: u16, value: u16) -> StoryBuilder {
        self.at(addr, &value.to_be_bytes())
    }

    /// Code at the initial pc
    pub fn code(self, code: &[u8]) -> StoryBuilder {
        self.at(INITIAL_PC, code)
    }

    /// A routine header (locals with their initial values) followed by code
    pub fn routine(self, addr: u16, locals: &[u16], code: &[u8]) -> StoryBuilder {
        let mut bytes = vec![locals.len() as u8];
        for l in locals {
            bytes.extend_from_slice(&l.to_be_bytes());
        }
        bytes.extend_from_slice(code);
        self.at(addr, &bytes)
    }

    /// Initial value of a global, by variable number (0x10 and up)
    pub fn global(self, var: u8, value: u16) -> StoryBuilder {
        self.word(GLOBALS + (var as u16 - 0x10) * 2, value)
    }

    /// Abbreviation table entry pointing at `text` stored at `addr`
    pub fn abbreviation(self, index: u16, addr: u16, text: &str) -> StoryBuilder {
        self.word(ABBREVIATIONS + index * 2, addr / 2)
            .at(addr, &zstring_bytes(text))
    }

    pub fn object(mut self, spec: ObjectSpec) -> StoryBuilder {
        self.objects.push(spec);
        self
    }

    pub fn words(mut self, words: &[&str]) -> StoryBuilder {
        self.words.extend(words.iter().map(|w| w.to_string()));
        self
    }

    /// Address of a word's dictionary entry once built
    pub fn entry_address(words: &[&str], word: &str) -> u16 {
        let mut keys: Vec<[u16; 2]> = words.iter().map(|w| dict_key(w)).collect();
        keys.sort();
        keys.dedup();
        let index = keys
            .iter()
            .position(|k| *k == dict_key(word))
            .unwrap_or(0) as u16;
        DICTIONARY + 1 + SEPARATORS.len() as u16 + 3 + index * DICT_ENTRY_LENGTH as u16
    }

    fn write_objects(&mut self) {
        if self.objects.is_empty() {
            self.objects.push(ObjectSpec {
                name: "thing",
                ..Default::default()
            });
        }
        let entries = OBJECTS as usize + 62;
        let mut props = entries + self.objects.len() * 9;
        for (i, obj) in self.objects.iter().enumerate() {
            let e = entries + i * 9;
            self.bytes[e..e + 4].copy_from_slice(&obj.attributes);
            self.bytes[e + 4] = obj.parent;
            self.bytes[e + 5] = obj.sibling;
            self.bytes[e + 6] = obj.child;
            self.bytes[e + 7..e + 9].copy_from_slice(&(props as u16).to_be_bytes());

            let name = if obj.name.is_empty() {
                Vec::new()
            } else {
                zstring_bytes(obj.name)
            };
            self.bytes[props] = (name.len() / 2) as u8;
            props += 1;
            self.bytes[props..props + name.len()].copy_from_slice(&name);
            props += name.len();

            let mut properties = obj.properties.clone();
            properties.sort_by(|a, b| b.0.cmp(&a.0));
            for (number, data) in properties {
                self.bytes[props] = ((data.len() as u8 - 1) << 5) | number;
                props += 1;
                self.bytes[props..props + data.len()].copy_from_slice(&data);
                props += data.len();
            }
            self.bytes[props] = 0;
            props += 1;
        }
        assert!(props < STATIC_BASE as usize, "object table overflows dynamic memory");
    }

    fn write_dictionary(&mut self) {
        let mut keys: Vec<[u16; 2]> = self.words.iter().map(|w| dict_key(w)).collect();
        keys.sort();
        keys.dedup();
        let mut d = DICTIONARY as usize;
        self.bytes[d] = SEPARATORS.len() as u8;
        d += 1;
        self.bytes[d..d + SEPARATORS.len()].copy_from_slice(SEPARATORS);
        d += SEPARATORS.len();
        self.bytes[d] = DICT_ENTRY_LENGTH;
        self.bytes[d + 1..d + 3].copy_from_slice(&(keys.len() as u16).to_be_bytes());
        d += 3;
        for key in keys {
            self.bytes[d..d + 2].copy_from_slice(&key[0].to_be_bytes());
            self.bytes[d + 2..d + 4].copy_from_slice(&key[1].to_be_bytes());
            d += DICT_ENTRY_LENGTH as usize;
        }
    }

    pub fn build(mut self) -> Vec<u8> {
        self.write_objects();
        self.write_dictionary();

        let header: &[(usize, u16)] = &[
            (0x02, 1),
            (0x04, INITIAL_PC),
            (0x06, INITIAL_PC),
            (0x08, DICTIONARY),
            (0x0A, OBJECTS),
            (0x0C, GLOBALS),
            (0x0E, STATIC_BASE),
            (0x18, ABBREVIATIONS),
            (0x1A, (STORY_SIZE / 2) as u16),
        ];
        self.bytes[0] = 3;
        for (offset, value) in header {
            self.bytes[*offset..*offset + 2].copy_from_slice(&value.to_be_bytes());
        }
        self.bytes[0x12..0x18].copy_from_slice(b"261016");

        let checksum = self.bytes[0x40..]
            .iter()
            .fold(0u16, |acc, b| acc.wrapping_add(*b as u16));
        self.bytes[0x1C..0x1E].copy_from_slice(&checksum.to_be_bytes());
        self.bytes
    }
}
