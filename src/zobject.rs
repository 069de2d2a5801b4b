/// Z-Machine object table for version 3
///
/// V3 object format:
/// - 31 default property words
/// - 9-byte object entries: 4 attribute bytes, parent, sibling, child, property table address
/// - 32 attributes, attribute 0 is the top bit of the first byte
/// - Property numbers 1-31, stored in descending order, 1 to 8 bytes each
///
/// `ObjectTable` holds no bytes of its own; every operation reads or writes
/// the story memory it is handed.
use std::fmt::{Display, Error, Formatter};

use bitvec::prelude::*;
use log::{debug, warn};

use crate::error::{Result, ZError};
use crate::header::Header;
use crate::memory::Memory;
use crate::text;

pub const MAX_OBJECTS_V3: u16 = 255;
pub const MAX_ATTRIBUTES_V3: u16 = 31;
pub const MAX_PROPERTIES_V3: u16 = 31;
pub const OBJECT_ENTRY_SIZE_V3: u32 = 9;

const PARENT: u32 = 4;
const SIBLING: u32 = 5;
const CHILD: u32 = 6;
const PROPERTIES: u32 = 7;

/// An object's short name, cached at startup for `print_obj`
#[derive(Debug, Clone, PartialEq)]
pub struct ZObject {
    pub number: u16,
    pub name: String,
}

impl Display for ZObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(f, "{:3}: \"{}\"", self.number, self.name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectTable {
    defaults: u32,
    entries: u32,
    count: u16,
}

impl ObjectTable {
    /// Locate the table and count its objects. The entries end where the
    /// first property table begins, so the count is found by walking entries
    /// until the walk reaches the lowest property table address seen so far.
    pub fn new(memory: &Memory, header: &Header) -> Result<ObjectTable> {
        let defaults = header.object_table_addr as u32;
        let entries = defaults + MAX_PROPERTIES_V3 as u32 * 2;

        let mut lowest_props = u32::MAX;
        let mut count = 0u16;
        while count < MAX_OBJECTS_V3 {
            let entry = entries + count as u32 * OBJECT_ENTRY_SIZE_V3;
            if entry >= lowest_props || entry + OBJECT_ENTRY_SIZE_V3 > memory.len() as u32 {
                break;
            }
            let props = memory.word_at(entry + PROPERTIES)? as u32;
            lowest_props = lowest_props.min(props);
            count += 1;
        }
        debug!("object table at {:#06x}: {} objects", defaults, count);

        Ok(ObjectTable {
            defaults,
            entries,
            count,
        })
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    fn entry(&self, obj: u16) -> Result<u32> {
        if obj == 0 || obj > self.count {
            return Err(ZError::InvalidObject(obj));
        }
        Ok(self.entries + (obj as u32 - 1) * OBJECT_ENTRY_SIZE_V3)
    }

    fn link(&self, memory: &Memory, obj: u16, field: u32) -> Result<u16> {
        Ok(memory.byte_at(self.entry(obj)? + field)? as u16)
    }

    fn set_link(&self, memory: &mut Memory, obj: u16, field: u32, value: u16) -> Result<()> {
        if value > MAX_OBJECTS_V3 {
            return Err(ZError::InvalidObject(value));
        }
        memory.write_byte_at(self.entry(obj)? + field, value as u8)
    }

    pub fn parent(&self, memory: &Memory, obj: u16) -> Result<u16> {
        self.link(memory, obj, PARENT)
    }

    pub fn sibling(&self, memory: &Memory, obj: u16) -> Result<u16> {
        self.link(memory, obj, SIBLING)
    }

    pub fn child(&self, memory: &Memory, obj: u16) -> Result<u16> {
        self.link(memory, obj, CHILD)
    }

    pub fn set_parent(&self, memory: &mut Memory, obj: u16, parent: u16) -> Result<()> {
        self.set_link(memory, obj, PARENT, parent)
    }

    pub fn set_sibling(&self, memory: &mut Memory, obj: u16, sibling: u16) -> Result<()> {
        self.set_link(memory, obj, SIBLING, sibling)
    }

    pub fn set_child(&self, memory: &mut Memory, obj: u16, child: u16) -> Result<()> {
        self.set_link(memory, obj, CHILD, child)
    }

    pub fn attribute(&self, memory: &Memory, obj: u16, attr: u16) -> Result<bool> {
        if attr > MAX_ATTRIBUTES_V3 {
            warn!("attribute {} out of range for object {}", attr, obj);
            return Ok(false);
        }
        let bytes = memory.slice(self.entry(obj)?, 4)?;
        Ok(bytes.view_bits::<Msb0>()[attr as usize])
    }

    pub fn set_attribute(&self, memory: &mut Memory, obj: u16, attr: u16, on: bool) -> Result<()> {
        if attr > MAX_ATTRIBUTES_V3 {
            warn!("attribute {} out of range for object {}", attr, obj);
            return Ok(());
        }
        let entry = self.entry(obj)?;
        let bytes = memory.slice_mut(entry, 4)?;
        bytes.view_bits_mut::<Msb0>().set(attr as usize, on);
        Ok(())
    }

    /// Detach `obj` from its parent, keeping the parent's other children linked
    pub fn remove(&self, memory: &mut Memory, obj: u16) -> Result<()> {
        let parent = self.parent(memory, obj)?;
        if parent == 0 {
            return Ok(());
        }
        let next = self.sibling(memory, obj)?;
        let first = self.child(memory, parent)?;
        if first == obj {
            self.set_child(memory, parent, next)?;
        } else {
            let mut prev = first;
            let mut guard = 0;
            while prev != 0 && guard <= self.count {
                let sibling = self.sibling(memory, prev)?;
                if sibling == obj {
                    self.set_sibling(memory, prev, next)?;
                    break;
                }
                prev = sibling;
                guard += 1;
            }
        }
        self.set_parent(memory, obj, 0)?;
        self.set_sibling(memory, obj, 0)
    }

    /// Make `obj` the first child of `dest`
    pub fn insert(&self, memory: &mut Memory, obj: u16, dest: u16) -> Result<()> {
        self.entry(dest)?;
        self.remove(memory, obj)?;
        let first = self.child(memory, dest)?;
        self.set_sibling(memory, obj, first)?;
        self.set_parent(memory, obj, dest)?;
        self.set_child(memory, dest, obj)
    }

    fn property_table(&self, memory: &Memory, obj: u16) -> Result<u32> {
        Ok(memory.word_at(self.entry(obj)? + PROPERTIES)? as u32)
    }

    pub fn short_name(&self, memory: &Memory, header: &Header, obj: u16) -> Result<String> {
        let table = self.property_table(memory, obj)?;
        if memory.byte_at(table)? == 0 {
            return Ok(String::new());
        }
        text::decode_at(memory, table + 1, header)
    }

    /// Address of the first property's size byte
    fn first_property(&self, memory: &Memory, obj: u16) -> Result<u32> {
        let table = self.property_table(memory, obj)?;
        let name_words = memory.byte_at(table)? as u32;
        Ok(table + 1 + name_words * 2)
    }

    /// Find property `prop` of `obj`: (data address, data length)
    fn find_property(&self, memory: &Memory, obj: u16, prop: u16) -> Result<Option<(u32, u16)>> {
        let mut addr = self.first_property(memory, obj)?;
        loop {
            let size_byte = memory.byte_at(addr)?;
            let number = (size_byte & 0x1F) as u16;
            if size_byte == 0 || number < prop {
                return Ok(None);
            }
            let len = (size_byte >> 5) as u16 + 1;
            if number == prop {
                return Ok(Some((addr + 1, len)));
            }
            addr += 1 + len as u32;
        }
    }

    pub fn property(&self, memory: &Memory, obj: u16, prop: u16) -> Result<u16> {
        if prop == 0 || prop > MAX_PROPERTIES_V3 {
            return Err(ZError::InvalidProperty(format!("property {prop} on object {obj}")));
        }
        match self.find_property(memory, obj, prop)? {
            Some((addr, 1)) => Ok(memory.byte_at(addr)? as u16),
            Some((addr, 2)) => memory.word_at(addr),
            Some((_, len)) => Err(ZError::InvalidProperty(format!(
                "get_prop on property {prop} of object {obj} with length {len}"
            ))),
            None => memory.word_at(self.defaults + (prop as u32 - 1) * 2),
        }
    }

    pub fn put_property(&self, memory: &mut Memory, obj: u16, prop: u16, value: u16) -> Result<()> {
        match self.find_property(memory, obj, prop)? {
            Some((addr, 1)) => memory.write_byte_at(addr, value as u8),
            Some((addr, 2)) => memory.write_word_at(addr, value),
            Some((_, len)) => Err(ZError::InvalidProperty(format!(
                "put_prop on property {prop} of object {obj} with length {len}"
            ))),
            None => Err(ZError::MissingProperty {
                object: obj,
                property: prop,
            }),
        }
    }

    /// Data address of a property, 0 if the object doesn't have it
    pub fn property_address(&self, memory: &Memory, obj: u16, prop: u16) -> Result<u16> {
        Ok(self
            .find_property(memory, obj, prop)?
            .map_or(0, |(addr, _)| addr as u16))
    }

    /// Length of the property whose data starts at `data_addr`; 0 for address 0
    pub fn property_len(memory: &Memory, data_addr: u16) -> Result<u16> {
        if data_addr == 0 {
            return Ok(0);
        }
        let size_byte = memory.byte_at(data_addr as u32 - 1)?;
        Ok((size_byte >> 5) as u16 + 1)
    }

    /// Property after `prop` (or the first when `prop` is 0), 0 at the end of the list
    pub fn next_property(&self, memory: &Memory, obj: u16, prop: u16) -> Result<u16> {
        let addr = if prop == 0 {
            self.first_property(memory, obj)?
        } else {
            match self.find_property(memory, obj, prop)? {
                Some((data, len)) => data + len as u32,
                None => {
                    return Err(ZError::MissingProperty {
                        object: obj,
                        property: prop,
                    })
                }
            }
        };
        Ok((memory.byte_at(addr)? & 0x1F) as u16)
    }

    /// Short names of every object, indexed by object number - 1
    pub fn name_cache(&self, memory: &Memory, header: &Header) -> Result<Vec<ZObject>> {
        (1..=self.count)
            .map(|number| {
                Ok(ZObject {
                    number,
                    name: self.short_name(memory, header, number)?,
                })
            })
            .collect()
    }
}
