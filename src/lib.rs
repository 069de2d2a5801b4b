pub mod config;
pub mod dictionary;
pub mod error;
pub mod header;
pub mod instruction;
pub mod interpreter;
pub mod io_device;
pub mod io_framed;
pub mod io_remote;
pub mod memory;
pub mod opcode_tables;
pub mod routine;
pub mod server;
pub mod text;
pub mod zobject;
pub mod zrand;

mod opcodes_display;
mod opcodes_io;
mod opcodes_math;
mod opcodes_memory;
mod opcodes_object;
mod opcodes_stack;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod test_utils;

#[cfg(test)]
mod call_tests;

/*
Memory map of the images built by test_utils::StoryBuilder
Dynamic	00000	header
        00040	abbreviation table
        00100	global variables
        002e0	property defaults, then objects
        ?????	object names and properties
Static	00800	dictionary
        01000	Z-code (initial pc)
        02000	end of file
*/
