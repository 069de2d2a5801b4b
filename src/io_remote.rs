//! Interactive remote terminal session (telnet-style byte stream)
//!
//! Remote terminals expect CRLF line endings, so every LF written is sent as
//! CRLF. Input lines end at CR or LF. A line ending in CR is returned at once;
//! an LF or NUL right after it is dropped by the next read.

use std::io::{BufRead, BufReader, Read, Write};

use log::{debug, trace};

use crate::error::Result;
use crate::io_device::ZIODevice;

const MAX_LINE: usize = 1024;

pub struct RemoteTerminal<R, W> {
    reader: BufReader<R>,
    writer: W,
    /// The last line ended in CR
    after_cr: bool,
}

impl<R: Read, W: Write> RemoteTerminal<R, W> {
    pub fn new(reader: R, writer: W) -> RemoteTerminal<R, W> {
        RemoteTerminal {
            reader: BufReader::new(reader),
            writer,
            after_cr: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.reader.fill_buf()?.first().copied();
        if byte.is_some() {
            self.reader.consume(1);
        }
        Ok(byte)
    }
}

impl<R: Read, W: Write> ZIODevice for RemoteTerminal<R, W> {
    fn print(&mut self, text: &str) -> Result<()> {
        let translated = text.replace('\n', "\r\n");
        self.writer.write_all(translated.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        if std::mem::take(&mut self.after_cr) {
            let next = self.reader.fill_buf()?.first().copied();
            if matches!(next, Some(b'\n' | 0)) {
                self.reader.consume(1);
            }
        }
        loop {
            let byte = self.next_byte()?;
            match byte {
                None => {
                    debug!("remote: end of input");
                    break;
                }
                Some(b'\n') => break,
                Some(b'\r') => {
                    self.after_cr = true;
                    break;
                }
                Some(byte) if line.len() < MAX_LINE => line.push(byte),
                Some(_) => {}
            }
        }
        let line = String::from_utf8_lossy(&line).into_owned();
        trace!("remote: read {:?}", line);
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_log::test;

    fn terminal(input: &str) -> RemoteTerminal<Cursor<Vec<u8>>, Vec<u8>> {
        RemoteTerminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_output_translates_line_feeds() {
        let mut term = terminal("");
        term.print("West of House\nYou are standing").unwrap();
        term.print("\n>").unwrap();
        assert_eq!(term.writer(), b"West of House\r\nYou are standing\r\n>");
    }

    #[test]
    fn test_reads_lines_with_any_terminator() {
        let mut term = terminal("open mailbox\r\nread leaflet\nnorth\r\0west\rsouth");
        assert_eq!(term.read_line().unwrap(), "open mailbox");
        assert_eq!(term.read_line().unwrap(), "read leaflet");
        assert_eq!(term.read_line().unwrap(), "north");
        assert_eq!(term.read_line().unwrap(), "west");
        assert_eq!(term.read_line().unwrap(), "south");
    }

    /// Hands out one chunk per read, then reports that nothing more is ready
    struct Chunks(Vec<&'static [u8]>);

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.is_empty() {
                return Err(std::io::ErrorKind::WouldBlock.into());
            }
            let chunk = self.0.remove(0);
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_line_ending_in_cr_needs_no_more_input() {
        let mut term = RemoteTerminal::new(Chunks(vec![b"look\r"]), Vec::new());
        assert_eq!(term.read_line().unwrap(), "look");
    }

    #[test]
    fn test_crlf_split_across_reads() {
        let mut term = RemoteTerminal::new(Chunks(vec![b"look\r", b"\nquit\n"]), Vec::new());
        assert_eq!(term.read_line().unwrap(), "look");
        assert_eq!(term.read_line().unwrap(), "quit");
        assert!(term.read_line().is_err());
    }

    #[test]
    fn test_end_of_input_is_an_empty_line() {
        let mut term = terminal("");
        assert_eq!(term.read_line().unwrap(), "");
        assert_eq!(term.read_line().unwrap(), "");
    }
}
