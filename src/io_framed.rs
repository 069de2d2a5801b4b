//! Message-framed network channel
//!
//! Every frame is a 4-byte big-endian length followed by that many bytes of
//! JSON. Each `print` goes out as one text frame. Reads must come back as text
//! frames; any other frame is a protocol error and ends the session.

use std::io::{Read, Write};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZError};
use crate::io_device::ZIODevice;

/// Frames larger than this are refused rather than allocated
pub const MAX_FRAME: u32 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    Text { data: String },
    Status { location: String, right: String },
    Close,
}

pub mod framing {
    use super::*;

    /// Write a frame with a 4-byte length prefix
    pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
        let data = serde_json::to_vec(frame).map_err(|e| ZError::Protocol(e.to_string()))?;
        writer.write_all(&(data.len() as u32).to_be_bytes())?;
        writer.write_all(&data)?;
        writer.flush()?;
        Ok(())
    }

    /// Read one length-prefixed frame; `None` on a clean end of stream
    pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Frame>> {
        let mut len = [0u8; 4];
        match reader.read_exact(&mut len) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_be_bytes(len);
        if len > MAX_FRAME {
            return Err(ZError::Protocol(format!("frame of {len} bytes is too large")));
        }
        let mut buffer = vec![0u8; len as usize];
        reader.read_exact(&mut buffer)?;
        serde_json::from_slice(&buffer)
            .map(Some)
            .map_err(|e| ZError::Protocol(e.to_string()))
    }
}

pub struct FramedChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> FramedChannel<R, W> {
    pub fn new(reader: R, writer: W) -> FramedChannel<R, W> {
        FramedChannel { reader, writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<R: Read, W: Write> ZIODevice for FramedChannel<R, W> {
    fn print(&mut self, text: &str) -> Result<()> {
        framing::write_frame(
            &mut self.writer,
            &Frame::Text {
                data: text.to_string(),
            },
        )
    }

    fn read_line(&mut self) -> Result<String> {
        match framing::read_frame(&mut self.reader)? {
            Some(Frame::Text { data }) => {
                trace!("framed: read {:?}", data);
                Ok(data.trim_end_matches(['\r', '\n']).to_string())
            }
            None => {
                debug!("framed: peer closed the channel");
                Ok(String::new())
            }
            Some(other) => Err(ZError::Protocol(format!(
                "expected a text frame, got {other:?}"
            ))),
        }
    }

    fn show_status(&mut self, location: &str, right: &str) -> Result<()> {
        framing::write_frame(
            &mut self.writer,
            &Frame::Status {
                location: location.to_string(),
                right: right.to_string(),
            },
        )
    }
}
