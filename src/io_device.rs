//! I/O device boundary between the interpreter and whatever hosts the story.
//!
//! The interpreter only ever prints text and reads whole lines. Backends:
//! `Console` (local stdin/stdout), `HeadlessDevice` (scripted, for tests and
//! embedders), plus the network backends in `io_remote` and `io_framed`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use log::debug;

use crate::error::Result;

pub trait ZIODevice {
    /// Write text; it need only become visible eventually
    fn print(&mut self, text: &str) -> Result<()>;

    /// Block until a full line is available. The terminator is not included
    /// and end of input reads as an empty line.
    fn read_line(&mut self) -> Result<String>;

    /// v3 status line: location on the left, score/moves or time on the right
    fn show_status(&mut self, location: &str, right: &str) -> Result<()> {
        debug!("status: {} | {}", location, right);
        Ok(())
    }
}

/// Strip a trailing "\n" or "\r\n"
pub fn trim_line_ending(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Local console on stdin/stdout
pub struct Console {
    echo: bool,
}

impl Console {
    pub fn new() -> Console {
        // Piped input never shows up on screen, so echo it to keep transcripts readable
        Console {
            echo: !atty::is(atty::Stream::Stdin),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::new()
    }
}

impl ZIODevice for Console {
    fn print(&mut self, text: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            debug!("console: end of input");
            return Ok(String::new());
        }
        let line = trim_line_ending(line);
        if self.echo {
            println!("{}", line);
        }
        Ok(line)
    }
}

#[derive(Debug, Default)]
struct Recorded {
    output: String,
    status: Option<(String, String)>,
}

/// Shared view of what a `HeadlessDevice` has seen, usable after the device
/// has been handed to an interpreter
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    inner: Rc<RefCell<Recorded>>,
}

impl Transcript {
    pub fn output(&self) -> String {
        self.inner.borrow().output.clone()
    }

    /// Last status line shown, if any
    pub fn status(&self) -> Option<(String, String)> {
        self.inner.borrow().status.clone()
    }
}

/// Scripted input, captured output
pub struct HeadlessDevice {
    input: VecDeque<String>,
    transcript: Transcript,
}

impl HeadlessDevice {
    pub fn new<I, S>(input: I) -> HeadlessDevice
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HeadlessDevice {
            input: input.into_iter().map(Into::into).collect(),
            transcript: Transcript::default(),
        }
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

impl ZIODevice for HeadlessDevice {
    fn print(&mut self, text: &str) -> Result<()> {
        self.transcript.inner.borrow_mut().output.push_str(text);
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let line = self.input.pop_front().unwrap_or_default();
        debug!("headless: read {:?}", line);
        Ok(line)
    }

    fn show_status(&mut self, location: &str, right: &str) -> Result<()> {
        self.transcript.inner.borrow_mut().status = Some((location.to_string(), right.to_string()));
        Ok(())
    }
}
