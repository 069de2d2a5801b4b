//! Network front end: one story session per TCP connection.
//!
//! Each connection gets its own thread and its own interpreter built from a
//! fresh copy of the story image, so sessions share nothing mutable. A session
//! that fails logs its error and state dump; the listener keeps accepting.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};

use crate::config::{Config, InterpreterConfig, Protocol};
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::io_device::ZIODevice;
use crate::io_framed::FramedChannel;
use crate::io_remote::RemoteTerminal;

/// Run one story to completion on `io`. A failure is logged together with
/// the interpreter state before it is returned.
pub fn run_session(story: &[u8], io: Box<dyn ZIODevice>, config: &InterpreterConfig) -> Result<()> {
    let mut interpreter = Interpreter::new(story.to_vec(), io, config.clone())?;
    if let Err(e) = interpreter.interpret_all() {
        error!("session failed: {}\n{}", e, interpreter.state_dump());
        return Err(e);
    }
    Ok(())
}

fn device_for(stream: TcpStream, protocol: Protocol) -> Result<Box<dyn ZIODevice>> {
    let reader = stream.try_clone()?;
    Ok(match protocol {
        Protocol::Terminal => Box::new(RemoteTerminal::new(reader, stream)),
        Protocol::Framed => Box::new(FramedChannel::new(reader, stream)),
    })
}

fn handle_connection(stream: TcpStream, story: &[u8], config: &Config) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown peer".to_string());
    info!("{}: session started ({:?})", peer, config.server.protocol);
    let result = device_for(stream, config.server.protocol)
        .and_then(|io| run_session(story, io, &config.interpreter));
    match result {
        Ok(()) => info!("{}: session ended", peer),
        Err(e) => warn!("{}: session ended with error: {}", peer, e),
    }
}

/// Accept connections forever, one thread per session
pub fn serve(listener: TcpListener, story: Arc<Vec<u8>>, config: Config) -> Result<()> {
    info!("listening on {}", listener.local_addr()?);
    let config = Arc::new(config);
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("accept failed: {}", e);
                continue;
            }
        };
        let story = Arc::clone(&story);
        let config = Arc::clone(&config);
        thread::Builder::new()
            .name("grue3-session".to_string())
            .spawn(move || handle_connection(stream, &story, &config))?;
    }
    Ok(())
}
