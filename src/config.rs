//! Runtime configuration: an optional TOML file, overridden by command line flags
//!
//! ```toml
//! [interpreter]
//! stack_semantics = "standard"   # or "legacy"
//! random_seed = 42
//! instruction_limit = 1000000
//! trace = false
//!
//! [server]
//! listen = "127.0.0.1:2323"
//! protocol = "terminal"          # or "framed"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZError};

/// How variable 0 (the evaluation stack) behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackSemantics {
    /// Reading pops, writing pushes, indirect references work on the top in place
    #[default]
    Standard,
    /// Reading peeks without popping and `pull` discards its value
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Raw byte stream, LF translated to CRLF
    #[default]
    Terminal,
    /// Length-prefixed JSON frames
    Framed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub stack_semantics: StackSemantics,
    /// Seed for `random`; unset means seeded from entropy
    pub random_seed: Option<u64>,
    /// Stop after this many instructions; unset or 0 runs until `quit`
    pub instruction_limit: Option<u64>,
    pub trace: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: Option<String>,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub interpreter: InterpreterConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config> {
        toml::from_str(text).map_err(|e| ZError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)
            .map_err(|e| ZError::Config(format!("{}: {}", path.display(), e)))?;
        Config::from_toml(&text)
    }

    /// Apply command line flags (everything after the story path) on top of this config
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .cloned()
                    .ok_or_else(|| ZError::Config(format!("{flag} needs a value")))
            };
            match arg.as_str() {
                "--listen" => self.server.listen = Some(value("--listen")?),
                "--protocol" => {
                    self.server.protocol = match value("--protocol")?.as_str() {
                        "terminal" => Protocol::Terminal,
                        "framed" => Protocol::Framed,
                        other => {
                            return Err(ZError::Config(format!("unknown protocol '{other}'")))
                        }
                    }
                }
                "--seed" => {
                    let seed = value("--seed")?;
                    let seed = seed
                        .parse()
                        .map_err(|_| ZError::Config(format!("bad seed '{seed}'")))?;
                    self.interpreter.random_seed = Some(seed);
                }
                "--legacy-stack" => self.interpreter.stack_semantics = StackSemantics::Legacy,
                "--trace" => self.interpreter.trace = true,
                // consumed by the caller before the config exists
                "--config" => {
                    value("--config")?;
                }
                other => return Err(ZError::Config(format!("unknown option '{other}'"))),
            }
        }
        Ok(())
    }
}

/// Pull `--config FILE` out of the argument list, if present
pub fn config_path(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
