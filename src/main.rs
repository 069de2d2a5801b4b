use grue3::config::{config_path, Config};
use grue3::header::Header;
use grue3::io_device::Console;
use grue3::server;
use log::{debug, info};
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

fn usage(program: &str) {
    println!("grue3 - Z-Machine version 3 interpreter");
    println!();
    println!("Usage: {} <story.z3> [options]", program);
    println!();
    println!("Options:");
    println!("  --config FILE                 read settings from a TOML file");
    println!("  --listen ADDR                 serve the story over TCP instead of the console");
    println!("  --protocol terminal|framed    network protocol (default terminal)");
    println!("  --seed N                      predictable random numbers");
    println!("  --legacy-stack                variable 0 reads peek instead of pop");
    println!("  --trace                       log every instruction (unless RUST_LOG is set)");
    println!("  --header                      print the story header and exit");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Display help information if no story file provided
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        usage(&args[0]);
        return Ok(());
    }

    let story_path = &args[1];
    let show_header = args[2..].iter().any(|a| a == "--header");
    let options: Vec<String> = args[2..]
        .iter()
        .filter(|a| *a != "--header")
        .cloned()
        .collect();
    let options = options.as_slice();

    let mut config = match config_path(options) {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::default(),
    };
    config.apply_args(options)?;

    let mut logger = env_logger::Builder::from_default_env();
    if config.interpreter.trace && env::var_os("RUST_LOG").is_none() {
        logger.filter_level(log::LevelFilter::Trace);
    }
    logger.init();

    debug!("Loading story: {}", story_path);
    let mut file = match File::open(story_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: cannot open story file '{}': {}", story_path, e);
            std::process::exit(1);
        }
    };
    let mut story = Vec::new();
    if let Err(e) = file.read_to_end(&mut story) {
        eprintln!("Error: cannot read story file '{}': {}", story_path, e);
        std::process::exit(1);
    }

    if show_header {
        print!("{}", Header::new(&story)?);
        return Ok(());
    }

    if let Some(addr) = config.server.listen.clone() {
        let listener = TcpListener::bind(&addr)?;
        info!("serving {} on {}", story_path, addr);
        server::serve(listener, Arc::new(story), config)?;
        return Ok(());
    }

    if let Err(e) = server::run_session(&story, Box::new(Console::new()), &config.interpreter) {
        eprintln!("\nError during execution: {e}");
        std::process::exit(1);
    }
    Ok(())
}
