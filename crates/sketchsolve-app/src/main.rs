//! Main application entry point (native).

use sketchsolve_app::{Host, HostError};
use sketchsolve_core::{EngineConfig, Instant};

fn run() -> Result<(), HostError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let mut host = Host::new(config, sketchsolve_app::host::DEFAULT_CANVAS, Instant::now())?;
    host.connect()?;
    host.run(std::io::BufReader::new(std::io::stdin()))
}

fn main() {
    env_logger::init();
    log::info!("Starting SketchSolve");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
