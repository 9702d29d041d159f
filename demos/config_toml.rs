//! Example of loading logger configuration from a TOML file.
//!
//! Run with:
//! ```bash
//! cargo run --example config_toml
//! ```

use serde::Deserialize;
use std::fs;

#[derive(Deserialize)]
struct Config {
    logger: rotalog::LoggerConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = "demos/config.toml";
    let config_content = fs::read_to_string(config_path)
        .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));

    let root: Config = toml::from_str(&config_content)?;
    let logger = rotalog::FileLogger::new(root.logger)?;

    for i in 0..10 {
        logger.log(format!("Processed batch {}", i));
    }

    logger.flush();
    Ok(())
}
