//! Route `tracing` events into rotating files.
//!
//! Run with:
//! ```bash
//! cargo run --example tracing_file
//! ```

use rotalog::{DiagnosticsConfig, Rotation};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = rotalog::builder()
        .with_directory("./logs")
        .with_base_name("events")
        .with_rotation(Rotation::Daily)
        .with_max_files(7)
        .with_max_bytes(5 * 1024 * 1024)
        .build()?;

    let config = DiagnosticsConfig::new().with_level("debug");
    rotalog::init_logging(&config, None, Some(logger.clone()))?;

    tracing::info!(user = "bob", action = "logout", "User session ended");
    tracing::warn!(error_code = 507, "Disk almost full");

    logger.flush();
    Ok(())
}
