//! Basic file logging example.
//!
//! Two independent loggers, each with its own directory and rotation.
//! Calls return immediately; the writes happen on each logger's worker.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let security = rotalog::builder()
        .with_directory("./data")
        .with_base_name("security")
        .with_rotation(rotalog::Rotation::Weekly)
        .build()?;

    security.log("User logged in");
    security.log("Added new student");
    security.log("Password changed");

    let errors = rotalog::builder()
        .with_directory("./logs")
        .with_base_name("errors")
        .with_rotation(rotalog::Rotation::Daily)
        .build()?;

    if let Err(e) = std::fs::read_to_string("/definitely/not/here") {
        errors.log(format!("Error: {}", e));
    }

    println!("Logging continues in the background");

    // Dropping the handles drains their queues before the process exits.
    drop(security);
    drop(errors);

    Ok(())
}
