//! Get command implementation.

use std::path::Path;

/// Runs the get command.
pub fn run(path: &Path, key: &str, int64: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;

    if int64 {
        println!("{}", store.get_int64(key)?);
    } else {
        println!("{}", store.get(key)?);
    }

    store.close()?;
    Ok(())
}
