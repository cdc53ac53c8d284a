//! Put command implementation.

use std::path::Path;

/// Runs the put command.
pub fn run(
    path: &Path,
    key: &str,
    value: &str,
    int64: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;

    if int64 {
        let value: i64 = value
            .parse()
            .map_err(|_| format!("value {value:?} is not a 64-bit signed integer"))?;
        store.put_int64(key, value)?;
    } else {
        store.put(key, value)?;
    }

    store.close()?;
    Ok(())
}
