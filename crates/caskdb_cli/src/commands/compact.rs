//! Compact command implementation.

use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;

    let before = store.stats()?;
    println!(
        "Compacting {} segments ({} bytes) at {}",
        before.segment_count(),
        before.total_size(),
        path.display()
    );

    match store.compact()? {
        Some(stats) => {
            let after = store.stats()?;
            println!();
            println!("  Segments folded:  {}", stats.source_segments);
            println!("  Live records:     {}", stats.live_records);
            println!("  Merged size:      {} bytes", stats.bytes_written);
            println!(
                "  Space reclaimed:  {} bytes",
                before.total_size().saturating_sub(after.total_size())
            );
            println!();
            println!("✓ Compaction complete");
        }
        None => {
            println!();
            println!("Nothing to compact - fewer than two sealed segments");
        }
    }

    store.close()?;
    Ok(())
}
