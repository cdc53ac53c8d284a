//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;

/// Inspection result for a data directory.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory path.
    pub path: String,
    /// Number of segments.
    pub segment_count: usize,
    /// Total on-disk size in bytes.
    pub total_size: u64,
    /// Per-segment statistics, newest-first.
    pub segments: Vec<SegmentRow>,
}

/// One segment in the inspection output.
#[derive(Debug, Serialize)]
pub struct SegmentRow {
    /// Segment file name.
    pub file: String,
    /// Segment role (`active`, `sealed-<N>`, `merged`).
    pub role: String,
    /// File size in bytes.
    pub size: u64,
    /// Number of keys the segment indexes.
    pub live_keys: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;
    let stats = store.stats()?;

    let result = InspectResult {
        path: stats.dir.display().to_string(),
        segment_count: stats.segment_count(),
        total_size: stats.total_size(),
        segments: stats
            .segments
            .iter()
            .map(|seg| SegmentRow {
                file: seg.file_name.clone(),
                role: seg.role.to_string(),
                size: seg.size,
                live_keys: seg.live_keys,
            })
            .collect(),
    };
    store.close()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("CaskDB Data Directory Inspection");
    println!("================================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!(
        "Segments: {} ({} total)",
        result.segment_count,
        format_size(result.total_size)
    );
    for seg in &result.segments {
        println!(
            "  {:<18} {:>10}  {:>8} keys  [{}]",
            seg.file,
            format_size(seg.size),
            seg.live_keys,
            seg.role
        );
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
