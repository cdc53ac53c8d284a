//! Background merge/compaction of sealed segments.
//!
//! The merger folds the non-active tail of the segment directory into a
//! single `segment-merged` file that keeps only the newest record per key,
//! then swaps it into the directory and deletes the superseded files.
//!
//! ## Invariants
//!
//! - A merge pass never touches the active segment.
//! - The newest occurrence of each key wins.
//! - On any failure the pass is abandoned and the directory is unchanged;
//!   a later signal retries.
//! - Output is written to a temp file and renamed into place, so a crashed
//!   pass never leaves a half-written `segment-merged` behind.

use crate::error::CoreResult;
use crate::segment::{Segment, SegmentRole, MERGE_TEMP_FILE};
use crate::store::{Shared, SharedSegment};
use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one merge pass.
#[derive(Debug, Clone, Copy)]
pub struct MergeStats {
    /// Number of segments folded into the merged output.
    pub source_segments: usize,
    /// Number of live records the merged segment holds.
    pub live_records: usize,
    /// Size of the merged segment in bytes.
    pub bytes_written: u64,
}

/// The merge agent. Listens for signals and runs one pass per wake-up.
pub(crate) struct Merger {
    shared: Arc<Shared>,
    signals: Receiver<()>,
}

impl Merger {
    pub(crate) fn new(shared: Arc<Shared>, signals: Receiver<()>) -> Self {
        Self { shared, signals }
    }

    /// Runs until every signal sender is gone.
    pub(crate) fn run(self) {
        while self.signals.recv().is_ok() {
            // Coalesce a burst of signals into a single pass.
            while self.signals.try_recv().is_ok() {}

            match run_merge_pass(&self.shared) {
                Ok(Some(stats)) => {
                    debug!(
                        sources = stats.source_segments,
                        live_records = stats.live_records,
                        bytes = stats.bytes_written,
                        "merged sealed segments"
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "merge pass failed; segments left unchanged");
                }
            }
        }
    }
}

/// Runs one merge pass over the current directory.
///
/// Returns `None` when there are fewer than two non-active segments.
pub(crate) fn run_merge_pass(shared: &Shared) -> CoreResult<Option<MergeStats>> {
    // Serializes background and externally triggered passes.
    let _pass = shared.merge_lock.lock();

    // 1. Snapshot the non-active suffix of the directory.
    let snapshot: Vec<SharedSegment> = {
        let segments = shared.segments.read();
        if segments.len() < 3 {
            return Ok(None);
        }
        segments[1..].to_vec()
    };

    // 2. Newest occurrence of each key wins: walk oldest to newest and let
    //    later segments overwrite earlier entries.
    let mut sources: HashMap<String, SharedSegment> = HashMap::new();
    for seg in snapshot.iter().rev() {
        let guard = seg.read();
        for key in guard.keys() {
            sources.insert(key.clone(), Arc::clone(seg));
        }
    }

    // 3. Stream the live records into a temp file. Full records are copied
    //    so the stored type tags survive compaction.
    let tmp_path = shared.dir.join(MERGE_TEMP_FILE);
    let merged_path = shared.dir.join(SegmentRole::Merged.file_name());
    let mut merged = Segment::attach(merged_path.clone(), SegmentRole::Merged);

    let mut out = BufWriter::new(create_truncated(&tmp_path)?);
    let mut bytes_written = 0u64;
    for (key, source) in &sources {
        let record = source.read().read_record(key)?;
        let encoded = record.encode();
        out.write_all(&encoded)?;
        merged.note_append(record.key, encoded.len() as u64);
        bytes_written += encoded.len() as u64;
    }
    out.flush()?;
    out.get_ref().sync_all()?;
    drop(out);

    // 4. Swap. Rename and splice under the sequence write lock so no reader
    //    ever resolves the old merged segment against the new file.
    let removed: Vec<PathBuf> = {
        let mut segments = shared.segments.write();
        fs::rename(&tmp_path, &merged_path)?;

        let keep = segments.len() - snapshot.len();
        debug_assert!(Arc::ptr_eq(&segments[keep], &snapshot[0]));

        let removed = segments[keep..]
            .iter()
            .map(|seg| seg.read().path().to_path_buf())
            .collect();
        segments.truncate(keep);
        segments.push(Arc::new(RwLock::new(merged)));
        removed
    };

    // 5. Unlink superseded files. The old merged file was already replaced
    //    by the rename above, so its path must not be deleted.
    for path in &removed {
        if *path == merged_path {
            continue;
        }
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "could not delete merged source segment");
        }
    }

    Ok(Some(MergeStats {
        source_segments: snapshot.len(),
        live_records: sources.len(),
        bytes_written,
    }))
}

fn create_truncated(path: &std::path::Path) -> CoreResult<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}
