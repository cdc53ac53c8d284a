//! The single-writer mutation pipeline.
//!
//! All mutations enter the engine as requests on a bounded queue. One writer
//! thread owns the active segment's append handle and consumes requests one
//! at a time, which turns concurrent `put` calls into an ordered
//! single-writer stream. Each request carries a reply channel; the caller
//! blocks until the writer answers.

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::segment::{self, Segment, SegmentRole};
use crate::store::{Shared, SharedSegment};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

/// A request consumed by the writer thread.
pub(crate) enum WriteRequest {
    /// Append one record and reply with the outcome.
    Put {
        /// The record to append.
        record: Record,
        /// Where the outcome is sent.
        reply: Sender<CoreResult<()>>,
    },
    /// Drain the queue and stop; acknowledged on `done`.
    Shutdown {
        /// Acknowledged once the active handle is flushed.
        done: Sender<()>,
    },
}

/// The writer agent. Owns the active segment's append handle exclusively.
pub(crate) struct Writer {
    shared: Arc<Shared>,
    out: File,
    active_limit: u64,
    next_rank: u64,
    merge_tx: Option<Sender<()>>,
    requests: Receiver<WriteRequest>,
}

impl Writer {
    pub(crate) fn new(
        shared: Arc<Shared>,
        out: File,
        active_limit: u64,
        next_rank: u64,
        merge_tx: Option<Sender<()>>,
        requests: Receiver<WriteRequest>,
    ) -> Self {
        Self {
            shared,
            out,
            active_limit,
            next_rank,
            merge_tx,
            requests,
        }
    }

    /// Consumes requests until a shutdown sentinel arrives or every sender
    /// is gone.
    pub(crate) fn run(mut self) {
        while let Ok(request) = self.requests.recv() {
            match request {
                WriteRequest::Put { record, reply } => {
                    let result = self.handle_put(record);
                    let _ = reply.send(result);
                }
                WriteRequest::Shutdown { done } => {
                    if let Err(err) = self.out.sync_all() {
                        warn!(error = %err, "could not sync active segment on shutdown");
                    }
                    let _ = done.send(());
                    break;
                }
            }
        }
    }

    fn handle_put(&mut self, record: Record) -> CoreResult<()> {
        let encoded = record.encode();
        if encoded.len() as u64 > self.active_limit {
            return Err(CoreError::TooLarge {
                size: encoded.len() as u64,
                limit: self.active_limit,
            });
        }

        let shared = Arc::clone(&self.shared);
        let mut segments = shared.segments.write();

        // Two or more non-active segments are worth folding into one.
        if segments.len() > 2 {
            self.signal_merge();
        }

        self.out.write_all(&encoded)?;
        segments[0]
            .write()
            .note_append(record.key, encoded.len() as u64);

        let active_path = segments[0].read().path().to_path_buf();
        match fs::metadata(&active_path) {
            Ok(meta) if meta.len() >= self.active_limit => {
                // The append above is already durable; rotation trouble is
                // logged, not surfaced to the caller.
                if let Err(err) = self.rotate(&mut segments) {
                    warn!(error = %err, "could not rotate active segment");
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "could not stat active segment");
            }
        }

        Ok(())
    }

    /// Seals the active segment under its next rank and starts a fresh one.
    fn rotate(&mut self, segments: &mut Vec<SharedSegment>) -> CoreResult<()> {
        self.out.sync_all()?;

        let rank = self.next_rank;
        let active_path = self.shared.dir.join(SegmentRole::Active.file_name());
        let sealed_path = self.shared.dir.join(SegmentRole::Sealed(rank).file_name());
        fs::rename(&active_path, &sealed_path)?;
        segments[0]
            .write()
            .reassign(sealed_path, SegmentRole::Sealed(rank));
        self.next_rank += 1;

        // Replacing the handle closes the previous one.
        self.out = segment::open_append(&active_path)?;
        segments.insert(
            0,
            Arc::new(RwLock::new(Segment::attach(
                active_path,
                SegmentRole::Active,
            ))),
        );

        debug!(rank, "sealed active segment");
        Ok(())
    }

    fn signal_merge(&self) {
        if let Some(tx) = &self.merge_tx {
            // A full signal channel means a pass is already pending.
            let _ = tx.try_send(());
        }
    }
}
