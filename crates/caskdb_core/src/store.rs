//! Store façade and startup recovery.
//!
//! [`Store`] is the primary entry point. Opening a store enumerates the
//! segment files in the data directory, rebuilds each segment's index by
//! scanning, orders the segments newest-first, and starts the writer and
//! (optionally) merger threads. Lookups scan the segment sequence in order
//! and return the first hit; mutations flow through the writer queue.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::merge::{self, MergeStats, Merger};
use crate::record::Record;
use crate::segment::{self, Segment, SegmentRole};
use crate::stats::{SegmentStats, StoreStats};
use crate::value::Value;
use crate::writer::{WriteRequest, Writer};
use crossbeam_channel::{bounded, Sender};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// A segment shared between the façade, the writer, and the merger.
pub(crate) type SharedSegment = Arc<RwLock<Segment>>;

/// State shared with the background agents.
pub(crate) struct Shared {
    /// The data directory.
    pub(crate) dir: PathBuf,
    /// The segment sequence, newest-first. Position 0 is the active segment.
    pub(crate) segments: RwLock<Vec<SharedSegment>>,
    /// Serializes merge passes (background worker vs. explicit `compact`).
    pub(crate) merge_lock: Mutex<()>,
}

/// The storage engine handle.
///
/// # Example
///
/// ```no_run
/// use caskdb_core::Store;
///
/// let store = Store::open("./data")?;
/// store.put("greeting", "hello")?;
/// assert_eq!(store.get("greeting")?, "hello");
/// store.close()?;
/// # Ok::<(), caskdb_core::CoreError>(())
/// ```
pub struct Store {
    config: Config,
    shared: Arc<Shared>,
    write_tx: Sender<WriteRequest>,
    merge_tx: Mutex<Option<Sender<()>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    merger: Mutex<Option<JoinHandle<()>>>,
    open: RwLock<bool>,
}

impl Store {
    /// Opens a store in `dir` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created or read, and
    /// `Corrupt` if a segment file fails recovery.
    pub fn open(dir: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(dir, Config::default())
    }

    /// Opens a store with an explicit size limit and auto-merge switch.
    pub fn open_with(
        dir: impl AsRef<Path>,
        active_segment_limit: u64,
        auto_merge: bool,
    ) -> CoreResult<Self> {
        Self::open_with_config(
            dir,
            Config::new()
                .active_segment_limit(active_segment_limit)
                .auto_merge(auto_merge),
        )
    }

    /// Opens a store with a full configuration.
    ///
    /// On startup:
    /// 1. Ensure the directory exists, creating it if needed.
    /// 2. Enumerate segment files, ignoring anything outside the naming
    ///    scheme, and rebuild each index by scanning.
    /// 3. Order segments newest-first: active, sealed by descending rank,
    ///    merged last. Create an empty active segment if none exists.
    /// 4. Start the writer thread and, if auto-merge is on, the merger.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a rejected configuration, `Corrupt` if a
    /// segment fails recovery, and `Io` on filesystem failure.
    pub fn open_with_config(dir: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        config.validate()?;

        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut found = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(role) = SegmentRole::parse(name) else {
                continue;
            };

            let mut seg = Segment::attach(dir.join(name), role);
            seg.recover()?;
            found.push(seg);
        }

        if !found.iter().any(|seg| seg.role().is_active()) {
            found.push(Segment::create(&dir, SegmentRole::Active)?);
        }
        found.sort_by_key(|seg| seg.role().recovery_order());

        let next_rank = found
            .iter()
            .filter_map(|seg| match seg.role() {
                SegmentRole::Sealed(rank) => Some(rank + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        let out = segment::open_append(&dir.join(SegmentRole::Active.file_name()))?;

        let segments = found
            .into_iter()
            .map(|seg| Arc::new(RwLock::new(seg)))
            .collect();
        let shared = Arc::new(Shared {
            dir,
            segments: RwLock::new(segments),
            merge_lock: Mutex::new(()),
        });

        let (merge_tx, merger) = if config.auto_merge {
            let (tx, rx) = bounded(1);
            let merger = Merger::new(Arc::clone(&shared), rx);
            let handle = thread::Builder::new()
                .name("caskdb-merger".into())
                .spawn(move || merger.run())?;
            (Some(tx), Some(handle))
        } else {
            (None, None)
        };

        let (write_tx, write_rx) = bounded(config.write_queue_depth);
        let writer = Writer::new(
            Arc::clone(&shared),
            out,
            config.active_segment_limit,
            next_rank,
            merge_tx.clone(),
            write_rx,
        );
        let writer = thread::Builder::new()
            .name("caskdb-writer".into())
            .spawn(move || writer.run())?;

        debug!(dir = %shared.dir.display(), "opened store");

        Ok(Self {
            config,
            shared,
            write_tx,
            merge_tx: Mutex::new(merge_tx),
            writer: Mutex::new(Some(writer)),
            merger: Mutex::new(merger),
            open: RwLock::new(true),
        })
    }

    /// Reads the current value for `key`.
    ///
    /// Scans the segment sequence newest-first and returns the first hit.
    /// The sequence lock is held for the whole lookup, so a concurrent merge
    /// cannot swap segments out from under the read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no segment indexes the key, `Corrupt` or `Io`
    /// if reading the record fails, and `Closed` after `close`.
    pub fn get(&self, key: &str) -> CoreResult<String> {
        self.ensure_open()?;

        let segments = self.shared.segments.read();
        for seg in segments.iter() {
            match seg.read().get(key) {
                Ok(value) => return Ok(value),
                Err(CoreError::NotFound) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(CoreError::NotFound)
    }

    /// Reads the current value for `key` as a 64-bit signed integer.
    ///
    /// # Errors
    ///
    /// As [`Store::get`], plus `WrongType` if the stored text is not a
    /// base-10 `i64`.
    pub fn get_int64(&self, key: &str) -> CoreResult<i64> {
        let text = self.get(key)?;
        text.parse::<i64>()
            .map_err(|_| CoreError::wrong_type(text))
    }

    /// Stores a textual value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` if the encoded record exceeds the active segment
    /// limit, `Io` if the append fails, and `Closed` after `close`.
    pub fn put(&self, key: impl Into<String>, value: &str) -> CoreResult<()> {
        self.put_value(key, &Value::from(value))
    }

    /// Stores a 64-bit signed integer under `key`.
    ///
    /// # Errors
    ///
    /// As [`Store::put`].
    pub fn put_int64(&self, key: impl Into<String>, value: i64) -> CoreResult<()> {
        self.put_value(key, &Value::Int64(value))
    }

    /// Stores a typed value under `key`.
    ///
    /// The request is queued for the writer thread; the call blocks until
    /// the writer replies. Writes are totally ordered by that single
    /// consumer.
    ///
    /// # Errors
    ///
    /// As [`Store::put`].
    pub fn put_value(&self, key: impl Into<String>, value: &Value) -> CoreResult<()> {
        self.ensure_open()?;

        let record = Record::from_value(key, value);
        let (reply_tx, reply_rx) = bounded(1);
        self.write_tx
            .send(WriteRequest::Put {
                record,
                reply: reply_tx,
            })
            .map_err(|_| CoreError::Closed)?;
        reply_rx.recv().map_err(|_| CoreError::Closed)?
    }

    /// Runs one merge pass synchronously.
    ///
    /// Useful when auto-merge is disabled and sealed segments would
    /// otherwise accumulate without bound. Returns `None` when fewer than
    /// two non-active segments exist.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Corrupt` if the pass fails; the segment directory
    /// is left unchanged in that case.
    pub fn compact(&self) -> CoreResult<Option<MergeStats>> {
        self.ensure_open()?;
        merge::run_merge_pass(&self.shared)
    }

    /// Returns per-segment statistics.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after `close`.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        self.ensure_open()?;

        let segments = self.shared.segments.read();
        let segments = segments
            .iter()
            .map(|seg| {
                let seg = seg.read();
                SegmentStats {
                    file_name: seg
                        .path()
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    role: seg.role(),
                    size: seg.offset(),
                    live_keys: seg.key_count(),
                }
            })
            .collect();

        Ok(StoreStats {
            dir: self.shared.dir.clone(),
            segments,
        })
    }

    /// Returns the number of segments currently in the directory.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.shared.segments.read().len()
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns whether the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    /// Closes the store.
    ///
    /// Drains the writer queue behind a shutdown sentinel (requests already
    /// queued are processed first), stops the merger, and joins both
    /// threads. Operations submitted afterwards fail with `Closed`.
    /// Closing an already closed store is a no-op.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for surfacing
    /// shutdown flush failures.
    pub fn close(&self) -> CoreResult<()> {
        {
            let mut open = self.open.write();
            if !*open {
                return Ok(());
            }
            *open = false;
        }

        // Dropping the façade's signal sender tells the merger to stop once
        // the writer's clone is gone too.
        self.merge_tx.lock().take();

        let (done_tx, done_rx) = bounded(1);
        if self
            .write_tx
            .send(WriteRequest::Shutdown { done: done_tx })
            .is_ok()
        {
            let _ = done_rx.recv();
        }
        if let Some(handle) = self.writer.lock().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.merger.lock().take() {
            let _ = handle.join();
        }

        debug!(dir = %self.shared.dir.display(), "closed store");
        Ok(())
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(CoreError::Closed)
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("dir", &self.shared.dir)
            .field("segments", &self.segment_count())
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
