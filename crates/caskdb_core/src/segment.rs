//! Segment files and their in-memory indexes.
//!
//! A segment is one append-only file plus a hash index from key to the byte
//! offset of that key's most recent record within the file. Only the active
//! segment is ever appended to; sealed and merged segments are read-only
//! until compaction deletes them.
//!
//! ## File names
//!
//! ```text
//! segment-active    the current append target
//! segment-<N>       a sealed segment; higher N is more recently sealed
//! segment-merged    the output of the most recent compaction (oldest)
//! ```

use crate::error::{CoreError, CoreResult};
use crate::record::{self, Record, LENGTH_FIELDS};
use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Common prefix of every segment file name.
pub const SEGMENT_PREFIX: &str = "segment-";

const ACTIVE_SUFFIX: &str = "active";
const MERGED_SUFFIX: &str = "merged";

/// Temporary file a merge pass writes before renaming into place.
///
/// The name does not parse as a segment name, so recovery ignores a stale
/// temp file left behind by a crashed merge.
pub(crate) const MERGE_TEMP_FILE: &str = "segment-merged.tmp";

/// The role a segment plays in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    /// The single segment currently receiving appends.
    Active,
    /// A rotated-out, read-only segment with its sealing rank.
    Sealed(u64),
    /// The output of the most recent compaction; logically the oldest.
    Merged,
}

impl SegmentRole {
    /// Returns the file name for this role.
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            Self::Active => format!("{SEGMENT_PREFIX}{ACTIVE_SUFFIX}"),
            Self::Sealed(rank) => format!("{SEGMENT_PREFIX}{rank}"),
            Self::Merged => format!("{SEGMENT_PREFIX}{MERGED_SUFFIX}"),
        }
    }

    /// Parses a file name into a role.
    ///
    /// Returns `None` for anything outside the segment naming scheme, so
    /// directory listings tolerate unrelated files.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let suffix = file_name.strip_prefix(SEGMENT_PREFIX)?;
        match suffix {
            ACTIVE_SUFFIX => Some(Self::Active),
            MERGED_SUFFIX => Some(Self::Merged),
            _ => suffix.parse::<u64>().ok().map(Self::Sealed),
        }
    }

    /// Returns true for the active role.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Sort key placing segments newest-first: the active segment, then
    /// sealed segments by descending rank, then the merged segment.
    #[must_use]
    pub(crate) fn recovery_order(&self) -> (u8, u64) {
        match self {
            Self::Active => (0, 0),
            Self::Sealed(rank) => (1, u64::MAX - rank),
            Self::Merged => (2, 0),
        }
    }
}

impl fmt::Display for SegmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Sealed(rank) => write!(f, "sealed-{rank}"),
            Self::Merged => f.write_str("merged"),
        }
    }
}

/// Opens a segment file for appending, creating it with mode `0600` if absent.
pub(crate) fn open_append(path: &Path) -> CoreResult<File> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}

/// One segment file plus its in-memory index.
#[derive(Debug)]
pub struct Segment {
    path: PathBuf,
    role: SegmentRole,
    /// Logical end of file in bytes; the offset of the next append.
    offset: u64,
    /// Key to byte offset of that key's most recent record in this file.
    index: HashMap<String, u64>,
}

impl Segment {
    /// Creates a segment for a file that is expected to exist, without
    /// scanning it. Call [`Segment::recover`] to rebuild the index.
    #[must_use]
    pub fn attach(path: PathBuf, role: SegmentRole) -> Self {
        Self {
            path,
            role,
            offset: 0,
            index: HashMap::new(),
        }
    }

    /// Creates a segment with an empty backing file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be created.
    pub fn create(dir: &Path, role: SegmentRole) -> CoreResult<Self> {
        let path = dir.join(role.file_name());
        open_append(&path)?;
        Ok(Self::attach(path, role))
    }

    /// Returns the segment file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the segment role.
    #[must_use]
    pub const fn role(&self) -> SegmentRole {
        self.role
    }

    /// Returns the logical end of file in bytes.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the number of live keys in the index.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Iterates over the keys indexed by this segment.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.index.keys()
    }

    /// Returns the indexed offset of `key`, if present.
    #[must_use]
    pub fn offset_of(&self, key: &str) -> Option<u64> {
        self.index.get(key).copied()
    }

    /// Records an append of `encoded_len` bytes for `key` and returns the
    /// offset the record was written at. The caller has already written the
    /// bytes to the end of the file.
    pub fn note_append(&mut self, key: String, encoded_len: u64) -> u64 {
        let at = self.offset;
        self.index.insert(key, at);
        self.offset += encoded_len;
        at
    }

    /// Re-points this segment at a new path and role after rotation or merge.
    pub fn reassign(&mut self, path: PathBuf, role: SegmentRole) {
        self.path = path;
        self.role = role;
    }

    /// Reads the current value for `key` from this segment.
    ///
    /// Opens a fresh read handle, seeks to the indexed offset, and parses
    /// just enough framing to reach the value; the handle is closed on
    /// every exit path.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is not indexed here, `Corrupt` if the
    /// record at the offset is malformed, and `Io` on filesystem failure.
    pub fn get(&self, key: &str) -> CoreResult<String> {
        let Some(offset) = self.offset_of(key) else {
            return Err(CoreError::NotFound);
        };
        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(offset))?;
        record::read_value(&mut reader)
    }

    /// Reads the full record for `key`, preserving its type tag.
    ///
    /// # Errors
    ///
    /// Same as [`Segment::get`].
    pub fn read_record(&self, key: &str) -> CoreResult<Record> {
        let Some(offset) = self.offset_of(key) else {
            return Err(CoreError::NotFound);
        };
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        read_record_from(&mut file)
    }

    /// Rebuilds the index by scanning the file from the start.
    ///
    /// Each record updates the index, so the last occurrence of a key within
    /// the segment wins. Stops cleanly at end of file.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` if trailing bytes cannot form a complete record,
    /// and `Io` on filesystem failure.
    pub fn recover(&mut self) -> CoreResult<()> {
        self.index.clear();
        self.offset = 0;

        let file = File::open(&self.path)?;
        let size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut offset = 0u64;

        while offset < size {
            let remaining = size - offset;
            if remaining < 4 {
                return Err(CoreError::corrupt(format!(
                    "{remaining} trailing bytes at end of {}",
                    self.path.display()
                )));
            }

            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            let total = u64::from(u32::from_le_bytes(len));
            if total < LENGTH_FIELDS as u64 || total > remaining {
                return Err(CoreError::corrupt(format!(
                    "record of {total} bytes at offset {offset} does not fit in {}",
                    self.path.display()
                )));
            }

            let mut data = vec![0u8; total as usize];
            data[..4].copy_from_slice(&len);
            reader.read_exact(&mut data[4..])?;

            let record = Record::decode(&data)?;
            self.index.insert(record.key, offset);
            offset += total;
        }

        self.offset = size;
        Ok(())
    }
}

/// Reads one full record from a reader positioned at a record start.
fn read_record_from<R: Read>(reader: &mut R) -> CoreResult<Record> {
    let mut len = [0u8; 4];
    reader.read_exact(&mut len)?;
    let total = u32::from_le_bytes(len) as usize;
    if total < LENGTH_FIELDS {
        return Err(CoreError::corrupt("record length below framing size"));
    }

    let mut data = vec![0u8; total];
    data[..4].copy_from_slice(&len);
    reader
        .read_exact(&mut data[4..])
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::UnexpectedEof => CoreError::corrupt("record truncated mid-frame"),
            _ => CoreError::Io(err),
        })?;
    Record::decode(&data)
}
