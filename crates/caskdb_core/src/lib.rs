//! # CaskDB Core
//!
//! An embeddable, append-only, log-structured key-value store with:
//! - In-memory hash indexing per segment
//! - Typed values (`string` and `int64`) under a framed on-disk record format
//! - Single-writer mutation pipeline over a bounded request queue
//! - Background merge/compaction of sealed segments
//! - Crash-safe recovery by scanning segment files on startup
//!
//! ## Architecture Overview
//!
//! ```text
//! callers ──► Store ──► write queue ──► writer thread ──► segment-active
//!    │                                      │
//!    │                                      └─ rotation: segment-<N>
//!    └──────► newest-first segment scan ──► value
//!
//! merger thread ──► folds sealed segments ──► segment-merged
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod record;
pub mod segment;
pub mod stats;
pub mod store;
pub mod value;

mod merge;
mod writer;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use merge::MergeStats;
pub use record::Record;
pub use segment::SegmentRole;
pub use stats::{SegmentStats, StoreStats};
pub use store::Store;
pub use value::Value;

/// Current version of CaskDB.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
