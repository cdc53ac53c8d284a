//! CLI command implementations.

pub mod compact;
pub mod get;
pub mod inspect;
pub mod put;
pub mod verify;

use caskdb_core::{Config, CoreResult, Store};
use std::path::Path;

/// Opens a store for a CLI command.
///
/// Auto-merge stays off so a one-shot command never mutates the segment
/// layout behind the operator's back; `compact` folds segments explicitly.
pub(crate) fn open_store(path: &Path) -> CoreResult<Store> {
    Store::open_with_config(path, Config::new().auto_merge(false))
}
