//! File-based cache of resize artifacts.
//!
//! There is no cache index: an artifact *is* the cache entry. Its identity is
//! its canonical path (see [`naming`](crate::naming)), which is a pure
//! function of the source path and the resolved destination size, so lookup
//! and write always agree on where an artifact lives.
//!
//! ## Hits
//!
//! A cache hit requires:
//! 1. A regular file exists at the canonical path
//! 2. The backend can read a valid image header from it
//!
//! Existence alone isn't trusted: a crashed or interrupted write could leave
//! a zero-byte or truncated file behind, and serving that would be worse
//! than re-encoding.
//!
//! ## Writes
//!
//! The backend never writes to the canonical path directly. It writes a
//! temporary sibling (same directory, same extension) which is renamed into
//! place once complete, so readers observe either no artifact or a whole one.
//!
//! ## Concurrent misses
//!
//! Two requests missing the same artifact at the same time would both encode
//! it. The result is identical either way, but [`InFlight`] serializes work
//! per canonical path so the second request can re-check and pick up the
//! first one's artifact instead.

use crate::imaging::{BackendError, Dimensions, ImageBackend};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix of temporary files written next to cache artifacts.
const TEMP_PREFIX: &str = ".aqua-tmp-";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Probe `path` for a usable artifact and return its dimensions.
pub fn find_cached(backend: &impl ImageBackend, path: &Path) -> Option<Dimensions> {
    if !path.is_file() {
        return None;
    }
    match backend.identify(path) {
        Ok(dims) => Some(dims),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable cache artifact");
            None
        }
    }
}

/// Produce `dest` by letting `write` fill a temporary sibling, then renaming it.
///
/// The temporary file keeps `dest`'s extension so format-by-extension
/// encoders pick the right codec. On any error the temporary file is
/// removed and `dest` is left untouched.
pub fn write_atomically<F>(dest: &Path, write: F) -> Result<(), CacheError>
where
    F: FnOnce(&Path) -> Result<(), BackendError>,
{
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let suffix = dest
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?
        .into_temp_path();

    write(&*temp)?;
    temp.persist(dest).map_err(|e| e.error)?;
    debug!(path = %dest.display(), "persisted cache artifact");
    Ok(())
}

/// Per-key mutual exclusion for cache fills.
///
/// Holding an [`InFlightGuard`] for a path means no other caller of the same
/// [`InFlight`] is producing that path. Different paths never block each
/// other.
#[derive(Debug, Default)]
pub struct InFlight {
    active: Mutex<HashSet<PathBuf>>,
    released: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no one else holds `key`, then claim it.
    pub fn acquire(&self, key: &Path) -> InFlightGuard<'_> {
        // A panicking holder can't leave the set inconsistent: its guard's
        // Drop still runs during unwinding.
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        while active.contains(key) {
            active = self
                .released
                .wait(active)
                .unwrap_or_else(PoisonError::into_inner);
        }
        active.insert(key.to_path_buf());
        InFlightGuard {
            owner: self,
            key: key.to_path_buf(),
        }
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    key: PathBuf,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut active = self
            .owner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        active.remove(&self.key);
        self.owner.released.notify_all();
    }
}
