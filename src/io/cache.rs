//! Generic memoized fetch.
//!
//! Both data paths (per-date case snapshots and per-region/window trend
//! tables) share the same "read cache else fetch-and-write" shape; this module
//! holds the single implementation of that branching, parameterized by cache
//! path and by the read/fetch/write functions.

use std::path::Path;

use tracing::debug;

use crate::error::AppError;
use crate::io::table;

/// Return the cached value at `path` if it exists, otherwise fetch and
/// (when `persist` is set) store it before returning.
///
/// Cache hits bypass the fetch entirely, so reruns over the same inputs never
/// touch the network.
pub fn load_or_fetch<T>(
    path: &Path,
    persist: bool,
    read: impl FnOnce(&Path) -> Result<T, AppError>,
    fetch: impl FnOnce() -> Result<T, AppError>,
    write: impl FnOnce(&Path, &T) -> Result<(), AppError>,
) -> Result<T, AppError> {
    if table::path_exists(path) {
        debug!(path = %path.display(), "cache hit");
        return read(path);
    }

    debug!(path = %path.display(), "cache miss");
    let value = fetch()?;

    if persist {
        if let Some(parent) = path.parent() {
            table::create_dir_all(parent)?;
        }
        write(path, &value)?;
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn read_stub(_: &Path) -> Result<u32, AppError> {
        Ok(7)
    }

    #[test]
    fn miss_fetches_and_persists_then_hit_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("value.csv");
        let fetches = Cell::new(0u32);

        let fetch = || {
            fetches.set(fetches.get() + 1);
            Ok(7u32)
        };
        let write = |p: &Path, v: &u32| {
            std::fs::write(p, v.to_string()).map_err(|e| AppError::io(p, e))
        };

        let first = load_or_fetch(&path, true, read_stub, fetch, write).unwrap();
        assert_eq!(first, 7);
        assert_eq!(fetches.get(), 1);
        assert!(path.exists());

        // Second call must be served from cache.
        let second = load_or_fetch(
            &path,
            true,
            read_stub,
            || panic!("fetch must not run on a cache hit"),
            |_, _: &u32| panic!("write must not run on a cache hit"),
        )
        .unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn persist_false_skips_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.csv");

        let value = load_or_fetch(
            &path,
            false,
            read_stub,
            || Ok(3u32),
            |_, _: &u32| panic!("write must not run when persist is off"),
        )
        .unwrap();
        assert_eq!(value, 3);
        assert!(!path.exists());
    }

    #[test]
    fn fetch_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");

        let err = load_or_fetch(
            &path,
            true,
            read_stub,
            || Err(AppError::fetch("daily report", "404")),
            |_, _: &u32| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(!path.exists());
    }
}
