//! Fixed-width key segment shared read-only by every worker.
//!
//! The segment is a file of `len * width` bytes, each key stored as UTF-8 and
//! NUL-padded to `width`. It is created in `/dev/shm` when available so the
//! mapping never touches disk. Workers attach through a [`CorpusHandle`] and
//! get a private read-only mapping of the same pages; the [`KeySegment`] owner
//! removes the file when released or dropped.

use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::CorpusError;

const SEGMENT_PREFIX: &str = "fuzzy-merge-keys-";

/// Everything a worker needs to attach: segment name plus shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusHandle {
    pub name: PathBuf,
    pub len: usize,
    pub width: usize,
}

impl CorpusHandle {
    pub fn byte_len(&self) -> usize {
        self.len * self.width
    }

    /// Map the segment read-only. The view holds its own mapping and
    /// unmaps when dropped; it never removes the segment.
    pub fn attach(&self) -> Result<KeyView, CorpusError> {
        let attach_err = |source| CorpusError::Attach {
            name: self.name.clone(),
            source,
        };
        let file = File::open(&self.name).map_err(attach_err)?;
        let actual = file.metadata().map_err(attach_err)?.len() as usize;
        if actual != self.byte_len() {
            return Err(CorpusError::ShapeMismatch {
                name: self.name.clone(),
                expected: self.byte_len(),
                actual,
            });
        }
        let map = if actual == 0 {
            None
        } else {
            // SAFETY: the owning KeySegment never writes to the file after
            // publication and outlives every attached view.
            Some(unsafe { Mmap::map(&file) }.map_err(attach_err)?)
        };
        Ok(KeyView {
            map,
            len: self.len,
            width: self.width,
        })
    }
}

/// Read-only view of the published keys.
#[derive(Debug)]
pub struct KeyView {
    map: Option<Mmap>,
    len: usize,
    width: usize,
}

impl KeyView {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        if idx >= self.len {
            return None;
        }
        let bytes = self.map.as_deref()?;
        let slot = &bytes[idx * self.width..(idx + 1) * self.width];
        let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
        // publish only writes whole UTF-8 strings
        std::str::from_utf8(&slot[..end]).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len).map(move |i| self.get(i).unwrap_or_default())
    }

    /// Borrowed key slice for the matcher.
    pub fn keys(&self) -> Vec<&str> {
        self.iter().collect()
    }
}

/// Owner of a published segment. Dropping it removes the segment, so an
/// aborted run never leaves one behind.
#[derive(Debug)]
pub struct KeySegment {
    file: NamedTempFile,
    handle: CorpusHandle,
}

impl KeySegment {
    /// Write `keys` into a fresh segment under `dir` (or the default segment
    /// directory) at the width of the longest key.
    pub fn publish<S: AsRef<str>>(keys: &[S], dir: Option<&Path>) -> Result<Self, CorpusError> {
        let width = keys.iter().map(|k| k.as_ref().len()).max().unwrap_or(0).max(1);
        Self::publish_with_width(keys, width, dir)
    }

    pub fn publish_with_width<S: AsRef<str>>(
        keys: &[S],
        width: usize,
        dir: Option<&Path>,
    ) -> Result<Self, CorpusError> {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(default_segment_dir);
        let alloc_err = |source| CorpusError::Allocate {
            dir: dir.clone(),
            source,
        };
        for (index, key) in keys.iter().enumerate() {
            let len = key.as_ref().len();
            if len > width {
                return Err(CorpusError::KeyTooWide { index, len, width });
            }
        }
        let file = tempfile::Builder::new()
            .prefix(SEGMENT_PREFIX)
            .tempfile_in(&dir)
            .map_err(alloc_err)?;
        {
            let mut w = BufWriter::new(file.as_file());
            let pad = vec![0u8; width];
            for key in keys {
                let bytes = key.as_ref().as_bytes();
                w.write_all(bytes).map_err(alloc_err)?;
                w.write_all(&pad[bytes.len()..]).map_err(alloc_err)?;
            }
            w.flush().map_err(alloc_err)?;
        }
        file.as_file().sync_all().map_err(alloc_err)?;
        let handle = CorpusHandle {
            name: file.path().to_path_buf(),
            len: keys.len(),
            width,
        };
        log::debug!(
            "published {} keys x {} bytes to {}",
            handle.len,
            handle.width,
            handle.name.display()
        );
        Ok(Self { file, handle })
    }

    pub fn handle(&self) -> &CorpusHandle {
        &self.handle
    }

    /// Remove the segment. Takes `self` so no borrowed handle can outlive it.
    pub fn release(self) -> Result<(), CorpusError> {
        let name = self.handle.name.clone();
        self.file.close().map_err(|source| CorpusError::Release {
            name: name.clone(),
            source,
        })?;
        log::debug!("released key segment {}", name.display());
        Ok(())
    }
}

/// `/dev/shm` on hosts that have it, otherwise the system temp dir.
pub fn default_segment_dir() -> PathBuf {
    let shm = Path::new("/dev/shm");
    if shm.is_dir() {
        shm.to_path_buf()
    } else {
        std::env::temp_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_attach_roundtrip_keys() {
        let dir = tempfile::tempdir().unwrap();
        let keys = ["acme corporation", "other co", ""];
        let seg = KeySegment::publish(&keys, Some(dir.path())).unwrap();
        let h = seg.handle().clone();
        assert_eq!(h.len, 3);
        assert_eq!(h.width, "acme corporation".len());
        let view = h.attach().unwrap();
        assert_eq!(view.keys(), keys.to_vec());
        assert_eq!(view.get(3), None);
        drop(view);
        seg.release().unwrap();
        assert!(!h.name.exists());
    }

    #[test]
    fn views_are_independent_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let seg = KeySegment::publish(&["société", "x"], Some(dir.path())).unwrap();
        let a = seg.handle().attach().unwrap();
        let b = seg.handle().attach().unwrap();
        drop(a);
        assert_eq!(b.get(0), Some("société"));
        drop(b);
        seg.release().unwrap();
    }

    #[test]
    fn drop_removes_segment() {
        let dir = tempfile::tempdir().unwrap();
        let name = {
            let seg = KeySegment::publish(&["a"], Some(dir.path())).unwrap();
            seg.handle().name.clone()
        };
        assert!(!name.exists());
    }

    #[test]
    fn empty_corpus_attaches() {
        let dir = tempfile::tempdir().unwrap();
        let keys: [&str; 0] = [];
        let seg = KeySegment::publish(&keys, Some(dir.path())).unwrap();
        let view = seg.handle().attach().unwrap();
        assert!(view.is_empty());
        assert!(view.keys().is_empty());
    }

    #[test]
    fn rejects_keys_wider_than_segment() {
        let dir = tempfile::tempdir().unwrap();
        let err = KeySegment::publish_with_width(&["abcd", "abcdef"], 4, Some(dir.path()))
            .unwrap_err();
        assert!(matches!(
            err,
            CorpusError::KeyTooWide {
                index: 1,
                len: 6,
                width: 4
            }
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let seg = KeySegment::publish(&["abc"], Some(dir.path())).unwrap();
        let mut h = seg.handle().clone();
        h.len = 2;
        let err = h.attach().unwrap_err();
        assert!(matches!(
            err,
            CorpusError::ShapeMismatch {
                expected: 6,
                actual: 3,
                ..
            }
        ));
    }
}
