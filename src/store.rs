//! Locates, decompresses, and frames loose objects by hash.
use std::fs;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clru::CLruCache;
use flate2::bufread::ZlibDecoder;
use log::{debug, warn};

use crate::error::{GitError, Result};
use crate::hash::Hash;
use crate::objects::{self, Kind, Object};

/// Default number of decoded `(kind, payload)` pairs the object cache holds.
const DEFAULT_CACHE_ENTRIES: usize = 512;

/// The object store: a loose-object `.git` directory plus a bounded,
/// invalidation-free cache (objects are immutable, so nothing ever needs
/// to be evicted for correctness — only for bounding memory).
pub struct ObjectStore {
    /// Path to the `.git` directory itself (not the worktree root).
    root: PathBuf,
    cache: Mutex<CLruCache<Hash, (Kind, Arc<[u8]>)>>,
}

impl ObjectStore {
    /// Opens the object store at `repo_path`. Accepts either the worktree
    /// root (a `.git` child is looked for) or the `.git` directory itself.
    pub fn open(repo_path: impl AsRef<Path>) -> Result<ObjectStore> {
        Self::open_with_cache_size(repo_path, DEFAULT_CACHE_ENTRIES)
    }

    pub fn open_with_cache_size(
        repo_path: impl AsRef<Path>,
        cache_entries: usize,
    ) -> Result<ObjectStore> {
        let repo_path = repo_path.as_ref();
        let root = if repo_path.join("HEAD").is_file() && repo_path.join("objects").is_dir() {
            repo_path.to_path_buf()
        } else {
            repo_path.join(".git")
        };

        if !root.join("HEAD").is_file() || !root.join("objects").is_dir() {
            return Err(GitError::NotARepository(repo_path.display().to_string()));
        }

        let capacity = NonZeroUsize::new(cache_entries.max(1)).unwrap();
        Ok(ObjectStore {
            root,
            cache: Mutex::new(CLruCache::new(capacity)),
        })
    }

    /// The `.git` directory this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, hash: &Hash) -> PathBuf {
        let hex = hash.to_hex();
        self.root.join("objects").join(&hex[..2]).join(&hex[2..])
    }

    /// Returns whether a loose object exists on disk for `hash`, without
    /// reading or decompressing it.
    pub fn has(&self, hash: &Hash) -> bool {
        self.path_for(hash).is_file()
    }

    fn read_raw(&self, hash: &Hash) -> Result<(Kind, Arc<[u8]>)> {
        if let Some(hit) = self.cache.lock().unwrap().get(hash) {
            return Ok(hit.clone());
        }

        let path = self.path_for(hash);
        let compressed = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::NotFound(hash.to_hex())
            } else {
                GitError::Io(e)
            }
        })?;

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw).map_err(|_| GitError::Corrupt {
            hash: *hash,
            reason: "failed to inflate object".to_string(),
        })?;

        let nul = raw.iter().position(|&b| b == 0).ok_or_else(|| GitError::Corrupt {
            hash: *hash,
            reason: "missing NUL after object header".to_string(),
        })?;
        let header = std::str::from_utf8(&raw[..nul]).map_err(|_| GitError::Corrupt {
            hash: *hash,
            reason: "non-ascii object header".to_string(),
        })?;
        let (kind_str, size_str) = header.split_once(' ').ok_or_else(|| GitError::Corrupt {
            hash: *hash,
            reason: format!("malformed object header {:?}", header),
        })?;
        let kind = Kind::from_str(kind_str).ok_or_else(|| GitError::Corrupt {
            hash: *hash,
            reason: format!("unsupported object kind {:?}", kind_str),
        })?;
        let size: usize = size_str.parse().map_err(|_| GitError::Corrupt {
            hash: *hash,
            reason: format!("non-numeric object size {:?}", size_str),
        })?;

        let payload = &raw[nul + 1..];
        if payload.len() != size {
            return Err(GitError::Corrupt {
                hash: *hash,
                reason: format!("declared size {} does not match payload length {}", size, payload.len()),
            });
        }

        let payload: Arc<[u8]> = Arc::from(payload);
        self.cache.lock().unwrap().put(*hash, (kind, payload.clone()));
        Ok((kind, payload))
    }

    /// Reads and decodes the object at `hash` into its typed form.
    pub fn open_object(&self, hash: &Hash) -> Result<Object> {
        let (kind, payload) = self.read_raw(hash)?;
        objects::decode(*hash, kind, &payload)
    }

    /// Reads the raw `(kind, payload)` pair without decoding, as exposed by
    /// `Repository::read_object` in the public API.
    pub fn read_object(&self, hash: &Hash) -> Result<(Kind, Vec<u8>)> {
        let (kind, payload) = self.read_raw(hash)?;
        Ok((kind, payload.to_vec()))
    }

    /// Best-effort lookup used by the ref resolver and history walker: logs
    /// and returns `None` instead of propagating an error, matching spec
    /// §7's policy that a single bad object must not abort a larger walk.
    pub(crate) fn try_open_commit(&self, hash: &Hash) -> Option<crate::objects::Commit> {
        match self.open_object(hash) {
            Ok(Object::Commit(c)) => Some(c),
            Ok(_) => {
                warn!("object {} is not a commit", hash);
                None
            }
            Err(e) => {
                debug!("skipping unreadable commit {}: {}", hash, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::FixtureRepo;

    #[test]
    fn open_rejects_non_repository_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ObjectStore::open(dir.path()).is_err());
    }

    #[test]
    fn round_trips_a_stored_blob() {
        let fixture = FixtureRepo::new();
        let hash = fixture.write_blob(b"hello\n");
        let store = ObjectStore::open(fixture.path()).unwrap();
        let (kind, content) = store.read_object(&hash).unwrap();
        assert_eq!(kind, Kind::Blob);
        assert_eq!(content, b"hello\n");
    }

    #[test]
    fn missing_object_is_not_found() {
        let fixture = FixtureRepo::new();
        let store = ObjectStore::open(fixture.path()).unwrap();
        let hash = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();
        assert!(matches!(store.read_object(&hash), Err(GitError::NotFound(_))));
    }

    #[test]
    fn corrupt_zlib_stream_is_reported_as_corrupt() {
        let fixture = FixtureRepo::new();
        let hash = Hash::from_hex("abababababababababababababababababababab").unwrap();
        fixture.write_garbage_object(&hash, b"not zlib data");
        let store = ObjectStore::open(fixture.path()).unwrap();
        assert!(matches!(store.read_object(&hash), Err(GitError::Corrupt { .. })));
    }
}
