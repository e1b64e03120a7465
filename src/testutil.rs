//! Fixture-repo builder used by tests. Writes loose objects directly to
//! disk so tests never need to shell out to a real `git` binary — the
//! crate's only write path, kept out of the public API proper.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};
use tempfile::TempDir;

use crate::hash::Hash;

pub struct FixtureRepo {
    dir: TempDir,
}

impl FixtureRepo {
    /// Creates an empty repository: `HEAD` pointing at `refs/heads/main`
    /// (which does not yet exist, as in a freshly initialized repo), and
    /// the `objects`/`refs/heads`/`refs/tags` directories.
    pub fn new() -> FixtureRepo {
        let dir = TempDir::new().expect("create tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("objects")).unwrap();
        fs::create_dir_all(root.join("refs/heads")).unwrap();
        fs::create_dir_all(root.join("refs/tags")).unwrap();
        fs::write(root.join("HEAD"), b"ref: refs/heads/main\n").unwrap();
        FixtureRepo { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn object_path(&self, hash: &Hash) -> PathBuf {
        let hex = hash.to_hex();
        self.path().join("objects").join(&hex[..2]).join(&hex[2..])
    }

    fn store_object(&self, kind: &str, payload: &[u8]) -> Hash {
        let mut framed = Vec::new();
        framed.extend_from_slice(kind.as_bytes());
        framed.push(b' ');
        framed.extend_from_slice(payload.len().to_string().as_bytes());
        framed.push(0);
        framed.extend_from_slice(payload);

        let mut hasher = Sha1::new();
        hasher.update(&framed);
        let digest = hasher.finalize();
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&digest);
        let hash = Hash::from_raw(raw);

        let path = self.object_path(&hash);
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&framed).unwrap();
        let compressed = encoder.finish().unwrap();
        fs::write(path, compressed).unwrap();

        hash
    }

    pub fn write_blob(&self, content: &[u8]) -> Hash {
        self.store_object("blob", content)
    }

    /// `entries`: `(mode, name, hash)`, written in the given order.
    pub fn write_tree(&self, entries: &[(&str, &str, Hash)]) -> Hash {
        let mut payload = Vec::new();
        for (mode, name, hash) in entries {
            payload.extend_from_slice(mode.as_bytes());
            payload.push(b' ');
            payload.extend_from_slice(name.as_bytes());
            payload.push(0);
            payload.extend_from_slice(hash.raw());
        }
        self.store_object("tree", &payload)
    }

    pub fn write_commit(
        &self,
        tree: Hash,
        parents: &[Hash],
        who_line: &str,
        message: &str,
    ) -> Hash {
        let mut payload = format!("tree {}\n", tree);
        for parent in parents {
            payload.push_str(&format!("parent {}\n", parent));
        }
        payload.push_str(&format!("author {}\n", who_line));
        payload.push_str(&format!("committer {}\n", who_line));
        payload.push('\n');
        payload.push_str(message);
        self.store_object("commit", payload.as_bytes())
    }

    pub fn write_annotated_tag(&self, target: Hash, name: &str, who_line: &str, message: &str) -> Hash {
        let payload = format!(
            "object {}\ntype commit\ntag {}\ntagger {}\n\n{}",
            target, name, who_line, message
        );
        self.store_object("tag", payload.as_bytes())
    }

    /// Writes arbitrary bytes straight to an object's on-disk path,
    /// bypassing zlib framing entirely — used to simulate a corrupt object.
    pub fn write_garbage_object(&self, hash: &Hash, bytes: &[u8]) {
        let path = self.object_path(hash);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    pub fn write_branch(&self, name: &str, hash: Hash) {
        let path = self.path().join("refs/heads").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("{}\n", hash)).unwrap();
    }

    pub fn write_lightweight_tag(&self, name: &str, hash: Hash) {
        let path = self.path().join("refs/tags").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("{}\n", hash)).unwrap();
    }

    pub fn write_annotated_tag_ref(&self, name: &str, tag_object: Hash) {
        let path = self.path().join("refs/tags").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("{}\n", tag_object)).unwrap();
    }

    pub fn set_head_branch(&self, name: &str) {
        fs::write(self.path().join("HEAD"), format!("ref: refs/heads/{}\n", name)).unwrap();
    }

    pub fn set_head_detached(&self, hash: Hash) {
        fs::write(self.path().join("HEAD"), format!("{}\n", hash)).unwrap();
    }
}

impl Default for FixtureRepo {
    fn default() -> Self {
        Self::new()
    }
}
