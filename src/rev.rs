//! Resolves a revision string (full hash, abbreviated hash, or ref name) to
//! a `Hash` for the CLI's benefit — not part of the library's core
//! decode/walk contract, but useful plumbing in the teacher's `rev-parse`
//! tradition.
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::hash::Hash;
use crate::store::ObjectStore;

#[derive(Debug, Error)]
pub enum RevError {
    #[error("ambiguous revision {0}")]
    Ambiguous(String),
    #[error("unknown revision {0}")]
    NotFound(String),
}

fn looks_like_sha(s: &str) -> bool {
    (4..=40).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn read_ref_file(path: &Path) -> Option<Hash> {
    let content = fs::read_to_string(path).ok()?;
    Hash::from_hex(content.trim())
}

/// Looks for `rev` as a ref name under the usual loose-ref search paths.
fn find_refname(rev: &str, git_dir: &Path) -> Option<Hash> {
    for candidate in ["", "refs", "refs/tags", "refs/heads", "refs/remotes"] {
        if let Some(hash) = read_ref_file(&git_dir.join(candidate).join(rev)) {
            return Some(hash);
        }
    }
    read_ref_file(&git_dir.join("refs/remotes").join(rev).join("HEAD"))
}

/// Disambiguates a hex prefix against the loose-object directory fan-out.
fn resolve_abbreviated(store: &ObjectStore, prefix: &str) -> Result<Option<Hash>, RevError> {
    if prefix.len() < 4 {
        return Ok(None);
    }
    let fan_out_dir = store.root().join("objects").join(&prefix[..2]);
    let entries = match fs::read_dir(&fan_out_dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(None),
    };

    let mut found = None;
    for entry in entries.flatten() {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if name.starts_with(&prefix[2..]) {
            if found.is_some() {
                return Err(RevError::Ambiguous(prefix.to_string()));
            }
            let full = format!("{}{}", &prefix[..2], name);
            found = Hash::from_hex(&full);
        }
    }
    Ok(found)
}

/// Resolves `rev` against the repository: a full or abbreviated hash is
/// tried first, then the usual ref-name search paths, then `HEAD`.
pub fn resolve(store: &ObjectStore, rev: &str) -> Result<Hash, RevError> {
    if looks_like_sha(rev) {
        if rev.len() == 40 {
            if let Some(hash) = Hash::from_hex(rev) {
                return Ok(hash);
            }
        } else if let Some(hash) = resolve_abbreviated(store, rev)? {
            return Ok(hash);
        }
    }

    if let Some(hash) = find_refname(rev, store.root()) {
        return Ok(hash);
    }

    if rev == "HEAD" || rev == "@" {
        if let Some(hash) = read_ref_file(&store.root().join("HEAD")) {
            return Ok(hash);
        }
        if let Some(name) = crate::refs::current_branch(store) {
            if let Some(hash) = read_ref_file(&store.root().join("refs/heads").join(name)) {
                return Ok(hash);
            }
        }
    }

    Err(RevError::NotFound(rev.to_string()))
}
