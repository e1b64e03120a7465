//! Enumerates branches, tags, and the current HEAD from loose ref files.
use std::fs;
use std::path::Path;

use log::warn;

use crate::error::Result;
use crate::hash::Hash;
use crate::objects::{Identity, Object};
use crate::store::ObjectStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub commit_sha: Hash,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    Lightweight,
    Annotated {
        tagger: Option<Identity>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit_sha: Hash,
    pub kind: TagKind,
}

fn read_ref_hash(path: &Path) -> Option<Hash> {
    let content = fs::read_to_string(path).ok()?;
    Hash::from_hex(content.trim())
}

/// Recursively collects `(relative_name, hash)` pairs under `dir`, skipping
/// unreadable entries with a diagnostic rather than failing the whole scan.
fn walk_refs(dir: &Path, prefix: &str, out: &mut Vec<(String, Hash)>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let file_name = entry.file_name();
        let name = match file_name.to_str() {
            Some(n) => n,
            None => {
                warn!("skipping non-UTF-8 ref name under {}", dir.display());
                continue;
            }
        };
        let qualified = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        };

        if path.is_dir() {
            walk_refs(&path, &qualified, out);
        } else if let Some(hash) = read_ref_hash(&path) {
            out.push((qualified, hash));
        } else {
            warn!("skipping unreadable ref file {}", path.display());
        }
    }
}

/// Reads `HEAD` and returns the branch name it points at, or `None` for a
/// detached HEAD (or a missing/unreadable `HEAD`).
pub fn current_branch(store: &ObjectStore) -> Option<String> {
    let content = fs::read_to_string(store.root().join("HEAD")).ok()?;
    let content = content.trim();
    content
        .strip_prefix("ref: refs/heads/")
        .map(|name| name.to_string())
}

pub fn list_branches(store: &ObjectStore) -> Result<Vec<Branch>> {
    let heads_dir = store.root().join("refs/heads");
    let mut raw = Vec::new();
    walk_refs(&heads_dir, "", &mut raw);

    let current = current_branch(store);
    let mut branches: Vec<Branch> = raw
        .into_iter()
        .map(|(name, commit_sha)| {
            let is_current = current.as_deref() == Some(name.as_str());
            Branch {
                name,
                commit_sha,
                is_current,
            }
        })
        .collect();
    branches.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(branches)
}

pub fn list_tags(store: &ObjectStore) -> Result<Vec<Tag>> {
    let tags_dir = store.root().join("refs/tags");
    let mut raw = Vec::new();
    walk_refs(&tags_dir, "", &mut raw);

    let mut tags = Vec::with_capacity(raw.len());
    for (name, ref_hash) in raw {
        match store.open_object(&ref_hash) {
            Ok(Object::Tag(annotated)) => {
                let zero = Hash::from_raw([0; 20]);
                let commit_sha = if annotated.target == zero {
                    ref_hash
                } else {
                    annotated.target
                };
                tags.push(Tag {
                    name,
                    commit_sha,
                    kind: TagKind::Annotated {
                        tagger: annotated.tagger,
                        message: annotated.message,
                    },
                });
            }
            Ok(_) => tags.push(Tag {
                name,
                commit_sha: ref_hash,
                kind: TagKind::Lightweight,
            }),
            Err(e) => {
                warn!("treating tag {} as lightweight after probe failed: {}", name, e);
                tags.push(Tag {
                    name,
                    commit_sha: ref_hash,
                    kind: TagKind::Lightweight,
                });
            }
        }
    }
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}
