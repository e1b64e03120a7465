//! Decoding of the four object payload kinds: commit, tree, blob, tag.
use std::fmt;
use std::str;

use crate::error::{GitError, Result};
use crate::hash::Hash;
use crate::num;

/// The tag byte a loose object's header carries (`"<kind> <size>\0"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl Kind {
    pub(crate) fn from_str(s: &str) -> Option<Kind> {
        match s {
            "commit" => Some(Kind::Commit),
            "tree" => Some(Kind::Tree),
            "blob" => Some(Kind::Blob),
            "tag" => Some(Kind::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Kind::Commit => "commit",
            Kind::Tree => "tree",
            Kind::Blob => "blob",
            Kind::Tag => "tag",
        };
        write!(f, "{}", s)
    }
}

/// Author/committer/tagger identity line: `Name <email> timestamp ±HHMM`.
///
/// A malformed line never fails decoding — it produces the sentinel
/// identity below instead, per spec §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub timestamp: u64,
    pub timezone: String,
}

impl Identity {
    fn sentinel() -> Identity {
        Identity {
            name: "Unknown".to_string(),
            email: "unknown@example.com".to_string(),
            timestamp: 0,
            timezone: "+0000".to_string(),
        }
    }

    /// Parses the remainder of an `author`/`committer`/`tagger` header line,
    /// i.e. everything after the role keyword has already been stripped.
    fn parse(rest: &str) -> Identity {
        Self::try_parse(rest).unwrap_or_else(Identity::sentinel)
    }

    fn try_parse(rest: &str) -> Option<Identity> {
        // `^(.+) <(.+)> (\d+) ([+-]\d{4})$`, applied by hand rather than
        // pulling in a regex engine for one fixed pattern.
        let tz_start = rest.len().checked_sub(5)?;
        let timezone = &rest[tz_start..];
        if !is_timezone(timezone) {
            return None;
        }
        let rest = rest[..tz_start].strip_suffix(' ')?;

        let space = rest.rfind(' ')?;
        let timestamp_str = &rest[space + 1..];
        if timestamp_str.is_empty() || !timestamp_str.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let timestamp: u64 = timestamp_str.parse().ok()?;
        let rest = &rest[..space];

        let rest = rest.strip_suffix('>')?;
        let open = rest.rfind(" <")?;
        let email = &rest[open + 2..];
        let name = &rest[..open];
        if name.is_empty() || email.is_empty() {
            return None;
        }

        Some(Identity {
            name: name.to_string(),
            email: email.to_string(),
            timestamp,
            timezone: timezone.to_string(),
        })
    }
}

fn is_timezone(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 5
        && (bytes[0] == b'+' || bytes[0] == b'-')
        && bytes[1..].iter().all(|b| b.is_ascii_digit())
}

/// A decoded commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: Hash,
    pub tree: Hash,
    pub parents: Vec<Hash>,
    pub author: Identity,
    pub committer: Identity,
    /// First physical line of the message (spec's chosen interpretation —
    /// see SPEC_FULL §9 open question).
    pub message: String,
    /// Full message body, leading/trailing whitespace trimmed.
    pub full_message: String,
}

/// Classification of a tree entry's mode, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule (gitlink); recognized but never traversed.
    Commit,
    Unknown,
}

fn classify_mode(mode: &str) -> EntryKind {
    if mode.starts_with("100") {
        EntryKind::Blob
    } else if mode == "40000" || mode == "040000" {
        EntryKind::Tree
    } else if mode == "160000" {
        EntryKind::Commit
    } else {
        EntryKind::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: EntryKind,
    pub name: String,
    pub hash: Hash,
}

/// A decoded tree object: an ordered list of entries, in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

/// A decoded annotated tag object. Lightweight tags never reach here — they
/// are represented purely as a [`crate::refs::Tag`] pointing at a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTag {
    pub target: Hash,
    pub name: String,
    pub tagger: Option<Identity>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Commit(Commit),
    Tree(Tree),
    Blob(Vec<u8>),
    Tag(AnnotatedTag),
}

/// Splits `payload` into (header lines, message body) at the first blank
/// line. `gpgsig`-style continuation lines (lines beginning with a single
/// space) are folded onto the header line they follow rather than being
/// treated as a new header or mistaken for the blank-line terminator.
fn split_headers(payload: &str) -> (Vec<String>, &str) {
    let mut lines: Vec<String> = Vec::new();
    let mut offset = 0;

    loop {
        let line_end = match payload[offset..].find('\n') {
            Some(idx) => offset + idx,
            None => {
                if offset < payload.len() {
                    lines.push(payload[offset..].to_string());
                }
                return (lines, "");
            }
        };
        let line = &payload[offset..line_end];
        offset = line_end + 1;

        if line.is_empty() {
            return (lines, &payload[offset..]);
        }
        if line.starts_with(' ') {
            if let Some(last) = lines.last_mut() {
                last.push('\n');
                last.push_str(line);
                continue;
            }
        }
        lines.push(line.to_string());
    }
}

pub(crate) fn decode_commit(hash: Hash, payload: &[u8]) -> Result<Commit> {
    let text = String::from_utf8_lossy(payload);
    let (headers, body) = split_headers(&text);

    let mut tree = None;
    let mut parents = Vec::new();
    let mut author = None;
    let mut committer = None;

    for line in &headers {
        let (key, rest) = match line.split_once(' ') {
            Some(pair) => pair,
            None => continue,
        };
        match key {
            "tree" => tree = Hash::from_hex(rest),
            "parent" => {
                if let Some(id) = Hash::from_hex(rest) {
                    parents.push(id);
                }
            }
            "author" => author = Some(Identity::parse(rest)),
            "committer" => committer = Some(Identity::parse(rest)),
            // gpgsig and any other header we don't recognize: skip.
            _ => {}
        }
    }

    let tree = tree.ok_or_else(|| GitError::Corrupt {
        hash,
        reason: "commit missing tree header".to_string(),
    })?;
    let author = author.ok_or_else(|| GitError::Corrupt {
        hash,
        reason: "commit missing author header".to_string(),
    })?;
    let committer = committer.ok_or_else(|| GitError::Corrupt {
        hash,
        reason: "commit missing committer header".to_string(),
    })?;

    let full_message = body.trim().to_string();
    let message = full_message.lines().next().unwrap_or("").to_string();

    Ok(Commit {
        hash,
        tree,
        parents,
        author,
        committer,
        message,
        full_message,
    })
}

pub(crate) fn decode_tree(hash: Hash, payload: &[u8]) -> Result<Tree> {
    let mut rest = payload;
    let mut entries = Vec::new();

    while !rest.is_empty() {
        let space = rest
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| GitError::Corrupt {
                hash,
                reason: "truncated tree entry mode".to_string(),
            })?;
        let mode_bytes = &rest[..space];
        num::parse_octal(mode_bytes).ok_or_else(|| GitError::Corrupt {
            hash,
            reason: "invalid tree entry mode".to_string(),
        })?;
        let mode = str::from_utf8(mode_bytes)
            .map_err(|_| GitError::Corrupt {
                hash,
                reason: "non-ascii tree entry mode".to_string(),
            })?
            .to_string();
        rest = &rest[space + 1..];

        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GitError::Corrupt {
                hash,
                reason: "truncated tree entry name".to_string(),
            })?;
        let name = String::from_utf8_lossy(&rest[..nul]).into_owned();
        rest = &rest[nul + 1..];

        if rest.len() < 20 {
            return Err(GitError::Corrupt {
                hash,
                reason: "truncated tree entry hash".to_string(),
            });
        }
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&rest[..20]);
        rest = &rest[20..];

        entries.push(TreeEntry {
            kind: classify_mode(&mode),
            mode,
            name,
            hash: Hash::from_raw(raw),
        });
    }

    Ok(Tree { entries })
}

pub(crate) fn decode_tag(payload: &[u8]) -> AnnotatedTag {
    let text = String::from_utf8_lossy(payload);
    let (headers, body) = split_headers(&text);

    let mut target = None;
    let mut name = String::new();
    let mut tagger = None;

    for line in &headers {
        let (key, rest) = match line.split_once(' ') {
            Some(pair) => pair,
            None => continue,
        };
        match key {
            "object" => target = Hash::from_hex(rest),
            "tag" => name = rest.to_string(),
            "tagger" => tagger = Some(Identity::parse(rest)),
            _ => {}
        }
    }

    AnnotatedTag {
        // Spec §4.2.4: missing `object` falls back to the ref's raw value,
        // which the caller (refs::list_tags) substitutes when this is zero.
        target: target.unwrap_or_else(|| Hash::from_raw([0; 20])),
        name,
        tagger,
        message: body.trim().to_string(),
    }
}

pub(crate) fn decode(hash: Hash, kind: Kind, payload: &[u8]) -> Result<Object> {
    Ok(match kind {
        Kind::Commit => Object::Commit(decode_commit(hash, payload)?),
        Kind::Tree => Object::Tree(decode_tree(hash, payload)?),
        Kind::Blob => Object::Blob(payload.to_vec()),
        Kind::Tag => Object::Tag(decode_tag(payload)),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identity_parses_well_formed_line() {
        let id = Identity::parse("lf- <lf-@users.noreply.github.com> 1586391037 -0700");
        assert_eq!(id.name, "lf-");
        assert_eq!(id.email, "lf-@users.noreply.github.com");
        assert_eq!(id.timestamp, 1586391037);
        assert_eq!(id.timezone, "-0700");
    }

    #[test]
    fn identity_falls_back_to_sentinel_on_malformed_input() {
        let id = Identity::parse("this is not an identity line");
        assert_eq!(id, Identity::sentinel());
    }

    #[test]
    fn identity_falls_back_to_sentinel_on_empty_email() {
        let id = Identity::parse("Foo <> 1600000000 +0000");
        assert_eq!(id, Identity::sentinel());
    }

    #[test]
    fn identity_handles_names_containing_angle_brackets() {
        let id = Identity::parse("A <B> Name <email@example.com> 1 +0000");
        assert_eq!(id.name, "A <B> Name");
        assert_eq!(id.email, "email@example.com");
    }

    #[test]
    fn commit_decode_splits_message_first_line() {
        let payload = b"tree 94546d68dc6002b85cc2d7df077c7c6bb080abb0\n\
             author lf- <lf-@users.noreply.github.com> 1586391037 -0700\n\
             committer lf- <lf-@users.noreply.github.com> 1586391037 -0700\n\n\
             Summary line\n\nBody paragraph.\n";
        let hash = Hash::from_raw([0; 20]);
        let commit = decode_commit(hash, payload).unwrap();
        assert_eq!(commit.message, "Summary line");
        assert_eq!(commit.full_message, "Summary line\n\nBody paragraph.");
        assert!(commit.parents.is_empty());
    }

    #[test]
    fn commit_decode_preserves_parent_order() {
        let payload = b"tree 94546d68dc6002b85cc2d7df077c7c6bb080abb0\n\
             parent d55912e4475329fde95d52d619abd413e4001d68\n\
             parent d30826db9da3aebc9ab7fc095dd964920fc299bf\n\
             author lf- <lf-@users.noreply.github.com> 1586391037 -0700\n\
             committer lf- <lf-@users.noreply.github.com> 1586391037 -0700\n\n\
             Merge branch 'branch2'\n";
        let hash = Hash::from_raw([0; 20]);
        let commit = decode_commit(hash, payload).unwrap();
        assert_eq!(
            commit.parents,
            vec![
                Hash::from_hex("d55912e4475329fde95d52d619abd413e4001d68").unwrap(),
                Hash::from_hex("d30826db9da3aebc9ab7fc095dd964920fc299bf").unwrap(),
            ]
        );
    }

    #[test]
    fn commit_decode_folds_gpgsig_continuation_lines() {
        // Built via `.concat()` rather than backslash-continued source
        // lines: a `\` line continuation strips *all* leading whitespace
        // from the following source line, which would silently eat the
        // single leading space that marks each of these as a continuation
        // of `gpgsig` rather than a new header (or, for the blank one, the
        // real end of headers).
        let payload = [
            b"tree 94546d68dc6002b85cc2d7df077c7c6bb080abb0\n".as_slice(),
            b"gpgsig -----BEGIN PGP SIGNATURE-----\n".as_slice(),
            b" \n".as_slice(),
            b" iQEzBAABCAAdFiEE\n".as_slice(),
            b" -----END PGP SIGNATURE-----\n".as_slice(),
            b"author lf- <lf-@users.noreply.github.com> 1586391037 -0700\n".as_slice(),
            b"committer lf- <lf-@users.noreply.github.com> 1586391037 -0700\n".as_slice(),
            b"\n".as_slice(),
            b"Signed commit\n".as_slice(),
        ]
        .concat();
        let hash = Hash::from_raw([0; 20]);
        let commit = decode_commit(hash, &payload).unwrap();
        assert_eq!(commit.message, "Signed commit");
        assert_eq!(commit.author.email, "lf-@users.noreply.github.com");
    }

    #[test]
    fn tree_decode_preserves_entry_order_and_classifies_kind() {
        let payload = [
            b"40000 d\x00".as_slice(),
            &[0xAAu8, 0xBB, 0x1d, 0x5f, 0x74, 0x62, 0x6c, 0x12, 0x2f, 0x34, 0x7d, 0x37, 0x56, 0x41, 0x72, 0x78, 0x9a, 0x1c, 0x7f, 0xcd],
            b"100644 hello.txt\x00".as_slice(),
            &[0xefu8, 0x01, 0x36, 0x25, 0x03, 0x0b, 0xaa, 0xbb, 0xcc, 0x06, 0xdd, 0x56, 0xee, 0x7f, 0xff, 0xaa, 0xbb, 0x46, 0x4a, 0x01],
        ]
        .concat();
        let hash = Hash::from_raw([0; 20]);
        let tree = decode_tree(hash, &payload).unwrap();
        assert_eq!(tree.entries.len(), 2);
        assert_eq!(tree.entries[0].name, "d");
        assert_eq!(tree.entries[0].kind, EntryKind::Tree);
        assert_eq!(tree.entries[1].name, "hello.txt");
        assert_eq!(tree.entries[1].kind, EntryKind::Blob);
    }

    #[test]
    fn tree_decode_recognizes_submodule_mode() {
        let payload = [b"160000 sub\x00".as_slice(), &[0u8; 20]].concat();
        let hash = Hash::from_raw([0; 20]);
        let tree = decode_tree(hash, &payload).unwrap();
        assert_eq!(tree.entries[0].kind, EntryKind::Commit);
    }

    #[test]
    fn tag_decode_falls_back_when_object_header_missing() {
        let tag = decode_tag(b"tag v1.0\n\nRelease\n");
        assert_eq!(tag.name, "v1.0");
        assert_eq!(tag.message, "Release");
        // Caller substitutes the ref's raw value when target is the zero hash.
        assert_eq!(tag.target, Hash::from_raw([0; 20]));
    }
}
