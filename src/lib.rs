//! A read-only inspector for loose-object repositories: decodes commits,
//! trees, tags, and blobs straight off disk and exposes the commit graph,
//! refs, and tree/blob diffs as typed values. Never writes to the
//! repository it reads.
pub mod diff;
pub mod error;
pub mod filter;
pub mod hash;
pub mod objects;
pub mod refs;
pub mod repository;
pub mod rev;
pub mod store;
pub mod treediff;
pub mod walk;

mod num;

#[cfg(any(test, feature = "testing"))]
pub mod testutil;

pub use diff::DiffRecord;
pub use error::{GitError, Result};
pub use filter::CommitFilter;
pub use hash::Hash;
pub use objects::{AnnotatedTag, Commit, EntryKind, Identity, Kind, Object, Tree, TreeEntry};
pub use refs::{Branch, Tag, TagKind};
pub use repository::{CommitComparison, CommitDetails, GraphNode, Repository, RepositorySummary, Stats};
pub use store::ObjectStore;
pub use treediff::{ChangeKind, FileChange};
