//! The public facade: a handle on one on-disk repository.
use std::collections::BTreeSet;
use std::path::Path;

use crate::diff::DiffRecord;
use crate::error::{GitError, Result};
use crate::filter::CommitFilter;
use crate::hash::Hash;
use crate::objects::{Commit, Kind};
use crate::refs::{self, Branch, Tag, TagKind};
use crate::store::ObjectStore;
use crate::treediff::{self, FileChange};
use crate::{filter, walk};

/// A flattened commit view augmented with the branch/tag names that resolve
/// exactly to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub commit: Commit,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
}

/// `files_changed`/`additions`/`deletions` summed across a set of `FileChange`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub files_changed: usize,
    pub additions: u32,
    pub deletions: u32,
}

impl Stats {
    fn from_changes(changes: &[FileChange]) -> Stats {
        let mut stats = Stats {
            files_changed: changes.len(),
            ..Default::default()
        };
        for change in changes {
            stats.additions += change.additions;
            stats.deletions += change.deletions;
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDetails {
    pub commit: Commit,
    pub files: Vec<FileChange>,
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitComparison {
    pub commit_a: Commit,
    pub commit_b: Commit,
    pub files: Vec<FileChange>,
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    pub path: String,
    pub branches: Vec<Branch>,
    pub tags: Vec<Tag>,
    pub current_branch: Option<String>,
    pub sampled_commit_count: usize,
}

/// A handle on a single on-disk repository, wrapping its object store.
pub struct Repository {
    store: ObjectStore,
}

impl Repository {
    pub fn open(path: impl AsRef<Path>) -> Result<Repository> {
        Ok(Repository {
            store: ObjectStore::open(path)?,
        })
    }

    pub fn read_object(&self, hash: &Hash) -> Result<(Kind, Vec<u8>)> {
        self.store.read_object(hash)
    }

    /// The underlying object store, for callers (like the CLI) that need
    /// plumbing-level access — `rev::resolve` and raw object decoding —
    /// beyond the facade's own methods.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn list_branches(&self) -> Result<Vec<Branch>> {
        refs::list_branches(&self.store)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        refs::list_tags(&self.store)
    }

    pub fn current_branch(&self) -> Option<String> {
        refs::current_branch(&self.store)
    }

    pub fn get_commit(&self, hash: &Hash) -> Result<Commit> {
        match self.store.open_object(hash)? {
            crate::objects::Object::Commit(commit) => Ok(commit),
            _ => Err(GitError::NotFound(hash.to_hex())),
        }
    }

    pub fn walk_history(&self, roots: &[Hash], cap: usize) -> Vec<Commit> {
        walk::walk_history(&self.store, roots, cap)
    }

    /// Walks history from `roots` and joins each commit with the set of
    /// branch/tag names whose refs resolve exactly to it.
    pub fn commit_graph(&self, roots: &[Hash], cap: usize) -> Result<Vec<GraphNode>> {
        let commits = self.walk_history(roots, cap);
        let branches = self.list_branches()?;
        let tags = self.list_tags()?;

        Ok(commits
            .into_iter()
            .map(|commit| {
                let branch_names = branches
                    .iter()
                    .filter(|b| b.commit_sha == commit.hash)
                    .map(|b| b.name.clone())
                    .collect();
                let tag_names = tags
                    .iter()
                    .filter(|t| t.commit_sha == commit.hash)
                    .map(|t| t.name.clone())
                    .collect();
                GraphNode {
                    commit,
                    branches: branch_names,
                    tags: tag_names,
                }
            })
            .collect())
    }

    fn first_parent_tree(&self, commit: &Commit) -> Option<Hash> {
        commit
            .parents
            .first()
            .and_then(|parent| self.get_commit(parent).ok())
            .map(|parent| parent.tree)
    }

    /// Diffs `hash` against its first parent's tree (root commits compare
    /// against an empty tree; merge commits ignore every parent but the
    /// first).
    pub fn commit_details(&self, hash: &Hash) -> Result<CommitDetails> {
        let commit = self.get_commit(hash)?;
        let old_tree = self.first_parent_tree(&commit);
        let files = treediff::compare(&self.store, old_tree, commit.tree);
        let stats = Stats::from_changes(&files);
        Ok(CommitDetails {
            commit,
            files,
            stats,
        })
    }

    pub fn compare_trees(&self, old: Option<Hash>, new: Hash) -> Vec<FileChange> {
        treediff::compare(&self.store, old, new)
    }

    pub fn diff_blobs(
        &self,
        old: Option<Hash>,
        new: Option<Hash>,
        path: &str,
    ) -> Result<DiffRecord> {
        treediff::diff_blobs_by_hash(&self.store, old, new, path)
    }

    /// Composes `get_commit` on both sides with `compare_trees` into one bundle.
    pub fn compare_commits(&self, a: Hash, b: Hash) -> Result<CommitComparison> {
        let commit_a = self.get_commit(&a)?;
        let commit_b = self.get_commit(&b)?;
        let files = treediff::compare(&self.store, Some(commit_a.tree), commit_b.tree);
        let stats = Stats::from_changes(&files);
        Ok(CommitComparison {
            commit_a,
            commit_b,
            files,
            stats,
        })
    }

    pub fn filter_commits(&self, commits: &[Commit], predicate: &CommitFilter) -> Vec<Commit> {
        filter::filter_commits(&self.store, commits, predicate)
    }

    /// Assembles path, refs, and a BFS sample of history into one value, the
    /// way a dashboard landing page would want it in a single round trip.
    pub fn summary(&self, sample_cap: usize) -> Result<RepositorySummary> {
        let branches = self.list_branches()?;
        let tags = self.list_tags()?;
        let current_branch = self.current_branch();

        let roots: Vec<Hash> = {
            let mut set: BTreeSet<Hash> = branches.iter().map(|b| b.commit_sha).collect();
            set.extend(tags.iter().map(|t| t.commit_sha));
            set.into_iter().collect()
        };
        let sampled_commit_count = self.walk_history(&roots, sample_cap).len();

        Ok(RepositorySummary {
            path: self.store.root().display().to_string(),
            branches,
            tags,
            current_branch,
            sampled_commit_count,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::FixtureRepo;

    fn who() -> &'static str {
        "Tester <tester@example.com> 1000000000 +0000"
    }

    #[test]
    fn commit_details_root_commit_reports_additions_only() {
        let fixture = FixtureRepo::new();
        let blob = fixture.write_blob(b"hello\n");
        let tree = fixture.write_tree(&[("100644", "a.txt", blob)]);
        let commit = fixture.write_commit(tree, &[], who(), "init\n");

        let repo = Repository::open(fixture.path()).unwrap();
        let details = repo.commit_details(&commit).unwrap();
        assert_eq!(details.files.len(), 1);
        assert_eq!(details.files[0].path, "a.txt");
        assert_eq!(details.stats.files_changed, 1);
    }

    #[test]
    fn commit_details_merge_uses_first_parent_only() {
        let fixture = FixtureRepo::new();
        let a = fixture.write_blob(b"a\n");
        let b = fixture.write_blob(b"b\n");
        let c = fixture.write_blob(b"c\n");

        let tree1 = fixture.write_tree(&[("100644", "a.txt", a)]);
        let tree2 = fixture.write_tree(&[("100644", "a.txt", a), ("100644", "b.txt", b)]);
        let tree3 = fixture.write_tree(&[("100644", "a.txt", a), ("100644", "c.txt", c)]);

        let c1 = fixture.write_commit(tree1, &[], who(), "c1\n");
        let c2 = fixture.write_commit(tree2, &[c1], who(), "c2\n");
        let c3 = fixture.write_commit(tree3, &[c1], who(), "c3\n");
        let merge = fixture.write_commit(tree2, &[c2, c3], who(), "merge\n");

        let repo = Repository::open(fixture.path()).unwrap();
        let details = repo.commit_details(&merge).unwrap();
        assert!(details.files.is_empty());
    }

    #[test]
    fn commit_graph_resolves_branch_and_tag_names() {
        let fixture = FixtureRepo::new();
        let tree = fixture.write_tree(&[]);
        let c1 = fixture.write_commit(tree, &[], who(), "c1\n");
        fixture.write_branch("main", c1);
        fixture.set_head_branch("main");
        fixture.write_lightweight_tag("v1", c1);

        let repo = Repository::open(fixture.path()).unwrap();
        let graph = repo.commit_graph(&[c1], 10).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph[0].branches, vec!["main".to_string()]);
        assert_eq!(graph[0].tags, vec!["v1".to_string()]);
    }

    #[test]
    fn summary_counts_sampled_history_from_every_ref() {
        let fixture = FixtureRepo::new();
        let tree = fixture.write_tree(&[]);
        let c1 = fixture.write_commit(tree, &[], who(), "c1\n");
        let c2 = fixture.write_commit(tree, &[c1], who(), "c2\n");
        fixture.write_branch("main", c2);
        fixture.set_head_branch("main");

        let repo = Repository::open(fixture.path()).unwrap();
        let summary = repo.summary(10).unwrap();
        assert_eq!(summary.sampled_commit_count, 2);
        assert_eq!(summary.current_branch, Some("main".to_string()));
    }

    #[test]
    fn compare_commits_composes_get_commit_and_compare_trees() {
        let fixture = FixtureRepo::new();
        let a = fixture.write_blob(b"a\n");
        let b = fixture.write_blob(b"b\n");
        let tree1 = fixture.write_tree(&[("100644", "a.txt", a)]);
        let tree2 = fixture.write_tree(&[("100644", "a.txt", a), ("100644", "b.txt", b)]);
        let c1 = fixture.write_commit(tree1, &[], who(), "c1\n");
        let c2 = fixture.write_commit(tree2, &[c1], who(), "c2\n");

        let repo = Repository::open(fixture.path()).unwrap();
        let comparison = repo.compare_commits(c1, c2).unwrap();
        assert_eq!(comparison.files.len(), 1);
        assert_eq!(comparison.files[0].path, "b.txt");
    }

    #[test]
    fn tag_classification_surfaces_through_the_facade() {
        let fixture = FixtureRepo::new();
        let tree = fixture.write_tree(&[]);
        let c = fixture.write_commit(tree, &[], who(), "init\n");
        let tag_obj = fixture.write_annotated_tag(c, "v2", who(), "release\n");
        fixture.write_annotated_tag_ref("v2", tag_obj);

        let repo = Repository::open(fixture.path()).unwrap();
        let tags = repo.list_tags().unwrap();
        let v2 = tags.iter().find(|t| t.name == "v2").unwrap();
        assert!(matches!(v2.kind, TagKind::Annotated { .. }));
    }
}
