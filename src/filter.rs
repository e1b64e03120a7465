//! Post-hoc filtering over a list of already-walked commits.
use crate::objects::Commit;
use crate::store::ObjectStore;
use crate::treediff;

/// Filter criteria applied to a commit list. Every field is optional and
/// filters compose with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct CommitFilter {
    /// Case-insensitive substring match against `author.name` or `author.email`.
    pub author: Option<String>,
    /// Case-insensitive substring match against the commit message.
    pub search: Option<String>,
    /// Unix timestamp, inclusive lower bound on `author.timestamp`.
    pub since: Option<u64>,
    /// Unix timestamp, inclusive upper bound on `author.timestamp`.
    pub until: Option<u64>,
    /// Only commits that touch this path relative to their first parent.
    pub path: Option<String>,
}

fn matches_author(commit: &Commit, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    commit.author.name.to_lowercase().contains(&needle)
        || commit.author.email.to_lowercase().contains(&needle)
}

fn matches_search(commit: &Commit, needle: &str) -> bool {
    commit
        .full_message
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

fn touches_path(store: &ObjectStore, commit: &Commit, path: &str) -> bool {
    let parent_tree = commit.parents.first().and_then(|parent_hash| {
        store
            .try_open_commit(parent_hash)
            .map(|parent| parent.tree)
    });
    let changes = treediff::compare(store, parent_tree, commit.tree);
    changes.iter().any(|change| change.path == path)
}

/// Applies `filter` to `commits`, preserving their relative order.
pub fn filter_commits(store: &ObjectStore, commits: &[Commit], filter: &CommitFilter) -> Vec<Commit> {
    commits
        .iter()
        .filter(|commit| {
            if let Some(author) = &filter.author {
                if !matches_author(commit, author) {
                    return false;
                }
            }
            if let Some(search) = &filter.search {
                if !matches_search(commit, search) {
                    return false;
                }
            }
            if let Some(since) = filter.since {
                if commit.author.timestamp < since {
                    return false;
                }
            }
            if let Some(until) = filter.until {
                if commit.author.timestamp > until {
                    return false;
                }
            }
            if let Some(path) = &filter.path {
                if !touches_path(store, commit, path) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}
