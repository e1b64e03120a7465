//! Breadth-first traversal of the commit graph from a root set.
use std::collections::{HashSet, VecDeque};

use crate::hash::Hash;
use crate::objects::Commit;
use crate::store::ObjectStore;

/// Walks the parent relation breadth-first from `roots`, returning up to
/// `cap` distinct commits in BFS order. Roots are visited in the order
/// given; a commit that fails to decode is silently skipped (per spec §4.4
/// — the walk is not aborted by one bad object).
pub fn walk_history(store: &ObjectStore, roots: &[Hash], cap: usize) -> Vec<Commit> {
    let mut queue: VecDeque<Hash> = roots.iter().copied().collect();
    let mut seen: HashSet<Hash> = HashSet::new();
    let mut result = Vec::new();

    while let Some(hash) = queue.pop_front() {
        if result.len() >= cap {
            break;
        }
        if !seen.insert(hash) {
            continue;
        }

        let commit = match store.try_open_commit(&hash) {
            Some(c) => c,
            None => continue,
        };

        for parent in &commit.parents {
            queue.push_back(*parent);
        }
        result.push(commit);
    }

    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::FixtureRepo;
    use crate::store::ObjectStore;

    fn who() -> &'static str {
        "Tester <tester@example.com> 1000000000 +0000"
    }

    #[test]
    fn bfs_interleaves_independent_branches_by_distance() {
        let fixture = FixtureRepo::new();
        let empty_tree = fixture.write_tree(&[]);

        let c0 = fixture.write_commit(empty_tree, &[], who(), "c0\n");
        let c1 = fixture.write_commit(empty_tree, &[c0], who(), "c1\n");
        let c2 = fixture.write_commit(empty_tree, &[c1], who(), "c2\n");
        let c3 = fixture.write_commit(empty_tree, &[c1], who(), "c3\n");

        let store = ObjectStore::open(fixture.path()).unwrap();
        let result = walk_history(&store, &[c2, c3], 10);
        let hashes: Vec<Hash> = result.iter().map(|c| c.hash).collect();
        assert_eq!(hashes, vec![c2, c3, c1, c0]);
    }

    #[test]
    fn respects_cap_and_has_no_duplicates() {
        let fixture = FixtureRepo::new();
        let empty_tree = fixture.write_tree(&[]);
        let mut prev = fixture.write_commit(empty_tree, &[], who(), "root\n");
        let mut all = vec![prev];
        for i in 1..5 {
            prev = fixture.write_commit(empty_tree, &[prev], who(), &format!("c{}\n", i));
            all.push(prev);
        }

        let store = ObjectStore::open(fixture.path()).unwrap();
        let result = walk_history(&store, &[prev], 3);
        assert_eq!(result.len(), 3);
        let unique: HashSet<_> = result.iter().map(|c| c.hash).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn skips_undecodable_commits_without_aborting() {
        let fixture = FixtureRepo::new();
        let empty_tree = fixture.write_tree(&[]);
        let good = fixture.write_commit(empty_tree, &[], who(), "good\n");

        let bogus_hash = Hash::from_hex("ff00000000000000000000000000000000000000").unwrap();
        fixture.write_garbage_object(&bogus_hash, b"not a real object at all");
        let top = fixture.write_commit(empty_tree, &[good, bogus_hash], who(), "top\n");

        let store = ObjectStore::open(fixture.path()).unwrap();
        let result = walk_history(&store, &[top], 10);
        let hashes: Vec<Hash> = result.iter().map(|c| c.hash).collect();
        assert_eq!(hashes, vec![top, good]);
    }

    #[test]
    fn empty_roots_yields_empty_result() {
        let fixture = FixtureRepo::new();
        let store = ObjectStore::open(fixture.path()).unwrap();
        assert_eq!(walk_history(&store, &[], 10), vec![]);
    }
}
