//! Myers diff algorithm, plus unified-hunk formatting for blob comparisons.
use std::convert::TryFrom;
use std::fmt;

/// Allows negative indexing into slices in a similar fashion to Python and Ruby
trait NegIndex<T> {
    fn nindex(&self, idx: isize) -> &T;
    fn nindex_mut(&mut self, idx: isize) -> &mut T;
}

impl<T> NegIndex<T> for [T] {
    fn nindex(&self, idx: isize) -> &T {
        // normal forward indexing
        if idx >= 0 {
            &self[idx as usize]
        } else {
            &self[self.len() - ((-idx) as usize)]
        }
    }
    fn nindex_mut(&mut self, idx: isize) -> &mut T {
        // normal forward indexing
        if idx >= 0 {
            &mut self[idx as usize]
        } else {
            &mut self[self.len() - ((-idx) as usize)]
        }
    }
}

/// Change in a list
#[derive(Debug, Eq, PartialEq)]
pub enum Edit<'a, T> {
    /// Element was added
    Ins(&'a T),
    /// Element was deleted
    Del(&'a T),
    /// Element is unchanged
    Nop(&'a T),
}

/// Perform a diff on two slices of arbitrary objects using the Myers algorithm.
/// Returns a list of edits to `a` that would produce `b`.
pub fn myers_diff<'a, T>(a: &'a [T], b: &'a [T]) -> Vec<Edit<'a, T>>
where
    T: Eq + fmt::Debug,
{
    let moves = myers_backtrack(a, b);

    // The moves are stored backwards so we iterate backwards
    moves
        .into_iter()
        .rev()
        .map(|((old_del, old_ins), (new_del, new_ins))| {
            if old_del == new_del {
                // An insert happened if there were no deletions
                Edit::Ins(&b[old_ins])
            } else if old_ins == new_ins {
                // A deletion happened if there were no insertions
                Edit::Del(&a[old_del])
            } else {
                // There were insertions and deletions so it was a diagonal
                // move -> equal
                assert_eq!(&a[old_del], &b[old_ins]);
                Edit::Nop(&a[old_del])
            }
        })
        .collect()
}

/// Perform a backtracking Myers diff between two lists of comparable items and
/// return a reversed list of `((old del, old ins), (new del, new ins))` to reach
/// list `b`.
fn myers_backtrack<T>(a: &[T], b: &[T]) -> Vec<((usize, usize), (usize, usize))>
where
    T: Eq,
{
    let mut diffs = Vec::new();
    let mut x = a.len();
    let mut y = b.len();

    let trace = myers_trace(a, b);
    for (d, v) in trace.iter().enumerate().rev() {
        let k = isize::try_from(x).unwrap() - isize::try_from(y).unwrap();
        let d = isize::try_from(d).unwrap();

        // find what the previous k would have been using the same logic as the
        // forward direction
        let k_was = if k == -d || (k != d && v.nindex(k - 1).unwrap() < v.nindex(k + 1).unwrap()) {
            k + 1
        } else {
            k - 1
        };

        // Previous x and y may be negative at d = 0 (first edit step)
        let x_was = isize::try_from(v.nindex(k_was).unwrap()).unwrap();
        let y_was = x_was - k_was;

        while isize::try_from(x).unwrap() > x_was && isize::try_from(y).unwrap() > y_was {
            // diagonal move
            diffs.push(((x - 1, y - 1), (x, y)));
            x -= 1;
            y -= 1;
        }

        // For all except the first change, record the previous x and y.
        // The x_was and y_was for the first change at d = 0 may be negative
        // (invalid).
        if d > 0 {
            // These should never be negative. Assert that is in fact the case.
            let x_was = usize::try_from(x_was).unwrap();
            let y_was = usize::try_from(y_was).unwrap();
            diffs.push(((x_was, y_was), (x, y)));
            x = x_was;
            y = y_was;
        }
    }
    diffs
}

/// Finds the most efficient edit sequence and outputs a list of state arrays to
/// reach it.
fn myers_trace<T>(a: &[T], b: &[T]) -> Vec<Vec<Option<usize>>>
where
    T: Eq,
{
    let mut traces = Vec::new();

    let n = a.len();
    let m = b.len();
    let max = n + m;
    // state array
    let mut v = Vec::with_capacity(2 * max + 1);

    // x is deletions, y is insertions. This algorithm is designed to maximize
    // deletions while finding diffs.

    // At each position, the "best" possible previous position is selected. This
    // is chosen by finding the one with the largest x value since we maximize
    // deletions.
    //
    // d is the depth in the graph, k is (x - y). On each new node, one of
    // three changes can happen to k when looking at depth d - 1:
    // * rightward move (deletion): k decremented
    // * downward move (insertion): k incremented
    // * diagonal move (same): k unchanged

    // The state array has even and odd values of k modified on alternating
    // iterations. It stores the newest values of x for each value of k. The
    // algorithm selects the largest value of x (deletions) for each iteration.

    // Fill state array with placeholders
    for _ in 0..(2 * max + 1) {
        v.push(None);
    }

    // Initial depth should select x = 0
    v[1] = Some(0usize);

    // Iterate through d depths
    for d in 0..=max as isize {
        let mut x;
        let mut y;
        traces.push(v.clone());

        for k in (-d..=d).step_by(2) {
            if k == -d || (k != d && v.nindex(k - 1).unwrap() < v.nindex(k + 1).unwrap()) {
                // Move downwards
                x = v.nindex(k + 1).unwrap();
            } else {
                // Move right: x will be one greater than the previous round
                x = v.nindex(k - 1).unwrap() + 1;
            }
            let ytemp = x as isize - k;
            assert!(ytemp >= 0);
            y = ytemp as usize;

            // Try to take diagonal steps
            while x < n && y < m && a[x] == b[y] {
                x += 1;
                y += 1;
            }

            *v.nindex_mut(k) = Some(x);
            if x >= n && y >= m {
                // Reached the bottom right position. Report it
                return traces;
            }
        }
    }
    unreachable!("failed to diff??")
}

/// A blob comparison: either a unified text diff or a binary marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    pub path: String,
    pub is_binary: bool,
    /// Rendered unified-diff hunks, `None` when `is_binary` is set.
    pub text: Option<String>,
    pub additions: u32,
    pub deletions: u32,
}

const CONTEXT_LINES: usize = 3;

/// Splits text into lines, each retaining its trailing `\n` except possibly
/// the last.
fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        Vec::new()
    } else {
        content.split_inclusive('\n').collect()
    }
}

enum Line<'a> {
    Context(&'a str),
    Add(&'a str),
    Remove(&'a str),
}

/// Builds a unified diff with `CONTEXT_LINES` of surrounding context between
/// the old and new content of one path, returning the rendered hunks and
/// their added/removed line counts.
fn unified_diff(old: &str, new: &str, path: &str) -> (String, u32, u32) {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let edits = myers_diff(&old_lines, &new_lines);

    // Each row tags its edit with the 1-based old/new line number that
    // applies once this row has been consumed (the old cursor holds still
    // on a pure insertion, and vice versa for a pure deletion).
    let mut rows: Vec<(Line, usize, usize)> = Vec::new();
    let mut old_no = 0usize;
    let mut new_no = 0usize;
    for edit in &edits {
        match edit {
            Edit::Nop(line) => {
                old_no += 1;
                new_no += 1;
                rows.push((Line::Context(line), old_no, new_no));
            }
            Edit::Del(line) => {
                old_no += 1;
                rows.push((Line::Remove(line), old_no, new_no));
            }
            Edit::Ins(line) => {
                new_no += 1;
                rows.push((Line::Add(line), old_no, new_no));
            }
        }
    }

    let mut additions = 0u32;
    let mut deletions = 0u32;
    for (line, _, _) in &rows {
        match line {
            Line::Add(_) => additions += 1,
            Line::Remove(_) => deletions += 1,
            Line::Context(_) => {}
        }
    }

    if additions == 0 && deletions == 0 {
        return (String::new(), 0, 0);
    }

    // Group changed rows into hunks, merging runs separated by no more than
    // 2 * CONTEXT_LINES unchanged rows.
    let changed_indices: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, (line, _, _))| !matches!(line, Line::Context(_)))
        .map(|(i, _)| i)
        .collect();

    let mut hunks: Vec<(usize, usize)> = Vec::new();
    let mut start = changed_indices[0];
    let mut end = changed_indices[0];
    for &idx in &changed_indices[1..] {
        if idx - end > CONTEXT_LINES * 2 {
            hunks.push((start, end));
            start = idx;
        }
        end = idx;
    }
    hunks.push((start, end));

    let mut out = String::new();
    out.push_str(&format!("--- a/{}\n", path));
    out.push_str(&format!("+++ b/{}\n", path));

    for (start, end) in hunks {
        let from = start.saturating_sub(CONTEXT_LINES);
        let to = usize::min(end + CONTEXT_LINES, rows.len() - 1);

        let old_start = rows[from].1;
        let new_start = rows[from].2;
        let mut old_count = 0usize;
        let mut new_count = 0usize;
        let mut body = String::new();

        for (line, _, _) in &rows[from..=to] {
            match line {
                Line::Context(text) => {
                    old_count += 1;
                    new_count += 1;
                    body.push(' ');
                    body.push_str(text.trim_end_matches('\n'));
                    body.push('\n');
                }
                Line::Remove(text) => {
                    old_count += 1;
                    body.push('-');
                    body.push_str(text.trim_end_matches('\n'));
                    body.push('\n');
                }
                Line::Add(text) => {
                    new_count += 1;
                    body.push('+');
                    body.push_str(text.trim_end_matches('\n'));
                    body.push('\n');
                }
            }
        }

        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start, old_count, new_start, new_count
        ));
        out.push_str(&body);
    }

    (out, additions, deletions)
}

/// Returns `true` when `bytes` cannot be decoded as strict UTF-8 — the
/// spec's sole binary-detection rule. A NUL byte alone is valid UTF-8 and
/// doesn't trip this; it's invalid byte sequences (like a lone `0xFF`) that
/// do.
fn looks_binary(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_err()
}

/// Diffs two blob contents (either side may be empty, representing an
/// add/delete) and renders a unified-diff `DiffRecord` for `path`.
pub fn diff_blobs(old: &[u8], new: &[u8], path: &str) -> DiffRecord {
    if looks_binary(old) || looks_binary(new) {
        return DiffRecord {
            path: path.to_string(),
            is_binary: true,
            text: None,
            additions: 0,
            deletions: 0,
        };
    }

    let old_text = std::str::from_utf8(old).unwrap_or("");
    let new_text = std::str::from_utf8(new).unwrap_or("");

    if old_text == new_text {
        return DiffRecord {
            path: path.to_string(),
            is_binary: false,
            text: Some(String::new()),
            additions: 0,
            deletions: 0,
        };
    }

    let (hunks, additions, deletions) = unified_diff(old_text, new_text, path);
    DiffRecord {
        path: path.to_string(),
        is_binary: false,
        text: Some(hunks),
        additions,
        deletions,
    }
}
