//! Knowledge diffusion: how many people have touched each file.
//!
//! Files edited by a single person are knowledge silos. The editor-count
//! distribution across files feeds the same Lorenz/Gini machinery used for
//! line ownership.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::distribution::{gini, lorenz_curve};

/// Average month length used for the recent-editor window, in seconds
/// (30.44 days).
const AVERAGE_MONTH_SECS: i128 = 2_630_016;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// One author editing one file at one tick.
///
/// Paths are expected to be final names; renames are resolved upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEdit {
    /// File path relative to the repository root.
    pub path: String,
    /// Editing author.
    pub author: u32,
    /// Tick of the edit.
    pub tick: u32,
}

/// Editor statistics for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiffusion {
    /// File path.
    pub path: String,
    /// Distinct authors who ever edited the file.
    pub unique_editors: usize,
    /// Tick of each author's first edit mapped to the running editor count.
    pub editors_over_time: BTreeMap<u32, usize>,
    /// Authors whose last edit falls inside the recent window.
    pub recent_editors: usize,
    /// Editing authors, ascending.
    pub authors: Vec<u32>,
}

/// Knowledge diffusion across a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDiffusion {
    /// Per-file statistics, ordered by path.
    pub files: Vec<FileDiffusion>,
    /// Editor count mapped to the number of files with that many editors.
    pub distribution: BTreeMap<usize, usize>,
    /// Files with the fewest editors, ties broken by path.
    pub silos: Vec<FileDiffusion>,
    /// Width of the recent-editor window in ticks.
    pub window_ticks: u64,
    /// Lorenz curve of editors per file.
    pub lorenz: Vec<(f64, f64)>,
    /// Gini coefficient of editors per file.
    pub gini: f64,
}

/// Number of ticks in `window_months` average months.
///
/// Returns `0` when the tick duration is unknown (`<= 0`), which narrows the
/// recent window to the last observed tick.
///
/// # Examples
///
/// ```
/// use strata_metrics::knowledge::window_ticks;
///
/// const DAY_NS: i64 = 86_400_000_000_000;
/// // 6 * 30.44 days = 182.64 days
/// assert_eq!(window_ticks(6, DAY_NS), 182);
/// assert_eq!(window_ticks(6, 0), 0);
/// ```
pub fn window_ticks(window_months: u32, tick_duration_ns: i64) -> u64 {
    if tick_duration_ns <= 0 {
        return 0;
    }
    let window_ns = i128::from(window_months) * AVERAGE_MONTH_SECS * NANOS_PER_SEC;
    u64::try_from(window_ns / i128::from(tick_duration_ns)).unwrap_or(u64::MAX)
}

#[derive(Clone, Copy)]
struct EditSpan {
    first: u32,
    last: u32,
}

/// Summarize `edits` per file.
///
/// An author counts as a recent editor of a file when their last edit is at
/// or after `last_tick - window_ticks`, where `last_tick` is the latest tick
/// across all edits.
///
/// # Examples
///
/// ```
/// use strata_metrics::knowledge::{knowledge_diffusion, FileEdit};
///
/// let edits = vec![
///     FileEdit { path: "a.rs".into(), author: 1, tick: 0 },
///     FileEdit { path: "a.rs".into(), author: 2, tick: 4 },
///     FileEdit { path: "b.rs".into(), author: 1, tick: 9 },
/// ];
/// let kd = knowledge_diffusion(&edits, 3, 30);
/// assert_eq!(kd.files[0].unique_editors, 2);
/// assert_eq!(kd.files[0].recent_editors, 0);
/// assert_eq!(kd.silos[0].path, "b.rs");
/// assert_eq!(kd.distribution[&1], 1);
/// ```
pub fn knowledge_diffusion(edits: &[FileEdit], window_ticks: u64, max_silos: usize) -> KnowledgeDiffusion {
    let mut per_file: BTreeMap<&str, BTreeMap<u32, EditSpan>> = BTreeMap::new();
    let mut last_tick = 0u32;

    for edit in edits {
        last_tick = last_tick.max(edit.tick);
        per_file
            .entry(edit.path.as_str())
            .or_default()
            .entry(edit.author)
            .and_modify(|span| {
                span.first = span.first.min(edit.tick);
                span.last = span.last.max(edit.tick);
            })
            .or_insert(EditSpan {
                first: edit.tick,
                last: edit.tick,
            });
    }

    let cutoff = u64::from(last_tick).saturating_sub(window_ticks);

    let files: Vec<FileDiffusion> = per_file
        .into_iter()
        .map(|(path, authors)| {
            let first_ticks: BTreeSet<(u32, u32)> = authors
                .iter()
                .map(|(&author, span)| (span.first, author))
                .collect();
            let editors_over_time = first_ticks
                .iter()
                .enumerate()
                .map(|(i, &(tick, _))| (tick, i + 1))
                .collect();

            FileDiffusion {
                path: path.to_string(),
                unique_editors: authors.len(),
                editors_over_time,
                recent_editors: authors
                    .values()
                    .filter(|span| u64::from(span.last) >= cutoff)
                    .count(),
                authors: authors.keys().copied().collect(),
            }
        })
        .collect();

    let mut distribution = BTreeMap::new();
    for file in &files {
        *distribution.entry(file.unique_editors).or_insert(0) += 1;
    }

    let counts: Vec<f64> = files.iter().map(|f| f.unique_editors as f64).collect();

    KnowledgeDiffusion {
        silos: silos(&files, max_silos),
        distribution,
        window_ticks,
        lorenz: lorenz_curve(&counts),
        gini: gini(&counts),
        files,
    }
}

/// The `max` files with the fewest editors, ties broken by path.
pub fn silos(files: &[FileDiffusion], max: usize) -> Vec<FileDiffusion> {
    let mut sorted: Vec<&FileDiffusion> = files.iter().collect();
    sorted.sort_by(|a, b| {
        a.unique_editors
            .cmp(&b.unique_editors)
            .then_with(|| a.path.cmp(&b.path))
    });
    sorted.into_iter().take(max).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_NS: i64 = 86_400_000_000_000;

    fn edit(path: &str, author: u32, tick: u32) -> FileEdit {
        FileEdit {
            path: path.into(),
            author,
            tick,
        }
    }

    #[test]
    fn editors_over_time_counts_first_edits() {
        let edits = vec![
            edit("x.rs", 5, 10),
            edit("x.rs", 3, 2),
            edit("x.rs", 5, 1),
            edit("x.rs", 9, 10),
        ];
        let kd = knowledge_diffusion(&edits, 0, 30);
        let file = &kd.files[0];

        assert_eq!(file.unique_editors, 3);
        assert_eq!(file.authors, vec![3, 5, 9]);
        // Author 5 first edited at tick 1, author 3 at tick 2, author 9 at 10.
        let expected: BTreeMap<u32, usize> = [(1, 1), (2, 2), (10, 3)].into_iter().collect();
        assert_eq!(file.editors_over_time, expected);
    }

    #[test]
    fn shared_first_tick_keeps_final_count() {
        let edits = vec![edit("y.rs", 1, 4), edit("y.rs", 2, 4)];
        let kd = knowledge_diffusion(&edits, 0, 30);
        let expected: BTreeMap<u32, usize> = [(4, 2)].into_iter().collect();
        assert_eq!(kd.files[0].editors_over_time, expected);
    }

    #[test]
    fn recent_window_uses_last_edit() {
        let edits = vec![
            edit("a.rs", 1, 0),
            edit("a.rs", 1, 95),
            edit("a.rs", 2, 50),
            edit("a.rs", 3, 100),
        ];
        let kd = knowledge_diffusion(&edits, 10, 30);
        // cutoff = 90: authors 1 (95) and 3 (100)
        assert_eq!(kd.files[0].recent_editors, 2);

        let wide = knowledge_diffusion(&edits, 1_000, 30);
        assert_eq!(wide.files[0].recent_editors, 3);
    }

    #[test]
    fn zero_window_counts_only_latest_tick() {
        let edits = vec![edit("a.rs", 1, 7), edit("a.rs", 2, 8), edit("b.rs", 3, 8)];
        let kd = knowledge_diffusion(&edits, 0, 30);
        assert_eq!(kd.files[0].recent_editors, 1);
        assert_eq!(kd.files[1].recent_editors, 1);
    }

    #[test]
    fn silos_sorted_by_editors_then_path() {
        let edits = vec![
            edit("z.rs", 1, 0),
            edit("m.rs", 1, 0),
            edit("m.rs", 2, 0),
            edit("a.rs", 1, 0),
            edit("a.rs", 2, 0),
            edit("a.rs", 3, 0),
            edit("b.rs", 4, 0),
        ];
        let kd = knowledge_diffusion(&edits, 0, 3);
        let names: Vec<&str> = kd.silos.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, vec!["b.rs", "z.rs", "m.rs"]);
        assert_eq!(kd.files.len(), 4);
    }

    #[test]
    fn distribution_histogram() {
        let edits = vec![
            edit("a", 1, 0),
            edit("b", 1, 0),
            edit("c", 1, 0),
            edit("c", 2, 0),
        ];
        let kd = knowledge_diffusion(&edits, 0, 30);
        assert_eq!(kd.distribution.get(&1), Some(&2));
        assert_eq!(kd.distribution.get(&2), Some(&1));
        assert_eq!(kd.distribution.values().sum::<usize>(), kd.files.len());
    }

    #[test]
    fn gini_over_editor_counts() {
        let edits = vec![edit("a", 1, 0), edit("b", 2, 0)];
        let kd = knowledge_diffusion(&edits, 0, 30);
        assert_eq!(kd.gini, 0.0);
        assert_eq!(kd.lorenz.first(), Some(&(0.0, 0.0)));
        assert_eq!(kd.lorenz.last(), Some(&(1.0, 1.0)));
    }

    #[test]
    fn empty_input() {
        let kd = knowledge_diffusion(&[], 100, 30);
        assert!(kd.files.is_empty());
        assert!(kd.silos.is_empty());
        assert!(kd.lorenz.is_empty());
        assert_eq!(kd.gini, 0.0);
    }

    #[test]
    fn window_ticks_from_duration() {
        assert_eq!(window_ticks(1, DAY_NS), 30);
        assert_eq!(window_ticks(12, DAY_NS), 365);
        assert_eq!(window_ticks(6, DAY_NS * 7), 26);
        assert_eq!(window_ticks(6, -5), 0);
    }
}
