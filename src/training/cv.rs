//! Cross-validation splits.
//!
//! With at least `min_groups` distinct experiment ids, every combination of
//! `n_groups_out` groups is held out once (Leave-N-Groups-Out). Otherwise the
//! rows are shuffled with a seeded RNG and cut into `k` contiguous folds.
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// How a dataset is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvStrategy {
    LeaveGroupsOut { n: usize },
    KFold { k: usize },
}

/// Row indices of one train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Distinct group ids in order of first appearance.
pub fn distinct_groups(groups: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for g in groups {
        if !out.contains(&g.as_str()) {
            out.push(g);
        }
    }
    out
}

/// Leave-`n_groups_out`-Groups-Out when at least `min_groups` groups exist,
/// `k`-fold otherwise.
pub fn choose_strategy(groups: &[String], min_groups: usize, n_groups_out: usize, k: usize) -> CvStrategy {
    if distinct_groups(groups).len() >= min_groups {
        CvStrategy::LeaveGroupsOut { n: n_groups_out }
    } else {
        CvStrategy::KFold { k }
    }
}

/// Folds of `strategy` over rows labelled by `groups`.
///
/// K-fold uses `min(k, rows)` folds; the first `rows % k` folds get one extra
/// row. Fewer than two rows yield no folds.
pub fn split(groups: &[String], strategy: CvStrategy, seed: u64) -> Vec<Fold> {
    let n_rows = groups.len();
    match strategy {
        CvStrategy::LeaveGroupsOut { n } => {
            let distinct = distinct_groups(groups);
            combinations(distinct.len(), n)
                .into_iter()
                .map(|held| {
                    let (test, train): (Vec<usize>, Vec<usize>) = (0..n_rows)
                        .partition(|&i| held.iter().any(|&g| distinct[g] == groups[i]));
                    Fold { train, test }
                })
                .collect()
        }
        CvStrategy::KFold { k } => {
            let k = k.min(n_rows);
            if k < 2 {
                return Vec::new();
            }
            let mut order: Vec<usize> = (0..n_rows).collect();
            order.shuffle(&mut StdRng::seed_from_u64(seed));
            let (base, extra) = (n_rows / k, n_rows % k);
            let mut start = 0;
            (0..k)
                .map(|f| {
                    let len = base + usize::from(f < extra);
                    let test: Vec<usize> = order[start..start + len].to_vec();
                    let train: Vec<usize> =
                        order[..start].iter().chain(&order[start + len..]).copied().collect();
                    start += len;
                    Fold { train, test }
                })
                .collect()
        }
    }
}

/// All `r`-subsets of `0..n` in lexicographic order.
fn combinations(n: usize, r: usize) -> Vec<Vec<usize>> {
    if r == 0 || r > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..r).collect();
    loop {
        out.push(idx.clone());
        let Some(i) = (0..r).rev().find(|&i| idx[i] != i + n - r) else { break };
        idx[i] += 1;
        for j in i + 1..r {
            idx[j] = idx[j - 1] + 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Strategy choice at the group threshold.
    // - Leave-2-Groups-Out fold count and disjointness.
    // - K-fold coverage and seeding.
    // -------------------------------------------------------------------------

    fn groups(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    // Purpose
    // -------
    // Five groups give C(5, 2) = 10 folds, each holding out exactly two
    // groups and training on the rest.
    fn leave_two_groups_out_over_five_groups() {
        // Arrange
        let g = groups(&["a", "a", "b", "c", "c", "d", "e", "e"]);

        // Act
        let strategy = choose_strategy(&g, 5, 2, 5);
        let folds = split(&g, strategy, 0);

        // Assert
        assert_eq!(strategy, CvStrategy::LeaveGroupsOut { n: 2 });
        assert_eq!(folds.len(), 10);
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), g.len());
            let test_groups: Vec<String> = fold.test.iter().map(|&i| g[i].clone()).collect();
            let held = distinct_groups(&test_groups);
            assert_eq!(held.len(), 2);
            assert!(fold.train.iter().all(|&i| !held.contains(&g[i].as_str())));
        }
        assert_eq!(folds[0].test, vec![0, 1, 2]);
    }

    #[test]
    fn kfold_covers_every_row_once() {
        let g = groups(&["a", "a", "b", "b", "b", "c", "c", "a", "b", "c", "a", "b"]);
        let strategy = choose_strategy(&g, 5, 2, 5);
        assert_eq!(strategy, CvStrategy::KFold { k: 5 });

        let folds = split(&g, strategy, 7);

        assert_eq!(folds.len(), 5);
        assert_eq!(folds.iter().map(|f| f.test.len()).collect::<Vec<_>>(), vec![3, 3, 2, 2, 2]);
        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..g.len()).collect::<Vec<_>>());
        assert_eq!(folds, split(&g, strategy, 7));
    }

    #[test]
    fn tiny_inputs() {
        assert_eq!(split(&groups(&["a", "b"]), CvStrategy::KFold { k: 5 }, 0).len(), 2);
        assert!(split(&groups(&["a"]), CvStrategy::KFold { k: 5 }, 0).is_empty());
        assert_eq!(combinations(4, 2).len(), 6);
        assert_eq!(combinations(3, 3), vec![vec![0, 1, 2]]);
    }
}
