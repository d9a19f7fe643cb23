//! Find the significant peaks (or troughs) of a two dimensional field.
//!
//! Peaks are ranked by their persistence: how far the field has to drop below a peak before the
//! region around it joins the region around a higher peak.
use crate::error::{AnalysisError, Result};
use ndarray::ArrayView2;

/// The persistence of every peak in `grid`, sorted from most to least persistent.
///
/// When `maxima` is false the troughs of the field are found instead. Points are connected to
/// all 8 of their neighbors. The global extremum has infinite persistence.
///
/// # Examples
///
/// ```rust
/// use metcalc::peaks::peak_persistence;
/// use ndarray::array;
///
/// let grid = array![
///     [0.0, 0.0, 0.0, 0.0, 0.0],
///     [0.0, 5.0, 0.0, 3.0, 0.0],
///     [0.0, 0.0, 0.0, 0.0, 0.0],
/// ];
///
/// let peaks = peak_persistence(grid.view(), true);
/// assert_eq!(peaks[0], ((1, 1), std::f64::INFINITY));
/// assert_eq!(peaks[1], ((1, 3), 3.0));
/// assert_eq!(peaks.len(), 2);
/// ```
pub fn peak_persistence(grid: ArrayView2<f64>, maxima: bool) -> Vec<((usize, usize), f64)> {
    let (ny, nx) = grid.dim();
    let num_points = ny * nx;
    if num_points == 0 {
        return vec![];
    }

    let value = |idx: usize| grid[[idx / nx, idx % nx]];

    let mut points: Vec<usize> = (0..num_points).collect();
    points.sort_by(|&a, &b| {
        let ord = value(a)
            .partial_cmp(&value(b))
            .unwrap_or(std::cmp::Ordering::Equal);
        if maxima {
            ord.reverse()
        } else {
            ord
        }
    });

    let mut groups = UnionFind::new(num_points);
    let mut persistence: Vec<(usize, f64)> = vec![];

    for &pt in &points {
        let mut roots: Vec<usize> = neighbors(pt, ny, nx)
            .filter_map(|n| if groups.contains(n) { Some(groups.find(n)) } else { None })
            .collect();
        roots.sort_unstable();
        roots.dedup();

        groups.insert(pt);
        if roots.is_empty() {
            continue;
        }

        // The group with the most extreme peak absorbs the others.
        roots.sort_by(|&a, &b| {
            let ord = value(a)
                .partial_cmp(&value(b))
                .unwrap_or(std::cmp::Ordering::Equal);
            if maxima {
                ord.reverse()
            } else {
                ord
            }
        });

        let dominant = roots[0];
        groups.join(dominant, pt);
        for &other in &roots[1..] {
            persistence.push((other, (value(other) - value(pt)).abs()));
            groups.join(dominant, other);
        }
    }

    persistence.push((points[0], std::f64::INFINITY));
    persistence.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    persistence
        .into_iter()
        .map(|(idx, p)| ((idx / nx, idx % nx), p))
        .collect()
}

/// The peaks of `grid` with a persistence of at least `iqr_ratio` times the interquartile range
/// of the field, most persistent first.
pub fn find_peaks(grid: ArrayView2<f64>, maxima: bool, iqr_ratio: f64) -> Result<Vec<(usize, usize)>> {
    if grid.is_empty() {
        return Err(AnalysisError::NotEnoughData);
    }
    if grid.iter().any(|v| v.is_nan()) {
        return Err(AnalysisError::InvalidInput("peak finding does not allow NaN values"));
    }

    let mut sorted: Vec<f64> = grid.iter().cloned().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
    let threshold = iqr_ratio * iqr;

    Ok(peak_persistence(grid, maxima)
        .into_iter()
        .filter(|&(_, p)| p >= threshold)
        .map(|(pt, _)| pt)
        .collect())
}

// Linearly interpolated percentile of sorted data, q in [0, 1].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);

    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn neighbors(idx: usize, ny: usize, nx: usize) -> impl Iterator<Item = usize> {
    let (j, i) = ((idx / nx) as isize, (idx % nx) as isize);

    (-1isize..=1)
        .flat_map(move |dj| (-1isize..=1).map(move |di| (j + dj, i + di)))
        .filter(move |&(jj, ii)| {
            (jj, ii) != (j, i) && jj >= 0 && ii >= 0 && (jj as usize) < ny && (ii as usize) < nx
        })
        .map(move |(jj, ii)| jj as usize * nx + ii as usize)
}

/// Disjoint sets over flat grid indexes, only points that have been inserted are members.
struct UnionFind {
    parent: Vec<Option<usize>>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: vec![None; size],
        }
    }

    fn contains(&self, idx: usize) -> bool {
        self.parent[idx].is_some()
    }

    fn insert(&mut self, idx: usize) {
        self.parent[idx] = Some(idx);
    }

    fn find(&mut self, idx: usize) -> usize {
        let mut root = idx;
        while let Some(p) = self.parent[root] {
            if p == root {
                break;
            }
            root = p;
        }

        // Path compression
        let mut current = idx;
        while current != root {
            match self.parent[current] {
                Some(next) => {
                    self.parent[current] = Some(root);
                    current = next;
                }
                None => break,
            }
        }

        root
    }

    // The root of `keep` becomes the root of the combined set.
    fn join(&mut self, keep: usize, other: usize) {
        let keep_root = self.find(keep);
        let other_root = self.find(other);
        if keep_root != other_root {
            self.parent[other_root] = Some(keep_root);
        }
    }
}
