//! Small numerical helpers shared across modules.
use itertools::{izip, Itertools};

/// Integrate `y` over `x` with the trapezoid rule. The sign follows the direction of `x`.
pub(crate) fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    debug_assert_eq!(y.len(), x.len());

    izip!(x, y)
        .tuple_windows::<(_, _)>()
        .fold(0.0, |acc, ((x0, y0), (x1, y1))| {
            acc + (x1 - x0) * (y0 + y1)
        })
        / 2.0
}

/// Relative and absolute closeness, with the default tolerances of numpy's `isclose`.
#[inline]
pub(crate) fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1.0e-8 + 1.0e-5 * b.abs()
}

#[inline]
pub(crate) fn less_or_close(a: f64, b: f64) -> bool {
    a < b || is_close(a, b)
}

#[inline]
pub(crate) fn greater_or_close(a: f64, b: f64) -> bool {
    a > b || is_close(a, b)
}

/// Indexes that sort `vals` in ascending order, NaN values compare equal.
pub(crate) fn argsort(vals: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..vals.len()).collect();
    idx.sort_by(|&a, &b| {
        vals[a]
            .partial_cmp(&vals[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    idx
}
