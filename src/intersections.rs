//! Finding where two curves sampled on the same coordinates cross.
use strum_macros::{Display, EnumIter, EnumString};

/// Which crossings to keep, by the direction `a` moves relative to `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum IntersectionDirection {
    /// Every crossing.
    All,
    /// Crossings where `a` goes from below to above `b`.
    Increasing,
    /// Crossings where `a` goes from above to below `b`.
    Decreasing,
}

impl Default for IntersectionDirection {
    fn default() -> Self {
        IntersectionDirection::All
    }
}

/// Indexes of the points just before the sign of `a - b` changes.
pub fn nearest_intersection_idx(a: &[f64], b: &[f64]) -> Vec<usize> {
    let signs: Vec<f64> = a.iter().zip(b).map(|(a, b)| sign(a - b)).collect();

    signs
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] - w[0] != 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Find the intersections of two curves `a` and `b` sampled at the coordinates `x`.
///
/// Crossing points are linearly interpolated between the bracketing samples, in `ln x` when
/// `log_x` is set. Repeated crossings at the same coordinate are reported once. Returns the
/// `x` and `y` values of the intersections in the order they occur.
///
/// # Examples
///
/// ```rust
/// use metcalc::{find_intersections, IntersectionDirection};
///
/// let x = [0.0, 1.0, 2.0, 3.0];
/// let a = [0.0, 2.0, 2.0, 0.0];
/// let b = [1.0, 1.0, 1.0, 1.0];
///
/// let (xs, ys) = find_intersections(&x, &a, &b, IntersectionDirection::Increasing, false);
/// assert_eq!(xs, vec![0.5]);
/// assert_eq!(ys, vec![1.0]);
/// ```
pub fn find_intersections(
    x: &[f64],
    a: &[f64],
    b: &[f64],
    direction: IntersectionDirection,
    log_x: bool,
) -> (Vec<f64>, Vec<f64>) {
    debug_assert_eq!(x.len(), a.len());
    debug_assert_eq!(x.len(), b.len());

    let x: Vec<f64> = if log_x {
        x.iter().map(|x| x.ln()).collect()
    } else {
        x.to_vec()
    };

    let crossings: Vec<(f64, f64, f64)> = nearest_intersection_idx(a, b)
        .into_iter()
        .map(|i0| {
            let i1 = i0 + 1;
            let (x0, x1) = (x[i0], x[i1]);
            let (a0, a1) = (a[i0], a[i1]);
            let dy0 = a0 - b[i0];
            let dy1 = a1 - b[i1];

            let ix = (dy1 * x0 - dy0 * x1) / (dy1 - dy0);
            let iy = (ix - x0) / (x1 - x0) * (a1 - a0) + a0;
            let ix = if log_x { ix.exp() } else { ix };

            (ix, iy, sign(dy1))
        })
        .collect();

    crossings
        .iter()
        .enumerate()
        // Of a run of crossings at the same point, keep the last.
        .filter(|(i, (ix, _, _))| crossings.get(i + 1).map(|next| next.0 != *ix).unwrap_or(true))
        .filter(|(_, (_, _, sign_change))| match direction {
            IntersectionDirection::All => true,
            IntersectionDirection::Increasing => *sign_change > 0.0,
            IntersectionDirection::Decreasing => *sign_change < 0.0,
        })
        .map(|(_, &(ix, iy, _))| (ix, iy))
        .unzip()
}

#[inline]
fn sign(val: f64) -> f64 {
    if val > 0.0 {
        1.0
    } else if val < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_nearest_intersection_idx() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.0];
        let b = [2.0, 2.0, 2.0, 2.0, 2.0];

        assert_eq!(nearest_intersection_idx(&a, &b), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_find_intersections_directions() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let a = [0.0, 3.0, 3.0, 0.0, 0.0, 3.0];
        let b = [1.5; 6];

        let (xs, _) = find_intersections(&x, &a, &b, IntersectionDirection::All, false);
        assert_eq!(xs, vec![0.5, 2.5, 4.5]);

        let (xs, ys) = find_intersections(&x, &a, &b, IntersectionDirection::Increasing, false);
        assert_eq!(xs, vec![0.5, 4.5]);
        assert_eq!(ys, vec![1.5, 1.5]);

        let (xs, _) = find_intersections(&x, &a, &b, IntersectionDirection::Decreasing, false);
        assert_eq!(xs, vec![2.5]);
    }

    #[test]
    fn test_find_intersections_touching() {
        // Touches b exactly at x = 1 and crosses there, reported once as increasing.
        let x = [0.0, 1.0, 2.0];
        let a = [0.0, 1.0, 2.0];
        let b = [1.0, 1.0, 1.0];

        let (xs, ys) = find_intersections(&x, &a, &b, IntersectionDirection::Increasing, false);
        assert_eq!(xs, vec![1.0]);
        assert_eq!(ys, vec![1.0]);

        let (xs, _) = find_intersections(&x, &a, &b, IntersectionDirection::All, false);
        assert_eq!(xs.len(), 1);
    }

    #[test]
    fn test_find_intersections_log_x() {
        let p = [1000.0, 900.0, 800.0];
        let a = [0.0, 2.0, 2.0];
        let b = [1.0, 1.0, 1.0];

        let (xs, _) = find_intersections(&p, &a, &b, IntersectionDirection::All, true);
        let expected = (0.5 * (1000.0f64.ln() + 900.0f64.ln())).exp();
        assert!(approx_equal(xs[0], expected, 1.0e-9));
    }

    #[test]
    fn test_find_intersections_none() {
        let x = [0.0, 1.0, 2.0];
        let (xs, ys) = find_intersections(&x, &[2.0; 3], &[1.0; 3], IntersectionDirection::All, false);
        assert!(xs.is_empty() && ys.is_empty());
    }

    #[test]
    fn test_direction_names() {
        for dir in IntersectionDirection::iter() {
            let parsed: IntersectionDirection = dir.to_string().parse().unwrap();
            assert_eq!(parsed, dir);
        }
        assert_eq!(IntersectionDirection::Increasing.to_string(), "increasing");
    }
}
