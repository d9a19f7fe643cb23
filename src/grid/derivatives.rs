//! Finite differences on non-uniform grids.
use crate::error::{AnalysisError, Result};
use ndarray::{Array2, ArrayView2, Axis, Zip};

/// The distance between points along one axis of a grid.
#[derive(Debug, Clone, Copy)]
pub enum Spacing<'a> {
    /// The same distance between every pair of points.
    Uniform(f64),
    /// The coordinate of each point along the axis.
    Coordinates(&'a [f64]),
    /// The distance between each pair of neighboring points. This has the shape of the field
    /// with one fewer point along the axis.
    Deltas(ArrayView2<'a, f64>),
}

impl<'a> Spacing<'a> {
    fn deltas_for(&self, shape: (usize, usize), axis: Axis) -> Result<Array2<f64>> {
        let (mut ny, mut nx) = shape;
        if axis == Axis(0) {
            ny -= 1;
        } else {
            nx -= 1;
        }

        match *self {
            Spacing::Uniform(d) => Ok(Array2::from_elem((ny, nx), d)),
            Spacing::Coordinates(coords) => {
                if coords.len() != shape_along(shape, axis) {
                    return Err(AnalysisError::MismatchedLengths);
                }

                let diffs: Vec<f64> = coords.windows(2).map(|w| w[1] - w[0]).collect();
                Ok(Array2::from_shape_fn((ny, nx), |(j, i)| {
                    if axis == Axis(0) {
                        diffs[j]
                    } else {
                        diffs[i]
                    }
                }))
            }
            Spacing::Deltas(deltas) => {
                if deltas.dim() != (ny, nx) {
                    return Err(AnalysisError::MismatchedLengths);
                }
                Ok(deltas.to_owned())
            }
        }
    }
}

fn shape_along(shape: (usize, usize), axis: Axis) -> usize {
    if axis == Axis(0) {
        shape.0
    } else {
        shape.1
    }
}

/// Apply a three point stencil along every lane of `f` in the direction of `axis`.
fn along_axis<F>(f: ArrayView2<f64>, axis: Axis, spacing: &Spacing, stencil: F) -> Result<Array2<f64>>
where
    F: Fn(&[f64], &[f64]) -> Vec<f64>,
{
    if axis.index() > 1 {
        return Err(AnalysisError::InvalidInput("axis must be 0 or 1"));
    }
    if f.len_of(axis) < 3 {
        return Err(AnalysisError::NotEnoughData);
    }

    let deltas = spacing.deltas_for(f.dim(), axis)?;
    let mut out = Array2::zeros(f.dim());

    Zip::from(f.lanes(axis))
        .and(deltas.lanes(axis))
        .and(out.lanes_mut(axis))
        .for_each(|f_lane, d_lane, mut out_lane| {
            let f_vals: Vec<f64> = f_lane.iter().cloned().collect();
            let d_vals: Vec<f64> = d_lane.iter().cloned().collect();

            for (o, v) in out_lane.iter_mut().zip(stencil(&f_vals, &d_vals)) {
                *o = v;
            }
        });

    Ok(out)
}

/// First derivative of `f` along `axis`.
///
/// Interior points use the centered three point formula for unevenly spaced points and the
/// edges use the one sided three point formulas, so the result has the same shape as `f`. There
/// must be at least 3 points along the axis.
///
/// # Examples
///
/// ```rust
/// use metcalc::grid::{first_derivative, Spacing};
/// use ndarray::{array, Axis};
///
/// let f = array![[0.0, 1.0, 4.0, 9.0], [0.0, 2.0, 8.0, 18.0]];
/// let dfdx = first_derivative(f.view(), Axis(1), &Spacing::Uniform(1.0)).unwrap();
///
/// assert_eq!(dfdx, array![[0.0, 2.0, 4.0, 6.0], [0.0, 4.0, 8.0, 12.0]]);
/// ```
pub fn first_derivative(f: ArrayView2<f64>, axis: Axis, spacing: &Spacing) -> Result<Array2<f64>> {
    along_axis(f, axis, spacing, first_derivative_kernel)
}

/// Second derivative of `f` along `axis`, with the same stencils and requirements as
/// `first_derivative`.
pub fn second_derivative(f: ArrayView2<f64>, axis: Axis, spacing: &Spacing) -> Result<Array2<f64>> {
    along_axis(f, axis, spacing, second_derivative_kernel)
}

/// First derivative of a profile `f` sampled at the coordinates `x`.
pub fn first_derivative_1d(f: &[f64], x: &[f64]) -> Result<Vec<f64>> {
    let dx = check_1d(f, x)?;
    Ok(first_derivative_kernel(f, &dx))
}

/// Second derivative of a profile `f` sampled at the coordinates `x`.
pub fn second_derivative_1d(f: &[f64], x: &[f64]) -> Result<Vec<f64>> {
    let dx = check_1d(f, x)?;
    Ok(second_derivative_kernel(f, &dx))
}

fn check_1d(f: &[f64], x: &[f64]) -> Result<Vec<f64>> {
    if f.len() != x.len() {
        return Err(AnalysisError::MismatchedLengths);
    }
    if f.len() < 3 {
        return Err(AnalysisError::NotEnoughData);
    }

    Ok(x.windows(2).map(|w| w[1] - w[0]).collect())
}

// f has n values and dx has n - 1, n >= 3
fn first_derivative_kernel(f: &[f64], dx: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut out = Vec::with_capacity(n);

    let (d0, d1) = (dx[0], dx[1]);
    let combined = d0 + d1;
    out.push(
        -(combined + d0) / (combined * d0) * f[0] + combined / (d0 * d1) * f[1]
            - d0 / (combined * d1) * f[2],
    );

    for i in 1..(n - 1) {
        let (d0, d1) = (dx[i - 1], dx[i]);
        let combined = d0 + d1;
        out.push(
            -d1 / (combined * d0) * f[i - 1]
                + (d1 - d0) / (d0 * d1) * f[i]
                + d0 / (combined * d1) * f[i + 1],
        );
    }

    let (d0, d1) = (dx[n - 3], dx[n - 2]);
    let combined = d0 + d1;
    out.push(
        d1 / (combined * d0) * f[n - 3] - combined / (d0 * d1) * f[n - 2]
            + (combined + d1) / (combined * d1) * f[n - 1],
    );

    out
}

fn second_derivative_kernel(f: &[f64], dx: &[f64]) -> Vec<f64> {
    let n = f.len();

    let stencil = |i: usize| {
        let (d0, d1) = (dx[i - 1], dx[i]);
        let combined = d0 + d1;
        2.0 * (f[i - 1] / (combined * d0) - f[i] / (d0 * d1) + f[i + 1] / (combined * d1))
    };

    let mut out = Vec::with_capacity(n);
    out.push(stencil(1));
    out.extend((1..(n - 1)).map(&stencil));
    out.push(stencil(n - 2));

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::*;
    use ndarray::array;

    #[test]
    fn test_first_derivative_1d_uneven() {
        // Exact for quadratics
        let x = [0.0, 1.0, 3.0, 6.0, 7.0];
        let f: Vec<f64> = x.iter().map(|x| x * x).collect();

        let d = first_derivative_1d(&f, &x).unwrap();
        for (d, x) in d.iter().zip(&x) {
            assert!(approx_equal(*d, 2.0 * x, 1.0e-9), "{} vs {}", d, 2.0 * x);
        }
    }

    #[test]
    fn test_second_derivative_1d_uneven() {
        let x = [0.0, 0.5, 2.0, 2.5, 4.0];
        let f: Vec<f64> = x.iter().map(|x| 3.0 * x * x - x).collect();

        let d = second_derivative_1d(&f, &x).unwrap();
        assert!(d.iter().all(|&d| approx_equal(d, 6.0, 1.0e-9)), "{:?}", d);
    }

    #[test]
    fn test_derivative_needs_three_points() {
        assert_eq!(
            first_derivative_1d(&[1.0, 2.0], &[0.0, 1.0]),
            Err(AnalysisError::NotEnoughData)
        );
        assert_eq!(
            first_derivative_1d(&[1.0, 2.0, 3.0], &[0.0, 1.0]),
            Err(AnalysisError::MismatchedLengths)
        );

        let f = array![[1.0, 2.0, 3.0], [1.0, 2.0, 3.0]];
        assert_eq!(
            first_derivative(f.view(), Axis(0), &Spacing::Uniform(1.0)),
            Err(AnalysisError::NotEnoughData)
        );
    }

    #[test]
    fn test_first_derivative_axis0() {
        let f = array![[1.0, 2.0], [3.0, 6.0], [5.0, 10.0]];
        let d = first_derivative(f.view(), Axis(0), &Spacing::Coordinates(&[0.0, 2.0, 4.0])).unwrap();
        assert_eq!(d, array![[1.0, 2.0], [1.0, 2.0], [1.0, 2.0]]);
    }

    #[test]
    fn test_first_derivative_with_deltas() {
        let f = array![[0.0, 1.0, 4.0], [0.0, 1.0, 4.0]];
        let deltas = array![[1.0, 1.0], [0.5, 0.5]];
        let d = first_derivative(f.view(), Axis(1), &Spacing::Deltas(deltas.view())).unwrap();

        assert_eq!(d.row(0).to_vec(), vec![0.0, 2.0, 4.0]);
        assert_eq!(d.row(1).to_vec(), vec![0.0, 4.0, 8.0]);

        let bad = array![[1.0, 1.0, 1.0]];
        assert!(first_derivative(f.view(), Axis(1), &Spacing::Deltas(bad.view())).is_err());
    }

    #[test]
    fn test_second_derivative_grid() {
        let f = array![[0.0, 1.0, 4.0, 9.0]];
        let d = second_derivative(f.view(), Axis(1), &Spacing::Uniform(1.0)).unwrap();
        assert_eq!(d, array![[2.0, 2.0, 2.0, 2.0]]);
    }
}
