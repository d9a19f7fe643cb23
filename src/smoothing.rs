//! Smoothing filters for two dimensional fields.
//!
//! All of the window based filters leave the points within half a window of the edge untouched,
//! and every pass smooths the result of the previous pass.
use crate::error::{AnalysisError, Result};
use ndarray::{s, Array1, Array2, ArrayView2, Axis, Zip};
use std::f64::consts::PI;

/// Smooth a field with an arbitrary weighting window.
///
/// The window must have an odd number of points along both axes. When `normalize_weights` is set
/// the window is scaled so its weights sum to one.
///
/// # Examples
///
/// ```rust
/// use metcalc::smoothing::smooth_window;
/// use ndarray::Array2;
///
/// let mut grid = Array2::zeros((5, 5));
/// grid[[2, 2]] = 9.0;
///
/// let window = Array2::from_elem((3, 3), 1.0);
/// let smoothed = smooth_window(grid.view(), window.view(), 1, true).unwrap();
///
/// assert!((smoothed[[1, 1]] - 1.0).abs() < 1.0e-12);
/// assert!((smoothed[[2, 2]] - 1.0).abs() < 1.0e-12);
/// // Edges are left alone.
/// assert_eq!(smoothed[[0, 0]], 0.0);
///
/// let even = Array2::from_elem((2, 3), 1.0);
/// assert!(smooth_window(grid.view(), even.view(), 1, true).is_err());
/// ```
pub fn smooth_window(
    grid: ArrayView2<f64>,
    window: ArrayView2<f64>,
    passes: usize,
    normalize_weights: bool,
) -> Result<Array2<f64>> {
    let (wy, wx) = window.dim();
    if wy % 2 == 0 || wx % 2 == 0 {
        return Err(AnalysisError::InvalidWindow(
            "window must have an odd number of points in each dimension",
        ));
    }

    let weights = if normalize_weights {
        let total = window.sum();
        if total == 0.0 {
            return Err(AnalysisError::InvalidWindow("window weights sum to zero"));
        }
        window.mapv(|w| w / total)
    } else {
        window.to_owned()
    };

    let (ny, nx) = grid.dim();
    let mut data = grid.to_owned();
    if ny < wy || nx < wx {
        return Ok(data);
    }

    let (pad_y, pad_x) = (wy / 2, wx / 2);
    let (inner_y, inner_x) = (ny - 2 * pad_y, nx - 2 * pad_x);

    for _ in 0..passes {
        let mut inner = Array2::zeros((inner_y, inner_x));
        for ((j, i), &w) in weights.indexed_iter() {
            if w == 0.0 {
                continue;
            }
            inner.scaled_add(w, &data.slice(s![j..(j + inner_y), i..(i + inner_x)]));
        }

        data.slice_mut(s![pad_y..(ny - pad_y), pad_x..(nx - pad_x)])
            .assign(&inner);
    }

    Ok(data)
}

/// Smooth a field with a gaussian filter.
///
/// The standard deviation is `n / 2π` grid points, so waves shorter than `n` grid points are
/// strongly damped. The kernel is truncated at `2√2` standard deviations and the field is
/// reflected at the edges.
///
/// # Examples
///
/// ```rust
/// use metcalc::smoothing::smooth_gaussian;
/// use ndarray::Array2;
///
/// let grid = Array2::from_shape_fn((10, 10), |(j, i)| if (i + j) % 2 == 0 { 1.0 } else { -1.0 });
/// let smoothed = smooth_gaussian(grid.view(), 4, 1).unwrap();
///
/// assert!(smoothed[[5, 5]].abs() < grid[[5, 5]].abs());
/// ```
pub fn smooth_gaussian(grid: ArrayView2<f64>, n: usize, passes: usize) -> Result<Array2<f64>> {
    if n < 2 {
        return Err(AnalysisError::InvalidWindow(
            "gaussian filter needs a wavelength of at least 2 grid points",
        ));
    }

    let sigma = n as f64 / (2.0 * PI);
    let truncate = 2.0 * 2.0f64.sqrt();
    let radius = (truncate * sigma + 0.5) as usize;

    let kernel = {
        let raw: Array1<f64> = (0..=2 * radius)
            .map(|k| {
                let x = k as f64 - radius as f64;
                (-0.5 * x * x / (sigma * sigma)).exp()
            })
            .collect();
        let total = raw.sum();
        raw / total
    };

    let mut data = grid.to_owned();
    for _ in 0..passes {
        data = convolve_reflected(data.view(), &kernel, Axis(0));
        data = convolve_reflected(data.view(), &kernel, Axis(1));
    }

    Ok(data)
}

// Correlate every lane along `axis` with a symmetric kernel, reflecting about the edges.
fn convolve_reflected(data: ArrayView2<f64>, kernel: &Array1<f64>, axis: Axis) -> Array2<f64> {
    let radius = (kernel.len() / 2) as isize;
    let mut out = Array2::zeros(data.dim());

    Zip::from(data.lanes(axis))
        .and(out.lanes_mut(axis))
        .for_each(|src, mut dst| {
            let n = src.len();
            for (i, d) in dst.iter_mut().enumerate() {
                *d = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let idx = reflect(i as isize + k as isize - radius, n);
                        w * src[idx]
                    })
                    .sum();
            }
        });

    out
}

// Index into a lane of length n extended by reflection, (d c b a | a b c d | d c b a).
fn reflect(idx: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = idx.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

/// Smooth a field with a rectangular window of shape `(ny, nx)`, where every point in the window
/// has the same weight.
pub fn smooth_rectangular(
    grid: ArrayView2<f64>,
    size: (usize, usize),
    passes: usize,
) -> Result<Array2<f64>> {
    let window = Array2::from_elem(size, 1.0);
    smooth_window(grid, window.view(), passes, true)
}

/// Smooth a field with a circular window of the given radius in grid points.
pub fn smooth_circular(grid: ArrayView2<f64>, radius: usize, passes: usize) -> Result<Array2<f64>> {
    let size = 2 * radius + 1;
    let r = radius as f64;

    let window = Array2::from_shape_fn((size, size), |(j, i)| {
        let (dy, dx) = (j as f64 - r, i as f64 - r);
        if (dx * dx + dy * dy).sqrt() <= r {
            1.0
        } else {
            0.0
        }
    });

    smooth_window(grid, window.view(), passes, true)
}

/// The classic 5 or 9 point smoother.
///
/// # Examples
///
/// ```rust
/// use metcalc::smoothing::smooth_n_point;
/// use ndarray::Array2;
///
/// let mut grid = Array2::zeros((3, 3));
/// grid[[1, 1]] = 1.0;
///
/// let five = smooth_n_point(grid.view(), 5, 1).unwrap();
/// assert_eq!(five[[1, 1]], 0.5);
///
/// let nine = smooth_n_point(grid.view(), 9, 1).unwrap();
/// assert_eq!(nine[[1, 1]], 0.25);
///
/// assert!(smooth_n_point(grid.view(), 7, 1).is_err());
/// ```
pub fn smooth_n_point(grid: ArrayView2<f64>, n: usize, passes: usize) -> Result<Array2<f64>> {
    let window = match n {
        5 => ndarray::array![[0.0, 0.125, 0.0], [0.125, 0.5, 0.125], [0.0, 0.125, 0.0]],
        9 => ndarray::array![
            [0.0625, 0.125, 0.0625],
            [0.125, 0.25, 0.125],
            [0.0625, 0.125, 0.0625]
        ],
        _ => return Err(AnalysisError::InvalidWindow("n must be 5 or 9")),
    };

    smooth_window(grid, window.view(), passes, false)
}
