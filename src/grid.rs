//! Grid spacing and finite difference operators for fields on two dimensional grids.
//!
//! Fields are `ndarray` arrays indexed `[y, x]`, so axis 0 runs south to north and axis 1 runs
//! west to east.
use crate::{
    constants::EARTH_RADIUS,
    error::{AnalysisError, Result},
};
use ndarray::{Array2, ArrayView2, Axis};

pub use self::derivatives::{
    first_derivative, first_derivative_1d, second_derivative, second_derivative_1d, Spacing,
};

mod derivatives;

/// The signed distances between neighboring grid points, in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDeltas {
    /// Distance between points along the x axis, shape `(ny, nx - 1)`.
    pub dx: Array2<f64>,
    /// Distance between points along the y axis, shape `(ny - 1, nx)`.
    pub dy: Array2<f64>,
}

impl GridDeltas {
    /// Deltas for a regular grid of shape `(ny, nx)`.
    pub fn uniform(shape: (usize, usize), dx: f64, dy: f64) -> Self {
        let (ny, nx) = shape;
        GridDeltas {
            dx: Array2::from_elem((ny, nx.saturating_sub(1)), dx),
            dy: Array2::from_elem((ny.saturating_sub(1), nx), dy),
        }
    }

    /// Deltas from the latitude and longitude (degrees) of every point of the grid.
    ///
    /// Distances are great circle distances on a spherical earth. They are negative where the
    /// longitude decreases along the x axis or the latitude decreases along the y axis.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metcalc::grid::GridDeltas;
    /// use ndarray::array;
    ///
    /// let lats = array![[0.0, 0.0], [1.0, 1.0]];
    /// let lons = array![[-100.0, -99.0], [-100.0, -99.0]];
    ///
    /// let deltas = GridDeltas::from_lat_lon(lats.view(), lons.view()).unwrap();
    /// assert!((deltas.dy[[0, 0]] - 111_195.1).abs() < 0.1);
    /// assert!(deltas.dx[[1, 0]] < deltas.dx[[0, 0]]);
    /// ```
    pub fn from_lat_lon(lats: ArrayView2<f64>, lons: ArrayView2<f64>) -> Result<Self> {
        if lats.dim() != lons.dim() {
            return Err(AnalysisError::MismatchedLengths);
        }

        let (ny, nx) = lats.dim();
        if ny < 1 || nx < 1 {
            return Err(AnalysisError::NotEnoughData);
        }

        let dx = Array2::from_shape_fn((ny, nx - 1), |(j, i)| {
            let d = great_circle_distance(
                (lats[[j, i]], lons[[j, i]]),
                (lats[[j, i + 1]], lons[[j, i + 1]]),
            );
            if wrap_longitude(lons[[j, i + 1]] - lons[[j, i]]) < 0.0 {
                -d
            } else {
                d
            }
        });

        let dy = Array2::from_shape_fn((ny - 1, nx), |(j, i)| {
            let d = great_circle_distance(
                (lats[[j, i]], lons[[j, i]]),
                (lats[[j + 1, i]], lons[[j + 1, i]]),
            );
            if lats[[j + 1, i]] < lats[[j, i]] {
                -d
            } else {
                d
            }
        });

        Ok(GridDeltas { dx, dy })
    }

    fn x_spacing(&self) -> Spacing {
        Spacing::Deltas(self.dx.view())
    }

    fn y_spacing(&self) -> Spacing {
        Spacing::Deltas(self.dy.view())
    }
}

// Haversine distance in meters between two (lat, lon) points in degrees.
fn great_circle_distance((lat0, lon0): (f64, f64), (lat1, lon1): (f64, f64)) -> f64 {
    let (phi0, phi1) = (lat0.to_radians(), lat1.to_radians());
    let dphi = phi1 - phi0;
    let dlambda = (lon1 - lon0).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi0.cos() * phi1.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * a.sqrt().min(1.0).asin()
}

fn wrap_longitude(dlon: f64) -> f64 {
    (dlon + 180.0).rem_euclid(360.0) - 180.0
}

/// The gradient `(∂f/∂y, ∂f/∂x)` of a field.
///
/// # Examples
///
/// ```rust
/// use metcalc::grid::{gradient, GridDeltas};
/// use ndarray::Array2;
///
/// // f = 2x + 3y on a 1 km grid
/// let f = Array2::from_shape_fn((4, 5), |(j, i)| 2000.0 * i as f64 + 3000.0 * j as f64);
/// let deltas = GridDeltas::uniform((4, 5), 1000.0, 1000.0);
///
/// let (dfdy, dfdx) = gradient(f.view(), &deltas).unwrap();
/// assert!(dfdx.iter().all(|&d| (d - 2.0).abs() < 1.0e-12));
/// assert!(dfdy.iter().all(|&d| (d - 3.0).abs() < 1.0e-12));
/// ```
pub fn gradient(f: ArrayView2<f64>, deltas: &GridDeltas) -> Result<(Array2<f64>, Array2<f64>)> {
    let dfdy = first_derivative(f, Axis(0), &deltas.y_spacing())?;
    let dfdx = first_derivative(f, Axis(1), &deltas.x_spacing())?;

    Ok((dfdy, dfdx))
}

/// The laplacian `∂²f/∂x² + ∂²f/∂y²` of a field.
pub fn laplacian(f: ArrayView2<f64>, deltas: &GridDeltas) -> Result<Array2<f64>> {
    let d2fdy2 = second_derivative(f, Axis(0), &deltas.y_spacing())?;
    let d2fdx2 = second_derivative(f, Axis(1), &deltas.x_spacing())?;

    Ok(d2fdy2 + d2fdx2)
}

/// The horizontal derivatives of a vector field, `(∂u/∂x, ∂u/∂y, ∂v/∂x, ∂v/∂y)`.
pub fn vector_derivative(
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>)> {
    if u.dim() != v.dim() {
        return Err(AnalysisError::MismatchedLengths);
    }

    let (dudy, dudx) = gradient(u, deltas)?;
    let (dvdy, dvdx) = gradient(v, deltas)?;

    Ok((dudx, dudy, dvdx, dvdy))
}

/// The gradient `(∂f/∂y, ∂f/∂x)` of a field on a latitude/longitude grid.
pub fn geospatial_gradient(
    f: ArrayView2<f64>,
    lats: ArrayView2<f64>,
    lons: ArrayView2<f64>,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let deltas = GridDeltas::from_lat_lon(lats, lons)?;
    gradient(f, &deltas)
}

/// The laplacian of a field on a latitude/longitude grid.
pub fn geospatial_laplacian(
    f: ArrayView2<f64>,
    lats: ArrayView2<f64>,
    lons: ArrayView2<f64>,
) -> Result<Array2<f64>> {
    let deltas = GridDeltas::from_lat_lon(lats, lons)?;
    laplacian(f, &deltas)
}

/// Spread a column of latitudes (one per row) across `nx` columns.
pub fn latitude_grid(lats: &[f64], nx: usize) -> Array2<f64> {
    Array2::from_shape_fn((lats.len(), nx), |(j, _)| lats[j])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::*;

    const ONE_DEGREE: f64 = EARTH_RADIUS * std::f64::consts::PI / 180.0;

    #[test]
    fn test_uniform_deltas() {
        let deltas = GridDeltas::uniform((3, 4), 1000.0, 2000.0);
        assert_eq!(deltas.dx.dim(), (3, 3));
        assert_eq!(deltas.dy.dim(), (2, 4));
        assert!(deltas.dy.iter().all(|&d| d == 2000.0));
    }

    #[test]
    fn test_lat_lon_deltas() {
        let lats = latitude_grid(&[60.0, 59.0, 58.0], 3);
        let lons = Array2::from_shape_fn((3, 3), |(_, i)| 10.0 - i as f64);

        let deltas = GridDeltas::from_lat_lon(lats.view(), lons.view()).unwrap();

        // Latitude decreasing along y, longitude decreasing along x
        assert!(deltas.dy.iter().all(|&d| approx_equal(d, -ONE_DEGREE, 1.0e-6)));
        assert!(deltas.dx.iter().all(|&d| d < 0.0));

        let at_60 = ONE_DEGREE * 60.0f64.to_radians().cos();
        assert!(approx_equal(deltas.dx[[0, 0]], -at_60, 50.0), "{}", deltas.dx[[0, 0]]);
    }

    #[test]
    fn test_lat_lon_deltas_across_dateline() {
        let lats = latitude_grid(&[0.0, 0.0], 3);
        let lons = Array2::from_shape_fn((2, 3), |(_, i)| [179.0, 180.0, -179.0][i]);

        let deltas = GridDeltas::from_lat_lon(lats.view(), lons.view()).unwrap();
        assert!(deltas.dx.iter().all(|&d| approx_equal(d, ONE_DEGREE, 1.0e-6)));
    }

    #[test]
    fn test_mismatched_lat_lon() {
        let lats = Array2::zeros((3, 3));
        let lons = Array2::zeros((3, 4));
        assert_eq!(
            GridDeltas::from_lat_lon(lats.view(), lons.view()),
            Err(AnalysisError::MismatchedLengths)
        );
    }

    #[test]
    fn test_laplacian() {
        let f = Array2::from_shape_fn((5, 5), |(j, i)| {
            let (x, y) = (i as f64, j as f64);
            x * x + 2.0 * y * y
        });
        let deltas = GridDeltas::uniform((5, 5), 1.0, 1.0);

        let lap = laplacian(f.view(), &deltas).unwrap();
        assert!(lap.iter().all(|&l| approx_equal(l, 6.0, 1.0e-9)));
    }

    #[test]
    fn test_vector_derivative() {
        // Solid body rotation u = -y, v = x
        let u = Array2::from_shape_fn((4, 4), |(j, _)| -(j as f64));
        let v = Array2::from_shape_fn((4, 4), |(_, i)| i as f64);
        let deltas = GridDeltas::uniform((4, 4), 1.0, 1.0);

        let (dudx, dudy, dvdx, dvdy) = vector_derivative(u.view(), v.view(), &deltas).unwrap();
        assert!(dudx.iter().all(|&d| d == 0.0));
        assert!(dudy.iter().all(|&d| approx_equal(d, -1.0, 1.0e-12)));
        assert!(dvdx.iter().all(|&d| approx_equal(d, 1.0, 1.0e-12)));
        assert!(dvdy.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_geospatial_gradient() {
        let lats = latitude_grid(&[0.0, 1.0, 2.0, 3.0], 4);
        let lons = Array2::from_shape_fn((4, 4), |(_, i)| i as f64);
        // Increases by 1 per degree of latitude
        let f = lats.clone();

        let (dfdy, dfdx) = geospatial_gradient(f.view(), lats.view(), lons.view()).unwrap();
        assert!(dfdx.iter().all(|&d| d.abs() < 1.0e-15));
        assert!(dfdy.iter().all(|&d| approx_equal(d, 1.0 / ONE_DEGREE, 1.0e-12)));

        let lap = geospatial_laplacian(f.view(), lats.view(), lons.view()).unwrap();
        assert!(lap.iter().all(|&l| l.abs() < 1.0e-15));
    }
}
