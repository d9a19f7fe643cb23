//! Boundary layer turbulence statistics from high frequency time series.
//!
//! Every function works along one axis of an array of any dimension, so a single series or a
//! batch of them (one per row, for example) can be handled the same way. When `perturbation` is
//! false the inputs are full values and their means along the axis are removed first.
use crate::error::{AnalysisError, Result};
use ndarray::{Array, ArrayView, Axis, Dimension, RemoveAxis, Zip};

/// Deviations of a time series from its mean along `axis`.
///
/// # Examples
///
/// ```rust
/// use metcalc::turbulence::get_perturbation;
/// use ndarray::{array, Axis};
///
/// let ts = array![1.0, 2.0, 3.0, 6.0];
/// let pert = get_perturbation(ts.view(), Axis(0)).unwrap();
///
/// assert_eq!(pert, array![-2.0, -1.0, 0.0, 3.0]);
/// ```
pub fn get_perturbation<D: Dimension>(ts: ArrayView<f64, D>, axis: Axis) -> Result<Array<f64, D>> {
    check_axis(ts.ndim(), ts.shape(), axis)?;

    let mut out = ts.to_owned();
    for mut lane in out.lanes_mut(axis) {
        let mean = lane.sum() / lane.len() as f64;
        lane.mapv_inplace(|v| v - mean);
    }

    Ok(out)
}

/// Turbulent kinetic energy, `0.5 √(u'² + v'² + w'²)` with each term averaged along `axis`.
///
/// Note the square root, the result has units of m/s rather than m²/s².
pub fn tke<D: Dimension + RemoveAxis>(
    u: ArrayView<f64, D>,
    v: ArrayView<f64, D>,
    w: ArrayView<f64, D>,
    perturbation: bool,
    axis: Axis,
) -> Result<Array<f64, D::Smaller>> {
    if u.shape() != v.shape() || u.shape() != w.shape() {
        return Err(AnalysisError::MismatchedLengths);
    }

    let u_var = mean_square(u, perturbation, axis)?;
    let v_var = mean_square(v, perturbation, axis)?;
    let w_var = mean_square(w, perturbation, axis)?;

    Ok(Zip::from(&u_var)
        .and(&v_var)
        .and(&w_var)
        .map_collect(|u, v, w| 0.5 * (u + v + w).sqrt()))
}

fn mean_square<D: Dimension + RemoveAxis>(
    vals: ArrayView<f64, D>,
    perturbation: bool,
    axis: Axis,
) -> Result<Array<f64, D::Smaller>> {
    kinematic_flux(vals.view(), vals.view(), perturbation, axis)
}

/// The covariance of a velocity component and a scalar (or another component) along `axis`.
///
/// With the vertical velocity and the potential temperature this is the kinematic heat flux.
///
/// # Examples
///
/// ```rust
/// use metcalc::turbulence::kinematic_flux;
/// use ndarray::{array, Axis};
///
/// let w = array![1.0, -1.0, 1.0, -1.0];
/// let theta = array![301.0, 299.0, 301.0, 299.0];
///
/// let flux = kinematic_flux(w.view(), theta.view(), false, Axis(0)).unwrap();
/// assert!((flux[()] - 1.0).abs() < 1.0e-12);
/// ```
pub fn kinematic_flux<D: Dimension + RemoveAxis>(
    vel: ArrayView<f64, D>,
    b: ArrayView<f64, D>,
    perturbation: bool,
    axis: Axis,
) -> Result<Array<f64, D::Smaller>> {
    if vel.shape() != b.shape() {
        return Err(AnalysisError::MismatchedLengths);
    }
    check_axis(vel.ndim(), vel.shape(), axis)?;

    let product = if perturbation {
        Zip::from(&vel).and(&b).map_collect(|x, y| x * y)
    } else {
        let (vel, b) = (get_perturbation(vel, axis)?, get_perturbation(b, axis)?);
        Zip::from(&vel).and(&b).map_collect(|x, y| x * y)
    };

    product.mean_axis(axis).ok_or(AnalysisError::NotEnoughData)
}

/// Friction velocity from the momentum fluxes, `(u'w'² + v'w'²)^(1/4)`.
///
/// The cross wind component `v` is optional.
pub fn friction_velocity<D: Dimension + RemoveAxis>(
    u: ArrayView<f64, D>,
    w: ArrayView<f64, D>,
    v: Option<ArrayView<f64, D>>,
    perturbation: bool,
    axis: Axis,
) -> Result<Array<f64, D::Smaller>> {
    let uw = kinematic_flux(u, w.view(), perturbation, axis)?;
    let mut flux_sq = uw.mapv(|f| f * f);

    if let Some(v) = v {
        let vw = kinematic_flux(v, w, perturbation, axis)?;
        Zip::from(&mut flux_sq)
            .and(&vw)
            .for_each(|f, vw| *f += vw * vw);
    }

    Ok(flux_sq.mapv(|f| f.sqrt().sqrt()))
}

fn check_axis(ndim: usize, shape: &[usize], axis: Axis) -> Result<()> {
    if axis.index() >= ndim {
        return Err(AnalysisError::InvalidInput("axis out of range for the array"));
    }
    if shape[axis.index()] == 0 {
        return Err(AnalysisError::NotEnoughData);
    }
    Ok(())
}
