//! Kinematic quantities of horizontal wind and scalar fields on a grid.
//!
//! Winds are in m/s, latitudes in degrees and distances in meters, with grids indexed `[y, x]`.
use crate::{
    constants::{G, RD},
    error::{AnalysisError, Result},
    grid::{gradient, vector_derivative, GridDeltas},
    wind::coriolis_parameter,
};
use metfor::{HectoPascal, Quantity};
use ndarray::{Array2, ArrayView2, Zip};

fn check_shapes(fields: &[ArrayView2<f64>]) -> Result<()> {
    let dim = fields.first().map(|f| f.dim()).ok_or(AnalysisError::NotEnoughData)?;
    if fields.iter().any(|f| f.dim() != dim) {
        return Err(AnalysisError::MismatchedLengths);
    }
    Ok(())
}

/// Vertical vorticity, `∂v/∂x - ∂u/∂y`.
///
/// # Examples
///
/// ```rust
/// use metcalc::{grid::GridDeltas, kinematics::vorticity};
/// use ndarray::Array2;
///
/// // Solid body rotation
/// let u = Array2::from_shape_fn((3, 3), |(j, _)| -(j as f64));
/// let v = Array2::from_shape_fn((3, 3), |(_, i)| i as f64);
/// let deltas = GridDeltas::uniform((3, 3), 1.0, 1.0);
///
/// let vort = vorticity(u.view(), v.view(), &deltas).unwrap();
/// assert!(vort.iter().all(|&z| (z - 2.0).abs() < 1.0e-12));
/// ```
pub fn vorticity(u: ArrayView2<f64>, v: ArrayView2<f64>, deltas: &GridDeltas) -> Result<Array2<f64>> {
    let (_, dudy, dvdx, _) = vector_derivative(u, v, deltas)?;
    Ok(dvdx - dudy)
}

/// Horizontal divergence, `∂u/∂x + ∂v/∂y`.
pub fn divergence(u: ArrayView2<f64>, v: ArrayView2<f64>, deltas: &GridDeltas) -> Result<Array2<f64>> {
    let (dudx, _, _, dvdy) = vector_derivative(u, v, deltas)?;
    Ok(dudx + dvdy)
}

/// Shearing deformation, `∂v/∂x + ∂u/∂y`.
pub fn shearing_deformation(
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<Array2<f64>> {
    let (_, dudy, dvdx, _) = vector_derivative(u, v, deltas)?;
    Ok(dvdx + dudy)
}

/// Stretching deformation, `∂u/∂x - ∂v/∂y`.
pub fn stretching_deformation(
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<Array2<f64>> {
    let (dudx, _, _, dvdy) = vector_derivative(u, v, deltas)?;
    Ok(dudx - dvdy)
}

/// Total deformation, the magnitude of the shearing and stretching deformation.
pub fn total_deformation(
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<Array2<f64>> {
    let (dudx, dudy, dvdx, dvdy) = vector_derivative(u, v, deltas)?;
    let shear = dvdx + dudy;
    let stretch = dudx - dvdy;

    Ok(Zip::from(&shear)
        .and(&stretch)
        .map_collect(|sh, st| sh.hypot(*st)))
}

/// Horizontal advection of a scalar, `-(u ∂s/∂x + v ∂s/∂y)`.
pub fn advection(
    scalar: ArrayView2<f64>,
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<Array2<f64>> {
    check_shapes(&[scalar.view(), u.view(), v.view()])?;

    let (dsdy, dsdx) = gradient(scalar, deltas)?;
    Ok(-(&u * &dsdx + &v * &dsdy))
}

/// Petterssen frontogenesis of potential temperature, in K m⁻¹ s⁻¹.
///
/// Where the potential temperature gradient vanishes the frontogenesis is zero.
pub fn frontogenesis(
    potential_temperature: ArrayView2<f64>,
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<Array2<f64>> {
    check_shapes(&[potential_temperature.view(), u.view(), v.view()])?;

    let (dtdy, dtdx) = gradient(potential_temperature, deltas)?;
    let (dudx, dudy, dvdx, dvdy) = vector_derivative(u, v, deltas)?;

    let stretch = &dudx - &dvdy;
    let shear = &dvdx + &dudy;
    let div = &dudx + &dvdy;

    let mut out = Array2::zeros(potential_temperature.dim());
    Zip::from(&mut out)
        .and(&dtdx)
        .and(&dtdy)
        .and(&stretch)
        .and(&shear)
        .and(&div)
        .for_each(|out, &dtdx, &dtdy, &stretch, &shear, &div| {
            let mag_theta = dtdx.hypot(dtdy);
            if mag_theta == 0.0 {
                return;
            }

            let total_def = shear.hypot(stretch);
            let psi = 0.5 * shear.atan2(stretch);
            let beta = ((-dtdx * psi.cos() - dtdy * psi.sin()) / mag_theta)
                .max(-1.0)
                .min(1.0)
                .asin();

            *out = 0.5 * mag_theta * (total_def * (2.0 * beta).cos() - div);
        });

    Ok(out)
}

/// Geostrophic wind `(u, v)` from geopotential height (m) and latitude (degrees).
pub fn geostrophic_wind(
    height: ArrayView2<f64>,
    latitude: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<(Array2<f64>, Array2<f64>)> {
    check_shapes(&[height.view(), latitude.view()])?;

    let norm = latitude.mapv(|lat| G / coriolis_parameter(lat));
    let (dhdy, dhdx) = gradient(height, deltas)?;

    Ok((-(&norm * &dhdy), &norm * &dhdx))
}

/// Ageostrophic wind `(u, v)`, the wind minus the geostrophic wind.
pub fn ageostrophic_wind(
    height: ArrayView2<f64>,
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    latitude: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<(Array2<f64>, Array2<f64>)> {
    check_shapes(&[height.view(), u.view(), v.view(), latitude.view()])?;

    let (ug, vg) = geostrophic_wind(height, latitude, deltas)?;
    Ok((&u - &ug, &v - &vg))
}

/// Absolute vorticity, the relative vorticity plus the coriolis parameter.
pub fn absolute_vorticity(
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    latitude: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<Array2<f64>> {
    check_shapes(&[u.view(), v.view(), latitude.view()])?;

    let vort = vorticity(u, v, deltas)?;
    Ok(vort + latitude.mapv(coriolis_parameter))
}

/// Barotropic potential vorticity, absolute vorticity divided by the depth of the fluid (m).
pub fn potential_vorticity_barotropic(
    height: ArrayView2<f64>,
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    latitude: ArrayView2<f64>,
    deltas: &GridDeltas,
) -> Result<Array2<f64>> {
    check_shapes(&[height.view(), u.view(), v.view(), latitude.view()])?;

    let avor = absolute_vorticity(u, v, latitude, deltas)?;
    Ok(avor / &height)
}

/// The Q-vector `(q1, q2)` on an isobaric surface, in m² kg⁻¹ s⁻¹.
///
/// `temperature` is in Kelvin and `static_stability` is in J kg⁻¹ Pa⁻², use `1.0` to get the
/// vector without the static stability scaling.
pub fn q_vector(
    u: ArrayView2<f64>,
    v: ArrayView2<f64>,
    temperature: ArrayView2<f64>,
    pressure: HectoPascal,
    static_stability: f64,
    deltas: &GridDeltas,
) -> Result<(Array2<f64>, Array2<f64>)> {
    check_shapes(&[u.view(), v.view(), temperature.view()])?;

    let (dudx, dudy, dvdx, dvdy) = vector_derivative(u, v, deltas)?;
    let (dtdy, dtdx) = gradient(temperature, deltas)?;

    let factor = -RD / (pressure.unpack() * 100.0 * static_stability);

    let q1 = (&dudx * &dtdx + &dvdx * &dtdy) * factor;
    let q2 = (&dudy * &dtdx + &dvdy * &dtdy) * factor;

    Ok((q1, q2))
}
