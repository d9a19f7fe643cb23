use crate::{
    constants::{CP_D, EPSILON, KAPPA, LV, RD},
    error::{AnalysisError, Result},
};
use metfor::{HectoPascal, Kelvin, Pressure, Quantity, Temperature};

use super::{dewpoint_k, saturation_mixing_ratio_raw};

const LCL_MAX_ITERATIONS: usize = 50;
const LCL_TOLERANCE: f64 = 1.0e-5;
const MAX_MOIST_STEP_HPA: f64 = 5.0;

/// Pressure and temperature at the lifting condensation level.
///
/// The mixing ratio of the parcel is conserved while it is lifted dry adiabatically, and the
/// LCL pressure is found by fixed point iteration on the dew point of that mixing ratio.
///
/// # Examples
///
/// ```rust
/// use metcalc::lcl;
/// use metfor::{Celsius, HectoPascal, Quantity};
///
/// let (p, t) = lcl(HectoPascal(1000.0), Celsius(30.0), Celsius(20.0)).unwrap();
/// assert!((p.unpack() - 864.8).abs() < 0.1);
/// assert!((t.unpack() - 290.83).abs() < 0.1);
/// ```
pub fn lcl<P, T1, T2>(pressure: P, temperature: T1, dew_point: T2) -> Result<(HectoPascal, Kelvin)>
where
    P: Pressure,
    HectoPascal: From<P>,
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let p0 = HectoPascal::from(pressure).unpack();
    let t0 = Kelvin::from(temperature).unpack();
    let td0 = Kelvin::from(dew_point).unpack();

    if !(p0.is_finite() && t0.is_finite() && td0.is_finite()) || p0 <= 0.0 || t0 <= 0.0 {
        return Err(AnalysisError::InvalidInput("lcl requires finite, positive inputs"));
    }

    let w = saturation_mixing_ratio_raw(p0, td0);
    let dew_point_at = |p: f64| dewpoint_k(p * w / (EPSILON + w)).ok_or(AnalysisError::MissingValue);

    let mut p = p0;
    let mut converged = false;
    for _ in 0..LCL_MAX_ITERATIONS {
        let td = dew_point_at(p)?;
        let p_next = p0 * (td / t0).powf(1.0 / KAPPA);

        let done = (p_next - p).abs() <= LCL_TOLERANCE * p.abs();
        p = p_next;
        if done {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!(
            "LCL iteration did not converge for p={}, t={}, td={}",
            p0,
            t0,
            td0
        );
    }

    let td = dew_point_at(p)?;
    // Rounding can leave the LCL a hair below the surface for saturated parcels.
    let p = p.min(p0);

    Ok((HectoPascal(p), Kelvin(td)))
}

/// Temperature of a saturated parcel following the moist adiabat from `t` at the reference
/// pressure to each of the pressures.
///
/// The reference defaults to the first pressure. Pressures above and below the reference are
/// integrated separately, outward from the reference, and the output is in the input order.
pub fn moist_lapse<T>(pressure: &[HectoPascal], t: T, reference: Option<HectoPascal>) -> Vec<Kelvin>
where
    T: Temperature,
    Kelvin: From<T>,
{
    let p: Vec<f64> = pressure.iter().map(|p| p.unpack()).collect();
    let t = Kelvin::from(t).unpack();
    let p_ref = match reference.or_else(|| pressure.first().cloned()) {
        Some(p_ref) => p_ref.unpack(),
        None => return vec![],
    };

    moist_lapse_raw(&p, t, p_ref).into_iter().map(Kelvin).collect()
}

/// The moist adiabatic lapse rate, dT/dp in K/hPa.
#[inline]
pub fn moist_lapse_rate<P, T>(pressure: P, temperature: T) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    dt_dp(HectoPascal::from(pressure).unpack(), Kelvin::from(temperature).unpack())
}

/// Moist adiabat with pressures in hPa and temperatures in Kelvin.
pub(crate) fn moist_lapse_raw(pressure: &[f64], t: f64, p_ref: f64) -> Vec<f64> {
    let mut out = vec![std::f64::NAN; pressure.len()];

    let mut up: Vec<usize> = (0..pressure.len()).filter(|&i| pressure[i] <= p_ref).collect();
    up.sort_by(|&a, &b| {
        pressure[b]
            .partial_cmp(&pressure[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut down: Vec<usize> = (0..pressure.len()).filter(|&i| pressure[i] > p_ref).collect();
    down.sort_by(|&a, &b| {
        pressure[a]
            .partial_cmp(&pressure[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for group in &[up, down] {
        let (mut p_curr, mut t_curr) = (p_ref, t);
        for &i in group {
            t_curr = rk4_segment(p_curr, t_curr, pressure[i]);
            p_curr = pressure[i];
            out[i] = t_curr;
        }
    }

    out
}

fn rk4_segment(p0: f64, t0: f64, p1: f64) -> f64 {
    let n = ((p1 - p0).abs() / MAX_MOIST_STEP_HPA).ceil().max(1.0) as usize;
    let h = (p1 - p0) / n as f64;

    let (mut p, mut t) = (p0, t0);
    for _ in 0..n {
        let k1 = dt_dp(p, t);
        let k2 = dt_dp(p + h / 2.0, t + h / 2.0 * k1);
        let k3 = dt_dp(p + h / 2.0, t + h / 2.0 * k2);
        let k4 = dt_dp(p + h, t + h * k3);

        t += h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
        p += h;
    }

    t
}

#[inline]
fn dt_dp(p_hpa: f64, t_k: f64) -> f64 {
    let rs = saturation_mixing_ratio_raw(p_hpa, t_k);
    let frac = (RD * t_k + LV * rs) / (CP_D + (LV * LV * rs * EPSILON / (RD * t_k * t_k)));
    frac / p_hpa
}
