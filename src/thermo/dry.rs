use crate::{
    constants::{CP_D, EARTH_RADIUS, EPSILON, G, GM, KAPPA, LV, P0, RD},
    error::{AnalysisError, Result},
    grid::first_derivative_1d,
    layers::{get_layer, LayerSpec},
};
use metfor::{HectoPascal, JpKg, Kelvin, Meters, MetersPSec, PaPS, Pressure, Quantity, Temperature};
use optional::{none, some, Optioned};

use super::{mixing_ratio_raw, saturation_mixing_ratio_raw, svp_hpa};

/// Potential temperature, the temperature of a parcel brought dry adiabatically to 1000 hPa.
///
/// # Examples
///
/// ```rust
/// use metcalc::potential_temperature;
/// use metfor::{HectoPascal, Kelvin, Quantity};
///
/// let theta = potential_temperature(HectoPascal(800.0), Kelvin(273.0));
/// assert!((theta.unpack() - 290.97).abs() < 0.01);
/// ```
#[inline]
pub fn potential_temperature<P, T>(pressure: P, temperature: T) -> Kelvin
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let t = Kelvin::from(temperature).unpack();
    Kelvin(t / exner_function(pressure))
}

/// Temperature at a pressure level for a given potential temperature.
#[inline]
pub fn temperature_from_potential_temperature<P, T>(pressure: P, potential_temperature: T) -> Kelvin
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let theta = Kelvin::from(potential_temperature).unpack();
    Kelvin(theta * exner_function(pressure))
}

/// The Exner function, `(p / 1000 hPa)^κ`.
#[inline]
pub fn exner_function<P>(pressure: P) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
{
    (HectoPascal::from(pressure).unpack() / P0).powf(KAPPA)
}

/// Temperature of a parcel lifted dry adiabatically from `t` at the reference pressure to each
/// of the pressures. The reference defaults to the first pressure.
pub fn dry_lapse<T>(pressure: &[HectoPascal], t: T, reference: Option<HectoPascal>) -> Vec<Kelvin>
where
    T: Temperature,
    Kelvin: From<T>,
{
    let t = Kelvin::from(t).unpack();
    let p_ref = match reference.or_else(|| pressure.first().cloned()) {
        Some(p_ref) => p_ref.unpack(),
        None => return vec![],
    };

    pressure
        .iter()
        .map(|p| Kelvin(t * (p.unpack() / p_ref).powf(KAPPA)))
        .collect()
}

/// Virtual temperature from the temperature and mixing ratio (kg/kg).
#[inline]
pub fn virtual_temperature<T>(temperature: T, mixing_ratio: f64) -> Kelvin
where
    T: Temperature,
    Kelvin: From<T>,
{
    let t = Kelvin::from(temperature).unpack();
    Kelvin(virtual_temperature_raw(t, mixing_ratio))
}

/// Virtual temperature from the pressure, temperature, and dew point.
#[inline]
pub fn virtual_temperature_from_dewpoint<P, T1, T2>(pressure: P, temperature: T1, dew_point: T2) -> Kelvin
where
    P: Pressure,
    HectoPascal: From<P>,
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let p = HectoPascal::from(pressure).unpack();
    let td = Kelvin::from(dew_point).unpack();
    virtual_temperature(temperature, saturation_mixing_ratio_raw(p, td))
}

/// Virtual potential temperature from the pressure, temperature, and mixing ratio (kg/kg).
#[inline]
pub fn virtual_potential_temperature<P, T>(pressure: P, temperature: T, mixing_ratio: f64) -> Kelvin
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let theta = potential_temperature(pressure, temperature);
    virtual_temperature::<Kelvin>(theta, mixing_ratio)
}

/// Density of moist air (kg/m³) from the ideal gas law with the virtual temperature.
#[inline]
pub fn density<P, T>(pressure: P, temperature: T, mixing_ratio: f64) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let p_pa = HectoPascal::from(pressure).unpack() * 100.0;
    let tv = virtual_temperature(temperature, mixing_ratio).unpack();
    p_pa / (RD * tv)
}

/// Scale height of an isothermal layer at the mean of the bottom and top temperatures.
#[inline]
pub fn scale_height<T1, T2>(temperature_bottom: T1, temperature_top: T2) -> Meters
where
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let t_bar = 0.5 * (Kelvin::from(temperature_bottom).unpack() + Kelvin::from(temperature_top).unpack());
    Meters(RD * t_bar / G)
}

/// Thickness of a layer from the hypsometric equation.
///
/// With a mixing ratio profile the virtual temperature is used. Without a `layer` the whole
/// profile is used, otherwise the layer is extracted with [`get_layer`].
pub fn thickness_hydrostatic(
    pressure: &[HectoPascal],
    temperature: &[Kelvin],
    mixing_ratio: Option<&[f64]>,
    layer: Option<&LayerSpec>,
) -> Result<Meters> {
    if pressure.len() != temperature.len()
        || mixing_ratio.map(|w| w.len() != pressure.len()).unwrap_or(false)
    {
        return Err(AnalysisError::MismatchedLengths);
    }

    let t: Vec<f64> = temperature.iter().map(|t| t.unpack()).collect();
    let tv: Vec<f64> = match mixing_ratio {
        Some(w) => t
            .iter()
            .zip(w)
            .map(|(&t, &w)| virtual_temperature_raw(t, w))
            .collect(),
        None => t,
    };

    let (p, tv) = match layer {
        Some(spec) => {
            let mut layer = get_layer(pressure, None, &[&tv], spec)?;
            let p: Vec<f64> = layer.pressure.iter().map(|p| p.unpack()).collect();
            (p, layer.values.pop().unwrap_or_default())
        }
        None => (pressure.iter().map(|p| p.unpack()).collect(), tv),
    };

    if p.len() < 2 {
        return Err(AnalysisError::NotEnoughData);
    }

    let ln_p: Vec<f64> = p.iter().map(|p| p.ln()).collect();
    Ok(Meters(-RD / G * crate::utility::trapezoid(&tv, &ln_p)))
}

/// Static stability in pressure coordinates, `-(Rd T / p) ∂ln θ/∂p`, in J kg⁻¹ Pa⁻².
pub fn static_stability(pressure: &[HectoPascal], temperature: &[Kelvin]) -> Result<Vec<f64>> {
    if pressure.len() != temperature.len() {
        return Err(AnalysisError::MismatchedLengths);
    }

    let p_pa: Vec<f64> = pressure.iter().map(|p| p.unpack() * 100.0).collect();
    let ln_theta: Vec<f64> = pressure
        .iter()
        .zip(temperature)
        .map(|(&p, &t)| potential_temperature(p, t).unpack().ln())
        .collect();

    let dln_theta_dp = first_derivative_1d(&ln_theta, &p_pa)?;

    Ok(p_pa
        .iter()
        .zip(temperature)
        .zip(dln_theta_dp)
        .map(|((&p, t), d)| -RD * t.unpack() / p * d)
        .collect())
}

/// Geopotential (m²/s²) of a height above sea level, accounting for the decrease of gravity
/// with height.
#[inline]
pub fn height_to_geopotential<L>(height: L) -> f64
where
    L: metfor::Length,
    Meters: From<L>,
{
    let z = Meters::from(height).unpack();
    GM * (1.0 / EARTH_RADIUS - 1.0 / (EARTH_RADIUS + z))
}

/// Height above sea level of a geopotential (m²/s²), the inverse of `height_to_geopotential`.
#[inline]
pub fn geopotential_to_height(geopotential: f64) -> Meters {
    Meters(1.0 / (1.0 / EARTH_RADIUS - geopotential / GM) - EARTH_RADIUS)
}

/// Square of the Brunt-Väisälä frequency, `(g / θ) ∂θ/∂z`, in s⁻².
pub fn brunt_vaisala_frequency_squared(
    height: &[Meters],
    potential_temperature: &[Kelvin],
) -> Result<Vec<f64>> {
    if height.len() != potential_temperature.len() {
        return Err(AnalysisError::MismatchedLengths);
    }

    let z: Vec<f64> = height.iter().map(|z| z.unpack()).collect();
    let theta: Vec<f64> = potential_temperature.iter().map(|t| t.unpack()).collect();

    let dtheta_dz = first_derivative_1d(&theta, &z)?;

    Ok(theta
        .iter()
        .zip(dtheta_dz)
        .map(|(theta, d)| G / theta * d)
        .collect())
}

/// The Brunt-Väisälä frequency (s⁻¹). Missing where the layer is statically unstable.
pub fn brunt_vaisala_frequency(
    height: &[Meters],
    potential_temperature: &[Kelvin],
) -> Result<Vec<Optioned<f64>>> {
    let n2 = brunt_vaisala_frequency_squared(height, potential_temperature)?;

    Ok(n2
        .into_iter()
        .map(|n2| if n2 >= 0.0 { some(n2.sqrt()) } else { none() })
        .collect())
}

/// The Brunt-Väisälä period (s), `2π / N`. Missing where the layer is neutral or unstable.
pub fn brunt_vaisala_period(
    height: &[Meters],
    potential_temperature: &[Kelvin],
) -> Result<Vec<Optioned<f64>>> {
    let n2 = brunt_vaisala_frequency_squared(height, potential_temperature)?;

    Ok(n2
        .into_iter()
        .map(|n2| {
            if n2 > 0.0 {
                some(2.0 * std::f64::consts::PI / n2.sqrt())
            } else {
                none()
            }
        })
        .collect())
}

/// Dry static energy, `g z + cp T`.
#[inline]
pub fn dry_static_energy<T>(height: Meters, temperature: T) -> JpKg
where
    T: Temperature,
    Kelvin: From<T>,
{
    let t = Kelvin::from(temperature).unpack();
    JpKg(height_to_geopotential(height) + CP_D * t)
}

/// Moist static energy, `g z + cp T + Lv q` with the specific humidity `q` in kg/kg.
#[inline]
pub fn moist_static_energy<T>(height: Meters, temperature: T, specific_humidity: f64) -> JpKg
where
    T: Temperature,
    Kelvin: From<T>,
{
    JpKg(dry_static_energy(height, temperature).unpack() + LV * specific_humidity)
}

/// Convert a vertical velocity in height coordinates to pressure coordinates assuming
/// hydrostatic balance, `ω = -ρ g w`.
pub fn vertical_velocity_pressure<P, T>(
    w: MetersPSec,
    pressure: P,
    temperature: T,
    mixing_ratio: f64,
) -> PaPS
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let rho = density(pressure, temperature, mixing_ratio);
    PaPS(-rho * G * w.unpack())
}

/// Convert a vertical velocity in pressure coordinates to height coordinates assuming
/// hydrostatic balance, `w = -ω / (ρ g)`.
pub fn vertical_velocity<P, T>(omega: PaPS, pressure: P, temperature: T, mixing_ratio: f64) -> MetersPSec
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let rho = density(pressure, temperature, mixing_ratio);
    MetersPSec(-omega.unpack() / (rho * G))
}

#[inline]
pub(crate) fn virtual_temperature_raw(t_k: f64, mixing_ratio: f64) -> f64 {
    t_k * (mixing_ratio + EPSILON) / (EPSILON * (1.0 + mixing_ratio))
}

/// Virtual temperature (K) from pressure (hPa) and temperature and dew point (K).
#[inline]
pub(crate) fn virtual_temperature_from_dewpoint_raw(p_hpa: f64, t_k: f64, td_k: f64) -> f64 {
    virtual_temperature_raw(t_k, mixing_ratio_raw(svp_hpa(td_k), p_hpa))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::*;
    use metfor::Celsius;

    #[test]
    fn test_potential_temperature() {
        let theta = potential_temperature(HectoPascal(1000.0), Celsius(20.0));
        assert!(approx_equal(theta.unpack(), 293.15, 1.0e-12));

        let theta = potential_temperature(HectoPascal(800.0), Kelvin(273.0));
        assert!(approx_equal(theta.unpack(), 290.9720, 1.0e-3));

        let t = temperature_from_potential_temperature(HectoPascal(800.0), theta);
        assert!(approx_equal(t.unpack(), 273.0, 1.0e-10));
    }

    #[test]
    fn test_dry_lapse() {
        let p = [HectoPascal(1000.0), HectoPascal(900.0), HectoPascal(500.0)];
        let t = dry_lapse(&p, Kelvin(293.0), None);

        assert_eq!(t.len(), 3);
        assert!(approx_equal(t[0].unpack(), 293.0, 1.0e-12));
        assert!(approx_equal(t[2].unpack(), 240.3583, 1.0e-3));

        // From a reference below the first level
        let t = dry_lapse(&p[1..], Kelvin(293.0), Some(HectoPascal(1000.0)));
        assert!(approx_equal(t[1].unpack(), 240.3583, 1.0e-3));

        assert!(dry_lapse(&[], Kelvin(293.0), None).is_empty());
    }

    #[test]
    fn test_virtual_temperature() {
        let tv = virtual_temperature(Kelvin(288.0), 0.0122);
        assert!(approx_equal(tv.unpack(), 290.1099, 1.0e-3), "{}", tv.unpack());

        let tv = virtual_temperature(Kelvin(288.0), 0.0);
        assert!(approx_equal(tv.unpack(), 288.0, 1.0e-12));

        let tv = virtual_temperature_from_dewpoint(HectoPascal(1000.0), Celsius(30.0), Celsius(25.0));
        assert!(tv > Kelvin(303.15));
    }

    #[test]
    fn test_density() {
        let rho = density(HectoPascal(1000.0), Kelvin(273.15), 0.0);
        assert!(approx_equal(rho, 1.27540, 1.0e-4), "{}", rho);
    }

    #[test]
    fn test_thickness_hydrostatic_isothermal() {
        let p: Vec<HectoPascal> = [1000.0, 900.0, 800.0, 700.0, 600.0, 500.0]
            .iter()
            .cloned()
            .map(HectoPascal)
            .collect();
        let t = vec![Kelvin(273.15); p.len()];

        let dz = thickness_hydrostatic(&p, &t, None, None).unwrap();
        let expected = RD * 273.15 / G * (1000.0f64 / 500.0).ln();
        assert!(approx_equal(dz.unpack(), expected, 1.0e-6));

        let spec = LayerSpec::with_depth(crate::layers::Depth::Pressure(HectoPascal(200.0)));
        let dz = thickness_hydrostatic(&p, &t, None, Some(&spec)).unwrap();
        let expected = RD * 273.15 / G * (1000.0f64 / 800.0).ln();
        assert!(approx_equal(dz.unpack(), expected, 1.0e-6));

        // Moisture makes the layer thicker.
        let w = vec![0.01; p.len()];
        let dz_moist = thickness_hydrostatic(&p, &t, Some(&w), Some(&spec)).unwrap();
        assert!(dz_moist > dz);

        assert_eq!(
            thickness_hydrostatic(&p, &t[1..], None, None),
            Err(AnalysisError::MismatchedLengths)
        );
    }

    #[test]
    fn test_static_stability_isentropic() {
        let p: Vec<HectoPascal> = [1000.0, 900.0, 800.0, 700.0]
            .iter()
            .cloned()
            .map(HectoPascal)
            .collect();
        let t = dry_lapse(&p, Kelvin(300.0), None);

        let sigma = static_stability(&p, &t).unwrap();
        for s in sigma {
            assert!(s.abs() < 1.0e-12);
        }
    }

    #[test]
    fn test_geopotential_round_trip() {
        let phi = height_to_geopotential(Meters(5000.0));
        assert!(approx_equal(phi, 49062.61, 0.5), "{}", phi);

        let z = geopotential_to_height(phi);
        assert!(approx_equal(z.unpack(), 5000.0, 1.0e-6));
    }

    #[test]
    fn test_brunt_vaisala() {
        let z: Vec<Meters> = [0.0, 1000.0, 2000.0, 3000.0].iter().cloned().map(Meters).collect();
        let theta: Vec<Kelvin> = [300.0, 303.0, 306.0, 305.0].iter().cloned().map(Kelvin).collect();

        let n2 = brunt_vaisala_frequency_squared(&z, &theta).unwrap();
        assert!(approx_equal(n2[0], G / 300.0 * 0.003, 1.0e-9));

        let n = brunt_vaisala_frequency(&z, &theta).unwrap();
        assert!(approx_equal(n[0].unpack(), (G / 300.0 * 0.003).sqrt(), 1.0e-9));
        // Unstable at the top
        assert!(n[3].is_none());

        let period = brunt_vaisala_period(&z, &theta).unwrap();
        assert!(approx_equal(period[0].unpack(), 2.0 * std::f64::consts::PI / n[0].unpack(), 1.0e-9));
        assert!(period[3].is_none());
    }

    #[test]
    fn test_static_energy() {
        let dse = dry_static_energy(Meters(1000.0), Kelvin(290.0));
        let mse = moist_static_energy(Meters(1000.0), Kelvin(290.0), 0.01);

        assert!(approx_equal(mse.unpack() - dse.unpack(), LV * 0.01, 1.0e-6));
        assert!(approx_equal(dse.unpack(), 9818.68 + CP_D * 290.0, 1.0));
    }

    #[test]
    fn test_vertical_velocity_round_trip() {
        let omega = vertical_velocity_pressure(MetersPSec(1.0), HectoPascal(500.0), Celsius(-20.0), 0.0);
        assert!(omega.unpack() < 0.0);

        let w = vertical_velocity(omega, HectoPascal(500.0), Celsius(-20.0), 0.0);
        assert!(approx_equal(w.unpack(), 1.0, 1.0e-12));
    }
}
