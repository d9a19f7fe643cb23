use crate::constants::{EPSILON, ZERO_C};
use metfor::{Celsius, HectoPascal, Kelvin, Pressure, Quantity, Temperature};

use super::{lcl, moist_lapse, potential_temperature};

/// Saturation vapor pressure over liquid water (Bolton, 1980).
///
/// # Examples
///
/// ```rust
/// use metcalc::saturation_vapor_pressure;
/// use metfor::{Celsius, Quantity};
///
/// let es = saturation_vapor_pressure(Celsius(0.0));
/// assert!((es.unpack() - 6.112).abs() < 1.0e-9);
/// ```
#[inline]
pub fn saturation_vapor_pressure<T>(temperature: T) -> HectoPascal
where
    T: Temperature,
    Kelvin: From<T>,
{
    HectoPascal(svp_hpa(Kelvin::from(temperature).unpack()))
}

/// Dew point for a given vapor pressure, the inverse of `saturation_vapor_pressure`.
///
/// Returns `None` for non-positive vapor pressures.
#[inline]
pub fn dewpoint<P>(vapor_pressure: P) -> Option<Celsius>
where
    P: Pressure,
    HectoPascal: From<P>,
{
    dewpoint_k(HectoPascal::from(vapor_pressure).unpack())
        .map(Kelvin)
        .map(Celsius::from)
}

/// Partial pressure of water vapor given the total pressure and the mixing ratio (kg/kg).
#[inline]
pub fn vapor_pressure<P>(pressure: P, mixing_ratio: f64) -> HectoPascal
where
    P: Pressure,
    HectoPascal: From<P>,
{
    let p = HectoPascal::from(pressure).unpack();
    HectoPascal(p * mixing_ratio / (EPSILON + mixing_ratio))
}

/// Mixing ratio (kg/kg) from the partial pressure of water vapor and the total pressure.
#[inline]
pub fn mixing_ratio<P1, P2>(partial_pressure: P1, total_pressure: P2) -> f64
where
    P1: Pressure,
    HectoPascal: From<P1>,
    P2: Pressure,
    HectoPascal: From<P2>,
{
    let e = HectoPascal::from(partial_pressure).unpack();
    let p = HectoPascal::from(total_pressure).unpack();
    mixing_ratio_raw(e, p)
}

/// Saturation mixing ratio (kg/kg) at the given pressure and temperature.
#[inline]
pub fn saturation_mixing_ratio<P, T>(pressure: P, temperature: T) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let p = HectoPascal::from(pressure).unpack();
    let t = Kelvin::from(temperature).unpack();
    saturation_mixing_ratio_raw(p, t)
}

/// Dew point from temperature and relative humidity (0.0 to 1.0).
#[inline]
pub fn dewpoint_from_relative_humidity<T>(temperature: T, relative_humidity: f64) -> Option<Celsius>
where
    T: Temperature,
    Kelvin: From<T>,
{
    let es = svp_hpa(Kelvin::from(temperature).unpack());
    dewpoint(HectoPascal(relative_humidity * es))
}

/// Relative humidity (0.0 to 1.0) from temperature and dew point.
#[inline]
pub fn relative_humidity_from_dewpoint<T1, T2>(temperature: T1, dew_point: T2) -> f64
where
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let e = svp_hpa(Kelvin::from(dew_point).unpack());
    let es = svp_hpa(Kelvin::from(temperature).unpack());
    e / es
}

/// Relative humidity (0.0 to 1.0) from the mixing ratio, using the WMO definition based on
/// mixing ratios.
pub fn relative_humidity_from_mixing_ratio<P, T>(pressure: P, temperature: T, mixing_ratio: f64) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let ws = saturation_mixing_ratio(pressure, temperature);
    mixing_ratio / (EPSILON + mixing_ratio) * (EPSILON + ws) / ws
}

/// Mixing ratio (kg/kg) from relative humidity (0.0 to 1.0).
pub fn mixing_ratio_from_relative_humidity<P, T>(
    pressure: P,
    temperature: T,
    relative_humidity: f64,
) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let ws = saturation_mixing_ratio(pressure, temperature);
    (EPSILON * relative_humidity * ws) / (EPSILON + ws * (1.0 - relative_humidity))
}

/// Relative humidity (0.0 to 1.0) from specific humidity (kg/kg).
pub fn relative_humidity_from_specific_humidity<P, T>(
    pressure: P,
    temperature: T,
    specific_humidity: f64,
) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    relative_humidity_from_mixing_ratio(
        pressure,
        temperature,
        mixing_ratio_from_specific_humidity(specific_humidity),
    )
}

/// Mixing ratio from specific humidity, both in kg/kg.
#[inline]
pub fn mixing_ratio_from_specific_humidity(specific_humidity: f64) -> f64 {
    specific_humidity / (1.0 - specific_humidity)
}

/// Specific humidity from mixing ratio, both in kg/kg.
#[inline]
pub fn specific_humidity_from_mixing_ratio(mixing_ratio: f64) -> f64 {
    mixing_ratio / (1.0 + mixing_ratio)
}

/// Specific humidity (kg/kg) from pressure and dew point.
#[inline]
pub fn specific_humidity_from_dewpoint<P, T>(pressure: P, dew_point: T) -> f64
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    specific_humidity_from_mixing_ratio(saturation_mixing_ratio(pressure, dew_point))
}

/// Equivalent potential temperature using the formula of Bolton (1980).
///
/// # Examples
///
/// ```rust
/// use metcalc::equivalent_potential_temperature;
/// use metfor::{Celsius, HectoPascal, Quantity};
///
/// let theta_e = equivalent_potential_temperature(HectoPascal(1000.0), Celsius(30.0), Celsius(20.0));
/// assert!(theta_e.unpack() > 345.0 && theta_e.unpack() < 350.0);
/// ```
pub fn equivalent_potential_temperature<P, T1, T2>(pressure: P, temperature: T1, dew_point: T2) -> Kelvin
where
    P: Pressure,
    HectoPascal: From<P>,
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let p = HectoPascal::from(pressure).unpack();
    let t = Kelvin::from(temperature).unpack();
    let td = Kelvin::from(dew_point).unpack();

    let r = saturation_mixing_ratio_raw(p, td);
    let e = svp_hpa(td);
    let t_l = 56.0 + 1.0 / (1.0 / (td - 56.0) + (t / td).ln() / 800.0);
    let th_l = potential_temperature::<HectoPascal, Kelvin>(HectoPascal(p - e), Kelvin(t)).unpack()
        * (t / t_l).powf(0.28 * r);

    Kelvin(th_l * (r * (1.0 + 0.448 * r) * (3036.0 / t_l - 1.78)).exp())
}

/// Saturation equivalent potential temperature, Bolton (1980) with the dew point set to the
/// temperature.
pub fn saturation_equivalent_potential_temperature<P, T>(pressure: P, temperature: T) -> Kelvin
where
    P: Pressure,
    HectoPascal: From<P>,
    T: Temperature,
    Kelvin: From<T>,
{
    let p = HectoPascal::from(pressure).unpack();
    let t = Kelvin::from(temperature).unpack();

    let e = svp_hpa(t);
    let r = saturation_mixing_ratio_raw(p, t);
    let th_l = potential_temperature::<HectoPascal, Kelvin>(HectoPascal(p - e), Kelvin(t)).unpack();

    Kelvin(th_l * ((3036.0 / t - 1.78) * r * (1.0 + 0.448 * r)).exp())
}

/// Wet bulb potential temperature from the equivalent potential temperature using the fit of
/// Davies-Jones (2008).
pub fn wet_bulb_potential_temperature<P, T1, T2>(pressure: P, temperature: T1, dew_point: T2) -> Kelvin
where
    P: Pressure,
    HectoPascal: From<P>,
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let theta_e = equivalent_potential_temperature(pressure, temperature, dew_point).unpack();
    if theta_e <= 173.15 {
        return Kelvin(theta_e);
    }

    let x = theta_e / ZERO_C;
    let x2 = x * x;
    let x3 = x2 * x;
    let x4 = x2 * x2;
    let a = 7.101574 - 20.68208 * x + 16.11182 * x2 + 2.574631 * x3 - 5.205688 * x4;
    let b = 1.0 - 3.552497 * x + 3.781782 * x2 - 0.6899655 * x3 - 0.5929340 * x4;

    Kelvin(theta_e - (a / b).exp())
}

/// Wet bulb temperature by Normand's rule: lift the parcel to its LCL, then bring it back down
/// the moist adiabat to the starting pressure.
///
/// Returns `None` if the LCL cannot be found, e.g. for a completely dry parcel.
pub fn wet_bulb_temperature<P, T1, T2>(pressure: P, temperature: T1, dew_point: T2) -> Option<Kelvin>
where
    P: Pressure,
    HectoPascal: From<P>,
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let p = HectoPascal::from(pressure);
    let (lcl_p, lcl_t) = lcl::<HectoPascal, Kelvin, Kelvin>(p, Kelvin::from(temperature), Kelvin::from(dew_point)).ok()?;

    moist_lapse(&[p], lcl_t, Some(lcl_p)).pop()
}

/// Vapor pressure from wet and dry bulb readings of a psychrometer.
pub fn psychrometric_vapor_pressure_wet<P, T1, T2>(pressure: P, dry_bulb: T1, wet_bulb: T2) -> HectoPascal
where
    P: Pressure,
    HectoPascal: From<P>,
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    const PSYCHROMETER_COEFFICIENT: f64 = 6.21e-4;

    let p = HectoPascal::from(pressure).unpack();
    let t = Kelvin::from(dry_bulb).unpack();
    let tw = Kelvin::from(wet_bulb).unpack();

    HectoPascal(svp_hpa(tw) - PSYCHROMETER_COEFFICIENT * p * (t - tw))
}

//
// Raw kernels used in tight loops. Temperatures in Kelvin, pressures in hPa.
//

#[inline]
pub(crate) fn svp_hpa(t_k: f64) -> f64 {
    let t_c = t_k - ZERO_C;
    6.112 * (17.67 * t_c / (t_c + 243.5)).exp()
}

#[inline]
pub(crate) fn dewpoint_k(e_hpa: f64) -> Option<f64> {
    if e_hpa <= 0.0 || !e_hpa.is_finite() {
        return None;
    }
    let val = (e_hpa / 6.112).ln();
    Some(243.5 * val / (17.67 - val) + ZERO_C)
}

#[inline]
pub(crate) fn mixing_ratio_raw(e_hpa: f64, p_hpa: f64) -> f64 {
    EPSILON * e_hpa / (p_hpa - e_hpa)
}

#[inline]
pub(crate) fn saturation_mixing_ratio_raw(p_hpa: f64, t_k: f64) -> f64 {
    mixing_ratio_raw(svp_hpa(t_k), p_hpa)
}
