//! Indexes that are specific to a sounding, but not a particular parcel analysis of that sounding.

use crate::{
    constants::{G, RHO_L},
    error::{AnalysisError, Result},
    interpolation::{interpolate_1d, linear_interpolate_sounding},
    layers::{get_layer, Depth, LayerSpec, Level},
    parcel_profile::{parcel_profile, ParcelProfile},
    sounding::Sounding,
    thermo::saturation_mixing_ratio,
    utility::trapezoid,
};
use itertools::izip;
use metfor::{Celsius, HectoPascal, IntHelicityM2pS2, JpKg, Kelvin, Meters, MetersPSec, Mm, Quantity};

/// Precipitable water (mm) between two pressure levels.
///
/// The bounds default to the bottom and top of the levels that have both a pressure and a dew
/// point. A bound outside of those levels is an error.
///
/// # Examples
///
/// ```rust
/// use metcalc::indexes::precipitable_water;
/// # use metcalc::doctest::make_test_sounding;
/// use metfor::{HectoPascal, Mm};
///
/// let snd = make_test_sounding();
///
/// let pw = precipitable_water(&snd, None, None).unwrap();
/// assert!(pw > Mm(0.0));
///
/// assert!(precipitable_water(&snd, None, Some(HectoPascal(500.0))).is_err());
/// ```
pub fn precipitable_water(
    snd: &Sounding,
    bottom: Option<HectoPascal>,
    top: Option<HectoPascal>,
) -> Result<Mm> {
    let p_profile = snd.pressure_profile();
    let dp_profile = snd.dew_point_profile();
    if p_profile.is_empty() || dp_profile.is_empty() {
        return Err(AnalysisError::MissingProfile);
    }

    let (pressure, mw): (Vec<HectoPascal>, Vec<f64>) = izip!(p_profile, dp_profile)
        // Remove levels with missing data
        .filter(|(p, dp)| p.is_some() && dp.is_some())
        // Unpack from the Optioned type
        .map(|(p, dp)| (p.unpack(), dp.unpack()))
        // Convert dew point to mixing ratio
        .map(|(p, dp)| (p, saturation_mixing_ratio(p, dp)))
        .unzip();

    if pressure.len() < 2 {
        return Err(AnalysisError::NotEnoughData);
    }

    let max_p = pressure.iter().cloned().fold(HectoPascal(std::f64::MIN), |a, p| if p > a { p } else { a });
    let min_p = pressure.iter().cloned().fold(HectoPascal(std::f64::MAX), |a, p| if p < a { p } else { a });

    let bottom = bottom.unwrap_or(max_p);
    let top = top.unwrap_or(min_p);

    for &bound in &[bottom, top] {
        if bound > max_p || bound < min_p {
            return Err(AnalysisError::BoundOutOfRange {
                bound: bound.unpack(),
                min: min_p.unpack(),
                max: max_p.unpack(),
            });
        }
    }

    let layer = get_layer(
        &pressure,
        None,
        &[&mw],
        &LayerSpec::with_depth(Depth::Pressure(bottom - top)).bottom(Level::Pressure(bottom)),
    )?;

    let p_pa: Vec<f64> = layer.pressure.iter().map(|p| p.unpack() * 100.0).collect();
    let integrated_mw = -trapezoid(&layer.values[0], &p_pa);

    // kg m^-2 of water is mm of depth
    Ok(Mm(integrated_mw / (G * RHO_L) * 1000.0))
}

// Temperature and dew point (°C) at a pressure level, interpolated linearly in pressure.
fn level_values(snd: &Sounding, p: HectoPascal) -> Result<(f64, f64)> {
    let row = linear_interpolate_sounding(snd, p)?;
    let t = row.temperature.into_option().ok_or(AnalysisError::MissingValue)?;
    let dp = row.dew_point.into_option().ok_or(AnalysisError::MissingValue)?;
    Ok((t.unpack(), dp.unpack()))
}

/// Lifted index, the environment temperature minus the parcel temperature at 500 hPa.
pub fn lifted_index(profile: &ParcelProfile) -> Result<f64> {
    let p: Vec<f64> = profile.pressure.iter().map(|p| p.unpack()).collect();
    let env: Vec<f64> = profile.environment_t.iter().map(|t| t.unpack()).collect();
    let pcl: Vec<f64> = profile.parcel_t.iter().map(|t| t.unpack()).collect();

    let t500 = interpolate_1d(&[500.0], &p, &env)[0];
    let tp500 = interpolate_1d(&[500.0], &p, &pcl)[0];

    let li = t500 - tp500;
    if li.is_nan() {
        Err(AnalysisError::InterpolationError)
    } else {
        Ok(li)
    }
}

/// The K-index, `(T850 - T500) + Td850 - (T700 - Td700)`.
///
/// # Examples
///
/// ```rust
/// use metcalc::indexes::k_index;
/// use metcalc::Sounding;
/// use metfor::{Celsius, HectoPascal};
/// use optional::some;
///
/// let snd = Sounding::new()
///     .with_pressure_profile(vec![
///         some(HectoPascal(850.0)),
///         some(HectoPascal(700.0)),
///         some(HectoPascal(500.0)),
///     ])
///     .with_temperature_profile(vec![
///         some(Celsius(18.0)),
///         some(Celsius(8.0)),
///         some(Celsius(-8.0)),
///     ])
///     .with_dew_point_profile(vec![
///         some(Celsius(14.0)),
///         some(Celsius(0.0)),
///         some(Celsius(-25.0)),
///     ]);
///
/// assert!((k_index(&snd).unwrap() - 32.0).abs() < 1.0e-9);
/// ```
pub fn k_index(snd: &Sounding) -> Result<f64> {
    let (t850, dp850) = level_values(snd, HectoPascal(850.0))?;
    let (t700, dp700) = level_values(snd, HectoPascal(700.0))?;
    let (t500, _) = level_values(snd, HectoPascal(500.0))?;

    Ok((t850 - t500) + dp850 - (t700 - dp700))
}

/// Total totals index, the vertical totals plus the cross totals.
pub fn total_totals_index(snd: &Sounding) -> Result<f64> {
    let (t850, dp850) = level_values(snd, HectoPascal(850.0))?;
    let (t500, _) = level_values(snd, HectoPascal(500.0))?;

    Ok((t850 - t500) + (dp850 - t500))
}

/// Vertical totals, the 850 hPa temperature minus the 500 hPa temperature.
pub fn vertical_totals(snd: &Sounding) -> Result<f64> {
    let (t850, _) = level_values(snd, HectoPascal(850.0))?;
    let (t500, _) = level_values(snd, HectoPascal(500.0))?;

    Ok(t850 - t500)
}

/// Cross totals, the 850 hPa dew point minus the 500 hPa temperature.
pub fn cross_totals(snd: &Sounding) -> Result<f64> {
    let (_, dp850) = level_values(snd, HectoPascal(850.0))?;
    let (t500, _) = level_values(snd, HectoPascal(500.0))?;

    Ok(dp850 - t500)
}

/// Showalter index, the 500 hPa environment temperature minus the temperature of a parcel lifted
/// from 850 hPa.
pub fn showalter_index(snd: &Sounding) -> Result<f64> {
    let (t850, dp850) = level_values(snd, HectoPascal(850.0))?;
    let (t500, _) = level_values(snd, HectoPascal(500.0))?;

    let parcel = parcel_profile(
        &[HectoPascal(850.0), HectoPascal(500.0)],
        Celsius(t850),
        Celsius(dp850),
    )?;
    let tp500 = parcel.last().ok_or(AnalysisError::NotEnoughData)?;

    Ok(Kelvin::from(Celsius(t500)).unpack() - tp500.unpack())
}

/// Supercell composite parameter.
///
/// The effective bulk shear term is capped at 20 m/s, and zero below 10 m/s.
///
/// # Examples
///
/// ```rust
/// use metcalc::indexes::supercell_composite;
/// use metfor::{IntHelicityM2pS2, JpKg, MetersPSec};
///
/// let scp = supercell_composite(JpKg(2000.0), IntHelicityM2pS2(400.0), MetersPSec(30.0));
/// assert!((scp - 16.0).abs() < 1.0e-12);
/// ```
pub fn supercell_composite(
    mucape: JpKg,
    effective_srh: IntHelicityM2pS2,
    effective_shear: MetersPSec,
) -> f64 {
    let shear = effective_shear.unpack().min(20.0);
    let shear = if shear < 10.0 { 0.0 } else { shear / 20.0 };

    mucape.unpack() / 1000.0 * effective_srh.unpack() / 50.0 * shear
}

/// Significant tornado parameter, the fixed layer version.
///
/// The LCL height term is `(2000 - z) / 1000` with the height clamped to 1000-2000 m. The 0-6 km
/// shear term is capped at 30 m/s, and zero below 12.5 m/s.
pub fn significant_tornado(
    sbcape: JpKg,
    lcl_height: Meters,
    srh_1km: IntHelicityM2pS2,
    shear_6km: MetersPSec,
) -> f64 {
    let lcl = (2000.0 - lcl_height.unpack().max(1000.0).min(2000.0)) / 1000.0;

    let shear = shear_6km.unpack().min(30.0);
    let shear = if shear < 12.5 { 0.0 } else { shear / 20.0 };

    sbcape.unpack() / 1500.0 * lcl * srh_1km.unpack() / 150.0 * shear
}
