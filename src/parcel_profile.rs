//! Create and analyze a profile from lifting or descending a parcel.
use crate::{
    error::{AnalysisError, Result},
    interpolation::interpolate_1d,
    layers::{get_layer, Depth, LayerSpec, Level},
    parcel::{mixed_parcel, most_unstable_parcel},
    sounding::Sounding,
    thermo::{
        dry_lapse, equivalent_potential_temperature, lcl, moist_lapse,
        virtual_temperature_from_dewpoint_raw, wet_bulb_temperature,
    },
    utility::{greater_or_close, trapezoid},
};
use metfor::{Celsius, HectoPascal, JpKg, Kelvin, Quantity, Temperature};
use strum_macros::{Display, EnumIter, EnumString};

pub use self::lift::{cape_cin, ccl, el, lfc};

mod lift;

/// Hold profiles for a parcel and its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelProfile {
    /// Pressure profile
    pub pressure: Vec<HectoPascal>,
    /// Environment temperature profile
    pub environment_t: Vec<Kelvin>,
    /// Environment dew point profile
    pub environment_dp: Vec<Kelvin>,
    /// Parcel temperature profile
    pub parcel_t: Vec<Kelvin>,
}

/// Which level to choose when a parcel crosses the environment more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ParcelLevelChoice {
    /// The highest crossing.
    Top,
    /// The lowest crossing.
    Bottom,
    /// The crossing giving the widest pressure span between an LFC and its EL.
    Wide,
    /// The crossing giving the most CAPE.
    MostCape,
}

impl ParcelProfile {
    /// Lift a parcel from the first level of the profile without adding the LCL as a level.
    pub fn new(
        pressure: Vec<HectoPascal>,
        environment_t: Vec<Kelvin>,
        environment_dp: Vec<Kelvin>,
    ) -> Result<Self> {
        if pressure.len() != environment_t.len() || pressure.len() != environment_dp.len() {
            return Err(AnalysisError::MismatchedLengths);
        }
        if pressure.is_empty() {
            return Err(AnalysisError::NotEnoughData);
        }

        let parcel_t = parcel_profile(&pressure, environment_t[0], environment_dp[0])?;

        Ok(ParcelProfile {
            pressure,
            environment_t,
            environment_dp,
            parcel_t,
        })
    }

    /// Lift a parcel from the first level of the profile and insert the LCL as a level.
    ///
    /// The environment temperature and dew point are linearly interpolated to the LCL.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metcalc::ParcelProfile;
    /// use metfor::{Celsius, HectoPascal, Kelvin};
    ///
    /// let p: Vec<HectoPascal> = vec![1000.0, 900.0, 800.0, 700.0]
    ///     .into_iter()
    ///     .map(HectoPascal)
    ///     .collect();
    /// let t: Vec<Kelvin> = vec![25.0, 18.0, 10.0, 2.0]
    ///     .into_iter()
    ///     .map(|t| Kelvin::from(Celsius(t)))
    ///     .collect();
    /// let td: Vec<Kelvin> = vec![15.0, 10.0, 0.0, -10.0]
    ///     .into_iter()
    ///     .map(|t| Kelvin::from(Celsius(t)))
    ///     .collect();
    ///
    /// let profile = ParcelProfile::with_lcl(&p, &t, &td).unwrap();
    /// assert_eq!(profile.pressure.len(), 5);
    /// ```
    pub fn with_lcl(pressure: &[HectoPascal], temperature: &[Kelvin], dew_point: &[Kelvin]) -> Result<Self> {
        if pressure.len() != temperature.len() || pressure.len() != dew_point.len() {
            return Err(AnalysisError::MismatchedLengths);
        }
        if pressure.is_empty() {
            return Err(AnalysisError::NotEnoughData);
        }

        let segments = parcel_segments(pressure, temperature[0], dew_point[0])?;

        let p_raw: Vec<f64> = pressure.iter().map(|p| p.unpack()).collect();
        let lcl_p = segments.lcl_p.unpack();
        let insert_idx = p_raw.iter().filter(|&&p| p >= lcl_p).count();

        let mut new_p = pressure.to_vec();
        let mut new_t = temperature.to_vec();
        let mut new_dp = dew_point.to_vec();

        if segments.lcl_in_profile {
            let interp_env = |vals: &[Kelvin]| {
                let raw: Vec<f64> = vals.iter().map(|v| v.unpack()).collect();
                Kelvin(interpolate_1d(&[lcl_p], &p_raw, &raw)[0])
            };

            new_t.insert(insert_idx, interp_env(temperature));
            new_dp.insert(insert_idx, interp_env(dew_point));
            new_p.insert(insert_idx, segments.lcl_p);
        }

        let mut parcel_t = segments.lower_t;
        if segments.lcl_in_profile {
            parcel_t.push(segments.lcl_t);
        }
        parcel_t.extend(segments.upper_t);

        Ok(ParcelProfile {
            pressure: new_p,
            environment_t: new_t,
            environment_dp: new_dp,
            parcel_t,
        })
    }

    /// Profile of a parcel lifted from the surface, with the LCL as a level.
    pub fn surface_based(snd: &Sounding) -> Result<Self> {
        let (p, t, dp) = kelvin_columns(snd)?;
        ParcelProfile::with_lcl(&p, &t, &dp)
    }

    /// Profile of a mixed layer parcel, with the LCL as a level.
    ///
    /// The levels within the mixed layer are replaced by the mixed parcel at the start pressure.
    pub fn mixed_layer(
        snd: &Sounding,
        layer: &LayerSpec,
        start_pressure: Option<HectoPascal>,
    ) -> Result<Self> {
        let (p, t, dp) = kelvin_columns(snd)?;
        let start_p = start_pressure.unwrap_or(p[0]);

        let pcl = mixed_parcel(snd, layer, start_pressure)?;

        let top_p = match layer.depth {
            Depth::Pressure(depth) => start_p - depth,
            Depth::Height(_) => layer_top(snd, layer)?,
        };

        let mut new_p = vec![pcl.pressure];
        let mut new_t = vec![Kelvin::from(pcl.temperature)];
        let mut new_dp = vec![Kelvin::from(pcl.dew_point)];

        for ((&p, &t), &dp) in p.iter().zip(&t).zip(&dp).filter(|((&p, _), _)| p < top_p) {
            new_p.push(p);
            new_t.push(t);
            new_dp.push(dp);
        }

        ParcelProfile::with_lcl(&new_p, &new_t, &new_dp)
    }

    /// Profile of the most unstable parcel in the lowest `depth` of the sounding.
    ///
    /// The profile starts at the most unstable level and the LCL is not added as a level.
    pub fn most_unstable(snd: &Sounding, depth: HectoPascal) -> Result<Self> {
        let (p, t, dp) = kelvin_columns(snd)?;
        let (_, idx) = most_unstable_parcel(snd, depth)?;

        ParcelProfile::new(p[idx..].to_vec(), t[idx..].to_vec(), dp[idx..].to_vec())
    }
}

/// Temperature of a parcel lifted from the first pressure level, following a dry adiabat up to
/// the LCL and a moist adiabat above it.
///
/// # Examples
///
/// ```rust
/// use metcalc::parcel_profile;
/// use metfor::{Celsius, HectoPascal, Quantity};
///
/// let p = [HectoPascal(1000.0), HectoPascal(900.0), HectoPascal(500.0)];
/// let t = parcel_profile(&p, Celsius(20.0), Celsius(15.0)).unwrap();
///
/// assert_eq!(t.len(), 3);
/// assert!((t[0].unpack() - 293.15).abs() < 1.0e-9);
/// assert!(t[2] < t[1]);
/// ```
pub fn parcel_profile<T1, T2>(pressure: &[HectoPascal], temperature: T1, dew_point: T2) -> Result<Vec<Kelvin>>
where
    T1: Temperature,
    Kelvin: From<T1>,
    T2: Temperature,
    Kelvin: From<T2>,
{
    let segments = parcel_segments(pressure, Kelvin::from(temperature), Kelvin::from(dew_point))?;

    let mut out = segments.lower_t;
    out.extend(segments.upper_t);
    Ok(out)
}

/// Surface based CAPE and CIN.
///
/// # Examples
///
/// ```rust
/// use metcalc::surface_based_cape_cin;
/// # use metcalc::doctest::make_test_sounding;
/// use metfor::{JpKg, Quantity};
///
/// let snd = make_test_sounding();
/// let (cape, cin) = surface_based_cape_cin(&snd).unwrap();
///
/// assert!(cape >= JpKg(0.0));
/// assert!(cin <= JpKg(0.0));
/// ```
pub fn surface_based_cape_cin(snd: &Sounding) -> Result<(JpKg, JpKg)> {
    let profile = ParcelProfile::surface_based(snd)?;
    Ok(cape_cin(&profile, ParcelLevelChoice::Bottom, ParcelLevelChoice::Top))
}

/// CAPE and CIN of the most unstable parcel in the lowest `depth` of the sounding.
pub fn most_unstable_cape_cin(snd: &Sounding, depth: HectoPascal) -> Result<(JpKg, JpKg)> {
    let profile = ParcelProfile::most_unstable(snd, depth)?;
    Ok(cape_cin(&profile, ParcelLevelChoice::Bottom, ParcelLevelChoice::Top))
}

/// CAPE and CIN of a mixed layer parcel.
pub fn mixed_layer_cape_cin(
    snd: &Sounding,
    layer: &LayerSpec,
    start_pressure: Option<HectoPascal>,
) -> Result<(JpKg, JpKg)> {
    let profile = ParcelProfile::mixed_layer(snd, layer, start_pressure)?;
    Ok(cape_cin(&profile, ParcelLevelChoice::Bottom, ParcelLevelChoice::Top))
}

/// Downdraft CAPE.
///
/// A parcel starts at the level of minimum equivalent potential temperature in the 700-500 hPa
/// layer and descends moist adiabatically from its wet bulb temperature to the surface. The
/// DCAPE is the area between the environment and parcel virtual temperatures.
///
/// Returns the DCAPE along with the pressure levels of the descent and the parcel temperatures
/// at those levels.
pub fn downdraft_cape(snd: &Sounding) -> Result<(JpKg, Vec<HectoPascal>, Vec<Kelvin>)> {
    let (p, t, dp) = snd.pressure_temperature_dew_point()?;

    let min_p = p.iter().map(|p| p.unpack()).fold(std::f64::INFINITY, f64::min);
    if min_p > 500.0 {
        return Err(AnalysisError::InvalidInput("pressure does not reach 500 hPa"));
    }

    let t_raw: Vec<f64> = t.iter().map(|t| t.unpack()).collect();
    let dp_raw: Vec<f64> = dp.iter().map(|dp| dp.unpack()).collect();

    let spec = LayerSpec::with_depth(Depth::Pressure(HectoPascal(200.0)))
        .bottom(Level::Pressure(HectoPascal(700.0)));
    let layer = get_layer(&p, None, &[&t_raw, &dp_raw], &spec)?;

    let (start_idx, _) = layer
        .pressure
        .iter()
        .zip(&layer.values[0])
        .zip(&layer.values[1])
        .map(|((&p, &t), &dp)| equivalent_potential_temperature(p, Celsius(t), Celsius(dp)))
        .enumerate()
        .fold((0, Kelvin(std::f64::MAX)), |(min_idx, min_val), (i, theta_e)| {
            if theta_e < min_val {
                (i, theta_e)
            } else {
                (min_idx, min_val)
            }
        });

    let start_p = layer.pressure[start_idx];
    let start_t = Celsius(layer.values[0][start_idx]);
    let start_dp = Celsius(layer.values[1][start_idx]);
    tracing::debug!("downdraft parcel starts at {:?}", start_p);

    let start_wb = wet_bulb_temperature(start_p, start_t, start_dp).ok_or(AnalysisError::MissingValue)?;

    let (down_p, (env_t, env_dp)): (Vec<HectoPascal>, (Vec<Celsius>, Vec<Celsius>)) = p
        .iter()
        .zip(t.iter().zip(&dp))
        .filter(|(&p, _)| p >= start_p)
        .map(|(&p, (&t, &dp))| (p, (t, dp)))
        .unzip();

    let parcel_trace = moist_lapse(&down_p, start_wb, Some(start_p));

    let (ln_p, diff): (Vec<f64>, Vec<f64>) = down_p
        .iter()
        .zip(&parcel_trace)
        .zip(env_t.iter().zip(&env_dp))
        .map(|((&p, &pcl_t), (&env_t, &env_dp))| {
            let p = p.unpack();
            let pcl_tv = virtual_temperature_from_dewpoint_raw(p, pcl_t.unpack(), pcl_t.unpack());
            let env_tv = virtual_temperature_from_dewpoint_raw(
                p,
                Kelvin::from(env_t).unpack(),
                Kelvin::from(env_dp).unpack(),
            );
            (p.ln(), env_tv - pcl_tv)
        })
        .unzip();

    let dcape = -crate::constants::RD * trapezoid(&diff, &ln_p);

    Ok((JpKg(dcape), down_p, parcel_trace))
}

/// The pieces of a lifted parcel profile, split at the LCL.
struct ParcelSegments {
    lower_t: Vec<Kelvin>,
    lcl_p: HectoPascal,
    lcl_t: Kelvin,
    upper_t: Vec<Kelvin>,
    lcl_in_profile: bool,
}

fn parcel_segments(pressure: &[HectoPascal], temperature: Kelvin, dew_point: Kelvin) -> Result<ParcelSegments> {
    let p0 = *pressure.first().ok_or(AnalysisError::NotEnoughData)?;
    let (lcl_p, lcl_t) = lcl(p0, temperature, dew_point)?;

    let mut lower_p: Vec<HectoPascal> = pressure.iter().cloned().filter(|&p| p >= lcl_p).collect();
    lower_p.push(lcl_p);

    let mut lower_t = dry_lapse(&lower_p, temperature, Some(p0));
    let lcl_dry_t = lower_t.pop().unwrap_or(lcl_t);

    let min_p = pressure
        .iter()
        .map(|p| p.unpack())
        .fold(std::f64::INFINITY, f64::min);
    if greater_or_close(min_p, lcl_p.unpack()) {
        return Ok(ParcelSegments {
            lower_t,
            lcl_p,
            lcl_t,
            upper_t: vec![],
            lcl_in_profile: false,
        });
    }

    let upper_p: Vec<HectoPascal> = pressure.iter().cloned().filter(|&p| p < lcl_p).collect();
    let upper_t = moist_lapse(&upper_p, lcl_dry_t, Some(lcl_p));

    Ok(ParcelSegments {
        lower_t,
        lcl_p,
        lcl_t,
        upper_t,
        lcl_in_profile: true,
    })
}

fn kelvin_columns(snd: &Sounding) -> Result<(Vec<HectoPascal>, Vec<Kelvin>, Vec<Kelvin>)> {
    let (p, t, dp) = snd.pressure_temperature_dew_point()?;
    let t = t.into_iter().map(Kelvin::from).collect();
    let dp = dp.into_iter().map(Kelvin::from).collect();
    Ok((p, t, dp))
}

fn layer_top(snd: &Sounding, layer: &LayerSpec) -> Result<HectoPascal> {
    let (p, _, _, hgt) = snd.thermo_columns_with_height()?;
    let layer = get_layer(&p, hgt.as_deref(), &[], layer)?;
    layer
        .pressure
        .last()
        .cloned()
        .ok_or(AnalysisError::NotEnoughData)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test_data, utility::test_tools::*};
    use strum::IntoEnumIterator;

    fn hpa(vals: &[f64]) -> Vec<HectoPascal> {
        vals.iter().cloned().map(HectoPascal).collect()
    }

    fn kelvin(vals: &[f64]) -> Vec<Kelvin> {
        vals.iter().map(|&t| Kelvin::from(Celsius(t))).collect()
    }

    #[test]
    fn test_parcel_profile() {
        let p = hpa(&[1000.0, 900.0, 800.0, 700.0, 600.0, 500.0, 400.0]);
        let prof = parcel_profile(&p, Celsius(20.0), Celsius(15.0)).unwrap();

        let expected = [293.15, 285.77, 280.98, 275.25, 268.15, 258.95, 246.42];
        assert_eq!(prof.len(), expected.len());
        for (t, e) in prof.iter().zip(&expected) {
            assert!(approx_equal(t.unpack(), *e, 0.02), "{} vs {}", t.unpack(), e);
        }
    }

    #[test]
    fn test_parcel_profile_lcl_above_top() {
        let p = hpa(&[1000.0, 975.0, 950.0]);
        let prof = parcel_profile(&p, Celsius(30.0), Celsius(0.0)).unwrap();
        let dry = dry_lapse(&p, Celsius(30.0), None);

        assert_eq!(prof, dry);
    }

    #[test]
    fn test_parcel_profile_with_lcl() {
        let p = hpa(&[1000.0, 900.0, 800.0, 700.0]);
        let t = kelvin(&[20.0, 15.0, 8.0, 0.0]);
        let td = kelvin(&[15.0, 10.0, 0.0, -10.0]);

        let profile = ParcelProfile::with_lcl(&p, &t, &td).unwrap();
        let (lcl_p, lcl_t) = lcl(p[0], t[0], td[0]).unwrap();

        assert_eq!(profile.pressure.len(), 5);
        assert_eq!(profile.pressure[1], HectoPascal(900.0));
        assert_eq!(profile.pressure[2], lcl_p);
        assert!(approx_equal(profile.parcel_t[2].unpack(), lcl_t.unpack(), 1.0e-6));

        // Linear interpolation of the environment to the LCL
        let frac = (900.0 - lcl_p.unpack()) / 100.0;
        let expected = t[1].unpack() + frac * (t[2].unpack() - t[1].unpack());
        assert!(approx_equal(profile.environment_t[2].unpack(), expected, 1.0e-9));
    }

    #[test]
    fn test_cape_cin_profile() {
        let (p, t, td) = test_data::cape_cin_profile();
        let profile = ParcelProfile::new(p, t, td).unwrap();

        let (cape, cin) = cape_cin(&profile, ParcelLevelChoice::Bottom, ParcelLevelChoice::Top);
        assert!(approx_equal(cape.unpack(), test_data::CAPE_CIN_PROFILE_CAPE, 0.5), "{:?}", cape);
        assert!(approx_equal(cin.unpack(), test_data::CAPE_CIN_PROFILE_CIN, 0.5), "{:?}", cin);
    }

    #[test]
    fn test_cape_cin_no_lfc() {
        // Very dry and stable, no positive area.
        let p = hpa(&[1000.0, 900.0, 800.0, 700.0, 500.0]);
        let t = kelvin(&[10.0, 12.0, 14.0, 10.0, 0.0]);
        let td = kelvin(&[-20.0, -20.0, -20.0, -25.0, -40.0]);

        let profile = ParcelProfile::with_lcl(&p, &t, &td).unwrap();
        let (cape, cin) = cape_cin(&profile, ParcelLevelChoice::Bottom, ParcelLevelChoice::Top);
        assert_eq!(cape, JpKg(0.0));
        assert_eq!(cin, JpKg(0.0));
    }

    #[test]
    fn test_surface_based_cape_cin() {
        let snd = test_data::unstable_sounding();
        let (cape, cin) = surface_based_cape_cin(&snd).unwrap();

        assert!(cape > JpKg(500.0), "{:?}", cape);
        assert!(cin <= JpKg(0.0));
    }

    #[test]
    fn test_most_unstable_cape_cin() {
        let snd = test_data::elevated_moist_layer_sounding();
        let (mu_cape, _) = most_unstable_cape_cin(&snd, HectoPascal(300.0)).unwrap();
        let (sb_cape, _) = surface_based_cape_cin(&snd).unwrap();

        assert!(mu_cape >= sb_cape);
    }

    #[test]
    fn test_mixed_layer_profile() {
        let snd = test_data::unstable_sounding();
        let profile = ParcelProfile::mixed_layer(&snd, &LayerSpec::default(), None).unwrap();

        // Starts at the surface, skips the mixed layer levels.
        assert_eq!(profile.pressure[0], HectoPascal(1000.0));
        assert!(profile.pressure[1] < HectoPascal(900.0));

        let (cape, cin) = mixed_layer_cape_cin(&snd, &LayerSpec::default(), None).unwrap();
        assert!(cape >= JpKg(0.0));
        assert!(cin <= JpKg(0.0));
    }

    #[test]
    fn test_downdraft_cape() {
        let snd = test_data::unstable_sounding();
        let (dcape, p, t) = downdraft_cape(&snd).unwrap();

        assert!(dcape > JpKg(0.0), "{:?}", dcape);
        assert_eq!(p.len(), t.len());
        assert_eq!(p[0], HectoPascal(1000.0));
        // Descending moist adiabatically warms the parcel
        assert!(t[0] > t[t.len() - 1]);
    }

    #[test]
    fn test_downdraft_cape_shallow_sounding() {
        let snd = crate::sounding::doctest::make_test_sounding();
        assert!(downdraft_cape(&snd).is_err());
    }

    #[test]
    fn test_level_choice_names() {
        for choice in ParcelLevelChoice::iter() {
            let parsed: ParcelLevelChoice = choice.to_string().parse().unwrap();
            assert_eq!(parsed, choice);
        }
        assert_eq!(ParcelLevelChoice::MostCape.to_string(), "most_cape");
    }
}
