//! Functions for selecting the starting parcel for a parcel analysis.
use crate::{
    error::{AnalysisError, Result},
    layers::{get_layer, mixed_layer, Depth, LayerSpec},
    sounding::Sounding,
    thermo::{
        dewpoint, equivalent_potential_temperature, exner_function, lcl, potential_temperature,
        saturation_mixing_ratio, vapor_pressure, virtual_temperature,
    },
};
use metfor::{Celsius, HectoPascal, Kelvin, Quantity};

/// Variables defining a parcel as used in parcel analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    /// Pressure
    pub pressure: HectoPascal,
    /// Temperature
    pub temperature: Celsius,
    /// Dew point
    pub dew_point: Celsius,
}

impl Parcel {
    /// Get the potential temperature of the parcel.
    pub fn theta(&self) -> Kelvin {
        potential_temperature(self.pressure, self.temperature)
    }

    /// Get the equivalent potential temperature of the parcel.
    pub fn theta_e(&self) -> Kelvin {
        equivalent_potential_temperature(self.pressure, self.temperature, self.dew_point)
    }

    /// Get the mixing ratio of the parcel in kg/kg.
    pub fn mixing_ratio(&self) -> f64 {
        saturation_mixing_ratio(self.pressure, self.dew_point)
    }

    /// Get the virtual temperature of the parcel.
    pub fn virtual_temperature(&self) -> Kelvin {
        virtual_temperature(self.temperature, self.mixing_ratio())
    }

    /// Get the pressure and temperature at the parcel's lifting condensation level.
    pub fn lcl(&self) -> Result<(HectoPascal, Kelvin)> {
        lcl(self.pressure, self.temperature, self.dew_point)
    }
}

/// Get the surface parcel, the lowest level with a pressure, temperature, and dew point.
///
/// # Examples
///
/// ```rust
/// use metcalc::surface_parcel;
/// # use metcalc::doctest::make_test_sounding;
/// use metfor::{Celsius, HectoPascal};
///
/// let snd = make_test_sounding();
/// let pcl = surface_parcel(&snd).unwrap();
///
/// assert_eq!(pcl.pressure, HectoPascal(1000.0));
/// assert_eq!(pcl.temperature, Celsius(20.0));
/// assert_eq!(pcl.dew_point, Celsius(15.0));
/// ```
pub fn surface_parcel(snd: &Sounding) -> Result<Parcel> {
    let (p, t, dp) = snd.pressure_temperature_dew_point()?;

    Ok(Parcel {
        pressure: p[0],
        temperature: t[0],
        dew_point: dp[0],
    })
}

/// Create a mixed layer parcel.
///
/// The potential temperature and mixing ratio are averaged over the layer (pressure weighted) and
/// the parcel is created from them at `start_pressure`, which defaults to the lowest pressure
/// level of the sounding.
pub fn mixed_parcel(
    snd: &Sounding,
    layer: &LayerSpec,
    start_pressure: Option<HectoPascal>,
) -> Result<Parcel> {
    let (p, t, dp, hgt) = snd.thermo_columns_with_height()?;
    let start_pressure = start_pressure.unwrap_or(p[0]);

    let theta: Vec<f64> = p
        .iter()
        .zip(&t)
        .map(|(&p, &t)| potential_temperature(p, t).unpack())
        .collect();
    let mw: Vec<f64> = p
        .iter()
        .zip(&dp)
        .map(|(&p, &dp)| saturation_mixing_ratio(p, dp))
        .collect();

    let means = mixed_layer(&p, hgt.as_deref(), &[&theta, &mw], layer)?;
    let (mean_theta, mean_mw) = (means[0], means[1]);

    let temperature = Celsius::from(Kelvin(mean_theta * exner_function(start_pressure)));
    let dew_point = dewpoint(vapor_pressure(start_pressure, mean_mw)).ok_or(
        AnalysisError::InvalidInput("mixed layer has no moisture"),
    )?;

    tracing::debug!(
        "mixed parcel: p={:?} t={:?} dp={:?}",
        start_pressure,
        temperature,
        dew_point
    );

    Ok(Parcel {
        pressure: start_pressure,
        temperature,
        dew_point,
    })
}

/// Get the most unstable parcel.
///
/// This is the level with the highest equivalent potential temperature within `depth` of the
/// bottom of the sounding. Only data levels are considered. Also returns the index of the level
/// in the sounding with incomplete rows removed.
///
/// # Examples
///
/// ```rust
/// use metcalc::most_unstable_parcel;
/// # use metcalc::doctest::make_test_sounding;
/// use metfor::HectoPascal;
///
/// let snd = make_test_sounding();
/// let (pcl, idx) = most_unstable_parcel(&snd, HectoPascal(300.0)).unwrap();
///
/// assert_eq!(idx, 0);
/// assert_eq!(pcl.pressure, HectoPascal(1000.0));
/// ```
pub fn most_unstable_parcel(snd: &Sounding, depth: HectoPascal) -> Result<(Parcel, usize)> {
    let (p, t, dp, hgt) = snd.thermo_columns_with_height()?;

    let t_raw: Vec<f64> = t.iter().map(|t| t.unpack()).collect();
    let dp_raw: Vec<f64> = dp.iter().map(|dp| dp.unpack()).collect();

    let spec = LayerSpec::with_depth(Depth::Pressure(depth)).interpolate(false);
    let layer = get_layer(&p, hgt.as_deref(), &[&t_raw, &dp_raw], &spec)?;

    let (idx, _) = layer
        .pressure
        .iter()
        .zip(&layer.values[0])
        .zip(&layer.values[1])
        .map(|((&p, &t), &dp)| equivalent_potential_temperature(p, Celsius(t), Celsius(dp)))
        .enumerate()
        .fold((0, Kelvin(std::f64::MIN)), |(max_idx, max_val), (i, theta_e)| {
            if theta_e > max_val {
                (i, theta_e)
            } else {
                (max_idx, max_val)
            }
        });

    tracing::debug!("most unstable parcel at level {}", idx);

    Ok((
        Parcel {
            pressure: layer.pressure[idx],
            temperature: Celsius(layer.values[0][idx]),
            dew_point: Celsius(layer.values[1][idx]),
        },
        idx,
    ))
}
