//! Wind conversions and hodograph based storm analysis.
use crate::{
    constants::OMEGA,
    error::{AnalysisError, Result},
    layers::{
        get_layer, get_layer_heights, mean_pressure_weighted, weighted_continuous_average, Depth,
        LayerSpec, Level,
    },
    sounding::{Sounding, WindColumns},
};
use itertools::Itertools;
use metfor::{HectoPascal, IntHelicityM2pS2, Meters, MetersPSec, Quantity, WindUV};

/// Wind speed from the u and v components.
#[inline]
pub fn wind_speed(u: MetersPSec, v: MetersPSec) -> MetersPSec {
    MetersPSec(u.unpack().hypot(v.unpack()))
}

/// Meteorological wind direction in degrees, the direction the wind is blowing from.
///
/// A wind from the north is 360°, calm winds are 0°.
///
/// # Examples
///
/// ```rust
/// use metcalc::wind::wind_direction;
/// use metfor::MetersPSec;
///
/// assert_eq!(wind_direction(MetersPSec(10.0), MetersPSec(0.0)), 270.0);
/// assert_eq!(wind_direction(MetersPSec(0.0), MetersPSec(-5.0)), 360.0);
/// assert_eq!(wind_direction(MetersPSec(0.0), MetersPSec(0.0)), 0.0);
/// ```
pub fn wind_direction(u: MetersPSec, v: MetersPSec) -> f64 {
    let (u, v) = (u.unpack(), v.unpack());
    if u == 0.0 && v == 0.0 {
        return 0.0;
    }

    let dir = 90.0 - (-v).atan2(-u).to_degrees();
    if dir <= 0.0 {
        dir + 360.0
    } else {
        dir
    }
}

/// The u and v components of a wind blowing from `direction` (degrees).
#[inline]
pub fn wind_components(speed: MetersPSec, direction: f64) -> WindUV<MetersPSec> {
    let (sin, cos) = direction.to_radians().sin_cos();
    WindUV {
        u: MetersPSec(-speed.unpack() * sin),
        v: MetersPSec(-speed.unpack() * cos),
    }
}

/// The coriolis parameter (s⁻¹) at a latitude in degrees.
#[inline]
pub fn coriolis_parameter(latitude: f64) -> f64 {
    2.0 * OMEGA * latitude.to_radians().sin()
}

fn raw_components(cols: &WindColumns) -> (Vec<f64>, Vec<f64>) {
    (
        cols.u.iter().map(|u| u.unpack()).collect(),
        cols.v.iter().map(|v| v.unpack()).collect(),
    )
}

fn to_uv(vals: &[f64]) -> WindUV<MetersPSec> {
    WindUV {
        u: MetersPSec(vals[0]),
        v: MetersPSec(vals[1]),
    }
}

/// Bulk wind shear across a layer, the wind at the top minus the wind at the bottom.
pub fn bulk_shear(snd: &Sounding, layer: &LayerSpec) -> Result<WindUV<MetersPSec>> {
    let cols = snd.wind_columns()?;
    let (u, v) = raw_components(&cols);

    let data = get_layer(&cols.pressure, cols.height.as_deref(), &[&u, &v], layer)?;
    let (u, v) = (&data.values[0], &data.values[1]);

    match (u.first(), u.last(), v.first(), v.last()) {
        (Some(u0), Some(u1), Some(v0), Some(v1)) if u.len() > 1 => Ok(WindUV {
            u: MetersPSec(u1 - u0),
            v: MetersPSec(v1 - v0),
        }),
        _ => Err(AnalysisError::NotEnoughData),
    }
}

/// Supercell storm motion using the Bunkers "id" method.
///
/// The motion deviates 7.5 m/s from the 0-6 km mean wind, perpendicular to the shear between
/// the mean winds in the lowest and highest half kilometer of that layer. Requires a height
/// profile.
///
/// Returns `(right mover, left mover, 0-6 km mean wind)`.
pub fn bunkers_storm_motion(
    snd: &Sounding,
) -> Result<(WindUV<MetersPSec>, WindUV<MetersPSec>, WindUV<MetersPSec>)> {
    const DEVIATION: f64 = 7.5; // m/s

    let cols = snd.wind_columns()?;
    let height = cols.height.as_deref().ok_or(AnalysisError::MissingProfile)?;
    let (u, v) = raw_components(&cols);
    let vars: [&[f64]; 2] = [&u, &v];

    let average = |spec: LayerSpec| -> Result<Vec<f64>> {
        weighted_continuous_average(&cols.pressure, Some(height), &vars, &spec)
    };

    let mean = average(LayerSpec::with_depth(Depth::Height(Meters(6000.0))))?;
    let low = average(LayerSpec::with_depth(Depth::Height(Meters(500.0))))?;
    let high = average(
        LayerSpec::with_depth(Depth::Height(Meters(500.0)))
            .bottom(Level::Height(height[0] + Meters(5500.0))),
    )?;

    let (shear_u, shear_v) = (high[0] - low[0], high[1] - low[1]);
    let shear_mag = shear_u.hypot(shear_v);
    if shear_mag == 0.0 {
        return Err(AnalysisError::InvalidInput("no shear in the 0-6 km layer"));
    }

    let scale = DEVIATION / shear_mag;
    let (du, dv) = (shear_v * scale, -shear_u * scale);

    Ok((
        to_uv(&[mean[0] + du, mean[1] + dv]),
        to_uv(&[mean[0] - du, mean[1] - dv]),
        to_uv(&mean),
    ))
}

/// Corfidi MCS motion vectors.
///
/// The low level jet defaults to the strongest wind in the lowest 1.5 km. The cloud layer wind
/// is the pressure weighted mean wind from 850 hPa to 300 hPa, or to the top of the sounding if
/// it ends below 300 hPa.
///
/// Returns `(upwind, downwind)` propagation vectors.
pub fn corfidi_storm_motion(
    snd: &Sounding,
    llj: Option<WindUV<MetersPSec>>,
) -> Result<(WindUV<MetersPSec>, WindUV<MetersPSec>)> {
    let cols = snd.wind_columns()?;
    let (u, v) = raw_components(&cols);
    let heights = cols.height.as_deref();

    let (llj_u, llj_v) = match llj {
        Some(WindUV { u, v }) => (u.unpack(), v.unpack()),
        None => {
            let lowest = get_layer(
                &cols.pressure,
                heights,
                &[&u, &v],
                &LayerSpec::with_depth(Depth::Height(Meters(1500.0))),
            )?;
            let (lu, lv) = (&lowest.values[0], &lowest.values[1]);

            lu.iter()
                .zip(lv)
                .map(|(&u, &v)| (u, v))
                .max_by(|a, b| {
                    a.0.hypot(a.1)
                        .partial_cmp(&b.0.hypot(b.1))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .ok_or(AnalysisError::NotEnoughData)?
        }
    };

    let top = cols
        .pressure
        .iter()
        .cloned()
        .fold(HectoPascal(std::f64::INFINITY), |acc, p| if p < acc { p } else { acc });
    let depth = if top > HectoPascal(300.0) {
        HectoPascal(850.0) - top
    } else {
        HectoPascal(550.0)
    };

    let cloud_layer = mean_pressure_weighted(
        &cols.pressure,
        heights,
        &[&u, &v],
        &LayerSpec::with_depth(Depth::Pressure(depth)).bottom(Level::Pressure(HectoPascal(850.0))),
    )?;

    let upwind = [cloud_layer[0] - llj_u, cloud_layer[1] - llj_v];
    let downwind = [cloud_layer[0] + upwind[0], cloud_layer[1] + upwind[1]];

    tracing::debug!(
        "corfidi: llj=({}, {}) cloud layer=({}, {})",
        llj_u,
        llj_v,
        cloud_layer[0],
        cloud_layer[1]
    );

    Ok((to_uv(&upwind), to_uv(&downwind)))
}

/// The critical angle in degrees, the angle between the 0-500 m shear vector and the storm
/// inflow at the surface.
pub fn critical_angle(snd: &Sounding, storm_motion: WindUV<MetersPSec>) -> Result<f64> {
    let cols = snd.wind_columns()?;
    if cols.height.is_none() {
        return Err(AnalysisError::MissingProfile);
    }

    let shear = bulk_shear(snd, &LayerSpec::with_depth(Depth::Height(Meters(500.0))))?;
    let (shr_u, shr_v) = (shear.u.unpack(), shear.v.unpack());
    let inflow_u = (storm_motion.u - cols.u[0]).unpack();
    let inflow_v = (storm_motion.v - cols.v[0]).unpack();

    let mags = shr_u.hypot(shr_v) * inflow_u.hypot(inflow_v);
    if mags == 0.0 {
        return Err(AnalysisError::InvalidInput("zero length shear or inflow vector"));
    }

    let cos_angle = ((shr_u * inflow_u + shr_v * inflow_v) / mags).max(-1.0).min(1.0);
    Ok(cos_angle.acos().to_degrees())
}

/// Storm relative helicity of a layer above ground level.
///
/// The layer starts at `bottom` (default the surface) and is `depth` deep. Returns
/// `(positive, negative, total)` helicity.
///
/// # Examples
///
/// ```rust
/// use metcalc::{wind::storm_relative_helicity, Sounding};
/// use metfor::{HectoPascal, IntHelicityM2pS2, Meters, MetersPSec, WindUV};
/// use optional::some;
///
/// // A wind veering from the south to the west
/// let snd = Sounding::new()
///     .with_pressure_profile(vec![some(HectoPascal(1000.0)), some(HectoPascal(900.0))])
///     .with_height_profile(vec![some(Meters(0.0)), some(Meters(900.0))])
///     .with_wind_profile(vec![
///         some(WindUV { u: MetersPSec(0.0), v: MetersPSec(10.0) }),
///         some(WindUV { u: MetersPSec(10.0), v: MetersPSec(0.0) }),
///     ]);
///
/// let zero = WindUV { u: MetersPSec(0.0), v: MetersPSec(0.0) };
/// let (pos, neg, total) = storm_relative_helicity(&snd, Meters(900.0), None, zero).unwrap();
///
/// assert_eq!(pos, IntHelicityM2pS2(100.0));
/// assert_eq!(neg, IntHelicityM2pS2(0.0));
/// assert_eq!(total, pos);
/// ```
pub fn storm_relative_helicity(
    snd: &Sounding,
    depth: Meters,
    bottom: Option<Meters>,
    storm_motion: WindUV<MetersPSec>,
) -> Result<(IntHelicityM2pS2, IntHelicityM2pS2, IntHelicityM2pS2)> {
    let cols = snd.wind_columns()?;
    let height = cols.height.as_deref().ok_or(AnalysisError::MissingProfile)?;

    let sr_u: Vec<f64> = cols.u.iter().map(|&u| (u - storm_motion.u).unpack()).collect();
    let sr_v: Vec<f64> = cols.v.iter().map(|&v| (v - storm_motion.v).unpack()).collect();

    let layer = get_layer_heights(
        height,
        depth,
        &[&sr_u, &sr_v],
        Some(bottom.unwrap_or(Meters(0.0))),
        true,
        true,
    )?;
    if layer.height.len() < 2 {
        return Err(AnalysisError::NotEnoughData);
    }

    let (positive, negative) = layer.values[0]
        .iter()
        .zip(&layer.values[1])
        .tuple_windows::<(_, _)>()
        .map(|((u0, v0), (u1, v1))| u1 * v0 - u0 * v1)
        .fold((0.0, 0.0), |(pos, neg), h| {
            if h > 0.0 {
                (pos + h, neg)
            } else {
                (pos, neg + h)
            }
        });

    Ok((
        IntHelicityM2pS2(positive),
        IntHelicityM2pS2(negative),
        IntHelicityM2pS2(positive + negative),
    ))
}
