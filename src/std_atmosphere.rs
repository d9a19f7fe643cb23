//! Conversions between pressure and height in the U.S. Standard Atmosphere (1976).
use crate::constants::{G, RD};
use metfor::{HectoPascal, Length, Meters, Pressure, Quantity};

const T0: f64 = 288.0;
const GAMMA: f64 = 6.5e-3;
const STD_P0: f64 = 1013.25;

/// Height of a pressure level in the standard atmosphere.
///
/// # Examples
///
/// ```rust
/// use metcalc::pressure_to_height_std;
/// use metfor::{HectoPascal, Quantity};
///
/// let hgt = pressure_to_height_std(HectoPascal(975.0));
/// assert!((hgt.unpack() - 323.2).abs() < 0.1);
/// ```
#[inline]
pub fn pressure_to_height_std<P>(pressure: P) -> Meters
where
    P: Pressure,
    HectoPascal: From<P>,
{
    let p = HectoPascal::from(pressure).unpack();
    Meters((T0 / GAMMA) * (1.0 - (p / STD_P0).powf(RD * GAMMA / G)))
}

/// Pressure at a height in the standard atmosphere.
#[inline]
pub fn height_to_pressure_std<L>(height: L) -> HectoPascal
where
    L: Length,
    Meters: From<L>,
{
    let z = Meters::from(height).unpack();
    HectoPascal(STD_P0 * (1.0 - (GAMMA / T0) * z).powf(G / (RD * GAMMA)))
}

/// Pressure after moving a height increment away from a pressure level in the standard
/// atmosphere.
#[inline]
pub fn add_height_to_pressure<P, L>(pressure: P, height: L) -> HectoPascal
where
    P: Pressure,
    HectoPascal: From<P>,
    L: Length,
    Meters: From<L>,
{
    let level_height = pressure_to_height_std(pressure);
    height_to_pressure_std::<Meters>(std::ops::Add::<Meters>::add(level_height, Meters::from(height)))
}

/// Height after moving a pressure increment away from a height in the standard atmosphere.
#[inline]
pub fn add_pressure_to_height<L, P>(height: L, pressure: P) -> Meters
where
    L: Length,
    Meters: From<L>,
    P: Pressure,
    HectoPascal: From<P>,
{
    let level_pressure = height_to_pressure_std(height);
    pressure_to_height_std::<HectoPascal>(std::ops::Sub::<HectoPascal>::sub(level_pressure, HectoPascal::from(pressure)))
}

/// Station pressure from an altimeter setting and the station elevation, following the
/// Smithsonian Meteorological Tables.
pub fn altimeter_to_station_pressure<P, L>(altimeter_value: P, height: L) -> HectoPascal
where
    P: Pressure,
    HectoPascal: From<P>,
    L: Length,
    Meters: From<L>,
{
    let altim = HectoPascal::from(altimeter_value).unpack();
    let z = Meters::from(height).unpack();
    let n = RD * GAMMA / G;

    HectoPascal((altim.powf(n) - (STD_P0.powf(n) * GAMMA * z) / T0).powf(1.0 / n) + 0.3)
}
