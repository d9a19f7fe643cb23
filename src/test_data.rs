//! Data used in tests.
use crate::{
    sounding::{doctest::make_test_sounding, Sounding},
    thermo::{dewpoint, temperature_from_potential_temperature, vapor_pressure},
};
use metfor::{Celsius, HectoPascal, Kelvin, Knots, Meters, WindSpdDir};
use optional::{none, some, Optioned};

/// A sounding profile with a shallow stable layer over a deep unstable one.
pub fn cape_cin_profile() -> (Vec<HectoPascal>, Vec<Kelvin>, Vec<Kelvin>) {
    let p = [959.0, 779.2, 751.3, 724.3, 700.0, 269.0];
    let t = [22.2, 14.6, 12.0, 9.4, 7.0, -38.0];
    let td = [19.0, -11.2, -10.8, -10.4, -10.0, -53.2];

    (
        p.iter().cloned().map(HectoPascal).collect(),
        t.iter().map(|&t| Kelvin::from(Celsius(t))).collect(),
        td.iter().map(|&t| Kelvin::from(Celsius(t))).collect(),
    )
}

pub const CAPE_CIN_PROFILE_CAPE: f64 = 228.65;
pub const CAPE_CIN_PROFILE_CIN: f64 = -20.89;
pub const CAPE_CIN_PROFILE_LFC: f64 = 727.37;
pub const CAPE_CIN_PROFILE_EL: f64 = 471.80;

fn optioned<T>(vals: &[f64], f: fn(f64) -> T) -> Vec<Optioned<T>>
where
    T: optional::Noned + Copy,
{
    vals.iter().map(|&v| some(f(v))).collect()
}

/// A warm, moist, conditionally unstable sounding with heights and winds veering with height.
pub fn unstable_sounding() -> Sounding {
    let p = [
        1000.0, 950.0, 900.0, 850.0, 800.0, 700.0, 600.0, 500.0, 400.0, 300.0, 250.0, 200.0,
    ];
    let t = [
        30.0, 26.0, 22.0, 18.0, 15.0, 8.0, 0.0, -8.0, -18.0, -32.0, -42.0, -52.0,
    ];
    let td = [
        22.0, 20.0, 17.0, 14.0, 10.0, 0.0, -12.0, -25.0, -35.0, -45.0, -55.0, -65.0,
    ];
    let hgt = [
        100.0, 557.0, 1031.0, 1525.0, 2043.0, 3160.0, 4414.0, 5852.0, 7552.0, 9642.0, 10902.0,
        12379.0,
    ];
    let dir = [
        180.0, 190.0, 200.0, 210.0, 220.0, 230.0, 240.0, 245.0, 250.0, 260.0, 265.0, 270.0,
    ];
    let spd = [
        10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 50.0, 60.0, 70.0, 75.0, 80.0,
    ];

    let wind = dir
        .iter()
        .zip(&spd)
        .map(|(&direction, &speed)| {
            some(WindSpdDir {
                speed: Knots(speed),
                direction,
            })
        })
        .collect();

    Sounding::new()
        .with_source_description("Synthetic unstable sounding".to_owned())
        .with_pressure_profile(optioned(&p, HectoPascal))
        .with_temperature_profile(optioned(&t, Celsius))
        .with_dew_point_profile(optioned(&td, Celsius))
        .with_height_profile(optioned(&hgt, Meters))
        .with_wind_profile(wind)
}

/// A sounding with constant potential temperature and mixing ratio.
pub fn well_mixed_sounding() -> Sounding {
    const THETA: Kelvin = Kelvin(300.0);
    const MW: f64 = 0.008;

    let p = [1000.0, 975.0, 950.0, 925.0, 900.0, 850.0, 800.0];

    let t = p
        .iter()
        .map(|&p| some(Celsius::from(temperature_from_potential_temperature(HectoPascal(p), THETA))))
        .collect();
    let td = p
        .iter()
        .map(|&p| some(dewpoint(vapor_pressure(HectoPascal(p), MW)).unwrap()))
        .collect();

    Sounding::new()
        .with_pressure_profile(optioned(&p, HectoPascal))
        .with_temperature_profile(t)
        .with_dew_point_profile(td)
}

/// A sounding with a cool, dry surface below a warm, moist layer at 925 hPa.
pub fn elevated_moist_layer_sounding() -> Sounding {
    let p = [1000.0, 925.0, 850.0, 700.0, 500.0];
    let t = [20.0, 24.0, 16.0, 6.0, -10.0];
    let td = [5.0, 20.0, 5.0, -10.0, -30.0];

    Sounding::new()
        .with_pressure_profile(optioned(&p, HectoPascal))
        .with_temperature_profile(optioned(&t, Celsius))
        .with_dew_point_profile(optioned(&td, Celsius))
}

/// The doc test sounding with the surface temperature missing.
pub fn sounding_with_missing_surface() -> Sounding {
    make_test_sounding().with_temperature_profile(vec![
        none(),
        some(Celsius(18.0)),
        some(Celsius(10.0)),
        some(Celsius(2.0)),
    ])
}
