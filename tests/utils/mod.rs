use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use metcalc::Sounding;
use metfor::{Celsius, HectoPascal, Knots, Meters, WindSpdDir};
use optional::Optioned;

pub mod index_tests;
pub mod parcel_tests;

#[allow(unused_macros)] // False alarm
macro_rules! test_file {
    ($test_mod_name:ident, $fname:expr) => {
        mod $test_mod_name {

            use std::collections::HashMap;

            use metcalc::Sounding;
            use crate::utils;

            fn load_data() -> (Sounding, HashMap<String, Vec<f64>>) {
                utils::load_test_file($fname)
            }

            #[test]
            fn loads_and_validates() {
                let (snd, _) = load_data();
                assert!(snd.validate().is_ok(), "Failed validation.");
            }

            mod parcels {
                use crate::utils::parcel_tests;
                use super::load_data;

                #[test]
                fn lcl() {
                    let (snd, fvals) = load_data();
                    parcel_tests::test_lcl(&snd, &fvals);
                }

                #[test]
                fn surface_based_cape_cin() {
                    let (snd, fvals) = load_data();
                    parcel_tests::test_surface_based_cape_cin(&snd, &fvals);
                }

                #[test]
                fn lfc_and_el() {
                    let (snd, fvals) = load_data();
                    parcel_tests::test_lfc_el(&snd, &fvals);
                }

                #[test]
                fn most_unstable_at_least_surface_based() {
                    let (snd, _) = load_data();
                    parcel_tests::test_most_unstable_cape(&snd);
                }
            }

            mod indexes {
                use crate::utils::index_tests;
                use super::load_data;

                #[test]
                fn test_precipitable_water() {
                    let (snd, fvals) = load_data();
                    index_tests::test_index(
                        &snd,
                        &fvals,
                        |snd| {
                            metcalc::indexes::precipitable_water(snd, None, None)
                                .map(|pw| metfor::Quantity::unpack(pw))
                        },
                        "precipitable_water",
                        0.001,
                    );
                }

                #[test]
                fn test_kindex() {
                    let (snd, fvals) = load_data();
                    index_tests::test_index(
                        &snd,
                        &fvals,
                        metcalc::indexes::k_index,
                        "kindex",
                        1.0e-9,
                    );
                }

                #[test]
                fn test_total_totals() {
                    let (snd, fvals) = load_data();
                    index_tests::test_index(
                        &snd,
                        &fvals,
                        metcalc::indexes::total_totals_index,
                        "total_totals",
                        1.0e-9,
                    );
                }

                #[test]
                fn test_vertical_totals() {
                    let (snd, fvals) = load_data();
                    index_tests::test_index(
                        &snd,
                        &fvals,
                        metcalc::indexes::vertical_totals,
                        "vertical_totals",
                        1.0e-9,
                    );
                }

                #[test]
                fn test_cross_totals() {
                    let (snd, fvals) = load_data();
                    index_tests::test_index(
                        &snd,
                        &fvals,
                        metcalc::indexes::cross_totals,
                        "cross_totals",
                        1.0e-9,
                    );
                }
            }
        }
    };
}

pub fn load_test_file(fname: &str) -> (Sounding, HashMap<String, Vec<f64>>) {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push(fname);
    load_test_csv_sounding(&test_path)
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn approx_equal(tgt: f64, guess: f64, tol: f64) -> bool {
    assert!(tol > 0.0);

    (tgt - guess).abs() <= tol
}

fn load_test_csv_sounding(location: &PathBuf) -> (Sounding, HashMap<String, Vec<f64>>) {
    let mut f = File::open(location).expect(&format!("Error opening file: {:#?}", location));

    let mut contents = String::new();
    f.read_to_string(&mut contents)
        .expect(&format!("Error reading file: {:#?}", location));

    let lines: Vec<&str> = contents.split('\n').collect();
    let mut line_iter = lines.iter();

    //
    // Parse profile data
    //
    let mut height: Vec<Optioned<Meters>> = Vec::with_capacity(lines.len());
    let mut temp: Vec<Optioned<Celsius>> = Vec::with_capacity(lines.len());
    let mut dp: Vec<Optioned<Celsius>> = Vec::with_capacity(lines.len());
    let mut press: Vec<Optioned<HectoPascal>> = Vec::with_capacity(lines.len());
    let mut wind: Vec<Optioned<WindSpdDir<Knots>>> = Vec::with_capacity(lines.len());

    for line in line_iter.by_ref() {
        if line.starts_with("### Analysis Float Section ###") {
            break;
        }

        let tokens: Vec<&str> = line.split(',').map(|t| t.trim()).collect();
        if tokens.len() < 6 {
            continue;
        }

        let wspd = f64::from_str(tokens[4]).ok();
        let wdir = f64::from_str(tokens[5]).ok();
        let wind_val: Option<WindSpdDir<Knots>> = wspd.and_then(|wspd| {
            wdir.map(|wdir| WindSpdDir {
                speed: Knots(wspd),
                direction: wdir,
            })
        });

        height.push(f64::from_str(tokens[0]).ok().map(Meters).into());
        temp.push(f64::from_str(tokens[1]).ok().map(Celsius).into());
        dp.push(f64::from_str(tokens[2]).ok().map(Celsius).into());
        press.push(f64::from_str(tokens[3]).ok().map(HectoPascal).into());
        wind.push(wind_val.into());
    }

    let snd = Sounding::new()
        .with_source_description(format!("{:?}", location))
        .with_height_profile(height)
        .with_temperature_profile(temp)
        .with_dew_point_profile(dp)
        .with_pressure_profile(press)
        .with_wind_profile(wind);

    //
    // Float values.
    //
    let mut target_float_vals = HashMap::new();
    for line in line_iter.by_ref() {
        let tokens: Vec<String> = line
            .split(',')
            .filter_map(|val| {
                let v = val.trim();
                if v != "" {
                    Some(v.to_owned())
                } else {
                    None
                }
            })
            .collect();
        if tokens.is_empty() {
            continue;
        }
        let key = tokens[0].to_owned();
        let mut values = vec![];
        for token in tokens.iter().skip(1) {
            values.push(f64::from_str(token).unwrap());
        }
        target_float_vals.insert(key, values);
    }

    (snd, target_float_vals)
}
