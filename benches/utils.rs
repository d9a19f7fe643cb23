use metcalc::Sounding;
use metfor::{Celsius, HectoPascal, Knots, Meters, WindSpdDir};
use optional::Optioned;
use std::{fs::File, io::Read, path::PathBuf, str::FromStr};

pub fn load_all_test_files() -> [Sounding; 2] {
    let snd1 = load_test_file("unstable.csv");
    let snd2 = load_test_file("stable.csv");

    [snd1, snd2]
}

fn load_test_file(fname: &str) -> Sounding {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push(fname);
    load_test_csv_sounding(&test_path)
}

fn load_test_csv_sounding(location: &PathBuf) -> Sounding {
    let mut f = File::open(location).expect(&format!("Error opening file: {:#?}", location));

    let mut contents = String::new();
    f.read_to_string(&mut contents)
        .expect(&format!("Error reading file: {:#?}", location));

    let lines: Vec<&str> = contents.split('\n').collect();

    //
    // Parse profile data
    //
    let mut height: Vec<Optioned<Meters>> = Vec::with_capacity(lines.len());
    let mut temp: Vec<Optioned<Celsius>> = Vec::with_capacity(lines.len());
    let mut dp: Vec<Optioned<Celsius>> = Vec::with_capacity(lines.len());
    let mut press: Vec<Optioned<HectoPascal>> = Vec::with_capacity(lines.len());
    let mut wind: Vec<Optioned<WindSpdDir<Knots>>> = Vec::with_capacity(lines.len());

    for line in lines.iter() {
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

    Sounding::new()
        .with_height_profile(height)
        .with_temperature_profile(temp)
        .with_dew_point_profile(dp)
        .with_pressure_profile(press)
        .with_wind_profile(wind)
}
