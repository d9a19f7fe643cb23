use super::*;
use metcalc::{
    cape_cin, el, lcl, lfc, most_unstable_cape_cin, surface_based_cape_cin, ParcelLevelChoice,
    ParcelProfile, Sounding,
};
use metfor::{Celsius, HectoPascal, Quantity};

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_lcl(snd: &Sounding, tgt_float_vals: &HashMap<String, Vec<f64>>) {
    if let Some(target_vals) = tgt_float_vals.get("lcl") {
        assert_eq!(target_vals.len(), 2);

        let row = snd.data_row(0).unwrap();
        let (p, t) = lcl(
            row.pressure.unpack(),
            row.temperature.unpack(),
            row.dew_point.unpack(),
        )
        .unwrap();

        assert!(approx_equal(p.unpack(), target_vals[0], 0.01), "{:?}", p);
        assert!(approx_equal(t.unpack(), target_vals[1], 0.01), "{:?}", t);
    }
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_surface_based_cape_cin(snd: &Sounding, tgt_float_vals: &HashMap<String, Vec<f64>>) {
    let (cape, cin) = surface_based_cape_cin(snd).unwrap();

    if let Some(target_vals) = tgt_float_vals.get("sbcape") {
        // Within a percent, the parcel is integrated numerically
        let tol = (target_vals[0] * 0.01).max(0.01);
        assert!(approx_equal(cape.unpack(), target_vals[0], tol), "{:?}", cape);
    }

    if let Some(target_vals) = tgt_float_vals.get("sbcin") {
        assert!(approx_equal(cin.unpack(), target_vals[0], 0.5), "{:?}", cin);
    }
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_lfc_el(snd: &Sounding, tgt_float_vals: &HashMap<String, Vec<f64>>) {
    let profile = ParcelProfile::surface_based(snd).unwrap();

    let lfc_val = lfc(&profile, None, ParcelLevelChoice::Bottom);
    match tgt_float_vals.get("lfc") {
        Some(target_vals) => {
            let (p, _) = lfc_val.expect("missing LFC");
            assert!(approx_equal(p.unpack(), target_vals[0], 0.5), "{:?}", p);
        }
        None => assert!(lfc_val.is_none()),
    }

    let el_val = el(&profile, ParcelLevelChoice::Top);
    match tgt_float_vals.get("el") {
        Some(target_vals) => {
            let (p, _) = el_val.expect("missing EL");
            assert!(approx_equal(p.unpack(), target_vals[0], 0.5), "{:?}", p);
        }
        None => assert!(el_val.is_none()),
    }

    let (cape, _) = cape_cin(&profile, ParcelLevelChoice::Bottom, ParcelLevelChoice::Top);
    assert_eq!(cape, surface_based_cape_cin(snd).unwrap().0);
}

#[allow(dead_code)] // False alarm - lint is done before macro expansion.
pub fn test_most_unstable_cape(snd: &Sounding) {
    let (sb_cape, _) = surface_based_cape_cin(snd).unwrap();
    let (mu_cape, mu_cin) = most_unstable_cape_cin(snd, HectoPascal(300.0)).unwrap();

    assert!(mu_cape.unpack() >= 0.0);
    assert!(mu_cin.unpack() <= 0.0);
    if sb_cape.unpack() > 0.0 {
        assert!(mu_cape.unpack() > 0.0);
    }

    let row = snd.data_row(0).unwrap();
    assert!(row.dew_point.unpack() <= row.temperature.unpack());
    assert!(row.temperature.unpack() > Celsius(-100.0));
}
