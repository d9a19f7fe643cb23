//! Levels and energies of a lifted parcel: LFC, EL, CAPE, CIN, and the CCL.
use super::{ParcelLevelChoice, ParcelProfile};
use crate::{
    constants::{EPSILON, RD},
    error::{AnalysisError, Result},
    intersections::{find_intersections, IntersectionDirection},
    layers::{mixed_layer, Depth, LayerSpec},
    sounding::Sounding,
    thermo::{
        dewpoint_k, dry_lapse, lcl, saturation_mixing_ratio_raw,
        virtual_temperature_from_dewpoint_raw, virtual_temperature_raw,
    },
    utility::{greater_or_close, is_close, less_or_close, trapezoid},
};
use metfor::{HectoPascal, JpKg, Kelvin, Quantity};

use ParcelLevelChoice::*;

/// Level of free convection.
///
/// The LFC is the lowest pressure, log interpolated, where the parcel becomes warmer than the
/// environment above the LCL. If the parcel never crosses the environment but is warmer above
/// the LCL, the LCL is the LFC. If there is more than one crossing, `which` selects one of them.
/// The LCL is computed with `dewpoint_start`, which defaults to the dew point of the first
/// level.
///
/// Returns the pressure and parcel temperature at the LFC, or `None` if there is no LFC.
pub fn lfc(
    profile: &ParcelProfile,
    dewpoint_start: Option<Kelvin>,
    which: ParcelLevelChoice,
) -> Option<(HectoPascal, Kelvin)> {
    let cols = Columns::from_profile(profile);
    lfc_raw(&cols, dewpoint_start.map(|td| td.unpack()), which)
        .map(|(p, t)| (HectoPascal(p), Kelvin(t)))
}

/// Equilibrium level.
///
/// The EL is where the parcel becomes cooler than the environment above the LCL, found with log
/// interpolation. There is none if the parcel is still warmer than the environment at the top
/// of the profile. If there is more than one crossing, `which` selects one of them.
pub fn el(profile: &ParcelProfile, which: ParcelLevelChoice) -> Option<(HectoPascal, Kelvin)> {
    let cols = Columns::from_profile(profile);
    el_raw(&cols, which).map(|(p, t)| (HectoPascal(p), Kelvin(t)))
}

/// Convective available potential energy and convective inhibition.
///
/// Both are computed from virtual temperatures. The parcel is assumed to keep the mixing ratio
/// of the first level below the LCL and to be saturated above it. CAPE is the positive area
/// between the LFC and EL, with the top of the profile used if there is no EL. CIN is the area
/// between the bottom of the profile and the LFC, and is never positive. If there is no LFC,
/// both are zero.
///
/// # Examples
///
/// ```rust
/// use metcalc::{cape_cin, ParcelLevelChoice, ParcelProfile};
/// # use metcalc::doctest::make_test_sounding;
/// use metfor::JpKg;
///
/// let snd = make_test_sounding();
/// let profile = ParcelProfile::surface_based(&snd).unwrap();
///
/// let (cape, cin) = cape_cin(&profile, ParcelLevelChoice::Bottom, ParcelLevelChoice::Top);
/// assert!(cape >= JpKg(0.0));
/// assert!(cin <= JpKg(0.0));
/// ```
pub fn cape_cin(
    profile: &ParcelProfile,
    which_lfc: ParcelLevelChoice,
    which_el: ParcelLevelChoice,
) -> (JpKg, JpKg) {
    let cols = Columns::from_profile(profile);
    let (cape, cin) = cape_cin_raw(&cols, which_lfc, which_el);
    (JpKg(cape), JpKg(cin))
}

/// Convective condensation level.
///
/// The CCL is where the environment temperature meets the dew point curve of the surface mixing
/// ratio, or the mixed layer mean mixing ratio if a `mixed_layer_depth` is given. `which` selects
/// the `Top` or `Bottom` crossing when there are several, other choices are invalid.
///
/// Returns the pressure and temperature at the CCL and the convective temperature, the surface
/// temperature needed for a parcel to reach the CCL dry adiabatically.
pub fn ccl(
    snd: &Sounding,
    mixed_layer_depth: Option<HectoPascal>,
    which: ParcelLevelChoice,
) -> Result<(HectoPascal, Kelvin, Kelvin)> {
    let (p, t, dp, hgt) = snd.thermo_columns_with_height()?;

    let p_raw: Vec<f64> = p.iter().map(|p| p.unpack()).collect();
    let t_raw: Vec<f64> = t.iter().map(|&t| Kelvin::from(t).unpack()).collect();
    let dp_raw: Vec<f64> = dp.iter().map(|&dp| Kelvin::from(dp).unpack()).collect();

    let mw = match mixed_layer_depth {
        None => saturation_mixing_ratio_raw(p_raw[0], dp_raw[0]),
        Some(depth) => {
            let mw_profile: Vec<f64> = p_raw
                .iter()
                .zip(&dp_raw)
                .map(|(&p, &dp)| saturation_mixing_ratio_raw(p, dp))
                .collect();
            let spec = LayerSpec::with_depth(Depth::Pressure(depth));
            mixed_layer(&p, hgt.as_deref(), &[&mw_profile], &spec)?[0]
        }
    };

    let mw_dew_point: Vec<f64> = p_raw
        .iter()
        .map(|&p| dewpoint_k(p * mw / (EPSILON + mw)).unwrap_or(std::f64::NAN))
        .collect();

    let (xs, ys) = find_intersections(
        &p_raw,
        &mw_dew_point,
        &t_raw,
        IntersectionDirection::Increasing,
        true,
    );

    let idx = match which {
        Top => xs.len().checked_sub(1),
        Bottom => Some(0).filter(|_| !xs.is_empty()),
        Wide | MostCape => {
            return Err(AnalysisError::InvalidInput(
                "the convective condensation level only supports top or bottom",
            ))
        }
    }
    .ok_or(AnalysisError::NoIntersection)?;

    let (ccl_p, ccl_t) = (HectoPascal(xs[idx]), Kelvin(ys[idx]));
    let convective_t = dry_lapse(&p[..1], ccl_t, Some(ccl_p))[0];

    Ok((ccl_p, ccl_t, convective_t))
}

/// Raw profile columns with missing rows removed, pressure in hPa and temperatures in Kelvin.
struct Columns {
    p: Vec<f64>,
    t: Vec<f64>,
    td: Vec<f64>,
    parcel: Vec<f64>,
}

impl Columns {
    fn from_profile(profile: &ParcelProfile) -> Self {
        let mut cols = Columns {
            p: Vec::with_capacity(profile.pressure.len()),
            t: Vec::with_capacity(profile.pressure.len()),
            td: Vec::with_capacity(profile.pressure.len()),
            parcel: Vec::with_capacity(profile.pressure.len()),
        };

        itertools::izip!(
            &profile.pressure,
            &profile.environment_t,
            &profile.environment_dp,
            &profile.parcel_t
        )
        .map(|(p, t, td, pcl)| (p.unpack(), t.unpack(), td.unpack(), pcl.unpack()))
        .filter(|(p, t, td, pcl)| !(p.is_nan() || t.is_nan() || td.is_nan() || pcl.is_nan()))
        .for_each(|(p, t, td, pcl)| {
            cols.p.push(p);
            cols.t.push(t);
            cols.td.push(td);
            cols.parcel.push(pcl);
        });

        cols
    }

    fn lcl(&self, t: f64, td: f64) -> Option<(f64, f64)> {
        match lcl(HectoPascal(self.p[0]), Kelvin(t), Kelvin(td)) {
            Ok((p, t)) => Some((p.unpack(), t.unpack())),
            Err(err) => {
                tracing::warn!("no LCL for the parcel: {}", err);
                None
            }
        }
    }

    fn crossings(&self, direction: IntersectionDirection, skip_first: bool) -> (Vec<f64>, Vec<f64>) {
        let start = if skip_first { 1 } else { 0 };
        find_intersections(
            &self.p[start..],
            &self.parcel[start..],
            &self.t[start..],
            direction,
            true,
        )
    }
}

#[derive(Clone, Copy, PartialEq)]
enum LevelKind {
    Lfc,
    El,
}

fn lfc_raw(cols: &Columns, dewpoint_start: Option<f64>, which: ParcelLevelChoice) -> Option<(f64, f64)> {
    if cols.p.is_empty() {
        return None;
    }

    let dewpoint_start = dewpoint_start.unwrap_or(cols.td[0]);

    // The parcel and environment often share the first point, skip it to find the real crossing.
    let same_start = is_close(cols.parcel[0], cols.t[0]);
    let (xs, ys) = cols.crossings(IntersectionDirection::Increasing, same_start);

    let (lcl_p, lcl_t) = cols.lcl(cols.parcel[0], dewpoint_start)?;

    if xs.is_empty() {
        let positive_above_lcl = cols
            .p
            .iter()
            .zip(cols.parcel.iter().zip(&cols.t))
            .filter(|(&p, _)| p < lcl_p)
            .any(|(_, (&pcl, &env))| !less_or_close(pcl, env));

        return if positive_above_lcl {
            Some((lcl_p, lcl_t))
        } else {
            None
        };
    }

    let valid: Vec<bool> = xs.iter().map(|&x| x < lcl_p).collect();
    if !valid.iter().any(|&v| v) {
        let (el_ps, _) = cols.crossings(IntersectionDirection::Decreasing, true);
        let el_min = el_ps.iter().cloned().fold(std::f64::INFINITY, f64::min);

        tracing::debug!("LFC below the LCL, using the LCL");
        return if !el_ps.is_empty() && el_min > lcl_p {
            None
        } else {
            Some((lcl_p, lcl_t))
        };
    }

    Some(choose_level(LevelKind::Lfc, &xs, &ys, &valid, which, cols))
}

fn el_raw(cols: &Columns, which: ParcelLevelChoice) -> Option<(f64, f64)> {
    let last = cols.p.len().checked_sub(1)?;
    if cols.parcel[last] > cols.t[last] {
        return None;
    }

    let (xs, ys) = cols.crossings(IntersectionDirection::Decreasing, true);
    let (lcl_p, _) = cols.lcl(cols.t[0], cols.td[0])?;

    match xs.last() {
        Some(&top) if top < lcl_p => {
            let valid: Vec<bool> = xs.iter().map(|&x| x < lcl_p).collect();
            Some(choose_level(LevelKind::El, &xs, &ys, &valid, which, cols))
        }
        _ => None,
    }
}

fn choose_level(
    kind: LevelKind,
    xs: &[f64],
    ys: &[f64],
    valid: &[bool],
    which: ParcelLevelChoice,
    cols: &Columns,
) -> (f64, f64) {
    let (p_list, t_list): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .zip(valid)
        .filter(|(_, &v)| v)
        .map(|((&x, &y), _)| (x, y))
        .unzip();

    let last = p_list.len() - 1;
    let top = (p_list[last], t_list[last]);
    let bottom = (p_list[0], t_list[0]);

    match which {
        Top => top,
        Bottom => bottom,
        Wide => {
            let (lfc_ps, el_ps) = match kind {
                LevelKind::Lfc => (p_list.clone(), cols.crossings(IntersectionDirection::Decreasing, true).0),
                LevelKind::El => (cols.crossings(IntersectionDirection::Increasing, false).0, p_list.clone()),
            };

            let widest = lfc_ps
                .iter()
                .zip(&el_ps)
                .map(|(lfc, el)| lfc - el)
                .enumerate()
                .fold(None, |acc: Option<(usize, f64)>, (i, diff)| match acc {
                    Some((_, best)) if best >= diff => acc,
                    _ => Some((i, diff)),
                });

            match widest {
                Some((i, _)) if i <= last => (p_list[i], t_list[i]),
                _ => top,
            }
        }
        MostCape => {
            let options = [(Top, Top), (Top, Bottom), (Bottom, Top), (Bottom, Bottom)];
            let (best, _) = options
                .iter()
                .map(|&(which_lfc, which_el)| cape_cin_raw(cols, which_lfc, which_el).0)
                .enumerate()
                .fold((0, std::f64::MIN), |(best_i, best), (i, cape)| {
                    if cape > best {
                        (i, cape)
                    } else {
                        (best_i, best)
                    }
                });

            let (which_lfc, which_el) = options[best];
            let chosen = if kind == LevelKind::Lfc { which_lfc } else { which_el };
            if chosen == Top {
                top
            } else {
                bottom
            }
        }
    }
}

fn cape_cin_raw(cols: &Columns, which_lfc: ParcelLevelChoice, which_el: ParcelLevelChoice) -> (f64, f64) {
    if cols.p.is_empty() {
        return (0.0, 0.0);
    }

    let lcl_p = match cols.lcl(cols.t[0], cols.td[0]) {
        Some((lcl_p, _)) => lcl_p,
        None => return (0.0, 0.0),
    };

    let sfc_mw = saturation_mixing_ratio_raw(cols.p[0], cols.td[0]);

    let virtual_cols = Columns {
        p: cols.p.clone(),
        t: itertools::izip!(&cols.p, &cols.t, &cols.td)
            .map(|(&p, &t, &td)| virtual_temperature_from_dewpoint_raw(p, t, td))
            .collect(),
        td: cols.td.clone(),
        parcel: cols
            .p
            .iter()
            .zip(&cols.parcel)
            .map(|(&p, &pcl)| {
                let mw = if p > lcl_p {
                    sfc_mw
                } else {
                    saturation_mixing_ratio_raw(p, pcl)
                };
                virtual_temperature_raw(pcl, mw)
            })
            .collect(),
    };

    let lfc_p = match lfc_raw(&virtual_cols, None, which_lfc) {
        Some((p, _)) => p,
        None => return (0.0, 0.0),
    };

    let last = virtual_cols.p.len() - 1;
    let el_p = el_raw(&virtual_cols, which_el)
        .map(|(p, _)| p)
        .unwrap_or(virtual_cols.p[last]);

    tracing::debug!("integrating CAPE from {} to {} hPa", lfc_p, el_p);

    let diff: Vec<f64> = virtual_cols
        .parcel
        .iter()
        .zip(&virtual_cols.t)
        .map(|(pcl, env)| pcl - env)
        .collect();
    let (x, y) = append_zero_crossings(&virtual_cols.p, &diff);

    let integrate = |keep: &dyn Fn(f64) -> bool| -> f64 {
        let (ln_p, vals): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(&y)
            .filter(|(&p, _)| keep(p))
            .map(|(&p, &v)| (p.ln(), v))
            .unzip();
        RD * trapezoid(&vals, &ln_p)
    };

    let cape = integrate(&|p| less_or_close(p, lfc_p) && greater_or_close(p, el_p));
    let cin = integrate(&|p| greater_or_close(p, lfc_p)).min(0.0);

    (cape, cin)
}

/// Add the points where `y` crosses zero and sort by increasing `x`.
fn append_zero_crossings(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let zeros = vec![0.0; y.len().saturating_sub(1)];
    let (cross_x, cross_y) = if y.len() > 1 {
        find_intersections(&x[1..], &y[1..], &zeros, IntersectionDirection::All, true)
    } else {
        (vec![], vec![])
    };

    let mut pairs: Vec<(f64, f64)> = x
        .iter()
        .cloned()
        .zip(y.iter().cloned())
        .chain(cross_x.into_iter().zip(cross_y))
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let keep: Vec<bool> = (0..pairs.len())
        .map(|i| match pairs.get(i + 1) {
            Some(next) => next.0 - pairs[i].0 > 1.0e-6,
            None => true,
        })
        .collect();

    pairs
        .into_iter()
        .zip(keep)
        .filter(|(_, keep)| *keep)
        .map(|(pair, _)| pair)
        .unzip()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test_data, utility::test_tools::*};
    use metfor::Celsius;

    fn profile_from(p: &[f64], t: &[f64], td: &[f64]) -> ParcelProfile {
        let p: Vec<HectoPascal> = p.iter().cloned().map(HectoPascal).collect();
        let t: Vec<Kelvin> = t.iter().map(|&t| Kelvin::from(Celsius(t))).collect();
        let td: Vec<Kelvin> = td.iter().map(|&t| Kelvin::from(Celsius(t))).collect();
        ParcelProfile::new(p, t, td).unwrap()
    }

    #[test]
    fn test_lfc_and_el() {
        let (p, t, td) = test_data::cape_cin_profile();
        let profile = ParcelProfile::new(p, t, td).unwrap();

        let (lfc_p, _) = lfc(&profile, None, Bottom).unwrap();
        let (el_p, _) = el(&profile, Top).unwrap();

        assert!(approx_equal(lfc_p.unpack(), test_data::CAPE_CIN_PROFILE_LFC, 0.1), "{:?}", lfc_p);
        assert!(approx_equal(el_p.unpack(), test_data::CAPE_CIN_PROFILE_EL, 0.1), "{:?}", el_p);
        assert!(el_p < lfc_p);
    }

    #[test]
    fn test_no_el_when_warm_at_top() {
        let profile = profile_from(
            &[1000.0, 900.0, 800.0, 700.0],
            &[25.0, 10.0, 0.0, -20.0],
            &[20.0, 8.0, -5.0, -30.0],
        );
        assert!(el(&profile, Top).is_none());
    }

    #[test]
    fn test_lfc_is_lcl_for_saturated_unstable() {
        // The parcel is warmer than the environment everywhere above a saturated surface.
        let profile = profile_from(
            &[1000.0, 950.0, 900.0, 850.0, 800.0],
            &[20.0, 14.0, 8.0, 2.0, -4.0],
            &[20.0, 10.0, 0.0, -5.0, -10.0],
        );

        let (lfc_p, _) = lfc(&profile, None, Bottom).unwrap();
        let (lcl_p, _) = lcl(HectoPascal(1000.0), Celsius(20.0), Celsius(20.0)).unwrap();
        assert!(approx_equal(lfc_p.unpack(), lcl_p.unpack(), 1.0e-6));
    }

    #[test]
    fn test_no_lfc_in_stable_profile() {
        let profile = profile_from(
            &[1000.0, 900.0, 800.0, 700.0],
            &[10.0, 12.0, 14.0, 12.0],
            &[-20.0, -20.0, -20.0, -25.0],
        );
        assert!(lfc(&profile, None, Bottom).is_none());
    }

    #[test]
    fn test_level_choices_pick_from_crossings() {
        let (p, t, td) = test_data::cape_cin_profile();
        let profile = ParcelProfile::new(p, t, td).unwrap();

        let top = lfc(&profile, None, Top).unwrap();
        let bottom = lfc(&profile, None, Bottom).unwrap();
        assert!(top.0 <= bottom.0);

        for &which in &[Wide, MostCape] {
            let (p, _) = lfc(&profile, None, which).unwrap();
            assert!(p == top.0 || p == bottom.0);
        }
    }

    #[test]
    fn test_append_zero_crossings() {
        let x = [1000.0, 900.0, 800.0];
        let y = [-1.0, 1.0, 2.0];

        let (xs, ys) = append_zero_crossings(&x, &y);
        // Only crossings above the first level are added.
        assert_eq!(xs.len(), 3);
        assert_eq!(xs[0], 800.0);
        assert_eq!(ys[2], -1.0);

        let y = [1.0, -1.0, 1.0];
        let (xs, _) = append_zero_crossings(&x, &y);
        assert_eq!(xs.len(), 4);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ccl() {
        let snd = test_data::unstable_sounding();
        let (p, t, tc) = ccl(&snd, None, Top).unwrap();

        assert!(p < HectoPascal(1000.0));
        assert!(tc > t);

        assert!(ccl(&snd, None, Wide).is_err());
        assert!(ccl(&snd, Some(HectoPascal(50.0)), Bottom).is_ok());
    }
}
