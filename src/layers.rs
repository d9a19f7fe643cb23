//! Extracting layers from a profile and averaging over them.
//!
//! Layers are described with a [`LayerSpec`]: an optional bottom and a depth, each given in
//! either pressure or height. Data variables are passed as raw `f64` slices parallel to the
//! pressure profile so any mix of quantities can be carried through a layer at once.
use crate::{
    error::{AnalysisError, Result},
    interpolation::{interpolate_1d, log_interpolate_1d},
    std_atmosphere::{height_to_pressure_std, pressure_to_height_std},
    utility::{argsort, greater_or_close, is_close, less_or_close, trapezoid},
};
use metfor::{HectoPascal, Meters, Quantity};

/// A level in the atmosphere, given as a pressure or a height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    /// A pressure level.
    Pressure(HectoPascal),
    /// A height level. Heights are in the same reference as the supplied height profile.
    Height(Meters),
}

/// The thickness of a layer, given as a pressure difference or a height difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Depth {
    /// Pressure thickness, positive.
    Pressure(HectoPascal),
    /// Height thickness, positive.
    Height(Meters),
}

/// Description of a layer to extract from a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSpec {
    /// The bottom of the layer, defaults to the highest pressure in the data.
    pub bottom: Option<Level>,
    /// The depth of the layer.
    pub depth: Depth,
    /// Whether to interpolate values at the bounds of the layer when they are not data levels.
    pub interpolate: bool,
}

impl Default for LayerSpec {
    fn default() -> Self {
        LayerSpec {
            bottom: None,
            depth: Depth::Pressure(HectoPascal(100.0)),
            interpolate: true,
        }
    }
}

impl LayerSpec {
    /// A layer of the given depth starting at the bottom of the data.
    pub fn with_depth(depth: Depth) -> Self {
        LayerSpec {
            depth,
            ..LayerSpec::default()
        }
    }

    /// Builder method to set the bottom of the layer.
    pub fn bottom(self, bottom: Level) -> Self {
        LayerSpec {
            bottom: Some(bottom),
            ..self
        }
    }

    /// Builder method to turn interpolation at the layer bounds on or off.
    pub fn interpolate(self, interpolate: bool) -> Self {
        LayerSpec {
            interpolate,
            ..self
        }
    }
}

/// The data inside a layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerData {
    /// Pressure levels in the layer, decreasing.
    pub pressure: Vec<HectoPascal>,
    /// Each data variable at the levels in `pressure`, in the order they were passed in.
    pub values: Vec<Vec<f64>>,
}

/// The data inside a layer defined by heights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightLayerData {
    /// Heights in the layer, increasing.
    pub height: Vec<Meters>,
    /// Each data variable at the levels in `height`, in the order they were passed in.
    pub values: Vec<Vec<f64>>,
}

/// Get the data within a layer of a profile.
///
/// The bottom of the layer defaults to the highest pressure in the data. If `heights` are not
/// supplied, heights are computed with the standard atmosphere when needed. If interpolation is
/// enabled, values are interpolated (log-pressure) at the bounds if those are not data levels.
/// A bound outside the range of the data is an error.
///
/// # Examples
///
/// ```rust
/// use metcalc::{get_layer, Depth, LayerSpec};
/// use metfor::{HectoPascal, Quantity};
///
/// let p: Vec<HectoPascal> = vec![1000.0, 900.0, 800.0, 700.0]
///     .into_iter()
///     .map(HectoPascal)
///     .collect();
/// let t = [20.0, 15.0, 10.0, 5.0];
///
/// let layer = get_layer(
///     &p,
///     None,
///     &[&t],
///     &LayerSpec::with_depth(Depth::Pressure(HectoPascal(150.0))),
/// )
/// .unwrap();
///
/// assert_eq!(layer.pressure.len(), 3);
/// assert_eq!(layer.pressure[2], HectoPascal(850.0));
/// assert_eq!(layer.values[0][1], 15.0);
/// ```
pub fn get_layer(
    pressure: &[HectoPascal],
    heights: Option<&[Meters]>,
    vars: &[&[f64]],
    spec: &LayerSpec,
) -> Result<LayerData> {
    let p: Vec<f64> = pressure.iter().map(|p| p.unpack()).collect();
    let h: Option<Vec<f64>> = heights.map(|h| h.iter().map(|h| h.unpack()).collect());

    if p.is_empty() {
        return Err(AnalysisError::NotEnoughData);
    }
    if vars.iter().any(|v| v.len() != p.len())
        || h.as_ref().map(|h| h.len() != p.len()).unwrap_or(false)
    {
        return Err(AnalysisError::MismatchedLengths);
    }

    let bottom = spec
        .bottom
        .unwrap_or_else(|| Level::Pressure(HectoPascal(nan_max(&p))));

    let (bottom_p, bottom_h) = bound_pressure_height(&p, h.as_deref(), bottom, spec.interpolate)?;

    let top = match spec.depth {
        Depth::Pressure(d) => Level::Pressure(HectoPascal(bottom_p - d.unpack())),
        Depth::Height(d) => Level::Height(Meters(bottom_h + d.unpack())),
    };
    let (top_p, _) = bound_pressure_height(&p, h.as_deref(), top, spec.interpolate)?;

    // Ascending pressure order
    let sort_idx = argsort(&p);
    let p_sorted: Vec<f64> = sort_idx.iter().map(|&i| p[i]).collect();

    let in_layer: Vec<bool> = p_sorted
        .iter()
        .map(|&pv| less_or_close(pv, bottom_p) && greater_or_close(pv, top_p))
        .collect();

    let mut p_interp: Vec<f64> = p_sorted
        .iter()
        .zip(&in_layer)
        .filter(|(_, &keep)| keep)
        .map(|(&pv, _)| pv)
        .collect();

    if spec.interpolate {
        if !p_interp.iter().any(|&pv| is_close(top_p, pv)) {
            p_interp.push(top_p);
        }
        if !p_interp.iter().any(|&pv| is_close(bottom_p, pv)) {
            p_interp.push(bottom_p);
        }
        p_interp.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    }

    let values = vars
        .iter()
        .map(|var| {
            let var_sorted: Vec<f64> = sort_idx.iter().map(|&i| var[i]).collect();
            let mut vals = if spec.interpolate {
                log_interpolate_1d(&p_interp, &p_sorted, &var_sorted)
            } else {
                var_sorted
                    .iter()
                    .zip(&in_layer)
                    .filter(|(_, &keep)| keep)
                    .map(|(&v, _)| v)
                    .collect()
            };
            vals.reverse();
            vals
        })
        .collect();

    p_interp.reverse();

    Ok(LayerData {
        pressure: p_interp.into_iter().map(HectoPascal).collect(),
        values,
    })
}

/// Get the data within a layer of a profile defined by heights.
///
/// The bottom defaults to the lowest height. If `with_agl` is set, heights are first converted
/// to heights above the lowest level and `bottom` is interpreted above ground level too. With
/// interpolation enabled, values at the layer bounds are linearly interpolated in height.
pub fn get_layer_heights(
    heights: &[Meters],
    depth: Meters,
    vars: &[&[f64]],
    bottom: Option<Meters>,
    interpolate: bool,
    with_agl: bool,
) -> Result<HeightLayerData> {
    if heights.is_empty() {
        return Err(AnalysisError::NotEnoughData);
    }
    if vars.iter().any(|v| v.len() != heights.len()) {
        return Err(AnalysisError::MismatchedLengths);
    }

    let mut h: Vec<f64> = heights.iter().map(|h| h.unpack()).collect();
    if with_agl {
        let sfc = h.iter().cloned().fold(std::f64::INFINITY, f64::min);
        h.iter_mut().for_each(|v| *v -= sfc);
    }

    let bottom = bottom.map(|b| b.unpack()).unwrap_or(h[0]);
    let top = bottom + depth.unpack();

    let sort_idx = argsort(&h);
    let h_sorted: Vec<f64> = sort_idx.iter().map(|&i| h[i]).collect();

    let in_layer: Vec<bool> = h_sorted
        .iter()
        .map(|&hv| greater_or_close(hv, bottom) && less_or_close(hv, top))
        .collect();

    let mut h_interp: Vec<f64> = h_sorted
        .iter()
        .zip(&in_layer)
        .filter(|(_, &keep)| keep)
        .map(|(&hv, _)| hv)
        .collect();

    if interpolate {
        if !h_interp.iter().any(|&hv| is_close(top, hv)) {
            h_interp.push(top);
        }
        if !h_interp.iter().any(|&hv| is_close(bottom, hv)) {
            h_interp.push(bottom);
        }
        h_interp.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    }

    let values = vars
        .iter()
        .map(|var| {
            let var_sorted: Vec<f64> = sort_idx.iter().map(|&i| var[i]).collect();
            if interpolate {
                interpolate_1d(&h_interp, &h_sorted, &var_sorted)
            } else {
                var_sorted
                    .iter()
                    .zip(&in_layer)
                    .filter(|(_, &keep)| keep)
                    .map(|(&v, _)| v)
                    .collect()
            }
        })
        .collect();

    Ok(HeightLayerData {
        height: h_interp.into_iter().map(Meters).collect(),
        values,
    })
}

/// Mixed layer values of the data variables: the pressure weighted mean over the layer,
/// `∫ x dp / Δp`.
pub fn mixed_layer(
    pressure: &[HectoPascal],
    heights: Option<&[Meters]>,
    vars: &[&[f64]],
    spec: &LayerSpec,
) -> Result<Vec<f64>> {
    let layer = get_layer(pressure, heights, vars, spec)?;
    let p: Vec<f64> = layer.pressure.iter().map(|p| p.unpack()).collect();

    let max_p = nan_max(&p);
    let min_p = p.iter().cloned().fold(std::f64::INFINITY, f64::min);
    let actual_depth = (max_p - min_p).abs();
    if actual_depth == 0.0 {
        return Err(AnalysisError::NotEnoughData);
    }

    Ok(layer
        .values
        .iter()
        .map(|vals| trapezoid(vals, &p) / -actual_depth)
        .collect())
}

/// Mean of the data variables weighted by pressure, `∫ x p dp / ∫ p dp`.
pub fn mean_pressure_weighted(
    pressure: &[HectoPascal],
    heights: Option<&[Meters]>,
    vars: &[&[f64]],
    spec: &LayerSpec,
) -> Result<Vec<f64>> {
    let layer = get_layer(pressure, heights, vars, spec)?;
    let p: Vec<f64> = layer.pressure.iter().map(|p| p.unpack()).collect();

    let (first, last) = match (p.first(), p.last()) {
        (Some(&first), Some(&last)) if p.len() > 1 => (first, last),
        _ => return Err(AnalysisError::NotEnoughData),
    };
    let pres_int = 0.5 * (last * last - first * first);

    Ok(layer
        .values
        .iter()
        .map(|vals| {
            let weighted: Vec<f64> = vals.iter().zip(&p).map(|(v, p)| v * p).collect();
            trapezoid(&weighted, &p) / pres_int
        })
        .collect())
}

/// Continuous average of the data variables over the layer, `∫ x dp / Δp`, the mean used for
/// storm motion calculations.
pub fn weighted_continuous_average(
    pressure: &[HectoPascal],
    heights: Option<&[Meters]>,
    vars: &[&[f64]],
    spec: &LayerSpec,
) -> Result<Vec<f64>> {
    let layer = get_layer(pressure, heights, vars, spec)?;
    let p: Vec<f64> = layer.pressure.iter().map(|p| p.unpack()).collect();

    let (first, last) = match (p.first(), p.last()) {
        (Some(&first), Some(&last)) if p.len() > 1 => (first, last),
        _ => return Err(AnalysisError::NotEnoughData),
    };

    Ok(layer
        .values
        .iter()
        .map(|vals| trapezoid(vals, &p) / (last - first))
        .collect())
}

/// Find the pressure and height of a layer bound.
fn bound_pressure_height(
    pressure: &[f64],
    heights: Option<&[f64]>,
    bound: Level,
    interpolate: bool,
) -> Result<(f64, f64)> {
    // Pressure decreasing
    let mut sort_idx = argsort(pressure);
    sort_idx.reverse();
    let p: Vec<f64> = sort_idx.iter().map(|&i| pressure[i]).collect();
    let h: Option<Vec<f64>> = heights.map(|h| sort_idx.iter().map(|&i| h[i]).collect());

    let std_height = |pv: f64| pressure_to_height_std(HectoPascal(pv)).unpack();
    let nearest = |vals: &[f64], tgt: f64| -> usize {
        vals.iter()
            .enumerate()
            .fold((0, std::f64::INFINITY), |(best_i, best), (i, v)| {
                let diff = (v - tgt).abs();
                if diff < best {
                    (i, diff)
                } else {
                    (best_i, best)
                }
            })
            .0
    };

    let (bound_p, bound_h) = match bound {
        Level::Pressure(bp) => {
            let bp = bp.unpack();
            if let Some(idx) = p.iter().position(|&pv| pv == bp) {
                (bp, h.as_ref().map(|h| h[idx]).unwrap_or_else(|| std_height(bp)))
            } else if interpolate {
                let bh = match h {
                    Some(ref h) => log_interpolate_1d(&[bp], &p, h)[0],
                    None => std_height(bp),
                };
                (bp, bh)
            } else {
                let idx = nearest(&p, bp);
                (p[idx], h.as_ref().map(|h| h[idx]).unwrap_or_else(|| std_height(p[idx])))
            }
        }
        Level::Height(bh) => {
            let bh = bh.unpack();
            match h {
                Some(ref h) => {
                    if let Some(idx) = h.iter().position(|&hv| hv == bh) {
                        (p[idx], bh)
                    } else if interpolate {
                        (interp_clamped(bh, h, &p), bh)
                    } else {
                        let idx = nearest(h, bh);
                        (p[idx], h[idx])
                    }
                }
                None => {
                    let bp = height_to_pressure_std(Meters(bh)).unpack();
                    if interpolate {
                        (bp, bh)
                    } else {
                        let idx = nearest(&p, bp);
                        (p[idx], std_height(p[idx]))
                    }
                }
            }
        }
    };

    let max_p = nan_max(&p);
    let min_p = p.iter().cloned().fold(std::f64::INFINITY, f64::min);
    if !(greater_or_close(bound_p, min_p) && less_or_close(bound_p, max_p)) {
        return Err(AnalysisError::BoundOutOfRange {
            bound: bound_p,
            min: min_p,
            max: max_p,
        });
    }

    if let Some(ref h) = h {
        let max_h = nan_max(h);
        let min_h = h.iter().cloned().fold(std::f64::INFINITY, f64::min);
        if !(less_or_close(bound_h, max_h) && greater_or_close(bound_h, min_h)) {
            return Err(AnalysisError::BoundOutOfRange {
                bound: bound_h,
                min: min_h,
                max: max_h,
            });
        }
    }

    Ok((bound_p, bound_h))
}

/// Linear interpolation in increasing `xp`, clamped to the end values outside the range.
fn interp_clamped(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    let above = xp.iter().position(|&v| v >= x).unwrap_or(n - 1);
    let below = above - 1;

    fp[below] + (fp[above] - fp[below]) * (x - xp[below]) / (xp[above] - xp[below])
}

fn nan_max(vals: &[f64]) -> f64 {
    vals.iter()
        .cloned()
        .filter(|v| !v.is_nan())
        .fold(std::f64::NEG_INFINITY, f64::max)
}
