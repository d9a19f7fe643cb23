#![warn(missing_docs)]
//! Meteorological calculations: thermodynamic formulas, sounding and parcel analysis, severe
//! weather indexes, hodograph analysis, and kinematics on gridded fields.
//!
//! Scalar quantities carry their units through the [metfor](https://github.com/rnleach/metfor)
//! newtypes, vertical profiles are held in a [`Sounding`], and gridded fields are `ndarray` arrays
//! indexed `[y, x]`.

//
// API
//
pub use crate::{
    error::{AnalysisError, Result},
    interpolation::{interpolate_1d, linear_interpolate, linear_interpolate_sounding, log_interpolate_1d},
    intersections::{find_intersections, nearest_intersection_idx, IntersectionDirection},
    layers::{
        get_layer, get_layer_heights, mean_pressure_weighted, mixed_layer, weighted_continuous_average,
        Depth, HeightLayerData, LayerData, LayerSpec, Level,
    },
    parcel::{mixed_parcel, most_unstable_parcel, surface_parcel, Parcel},
    parcel_profile::{
        cape_cin, ccl, downdraft_cape, el, lfc, mixed_layer_cape_cin, most_unstable_cape_cin,
        parcel_profile, surface_based_cape_cin, ParcelLevelChoice, ParcelProfile,
    },
    sounding::{DataRow, Sounding, WindColumns},
    std_atmosphere::{
        add_height_to_pressure, add_pressure_to_height, altimeter_to_station_pressure,
        height_to_pressure_std, pressure_to_height_std,
    },
    thermo::*,
};

pub mod constants;
pub mod grid;
pub mod indexes;
pub mod kinematics;
pub mod peaks;
pub mod smoothing;
pub mod turbulence;
pub mod wind;

#[doc(hidden)]
pub use crate::sounding::doctest;

//
// Internal use only
//

// Modules
mod error;
mod interpolation;
mod intersections;
mod layers;
mod parcel;
mod parcel_profile;
mod sounding;
mod std_atmosphere;
mod thermo;
mod utility;

#[cfg(test)]
mod test_data;
