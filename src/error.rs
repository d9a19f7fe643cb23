//! Error types for the metcalc crate.
use thiserror::Error;

/// Error type for the crate.
#[derive(Clone, Copy, PartialEq, Debug, Error)]
pub enum AnalysisError {
    /// A profile that is required for this analysis is missing.
    #[error("Missing profile required for the analysis.")]
    MissingProfile,
    /// A value (surface value, index, location, etc) that is required is not available.
    #[error("Missing value required for analysis.")]
    MissingValue,
    /// Not enough data available for anlaysis
    #[error("Not enough data available for analysis.")]
    NotEnoughData,
    /// There is no data available that meets the requirements.
    #[error("Profile is full of missing values, cannot do analysis.")]
    NoDataProfile,
    /// Bad or invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    /// Missing data during interpolation, or it would have been extrapolation
    #[error("None value encountered during interpolation.")]
    InterpolationError,
    /// A requested layer bound lies outside the range of the data.
    #[error("Specified bound {bound} is outside the data range {min} to {max}.")]
    BoundOutOfRange {
        /// The requested bound.
        bound: f64,
        /// The smallest value in the data.
        min: f64,
        /// The largest value in the data.
        max: f64,
    },
    /// Parallel arrays or profiles have different lengths.
    #[error("Input arrays have mismatched lengths.")]
    MismatchedLengths,
    /// Two curves never cross where a crossing was required.
    #[error("No intersection found.")]
    NoIntersection,
    /// A smoothing window or stencil is not usable.
    #[error("Invalid smoothing window: {0}")]
    InvalidWindow(&'static str),
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, AnalysisError>;
