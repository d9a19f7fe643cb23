//! Physical constants used throughout the crate, all in SI units unless noted.

/// Universal gas constant (J mol⁻¹ K⁻¹).
pub const R: f64 = 8.314462618;

/// Molecular weight of dry air (kg mol⁻¹).
pub const MD: f64 = 28.96546e-3;

/// Molecular weight of water (kg mol⁻¹).
pub const MW: f64 = 18.015268e-3;

/// Gas constant for dry air (J kg⁻¹ K⁻¹).
pub const RD: f64 = R / MD;

/// Gas constant for water vapor (J kg⁻¹ K⁻¹).
pub const RV: f64 = R / MW;

/// Ratio of the molecular weights of water and dry air.
pub const EPSILON: f64 = MW / MD;

/// Specific heat ratio of dry air.
pub const DRY_AIR_SPEC_HEAT_RATIO: f64 = 1.4;

/// Specific heat at constant pressure for dry air (J kg⁻¹ K⁻¹).
pub const CP_D: f64 = DRY_AIR_SPEC_HEAT_RATIO * RD / (DRY_AIR_SPEC_HEAT_RATIO - 1.0);

/// Poisson constant, Rd / Cp_d.
pub const KAPPA: f64 = RD / CP_D;

/// Latent heat of vaporization (J kg⁻¹).
pub const LV: f64 = 2.50084e6;

/// Standard acceleration of gravity (m s⁻²).
pub const G: f64 = 9.80665;

/// Density of liquid water (kg m⁻³).
pub const RHO_L: f64 = 999.97495;

/// Rotation rate of the earth (rad s⁻¹).
pub const OMEGA: f64 = 7.292115e-5;

/// Mean radius of the earth (m).
pub const EARTH_RADIUS: f64 = 6_371_008.7714;

/// Newtonian gravitational constant (m³ kg⁻¹ s⁻²).
pub const GRAV_CONSTANT: f64 = 6.6743e-11;

/// Geocentric gravitational constant (m³ s⁻²).
pub const GM: f64 = 3.986_004_418e14;

/// Mass of the earth (kg).
pub const EARTH_MASS: f64 = GM / GRAV_CONSTANT;

/// Reference pressure for potential temperature (hPa).
pub const P0: f64 = 1000.0;

/// Freezing point of water (K).
pub const ZERO_C: f64 = 273.15;
