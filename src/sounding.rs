//! Data type and methods to store an atmospheric sounding.

use crate::error::{AnalysisError, Result};
use itertools::izip;
use metfor::{Celsius, HectoPascal, Meters, MetersPSec, Quantity, WindUV};
use optional::Optioned;

pub use self::data_row::DataRow;

/// All the variables stored in the sounding.
///
/// The upper air profile variables are stored in parallel vectors ordered from the lowest level
/// upward. If a profile lacks a certain variable, e.g. wind, that whole vector has length 0
/// instead of being full of missing values.
///
#[derive(Clone, Debug, Default)]
pub struct Sounding {
    // Description of the source of the sounding.
    source: Option<String>,

    // Profiles
    pressure: Vec<Optioned<HectoPascal>>,
    height: Vec<Optioned<Meters>>,
    temperature: Vec<Optioned<Celsius>>,
    dew_point: Vec<Optioned<Celsius>>,
    wind: Vec<Optioned<WindUV<MetersPSec>>>,
}

/// The wind profile of a sounding with incomplete rows removed.
#[derive(Clone, Debug, Default)]
pub struct WindColumns {
    /// Pressure levels.
    pub pressure: Vec<HectoPascal>,
    /// Heights of the levels, if the sounding has a height profile.
    pub height: Option<Vec<Meters>>,
    /// East-west wind component.
    pub u: Vec<MetersPSec>,
    /// North-south wind component.
    pub v: Vec<MetersPSec>,
}

macro_rules! make_profile_setter {
    ($(#[$attr:meta])* => $name:tt, $inner_type:tt, $p_var:ident) => {
        $(#[$attr])*
        pub fn $name(self, profile: Vec<Optioned<$inner_type>>) -> Self {
            Self {$p_var: profile, ..self}
        }
    };
}

impl Sounding {
    /// Create a new sounding with default values. This is a proxy for default with a clearer name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metcalc::Sounding;
    ///
    /// let snd = Sounding::new();
    /// println!("{:?}", snd);
    /// ```
    #[inline]
    pub fn new() -> Self {
        Sounding::default()
    }

    /// Add a source description to this sounding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metcalc::Sounding;
    ///
    /// let snd = Sounding::new().with_source_description("An empty sounding.".to_owned());
    /// let snd = snd.with_source_description(
    ///     Some("Still empty, just added a description.".to_owned()),
    /// );
    /// let _snd = snd.with_source_description(None);
    ///
    /// ```
    #[inline]
    pub fn with_source_description<S>(mut self, desc: S) -> Self
    where
        Option<String>: From<S>,
    {
        self.source = Option::from(desc);
        self
    }

    /// Retrieve a source description for this sounding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metcalc::Sounding;
    ///
    /// let snd = Sounding::new().with_source_description("An empty sounding.".to_owned());
    /// assert_eq!(snd.source_description().unwrap(), "An empty sounding.");
    ///
    /// let snd = snd.with_source_description(None);
    /// assert!(snd.source_description().is_none());
    ///
    /// ```
    #[inline]
    pub fn source_description(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.as_ref())
    }

    make_profile_setter!(
        /// Builder method for the pressure profile.
        ///
        /// # Examples
        /// ```rust
        /// use metcalc::Sounding;
        /// use metfor::HectoPascal;
        /// use optional::{some, Optioned};
        ///
        /// let data = vec![1000.0, 925.0, 850.0, 700.0, 500.0, 300.0, 250.0, 200.0, 150.0, 100.0];
        /// let pressure_data: Vec<Optioned<HectoPascal>> = data.into_iter()
        ///     .map(HectoPascal)
        ///     .map(some)
        ///     .collect();
        ///
        /// let _snd = Sounding::new()
        ///     .with_pressure_profile(pressure_data);
        /// ```
        #[inline]
        => with_pressure_profile, HectoPascal, pressure
    );

    /// Get the pressure profile
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metcalc::Sounding;
    /// # use metcalc::doctest::make_test_sounding;
    ///
    /// let snd = make_test_sounding();
    /// let data = snd.pressure_profile();
    ///
    /// for p in data {
    ///     if let Some(p) = p.into_option() {
    ///         println!("{:?}", p);
    ///     } else {
    ///         println!("missing value!");
    ///     }
    /// }
    ///
    /// // Uninitialized profiles just return an empty vector.
    /// let snd = Sounding::new();
    /// let data = snd.pressure_profile();
    /// assert!(data.is_empty());
    ///
    /// ```
    #[inline]
    pub fn pressure_profile(&self) -> &[Optioned<HectoPascal>] {
        &self.pressure
    }

    make_profile_setter!(
        /// Builder method for the geopotential height profile.
        ///
        /// See `with_pressure_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_height_profile, Meters, height
    );

    /// Get the geopotential height profile.
    ///
    /// See `pressure_profile` for an example of using getters, keeping in mind the units type may
    /// be different.
    #[inline]
    pub fn height_profile(&self) -> &[Optioned<Meters>] {
        &self.height
    }

    make_profile_setter!(
        /// Builder method for the temperature profile.
        ///
        /// See `with_pressure_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_temperature_profile, Celsius, temperature
    );

    /// Get the temperature profile.
    ///
    /// See `pressure_profile` for an example of using getters, keeping in mind the units type may
    /// be different.
    #[inline]
    pub fn temperature_profile(&self) -> &[Optioned<Celsius>] {
        &self.temperature
    }

    make_profile_setter!(
        /// Builder method for the dew point profile.
        ///
        /// See `with_pressure_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_dew_point_profile, Celsius, dew_point
    );

    /// Get the dew point profile.
    ///
    /// See `pressure_profile` for an example of using getters, keeping in mind the units type may
    /// be different.
    #[inline]
    pub fn dew_point_profile(&self) -> &[Optioned<Celsius>] {
        &self.dew_point
    }

    /// Builder method for the wind profile. Any wind type convertible to u-v components in m/s
    /// is accepted.
    ///
    /// # Examples
    ///```rust
    /// use metcalc::Sounding;
    /// use metfor::{Knots, MetersPSec, WindSpdDir, WindUV};
    /// use optional::{none, some};
    ///
    /// let _snd = Sounding::new().with_wind_profile(vec![
    ///     some(WindSpdDir { speed: Knots(10.0), direction: 270.0 }),
    ///     none(),
    /// ]);
    ///
    /// let _snd = Sounding::new().with_wind_profile(vec![
    ///     some(WindUV { u: MetersPSec(-7.3), v: MetersPSec(5.2) }),
    /// ]);
    ///```
    #[inline]
    pub fn with_wind_profile<U>(self, profile: Vec<Optioned<U>>) -> Self
    where
        U: optional::Noned + Copy,
        WindUV<MetersPSec>: From<U>,
    {
        let wind = profile
            .into_iter()
            .map(|w| w.map_t(WindUV::<MetersPSec>::from))
            .collect();

        Self { wind, ..self }
    }

    /// Get the wind profile.
    ///
    /// See `pressure_profile` for an example of using getters, keeping in mind the units type may
    /// be different.
    #[inline]
    pub fn wind_profile(&self) -> &[Optioned<WindUV<MetersPSec>>] {
        &self.wind
    }

    /// Get a bottom up iterator over the data rows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::{HectoPascal, Celsius};
    /// use optional::some;
    /// use metcalc::Sounding;
    ///
    /// let pres: Vec<_> = vec![1000.0, 925.0, 850.0].into_iter()
    ///     .map(HectoPascal).map(some).collect();
    /// let temps: Vec<_> = vec![20.0, 18.0, 17.0].into_iter()
    ///     .map(Celsius).map(some).collect();
    ///
    /// let snd = Sounding::new()
    ///     .with_pressure_profile(pres)
    ///     .with_temperature_profile(temps);
    ///
    /// let mut iter = snd.bottom_up();
    ///
    /// let mut row = iter.next().unwrap();
    /// assert_eq!(row.pressure.unwrap(), HectoPascal(1000.0));
    /// assert_eq!(row.temperature.unwrap(), Celsius(20.0));
    /// assert!(row.wind.is_none()); // We never set wind profile.
    ///
    /// row = iter.next().unwrap();
    /// assert_eq!(row.pressure.unwrap(), HectoPascal(925.0));
    /// assert_eq!(row.temperature.unwrap(), Celsius(18.0));
    ///
    /// row = iter.next().unwrap();
    /// assert_eq!(row.pressure.unwrap(), HectoPascal(850.0));
    /// assert_eq!(row.temperature.unwrap(), Celsius(17.0));
    ///
    /// let row_opt = iter.next();
    /// assert!(row_opt.is_none());
    /// ```
    #[inline]
    pub fn bottom_up<'a>(&'a self) -> impl Iterator<Item = DataRow> + 'a {
        ProfileIterator {
            next_idx: 0,
            direction: 1,
            src: self,
        }
    }

    /// Get a top down iterator over the data rows. The last value returned is the lowest level.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::{HectoPascal, Celsius};
    /// use optional::some;
    /// use metcalc::Sounding;
    ///
    /// let pres: Vec<_> = vec![1000.0, 925.0, 850.0].into_iter()
    ///     .map(HectoPascal).map(some).collect();
    /// let temps: Vec<_> = vec![20.0, 18.0, 17.0].into_iter()
    ///     .map(Celsius).map(some).collect();
    ///
    /// let snd = Sounding::new()
    ///     .with_pressure_profile(pres)
    ///     .with_temperature_profile(temps);
    ///
    /// let mut iter = snd.top_down();
    ///
    /// let mut row = iter.next().unwrap();
    /// assert_eq!(row.pressure.unwrap(), HectoPascal(850.0));
    /// assert_eq!(row.temperature.unwrap(), Celsius(17.0));
    ///
    /// row = iter.next().unwrap();
    /// assert_eq!(row.pressure.unwrap(), HectoPascal(925.0));
    ///
    /// row = iter.next().unwrap();
    /// assert_eq!(row.pressure.unwrap(), HectoPascal(1000.0));
    ///
    /// assert!(iter.next().is_none());
    /// ```
    #[inline]
    pub fn top_down<'a>(&'a self) -> impl Iterator<Item = DataRow> + 'a {
        ProfileIterator {
            next_idx: self.pressure.len() as isize - 1,
            direction: -1,
            src: self,
        }
    }

    /// Get a row of data values from this sounding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::{HectoPascal, Celsius};
    /// use optional::some;
    /// use metcalc::Sounding;
    ///
    /// let pres: Vec<_> = vec![1000.0, 925.0, 850.0].into_iter()
    ///     .map(HectoPascal).map(some).collect();
    /// let temps: Vec<_> = vec![20.0, 18.0, 17.0].into_iter()
    ///     .map(Celsius).map(some).collect();
    ///
    /// let snd = Sounding::new()
    ///     .with_pressure_profile(pres)
    ///     .with_temperature_profile(temps);
    ///
    /// let row = snd.data_row(0).unwrap();
    /// assert_eq!(row.pressure.unwrap(), HectoPascal(1000.0));
    /// assert_eq!(row.temperature.unwrap(), Celsius(20.0));
    /// assert!(row.dew_point.is_none()); // We never set a dew point profile.
    ///
    /// assert!(snd.data_row(3).is_none()); // There weren't that many rows!
    /// ```
    #[inline]
    pub fn data_row(&self, idx: usize) -> Option<DataRow> {
        macro_rules! copy_to_result {
            ($result:ident, $profile:ident, $idx:ident) => {
                match self.$profile.get($idx) {
                    None => {}
                    Some(opt_val) => $result.$profile = *opt_val,
                }
            };
        }

        if idx >= self.pressure.len() {
            return None;
        }

        let mut result = DataRow::default();

        copy_to_result!(result, pressure, idx);
        copy_to_result!(result, height, idx);
        copy_to_result!(result, temperature, idx);
        copy_to_result!(result, dew_point, idx);
        copy_to_result!(result, wind, idx);

        Some(result)
    }

    /// Get the lowest level in a `DataRow` format.
    #[inline]
    pub fn surface_as_data_row(&self) -> Option<DataRow> {
        self.data_row(0)
    }

    /// Given a target pressure, return the row of data values closest to this one.
    pub fn fetch_nearest_pnt<P>(&self, target_p: P) -> Option<DataRow>
    where
        HectoPascal: From<P>,
        P: metfor::Pressure,
    {
        let tgt_p = HectoPascal::from(target_p);

        let idx = self
            .pressure
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.into_option().map(|p| (i, std::ops::Sub::<HectoPascal>::sub(tgt_p, p).unpack().abs())))
            .fold(None, |best: Option<(usize, f64)>, (i, diff)| match best {
                Some((_, best_diff)) if best_diff <= diff => best,
                _ => Some((i, diff)),
            })
            .map(|(i, _)| i)?;

        self.data_row(idx)
    }

    /// Check the sounding for internal consistency.
    ///
    /// A valid sounding has a pressure profile, every other non-empty profile has the same
    /// length as the pressure profile, pressure strictly decreases with height, and the dew point
    /// never exceeds the temperature.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metcalc::{AnalysisError, Sounding};
    /// # use metcalc::doctest::make_test_sounding;
    ///
    /// assert!(make_test_sounding().validate().is_ok());
    /// assert_eq!(Sounding::new().validate(), Err(AnalysisError::MissingProfile));
    /// ```
    pub fn validate(&self) -> Result<()> {
        let len = self.pressure.len();
        if len == 0 {
            return Err(AnalysisError::MissingProfile);
        }

        let lengths = [
            self.height.len(),
            self.temperature.len(),
            self.dew_point.len(),
            self.wind.len(),
        ];
        if lengths.iter().any(|&l| l != 0 && l != len) {
            return Err(AnalysisError::MismatchedLengths);
        }

        let decreasing = self
            .pressure
            .iter()
            .filter_map(|p| p.into_option())
            .try_fold(std::f64::INFINITY, |prev, p| {
                let p = p.unpack();
                if p < prev {
                    Some(p)
                } else {
                    None
                }
            })
            .is_some();
        if !decreasing {
            return Err(AnalysisError::InvalidInput(
                "pressure must decrease with height",
            ));
        }

        let dew_point_ok = izip!(&self.temperature, &self.dew_point)
            .filter(|(t, dp)| t.is_some() && dp.is_some())
            .all(|(t, dp)| dp.unpack().unpack() <= t.unpack().unpack() + 1.0e-6);
        if !dew_point_ok {
            return Err(AnalysisError::InvalidInput(
                "dew point exceeds temperature",
            ));
        }

        Ok(())
    }

    /// Get the pressure, temperature, and dew point columns with every row missing any of these
    /// values removed.
    pub fn pressure_temperature_dew_point(
        &self,
    ) -> Result<(Vec<HectoPascal>, Vec<Celsius>, Vec<Celsius>)> {
        if self.pressure.is_empty() || self.temperature.is_empty() || self.dew_point.is_empty() {
            return Err(AnalysisError::MissingProfile);
        }

        let mut pressure = Vec::with_capacity(self.pressure.len());
        let mut temperature = Vec::with_capacity(self.pressure.len());
        let mut dew_point = Vec::with_capacity(self.pressure.len());

        izip!(&self.pressure, &self.temperature, &self.dew_point)
            .filter(|(p, t, dp)| p.is_some() && t.is_some() && dp.is_some())
            .for_each(|(p, t, dp)| {
                pressure.push(p.unpack());
                temperature.push(t.unpack());
                dew_point.push(dp.unpack());
            });

        if pressure.is_empty() {
            return Err(AnalysisError::NoDataProfile);
        }

        Ok((pressure, temperature, dew_point))
    }

    /// Get the pressure, height, and dew point columns along with the height profile if one is
    /// present. Rows missing any of these values are removed.
    pub(crate) fn thermo_columns_with_height(
        &self,
    ) -> Result<(Vec<HectoPascal>, Vec<Celsius>, Vec<Celsius>, Option<Vec<Meters>>)> {
        if self.height.is_empty() {
            let (p, t, dp) = self.pressure_temperature_dew_point()?;
            return Ok((p, t, dp, None));
        }

        if self.pressure.is_empty() || self.temperature.is_empty() || self.dew_point.is_empty() {
            return Err(AnalysisError::MissingProfile);
        }

        let mut pressure = Vec::with_capacity(self.pressure.len());
        let mut temperature = Vec::with_capacity(self.pressure.len());
        let mut dew_point = Vec::with_capacity(self.pressure.len());
        let mut height = Vec::with_capacity(self.pressure.len());

        izip!(&self.pressure, &self.temperature, &self.dew_point, &self.height)
            .filter(|(p, t, dp, h)| p.is_some() && t.is_some() && dp.is_some() && h.is_some())
            .for_each(|(p, t, dp, h)| {
                pressure.push(p.unpack());
                temperature.push(t.unpack());
                dew_point.push(dp.unpack());
                height.push(h.unpack());
            });

        if pressure.is_empty() {
            return Err(AnalysisError::NoDataProfile);
        }

        Ok((pressure, temperature, dew_point, Some(height)))
    }

    /// Get the wind profile split into components with incomplete rows removed. If the sounding
    /// has a height profile, rows missing a height are also removed.
    pub fn wind_columns(&self) -> Result<WindColumns> {
        if self.pressure.is_empty() || self.wind.is_empty() {
            return Err(AnalysisError::MissingProfile);
        }

        let has_height = !self.height.is_empty();
        let missing_height: Optioned<Meters> = Optioned::default();

        let mut cols = WindColumns {
            height: if has_height { Some(vec![]) } else { None },
            ..WindColumns::default()
        };

        for (i, (p, w)) in self.pressure.iter().zip(&self.wind).enumerate() {
            let h = if has_height {
                *self.height.get(i).unwrap_or(&missing_height)
            } else {
                missing_height
            };

            if p.is_none() || w.is_none() || (has_height && h.is_none()) {
                continue;
            }

            let WindUV { u, v } = w.unpack();
            cols.pressure.push(p.unpack());
            cols.u.push(u);
            cols.v.push(v);
            if let Some(ref mut hgt) = cols.height {
                hgt.push(h.unpack());
            }
        }

        if cols.pressure.is_empty() {
            return Err(AnalysisError::NoDataProfile);
        }

        Ok(cols)
    }
}

/// Iterator over the data rows of a sounding. This may be a top down or bottom up iterator.
struct ProfileIterator<'a> {
    next_idx: isize,
    direction: isize, // +1 for bottom up, -1 for top down
    src: &'a Sounding,
}

impl<'a> Iterator for ProfileIterator<'a> {
    type Item = DataRow;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.next_idx < 0 {
            return None;
        }

        let result = self.src.data_row(self.next_idx as usize);
        self.next_idx += self.direction;
        result
    }
}

#[doc(hidden)]
pub mod doctest {
    use super::*;

    pub fn make_test_sounding() -> super::Sounding {
        use optional::some;

        let p = vec![
            some(HectoPascal(1000.0)),
            some(HectoPascal(925.0)),
            some(HectoPascal(850.0)),
            some(HectoPascal(700.0)),
        ];
        let t = vec![
            some(Celsius(20.0)),
            some(Celsius(18.0)),
            some(Celsius(10.0)),
            some(Celsius(2.0)),
        ];
        let dp = vec![
            some(Celsius(15.0)),
            some(Celsius(12.0)),
            some(Celsius(1.0)),
            some(Celsius(-8.0)),
        ];

        Sounding::new()
            .with_pressure_profile(p)
            .with_temperature_profile(t)
            .with_dew_point_profile(dp)
    }
}


mod data_row;
