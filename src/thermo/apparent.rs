//! Apparent temperature indexes for how the weather feels to people.
use metfor::{Celsius, Fahrenheit, Kelvin, MetersPSec, Quantity, Temperature};
use optional::{none, some, Optioned};

/// Heat index from the temperature and relative humidity (0.0 to 1.0).
///
/// Uses the Rothfusz regression of the National Weather Service, with the simpler formula when
/// it is below 79°F and the adjustments for low and high humidity. Temperatures at or below
/// 40°F are passed through. When `mask_undefined` is set, the heat index is missing for
/// temperatures below 80°F.
///
/// # Examples
///
/// ```rust
/// use metcalc::heat_index;
/// use metfor::{Fahrenheit, Quantity};
///
/// let hi = heat_index(Fahrenheit(92.0), 0.7, true).unwrap();
/// assert!((hi.unpack() - 112.2).abs() < 0.1);
///
/// assert!(heat_index(Fahrenheit(70.0), 0.7, true).is_none());
/// ```
pub fn heat_index<T>(temperature: T, relative_humidity: f64, mask_undefined: bool) -> Optioned<Fahrenheit>
where
    T: Temperature,
    Fahrenheit: From<T>,
{
    let t = Fahrenheit::from(temperature).unpack();
    let rh = relative_humidity;

    if mask_undefined && t < 80.0 {
        return none();
    }

    if t <= 40.0 {
        return some(Fahrenheit(t));
    }

    let simple = -10.3 + 1.1 * t + 4.7 * rh;

    let mut hi = if simple < 79.0 {
        simple
    } else {
        let t2 = t * t;
        let rh2 = rh * rh;
        -42.379 + 2.049_015_23 * t + 1014.333_127 * rh
            - 22.475_541 * t * rh
            - 6.837_83e-3 * t2
            - 5.481_717e2 * rh2
            + 1.228_74e-1 * t2 * rh
            + 8.5282 * t * rh2
            - 1.99e-2 * t2 * rh2
    };

    if rh <= 0.13 && t >= 80.0 && t <= 112.0 {
        hi -= (13.0 - rh * 100.0) / 4.0 * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt();
    }

    if rh > 0.85 && t >= 80.0 && t <= 87.0 {
        hi += 0.02 * (rh * 100.0 - 85.0) * (87.0 - t);
    }

    some(Fahrenheit(hi))
}

/// Wind chill temperature with the 2001 formula of the National Weather Service.
///
/// Winds are assumed measured at 10 m. Set `face_level_winds` if they were measured at face
/// level and they are scaled up by 1.5. When `mask_undefined` is set the wind chill is missing
/// for temperatures above 10°C or wind speeds at or below 3 mph.
pub fn windchill<T>(
    temperature: T,
    speed: MetersPSec,
    face_level_winds: bool,
    mask_undefined: bool,
) -> Optioned<Celsius>
where
    T: Temperature,
    Celsius: From<T>,
{
    const THREE_MPH: f64 = 3.0 * 0.447_04;

    let t = Celsius::from(temperature).unpack();
    let mut speed = speed.unpack();
    if face_level_winds {
        speed *= 1.5;
    }

    if mask_undefined && (t > 10.0 || speed <= THREE_MPH) {
        return none();
    }

    let speed_factor = (speed * 3.6).powf(0.16);
    some(Celsius(
        13.12 + 0.6215 * t + (0.3965 * t - 11.37) * speed_factor,
    ))
}

/// Apparent temperature: the wind chill where it is defined, otherwise the heat index where it
/// is defined.
///
/// When neither applies, the result is missing if `mask_undefined` is set, otherwise it is the
/// air temperature.
pub fn apparent_temperature<T>(
    temperature: T,
    relative_humidity: f64,
    speed: MetersPSec,
    face_level_winds: bool,
    mask_undefined: bool,
) -> Optioned<Celsius>
where
    T: Temperature,
    Kelvin: From<T>,
{
    let t = Kelvin::from(temperature);

    let wind_chill = windchill(t, speed, face_level_winds, true);
    if wind_chill.is_some() {
        return wind_chill;
    }

    let hi = heat_index(t, relative_humidity, true);
    if let Some(hi) = hi.into_option() {
        return some(Celsius::from(hi));
    }

    if mask_undefined {
        none()
    } else {
        some(Celsius::from(t))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::*;

    fn mph(val: f64) -> MetersPSec {
        MetersPSec(val * 0.447_04)
    }

    #[test]
    fn test_heat_index() {
        let temps = [80.0, 88.0, 92.0, 110.0, 86.0];
        let rh = [0.40, 1.0, 0.70, 0.40, 0.88];
        let expected = [79.93, 121.21, 112.18, 135.66, 104.19];

        for ((&t, &rh), &e) in temps.iter().zip(&rh).zip(&expected) {
            let hi = heat_index(Fahrenheit(t), rh, true).unpack().unpack();
            assert!(approx_equal(hi, e, 0.01), "{} vs {}", hi, e);
        }
    }

    #[test]
    fn test_heat_index_undefined() {
        assert!(heat_index(Fahrenheit(75.0), 0.1, true).is_none());

        let hi = heat_index(Fahrenheit(75.0), 0.1, false).unpack().unpack();
        assert!(approx_equal(hi, 72.67, 0.01));

        // Cold temperatures pass through
        let hi = heat_index(Fahrenheit(35.0), 0.5, false).unpack().unpack();
        assert!(approx_equal(hi, 35.0, 1.0e-12));
    }

    #[test]
    fn test_heat_index_low_humidity_adjustment() {
        let hi = heat_index(Fahrenheit(100.0), 0.1, true).unpack().unpack();
        assert!(approx_equal(hi, 94.12, 0.01), "{}", hi);
    }

    #[test]
    fn test_windchill() {
        let temps = [40.0, -10.0, -45.0, 20.0];
        let speeds = [5.0, 55.0, 25.0, 15.0];
        let expected = [36.44, -46.54, -84.34, 6.18];

        for ((&t, &s), &e) in temps.iter().zip(&speeds).zip(&expected) {
            let wc = windchill(Fahrenheit(t), mph(s), false, true);
            let wc = Fahrenheit::from(wc.unpack()).unpack();
            assert!(approx_equal(wc, e, 0.01), "{} vs {}", wc, e);
        }
    }

    #[test]
    fn test_windchill_undefined() {
        assert!(windchill(Celsius(15.0), MetersPSec(10.0), false, true).is_none());
        assert!(windchill(Celsius(-5.0), mph(2.0), false, true).is_none());

        // Face level winds push the speed over the threshold
        assert!(windchill(Celsius(-5.0), mph(2.5), true, true).is_some());
        assert!(windchill(Celsius(15.0), MetersPSec(10.0), false, false).is_some());
    }

    #[test]
    fn test_apparent_temperature() {
        // Wind chill
        let at = apparent_temperature(Fahrenheit(-10.0), 0.5, mph(55.0), false, true).unpack();
        assert!(approx_equal(Fahrenheit::from(at).unpack(), -46.54, 0.01));

        // Heat index
        let at = apparent_temperature(Fahrenheit(92.0), 0.7, mph(5.0), false, true).unpack();
        assert!(approx_equal(Fahrenheit::from(at).unpack(), 112.18, 0.01));

        // Neither
        assert!(apparent_temperature(Fahrenheit(60.0), 0.5, mph(10.0), false, true).is_none());
        let at = apparent_temperature(Fahrenheit(60.0), 0.5, mph(10.0), false, false).unpack();
        assert!(approx_equal(Fahrenheit::from(at).unpack(), 60.0, 1.0e-9));
    }
}
