//! Semantic unit types for the boundary between external layers and the engine
//!
//! The spread engine works in one unit system (kilograms, meters, seconds,
//! kilojoules). Raster producers frequently hand over pixel scale and
//! elevation in feet, so these newtypes make the single conversion point
//! explicit and keep raw `f64` values from being mixed.
//!
//! # Usage
//! ```
//! use fire_spread_core::core_types::units::{Feet, Meters};
//!
//! let cell: Meters = Feet::new(50.0).into();
//! assert!((*cell - 15.24).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Sub};

/// Meters per foot (international foot)
const METERS_PER_FOOT: f64 = 0.3048;

/// Shared boilerplate for `f64` newtypes: total ordering, `Deref`, raw
/// conversions and `Display` with a unit suffix.
macro_rules! scalar_unit {
    ($name:ident, $suffix:literal) => {
        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.2} {}", self.0, $suffix)
            }
        }

        impl $name {
            /// Get the raw value
            #[inline]
            #[must_use]
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

// ============================================================================
// LENGTH TYPES
// ============================================================================

/// Distance in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(f64);

scalar_unit!(Meters, "m");

impl Meters {
    /// Create a new distance in meters
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Meters::new: negative distance is invalid");
        Meters(value)
    }

    /// Convert to feet
    #[inline]
    #[must_use]
    pub fn to_feet(self) -> Feet {
        Feet(self.0 / METERS_PER_FOOT)
    }
}

/// Distance in (international) feet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Feet(f64);

scalar_unit!(Feet, "ft");

impl Feet {
    /// Create a new distance in feet
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Feet::new: negative distance is invalid");
        Feet(value)
    }

    /// Convert to meters
    #[inline]
    #[must_use]
    pub fn to_meters(self) -> Meters {
        Meters(self.0 * METERS_PER_FOOT)
    }
}

impl From<Feet> for Meters {
    fn from(v: Feet) -> Meters {
        v.to_meters()
    }
}

/// Signed elevation in meters above a datum
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Elevation(f64);

scalar_unit!(Elevation, "m");

impl Elevation {
    /// Create an elevation in meters (may be negative)
    #[inline]
    #[must_use]
    pub const fn meters(value: f64) -> Self {
        Elevation(value)
    }

    /// Create an elevation from a value in feet
    #[inline]
    #[must_use]
    pub fn feet(value: f64) -> Self {
        Elevation(value * METERS_PER_FOOT)
    }
}

impl Sub for Elevation {
    type Output = f64;
    fn sub(self, rhs: Elevation) -> f64 {
        self.0 - rhs.0
    }
}

// ============================================================================
// TIME TYPES
// ============================================================================

/// Duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Seconds(f64);

scalar_unit!(Seconds, "s");

impl Seconds {
    /// Create a new duration in seconds
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Seconds::new: negative duration is invalid");
        Seconds(value)
    }

    /// Create from minutes
    #[inline]
    #[must_use]
    pub fn from_minutes(minutes: f64) -> Self {
        Self::new(minutes * 60.0)
    }

    /// Create from hours
    #[inline]
    #[must_use]
    pub fn from_hours(hours: f64) -> Self {
        Self::new(hours * 3600.0)
    }
}

impl Add for Seconds {
    type Output = Seconds;
    fn add(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 + rhs.0)
    }
}

impl From<std::time::Duration> for Seconds {
    fn from(d: std::time::Duration) -> Self {
        Seconds(d.as_secs_f64())
    }
}

// ============================================================================
// VELOCITY TYPES
// ============================================================================

/// Velocity in meters per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MetersPerSecond(f64);

scalar_unit!(MetersPerSecond, "m/s");

impl MetersPerSecond {
    /// Create a new speed in m/s
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "MetersPerSecond::new: negative speed is invalid");
        MetersPerSecond(value)
    }
}

// ============================================================================
// ANGLE / RATIO TYPES
// ============================================================================

/// Compass bearing in degrees, normalized to [0, 360)
///
/// 0° = North, 90° = East, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(f64);

scalar_unit!(Degrees, "°");

impl Degrees {
    /// Create a bearing, wrapping into [0, 360)
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Degrees(value.rem_euclid(360.0))
    }

    /// Bearing in radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// The opposite bearing
    #[inline]
    #[must_use]
    pub fn reversed(self) -> Self {
        Self::new(self.0 + 180.0)
    }
}

/// Dimensionless fraction, clamped to [0, 1] (moisture, probabilities)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Fraction(f64);

scalar_unit!(Fraction, "");

impl Fraction {
    /// Create a fraction, clamping to [0, 1]
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Fraction(value.clamp(0.0, 1.0))
    }

    /// Create from a percentage (0-100)
    #[inline]
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        Self::new(percent / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn feet_to_meters() {
        let m: Meters = Feet::new(100.0).into();
        assert_relative_eq!(*m, 30.48, epsilon = 1e-12);
        assert_relative_eq!(*m.to_feet(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn degrees_wrap() {
        assert_relative_eq!(*Degrees::new(-90.0), 270.0);
        assert_relative_eq!(*Degrees::new(720.0), 0.0);
        assert_relative_eq!(*Degrees::new(90.0).reversed(), 270.0);
    }

    #[test]
    fn fraction_clamps() {
        assert_eq!(*Fraction::new(1.5), 1.0);
        assert_eq!(*Fraction::new(-0.2), 0.0);
        assert_relative_eq!(*Fraction::from_percent(12.0), 0.12);
    }

    #[test]
    fn elevation_difference_is_signed() {
        let a = Elevation::meters(100.0);
        let b = Elevation::feet(100.0);
        assert_relative_eq!(a - b, 100.0 - 30.48, epsilon = 1e-9);
    }

    #[test]
    fn seconds_from_duration() {
        let s: Seconds = std::time::Duration::from_secs(7200).into();
        assert_eq!(s, Seconds::from_hours(2.0));
    }
}
