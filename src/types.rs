//! Numeric primitives shared by the layout builder and the fret engine.
//!
//! Raw `f64` coordinates flow through the geometry layer so NaN can propagate.
//! User-supplied dimensions enter through [`Length`], which rejects NaN and
//! infinity before they reach any geometry.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is negative when non-negative required
    Negative,
    /// Value is zero or negative when positive required
    NotPositive,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Negative => write!(f, "value is negative"),
            NumericError::NotPositive => write!(f, "value is not positive"),
        }
    }
}

impl std::error::Error for NumericError {}

/// A physical length in instrument units (see [`Units`]).
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Length(pub f64);

impl Length {
    /// Create a Length with validation (rejects NaN/infinite)
    #[inline]
    pub fn try_new(val: f64) -> Result<Length, NumericError> {
        if val.is_nan() {
            Err(NumericError::NaN)
        } else if val.is_infinite() {
            Err(NumericError::Infinite)
        } else {
            Ok(Length(val))
        }
    }

    /// Create a non-negative Length with validation
    #[inline]
    pub fn try_non_negative(val: f64) -> Result<Length, NumericError> {
        let len = Length::try_new(val)?;
        if len.0 < 0.0 {
            Err(NumericError::Negative)
        } else {
            Ok(len)
        }
    }

    /// Create a strictly positive Length with validation
    #[inline]
    pub fn try_positive(val: f64) -> Result<Length, NumericError> {
        let len = Length::try_new(val)?;
        if len.0 <= 0.0 {
            Err(NumericError::NotPositive)
        } else {
            Ok(len)
        }
    }

    /// Get the raw value
    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit label carried alongside a design. Coordinates are never converted;
/// the label only tells renderers what the numbers mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub enum Units {
    #[default]
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "mm")]
    Millimeters,
}

impl Units {
    pub fn label(self) -> &'static str {
        match self {
            Units::Inches => "in",
            Units::Centimeters => "cm",
            Units::Millimeters => "mm",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a unit label is not one of `in`, `cm`, `mm`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit `{0}` (expected in, cm or mm)")]
pub struct UnknownUnit(pub String);

impl FromStr for Units {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in" | "inch" | "inches" => Ok(Units::Inches),
            "cm" => Ok(Units::Centimeters),
            "mm" => Ok(Units::Millimeters),
            other => Err(UnknownUnit(other.to_string())),
        }
    }
}

/// Axis-aligned bounding box of a computed fretboard.
///
/// The all-zero default doubles as the "nothing to draw" box.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct Extents {
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
    pub width: f64,
    pub height: f64,
}

/// Accumulates points into [`Extents`], ignoring NaN coordinates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ExtentsBuilder {
    minx: f64,
    maxx: f64,
    miny: f64,
    maxy: f64,
}

impl ExtentsBuilder {
    pub(crate) fn new() -> Self {
        ExtentsBuilder {
            minx: f64::INFINITY,
            maxx: f64::NEG_INFINITY,
            miny: f64::INFINITY,
            maxy: f64::NEG_INFINITY,
        }
    }

    /// Expand to include a point. `f64::min`/`max` skip NaN operands.
    pub(crate) fn expand(&mut self, x: f64, y: f64) {
        self.minx = self.minx.min(x);
        self.maxx = self.maxx.max(x);
        self.miny = self.miny.min(y);
        self.maxy = self.maxy.max(y);
    }

    pub(crate) fn finish(self) -> Extents {
        if !(self.minx.is_finite()
            && self.maxx.is_finite()
            && self.miny.is_finite()
            && self.maxy.is_finite())
        {
            return Extents::default();
        }
        Extents {
            minx: self.minx,
            maxx: self.maxx,
            miny: self.miny,
            maxy: self.maxy,
            width: self.maxx - self.minx,
            height: self.maxy - self.miny,
        }
    }
}

/// Decimal places used when formatting coordinates for display.
pub const DISPLAY_PRECISION: i32 = 5;

/// Round to `places` decimal places. NaN stays NaN.
pub fn round_float(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
