//! Error types with rich diagnostics using miette
//!
//! Scale errors are collected, not raised: a scale keeps every problem it
//! found and still hands the engine a (possibly NaN-laden) step list. Fret and
//! layout errors are structural and stop the computation.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::types::NumericError;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (filename or "<input>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }
}

// ============================================================================
// Scale Errors
// ============================================================================

/// A problem found while building a scale.
///
/// Line-level Scala errors carry the span of the offending token; the source
/// text itself is attached later by [`ScaleReport`].
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("invalid step ratio {num}/{denom}")]
    #[diagnostic(code(fretru::scale::invalid_step))]
    InvalidStep { num: f64, denom: f64 },

    #[error("number of tones must be non-zero and numeric, got {tones}")]
    #[diagnostic(code(fretru::scale::invalid_tones))]
    InvalidTones { tones: f64 },

    #[error("scala input is too short: missing title or tone count")]
    #[diagnostic(
        code(fretru::scale::too_short),
        help("a scala file needs a description line followed by a tone count line")
    )]
    TooShort,

    #[error("expected number of tones is not a valid number: `{found}`")]
    #[diagnostic(code(fretru::scale::invalid_tone_count))]
    InvalidToneCount {
        found: String,
        #[label("expected a non-negative integer")]
        span: Option<SourceSpan>,
    },

    #[error("expected {expected} tones but found {found}")]
    #[diagnostic(code(fretru::scale::tone_count_mismatch))]
    ToneCountMismatch {
        expected: usize,
        found: usize,
        #[label("declared here")]
        span: Option<SourceSpan>,
    },

    #[error("invalid cents value `{token}`")]
    #[diagnostic(code(fretru::scale::invalid_cents))]
    InvalidCents {
        token: String,
        #[label("not a number")]
        span: Option<SourceSpan>,
    },

    #[error("invalid ratio `{token}`")]
    #[diagnostic(
        code(fretru::scale::invalid_ratio),
        help("ratios are written as two integers, e.g. `3/2`")
    )]
    InvalidRatio {
        token: String,
        #[label("not an integer ratio")]
        span: Option<SourceSpan>,
    },

    #[error("invalid integer value `{token}`")]
    #[diagnostic(code(fretru::scale::invalid_integer))]
    InvalidInteger {
        token: String,
        #[label("not an integer")]
        span: Option<SourceSpan>,
    },

    #[error("negative or zero ratios are not allowed: `{token}`")]
    #[diagnostic(code(fretru::scale::non_positive_ratio))]
    NonPositiveRatio {
        token: String,
        #[label("must be positive")]
        span: Option<SourceSpan>,
    },
}

/// All errors of one scale, rendered against the Scala source they came from.
#[derive(Error, Diagnostic, Debug)]
#[error("scale `{title}` has {count} error(s)")]
#[diagnostic(code(fretru::scale::report))]
pub struct ScaleReport {
    pub title: String,
    pub count: usize,
    #[source_code]
    pub src: NamedSource<String>,
    #[related]
    pub errors: Vec<ScaleError>,
}

// ============================================================================
// Fret Errors
// ============================================================================

/// Structural problems with an instrument description.
///
/// Numeric degeneracy never shows up here; it stays in the computed data as
/// NaN or a documented fallback.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum FretError {
    #[error("instrument has no strings")]
    #[diagnostic(code(fretru::fret::no_strings))]
    NoStrings,

    #[error("scale has no steps")]
    #[diagnostic(
        code(fretru::fret::empty_scale),
        help("check the scale's error list; a failed scale produces no steps")
    )]
    EmptyScale,

    #[error("tuning has {tuning} entries but the instrument has {strings} strings")]
    #[diagnostic(code(fretru::fret::tuning_length))]
    TuningLength { strings: usize, tuning: usize },
}

// ============================================================================
// Layout Errors
// ============================================================================

/// Invalid parameters handed to the instrument layout builder.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("an instrument needs at least one string")]
    #[diagnostic(code(fretru::layout::no_strings))]
    NoStrings,

    #[error("invalid {field}: {source}")]
    #[diagnostic(code(fretru::layout::invalid_value))]
    InvalidValue {
        field: &'static str,
        value: f64,
        #[source]
        source: NumericError,
    },

    #[error("perpendicular fret position {value} is outside 0..=1")]
    #[diagnostic(
        code(fretru::layout::perpendicular_out_of_range),
        help("0 puts the perpendicular fret at the nut, 1 at the bridge")
    )]
    PerpendicularOutOfRange { value: f64 },

    #[error("{field} has {found} entries but the instrument has {strings} strings")]
    #[diagnostic(code(fretru::layout::count_mismatch))]
    CountMismatch {
        field: &'static str,
        strings: usize,
        found: usize,
    },
}
