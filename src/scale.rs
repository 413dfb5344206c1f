//! Musical scales as ordered frequency-ratio sequences.
//!
//! Index 0 of [`Scale::steps`] is always the implicit unison `1/1`; step `n`
//! is the ratio of the `n`th scale degree to the unison. The last step is the
//! period (usually the octave) at which the pattern repeats.

use serde::{Serialize, Serializer};

use crate::errors::{ScaleError, ScaleReport, SourceContext};

/// One scale degree as a `num/denom` frequency ratio.
///
/// Components are `f64` because equal-temperament steps are irrational and
/// cents values convert to non-integer numerators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Step {
    pub num: f64,
    pub denom: f64,
}

impl Step {
    pub const UNISON: Step = Step {
        num: 1.0,
        denom: 1.0,
    };

    /// Placeholder for a step that could not be parsed.
    pub const INVALID: Step = Step {
        num: f64::NAN,
        denom: f64::NAN,
    };

    pub const fn new(num: f64, denom: f64) -> Self {
        Step { num, denom }
    }

    pub fn is_valid(self) -> bool {
        !self.num.is_nan() && !self.denom.is_nan() && self.denom != 0.0
    }

    pub fn ratio(self) -> f64 {
        self.num / self.denom
    }

    /// Size of this step above the unison in cents.
    pub fn cents(self) -> f64 {
        1200.0 * self.ratio().log2()
    }
}

/// A scale: title, step list and every error met while building it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scale {
    pub title: String,
    pub steps: Vec<Step>,
    #[serde(serialize_with = "error_messages")]
    pub errors: Vec<ScaleError>,
}

impl Default for Scale {
    fn default() -> Self {
        Scale {
            title: String::new(),
            steps: vec![Step::UNISON],
            errors: Vec::new(),
        }
    }
}

impl Scale {
    /// An empty scale holding only the implicit unison.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ScaleError) -> &mut Self {
        crate::log::warn!(%error, "scale error");
        self.errors.push(error);
        self
    }

    /// Append a step. A NaN component or zero denominator records
    /// [`ScaleError::InvalidStep`] and appends [`Step::INVALID`] so the step
    /// count still matches the input.
    pub fn add_step(&mut self, num: f64, denom: f64) -> &mut Self {
        if num.is_nan() || denom.is_nan() || denom == 0.0 {
            self.add_error(ScaleError::InvalidStep { num, denom });
            self.steps.push(Step::INVALID);
        } else {
            self.steps.push(Step::new(num, denom));
        }
        self
    }

    /// Number of steps in one period, excluding the unison.
    pub fn tones(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Equal temperament: `tones` equal divisions of `octave`.
    ///
    /// Stores the single step `octave^(1/tones) : 1`; the engine repeats it
    /// for every fret. `tones` need not be an integer.
    pub fn equal_temperament(tones: f64, octave: f64) -> Scale {
        let mut scale = Scale::new();
        if tones == 0.0 || !tones.is_finite() {
            scale.add_error(ScaleError::InvalidTones { tones });
            return scale;
        }
        scale.add_step(octave.powf(1.0 / tones), 1.0);
        scale.title = format!("{} root of {} Equal Temperament", tones, octave);
        scale
    }

    /// Twelve-tone equal temperament over the 2/1 octave.
    pub fn twelve_tet() -> Scale {
        Scale::equal_temperament(12.0, 2.0)
    }

    /// Bundle this scale's errors into a diagnostic over `source`.
    ///
    /// Returns `None` for a scale without errors.
    pub fn report(&self, source: &SourceContext) -> Option<ScaleReport> {
        if self.errors.is_empty() {
            return None;
        }
        Some(ScaleReport {
            title: self.title.clone(),
            count: self.errors.len(),
            src: source.named_source(),
            errors: self.errors.clone(),
        })
    }
}

fn error_messages<S: Serializer>(errors: &[ScaleError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}
