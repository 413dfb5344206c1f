//! Fret placement for stringed instruments.
//!
//! Given string centrelines, fretboard edges, a scale and a tuning, compute
//! where every fret crosses every string, the per-string fret pieces
//! ("fretlets") for parallel and fanned fretboards, and the overall extents.
//!
//! ```
//! use fretru::{InstrumentLayout, Scale};
//!
//! let fretboard = InstrumentLayout::default()
//!     .with_fanned(25.5, 27.0, 0.5)
//!     .with_scale(Scale::twelve_tet())
//!     .fretboard()
//!     .unwrap();
//!
//! let twelfth = fretboard.fret(0, 12).unwrap();
//! assert!((twelfth.total_ratio - 0.5).abs() < 1e-9);
//! ```

pub mod errors;
pub mod fretboard;
pub mod geometry;
pub mod layout;
pub mod log;
pub mod scala;
pub mod scale;
pub mod types;

pub use errors::{FretError, LayoutError, ScaleError, ScaleReport, SourceContext};
pub use fretboard::{FretRecord, Fretboard, Instrument, fret_instrument};
pub use geometry::{Point, Segment, THRESHOLD};
pub use layout::{InstrumentLayout, LengthMode, Overhang, SpacingMode};
pub use scale::{Scale, Step};
pub use types::{Extents, Length, NumericError, Units};

/// Parse Scala text and turn any recorded errors into a diagnostic report.
///
/// `name` labels the source in the rendered report (usually a file name).
pub fn scala_scale(name: &str, source: &str) -> Result<Scale, ScaleReport> {
    let scale = Scale::from_scala(source);
    match scale.report(&SourceContext::new(name, source)) {
        Some(report) => Err(report),
        None => Ok(scale),
    }
}
