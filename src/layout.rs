//! Instrument layout: physical design parameters to string and edge segments.
//!
//! [`InstrumentLayout`] describes a neck the way a builder measures one (string
//! count, nut and bridge spread, scale lengths, spacing rule, overhang) and
//! [`InstrumentLayout::build`] turns that into the [`Instrument`] the fret
//! engine consumes.
//!
//! Coordinates: the first string is on the +x side, the nut runs from the
//! first string towards the last, and y grows from nut to bridge. If fanning
//! would push an edge above y = 0 the whole layout is moved down so the
//! highest edge end sits on y = 0.

use crate::errors::LayoutError;
use crate::fretboard::{Fretboard, Instrument, fret_instrument};
use crate::geometry::{Point, Segment};
use crate::scale::Scale;
use crate::types::{Length, NumericError, Units};

/// How string lengths are chosen.
#[derive(Clone, Debug, PartialEq)]
pub enum LengthMode {
    /// Every string has the same length; nut and bridge are perpendicular to
    /// the centreline.
    Single { scale_length: f64 },
    /// Fanned frets. `perpendicular` is the fraction of the scale length
    /// (0 = nut, 1 = bridge) at which the fret is square to the centreline.
    Multiple {
        first: f64,
        last: f64,
        perpendicular: f64,
    },
    /// One length per string. Inner strings are re-derived from their own
    /// length, so they generally do not meet the nut and bridge lines.
    Individual { lengths: Vec<f64>, perpendicular: f64 },
}

impl LengthMode {
    fn is_fanned(&self) -> bool {
        !matches!(self, LengthMode::Single { .. })
    }

    fn perpendicular(&self) -> f64 {
        match self {
            LengthMode::Single { .. } => 0.0,
            LengthMode::Multiple { perpendicular, .. }
            | LengthMode::Individual { perpendicular, .. } => *perpendicular,
        }
    }
}

/// How strings are spread between the outer two.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SpacingMode {
    /// Equal centre-to-centre distance.
    #[default]
    Equal,
    /// Equal gaps between string edges. Gauges are string diameters, one per
    /// string, in layout units.
    Proportional { gauges: Vec<f64> },
}

/// Distance from the outer strings to the fretboard edges, measured square to
/// the strings, at the nut and at the bridge.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Overhang {
    pub nut_first: f64,
    pub nut_last: f64,
    pub bridge_first: f64,
    pub bridge_last: f64,
}

impl Overhang {
    pub const fn equal(overhang: f64) -> Self {
        Overhang {
            nut_first: overhang,
            nut_last: overhang,
            bridge_first: overhang,
            bridge_last: overhang,
        }
    }

    pub const fn nut_bridge(nut: f64, bridge: f64) -> Self {
        Overhang {
            nut_first: nut,
            nut_last: nut,
            bridge_first: bridge,
            bridge_last: bridge,
        }
    }

    pub const fn first_last(first: f64, last: f64) -> Self {
        Overhang {
            nut_first: first,
            nut_last: last,
            bridge_first: first,
            bridge_last: last,
        }
    }

    /// Stretch onto an angled nut and bridge. A factor is the angled length
    /// over the square width.
    fn projected(self, nut: f64, bridge: f64) -> Self {
        Overhang {
            nut_first: self.nut_first * nut,
            nut_last: self.nut_last * nut,
            bridge_first: self.bridge_first * bridge,
            bridge_last: self.bridge_last * bridge,
        }
    }
}

/// Physical description of a neck.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentLayout {
    pub strings: usize,
    /// Distance between the outer string centres at the nut.
    pub nut_width: f64,
    /// Distance between the outer string centres at the bridge.
    pub bridge_width: f64,
    pub length: LengthMode,
    pub spacing: SpacingMode,
    pub overhang: Overhang,
    pub fret_count: usize,
    /// Per-string offsets in scale steps; padded with 0 to the string count.
    pub tuning: Vec<i32>,
    pub scale: Scale,
    pub units: Units,
}

impl Default for InstrumentLayout {
    fn default() -> Self {
        InstrumentLayout {
            strings: 6,
            nut_width: 1.375,
            bridge_width: 2.125,
            length: LengthMode::Single { scale_length: 25.5 },
            spacing: SpacingMode::Equal,
            overhang: Overhang::equal(0.09375),
            fret_count: 24,
            tuning: vec![0; 6],
            scale: Scale::twelve_tet(),
            units: Units::Inches,
        }
    }
}

impl InstrumentLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strings(mut self, strings: usize) -> Self {
        self.strings = strings;
        self
    }

    pub fn with_nut_width(mut self, width: f64) -> Self {
        self.nut_width = width;
        self
    }

    pub fn with_bridge_width(mut self, width: f64) -> Self {
        self.bridge_width = width;
        self
    }

    pub fn with_scale_length(mut self, scale_length: f64) -> Self {
        self.length = LengthMode::Single { scale_length };
        self
    }

    pub fn with_fanned(mut self, first: f64, last: f64, perpendicular: f64) -> Self {
        self.length = LengthMode::Multiple {
            first,
            last,
            perpendicular,
        };
        self
    }

    pub fn with_individual_lengths(mut self, lengths: Vec<f64>, perpendicular: f64) -> Self {
        self.length = LengthMode::Individual {
            lengths,
            perpendicular,
        };
        self
    }

    pub fn with_spacing(mut self, spacing: SpacingMode) -> Self {
        self.spacing = spacing;
        self
    }

    /// Proportional spacing from string gauges.
    pub fn with_gauges(mut self, gauges: Vec<f64>) -> Self {
        self.spacing = SpacingMode::Proportional { gauges };
        self
    }

    pub fn with_overhang(mut self, overhang: Overhang) -> Self {
        self.overhang = overhang;
        self
    }

    pub fn with_fret_count(mut self, fret_count: usize) -> Self {
        self.fret_count = fret_count;
        self
    }

    pub fn with_tuning(mut self, tuning: Vec<i32>) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Check every parameter without building anything.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.strings == 0 {
            return Err(LayoutError::NoStrings);
        }
        non_negative("nut_width", self.nut_width)?;
        non_negative("bridge_width", self.bridge_width)?;
        non_negative("overhang.nut_first", self.overhang.nut_first)?;
        non_negative("overhang.nut_last", self.overhang.nut_last)?;
        non_negative("overhang.bridge_first", self.overhang.bridge_first)?;
        non_negative("overhang.bridge_last", self.overhang.bridge_last)?;

        match &self.length {
            LengthMode::Single { scale_length } => {
                positive("scale_length", *scale_length)?;
            }
            LengthMode::Multiple { first, last, .. } => {
                positive("first_length", *first)?;
                positive("last_length", *last)?;
            }
            LengthMode::Individual { lengths, .. } => {
                if lengths.len() != self.strings {
                    return Err(LayoutError::CountMismatch {
                        field: "lengths",
                        strings: self.strings,
                        found: lengths.len(),
                    });
                }
                for length in lengths {
                    positive("lengths", *length)?;
                }
            }
        }

        let perpendicular = self.length.perpendicular();
        if !(0.0..=1.0).contains(&perpendicular) {
            return Err(LayoutError::PerpendicularOutOfRange {
                value: perpendicular,
            });
        }

        if let SpacingMode::Proportional { gauges } = &self.spacing {
            if gauges.len() != self.strings {
                return Err(LayoutError::CountMismatch {
                    field: "gauges",
                    strings: self.strings,
                    found: gauges.len(),
                });
            }
            for gauge in gauges {
                non_negative("gauges", *gauge)?;
            }
        }
        Ok(())
    }

    /// Lay out strings and edges.
    pub fn build(&self) -> Result<Instrument, LayoutError> {
        self.validate()?;

        let fanned = self.length.is_fanned();
        let perpendicular = self.length.perpendicular();
        let half_nut = self.nut_width / 2.0;
        let half_bridge = self.bridge_width / 2.0;
        let mut overhang = self.overhang;

        let center = (half_nut + overhang.nut_last).max(half_bridge + overhang.bridge_last);
        let nut_first_x = center + half_nut;
        let bridge_first_x = center + half_bridge;
        let nut_last_x = center - half_nut;
        let bridge_last_x = center - half_bridge;

        let (first_rise, last_rise) = match &self.length {
            LengthMode::Single { scale_length } => (*scale_length, *scale_length),
            LengthMode::Multiple { first, last, .. } => (
                rise(*first, bridge_first_x - nut_first_x),
                rise(*last, bridge_last_x - nut_last_x),
            ),
            LengthMode::Individual { lengths, .. } => {
                let first = lengths.first().copied().unwrap_or_default();
                let last = lengths.last().copied().unwrap_or_default();
                (
                    rise(first, bridge_first_x - nut_first_x),
                    rise(last, bridge_last_x - nut_last_x),
                )
            }
        };

        let mut first = Segment::new(
            Point::new(nut_first_x, 0.0),
            Point::new(bridge_first_x, first_rise),
        );
        let mut last = Segment::new(
            Point::new(nut_last_x, 0.0),
            Point::new(bridge_last_x, last_rise),
        );

        // Line up the perpendicular fret: slide the shorter outer string so
        // both reach that fraction of their length at the same y.
        let mut perpendicular_y = 0.0;
        if fanned {
            let first_perp = perpendicular * first_rise;
            let last_perp = perpendicular * last_rise;
            if first_rise <= last_rise {
                first.translate(0.0, last_perp - first_perp);
                perpendicular_y = last_perp;
            } else {
                last.translate(0.0, first_perp - last_perp);
                perpendicular_y = first_perp;
            }
        }

        let mut nut = Segment::new(first.end1, last.end1);
        let mut bridge = Segment::new(first.end2, last.end2);

        if fanned {
            overhang = overhang.projected(
                stretch(nut.length(), self.nut_width),
                stretch(bridge.length(), self.bridge_width),
            );
        }

        let mut edge1 = Segment::new(
            nut.point_at_length(-overhang.nut_first),
            bridge.point_at_length(-overhang.bridge_first),
        );
        let mut edge2 = Segment::new(
            nut.point_at_length(nut.length() + overhang.nut_last),
            bridge.point_at_length(bridge.length() + overhang.bridge_last),
        );

        if edge1.end1.y < 0.0 || edge2.end1.y < 0.0 {
            let shift = -edge1.end1.y.min(edge2.end1.y);
            for segment in [&mut first, &mut last, &mut nut, &mut bridge, &mut edge1, &mut edge2] {
                segment.translate(0.0, shift);
            }
            perpendicular_y += shift;
        }

        let nut_offsets = string_offsets(self.strings, &self.spacing, nut.length(), self.nut_width);
        let bridge_offsets =
            string_offsets(self.strings, &self.spacing, bridge.length(), self.bridge_width);

        let mut strings = Vec::with_capacity(self.strings);
        strings.push(first);
        for i in 1..self.strings - 1 {
            let mut nut_end = nut.point_at_length(nut_offsets[i]);
            let mut bridge_end = bridge.point_at_length(bridge_offsets[i]);

            if let LengthMode::Individual { lengths, .. } = &self.length {
                let inner_rise = rise(lengths[i], (nut_end.x - bridge_end.x).abs());
                let shift = perpendicular_y - perpendicular * inner_rise;
                nut_end = Point::new(nut_end.x, shift);
                bridge_end = Point::new(bridge_end.x, inner_rise + shift);
            }
            strings.push(Segment::new(nut_end, bridge_end));
        }
        if self.strings > 1 {
            strings.push(last);
        }

        let mut tuning = self.tuning.clone();
        if tuning.len() < self.strings {
            tuning.resize(self.strings, 0);
        }

        crate::log::debug!(
            strings = strings.len(),
            fanned,
            perpendicular_y,
            units = %self.units,
            "built instrument layout"
        );

        Ok(Instrument {
            strings,
            edge1,
            edge2,
            scale: self.scale.clone(),
            tuning,
            fret_count: self.fret_count,
            units: self.units,
        })
    }

    /// Build the instrument and fret it.
    pub fn fretboard(&self) -> miette::Result<Fretboard> {
        let instrument = self.build()?;
        Ok(fret_instrument(&instrument)?)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, LayoutError> {
    checked(field, value, Length::try_non_negative)
}

fn positive(field: &'static str, value: f64) -> Result<f64, LayoutError> {
    checked(field, value, Length::try_positive)
}

fn checked(
    field: &'static str,
    value: f64,
    check: fn(f64) -> Result<Length, NumericError>,
) -> Result<f64, LayoutError> {
    check(value)
        .map(Length::raw)
        .map_err(|source| LayoutError::InvalidValue {
            field,
            value,
            source,
        })
}

/// Vertical extent of a string of `length` that drifts `run` sideways.
fn rise(length: f64, run: f64) -> f64 {
    (length * length - run * run).max(0.0).sqrt()
}

fn stretch(actual: f64, square: f64) -> f64 {
    if square > 0.0 { actual / square } else { 0.0 }
}

/// Distance of each string from the first along a nut or bridge line.
///
/// `perp_width` is the square distance between the outer string centres and
/// `actual_length` the length of the (possibly angled) line the offsets are
/// measured along. A zero width stacks every string on the first.
pub fn string_offsets(
    strings: usize,
    spacing: &SpacingMode,
    actual_length: f64,
    perp_width: f64,
) -> Vec<f64> {
    let mut offsets = vec![0.0];
    if strings <= 1 {
        return offsets;
    }

    let gaps = (strings - 1) as f64;
    let scale = stretch(actual_length, perp_width);
    let gauge = |i: usize| match spacing {
        SpacingMode::Equal => 0.0,
        SpacingMode::Proportional { gauges } => {
            gauges.get(i).copied().filter(|g| !g.is_nan()).unwrap_or(0.0)
        }
    };
    let total_gauge: f64 = (0..strings).map(gauge).sum();
    let gap = (perp_width - total_gauge) / gaps;

    for i in 1..strings {
        let center_to_center = gauge(i - 1) / 2.0 + gap + gauge(i) / 2.0;
        offsets.push(offsets[i - 1] + center_to_center * scale);
    }
    offsets
}
