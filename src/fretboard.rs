//! Fret and fretlet geometry.
//!
//! [`fret_instrument`] takes an [`Instrument`] (strings, fretboard edges,
//! scale, tuning) and returns a [`Fretboard`]: the input plus the nut,
//! bridge, midline, meta lines, one [`FretRecord`] per string per fret, and
//! the fret-line extensions out to the fretboard edges.
//!
//! Fret positions follow a recurrence: fret `j` sits between fret `j - 1`
//! and the bridge end of the string, at a fraction given by the ratio of two
//! consecutive scale steps. Fretlets are the slice of the full fret line that
//! lies between the two meta lines around a string.

use serde::Serialize;

use crate::errors::FretError;
use crate::geometry::{Point, Segment, THRESHOLD};
use crate::scale::{Scale, Step};
use crate::types::{Extents, ExtentsBuilder, Units};

/// Everything the engine needs to place frets.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// String centrelines, nut end (`end1`) to bridge end (`end2`), in
    /// transverse order from the `edge1` side to the `edge2` side.
    pub strings: Vec<Segment>,
    /// Fretboard edge beside the first string.
    pub edge1: Segment,
    /// Fretboard edge beside the last string.
    pub edge2: Segment,
    pub scale: Scale,
    /// Per-string offset, in scale steps, from the scale's unison.
    pub tuning: Vec<i32>,
    pub fret_count: usize,
    pub units: Units,
}

impl Instrument {
    /// Shorthand for [`fret_instrument`].
    pub fn fret(&self) -> Result<Fretboard, FretError> {
        fret_instrument(self)
    }
}

/// Geometry of one fret on one string. Index 0 is the nut.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FretRecord {
    /// The fretlet: the part of the fret line between this string's meta
    /// lines, or a zero-length segment at the intersection without partials.
    pub fret: Segment,
    /// Where the fret crosses the string.
    pub intersection: Point,
    pub nut_dist: f64,
    pub bridge_dist: f64,
    /// Distance to the previous fret along the string.
    pub p_fret_dist: f64,
    /// `nut_dist / string length`.
    pub total_ratio: f64,
    pub width: f64,
    /// Fretlet direction in degrees; NaN without partials.
    pub angle: f64,
    /// Where the fretlet's line crosses the midline.
    pub midline_intersection: Point,
    pub midline_nut_dist: f64,
    pub midline_bridge_dist: f64,
    pub midline_p_fret_dist: f64,
}

/// An instrument with all derived fret geometry.
///
/// Renderers read the serialized field names (`frets`, `fretWidths`,
/// `midline`, `nut`, `bridge`, `meta`, `doPartials`, `extendedFretEnds`) and
/// should skip anything NaN (`null` in JSON).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fretboard {
    #[serde(flatten)]
    pub instrument: Instrument,
    pub nut: Segment,
    pub bridge: Segment,
    pub midline: Segment,
    /// `edge1`, the lines midway between neighbouring strings, then `edge2`.
    pub meta: Vec<Segment>,
    /// Every string meets the nut and bridge lines, so fretlets can be built.
    pub do_partials: bool,
    /// Nut and bridge are parallel, so every fret line is parallel to the nut.
    pub parallel_frets: bool,
    /// `frets[string][fret]`.
    pub frets: Vec<Vec<FretRecord>>,
    /// Sum of fretlet widths across all strings, per fret.
    pub fret_widths: Vec<f64>,
    /// Two segments per fret: edge2 side then edge1 side, each joining an
    /// outermost fretlet end to the fretboard edge.
    pub extended_fret_ends: Vec<Segment>,
}

/// Compute fret geometry for `instrument`.
///
/// Only structural problems are errors. Degenerate geometry and bad scale
/// steps come back as NaN fields so the rest of the board still renders.
pub fn fret_instrument(instrument: &Instrument) -> Result<Fretboard, FretError> {
    validate(instrument)?;

    let strings = &instrument.strings;
    let nut = Segment::new(instrument.edge1.end1, instrument.edge2.end1);
    let bridge = Segment::new(instrument.edge1.end2, instrument.edge2.end2);
    let midline = Segment::new(nut.midpoint(), bridge.midpoint());
    let meta = meta_lines(instrument);

    let on_lines = |string: &Segment| {
        nut.distance_to_point(string.end1) <= THRESHOLD
            && bridge.distance_to_point(string.end2) <= THRESHOLD
    };
    let off_line = strings.iter().position(|string| !on_lines(string));
    let do_partials = off_line.is_none();
    if !do_partials {
        crate::log::warn!(
            string = ?off_line,
            "string does not meet the nut and bridge lines; fretlets disabled"
        );
    }

    let nut_vec = nut.end2.to_vec() - nut.end1.to_vec();
    let bridge_vec = bridge.end2.to_vec() - bridge.end1.to_vec();
    let parallel_frets = nut_vec.perp_dot(bridge_vec).abs() <= THRESHOLD;

    crate::log::debug!(
        strings = strings.len(),
        frets = instrument.fret_count,
        tones = instrument.scale.tones(),
        do_partials,
        parallel_frets,
        "fretting instrument"
    );

    let frame = Frame {
        instrument,
        nut,
        midline,
        meta: &meta,
        do_partials,
        parallel_frets,
    };

    let frets: Vec<Vec<FretRecord>> = (0..strings.len()).map(|i| frame.fret_string(i)).collect();

    let mut fret_widths = vec![0.0; instrument.fret_count + 1];
    for string in &frets {
        for (total, record) in fret_widths.iter_mut().zip(string) {
            *total += record.width;
        }
    }

    let extended_fret_ends = extend_fret_ends(instrument, &frets, do_partials);

    Ok(Fretboard {
        instrument: instrument.clone(),
        nut,
        bridge,
        midline,
        meta,
        do_partials,
        parallel_frets,
        frets,
        fret_widths,
        extended_fret_ends,
    })
}

fn validate(instrument: &Instrument) -> Result<(), FretError> {
    if instrument.strings.is_empty() {
        return Err(FretError::NoStrings);
    }
    if instrument.scale.tones() == 0 {
        return Err(FretError::EmptyScale);
    }
    if instrument.tuning.len() < instrument.strings.len() {
        return Err(FretError::TuningLength {
            strings: instrument.strings.len(),
            tuning: instrument.tuning.len(),
        });
    }
    Ok(())
}

/// `edge1`, one line midway between each pair of neighbouring strings, `edge2`.
fn meta_lines(instrument: &Instrument) -> Vec<Segment> {
    let mut meta = Vec::with_capacity(instrument.strings.len() + 1);
    meta.push(instrument.edge1);
    for pair in instrument.strings.windows(2) {
        meta.push(Segment::new(
            pair[1].end1.midway(pair[0].end1),
            pair[1].end2.midway(pair[0].end2),
        ));
    }
    meta.push(instrument.edge2);
    meta
}

/// Where fret `j` sits between fret `j - 1` and the bridge, as a fraction of
/// that remaining length.
///
/// `None` when either step is unusable; a NaN result from usable steps
/// collapses to 0 so the fret lands on the previous one.
fn step_ratio(steps: &[Step], index: usize) -> Option<f64> {
    let current = *steps.get(index)?;
    let previous = *steps.get(index.checked_sub(1)?)?;
    if !current.is_valid() || !previous.is_valid() || current.num == 0.0 {
        return None;
    }
    let ratio = 1.0 - (current.denom * previous.num) / (current.num * previous.denom);
    Some(if ratio.is_nan() { 0.0 } else { ratio })
}

/// 1-based index into the step list for fret `fret` (>= 1) on a string tuned
/// `offset` steps up. Negative offsets wrap.
fn step_index(offset: i32, fret: usize, tones: usize) -> usize {
    let position = i64::from(offset) + fret as i64 - 1;
    position.rem_euclid(tones as i64) as usize + 1
}

/// Shared, read-only state for computing each string's fret chain.
struct Frame<'a> {
    instrument: &'a Instrument,
    nut: Segment,
    midline: Segment,
    meta: &'a [Segment],
    do_partials: bool,
    parallel_frets: bool,
}

impl Frame<'_> {
    /// All fret records for string `i`. Reads only shared state, so strings
    /// are independent of each other.
    fn fret_string(&self, i: usize) -> Vec<FretRecord> {
        let instrument = self.instrument;
        let string = instrument.strings[i];
        let string_length = string.length();
        let steps = &instrument.scale.steps;
        let tones = instrument.scale.tones();
        let offset = instrument.tuning[i];

        let mut records = Vec::with_capacity(instrument.fret_count + 1);
        records.push(self.nut_record(i, string));

        for j in 1..=instrument.fret_count {
            let previous = records[j - 1];
            let index = step_index(offset, j, tones);
            let intersection = match step_ratio(steps, index) {
                Some(ratio) => Segment::new(previous.intersection, string.end2).point_at_ratio(ratio),
                None => Point::INVALID,
            };

            let nut_dist = string.end1.distance(intersection);
            let total_ratio = if string_length > THRESHOLD {
                nut_dist / string_length
            } else {
                0.0
            };

            let mut record = FretRecord {
                fret: Segment::at(intersection),
                intersection,
                nut_dist,
                bridge_dist: string.end2.distance(intersection),
                p_fret_dist: previous.intersection.distance(intersection),
                total_ratio,
                width: 0.0,
                angle: f64::NAN,
                midline_intersection: Point::INVALID,
                midline_nut_dist: f64::NAN,
                midline_bridge_dist: f64::NAN,
                midline_p_fret_dist: f64::NAN,
            };
            if self.do_partials {
                self.fill_fretlet(i, &mut record, &previous);
            }

            crate::log::trace!(string = i, fret = j, index, %intersection, "fret");
            records.push(record);
        }
        records
    }

    fn nut_record(&self, i: usize, string: Segment) -> FretRecord {
        if !self.do_partials {
            return FretRecord {
                fret: Segment::at(string.end1),
                intersection: string.end1,
                nut_dist: 0.0,
                bridge_dist: string.length(),
                p_fret_dist: 0.0,
                total_ratio: 0.0,
                width: 0.0,
                angle: f64::NAN,
                midline_intersection: Point::INVALID,
                midline_nut_dist: f64::NAN,
                midline_bridge_dist: f64::NAN,
                midline_p_fret_dist: f64::NAN,
            };
        }

        let fret = Segment::new(self.meta[i].end1, self.meta[i + 1].end1);
        let midline_intersection = self.midline.intersect(&fret);
        FretRecord {
            fret,
            intersection: string.end1,
            nut_dist: 0.0,
            bridge_dist: string.length(),
            p_fret_dist: 0.0,
            total_ratio: 0.0,
            width: fret.length(),
            angle: fret.angle(),
            midline_intersection,
            midline_nut_dist: 0.0,
            midline_bridge_dist: self.midline.end2.distance(midline_intersection),
            midline_p_fret_dist: 0.0,
        }
    }

    /// Build the full-width fret line, clip it to this string's meta lines,
    /// and measure the result against the midline.
    fn fill_fretlet(&self, i: usize, record: &mut FretRecord, previous: &FretRecord) {
        let strings = &self.instrument.strings;
        let fret_line = if self.parallel_frets {
            self.nut.create_parallel(record.intersection)
        } else {
            // Fanned: join the points at the same fraction of length on the
            // two outermost strings.
            let first = strings[0];
            let last = strings[strings.len() - 1];
            Segment::new(
                first.point_at_ratio(record.total_ratio),
                last.point_at_ratio(record.total_ratio),
            )
        };

        let fret = Segment::new(
            fret_line.intersect(&self.meta[i]),
            fret_line.intersect(&self.meta[i + 1]),
        );
        let midline_intersection = self.midline.intersect(&fret);

        record.fret = fret;
        record.width = fret.length();
        record.angle = fret.angle();
        record.midline_intersection = midline_intersection;
        record.midline_nut_dist = self.midline.end1.distance(midline_intersection);
        record.midline_bridge_dist = self.midline.end2.distance(midline_intersection);
        record.midline_p_fret_dist = previous.midline_intersection.distance(midline_intersection);
    }
}

/// Extend each fret past the outermost fretlets to the fretboard edges.
fn extend_fret_ends(
    instrument: &Instrument,
    frets: &[Vec<FretRecord>],
    do_partials: bool,
) -> Vec<Segment> {
    let (Some(first), Some(last)) = (frets.first(), frets.last()) else {
        return Vec::new();
    };

    let mut ends = Vec::with_capacity(2 * (instrument.fret_count + 1));
    for j in 0..=instrument.fret_count {
        let (Some(first_fret), Some(last_fret)) = (first.get(j), last.get(j)) else {
            continue;
        };
        let right = first_fret.fret.end1;
        let left = if last_fret.fret.length() < THRESHOLD {
            last_fret.fret.end1
        } else {
            last_fret.fret.end2
        };
        let t = j as f64 / instrument.fret_count as f64;
        ends.extend(extend_fret(instrument, left, right, t, do_partials));
    }
    ends
}

/// The edge2-side and edge1-side extensions of one fret whose outer fretlet
/// ends are `left` and `right`. `t` is the fret's ratio along the edges, used
/// only when the fret collapses to a point on a partials board.
fn extend_fret(
    instrument: &Instrument,
    left: Point,
    right: Point,
    t: f64,
    do_partials: bool,
) -> [Segment; 2] {
    let full = Segment::new(left, right);
    if full.length() < THRESHOLD {
        return if do_partials {
            [
                Segment::new(instrument.edge2.point_at_ratio(t), left),
                Segment::new(right, instrument.edge1.point_at_ratio(t)),
            ]
        } else {
            [Segment::at(left), Segment::at(right)]
        };
    }

    let mut edge_left = full.intersect(&instrument.edge2);
    if !edge_left.is_valid() {
        edge_left = left;
    }
    let mut edge_right = full.intersect(&instrument.edge1);
    if !edge_right.is_valid() {
        edge_right = right;
    }
    [Segment::new(edge_left, left), Segment::new(right, edge_right)]
}

impl Fretboard {
    /// Bounding box of everything a renderer would draw.
    ///
    /// Covers the meta lines (edges included), the nut and bridge, and either
    /// the extended fret ends (`extend_frets`, when there are any) or the raw
    /// fretlets. NaN coordinates are skipped; with nothing to measure the
    /// result is the all-zero box.
    pub fn extents(&self, extend_frets: bool) -> Extents {
        if self.meta.is_empty() {
            return Extents::default();
        }

        let mut bounds = ExtentsBuilder::new();
        let mut add = |segment: &Segment| {
            bounds.expand(segment.end1.x, segment.end1.y);
            bounds.expand(segment.end2.x, segment.end2.y);
        };

        self.meta.iter().for_each(&mut add);
        if extend_frets && !self.extended_fret_ends.is_empty() {
            self.extended_fret_ends.iter().for_each(&mut add);
        } else {
            self.frets.iter().flatten().for_each(|record| add(&record.fret));
        }
        add(&self.nut);
        add(&self.bridge);

        bounds.finish()
    }

    /// Record for `fret` on `string`, if both exist.
    pub fn fret(&self, string: usize, fret: usize) -> Option<&FretRecord> {
        self.frets.get(string)?.get(fret)
    }

    pub fn scale(&self) -> &Scale {
        &self.instrument.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LENGTH: f64 = 25.5;
    const SPACING: f64 = 0.4;
    const OVERHANG: f64 = 0.125;

    /// Vertical strings from y = 0 to y = LENGTH at x = 0, SPACING, ...
    fn straight_neck(strings: usize, scale: Scale, fret_count: usize) -> Instrument {
        let width = SPACING * (strings - 1) as f64;
        let string_segments = (0..strings)
            .map(|i| {
                let x = SPACING * i as f64;
                Segment::new(Point::new(x, 0.0), Point::new(x, LENGTH))
            })
            .collect();
        Instrument {
            strings: string_segments,
            edge1: Segment::new(Point::new(-OVERHANG, 0.0), Point::new(-OVERHANG, LENGTH)),
            edge2: Segment::new(
                Point::new(width + OVERHANG, 0.0),
                Point::new(width + OVERHANG, LENGTH),
            ),
            scale,
            tuning: vec![0; strings],
            fret_count,
            units: Units::Inches,
        }
    }

    fn two_step_scale() -> Scale {
        let mut scale = Scale::new();
        scale.add_step(9.0, 8.0).add_step(2.0, 1.0);
        scale
    }

    #[test]
    fn nut_record_sits_on_string_end() {
        let fb = fret_instrument(&straight_neck(6, Scale::twelve_tet(), 12)).unwrap();
        for (i, string) in fb.frets.iter().enumerate() {
            assert_eq!(string[0].intersection, fb.instrument.strings[i].end1);
            assert_eq!(string[0].nut_dist, 0.0);
            assert_eq!(string[0].bridge_dist, LENGTH);
        }
    }

    #[test]
    fn twelfth_fret_halves_the_string() {
        let fb = fret_instrument(&straight_neck(6, Scale::twelve_tet(), 24)).unwrap();
        for string in &fb.frets {
            assert!((string[12].total_ratio - 0.5).abs() < 1e-12);
            assert!((string[12].intersection.y - LENGTH / 2.0).abs() < 1e-9);
            assert!((string[24].total_ratio - 0.75).abs() < 1e-12);
        }
    }

    #[test]
    fn previous_fret_distance_is_exact() {
        let fb = fret_instrument(&straight_neck(3, Scale::twelve_tet(), 20)).unwrap();
        for string in &fb.frets {
            for j in 1..string.len() {
                let expected = string[j].intersection.distance(string[j - 1].intersection);
                assert_eq!(string[j].p_fret_dist, expected);
            }
        }
    }

    #[test]
    fn parallel_fretlets_span_meta_gaps() {
        let fb = fret_instrument(&straight_neck(4, Scale::twelve_tet(), 5)).unwrap();
        assert!(fb.do_partials);
        assert!(fb.parallel_frets);
        assert_eq!(fb.meta.len(), 5);

        let record = fb.fret(1, 5).unwrap();
        assert!((record.fret.end1.x - SPACING / 2.0).abs() < 1e-12);
        assert!((record.fret.end2.x - SPACING * 1.5).abs() < 1e-12);
        assert!((record.fret.end1.y - record.intersection.y).abs() < 1e-12);
        assert!((record.width - SPACING).abs() < 1e-12);
        assert!(record.angle.abs() < 1e-9);
    }

    #[test]
    fn fret_widths_cover_edge_to_edge() {
        let strings = 5;
        let fb = fret_instrument(&straight_neck(strings, Scale::twelve_tet(), 7)).unwrap();
        let board = SPACING * (strings - 1) as f64 + 2.0 * OVERHANG;
        assert_eq!(fb.fret_widths.len(), 8);
        for total in &fb.fret_widths {
            assert!((total - board).abs() < 1e-9);
        }
    }

    #[test]
    fn midline_distances_on_straight_neck() {
        let fb = fret_instrument(&straight_neck(6, Scale::twelve_tet(), 12)).unwrap();
        let record = fb.fret(2, 12).unwrap();
        assert!((record.midline_nut_dist - LENGTH / 2.0).abs() < 1e-9);
        assert!((record.midline_bridge_dist - LENGTH / 2.0).abs() < 1e-9);
        let nut = fb.fret(2, 0).unwrap();
        assert_eq!(nut.midline_nut_dist, 0.0);
        assert!((nut.midline_bridge_dist - LENGTH).abs() < 1e-12);
    }

    #[test]
    fn tuning_offsets_select_later_steps() {
        let mut inst = straight_neck(2, two_step_scale(), 2);
        inst.tuning = vec![0, 1];
        let fb = fret_instrument(&inst).unwrap();
        // 9/8 above the unison: the string shortens to 8/9.
        assert!((fb.fret(0, 1).unwrap().total_ratio - 1.0 / 9.0).abs() < 1e-12);
        // From 9/8 to 2/1 the string shortens to 9/16.
        assert!((fb.fret(1, 1).unwrap().total_ratio - 7.0 / 16.0).abs() < 1e-12);
        // 1/9 plus 7/16 of the remaining 8/9 lands on the octave.
        assert!((fb.fret(0, 2).unwrap().total_ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn negative_tuning_wraps() {
        let mut down = straight_neck(1, two_step_scale(), 3);
        down.tuning = vec![-1];
        let mut up = straight_neck(1, two_step_scale(), 3);
        up.tuning = vec![1];
        let down = fret_instrument(&down).unwrap();
        let up = fret_instrument(&up).unwrap();
        for j in 0..=3 {
            assert_eq!(down.frets[0][j].intersection, up.frets[0][j].intersection);
        }
    }

    #[test]
    fn step_index_wraps_through_period() {
        assert_eq!(step_index(0, 1, 12), 1);
        assert_eq!(step_index(0, 12, 12), 12);
        assert_eq!(step_index(0, 13, 12), 1);
        assert_eq!(step_index(-1, 1, 12), 12);
        assert_eq!(step_index(5, 1, 1), 1);
    }

    #[test]
    fn step_ratio_guards() {
        let steps = [Step::UNISON, Step::new(0.0, 1.0), Step::INVALID, Step::new(2.0, 1.0)];
        assert_eq!(step_ratio(&steps, 1), None);
        assert_eq!(step_ratio(&steps, 2), None);
        assert_eq!(step_ratio(&steps, 3), None);
        assert_eq!(step_ratio(&steps, 4), None);
        assert_eq!(step_ratio(&[Step::UNISON, Step::new(2.0, 1.0)], 1), Some(0.5));
        let inf = [Step::UNISON, Step::new(f64::INFINITY, f64::INFINITY)];
        assert_eq!(step_ratio(&inf, 1), Some(0.0));
    }

    #[test]
    fn invalid_step_propagates_nan() {
        let scale = Scale::from_scala("t\n2\nbad\n2/1\n");
        assert!(scale.has_errors());
        let fb = fret_instrument(&straight_neck(2, scale, 4)).unwrap();
        let string = &fb.frets[0];
        assert!(string[0].intersection.is_valid());
        for record in &string[1..] {
            assert!(!record.intersection.is_valid());
            assert!(record.nut_dist.is_nan());
            assert!(record.p_fret_dist.is_nan());
            assert!(record.fret.is_invalid());
        }
        assert!(fb.fret_widths[1].is_nan());
    }

    #[test]
    fn string_off_the_nut_disables_partials() {
        let mut inst = straight_neck(3, Scale::twelve_tet(), 5);
        inst.strings[1].end1.y += 0.01;
        let fb = fret_instrument(&inst).unwrap();
        assert!(!fb.do_partials);
        for string in &fb.frets {
            for record in string {
                assert!(record.fret.is_degenerate());
                assert_eq!(record.fret.end1, record.intersection);
                assert_eq!(record.width, 0.0);
                assert!(record.angle.is_nan());
                assert!(!record.midline_intersection.is_valid());
                assert!(record.midline_nut_dist.is_nan());
                assert!(record.midline_bridge_dist.is_nan());
                assert!(record.midline_p_fret_dist.is_nan());
            }
        }
        assert!(fb.fret_widths.iter().all(|w| *w == 0.0));
    }

    #[test]
    fn extended_ends_reach_edges_without_partials() {
        let mut inst = straight_neck(3, Scale::twelve_tet(), 4);
        inst.strings[1].end1.y += 0.5;
        let fb = fret_instrument(&inst).unwrap();
        assert_eq!(fb.extended_fret_ends.len(), 10);
        let width = SPACING * 2.0;
        for j in 0..=4 {
            let left = fb.extended_fret_ends[2 * j];
            let right = fb.extended_fret_ends[2 * j + 1];
            let y = fb.frets[0][j].intersection.y;
            assert!((left.end1.x - (width + OVERHANG)).abs() < 1e-12);
            assert!((left.end1.y - y).abs() < 1e-12);
            assert_eq!(left.end2, fb.frets[2][j].intersection);
            assert_eq!(right.end1, fb.frets[0][j].intersection);
            assert!((right.end2.x + OVERHANG).abs() < 1e-12);
        }
    }

    #[test]
    fn single_string_without_partials_extends_to_points() {
        let mut inst = straight_neck(1, Scale::twelve_tet(), 5);
        inst.strings[0].end1.y += 0.01;
        let fb = fret_instrument(&inst).unwrap();
        assert!(!fb.do_partials);
        assert_eq!(fb.extended_fret_ends.len(), 12);
        for (j, pair) in fb.extended_fret_ends.chunks(2).enumerate() {
            let at = fb.frets[0][j].intersection;
            assert!(at.is_valid());
            for end in pair {
                assert!(end.is_degenerate());
                assert_eq!(*end, Segment::at(at));
            }
        }
    }

    #[test]
    fn zero_length_edges_fall_back_to_fret_points() {
        let mut inst = straight_neck(2, Scale::twelve_tet(), 4);
        inst.edge1 = Segment::at(Point::new(-OVERHANG, 0.0));
        inst.edge2 = Segment::at(Point::new(SPACING + OVERHANG, 0.0));
        let fb = fret_instrument(&inst).unwrap();
        assert!(!fb.do_partials);
        assert_eq!(fb.extended_fret_ends.len(), 10);
        for j in 0..=4 {
            let left = fb.extended_fret_ends[2 * j];
            let right = fb.extended_fret_ends[2 * j + 1];
            assert!(!left.is_invalid() && !right.is_invalid(), "fret {j}");
            assert_eq!(left, Segment::at(fb.frets[1][j].intersection));
            assert_eq!(right, Segment::at(fb.frets[0][j].intersection));
        }
    }

    #[test]
    fn collapsed_fretlet_with_partials_spans_edge_points() {
        // Both edges leave the string's nut end, so the nut fretlet is a point.
        let inst = Instrument {
            strings: vec![Segment::new(Point::new(0.0, 0.0), Point::new(0.0, 10.0))],
            edge1: Segment::new(Point::new(0.0, 0.0), Point::new(1.0, 10.0)),
            edge2: Segment::new(Point::new(0.0, 0.0), Point::new(-1.0, 10.0)),
            scale: Scale::twelve_tet(),
            tuning: vec![0],
            fret_count: 2,
            units: Units::Inches,
        };
        let fb = fret_instrument(&inst).unwrap();
        assert!(fb.do_partials);
        assert!(fb.frets[0][0].fret.is_degenerate());
        let origin = Point::new(0.0, 0.0);
        assert_eq!(fb.extended_fret_ends[0], Segment::new(inst.edge2.end1, origin));
        assert_eq!(fb.extended_fret_ends[1], Segment::new(origin, inst.edge1.end1));

        // Further along, the ends run to the edges at the fret's ratio.
        let inst = straight_neck(2, Scale::twelve_tet(), 4);
        let point = Point::new(0.2, 10.0);
        let [left, right] = extend_fret(&inst, point, point, 0.5, true);
        assert_eq!(left, Segment::new(Point::new(SPACING + OVERHANG, LENGTH / 2.0), point));
        assert_eq!(right, Segment::new(point, Point::new(-OVERHANG, LENGTH / 2.0)));

        let [left, right] = extend_fret(&inst, point, point, 0.5, false);
        assert_eq!(left, Segment::at(point));
        assert_eq!(right, Segment::at(point));
    }

    #[test]
    fn fanned_frets_follow_each_string() {
        // Nut slopes down to the right, bridge slopes up: a fanned neck whose
        // outer strings are 25 and 27 long.
        let nut_y = |x: f64| -0.5 * x;
        let bridge_y = |x: f64| 25.0 + 0.5 * x;
        let string = |x: f64| Segment::new(Point::new(x, nut_y(x)), Point::new(x, bridge_y(x)));
        let edge = |x: f64| string(x);
        let inst = Instrument {
            strings: vec![string(0.0), string(1.0), string(2.0)],
            edge1: edge(-0.125),
            edge2: edge(2.125),
            scale: Scale::twelve_tet(),
            tuning: vec![0; 3],
            fret_count: 12,
            units: Units::Inches,
        };
        let fb = fret_instrument(&inst).unwrap();
        assert!(fb.do_partials);
        assert!(!fb.parallel_frets);

        for (i, string) in fb.frets.iter().enumerate() {
            let len = inst.strings[i].length();
            assert!((string[12].nut_dist - len / 2.0).abs() < 1e-9);
        }

        let middle = fb.fret(1, 12).unwrap();
        assert!((middle.fret.end1.x - 0.5).abs() < 1e-9);
        assert!((middle.fret.end2.x - 1.5).abs() < 1e-9);
        assert!((middle.fret.end1.y - 12.5).abs() < 1e-9);
        assert!((middle.width - 1.0).abs() < 1e-9);
    }

    #[test]
    fn structural_errors() {
        let mut inst = straight_neck(2, Scale::twelve_tet(), 3);
        inst.tuning = vec![0];
        assert_eq!(
            fret_instrument(&inst).unwrap_err(),
            FretError::TuningLength {
                strings: 2,
                tuning: 1
            }
        );

        let inst = straight_neck(2, Scale::equal_temperament(0.0, 2.0), 3);
        assert_eq!(fret_instrument(&inst).unwrap_err(), FretError::EmptyScale);

        let mut inst = straight_neck(2, Scale::twelve_tet(), 3);
        inst.strings.clear();
        assert_eq!(fret_instrument(&inst).unwrap_err(), FretError::NoStrings);
    }

    #[test]
    fn zero_frets_gives_only_the_nut() {
        let fb = fret_instrument(&straight_neck(2, Scale::twelve_tet(), 0)).unwrap();
        assert!(fb.frets.iter().all(|s| s.len() == 1));
        assert_eq!(fb.fret_widths.len(), 1);
        assert_eq!(fb.extended_fret_ends.len(), 2);
    }

    #[test]
    fn extents_of_straight_neck() {
        let fb = fret_instrument(&straight_neck(3, Scale::twelve_tet(), 12)).unwrap();
        for extend in [true, false] {
            let e = fb.extents(extend);
            assert!((e.minx + OVERHANG).abs() < 1e-12);
            assert!((e.maxx - (SPACING * 2.0 + OVERHANG)).abs() < 1e-12);
            assert!(e.miny.abs() < 1e-12);
            assert!((e.maxy - LENGTH).abs() < 1e-12);
            assert_eq!(e.width, e.maxx - e.minx);
            assert_eq!(e.height, e.maxy - e.miny);
        }
    }

    #[test]
    fn extents_of_empty_board_is_zero() {
        assert_eq!(Fretboard::default().extents(true), Extents::default());
    }

    #[test]
    fn input_is_not_modified_and_result_is_repeatable() {
        let inst = straight_neck(4, Scale::twelve_tet(), 22);
        let before = inst.clone();
        let a = fret_instrument(&inst).unwrap();
        let b = fret_instrument(&inst).unwrap();
        assert_eq!(inst, before);
        assert_eq!(a.instrument, inst);
        assert_eq!(format!("{:?}", a), format!("{:?}", b));
    }
}
