//! The incremental stroke synthesizer.
//!
//! Consumes a live stream of pointer samples and emits smooth,
//! width-varying quadratic Bézier segments in real time. A small buffer
//! of recent raw points is fitted with a candidate curve whose control
//! point sits at the intersection of the entering and exiting tangent
//! rays; when a new point would push any buffered point outside the fit
//! tolerance band, the previous candidate is finalized and a new curve
//! starts from its endpoint.
//!
//! The exiting tangent is estimated from a "momentum" velocity smoothed
//! exponentially across samples, standing in for the unknown future
//! direction of the gesture.

use nib_core::bezier::QuadBezier;
use nib_core::component::{Stroke, StrokeSegment};
use nib_core::line::LineSegment;
use nib_core::path::{Path, PathCmd};
use nib_core::style::{Color, PathStyle};
use nib_core::vec::Vec2;
use smallvec::{SmallVec, smallvec};

/// Exponential smoothing blend for the velocity estimate.
const MOMENTUM_BLEND: f64 = 0.9;
/// Control points further than this many chord lengths from the start are
/// treated as a degenerate ray intersection.
const MAX_CONTROL_DISTANCE_CHORDS: f64 = 3.0;

/// One raw pointer sample, already mapped to canvas space with its
/// pressure resolved to a stroke width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSample {
    pub pos: Vec2,
    pub width: f64,
    pub time_ms: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    curve: QuadBezier,
    end: StrokeSample,
}

pub struct StrokeBuilder {
    color: Color,
    /// Lower bound of the fit tolerance band (canvas units).
    min_fit_tolerance: f64,
    /// Upper bound of the fit tolerance band (canvas units).
    max_fit_tolerance: f64,

    segments: Vec<StrokeSegment>,
    /// Start sample of the curve being fitted.
    curve_start: StrokeSample,
    /// Raw samples of the current curve, including `curve_start`.
    buffer: SmallVec<[StrokeSample; 16]>,
    /// The most recent candidate that passed the tolerance test.
    candidate: Option<Candidate>,
    momentum: Vec2,
    last_sample: StrokeSample,
    /// Exit direction of the last finalized curve; the next curve's
    /// entering tangent.
    exit_tangent: Option<Vec2>,
}

impl StrokeBuilder {
    pub fn new(start: StrokeSample, color: Color, min_fit: f64, max_fit: f64) -> Self {
        Self {
            color,
            min_fit_tolerance: min_fit.max(0.0),
            max_fit_tolerance: max_fit.max(min_fit),
            segments: Vec::new(),
            curve_start: start,
            buffer: smallvec![start],
            candidate: None,
            momentum: Vec2::ZERO,
            last_sample: start,
            exit_tangent: None,
        }
    }

    /// Feed one sample. Degenerate samples (duplicate position, zero
    /// elapsed time, non-finite values) are discarded with a diagnostic;
    /// synthesis continues from the last valid state.
    pub fn add_sample(&mut self, sample: StrokeSample) {
        if !sample.pos.is_finite() || !sample.width.is_finite() {
            log::debug!("discarding non-finite stroke sample");
            return;
        }
        if sample.pos == self.last_sample.pos {
            return;
        }
        let dt = sample.time_ms - self.last_sample.time_ms;
        if dt <= 0.0 {
            log::debug!("discarding stroke sample with non-positive time delta");
            return;
        }

        let velocity = (sample.pos - self.last_sample.pos) * (1.0 / dt);
        self.momentum = self.momentum.lerp(velocity, MOMENTUM_BLEND);
        self.last_sample = sample;
        self.buffer.push(sample);

        if let Some(candidate) = self.fit_buffer() {
            self.candidate = Some(candidate);
            return;
        }

        // The new point broke the tolerance band: commit the previous
        // curve (without the new point) and refit from its endpoint.
        self.finalize_candidate();
        self.buffer.clear();
        self.buffer.push(self.curve_start);
        self.buffer.push(sample);
        self.candidate = self.fit_buffer();
    }

    /// Already-finalized segments plus a live outline of the in-progress
    /// curve, for painting while the gesture is ongoing.
    pub fn preview(&self) -> Vec<StrokeSegment> {
        let mut segments = self.segments.clone();
        if let Some(candidate) = &self.candidate {
            segments.push(self.outline(candidate));
        }
        segments
    }

    /// Finalize the in-progress curve and return the immutable stroke.
    /// A gesture that never accepted a curve yields a circular dot.
    pub fn build(mut self) -> Stroke {
        self.finalize_candidate();
        if self.segments.is_empty() {
            let dot = self.dot_segment();
            return Stroke::new(vec![dot]);
        }
        Stroke::new(self.segments)
    }

    // ─── Fitting ─────────────────────────────────────────────────────────

    fn tolerance(&self) -> f64 {
        let smaller_width = self.curve_start.width.min(self.last_sample.width);
        (smaller_width * 0.5)
            .max(self.min_fit_tolerance)
            .min(self.max_fit_tolerance)
    }

    /// Fit a quadratic through the buffer's endpoints and test every
    /// buffered point against the tolerance band.
    fn fit_buffer(&self) -> Option<Candidate> {
        let end = *self.buffer.last()?;
        let curve = self.fit_curve(end)?;

        let tolerance = self.tolerance();
        for sample in &self.buffer {
            if curve.distance_to(sample.pos) > tolerance {
                return None;
            }
        }
        Some(Candidate { curve, end })
    }

    fn fit_curve(&self, end: StrokeSample) -> Option<QuadBezier> {
        let start = self.curve_start.pos;
        let chord = end.pos - start;
        let chord_len = chord.magnitude();
        let chord_dir = chord.normalized()?;

        let entering = self
            .exit_tangent
            .or_else(|| self.early_tangent())
            .unwrap_or(chord_dir);
        let exiting = self.momentum.normalized().unwrap_or(chord_dir);

        let control = Self::tangent_ray_intersection(start, entering, end.pos, exiting)
            .filter(|c| (*c - start).magnitude() <= chord_len * MAX_CONTROL_DISTANCE_CHORDS)
            .unwrap_or_else(|| start + entering * (chord_len * 0.25));

        Some(QuadBezier::new(start, control, end.pos))
    }

    /// Direction out of the first few buffered points, for a curve with no
    /// predecessor.
    fn early_tangent(&self) -> Option<Vec2> {
        let first = self.buffer.first()?;
        let second = self.buffer.get(1)?;
        (second.pos - first.pos).normalized()
    }

    /// Where the entering ray (forward from the start) meets the exiting
    /// ray (backward from the end). `None` when the rays are parallel or
    /// the intersection falls behind the start.
    fn tangent_ray_intersection(
        start: Vec2,
        entering: Vec2,
        end: Vec2,
        exiting: Vec2,
    ) -> Option<Vec2> {
        let entering_line = LineSegment::new(start, start + entering);
        let exiting_line = LineSegment::new(end, end - exiting);
        let point = entering_line.line_intersection(&exiting_line)?;
        if (point - start).dot(entering) <= 0.0 {
            return None;
        }
        Some(point)
    }

    // ─── Finalization ────────────────────────────────────────────────────

    fn finalize_candidate(&mut self) {
        let Some(candidate) = self.candidate.take() else {
            // Nothing ever fit; restart from the latest sample.
            self.curve_start = self.last_sample;
            return;
        };
        let outline = self.outline(&candidate);
        self.segments.push(outline);
        self.exit_tangent = candidate.curve.derivative_at(1.0).normalized();
        self.curve_start = candidate.end;
    }

    /// Convert a centerline curve into a closed renderable outline: the
    /// two edges are the centerline offset by half the stroke width along
    /// the normal, joined by straight caps.
    fn outline(&self, candidate: &Candidate) -> StrokeSegment {
        let curve = candidate.curve;
        let w0 = self.curve_start.width * 0.5;
        let w1 = candidate.end.width * 0.5;
        let wc = (w0 + w1) * 0.5;

        let fallback = (curve.p2 - curve.p0)
            .normalized()
            .map(Vec2::orthogonal)
            .unwrap_or(Vec2::UNIT_Y);
        let n0 = curve.normal_at(0.0).unwrap_or(fallback);
        let nc = curve.normal_at(0.5).unwrap_or(fallback);
        let n1 = curve.normal_at(1.0).unwrap_or(fallback);

        let upper_start = curve.p0 + n0 * w0;
        let upper = PathCmd::QuadTo { ctrl: curve.p1 + nc * wc, end: curve.p2 + n1 * w1 };
        let lower_start = curve.p2 - n1 * w1;
        let lower = PathCmd::QuadTo { ctrl: curve.p1 - nc * wc, end: curve.p0 - n0 * w0 };

        let path = Path::new(
            upper_start,
            vec![
                upper,
                PathCmd::LineTo(lower_start),
                lower,
                PathCmd::LineTo(upper_start),
            ],
        );
        StrokeSegment::new(path, PathStyle::filled(self.color))
    }

    /// A small circular approximation around the start point, replacing a
    /// degenerate zero-length stroke.
    fn dot_segment(&self) -> StrokeSegment {
        let center = self.curve_start.pos;
        let radius = (self.curve_start.width * 0.5).max(self.min_fit_tolerance.max(0.1));

        let east = center + Vec2::new(radius, 0.0);
        let south = center + Vec2::new(0.0, radius);
        let west = center + Vec2::new(-radius, 0.0);
        let north = center + Vec2::new(0.0, -radius);
        let corner = |x: f64, y: f64| center + Vec2::new(x * radius, y * radius);

        let path = Path::new(
            east,
            vec![
                PathCmd::QuadTo { ctrl: corner(1.0, 1.0), end: south },
                PathCmd::QuadTo { ctrl: corner(-1.0, 1.0), end: west },
                PathCmd::QuadTo { ctrl: corner(-1.0, -1.0), end: north },
                PathCmd::QuadTo { ctrl: corner(1.0, -1.0), end: east },
            ],
        );
        StrokeSegment::new(path, PathStyle::filled(self.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, t: f64) -> StrokeSample {
        StrokeSample { pos: Vec2::new(x, y), width: 1.0, time_ms: t }
    }

    fn builder_from(samples: &[StrokeSample], min_fit: f64, max_fit: f64) -> StrokeBuilder {
        let mut b = StrokeBuilder::new(samples[0], Color::BLACK, min_fit, max_fit);
        for s in &samples[1..] {
            b.add_sample(*s);
        }
        b
    }

    #[test]
    fn straight_line_fits_one_segment() {
        let samples = [sample(0.0, 0.0, 0.0), sample(1.0, 0.0, 10.0), sample(2.0, 0.0, 20.0)];
        let stroke = builder_from(&samples, 0.1, 2.0).build();
        assert_eq!(stroke.segments.len(), 1);

        // The outline covers the whole run with half-width margins.
        let bbox = stroke.segments[0].path.bbox();
        assert!(bbox.w >= 2.0);
        assert!(bbox.h >= 0.9 && bbox.h <= 1.5, "height {}", bbox.h);
    }

    #[test]
    fn degenerate_samples_are_discarded() {
        let mut b = StrokeBuilder::new(sample(0.0, 0.0, 0.0), Color::BLACK, 0.1, 2.0);
        // Duplicate position.
        b.add_sample(sample(0.0, 0.0, 5.0));
        // Zero elapsed time.
        b.add_sample(sample(1.0, 0.0, 0.0));
        // Non-finite.
        b.add_sample(StrokeSample { pos: Vec2::new(f64::NAN, 0.0), width: 1.0, time_ms: 6.0 });
        // One good sample still builds a stroke.
        b.add_sample(sample(1.0, 0.0, 10.0));
        let stroke = b.build();
        assert_eq!(stroke.segments.len(), 1);
    }

    #[test]
    fn single_point_gesture_becomes_a_dot() {
        let b = StrokeBuilder::new(
            StrokeSample { pos: Vec2::new(5.0, 5.0), width: 2.0, time_ms: 0.0 },
            Color::BLACK,
            0.1,
            2.0,
        );
        let stroke = b.build();
        assert_eq!(stroke.segments.len(), 1);
        let bbox = stroke.segments[0].path.bbox();
        // Roughly a 2×2 disc around (5, 5).
        assert!(bbox.contains_point(Vec2::new(5.0, 5.0)));
        assert!((bbox.w - 2.0).abs() < 0.5, "width {}", bbox.w);
    }

    #[test]
    fn preview_includes_in_progress_curve() {
        let mut b = StrokeBuilder::new(sample(0.0, 0.0, 0.0), Color::BLACK, 0.1, 2.0);
        assert!(b.preview().is_empty());
        b.add_sample(sample(1.0, 0.2, 10.0));
        assert_eq!(b.preview().len(), 1);
    }

    #[test]
    fn widening_tolerance_never_adds_segments() {
        // A zig-zag that violates a tight band but fits a loose one.
        let mut samples = vec![sample(0.0, 0.0, 0.0)];
        for i in 1..12 {
            let y = if i % 2 == 0 { 0.3 } else { -0.3 };
            samples.push(sample(i as f64, y, i as f64 * 10.0));
        }

        let tight = builder_from(&samples, 0.05, 0.05).build();
        let loose = builder_from(&samples, 1.0, 2.0).build();

        assert_eq!(loose.segments.len(), 1, "loose tolerance should fit one curve");
        assert!(
            loose.segments.len() <= tight.segments.len(),
            "widening the band must not add segments: tight={} loose={}",
            tight.segments.len(),
            loose.segments.len()
        );
        assert!(tight.segments.len() > 1, "tight band should split the zig-zag");
    }

    #[test]
    fn curve_segments_connect_end_to_start() {
        // A right-angle turn forces at least two curves; the second must
        // start where the first ended.
        let mut samples = vec![sample(0.0, 0.0, 0.0)];
        for i in 1..=5 {
            samples.push(sample(i as f64, 0.0, i as f64 * 10.0));
        }
        for i in 1..=5 {
            samples.push(sample(5.0, i as f64, 50.0 + i as f64 * 10.0));
        }
        let stroke = builder_from(&samples, 0.05, 0.1).build();
        assert!(stroke.segments.len() >= 2);

        // Consecutive outline bboxes share the junction area.
        for pair in stroke.segments.windows(2) {
            let a = pair[0].path.bbox().grown(0.2);
            let b = pair[1].path.bbox().grown(0.2);
            assert!(a.intersects(&b), "segments should chain");
        }
    }
}
