//! Arc-length measurement over a [`BezPath`], used to cut sub-paths for
//! trim operators.

use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathSeg, Point};

const ARCLEN_ACCURACY: f64 = 1e-3;

struct MeasuredSegment {
    seg: PathSeg,
    offset: f64,
    length: f64,
}

pub struct PathMeasure {
    segments: Vec<MeasuredSegment>,
    length: f64,
}

impl PathMeasure {
    pub fn new(path: &BezPath) -> Self {
        let mut segments = Vec::new();
        let mut length = 0.0;
        for seg in path.segments() {
            let seg_len = seg.arclen(ARCLEN_ACCURACY);
            segments.push(MeasuredSegment {
                seg,
                offset: length,
                length: seg_len,
            });
            length += seg_len;
        }
        Self { segments, length }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Appends the part of the path between arc lengths `start` and `end` to
    /// `out`, beginning with a `move_to`. Bounds are clamped to the path.
    pub fn segment(&self, start: f64, end: f64, out: &mut BezPath) {
        let start = start.max(0.0);
        let end = end.min(self.length);
        if start >= end {
            return;
        }

        let mut last: Option<Point> = None;
        for measured in &self.segments {
            let seg_end = measured.offset + measured.length;
            if measured.length <= 0.0 || seg_end <= start {
                continue;
            }
            if measured.offset >= end {
                break;
            }

            let t0 = if start > measured.offset {
                measured
                    .seg
                    .inv_arclen(start - measured.offset, ARCLEN_ACCURACY)
            } else {
                0.0
            };
            let t1 = if end < seg_end {
                measured
                    .seg
                    .inv_arclen(end - measured.offset, ARCLEN_ACCURACY)
            } else {
                1.0
            };

            let piece = measured.seg.subsegment(t0..t1);
            let piece_start = piece.start();
            // Consecutive segments of one contour share endpoints
            match last {
                Some(p) if p.distance(piece_start) < 1e-6 => {}
                _ => out.move_to(piece_start),
            }
            match piece {
                PathSeg::Line(line) => out.line_to(line.p1),
                PathSeg::Quad(quad) => out.quad_to(quad.p1, quad.p2),
                PathSeg::Cubic(cubic) => out.curve_to(cubic.p1, cubic.p2, cubic.p3),
            }
            last = Some(piece.end());
        }
    }
}
