use super::{ContentId, ContentLoader};
use crate::animatable::{AnimationId, AnimationTable};
use crate::measure::PathMeasure;
use kurbo::BezPath;
use lottie_data::model::TrimShape;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    /// One trim window over every bound path.
    Simultaneously,
    /// Paths trimmed one after another. Never bound by path contents.
    Individually,
}

impl TrimMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            2 => TrimMode::Individually,
            _ => TrimMode::Simultaneously,
        }
    }
}

/// Trim window resolved from animation values. `start` and `end` are
/// fractions of the path length, `offset` is in turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimValues {
    pub start: f64,
    pub end: f64,
    pub offset: f64,
}

impl TrimValues {
    /// Values as stored in a document: percentages and degrees.
    pub fn from_raw(start: f32, end: f32, offset: f32) -> Self {
        Self {
            start: start as f64 / 100.0,
            end: end as f64 / 100.0,
            offset: offset as f64 / 360.0,
        }
    }

    /// Replaces `path` with the trimmed section of itself.
    pub fn apply(&self, path: &mut BezPath) {
        let Self { start, end, offset } = *self;
        if !(start.is_finite() && end.is_finite() && offset.is_finite()) {
            warn!(start, end, offset, "skipping trim with non-finite values");
            return;
        }
        if start == 1.0 && end == 0.0 {
            return;
        }

        let measure = PathMeasure::new(path);
        let length = measure.length();
        if length < 1.0 || (end - start - 1.0).abs() < 0.01 {
            return;
        }

        let mut new_start = start.min(end) * length + offset * length;
        let mut new_end = start.max(end) * length + offset * length;

        if new_start >= length && new_end >= length {
            new_start = new_start.rem_euclid(length);
            new_end = new_end.rem_euclid(length);
        }
        if new_start < 0.0 {
            new_start = new_start.rem_euclid(length);
        }
        if new_end < 0.0 {
            new_end = new_end.rem_euclid(length);
        }

        if new_start == new_end {
            *path = BezPath::new();
            return;
        }
        if new_start >= new_end {
            new_start -= length;
        }

        let mut trimmed = BezPath::new();
        measure.segment(new_start, new_end, &mut trimmed);
        if new_end > length {
            measure.segment(0.0, new_end % length, &mut trimmed);
        } else if new_start < 0.0 {
            measure.segment(length + new_start, length, &mut trimmed);
        }
        *path = trimmed;
    }
}

/// Trim path operator. It owns no geometry; path contents that bind it
/// subscribe to its animations and apply its window to their own path.
pub struct TrimPathContent {
    id: ContentId,
    name: String,
    mode: TrimMode,
    hidden: bool,
    group: Option<ContentId>,
    start: AnimationId<f32>,
    end: AnimationId<f32>,
    offset: AnimationId<f32>,
}

impl TrimPathContent {
    pub fn load(shape: &TrimShape, loader: &mut ContentLoader<'_>) -> Self {
        Self {
            id: loader.owner(),
            name: shape.nm.clone().unwrap_or_default(),
            mode: TrimMode::from_raw(shape.m),
            hidden: shape.hd.unwrap_or(false),
            group: loader.group(),
            start: loader.unobserved_scalar(&shape.s, 0.0),
            end: loader.unobserved_scalar(&shape.e, 100.0),
            offset: loader.unobserved_scalar(&shape.o, 0.0),
        }
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> TrimMode {
        self.mode
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Group the trim belongs to. Only contents of that group are trimmed.
    pub fn group(&self) -> Option<ContentId> {
        self.group
    }

    pub fn start(&self) -> AnimationId<f32> {
        self.start
    }

    pub fn end(&self) -> AnimationId<f32> {
        self.end
    }

    pub fn offset(&self) -> AnimationId<f32> {
        self.offset
    }

    /// Registers `listener` on the start, end and offset animations.
    pub fn subscribe(&self, listener: ContentId, animations: &mut AnimationTable) {
        animations.add_listener(self.start, listener);
        animations.add_listener(self.end, listener);
        animations.add_listener(self.offset, listener);
    }

    pub fn values(&self, animations: &AnimationTable) -> TrimValues {
        TrimValues::from_raw(
            *animations.value(self.start),
            *animations.value(self.end),
            *animations.value(self.offset),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{PathEl, Point};

    fn square() -> BezPath {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((100.0, 0.0));
        path.line_to((100.0, 100.0));
        path.line_to((0.0, 100.0));
        path.close_path();
        path
    }

    fn trimmed(start: f32, end: f32, offset: f32) -> BezPath {
        let mut path = square();
        TrimValues::from_raw(start, end, offset).apply(&mut path);
        path
    }

    fn first_point(path: &BezPath) -> Point {
        match path.elements()[0] {
            PathEl::MoveTo(p) => p,
            other => panic!("expected move_to, got {:?}", other),
        }
    }

    #[test]
    fn test_mode_from_raw() {
        assert_eq!(TrimMode::from_raw(1), TrimMode::Simultaneously);
        assert_eq!(TrimMode::from_raw(0), TrimMode::Simultaneously);
        assert_eq!(TrimMode::from_raw(2), TrimMode::Individually);
    }

    #[test]
    fn test_full_window_leaves_path_untouched() {
        assert_eq!(trimmed(0.0, 100.0, 0.0), square());
        assert_eq!(trimmed(100.0, 0.0, 0.0), square());
    }

    #[test]
    fn test_half_window() {
        let path = trimmed(0.0, 50.0, 0.0);
        assert!((PathMeasure::new(&path).length() - 200.0).abs() < 1e-6);
        assert!(first_point(&path).distance(Point::ZERO) < 1e-6);
    }

    #[test]
    fn test_start_and_end_are_order_independent() {
        let a = trimmed(10.0, 60.0, 0.0);
        let b = trimmed(60.0, 10.0, 0.0);
        assert!(first_point(&a).distance(first_point(&b)) < 1e-6);
        assert!((PathMeasure::new(&a).length() - PathMeasure::new(&b).length()).abs() < 1e-6);
    }

    #[test]
    fn test_offset_wraps_past_the_end() {
        // 75% offset pushes the window over the end of the path
        let path = trimmed(0.0, 50.0, 270.0);
        assert!((PathMeasure::new(&path).length() - 200.0).abs() < 1e-6);
        assert!(first_point(&path).distance(Point::new(0.0, 100.0)) < 1e-6);
        let moves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn test_negative_offset_wraps_before_the_start() {
        let path = trimmed(0.0, 25.0, -90.0);
        assert!((PathMeasure::new(&path).length() - 100.0).abs() < 1e-6);
        assert!(first_point(&path).distance(Point::new(0.0, 100.0)) < 1e-6);
    }

    #[test]
    fn test_empty_window_clears_the_path() {
        assert!(trimmed(30.0, 30.0, 0.0).elements().is_empty());
    }

    #[test]
    fn test_short_paths_and_bad_values_are_skipped() {
        let mut tiny = BezPath::new();
        tiny.move_to((0.0, 0.0));
        tiny.line_to((0.5, 0.0));
        let before = tiny.clone();
        TrimValues::from_raw(0.0, 50.0, 0.0).apply(&mut tiny);
        assert_eq!(tiny, before);

        assert_eq!(trimmed(f32::NAN, 50.0, 0.0), square());
    }
}
