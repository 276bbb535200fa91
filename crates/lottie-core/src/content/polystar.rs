use super::{
    bind_trim, invalidate, Content, ContentId, ContentLoader, PathCache, PathContent, PathContext,
    PointSource,
};
use crate::animatable::{AnimationId, AnimationTable};
use crate::error::CompositionError;
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Point};
use lottie_data::model::{PolystarShape, Property};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Control point length factor for star roundedness.
pub const STAR_MAGIC_NUMBER: f64 = 0.47829;
/// Control point length factor for polygon roundedness.
pub const POLYGON_MAGIC_NUMBER: f64 = 0.25;
/// Point counts above this are clamped before regeneration.
pub const MAX_POINTS: f64 = 1000.0;

const REVERSED_DIRECTION: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolystarKind {
    Star,
    Polygon,
}

impl PolystarKind {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(PolystarKind::Star),
            2 => Some(PolystarKind::Polygon),
            _ => None,
        }
    }
}

/// Star outline alternating between an outer and an inner radius.
///
/// Roundedness values are fractions (`0.0..=1.0`), not percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarGeometry {
    pub points: f64,
    pub rotation: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub outer_roundedness: f64,
    pub inner_roundedness: f64,
    pub position: Point,
    pub reversed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonGeometry {
    pub points: f64,
    pub rotation: f64,
    pub radius: f64,
    pub roundedness: f64,
    pub position: Point,
    pub reversed: bool,
}

/// A snapshot of polystar values, ready to be turned into a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolystarGeometry {
    Star(StarGeometry),
    Polygon(PolygonGeometry),
}

impl PolystarGeometry {
    pub fn to_path(&self) -> BezPath {
        match self {
            PolystarGeometry::Star(star) => star.to_path(),
            PolystarGeometry::Polygon(polygon) => polygon.to_path(),
        }
    }
}

fn degenerate_path(position: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(position);
    path.close_path();
    path
}

fn polar(radius: f64, angle: f64) -> Point {
    Point::new(radius * angle.cos(), radius * angle.sin())
}

/// Unit vector perpendicular to the ray from the origin through `p`.
fn tangent_dir(p: Point) -> kurbo::Vec2 {
    let theta = p.y.atan2(p.x) - PI / 2.0;
    kurbo::Vec2::new(theta.cos(), theta.sin())
}

impl StarGeometry {
    pub fn to_path(&self) -> BezPath {
        let points = self.points;
        if !points.is_finite() || points <= 0.0 {
            return degenerate_path(self.position);
        }
        let points = points.min(MAX_POINTS);

        let mut angle = (self.rotation - 90.0).to_radians();
        let mut angle_per_point = 2.0 * PI / points;
        if self.reversed {
            angle_per_point = -angle_per_point;
        }
        let half_angle_per_point = angle_per_point / 2.0;

        let partial = points - points.floor();
        if partial != 0.0 {
            angle += half_angle_per_point * (1.0 - partial);
        }

        let outer_radius = self.outer_radius;
        let inner_radius = self.inner_radius;
        let outer_roundedness = self.outer_roundedness;
        let inner_roundedness = self.inner_roundedness;

        let mut path = BezPath::new();
        let mut partial_radius = 0.0;
        let mut current = if partial != 0.0 {
            partial_radius = inner_radius + partial * (outer_radius - inner_radius);
            let p = polar(partial_radius, angle);
            angle += angle_per_point * partial / 2.0;
            p
        } else {
            let p = polar(outer_radius, angle);
            angle += half_angle_per_point;
            p
        };
        path.move_to(current);

        // Starts on the inner radius, heading inward
        let mut long_segment = false;
        let num_points = points.ceil() as usize * 2;
        for i in 0..num_points {
            let mut radius = if long_segment { outer_radius } else { inner_radius };
            let mut d_theta = half_angle_per_point;
            if partial_radius != 0.0 && i == num_points - 2 {
                d_theta = angle_per_point * partial / 2.0;
            }
            if partial_radius != 0.0 && i == num_points - 1 {
                radius = partial_radius;
            }

            let previous = current;
            current = polar(radius, angle);

            if inner_roundedness == 0.0 && outer_roundedness == 0.0 {
                path.line_to(current);
            } else {
                let (cp1_radius, cp1_roundedness, cp2_radius, cp2_roundedness) = if long_segment {
                    (inner_radius, inner_roundedness, outer_radius, outer_roundedness)
                } else {
                    (outer_radius, outer_roundedness, inner_radius, inner_roundedness)
                };

                let mut cp1 =
                    tangent_dir(previous) * (cp1_radius * cp1_roundedness * STAR_MAGIC_NUMBER);
                let mut cp2 =
                    tangent_dir(current) * (cp2_radius * cp2_roundedness * STAR_MAGIC_NUMBER);
                if partial != 0.0 {
                    if i == 0 {
                        cp1 *= partial;
                    } else if i == num_points - 1 {
                        cp2 *= partial;
                    }
                }

                path.curve_to(previous - cp1, current + cp2, current);
            }

            angle += d_theta;
            long_segment = !long_segment;
        }

        path.apply_affine(Affine::translate(self.position.to_vec2()));
        path.close_path();
        path
    }
}

impl PolygonGeometry {
    pub fn to_path(&self) -> BezPath {
        if !self.points.is_finite() {
            return degenerate_path(self.position);
        }
        let points = self.points.min(MAX_POINTS).floor();
        if points < 1.0 {
            return degenerate_path(self.position);
        }

        let mut angle = (self.rotation - 90.0).to_radians();
        let mut angle_per_point = 2.0 * PI / points;
        if self.reversed {
            angle_per_point = -angle_per_point;
        }

        let radius = self.radius;
        let roundedness = self.roundedness;

        let mut path = BezPath::new();
        let mut current = polar(radius, angle);
        path.move_to(current);
        angle += angle_per_point;

        for _ in 0..points as usize {
            let previous = current;
            current = polar(radius, angle);

            if roundedness != 0.0 {
                let length = radius * roundedness * POLYGON_MAGIC_NUMBER;
                let cp1 = tangent_dir(previous) * length;
                let cp2 = tangent_dir(current) * length;
                path.curve_to(previous - cp1, current + cp2, current);
            } else {
                path.line_to(current);
            }

            angle += angle_per_point;
        }

        path.apply_affine(Affine::translate(self.position.to_vec2()));
        path.close_path();
        path
    }
}

/// Animations driving one polystar. Inner values exist for stars only.
#[derive(Debug, Clone)]
pub struct PolystarProperties {
    pub points: AnimationId<f32>,
    pub position: PointSource,
    pub rotation: AnimationId<f32>,
    pub outer_radius: AnimationId<f32>,
    pub outer_roundedness: AnimationId<f32>,
    pub inner_radius: Option<AnimationId<f32>>,
    pub inner_roundedness: Option<AnimationId<f32>>,
}

fn finite_or_zero(value: f32) -> f64 {
    if value.is_finite() {
        value as f64
    } else {
        warn!(value, "non-finite polystar value read as zero");
        0.0
    }
}

impl PolystarProperties {
    fn geometry(
        &self,
        kind: PolystarKind,
        reversed: bool,
        animations: &AnimationTable,
    ) -> PolystarGeometry {
        let scalar = |id: AnimationId<f32>| finite_or_zero(*animations.value(id));
        let optional = |id: Option<AnimationId<f32>>| id.map(scalar).unwrap_or(0.0);

        let position = self.position.value(animations);
        let position = Point::new(
            finite_or_zero(position.x),
            finite_or_zero(position.y),
        );
        // Point count is not sanitized here; non-finite counts yield a degenerate path.
        let points = *animations.value(self.points) as f64;
        let rotation = scalar(self.rotation);

        match kind {
            PolystarKind::Star => PolystarGeometry::Star(StarGeometry {
                points,
                rotation,
                outer_radius: scalar(self.outer_radius),
                inner_radius: optional(self.inner_radius),
                outer_roundedness: scalar(self.outer_roundedness) / 100.0,
                inner_roundedness: optional(self.inner_roundedness) / 100.0,
                position,
                reversed,
            }),
            PolystarKind::Polygon => PolystarGeometry::Polygon(PolygonGeometry {
                points,
                rotation,
                radius: scalar(self.outer_radius),
                roundedness: scalar(self.outer_roundedness) / 100.0,
                position,
                reversed,
            }),
        }
    }
}

/// Star or polygon content with a cached path.
pub struct PolystarContent {
    id: ContentId,
    name: String,
    kind: PolystarKind,
    hidden: bool,
    reversed: bool,
    properties: PolystarProperties,
    trim: Option<ContentId>,
    cache: PathCache,
}

impl PolystarContent {
    pub fn load(
        shape: &PolystarShape,
        loader: &mut ContentLoader<'_>,
    ) -> Result<Self, CompositionError> {
        let name = shape.nm.clone().unwrap_or_default();
        let kind =
            PolystarKind::from_raw(shape.sy).ok_or_else(|| CompositionError::UnknownPolystarKind {
                name: name.clone(),
                raw: shape.sy,
            })?;

        let points = loader.scalar(&shape.pt, 0.0);
        let position = loader.position(&shape.p);
        let rotation = loader.scalar(&shape.r, 0.0);
        let outer_radius = loader.scalar(&shape.or, 0.0);
        let outer_roundedness = loader.scalar(&shape.os, 0.0);

        let (inner_radius, inner_roundedness) = match kind {
            PolystarKind::Star => {
                let inner_radius = match &shape.ir {
                    Some(ir) => loader.scalar(ir, 0.0),
                    None => {
                        warn!(name = %name, "star without inner radius, using 0");
                        loader.scalar(&Property::default(), 0.0)
                    }
                };
                let is = shape.is.clone().unwrap_or_default();
                (Some(inner_radius), Some(loader.scalar(&is, 0.0)))
            }
            PolystarKind::Polygon => (None, None),
        };

        Ok(Self {
            id: loader.owner(),
            name,
            kind,
            hidden: shape.hd.unwrap_or(false),
            reversed: shape.d == Some(REVERSED_DIRECTION),
            properties: PolystarProperties {
                points,
                position,
                rotation,
                outer_radius,
                outer_roundedness,
                inner_radius,
                inner_roundedness,
            },
            trim: None,
            cache: PathCache::default(),
        })
    }

    pub fn kind(&self) -> PolystarKind {
        self.kind
    }

    pub fn properties(&self) -> &PolystarProperties {
        &self.properties
    }

    /// Current values as a geometry snapshot, without touching the cache.
    pub fn geometry(&self, animations: &AnimationTable) -> PolystarGeometry {
        self.properties.geometry(self.kind, self.reversed, animations)
    }
}

impl PathContent for PolystarContent {
    fn id(&self) -> ContentId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_value_changed(&mut self, surface: &mut dyn Surface) {
        invalidate(&mut self.cache, self.id, surface);
    }

    fn set_contents(
        &mut self,
        before: &[Content],
        after: &[Content],
        animations: &mut AnimationTable,
    ) {
        self.trim = bind_trim(self.id, before, after, animations);
    }

    fn trim_binding(&self) -> Option<ContentId> {
        self.trim
    }

    fn is_fresh(&self) -> bool {
        self.cache.is_fresh()
    }

    fn path(&mut self, ctx: &PathContext<'_>) -> &BezPath {
        let Self {
            id,
            kind,
            hidden,
            reversed,
            properties,
            trim,
            cache,
            ..
        } = self;

        cache.get_or_build(|| {
            if *hidden {
                return BezPath::new();
            }
            let mut path = properties.geometry(*kind, *reversed, ctx.animations()).to_path();
            ctx.apply_trim(*trim, &mut path);
            debug!(
                content = id.index(),
                kind = ?kind,
                elements = path.elements().len(),
                "regenerated polystar path"
            );
            path
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::FrameRange;
    use kurbo::PathEl;

    fn star(points: f64) -> StarGeometry {
        StarGeometry {
            points,
            rotation: 0.0,
            outer_radius: 100.0,
            inner_radius: 50.0,
            outer_roundedness: 0.0,
            inner_roundedness: 0.0,
            position: Point::ZERO,
            reversed: false,
        }
    }

    fn polygon(points: f64) -> PolygonGeometry {
        PolygonGeometry {
            points,
            rotation: 0.0,
            radius: 100.0,
            roundedness: 0.0,
            position: Point::ZERO,
            reversed: false,
        }
    }

    fn end_point(el: &PathEl) -> Option<Point> {
        match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(p),
            PathEl::QuadTo(_, p) => Some(p),
            PathEl::CurveTo(_, _, p) => Some(p),
            PathEl::ClosePath => None,
        }
    }

    fn vertices(path: &BezPath) -> Vec<Point> {
        path.elements().iter().filter_map(end_point).collect()
    }

    fn assert_close(actual: Point, expected: (f64, f64)) {
        assert!(
            actual.distance(Point::new(expected.0, expected.1)) < 1e-9,
            "{:?} != {:?}",
            actual,
            expected
        );
    }

    #[test]
    fn test_four_point_polygon() {
        let path = polygon(4.0).to_path();
        let els = path.elements();

        assert_eq!(els.len(), 6);
        assert!(matches!(els[0], PathEl::MoveTo(_)));
        assert!(els[1..5].iter().all(|el| matches!(el, PathEl::LineTo(_))));
        assert_eq!(els[5], PathEl::ClosePath);

        let v = vertices(&path);
        assert_close(v[0], (0.0, -100.0));
        assert_close(v[1], (100.0, 0.0));
        assert_close(v[2], (0.0, 100.0));
        assert_close(v[3], (-100.0, 0.0));
        assert_close(v[4], (0.0, -100.0));
    }

    #[test]
    fn test_five_point_star_vertices() {
        let path = star(5.0).to_path();
        let els = path.elements();

        // move_to, 10 line_tos, close
        assert_eq!(els.len(), 12);
        assert!(matches!(els[0], PathEl::MoveTo(_)));
        assert_eq!(els[11], PathEl::ClosePath);

        for (i, p) in vertices(&path).iter().enumerate() {
            let expected_radius = if i % 2 == 0 { 100.0 } else { 50.0 };
            let expected_angle = (-90.0 + 36.0 * i as f64).to_radians();
            assert!((p.to_vec2().hypot() - expected_radius).abs() < 1e-9);
            let expected = polar(expected_radius, expected_angle);
            assert_close(*p, (expected.x, expected.y));
        }
    }

    #[test]
    fn test_position_offsets_every_vertex() {
        let mut geometry = polygon(4.0);
        geometry.position = Point::new(250.0, 125.0);
        let v = vertices(&geometry.to_path());
        assert_close(v[0], (250.0, 25.0));
        assert_close(v[1], (350.0, 125.0));
    }

    #[test]
    fn test_rotation_turns_first_vertex() {
        let mut geometry = polygon(4.0);
        geometry.rotation = 90.0;
        let v = vertices(&geometry.to_path());
        assert_close(v[0], (100.0, 0.0));
    }

    #[test]
    fn test_roundedness_switches_to_curves() {
        let mut geometry = polygon(5.0);
        assert!(geometry
            .to_path()
            .elements()
            .iter()
            .all(|el| !matches!(el, PathEl::CurveTo(..))));

        geometry.roundedness = 1e-4;
        let path = geometry.to_path();
        let curves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::CurveTo(..)))
            .count();
        assert_eq!(curves, 5);
    }

    fn first_cp1_offset(path: &BezPath) -> f64 {
        let start = match path.elements()[0] {
            PathEl::MoveTo(p) => p,
            other => panic!("expected move_to, got {:?}", other),
        };
        match path.elements()[1] {
            PathEl::CurveTo(cp1, _, _) => cp1.distance(start),
            other => panic!("expected curve_to, got {:?}", other),
        }
    }

    #[test]
    fn test_control_points_scale_linearly_with_roundedness() {
        let mut geometry = polygon(6.0);
        geometry.roundedness = 0.1;
        let low = first_cp1_offset(&geometry.to_path());
        geometry.roundedness = 0.2;
        let high = first_cp1_offset(&geometry.to_path());

        assert!((low - 100.0 * 0.1 * POLYGON_MAGIC_NUMBER).abs() < 1e-9);
        assert!((high - 2.0 * low).abs() < 1e-9);

        let mut rounded_star = star(5.0);
        rounded_star.outer_roundedness = 0.5;
        let offset = first_cp1_offset(&rounded_star.to_path());
        assert!((offset - 100.0 * 0.5 * STAR_MAGIC_NUMBER).abs() < 1e-9);
    }

    /// `(start, cp1, cp2, end)` of every cubic in `path`.
    fn cubics(path: &BezPath) -> Vec<(Point, Point, Point, Point)> {
        let mut last = Point::ZERO;
        let mut out = Vec::new();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => last = p,
                PathEl::CurveTo(cp1, cp2, p) => {
                    out.push((last, cp1, cp2, p));
                    last = p;
                }
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_partial_point_scales_outer_control_points() {
        let mut geometry = star(5.5);
        geometry.outer_roundedness = 0.5;
        geometry.inner_roundedness = 0.5;
        let segments = cubics(&geometry.to_path());
        assert_eq!(segments.len(), 12);

        let scaled = 100.0 * 0.5 * STAR_MAGIC_NUMBER * 0.5;
        let (start, cp1, _, _) = segments[0];
        assert!((cp1.distance(start) - scaled).abs() < 1e-9);
        let (_, _, cp2, end) = segments[11];
        assert!((cp2.distance(end) - scaled).abs() < 1e-9);

        // Segments in between keep their full length
        let (start, cp1, _, _) = segments[2];
        assert!((cp1.distance(start) - 100.0 * 0.5 * STAR_MAGIC_NUMBER).abs() < 1e-9);
    }

    #[test]
    fn test_inner_roundedness_applies_at_inner_vertices() {
        let mut geometry = star(5.0);
        geometry.inner_roundedness = 0.5;
        let segments = cubics(&geometry.to_path());
        let inner = 50.0 * 0.5 * STAR_MAGIC_NUMBER;

        // Heading inward: cp1 sits on the outer vertex, cp2 is pulled off the inner one
        let (start, cp1, cp2, end) = segments[0];
        assert!(cp1.distance(start) < 1e-9);
        assert!((cp2.distance(end) - inner).abs() < 1e-9);

        // Heading outward the roles swap
        let (start, cp1, cp2, end) = segments[1];
        assert!((cp1.distance(start) - inner).abs() < 1e-9);
        assert!(cp2.distance(end) < 1e-9);
    }

    #[test]
    fn test_outer_roundedness_applies_at_outer_vertices() {
        let mut geometry = star(5.0);
        geometry.outer_roundedness = 0.5;
        let segments = cubics(&geometry.to_path());
        let outer = 100.0 * 0.5 * STAR_MAGIC_NUMBER;

        let (start, cp1, cp2, end) = segments[0];
        assert!((cp1.distance(start) - outer).abs() < 1e-9);
        assert!(cp2.distance(end) < 1e-9);

        let (start, cp1, cp2, end) = segments[1];
        assert!(cp1.distance(start) < 1e-9);
        assert!((cp2.distance(end) - outer).abs() < 1e-9);
    }

    #[test]
    fn test_partial_points_are_continuous() {
        let whole = star(5.0).to_path();
        assert_eq!(whole.elements().len(), 12);

        let mut points = 5.01;
        while points < 5.99 {
            let a = star(points).to_path();
            let b = star(points + 0.001).to_path();
            assert_eq!(a.elements().len(), 14, "points = {}", points);
            assert_eq!(b.elements().len(), 14);

            let moved = vertices(&a)
                .iter()
                .zip(vertices(&b).iter())
                .map(|(p, q)| p.distance(*q))
                .fold(0.0, f64::max);
            assert!(moved < 1.0, "jump of {} at {} points", moved, points);
            points += 0.05;
        }
    }

    #[test]
    fn test_partial_point_radius_sits_between_inner_and_outer() {
        let path = star(5.5).to_path();
        let v = vertices(&path);
        let r0 = v[0].to_vec2().hypot();
        assert!((r0 - 75.0).abs() < 1e-9);
        // Closes back on the partial point
        assert!(v.last().unwrap().distance(v[0]) < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs_produce_a_minimal_path() {
        let position = Point::new(10.0, 20.0);
        let expected = [PathEl::MoveTo(position), PathEl::ClosePath];

        for points in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let mut s = star(points);
            s.position = position;
            assert_eq!(s.to_path().elements(), &expected, "star with {} points", points);
        }

        for points in [0.0, 0.9, f64::NAN] {
            let mut p = polygon(points);
            p.position = position;
            assert_eq!(p.to_path().elements(), &expected, "polygon with {} points", points);
        }
    }

    #[test]
    fn test_point_count_is_capped() {
        let path = polygon(1e9).to_path();
        assert_eq!(path.elements().len(), MAX_POINTS as usize + 2);
    }

    #[test]
    fn test_reversed_direction_mirrors_the_walk() {
        let mut geometry = polygon(4.0);
        geometry.reversed = true;
        let v = vertices(&geometry.to_path());
        assert_close(v[0], (0.0, -100.0));
        assert_close(v[1], (-100.0, 0.0));
        assert_close(v[2], (0.0, 100.0));
    }

    fn load(
        json: serde_json::Value,
        table: &mut AnimationTable,
    ) -> Result<PolystarContent, CompositionError> {
        let shape: PolystarShape = serde_json::from_value(json).unwrap();
        let mut loader = ContentLoader::new(table, FrameRange::new(0.0, 60.0), ContentId::new(0));
        PolystarContent::load(&shape, &mut loader)
    }

    #[test]
    fn test_load_polygon_has_no_inner_values() {
        let mut table = AnimationTable::new();
        let content = load(
            serde_json::json!({
                "nm": "Hex", "sy": 2,
                "pt": { "a": 0, "k": 6 },
                "or": { "a": 0, "k": 40 },
                "os": { "a": 0, "k": 0 }
            }),
            &mut table,
        )
        .unwrap();

        assert_eq!(content.kind(), PolystarKind::Polygon);
        assert!(content.properties().inner_radius.is_none());
        assert!(content.properties().inner_roundedness.is_none());
        assert_eq!(content.name(), "Hex");
    }

    #[test]
    fn test_load_rejects_unknown_kind() {
        let mut table = AnimationTable::new();
        let err = load(
            serde_json::json!({
                "nm": "Odd", "sy": 7,
                "pt": { "a": 0, "k": 5 },
                "or": { "a": 0, "k": 40 }
            }),
            &mut table,
        )
        .err()
        .unwrap();

        assert!(matches!(err, CompositionError::UnknownPolystarKind { raw: 7, .. }));
    }

    #[test]
    fn test_hidden_polystar_has_an_empty_path() {
        let mut table = AnimationTable::new();
        let mut content = load(
            serde_json::json!({
                "sy": 1, "hd": true,
                "pt": { "a": 0, "k": 5 },
                "or": { "a": 0, "k": 40 },
                "ir": { "a": 0, "k": 20 }
            }),
            &mut table,
        )
        .unwrap();

        let ctx = PathContext::new(&table, &[], &[]);
        assert!(content.path(&ctx).elements().is_empty());
        assert!(content.is_fresh());
    }
}
