use super::{
    bind_trim, invalidate, Content, ContentId, ContentLoader, PathCache, PathContent, PathContext,
    PointSource,
};
use crate::animatable::{AnimationId, AnimationTable};
use crate::surface::Surface;
use glam::Vec2;
use kurbo::{Affine, BezPath, Point};
use lottie_data::model::EllipseShape;
use tracing::debug;

/// Control point distance of a quarter ellipse, as a fraction of its radius.
pub const ELLIPSE_CONTROL_POINT_PERCENTAGE: f64 = 0.55228;

const REVERSED_DIRECTION: u8 = 3;

/// Four cubic quadrants starting at the top, clockwise unless `reversed`.
pub fn ellipse_path(position: Point, width: f64, height: f64, reversed: bool) -> BezPath {
    let hw = width / 2.0;
    let hh = height / 2.0;
    let cw = hw * ELLIPSE_CONTROL_POINT_PERCENTAGE;
    let ch = hh * ELLIPSE_CONTROL_POINT_PERCENTAGE;

    let mut path = BezPath::new();
    path.move_to((0.0, -hh));
    if reversed {
        path.curve_to((-cw, -hh), (-hw, -ch), (-hw, 0.0));
        path.curve_to((-hw, ch), (-cw, hh), (0.0, hh));
        path.curve_to((cw, hh), (hw, ch), (hw, 0.0));
        path.curve_to((hw, -ch), (cw, -hh), (0.0, -hh));
    } else {
        path.curve_to((cw, -hh), (hw, -ch), (hw, 0.0));
        path.curve_to((hw, ch), (cw, hh), (0.0, hh));
        path.curve_to((-cw, hh), (-hw, ch), (-hw, 0.0));
        path.curve_to((-hw, -ch), (-cw, -hh), (0.0, -hh));
    }
    path.apply_affine(Affine::translate(position.to_vec2()));
    path.close_path();
    path
}

pub struct EllipseContent {
    id: ContentId,
    name: String,
    hidden: bool,
    reversed: bool,
    size: AnimationId<Vec2>,
    position: PointSource,
    trim: Option<ContentId>,
    cache: PathCache,
}

impl EllipseContent {
    pub fn load(shape: &EllipseShape, loader: &mut ContentLoader<'_>) -> Self {
        Self {
            id: loader.owner(),
            name: shape.nm.clone().unwrap_or_default(),
            hidden: shape.hd.unwrap_or(false),
            reversed: shape.d == Some(REVERSED_DIRECTION),
            size: loader.point(&shape.s, Vec2::ZERO),
            position: loader.position(&shape.p),
            trim: None,
            cache: PathCache::default(),
        }
    }
}

impl PathContent for EllipseContent {
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
            hidden,
            reversed,
            size,
            position,
            trim,
            cache,
            ..
        } = self;

        cache.get_or_build(|| {
            if *hidden {
                return BezPath::new();
            }
            let size = *ctx.animations().value(*size);
            let position = position.value(ctx.animations());
            let mut path = ellipse_path(
                Point::new(position.x as f64, position.y as f64),
                size.x as f64,
                size.y as f64,
                *reversed,
            );
            ctx.apply_trim(*trim, &mut path);
            debug!(content = id.index(), "regenerated ellipse path");
            path
        })
    }
}
