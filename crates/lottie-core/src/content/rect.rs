use super::{
    bind_trim, invalidate, Content, ContentId, ContentLoader, PathCache, PathContent, PathContext,
    PointSource,
};
use crate::animatable::{AnimationId, AnimationTable};
use crate::surface::Surface;
use glam::Vec2;
use kurbo::{BezPath, Point, Rect, Shape};
use lottie_data::model::RectShape;
use tracing::debug;

const PATH_TOLERANCE: f64 = 0.1;

/// Axis-aligned rectangle centered on its position.
pub fn rect_path(position: Point, size: kurbo::Size, radius: f64) -> BezPath {
    let rect = Rect::from_center_size(position, size);
    let max_radius = size.width.min(size.height).abs() / 2.0;
    let radius = if radius.is_finite() { radius.clamp(0.0, max_radius) } else { 0.0 };
    if radius > 0.0 {
        rect.to_rounded_rect(radius).to_path(PATH_TOLERANCE)
    } else {
        rect.to_path(PATH_TOLERANCE)
    }
}

pub struct RectContent {
    id: ContentId,
    name: String,
    hidden: bool,
    size: AnimationId<Vec2>,
    position: PointSource,
    radius: AnimationId<f32>,
    trim: Option<ContentId>,
    cache: PathCache,
}

impl RectContent {
    pub fn load(shape: &RectShape, loader: &mut ContentLoader<'_>) -> Self {
        Self {
            id: loader.owner(),
            name: shape.nm.clone().unwrap_or_default(),
            hidden: shape.hd.unwrap_or(false),
            size: loader.point(&shape.s, Vec2::ZERO),
            position: loader.position(&shape.p),
            radius: loader.scalar(&shape.r, 0.0),
            trim: None,
            cache: PathCache::default(),
        }
    }
}

impl PathContent for RectContent {
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
            size,
            position,
            radius,
            trim,
            cache,
            ..
        } = self;

        cache.get_or_build(|| {
            if *hidden {
                return BezPath::new();
            }
            let animations = ctx.animations();
            let size = *animations.value(*size);
            let position = position.value(animations);
            let mut path = rect_path(
                Point::new(position.x as f64, position.y as f64),
                kurbo::Size::new(size.x as f64, size.y as f64),
                ctx.scalar(*radius) as f64,
            );
            ctx.apply_trim(*trim, &mut path);
            debug!(content = id.index(), "regenerated rect path");
            path
        })
    }
}
