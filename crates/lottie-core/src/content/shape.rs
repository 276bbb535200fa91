use super::{
    bind_trim, invalidate, Content, ContentId, ContentLoader, PathCache, PathContent, PathContext,
};
use crate::animatable::{AnimationId, AnimationTable};
use crate::surface::Surface;
use kurbo::{BezPath, Point};
use lottie_data::model::{BezierPath, PathShape};
use tracing::debug;

fn point(v: [f32; 2]) -> Point {
    Point::new(v[0] as f64, v[1] as f64)
}

/// Vertices with relative in/out tangents to absolute cubic segments.
pub fn convert_bezier_path(path_data: &BezierPath) -> BezPath {
    let mut bp = BezPath::new();
    let vertices = &path_data.v;
    let Some(&start) = vertices.first() else {
        return bp;
    };
    bp.move_to(point(start));

    for i in 0..vertices.len() {
        let next_idx = (i + 1) % vertices.len();
        if next_idx == 0 && !path_data.c {
            break;
        }
        let p0 = vertices[i];
        let p1 = vertices[next_idx];
        // Missing tangents mean a sharp corner
        let o = path_data.o.get(i).copied().unwrap_or([0.0, 0.0]);
        let in_ = path_data.i.get(next_idx).copied().unwrap_or([0.0, 0.0]);
        bp.curve_to(
            point([p0[0] + o[0], p0[1] + o[1]]),
            point([p1[0] + in_[0], p1[1] + in_[1]]),
            point(p1),
        );
    }
    if path_data.c {
        bp.close_path();
    }
    bp
}

/// Free-form bezier path content.
pub struct ShapeContent {
    id: ContentId,
    name: String,
    hidden: bool,
    shape: AnimationId<BezierPath>,
    trim: Option<ContentId>,
    cache: PathCache,
}

impl ShapeContent {
    pub fn load(shape: &PathShape, loader: &mut ContentLoader<'_>) -> Self {
        Self {
            id: loader.owner(),
            name: shape.nm.clone().unwrap_or_default(),
            hidden: shape.hd.unwrap_or(false),
            shape: loader.bezier(&shape.ks),
            trim: None,
            cache: PathCache::default(),
        }
    }
}

impl PathContent for ShapeContent {
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
            shape,
            trim,
            cache,
            ..
        } = self;

        cache.get_or_build(|| {
            if *hidden {
                return BezPath::new();
            }
            let mut path = convert_bezier_path(ctx.animations().value(*shape));
            ctx.apply_trim(*trim, &mut path);
            debug!(content = id.index(), "regenerated shape path");
            path
        })
    }
}
