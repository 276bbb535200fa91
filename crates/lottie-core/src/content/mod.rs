//! Shape contents of a layer and the protocol they share: animations report
//! value changes to their owning content, which drops its cached path and asks
//! the surface for a redraw. The path is rebuilt lazily on the next read.

pub mod ellipse;
pub mod group;
pub mod polystar;
pub mod rect;
pub mod shape;
pub mod trim;

use crate::animatable::{AnimationId, AnimationTable, FrameRange, KeyframeAnimation};
use crate::error::CompositionError;
use crate::surface::Surface;
use glam::Vec2;
use kurbo::BezPath;
use lottie_data::model::{self as data, BezierPath, Point2, PositionProperty, Property};
use tracing::{debug, trace};

pub use ellipse::EllipseContent;
pub use group::GroupContent;
pub use polystar::{
    PolygonGeometry, PolystarContent, PolystarGeometry, PolystarKind, StarGeometry,
};
pub use rect::RectContent;
pub use shape::ShapeContent;
pub use trim::{TrimMode, TrimPathContent, TrimValues};

/// Position of a content inside its layer's content list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(usize);

impl ContentId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Cached geometry of a path content. `None` is stale, `Some` is fresh.
#[derive(Debug, Default)]
pub struct PathCache {
    fresh: Option<BezPath>,
}

impl PathCache {
    pub fn is_fresh(&self) -> bool {
        self.fresh.is_some()
    }

    /// Marks the cache stale. Idempotent.
    pub fn invalidate(&mut self) {
        self.fresh = None;
    }

    pub fn get_or_build(&mut self, build: impl FnOnce() -> BezPath) -> &BezPath {
        self.fresh.get_or_insert_with(build)
    }
}

/// What a content needs to rebuild its path: current animation values and
/// the other contents of its layer, split around it in document order.
pub struct PathContext<'a> {
    animations: &'a AnimationTable,
    before: &'a [Content],
    after: &'a [Content],
}

impl<'a> PathContext<'a> {
    pub fn new(
        animations: &'a AnimationTable,
        before: &'a [Content],
        after: &'a [Content],
    ) -> Self {
        Self {
            animations,
            before,
            after,
        }
    }

    pub fn animations(&self) -> &'a AnimationTable {
        self.animations
    }

    pub fn scalar(&self, id: AnimationId<f32>) -> f32 {
        *self.animations.value(id)
    }

    /// Another content of the layer. `None` for the content being built.
    pub fn sibling(&self, id: ContentId) -> Option<&'a Content> {
        let index = id.index();
        if index < self.before.len() {
            return self.before.get(index);
        }
        index
            .checked_sub(self.before.len() + 1)
            .and_then(|i| self.after.get(i))
    }

    pub fn apply_trim(&self, binding: Option<ContentId>, path: &mut BezPath) {
        let trim = binding
            .and_then(|id| self.sibling(id))
            .and_then(Content::as_trim);
        if let Some(trim) = trim {
            trim.values(self.animations).apply(path);
        }
    }
}

/// Position that is either one 2D animation or two scalar ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointSource {
    Unified(AnimationId<Vec2>),
    Split {
        x: AnimationId<f32>,
        y: AnimationId<f32>,
    },
}

impl PointSource {
    pub fn value(&self, animations: &AnimationTable) -> Vec2 {
        match self {
            PointSource::Unified(id) => *animations.value(*id),
            PointSource::Split { x, y } => Vec2::new(*animations.value(*x), *animations.value(*y)),
        }
    }
}

/// Inserts a content's animations into the layer table and subscribes the
/// content to each of them.
pub struct ContentLoader<'a> {
    animations: &'a mut AnimationTable,
    frames: FrameRange,
    owner: ContentId,
    group: Option<ContentId>,
}

impl<'a> ContentLoader<'a> {
    pub fn new(animations: &'a mut AnimationTable, frames: FrameRange, owner: ContentId) -> Self {
        Self {
            animations,
            frames,
            owner,
            group: None,
        }
    }

    /// Places the owner inside group `group`.
    pub fn in_group(mut self, group: Option<ContentId>) -> Self {
        self.group = group;
        self
    }

    pub fn owner(&self) -> ContentId {
        self.owner
    }

    /// Innermost group holding the owner, `None` at layer level.
    pub fn group(&self) -> Option<ContentId> {
        self.group
    }

    pub fn scalar(&mut self, prop: &Property<f32>, default: f32) -> AnimationId<f32> {
        let animation = KeyframeAnimation::from_property(prop, self.frames, |v| *v, default);
        self.register(animation)
    }

    /// Inserts a scalar animation nobody listens to yet. Operators use this
    /// for values that the contents they modify subscribe to instead.
    pub fn unobserved_scalar(&mut self, prop: &Property<f32>, default: f32) -> AnimationId<f32> {
        let animation = KeyframeAnimation::from_property(prop, self.frames, |v| *v, default);
        self.animations.insert(animation)
    }

    pub fn point(&mut self, prop: &Property<Point2>, default: Vec2) -> AnimationId<Vec2> {
        let animation =
            KeyframeAnimation::from_property(prop, self.frames, |v| Vec2::from_array(v.0), default);
        self.register(animation)
    }

    pub fn position(&mut self, prop: &PositionProperty) -> PointSource {
        match prop {
            PositionProperty::Unified(p) => PointSource::Unified(self.point(p, Vec2::ZERO)),
            PositionProperty::Split { x, y } => PointSource::Split {
                x: self.scalar(x, 0.0),
                y: self.scalar(y, 0.0),
            },
        }
    }

    pub fn bezier(&mut self, prop: &Property<BezierPath>) -> AnimationId<BezierPath> {
        let animation = KeyframeAnimation::from_property(
            prop,
            self.frames,
            |v| v.clone(),
            BezierPath::default(),
        );
        self.register(animation)
    }

    fn register<T: crate::animatable::AnimatedValue>(
        &mut self,
        animation: KeyframeAnimation<T>,
    ) -> AnimationId<T> {
        let id = self.animations.insert(animation);
        self.animations.add_listener(id, self.owner);
        id
    }
}

/// A content that produces a path.
pub trait PathContent {
    fn id(&self) -> ContentId;

    fn name(&self) -> &str;

    /// Invalidation entry point, called for every change of an owned or
    /// bound animation.
    fn on_value_changed(&mut self, surface: &mut dyn Surface);

    /// One-time setup with the contents surrounding this one in its layer,
    /// split around it in document order.
    fn set_contents(
        &mut self,
        before: &[Content],
        after: &[Content],
        animations: &mut AnimationTable,
    );

    fn trim_binding(&self) -> Option<ContentId>;

    fn is_fresh(&self) -> bool;

    fn path(&mut self, ctx: &PathContext<'_>) -> &BezPath;
}

/// Binds the trim that applies to `owner`. Layers paint their contents from
/// the end of the list, so the operators drawn before `owner` are the ones
/// that follow it in `after`. Those are scanned in paint order and the last
/// simultaneous trim found wins, which is the nearest one. A trim inside a
/// group only reaches contents of that same group.
/// The owner is subscribed to the bound trim's animations.
pub(crate) fn bind_trim(
    owner: ContentId,
    before: &[Content],
    after: &[Content],
    animations: &mut AnimationTable,
) -> Option<ContentId> {
    // Enclosing groups always come earlier in the list than their items
    let reaches_owner = |trim: &TrimPathContent| match trim.group() {
        None => true,
        Some(group) => before
            .get(group.index())
            .and_then(Content::as_group)
            .is_some_and(|group| group.contains(owner)),
    };

    let mut bound: Option<&TrimPathContent> = None;
    for trim in after.iter().rev().filter_map(Content::as_trim) {
        if trim.mode() == TrimMode::Simultaneously && !trim.is_hidden() && reaches_owner(trim) {
            bound = Some(trim);
        }
    }

    let trim = bound?;
    trim.subscribe(owner, animations);
    debug!(owner = owner.index(), trim = trim.id().index(), "bound trim path");
    Some(trim.id())
}

pub(crate) fn invalidate(cache: &mut PathCache, id: ContentId, surface: &mut dyn Surface) {
    trace!(content = id.index(), "path invalidated");
    cache.invalidate();
    surface.invalidate_self();
}

pub enum Content {
    Group(GroupContent),
    Polystar(PolystarContent),
    Rect(RectContent),
    Ellipse(EllipseContent),
    Shape(ShapeContent),
    Trim(TrimPathContent),
}

impl Content {
    /// Builds the content for `shape`, or `None` for shapes that do not take
    /// part in path generation. A group comes back without its items; the
    /// layer lays those out after it.
    pub fn load(
        shape: &data::Shape,
        loader: &mut ContentLoader<'_>,
    ) -> Result<Option<Self>, CompositionError> {
        let content = match shape {
            data::Shape::Group(gr) => Content::Group(GroupContent::load(gr, loader.owner())),
            data::Shape::Polystar(sr) => Content::Polystar(PolystarContent::load(sr, loader)?),
            data::Shape::Rect(rc) => Content::Rect(RectContent::load(rc, loader)),
            data::Shape::Ellipse(el) => Content::Ellipse(EllipseContent::load(el, loader)),
            data::Shape::Path(sh) => Content::Shape(ShapeContent::load(sh, loader)),
            data::Shape::Trim(tm) => Content::Trim(TrimPathContent::load(tm, loader)),
            data::Shape::Unknown => return Ok(None),
        };
        Ok(Some(content))
    }

    pub fn id(&self) -> ContentId {
        match self {
            Content::Group(group) => group.id(),
            Content::Trim(trim) => trim.id(),
            Content::Polystar(c) => c.id(),
            Content::Rect(c) => c.id(),
            Content::Ellipse(c) => c.id(),
            Content::Shape(c) => c.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Content::Group(group) => group.name(),
            Content::Trim(trim) => trim.name(),
            Content::Polystar(c) => c.name(),
            Content::Rect(c) => c.name(),
            Content::Ellipse(c) => c.name(),
            Content::Shape(c) => c.name(),
        }
    }

    pub fn on_value_changed(&mut self, surface: &mut dyn Surface) {
        match self {
            // No geometry of their own; bound contents are notified directly
            Content::Group(_) | Content::Trim(_) => {}
            Content::Polystar(c) => c.on_value_changed(surface),
            Content::Rect(c) => c.on_value_changed(surface),
            Content::Ellipse(c) => c.on_value_changed(surface),
            Content::Shape(c) => c.on_value_changed(surface),
        }
    }

    pub fn set_contents(
        &mut self,
        before: &[Content],
        after: &[Content],
        animations: &mut AnimationTable,
    ) {
        if let Some(path) = self.as_path_mut() {
            path.set_contents(before, after, animations);
        }
    }

    pub fn as_trim(&self) -> Option<&TrimPathContent> {
        match self {
            Content::Trim(trim) => Some(trim),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupContent> {
        match self {
            Content::Group(group) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupContent> {
        match self {
            Content::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_polystar(&self) -> Option<&PolystarContent> {
        match self {
            Content::Polystar(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&dyn PathContent> {
        match self {
            Content::Polystar(c) => Some(c),
            Content::Rect(c) => Some(c),
            Content::Ellipse(c) => Some(c),
            Content::Shape(c) => Some(c),
            Content::Group(_) | Content::Trim(_) => None,
        }
    }

    pub fn as_path_mut(&mut self) -> Option<&mut dyn PathContent> {
        match self {
            Content::Polystar(c) => Some(c),
            Content::Rect(c) => Some(c),
            Content::Ellipse(c) => Some(c),
            Content::Shape(c) => Some(c),
            Content::Group(_) | Content::Trim(_) => None,
        }
    }
}
