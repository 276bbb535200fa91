use crate::content::ContentId;
use glam::Vec2;
use lottie_data::model::{self as data, BezierPath, Property, Value};
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;

pub trait Interpolatable: Sized + Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;

    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        _tan_in: Option<&[f32]>,
        _tan_out: Option<&[f32]>,
    ) -> Self {
        self.lerp(other, t)
    }
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }

    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        tan_in: Option<&[f32]>,
        tan_out: Option<&[f32]>,
    ) -> Self {
        let t_out = tangent_vec2(tan_out);
        let t_in = tangent_vec2(tan_in);

        // Straight motion path, plain lerp keeps the value exact at the ends.
        if t_out == Vec2::ZERO && t_in == Vec2::ZERO {
            return self.lerp(other, t);
        }

        let p0 = *self;
        let p3 = *other;
        let p1 = p0 + t_out;
        let p2 = p3 + t_in;

        let one_minus_t = 1.0 - t;
        let one_minus_t_sq = one_minus_t * one_minus_t;
        let one_minus_t_cub = one_minus_t_sq * one_minus_t;

        let t_sq = t * t;
        let t_cub = t_sq * t;

        p0 * one_minus_t_cub
            + p1 * 3.0 * one_minus_t_sq * t
            + p2 * 3.0 * one_minus_t * t_sq
            + p3 * t_cub
    }
}

fn tangent_vec2(tangent: Option<&[f32]>) -> Vec2 {
    match tangent {
        Some(t) if t.len() >= 2 => Vec2::new(t[0], t[1]),
        _ => Vec2::ZERO,
    }
}

impl Interpolatable for BezierPath {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        // Handle hold keyframes
        if t <= 0.0 {
            return self.clone();
        }
        if t >= 1.0 {
            return other.clone();
        }

        // Match vertex counts by using the minimum
        let min_verts = self.v.len().min(other.v.len());
        if min_verts == 0 {
            return self.clone();
        }

        let lerp2 = |a: [f32; 2], b: [f32; 2]| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];

        let mut new_v = Vec::with_capacity(min_verts);
        let mut new_i = Vec::with_capacity(min_verts);
        let mut new_o = Vec::with_capacity(min_verts);

        for i in 0..min_verts {
            new_v.push(lerp2(self.v[i], other.v[i]));

            // Missing tangents mean a sharp corner
            let i1 = self.i.get(i).copied().unwrap_or([0.0, 0.0]);
            let i2 = other.i.get(i).copied().unwrap_or([0.0, 0.0]);
            new_i.push(lerp2(i1, i2));

            let o1 = self.o.get(i).copied().unwrap_or([0.0, 0.0]);
            let o2 = other.o.get(i).copied().unwrap_or([0.0, 0.0]);
            new_o.push(lerp2(o1, o2));
        }

        BezierPath {
            c: self.c,
            v: new_v,
            i: new_i,
            o: new_o,
        }
    }
}

// Cubic Bezier Easing
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson
    let mut t = x;
    for _ in 0..8 {
        let one_minus_t = 1.0 - t;
        let x_est = 3.0 * one_minus_t * one_minus_t * t * p1.x
            + 3.0 * one_minus_t * t * t * p2.x
            + t * t * t;

        let err = x_est - x;
        if err.abs() < 1e-4 {
            break;
        }

        let dx_dt = 3.0 * one_minus_t * one_minus_t * p1.x
            + 6.0 * one_minus_t * t * (p2.x - p1.x)
            + 3.0 * t * t * (1.0 - p2.x);

        if dx_dt.abs() < 1e-6 {
            break;
        }
        t -= err / dx_dt;
    }

    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1.y + 3.0 * one_minus_t * t * t * p2.y + t * t * t
}

/// How progress inside one keyframe interval maps to the interpolation fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// Keeps the start value until the next keyframe.
    Hold,
    CubicBezier { out: Vec2, into: Vec2 },
}

impl Easing {
    /// Both handles of an interval live on its starting keyframe.
    fn from_keyframe<T>(kf: &data::Keyframe<T>) -> Self {
        if kf.h == Some(1) {
            return Easing::Hold;
        }
        match (&kf.o, &kf.i) {
            (Some(o), Some(i)) => Easing::CubicBezier {
                out: Vec2::new(
                    o.x.first().copied().unwrap_or(0.0),
                    o.y.first().copied().unwrap_or(0.0),
                ),
                into: Vec2::new(
                    i.x.first().copied().unwrap_or(1.0),
                    i.y.first().copied().unwrap_or(1.0),
                ),
            },
            _ => Easing::Linear,
        }
    }

    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::Hold => 0.0,
            Easing::CubicBezier { out, into } => solve_cubic_bezier(*out, *into, t),
        }
    }
}

/// One resolved keyframe: the interval starting at `frame` runs from
/// `start` to `end` over the time until the next keyframe.
#[derive(Debug, Clone)]
pub struct Keyframe<T> {
    pub frame: f32,
    pub start: T,
    pub end: T,
    pub easing: Easing,
    pub tangent_out: Option<Vec<f32>>,
    pub tangent_in: Option<Vec<f32>>,
}

/// Composition frames that progress `0.0..=1.0` maps onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRange {
    pub in_point: f32,
    pub out_point: f32,
}

impl FrameRange {
    pub fn new(in_point: f32, out_point: f32) -> Self {
        Self {
            in_point,
            out_point,
        }
    }

    pub fn duration(&self) -> f32 {
        self.out_point - self.in_point
    }

    pub fn frame_at(&self, progress: f32) -> f32 {
        self.in_point + progress * self.duration()
    }

    pub fn progress_at(&self, frame: f32) -> f32 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        ((frame - self.in_point) / duration).clamp(0.0, 1.0)
    }
}

/// A keyframed value evaluated at a normalized progress.
///
/// The value is recomputed eagerly in [`set_progress`](Self::set_progress)
/// and every registered listener is reported once when it changes.
#[derive(Debug, Clone)]
pub struct KeyframeAnimation<T> {
    keyframes: Vec<Keyframe<T>>,
    frames: FrameRange,
    progress: f32,
    value: T,
    listeners: Vec<ContentId>,
}

impl<T> KeyframeAnimation<T>
where
    T: Interpolatable + PartialEq,
{
    /// An animation that holds `value` for every progress.
    pub fn constant(value: T) -> Self {
        Self {
            keyframes: Vec::new(),
            frames: FrameRange::new(0.0, 0.0),
            progress: 0.0,
            value,
            listeners: Vec::new(),
        }
    }

    pub fn new(keyframes: Vec<Keyframe<T>>, frames: FrameRange, default: T) -> Self {
        let mut animation = Self {
            keyframes,
            frames,
            progress: 0.0,
            value: default,
            listeners: Vec::new(),
        };
        animation.value = animation.value_at_frame(frames.frame_at(0.0));
        animation
    }

    /// Resolves a descriptor property. Keyframes without a start value carry
    /// the previous keyframe's end value; missing end values take the next
    /// keyframe's start.
    pub fn from_property<D>(
        prop: &Property<D>,
        frames: FrameRange,
        convert: impl Fn(&D) -> T,
        default: T,
    ) -> Self {
        let keyframes = match &prop.k {
            Value::Default => return Self::constant(default),
            Value::Static(v) => return Self::constant(convert(v)),
            Value::Animated(keyframes) => keyframes,
        };

        let mut resolved = Vec::with_capacity(keyframes.len());
        let mut carried = default.clone();
        for (idx, kf) in keyframes.iter().enumerate() {
            let start = kf.s.as_ref().map(&convert).unwrap_or_else(|| carried.clone());
            let end = kf
                .e
                .as_ref()
                .or_else(|| keyframes.get(idx + 1).and_then(|next| next.s.as_ref()))
                .map(&convert)
                .unwrap_or_else(|| start.clone());
            carried = end.clone();
            resolved.push(Keyframe {
                frame: kf.t,
                start,
                end,
                easing: Easing::from_keyframe(kf),
                tangent_out: kf.to.clone(),
                tangent_in: kf.ti.clone(),
            });
        }

        Self::new(resolved, frames, default)
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    pub fn is_static(&self) -> bool {
        self.keyframes.len() <= 1
    }

    pub fn listeners(&self) -> &[ContentId] {
        &self.listeners
    }

    pub fn add_listener(&mut self, listener: ContentId) {
        self.listeners.push(listener);
    }

    /// Moves the animation to `progress` (clamped to `0.0..=1.0`).
    ///
    /// When the derived value changes, `notify` is called once per listener,
    /// in registration order, before this returns. Returns whether the value
    /// changed.
    pub fn set_progress(&mut self, progress: f32, mut notify: impl FnMut(ContentId)) -> bool {
        if !progress.is_finite() {
            warn!(progress, "ignoring non-finite animation progress");
            return false;
        }
        self.progress = progress.clamp(0.0, 1.0);

        if self.keyframes.is_empty() {
            return false;
        }

        let value = self.value_at_frame(self.frames.frame_at(self.progress));
        if value == self.value {
            return false;
        }
        self.value = value;

        for &listener in &self.listeners {
            notify(listener);
        }
        true
    }

    fn value_at_frame(&self, frame: f32) -> T {
        let keyframes = &self.keyframes;
        let (first, last) = match (keyframes.first(), keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return self.value.clone(),
        };

        // Find the first keyframe where kf.frame > frame.
        // The current segment is between idx-1 and idx.
        let idx = keyframes.partition_point(|kf| kf.frame <= frame);

        if idx == 0 {
            return first.start.clone();
        }
        if idx >= keyframes.len() {
            return last.end.clone();
        }

        let kf_start = &keyframes[idx - 1];
        let kf_end = &keyframes[idx];

        let duration = kf_end.frame - kf_start.frame;
        if duration <= 0.0 || kf_start.easing == Easing::Hold {
            return kf_start.start.clone();
        }

        let local_t = ((frame - kf_start.frame) / duration).clamp(0.0, 1.0);
        let eased = kf_start.easing.apply(local_t);

        kf_start.start.lerp_spatial(
            &kf_start.end,
            eased,
            kf_start.tangent_in.as_deref(),
            kf_start.tangent_out.as_deref(),
        )
    }
}

/// Handle to an animation owned by an [`AnimationTable`]. Only valid for the
/// table that issued it.
pub struct AnimationId<T> {
    index: usize,
    marker: PhantomData<fn() -> T>,
}

impl<T> AnimationId<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for AnimationId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AnimationId<T> {}

impl<T> PartialEq for AnimationId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for AnimationId<T> {}

impl<T> fmt::Debug for AnimationId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnimationId").field(&self.index).finish()
    }
}

/// Value types an [`AnimationTable`] can hold.
pub trait AnimatedValue: Interpolatable + PartialEq + 'static {
    fn slots(table: &AnimationTable) -> &Vec<KeyframeAnimation<Self>>;
    fn slots_mut(table: &mut AnimationTable) -> &mut Vec<KeyframeAnimation<Self>>;
}

impl AnimatedValue for f32 {
    fn slots(table: &AnimationTable) -> &Vec<KeyframeAnimation<Self>> {
        &table.scalars
    }
    fn slots_mut(table: &mut AnimationTable) -> &mut Vec<KeyframeAnimation<Self>> {
        &mut table.scalars
    }
}

impl AnimatedValue for Vec2 {
    fn slots(table: &AnimationTable) -> &Vec<KeyframeAnimation<Self>> {
        &table.points
    }
    fn slots_mut(table: &mut AnimationTable) -> &mut Vec<KeyframeAnimation<Self>> {
        &mut table.points
    }
}

impl AnimatedValue for BezierPath {
    fn slots(table: &AnimationTable) -> &Vec<KeyframeAnimation<Self>> {
        &table.paths
    }
    fn slots_mut(table: &mut AnimationTable) -> &mut Vec<KeyframeAnimation<Self>> {
        &mut table.paths
    }
}

/// Owns every animation of a layer. Contents refer to animations through
/// [`AnimationId`]s and animations refer back to their listeners through
/// [`ContentId`]s, so neither side holds a reference to the other.
#[derive(Debug, Default)]
pub struct AnimationTable {
    scalars: Vec<KeyframeAnimation<f32>>,
    points: Vec<KeyframeAnimation<Vec2>>,
    paths: Vec<KeyframeAnimation<BezierPath>>,
}

impl AnimationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: AnimatedValue>(&mut self, animation: KeyframeAnimation<T>) -> AnimationId<T> {
        let slots = T::slots_mut(self);
        slots.push(animation);
        AnimationId::new(slots.len() - 1)
    }

    pub fn get<T: AnimatedValue>(&self, id: AnimationId<T>) -> &KeyframeAnimation<T> {
        &T::slots(self)[id.index]
    }

    pub fn value<T: AnimatedValue>(&self, id: AnimationId<T>) -> &T {
        self.get(id).value()
    }

    pub fn add_listener<T: AnimatedValue>(&mut self, id: AnimationId<T>, listener: ContentId) {
        T::slots_mut(self)[id.index].add_listener(listener);
    }

    pub fn len(&self) -> usize {
        self.scalars.len() + self.points.len() + self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets `progress` on every animation. `notify` receives each listener of
    /// every animation whose value changed. Returns how many values changed.
    pub fn set_progress(&mut self, progress: f32, mut notify: impl FnMut(ContentId)) -> usize {
        let mut changed = 0;
        for animation in &mut self.scalars {
            changed += usize::from(animation.set_progress(progress, &mut notify));
        }
        for animation in &mut self.points {
            changed += usize::from(animation.set_progress(progress, &mut notify));
        }
        for animation in &mut self.paths {
            changed += usize::from(animation.set_progress(progress, &mut notify));
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottie_data::model::{BezierTangent, Keyframe as DataKeyframe};

    fn frames() -> FrameRange {
        FrameRange::new(0.0, 20.0)
    }

    fn linear_property() -> Property<f32> {
        Property::animated(vec![
            DataKeyframe {
                e: Some(10.0),
                ..DataKeyframe::linear(0.0, 0.0)
            },
            DataKeyframe {
                e: Some(20.0),
                ..DataKeyframe::linear(10.0, 10.0)
            },
            DataKeyframe {
                e: Some(30.0),
                ..DataKeyframe::linear(20.0, 20.0)
            },
        ])
    }

    #[test]
    fn test_keyframe_lookup_binary_search() {
        let mut anim = KeyframeAnimation::from_property(&linear_property(), frames(), |v| *v, -1.0);
        let mut at = |p: f32| {
            anim.set_progress(p, |_| {});
            *anim.value()
        };

        // Exact match start, middle and end
        assert_eq!(at(0.0), 0.0);
        assert_eq!(at(0.5), 10.0);
        assert_eq!(at(1.0), 30.0);

        // Mid-segments
        assert_eq!(at(0.25), 5.0);
        assert_eq!(at(0.75), 15.0);

        // Out of range progress is clamped
        assert_eq!(at(-3.0), 0.0);
        assert_eq!(at(7.0), 30.0);
    }

    #[test]
    fn test_static_value_ignores_progress() {
        let prop = Property::fixed(42.0);
        let mut anim = KeyframeAnimation::from_property(&prop, frames(), |v| *v, 0.0);
        anim.add_listener(ContentId::new(0));

        let mut notified = 0;
        for p in [0.0, 0.3, 1.0] {
            assert!(!anim.set_progress(p, |_| notified += 1));
            assert_eq!(*anim.value(), 42.0);
        }
        assert_eq!(notified, 0);
    }

    #[test]
    fn test_single_keyframe_holds_its_value() {
        let prop = Property::animated(vec![DataKeyframe::linear(5.0, 3.0)]);
        let mut anim = KeyframeAnimation::from_property(&prop, frames(), |v| *v, 0.0);
        for p in [0.0, 0.5, 1.0] {
            anim.set_progress(p, |_| {});
            assert_eq!(*anim.value(), 3.0);
        }
    }

    #[test]
    fn test_missing_values_fall_back_to_default() {
        let prop: Property<f32> = Property::default();
        let anim = KeyframeAnimation::from_property(&prop, frames(), |v| *v, 5.0);
        assert_eq!(*anim.value(), 5.0);
    }

    #[test]
    fn test_listeners_notified_once_per_change_in_order() {
        let mut anim = KeyframeAnimation::from_property(&linear_property(), frames(), |v| *v, 0.0);
        anim.add_listener(ContentId::new(3));
        anim.add_listener(ContentId::new(1));

        let mut seen = Vec::new();
        assert!(anim.set_progress(0.5, |id| seen.push(id)));
        assert_eq!(seen, vec![ContentId::new(3), ContentId::new(1)]);

        // Same progress, same value: nothing to report
        seen.clear();
        assert!(!anim.set_progress(0.5, |id| seen.push(id)));
        assert!(seen.is_empty());
    }

    #[test]
    fn test_non_finite_progress_is_ignored() {
        let mut anim = KeyframeAnimation::from_property(&linear_property(), frames(), |v| *v, 0.0);
        anim.set_progress(0.25, |_| {});
        assert!(!anim.set_progress(f32::NAN, |_| {}));
        assert_eq!(anim.progress(), 0.25);
        assert_eq!(*anim.value(), 5.0);
    }

    #[test]
    fn test_hold_keyframe() {
        let prop = Property::animated(vec![
            DataKeyframe {
                h: Some(1),
                ..DataKeyframe::linear(0.0, 1.0)
            },
            DataKeyframe::linear(10.0, 9.0),
        ]);
        let mut anim =
            KeyframeAnimation::from_property(&prop, FrameRange::new(0.0, 10.0), |v| *v, 0.0);
        anim.set_progress(0.99, |_| {});
        assert_eq!(*anim.value(), 1.0);
        anim.set_progress(1.0, |_| {});
        assert_eq!(*anim.value(), 9.0);
    }

    #[test]
    fn test_cubic_easing_uses_start_keyframe_handles() {
        let ease_in = DataKeyframe {
            o: Some(BezierTangent {
                x: vec![0.9],
                y: vec![0.0],
            }),
            i: Some(BezierTangent {
                x: vec![1.0],
                y: vec![1.0],
            }),
            ..DataKeyframe::linear(0.0, 0.0)
        };
        let prop = Property::animated(vec![ease_in, DataKeyframe::linear(10.0, 100.0)]);
        let mut anim =
            KeyframeAnimation::from_property(&prop, FrameRange::new(0.0, 10.0), |v| *v, 0.0);
        anim.set_progress(0.5, |_| {});
        assert!(*anim.value() < 50.0, "ease-in should lag behind linear, got {}", anim.value());
    }

    #[test]
    fn test_solve_cubic_bezier_linear_handles() {
        let y = solve_cubic_bezier(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), 0.3);
        assert!((y - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_table_routes_notifications() {
        let mut table = AnimationTable::new();
        let a = table.insert(KeyframeAnimation::from_property(
            &linear_property(),
            frames(),
            |v| *v,
            0.0,
        ));
        let b = table.insert(KeyframeAnimation::constant(Vec2::ONE));
        table.add_listener(a, ContentId::new(0));
        table.add_listener(b, ContentId::new(1));

        let mut seen = Vec::new();
        let changed = table.set_progress(1.0, |id| seen.push(id));
        assert_eq!(changed, 1);
        assert_eq!(seen, vec![ContentId::new(0)]);
        assert_eq!(*table.value(a), 30.0);
        assert_eq!(*table.value(b), Vec2::ONE);
        assert_eq!(table.len(), 2);
    }
}
