use crate::animatable::{AnimationTable, FrameRange};
use crate::content::{Content, ContentId, ContentLoader, PathContext};
use crate::error::CompositionError;
use crate::surface::{PathRenderer, Surface};
use kurbo::BezPath;
use lottie_data::model as data;
use tracing::{debug, warn};

/// A shape layer: its contents in document order and the table owning
/// every animation they read. Group items are laid out right after their
/// group, depth first.
pub struct ShapeLayer {
    name: String,
    hidden: bool,
    frames: FrameRange,
    visible: Option<FrameRange>,
    animations: AnimationTable,
    contents: Vec<Content>,
}

impl ShapeLayer {
    /// `frames` is the composition range that progress maps onto.
    pub fn from_model(layer: &data::Layer, frames: FrameRange) -> Result<Self, CompositionError> {
        let name = layer.nm.clone().unwrap_or_default();
        let shapes = layer.shapes.as_deref().unwrap_or_default();
        let mut shape_layer = Self::from_shapes(name, frames, shapes)?;
        shape_layer.hidden = layer.hd.unwrap_or(false);
        if layer.op > layer.ip {
            shape_layer.visible = Some(FrameRange::new(layer.ip, layer.op));
        }
        Ok(shape_layer)
    }

    pub fn from_shapes(
        name: impl Into<String>,
        frames: FrameRange,
        shapes: &[data::Shape],
    ) -> Result<Self, CompositionError> {
        let name = name.into();
        let mut animations = AnimationTable::new();
        let mut contents = Vec::with_capacity(shapes.len());
        load_contents(&name, shapes, None, frames, &mut animations, &mut contents)?;

        // One-time setup: each content sees the contents around it
        for index in 0..contents.len() {
            let (before, rest) = contents.split_at_mut(index);
            if let Some((current, after)) = rest.split_first_mut() {
                current.set_contents(before, after, &mut animations);
            }
        }

        debug!(
            layer = %name,
            contents = contents.len(),
            animations = animations.len(),
            "built shape layer"
        );

        Ok(Self {
            name,
            hidden: false,
            frames,
            visible: None,
            animations,
            contents,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn frames(&self) -> FrameRange {
        self.frames
    }

    /// Whether the layer is on screen at composition `frame`.
    pub fn is_visible_at(&self, frame: f32) -> bool {
        if self.hidden {
            return false;
        }
        match self.visible {
            Some(window) => frame >= window.in_point && frame < window.out_point,
            None => true,
        }
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn content(&self, id: ContentId) -> Option<&Content> {
        self.contents.get(id.index())
    }

    pub fn animations(&self) -> &AnimationTable {
        &self.animations
    }

    /// First content called `name`.
    pub fn find(&self, name: &str) -> Option<ContentId> {
        self.contents
            .iter()
            .position(|content| content.name() == name)
            .map(ContentId::new)
    }

    /// Drives every animation of the layer to `progress`. Contents whose
    /// inputs changed drop their cached path and request a redraw from
    /// `surface`. Returns how many animation values changed.
    pub fn set_progress(&mut self, progress: f32, surface: &mut dyn Surface) -> usize {
        let Self {
            animations,
            contents,
            ..
        } = self;

        animations.set_progress(progress, |listener| {
            if let Some(content) = contents.get_mut(listener.index()) {
                content.on_value_changed(surface);
            }
        })
    }

    /// Current path of content `id`, regenerated if stale. `None` for
    /// contents that have no path of their own.
    pub fn path(&mut self, id: ContentId) -> Option<&BezPath> {
        content_path(&self.animations, &mut self.contents, id.index())
    }

    /// Hands every path to `renderer` in document order. Items of hidden
    /// groups are left out.
    pub fn draw(&mut self, renderer: &mut dyn PathRenderer) {
        let Self {
            name,
            animations,
            contents,
            ..
        } = self;

        let mut hidden_until = 0;
        for index in 0..contents.len() {
            if let Some(group) = contents[index].as_group() {
                if group.is_hidden() {
                    hidden_until = hidden_until.max(group.end());
                }
            }
            if index < hidden_until {
                continue;
            }
            if let Some(path) = content_path(animations, contents, index) {
                renderer.draw_path(name, ContentId::new(index), path);
            }
        }
    }
}

/// Loads `shapes` into `contents`, recursing into groups.
fn load_contents(
    layer: &str,
    shapes: &[data::Shape],
    group: Option<ContentId>,
    frames: FrameRange,
    animations: &mut AnimationTable,
    contents: &mut Vec<Content>,
) -> Result<(), CompositionError> {
    for shape in shapes {
        let id = ContentId::new(contents.len());
        let mut loader = ContentLoader::new(animations, frames, id).in_group(group);
        let Some(content) = Content::load(shape, &mut loader)? else {
            warn!(layer = %layer, "skipping unsupported shape");
            continue;
        };
        contents.push(content);

        if let data::Shape::Group(gr) = shape {
            load_contents(layer, &gr.it, Some(id), frames, animations, contents)?;
            let end = contents.len();
            if let Some(group) = contents[id.index()].as_group_mut() {
                group.close(end);
            }
        }
    }
    Ok(())
}

fn content_path<'a>(
    animations: &'a AnimationTable,
    contents: &'a mut [Content],
    index: usize,
) -> Option<&'a BezPath> {
    if index >= contents.len() {
        return None;
    }
    let (before, rest) = contents.split_at_mut(index);
    let (content, after) = rest.split_first_mut()?;
    let content = content.as_path_mut()?;
    let ctx = PathContext::new(animations, before, after);
    Some(content.path(&ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RedrawRequests;
    use serde_json::json;

    fn shapes(value: serde_json::Value) -> Vec<data::Shape> {
        serde_json::from_value(value).unwrap()
    }

    fn layer() -> ShapeLayer {
        let shapes = shapes(json!([
            { "ty": "fl", "nm": "Fill" },
            {
                "ty": "sr", "nm": "Star", "sy": 1,
                "pt": { "a": 0, "k": 5 },
                "or": { "a": 1, "k": [ { "t": 0, "s": [100] }, { "t": 10, "s": [200] } ] },
                "ir": { "a": 0, "k": 50 }
            }
        ]));
        ShapeLayer::from_shapes("Layer", FrameRange::new(0.0, 10.0), &shapes).unwrap()
    }

    #[test]
    fn test_unsupported_shapes_are_skipped_without_gaps() {
        let layer = layer();
        assert_eq!(layer.contents().len(), 1);
        assert_eq!(layer.find("Star"), Some(ContentId::new(0)));
        assert_eq!(layer.find("Fill"), None);
    }

    #[test]
    fn test_progress_change_invalidates_and_requests_redraw() {
        let mut layer = layer();
        let id = ContentId::new(0);
        let mut surface = RedrawRequests::default();

        layer.path(id).unwrap();
        assert!(layer.content(id).and_then(Content::as_path).unwrap().is_fresh());

        assert_eq!(layer.set_progress(0.5, &mut surface), 1);
        assert_eq!(surface.count(), 1);
        assert!(!layer.content(id).and_then(Content::as_path).unwrap().is_fresh());

        // Same progress again: nothing changes
        assert_eq!(layer.set_progress(0.5, &mut surface), 0);
        assert_eq!(surface.count(), 1);
    }

    #[test]
    fn test_path_out_of_range_is_none() {
        let mut layer = layer();
        assert!(layer.path(ContentId::new(4)).is_none());
    }

    #[test]
    fn test_group_items_follow_their_group() {
        let shapes = shapes(json!([
            {
                "ty": "gr", "nm": "Outer",
                "it": [
                    {
                        "ty": "sr", "nm": "Inside", "sy": 2,
                        "pt": { "a": 0, "k": 4 },
                        "or": { "a": 0, "k": 10 }
                    },
                    { "ty": "gr", "nm": "Inner", "it": [
                        { "ty": "el", "nm": "Dot", "s": { "a": 0, "k": [4, 4] } }
                    ] },
                    { "ty": "tr" }
                ]
            },
            { "ty": "rc", "nm": "Outside", "s": { "a": 0, "k": [10, 10] } }
        ]));
        let layer = ShapeLayer::from_shapes("Layer", FrameRange::new(0.0, 10.0), &shapes).unwrap();

        let names: Vec<&str> = layer.contents().iter().map(Content::name).collect();
        assert_eq!(names, vec!["Outer", "Inside", "Inner", "Dot", "Outside"]);

        let outer = layer.content(ContentId::new(0)).and_then(Content::as_group).unwrap();
        let items: Vec<ContentId> = outer.items().collect();
        assert_eq!(items, (1..4).map(ContentId::new).collect::<Vec<_>>());
        let inner = layer.content(ContentId::new(2)).and_then(Content::as_group).unwrap();
        assert!(inner.contains(ContentId::new(3)));
        assert!(!inner.contains(ContentId::new(4)));
    }

    #[test]
    fn test_visibility_window() {
        let model: data::Layer = serde_json::from_value(json!({
            "ty": 4, "nm": "Window", "ip": 10, "op": 20, "shapes": []
        }))
        .unwrap();
        let layer = ShapeLayer::from_model(&model, FrameRange::new(0.0, 30.0)).unwrap();
        assert!(!layer.is_visible_at(5.0));
        assert!(layer.is_visible_at(10.0));
        assert!(!layer.is_visible_at(20.0));
    }
}
