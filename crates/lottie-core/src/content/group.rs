use super::ContentId;
use lottie_data::model::GroupShape;
use std::ops::Range;

/// A `gr` shape. Its items are laid out right after it in the layer's
/// content list, so the group only records the ids it spans.
pub struct GroupContent {
    id: ContentId,
    name: String,
    hidden: bool,
    items: Range<usize>,
}

impl GroupContent {
    pub fn load(shape: &GroupShape, id: ContentId) -> Self {
        let first = id.index() + 1;
        Self {
            id,
            name: shape.nm.clone().unwrap_or_default(),
            hidden: shape.hd.unwrap_or(false),
            items: first..first,
        }
    }

    /// Ends the group before content `end`.
    pub(crate) fn close(&mut self, end: usize) {
        self.items.end = end.max(self.items.start);
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether `id` is one of the group's items, at any depth.
    pub fn contains(&self, id: ContentId) -> bool {
        self.items.contains(&id.index())
    }

    pub fn items(&self) -> impl Iterator<Item = ContentId> {
        self.items.clone().map(ContentId::new)
    }

    pub(crate) fn end(&self) -> usize {
        self.items.end
    }
}
