//! Contracts with the host that owns the drawing surface.

use crate::content::ContentId;
use kurbo::BezPath;

/// Receives redraw requests. Requests are fire-and-forget and may repeat
/// within a single progress update.
pub trait Surface {
    fn invalidate_self(&mut self);
}

/// Consumes the paths of a composition, in drawing order.
pub trait PathRenderer {
    fn draw_path(&mut self, layer: &str, content: ContentId, path: &BezPath);
}

/// A [`Surface`] that only counts requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RedrawRequests {
    count: usize,
}

impl RedrawRequests {
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the pending count and resets it.
    pub fn take(&mut self) -> usize {
        std::mem::take(&mut self.count)
    }
}

impl Surface for RedrawRequests {
    fn invalidate_self(&mut self) {
        self.count += 1;
    }
}
