//! Viewport geometry tracking and display-fit coordination.
//!
//! The coordinator consumes size-changed notifications from a subscription
//! channel, decoupled from whatever rendering technology produces them,
//! and keeps the display surface fitted. Refitting is idempotent: it never
//! alters content, only layout.

use tokio::sync::{mpsc, watch};

use crate::display::DisplaySurface;
use crate::multiplexer::MuxEvent;

/// Columns and rows available for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub cols: u16,
    pub rows: u16,
}

impl ViewportSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

/// Tracks the last known viewport geometry and refits the display.
#[derive(Debug, Default)]
pub struct ResizeCoordinator {
    current: ViewportSize,
}

impl ResizeCoordinator {
    /// Creates a coordinator with an initial geometry.
    pub fn new(initial: ViewportSize) -> Self {
        Self { current: initial }
    }

    /// Records an observed geometry. Returns true when it actually
    /// changed; redundant notifications report false.
    pub fn observe(&mut self, size: ViewportSize) -> bool {
        if size == self.current {
            return false;
        }
        tracing::debug!(cols = size.cols, rows = size.rows, "Viewport resized");
        self.current = size;
        true
    }

    /// Returns the last known geometry.
    pub fn current(&self) -> ViewportSize {
        self.current
    }

    /// Manual fit action: reapplies the current geometry to the surface,
    /// independent of any actual geometry change.
    pub fn refit(&self, surface: &mut DisplaySurface) {
        surface.fit(self.current);
    }
}

/// Bridges a geometry subscription channel into the engine's event stream.
///
/// Each change observed on the watch channel is forwarded as a
/// [`MuxEvent::Resize`]. The task ends when either side of the bridge is
/// dropped.
pub fn spawn_geometry_watcher(
    mut sizes: watch::Receiver<ViewportSize>,
    events: mpsc::UnboundedSender<MuxEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while sizes.changed().await.is_ok() {
            let size = *sizes.borrow_and_update();
            if events.send(MuxEvent::Resize(size)).is_err() {
                break;
            }
        }
        tracing::debug!("Geometry watcher ended");
    })
}
