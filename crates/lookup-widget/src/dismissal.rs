#![forbid(unsafe_code)]

//! Outside-press dismissal.
//!
//! A [`PointerHub`] stands for the surface-wide pointer source (the document
//! in a browser, the whole terminal in a TUI). Each mounted widget registers
//! its bounding region and receives a [`DismissalWatcher`]. Dropping the
//! watcher deregisters it, so unmounting a widget can never leave a listener
//! behind.
//!
//! The hub only records outside presses; the widget consumes them with
//! [`DismissalWatcher::take_dismissal`] on its own turn of the event loop.
//! No callbacks run while the hub is borrowed.
//!
//! Everything here is single-threaded (`Rc`), like the UI loop it serves.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use lookup_core::event::MouseEvent;
use lookup_core::geometry::Rect;

#[derive(Debug)]
struct Region {
    id: u64,
    bounds: Rect,
    dismissed: bool,
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: u64,
    regions: Vec<Region>,
}

impl HubInner {
    fn region_mut(&mut self, id: u64) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }
}

/// Surface-wide pointer source shared by every widget on it.
///
/// Cloning yields another handle to the same hub.
#[derive(Clone, Default)]
pub struct PointerHub {
    inner: Rc<RefCell<HubInner>>,
}

impl PointerHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bounding region. The region stays registered until the
    /// returned watcher is dropped.
    pub fn register(&self, bounds: Rect) -> DismissalWatcher {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.regions.push(Region {
            id,
            bounds,
            dismissed: false,
        });
        lookup_core::trace!(id, listeners = inner.regions.len(), "dismissal watcher registered");
        DismissalWatcher {
            id,
            hub: Rc::downgrade(&self.inner),
        }
    }

    /// Route a pointer event to every registration.
    ///
    /// A press outside a region marks that region dismissed. Returns how
    /// many regions were marked.
    pub fn dispatch(&self, event: &MouseEvent) -> usize {
        if !event.is_down() {
            return 0;
        }
        let mut marked = 0;
        for region in self.inner.borrow_mut().regions.iter_mut() {
            if !region.bounds.contains(event.x, event.y) {
                region.dismissed = true;
                marked += 1;
            }
        }
        marked
    }

    /// Number of live registrations.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().regions.len()
    }
}

impl fmt::Debug for PointerHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// One widget's registration with a [`PointerHub`].
///
/// Deregisters on drop. If the hub is gone first, every method degrades to
/// "not registered".
#[derive(Debug)]
pub struct DismissalWatcher {
    id: u64,
    hub: Weak<RefCell<HubInner>>,
}

impl DismissalWatcher {
    /// Registered bounds, or `None` if the hub was dropped.
    pub fn bounds(&self) -> Option<Rect> {
        let hub = self.hub.upgrade()?;
        let inner = hub.borrow();
        inner.regions.iter().find(|r| r.id == self.id).map(|r| r.bounds)
    }

    /// Update the bounding region (after layout moves the widget).
    pub fn set_bounds(&self, bounds: Rect) {
        if let Some(hub) = self.hub.upgrade()
            && let Some(region) = hub.borrow_mut().region_mut(self.id)
        {
            region.bounds = bounds;
        }
    }

    /// Whether `(x, y)` lies outside the registered bounds.
    ///
    /// Returns `false` when not registered.
    pub fn is_outside(&self, x: u16, y: u16) -> bool {
        self.bounds().is_some_and(|b| !b.contains(x, y))
    }

    /// Consume a pending outside press recorded by the hub.
    pub fn take_dismissal(&self) -> bool {
        let Some(hub) = self.hub.upgrade() else {
            return false;
        };
        let mut inner = hub.borrow_mut();
        match inner.region_mut(self.id) {
            Some(region) => std::mem::take(&mut region.dismissed),
            None => false,
        }
    }
}

impl Drop for DismissalWatcher {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            let mut inner = hub.borrow_mut();
            inner.regions.retain(|r| r.id != self.id);
            lookup_core::trace!(
                id = self.id,
                listeners = inner.regions.len(),
                "dismissal watcher released"
            );
        }
    }
}
