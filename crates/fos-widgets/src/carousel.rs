//! Carousel
//!
//! A window of `window_size` items slides over a list. `position` is the
//! list offset in items: 0 shows the first item, negative values scroll
//! right. Valid positions are `window_size - total ..= 0` (just 0 when
//! everything fits).
//!
//! [`CarouselState`] is the pure navigation model; [`Carousel`] wires it to
//! the document: button clicks, viewport resizes, `data-size` changes,
//! child-list mutations of the list, keyboard focus through a roving
//! tabindex and the show/hide pair of each `aria-controls` thumbnail.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use fos_a11y::{attr, RovingFocusController};
use fos_dom::{Document, EventType, ListenerId, MutationObserverInit, NodeId, ObserverId, TimerId};

use crate::config::ATTRIBUTE_SIZE;
use crate::{CarouselConfig, Result, WidgetError};

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Previous => Self::Next,
            Self::Next => Self::Previous,
        }
    }
}

/// Navigation model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselState {
    pub window_size: usize,
    pub position: i64,
}

impl CarouselState {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            position: 0,
        }
    }

    /// Lowest valid position for `total` items
    pub fn min_position(&self, total: usize) -> i64 {
        (self.window_size as i64 - total as i64).min(0)
    }

    /// Whether one step in `direction` stays inside the valid range
    pub fn can_navigate(&self, direction: Direction, total: usize) -> bool {
        match direction {
            Direction::Previous => self.position < 0,
            Direction::Next => self.position > self.window_size as i64 - total as i64,
        }
    }

    /// Move one step; a move past either bound is rejected, not clamped
    pub fn navigate(&mut self, direction: Direction, total: usize) -> bool {
        if !self.can_navigate(direction, total) {
            return false;
        }
        self.position += match direction {
            Direction::Previous => 1,
            Direction::Next => -1,
        };
        true
    }

    /// Pull the position back into range after `total` or `window_size` changed
    pub fn clamp(&mut self, total: usize) {
        self.position = self.position.clamp(self.min_position(total), 0);
    }

    /// Buttons are hidden when there is nothing to scroll
    pub fn buttons_hidden(&self, total: usize) -> bool {
        self.window_size >= total
    }

    /// Index of the leftmost visible item
    pub fn first_visible(&self) -> usize {
        self.position.unsigned_abs() as usize
    }

    pub fn is_visible(&self, index: usize) -> bool {
        let first = self.first_visible();
        index >= first && index < first + self.window_size
    }

    /// Scroll the least amount that makes `index` visible. Returns true if
    /// the position changed.
    pub fn scroll_into_view(&mut self, index: usize, total: usize) -> bool {
        let before = self.position;
        let first = self.first_visible();
        if index < first {
            self.position = -(index as i64);
        } else if index >= first + self.window_size {
            self.position = -((index + 1 - self.window_size) as i64);
        }
        self.clamp(total);
        self.position != before
    }

    /// List width in percent of the viewport
    pub fn list_width_percent(&self, total: usize) -> f64 {
        100.0 / self.window_size as f64 * total as f64
    }

    /// List left offset in percent
    pub fn offset_percent(&self) -> f64 {
        self.position as f64 * (100.0 / self.window_size as f64)
    }

    /// Width of one item in percent of the list
    pub fn item_width_percent(total: usize) -> Option<f64> {
        (total > 0).then(|| 100.0 / total as f64)
    }
}

fn percent(value: f64) -> String {
    format!("{}%", value)
}

/// Elements a carousel is made of
#[derive(Debug, Clone, Copy)]
struct Parts {
    element: NodeId,
    list: NodeId,
    previous: NodeId,
    next: NodeId,
}

impl Parts {
    fn find(doc: &Document, element: NodeId) -> Result<Self> {
        let part = |selector: &str, name: &'static str| -> Result<NodeId> {
            doc.query_selector(selector, element)?
                .ok_or(WidgetError::MissingPart { widget: element, part: name })
        };
        Ok(Self {
            element,
            list: part("ul", "list")?,
            previous: part(".previous", "previous button")?,
            next: part(".next", "next button")?,
        })
    }

    fn button(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::Previous => self.previous,
            Direction::Next => self.next,
        }
    }
}

/// Deferred focus waiting for the scroll transition
#[derive(Debug)]
struct PendingFocus {
    listener: ListenerId,
    timer: TimerId,
}

/// Click pair of a thumbnail and the element it controls
#[derive(Debug)]
struct Thumbnail {
    source: NodeId,
    listeners: [ListenerId; 2],
}

struct Inner {
    parts: Parts,
    config: CarouselConfig,
    state: CarouselState,
    roving: RovingFocusController,
    listeners: Vec<ListenerId>,
    observers: Vec<ObserverId>,
    thumbnails: Vec<Thumbnail>,
    /// Ignore resizes until the current checkpoint ends; set by a
    /// resize-driven layout change
    suppress_resize: bool,
    pending_focus: Option<PendingFocus>,
}

/// Carousel widget handle. Clones share the same widget.
#[derive(Clone)]
pub struct Carousel {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for Carousel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Carousel")
            .field("element", &inner.parts.element)
            .field("state", &inner.state)
            .field("roving", &inner.roving)
            .finish()
    }
}

impl Carousel {
    /// Initialize with configuration read from the element's data attributes
    pub fn init(doc: &mut Document, element: NodeId) -> Result<Self> {
        let config = CarouselConfig::from_element(doc, element)?;
        Self::init_with_config(doc, element, config)
    }

    /// Initialize with an explicit configuration
    pub fn init_with_config(doc: &mut Document, element: NodeId, config: CarouselConfig) -> Result<Self> {
        let config = config.validated()?;
        let parts = Parts::find(doc, element)?;
        let state = CarouselState::new(config.effective_window_size(doc.viewport_width()));

        let carousel = Self {
            inner: Rc::new(RefCell::new(Inner {
                parts,
                config,
                state,
                roving: RovingFocusController::new(),
                listeners: Vec::new(),
                observers: Vec::new(),
                thumbnails: Vec::new(),
                suppress_resize: false,
                pending_focus: None,
            })),
        };

        let roving = carousel.roving();
        for item in doc.children(parts.list) {
            let target = carousel.focus_target(doc, item)?;
            roving.add_element(doc, target)?;
            carousel.wire_thumbnail(doc, target);
        }

        let weak = carousel.weak();
        roving.set_on_focus_moved(move |doc, _, node| {
            if let Some(carousel) = Carousel::upgrade(&weak) {
                carousel.reveal(doc, node);
            }
        });
        let weak = carousel.weak();
        roving.set_on_select(move |doc, node| {
            if let Some(carousel) = Carousel::upgrade(&weak) {
                carousel.reveal(doc, node);
            }
            doc.click(node);
        });

        let mut listeners = Vec::new();
        for direction in [Direction::Previous, Direction::Next] {
            let weak = carousel.weak();
            listeners.push(doc.add_event_listener(parts.button(direction), EventType::Click, move |doc, _| {
                if let Some(carousel) = Carousel::upgrade(&weak) {
                    if let Err(err) = carousel.navigate(doc, direction) {
                        tracing::warn!("carousel navigation failed: {}", err);
                    }
                }
            }));
        }
        let weak = carousel.weak();
        let root = doc.root();
        listeners.push(doc.add_event_listener(root, EventType::Resize, move |doc, _| {
            if let Some(carousel) = Carousel::upgrade(&weak) {
                if let Err(err) = carousel.on_resize(doc) {
                    tracing::warn!("carousel resize failed: {}", err);
                }
            }
        }));

        let weak = carousel.weak();
        let list = parts.list;
        let options = MutationObserverInit {
            child_list: true,
            subtree: true,
            ..Default::default()
        };
        let observer = doc.observe(list, options, move |doc, records| {
            let Some(carousel) = Carousel::upgrade(&weak) else {
                return;
            };
            let (mut added, mut removed) = (Vec::new(), Vec::new());
            for record in records.iter().filter(|r| r.target == list) {
                added.extend_from_slice(&record.added_nodes);
                removed.extend_from_slice(&record.removed_nodes);
            }
            if added.is_empty() && removed.is_empty() {
                return;
            }
            if let Err(err) = carousel.on_child_list_changed(doc, &added, &removed) {
                tracing::warn!("carousel reconciliation failed: {}", err);
            }
        });

        let weak = carousel.weak();
        let size_observer = doc.observe(element, MutationObserverInit::attribute(ATTRIBUTE_SIZE), move |doc, records| {
            if !records.iter().any(|r| r.target == element) {
                return;
            }
            if let Some(carousel) = Carousel::upgrade(&weak) {
                if let Err(err) = carousel.on_size_changed(doc) {
                    tracing::warn!("carousel size change failed: {}", err);
                }
            }
        });

        {
            let mut inner = carousel.inner.borrow_mut();
            inner.listeners = listeners;
            inner.observers = vec![observer, size_observer];
        }
        carousel.update_view(doc)?;
        tracing::debug!(
            "carousel {}: {} items, window {}",
            element,
            carousel.total_items(doc),
            carousel.state().window_size
        );
        Ok(carousel)
    }

    fn weak(&self) -> Weak<RefCell<Inner>> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<RefCell<Inner>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn parts(&self) -> Parts {
        self.inner.borrow().parts
    }

    /// Current navigation state
    pub fn state(&self) -> CarouselState {
        self.inner.borrow().state
    }

    pub fn position(&self) -> i64 {
        self.state().position
    }

    pub fn window_size(&self) -> usize {
        self.state().window_size
    }

    /// Focus controller over the items' focus targets
    pub fn roving(&self) -> RovingFocusController {
        self.inner.borrow().roving.clone()
    }

    /// Live item count of the list
    pub fn total_items(&self, doc: &Document) -> usize {
        doc.child_element_count(self.parts().list)
    }

    /// Items of the list in order
    pub fn items(&self, doc: &Document) -> Vec<NodeId> {
        doc.children(self.parts().list)
    }

    /// Element of an item that takes focus
    fn focus_target(&self, doc: &Document, item: NodeId) -> Result<NodeId> {
        let selector = self.inner.borrow().config.focus_selector.clone();
        Ok(doc.query_selector(&selector, item)?.unwrap_or(item))
    }

    /// Recompute list geometry and button state
    pub fn update_view(&self, doc: &mut Document) -> Result<()> {
        let (parts, state) = {
            let inner = self.inner.borrow();
            (inner.parts, inner.state)
        };
        let items = doc.children(parts.list);
        let total = items.len();

        doc.set_style(parts.list, "width", &percent(state.list_width_percent(total)))?;
        doc.set_style(parts.list, "margin-left", &percent(state.offset_percent()))?;
        if let Some(width) = CarouselState::item_width_percent(total) {
            for item in items {
                doc.set_style(item, "width", &percent(width))?;
            }
        }

        let hidden = if state.buttons_hidden(total) { "true" } else { "false" };
        for direction in [Direction::Previous, Direction::Next] {
            let button = parts.button(direction);
            doc.set_attribute(attr::ARIA_HIDDEN, hidden, button)?;
            if state.can_navigate(direction, total) {
                doc.remove_attribute("disabled", button)?;
            } else if !doc.has_attribute("disabled", button) {
                doc.set_attribute("disabled", "", button)?;
            }
        }
        tracing::trace!("carousel view: position {} of {} items, window {}", state.position, total, state.window_size);
        Ok(())
    }

    /// Handle a navigation button press. Rejected while that button is
    /// disabled. Returns true if the position moved.
    pub fn navigate(&self, doc: &mut Document, direction: Direction) -> Result<bool> {
        let parts = self.parts();
        let button = parts.button(direction);
        if doc.has_attribute("disabled", button) {
            return Ok(false);
        }
        let total = self.total_items(doc);
        let moved = self.inner.borrow_mut().state.navigate(direction, total);
        if !moved {
            return Ok(false);
        }
        self.update_view(doc)?;
        tracing::debug!("carousel {:?}: position {}", direction, self.position());

        if doc.has_attribute("disabled", button) {
            doc.focus(parts.button(direction.opposite()));
        }
        Ok(true)
    }

    /// Recompute the window size for the viewport, reset to the start and
    /// re-render. Resizes fired while a resize-driven layout change is still
    /// settling (before the current checkpoint ends) are ignored.
    pub fn on_resize(&self, doc: &mut Document) -> Result<()> {
        let window_size = {
            let inner = self.inner.borrow();
            if inner.suppress_resize {
                tracing::trace!("carousel: ignoring self-triggered resize");
                return Ok(());
            }
            inner.config.effective_window_size(doc.viewport_width())
        };

        let changed = {
            let mut inner = self.inner.borrow_mut();
            let changed = inner.state.window_size != window_size;
            inner.state.window_size = window_size;
            inner.state.position = 0;
            changed
        };
        self.update_view(doc)?;

        if changed {
            tracing::debug!("carousel: window size {} at {}px", window_size, doc.viewport_width());
            self.inner.borrow_mut().suppress_resize = true;
            let weak = self.weak();
            doc.queue_microtask(move |_| {
                if let Some(carousel) = Carousel::upgrade(&weak) {
                    carousel.inner.borrow_mut().suppress_resize = false;
                }
            });
        }
        Ok(())
    }

    /// Re-read `data-size`, recompute the window for the viewport, reset to
    /// the start and re-render. A missing attribute restores the default
    /// size; an invalid one is rejected and leaves the carousel unchanged.
    pub fn on_size_changed(&self, doc: &mut Document) -> Result<()> {
        let element = self.parts().element;
        let size = CarouselConfig::size_attribute(doc, element)?.unwrap_or(CarouselConfig::default().window_size);
        {
            let mut inner = self.inner.borrow_mut();
            inner.config.window_size = size;
            let window_size = inner.config.effective_window_size(doc.viewport_width());
            inner.state.window_size = window_size;
            inner.state.position = 0;
        }
        self.update_view(doc)?;
        tracing::debug!("carousel: {} {} -> window {}", ATTRIBUTE_SIZE, size, self.window_size());
        Ok(())
    }

    /// Wire a thumbnail to the element its `aria-controls` names: a click on
    /// the thumbnail shows the element, a click on the element hides it.
    /// Thumbnails whose target is not in the document stay inert.
    fn wire_thumbnail(&self, doc: &mut Document, source: NodeId) {
        let Some(target) = doc.get_attribute(attr::ARIA_CONTROLS, source).and_then(|id| doc.get_element_by_id(id)) else {
            return;
        };
        let show = doc.add_event_listener(source, EventType::Click, move |doc, _| {
            if let Err(err) = doc.set_attribute(attr::ARIA_HIDDEN, "false", target) {
                tracing::warn!("carousel: failed to show {}: {}", target, err);
            }
        });
        let hide = doc.add_event_listener(target, EventType::Click, move |doc, _| {
            if let Err(err) = doc.set_attribute(attr::ARIA_HIDDEN, "true", target) {
                tracing::warn!("carousel: failed to hide {}: {}", target, err);
            }
        });
        self.inner.borrow_mut().thumbnails.push(Thumbnail {
            source,
            listeners: [show, hide],
        });
    }

    fn unwire_thumbnail(&self, doc: &mut Document, source: NodeId) {
        let removed: Vec<Thumbnail> = {
            let mut inner = self.inner.borrow_mut();
            let (removed, kept) = std::mem::take(&mut inner.thumbnails)
                .into_iter()
                .partition(|t| t.source == source);
            inner.thumbnails = kept;
            removed
        };
        for listener in removed.into_iter().flat_map(|t| t.listeners) {
            doc.remove_event_listener(listener);
        }
    }

    /// Reconcile focus membership with inserted and removed items. Only a
    /// real membership change resets the position. Returns whether it did.
    pub fn on_child_list_changed(&self, doc: &mut Document, added: &[NodeId], removed: &[NodeId]) -> Result<bool> {
        let (list, roving) = (self.parts().list, self.roving());
        let mut changed = false;

        for &node in removed {
            if doc.tag_name(node).is_none() {
                continue;
            }
            let target = self.focus_target(doc, node)?;
            if roving.index_of(target).is_some() {
                roving.remove_element(doc, target)?;
                self.unwire_thumbnail(doc, target);
                changed = true;
            }
        }
        for &node in added {
            if doc.tag_name(node).is_none() || doc.parent(node) != Some(list) {
                continue;
            }
            let target = self.focus_target(doc, node)?;
            if roving.index_of(target).is_none() {
                roving.add_element(doc, target)?;
                self.wire_thumbnail(doc, target);
                changed = true;
            }
        }

        if changed {
            let total = self.total_items(doc);
            {
                let mut inner = self.inner.borrow_mut();
                inner.state.position = 0;
                inner.state.clamp(total);
            }
            self.update_view(doc)?;
            tracing::debug!("carousel: items changed, {} now", total);
        }
        Ok(changed)
    }

    /// Scroll so the item containing `node` is visible; once the scroll
    /// transition ends, focus `node`.
    fn reveal(&self, doc: &mut Document, node: NodeId) {
        let parts = self.parts();
        let items = doc.children(parts.list);
        let Some(index) = items.iter().position(|&item| doc.contains(item, node)) else {
            return;
        };
        let scrolled = self.inner.borrow_mut().state.scroll_into_view(index, items.len());
        if !scrolled {
            return;
        }
        if let Err(err) = self.update_view(doc) {
            tracing::warn!("carousel: failed to scroll to item {}: {}", index, err);
            return;
        }
        tracing::debug!("carousel: scrolled to item {}, position {}", index, self.position());
        self.focus_after_transition(doc, node);
    }

    fn focus_after_transition(&self, doc: &mut Document, node: NodeId) {
        self.cancel_pending_focus(doc);
        let (list, fallback) = {
            let inner = self.inner.borrow();
            (inner.parts.list, inner.config.transition_fallback_ms)
        };

        let weak = self.weak();
        let listener = doc.add_event_listener(list, EventType::TransitionEnd, move |doc, event| {
            if event.target != list {
                return;
            }
            if let Some(carousel) = Carousel::upgrade(&weak) {
                carousel.finish_pending_focus(doc, node);
            }
        });
        let weak = self.weak();
        let timer = doc.set_timeout(fallback, move |doc| {
            if let Some(carousel) = Carousel::upgrade(&weak) {
                tracing::trace!("carousel: transition fallback fired");
                carousel.finish_pending_focus(doc, node);
            }
        });
        self.inner.borrow_mut().pending_focus = Some(PendingFocus { listener, timer });
    }

    fn finish_pending_focus(&self, doc: &mut Document, node: NodeId) {
        if self.cancel_pending_focus(doc) {
            doc.focus(node);
        }
    }

    fn cancel_pending_focus(&self, doc: &mut Document) -> bool {
        let Some(pending) = self.inner.borrow_mut().pending_focus.take() else {
            return false;
        };
        doc.remove_event_listener(pending.listener);
        doc.clear_timeout(pending.timer);
        true
    }

    /// Whether a focus move is waiting for a transition
    pub fn has_pending_focus(&self) -> bool {
        self.inner.borrow().pending_focus.is_some()
    }

    /// Remove every listener and observer, any pending focus and the focus
    /// controller
    pub fn destroy(&self, doc: &mut Document) -> Result<()> {
        self.cancel_pending_focus(doc);
        let (listeners, observers, thumbnails, roving) = {
            let mut inner = self.inner.borrow_mut();
            (
                std::mem::take(&mut inner.listeners),
                std::mem::take(&mut inner.observers),
                std::mem::take(&mut inner.thumbnails),
                inner.roving.clone(),
            )
        };
        for listener in listeners.into_iter().chain(thumbnails.into_iter().flat_map(|t| t.listeners)) {
            doc.remove_event_listener(listener);
        }
        for observer in observers {
            doc.disconnect(observer);
        }
        roving.destroy(doc)?;
        Ok(())
    }
}
