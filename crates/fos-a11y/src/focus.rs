//! Focus Management
//!
//! Roving tabindex: of an ordered set of member elements exactly one is
//! reachable with Tab (`tabindex="0"`), every other member carries
//! `tabindex="-1"`. Arrow keys, Home and End move that marker and the input
//! focus; Enter and Space activate the current member.
//!
//! Every mutation path (add, remove, keyboard move, forced index) ends in
//! the same marker pass, so the controller stays the single source of truth
//! for which member is tabbable.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use fos_dom::{Document, Event, EventType, Key, ListenerId, NodeId};

use crate::aria::attr;
use crate::A11yError;

/// Activation callback, receives the activated member
pub type SelectFn = Box<dyn FnMut(&mut Document, NodeId)>;

/// Keyboard move notification, receives the new index and member
pub type FocusMovedFn = Box<dyn FnMut(&mut Document, usize, NodeId)>;

/// Tab index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    NotFocusable,    // tabindex="-1" or not set
    Sequential(i32), // tabindex="0" or positive
}

impl fmt::Display for TabIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFocusable => write!(f, "-1"),
            Self::Sequential(n) => write!(f, "{}", n),
        }
    }
}

/// Navigation action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Select,
    First,
    Last,
    Previous,
    Next,
}

impl NavAction {
    /// Map a key to its action; other keys pass through untouched
    pub fn from_key(key: Key) -> Option<Self> {
        Some(match key {
            Key::Enter | Key::Space => Self::Select,
            Key::Home => Self::First,
            Key::End => Self::Last,
            Key::ArrowLeft | Key::ArrowUp => Self::Previous,
            Key::ArrowRight | Key::ArrowDown => Self::Next,
            _ => return None,
        })
    }

    /// Index reached from `current` in a list ending at `last`, wrapping around
    pub fn apply(self, current: usize, last: usize) -> usize {
        match self {
            Self::Select => current,
            Self::First => 0,
            Self::Last => last,
            Self::Previous if current == 0 => last,
            Self::Previous => current - 1,
            Self::Next if current >= last => 0,
            Self::Next => current + 1,
        }
    }
}

struct Member {
    node: NodeId,
    listener: ListenerId,
}

#[derive(Default)]
struct Inner {
    members: Vec<Member>,
    tabbable: Option<usize>,
    on_select: Option<SelectFn>,
    on_focus_moved: Option<FocusMovedFn>,
}

/// Roving tabindex controller.
///
/// Cloning yields another handle to the same member set; the keydown
/// listeners only hold weak references, so dropping every handle turns
/// them into no-ops.
#[derive(Clone, Default)]
pub struct RovingFocusController {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for RovingFocusController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RovingFocusController")
            .field("members", &inner.members.iter().map(|m| m.node).collect::<Vec<_>>())
            .field("tabbable", &inner.tabbable)
            .field("on_select", &inner.on_select.is_some())
            .finish()
    }
}

impl RovingFocusController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the activation callback (Enter/Space or `select`)
    pub fn set_on_select(&self, callback: impl FnMut(&mut Document, NodeId) + 'static) {
        self.inner.borrow_mut().on_select = Some(Box::new(callback));
    }

    /// Set the callback fired after every keyboard move
    pub fn set_on_focus_moved(&self, callback: impl FnMut(&mut Document, usize, NodeId) + 'static) {
        self.inner.borrow_mut().on_focus_moved = Some(Box::new(callback));
    }

    /// Members in navigation order
    pub fn members(&self) -> Vec<NodeId> {
        self.inner.borrow().members.iter().map(|m| m.node).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the tabbable member, None when empty
    pub fn tabbable_index(&self) -> Option<usize> {
        self.inner.borrow().tabbable
    }

    /// The tabbable member
    pub fn tabbable_element(&self) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner.tabbable.and_then(|i| inner.members.get(i)).map(|m| m.node)
    }

    /// Position of a member
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.inner.borrow().members.iter().position(|m| m.node == node)
    }

    /// Add keyboard support to an element. The first member becomes tabbable.
    pub fn add_element(&self, doc: &mut Document, node: NodeId) -> Result<(), A11yError> {
        if self.index_of(node).is_some() {
            return Ok(());
        }
        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        let listener = doc.add_event_listener(node, EventType::KeyDown, move |doc, event| {
            if let Some(inner) = weak.upgrade() {
                RovingFocusController { inner }.handle_key_down(doc, event);
            }
        });
        {
            let mut inner = self.inner.borrow_mut();
            inner.members.push(Member { node, listener });
            if inner.tabbable.is_none() {
                inner.tabbable = Some(0);
            }
        }
        tracing::trace!("roving focus: added {} ({} members)", node, self.len());
        self.update_tabbable(doc)
    }

    /// Remove keyboard support from an element. If it was tabbable, the
    /// marker resets to the first remaining member.
    pub fn remove_element(&self, doc: &mut Document, node: NodeId) -> Result<(), A11yError> {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let Some(pos) = inner.members.iter().position(|m| m.node == node) else {
                return Ok(());
            };
            let member = inner.members.remove(pos);
            let empty = inner.members.is_empty();
            inner.tabbable = match inner.tabbable {
                _ if empty => None,
                Some(t) if t == pos => Some(0),
                Some(t) if t > pos => Some(t - 1),
                other => other,
            };
            member
        };
        doc.remove_event_listener(removed.listener);
        doc.remove_attribute(attr::TABINDEX, removed.node)?;
        tracing::trace!("roving focus: removed {} ({} members)", node, self.len());
        self.update_tabbable(doc)
    }

    /// Set the tabbable index without moving focus or activating. Used when
    /// selection happened through a non-keyboard path.
    pub fn force_selected_index(&self, doc: &mut Document, index: usize) -> Result<(), A11yError> {
        {
            let mut inner = self.inner.borrow_mut();
            if index >= inner.members.len() {
                tracing::debug!("roving focus: index {} out of range ({} members)", index, inner.members.len());
                return Ok(());
            }
            inner.tabbable = Some(index);
        }
        self.update_tabbable(doc)
    }

    /// Invoke the activation callback with the tabbable member
    pub fn select(&self, doc: &mut Document) {
        let Some(node) = self.tabbable_element() else {
            return;
        };
        let Some(mut callback) = self.inner.borrow_mut().on_select.take() else {
            return;
        };
        callback(doc, node);
        let mut inner = self.inner.borrow_mut();
        if inner.on_select.is_none() {
            inner.on_select = Some(callback);
        }
    }

    /// Remove every member, listener and marker
    pub fn destroy(&self, doc: &mut Document) -> Result<(), A11yError> {
        let members = std::mem::take(&mut self.inner.borrow_mut().members);
        self.inner.borrow_mut().tabbable = None;
        for member in members {
            doc.remove_event_listener(member.listener);
            doc.remove_attribute(attr::TABINDEX, member.node)?;
        }
        Ok(())
    }

    /// Apply the exclusive reachability marker
    fn update_tabbable(&self, doc: &mut Document) -> Result<(), A11yError> {
        let (nodes, tabbable) = {
            let inner = self.inner.borrow();
            (inner.members.iter().map(|m| m.node).collect::<Vec<_>>(), inner.tabbable)
        };
        for (i, node) in nodes.into_iter().enumerate() {
            let index = if Some(i) == tabbable {
                TabIndex::Sequential(0)
            } else {
                TabIndex::NotFocusable
            };
            let value = index.to_string();
            if !doc.attribute_equals(attr::TABINDEX, &value, node) {
                doc.set_attribute(attr::TABINDEX, &value, node)?;
            }
        }
        Ok(())
    }

    fn handle_key_down(&self, doc: &mut Document, event: &mut Event) {
        let Some(action) = event.key.and_then(NavAction::from_key) else {
            return;
        };
        event.prevent_default();

        if action == NavAction::Select {
            self.select(doc);
        } else {
            let mut inner = self.inner.borrow_mut();
            let Some(last) = inner.members.len().checked_sub(1) else {
                return;
            };
            let current = inner.tabbable.unwrap_or(0);
            inner.tabbable = Some(action.apply(current, last));
        }

        if let Err(err) = self.update_tabbable(doc) {
            tracing::warn!("roving focus: failed to update tabindex: {}", err);
        }
        let (Some(index), Some(node)) = (self.tabbable_index(), self.tabbable_element()) else {
            return;
        };
        doc.focus(node);
        tracing::debug!("roving focus: {:?} -> index {}", action, index);

        if action != NavAction::Select {
            self.notify_focus_moved(doc, index, node);
        }
    }

    fn notify_focus_moved(&self, doc: &mut Document, index: usize, node: NodeId) {
        let Some(mut callback) = self.inner.borrow_mut().on_focus_moved.take() else {
            return;
        };
        callback(doc, index, node);
        let mut inner = self.inner.borrow_mut();
        if inner.on_focus_moved.is_none() {
            inner.on_focus_moved = Some(callback);
        }
    }
}
