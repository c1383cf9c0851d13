//! Document - High-level document API
//!
//! Owns the tree together with everything that reacts to it: event
//! listeners, mutation observers, focus and timers. Callbacks receive
//! `&mut Document`; they are taken out of their registry while running and
//! put back afterwards unless they were removed in the meantime.

use std::collections::{BTreeMap, VecDeque};

use crate::observer::ObserverRegistry;
use crate::timers::TimerQueue;
use crate::{
    DOMTokenList, DomError, DomTree, ElementData, Event, EventType, Key, MutationObserverInit,
    MutationRecord, NodeId, ObserverFn, ObserverId, Result, SelectorList, TimerFn, TimerId,
};

/// Event listener callback
pub type ListenerFn = Box<dyn FnMut(&mut Document, &mut Event)>;

/// Microtask callback, run at the end of the current checkpoint
pub type MicrotaskFn = Box<dyn FnOnce(&mut Document)>;

/// Event listener handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener {
    node: NodeId,
    event_type: EventType,
    callback: Option<ListenerFn>,
}

/// Maximum observer delivery rounds per checkpoint
const MAX_DELIVERY_ROUNDS: usize = 64;

/// Default viewport width in CSS pixels
const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;

/// Tags that take focus without an explicit tabindex
const NATURALLY_FOCUSABLE: &[&str] = &["button", "input", "select", "textarea"];

/// HTML Document
pub struct Document {
    tree: DomTree,
    body: NodeId,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener: u64,
    observers: ObserverRegistry,
    timers: TimerQueue,
    microtasks: VecDeque<MicrotaskFn>,
    active_element: Option<NodeId>,
    viewport_width: u32,
    /// Nesting depth of dispatches and timer callbacks
    depth: usize,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.len())
            .field("listeners", &self.listeners.len())
            .field("observers", &self.observers)
            .field("timers", &self.timers)
            .field("active_element", &self.active_element)
            .field("viewport_width", &self.viewport_width)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with `<html>` and `<body>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        let root = tree.root();
        let inserted = tree.insert(root, html, None).and_then(|_| tree.insert(html, body, None));
        debug_assert!(inserted.is_ok(), "skeleton insertion failed: {:?}", inserted);

        Self {
            tree,
            body,
            listeners: BTreeMap::new(),
            next_listener: 0,
            observers: ObserverRegistry::default(),
            timers: TimerQueue::default(),
            microtasks: VecDeque::new(),
            active_element: None,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            depth: 0,
        }
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Document node (also the target of window-level events)
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body
    }

    fn element(&self, node: NodeId) -> Result<&ElementData> {
        self.tree
            .node(node)?
            .as_element()
            .ok_or(DomError::NotAnElement(node))
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementData> {
        self.tree
            .get_mut(node)
            .ok_or(DomError::NodeNotFound(node))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(node))
    }

    // ========================================================================
    // Tree construction
    // ========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    /// Create an element with attributes and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> Result<NodeId> {
        let el = self.tree.create_element(tag);
        if let Some(data) = self.tree.get_mut(el).and_then(|n| n.as_element_mut()) {
            for (name, value) in attrs {
                data.set_attr(name, value);
            }
        }
        self.append_child(parent, el)?;
        Ok(el)
    }

    /// Create a text node and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> Result<NodeId> {
        let text = self.tree.create_text(content);
        self.append_child(parent, text)?;
        Ok(text)
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (append when None)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        self.tree.node(child)?;
        if self.tree.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(old_parent) = self.tree.detach(child) {
            self.queue_record(MutationRecord::child_list(old_parent, vec![], vec![child]));
        }
        self.tree.insert(parent, child, reference)?;
        self.queue_record(MutationRecord::child_list(parent, vec![child], vec![]));
        Ok(())
    }

    /// Remove `child` from `parent`. The node stays in the arena, detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.tree.parent(child) != Some(parent) {
            return Err(DomError::NodeNotFound(child));
        }
        self.tree.detach(child);
        self.queue_record(MutationRecord::child_list(parent, vec![], vec![child]));
        if self
            .active_element
            .is_some_and(|active| self.tree.is_inclusive_ancestor(child, active))
        {
            self.active_element = None;
        }
        Ok(())
    }

    /// Element children of a node
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.element_children(node)
    }

    /// Number of element children
    pub fn child_element_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    /// Parent of a node
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        self.tree
            .descendants(node)
            .into_iter()
            .filter_map(|n| self.tree.get(n).and_then(|n| n.as_text()))
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, node: NodeId, content: &str) -> Result<()> {
        for child in self.tree.children(node).to_vec() {
            self.remove_child(node, child)?;
        }
        self.append_text(node, content)?;
        Ok(())
    }

    /// Lowercase tag name
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).ok().map(|e| e.tag.as_str())
    }

    // ========================================================================
    // Attribute facade
    // ========================================================================

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str, node: NodeId) -> Option<&str> {
        self.element(node).ok()?.get_attr(name)
    }

    /// Set an attribute and queue an attributes record
    pub fn set_attribute(&mut self, name: &str, value: &str, node: NodeId) -> Result<()> {
        let old = self.element_mut(node)?.set_attr(name, value);
        self.queue_record(MutationRecord::attributes(node, name, old));
        Ok(())
    }

    /// Remove an attribute; queues a record only if it existed
    pub fn remove_attribute(&mut self, name: &str, node: NodeId) -> Result<()> {
        if let Some(old) = self.element_mut(node)?.remove_attr(name) {
            self.queue_record(MutationRecord::attributes(node, name, Some(old)));
        }
        Ok(())
    }

    /// Check if element has an attribute
    pub fn has_attribute(&self, name: &str, node: NodeId) -> bool {
        self.get_attribute(name, node).is_some()
    }

    /// Check if element has an attribute that equals `value`
    pub fn attribute_equals(&self, name: &str, value: &str, node: NodeId) -> bool {
        self.get_attribute(name, node) == Some(value)
    }

    /// Flip an attribute between "true" and "false". Returns the new state.
    pub fn toggle_attribute(&mut self, name: &str, node: NodeId) -> Result<bool> {
        let on = !self.attribute_equals(name, "true", node);
        self.set_attribute(name, if on { "true" } else { "false" }, node)?;
        Ok(on)
    }

    // ========================================================================
    // Class list and inline style
    // ========================================================================

    /// Class list of an element
    pub fn class_list(&self, node: NodeId) -> DOMTokenList {
        DOMTokenList::from_string(self.get_attribute("class", node).unwrap_or(""))
    }

    /// Returns true if an element has a class
    pub fn class_list_contains(&self, class: &str, node: NodeId) -> bool {
        self.class_list(node).contains(class)
    }

    /// Add or remove a class; `force` works like `classList.toggle`
    pub fn class_list_toggle(&mut self, class: &str, force: Option<bool>, node: NodeId) -> Result<bool> {
        let mut list = self.class_list(node);
        let before = list.clone();
        let on = list.toggle(class, force);
        if list != before {
            self.set_attribute("class", &list.value(), node)?;
        }
        Ok(on)
    }

    /// Add a class
    pub fn class_list_add(&mut self, class: &str, node: NodeId) -> Result<()> {
        self.class_list_toggle(class, Some(true), node).map(|_| ())
    }

    /// Remove a class
    pub fn class_list_remove(&mut self, class: &str, node: NodeId) -> Result<()> {
        self.class_list_toggle(class, Some(false), node).map(|_| ())
    }

    /// Set an inline style property
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.element_mut(node)?.set_style(property, value);
        Ok(())
    }

    /// Get an inline style property
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node).ok()?.get_style(property)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// First descendant of `node` matching `selector`
    pub fn query_selector(&self, selector: &str, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector, node)?.into_iter().next())
    }

    /// All descendants of `node` matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str, node: NodeId) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .tree
            .descendants(node)
            .into_iter()
            .filter(|&n| self.tree.get(n).and_then(|n| n.as_element()).is_some_and(|e| list.matches(e)))
            .collect())
    }

    /// Connected element with the given id
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.root())
            .into_iter()
            .find(|&n| self.attribute_equals("id", id, n))
    }

    /// Descendant of `scope` with the given id
    pub fn find_by_id(&self, id: &str, scope: NodeId) -> Option<NodeId> {
        self.tree
            .descendants(scope)
            .into_iter()
            .find(|&n| self.attribute_equals("id", id, n))
    }

    /// Check whether `ancestor` contains `node` (inclusive)
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.is_inclusive_ancestor(ancestor, node)
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// DOM `tabIndex`: the tabindex attribute, else 0 for natural controls, else -1
    pub fn tab_index(&self, node: NodeId) -> i32 {
        let Ok(el) = self.element(node) else {
            return -1;
        };
        if let Some(value) = el.get_attr("tabindex").and_then(|v| v.trim().parse().ok()) {
            return value;
        }
        if self.is_naturally_focusable(el) { 0 } else { -1 }
    }

    fn is_naturally_focusable(&self, el: &ElementData) -> bool {
        (el.tag == "a" && el.get_attr("href").is_some()) || NATURALLY_FOCUSABLE.contains(&el.tag.as_str())
    }

    /// Whether `focus()` would succeed on this node
    pub fn is_focusable(&self, node: NodeId) -> bool {
        let Ok(el) = self.element(node) else {
            return false;
        };
        if el.get_attr("disabled").is_some() && NATURALLY_FOCUSABLE.contains(&el.tag.as_str()) {
            return false;
        }
        self.tree.is_connected(node) && (el.get_attr("tabindex").is_some() || self.is_naturally_focusable(el))
    }

    /// Move input focus. Returns false if the node cannot take focus.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_focusable(node) {
            tracing::trace!("focus({}) ignored: not focusable", node);
            return false;
        }
        if self.active_element == Some(node) {
            return true;
        }
        if let Some(previous) = self.active_element.take() {
            self.dispatch_event(previous, Event::new(EventType::Blur));
        }
        self.active_element = Some(node);
        self.dispatch_event(node, Event::new(EventType::Focus));
        true
    }

    /// Remove focus from the active element
    pub fn blur(&mut self) {
        if let Some(previous) = self.active_element.take() {
            self.dispatch_event(previous, Event::new(EventType::Blur));
        }
    }

    /// Currently focused element
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register an event listener on a node
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: EventType,
        callback: impl FnMut(&mut Document, &mut Event) + 'static,
    ) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(
            id,
            Listener {
                node,
                event_type,
                callback: Some(Box::new(callback)),
            },
        );
        id
    }

    /// Remove an event listener. Safe to call from inside the listener.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Dispatch an event at `target`, bubbling through ancestors when the
    /// event type bubbles. Runs a microtask checkpoint when the outermost
    /// dispatch returns.
    pub fn dispatch_event(&mut self, target: NodeId, mut event: Event) -> Event {
        event.target = target;
        let path: Vec<NodeId> = if event.bubbles {
            std::iter::once(target).chain(self.tree.ancestors(target)).collect()
        } else {
            vec![target]
        };
        tracing::trace!("dispatch {} at {}", event.event_type.as_str(), target);

        self.depth += 1;
        for node in path {
            event.current_target = node;
            let ids: Vec<ListenerId> = self
                .listeners
                .iter()
                .filter(|(_, l)| l.node == node && l.event_type == event.event_type)
                .map(|(&id, _)| id)
                .collect();
            for id in ids {
                let Some(mut callback) = self.listeners.get_mut(&id).and_then(|l| l.callback.take()) else {
                    continue;
                };
                callback(self, &mut event);
                if let Some(listener) = self.listeners.get_mut(&id) {
                    listener.callback = Some(callback);
                }
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        self.depth -= 1;

        if self.depth == 0 {
            self.flush_mutations();
        }
        event
    }

    /// Dispatch a click
    pub fn click(&mut self, node: NodeId) -> Event {
        self.dispatch_event(node, Event::new(EventType::Click))
    }

    /// Dispatch a keydown
    pub fn key_down(&mut self, node: NodeId, key: Key, shift_key: bool) -> Event {
        self.dispatch_event(node, Event::keyboard(EventType::KeyDown, key, shift_key))
    }

    /// Dispatch a keypress
    pub fn key_press(&mut self, node: NodeId, key: Key) -> Event {
        self.dispatch_event(node, Event::keyboard(EventType::KeyPress, key, false))
    }

    /// Signal that a CSS transition on `node` finished
    pub fn transition_end(&mut self, node: NodeId) -> Event {
        self.dispatch_event(node, Event::new(EventType::TransitionEnd))
    }

    // ========================================================================
    // Viewport
    // ========================================================================

    /// Current viewport width in CSS pixels
    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    /// Change the viewport width and fire `resize` at the document
    pub fn set_viewport_width(&mut self, width: u32) {
        if width == self.viewport_width {
            return;
        }
        self.viewport_width = width;
        self.dispatch_event(self.root(), Event::new(EventType::Resize));
    }

    // ========================================================================
    // Mutation observers
    // ========================================================================

    /// Start observing `node`
    pub fn observe(
        &mut self,
        node: NodeId,
        options: MutationObserverInit,
        callback: impl FnMut(&mut Document, &[MutationRecord]) + 'static,
    ) -> ObserverId {
        let callback: ObserverFn = Box::new(callback);
        self.observers.observe(node, options, callback)
    }

    /// Stop an observer and drop its pending records
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.disconnect(id)
    }

    fn queue_record(&mut self, record: MutationRecord) {
        if !self.observers.is_empty() {
            self.observers.queue(&self.tree, record);
        }
    }

    /// Queue a callback for the end of the current checkpoint. Outside any
    /// dispatch or timer callback the checkpoint runs right away.
    pub fn queue_microtask(&mut self, callback: impl FnOnce(&mut Document) + 'static) {
        self.microtasks.push_back(Box::new(callback));
        if self.depth == 0 {
            self.flush_mutations();
        }
    }

    /// Microtask checkpoint: deliver pending mutation records, then run
    /// queued microtasks, until both are drained. Records produced by the
    /// callbacks themselves are delivered in later rounds.
    pub fn flush_mutations(&mut self) {
        let mut rounds = 0;
        while self.observers.has_pending() || !self.microtasks.is_empty() {
            rounds += 1;
            if rounds > MAX_DELIVERY_ROUNDS {
                tracing::warn!("checkpoint exceeded {} rounds; dropping pending records", MAX_DELIVERY_ROUNDS);
                self.observers.clear_pending();
                self.microtasks.clear();
                break;
            }
            self.depth += 1;
            for id in self.observers.pending_ids() {
                let Some((mut callback, records)) = self.observers.take(id) else {
                    continue;
                };
                tracing::trace!("delivering {} mutation records", records.len());
                callback(self, &records);
                self.observers.restore(id, callback);
            }
            let tasks = std::mem::take(&mut self.microtasks);
            for task in tasks {
                task(self);
            }
            self.depth -= 1;
        }
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Schedule a one-shot callback
    pub fn set_timeout(&mut self, delay_ms: u64, callback: impl FnOnce(&mut Document) + 'static) -> TimerId {
        let callback: TimerFn = Box::new(callback);
        self.timers.schedule(delay_ms, callback)
    }

    /// Cancel a pending timeout
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Number of pending timeouts
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// Advance the virtual clock, running every timer that becomes due
    pub fn advance_time(&mut self, ms: u64) {
        let deadline = self.timers.now() + ms;
        while let Some(callback) = self.timers.pop_due(deadline) {
            self.depth += 1;
            callback(self);
            self.depth -= 1;
            if self.depth == 0 {
                self.flush_mutations();
            }
        }
        self.timers.set_now(deadline);
    }
}
