//! State Sync Engine
//!
//! Binds a boolean attribute on a trigger element ("aria-expanded",
//! "aria-selected", ...) to an effect on a target element. The effect runs
//! once at bind time with the current value and again for every observed
//! change of that attribute. What flips the attribute (click, key, code)
//! is decoupled from what reacts to it.

use fos_a11y::{attr, parse_bool};
use fos_dom::{Document, EventType, ListenerId, MutationObserverInit, NodeId, ObserverId};

use crate::{Result, WidgetError};

/// Presentation effect: `(document, is_on, target)`
pub type Effect = Box<dyn FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()>>;

/// A live trigger/target binding. Dropping the handle leaves the binding
/// active; call [`BindingHandle::stop`] to tear it down.
#[derive(Debug)]
pub struct BindingHandle {
    trigger: NodeId,
    target: Option<NodeId>,
    attribute: String,
    observer: ObserverId,
    listeners: Vec<ListenerId>,
}

impl BindingHandle {
    pub fn trigger(&self) -> NodeId {
        self.trigger
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Add click and Enter/Space listeners that flip the attribute
    pub fn install_toggle(&mut self, doc: &mut Document) {
        if self.listeners.is_empty() {
            self.listeners = install_toggle(doc, self.trigger, &self.attribute);
        }
    }

    /// Remove the observation and any toggle listeners
    pub fn stop(self, doc: &mut Document) {
        doc.disconnect(self.observer);
        for listener in self.listeners {
            doc.remove_event_listener(listener);
        }
        tracing::debug!("state sync: unbound {} [{}]", self.trigger, self.attribute);
    }
}

/// Read the trigger's state: only the literal "true" is on
pub fn is_on(doc: &Document, attribute: &str, trigger: NodeId) -> bool {
    parse_bool(doc.get_attribute(attribute, trigger))
}

/// Bind `attribute` on `trigger` to `effect` on `target`. The effect runs
/// immediately with the current value. Without a target the effect never
/// runs but the observation is still installed.
pub fn bind(
    doc: &mut Document,
    trigger: NodeId,
    target: Option<NodeId>,
    attribute: &str,
    effect: impl FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + 'static,
) -> Result<BindingHandle> {
    let mut effect: Effect = Box::new(effect);
    if let Some(target) = target {
        let value = is_on(doc, attribute, trigger);
        effect(doc, value, target)?;
    }

    let name = attribute.to_string();
    let observer = doc.observe(trigger, MutationObserverInit::attribute(attribute), move |doc, records| {
        for record in records.iter().filter(|r| r.is_attribute(&name)) {
            let value = is_on(doc, &name, record.target);
            tracing::trace!("state sync: {} [{}] = {}", record.target, name, value);
            let Some(target) = target else {
                continue;
            };
            if let Err(err) = effect(doc, value, target) {
                tracing::warn!("state sync effect on {} failed: {}", target, err);
            }
        }
    });

    tracing::debug!("state sync: bound {} [{}] -> {:?}", trigger, attribute, target);
    Ok(BindingHandle {
        trigger,
        target,
        attribute: attribute.to_string(),
        observer,
        listeners: Vec::new(),
    })
}

/// Resolve the element referenced by the trigger's `aria-controls` inside `scope`
pub fn controlled_element(doc: &Document, scope: NodeId, trigger: NodeId) -> Result<NodeId> {
    let id = doc
        .get_attribute(attr::ARIA_CONTROLS, trigger)
        .ok_or_else(|| WidgetError::MissingTarget {
            trigger,
            id: String::new(),
        })?;
    doc.find_by_id(id, scope).ok_or_else(|| WidgetError::MissingTarget {
        trigger,
        id: id.to_string(),
    })
}

/// Like [`bind`], with the target taken from `aria-controls`. Fails fast
/// when the reference does not resolve.
pub fn bind_controlled(
    doc: &mut Document,
    scope: NodeId,
    trigger: NodeId,
    attribute: &str,
    effect: impl FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + 'static,
) -> Result<BindingHandle> {
    let target = controlled_element(doc, scope, trigger)?;
    bind(doc, trigger, Some(target), attribute, effect)
}

/// Click and Enter/Space keydown listeners that flip `attribute` on `trigger`
pub fn install_toggle(doc: &mut Document, trigger: NodeId, attribute: &str) -> Vec<ListenerId> {
    let name = attribute.to_string();
    let click = doc.add_event_listener(trigger, EventType::Click, move |doc, _| {
        if let Err(err) = doc.toggle_attribute(&name, trigger) {
            tracing::warn!("toggle {} on {} failed: {}", name, trigger, err);
        }
    });

    let name = attribute.to_string();
    let keydown = doc.add_event_listener(trigger, EventType::KeyDown, move |doc, event| {
        if event.key.is_some_and(|k| k.is_activation()) {
            if let Err(err) = doc.toggle_attribute(&name, trigger) {
                tracing::warn!("toggle {} on {} failed: {}", name, trigger, err);
            }
            event.prevent_default();
        }
    });

    vec![click, keydown]
}

/// Per-widget set of bindings. A trigger can be bound once; several
/// triggers may share a target.
#[derive(Debug, Default)]
pub struct StateSyncEngine {
    bindings: Vec<BindingHandle>,
}

impl StateSyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_bound(&self, trigger: NodeId) -> bool {
        self.bindings.iter().any(|b| b.trigger == trigger)
    }

    fn ensure_unbound(&self, trigger: NodeId) -> Result<()> {
        if self.is_bound(trigger) {
            return Err(WidgetError::TriggerAlreadyBound(trigger));
        }
        Ok(())
    }

    /// See [`bind`]
    pub fn bind(
        &mut self,
        doc: &mut Document,
        trigger: NodeId,
        target: Option<NodeId>,
        attribute: &str,
        effect: impl FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + 'static,
    ) -> Result<&mut BindingHandle> {
        self.ensure_unbound(trigger)?;
        let handle = bind(doc, trigger, target, attribute, effect)?;
        let index = self.bindings.len();
        self.bindings.push(handle);
        Ok(&mut self.bindings[index])
    }

    /// See [`bind_controlled`]
    pub fn bind_controlled(
        &mut self,
        doc: &mut Document,
        scope: NodeId,
        trigger: NodeId,
        attribute: &str,
        effect: impl FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + 'static,
    ) -> Result<&mut BindingHandle> {
        self.ensure_unbound(trigger)?;
        let handle = bind_controlled(doc, scope, trigger, attribute, effect)?;
        let index = self.bindings.len();
        self.bindings.push(handle);
        Ok(&mut self.bindings[index])
    }

    /// Stop the binding of one trigger
    pub fn unbind(&mut self, doc: &mut Document, trigger: NodeId) -> bool {
        let Some(pos) = self.bindings.iter().position(|b| b.trigger == trigger) else {
            return false;
        };
        self.bindings.remove(pos).stop(doc);
        true
    }

    /// Stop every binding
    pub fn stop_all(&mut self, doc: &mut Document) {
        for binding in self.bindings.drain(..) {
            binding.stop(doc);
        }
    }
}

/// Stock effects
pub mod effects {
    use fos_a11y::attr;
    use fos_dom::{Document, NodeId};

    /// `aria-hidden="false"` when on, `"true"` when off
    pub fn toggle_visibility(doc: &mut Document, visible: bool, target: NodeId) -> fos_dom::Result<()> {
        doc.set_attribute(attr::ARIA_HIDDEN, if visible { "false" } else { "true" }, target)
    }

    /// The `hidden` class when off
    pub fn toggle_hidden_class(doc: &mut Document, visible: bool, target: NodeId) -> fos_dom::Result<()> {
        doc.class_list_toggle("hidden", Some(!visible), target).map(|_| ())
    }

    /// Effect that keeps `class` present exactly while the state equals `present_when`
    pub fn toggle_class(
        class: &'static str,
        present_when: bool,
    ) -> impl FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + Clone {
        move |doc, on, target| doc.class_list_toggle(class, Some(on == present_when), target).map(|_| ())
    }

    /// Inline `height`: `open` when on, `0` when off
    pub fn toggle_height(open: &'static str) -> impl FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + Clone {
        move |doc, on, target| doc.set_style(target, "height", if on { open } else { "0" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::Key;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn panel(doc: &mut Document, expanded: &str) -> (NodeId, NodeId, NodeId) {
        let body = doc.body();
        let container = doc.append_element(body, "div", &[]).unwrap();
        let toggler = doc
            .append_element(container, "button", &[("aria-expanded", expanded), ("aria-controls", "body-1")])
            .unwrap();
        let content = doc.append_element(container, "div", &[("id", "body-1")]).unwrap();
        (container, toggler, content)
    }

    #[test]
    fn test_initial_sync() {
        let mut doc = Document::new();
        let (_, toggler, content) = panel(&mut doc, "false");
        bind(&mut doc, toggler, Some(content), "aria-expanded", effects::toggle_visibility).unwrap();
        assert!(doc.attribute_equals("aria-hidden", "true", content));
    }

    #[test]
    fn test_effect_receives_current_value_per_record() {
        let mut doc = Document::new();
        let (_, toggler, content) = panel(&mut doc, "false");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        bind(&mut doc, toggler, Some(content), "aria-expanded", move |_, on, _| {
            log.borrow_mut().push(on);
            Ok(())
        })
        .unwrap();

        doc.set_attribute("aria-expanded", "true", toggler).unwrap();
        doc.set_attribute("aria-expanded", "true", toggler).unwrap();
        doc.set_attribute("class", "open", toggler).unwrap();
        doc.flush_mutations();

        // one initial call, then one per matching record with the current value
        assert_eq!(*calls.borrow(), vec![false, true, true]);
    }

    #[test]
    fn test_toggle_listeners() {
        let mut doc = Document::new();
        let (_, toggler, content) = panel(&mut doc, "false");
        let mut handle = bind(&mut doc, toggler, Some(content), "aria-expanded", effects::toggle_visibility).unwrap();
        handle.install_toggle(&mut doc);

        doc.click(toggler);
        assert!(doc.attribute_equals("aria-expanded", "true", toggler));
        assert!(doc.attribute_equals("aria-hidden", "false", content));

        let event = doc.key_down(toggler, Key::Space, false);
        assert!(event.is_default_prevented());
        assert!(doc.attribute_equals("aria-hidden", "true", content));

        let event = doc.key_down(toggler, Key::Tab, false);
        assert!(!event.is_default_prevented());
    }

    #[test]
    fn test_stop_tears_down() {
        let mut doc = Document::new();
        let (_, toggler, content) = panel(&mut doc, "false");
        let listeners = doc.listener_count();
        let mut handle = bind(&mut doc, toggler, Some(content), "aria-expanded", effects::toggle_visibility).unwrap();
        handle.install_toggle(&mut doc);
        handle.stop(&mut doc);
        assert_eq!(doc.listener_count(), listeners);

        doc.set_attribute("aria-expanded", "true", toggler).unwrap();
        doc.flush_mutations();
        assert!(doc.attribute_equals("aria-hidden", "true", content));
    }

    #[test]
    fn test_missing_target_fails_fast() {
        let mut doc = Document::new();
        let (container, toggler, _) = panel(&mut doc, "false");
        doc.set_attribute("aria-controls", "nowhere", toggler).unwrap();

        let err = bind_controlled(&mut doc, container, toggler, "aria-expanded", effects::toggle_visibility)
            .unwrap_err();
        assert!(matches!(err, WidgetError::MissingTarget { ref id, .. } if id == "nowhere"));
    }

    #[test]
    fn test_absent_target_is_noop() {
        let mut doc = Document::new();
        let (_, toggler, _) = panel(&mut doc, "true");
        let handle = bind(&mut doc, toggler, None, "aria-expanded", |_, _, _| panic!("effect without target"))
            .unwrap();
        doc.set_attribute("aria-expanded", "false", toggler).unwrap();
        doc.flush_mutations();
        assert_eq!(handle.target(), None);
    }

    #[test]
    fn test_engine_rejects_second_binding_of_trigger() {
        let mut doc = Document::new();
        let (container, toggler, content) = panel(&mut doc, "false");
        let other = doc.append_element(container, "button", &[("aria-expanded", "true")]).unwrap();

        let mut engine = StateSyncEngine::new();
        engine
            .bind_controlled(&mut doc, container, toggler, "aria-expanded", effects::toggle_visibility)
            .unwrap();
        let err = engine
            .bind(&mut doc, toggler, Some(content), "aria-expanded", effects::toggle_visibility)
            .unwrap_err();
        assert!(matches!(err, WidgetError::TriggerAlreadyBound(t) if t == toggler));

        // shared target is fine
        engine
            .bind(&mut doc, other, Some(content), "aria-expanded", effects::toggle_hidden_class)
            .unwrap();
        assert_eq!(engine.len(), 2);

        assert!(engine.unbind(&mut doc, toggler));
        assert!(!engine.is_bound(toggler));
        engine.stop_all(&mut doc);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_toggle_class_effect() {
        let mut doc = Document::new();
        let (_, toggler, content) = panel(&mut doc, "false");
        bind(&mut doc, toggler, Some(content), "aria-expanded", effects::toggle_class("collapsed", false)).unwrap();
        assert!(doc.class_list_contains("collapsed", content));

        doc.set_attribute("aria-expanded", "true", toggler).unwrap();
        doc.flush_mutations();
        assert!(!doc.class_list_contains("collapsed", content));
    }

    #[test]
    fn test_toggle_height_effect() {
        let mut doc = Document::new();
        let (_, toggler, content) = panel(&mut doc, "true");
        let mut handle = bind(&mut doc, toggler, Some(content), "aria-expanded", effects::toggle_height("12em")).unwrap();
        assert_eq!(doc.style(content, "height"), Some("12em"));

        handle.install_toggle(&mut doc);
        doc.click(toggler);
        assert_eq!(doc.style(content, "height"), Some("0"));
    }
}
