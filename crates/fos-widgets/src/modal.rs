//! Modal
//!
//! Hidden on init. Dismiss buttons and Escape hide it; Tab and Shift+Tab
//! wrap focus between the first and last tabbable descendant.

use fos_a11y::attr;
use fos_dom::{Document, Event, EventType, Key, ListenerId, NodeId};

use crate::Result;

/// Elements that take part in the tab order inside a modal
pub const TABBABLE_SELECTOR: &str = r#"a[href],link[href],button,input,select,textarea,[tabindex="0"]"#;

/// Buttons that close the modal
pub const DISMISS_SELECTOR: &str = r#"[data-dismiss="modal"]"#;

/// Modal widget handle
#[derive(Debug)]
pub struct Modal {
    element: NodeId,
    listeners: Vec<ListenerId>,
}

pub fn show(doc: &mut Document, element: NodeId) -> Result<()> {
    doc.set_attribute(attr::ARIA_HIDDEN, "false", element)?;
    Ok(())
}

pub fn hide(doc: &mut Document, element: NodeId) -> Result<()> {
    doc.set_attribute(attr::ARIA_HIDDEN, "true", element)?;
    Ok(())
}

fn handle_key_down(doc: &mut Document, element: NodeId, event: &mut Event) -> Result<()> {
    match event.key {
        Some(Key::Escape) => {
            hide(doc, element)?;
            event.prevent_default();
            tracing::debug!("modal {}: dismissed with escape", element);
        }
        Some(Key::Tab) => {
            let tabbables = doc.query_selector_all(TABBABLE_SELECTOR, element)?;
            let (Some(&first), Some(&last)) = (tabbables.first(), tabbables.last()) else {
                return Ok(());
            };
            if event.shift_key && event.target == first {
                doc.focus(last);
                event.prevent_default();
            } else if !event.shift_key && event.target == last {
                doc.focus(first);
                event.prevent_default();
            }
        }
        _ => {}
    }
    Ok(())
}

/// Initialize a modal
pub fn init(doc: &mut Document, element: NodeId) -> Result<Modal> {
    hide(doc, element)?;

    let mut listeners = Vec::new();
    for button in doc.query_selector_all(DISMISS_SELECTOR, element)? {
        listeners.push(doc.add_event_listener(button, EventType::Click, move |doc, _| {
            if let Err(err) = hide(doc, element) {
                tracing::warn!("modal {}: failed to hide: {}", element, err);
            }
        }));
    }
    listeners.push(doc.add_event_listener(element, EventType::KeyDown, move |doc, event| {
        if let Err(err) = handle_key_down(doc, element, event) {
            tracing::warn!("modal {}: key handling failed: {}", element, err);
        }
    }));

    Ok(Modal { element, listeners })
}

impl Modal {
    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn is_visible(&self, doc: &Document) -> bool {
        doc.attribute_equals(attr::ARIA_HIDDEN, "false", self.element)
    }

    pub fn show(&self, doc: &mut Document) -> Result<()> {
        show(doc, self.element)
    }

    pub fn hide(&self, doc: &mut Document) -> Result<()> {
        hide(doc, self.element)
    }

    pub fn destroy(self, doc: &mut Document) {
        for listener in self.listeners {
            doc.remove_event_listener(listener);
        }
    }
}
