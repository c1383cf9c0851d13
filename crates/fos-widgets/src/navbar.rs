//! Navbar
//!
//! A menu with keyboard support. Menu items form a roving tabindex group;
//! Enter/Space or a click selects an item and collapses the navbar, which
//! carries the `collapsed` class while its toggler is not expanded.

use std::fmt;

use fos_a11y::{attr, AriaRole, RovingFocusController};
use fos_dom::{Document, EventType, ListenerId, NodeId};

use crate::collapsible::{init_collapsible, TOGGLER_SELECTOR};
use crate::{effects, Result, StateSyncEngine};

/// Class carried by the collapsed navbar content
pub const COLLAPSED_CLASS: &str = "collapsed";

/// Navbar widget handle
pub struct Navbar {
    items: Vec<NodeId>,
    roving: RovingFocusController,
    engine: StateSyncEngine,
    listeners: Vec<ListenerId>,
}

impl fmt::Debug for Navbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navbar")
            .field("items", &self.items)
            .field("roving", &self.roving)
            .field("bindings", &self.engine.len())
            .finish()
    }
}

/// Mark `item` as the only selected item; the others lose the attribute
fn select_item(doc: &mut Document, items: &[NodeId], item: NodeId, toggler: Option<NodeId>) -> Result<()> {
    for &other in items {
        doc.remove_attribute(attr::ARIA_SELECTED, other)?;
    }
    doc.set_attribute(attr::ARIA_SELECTED, "true", item)?;
    if let Some(toggler) = toggler {
        doc.set_attribute(attr::ARIA_EXPANDED, "false", toggler)?;
    }
    tracing::debug!("navbar: selected {}", item);
    Ok(())
}

/// Initialize a navbar
pub fn init(doc: &mut Document, element: NodeId) -> Result<Navbar> {
    let items = doc.query_selector_all(&AriaRole::MenuItem.selector(), element)?;
    let toggler = doc.query_selector(TOGGLER_SELECTOR, element)?;
    let roving = RovingFocusController::new();

    {
        let items = items.clone();
        roving.set_on_select(move |doc, item| {
            if let Err(err) = select_item(doc, &items, item, toggler) {
                tracing::warn!("navbar selection failed: {}", err);
            }
        });
    }

    let mut listeners = Vec::new();
    for (index, &item) in items.iter().enumerate() {
        let (all, roving_handle) = (items.clone(), roving.clone());
        listeners.push(doc.add_event_listener(item, EventType::Click, move |doc, _| {
            if let Err(err) = select_item(doc, &all, item, toggler) {
                tracing::warn!("navbar selection failed: {}", err);
            }
            if let Err(err) = roving_handle.force_selected_index(doc, index) {
                tracing::warn!("navbar focus update failed: {}", err);
            }
        }));
        roving.add_element(doc, item)?;
    }

    let engine = init_collapsible(doc, element, effects::toggle_class(COLLAPSED_CLASS, false))?;
    Ok(Navbar {
        items,
        roving,
        engine,
        listeners,
    })
}

impl Navbar {
    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn roving(&self) -> &RovingFocusController {
        &self.roving
    }

    /// Remove listeners, bindings and the roving tabindex
    pub fn destroy(mut self, doc: &mut Document) -> Result<()> {
        for listener in self.listeners {
            doc.remove_event_listener(listener);
        }
        self.engine.stop_all(doc);
        self.roving.destroy(doc)?;
        Ok(())
    }
}
