//! Menu
//!
//! Choosing a menu item selects it, deselects the others and collapses the
//! menu again. The toggler shows and hides the item list.

use fos_a11y::{attr, AriaRole};
use fos_dom::{Document, EventType, ListenerId, NodeId};

use crate::collapsible::{init_collapsible, TOGGLER_SELECTOR};
use crate::{effects, Result, StateSyncEngine};

/// Menu widget handle
#[derive(Debug)]
pub struct Menu {
    items: Vec<NodeId>,
    toggler: Option<NodeId>,
    engine: StateSyncEngine,
    listeners: Vec<ListenerId>,
}

/// Select `item` among `items` and collapse the toggler
pub fn select_item(doc: &mut Document, items: &[NodeId], item: NodeId, toggler: Option<NodeId>) -> Result<()> {
    for &other in items {
        doc.set_attribute(attr::ARIA_SELECTED, "false", other)?;
    }
    doc.set_attribute(attr::ARIA_SELECTED, "true", item)?;
    if let Some(toggler) = toggler {
        doc.set_attribute(attr::ARIA_EXPANDED, "false", toggler)?;
    }
    tracing::debug!("menu: selected {}", item);
    Ok(())
}

/// Initialize a menu
pub fn init(doc: &mut Document, element: NodeId) -> Result<Menu> {
    let items = doc.query_selector_all(&AriaRole::MenuItem.selector(), element)?;
    let toggler = doc.query_selector(TOGGLER_SELECTOR, element)?;

    let mut listeners = Vec::new();
    for &item in &items {
        let all = items.clone();
        listeners.push(doc.add_event_listener(item, EventType::Click, move |doc, _| {
            if let Err(err) = select_item(doc, &all, item, toggler) {
                tracing::warn!("menu selection failed: {}", err);
            }
        }));
    }

    let engine = init_collapsible(doc, element, effects::toggle_visibility)?;
    Ok(Menu {
        items,
        toggler,
        engine,
        listeners,
    })
}

impl Menu {
    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn toggler(&self) -> Option<NodeId> {
        self.toggler
    }

    /// Remove listeners and bindings
    pub fn destroy(mut self, doc: &mut Document) {
        for listener in self.listeners {
            doc.remove_event_listener(listener);
        }
        self.engine.stop_all(doc);
    }
}
