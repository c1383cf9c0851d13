//! Tab Panel
//!
//! Selecting a tab marks it `aria-selected="true"` and shows exactly its
//! controlled tab panel. Tabs are reachable through a roving tabindex;
//! Enter/Space selects the focused tab.

use std::fmt;

use fos_a11y::{attr, AriaRole, RovingFocusController};
use fos_dom::{Document, EventType, ListenerId, NodeId};

use crate::Result;

/// Tab panel widget handle
pub struct TabPanel {
    element: NodeId,
    tabs: Vec<NodeId>,
    panels: Vec<NodeId>,
    roving: RovingFocusController,
    listeners: Vec<ListenerId>,
}

impl fmt::Debug for TabPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabPanel")
            .field("element", &self.element)
            .field("tabs", &self.tabs)
            .field("panels", &self.panels)
            .finish()
    }
}

/// Mark `tab` selected and show only the panel it controls
pub fn select_tab(doc: &mut Document, element: NodeId, tabs: &[NodeId], panels: &[NodeId], tab: NodeId) -> Result<()> {
    for &other in tabs {
        doc.set_attribute(attr::ARIA_SELECTED, "false", other)?;
    }
    doc.set_attribute(attr::ARIA_SELECTED, "true", tab)?;

    for &panel in panels {
        doc.set_attribute(attr::ARIA_HIDDEN, "true", panel)?;
    }
    let controlled = doc
        .get_attribute(attr::ARIA_CONTROLS, tab)
        .and_then(|id| doc.find_by_id(id, element));
    match controlled {
        Some(panel) => doc.set_attribute(attr::ARIA_HIDDEN, "false", panel)?,
        None => tracing::warn!("tab {} controls no panel in {}", tab, element),
    }
    tracing::debug!("tab panel {}: selected {}", element, tab);
    Ok(())
}

/// Initialize a tab panel
pub fn init(doc: &mut Document, element: NodeId) -> Result<TabPanel> {
    let tabs = doc.query_selector_all(&AriaRole::Tab.selector(), element)?;
    let panels = doc.query_selector_all(&AriaRole::TabPanel.selector(), element)?;
    let roving = RovingFocusController::new();

    {
        let (tabs, panels) = (tabs.clone(), panels.clone());
        roving.set_on_select(move |doc, tab| {
            if let Err(err) = select_tab(doc, element, &tabs, &panels, tab) {
                tracing::warn!("tab selection failed: {}", err);
            }
        });
    }

    let mut listeners = Vec::new();
    for (index, &tab) in tabs.iter().enumerate() {
        roving.add_element(doc, tab)?;
        let (tab_list, panel_list, controller) = (tabs.clone(), panels.clone(), roving.clone());
        listeners.push(doc.add_event_listener(tab, EventType::Click, move |doc, _| {
            if let Err(err) = select_tab(doc, element, &tab_list, &panel_list, tab) {
                tracing::warn!("tab selection failed: {}", err);
            }
            if let Err(err) = controller.force_selected_index(doc, index) {
                tracing::warn!("tab focus update failed: {}", err);
            }
        }));
    }

    Ok(TabPanel {
        element,
        tabs,
        panels,
        roving,
        listeners,
    })
}

impl TabPanel {
    pub fn tabs(&self) -> &[NodeId] {
        &self.tabs
    }

    pub fn panels(&self) -> &[NodeId] {
        &self.panels
    }

    pub fn roving(&self) -> &RovingFocusController {
        &self.roving
    }

    /// Select a tab programmatically
    pub fn select(&self, doc: &mut Document, tab: NodeId) -> Result<()> {
        select_tab(doc, self.element, &self.tabs, &self.panels, tab)?;
        if let Some(index) = self.tabs.iter().position(|&t| t == tab) {
            self.roving.force_selected_index(doc, index)?;
        }
        Ok(())
    }

    /// Remove listeners and the roving tabindex
    pub fn destroy(self, doc: &mut Document) -> Result<()> {
        for listener in self.listeners {
            doc.remove_event_listener(listener);
        }
        self.roving.destroy(doc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::Key;

    fn tab_panel(doc: &mut Document) -> (NodeId, Vec<NodeId>, Vec<NodeId>) {
        let body = doc.body();
        let element = doc.append_element(body, "div", &[("class", "tab-panel")]).unwrap();
        let list = doc.append_element(element, "ul", &[("role", "tablist")]).unwrap();
        let mut tabs = Vec::new();
        let mut panels = Vec::new();
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            let selected = if i == 0 { "true" } else { "false" };
            tabs.push(
                doc.append_element(
                    list,
                    "li",
                    &[("role", "tab"), ("aria-controls", name), ("aria-selected", selected)],
                )
                .unwrap(),
            );
        }
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            let hidden = if i == 0 { "false" } else { "true" };
            panels.push(
                doc.append_element(element, "div", &[("role", "tabpanel"), ("id", name), ("aria-hidden", hidden)])
                    .unwrap(),
            );
        }
        (element, tabs, panels)
    }

    #[test]
    fn test_click_selects_exactly_one() {
        let mut doc = Document::new();
        let (element, tabs, panels) = tab_panel(&mut doc);
        let widget = init(&mut doc, element).unwrap();

        doc.click(tabs[1]);
        for i in 0..3 {
            let on = i == 1;
            assert_eq!(doc.attribute_equals("aria-selected", "true", tabs[i]), on);
            assert_eq!(doc.attribute_equals("aria-hidden", "false", panels[i]), on);
        }
        assert_eq!(widget.roving().tabbable_index(), Some(1));
        assert!(doc.attribute_equals("tabindex", "0", tabs[1]));
    }

    #[test]
    fn test_keyboard_select() {
        let mut doc = Document::new();
        let (element, tabs, panels) = tab_panel(&mut doc);
        init(&mut doc, element).unwrap();

        doc.focus(tabs[0]);
        doc.key_down(tabs[0], Key::ArrowRight, false);
        doc.key_down(tabs[1], Key::ArrowRight, false);
        assert_eq!(doc.active_element(), Some(tabs[2]));
        // focus alone does not select
        assert!(doc.attribute_equals("aria-hidden", "true", panels[2]));

        doc.key_down(tabs[2], Key::Enter, false);
        assert!(doc.attribute_equals("aria-selected", "true", tabs[2]));
        assert!(doc.attribute_equals("aria-hidden", "false", panels[2]));
        assert!(doc.attribute_equals("aria-hidden", "true", panels[0]));
    }

    #[test]
    fn test_destroy() {
        let mut doc = Document::new();
        let (element, tabs, _) = tab_panel(&mut doc);
        let before = doc.listener_count();
        let widget = init(&mut doc, element).unwrap();
        widget.destroy(&mut doc).unwrap();
        assert_eq!(doc.listener_count(), before);
        assert!(!doc.has_attribute("tabindex", tabs[0]));
    }
}
