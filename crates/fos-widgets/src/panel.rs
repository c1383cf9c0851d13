//! Panel
//!
//! A container whose togglers show and hide their controlled elements
//! through `aria-hidden`.

use fos_dom::{Document, NodeId};

use crate::collapsible::init_collapsible;
use crate::{effects, Result, StateSyncEngine};

/// Initialize a panel
pub fn init(doc: &mut Document, element: NodeId) -> Result<StateSyncEngine> {
    init_collapsible(doc, element, effects::toggle_visibility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::Key;

    #[test]
    fn test_panel_toggles_body() {
        let mut doc = Document::new();
        let body = doc.body();
        let panel = doc.append_element(body, "div", &[("class", "panel")]).unwrap();
        let title = doc
            .append_element(panel, "button", &[("aria-expanded", "false"), ("aria-controls", "panel-body")])
            .unwrap();
        let content = doc.append_element(panel, "div", &[("id", "panel-body")]).unwrap();

        let engine = init(&mut doc, panel).unwrap();
        assert!(engine.is_bound(title));
        assert!(doc.attribute_equals("aria-hidden", "true", content));

        doc.click(title);
        assert!(doc.attribute_equals("aria-expanded", "true", title));
        assert!(doc.attribute_equals("aria-hidden", "false", content));

        doc.key_down(title, Key::Enter, false);
        assert!(doc.attribute_equals("aria-hidden", "true", content));
    }
}
