//! Collapsible
//!
//! Every toggler in a container flips its `aria-expanded` on click or
//! Enter/Space, and the element it controls follows through an effect.

use fos_a11y::attr;
use fos_dom::{Document, NodeId};

use crate::{Result, StateSyncEngine};

/// Togglers: elements that control another element and carry an expanded state
pub const TOGGLER_SELECTOR: &str = "[aria-controls][aria-expanded]";

/// Wire all togglers in `element` with `effect` (e.g. `effects::toggle_visibility`)
pub fn init_collapsible<F>(doc: &mut Document, element: NodeId, effect: F) -> Result<StateSyncEngine>
where
    F: FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + Clone + 'static,
{
    init_collapsible_with(doc, element, effect, TOGGLER_SELECTOR)
}

/// As [`init_collapsible`], with a custom toggler selector
pub fn init_collapsible_with<F>(
    doc: &mut Document,
    element: NodeId,
    effect: F,
    toggler_selector: &str,
) -> Result<StateSyncEngine>
where
    F: FnMut(&mut Document, bool, NodeId) -> fos_dom::Result<()> + Clone + 'static,
{
    let mut engine = StateSyncEngine::new();
    for toggler in doc.query_selector_all(toggler_selector, element)? {
        engine
            .bind_controlled(doc, element, toggler, attr::ARIA_EXPANDED, effect.clone())?
            .install_toggle(doc);
    }
    tracing::debug!("collapsible {}: {} togglers", element, engine.len());
    Ok(engine)
}
