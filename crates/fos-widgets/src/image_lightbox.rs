//! Image Lightbox
//!
//! The `data-show` attribute on the lightbox holds the index of the image
//! on display; removing it closes the lightbox. Buttons only write that
//! attribute, and an observer re-renders the view from it.

use std::cell::Cell;
use std::rc::Rc;

use fos_a11y::{attr, LIVE_POLITE};
use fos_dom::{Document, EventType, Key, ListenerId, MutationObserverInit, NodeId, ObserverId};

use crate::{Result, WidgetError};

/// Attribute holding the index of the image on display
pub const ATTRIBUTE_SHOW: &str = "data-show";

pub const IMAGE_SELECTOR: &str = ".imagelightbox-image";
pub const PROGRESS_SELECTOR: &str = ".imagelightbox-progress";

/// Class marking the visible image, the visible lightbox and its usable buttons
const ACTIVE_CLASS: &str = "active";

#[derive(Debug, Clone, Copy)]
struct Parts {
    element: NodeId,
    previous: NodeId,
    next: NodeId,
    close: NodeId,
    progress: Option<NodeId>,
}

impl Parts {
    fn find(doc: &Document, element: NodeId) -> Result<Self> {
        let part = |selector: &str, name: &'static str| -> Result<NodeId> {
            doc.query_selector(selector, element)?
                .ok_or(WidgetError::MissingPart { widget: element, part: name })
        };
        Ok(Self {
            element,
            previous: part(".previous", "previous button")?,
            next: part(".next", "next button")?,
            close: part(".close", "close button")?,
            progress: doc.query_selector(PROGRESS_SELECTOR, element)?,
        })
    }
}

/// Image lightbox widget handle
#[derive(Debug)]
pub struct ImageLightbox {
    parts: Parts,
    current: Rc<Cell<Option<usize>>>,
    listeners: Vec<ListenerId>,
    observer: ObserverId,
}

/// Image index from the `data-show` attribute, if it names an image
fn shown_index(doc: &Document, element: NodeId, count: usize) -> Option<usize> {
    let value = doc.get_attribute(ATTRIBUTE_SHOW, element)?;
    match value.trim().parse::<usize>() {
        Ok(index) if index < count => Some(index),
        _ => {
            tracing::warn!("lightbox {}: no image for {}={:?}", element, ATTRIBUTE_SHOW, value);
            None
        }
    }
}

fn set_disabled(doc: &mut Document, button: NodeId, disabled: bool) -> Result<()> {
    if disabled {
        doc.set_attribute(attr::TABINDEX, "-1", button)?;
        doc.set_attribute(attr::ARIA_DISABLED, "true", button)?;
    } else {
        doc.set_attribute(attr::TABINDEX, "0", button)?;
        doc.remove_attribute(attr::ARIA_DISABLED, button)?;
    }
    Ok(())
}

/// Focus the first candidate that is in the tab order
fn focus_first(doc: &mut Document, candidates: &[NodeId]) {
    if let Some(&node) = candidates.iter().find(|&&node| doc.tab_index(node) != -1) {
        doc.focus(node);
    }
}

fn render(doc: &mut Document, parts: &Parts, current: Option<usize>, template: &str) -> Result<()> {
    let images = doc.query_selector_all(IMAGE_SELECTOR, parts.element)?;

    for &image in &images {
        doc.class_list_remove(ACTIVE_CLASS, image)?;
        doc.remove_attribute(attr::ARIA_LIVE, image)?;
    }
    if let Some(&image) = current.and_then(|index| images.get(index)) {
        doc.class_list_add(ACTIVE_CLASS, image)?;
        doc.set_attribute(attr::ARIA_LIVE, LIVE_POLITE, image)?;
    }

    if let (Some(progress), Some(index)) = (parts.progress, current) {
        let text = template
            .replacen(":num", &(index + 1).to_string(), 1)
            .replacen(":total", &images.len().to_string(), 1);
        doc.set_text_content(progress, &text)?;
    }

    for button in [parts.previous, parts.next] {
        doc.class_list_toggle(ACTIVE_CLASS, Some(!images.is_empty()), button)?;
    }
    set_disabled(doc, parts.previous, current == Some(0))?;
    set_disabled(doc, parts.next, current.is_some() && current == images.len().checked_sub(1))?;

    let open = current.is_some();
    doc.class_list_toggle(ACTIVE_CLASS, Some(open), parts.element)?;
    if let Some(parent) = doc.parent(parts.element) {
        for sibling in doc.children(parent) {
            if sibling == parts.element {
                continue;
            }
            if open {
                doc.set_attribute(attr::ARIA_HIDDEN, "true", sibling)?;
            } else {
                doc.remove_attribute(attr::ARIA_HIDDEN, sibling)?;
            }
        }
    }
    tracing::debug!("lightbox {}: showing {:?} of {}", parts.element, current, images.len());
    Ok(())
}

/// Run `handler` on click and on Enter/Space key presses
fn on_button_press(
    doc: &mut Document,
    button: NodeId,
    handler: impl Fn(&mut Document) -> Result<()> + Clone + 'static,
) -> [ListenerId; 2] {
    let on_click = handler.clone();
    let click = doc.add_event_listener(button, EventType::Click, move |doc, _| {
        if let Err(err) = on_click(doc) {
            tracing::warn!("lightbox button {} failed: {}", button, err);
        }
    });
    let press = doc.add_event_listener(button, EventType::KeyPress, move |doc, event| {
        if !event.key.is_some_and(|k| k.is_activation()) {
            return;
        }
        if let Err(err) = handler(doc) {
            tracing::warn!("lightbox button {} failed: {}", button, err);
        }
        event.prevent_default();
    });
    [click, press]
}

/// Redirect Tab (`backward == false`) or Shift+Tab (`backward == true`) on
/// `button` to the first usable of `targets`
fn on_button_tab(doc: &mut Document, button: NodeId, backward: bool, targets: Vec<NodeId>) -> ListenerId {
    doc.add_event_listener(button, EventType::KeyDown, move |doc, event| {
        if event.key == Some(Key::Tab) && event.shift_key == backward {
            focus_first(doc, &targets);
            event.prevent_default();
        }
    })
}

/// Initialize an image lightbox
pub fn init(doc: &mut Document, element: NodeId) -> Result<ImageLightbox> {
    let parts = Parts::find(doc, element)?;
    let template = parts.progress.map(|p| doc.text_content(p)).unwrap_or_default();
    let current: Rc<Cell<Option<usize>>> = Rc::new(Cell::new(None));
    let mut listeners = Vec::new();

    let navigate = |step: isize, button: NodeId| {
        let current = current.clone();
        move |doc: &mut Document| -> Result<()> {
            if doc.has_attribute(attr::ARIA_DISABLED, button) {
                return Ok(());
            }
            let Some(index) = current.get().and_then(|i: usize| i.checked_add_signed(step)) else {
                return Ok(());
            };
            doc.set_attribute(ATTRIBUTE_SHOW, &index.to_string(), element)?;
            Ok(())
        }
    };
    listeners.extend(on_button_press(doc, parts.next, navigate(1, parts.next)));
    listeners.extend(on_button_press(doc, parts.previous, navigate(-1, parts.previous)));
    listeners.extend(on_button_press(doc, parts.close, move |doc| {
        doc.remove_attribute(ATTRIBUTE_SHOW, element)?;
        Ok(())
    }));

    listeners.push(on_button_tab(doc, parts.next, true, vec![parts.close]));
    listeners.push(on_button_tab(doc, parts.previous, true, vec![parts.next, parts.close]));
    listeners.push(on_button_tab(doc, parts.close, false, vec![parts.next, parts.previous]));

    let state = current.clone();
    let observer = doc.observe(element, MutationObserverInit::attribute(ATTRIBUTE_SHOW), move |doc, records| {
        if !records.iter().any(|r| r.is_attribute(ATTRIBUTE_SHOW)) {
            return;
        }
        let count = doc.query_selector_all(IMAGE_SELECTOR, element).map_or(0, |images| images.len());
        let shown = shown_index(doc, element, count);
        state.set(shown);
        if let Err(err) = render(doc, &parts, shown, &template) {
            tracing::warn!("lightbox {}: render failed: {}", element, err);
        }
    });

    Ok(ImageLightbox {
        parts,
        current,
        listeners,
        observer,
    })
}

impl ImageLightbox {
    /// Index of the image on display, `None` while closed
    pub fn current(&self) -> Option<usize> {
        self.current.get()
    }

    pub fn is_open(&self) -> bool {
        self.current().is_some()
    }

    /// Show image `index`
    pub fn open(&self, doc: &mut Document, index: usize) -> Result<()> {
        doc.set_attribute(ATTRIBUTE_SHOW, &index.to_string(), self.parts.element)?;
        Ok(())
    }

    pub fn close(&self, doc: &mut Document) -> Result<()> {
        doc.remove_attribute(ATTRIBUTE_SHOW, self.parts.element)?;
        Ok(())
    }

    pub fn destroy(self, doc: &mut Document) {
        doc.disconnect(self.observer);
        for listener in self.listeners {
            doc.remove_event_listener(listener);
        }
    }
}
