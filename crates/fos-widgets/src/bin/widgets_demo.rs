//! fOS Widgets - Demo
//!
//! Builds a small page with a panel, a tab panel and a carousel, then
//! drives them with simulated input. Run with `RUST_LOG=debug` to follow
//! the state transitions.

use anyhow::Context;
use fos_dom::{Document, Key, NodeId};
use fos_widgets::{panel, tab_panel, Breakpoint, Carousel, CarouselConfig};
use tracing_subscriber::EnvFilter;

fn build_panel(doc: &mut Document, parent: NodeId) -> anyhow::Result<(NodeId, NodeId, NodeId)> {
    let element = doc.append_element(parent, "section", &[("class", "panel")])?;
    let title = doc.append_element(
        element,
        "button",
        &[("aria-expanded", "false"), ("aria-controls", "panel-body")],
    )?;
    doc.append_text(title, "Details")?;
    let body = doc.append_element(element, "div", &[("id", "panel-body")])?;
    doc.append_text(body, "Hidden until expanded")?;
    Ok((element, title, body))
}

fn build_tabs(doc: &mut Document, parent: NodeId) -> anyhow::Result<(NodeId, Vec<NodeId>)> {
    let element = doc.append_element(parent, "section", &[("class", "tab-panel")])?;
    let list = doc.append_element(element, "ul", &[("role", "tablist")])?;
    let mut tabs = Vec::new();
    for (i, name) in ["intro", "usage", "faq"].into_iter().enumerate() {
        let selected = if i == 0 { "true" } else { "false" };
        let tab = doc.append_element(list, "li", &[("role", "tab"), ("aria-controls", name), ("aria-selected", selected)])?;
        doc.append_text(tab, name)?;
        tabs.push(tab);
    }
    for (i, name) in ["intro", "usage", "faq"].into_iter().enumerate() {
        let hidden = if i == 0 { "false" } else { "true" };
        doc.append_element(element, "div", &[("role", "tabpanel"), ("id", name), ("aria-hidden", hidden)])?;
    }
    Ok((element, tabs))
}

fn build_carousel(doc: &mut Document, parent: NodeId, count: usize) -> anyhow::Result<NodeId> {
    let element = doc.append_element(parent, "div", &[("class", "image-scroller")])?;
    doc.append_element(element, "button", &[("class", "previous")])?;
    let list = doc.append_element(element, "ul", &[])?;
    for i in 0..count {
        let item = doc.append_element(list, "li", &[])?;
        let id = format!("image-{}", i);
        doc.append_element(item, "img", &[("aria-controls", id.as_str())])?;
    }
    doc.append_element(element, "button", &[("class", "next")])?;
    Ok(element)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut doc = Document::new();
    let body = doc.body();

    let (panel_element, title, panel_body) = build_panel(&mut doc, body)?;
    let _panel = panel::init(&mut doc, panel_element).context("panel init")?;
    tracing::info!("panel body hidden: {:?}", doc.get_attribute("aria-hidden", panel_body));
    doc.click(title);
    tracing::info!("after click, panel body hidden: {:?}", doc.get_attribute("aria-hidden", panel_body));

    let (tabs_element, tabs) = build_tabs(&mut doc, body)?;
    let tab_panel = tab_panel::init(&mut doc, tabs_element).context("tab panel init")?;
    doc.focus(tabs[0]);
    doc.key_down(tabs[0], Key::ArrowRight, false);
    doc.key_down(tabs[1], Key::Enter, false);
    let selected = tab_panel
        .tabs()
        .iter()
        .position(|&tab| doc.attribute_equals("aria-selected", "true", tab));
    tracing::info!("selected tab: {:?}", selected);

    let carousel_element = build_carousel(&mut doc, body, 7)?;
    let config = CarouselConfig {
        breakpoints: vec![Breakpoint { max_width: 768, size: 2 }],
        ..Default::default()
    };
    let carousel = Carousel::init_with_config(&mut doc, carousel_element, config).context("carousel init")?;
    let next = doc
        .query_selector(".next", carousel_element)?
        .context("carousel has no next button")?;
    for _ in 0..3 {
        doc.click(next);
        tracing::info!("carousel position {}", carousel.position());
    }

    doc.set_viewport_width(600);
    tracing::info!(
        "viewport 600px: window {} position {}",
        carousel.window_size(),
        carousel.position()
    );
    doc.set_viewport_width(1200);
    doc.set_attribute("data-size", "4", carousel_element)?;
    doc.flush_mutations();
    tracing::info!("data-size 4 at 1200px: window {}", carousel.window_size());

    let last = carousel.roving().members().last().copied().context("carousel has no items")?;
    let first = carousel.roving().tabbable_element().context("carousel has no tabbable item")?;
    doc.focus(first);
    doc.key_down(first, Key::End, false);
    doc.advance_time(500);
    tracing::info!(
        "after End: position {}, focused last item: {}",
        carousel.position(),
        doc.active_element() == Some(last)
    );

    carousel.destroy(&mut doc)?;
    Ok(())
}
