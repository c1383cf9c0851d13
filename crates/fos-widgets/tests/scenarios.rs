//! End-to-end widget scenarios against the DOM model

use std::cell::RefCell;
use std::rc::Rc;

use fos_a11y::RovingFocusController;
use fos_dom::{Document, EventType, Key, NodeId};
use fos_widgets::{panel, state_sync, tab_panel, Breakpoint, Carousel, CarouselConfig, CarouselState, Direction};
use proptest::prelude::*;

/// User input on a toggle trigger
#[derive(Debug, Clone, Copy)]
enum Press {
    Click,
    Enter,
    Space,
}

/// Operation on a roving focus controller over a pool of elements
#[derive(Debug, Clone, Copy)]
enum RovingOp {
    Add(usize),
    Remove(usize),
    Key(Key),
}

const POOL_SIZE: usize = 6;

fn press_strategy() -> impl Strategy<Value = Press> {
    prop_oneof![Just(Press::Click), Just(Press::Enter), Just(Press::Space)]
}

fn roving_op_strategy() -> impl Strategy<Value = RovingOp> {
    let key = prop_oneof![
        Just(Key::ArrowLeft),
        Just(Key::ArrowRight),
        Just(Key::ArrowUp),
        Just(Key::ArrowDown),
        Just(Key::Home),
        Just(Key::End),
    ];
    prop_oneof![
        (0..POOL_SIZE).prop_map(RovingOp::Add),
        (0..POOL_SIZE).prop_map(RovingOp::Remove),
        key.prop_map(RovingOp::Key),
    ]
}

struct CarouselFixture {
    doc: Document,
    element: NodeId,
    list: NodeId,
    previous: NodeId,
    next: NodeId,
    targets: Vec<NodeId>,
}

fn carousel_fixture(count: usize) -> CarouselFixture {
    let mut doc = Document::new();
    let body = doc.body();
    let element = doc.append_element(body, "div", &[("class", "image-scroller")]).unwrap();
    let previous = doc.append_element(element, "button", &[("class", "previous")]).unwrap();
    let list = doc.append_element(element, "ul", &[]).unwrap();
    let next = doc.append_element(element, "button", &[("class", "next")]).unwrap();
    let targets = (0..count)
        .map(|i| {
            let item = doc.append_element(list, "li", &[]).unwrap();
            doc.append_element(item, "img", &[("aria-controls", format!("image-{}", i).as_str())])
                .unwrap()
        })
        .collect();
    CarouselFixture {
        doc,
        element,
        list,
        previous,
        next,
        targets,
    }
}

fn add_item(doc: &mut Document, list: NodeId) -> NodeId {
    let item = doc.create_element("li");
    doc.append_element(item, "img", &[("aria-controls", "extra")]).unwrap();
    doc.append_child(list, item).unwrap();
    item
}

fn tabbable_count(doc: &Document, members: &[NodeId]) -> usize {
    members
        .iter()
        .filter(|&&node| doc.attribute_equals("tabindex", "0", node))
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_toggle_invariant(presses in prop::collection::vec(press_strategy(), 1..30)) {
        let mut doc = Document::new();
        let body = doc.body();
        let trigger = doc
            .append_element(body, "button", &[("aria-expanded", "false"), ("aria-controls", "t")])
            .unwrap();
        let target = doc.append_element(body, "div", &[("id", "t")]).unwrap();

        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        let mut handle = state_sync::bind(&mut doc, trigger, Some(target), "aria-expanded", move |_, on, _| {
            log.borrow_mut().push(on);
            Ok(())
        })
        .unwrap();
        prop_assert_eq!(calls.borrow().clone(), vec![false]);
        handle.install_toggle(&mut doc);

        for (round, press) in presses.into_iter().enumerate() {
            match press {
                Press::Click => doc.click(trigger),
                Press::Enter => doc.key_down(trigger, Key::Enter, false),
                Press::Space => doc.key_down(trigger, Key::Space, false),
            };
            let calls = calls.borrow();
            prop_assert_eq!(calls.len(), round + 2);
            prop_assert_eq!(calls.last().copied(), Some(doc.attribute_equals("aria-expanded", "true", trigger)));
        }
    }

    #[test]
    fn test_exclusive_reachability(ops in prop::collection::vec(roving_op_strategy(), 1..80)) {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc.append_element(body, "ul", &[]).unwrap();
        let pool: Vec<NodeId> = (0..POOL_SIZE).map(|_| doc.append_element(list, "li", &[]).unwrap()).collect();
        let controller = RovingFocusController::new();

        for op in ops {
            match op {
                RovingOp::Add(i) => controller.add_element(&mut doc, pool[i]).unwrap(),
                RovingOp::Remove(i) => controller.remove_element(&mut doc, pool[i]).unwrap(),
                RovingOp::Key(key) => {
                    if let Some(tabbable) = controller.tabbable_element() {
                        doc.key_down(tabbable, key, false);
                    }
                }
            }
            let members = controller.members();
            let expected = if members.is_empty() { 0 } else { 1 };
            prop_assert_eq!(tabbable_count(&doc, &members), expected);
            prop_assert_eq!(tabbable_count(&doc, &pool), expected);
        }
    }

    #[test]
    fn test_carousel_position_stays_clamped(
        count in 0usize..12,
        window in 1usize..8,
        clicks in prop::collection::vec(any::<bool>(), 0..40),
    ) {
        let mut f = carousel_fixture(count);
        let config = CarouselConfig {
            window_size: window,
            ..Default::default()
        };
        let carousel = Carousel::init_with_config(&mut f.doc, f.element, config).unwrap();
        let min = CarouselState::new(window).min_position(count);

        for next in clicks {
            let before = carousel.position();
            let button = if next { f.next } else { f.previous };
            let disabled = f.doc.has_attribute("disabled", button);
            f.doc.click(button);
            let position = carousel.position();
            prop_assert!((min..=0).contains(&position), "{} outside [{}, 0]", position, min);
            if disabled {
                prop_assert_eq!(position, before);
            } else {
                prop_assert_eq!((position - before).abs(), 1);
            }
        }
    }
}

#[test]
fn test_wraparound() {
    let mut doc = Document::new();
    let body = doc.body();
    let controller = RovingFocusController::new();
    let items: Vec<NodeId> = (0..3).map(|_| doc.append_element(body, "li", &[]).unwrap()).collect();
    for &item in &items {
        controller.add_element(&mut doc, item).unwrap();
    }

    doc.key_down(items[0], Key::ArrowLeft, false);
    assert_eq!(controller.tabbable_index(), Some(2));
    assert_eq!(doc.active_element(), Some(items[2]));

    doc.key_down(items[2], Key::ArrowDown, false);
    assert_eq!(controller.tabbable_index(), Some(0));
    assert_eq!(doc.active_element(), Some(items[0]));
}

#[test]
fn test_carousel_button_visibility() {
    for count in [0, 3, 5, 6, 7] {
        let mut f = carousel_fixture(count);
        let carousel = Carousel::init_with_config(&mut f.doc, f.element, CarouselConfig::default()).unwrap();
        let hidden = if count <= 5 { "true" } else { "false" };
        for _ in 0..3 {
            assert!(f.doc.attribute_equals("aria-hidden", hidden, f.previous));
            assert!(f.doc.attribute_equals("aria-hidden", hidden, f.next));
            carousel.navigate(&mut f.doc, Direction::Next).unwrap();
        }
    }
}

#[test]
fn test_scenario_panel() {
    let mut doc = Document::new();
    let body = doc.body();
    let element = doc.append_element(body, "div", &[]).unwrap();
    let toggle = doc
        .append_element(element, "button", &[("aria-expanded", "false"), ("aria-controls", "content")])
        .unwrap();
    let content = doc.append_element(element, "div", &[("id", "content")]).unwrap();
    panel::init(&mut doc, element).unwrap();
    assert!(doc.attribute_equals("aria-hidden", "true", content));

    doc.click(toggle);
    assert!(doc.attribute_equals("aria-expanded", "true", toggle));
    assert!(doc.attribute_equals("aria-hidden", "false", content));

    doc.click(toggle);
    assert!(doc.attribute_equals("aria-expanded", "false", toggle));
    assert!(doc.attribute_equals("aria-hidden", "true", content));
}

#[test]
fn test_scenario_tabs() {
    let mut doc = Document::new();
    let body = doc.body();
    let element = doc.append_element(body, "div", &[]).unwrap();
    let tabs: Vec<NodeId> = (1..=3)
        .map(|i| {
            let selected = if i == 1 { "true" } else { "false" };
            let id = format!("panel-{}", i);
            doc.append_element(element, "button", &[("role", "tab"), ("aria-controls", id.as_str()), ("aria-selected", selected)])
                .unwrap()
        })
        .collect();
    let panels: Vec<NodeId> = (1..=3)
        .map(|i| {
            let id = format!("panel-{}", i);
            doc.append_element(element, "div", &[("role", "tabpanel"), ("id", id.as_str())]).unwrap()
        })
        .collect();
    tab_panel::init(&mut doc, element).unwrap();

    doc.click(tabs[2]);
    assert!(doc.attribute_equals("aria-selected", "true", tabs[2]));
    assert!(!doc.attribute_equals("aria-selected", "true", tabs[0]));
    assert!(!doc.attribute_equals("aria-selected", "true", tabs[1]));
    assert!(doc.attribute_equals("aria-hidden", "false", panels[2]));
    assert!(doc.attribute_equals("aria-hidden", "true", panels[0]));
    assert!(doc.attribute_equals("aria-hidden", "true", panels[1]));
}

#[test]
fn test_scenario_carousel() {
    let mut f = carousel_fixture(7);
    let carousel = Carousel::init_with_config(&mut f.doc, f.element, CarouselConfig::default()).unwrap();
    assert_eq!(carousel.position(), 0);
    assert!(f.doc.has_attribute("disabled", f.previous));
    assert!(!f.doc.has_attribute("disabled", f.next));
    assert_eq!(f.doc.style(f.list, "width"), Some("140%"));
    assert_eq!(f.doc.style(f.list, "margin-left"), Some("0%"));

    f.doc.click(f.next);
    assert_eq!(carousel.position(), -1);
    assert!(!f.doc.has_attribute("disabled", f.previous));
    assert_eq!(f.doc.style(f.list, "margin-left"), Some("-20%"));

    f.doc.click(f.next);
    f.doc.click(f.next);
    assert_eq!(carousel.position(), -2);
    assert!(f.doc.has_attribute("disabled", f.next));
    // the disabled button hands focus to its opposite
    assert_eq!(f.doc.active_element(), Some(f.previous));
}

#[test]
fn test_scenario_roving_removal() {
    let mut doc = Document::new();
    let body = doc.body();
    let controller = RovingFocusController::new();
    let items: Vec<NodeId> = (0..3).map(|_| doc.append_element(body, "li", &[]).unwrap()).collect();
    for &item in &items {
        controller.add_element(&mut doc, item).unwrap();
    }
    controller.force_selected_index(&mut doc, 2).unwrap();
    assert!(doc.attribute_equals("tabindex", "0", items[2]));

    controller.remove_element(&mut doc, items[2]).unwrap();
    assert_eq!(controller.tabbable_index(), Some(0));
    assert!(doc.attribute_equals("tabindex", "0", items[0]));
    assert!(doc.attribute_equals("tabindex", "-1", items[1]));
    assert!(!doc.has_attribute("tabindex", items[2]));
}

#[test]
fn test_carousel_child_list_reconciliation() {
    let mut f = carousel_fixture(7);
    let carousel = Carousel::init_with_config(&mut f.doc, f.element, CarouselConfig::default()).unwrap();
    assert_eq!(carousel.roving().len(), 7);
    f.doc.click(f.next);
    assert_eq!(carousel.position(), -1);

    // no slide touched: position kept
    f.doc.append_text(f.list, " ").unwrap();
    f.doc.flush_mutations();
    assert_eq!(carousel.position(), -1);

    let item = add_item(&mut f.doc, f.list);
    f.doc.flush_mutations();
    assert_eq!(carousel.position(), 0);
    assert_eq!(carousel.roving().len(), 8);
    assert_eq!(f.doc.style(f.list, "width"), Some("160%"));

    f.doc.click(f.next);
    f.doc.remove_child(f.list, item).unwrap();
    f.doc.flush_mutations();
    assert_eq!(carousel.position(), 0);
    assert_eq!(carousel.roving().len(), 7);
    let removed_target = f.doc.query_selector("img", item).unwrap().unwrap();
    assert!(!f.doc.has_attribute("tabindex", removed_target));
}

#[test]
fn test_carousel_resize() {
    let mut f = carousel_fixture(7);
    let config = CarouselConfig {
        breakpoints: vec![Breakpoint { max_width: 768, size: 2 }, Breakpoint { max_width: 550, size: 1 }],
        ..Default::default()
    };
    let carousel = Carousel::init_with_config(&mut f.doc, f.element, config).unwrap();
    assert_eq!(carousel.window_size(), 5);
    f.doc.click(f.next);

    // a host reacting to the new layout resizes again before the checkpoint ends
    let root = f.doc.root();
    f.doc.add_event_listener(root, EventType::Resize, |doc, _| {
        if doc.viewport_width() == 600 {
            doc.set_viewport_width(500);
        }
    });
    f.doc.set_viewport_width(600);
    assert_eq!(f.doc.viewport_width(), 500);
    assert_eq!(carousel.window_size(), 2);
    assert_eq!(carousel.position(), 0);
    assert_eq!(f.doc.style(f.list, "width"), Some("350%"));

    // the next genuine resize is honored right away
    f.doc.click(f.next);
    assert_eq!(carousel.position(), -1);
    f.doc.set_viewport_width(1200);
    assert_eq!(carousel.window_size(), 5);
    assert_eq!(carousel.position(), 0);

    f.doc.set_viewport_width(590);
    assert_eq!(carousel.window_size(), 2);
    f.doc.click(f.next);
    f.doc.set_viewport_width(580);
    assert_eq!(carousel.window_size(), 2);
    assert_eq!(carousel.position(), 0);
}

#[test]
fn test_carousel_size_attribute_change() {
    let mut f = carousel_fixture(7);
    let carousel = Carousel::init(&mut f.doc, f.element).unwrap();
    assert_eq!(carousel.window_size(), 5);
    f.doc.click(f.next);
    assert_eq!(carousel.position(), -1);

    f.doc.set_attribute("data-size", "3", f.element).unwrap();
    f.doc.flush_mutations();
    assert_eq!(carousel.window_size(), 3);
    assert_eq!(carousel.position(), 0);
    assert_eq!(f.doc.style(f.list, "margin-left"), Some("0%"));
    assert!(f.doc.has_attribute("disabled", f.previous));

    // rejected: the carousel keeps its window
    f.doc.set_attribute("data-size", "none", f.element).unwrap();
    f.doc.flush_mutations();
    assert_eq!(carousel.window_size(), 3);

    f.doc.remove_attribute("data-size", f.element).unwrap();
    f.doc.flush_mutations();
    assert_eq!(carousel.window_size(), 5);

    f.doc.set_attribute("data-size", "7", f.element).unwrap();
    f.doc.flush_mutations();
    assert!(f.doc.attribute_equals("aria-hidden", "true", f.next));
}

#[test]
fn test_carousel_thumbnails_show_and_hide_targets() {
    let mut f = carousel_fixture(7);
    let body = f.doc.body();
    let images: Vec<NodeId> = (0..3)
        .map(|i| {
            let id = format!("image-{}", i);
            f.doc.append_element(body, "div", &[("id", id.as_str()), ("aria-hidden", "true")]).unwrap()
        })
        .collect();
    let listeners = f.doc.listener_count();
    let carousel = Carousel::init_with_config(&mut f.doc, f.element, CarouselConfig::default()).unwrap();

    f.doc.click(f.targets[1]);
    assert!(f.doc.attribute_equals("aria-hidden", "false", images[1]));
    f.doc.click(images[1]);
    assert!(f.doc.attribute_equals("aria-hidden", "true", images[1]));

    // Enter on the focused thumbnail activates it
    f.doc.focus(f.targets[0]);
    f.doc.key_down(f.targets[0], Key::ArrowRight, false);
    f.doc.key_down(f.targets[1], Key::ArrowRight, false);
    f.doc.key_down(f.targets[2], Key::Enter, false);
    assert!(f.doc.attribute_equals("aria-hidden", "false", images[2]));

    // removing an item drops its pair and its keydown listener
    let wired = f.doc.listener_count();
    let first = f.doc.children(f.list)[0];
    f.doc.remove_child(f.list, first).unwrap();
    f.doc.flush_mutations();
    assert_eq!(f.doc.listener_count(), wired - 3);
    f.doc.click(f.targets[0]);
    assert!(f.doc.attribute_equals("aria-hidden", "true", images[0]));

    carousel.destroy(&mut f.doc).unwrap();
    assert_eq!(f.doc.listener_count(), listeners);
    f.doc.click(f.targets[1]);
    assert!(f.doc.attribute_equals("aria-hidden", "true", images[1]));
}

#[test]
fn test_resize_runs_before_pending_reconciliation() {
    let mut f = carousel_fixture(7);
    let config = CarouselConfig {
        breakpoints: vec![Breakpoint { max_width: 768, size: 2 }],
        ..Default::default()
    };
    let carousel = Carousel::init_with_config(&mut f.doc, f.element, config).unwrap();

    add_item(&mut f.doc, f.list);
    f.doc.set_viewport_width(600);
    assert_eq!(carousel.window_size(), 2);
    assert_eq!(carousel.roving().len(), 8);
    assert_eq!(f.doc.style(f.list, "width"), Some("400%"));
}

#[test]
fn test_keyboard_scroll_focuses_after_transition() {
    let mut f = carousel_fixture(7);
    let carousel = Carousel::init_with_config(&mut f.doc, f.element, CarouselConfig::default()).unwrap();
    let timers = f.doc.pending_timers();

    f.doc.focus(f.targets[0]);
    f.doc.key_down(f.targets[0], Key::End, false);
    assert_eq!(carousel.position(), -2);
    assert!(carousel.has_pending_focus());
    assert_eq!(f.doc.pending_timers(), timers + 1);

    f.doc.blur();
    f.doc.transition_end(f.list);
    assert!(!carousel.has_pending_focus());
    assert_eq!(f.doc.pending_timers(), timers);
    assert_eq!(f.doc.active_element(), Some(f.targets[6]));

    // visible target: no scroll, nothing pending
    f.doc.key_down(f.targets[6], Key::ArrowLeft, false);
    assert_eq!(carousel.position(), -2);
    assert!(!carousel.has_pending_focus());

    // fallback timer when no transition ends
    f.doc.key_down(f.targets[5], Key::Home, false);
    assert_eq!(carousel.position(), 0);
    f.doc.blur();
    f.doc.advance_time(499);
    assert!(carousel.has_pending_focus());
    f.doc.advance_time(1);
    assert!(!carousel.has_pending_focus());
    assert_eq!(f.doc.active_element(), Some(f.targets[0]));
}

#[test]
fn test_carousel_destroy() {
    let mut f = carousel_fixture(7);
    let listeners = f.doc.listener_count();
    let carousel = Carousel::init_with_config(&mut f.doc, f.element, CarouselConfig::default()).unwrap();
    carousel.destroy(&mut f.doc).unwrap();
    assert_eq!(f.doc.listener_count(), listeners);
    assert!(!f.doc.has_attribute("tabindex", f.targets[0]));

    f.doc.click(f.next);
    assert_eq!(carousel.position(), 0);
    add_item(&mut f.doc, f.list);
    f.doc.flush_mutations();
    assert_eq!(carousel.roving().len(), 0);
}

#[test]
fn test_carousel_from_element_config() {
    let mut f = carousel_fixture(4);
    f.doc.set_attribute("data-size", "3", f.element).unwrap();
    let carousel = Carousel::init(&mut f.doc, f.element).unwrap();
    assert_eq!(carousel.window_size(), 3);
    assert!(f.doc.attribute_equals("aria-hidden", "false", f.next));
}
