//! DOM Events
//!
//! Event types, keyboard keys and the event object passed to listeners.

use crate::NodeId;

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    KeyDown,
    KeyUp,
    KeyPress,
    Focus,
    Blur,
    Resize,
    TransitionEnd,
}

impl EventType {
    /// Check if this event type can bubble
    pub fn bubbles(&self) -> bool {
        !matches!(self, EventType::Focus | EventType::Blur | EventType::Resize)
    }

    /// Check if the default action can be prevented
    pub fn cancelable(&self) -> bool {
        matches!(
            self,
            EventType::Click | EventType::KeyDown | EventType::KeyUp | EventType::KeyPress
        )
    }

    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Resize => "resize",
            Self::TransitionEnd => "transitionend",
        }
    }
}

/// Keyboard key, as reported by `KeyboardEvent.key`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Tab,
    Shift,
    Home,
    End,
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    Character(char),
    Other,
}

impl Key {
    /// Parse a DOM key name
    pub fn parse(s: &str) -> Self {
        match s {
            "Enter" => Self::Enter,
            " " | "Spacebar" => Self::Space,
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            "Shift" => Self::Shift,
            "Home" => Self::Home,
            "End" => Self::End,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "ArrowDown" | "Down" => Self::ArrowDown,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Character(c),
                    _ => Self::Other,
                }
            }
        }
    }

    /// Enter or Space: the keys that activate a control
    pub fn is_activation(&self) -> bool {
        matches!(self, Self::Enter | Self::Space)
    }
}

/// DOM event
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub target: NodeId,
    pub current_target: NodeId,
    /// Key for keyboard events
    pub key: Option<Key>,
    /// Shift modifier state at the time of the event
    pub shift_key: bool,
    pub bubbles: bool,
    pub cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// Create an event of the given type; target is set on dispatch
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            target: NodeId::ROOT,
            current_target: NodeId::ROOT,
            key: None,
            shift_key: false,
            bubbles: event_type.bubbles(),
            cancelable: event_type.cancelable(),
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Create a keyboard event
    pub fn keyboard(event_type: EventType, key: Key, shift_key: bool) -> Self {
        Self {
            key: Some(key),
            shift_key,
            ..Self::new(event_type)
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Check if propagation was stopped
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}
