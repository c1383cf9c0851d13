//! fOS Widgets
//!
//! Accessible widgets built on the fOS DOM model.
//!
//! Three engines do the work:
//! - [`StateSyncEngine`]: keeps a target's presentation in sync with a
//!   boolean attribute on a trigger
//! - [`RovingFocusController`](fos_a11y::RovingFocusController): roving
//!   tabindex keyboard navigation
//! - [`Carousel`]: bounded scrolling over a responsive window of items
//!
//! The widget modules (`panel`, `tab_panel`, `menu`, `navbar`, `modal`,
//! `image_lightbox`) compose them.

pub mod carousel;
pub mod collapsible;
pub mod config;
pub mod image_lightbox;
pub mod menu;
pub mod modal;
pub mod navbar;
pub mod panel;
pub mod state_sync;
pub mod tab_panel;

pub use carousel::{Carousel, CarouselState, Direction};
pub use config::{Breakpoint, CarouselConfig};
pub use state_sync::{effects, BindingHandle, Effect, StateSyncEngine};

use fos_dom::NodeId;

/// Widget error
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("Trigger {trigger} references missing target {id:?}")]
    MissingTarget { trigger: NodeId, id: String },

    #[error("Widget {widget} is missing its {part} element")]
    MissingPart { widget: NodeId, part: &'static str },

    #[error("Trigger {0} is already bound")]
    TriggerAlreadyBound(NodeId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Dom(#[from] fos_dom::DomError),

    #[error(transparent)]
    A11y(#[from] fos_a11y::A11yError),
}

/// Result alias for widget operations
pub type Result<T> = std::result::Result<T, WidgetError>;
