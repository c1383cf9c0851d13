//! fOS Accessibility
//!
//! Accessibility building blocks for the fOS widgets.
//!
//! Features:
//! - ARIA attribute names, roles and boolean states
//! - Roving tabindex focus management

pub mod aria;
pub mod focus;

pub use aria::{attr, parse_bool, AriaRole, LIVE_POLITE};
pub use focus::{FocusMovedFn, NavAction, RovingFocusController, SelectFn, TabIndex};

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error(transparent)]
    Dom(#[from] fos_dom::DomError),
}
