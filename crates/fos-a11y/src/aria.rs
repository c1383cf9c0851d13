//! ARIA Support
//!
//! ARIA roles, boolean states, and the attribute names the widgets synchronize.

/// ARIA and related attribute names
pub mod attr {
    pub const ROLE: &str = "role";
    pub const TABINDEX: &str = "tabindex";
    pub const ARIA_CONTROLS: &str = "aria-controls";
    pub const ARIA_DISABLED: &str = "aria-disabled";
    pub const ARIA_EXPANDED: &str = "aria-expanded";
    pub const ARIA_HIDDEN: &str = "aria-hidden";
    pub const ARIA_LIVE: &str = "aria-live";
    pub const ARIA_SELECTED: &str = "aria-selected";
}

/// `aria-live` value for updates announced at the next pause
pub const LIVE_POLITE: &str = "polite";

/// ARIA role the widgets look up their parts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriaRole {
    MenuItem,
    Tab,
    TabPanel,
}

impl AriaRole {
    /// Role attribute value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MenuItem => "menuitem",
            Self::Tab => "tab",
            Self::TabPanel => "tabpanel",
        }
    }

    /// Attribute selector matching elements with this role
    pub fn selector(&self) -> String {
        format!("[{}=\"{}\"]", attr::ROLE, self.as_str())
    }
}

/// Parse a boolean ARIA state value: only the literal "true" is on, a
/// missing attribute or any other value is off
pub fn parse_bool(value: Option<&str>) -> bool {
    value == Some("true")
}
