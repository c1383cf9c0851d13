//! Widget Configuration

use fos_dom::{Document, NodeId};
use serde::Deserialize;

use crate::{Result, WidgetError};

/// Attribute holding the default window size
pub const ATTRIBUTE_SIZE: &str = "data-size";

/// Attribute holding the breakpoint table as JSON
pub const ATTRIBUTE_BREAKPOINTS: &str = "data-breakpoints";

/// Viewport breakpoint: at widths below `max_width`, show `size` items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Breakpoint {
    pub max_width: u32,
    pub size: usize,
}

/// Carousel configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Items visible above every breakpoint
    pub window_size: usize,

    /// Breakpoints, kept sorted ascending by `max_width`
    pub breakpoints: Vec<Breakpoint>,

    /// Selector for each item's focus target; the item itself when nothing matches
    pub focus_selector: String,

    /// Give up waiting for `transitionend` after this long
    pub transition_fallback_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            breakpoints: Vec::new(),
            focus_selector: "[aria-controls]".to_string(),
            transition_fallback_ms: 500,
        }
    }
}

impl CarouselConfig {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| WidgetError::InvalidConfig(e.to_string()))?;
        config.validated()
    }

    /// Read `data-size` and `data-breakpoints` from the carousel element
    pub fn from_element(doc: &Document, element: NodeId) -> Result<Self> {
        let mut config = Self::default();
        if let Some(size) = Self::size_attribute(doc, element)? {
            config.window_size = size;
        }
        if let Some(json) = doc.get_attribute(ATTRIBUTE_BREAKPOINTS, element) {
            config.breakpoints = serde_json::from_str(json)
                .map_err(|e| WidgetError::InvalidConfig(format!("{}: {}", ATTRIBUTE_BREAKPOINTS, e)))?;
        }
        config.validated()
    }

    /// Parse `data-size` on `element`, if present
    pub fn size_attribute(doc: &Document, element: NodeId) -> Result<Option<usize>> {
        let Some(size) = doc.get_attribute(ATTRIBUTE_SIZE, element) else {
            return Ok(None);
        };
        match size.trim().parse() {
            Ok(0) | Err(_) => Err(WidgetError::InvalidConfig(format!("{}={:?}", ATTRIBUTE_SIZE, size))),
            Ok(n) => Ok(Some(n)),
        }
    }

    /// Reject zero sizes and sort the breakpoints
    pub fn validated(mut self) -> Result<Self> {
        if self.window_size == 0 {
            return Err(WidgetError::InvalidConfig("window size must be positive".into()));
        }
        if let Some(bp) = self.breakpoints.iter().find(|bp| bp.size == 0) {
            return Err(WidgetError::InvalidConfig(format!(
                "breakpoint at {}px has window size 0",
                bp.max_width
            )));
        }
        self.breakpoints.sort_by_key(|bp| bp.max_width);
        Ok(self)
    }

    /// Window size for a viewport width: the smallest size among the
    /// breakpoints wider than the viewport, never above the default.
    pub fn effective_window_size(&self, viewport_width: u32) -> usize {
        self.breakpoints
            .iter()
            .filter(|bp| bp.max_width > viewport_width)
            .map(|bp| bp.size)
            .fold(self.window_size, usize::min)
    }
}
