//! fOS DOM - Document Object Model
//!
//! Single-threaded, event-driven DOM model used by the fOS widgets:
//! arena node tree, attribute access, selector queries, focus, event
//! dispatch, mutation observation and a virtual timer clock.

mod classlist;
mod document;
mod events;
mod node;
mod observer;
mod selector;
mod timers;
mod tree;

pub use classlist::DOMTokenList;
pub use document::{Document, ListenerFn, ListenerId, MicrotaskFn};
pub use events::{Event, EventType, Key};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use observer::{MutationObserverInit, MutationRecord, MutationType, ObserverFn, ObserverId};
pub use selector::{Selector, SelectorList};
pub use timers::{TimerFn, TimerId};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Raw arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// DOM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Cannot insert {child} into {parent}: would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

/// Result alias for DOM operations
pub type Result<T> = std::result::Result<T, DomError>;
