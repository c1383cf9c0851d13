//! DOM Observers
//!
//! MutationObserver registrations and their pending record queues.
//! Delivery itself happens in `Document::flush_mutations`, which needs
//! mutable access to the whole document.

use std::collections::BTreeMap;

use crate::{Document, DomTree, NodeId};

/// Mutation observer callback. Receives the whole pending batch, in order.
pub type ObserverFn = Box<dyn FnMut(&mut Document, &[MutationRecord])>;

/// Mutation observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Watch exactly one attribute on exactly one node
    pub fn attribute(name: &str) -> Self {
        Self {
            attributes: true,
            attribute_old_value: true,
            attribute_filter: Some(vec![name.to_string()]),
            ..Default::default()
        }
    }

    /// Watch the child list of one node
    pub fn child_list() -> Self {
        Self {
            child_list: true,
            ..Default::default()
        }
    }

    fn wants(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => {
                self.attributes
                    && match (&self.attribute_filter, &record.attribute_name) {
                        (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                        _ => true,
                    }
            }
        }
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    /// Attribute change record
    pub fn attributes(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }

    /// Child list change record
    pub fn child_list(target: NodeId, added_nodes: Vec<NodeId>, removed_nodes: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes,
            removed_nodes,
            attribute_name: None,
            old_value: None,
        }
    }

    /// Check if this record is a change of the named attribute
    pub fn is_attribute(&self, name: &str) -> bool {
        self.mutation_type == MutationType::Attributes && self.attribute_name.as_deref() == Some(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// One observer registration
pub(crate) struct Registration {
    pub(crate) node: NodeId,
    pub(crate) options: MutationObserverInit,
    /// Taken out while the callback runs
    pub(crate) callback: Option<ObserverFn>,
    pub(crate) records: Vec<MutationRecord>,
}

/// All live observers of a document, ordered by creation
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: BTreeMap<ObserverId, Registration>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .field("pending", &self.has_pending())
            .finish()
    }
}

impl ObserverRegistry {
    pub(crate) fn observe(&mut self, node: NodeId, options: MutationObserverInit, callback: ObserverFn) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.insert(
            id,
            Registration {
                node,
                options,
                callback: Some(callback),
                records: Vec::new(),
            },
        );
        id
    }

    pub(crate) fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Queue a record for every observer registered on the target, or on
    /// one of its ancestors with `subtree` set.
    pub(crate) fn queue(&mut self, tree: &DomTree, record: MutationRecord) {
        for reg in self.observers.values_mut() {
            let in_scope = reg.node == record.target
                || (reg.options.subtree && tree.is_inclusive_ancestor(reg.node, record.target));
            if in_scope && reg.options.wants(&record) {
                let mut record = record.clone();
                if !reg.options.attribute_old_value && record.mutation_type == MutationType::Attributes {
                    record.old_value = None;
                }
                reg.records.push(record);
            }
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.observers.values().any(|r| !r.records.is_empty())
    }

    /// Observers with pending records, in creation order
    pub(crate) fn pending_ids(&self) -> Vec<ObserverId> {
        self.observers
            .iter()
            .filter(|(_, r)| !r.records.is_empty())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Take an observer's batch and callback for delivery
    pub(crate) fn take(&mut self, id: ObserverId) -> Option<(ObserverFn, Vec<MutationRecord>)> {
        let reg = self.observers.get_mut(&id)?;
        let callback = reg.callback.take()?;
        Some((callback, std::mem::take(&mut reg.records)))
    }

    /// Put a callback back, unless the observer was disconnected meanwhile
    pub(crate) fn restore(&mut self, id: ObserverId, callback: ObserverFn) {
        if let Some(reg) = self.observers.get_mut(&id) {
            reg.callback = Some(callback);
        }
    }

    pub(crate) fn clear_pending(&mut self) {
        for reg in self.observers.values_mut() {
            reg.records.clear();
        }
    }
}
