//! Catch-up batching of mutations crossed by a seek.
//!
//! While seeking, mutations are folded into a provisional forest instead of
//! touching the live tree. [`TreeIndex::flush`] then yields the smallest
//! equivalent batch:
//! - a node added and removed inside the window produces nothing;
//! - removing a live node tombstones it and every live descendant, and any
//!   pending mutation that targets a tombstoned id is discarded;
//! - scroll and input only keep the latest value per node;
//! - sibling ids that were removed inside the window are cleared from the
//!   adds that named them.
//!
//! Provisional roots and children are kept in ascending id order; positions
//! are re-derived from each add's own sibling ids when the batch is applied.

use crate::identity::IdentityMap;
use core_types::NodeId;
use sink::TreeSink;
use snapshot::{
    AddedNode, AttributeMutation, InputData, MutationBatch, RemovedNode, ScrollData,
    SerializedNode, TextMutation,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug)]
struct TreeNode {
    mutation: AddedNode,
    parent: Option<NodeId>,
    children: BTreeSet<NodeId>,
    texts: Vec<TextMutation>,
    attributes: Vec<AttributeMutation>,
}

/// Result of [`TreeIndex::flush`].
#[derive(Debug, Default, PartialEq)]
pub struct FlushedBatch {
    pub batch: MutationBatch,
    pub scrolls: BTreeMap<NodeId, ScrollData>,
    pub inputs: BTreeMap<NodeId, InputData>,
}

#[derive(Debug, Default)]
pub struct TreeIndex {
    roots: BTreeSet<NodeId>,
    nodes: HashMap<NodeId, TreeNode>,
    removes: Vec<RemovedNode>,
    texts: Vec<TextMutation>,
    attributes: Vec<AttributeMutation>,
    tombstones: HashSet<NodeId>,
    scrolls: BTreeMap<NodeId, ScrollData>,
    inputs: BTreeMap<NodeId, InputData>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.removes.is_empty()
            && self.texts.is_empty()
            && self.attributes.is_empty()
            && self.scrolls.is_empty()
            && self.inputs.is_empty()
    }

    pub fn add(&mut self, mutation: &AddedNode) {
        let id = mutation.id();
        if self.nodes.contains_key(&id) {
            self.detach(id);
        }
        // a removed id that is added again is a move
        let mut revived = vec![&mutation.node];
        while let Some(desc) = revived.pop() {
            self.tombstones.remove(&desc.node_id);
            revived.extend(desc.children());
        }
        let parent = self
            .nodes
            .contains_key(&mutation.parent_id)
            .then_some(mutation.parent_id);
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.children.insert(id);
                }
            }
            None => {
                self.roots.insert(id);
            }
        }
        self.nodes.insert(
            id,
            TreeNode {
                mutation: mutation.clone(),
                parent,
                children: BTreeSet::new(),
                texts: Vec::new(),
                attributes: Vec::new(),
            },
        );
    }

    /// Record a removal, walking live descendants through the sink.
    pub fn remove<S: TreeSink>(
        &mut self,
        mutation: &RemovedNode,
        sink: &S,
        ids: &IdentityMap<S::Node>,
    ) {
        self.remove_with(mutation, |id| {
            let Some(node) = ids.get(id) else {
                return Vec::new();
            };
            let mut children: Vec<NodeId> = sink
                .children(node)
                .into_iter()
                .filter_map(|child| ids.id_of(sink, child))
                .collect();
            if let Some(doc) = sink.embedded_document(node)
                && let Some(doc_id) = ids.id_of(sink, doc)
            {
                children.push(doc_id);
            }
            children
        });
    }

    /// Record a removal; `live_children` enumerates the ids under a live id.
    pub fn remove_with<F>(&mut self, mutation: &RemovedNode, live_children: F)
    where
        F: Fn(NodeId) -> Vec<NodeId>,
    {
        if self.nodes.contains_key(&mutation.id) {
            self.detach(mutation.id);
            return;
        }
        self.removes.push(*mutation);
        let mut stack = vec![mutation.id];
        while let Some(id) = stack.pop() {
            self.tombstones.insert(id);
            stack.extend(live_children(id));
        }
        let tombstones = &self.tombstones;
        self.texts.retain(|m| !tombstones.contains(&m.id));
        self.attributes.retain(|m| !tombstones.contains(&m.id));
    }

    pub fn text(&mut self, mutation: &TextMutation) {
        match self.nodes.get_mut(&mutation.id) {
            Some(node) => node.texts.push(mutation.clone()),
            None => self.texts.push(mutation.clone()),
        }
    }

    pub fn attribute(&mut self, mutation: &AttributeMutation) {
        match self.nodes.get_mut(&mutation.id) {
            Some(node) => node.attributes.push(mutation.clone()),
            None => self.attributes.push(mutation.clone()),
        }
    }

    pub fn scroll(&mut self, data: &ScrollData) {
        self.scrolls.insert(data.id, *data);
    }

    pub fn input(&mut self, data: &InputData) {
        self.inputs.insert(data.id, data.clone());
    }

    /// Produce the collapsed batch and reset the index.
    pub fn flush(&mut self) -> FlushedBatch {
        let mut state = std::mem::take(self);
        let mut batch = MutationBatch {
            adds: Vec::new(),
            removes: std::mem::take(&mut state.removes),
            texts: std::mem::take(&mut state.texts),
            attributes: std::mem::take(&mut state.attributes),
        };

        let mut stack: Vec<(NodeId, bool)> = state.roots.iter().rev().map(|id| (*id, false)).collect();
        while let Some((id, removed)) = stack.pop() {
            let Some(node) = state.nodes.remove(&id) else {
                continue;
            };
            if removed {
                state.tombstones.insert(id);
            } else {
                batch.texts.extend(node.texts);
                batch.attributes.extend(node.attributes);
            }
            let skip = removed
                || state.tombstones.contains(&id)
                || state.tombstones.contains(&node.mutation.parent_id);
            if !skip {
                batch.adds.push(node.mutation);
            }
            stack.extend(node.children.iter().rev().map(|child| (*child, skip)));
        }

        let tombstones = &state.tombstones;
        // a sibling removed later in the window no longer anchors the insertion
        for m in &mut batch.adds {
            if m.next_id.is_some_and(|id| tombstones.contains(&id)) {
                m.next_id = None;
            }
            if m.previous_id.is_some_and(|id| tombstones.contains(&id)) {
                m.previous_id = None;
            }
        }
        batch.texts.retain(|m| !tombstones.contains(&m.id));
        batch.attributes.retain(|m| !tombstones.contains(&m.id));
        state.scrolls.retain(|id, _| !tombstones.contains(id));
        state.inputs.retain(|id, _| !tombstones.contains(id));

        FlushedBatch {
            batch,
            scrolls: state.scrolls,
            inputs: state.inputs,
        }
    }

    // Drop a provisional node and its provisional subtree, tombstoning them.
    fn detach(&mut self, id: NodeId) {
        match self.nodes.get(&id).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.remove(&id);
                }
            }
            None => {
                self.roots.remove(&id);
            }
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.tombstones.insert(current);
            if let Some(node) = self.nodes.remove(&current) {
                // ids serialized inside the added subtree die with it
                let mut inner: Vec<&SerializedNode> = node.mutation.node.children().iter().collect();
                while let Some(desc) = inner.pop() {
                    self.tombstones.insert(desc.node_id);
                    inner.extend(desc.children());
                }
                stack.extend(node.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_test_support::{add, add_between, element, remove, set_attr, set_text, text};

    fn no_live_children(_: NodeId) -> Vec<NodeId> {
        Vec::new()
    }

    #[test]
    fn add_then_remove_cancels_out() {
        let mut index = TreeIndex::new();
        index.add(&add(1, None, element(10, "div", vec![])));
        index.add(&add(10, None, text(11, "a")));
        index.text(&set_text(11, "b"));
        index.attribute(&set_attr(10, "class", Some("x")));
        index.remove_with(&remove(1, 10), no_live_children);
        index.text(&set_text(11, "c"));

        let out = index.flush();
        assert!(out.batch.adds.is_empty());
        assert!(out.batch.removes.is_empty());
        assert!(!out.batch.references(10));
        assert!(!out.batch.references(11));
    }

    #[test]
    fn live_removal_tombstones_live_descendants() {
        let mut index = TreeIndex::new();
        index.text(&set_text(21, "early"));
        index.scroll(&ScrollData { id: 22, x: 0.0, y: 5.0 });
        let live = |id: NodeId| match id {
            20 => vec![21, 22],
            _ => Vec::new(),
        };
        index.remove_with(&remove(1, 20), live);
        index.add(&add(21, None, element(30, "span", vec![])));
        index.attribute(&set_attr(22, "a", Some("b")));

        let out = index.flush();
        assert_eq!(out.batch.removes, vec![remove(1, 20)]);
        assert!(out.batch.adds.is_empty());
        assert!(out.batch.texts.is_empty());
        assert!(out.batch.attributes.is_empty());
        assert!(out.scrolls.is_empty());
    }

    #[test]
    fn flush_orders_adds_parent_first_by_id() {
        let mut index = TreeIndex::new();
        index.add(&add(1, None, element(12, "b", vec![])));
        index.add(&add(1, None, element(11, "a", vec![])));
        index.add(&add(11, None, text(13, "t")));
        index.text(&set_text(13, "u"));
        let out = index.flush();
        let ids: Vec<NodeId> = out.batch.adds.iter().map(AddedNode::id).collect();
        assert_eq!(ids, vec![11, 13, 12]);
        assert_eq!(out.batch.texts, vec![set_text(13, "u")]);
    }

    #[test]
    fn scroll_and_input_keep_latest() {
        let mut index = TreeIndex::new();
        index.scroll(&ScrollData { id: 5, x: 0.0, y: 1.0 });
        index.scroll(&ScrollData { id: 5, x: 0.0, y: 9.0 });
        index.input(&InputData {
            id: 6,
            text: "a".into(),
            is_checked: false,
        });
        index.input(&InputData {
            id: 6,
            text: "ab".into(),
            is_checked: false,
        });
        let out = index.flush();
        assert_eq!(out.scrolls[&5].y, 9.0);
        assert_eq!(out.inputs[&6].text, "ab");
    }

    #[test]
    fn flush_is_destructive() {
        let mut index = TreeIndex::new();
        index.add(&add(1, None, element(10, "div", vec![])));
        index.remove_with(&remove(1, 2), no_live_children);
        assert!(!index.is_empty());
        let first = index.flush();
        assert_eq!(first.batch.len(), 2);
        assert!(index.is_empty());
        assert_eq!(index.flush(), FlushedBatch::default());
    }

    #[test]
    fn removed_then_readded_live_node_is_a_move() {
        let mut index = TreeIndex::new();
        index.remove_with(&remove(1, 7), no_live_children);
        index.add(&add(2, None, element(7, "p", vec![])));
        let out = index.flush();
        assert_eq!(out.batch.removes, vec![remove(1, 7)]);
        assert_eq!(out.batch.adds.len(), 1);
    }

    #[test]
    fn move_of_provisional_node_keeps_its_subtree() {
        let mut index = TreeIndex::new();
        index.add(&add(1, None, element(10, "div", vec![])));
        index.add(&add(1, None, element(11, "section", vec![])));
        index.add(&add(10, None, element(12, "p", vec![text(13, "moved")])));
        index.remove_with(&remove(10, 12), no_live_children);
        index.add(&add(11, None, element(12, "p", vec![text(13, "moved")])));
        index.text(&set_text(13, "kept"));

        let out = index.flush();
        let placed: Vec<(NodeId, NodeId)> =
            out.batch.adds.iter().map(|m| (m.parent_id, m.id())).collect();
        assert_eq!(placed, vec![(1, 10), (1, 11), (11, 12)]);
        assert_eq!(out.batch.texts, vec![set_text(13, "kept")]);
    }

    #[test]
    fn removed_sibling_no_longer_anchors_an_insertion() {
        let mut index = TreeIndex::new();
        index.add(&add(1, None, element(20, "footer", vec![])));
        index.add(&add_between(1, Some(19), Some(20), element(21, "main", vec![])));
        index.remove_with(&remove(1, 20), no_live_children);
        index.remove_with(&remove(1, 19), no_live_children);

        let out = index.flush();
        assert_eq!(out.batch.adds.len(), 1);
        assert_eq!(out.batch.adds[0].next_id, None);
        assert_eq!(out.batch.adds[0].previous_id, None);
    }

    #[test]
    fn deep_provisional_chain() {
        let mut index = TreeIndex::new();
        index.add(&add(1, None, element(2, "div", vec![])));
        for id in 3..10_002 {
            index.add(&add(id - 1, None, element(id, "div", vec![])));
        }
        index.remove_with(&remove(1, 2), no_live_children);
        assert!(index.flush().batch.is_empty());

        for id in 3..10_002 {
            index.add(&add(id - 1, None, element(id, "div", vec![])));
        }
        assert_eq!(index.flush().batch.adds.len(), 9_999);
    }
}
