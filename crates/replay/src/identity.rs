//! Per-engine mapping from recorded node ids to live sink nodes.
//!
//! The forward direction is a hash map owned here; the reverse direction is
//! the id back-reference stored on the live node by the sink. Both are kept in
//! step: `bind` writes both, `unbind` clears both for a whole subtree.

use core_types::NodeId;
use sink::TreeSink;
use std::collections::HashMap;
use std::hash::Hash;

pub struct IdentityMap<N> {
    nodes: HashMap<NodeId, N>,
}

impl<N: Copy + Eq + Hash> IdentityMap<N> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    pub fn bind<S: TreeSink<Node = N>>(&mut self, sink: &mut S, id: NodeId, node: N) {
        if let Some(previous) = self.nodes.insert(id, node)
            && previous != node
            && sink.node_id(previous) == Some(id)
        {
            sink.set_node_id(previous, None);
        }
        sink.set_node_id(node, Some(id));
    }

    pub fn get(&self, id: NodeId) -> Option<N> {
        self.nodes.get(&id).copied()
    }

    pub fn has_id(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Id of `node`, if its back-reference still names a binding that points
    /// at it.
    pub fn id_of<S: TreeSink<Node = N>>(&self, sink: &S, node: N) -> Option<NodeId> {
        let id = sink.node_id(node)?;
        (self.nodes.get(&id) == Some(&node)).then_some(id)
    }

    /// Remove `node` and every descendant reachable through the sink,
    /// including embedded documents. Must run before `node` is detached.
    pub fn unbind<S: TreeSink<Node = N>>(&mut self, sink: &mut S, node: N) -> usize {
        self.unbind_with(sink, node, |sink, n| sink.children(n))
    }

    /// Like [`IdentityMap::unbind`], with a caller-provided child enumeration
    /// for nodes whose children are staged elsewhere.
    pub fn unbind_with<S, F>(&mut self, sink: &mut S, node: N, children: F) -> usize
    where
        S: TreeSink<Node = N>,
        F: Fn(&S, N) -> Vec<N>,
    {
        let mut removed = 0usize;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(id) = self.id_of(sink, current) {
                self.nodes.remove(&id);
                sink.set_node_id(current, None);
                removed += 1;
            }
            if let Some(doc) = sink.embedded_document(current) {
                stack.push(doc);
            }
            stack.extend(children(sink, current));
        }
        removed
    }

    /// Forget every binding, used before rebuilding from a full capture.
    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<N: Copy + Eq + Hash> Default for IdentityMap<N> {
    fn default() -> Self {
        Self::new()
    }
}
