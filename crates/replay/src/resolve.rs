//! Ordering of insertions whose parent was not live when they were seen.
//!
//! Invariants:
//! - A queued mutation is placed only after its parent.
//! - Within one sibling list, declared `next_id` order is preserved even when
//!   mutations arrived out of order. Siblings are applied last to first so that
//!   every insertion has its forward reference available.
//! - The queue is re-processed until a pass makes no progress; whatever is
//!   still queued then is dropped and counted.

use core_types::NodeId;
use snapshot::AddedNode;
use std::collections::HashMap;

/// Forest built from one pass over the queue. Nodes index into the queue.
#[derive(Debug, Default)]
pub struct ResolveForest {
    nodes: Vec<ForestNode>,
    roots: Vec<usize>,
}

#[derive(Debug)]
struct ForestNode {
    mutation: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl ResolveForest {
    pub fn build(queue: &[AddedNode]) -> Self {
        let mut forest = ResolveForest::default();
        let mut placed: HashMap<NodeId, usize> = HashMap::new();
        for (index, mutation) in queue.iter().enumerate() {
            let slot = forest.nodes.len();
            if let Some(&next) = mutation.next_id.and_then(|id| placed.get(&id)) {
                let parent = forest.nodes[next].parent;
                forest.nodes.push(ForestNode {
                    mutation: index,
                    parent,
                    children: Vec::new(),
                });
                let siblings = match parent {
                    Some(p) => &mut forest.nodes[p].children,
                    None => &mut forest.roots,
                };
                let pos = siblings.iter().position(|s| *s == next).unwrap_or(0);
                siblings.insert(pos, slot);
            } else if let Some(&parent) = placed.get(&mutation.parent_id) {
                forest.nodes.push(ForestNode {
                    mutation: index,
                    parent: Some(parent),
                    children: Vec::new(),
                });
                forest.nodes[parent].children.push(slot);
            } else {
                forest.nodes.push(ForestNode {
                    mutation: index,
                    parent: None,
                    children: Vec::new(),
                });
                forest.roots.push(slot);
            }
            placed.insert(mutation.id(), slot);
        }
        forest
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Queue index of the mutation at the root of tree `root`.
    pub fn root_mutation(&self, root: usize) -> usize {
        self.nodes[self.roots[root]].mutation
    }

    /// Queue indices of tree `root` in application order: pre-order, children
    /// visited last to first.
    pub fn application_order(&self, root: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![self.roots[root]];
        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            order.push(node.mutation);
            // the last child is popped first
            stack.extend(node.children.iter().copied());
        }
        order
    }
}

/// Outcome of trying to place one queued mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Placed,
    /// Not placeable yet; retried next pass.
    Deferred,
    /// Given up on for good (build failure, sink refusal).
    Skipped,
}

pub trait Placer {
    fn is_live(&self, id: NodeId) -> bool;
    fn place(&mut self, mutation: &AddedNode) -> Placement;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub passes: usize,
    pub placed: usize,
    pub skipped: usize,
    pub dropped: usize,
}

pub struct MutationResolver {
    max_passes: usize,
}

impl MutationResolver {
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }

    pub fn resolve<P: Placer>(&self, mut queue: Vec<AddedNode>, placer: &mut P) -> ResolveStats {
        let mut stats = ResolveStats::default();
        while !queue.is_empty() {
            if stats.passes == self.max_passes {
                log::debug!(target: "replay.resolve", "pass limit reached with {} queued", queue.len());
                stats.dropped += queue.len();
                break;
            }
            stats.passes += 1;
            let forest = ResolveForest::build(&queue);
            let mut retry = Vec::new();
            let mut progress = false;
            for root in 0..forest.root_count() {
                let order = forest.application_order(root);
                if !placer.is_live(queue[forest.root_mutation(root)].parent_id) {
                    retry.extend(order);
                    continue;
                }
                for index in order {
                    match placer.place(&queue[index]) {
                        Placement::Placed => {
                            stats.placed += 1;
                            progress = true;
                        }
                        Placement::Deferred => retry.push(index),
                        Placement::Skipped => {
                            stats.skipped += 1;
                            progress = true;
                        }
                    }
                }
            }
            if !progress {
                stats.dropped += retry.len();
                break;
            }
            retry.sort_unstable();
            let mut remaining = Vec::with_capacity(retry.len());
            let mut taken: Vec<Option<AddedNode>> = queue.into_iter().map(Some).collect();
            for index in retry {
                if let Some(mutation) = taken[index].take() {
                    remaining.push(mutation);
                }
            }
            queue = remaining;
        }
        log::trace!(target: "replay.resolve", "{stats:?}");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_test_support::{add, element};
    use std::collections::HashSet;

    /// Records placements against a fake tree of live ids.
    struct Recorder {
        live: HashSet<NodeId>,
        order: Vec<NodeId>,
        // ids whose next sibling must already be live
        strict_next: bool,
    }

    impl Recorder {
        fn new(live: &[NodeId]) -> Self {
            Self {
                live: live.iter().copied().collect(),
                order: Vec::new(),
                strict_next: true,
            }
        }
    }

    impl Placer for Recorder {
        fn is_live(&self, id: NodeId) -> bool {
            self.live.contains(&id)
        }

        fn place(&mut self, m: &AddedNode) -> Placement {
            if !self.live.contains(&m.parent_id) {
                return Placement::Deferred;
            }
            if self.strict_next && m.next_id.is_some_and(|n| !self.live.contains(&n)) {
                return Placement::Deferred;
            }
            self.live.insert(m.id());
            self.order.push(m.id());
            Placement::Placed
        }
    }

    #[test]
    fn reversed_sibling_chain_applies_from_the_end() {
        // a(10) b(11) c(12) under 1, submitted c, b, a
        let queue = vec![
            add(1, None, element(12, "c", vec![])),
            add(1, Some(12), element(11, "b", vec![])),
            add(1, Some(11), element(10, "a", vec![])),
        ];
        let forest = ResolveForest::build(&queue);
        assert_eq!(forest.root_count(), 3);
        let mut rec = Recorder::new(&[1]);
        let stats = MutationResolver::new(10).resolve(queue, &mut rec);
        assert_eq!(rec.order, vec![12, 11, 10]);
        assert_eq!(stats.placed, 3);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn children_of_queued_parents_follow_them() {
        let queue = vec![
            add(20, None, element(21, "li", vec![])),
            add(1, None, element(20, "ul", vec![])),
            add(20, Some(21), element(22, "li", vec![])),
        ];
        let mut rec = Recorder::new(&[1]);
        let stats = MutationResolver::new(10).resolve(queue, &mut rec);
        assert_eq!(rec.order, vec![20, 21, 22]);
        assert_eq!(stats.placed, 3);
    }

    #[test]
    fn forest_inserts_before_declared_next() {
        let queue = vec![
            add(1, None, element(30, "p", vec![])),
            add(30, None, element(32, "i", vec![])),
            add(30, Some(32), element(31, "b", vec![])),
        ];
        let forest = ResolveForest::build(&queue);
        assert_eq!(forest.root_count(), 1);
        // children are [31, 32]; applied as 30, then 32, then 31
        assert_eq!(forest.application_order(0), vec![0, 1, 2]);
    }

    #[test]
    fn orphans_are_dropped_after_fixed_point() {
        let queue = vec![
            add(99, None, element(40, "div", vec![])),
            add(1, None, element(41, "div", vec![])),
        ];
        let mut rec = Recorder::new(&[1]);
        let stats = MutationResolver::new(10).resolve(queue, &mut rec);
        assert_eq!(rec.order, vec![41]);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn never_present_next_sibling_terminates() {
        let queue = vec![add(1, Some(777), element(50, "div", vec![]))];
        let mut rec = Recorder::new(&[1]);
        let stats = MutationResolver::new(10).resolve(queue, &mut rec);
        assert!(rec.order.is_empty());
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.passes, 1);
    }
}
