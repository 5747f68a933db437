//! Application of mutation batches to the live tree.
//!
//! Invariants:
//! - Removals run first, then additions, then text and attribute updates.
//! - Additions whose parent or declared next sibling is not live yet are queued
//!   and handed to the [`MutationResolver`] after the batch's direct pass.
//! - With virtual parents enabled, the children of a connected parent are moved
//!   into a detached fragment the first time something is inserted under it.
//!   Ids stay bound to the real nodes; the applier routes insertions and
//!   removals through its real-parent to fragment map until
//!   [`MutationApplier::reattach_virtual_parents`] moves everything back.
//! - Nodes whose recorded sibling is the legacy unknown sentinel are built but
//!   parked in the missing-node map until a neighbour names them.

use crate::builder::{PendingEmbed, TreeBuilder};
use crate::config::ReplayConfig;
use crate::error::{ReplayError, report};
use crate::identity::IdentityMap;
use crate::resolve::{MutationResolver, Placement, Placer, ResolveStats};
use core_types::NodeId;
use sink::TreeSink;
use snapshot::{AddedNode, MutationBatch, StyleSheetRuleData};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

const TARGET: &str = "replay.mutation";

#[derive(Debug)]
struct MissingNode<N> {
    node: N,
    mutation: AddedNode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub missing_references: usize,
    pub resolve: ResolveStats,
}

pub struct MutationApplier<N> {
    virtual_parents: HashMap<N, N>,
    stored_scroll: HashMap<N, (f64, f64)>,
    missing: BTreeMap<NodeId, MissingNode<N>>,
    pending_embeds: Vec<PendingEmbed<N>>,
    max_resolve_passes: usize,
    warn_missing: bool,
}

impl<N: Copy + Eq + Hash + Debug> MutationApplier<N> {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            virtual_parents: HashMap::new(),
            stored_scroll: HashMap::new(),
            missing: BTreeMap::new(),
            pending_embeds: Vec::new(),
            max_resolve_passes: config.max_resolve_passes,
            warn_missing: config.warn_missing_nodes,
        }
    }

    /// Drop all staging state, used before a full rebuild.
    pub fn reset(&mut self) {
        if !self.missing.is_empty() {
            log::warn!(
                target: TARGET,
                "[replayer] found unresolved missing nodes: {:?}",
                self.missing.keys().collect::<Vec<_>>()
            );
        }
        self.virtual_parents.clear();
        self.stored_scroll.clear();
        self.missing.clear();
        self.pending_embeds.clear();
    }

    /// Nodes built but still waiting for a neighbour to position them.
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    pub fn pending_embed_count(&self) -> usize {
        self.pending_embeds.len()
    }

    pub fn is_staging(&self) -> bool {
        !self.virtual_parents.is_empty()
    }

    pub fn apply_batch<S: TreeSink<Node = N>>(
        &mut self,
        sink: &mut S,
        ids: &mut IdentityMap<N>,
        builder: &TreeBuilder,
        batch: &MutationBatch,
        use_virtual_parent: bool,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        for removal in &batch.removes {
            if let Err(err) = self.remove(sink, ids, removal.parent_id, removal.id) {
                self.note(&err, &mut report);
            }
        }

        let max_passes = self.max_resolve_passes;
        let mut placer = BatchPlacer {
            applier: self,
            sink: &mut *sink,
            ids: &mut *ids,
            builder,
            use_virtual_parent,
        };
        let mut queue = Vec::new();
        for mutation in &batch.adds {
            if placer.place(mutation) == Placement::Deferred {
                queue.push(mutation.clone());
            }
        }
        if !queue.is_empty() {
            report.resolve = MutationResolver::new(max_passes).resolve(queue, &mut placer);
            if report.resolve.dropped > 0 {
                let err = ReplayError::UnresolvableInsertion {
                    count: report.resolve.dropped,
                };
                crate::error::report(TARGET, &err, false);
            }
        }

        for mutation in &batch.texts {
            let Some(target) = ids.get(mutation.id) else {
                self.note(&ReplayError::ReferenceNotFound { id: mutation.id }, &mut report);
                continue;
            };
            if let Err(err) = sink.set_text(target, mutation.value.as_deref()) {
                self.note(&ReplayError::from_sink(err), &mut report);
            }
        }
        for mutation in &batch.attributes {
            let Some(target) = ids.get(mutation.id) else {
                self.note(&ReplayError::ReferenceNotFound { id: mutation.id }, &mut report);
                continue;
            };
            for (name, value) in &mutation.attributes {
                let result = match value {
                    Some(value) => sink.set_attribute(target, name, value),
                    None => sink.remove_attribute(target, name),
                };
                if let Err(err) = result {
                    log::debug!(target: TARGET, "attribute {name:?} on {}: {err}", mutation.id);
                }
            }
        }
        report
    }

    fn note(&self, err: &ReplayError, report: &mut ApplyReport) {
        if matches!(err, ReplayError::ReferenceNotFound { .. }) {
            report.missing_references += 1;
        }
        crate::error::report(TARGET, err, self.warn_missing);
    }

    fn remove<S: TreeSink<Node = N>>(
        &mut self,
        sink: &mut S,
        ids: &mut IdentityMap<N>,
        parent_id: NodeId,
        id: NodeId,
    ) -> Result<(), ReplayError> {
        let target = ids.get(id).ok_or(ReplayError::ReferenceNotFound { id })?;
        ids.get(parent_id)
            .ok_or(ReplayError::ReferenceNotFound { id: parent_id })?;
        let staged = &self.virtual_parents;
        ids.unbind_with(sink, target, |sink, node| match staged.get(&node) {
            Some(fragment) => sink.children(*fragment),
            None => sink.children(node),
        });
        self.virtual_parents
            .retain(|real, _| ids.id_of(sink, *real).is_some());
        self.pending_embeds
            .retain(|embed| ids.id_of(sink, embed.container).is_some());
        // the target sits under its parent or under that parent's fragment
        if let Some(actual) = sink.parent(target) {
            sink.remove_child(actual, target)
                .map_err(ReplayError::from_sink)?;
        }
        Ok(())
    }

    /// Move every staged fragment back under its real parent and restore the
    /// scroll positions recorded when it was staged.
    pub fn reattach_virtual_parents<S: TreeSink<Node = N>>(&mut self, sink: &mut S) {
        let staged: Vec<(N, N)> = self.virtual_parents.drain().collect();
        for (real, fragment) in staged {
            if let Err(err) = sink.append_child(real, fragment) {
                report(TARGET, &ReplayError::from_sink(err), true);
                continue;
            }
            self.restore_state(sink, real);
        }
        self.stored_scroll.clear();
    }

    /// Attach embedded children now, or park them until the content
    /// document exists.
    pub fn attach_embeds<S: TreeSink<Node = N>>(
        &mut self,
        sink: &mut S,
        ids: &mut IdentityMap<N>,
        builder: &TreeBuilder,
        embeds: Vec<PendingEmbed<N>>,
    ) {
        let mut work = embeds;
        while let Some(embed) = work.pop() {
            match builder.attach_embedded(sink, ids, embed) {
                Ok(more) => work.extend(more),
                Err(embed) => {
                    log::debug!(target: TARGET, "content document of {:?} not ready", embed.container);
                    self.pending_embeds.push(embed);
                }
            }
        }
    }

    pub fn embedded_document_ready<S: TreeSink<Node = N>>(
        &mut self,
        sink: &mut S,
        ids: &mut IdentityMap<N>,
        builder: &TreeBuilder,
        container: N,
    ) {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_embeds)
            .into_iter()
            .partition(|embed| embed.container == container);
        self.pending_embeds = waiting;
        self.attach_embeds(sink, ids, builder, ready);
    }

    /// Insert and delete rules of a `<style>` node. A node staged in a
    /// fragment is swapped into its real parent for the duration, since
    /// detached stylesheets cannot be edited.
    pub fn apply_style_rules<S: TreeSink<Node = N>>(
        &mut self,
        sink: &mut S,
        ids: &IdentityMap<N>,
        data: &StyleSheetRuleData,
    ) {
        let Some(target) = ids.get(data.id) else {
            report(TARGET, &ReplayError::ReferenceNotFound { id: data.id }, self.warn_missing);
            return;
        };
        let swap = sink.parent(target).and_then(|fragment| {
            let real = self.real_parent_of(fragment)?;
            let placeholder = sink.create_text("").ok()?;
            sink.insert_before(fragment, placeholder, Some(target)).ok()?;
            sink.append_child(real, target).ok()?;
            Some((fragment, placeholder))
        });

        for add in &data.adds {
            if let Err(err) = sink.insert_style_rule(target, &add.rule, add.index) {
                log::debug!(target: TARGET, "insert rule {:?}: {err}", add.rule);
            }
        }
        for delete in &data.removes {
            if let Err(err) = sink.delete_style_rule(target, delete.index) {
                log::debug!(target: TARGET, "delete rule {}: {err}", delete.index);
            }
        }

        if let Some((fragment, placeholder)) = swap {
            let restored = sink
                .insert_before(fragment, target, Some(placeholder))
                .and_then(|_| sink.remove_child(fragment, placeholder));
            if let Err(err) = restored {
                report(TARGET, &ReplayError::from_sink(err), true);
            }
        }
    }

    fn real_parent_of(&self, fragment: N) -> Option<N> {
        self.virtual_parents
            .iter()
            .find_map(|(real, staged)| (*staged == fragment).then_some(*real))
    }

    fn stage<S: TreeSink<Node = N>>(&mut self, sink: &mut S, parent: N) -> Result<N, ReplayError> {
        let fragment = sink.create_fragment().map_err(ReplayError::from_sink)?;
        self.store_state(sink, parent);
        for child in sink.children(parent) {
            sink.append_child(fragment, child)
                .map_err(ReplayError::from_sink)?;
        }
        self.virtual_parents.insert(parent, fragment);
        log::trace!(target: TARGET, "staging children of {parent:?} in {fragment:?}");
        Ok(fragment)
    }

    fn store_state<S: TreeSink<Node = N>>(&mut self, sink: &S, root: N) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !sink.is_element(node) {
                continue;
            }
            if let Some((x, y)) = sink.scroll_position(node)
                && (x != 0.0 || y != 0.0)
            {
                self.stored_scroll.insert(node, (x, y));
            }
            stack.extend(sink.children(node));
        }
    }

    fn restore_state<S: TreeSink<Node = N>>(&mut self, sink: &mut S, root: N) {
        if self.stored_scroll.is_empty() {
            return;
        }
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !sink.is_element(node) {
                continue;
            }
            if let Some((x, y)) = self.stored_scroll.remove(&node)
                && let Err(err) = sink.set_scroll(node, x, y)
            {
                log::debug!(target: TARGET, "restoring scroll of {node:?}: {err}");
            }
            stack.extend(sink.children(node));
        }
    }
}

struct BatchPlacer<'a, S: TreeSink> {
    applier: &'a mut MutationApplier<S::Node>,
    sink: &'a mut S,
    ids: &'a mut IdentityMap<S::Node>,
    builder: &'a TreeBuilder,
    use_virtual_parent: bool,
}

impl<S: TreeSink> BatchPlacer<'_, S> {
    fn insertion_parent(&mut self, parent: S::Node) -> S::Node {
        if let Some(fragment) = self.applier.virtual_parents.get(&parent) {
            return *fragment;
        }
        if self.use_virtual_parent && self.sink.is_connected(parent) {
            match self.applier.stage(self.sink, parent) {
                Ok(fragment) => return fragment,
                Err(err) => report(TARGET, &err, true),
            }
        }
        parent
    }

    // Position parked legacy nodes next to `target`, following the chain.
    fn resolve_missing(&mut self, parent: S::Node, target: S::Node, mutation: &AddedNode) {
        let mut stack = vec![(target, mutation.previous_id, mutation.next_id)];
        while let Some((node, previous, next)) = stack.pop() {
            if let Some(entry) = previous.and_then(|id| self.applier.missing.remove(&id)) {
                if let Err(err) = self.sink.insert_before(parent, entry.node, Some(node)) {
                    report(TARGET, &ReplayError::from_sink(err), true);
                } else {
                    stack.push((entry.node, entry.mutation.previous_id, entry.mutation.next_id));
                }
            }
            if let Some(entry) = next.and_then(|id| self.applier.missing.remove(&id)) {
                let after = self.sink.next_sibling(node);
                if let Err(err) = self.sink.insert_before(parent, entry.node, after) {
                    report(TARGET, &ReplayError::from_sink(err), true);
                } else {
                    stack.push((entry.node, entry.mutation.previous_id, entry.mutation.next_id));
                }
            }
        }
    }
}

impl<S: TreeSink> Placer for BatchPlacer<'_, S> {
    fn is_live(&self, id: NodeId) -> bool {
        self.ids.has_id(id)
    }

    fn place(&mut self, mutation: &AddedNode) -> Placement {
        if !self.sink.is_alive() {
            report(TARGET, &ReplayError::EngineDestroyed, true);
            return Placement::Skipped;
        }
        let Some(parent) = self.ids.get(mutation.parent_id) else {
            return Placement::Deferred;
        };
        if mutation
            .known_next_id()
            .is_some_and(|next| !self.ids.has_id(next))
        {
            return Placement::Deferred;
        }
        let parent = self.insertion_parent(parent);

        let Some(built) = self.builder.build(self.sink, self.ids, &mutation.node) else {
            return Placement::Skipped;
        };
        let target = built.node;

        if mutation.has_unknown_sibling() {
            self.applier.missing.insert(
                mutation.id(),
                MissingNode {
                    node: target,
                    mutation: mutation.clone(),
                },
            );
            self.applier
                .attach_embeds(self.sink, self.ids, self.builder, built.pending);
            return Placement::Placed;
        }

        let previous = mutation.previous_id.and_then(|id| self.ids.get(id));
        let next = mutation.next_id.and_then(|id| self.ids.get(id));
        let sink = &*self.sink;
        let before = previous
            .and_then(|p| sink.next_sibling(p))
            .filter(|s| sink.parent(*s) == Some(parent))
            .or_else(|| next.filter(|n| sink.parent(*n) == Some(parent)));
        if let Err(err) = self.sink.insert_before(parent, target, before) {
            report(TARGET, &ReplayError::from_sink(err), true);
            self.ids.unbind(self.sink, target);
            return Placement::Skipped;
        }

        if mutation.previous_id.is_some() || mutation.next_id.is_some() {
            self.resolve_missing(parent, target, mutation);
        }
        self.applier
            .attach_embeds(self.sink, self.ids, self.builder, built.pending);
        Placement::Placed
    }
}
