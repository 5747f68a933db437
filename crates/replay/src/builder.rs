//! Serialized node descriptions to live sink subtrees.
//!
//! Every created node is bound in the [`IdentityMap`] under its recorded id
//! before it is attached. Descent stops at embedded-document containers: their
//! children belong to a document the sink may not have initialized yet, so they
//! are handed back as [`PendingEmbed`]s and attached by
//! [`TreeBuilder::attach_embedded`] once the content document exists.

use crate::error::ReplayError;
use crate::identity::IdentityMap;
use css::rewrite_hover_selectors;
use sink::{LayoutHint, TreeSink};
use snapshot::{AttributeValue, NodeKind, RESERVED_ATTRIBUTE_PREFIX, SerializedNode};

const INLINE_CSS_ATTRIBUTE: &str = "_cssText";

/// Children of an embedded container waiting for its content document.
#[derive(Debug)]
pub struct PendingEmbed<N> {
    pub container: N,
    pub children: Vec<SerializedNode>,
}

#[derive(Debug)]
pub struct Built<N> {
    pub node: N,
    pub pending: Vec<PendingEmbed<N>>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build `node` and its subtree, detached. Returns `None` when the node
    /// belongs to a sub-document that is not bound yet, or the sink refuses
    /// to create the root.
    pub fn build<S: TreeSink>(
        &self,
        sink: &mut S,
        ids: &mut IdentityMap<S::Node>,
        node: &SerializedNode,
    ) -> Option<Built<S::Node>> {
        if !origin_is_bound(ids, node) {
            log::debug!(
                target: "replay.builder",
                "origin {:?} of node {} is not bound yet",
                node.origin_id,
                node.node_id
            );
            return None;
        }
        let root = match self.create(sink, node) {
            Ok(root) => root,
            Err(err) => {
                log::warn!(target: "replay.builder", "{err} while building node {}", node.node_id);
                return None;
            }
        };
        ids.bind(sink, node.node_id, root);

        let mut pending = Vec::new();
        let mut stack = vec![(node, root)];
        while let Some((desc, live)) = stack.pop() {
            if desc.is_embed_container() {
                if !desc.children().is_empty() {
                    pending.push(PendingEmbed {
                        container: live,
                        children: desc.children().to_vec(),
                    });
                }
                continue;
            }
            for child in desc.children() {
                if !origin_is_bound(ids, child) {
                    continue;
                }
                let created = match self.create(sink, child) {
                    Ok(created) => created,
                    Err(err) => {
                        log::warn!(target: "replay.builder", "failed to rebuild {}: {err}", child.node_id);
                        continue;
                    }
                };
                ids.bind(sink, child.node_id, created);
                if let Err(err) = sink.append_child(live, created) {
                    log::warn!(target: "replay.builder", "failed to attach {}: {err}", child.node_id);
                    ids.unbind(sink, created);
                    continue;
                }
                stack.push((child, created));
            }
        }
        Some(Built {
            node: root,
            pending,
        })
    }

    /// Attach the children of an embedded container to its content document.
    ///
    /// Hands `embed` back unchanged when the sink has not initialized the
    /// content document yet. On success returns the embeds found further down.
    pub fn attach_embedded<S: TreeSink>(
        &self,
        sink: &mut S,
        ids: &mut IdentityMap<S::Node>,
        embed: PendingEmbed<S::Node>,
    ) -> Result<Vec<PendingEmbed<S::Node>>, PendingEmbed<S::Node>> {
        let Some(doc) = sink.content_document(embed.container) else {
            return Err(embed);
        };
        let mut more = Vec::new();
        for child in &embed.children {
            let (parent, nodes) = if child.is_document() {
                ids.bind(sink, child.node_id, doc);
                (doc, child.children())
            } else {
                if let Some(origin) = child.origin_id
                    && !ids.has_id(origin)
                {
                    ids.bind(sink, origin, doc);
                }
                (doc, std::slice::from_ref(child))
            };
            for node in nodes {
                let Some(built) = self.build(sink, ids, node) else {
                    continue;
                };
                if let Err(err) = sink.append_child(parent, built.node) {
                    log::warn!(target: "replay.builder", "failed to attach {}: {err}", node.node_id);
                    ids.unbind(sink, built.node);
                    continue;
                }
                more.extend(built.pending);
            }
        }
        Ok(more)
    }

    fn create<S: TreeSink>(
        &self,
        sink: &mut S,
        desc: &SerializedNode,
    ) -> Result<S::Node, ReplayError> {
        let node = match &desc.kind {
            NodeKind::Document { .. } => sink.create_document(),
            NodeKind::DocumentType {
                name,
                public_id,
                system_id,
            } => sink.create_doctype(name, public_id, system_id),
            NodeKind::Text {
                content,
                is_style_rule,
            } => {
                if *is_style_rule {
                    sink.create_text(&rewrite_hover_selectors(content))
                } else {
                    sink.create_text(content)
                }
            }
            NodeKind::Element {
                tag_name,
                attributes,
                ..
            } => return self.create_element(sink, tag_name, attributes),
        };
        node.map_err(ReplayError::from_sink)
    }

    fn create_element<S: TreeSink>(
        &self,
        sink: &mut S,
        tag_name: &str,
        attributes: &std::collections::BTreeMap<String, AttributeValue>,
    ) -> Result<S::Node, ReplayError> {
        let tag = tag_name.to_ascii_lowercase();
        // stylesheets inlined by the recorder are replayed as <style>
        let tag = if tag == "link" && attributes.contains_key(INLINE_CSS_ATTRIBUTE) {
            "style".to_string()
        } else {
            tag
        };
        let node = sink.create_element(&tag).map_err(ReplayError::from_sink)?;

        for (name, value) in attributes {
            if name == INLINE_CSS_ATTRIBUTE && tag == "style" {
                if let Some(css) = value.to_attr_string() {
                    append_text(sink, node, &rewrite_hover_selectors(&css));
                }
                continue;
            }
            if name.starts_with(RESERVED_ATTRIBUTE_PREFIX) {
                if let Some(hint) = layout_hint(name, value)
                    && let Err(err) = sink.apply_hint(node, &hint)
                {
                    log::debug!(target: "replay.builder", "layout hint {name} rejected: {err}");
                }
                continue;
            }
            if tag == "textarea" && name == "value" {
                if let Some(text) = value.to_attr_string() {
                    append_text(sink, node, &text);
                }
                continue;
            }
            if tag == snapshot::EMBED_CONTAINER_TAG && name == "src" {
                continue;
            }
            let Some(value) = value.to_attr_string() else {
                continue;
            };
            if let Err(err) = sink.set_attribute(node, name, &value) {
                log::debug!(target: "replay.builder", "skipping attribute {name:?} on <{tag}>: {err}");
            }
        }
        Ok(node)
    }
}

fn origin_is_bound<N: Copy + Eq + std::hash::Hash>(
    ids: &IdentityMap<N>,
    node: &SerializedNode,
) -> bool {
    node.origin_id.is_none_or(|origin| ids.has_id(origin))
}

fn append_text<S: TreeSink>(sink: &mut S, parent: S::Node, text: &str) {
    let result = sink
        .create_text(text)
        .and_then(|child| sink.append_child(parent, child));
    if let Err(err) = result {
        log::debug!(target: "replay.builder", "inline text rejected: {err}");
    }
}

fn layout_hint(name: &str, value: &AttributeValue) -> Option<LayoutHint> {
    let number = || match value {
        AttributeValue::Number(n) => Some(*n),
        AttributeValue::Text(s) => s.trim().parse().ok(),
        AttributeValue::Bool(_) => None,
    };
    match name {
        "__width" => value.to_attr_string().map(LayoutHint::Width),
        "__height" => value.to_attr_string().map(LayoutHint::Height),
        "__scrollLeft" => number().map(LayoutHint::ScrollLeft),
        "__scrollTop" => number().map(LayoutHint::ScrollTop),
        _ => None,
    }
}
