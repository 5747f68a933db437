use crate::{LayoutHint, SinkError, TreeSink};
use core_types::NodeId;
use snapshot::{EMBED_CONTAINER_TAG, MediaInteraction, MouseInteraction};
use std::collections::HashSet;

/// Handle into an [`ArenaSink`]. Handles are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaNode(u32);

impl ArenaNode {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Effects that have no structural representation, recorded in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum VisualEffect {
    Pointer { x: f64, y: f64 },
    Hover(Option<NodeId>),
    Click,
    Interaction { id: Option<NodeId>, kind: MouseInteraction },
    Media { id: Option<NodeId>, action: MediaInteraction },
    Selection {
        anchor: Option<NodeId>,
        anchor_offset: i64,
        focus: Option<NodeId>,
        focus_offset: i64,
    },
    Paused(bool),
}

/// In-memory tree sink. Nodes live in an arena for the sink's lifetime;
/// detaching only unlinks them.
pub struct ArenaSink {
    nodes: Vec<NodeRecord>,
    root: Option<ArenaNode>,
    alive: bool,
    content_documents_ready: bool,
    pending_stylesheets: usize,
    rejected_attributes: HashSet<String>,
    visual: Vec<VisualEffect>,
    mutation_count: usize,
}

impl ArenaSink {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            alive: true,
            content_documents_ready: true,
            pending_stylesheets: 0,
            rejected_attributes: HashSet::new(),
            visual: Vec::new(),
            mutation_count: 0,
        }
    }

    /// Every later fallible call fails with [`SinkError::Destroyed`].
    pub fn destroy(&mut self) {
        self.alive = false;
    }

    /// While false, `content_document` reports embedded containers as not
    /// initialized.
    pub fn set_content_documents_ready(&mut self, ready: bool) {
        self.content_documents_ready = ready;
    }

    pub fn set_pending_stylesheets(&mut self, count: usize) {
        self.pending_stylesheets = count;
    }

    /// Make `set_attribute` fail for `name`.
    pub fn reject_attribute(&mut self, name: &str) {
        self.rejected_attributes.insert(name.to_string());
    }

    pub fn visual_log(&self) -> &[VisualEffect] {
        &self.visual
    }

    pub fn clear_visual_log(&mut self) {
        self.visual.clear();
    }

    /// Number of structural, attribute and text writes performed so far.
    pub fn mutation_count(&self) -> usize {
        self.mutation_count
    }

    pub fn tag_name(&self, node: ArenaNode) -> Option<&str> {
        match &self.record(node)?.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attribute(&self, node: ArenaNode, name: &str) -> Option<&str> {
        match &self.record(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, node: ArenaNode) -> Option<&str> {
        match &self.record(node)?.kind {
            NodeKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn hints(&self, node: ArenaNode) -> &[LayoutHint] {
        self.record(node).map(|r| r.hints.as_slice()).unwrap_or(&[])
    }

    pub fn input_value(&self, node: ArenaNode) -> Option<(&str, bool)> {
        self.record(node)?
            .input
            .as_ref()
            .map(|(text, checked)| (text.as_str(), *checked))
    }

    pub fn style_rules(&self, node: ArenaNode) -> &[String] {
        self.record(node)
            .map(|r| r.style_rules.as_slice())
            .unwrap_or(&[])
    }

    /// First connected node carrying `id`, in document order.
    pub fn find_by_node_id(&self, id: NodeId) -> Option<ArenaNode> {
        let mut stack: Vec<ArenaNode> = self.root.into_iter().collect();
        while let Some(node) = stack.pop() {
            let record = &self.nodes[node.index()];
            if record.node_id == Some(id) {
                return Some(node);
            }
            if let Some(doc) = record.content_document {
                stack.push(doc);
            }
            stack.extend(record.children.iter().rev().copied());
        }
        None
    }

    /// Indented rendering of the rendered tree, one node per line, with the
    /// node id in brackets. Attributes are sorted by name.
    pub fn outline(&self) -> Vec<String> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let record = &self.nodes[node.index()];
            let indent = "  ".repeat(depth);
            let mut line = match &record.kind {
                NodeKind::Document => format!("{indent}#document"),
                NodeKind::Fragment => format!("{indent}#fragment"),
                NodeKind::Doctype {
                    name,
                    public_id,
                    system_id,
                } => {
                    if public_id.is_empty() && system_id.is_empty() {
                        format!("{indent}<!DOCTYPE {name}>")
                    } else {
                        format!("{indent}<!DOCTYPE {name} \"{public_id}\" \"{system_id}\">")
                    }
                }
                NodeKind::Element { name, attributes } => {
                    let mut attrs: Vec<_> = attributes.iter().collect();
                    attrs.sort();
                    let mut line = format!("{indent}<{name}");
                    for (k, v) in attrs {
                        line.push_str(&format!(" {k}=\"{v}\""));
                    }
                    line.push('>');
                    line
                }
                NodeKind::Text { text } => format!("{indent}\"{text}\""),
            };
            if let Some(id) = record.node_id {
                line.push_str(&format!(" [{id}]"));
            }
            out.push(line);
            if let Some(doc) = record.content_document {
                stack.push((doc, depth + 1));
            }
            for child in record.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    fn record(&self, node: ArenaNode) -> Option<&NodeRecord> {
        self.nodes.get(node.index())
    }

    fn ensure_alive(&self) -> Result<(), SinkError> {
        if self.alive {
            Ok(())
        } else {
            Err(SinkError::Destroyed)
        }
    }

    fn ensure_node(&self, node: ArenaNode) -> Result<(), SinkError> {
        self.ensure_alive()?;
        if node.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(SinkError::UnknownNode)
        }
    }

    fn push(&mut self, kind: NodeKind) -> Result<ArenaNode, SinkError> {
        self.ensure_alive()?;
        let node = ArenaNode(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(kind));
        Ok(node)
    }

    fn detach(&mut self, child: ArenaNode) {
        if let Some(parent) = self.nodes[child.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != child);
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: ArenaNode, node: ArenaNode) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes[n.index()].parent;
        }
        false
    }

    fn id_of(&self, node: ArenaNode) -> Option<NodeId> {
        self.record(node).and_then(|r| r.node_id)
    }
}

impl Default for ArenaSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSink for ArenaSink {
    type Node = ArenaNode;

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn create_document(&mut self) -> Result<ArenaNode, SinkError> {
        self.push(NodeKind::Document)
    }

    fn create_doctype(
        &mut self,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> Result<ArenaNode, SinkError> {
        self.push(NodeKind::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        })
    }

    fn create_element(&mut self, tag: &str) -> Result<ArenaNode, SinkError> {
        self.push(NodeKind::Element {
            name: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> Result<ArenaNode, SinkError> {
        self.push(NodeKind::Text {
            text: text.to_string(),
        })
    }

    fn create_fragment(&mut self) -> Result<ArenaNode, SinkError> {
        self.push(NodeKind::Fragment)
    }

    fn set_root(&mut self, document: ArenaNode) -> Result<(), SinkError> {
        self.ensure_node(document)?;
        if !matches!(self.nodes[document.index()].kind, NodeKind::Document) {
            return Err(SinkError::WrongNodeKind {
                expected: "document",
            });
        }
        self.root = Some(document);
        self.mutation_count += 1;
        Ok(())
    }

    fn root(&self) -> Option<ArenaNode> {
        self.root
    }

    fn content_document(&mut self, container: ArenaNode) -> Option<ArenaNode> {
        if !self.alive || !self.content_documents_ready {
            return None;
        }
        let record = self.record(container)?;
        match &record.kind {
            NodeKind::Element { name, .. } if name == EMBED_CONTAINER_TAG => {}
            _ => return None,
        }
        if let Some(doc) = record.content_document {
            return Some(doc);
        }
        let doc = self.push(NodeKind::Document).ok()?;
        self.nodes[doc.index()].host = Some(container);
        self.nodes[container.index()].content_document = Some(doc);
        log::trace!(target: "replay.sink", "content document {doc:?} for {container:?}");
        Some(doc)
    }

    fn embedded_document(&self, container: ArenaNode) -> Option<ArenaNode> {
        self.record(container)?.content_document
    }

    fn insert_before(
        &mut self,
        parent: ArenaNode,
        child: ArenaNode,
        before: Option<ArenaNode>,
    ) -> Result<(), SinkError> {
        self.ensure_node(parent)?;
        self.ensure_node(child)?;
        if !self.nodes[parent.index()].allows_children() {
            return Err(SinkError::InvalidParent);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(SinkError::CycleDetected);
        }
        if let Some(before) = before {
            self.ensure_node(before)?;
            if self.nodes[before.index()].parent != Some(parent) || before == child {
                return Err(SinkError::InvalidSibling);
            }
        }
        let moved = if matches!(self.nodes[child.index()].kind, NodeKind::Fragment) {
            std::mem::take(&mut self.nodes[child.index()].children)
        } else {
            self.detach(child);
            vec![child]
        };
        let mut pos = match before {
            Some(before) => self.nodes[parent.index()]
                .children
                .iter()
                .position(|c| *c == before)
                .ok_or(SinkError::InvalidSibling)?,
            None => self.nodes[parent.index()].children.len(),
        };
        for node in moved {
            self.nodes[node.index()].parent = Some(parent);
            self.nodes[parent.index()].children.insert(pos, node);
            pos += 1;
        }
        self.mutation_count += 1;
        Ok(())
    }

    fn remove_child(&mut self, parent: ArenaNode, child: ArenaNode) -> Result<(), SinkError> {
        self.ensure_node(parent)?;
        self.ensure_node(child)?;
        if self.nodes[child.index()].parent != Some(parent) {
            return Err(SinkError::NotAChild);
        }
        self.detach(child);
        self.mutation_count += 1;
        Ok(())
    }

    fn parent(&self, node: ArenaNode) -> Option<ArenaNode> {
        self.record(node)?.parent
    }

    fn children(&self, node: ArenaNode) -> Vec<ArenaNode> {
        self.record(node)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }

    fn next_sibling(&self, node: ArenaNode) -> Option<ArenaNode> {
        let parent = self.parent(node)?;
        let siblings = &self.nodes[parent.index()].children;
        let pos = siblings.iter().position(|c| *c == node)?;
        siblings.get(pos + 1).copied()
    }

    fn contains(&self, ancestor: ArenaNode, node: ArenaNode) -> bool {
        self.record(ancestor).is_some()
            && self.record(node).is_some()
            && self.is_inclusive_ancestor(ancestor, node)
    }

    fn is_connected(&self, node: ArenaNode) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let mut current = node;
        loop {
            let Some(record) = self.record(current) else {
                return false;
            };
            if current == root {
                return true;
            }
            match (record.parent, record.host) {
                (Some(parent), _) => current = parent,
                (None, Some(host)) => current = host,
                (None, None) => return false,
            }
        }
    }

    fn is_element(&self, node: ArenaNode) -> bool {
        matches!(
            self.record(node).map(|r| &r.kind),
            Some(NodeKind::Element { .. })
        )
    }

    fn set_attribute(
        &mut self,
        node: ArenaNode,
        name: &str,
        value: &str,
    ) -> Result<(), SinkError> {
        self.ensure_node(node)?;
        let invalid = name.is_empty()
            || name
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '='));
        if invalid || self.rejected_attributes.contains(name) {
            return Err(SinkError::InvalidAttribute(name.to_string()));
        }
        match &mut self.nodes[node.index()].kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(k, _)| k == name) {
                    Some((_, v)) => *v = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
            }
            _ => return Err(SinkError::WrongNodeKind { expected: "element" }),
        }
        self.mutation_count += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, node: ArenaNode, name: &str) -> Result<(), SinkError> {
        self.ensure_node(node)?;
        match &mut self.nodes[node.index()].kind {
            NodeKind::Element { attributes, .. } => attributes.retain(|(k, _)| k != name),
            _ => return Err(SinkError::WrongNodeKind { expected: "element" }),
        }
        self.mutation_count += 1;
        Ok(())
    }

    fn set_text(&mut self, node: ArenaNode, text: Option<&str>) -> Result<(), SinkError> {
        self.ensure_node(node)?;
        match &mut self.nodes[node.index()].kind {
            NodeKind::Text { text: existing } => {
                existing.clear();
                existing.push_str(text.unwrap_or_default());
            }
            _ => return Err(SinkError::WrongNodeKind { expected: "text" }),
        }
        self.mutation_count += 1;
        Ok(())
    }

    fn apply_hint(&mut self, node: ArenaNode, hint: &LayoutHint) -> Result<(), SinkError> {
        self.ensure_node(node)?;
        let record = &mut self.nodes[node.index()];
        match hint {
            LayoutHint::ScrollLeft(x) => record.scroll.0 = *x,
            LayoutHint::ScrollTop(y) => record.scroll.1 = *y,
            LayoutHint::Width(_) | LayoutHint::Height(_) => {}
        }
        record.hints.push(hint.clone());
        Ok(())
    }

    fn node_id(&self, node: ArenaNode) -> Option<NodeId> {
        self.id_of(node)
    }

    fn set_node_id(&mut self, node: ArenaNode, id: Option<NodeId>) {
        if let Some(record) = self.nodes.get_mut(node.index()) {
            record.node_id = id;
        }
    }

    fn scroll_position(&self, node: ArenaNode) -> Option<(f64, f64)> {
        self.record(node).map(|r| r.scroll)
    }

    fn set_scroll(&mut self, node: ArenaNode, x: f64, y: f64) -> Result<(), SinkError> {
        self.ensure_node(node)?;
        self.nodes[node.index()].scroll = (x, y);
        Ok(())
    }

    fn set_input_value(
        &mut self,
        node: ArenaNode,
        text: &str,
        checked: bool,
    ) -> Result<(), SinkError> {
        self.ensure_node(node)?;
        if !self.is_element(node) {
            return Err(SinkError::WrongNodeKind { expected: "element" });
        }
        self.nodes[node.index()].input = Some((text.to_string(), checked));
        Ok(())
    }

    fn move_pointer(&mut self, x: f64, y: f64) {
        self.visual.push(VisualEffect::Pointer { x, y });
    }

    fn hover(&mut self, target: ArenaNode) {
        let id = self.id_of(target);
        self.visual.push(VisualEffect::Hover(id));
    }

    fn click_pulse(&mut self) {
        self.visual.push(VisualEffect::Click);
    }

    fn dispatch_interaction(&mut self, target: ArenaNode, kind: MouseInteraction) {
        let id = self.id_of(target);
        self.visual.push(VisualEffect::Interaction { id, kind });
    }

    fn media(&mut self, target: ArenaNode, action: MediaInteraction) -> Result<(), SinkError> {
        self.ensure_node(target)?;
        if !self.is_element(target) {
            return Err(SinkError::WrongNodeKind { expected: "element" });
        }
        let id = self.id_of(target);
        self.visual.push(VisualEffect::Media { id, action });
        Ok(())
    }

    fn insert_style_rule(
        &mut self,
        target: ArenaNode,
        rule: &str,
        index: Option<usize>,
    ) -> Result<(), SinkError> {
        self.ensure_node(target)?;
        if !self.is_connected(target) {
            return Err(SinkError::Detached);
        }
        let rules = &mut self.nodes[target.index()].style_rules;
        match index {
            Some(i) if i > rules.len() => return Err(SinkError::RuleIndexOutOfRange(i)),
            Some(i) => rules.insert(i, rule.to_string()),
            None => rules.push(rule.to_string()),
        }
        Ok(())
    }

    fn delete_style_rule(&mut self, target: ArenaNode, index: usize) -> Result<(), SinkError> {
        self.ensure_node(target)?;
        if !self.is_connected(target) {
            return Err(SinkError::Detached);
        }
        let rules = &mut self.nodes[target.index()].style_rules;
        if index >= rules.len() {
            return Err(SinkError::RuleIndexOutOfRange(index));
        }
        rules.remove(index);
        Ok(())
    }

    fn set_selection(
        &mut self,
        anchor: ArenaNode,
        anchor_offset: i64,
        focus: ArenaNode,
        focus_offset: i64,
    ) -> Result<(), SinkError> {
        self.ensure_node(anchor)?;
        self.ensure_node(focus)?;
        let effect = VisualEffect::Selection {
            anchor: self.id_of(anchor),
            anchor_offset,
            focus: self.id_of(focus),
            focus_offset,
        };
        self.visual.push(effect);
        Ok(())
    }

    fn pending_stylesheets(&self) -> usize {
        self.pending_stylesheets
    }

    fn set_paused(&mut self, paused: bool) {
        self.visual.push(VisualEffect::Paused(paused));
    }
}

struct NodeRecord {
    kind: NodeKind,
    parent: Option<ArenaNode>,
    children: Vec<ArenaNode>,
    node_id: Option<NodeId>,
    // content documents point back at their embedding container
    host: Option<ArenaNode>,
    content_document: Option<ArenaNode>,
    scroll: (f64, f64),
    hints: Vec<LayoutHint>,
    input: Option<(String, bool)>,
    style_rules: Vec<String>,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            node_id: None,
            host: None,
            content_document: None,
            scroll: (0.0, 0.0),
            hints: Vec::new(),
            input: None,
            style_rules: Vec::new(),
        }
    }

    fn allows_children(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Document | NodeKind::Element { .. } | NodeKind::Fragment
        )
    }
}

enum NodeKind {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    Fragment,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_body(sink: &mut ArenaSink) -> (ArenaNode, ArenaNode) {
        let doc = sink.create_document().unwrap();
        let body = sink.create_element("body").unwrap();
        sink.append_child(doc, body).unwrap();
        sink.set_root(doc).unwrap();
        (doc, body)
    }

    #[test]
    fn insert_before_orders_children_and_moves_attached_nodes() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        let a = sink.create_element("a").unwrap();
        let b = sink.create_element("b").unwrap();
        sink.append_child(body, b).unwrap();
        sink.insert_before(body, a, Some(b)).unwrap();
        assert_eq!(sink.children(body), vec![a, b]);
        assert_eq!(sink.next_sibling(a), Some(b));

        let div = sink.create_element("div").unwrap();
        sink.append_child(body, div).unwrap();
        sink.append_child(div, a).unwrap();
        assert_eq!(sink.children(body), vec![b, div]);
        assert_eq!(sink.parent(a), Some(div));
    }

    #[test]
    fn fragment_insertion_moves_children_in_order() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        let frag = sink.create_fragment().unwrap();
        let x = sink.create_text("x").unwrap();
        let y = sink.create_text("y").unwrap();
        sink.append_child(frag, x).unwrap();
        sink.append_child(frag, y).unwrap();
        sink.append_child(body, frag).unwrap();
        assert_eq!(sink.children(body), vec![x, y]);
        assert!(sink.children(frag).is_empty());
        assert!(sink.is_connected(y));
    }

    #[test]
    fn cycles_and_foreign_siblings_are_rejected() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        let div = sink.create_element("div").unwrap();
        sink.append_child(body, div).unwrap();
        assert_eq!(sink.append_child(div, body), Err(SinkError::CycleDetected));
        assert_eq!(sink.append_child(div, div), Err(SinkError::CycleDetected));
        let stray = sink.create_element("span").unwrap();
        assert_eq!(
            sink.insert_before(div, stray, Some(body)),
            Err(SinkError::InvalidSibling)
        );
        let text = sink.create_text("t").unwrap();
        assert_eq!(sink.append_child(text, stray), Err(SinkError::InvalidParent));
    }

    #[test]
    fn removal_detaches_but_keeps_subtree() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        let div = sink.create_element("div").unwrap();
        let t = sink.create_text("hi").unwrap();
        sink.append_child(div, t).unwrap();
        sink.append_child(body, div).unwrap();
        sink.remove_child(body, div).unwrap();
        assert!(!sink.is_connected(t));
        assert!(sink.contains(div, t));
        assert_eq!(sink.remove_child(body, div), Err(SinkError::NotAChild));
    }

    #[test]
    fn content_documents_are_connected_through_their_host() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        let frame = sink.create_element("iframe").unwrap();
        sink.append_child(body, frame).unwrap();
        sink.set_content_documents_ready(false);
        assert_eq!(sink.content_document(frame), None);
        sink.set_content_documents_ready(true);
        let inner = sink.content_document(frame).unwrap();
        assert_eq!(sink.content_document(frame), Some(inner));
        let p = sink.create_element("p").unwrap();
        sink.append_child(inner, p).unwrap();
        assert!(sink.is_connected(p));
        let div = sink.create_element("div").unwrap();
        assert_eq!(sink.content_document(div), None);
    }

    #[test]
    fn attributes_and_text() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        sink.set_attribute(body, "class", "a").unwrap();
        sink.set_attribute(body, "class", "b").unwrap();
        assert_eq!(sink.attribute(body, "class"), Some("b"));
        assert_eq!(
            sink.set_attribute(body, "bad name", "x"),
            Err(SinkError::InvalidAttribute("bad name".to_string()))
        );
        sink.reject_attribute("onload");
        assert!(sink.set_attribute(body, "onload", "x").is_err());
        sink.remove_attribute(body, "class").unwrap();
        assert_eq!(sink.attribute(body, "class"), None);

        let t = sink.create_text("old").unwrap();
        sink.set_text(t, Some("new")).unwrap();
        assert_eq!(sink.text(t), Some("new"));
        sink.set_text(t, None).unwrap();
        assert_eq!(sink.text(t), Some(""));
        assert!(sink.set_text(body, Some("x")).is_err());
    }

    #[test]
    fn style_rules_require_connection() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        let style = sink.create_element("style").unwrap();
        assert_eq!(
            sink.insert_style_rule(style, "a {}", None),
            Err(SinkError::Detached)
        );
        sink.append_child(body, style).unwrap();
        sink.insert_style_rule(style, "b {}", None).unwrap();
        sink.insert_style_rule(style, "a {}", Some(0)).unwrap();
        assert_eq!(sink.style_rules(style), ["a {}", "b {}"]);
        assert_eq!(
            sink.delete_style_rule(style, 5),
            Err(SinkError::RuleIndexOutOfRange(5))
        );
        sink.delete_style_rule(style, 0).unwrap();
        assert_eq!(sink.style_rules(style), ["b {}"]);
    }

    #[test]
    fn destroyed_sink_rejects_everything() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        sink.destroy();
        assert!(!sink.is_alive());
        assert_eq!(sink.create_element("p"), Err(SinkError::Destroyed));
        assert_eq!(
            sink.set_attribute(body, "a", "b"),
            Err(SinkError::Destroyed)
        );
    }

    #[test]
    fn outline_renders_ids_and_sorted_attributes() {
        let mut sink = ArenaSink::new();
        let (doc, body) = doc_with_body(&mut sink);
        sink.set_node_id(doc, Some(1));
        sink.set_node_id(body, Some(2));
        sink.set_attribute(body, "id", "main").unwrap();
        sink.set_attribute(body, "class", "x").unwrap();
        let t = sink.create_text("hello").unwrap();
        sink.set_node_id(t, Some(3));
        sink.append_child(body, t).unwrap();
        assert_eq!(
            sink.outline(),
            vec![
                "#document [1]".to_string(),
                "  <body class=\"x\" id=\"main\"> [2]".to_string(),
                "    \"hello\" [3]".to_string(),
            ]
        );
        assert_eq!(sink.find_by_node_id(3), Some(t));
        assert_eq!(sink.find_by_node_id(9), None);
    }

    #[test]
    fn deep_chain_outline_does_not_recurse() {
        let mut sink = ArenaSink::new();
        let (_, body) = doc_with_body(&mut sink);
        let mut parent = body;
        for _ in 0..10_000 {
            let div = sink.create_element("div").unwrap();
            sink.append_child(parent, div).unwrap();
            parent = div;
        }
        assert!(sink.is_connected(parent));
        assert_eq!(sink.outline().len(), 10_002);
    }
}
