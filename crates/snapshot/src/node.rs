//! Serialized node descriptions captured by the recorder.
//!
//! A [`SerializedNode`] is immutable once captured and is owned by the recorded
//! event stream. Live nodes are never referenced from here; everything is keyed
//! by [`NodeId`].

use core_types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag name of elements that host an embedded sub-document.
pub const EMBED_CONTAINER_TAG: &str = "iframe";

/// Attribute names starting with this prefix are bookkeeping, not DOM attributes.
pub const RESERVED_ATTRIBUTE_PREFIX: char = '_';

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// String form handed to the sink; `None` means the attribute is absent.
    pub fn to_attr_string(&self) -> Option<String> {
        match self {
            AttributeValue::Bool(true) => Some(String::new()),
            AttributeValue::Bool(false) => None,
            AttributeValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(format!("{}", *n as i64))
            }
            AttributeValue::Number(n) => Some(n.to_string()),
            AttributeValue::Text(s) => Some(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    pub node_id: NodeId,
    /// Id of the (sub-)document this node was captured from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<NodeId>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NodeKind {
    Document {
        #[serde(default)]
        children: Vec<SerializedNode>,
    },
    DocumentType {
        name: String,
        #[serde(default)]
        public_id: String,
        #[serde(default)]
        system_id: String,
    },
    Element {
        tag_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, AttributeValue>,
        #[serde(default)]
        children: Vec<SerializedNode>,
    },
    Text {
        content: String,
        #[serde(default)]
        is_style_rule: bool,
    },
}

impl SerializedNode {
    pub fn children(&self) -> &[SerializedNode] {
        match &self.kind {
            NodeKind::Document { children } | NodeKind::Element { children, .. } => children,
            NodeKind::DocumentType { .. } | NodeKind::Text { .. } => &[],
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self.kind, NodeKind::Document { .. })
    }

    /// True for elements whose children live in their own sub-document.
    pub fn is_embed_container(&self) -> bool {
        self.tag_name()
            .is_some_and(|t| t.eq_ignore_ascii_case(EMBED_CONTAINER_TAG))
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0usize;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }
}
