//! Recorded tree mutations.
//!
//! Invariants:
//! - Mutations reference nodes by [`NodeId`] only, never by live reference,
//!   because the referenced parent or siblings may not exist yet when the
//!   mutation is applied.
//! - Within one [`MutationBatch`], removals are applied first, then additions,
//!   then text and attribute updates.
//! - `previous_id`/`next_id` describe the position at capture time; either may
//!   be absent. The legacy sentinel [`UNKNOWN_SIBLING`] means "sibling was not
//!   serialized" and is tolerated but never produced by current recorders.

use crate::node::SerializedNode;
use core_types::{NodeId, UNKNOWN_SIBLING};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedNode {
    pub parent_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<NodeId>,
    #[serde(default)]
    pub next_id: Option<NodeId>,
    pub node: SerializedNode,
}

impl AddedNode {
    /// Id of the node being inserted.
    pub fn id(&self) -> NodeId {
        self.node.node_id
    }

    /// Old recordings mark unknown siblings with `-1`.
    pub fn has_unknown_sibling(&self) -> bool {
        self.previous_id == Some(UNKNOWN_SIBLING) || self.next_id == Some(UNKNOWN_SIBLING)
    }

    /// The next sibling id, if it names a real node.
    pub fn known_next_id(&self) -> Option<NodeId> {
        self.next_id.filter(|id| *id != UNKNOWN_SIBLING)
    }

    pub fn known_previous_id(&self) -> Option<NodeId> {
        self.previous_id.filter(|id| *id != UNKNOWN_SIBLING)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedNode {
    pub parent_id: NodeId,
    pub id: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMutation {
    pub id: NodeId,
    pub value: Option<String>,
}

/// Attribute updates for one node; `None` removes the attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMutation {
    pub id: NodeId,
    pub attributes: BTreeMap<String, Option<String>>,
}

/// One logical commit of mutations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationBatch {
    #[serde(default)]
    pub adds: Vec<AddedNode>,
    #[serde(default)]
    pub removes: Vec<RemovedNode>,
    #[serde(default)]
    pub texts: Vec<TextMutation>,
    #[serde(default)]
    pub attributes: Vec<AttributeMutation>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty()
            && self.removes.is_empty()
            && self.texts.is_empty()
            && self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.adds.len() + self.removes.len() + self.texts.len() + self.attributes.len()
    }

    /// True if any mutation in the batch names `id`, as target, parent or sibling.
    pub fn references(&self, id: NodeId) -> bool {
        self.adds.iter().any(|m| {
            m.id() == id || m.parent_id == id || m.next_id == Some(id) || m.previous_id == Some(id)
        }) || self.removes.iter().any(|m| m.id == id || m.parent_id == id)
            || self.texts.iter().any(|m| m.id == id)
            || self.attributes.iter().any(|m| m.id == id)
    }
}
