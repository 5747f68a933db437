use core_types::{Millis, NodeId, ScrollOffset};
use snapshot::{
    AddedNode, AttributeMutation, AttributeValue, Event, EventWithTime, FullCapture,
    IncrementalData, InputData, MediaInteraction, MediaInteractionData, MetaData,
    MouseInteraction, MouseInteractionData, MousePosition, MutationBatch, NodeKind, RemovedNode,
    ScrollData, SelectionValue, SerializedNode, StyleRuleAdd, StyleRuleDelete,
    StyleSheetRuleData, TextMutation, TextSelectionData,
};
use std::collections::BTreeMap;

// nodes

pub fn document(id: NodeId, children: Vec<SerializedNode>) -> SerializedNode {
    node(id, NodeKind::Document { children })
}

pub fn doctype(id: NodeId, name: &str) -> SerializedNode {
    node(
        id,
        NodeKind::DocumentType {
            name: name.to_string(),
            public_id: String::new(),
            system_id: String::new(),
        },
    )
}

pub fn element(id: NodeId, tag: &str, children: Vec<SerializedNode>) -> SerializedNode {
    element_with(id, tag, &[], children)
}

pub fn element_with(
    id: NodeId,
    tag: &str,
    attributes: &[(&str, AttributeValue)],
    children: Vec<SerializedNode>,
) -> SerializedNode {
    node(
        id,
        NodeKind::Element {
            tag_name: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            children,
        },
    )
}

pub fn text(id: NodeId, content: &str) -> SerializedNode {
    node(
        id,
        NodeKind::Text {
            content: content.to_string(),
            is_style_rule: false,
        },
    )
}

pub fn style_text(id: NodeId, css: &str) -> SerializedNode {
    node(
        id,
        NodeKind::Text {
            content: css.to_string(),
            is_style_rule: true,
        },
    )
}

fn node(id: NodeId, kind: NodeKind) -> SerializedNode {
    SerializedNode {
        node_id: id,
        origin_id: None,
        kind,
    }
}

/// `#document(1) > html(2) > [head(3), body(4)]`
pub fn basic_page() -> SerializedNode {
    document(
        1,
        vec![
            doctype(5, "html"),
            element(2, "html", vec![element(3, "head", vec![]), element(4, "body", vec![])]),
        ],
    )
}

pub const BODY: NodeId = 4;
pub const HEAD: NodeId = 3;

// mutations

pub fn add(parent: NodeId, next: Option<NodeId>, node: SerializedNode) -> AddedNode {
    AddedNode {
        parent_id: parent,
        previous_id: None,
        next_id: next,
        node,
    }
}

pub fn add_between(
    parent: NodeId,
    previous: Option<NodeId>,
    next: Option<NodeId>,
    node: SerializedNode,
) -> AddedNode {
    AddedNode {
        parent_id: parent,
        previous_id: previous,
        next_id: next,
        node,
    }
}

pub fn remove(parent: NodeId, id: NodeId) -> RemovedNode {
    RemovedNode { parent_id: parent, id }
}

pub fn set_text(id: NodeId, value: &str) -> TextMutation {
    TextMutation {
        id,
        value: Some(value.to_string()),
    }
}

pub fn set_attr(id: NodeId, name: &str, value: Option<&str>) -> AttributeMutation {
    let mut attributes = BTreeMap::new();
    attributes.insert(name.to_string(), value.map(str::to_string));
    AttributeMutation { id, attributes }
}

pub fn adds(items: Vec<AddedNode>) -> MutationBatch {
    MutationBatch {
        adds: items,
        ..MutationBatch::default()
    }
}

pub fn removes(items: Vec<RemovedNode>) -> MutationBatch {
    MutationBatch {
        removes: items,
        ..MutationBatch::default()
    }
}

// events

pub fn meta(ts: Millis, width: u32, height: u32) -> EventWithTime {
    EventWithTime::new(
        ts,
        Event::Meta(MetaData {
            href: "http://localhost/".to_string(),
            width,
            height,
        }),
    )
}

pub fn full(ts: Millis, node: SerializedNode) -> EventWithTime {
    EventWithTime::new(
        ts,
        Event::FullCapture(FullCapture {
            node,
            initial_offset: ScrollOffset::default(),
        }),
    )
}

pub fn incremental(ts: Millis, data: IncrementalData) -> EventWithTime {
    EventWithTime::new(ts, Event::IncrementalCapture(data))
}

pub fn mutation(ts: Millis, batch: MutationBatch) -> EventWithTime {
    incremental(ts, IncrementalData::Mutation(batch))
}

pub fn scroll(ts: Millis, id: NodeId, x: f64, y: f64) -> EventWithTime {
    incremental(ts, IncrementalData::Scroll(ScrollData { id, x, y }))
}

pub fn input(ts: Millis, id: NodeId, value: &str, checked: bool) -> EventWithTime {
    incremental(
        ts,
        IncrementalData::Input(InputData {
            id,
            text: value.to_string(),
            is_checked: checked,
        }),
    )
}

/// Samples are `(x, y, target, time_offset)`.
pub fn mouse_move(ts: Millis, samples: &[(f64, f64, NodeId, Millis)]) -> EventWithTime {
    incremental(
        ts,
        IncrementalData::MouseMove {
            positions: samples
                .iter()
                .map(|&(x, y, id, time_offset)| MousePosition {
                    x,
                    y,
                    id,
                    time_offset,
                })
                .collect(),
        },
    )
}

pub fn interaction(ts: Millis, kind: MouseInteraction, id: NodeId) -> EventWithTime {
    incremental(
        ts,
        IncrementalData::MouseInteraction(MouseInteractionData {
            kind,
            id,
            x: 10.0,
            y: 20.0,
        }),
    )
}

pub fn media(ts: Millis, kind: MediaInteraction, id: NodeId) -> EventWithTime {
    incremental(
        ts,
        IncrementalData::MediaInteraction(MediaInteractionData { kind, id }),
    )
}

pub fn style_rules(
    ts: Millis,
    id: NodeId,
    add: &[(&str, Option<usize>)],
    delete: &[usize],
) -> EventWithTime {
    incremental(
        ts,
        IncrementalData::StyleSheetRule(StyleSheetRuleData {
            id,
            adds: add
                .iter()
                .map(|(rule, index)| StyleRuleAdd {
                    rule: rule.to_string(),
                    index: *index,
                })
                .collect(),
            removes: delete
                .iter()
                .map(|index| StyleRuleDelete { index: *index })
                .collect(),
        }),
    )
}

pub fn selection(ts: Millis, anchor: (NodeId, i64), focus: (NodeId, i64)) -> EventWithTime {
    incremental(
        ts,
        IncrementalData::TextSelection(TextSelectionData {
            selection: SelectionValue {
                anchor_id: anchor.0,
                anchor_offset: anchor.1,
                focus_id: focus.0,
                focus_offset: focus.1,
            },
        }),
    )
}
