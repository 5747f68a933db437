//! Data model of a recorded page session.
//!
//! Everything in this crate is plain data owned by the recorded event stream.
//! The replay engine consumes it; nothing here touches a live tree.

mod event;
mod mutation;
mod node;

pub use crate::event::{
    Event, EventWithTime, FullCapture, IncrementalData, IncrementalSource, InputData,
    MediaInteraction, MediaInteractionData, MetaData, MouseInteraction, MouseInteractionData,
    MousePosition, ScrollData, SelectionValue, StyleRuleAdd, StyleRuleDelete,
    StyleSheetRuleData, TextSelectionData,
};
pub use crate::mutation::{
    AddedNode, AttributeMutation, MutationBatch, RemovedNode, TextMutation,
};
pub use crate::node::{
    AttributeValue, EMBED_CONTAINER_TAG, NodeKind, RESERVED_ATTRIBUTE_PREFIX, SerializedNode,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed recording: {0}")]
    Json(#[from] serde_json::Error),
    #[error("recording contains no events")]
    Empty,
}

/// Parse a recorded session from its JSON form.
///
/// Events are returned in recorded order; no sorting is performed.
pub fn parse_events(data: &[u8]) -> Result<Vec<EventWithTime>, ParseError> {
    let events: Vec<EventWithTime> = serde_json::from_slice(data)?;
    if events.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(events)
}

pub fn to_json(events: &[EventWithTime]) -> Result<String, ParseError> {
    Ok(serde_json::to_string(events)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"[
        { "timestamp": 0, "type": "meta", "data": { "href": "https://a.test", "width": 800, "height": 600 } },
        { "timestamp": 0, "type": "fullCapture", "data": {
            "node": { "nodeId": 1, "type": "document", "children": [
                { "nodeId": 2, "type": "element", "tagName": "html", "children": [] }
            ] },
            "initialOffset": { "top": 10, "left": 0 }
        } },
        { "timestamp": 120, "type": "incrementalCapture", "data": {
            "source": "mouseMove",
            "positions": [ { "x": 1, "y": 2, "id": 2, "timeOffset": -40 } ]
        } },
        { "timestamp": 150, "type": "incrementalCapture", "data": {
            "source": "mutation",
            "adds": [ { "parentId": 2, "nextId": null, "node": { "nodeId": 3, "type": "text", "content": "hi" } } ]
        } }
    ]"#;

    #[test]
    fn parses_recorded_session() {
        let events = parse_events(SESSION.as_bytes()).expect("session parses");
        assert_eq!(events.len(), 4);
        assert!(events[0].is_meta());
        let Event::FullCapture(full) = &events[1].event else {
            panic!("expected full capture");
        };
        assert_eq!(full.initial_offset.top, 10.0);
        assert_eq!(full.node.children().len(), 1);
        assert_eq!(events[2].source(), Some(IncrementalSource::MouseMove));
        let Some(IncrementalData::Mutation(batch)) = events[3].incremental() else {
            panic!("expected mutation");
        };
        assert_eq!(batch.adds[0].id(), 3);
        assert!(batch.removes.is_empty());
    }

    #[test]
    fn mouse_move_uses_first_sample_timestamp() {
        let events = parse_events(SESSION.as_bytes()).expect("session parses");
        assert_eq!(events[2].effective_timestamp(), 80.0);
        assert_eq!(events[2].delay_from(50.0), 30.0);
        assert_eq!(events[3].effective_timestamp(), 150.0);
    }

    #[test]
    fn sync_classification_drops_transient_sources() {
        let events = parse_events(SESSION.as_bytes()).expect("session parses");
        assert!(events[0].must_replay_in_sync());
        assert!(events[1].must_replay_in_sync());
        assert!(!events[2].must_replay_in_sync());
        assert!(events[3].must_replay_in_sync());
    }

    #[test]
    fn empty_recording_is_rejected() {
        assert!(matches!(parse_events(b"[]"), Err(ParseError::Empty)));
    }
}
