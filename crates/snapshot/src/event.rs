//! Timestamped events of a recorded session.

use crate::mutation::MutationBatch;
use crate::node::SerializedNode;
use core_types::{Millis, NodeId, ScrollOffset, Viewport};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventWithTime {
    /// Absolute capture time in milliseconds.
    pub timestamp: Millis,
    #[serde(flatten)]
    pub event: Event,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Event {
    Meta(MetaData),
    FullCapture(FullCapture),
    IncrementalCapture(IncrementalData),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    #[serde(default)]
    pub href: String,
    pub width: u32,
    pub height: u32,
}

impl MetaData {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCapture {
    pub node: SerializedNode,
    #[serde(default)]
    pub initial_offset: ScrollOffset,
}

/// Kind of incremental capture, used to classify events without matching payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IncrementalSource {
    Mutation,
    MouseMove,
    MouseInteraction,
    Scroll,
    ViewportResize,
    Input,
    TouchMove,
    MediaInteraction,
    StyleSheetRule,
    TextSelection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum IncrementalData {
    Mutation(MutationBatch),
    MouseMove { positions: Vec<MousePosition> },
    TouchMove { positions: Vec<MousePosition> },
    MouseInteraction(MouseInteractionData),
    Scroll(ScrollData),
    ViewportResize(Viewport),
    Input(InputData),
    MediaInteraction(MediaInteractionData),
    StyleSheetRule(StyleSheetRuleData),
    TextSelection(TextSelectionData),
}

impl IncrementalData {
    pub fn source(&self) -> IncrementalSource {
        match self {
            IncrementalData::Mutation(_) => IncrementalSource::Mutation,
            IncrementalData::MouseMove { .. } => IncrementalSource::MouseMove,
            IncrementalData::TouchMove { .. } => IncrementalSource::TouchMove,
            IncrementalData::MouseInteraction(_) => IncrementalSource::MouseInteraction,
            IncrementalData::Scroll(_) => IncrementalSource::Scroll,
            IncrementalData::ViewportResize(_) => IncrementalSource::ViewportResize,
            IncrementalData::Input(_) => IncrementalSource::Input,
            IncrementalData::MediaInteraction(_) => IncrementalSource::MediaInteraction,
            IncrementalData::StyleSheetRule(_) => IncrementalSource::StyleSheetRule,
            IncrementalData::TextSelection(_) => IncrementalSource::TextSelection,
        }
    }

    /// Pointer samples for move batches, `None` for every other source.
    pub fn positions(&self) -> Option<&[MousePosition]> {
        match self {
            IncrementalData::MouseMove { positions } | IncrementalData::TouchMove { positions } => {
                Some(positions)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MousePosition {
    pub x: f64,
    pub y: f64,
    pub id: NodeId,
    /// Offset to the batch timestamp; recorders throttle samples so this is <= 0.
    pub time_offset: Millis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseInteraction {
    MouseUp,
    MouseDown,
    Click,
    ContextMenu,
    DblClick,
    Focus,
    Blur,
    TouchStart,
    TouchMoveDeparted,
    TouchEnd,
}

impl MouseInteraction {
    /// Interactions rendered as a click pulse on the pointer rather than dispatched.
    pub fn is_click_like(self) -> bool {
        matches!(
            self,
            MouseInteraction::Click | MouseInteraction::TouchStart | MouseInteraction::TouchEnd
        )
    }

    pub fn event_name(self) -> &'static str {
        match self {
            MouseInteraction::MouseUp => "mouseup",
            MouseInteraction::MouseDown => "mousedown",
            MouseInteraction::Click => "click",
            MouseInteraction::ContextMenu => "contextmenu",
            MouseInteraction::DblClick => "dblclick",
            MouseInteraction::Focus => "focus",
            MouseInteraction::Blur => "blur",
            MouseInteraction::TouchStart => "touchstart",
            MouseInteraction::TouchMoveDeparted => "touchmove_departed",
            MouseInteraction::TouchEnd => "touchend",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MouseInteractionData {
    #[serde(rename = "type")]
    pub kind: MouseInteraction,
    pub id: NodeId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollData {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    pub id: NodeId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_checked: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaInteraction {
    Play,
    Pause,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInteractionData {
    #[serde(rename = "type")]
    pub kind: MediaInteraction,
    pub id: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRuleAdd {
    pub rule: String,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRuleDelete {
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheetRuleData {
    pub id: NodeId,
    #[serde(default)]
    pub adds: Vec<StyleRuleAdd>,
    #[serde(default)]
    pub removes: Vec<StyleRuleDelete>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionValue {
    pub anchor_id: NodeId,
    pub anchor_offset: i64,
    pub focus_id: NodeId,
    pub focus_offset: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelectionData {
    pub selection: SelectionValue,
}

impl EventWithTime {
    pub fn new(timestamp: Millis, event: Event) -> Self {
        Self { timestamp, event }
    }

    pub fn incremental(&self) -> Option<&IncrementalData> {
        match &self.event {
            Event::IncrementalCapture(data) => Some(data),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<IncrementalSource> {
        self.incremental().map(IncrementalData::source)
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.event, Event::Meta(_))
    }

    /// Timestamp the event actually started at.
    ///
    /// Pointer move batches are flushed by a throttle, so their first sample is
    /// earlier than the batch timestamp.
    pub fn effective_timestamp(&self) -> Millis {
        match self.incremental().and_then(IncrementalData::positions) {
            Some([first, ..]) => self.timestamp + first.time_offset,
            _ => self.timestamp,
        }
    }

    /// Delay of this event relative to a playback baseline.
    pub fn delay_from(&self, baseline: Millis) -> Millis {
        self.effective_timestamp() - baseline
    }

    /// Whether the event changes position or visual state and therefore must be
    /// applied when a seek skips past it.
    pub fn must_replay_in_sync(&self) -> bool {
        match self.source() {
            None => true,
            Some(
                IncrementalSource::MouseMove
                | IncrementalSource::MouseInteraction
                | IncrementalSource::TouchMove
                | IncrementalSource::MediaInteraction,
            ) => false,
            Some(_) => true,
        }
    }
}
