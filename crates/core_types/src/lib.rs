use serde::{Deserialize, Serialize};

/// Stable node identifier assigned at capture time.
pub type NodeId = i32;
/// Milliseconds, either absolute (recorded timestamps) or relative (delays).
pub type Millis = f64;

/// Sibling id used by old recordings when the sibling was not serialized.
pub const UNKNOWN_SIBLING: NodeId = -1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
}

/// Externally visible playback state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    #[default]
    Paused,
    Playing,
    Live,
    Interact,
}

impl PlayerState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Paused => "paused",
            PlayerState::Playing => "playing",
            PlayerState::Live => "live",
            PlayerState::Interact => "interact",
        }
    }
}
