use core_types::{Millis, NodeId, PlayerState, Viewport};
use snapshot::MouseInteraction;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Lifecycle notifications produced by the replayer for UI/host consumers.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplayerSignal {
    Start,
    Pause,
    Resume,
    Finish,
    // Catch-up batch was applied to the tree
    Flush,
    Resize(Viewport),
    StateChange(PlayerState),
    FullCaptureRebuilt,
    EventCast {
        timestamp: Millis,
    },
    MouseInteraction {
        kind: MouseInteraction,
        id: NodeId,
    },
    LoadStylesheetStart,
    LoadStylesheetEnd,
}

/// Fan-out of [`ReplayerSignal`]s to every subscriber.
///
/// Delivery is fire-and-forget and preserves emission order per subscriber.
/// Subscribers whose receiver was dropped are pruned on the next emit.
#[derive(Default)]
pub struct Emitter {
    subscribers: Vec<Sender<ReplayerSignal>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<ReplayerSignal> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, signal: ReplayerSignal) {
        self.subscribers
            .retain(|tx| tx.send(signal.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
