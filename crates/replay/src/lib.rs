//! Session replay engine.
//!
//! Rebuilds a recorded page into a [`sink::TreeSink`] and keeps it in step with
//! the recorded mutation stream. Seeking collapses every mutation it crosses
//! into one batch ([`TreeIndex`]) that is applied out of view, while forward
//! playback releases events on a wall-clock timeline
//! ([`ActionTimelineScheduler`]) driven by the host's frame callback.
//!
//! The entry point is [`Replayer`].

mod apply;
mod builder;
mod clock;
mod config;
mod error;
mod identity;
mod machine;
mod player;
mod resolve;
mod scheduler;
mod tree_index;

pub use crate::apply::{ApplyReport, MutationApplier};
pub use crate::builder::{Built, PendingEmbed, TreeBuilder};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{ConfigError, ReplayConfig};
pub use crate::error::ReplayError;
pub use crate::identity::IdentityMap;
pub use crate::machine::{
    Effect, MachineEvent, PlaybackPlan, ReplayContext, ReplayMachine, ScheduledCast,
    needed_events_start, plan_playback, transition,
};
pub use crate::player::{Action, PlayerMetadata, Replayer};
pub use crate::resolve::{MutationResolver, Placement, Placer, ResolveForest, ResolveStats};
pub use crate::scheduler::{ActionTimelineScheduler, ScheduledAction};
pub use crate::tree_index::{FlushedBatch, TreeIndex};

pub use bus::ReplayerSignal;
pub use core_types::PlayerState;
