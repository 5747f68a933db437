use core_types::NodeId;
use sink::SinkError;
use thiserror::Error;

/// Per-mutation failures. None of these abort a batch; they are logged at the
/// point of failure and the next mutation proceeds.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ReplayError {
    #[error("[replayer] target with id '{id}' not found")]
    ReferenceNotFound { id: NodeId },
    #[error("[replayer] {count} insertion(s) could not be resolved and were dropped")]
    UnresolvableInsertion { count: usize },
    #[error("[replayer] sink rejected operation: {0}")]
    SinkRejection(#[from] SinkError),
    #[error("[replayer] looks like the replayer has been destroyed")]
    EngineDestroyed,
}

impl ReplayError {
    /// Sink refusals caused by teardown are reported as engine destruction.
    pub fn from_sink(err: SinkError) -> Self {
        match err {
            SinkError::Destroyed => ReplayError::EngineDestroyed,
            other => ReplayError::SinkRejection(other),
        }
    }
}

/// Log a per-mutation failure. Missing references are only loud when asked.
pub(crate) fn report(target: &str, err: &ReplayError, loud: bool) {
    match err {
        ReplayError::ReferenceNotFound { .. } if !loud => log::debug!(target: target, "{err}"),
        ReplayError::UnresolvableInsertion { .. } => log::debug!(target: target, "{err}"),
        _ => log::warn!(target: target, "{err}"),
    }
}
