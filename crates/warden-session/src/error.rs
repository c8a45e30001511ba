//! Error types for the `warden-session` crate.

use warden_types::ActorId;

/// Errors reported by the host's world mutation surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The actor is no longer connected.
    #[error("actor {0} is not online")]
    ActorGone(ActorId),

    /// The host refused the mutation.
    #[error("host rejected change for actor {actor}: {reason}")]
    Rejected {
        /// The actor being changed.
        actor: ActorId,
        /// Why the host refused.
        reason: String,
    },
}

/// Errors raised by a handler while reacting to a tick or a crossing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// A world mutation failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The handler could not complete for another reason.
    #[error("{handler}: {reason}")]
    Failed {
        /// Name of the failing handler.
        handler: &'static str,
        /// What went wrong.
        reason: String,
    },
}

/// Errors returned by sessions and the session manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Sessions can only be created on the thread the manager is bound to.
    #[error("sessions can only be created on the main thread")]
    OffMainThread,

    /// The host does not know the actor (disconnected or never joined).
    #[error("actor {0} is not online")]
    ActorOffline(ActorId),

    /// A handler failed while the session was being initialized.
    #[error("handler {handler} failed to initialize for {actor}: {source}")]
    Initialize {
        /// The actor whose session was being built.
        actor: ActorId,
        /// The failing handler.
        handler: &'static str,
        /// The handler's error.
        source: HandlerError,
    },

    /// A previous dispatch panicked while holding the session lock.
    #[error("session for {0} is poisoned")]
    Poisoned(ActorId),
}
