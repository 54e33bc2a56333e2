//! Call session actor for a live group call.
//!
//! A [`CallSession`] owns the client-side view of one call. The engine
//! pushes versioned [`EngineEvent`]s; the session applies them in order and
//! republishes whole snapshots through a [`CallSessionHandle`].
//!
//! # Architecture
//!
//! ```text
//! engine ──EngineEvent──▶ CallSession ──watch──▶ UI observers
//!    ▲                        │  ▲
//!    └── EngineServices ◀─────┘  └── SessionMessage ◀── CallSessionHandle
//! ```
//!
//! The handle implements four capability traits
//! ([`StateObservation`], [`MembershipControl`], [`MediaSubscriptionControl`],
//! [`ModerationActions`]) so callers depend only on what they use.

#![warn(clippy::pedantic)]

pub mod capabilities;
pub mod engine;
pub mod errors;
pub mod messages;
pub mod metrics;
pub mod session;

pub use capabilities::{
    MediaSubscriptionControl, MembershipControl, ModerationActions, StateObservation,
};
pub use engine::{
    CallModerator, EngineEvent, EngineServices, MediaSubscriber, MembersFetcher,
    PermissionHandler,
};
pub use errors::SessionError;
pub use messages::SessionStatus;
pub use session::{CallSession, CallSessionHandle, EngineEventSender};
