//! Seams to the external call engine.
//!
//! The engine is opaque. The session consumes it through small capability
//! traits so a test double only implements the part it exercises, and the
//! engine pushes its updates as [`EngineEvent`]s on a channel.

use crate::errors::SessionError;
use async_trait::async_trait;
use call_model::{
    CallState, MembersPage, MembersSnapshot, MuteAction, NetworkState, Participant, PeerId,
    RequestedVideo,
};
use std::sync::Arc;

/// Fetches the next roster page for a continuation token.
#[async_trait]
pub trait MembersFetcher: Send + Sync {
    async fn fetch_members(&self, token: String) -> Result<MembersPage, SessionError>;
}

/// (Re)configures inbound video subscriptions.
#[async_trait]
pub trait MediaSubscriber: Send + Sync {
    /// Replace the current subscriptions with `videos`, in order.
    async fn configure_subscriptions(
        &self,
        videos: Vec<RequestedVideo>,
    ) -> Result<(), SessionError>;
}

/// Moderation and self-control requests forwarded to the engine.
#[async_trait]
pub trait CallModerator: Send + Sync {
    async fn set_mute_action(&self, action: MuteAction) -> Result<(), SessionError>;

    async fn set_peer_muted(&self, peer: PeerId, muted: bool) -> Result<(), SessionError>;

    async fn set_default_participants_muted(&self, muted: bool) -> Result<(), SessionError>;

    async fn set_raised_hand(&self, peer: PeerId, raised: bool) -> Result<(), SessionError>;

    async fn set_title(&self, title: String) -> Result<(), SessionError>;

    async fn set_schedule_subscription(&self, subscribed: bool) -> Result<(), SessionError>;
}

/// Device permission prompts, injected by the embedding application.
#[async_trait]
pub trait PermissionHandler: Send + Sync {
    /// Ask for microphone access. `true` if granted.
    async fn request_microphone(&self) -> bool;
}

/// Engine collaborators a session is built with.
#[derive(Clone)]
pub struct EngineServices {
    pub members: Arc<dyn MembersFetcher>,
    pub media: Arc<dyn MediaSubscriber>,
    pub moderator: Arc<dyn CallModerator>,
    pub permissions: Arc<dyn PermissionHandler>,
}

/// Update pushed by the engine.
///
/// `version` increases monotonically per update kind. `NetworkChanged`
/// shares the `State` sequence since it produces a new state snapshot.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A full call state snapshot.
    State { version: u64, state: CallState },
    /// A network phase change, applied onto the current state.
    NetworkChanged { version: u64, network: NetworkState },
    /// A fresh roster snapshot replacing the loaded one.
    Members {
        version: u64,
        snapshot: MembersSnapshot,
    },
    /// Raw participant records with full track descriptions.
    Participants {
        version: u64,
        participants: Vec<Participant>,
    },
}

impl EngineEvent {
    #[must_use]
    pub const fn version(&self) -> u64 {
        match self {
            EngineEvent::State { version, .. }
            | EngineEvent::NetworkChanged { version, .. }
            | EngineEvent::Members { version, .. }
            | EngineEvent::Participants { version, .. } => *version,
        }
    }

    /// Returns the update kind as a string for metric labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            EngineEvent::State { .. } => "state",
            EngineEvent::NetworkChanged { .. } => "network",
            EngineEvent::Members { .. } => "members",
            EngineEvent::Participants { .. } => "participants",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_version_and_kind() {
        let event = EngineEvent::NetworkChanged {
            version: 9,
            network: NetworkState::Connected,
        };
        assert_eq!(event.version(), 9);
        assert_eq!(event.kind(), "network");

        let event = EngineEvent::Members {
            version: 3,
            snapshot: MembersSnapshot::default(),
        };
        assert_eq!(event.version(), 3);
        assert_eq!(event.kind(), "members");
    }
}
