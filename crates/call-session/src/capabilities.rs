//! Capability traits exposed to the UI layer.
//!
//! A call is split into four narrow capabilities rather than one large
//! interface. `CallSessionHandle` implements all of them; a view or a test
//! double depends only on the capability it uses.

use crate::errors::SessionError;
use async_trait::async_trait;
use call_model::{
    CallState, CallSummary, MemberEvent, MembersSnapshot, MuteAction, PeerId, RequestedVideo,
    VideoSelection,
};
use tokio::sync::{broadcast, watch};

/// Read-only, monotonically ordered snapshots of one call.
pub trait StateObservation: Send + Sync {
    fn state(&self) -> watch::Receiver<CallState>;

    fn members(&self) -> watch::Receiver<MembersSnapshot>;

    fn summary(&self) -> watch::Receiver<CallSummary>;

    /// Latest accepted local mute request. Use
    /// [`MuteAction::is_effectively_muted`] on each read.
    fn mute_action(&self) -> watch::Receiver<MuteAction>;

    /// Joins, leaves and speaking changes derived from engine roster updates.
    fn member_events(&self) -> broadcast::Receiver<MemberEvent>;
}

/// Roster pagination.
#[async_trait]
pub trait MembershipControl: Send + Sync {
    /// Load the next roster page and return the merged snapshot.
    ///
    /// Fails with `LoadMoreInProgress` while another page is loading and
    /// with `RosterComplete` once no continuation token is left.
    async fn load_more(&self) -> Result<MembersSnapshot, SessionError>;
}

/// Inbound video subscriptions.
#[async_trait]
pub trait MediaSubscriptionControl: Send + Sync {
    /// Subscribe to exactly `videos`, in order.
    async fn set_requested_videos(&self, videos: Vec<RequestedVideo>) -> Result<(), SessionError>;

    /// Build requests for `selections` from the latest participant records,
    /// subscribe to them, and return what was requested.
    async fn request_videos(
        &self,
        selections: Vec<VideoSelection>,
    ) -> Result<Vec<RequestedVideo>, SessionError>;
}

/// Self-control and moderation.
#[async_trait]
pub trait ModerationActions: Send + Sync {
    /// Opening the microphone asks the permission handler first.
    async fn set_mute_action(&self, action: MuteAction) -> Result<(), SessionError>;

    async fn set_peer_muted(&self, peer: PeerId, muted: bool) -> Result<(), SessionError>;

    async fn set_default_participants_muted(&self, muted: bool) -> Result<(), SessionError>;

    async fn raise_hand(&self) -> Result<(), SessionError>;

    async fn lower_hand(&self, peer: PeerId) -> Result<(), SessionError>;

    async fn set_title(&self, title: String) -> Result<(), SessionError>;

    /// Returns the new subscription flag.
    async fn toggle_schedule_subscription(&self) -> Result<bool, SessionError>;
}
