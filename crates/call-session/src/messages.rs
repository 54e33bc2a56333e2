//! Message types for the session actor.
//!
//! Commands from handles arrive over `tokio::sync::mpsc`; each carries a
//! `tokio::sync::oneshot` sender for the reply.

use crate::errors::SessionError;
use call_model::{MembersPage, MembersSnapshot, MuteAction, PeerId, RequestedVideo, VideoSelection};
use tokio::sync::oneshot;

/// Reply channel for a command.
pub type Responder<T> = oneshot::Sender<Result<T, SessionError>>;

/// Messages sent to the `CallSession` actor.
#[derive(Debug)]
pub enum SessionMessage {
    /// Fetch the next roster page and merge it into the loaded roster.
    LoadMore {
        respond_to: Responder<MembersSnapshot>,
    },

    /// Replace inbound video subscriptions with an explicit list.
    /// Replies with the list the engine accepted.
    SetRequestedVideos {
        videos: Vec<RequestedVideo>,
        respond_to: Responder<Vec<RequestedVideo>>,
    },

    /// Build requests from selections against the latest participants, then
    /// subscribe to them.
    RequestVideos {
        selections: Vec<VideoSelection>,
        respond_to: Responder<Vec<RequestedVideo>>,
    },

    /// Change the local mute request.
    SetMuteAction {
        action: MuteAction,
        respond_to: Responder<()>,
    },

    /// Admin: mute or unmute another participant.
    SetPeerMuted {
        peer: PeerId,
        muted: bool,
        respond_to: Responder<()>,
    },

    /// Admin: change whether new joiners start muted.
    SetDefaultParticipantsMuted {
        muted: bool,
        respond_to: Responder<()>,
    },

    /// Raise the local participant's hand.
    RaiseHand { respond_to: Responder<()> },

    /// Lower a hand. Lowering someone else's hand needs admin rights.
    LowerHand {
        peer: PeerId,
        respond_to: Responder<()>,
    },

    /// Admin: rename the call.
    SetTitle {
        title: String,
        respond_to: Responder<()>,
    },

    /// Flip the start notification for a scheduled call.
    /// Replies with the new subscription flag.
    ToggleScheduleSubscription { respond_to: Responder<bool> },

    /// Diagnostic view of the session.
    GetStatus {
        respond_to: oneshot::Sender<SessionStatus>,
    },
}

/// Result of engine work run off the actor, fed back into the actor mailbox.
#[derive(Debug)]
pub(crate) enum Completion {
    /// A roster page fetch finished.
    LoadMore {
        /// Token the page was requested with.
        token: String,
        result: Result<MembersPage, SessionError>,
        respond_to: Responder<MembersSnapshot>,
    },

    /// The permission handler answered a microphone prompt.
    MicrophoneDecision {
        action: MuteAction,
        /// Mute request sequence number the prompt was opened for.
        seq: u64,
        granted: bool,
        respond_to: Responder<()>,
    },

    /// The engine answered a mute request.
    MuteActionApplied {
        action: MuteAction,
        seq: u64,
        result: Result<(), SessionError>,
        respond_to: Responder<()>,
    },

    /// The engine answered a subscription change.
    SubscriptionsConfigured {
        videos: Vec<RequestedVideo>,
        seq: u64,
        result: Result<(), SessionError>,
        respond_to: Responder<Vec<RequestedVideo>>,
    },

    /// The engine answered a schedule subscription change.
    ScheduleSubscription {
        subscribed: bool,
        result: Result<(), SessionError>,
        respond_to: Responder<bool>,
    },

    /// A moderation request with no local state attached.
    Forwarded {
        command: &'static str,
        result: Result<(), SessionError>,
        respond_to: Responder<()>,
    },
}

/// Session diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub last_state_version: Option<u64>,
    pub last_members_version: Option<u64>,
    pub last_participants_version: Option<u64>,
    pub load_more_in_flight: bool,
    /// Engine calls and permission prompts still running.
    pub pending_commands: usize,
    pub requested_videos: usize,
    pub engine_connected: bool,
}
