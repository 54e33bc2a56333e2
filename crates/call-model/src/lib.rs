//! Value model for a live group voice/video call.
//!
//! This crate holds the immutable snapshots a call engine pushes to the UI
//! layer and the pure derivations built on top of them:
//!
//! - [`participant`] - roster records and their track descriptions
//! - [`video`] - quality ranges and requested-video extraction
//! - [`state`] - call control state snapshots
//! - [`members`] - paginated roster snapshots, page merging and member events
//! - [`mute`] - local mute requests with push-to-talk override
//! - [`summary`] - compact "call in progress" view
//! - [`codec`] - JSON encoding for transient persistence
//!
//! Nothing here performs I/O, blocks or keeps internal locks. Every value is
//! replaced wholesale when the engine reports a change.

#![warn(clippy::pedantic)]

pub mod codec;
pub mod error;
pub mod members;
pub mod mute;
pub mod participant;
pub mod state;
pub mod summary;
pub mod video;

pub use error::ModelError;
pub use members::{MemberEvent, MembersPage, MembersSnapshot};
pub use mute::MuteAction;
pub use participant::{Participant, ParticipantMuteState, SsrcGroup, TrackDescription};
pub use state::{
    CallState, DefaultMutePolicy, MuteState, NetworkState, NetworkTransition, ScheduleState,
    VideoSourceAvailability,
};
pub use summary::CallSummary;
pub use video::{
    collect_requested_videos, requested_video, QualityRange, RequestedVideo, VideoChannelKind,
    VideoQuality, VideoSelection,
};

pub use common::types::{PeerId, PeerNamespace};
