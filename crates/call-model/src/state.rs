//! Call control state snapshots.
//!
//! A [`CallState`] is the full control view of one call at one point in
//! time. The engine replaces it wholesale on every tick; the UI diffs
//! consecutive snapshots and never patches fields in place.

use chrono::{DateTime, TimeZone, Utc};
use common::types::PeerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Network phase of the call.
///
/// Both phases are steady states the engine may report repeatedly. There is
/// no terminal phase: teardown is signalled by the owning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    Connecting,
    Connected,
}

/// Classification of a reported network phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkTransition {
    /// `Connecting -> Connected`.
    Established,
    /// `Connected -> Connecting`, i.e. the engine is reconnecting.
    Reconnecting,
    /// Same phase reported again.
    Unchanged,
}

impl NetworkState {
    /// Classify the move from `self` to `next`.
    #[must_use]
    pub const fn transition(self, next: NetworkState) -> NetworkTransition {
        match (self, next) {
            (NetworkState::Connecting, NetworkState::Connected) => NetworkTransition::Established,
            (NetworkState::Connected, NetworkState::Connecting) => NetworkTransition::Reconnecting,
            _ => NetworkTransition::Unchanged,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            NetworkState::Connecting => "connecting",
            NetworkState::Connected => "connected",
        }
    }
}

/// Local mute state imposed by the call. Absent means unmuted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MuteState {
    /// Whether the local user may unmute on their own.
    pub can_unmute: bool,
    /// Whether the mute was set by the local user.
    pub muted_by_you: bool,
}

/// Mute policy applied to new joiners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DefaultMutePolicy {
    /// New participants join muted.
    pub is_muted: bool,
    /// Whether the local user may change the policy.
    pub can_change: bool,
}

/// Which local video sources are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VideoSourceAvailability {
    /// A camera source is present.
    pub camera: bool,
    /// A screencast source is present.
    pub screencast: bool,
    /// Source enumeration failed.
    pub failed: bool,
}

impl VideoSourceAvailability {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.camera || self.screencast
    }
}

/// Derived view of a scheduled call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleState {
    /// Unix timestamp (seconds) the call is scheduled to start.
    pub date: i32,
    /// Whether the local user asked to be notified at start.
    pub subscribed: bool,
}

/// Full control state of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallState {
    /// The local participant.
    pub my_peer_id: PeerId,
    pub network_state: NetworkState,
    /// Whether the local user may manage the call (title, recording, muting others).
    pub can_manage_call: bool,
    /// Peers with administrative rights.
    pub admin_ids: BTreeSet<PeerId>,
    /// Local mute state. `None` when unmuted.
    pub mute_state: Option<MuteState>,
    pub default_participant_mute_state: DefaultMutePolicy,
    /// Unix timestamp (seconds) recording started, if recording.
    pub recording_start_timestamp: Option<i32>,
    pub title: Option<String>,
    pub raised_hand: bool,
    /// Unix timestamp (seconds) the call is scheduled to start.
    pub schedule_timestamp: Option<i32>,
    pub subscribed_to_scheduled: bool,
    pub is_video_enabled: bool,
    /// Maximum number of concurrently unmuted video senders, `0` if unlimited.
    pub unmuted_video_limit: u32,
    pub is_stream: bool,
    pub is_channel: bool,
    pub is_conference: bool,
    pub video_sources: VideoSourceAvailability,
}

impl CallState {
    /// Initial snapshot for a call that is still connecting.
    #[must_use]
    pub fn new(my_peer_id: PeerId) -> Self {
        Self {
            my_peer_id,
            network_state: NetworkState::Connecting,
            can_manage_call: false,
            admin_ids: BTreeSet::new(),
            mute_state: None,
            default_participant_mute_state: DefaultMutePolicy::default(),
            recording_start_timestamp: None,
            title: None,
            raised_hand: false,
            schedule_timestamp: None,
            subscribed_to_scheduled: false,
            is_video_enabled: false,
            unmuted_video_limit: 0,
            is_stream: false,
            is_channel: false,
            is_conference: false,
            video_sources: VideoSourceAvailability::default(),
        }
    }

    /// Schedule view, present exactly when `schedule_timestamp` is set.
    ///
    /// Derived on every read from the stored fields.
    #[must_use]
    pub fn schedule_state(&self) -> Option<ScheduleState> {
        self.schedule_timestamp.map(|date| ScheduleState {
            date,
            subscribed: self.subscribed_to_scheduled,
        })
    }

    /// Whether `peer` has administrative rights in this call.
    ///
    /// The local peer is also an admin when the call grants it management rights.
    #[must_use]
    pub fn is_admin(&self, peer: &PeerId) -> bool {
        self.admin_ids.contains(peer) || (self.can_manage_call && *peer == self.my_peer_id)
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording_start_timestamp.is_some()
    }

    /// Whether the local user may unmute without asking an admin.
    #[must_use]
    pub fn can_self_unmute(&self) -> bool {
        self.mute_state.map_or(true, |state| state.can_unmute)
    }

    #[must_use]
    pub fn recording_started_at(&self) -> Option<DateTime<Utc>> {
        self.recording_start_timestamp.and_then(unix_seconds)
    }

    #[must_use]
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.schedule_timestamp.and_then(unix_seconds)
    }
}

fn unix_seconds(timestamp: i32) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(i64::from(timestamp), 0).single()
}
