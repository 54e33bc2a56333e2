//! Roster records pushed by the call engine.

use crate::video::VideoChannelKind;
use common::types::PeerId;
use serde::{Deserialize, Serialize};

/// A named cluster of SSRCs, typically the simulcast layers of one track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SsrcGroup {
    /// Grouping semantics, e.g. `"SIM"` for simulcast or `"FID"` for RTX pairing.
    pub semantics: String,
    /// Source identifiers in the order the publisher declared them.
    pub ssrcs: Vec<u32>,
}

impl SsrcGroup {
    pub fn new(semantics: impl Into<String>, ssrcs: Vec<u32>) -> Self {
        Self {
            semantics: semantics.into(),
            ssrcs,
        }
    }
}

/// Description of a published camera or screen-share track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackDescription {
    /// Endpoint identifier, stable for as long as the track is active.
    pub endpoint_id: String,
    /// SSRC groups in publisher order.
    pub ssrc_groups: Vec<SsrcGroup>,
}

impl TrackDescription {
    pub fn new(endpoint_id: impl Into<String>, ssrc_groups: Vec<SsrcGroup>) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            ssrc_groups,
        }
    }

    /// Whether the engine can actually subscribe to this track.
    ///
    /// A description without SSRC groups carries nothing to subscribe to.
    #[must_use]
    pub fn is_subscribable(&self) -> bool {
        !self.ssrc_groups.is_empty()
    }

    /// Every SSRC across all groups, in group order.
    #[must_use]
    pub fn all_ssrcs(&self) -> Vec<u32> {
        self.ssrc_groups
            .iter()
            .flat_map(|group| group.ssrcs.iter().copied())
            .collect()
    }
}

/// Mute state of a remote participant as reported by the engine.
///
/// Absence of this value on a [`Participant`] means the participant is unmuted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantMuteState {
    /// Whether the participant may unmute themselves.
    pub can_unmute: bool,
    /// Whether the local user muted this participant for themselves only.
    pub muted_by_you: bool,
}

/// A remote call member.
///
/// Created and replaced wholesale on every roster update; the UI never
/// patches individual fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Peer identity. `None` until the engine has resolved the peer record.
    pub peer: Option<PeerId>,
    /// Audio source id. Video requests are correlated with audio through it.
    pub ssrc: Option<u32>,
    /// Camera track, if published.
    pub video_description: Option<TrackDescription>,
    /// Screen-share track, if published.
    pub presentation_description: Option<TrackDescription>,
    /// Audio source id of the screen-share audio, if any.
    pub presentation_ssrc: Option<u32>,
    /// `None` when unmuted.
    pub mute_state: Option<ParticipantMuteState>,
    /// Whether the participant is currently speaking.
    pub is_speaking: bool,
    /// Unix timestamp (seconds) of joining the call.
    pub joined_at: i32,
    /// Present while the hand is raised. Higher ratings were raised earlier.
    pub raise_hand_rating: Option<i64>,
    /// Playback volume in 1/100 percent (`10000` is 100%).
    pub volume: Option<i32>,
    /// Short bio shown in the roster.
    pub about: Option<String>,
}

impl Participant {
    /// Whether the participant is muted for everyone or for the local user.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.mute_state.is_some()
    }

    #[must_use]
    pub fn has_raised_hand(&self) -> bool {
        self.raise_hand_rating.is_some()
    }

    /// Track description of the given kind, if published.
    #[must_use]
    pub fn track(&self, kind: VideoChannelKind) -> Option<&TrackDescription> {
        match kind {
            VideoChannelKind::Camera => self.video_description.as_ref(),
            VideoChannelKind::Presentation => self.presentation_description.as_ref(),
        }
    }
}
