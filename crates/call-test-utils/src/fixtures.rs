//! Pre-configured test data fixtures for call session testing.
//!
//! Provides builders for:
//! - Participants with camera and screen-share tracks
//! - Roster pages
//! - Call state snapshots with various rights

use call_model::{
    CallState, DefaultMutePolicy, MembersPage, MembersSnapshot, MuteState, NetworkState,
    Participant, ParticipantMuteState, PeerId, SsrcGroup, TrackDescription,
};
use std::collections::BTreeSet;

/// Test participant fixture.
///
/// A user peer with audio SSRC `id * 100` and no tracks until added.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    participant: Participant,
}

impl TestParticipant {
    /// Create a participant for user `id`.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            participant: Participant {
                peer: Some(PeerId::user(id)),
                ssrc: u32::try_from(id * 100).ok(),
                ..Participant::default()
            },
        }
    }

    /// Create a participant whose peer record is not resolved yet.
    #[must_use]
    pub fn unresolved(ssrc: u32) -> Self {
        Self {
            participant: Participant {
                ssrc: Some(ssrc),
                ..Participant::default()
            },
        }
    }

    /// Publish a camera track with one simulcast group.
    #[must_use]
    pub fn with_camera(mut self, endpoint_id: &str, ssrcs: Vec<u32>) -> Self {
        self.participant.video_description = Some(TrackDescription::new(
            endpoint_id,
            vec![SsrcGroup::new("SIM", ssrcs)],
        ));
        self
    }

    /// Publish a screen-share track with one simulcast group.
    #[must_use]
    pub fn with_presentation(mut self, endpoint_id: &str, ssrcs: Vec<u32>) -> Self {
        self.participant.presentation_description = Some(TrackDescription::new(
            endpoint_id,
            vec![SsrcGroup::new("SIM", ssrcs)],
        ));
        self
    }

    /// Drop the audio SSRC.
    #[must_use]
    pub fn without_ssrc(mut self) -> Self {
        self.participant.ssrc = None;
        self
    }

    #[must_use]
    pub fn speaking(mut self) -> Self {
        self.participant.is_speaking = true;
        self
    }

    /// Muted by an admin.
    #[must_use]
    pub fn muted(mut self) -> Self {
        self.participant.mute_state = Some(ParticipantMuteState {
            can_unmute: false,
            muted_by_you: false,
        });
        self
    }

    #[must_use]
    pub fn with_raised_hand(mut self, rating: i64) -> Self {
        self.participant.raise_hand_rating = Some(rating);
        self
    }

    #[must_use]
    pub fn build(self) -> Participant {
        self.participant
    }
}

/// Test roster page fixture.
#[derive(Debug, Clone)]
pub struct TestPage {
    page: MembersPage,
}

impl TestPage {
    /// A page with `participants`, a total equal to their count and no
    /// continuation token.
    #[must_use]
    pub fn new(participants: Vec<Participant>) -> Self {
        let total_count = participants.len();
        Self {
            page: MembersPage {
                participants,
                speaking_peers: BTreeSet::new(),
                total_count,
                load_more_token: None,
            },
        }
    }

    #[must_use]
    pub fn with_total(mut self, total_count: usize) -> Self {
        self.page.total_count = total_count;
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.page.load_more_token = Some(token.to_string());
        self
    }

    #[must_use]
    pub fn with_speaking(mut self, peer: PeerId) -> Self {
        self.page.speaking_peers.insert(peer);
        self
    }

    #[must_use]
    pub fn build(self) -> MembersPage {
        self.page
    }

    /// The page as a full roster snapshot.
    #[must_use]
    pub fn snapshot(self) -> MembersSnapshot {
        MembersSnapshot::from(self.page)
    }
}

/// Test call state fixture.
#[derive(Debug, Clone)]
pub struct TestCallState {
    state: CallState,
}

impl TestCallState {
    /// A connected call for local user `my_id` without management rights.
    #[must_use]
    pub fn new(my_id: i64) -> Self {
        let mut state = CallState::new(PeerId::user(my_id));
        state.network_state = NetworkState::Connected;
        Self { state }
    }

    /// Grant call management rights.
    #[must_use]
    pub fn admin(mut self) -> Self {
        self.state.can_manage_call = true;
        self.state.admin_ids.insert(self.state.my_peer_id);
        self.state.default_participant_mute_state = DefaultMutePolicy {
            is_muted: false,
            can_change: true,
        };
        self
    }

    /// List `peer_id` among the call admins without granting the local
    /// management flag.
    #[must_use]
    pub fn with_admin(mut self, peer_id: i64) -> Self {
        self.state.admin_ids.insert(PeerId::user(peer_id));
        self
    }

    #[must_use]
    pub fn connecting(mut self) -> Self {
        self.state.network_state = NetworkState::Connecting;
        self
    }

    /// Locally muted. `can_unmute = false` means muted by an admin.
    #[must_use]
    pub fn muted(mut self, can_unmute: bool) -> Self {
        self.state.mute_state = Some(MuteState {
            can_unmute,
            muted_by_you: false,
        });
        self
    }

    /// Scheduled to start at `date` (unix seconds).
    #[must_use]
    pub fn scheduled(mut self, date: i32, subscribed: bool) -> Self {
        self.state.schedule_timestamp = Some(date);
        self.state.subscribed_to_scheduled = subscribed;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.state.title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> CallState {
        self.state
    }
}
