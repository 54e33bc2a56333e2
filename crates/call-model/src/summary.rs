//! Compact "call in progress" view.

use crate::members::MembersSnapshot;
use crate::participant::Participant;
use crate::state::{CallState, NetworkState};
use common::types::PeerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Summary of a call for chat-list banners and similar surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    pub network_state: NetworkState,
    /// Full roster size.
    pub participant_count: usize,
    /// The first few loaded participants, in roster order.
    pub top_participants: Vec<Participant>,
    pub active_speakers: BTreeSet<PeerId>,
    pub title: Option<String>,
    pub is_recording: bool,
}

impl CallSummary {
    /// Build a summary from the current state and roster.
    #[must_use]
    pub fn from_snapshots(state: &CallState, members: &MembersSnapshot, top_n: usize) -> Self {
        Self {
            network_state: state.network_state,
            participant_count: members.total_count.max(members.participants.len()),
            top_participants: members.participants.iter().take(top_n).cloned().collect(),
            active_speakers: members.speaking_peers.clone(),
            title: state.title.clone(),
            is_recording: state.is_recording(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64) -> Participant {
        Participant {
            peer: Some(PeerId::user(id)),
            ..Participant::default()
        }
    }

    #[test]
    fn test_summary_takes_top_participants_in_order() {
        let mut state = CallState::new(PeerId::user(1));
        state.network_state = NetworkState::Connected;
        state.title = Some("Standup".to_string());

        let members = MembersSnapshot {
            participants: vec![member(1), member(2), member(3), member(4)],
            speaking_peers: BTreeSet::from([PeerId::user(3)]),
            total_count: 40,
            load_more_token: Some("next".to_string()),
        };

        let summary = CallSummary::from_snapshots(&state, &members, 2);

        assert_eq!(summary.participant_count, 40);
        assert_eq!(summary.top_participants, vec![member(1), member(2)]);
        assert_eq!(summary.active_speakers, BTreeSet::from([PeerId::user(3)]));
        assert_eq!(summary.network_state, NetworkState::Connected);
        assert_eq!(summary.title.as_deref(), Some("Standup"));
        assert!(!summary.is_recording);
    }

    #[test]
    fn test_summary_count_covers_loaded_participants() {
        let state = CallState::new(PeerId::user(1));
        let members = MembersSnapshot {
            participants: vec![member(1), member(2)],
            ..MembersSnapshot::default()
        };

        let summary = CallSummary::from_snapshots(&state, &members, 5);
        assert_eq!(summary.participant_count, 2);
        assert_eq!(summary.top_participants.len(), 2);
    }
}
