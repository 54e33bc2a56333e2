//! Paginated roster snapshots.
//!
//! A [`MembersSnapshot`] holds the loaded part of the roster plus the
//! continuation token for the next page. The snapshot is a passive value:
//! only the owning call session can fetch the next [`MembersPage`] and merge
//! it into a new snapshot.

use crate::participant::Participant;
use common::types::PeerId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// One page of roster data returned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersPage {
    pub participants: Vec<Participant>,
    pub speaking_peers: BTreeSet<PeerId>,
    /// Roster size as known by the engine when the page was produced.
    pub total_count: usize,
    /// Token for the page after this one. `None` on the last page.
    pub load_more_token: Option<String>,
}

/// Loaded roster with speaking overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersSnapshot {
    /// Participants in engine order (join or speaking priority).
    pub participants: Vec<Participant>,
    /// Peers currently speaking.
    pub speaking_peers: BTreeSet<PeerId>,
    /// Full roster size. May exceed `participants.len()` while pages remain.
    pub total_count: usize,
    /// Opaque continuation handle. `None` once the full roster is loaded.
    pub load_more_token: Option<String>,
}

/// A change between two consecutive roster snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event", content = "peer", rename_all = "snake_case")]
pub enum MemberEvent {
    Joined(PeerId),
    Left(PeerId),
    StartedSpeaking(PeerId),
    StoppedSpeaking(PeerId),
}

impl MemberEvent {
    #[must_use]
    pub const fn peer(&self) -> PeerId {
        match self {
            MemberEvent::Joined(peer)
            | MemberEvent::Left(peer)
            | MemberEvent::StartedSpeaking(peer)
            | MemberEvent::StoppedSpeaking(peer) => *peer,
        }
    }
}

impl From<MembersPage> for MembersSnapshot {
    fn from(page: MembersPage) -> Self {
        Self {
            participants: page.participants,
            speaking_peers: page.speaking_peers,
            total_count: page.total_count,
            load_more_token: page.load_more_token,
        }
    }
}

impl MembersSnapshot {
    /// Whether the whole roster has been delivered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.load_more_token.is_none()
    }

    #[must_use]
    pub fn participant(&self, peer: &PeerId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.peer.as_ref() == Some(peer))
    }

    #[must_use]
    pub fn is_speaking(&self, peer: &PeerId) -> bool {
        self.speaking_peers.contains(peer)
    }

    /// Produce the snapshot that follows loading `page`.
    ///
    /// Loaded participants keep their order and page participants are
    /// appended. A page participant whose peer is already loaded replaces the
    /// earlier record in place, so no peer appears twice. Speaking sets are
    /// unioned and the continuation token is taken from the page.
    #[must_use]
    pub fn merge_page(&self, page: MembersPage) -> MembersSnapshot {
        let mut participants = self.participants.clone();

        for incoming in page.participants {
            let existing = incoming.peer.and_then(|peer| {
                participants
                    .iter_mut()
                    .find(|participant| participant.peer == Some(peer))
            });
            match existing {
                Some(slot) => *slot = incoming,
                None => participants.push(incoming),
            }
        }

        let speaking_peers = self
            .speaking_peers
            .union(&page.speaking_peers)
            .copied()
            .collect();
        let total_count = page.total_count.max(participants.len());

        MembersSnapshot {
            participants,
            speaking_peers,
            total_count,
            load_more_token: page.load_more_token,
        }
    }

    /// Events that turn `previous` into `self`.
    ///
    /// Only loaded participants are compared: a peer that has not been
    /// paged in yet is neither joined nor left. Joins follow `self` roster
    /// order, leaves follow `previous` roster order, speaking changes follow
    /// peer order.
    #[must_use]
    pub fn diff(&self, previous: &MembersSnapshot) -> Vec<MemberEvent> {
        let before: HashSet<PeerId> = previous.loaded_peers().collect();
        let after: HashSet<PeerId> = self.loaded_peers().collect();

        let joined = self
            .loaded_peers()
            .filter(|peer| !before.contains(peer))
            .map(MemberEvent::Joined);
        let left = previous
            .loaded_peers()
            .filter(|peer| !after.contains(peer))
            .map(MemberEvent::Left);
        let started = self
            .speaking_peers
            .difference(&previous.speaking_peers)
            .copied()
            .map(MemberEvent::StartedSpeaking);
        let stopped = previous
            .speaking_peers
            .difference(&self.speaking_peers)
            .copied()
            .map(MemberEvent::StoppedSpeaking);

        joined.chain(left).chain(started).chain(stopped).collect()
    }

    fn loaded_peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.participants.iter().filter_map(|participant| participant.peer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn member(id: i64) -> Participant {
        Participant {
            peer: Some(PeerId::user(id)),
            ssrc: u32::try_from(id).ok(),
            ..Participant::default()
        }
    }

    fn peers(snapshot: &MembersSnapshot) -> Vec<i64> {
        snapshot
            .participants
            .iter()
            .map(|p| p.peer.unwrap().id)
            .collect()
    }

    fn first_page() -> MembersSnapshot {
        MembersSnapshot {
            participants: vec![member(1), member(2)],
            speaking_peers: BTreeSet::from([PeerId::user(1)]),
            total_count: 5,
            load_more_token: Some("page-2".to_string()),
        }
    }

    #[test]
    fn test_merge_appends_and_takes_page_token() {
        let merged = first_page().merge_page(MembersPage {
            participants: vec![member(3), member(4)],
            speaking_peers: BTreeSet::from([PeerId::user(4)]),
            total_count: 5,
            load_more_token: Some("page-3".to_string()),
        });

        assert_eq!(peers(&merged), vec![1, 2, 3, 4]);
        assert_eq!(merged.load_more_token.as_deref(), Some("page-3"));
        assert_eq!(
            merged.speaking_peers,
            BTreeSet::from([PeerId::user(1), PeerId::user(4)])
        );
        assert_eq!(merged.total_count, 5);
        assert!(!merged.is_complete());
    }

    #[test]
    fn test_merge_replaces_duplicate_peer_in_place() {
        let mut updated = member(2);
        updated.is_speaking = true;

        let merged = first_page().merge_page(MembersPage {
            participants: vec![member(3), updated.clone()],
            speaking_peers: BTreeSet::new(),
            total_count: 3,
            load_more_token: None,
        });

        assert_eq!(peers(&merged), vec![1, 2, 3]);
        assert_eq!(merged.participant(&PeerId::user(2)), Some(&updated));
        assert!(merged.is_complete());
    }

    #[test]
    fn test_merge_total_count_never_below_loaded() {
        let merged = first_page().merge_page(MembersPage {
            participants: vec![member(3), member(4), member(5), member(6)],
            total_count: 5,
            ..MembersPage::default()
        });
        assert_eq!(merged.total_count, 6);
    }

    #[test]
    fn test_merge_keeps_unresolved_participants() {
        let merged = first_page().merge_page(MembersPage {
            participants: vec![Participant::default(), Participant::default()],
            total_count: 4,
            ..MembersPage::default()
        });
        assert_eq!(merged.participants.len(), 4);
    }

    #[test]
    fn test_merge_leaves_previous_snapshot_untouched() {
        let previous = first_page();
        let _ = previous.merge_page(MembersPage {
            participants: vec![member(3)],
            ..MembersPage::default()
        });
        assert_eq!(previous, first_page());
    }

    #[test]
    fn test_diff_reports_joins_leaves_and_speaking() {
        let previous = first_page();
        let next = MembersSnapshot {
            participants: vec![member(2), member(3)],
            speaking_peers: BTreeSet::from([PeerId::user(3)]),
            total_count: 5,
            load_more_token: Some("page-2".to_string()),
        };

        assert_eq!(
            next.diff(&previous),
            vec![
                MemberEvent::Joined(PeerId::user(3)),
                MemberEvent::Left(PeerId::user(1)),
                MemberEvent::StartedSpeaking(PeerId::user(3)),
                MemberEvent::StoppedSpeaking(PeerId::user(1)),
            ]
        );
    }

    #[test]
    fn test_diff_of_identical_snapshots_is_empty() {
        assert!(first_page().diff(&first_page()).is_empty());
    }

    #[test]
    fn test_from_page() {
        let snapshot = MembersSnapshot::from(MembersPage {
            participants: vec![member(9)],
            speaking_peers: BTreeSet::new(),
            total_count: 1,
            load_more_token: None,
        });
        assert_eq!(peers(&snapshot), vec![9]);
        assert!(snapshot.is_complete());
        assert!(!snapshot.is_speaking(&PeerId::user(9)));
    }

    #[test]
    fn test_member_event_peer() {
        assert_eq!(MemberEvent::Left(PeerId::user(4)).peer(), PeerId::user(4));
    }
}
