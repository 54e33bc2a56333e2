//! JSON encoding of snapshots for transient persistence.
//!
//! The engine owns every wire format; this encoding only exists so a UI can
//! stash the last roster or state (for example across a view reload) and
//! restore it byte-for-byte.

use crate::error::ModelError;
use crate::members::MembersSnapshot;
use crate::state::CallState;
use crate::video::VideoSelection;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

/// Encode a roster snapshot.
///
/// # Errors
///
/// Returns `ModelError::Encode` if serialization fails.
pub fn encode_members(snapshot: &MembersSnapshot) -> Result<Bytes, ModelError> {
    encode(snapshot)
}

/// Decode a roster snapshot.
///
/// # Errors
///
/// Returns `ModelError::Decode` if the bytes are not a valid snapshot.
pub fn decode_members(data: &[u8]) -> Result<MembersSnapshot, ModelError> {
    decode(data)
}

/// Encode a call state snapshot.
///
/// # Errors
///
/// Returns `ModelError::Encode` if serialization fails.
pub fn encode_state(state: &CallState) -> Result<Bytes, ModelError> {
    encode(state)
}

/// Decode a call state snapshot.
///
/// # Errors
///
/// Returns `ModelError::Decode` if the bytes are not a valid snapshot.
pub fn decode_state(data: &[u8]) -> Result<CallState, ModelError> {
    decode(data)
}

/// Encode the UI's video selections.
///
/// # Errors
///
/// Returns `ModelError::Encode` if serialization fails.
pub fn encode_selections(selections: &[VideoSelection]) -> Result<Bytes, ModelError> {
    encode(&selections)
}

/// Decode video selections.
///
/// # Errors
///
/// Returns `ModelError::Decode` if the bytes are not a selection list or a
/// quality range has `min > max`.
pub fn decode_selections(data: &[u8]) -> Result<Vec<VideoSelection>, ModelError> {
    decode(data)
}

fn encode<T: Serialize>(value: &T) -> Result<Bytes, ModelError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| ModelError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ModelError> {
    serde_json::from_slice(data).map_err(|e| ModelError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::participant::{Participant, SsrcGroup, TrackDescription};
    use crate::state::{MuteState, NetworkState};
    use crate::video::{QualityRange, VideoQuality};
    use common::types::PeerId;
    use std::collections::BTreeSet;

    fn roster() -> MembersSnapshot {
        let participants = (1..=4)
            .rev()
            .map(|id| Participant {
                peer: Some(PeerId::user(id)),
                ssrc: Some(u32::try_from(id * 10).unwrap()),
                video_description: Some(TrackDescription::new(
                    format!("endpoint-{id}"),
                    vec![SsrcGroup::new("SIM", vec![1, 2, 3])],
                )),
                about: Some(format!("member {id}")),
                ..Participant::default()
            })
            .collect();

        MembersSnapshot {
            participants,
            speaking_peers: BTreeSet::from([PeerId::user(2)]),
            total_count: 12,
            load_more_token: Some("opaque/+token==".to_string()),
        }
    }

    #[test]
    fn test_members_survive_encoding_with_order_and_token() {
        let snapshot = roster();
        let decoded = decode_members(&encode_members(&snapshot).unwrap()).unwrap();

        let order: Vec<i64> = decoded
            .participants
            .iter()
            .map(|p| p.peer.unwrap().id)
            .collect();
        assert_eq!(order, vec![4, 3, 2, 1]);
        assert_eq!(decoded.load_more_token.as_deref(), Some("opaque/+token=="));
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_state_survives_encoding() {
        let mut state = CallState::new(PeerId::channel(-5));
        state.network_state = NetworkState::Connected;
        state.mute_state = Some(MuteState {
            can_unmute: false,
            muted_by_you: false,
        });
        state.schedule_timestamp = Some(1_700_000_000);
        state.admin_ids.insert(PeerId::user(3));

        let decoded = decode_state(&encode_state(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.schedule_state(), state.schedule_state());
    }

    #[test]
    fn test_selections_survive_encoding() {
        let selections = vec![
            VideoSelection::presentation(PeerId::user(3), QualityRange::exactly(VideoQuality::Full)),
            VideoSelection::camera(
                PeerId::group(8),
                QualityRange::new(VideoQuality::Thumbnail, VideoQuality::Medium).unwrap(),
            ),
        ];

        let decoded = decode_selections(&encode_selections(&selections).unwrap()).unwrap();
        assert_eq!(decoded, selections);
    }

    #[test]
    fn test_decode_rejects_inverted_quality_range() {
        let data = br#"[{"peer":{"namespace":"user","id":7},"kind":"camera","quality":{"min":"full","max":"thumbnail"}}]"#;

        let err = decode_selections(data).unwrap_err();
        assert!(matches!(err, ModelError::Decode(ref message) if message.contains("Full")));

        let inverted = serde_json::from_str::<QualityRange>(r#"{"min":"full","max":"thumbnail"}"#);
        assert!(inverted.is_err());
        let equal: QualityRange =
            serde_json::from_str(r#"{"min":"medium","max":"medium"}"#).unwrap();
        assert_eq!(equal, QualityRange::exactly(VideoQuality::Medium));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_members(b"{not json"),
            Err(ModelError::Decode(_))
        ));
        assert!(matches!(decode_state(b"[]"), Err(ModelError::Decode(_))));
    }
}
