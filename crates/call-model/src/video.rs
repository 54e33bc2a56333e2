//! Requested-video extraction.
//!
//! The UI decides which remote camera and screen-share tracks to render and
//! at what quality. Each decision is turned into a [`RequestedVideo`] from the
//! participant's published SSRC metadata, and the ordered list of requests is
//! handed back to the engine to (re)configure inbound media subscriptions.
//!
//! Extraction is a total function: a participant without an audio ssrc, a
//! resolved peer, or a track of the requested kind yields `None`. Only an
//! inverted quality range is an error, and it is rejected when the
//! [`QualityRange`] is built.

use crate::error::ModelError;
use crate::participant::{Participant, SsrcGroup};
use common::types::PeerId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered video quality levels. `Thumbnail < Medium < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoQuality {
    Thumbnail,
    Medium,
    Full,
}

/// A closed `[min, max]` quality range with `min <= max`.
///
/// Deserialization goes through [`QualityRange::new`], so decoded ranges
/// hold the same invariant as constructed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawQualityRange")]
pub struct QualityRange {
    min: VideoQuality,
    max: VideoQuality,
}

/// Unchecked wire form of [`QualityRange`].
#[derive(Deserialize)]
struct RawQualityRange {
    min: VideoQuality,
    max: VideoQuality,
}

impl TryFrom<RawQualityRange> for QualityRange {
    type Error = ModelError;

    fn try_from(raw: RawQualityRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl QualityRange {
    /// Build a range, rejecting `min > max`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidQualityRange` when the bounds are inverted.
    /// The bounds are never swapped silently.
    pub fn new(min: VideoQuality, max: VideoQuality) -> Result<Self, ModelError> {
        if min > max {
            return Err(ModelError::InvalidQualityRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Range containing a single quality level.
    #[must_use]
    pub const fn exactly(quality: VideoQuality) -> Self {
        Self {
            min: quality,
            max: quality,
        }
    }

    /// `Thumbnail..=Full`.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            min: VideoQuality::Thumbnail,
            max: VideoQuality::Full,
        }
    }

    #[must_use]
    pub const fn min(&self) -> VideoQuality {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> VideoQuality {
        self.max
    }

    #[must_use]
    pub fn contains(&self, quality: VideoQuality) -> bool {
        self.min <= quality && quality <= self.max
    }
}

/// Which of a participant's video tracks a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoChannelKind {
    /// Camera track.
    Camera,
    /// Screen-share track.
    Presentation,
}

impl VideoChannelKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            VideoChannelKind::Camera => "camera",
            VideoChannelKind::Presentation => "presentation",
        }
    }
}

/// One inbound video subscription request for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestedVideo {
    /// Audio ssrc of the publisher, correlating this video with its audio.
    pub audio_ssrc: u32,
    /// Numeric peer id of the publisher.
    pub peer_id: i64,
    /// Endpoint of the requested track.
    pub endpoint_id: String,
    /// SSRC groups copied verbatim from the track description.
    pub ssrc_groups: Vec<SsrcGroup>,
    pub min_quality: VideoQuality,
    pub max_quality: VideoQuality,
}

impl Participant {
    /// Request for this participant's camera track.
    ///
    /// Returns `None` when the participant has no audio ssrc, no resolved
    /// peer, or no camera track. A camera track with no SSRC groups still
    /// produces a request.
    #[must_use]
    pub fn requested_video_channel(&self, quality: QualityRange) -> Option<RequestedVideo> {
        self.requested_channel(VideoChannelKind::Camera, quality)
    }

    /// Request for this participant's screen-share track.
    ///
    /// Same preconditions as [`Participant::requested_video_channel`], reading
    /// the presentation track instead.
    #[must_use]
    pub fn requested_presentation_channel(
        &self,
        quality: QualityRange,
    ) -> Option<RequestedVideo> {
        self.requested_channel(VideoChannelKind::Presentation, quality)
    }

    /// Request for the track of the given kind.
    #[must_use]
    pub fn requested_channel(
        &self,
        kind: VideoChannelKind,
        quality: QualityRange,
    ) -> Option<RequestedVideo> {
        let audio_ssrc = self.ssrc?;
        let track = self.track(kind)?;
        let peer = self.peer?;

        Some(RequestedVideo {
            audio_ssrc,
            peer_id: peer.numeric_id(),
            endpoint_id: track.endpoint_id.clone(),
            ssrc_groups: track.ssrc_groups.clone(),
            min_quality: quality.min(),
            max_quality: quality.max(),
        })
    }
}

/// Validate the quality bounds, then extract a request of the given kind.
///
/// # Errors
///
/// Returns `ModelError::InvalidQualityRange` when `min > max`. Missing
/// participant data is `Ok(None)`.
pub fn requested_video(
    participant: &Participant,
    kind: VideoChannelKind,
    min: VideoQuality,
    max: VideoQuality,
) -> Result<Option<RequestedVideo>, ModelError> {
    let quality = QualityRange::new(min, max)?;
    Ok(participant.requested_channel(kind, quality))
}

/// The UI's wish to render one track of one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSelection {
    pub peer: PeerId,
    pub kind: VideoChannelKind,
    pub quality: QualityRange,
}

impl VideoSelection {
    #[must_use]
    pub const fn camera(peer: PeerId, quality: QualityRange) -> Self {
        Self {
            peer,
            kind: VideoChannelKind::Camera,
            quality,
        }
    }

    #[must_use]
    pub const fn presentation(peer: PeerId, quality: QualityRange) -> Self {
        Self {
            peer,
            kind: VideoChannelKind::Presentation,
            quality,
        }
    }
}

/// Build the ordered request list for a set of selections.
///
/// Selection order is preserved. Selections whose peer is not among
/// `participants`, or whose participant cannot produce a request, are
/// skipped. A repeated `(peer, kind)` pair keeps only its first occurrence.
/// When several participants share a peer, the first one wins.
#[must_use]
pub fn collect_requested_videos(
    participants: &[Participant],
    selections: &[VideoSelection],
) -> Vec<RequestedVideo> {
    let mut seen = HashSet::new();
    let mut requests = Vec::with_capacity(selections.len());

    for selection in selections {
        if !seen.insert((selection.peer, selection.kind)) {
            continue;
        }
        let request = participants
            .iter()
            .find(|participant| participant.peer == Some(selection.peer))
            .and_then(|participant| participant.requested_channel(selection.kind, selection.quality));
        if let Some(request) = request {
            requests.push(request);
        }
    }

    requests
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::participant::TrackDescription;

    fn sim_track(endpoint: &str, ssrcs: Vec<u32>) -> TrackDescription {
        TrackDescription::new(endpoint, vec![SsrcGroup::new("SIM", ssrcs)])
    }

    fn participant(peer: i64, ssrc: u32) -> Participant {
        Participant {
            peer: Some(PeerId::user(peer)),
            ssrc: Some(ssrc),
            video_description: Some(sim_track("e1", vec![1, 2, 3])),
            ..Participant::default()
        }
    }

    #[test]
    fn test_quality_ordering() {
        assert!(VideoQuality::Thumbnail < VideoQuality::Medium);
        assert!(VideoQuality::Medium < VideoQuality::Full);
    }

    #[test]
    fn test_quality_range_rejects_inverted_bounds() {
        let err = QualityRange::new(VideoQuality::Full, VideoQuality::Thumbnail).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidQualityRange {
                min: VideoQuality::Full,
                max: VideoQuality::Thumbnail,
            }
        );
    }

    #[test]
    fn test_quality_range_accepts_equal_bounds() {
        let range = QualityRange::new(VideoQuality::Medium, VideoQuality::Medium).unwrap();
        assert_eq!(range, QualityRange::exactly(VideoQuality::Medium));
        assert!(range.contains(VideoQuality::Medium));
        assert!(!range.contains(VideoQuality::Full));
    }

    #[test]
    fn test_camera_extraction_example() {
        let request = participant(7, 42)
            .requested_video_channel(QualityRange::any())
            .unwrap();

        assert_eq!(
            request,
            RequestedVideo {
                audio_ssrc: 42,
                peer_id: 7,
                endpoint_id: "e1".to_string(),
                ssrc_groups: vec![SsrcGroup::new("SIM", vec![1, 2, 3])],
                min_quality: VideoQuality::Thumbnail,
                max_quality: VideoQuality::Full,
            }
        );
    }

    #[test]
    fn test_missing_audio_ssrc_yields_nothing_for_both_kinds() {
        let mut p = participant(7, 42);
        p.presentation_description = Some(sim_track("screen", vec![9]));
        p.ssrc = None;

        assert!(p.requested_video_channel(QualityRange::any()).is_none());
        assert!(p.requested_presentation_channel(QualityRange::any()).is_none());
    }

    #[test]
    fn test_unresolved_peer_yields_nothing() {
        let mut p = participant(7, 42);
        p.peer = None;
        assert!(p.requested_video_channel(QualityRange::any()).is_none());
    }

    #[test]
    fn test_presentation_extracted_independently_of_camera() {
        let mut p = participant(7, 42);
        p.video_description = None;
        p.presentation_description = Some(sim_track("screen", vec![10, 20]));

        assert!(p.requested_video_channel(QualityRange::any()).is_none());

        let request = p
            .requested_presentation_channel(QualityRange::exactly(VideoQuality::Full))
            .unwrap();
        assert_eq!(request.endpoint_id, "screen");
        assert_eq!(request.audio_ssrc, 42);
        assert_eq!(request.ssrc_groups, vec![SsrcGroup::new("SIM", vec![10, 20])]);
        assert_eq!(request.min_quality, VideoQuality::Full);
    }

    #[test]
    fn test_groups_copied_verbatim_in_order() {
        let groups = vec![
            SsrcGroup::new("SIM", vec![5, 6, 7]),
            SsrcGroup::new("FID", vec![5, 15]),
            SsrcGroup::new("FID", vec![6, 16]),
        ];
        let mut p = participant(1, 100);
        p.video_description = Some(TrackDescription::new("e", groups.clone()));

        let request = p.requested_video_channel(QualityRange::any()).unwrap();
        assert_eq!(request.ssrc_groups.len(), 3);
        assert_eq!(request.ssrc_groups, groups);
    }

    #[test]
    fn test_empty_group_list_still_yields_request() {
        let mut p = participant(1, 100);
        p.video_description = Some(TrackDescription::new("e", Vec::new()));

        let request = p.requested_video_channel(QualityRange::any()).unwrap();
        assert!(request.ssrc_groups.is_empty());
    }

    #[test]
    fn test_requested_video_validates_range_first() {
        let p = participant(7, 42);
        assert!(requested_video(
            &p,
            VideoChannelKind::Camera,
            VideoQuality::Full,
            VideoQuality::Medium
        )
        .is_err());

        let mut without_audio = p.clone();
        without_audio.ssrc = None;
        assert_eq!(
            requested_video(
                &without_audio,
                VideoChannelKind::Camera,
                VideoQuality::Thumbnail,
                VideoQuality::Medium
            ),
            Ok(None)
        );

        let request = requested_video(
            &p,
            VideoChannelKind::Camera,
            VideoQuality::Thumbnail,
            VideoQuality::Medium,
        )
        .unwrap()
        .unwrap();
        assert_eq!(request.max_quality, VideoQuality::Medium);
    }

    #[test]
    fn test_collect_preserves_selection_order_and_skips_unresolvable() {
        let mut no_audio = participant(3, 0);
        no_audio.ssrc = None;
        let participants = vec![participant(1, 10), participant(2, 20), no_audio];

        let selections = vec![
            VideoSelection::camera(PeerId::user(2), QualityRange::any()),
            VideoSelection::camera(PeerId::user(3), QualityRange::any()),
            VideoSelection::camera(PeerId::user(99), QualityRange::any()),
            VideoSelection::camera(PeerId::user(1), QualityRange::exactly(VideoQuality::Thumbnail)),
            VideoSelection::presentation(PeerId::user(1), QualityRange::any()),
        ];

        let requests = collect_requested_videos(&participants, &selections);
        let peers: Vec<i64> = requests.iter().map(|r| r.peer_id).collect();
        assert_eq!(peers, vec![2, 1]);
        assert_eq!(requests.get(1).unwrap().max_quality, VideoQuality::Thumbnail);
    }

    #[test]
    fn test_collect_keeps_first_duplicate_selection() {
        let participants = vec![participant(1, 10)];
        let selections = vec![
            VideoSelection::camera(PeerId::user(1), QualityRange::exactly(VideoQuality::Medium)),
            VideoSelection::camera(PeerId::user(1), QualityRange::exactly(VideoQuality::Full)),
        ];

        let requests = collect_requested_videos(&participants, &selections);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests.first().unwrap().min_quality, VideoQuality::Medium);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let p = participant(4, 44);
        assert_eq!(
            p.requested_video_channel(QualityRange::any()),
            p.requested_video_channel(QualityRange::any())
        );
    }
}
