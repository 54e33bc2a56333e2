//! Local mute requests.

use serde::{Deserialize, Serialize};

/// What the local user asked for: muted (possibly with push-to-talk held) or unmuted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MuteAction {
    /// Muted. While push-to-talk is held the microphone is live anyway.
    Muted { push_to_talk_active: bool },
    Unmuted,
}

impl MuteAction {
    /// Whether the microphone is silent right now.
    ///
    /// Push-to-talk overrides a nominal mute while it is held. Push-to-talk
    /// changes faster than mute intent, so this is derived on every call.
    #[must_use]
    pub const fn is_effectively_muted(&self) -> bool {
        match self {
            MuteAction::Muted {
                push_to_talk_active,
            } => !*push_to_talk_active,
            MuteAction::Unmuted => false,
        }
    }

    /// Whether the request would open the microphone.
    #[must_use]
    pub const fn opens_microphone(&self) -> bool {
        !self.is_effectively_muted()
    }
}

impl Default for MuteAction {
    fn default() -> Self {
        MuteAction::Muted {
            push_to_talk_active: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_to_talk_overrides_mute() {
        assert!(!MuteAction::Muted {
            push_to_talk_active: true
        }
        .is_effectively_muted());
    }

    #[test]
    fn test_muted_without_push_to_talk() {
        assert!(MuteAction::Muted {
            push_to_talk_active: false
        }
        .is_effectively_muted());
    }

    #[test]
    fn test_unmuted_is_audible() {
        assert!(!MuteAction::Unmuted.is_effectively_muted());
        assert!(MuteAction::Unmuted.opens_microphone());
    }

    #[test]
    fn test_default_is_muted() {
        assert!(MuteAction::default().is_effectively_muted());
    }

    #[test]
    fn test_predicate_follows_value_changes() {
        let mut action = MuteAction::Muted {
            push_to_talk_active: false,
        };
        assert!(action.is_effectively_muted());

        action = MuteAction::Muted {
            push_to_talk_active: true,
        };
        assert!(!action.is_effectively_muted());
    }
}
