//! Scripted call engine for session testing.
//!
//! Provides a mock engine that can be configured to:
//! - Return scripted roster pages in order
//! - Delay or fail roster fetches
//! - Deny microphone access, or keep the prompt open for a while
//! - Delay or fail moderation requests
//!
//! Every call it receives is recorded for later assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use call_test_utils::MockEngine;
//!
//! let engine = MockEngine::builder()
//!     .with_page(page)
//!     .with_fetch_delay(Duration::from_secs(1))
//!     .deny_microphone()
//!     .build();
//!
//! let services = engine.services();
//! // Spawn a session with `services`...
//! assert_eq!(engine.fetch_tokens(), vec!["page-2"]);
//! ```

use async_trait::async_trait;
use call_model::{MembersPage, MuteAction, PeerId, RequestedVideo};
use call_session::{
    CallModerator, EngineServices, MediaSubscriber, MembersFetcher, PermissionHandler,
    SessionError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A moderation or self-control request received by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationCall {
    SetMuteAction(MuteAction),
    SetPeerMuted { peer: PeerId, muted: bool },
    SetDefaultParticipantsMuted(bool),
    SetRaisedHand { peer: PeerId, raised: bool },
    SetTitle(String),
    SetScheduleSubscription(bool),
}

/// Mock engine for testing the call session.
#[derive(Debug)]
pub struct MockEngine {
    inner: Mutex<MockEngineInner>,
    fetch_delay: Option<Duration>,
    fetch_error: Option<String>,
    moderation_delay: Option<Duration>,
    moderation_error: Option<String>,
    permission_delay: Option<Duration>,
    deny_microphone: bool,
}

#[derive(Debug, Default)]
struct MockEngineInner {
    /// Pages handed out by `fetch_members`, front first
    pages: VecDeque<MembersPage>,
    /// Tokens `fetch_members` was called with
    fetch_tokens: Vec<String>,
    /// Every subscription list received
    subscriptions: Vec<Vec<RequestedVideo>>,
    moderation_calls: Vec<ModerationCall>,
    microphone_requests: usize,
}

impl Default for MockEngine {
    fn default() -> Self {
        MockEngineBuilder::default().build_inner()
    }
}

impl MockEngine {
    /// Create a new MockEngine builder.
    #[must_use]
    pub fn builder() -> MockEngineBuilder {
        MockEngineBuilder::default()
    }

    /// Create an engine that accepts everything and has no pages scripted.
    #[must_use]
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Session collaborators backed by this engine.
    #[must_use]
    pub fn services(self: &Arc<Self>) -> EngineServices {
        EngineServices {
            members: self.clone(),
            media: self.clone(),
            moderator: self.clone(),
            permissions: self.clone(),
        }
    }

    /// Queue another roster page.
    pub fn push_page(&self, page: MembersPage) {
        self.inner.lock().unwrap().pages.push_back(page);
    }

    /// Tokens roster fetches were made with, in call order.
    pub fn fetch_tokens(&self) -> Vec<String> {
        self.inner.lock().unwrap().fetch_tokens.clone()
    }

    /// Every subscription list the session configured, in call order.
    pub fn subscriptions(&self) -> Vec<Vec<RequestedVideo>> {
        self.inner.lock().unwrap().subscriptions.clone()
    }

    /// The most recent subscription list, if any.
    pub fn current_subscriptions(&self) -> Option<Vec<RequestedVideo>> {
        self.inner.lock().unwrap().subscriptions.last().cloned()
    }

    /// Moderation requests received, in call order.
    pub fn moderation_calls(&self) -> Vec<ModerationCall> {
        self.inner.lock().unwrap().moderation_calls.clone()
    }

    /// How many times the microphone permission was asked for.
    pub fn microphone_requests(&self) -> usize {
        self.inner.lock().unwrap().microphone_requests
    }

    async fn moderate(&self, call: ModerationCall) -> Result<(), SessionError> {
        self.inner.lock().unwrap().moderation_calls.push(call);

        if let Some(delay) = self.moderation_delay {
            tokio::time::sleep(delay).await;
        }

        match &self.moderation_error {
            Some(message) => Err(SessionError::Engine(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MembersFetcher for MockEngine {
    async fn fetch_members(&self, token: String) -> Result<MembersPage, SessionError> {
        self.inner.lock().unwrap().fetch_tokens.push(token);

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.fetch_error {
            return Err(SessionError::Engine(message.clone()));
        }

        self.inner
            .lock()
            .unwrap()
            .pages
            .pop_front()
            .ok_or_else(|| SessionError::Engine("no roster page scripted".to_string()))
    }
}

#[async_trait]
impl MediaSubscriber for MockEngine {
    async fn configure_subscriptions(
        &self,
        videos: Vec<RequestedVideo>,
    ) -> Result<(), SessionError> {
        self.inner.lock().unwrap().subscriptions.push(videos);
        Ok(())
    }
}

#[async_trait]
impl CallModerator for MockEngine {
    async fn set_mute_action(&self, action: MuteAction) -> Result<(), SessionError> {
        self.moderate(ModerationCall::SetMuteAction(action)).await
    }

    async fn set_peer_muted(&self, peer: PeerId, muted: bool) -> Result<(), SessionError> {
        self.moderate(ModerationCall::SetPeerMuted { peer, muted }).await
    }

    async fn set_default_participants_muted(&self, muted: bool) -> Result<(), SessionError> {
        self.moderate(ModerationCall::SetDefaultParticipantsMuted(muted)).await
    }

    async fn set_raised_hand(&self, peer: PeerId, raised: bool) -> Result<(), SessionError> {
        self.moderate(ModerationCall::SetRaisedHand { peer, raised }).await
    }

    async fn set_title(&self, title: String) -> Result<(), SessionError> {
        self.moderate(ModerationCall::SetTitle(title)).await
    }

    async fn set_schedule_subscription(&self, subscribed: bool) -> Result<(), SessionError> {
        self.moderate(ModerationCall::SetScheduleSubscription(subscribed)).await
    }
}

#[async_trait]
impl PermissionHandler for MockEngine {
    async fn request_microphone(&self) -> bool {
        self.inner.lock().unwrap().microphone_requests += 1;

        if let Some(delay) = self.permission_delay {
            tokio::time::sleep(delay).await;
        }

        !self.deny_microphone
    }
}

/// Builder for MockEngine configuration.
#[derive(Debug, Default)]
pub struct MockEngineBuilder {
    pages: VecDeque<MembersPage>,
    fetch_delay: Option<Duration>,
    fetch_error: Option<String>,
    moderation_delay: Option<Duration>,
    moderation_error: Option<String>,
    permission_delay: Option<Duration>,
    deny_microphone: bool,
}

impl MockEngineBuilder {
    /// Script the next roster page.
    #[must_use]
    pub fn with_page(mut self, page: MembersPage) -> Self {
        self.pages.push_back(page);
        self
    }

    /// Delay every roster fetch.
    #[must_use]
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Fail every roster fetch with an engine error.
    #[must_use]
    pub fn failing_fetch(mut self, message: impl Into<String>) -> Self {
        self.fetch_error = Some(message.into());
        self
    }

    /// Delay every moderation request.
    #[must_use]
    pub fn with_moderation_delay(mut self, delay: Duration) -> Self {
        self.moderation_delay = Some(delay);
        self
    }

    /// Keep every microphone prompt open for `delay` before answering.
    #[must_use]
    pub fn with_permission_delay(mut self, delay: Duration) -> Self {
        self.permission_delay = Some(delay);
        self
    }

    /// Fail every moderation request with an engine error.
    #[must_use]
    pub fn failing_moderation(mut self, message: impl Into<String>) -> Self {
        self.moderation_error = Some(message.into());
        self
    }

    /// Refuse microphone access.
    #[must_use]
    pub fn deny_microphone(mut self) -> Self {
        self.deny_microphone = true;
        self
    }

    /// Build the MockEngine.
    #[must_use]
    pub fn build(self) -> Arc<MockEngine> {
        Arc::new(self.build_inner())
    }

    fn build_inner(self) -> MockEngine {
        MockEngine {
            inner: Mutex::new(MockEngineInner {
                pages: self.pages,
                ..MockEngineInner::default()
            }),
            fetch_delay: self.fetch_delay,
            fetch_error: self.fetch_error,
            moderation_delay: self.moderation_delay,
            moderation_error: self.moderation_error,
            permission_delay: self.permission_delay,
            deny_microphone: self.deny_microphone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_are_served_in_order() {
        let first = MembersPage {
            total_count: 1,
            ..MembersPage::default()
        };
        let second = MembersPage {
            total_count: 2,
            ..MembersPage::default()
        };
        let engine = MockEngine::builder()
            .with_page(first.clone())
            .with_page(second.clone())
            .build();

        assert_eq!(engine.fetch_members("a".to_string()).await.unwrap(), first);
        assert_eq!(engine.fetch_members("b".to_string()).await.unwrap(), second);
        assert!(matches!(
            engine.fetch_members("c".to_string()).await,
            Err(SessionError::Engine(_))
        ));
        assert_eq!(engine.fetch_tokens(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_deny_microphone_counts_requests() {
        let engine = MockEngine::builder().deny_microphone().build();

        assert!(!engine.request_microphone().await);
        assert!(!engine.request_microphone().await);
        assert_eq!(engine.microphone_requests(), 2);
    }

    #[tokio::test]
    async fn test_failing_moderation_still_records() {
        let engine = MockEngine::builder().failing_moderation("offline").build();

        let result = engine.set_title("Standup".to_string()).await;
        assert!(matches!(result, Err(SessionError::Engine(_))));
        assert_eq!(
            engine.moderation_calls(),
            vec![ModerationCall::SetTitle("Standup".to_string())]
        );
    }
}
