//! `CallSession` - the actor that owns one call's client-side state.
//!
//! Each `CallSession`:
//! - Applies engine updates one at a time, dropping any whose version is not
//!   newer than the last applied update of the same kind
//! - Publishes whole snapshots on `watch` channels, so observers never see a
//!   torn mix of old and new fields and never see an older snapshot after a
//!   newer one
//! - Allows at most one roster page fetch in flight
//! - Forwards subscription and moderation commands to the engine after
//!   checking rights and device permissions
//!
//! Engine calls and permission prompts run in spawned tasks. Their results
//! come back as `Completion`s through the actor mailbox, so the actor keeps
//! applying engine updates while they are pending and checks each result
//! against the state that is current when it arrives.

use crate::capabilities::{
    MediaSubscriptionControl, MembershipControl, ModerationActions, StateObservation,
};
use crate::engine::{EngineEvent, EngineServices};
use crate::errors::SessionError;
use crate::messages::{Completion, Responder, SessionMessage, SessionStatus};
use crate::metrics;

use async_trait::async_trait;
use call_model::{
    collect_requested_videos, CallState, CallSummary, MemberEvent, MembersPage, MembersSnapshot,
    MuteAction, NetworkTransition, Participant, PeerId, RequestedVideo, VideoSelection,
};
use common::config::Config;
use common::types::SessionId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Sender the engine pushes its updates into.
pub type EngineEventSender = mpsc::Sender<EngineEvent>;

/// Handle to a `CallSession`.
#[derive(Clone)]
pub struct CallSessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    session_id: SessionId,
    state: watch::Receiver<CallState>,
    members: watch::Receiver<MembersSnapshot>,
    summary: watch::Receiver<CallSummary>,
    mute_action: watch::Receiver<MuteAction>,
    member_events: broadcast::Sender<MemberEvent>,
}

impl CallSessionHandle {
    /// Get the session ID.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Get session diagnostics.
    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the session actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(Responder<T>) -> SessionMessage,
    ) -> Result<T, SessionError> {
        if self.cancel_token.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        let (tx, rx) = oneshot::channel();
        self.sender
            .send(message(tx))
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;

        // Cancellation drops pending responders
        rx.await.map_err(|e| {
            if self.cancel_token.is_cancelled() {
                SessionError::Cancelled
            } else {
                SessionError::Internal(format!("response receive failed: {e}"))
            }
        })?
    }
}

impl StateObservation for CallSessionHandle {
    fn state(&self) -> watch::Receiver<CallState> {
        self.state.clone()
    }

    fn members(&self) -> watch::Receiver<MembersSnapshot> {
        self.members.clone()
    }

    fn summary(&self) -> watch::Receiver<CallSummary> {
        self.summary.clone()
    }

    fn mute_action(&self) -> watch::Receiver<MuteAction> {
        self.mute_action.clone()
    }

    fn member_events(&self) -> broadcast::Receiver<MemberEvent> {
        self.member_events.subscribe()
    }
}

#[async_trait]
impl MembershipControl for CallSessionHandle {
    async fn load_more(&self) -> Result<MembersSnapshot, SessionError> {
        self.request(|respond_to| SessionMessage::LoadMore { respond_to })
            .await
    }
}

#[async_trait]
impl MediaSubscriptionControl for CallSessionHandle {
    async fn set_requested_videos(&self, videos: Vec<RequestedVideo>) -> Result<(), SessionError> {
        self.request(|respond_to| SessionMessage::SetRequestedVideos { videos, respond_to })
            .await
            .map(|_| ())
    }

    async fn request_videos(
        &self,
        selections: Vec<VideoSelection>,
    ) -> Result<Vec<RequestedVideo>, SessionError> {
        self.request(|respond_to| SessionMessage::RequestVideos {
            selections,
            respond_to,
        })
        .await
    }
}

#[async_trait]
impl ModerationActions for CallSessionHandle {
    async fn set_mute_action(&self, action: MuteAction) -> Result<(), SessionError> {
        self.request(|respond_to| SessionMessage::SetMuteAction { action, respond_to })
            .await
    }

    async fn set_peer_muted(&self, peer: PeerId, muted: bool) -> Result<(), SessionError> {
        self.request(|respond_to| SessionMessage::SetPeerMuted {
            peer,
            muted,
            respond_to,
        })
        .await
    }

    async fn set_default_participants_muted(&self, muted: bool) -> Result<(), SessionError> {
        self.request(|respond_to| SessionMessage::SetDefaultParticipantsMuted { muted, respond_to })
            .await
    }

    async fn raise_hand(&self) -> Result<(), SessionError> {
        self.request(|respond_to| SessionMessage::RaiseHand { respond_to })
            .await
    }

    async fn lower_hand(&self, peer: PeerId) -> Result<(), SessionError> {
        self.request(|respond_to| SessionMessage::LowerHand { peer, respond_to })
            .await
    }

    async fn set_title(&self, title: String) -> Result<(), SessionError> {
        self.request(|respond_to| SessionMessage::SetTitle { title, respond_to })
            .await
    }

    async fn toggle_schedule_subscription(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| SessionMessage::ToggleScheduleSubscription { respond_to })
            .await
    }
}

/// The `CallSession` implementation.
pub struct CallSession {
    /// Session ID.
    session_id: SessionId,
    /// Command receiver.
    receiver: mpsc::Receiver<SessionMessage>,
    /// Engine update receiver.
    engine_events: mpsc::Receiver<EngineEvent>,
    /// Results of engine work run off the actor.
    completions: mpsc::Receiver<Completion>,
    completion_sender: mpsc::Sender<Completion>,
    /// Cancellation token.
    cancel_token: CancellationToken,
    /// Engine collaborators.
    services: EngineServices,
    members_fetch_timeout: Duration,
    summary_top_participants: usize,

    /// Current call state (source of truth for `state_tx`).
    state: CallState,
    /// Loaded roster (source of truth for `members_tx`).
    members: MembersSnapshot,
    /// Latest raw participant records from the engine.
    participants: Vec<Participant>,
    /// Subscriptions last accepted by the engine.
    requested_videos: Vec<RequestedVideo>,
    /// Local mute request.
    mute_action: MuteAction,
    /// Schedule subscription sent to the engine but not yet in its state.
    pending_schedule_subscription: Option<bool>,

    last_state_version: Option<u64>,
    last_members_version: Option<u64>,
    last_participants_version: Option<u64>,
    /// Sequence of the latest mute request; older results are not published.
    mute_request_seq: u64,
    /// Sequence of the latest subscription change.
    subscription_seq: u64,
    /// Whether a roster page fetch is running.
    load_more_in_flight: bool,
    /// Spawned engine calls and prompts without a completion yet.
    pending_commands: usize,
    /// Cleared once the engine drops its update sender.
    engine_connected: bool,

    state_tx: watch::Sender<CallState>,
    members_tx: watch::Sender<MembersSnapshot>,
    summary_tx: watch::Sender<CallSummary>,
    mute_tx: watch::Sender<MuteAction>,
    events_tx: broadcast::Sender<MemberEvent>,
}

impl CallSession {
    /// Spawn a new call session actor.
    ///
    /// Returns a handle for the UI, the sender the engine pushes updates
    /// into, and the task join handle.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Identifier used in logs
    /// * `initial_state` - State to publish until the engine reports one
    /// * `services` - Engine collaborators and the permission handler
    /// * `config` - Channel sizes, fetch timeout and summary size
    /// * `cancel_token` - Cancellation token for shutdown
    pub fn spawn(
        session_id: SessionId,
        initial_state: CallState,
        services: EngineServices,
        config: &Config,
        cancel_token: CancellationToken,
    ) -> (CallSessionHandle, EngineEventSender, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.session_channel_buffer);
        let (engine_sender, engine_events) = mpsc::channel(config.engine_event_buffer);
        let (completion_sender, completions) = mpsc::channel(config.session_channel_buffer);

        let members = MembersSnapshot::default();
        let summary = CallSummary::from_snapshots(
            &initial_state,
            &members,
            config.summary_top_participants,
        );
        let mute_action = if initial_state.mute_state.is_some() {
            MuteAction::default()
        } else {
            MuteAction::Unmuted
        };

        let (state_tx, state_rx) = watch::channel(initial_state.clone());
        let (members_tx, members_rx) = watch::channel(members.clone());
        let (summary_tx, summary_rx) = watch::channel(summary);
        let (mute_tx, mute_rx) = watch::channel(mute_action);
        let (events_tx, _) = broadcast::channel(config.engine_event_buffer);

        let actor = Self {
            session_id,
            receiver,
            engine_events,
            completions,
            completion_sender,
            cancel_token: cancel_token.clone(),
            services,
            members_fetch_timeout: config.members_fetch_timeout,
            summary_top_participants: config.summary_top_participants,
            state: initial_state,
            members,
            participants: Vec::new(),
            requested_videos: Vec::new(),
            mute_action,
            pending_schedule_subscription: None,
            last_state_version: None,
            last_members_version: None,
            last_participants_version: None,
            mute_request_seq: 0,
            subscription_seq: 0,
            load_more_in_flight: false,
            pending_commands: 0,
            engine_connected: true,
            state_tx,
            members_tx,
            summary_tx,
            mute_tx,
            events_tx: events_tx.clone(),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = CallSessionHandle {
            sender,
            cancel_token,
            session_id,
            state: state_rx,
            members: members_rx,
            summary: summary_rx,
            mute_action: mute_rx,
            member_events: events_tx,
        };

        (handle, engine_sender, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "call.session", fields(session_id = %self.session_id))]
    async fn run(mut self) {
        info!(target: "call.session", "CallSession started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: "call.session", "CallSession received cancellation signal");
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(target: "call.session", "CallSession channel closed, exiting");
                            break;
                        }
                    }
                }

                event = self.engine_events.recv(), if self.engine_connected => {
                    match event {
                        Some(event) => self.apply_engine_event(event),
                        None => {
                            info!(target: "call.session", "Engine update channel closed");
                            self.engine_connected = false;
                        }
                    }
                }

                Some(completion) = self.completions.recv() => {
                    self.handle_completion(completion);
                }
            }
        }

        info!(
            target: "call.session",
            participants = self.members.participants.len(),
            requested_videos = self.requested_videos.len(),
            pending_commands = self.pending_commands,
            "CallSession stopped"
        );
    }

    /// Handle a single message. Never waits on the engine.
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::LoadMore { respond_to } => {
                self.handle_load_more(respond_to);
            }

            SessionMessage::SetRequestedVideos { videos, respond_to } => {
                self.configure_subscriptions(videos, respond_to);
            }

            SessionMessage::RequestVideos {
                selections,
                respond_to,
            } => {
                self.handle_request_videos(&selections, respond_to);
            }

            SessionMessage::SetMuteAction { action, respond_to } => {
                self.handle_set_mute_action(action, respond_to);
            }

            SessionMessage::SetPeerMuted {
                peer,
                muted,
                respond_to,
            } => {
                if let Err(e) = self.require_admin("muting participants") {
                    reply("set_peer_muted", respond_to, Err(e));
                    return;
                }
                let moderator = Arc::clone(&self.services.moderator);
                self.forward("set_peer_muted", respond_to, async move {
                    moderator.set_peer_muted(peer, muted).await
                });
            }

            SessionMessage::SetDefaultParticipantsMuted { muted, respond_to } => {
                self.handle_set_default_participants_muted(muted, respond_to);
            }

            SessionMessage::RaiseHand { respond_to } => {
                let moderator = Arc::clone(&self.services.moderator);
                let me = self.state.my_peer_id;
                self.forward("raise_hand", respond_to, async move {
                    moderator.set_raised_hand(me, true).await
                });
            }

            SessionMessage::LowerHand { peer, respond_to } => {
                if peer != self.state.my_peer_id {
                    if let Err(e) = self.require_admin("lowering another participant's hand") {
                        reply("lower_hand", respond_to, Err(e));
                        return;
                    }
                }
                let moderator = Arc::clone(&self.services.moderator);
                self.forward("lower_hand", respond_to, async move {
                    moderator.set_raised_hand(peer, false).await
                });
            }

            SessionMessage::SetTitle { title, respond_to } => {
                if let Err(e) = self.require_admin("renaming the call") {
                    reply("set_title", respond_to, Err(e));
                    return;
                }
                let moderator = Arc::clone(&self.services.moderator);
                self.forward("set_title", respond_to, async move {
                    moderator.set_title(title).await
                });
            }

            SessionMessage::ToggleScheduleSubscription { respond_to } => {
                self.handle_toggle_schedule_subscription(respond_to);
            }

            SessionMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }
        }
    }

    /// Handle the result of engine work run off the actor.
    fn handle_completion(&mut self, completion: Completion) {
        self.pending_commands = self.pending_commands.saturating_sub(1);

        match completion {
            Completion::LoadMore {
                token,
                result,
                respond_to,
            } => self.handle_load_more_completed(&token, result, respond_to),

            Completion::MicrophoneDecision {
                action,
                seq,
                granted,
                respond_to,
            } => self.handle_microphone_decision(action, seq, granted, respond_to),

            Completion::MuteActionApplied {
                action,
                seq,
                result,
                respond_to,
            } => self.handle_mute_action_applied(action, seq, result, respond_to),

            Completion::SubscriptionsConfigured {
                videos,
                seq,
                result,
                respond_to,
            } => self.handle_subscriptions_configured(videos, seq, result, respond_to),

            Completion::ScheduleSubscription {
                subscribed,
                result,
                respond_to,
            } => {
                if result.is_err() && self.pending_schedule_subscription == Some(subscribed) {
                    self.pending_schedule_subscription = None;
                }
                reply(
                    "toggle_schedule_subscription",
                    respond_to,
                    result.map(|()| subscribed),
                );
            }

            Completion::Forwarded {
                command,
                result,
                respond_to,
            } => reply(command, respond_to, result),
        }
    }

    /// Run engine work in its own task and feed the result back.
    ///
    /// On cancellation the work is dropped together with its responder.
    fn spawn_engine_call<F>(&mut self, work: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.pending_commands += 1;
        let completions = self.completion_sender.clone();
        let cancel_token = self.cancel_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = cancel_token.cancelled() => {}
                completion = work => {
                    // The actor may be gone; the caller then sees a receive failure
                    let _ = completions.send(completion).await;
                }
            }
        });
    }

    /// Forward a moderation request that changes no local state.
    fn forward<F>(&mut self, command: &'static str, respond_to: Responder<()>, call: F)
    where
        F: Future<Output = Result<(), SessionError>> + Send + 'static,
    {
        self.spawn_engine_call(async move {
            Completion::Forwarded {
                command,
                result: call.await,
                respond_to,
            }
        });
    }

    /// Apply one engine update unless it is stale.
    fn apply_engine_event(&mut self, event: EngineEvent) {
        let kind = event.kind();
        let version = event.version();
        let last_version = match &event {
            EngineEvent::State { .. } | EngineEvent::NetworkChanged { .. } => {
                self.last_state_version
            }
            EngineEvent::Members { .. } => self.last_members_version,
            EngineEvent::Participants { .. } => self.last_participants_version,
        };

        if last_version.is_some_and(|last| version <= last) {
            metrics::record_stale_update(kind);
            warn!(
                target: "call.session",
                kind,
                version,
                last_version = ?last_version,
                "Dropping stale engine update"
            );
            return;
        }

        match event {
            EngineEvent::State { version, state } => {
                self.last_state_version = Some(version);
                self.apply_state(state);
            }

            EngineEvent::NetworkChanged { version, network } => {
                self.last_state_version = Some(version);
                let mut next = self.state.clone();
                next.network_state = network;
                self.apply_state(next);
            }

            EngineEvent::Members { version, snapshot } => {
                self.last_members_version = Some(version);
                let events = snapshot.diff(&self.members);
                self.publish_members(snapshot);
                for event in events {
                    // No subscribers is fine
                    let _ = self.events_tx.send(event);
                }
            }

            EngineEvent::Participants {
                version,
                participants,
            } => {
                self.last_participants_version = Some(version);
                self.participants = participants;
            }
        }

        metrics::record_engine_update(kind);
        debug!(target: "call.session", kind, version, "Applied engine update");
    }

    fn apply_state(&mut self, next: CallState) {
        match self.state.network_state.transition(next.network_state) {
            NetworkTransition::Established => {
                info!(target: "call.session", "Call connected");
            }
            NetworkTransition::Reconnecting => {
                metrics::record_reconnect();
                warn!(target: "call.session", "Call connection lost, reconnecting");
            }
            NetworkTransition::Unchanged => {}
        }

        // An admin mute closes the microphone even if push-to-talk is held
        if !next.can_self_unmute() && self.mute_action.opens_microphone() {
            info!(target: "call.session", "Muted by an admin");
            self.mute_action = MuteAction::default();
            self.mute_tx.send_replace(self.mute_action);
        }

        if next.schedule_timestamp.is_none()
            || self.pending_schedule_subscription == Some(next.subscribed_to_scheduled)
        {
            self.pending_schedule_subscription = None;
        }

        self.state = next;
        self.state_tx.send_replace(self.state.clone());
        self.publish_summary();
    }

    fn publish_members(&mut self, snapshot: MembersSnapshot) {
        self.members = snapshot;
        self.members_tx.send_replace(self.members.clone());
        self.publish_summary();
    }

    fn publish_summary(&self) {
        self.summary_tx.send_replace(CallSummary::from_snapshots(
            &self.state,
            &self.members,
            self.summary_top_participants,
        ));
    }

    /// Start a roster page fetch, or reject the request.
    fn handle_load_more(&mut self, respond_to: Responder<MembersSnapshot>) {
        if self.load_more_in_flight {
            metrics::record_load_more("rejected");
            reply("load_more", respond_to, Err(SessionError::LoadMoreInProgress));
            return;
        }

        let Some(token) = self.members.load_more_token.clone() else {
            metrics::record_load_more("rejected");
            reply("load_more", respond_to, Err(SessionError::RosterComplete));
            return;
        };

        self.load_more_in_flight = true;
        debug!(
            target: "call.session",
            loaded = self.members.participants.len(),
            total = self.members.total_count,
            "Loading next roster page"
        );

        let fetcher = Arc::clone(&self.services.members);
        let timeout = self.members_fetch_timeout;

        self.spawn_engine_call(async move {
            let result = match tokio::time::timeout(timeout, fetcher.fetch_members(token.clone()))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(SessionError::EngineTimeout),
            };
            Completion::LoadMore {
                token,
                result,
                respond_to,
            }
        });
    }

    /// Merge a fetched page into the roster it was requested against.
    fn handle_load_more_completed(
        &mut self,
        token: &str,
        result: Result<MembersPage, SessionError>,
        respond_to: Responder<MembersSnapshot>,
    ) {
        self.load_more_in_flight = false;

        let current_token = self.members.load_more_token.as_deref();
        let result = match result {
            Ok(page) if current_token == Some(token) => {
                let merged = self.members.merge_page(page);
                debug!(
                    target: "call.session",
                    loaded = merged.participants.len(),
                    total = merged.total_count,
                    complete = merged.is_complete(),
                    "Roster page merged"
                );
                self.publish_members(merged.clone());
                Ok(merged)
            }
            Ok(_) => Err(SessionError::RosterChanged),
            Err(e) => Err(e),
        };

        metrics::record_load_more(if result.is_ok() { "success" } else { "error" });
        reply("load_more", respond_to, result);
    }

    fn handle_request_videos(
        &mut self,
        selections: &[VideoSelection],
        respond_to: Responder<Vec<RequestedVideo>>,
    ) {
        // Raw participant records first: they carry the freshest track descriptions
        let candidates: Vec<Participant> = self
            .participants
            .iter()
            .chain(self.members.participants.iter())
            .cloned()
            .collect();

        let videos = collect_requested_videos(&candidates, selections);
        if videos.len() < selections.len() {
            debug!(
                target: "call.session",
                selected = selections.len(),
                requested = videos.len(),
                "Some selections could not produce a video request"
            );
        }

        self.configure_subscriptions(videos, respond_to);
    }

    fn configure_subscriptions(
        &mut self,
        videos: Vec<RequestedVideo>,
        respond_to: Responder<Vec<RequestedVideo>>,
    ) {
        self.subscription_seq += 1;
        let seq = self.subscription_seq;
        let media = Arc::clone(&self.services.media);

        self.spawn_engine_call(async move {
            let result = media.configure_subscriptions(videos.clone()).await;
            Completion::SubscriptionsConfigured {
                videos,
                seq,
                result,
                respond_to,
            }
        });
    }

    fn handle_subscriptions_configured(
        &mut self,
        videos: Vec<RequestedVideo>,
        seq: u64,
        result: Result<(), SessionError>,
        respond_to: Responder<Vec<RequestedVideo>>,
    ) {
        if let Err(e) = result {
            reply("configure_subscriptions", respond_to, Err(e));
            return;
        }

        // A newer list may already have been accepted
        if seq == self.subscription_seq {
            metrics::set_requested_videos(videos.len());
            debug!(
                target: "call.session",
                count = videos.len(),
                "Video subscriptions configured"
            );
            self.requested_videos.clone_from(&videos);
        }
        reply("configure_subscriptions", respond_to, Ok(videos));
    }

    fn handle_set_mute_action(&mut self, action: MuteAction, respond_to: Responder<()>) {
        if action.opens_microphone() && !self.state.can_self_unmute() {
            reply("set_mute_action", respond_to, Err(muted_by_admin()));
            return;
        }

        self.mute_request_seq += 1;
        let seq = self.mute_request_seq;

        if action.opens_microphone() {
            debug!(target: "call.session", "Asking for microphone access");
            let permissions = Arc::clone(&self.services.permissions);
            self.spawn_engine_call(async move {
                let granted = permissions.request_microphone().await;
                Completion::MicrophoneDecision {
                    action,
                    seq,
                    granted,
                    respond_to,
                }
            });
        } else {
            self.send_mute_action(action, seq, respond_to);
        }
    }

    fn send_mute_action(&mut self, action: MuteAction, seq: u64, respond_to: Responder<()>) {
        let moderator = Arc::clone(&self.services.moderator);
        self.spawn_engine_call(async move {
            let result = moderator.set_mute_action(action).await;
            Completion::MuteActionApplied {
                action,
                seq,
                result,
                respond_to,
            }
        });
    }

    /// Continue a mute request once the permission prompt is answered.
    ///
    /// The call state may have changed while the prompt was open.
    fn handle_microphone_decision(
        &mut self,
        action: MuteAction,
        seq: u64,
        granted: bool,
        respond_to: Responder<()>,
    ) {
        let denial = if seq != self.mute_request_seq {
            SessionError::Superseded
        } else if !granted {
            SessionError::PermissionDenied("microphone access denied".to_string())
        } else if !self.state.can_self_unmute() {
            muted_by_admin()
        } else {
            self.send_mute_action(action, seq, respond_to);
            return;
        };

        reply("set_mute_action", respond_to, Err(denial));
    }

    fn handle_mute_action_applied(
        &mut self,
        action: MuteAction,
        seq: u64,
        result: Result<(), SessionError>,
        respond_to: Responder<()>,
    ) {
        if result.is_ok() && seq == self.mute_request_seq {
            if action.opens_microphone() && !self.state.can_self_unmute() {
                reply("set_mute_action", respond_to, Err(muted_by_admin()));
                return;
            }
            self.mute_action = action;
            self.mute_tx.send_replace(action);
        }
        reply("set_mute_action", respond_to, result);
    }

    fn handle_set_default_participants_muted(&mut self, muted: bool, respond_to: Responder<()>) {
        let check = self
            .require_admin("changing the default mute policy")
            .and_then(|()| {
                if self.state.default_participant_mute_state.can_change {
                    Ok(())
                } else {
                    Err(SessionError::PermissionDenied(
                        "default mute policy is locked".to_string(),
                    ))
                }
            });
        if let Err(e) = check {
            reply("set_default_participants_muted", respond_to, Err(e));
            return;
        }

        let moderator = Arc::clone(&self.services.moderator);
        self.forward("set_default_participants_muted", respond_to, async move {
            moderator.set_default_participants_muted(muted).await
        });
    }

    /// Flip the schedule subscription, counting a change still on its way
    /// to the engine as the current value.
    fn handle_toggle_schedule_subscription(&mut self, respond_to: Responder<bool>) {
        let Some(schedule) = self.state.schedule_state() else {
            reply(
                "toggle_schedule_subscription",
                respond_to,
                Err(SessionError::NotScheduled),
            );
            return;
        };

        let subscribed = !self
            .pending_schedule_subscription
            .unwrap_or(schedule.subscribed);
        self.pending_schedule_subscription = Some(subscribed);

        let moderator = Arc::clone(&self.services.moderator);
        self.spawn_engine_call(async move {
            let result = moderator.set_schedule_subscription(subscribed).await;
            Completion::ScheduleSubscription {
                subscribed,
                result,
                respond_to,
            }
        });
    }

    fn require_admin(&self, action: &str) -> Result<(), SessionError> {
        if self.state.is_admin(&self.state.my_peer_id) {
            Ok(())
        } else {
            Err(SessionError::PermissionDenied(format!(
                "{action} requires call management rights"
            )))
        }
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            last_state_version: self.last_state_version,
            last_members_version: self.last_members_version,
            last_participants_version: self.last_participants_version,
            load_more_in_flight: self.load_more_in_flight,
            pending_commands: self.pending_commands,
            requested_videos: self.requested_videos.len(),
            engine_connected: self.engine_connected,
        }
    }
}

fn muted_by_admin() -> SessionError {
    SessionError::PermissionDenied("muted by an admin".to_string())
}

/// Send a command result, recording failures.
fn reply<T>(command: &'static str, respond_to: Responder<T>, result: Result<T, SessionError>) {
    if let Err(e) = &result {
        metrics::record_error(e.error_type_label());
        warn!(target: "call.session", command, error = %e, "Session command failed");
    }
    let _ = respond_to.send(result);
}
