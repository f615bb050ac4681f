//! Per-comment state machine and the single mutation lock around the shared
//! queue, policy and stream registry.
//!
//! Every notification is stamped and pushed onto the event channel while the
//! lock is still held, so the receiving end observes events in exactly the
//! order mutations were committed. Nothing in here performs I/O.

use chrono::Local;
use domain::{
    match_command, CommandError, Comment, Identity, IngestEvent, MatchPolicy, NumberedRequest,
    PermissionFlags, PolicyError, PolicySnapshot, PolicyStore, RequestEntry, RequestQueue,
    Sequenced, StreamId, Verdict,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::{StreamCounters, StreamRegistry, StreamSummary};

pub type EventSender = mpsc::UnboundedSender<Sequenced<IngestEvent>>;
pub type EventReceiver = mpsc::UnboundedReceiver<Sequenced<IngestEvent>>;

/// What happened to one comment. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Blocked,
    UnknownStream,
    Processed(Dispatch),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub added: bool,
    pub removed: usize,
    pub add_denied: bool,
    pub remove_denied: bool,
}

struct CoreState {
    queue: RequestQueue,
    policy: PolicyStore,
    registry: StreamRegistry,
    next_seq: u64,
    events: EventSender,
}

impl CoreState {
    fn emit(&mut self, event: IngestEvent) {
        self.next_seq += 1;
        let kind = event.kind();
        if self
            .events
            .send(Sequenced {
                seq: self.next_seq,
                event,
            })
            .is_err()
        {
            warn!("Notification channel closed, dropping {} event", kind);
        }
    }

    fn emit_queue(&mut self) {
        let requests = self.queue.snapshot();
        self.emit(IngestEvent::QueueUpdated { requests });
    }

    fn emit_policy(&mut self) {
        let policy = self.policy.snapshot();
        self.emit(IngestEvent::PolicyUpdated { policy });
    }

    fn emit_counters(&mut self, stream_id: &StreamId, counters: StreamCounters) {
        self.emit(IngestEvent::CountersUpdated {
            stream_id: stream_id.clone(),
            comments: counters.comments,
            processed_requests: counters.processed_requests,
        });
    }

    fn emit_stream(&mut self, summary: StreamSummary) {
        self.emit(IngestEvent::StreamUpdated {
            stream_id: summary.stream_id,
            title: summary.title,
            active: summary.active,
        });
    }

    fn bump_processed(&mut self, stream_id: &StreamId, n: usize) {
        if let Some(counters) = self.registry.record_processed(stream_id, n) {
            self.emit_counters(stream_id, counters);
        }
    }
}

#[derive(Clone)]
pub struct CommentRouter {
    state: Arc<Mutex<CoreState>>,
}

impl CommentRouter {
    pub fn new(policy: PolicyStore, queue: RequestQueue) -> (Self, EventReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        let state = CoreState {
            queue,
            policy,
            registry: StreamRegistry::default(),
            next_seq: 0,
            events,
        };
        (
            Self {
                state: Arc::new(Mutex::new(state)),
            },
            rx,
        )
    }

    /// Run one comment through blocklist, storage, display and command
    /// dispatch.
    pub fn process_comment(&self, comment: Comment) -> RouteOutcome {
        let now = Local::now().naive_local();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.policy.is_blocked(comment.platform, &comment.author_id) {
            info!("Blocked user detected: {}, comment ignored", comment.author);
            return RouteOutcome::Blocked;
        }

        let Some(counters) = state.registry.record_comment(&comment) else {
            warn!(
                "Comment for unknown stream {} dropped (author: {})",
                comment.stream_id, comment.author
            );
            return RouteOutcome::UnknownStream;
        };

        let display_time = comment.display_time(now);
        state.emit(IngestEvent::CommentSaved {
            comment: comment.clone(),
            display_time,
        });
        state.emit_counters(&comment.stream_id, counters);

        let dispatch = dispatch_commands(state, &comment);
        RouteOutcome::Processed(dispatch)
    }

    // --- 运营者接口 ---

    pub fn requests(&self) -> Vec<NumberedRequest> {
        self.state.lock().queue.snapshot()
    }

    pub fn add_request(&self, entry: RequestEntry) -> Result<(), CommandError> {
        let mut state = self.state.lock();
        if !state.registry.contains(&entry.stream_id) {
            return Err(CommandError::UnknownStream(entry.stream_id));
        }
        if !state.queue.append(entry) {
            return Err(CommandError::BlankRequest);
        }
        state.emit_queue();
        Ok(())
    }

    pub fn remove_request(&self, number: usize) -> Result<RequestEntry, CommandError> {
        let mut state = self.state.lock();
        let removed = state
            .queue
            .remove_at(number)
            .ok_or(CommandError::NoSuchRequest(number))?;
        info!("Request #{} removed manually: {}", number, removed.content);
        state.emit_queue();
        Ok(removed)
    }

    pub fn clear_requests(&self) -> usize {
        let mut state = self.state.lock();
        let n = state.queue.clear();
        if n > 0 {
            info!("Cleared {} requests", n);
            state.emit_queue();
        }
        n
    }

    pub fn policy(&self) -> PolicySnapshot {
        self.state.lock().policy.snapshot()
    }

    pub fn add_manager(&self, identity: Identity) -> Result<(), PolicyError> {
        self.update_policy(|p| p.add_manager(identity))
    }

    pub fn remove_manager(&self, index: usize) -> Result<Identity, PolicyError> {
        self.update_policy(|p| p.remove_manager(index))
    }

    pub fn add_blocked_user(&self, identity: Identity) -> Result<(), PolicyError> {
        self.update_policy(|p| p.add_blocked_user(identity))
    }

    pub fn remove_blocked_user(&self, index: usize) -> Result<Identity, PolicyError> {
        self.update_policy(|p| p.remove_blocked_user(index))
    }

    pub fn add_push_word(&self, word: &str) -> Result<(), PolicyError> {
        self.update_policy(|p| p.add_push_word(word))
    }

    pub fn remove_push_word(&self, word: &str) -> Result<(), PolicyError> {
        self.update_policy(|p| p.remove_push_word(word))
    }

    pub fn add_pull_word(&self, word: &str) -> Result<(), PolicyError> {
        self.update_policy(|p| p.add_pull_word(word))
    }

    pub fn remove_pull_word(&self, word: &str) -> Result<(), PolicyError> {
        self.update_policy(|p| p.remove_pull_word(word))
    }

    pub fn set_permissions(&self, flags: PermissionFlags) {
        let mut state = self.state.lock();
        state.policy.set_flags(flags);
        state.emit_policy();
    }

    pub fn set_match_policy(&self, policy: MatchPolicy) {
        let mut state = self.state.lock();
        state.policy.set_match_policy(policy);
        state.emit_policy();
    }

    /// Nothing is announced when `f` rejects the change.
    fn update_policy<T>(
        &self,
        f: impl FnOnce(&mut PolicyStore) -> Result<T, PolicyError>,
    ) -> Result<T, PolicyError> {
        let mut state = self.state.lock();
        let out = f(&mut state.policy)?;
        state.emit_policy();
        Ok(out)
    }

    pub fn streams(&self) -> Vec<StreamSummary> {
        self.state.lock().registry.summaries()
    }

    pub fn stream(&self, stream_id: &StreamId) -> Option<StreamSummary> {
        self.state.lock().registry.summary(stream_id)
    }

    pub fn stream_comments(&self, stream_id: &StreamId) -> Option<Vec<Comment>> {
        self.state
            .lock()
            .registry
            .comments(stream_id)
            .map(<[Comment]>::to_vec)
    }

    /// Returns `true` when the stream was not known before.
    pub fn register_stream(&self, stream_id: StreamId, title: &str) -> bool {
        let mut state = self.state.lock();
        let created = state.registry.register(stream_id.clone(), title, true);
        if let Some(summary) = state.registry.summary(&stream_id) {
            state.emit_stream(summary);
        }
        created
    }

    /// Restores a stream known from an earlier run without announcing it.
    pub fn restore_stream(&self, stream_id: StreamId, title: &str) {
        self.state.lock().registry.register(stream_id, title, false);
    }

    pub fn set_stream_active(&self, stream_id: &StreamId, active: bool) -> Result<(), CommandError> {
        let mut state = self.state.lock();
        let summary = state
            .registry
            .set_active(stream_id, active)
            .ok_or_else(|| CommandError::UnknownStream(stream_id.clone()))?;
        state.emit_stream(summary);
        Ok(())
    }
}

fn dispatch_commands(state: &mut CoreState, comment: &Comment) -> Dispatch {
    let mut dispatch = Dispatch::default();
    let author = &comment.author;

    info!("Processing command: '{}' from {}", comment.message, author);

    let privileged = state.policy.is_manager(comment.platform, &comment.author_id);
    let matched = match_command(
        &comment.message,
        state.policy.words(),
        state.policy.flags(),
        privileged,
        state.policy.match_policy(),
    );
    debug!(?matched, privileged, "Command match");

    match matched.add {
        Some(Verdict::Allowed(cmd)) => {
            info!("Pushword matched: '{}'", cmd.word);
            let entry = RequestEntry {
                content: cmd.content,
                author: author.clone(),
                platform: comment.platform,
                stream_id: comment.stream_id.clone(),
            };
            let content = entry.content.clone();
            if state.queue.append(entry) {
                info!("Request added: {} by {}", content, author);
                dispatch.added = true;
                state.emit_queue();
                state.bump_processed(&comment.stream_id, 1);
            } else {
                debug!("Pushword without content ignored");
            }
        }
        Some(Verdict::Denied { word }) => {
            info!("Request add denied: {} is not a manager (word: '{}')", author, word);
            dispatch.add_denied = true;
        }
        None => {}
    }

    match matched.remove {
        Some(Verdict::Allowed(cmd)) => {
            let mode = cmd.mode();
            info!(
                "Pullword matched: '{}', remainder: '{}', mode: {:?}",
                cmd.word, cmd.remainder, mode
            );
            let removed = state.queue.apply(&mode);
            for entry in &removed {
                info!("Request removed: {} by {}", entry.content, author);
            }
            if removed.is_empty() {
                info!("No requests removed for '{}'", cmd.remainder);
            } else {
                dispatch.removed = removed.len();
                state.emit_queue();
                state.bump_processed(&comment.stream_id, removed.len());
            }
        }
        Some(Verdict::Denied { word }) => {
            info!("Request remove denied: {} is not a manager (word: '{}')", author, word);
            dispatch.remove_denied = true;
        }
        None => {}
    }

    dispatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Platform, TriggerWords};

    fn stream() -> StreamId {
        StreamId::new_unchecked("live".into())
    }

    fn comment(author_id: &str, message: &str) -> Comment {
        Comment {
            author: format!("user-{}", author_id),
            author_id: author_id.into(),
            platform: Platform::YouTube,
            message: message.into(),
            stream_id: stream(),
            timestamp: None,
        }
    }

    fn router() -> (CommentRouter, EventReceiver) {
        let policy = PolicyStore::from(PolicySnapshot {
            words: TriggerWords {
                push_words: vec!["お題 ".into()],
                pull_words: vec!["消化".into()],
            },
            ..Default::default()
        });
        let (router, mut rx) = CommentRouter::new(policy, RequestQueue::new());
        router.register_stream(stream(), "test");
        while rx.try_recv().is_ok() {}
        (router, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<Sequenced<IngestEvent>> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn events_are_sequenced_in_commit_order() {
        let (router, mut rx) = router();
        router.process_comment(comment("1", "お題 a"));
        router.process_comment(comment("2", "消化"));

        let events = drain(&mut rx);
        let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert!(seqs.windows(2).all(|w| w[1] == w[0] + 1));

        let kinds: Vec<&str> = events.iter().map(|e| e.event.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "comment", "counters", "queue", "counters", // add
                "comment", "counters", "queue", "counters", // remove
            ]
        );
    }

    #[test]
    fn plain_chat_only_stores_and_displays() {
        let (router, mut rx) = router();
        let outcome = router.process_comment(comment("1", "こんにちは"));
        assert_eq!(outcome, RouteOutcome::Processed(Dispatch::default()));
        assert_eq!(drain(&mut rx).len(), 2);
        assert_eq!(router.stream_comments(&stream()).map(|c| c.len()), Some(1));
    }

    #[test]
    fn unknown_stream_is_dropped_silently() {
        let (router, mut rx) = router();
        let mut c = comment("1", "お題 a");
        c.stream_id = StreamId::new_unchecked("elsewhere".into());
        assert_eq!(router.process_comment(c), RouteOutcome::UnknownStream);
        assert!(drain(&mut rx).is_empty());
        assert!(router.requests().is_empty());
    }

    #[test]
    fn removal_counts_every_removed_entry() {
        let (router, mut rx) = router();
        for song in ["a", "b", "c"] {
            router.process_comment(comment("1", &format!("お題 {}", song)));
        }
        let outcome = router.process_comment(comment("1", "消化 1-2 9"));
        assert!(matches!(outcome, RouteOutcome::Processed(d) if d.removed == 2));
        assert_eq!(router.stream(&stream()).unwrap().counters.processed_requests, 5);

        // one queue notification for the whole batch
        let events = drain(&mut rx);
        let queue_events = events
            .iter()
            .rev()
            .take_while(|e| e.event.kind() != "comment")
            .filter(|e| e.event.kind() == "queue")
            .count();
        assert_eq!(queue_events, 1);
    }

    #[test]
    fn failed_removal_emits_no_queue_update() {
        let (router, mut rx) = router();
        router.process_comment(comment("1", "消化 42"));
        let kinds: Vec<&str> = drain(&mut rx).iter().map(|e| e.event.kind()).collect();
        assert_eq!(kinds, vec!["comment", "counters"]);
    }

    #[test]
    fn manual_operations() {
        let (router, _rx) = router();
        let entry = |content: &str| RequestEntry {
            content: content.into(),
            author: "operator".into(),
            platform: Platform::Twitch,
            stream_id: stream(),
        };
        router.add_request(entry("one")).unwrap();
        router.add_request(entry("two")).unwrap();
        assert_eq!(router.add_request(entry(" ")), Err(CommandError::BlankRequest));

        let mut foreign = entry("x");
        foreign.stream_id = StreamId::new_unchecked("nope".into());
        assert!(matches!(
            router.add_request(foreign),
            Err(CommandError::UnknownStream(_))
        ));

        assert_eq!(router.remove_request(3), Err(CommandError::NoSuchRequest(3)));
        assert_eq!(router.remove_request(1).map(|e| e.content), Ok("one".into()));
        assert_eq!(router.clear_requests(), 1);
        assert_eq!(router.clear_requests(), 0);
    }

    #[test]
    fn policy_changes_are_announced() {
        let (router, mut rx) = router();
        router
            .add_manager(Identity::new(Platform::YouTube, "UC1", "dj"))
            .unwrap();
        assert!(router
            .add_manager(Identity::new(Platform::YouTube, "UC1", "dj"))
            .is_err());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0].event,
            IngestEvent::PolicyUpdated { policy } if policy.managers.len() == 1
        ));
    }

    #[test]
    fn flag_and_match_policy_updates_are_announced() {
        let (router, mut rx) = router();
        router.set_permissions(PermissionFlags {
            push_manager_only: true,
            pull_manager_only: false,
        });
        router.set_match_policy(MatchPolicy::Exclusive);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1].event,
            IngestEvent::PolicyUpdated { policy }
                if policy.flags.push_manager_only && policy.match_policy == MatchPolicy::Exclusive
        ));
    }

    #[test]
    fn inactive_stream_still_processes() {
        let (router, _rx) = router();
        router.set_stream_active(&stream(), false).unwrap();
        router.process_comment(comment("1", "お題 late"));
        assert_eq!(router.requests().len(), 1);
    }
}
