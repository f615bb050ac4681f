use domain::{Comment, StreamId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamCounters {
    pub comments: u64,
    pub processed_requests: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub stream_id: StreamId,
    pub title: String,
    pub active: bool,
    #[serde(flatten)]
    pub counters: StreamCounters,
}

#[derive(Debug, Default)]
struct StreamState {
    title: String,
    active: bool,
    comments: Vec<Comment>,
    counters: StreamCounters,
}

/// Known streams with their comment logs and counters.
///
/// A stream that has been stopped stays registered: comments already handed
/// to the router for it are still processed.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: HashMap<StreamId, StreamState>,
    order: Vec<StreamId>,
}

impl StreamRegistry {
    /// Registers (or re-activates) a stream. Returns `true` when it is new.
    pub fn register(&mut self, stream_id: StreamId, title: impl Into<String>, active: bool) -> bool {
        let title = title.into();
        if let Some(state) = self.streams.get_mut(&stream_id) {
            if !title.is_empty() {
                state.title = title;
            }
            state.active = active;
            return false;
        }
        self.order.push(stream_id.clone());
        self.streams.insert(
            stream_id,
            StreamState {
                title,
                active,
                ..Default::default()
            },
        );
        true
    }

    pub fn contains(&self, stream_id: &StreamId) -> bool {
        self.streams.contains_key(stream_id)
    }

    pub fn set_active(&mut self, stream_id: &StreamId, active: bool) -> Option<StreamSummary> {
        let state = self.streams.get_mut(stream_id)?;
        state.active = active;
        self.summary(stream_id)
    }

    /// Appends to the stream's log and bumps its comment counter.
    pub fn record_comment(&mut self, comment: &Comment) -> Option<StreamCounters> {
        let state = self.streams.get_mut(&comment.stream_id)?;
        state.comments.push(comment.clone());
        state.counters.comments += 1;
        Some(state.counters)
    }

    pub fn record_processed(&mut self, stream_id: &StreamId, n: usize) -> Option<StreamCounters> {
        let state = self.streams.get_mut(stream_id)?;
        state.counters.processed_requests += n as u64;
        Some(state.counters)
    }

    pub fn comments(&self, stream_id: &StreamId) -> Option<&[Comment]> {
        self.streams.get(stream_id).map(|s| s.comments.as_slice())
    }

    pub fn summary(&self, stream_id: &StreamId) -> Option<StreamSummary> {
        let state = self.streams.get(stream_id)?;
        Some(StreamSummary {
            stream_id: stream_id.clone(),
            title: state.title.clone(),
            active: state.active,
            counters: state.counters,
        })
    }

    /// All streams in registration order.
    pub fn summaries(&self) -> Vec<StreamSummary> {
        self.order.iter().filter_map(|id| self.summary(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Platform;

    fn id(s: &str) -> StreamId {
        StreamId::new_unchecked(s.to_string())
    }

    fn comment(stream: &str) -> Comment {
        Comment {
            author: "a".into(),
            author_id: "1".into(),
            platform: Platform::Twitch,
            message: "hi".into(),
            stream_id: id(stream),
            timestamp: None,
        }
    }

    #[test]
    fn register_is_idempotent_and_keeps_counters() {
        let mut reg = StreamRegistry::default();
        assert!(reg.register(id("s"), "first", true));
        reg.record_comment(&comment("s"));
        assert!(!reg.register(id("s"), "", false));

        let summary = reg.summary(&id("s")).unwrap();
        assert_eq!(summary.title, "first");
        assert!(!summary.active);
        assert_eq!(summary.counters.comments, 1);
    }

    #[test]
    fn unknown_streams_are_not_recorded() {
        let mut reg = StreamRegistry::default();
        assert!(reg.record_comment(&comment("nope")).is_none());
        assert!(reg.record_processed(&id("nope"), 3).is_none());
        assert!(reg.comments(&id("nope")).is_none());
    }

    #[test]
    fn counters_accumulate() {
        let mut reg = StreamRegistry::default();
        reg.register(id("s"), "t", true);
        reg.record_comment(&comment("s"));
        reg.record_comment(&comment("s"));
        let counters = reg.record_processed(&id("s"), 2).unwrap();
        assert_eq!(
            counters,
            StreamCounters {
                comments: 2,
                processed_requests: 2
            }
        );
        assert_eq!(reg.comments(&id("s")).map(<[Comment]>::len), Some(2));
    }

    #[test]
    fn summaries_follow_registration_order() {
        let mut reg = StreamRegistry::default();
        reg.register(id("b"), "", true);
        reg.register(id("a"), "", true);
        let ids: Vec<String> = reg
            .summaries()
            .into_iter()
            .map(|s| s.stream_id.to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
