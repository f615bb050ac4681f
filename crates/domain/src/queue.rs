//! The shared, ordered request queue.
//!
//! Positions shown to users are `index + 1` of the live sequence and are
//! recomputed on every read. Entries are never edited in place.

use crate::matcher::RemovalMode;
use crate::models::{NumberedRequest, RequestEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestQueue {
    entries: Vec<RequestEntry>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<RequestEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|e| !e.content.trim().is_empty())
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RequestEntry] {
        &self.entries
    }

    /// Appends unless the content is blank. Returns whether anything was added.
    pub fn append(&mut self, mut entry: RequestEntry) -> bool {
        let trimmed = entry.content.trim();
        if trimmed.is_empty() {
            return false;
        }
        if trimmed.len() != entry.content.len() {
            entry.content = trimmed.to_string();
        }
        self.entries.push(entry);
        true
    }

    /// Removes the entries at the given 1-based positions, evaluated against
    /// the queue as it is before any removal. Out-of-range positions are
    /// ignored. Returns the removed entries in queue order.
    pub fn remove_by_numbers(&mut self, numbers: &[u32]) -> Vec<RequestEntry> {
        let mut indices: Vec<usize> = numbers
            .iter()
            .filter_map(|n| (*n as usize).checked_sub(1))
            .filter(|i| *i < self.entries.len())
            .collect();
        indices.sort_unstable();
        indices.dedup();

        let mut removed: Vec<RequestEntry> = indices
            .iter()
            .rev()
            .map(|i| self.entries.remove(*i))
            .collect();
        removed.reverse();
        removed
    }

    pub fn remove_default_first(&mut self) -> Vec<RequestEntry> {
        self.remove_by_numbers(&[1])
    }

    /// Removes the first entry whose content equals `content` after trimming.
    pub fn remove_by_content(&mut self, content: &str) -> Option<RequestEntry> {
        let content = content.trim();
        let index = self.entries.iter().position(|e| e.content == content)?;
        Some(self.entries.remove(index))
    }

    /// Manual single delete by 1-based position.
    pub fn remove_at(&mut self, number: usize) -> Option<RequestEntry> {
        let index = number.checked_sub(1)?;
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn apply(&mut self, mode: &RemovalMode) -> Vec<RequestEntry> {
        match mode {
            RemovalMode::DefaultFirst => self.remove_default_first(),
            RemovalMode::Numbers(numbers) => self.remove_by_numbers(numbers),
            RemovalMode::Content(content) => self.remove_by_content(content).into_iter().collect(),
        }
    }

    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn snapshot(&self) -> Vec<NumberedRequest> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| NumberedRequest {
                number: i + 1,
                content: e.content.clone(),
                author: e.author.clone(),
                platform: e.platform,
                stream_id: e.stream_id.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Platform, StreamId};

    fn entry(content: &str) -> RequestEntry {
        RequestEntry {
            content: content.into(),
            author: "viewer".into(),
            platform: Platform::YouTube,
            stream_id: StreamId::new_unchecked("live".into()),
        }
    }

    fn queue(items: &[&str]) -> RequestQueue {
        let mut q = RequestQueue::new();
        for item in items {
            q.append(entry(item));
        }
        q
    }

    fn contents(q: &RequestQueue) -> Vec<&str> {
        q.entries().iter().map(|e| e.content.as_str()).collect()
    }

    #[test]
    fn append_skips_blank_content() {
        let mut q = RequestQueue::new();
        assert!(!q.append(entry("   ")));
        assert!(q.append(entry("  song  ")));
        assert_eq!(contents(&q), vec!["song"]);
    }

    #[test]
    fn remove_by_numbers_uses_positions_before_removal() {
        let mut q = queue(&["A", "B", "C", "D"]);
        let removed = q.remove_by_numbers(&[1, 3]);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].content, "A");
        assert_eq!(removed[1].content, "C");
        assert_eq!(contents(&q), vec!["B", "D"]);
        let numbers: Vec<usize> = q.snapshot().iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn remove_by_numbers_ignores_out_of_range() {
        let mut q = queue(&["A", "B", "C"]);
        assert_eq!(q.remove_by_numbers(&[0, 2, 7, 99]).len(), 1);
        assert_eq!(contents(&q), vec!["A", "C"]);
        assert!(q.remove_by_numbers(&[]).is_empty());
    }

    #[test]
    fn remove_by_numbers_preserves_relative_order() {
        let items: Vec<String> = (1..=10).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        for picks in [vec![2u32, 4, 6], vec![1, 10], vec![3, 4, 5, 11], vec![10]] {
            let mut q = queue(&refs);
            let valid = picks.iter().filter(|n| (1..=10).contains(*n)).count();
            assert_eq!(q.remove_by_numbers(&picks).len(), valid);

            let expected: Vec<&str> = refs
                .iter()
                .enumerate()
                .filter(|(i, _)| !picks.contains(&(*i as u32 + 1)))
                .map(|(_, s)| *s)
                .collect();
            assert_eq!(contents(&q), expected);
        }
    }

    #[test]
    fn default_first_removes_head() {
        let mut q = queue(&["A", "B"]);
        assert_eq!(q.remove_default_first().len(), 1);
        assert_eq!(contents(&q), vec!["B"]);

        let mut empty = RequestQueue::new();
        assert!(empty.remove_default_first().is_empty());
    }

    #[test]
    fn remove_by_content_takes_first_match_once() {
        let mut q = queue(&["x", "y", "x"]);
        assert!(q.remove_by_content(" x ").is_some());
        assert_eq!(contents(&q), vec!["y", "x"]);

        let mut q = queue(&["a", "b"]);
        assert!(q.remove_by_content("b").is_some());
        assert!(q.remove_by_content("b").is_none());
        assert_eq!(contents(&q), vec!["a"]);
    }

    #[test]
    fn apply_dispatches_on_mode() {
        let mut q = queue(&["A", "B", "C"]);
        assert_eq!(q.apply(&RemovalMode::Numbers(vec![])).len(), 0);
        assert_eq!(q.apply(&RemovalMode::Content("B".into())).len(), 1);
        assert_eq!(q.apply(&RemovalMode::DefaultFirst).len(), 1);
        assert_eq!(contents(&q), vec!["C"]);
    }

    #[test]
    fn manual_remove_and_clear() {
        let mut q = queue(&["A", "B", "C"]);
        assert!(q.remove_at(0).is_none());
        assert!(q.remove_at(4).is_none());
        assert_eq!(q.remove_at(2).map(|e| e.content), Some("B".to_string()));
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }
}
