//! Line format used by stream sources: one JSON object per chat message.
//!
//! `stream_id` and `platform` may be omitted when the source is bound to a
//! single stream; `name`/`channel_id`/`text` are accepted as aliases because
//! chat scrapers disagree on field names.

use crate::models::{Comment, Platform, StreamId};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct SourceLine {
    #[serde(alias = "name")]
    pub author: String,
    #[serde(alias = "channel_id", alias = "user_id")]
    pub author_id: String,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(alias = "text")]
    pub message: String,
    #[serde(default)]
    pub stream_id: Option<StreamId>,
    #[serde(default, alias = "datetime")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SourceDefaults<'a> {
    pub stream_id: &'a StreamId,
    pub platform: Platform,
}

/// Decode one line. Blank lines yield `Ok(None)`.
pub fn decode_line(line: &str, defaults: SourceDefaults<'_>) -> serde_json::Result<Option<Comment>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let raw: SourceLine = serde_json::from_str(line)?;
    Ok(Some(Comment {
        author: raw.author,
        author_id: raw.author_id,
        platform: raw.platform.unwrap_or(defaults.platform),
        message: raw.message,
        stream_id: raw.stream_id.unwrap_or_else(|| defaults.stream_id.clone()),
        timestamp: raw.timestamp,
    }))
}
