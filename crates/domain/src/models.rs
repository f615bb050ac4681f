use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::StreamIdError;

pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "youtube")]
    YouTube,
    Twitch,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Twitch => "twitch",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Self::YouTube),
            "twitch" => Ok(Self::Twitch),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub const MAX_LEN: usize = 128;

    pub fn new(s: impl Into<String>) -> Result<Self, StreamIdError> {
        let s = s.into();
        if s.is_empty() {
            return Err(StreamIdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(StreamIdError::Whitespace);
        }
        if s.chars().count() > Self::MAX_LEN {
            return Err(StreamIdError::TooLong(Self::MAX_LEN));
        }
        Ok(Self(s))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat message as delivered by a stream source. Never mutated after receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub author_id: String,
    pub platform: Platform,
    pub message: String,
    pub stream_id: StreamId,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Comment {
    /// Rendering time for the display sink: the comment's own timestamp when it
    /// parses, otherwise `now`.
    pub fn display_time(&self, now: NaiveDateTime) -> String {
        self.timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now)
            .format(DISPLAY_TIME_FORMAT)
            .to_string()
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// A user on one platform. Equality ignores `name`, which is display-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub platform: Platform,
    pub id: String,
    pub name: String,
}

impl Identity {
    pub fn new(platform: Platform, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn matches(&self, platform: Platform, id: &str) -> bool {
        self.platform == platform && self.id == id
    }

    pub fn of_author(comment: &Comment) -> Self {
        Self::new(comment.platform, &comment.author_id, &comment.author)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.platform, &other.id)
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.platform.hash(state);
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEntry {
    pub content: String,
    pub author: String,
    pub platform: Platform,
    pub stream_id: StreamId,
}

/// A queue entry paired with its position at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedRequest {
    pub number: usize,
    pub content: String,
    pub author: String,
    pub platform: Platform,
    pub stream_id: StreamId,
}

impl NumberedRequest {
    pub fn to_entry(&self) -> RequestEntry {
        RequestEntry {
            content: self.content.clone(),
            author: self.author.clone(),
            platform: self.platform,
            stream_id: self.stream_id.clone(),
        }
    }
}
