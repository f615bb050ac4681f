//! Classifies chat messages against the configured trigger words.
//!
//! Push words mark an add-request when they are a *prefix* of the message;
//! pull words mark a remove-request when they appear *anywhere* in it. In
//! each direction only the first configured word that matches is considered,
//! even when the sender turns out not to be allowed to use it.

use serde::{Deserialize, Serialize};

use crate::numbers::{is_number_list, parse_numbers};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerWords {
    pub push_words: Vec<String>,
    pub pull_words: Vec<String>,
}

impl Default for TriggerWords {
    fn default() -> Self {
        Self {
            push_words: ["お題 ", "お題　", "リク ", "リク　"]
                .into_iter()
                .map(String::from)
                .collect(),
            pull_words: ["リクあり", "消化済"].into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionFlags {
    pub push_manager_only: bool,
    pub pull_manager_only: bool,
}

/// How a message that matches both a push and a pull word is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Both passes run; a message may add and remove at once.
    #[default]
    Independent,
    /// A push match, allowed or not, ends matching for the message.
    Exclusive,
}

impl MatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Exclusive => "exclusive",
        }
    }
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "independent" => Ok(Self::Independent),
            "exclusive" => Ok(Self::Exclusive),
            other => Err(format!("unknown match policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<T> {
    Allowed(T),
    Denied { word: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCommand {
    pub word: String,
    /// Message with the push word stripped and trimmed. May be empty.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveCommand {
    pub word: String,
    /// Text after the first occurrence of the pull word, trimmed.
    pub remainder: String,
}

impl RemoveCommand {
    pub fn mode(&self) -> RemovalMode {
        RemovalMode::from_remainder(&self.remainder)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMatch {
    pub add: Option<Verdict<AddCommand>>,
    pub remove: Option<Verdict<RemoveCommand>>,
}

impl CommandMatch {
    pub fn is_empty(&self) -> bool {
        self.add.is_none() && self.remove.is_none()
    }
}

/// Which entries a remove command targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalMode {
    /// No remainder: drop the head of the queue.
    DefaultFirst,
    /// 1-based positions; may be empty when nothing parsed.
    Numbers(Vec<u32>),
    /// Exact content of the entry to drop.
    Content(String),
}

impl RemovalMode {
    pub fn from_remainder(remainder: &str) -> Self {
        let remainder = remainder.trim();
        if remainder.is_empty() {
            Self::DefaultFirst
        } else if is_number_list(remainder) {
            Self::Numbers(parse_numbers(remainder))
        } else {
            Self::Content(remainder.to_string())
        }
    }
}

pub fn match_command(
    message: &str,
    words: &TriggerWords,
    flags: PermissionFlags,
    is_privileged: bool,
    policy: MatchPolicy,
) -> CommandMatch {
    let add = match_push(message, &words.push_words, flags.push_manager_only, is_privileged);

    if policy == MatchPolicy::Exclusive && add.is_some() {
        return CommandMatch { add, remove: None };
    }

    let remove = match_pull(message, &words.pull_words, flags.pull_manager_only, is_privileged);
    CommandMatch { add, remove }
}

fn match_push(
    message: &str,
    push_words: &[String],
    manager_only: bool,
    is_privileged: bool,
) -> Option<Verdict<AddCommand>> {
    let word = push_words
        .iter()
        .find(|w| !w.is_empty() && message.starts_with(w.as_str()))?;

    if manager_only && !is_privileged {
        return Some(Verdict::Denied { word: word.clone() });
    }

    Some(Verdict::Allowed(AddCommand {
        word: word.clone(),
        content: message[word.len()..].trim().to_string(),
    }))
}

fn match_pull(
    message: &str,
    pull_words: &[String],
    manager_only: bool,
    is_privileged: bool,
) -> Option<Verdict<RemoveCommand>> {
    let word = pull_words
        .iter()
        .find(|w| !w.is_empty() && message.contains(w.as_str()))?;

    if manager_only && !is_privileged {
        return Some(Verdict::Denied { word: word.clone() });
    }

    let remainder = message
        .split_once(word.as_str())
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default();

    Some(Verdict::Allowed(RemoveCommand {
        word: word.clone(),
        remainder,
    }))
}
