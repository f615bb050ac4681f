use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyList};
use crate::matcher::{MatchPolicy, PermissionFlags, TriggerWords};
use crate::models::{Identity, Platform};

/// Everything the persistence store loads at startup and saves after a
/// policy mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub managers: Vec<Identity>,
    pub blocked_users: Vec<Identity>,
    pub flags: PermissionFlags,
    pub words: TriggerWords,
    pub match_policy: MatchPolicy,
}

/// Managers, blocked users, trigger words and permission gates.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    managers: Vec<Identity>,
    blocked_users: Vec<Identity>,
    flags: PermissionFlags,
    words: TriggerWords,
    match_policy: MatchPolicy,
}

impl From<PolicySnapshot> for PolicyStore {
    fn from(s: PolicySnapshot) -> Self {
        Self {
            managers: s.managers,
            blocked_users: s.blocked_users,
            flags: s.flags,
            words: s.words,
            match_policy: s.match_policy,
        }
    }
}

impl PolicyStore {
    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            managers: self.managers.clone(),
            blocked_users: self.blocked_users.clone(),
            flags: self.flags,
            words: self.words.clone(),
            match_policy: self.match_policy,
        }
    }

    pub fn is_manager(&self, platform: Platform, id: &str) -> bool {
        self.managers.iter().any(|m| m.matches(platform, id))
    }

    pub fn is_blocked(&self, platform: Platform, id: &str) -> bool {
        self.blocked_users.iter().any(|b| b.matches(platform, id))
    }

    pub fn managers(&self) -> &[Identity] {
        &self.managers
    }

    pub fn blocked_users(&self) -> &[Identity] {
        &self.blocked_users
    }

    pub fn flags(&self) -> PermissionFlags {
        self.flags
    }

    pub fn words(&self) -> &TriggerWords {
        &self.words
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.match_policy
    }

    pub fn add_manager(&mut self, identity: Identity) -> Result<(), PolicyError> {
        add_identity(&mut self.managers, PolicyList::Managers, identity)
    }

    pub fn remove_manager(&mut self, index: usize) -> Result<Identity, PolicyError> {
        remove_identity(&mut self.managers, PolicyList::Managers, index)
    }

    pub fn add_blocked_user(&mut self, identity: Identity) -> Result<(), PolicyError> {
        add_identity(&mut self.blocked_users, PolicyList::BlockedUsers, identity)
    }

    pub fn remove_blocked_user(&mut self, index: usize) -> Result<Identity, PolicyError> {
        remove_identity(&mut self.blocked_users, PolicyList::BlockedUsers, index)
    }

    pub fn add_push_word(&mut self, word: &str) -> Result<(), PolicyError> {
        add_word(&mut self.words.push_words, word)
    }

    pub fn remove_push_word(&mut self, word: &str) -> Result<(), PolicyError> {
        remove_word(&mut self.words.push_words, word)
    }

    pub fn add_pull_word(&mut self, word: &str) -> Result<(), PolicyError> {
        add_word(&mut self.words.pull_words, word)
    }

    pub fn remove_pull_word(&mut self, word: &str) -> Result<(), PolicyError> {
        remove_word(&mut self.words.pull_words, word)
    }

    pub fn set_flags(&mut self, flags: PermissionFlags) {
        self.flags = flags;
    }

    pub fn set_match_policy(&mut self, policy: MatchPolicy) {
        self.match_policy = policy;
    }
}

fn add_identity(
    list: &mut Vec<Identity>,
    kind: PolicyList,
    identity: Identity,
) -> Result<(), PolicyError> {
    if list.contains(&identity) {
        return Err(PolicyError::AlreadyExists {
            list: kind,
            identity,
        });
    }
    list.push(identity);
    Ok(())
}

fn remove_identity(
    list: &mut Vec<Identity>,
    kind: PolicyList,
    index: usize,
) -> Result<Identity, PolicyError> {
    if index >= list.len() {
        return Err(PolicyError::IndexOutOfRange { list: kind, index });
    }
    Ok(list.remove(index))
}

// Words are kept verbatim: a trailing space in "お題 " is significant.
fn add_word(words: &mut Vec<String>, word: &str) -> Result<(), PolicyError> {
    if word.trim().is_empty() {
        return Err(PolicyError::BlankWord);
    }
    if words.iter().any(|w| w == word) {
        return Err(PolicyError::DuplicateWord(word.to_string()));
    }
    words.push(word.to_string());
    Ok(())
}

fn remove_word(words: &mut Vec<String>, word: &str) -> Result<(), PolicyError> {
    let index = words
        .iter()
        .position(|w| w == word)
        .ok_or_else(|| PolicyError::UnknownWord(word.to_string()))?;
    words.remove(index);
    Ok(())
}
