//! Flavor-text requests and the lore log they feed.
//!
//! The core never talks to a text generator. It queues [`FlavorRequest`]s
//! for the host and accepts [`FlavorResponse`]s back whenever they arrive.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::constants::{PURGE_LORE_PROMPT, PURGE_LORE_TITLE};

/// Text recorded when the generator fails or times out.
pub const FALLBACK_LORE: &str = "The system encountered a fatal error during extraction.";
/// Text recorded when the generator answers with nothing.
pub const EMPTY_LORE: &str = "No response from AI.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoreCategory {
    Monster,
    Setting,
    Item,
    Combat,
}

impl LoreCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monster => "Monster",
            Self::Setting => "Setting",
            Self::Item => "Item",
            Self::Combat => "Combat",
        }
    }
}

impl fmt::Display for LoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prompt waiting for the host's text generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRequest {
    /// Session epoch the request was raised in.
    pub epoch: u64,
    pub title: String,
    pub category: LoreCategory,
    pub prompt: String,
}

impl FlavorRequest {
    /// Request raised when a monster is purged.
    #[must_use]
    pub fn purge(epoch: u64) -> Self {
        Self {
            epoch,
            title: PURGE_LORE_TITLE.to_string(),
            category: LoreCategory::Combat,
            prompt: PURGE_LORE_PROMPT.to_string(),
        }
    }

    /// Pair this request with generated text.
    #[must_use]
    pub fn answer(&self, content: impl Into<String>) -> FlavorResponse {
        FlavorResponse {
            epoch: self.epoch,
            title: self.title.clone(),
            category: self.category,
            content: content.into(),
        }
    }
}

/// Generated text for an earlier [`FlavorRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorResponse {
    pub epoch: u64,
    pub title: String,
    pub category: LoreCategory,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreEntry {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub category: LoreCategory,
}

/// Lore entries, newest first.
#[derive(Debug, Clone, Default)]
pub struct LoreLog {
    next_id: u64,
    entries: VecDeque<LoreEntry>,
}

impl LoreLog {
    pub fn push(&mut self, response: FlavorResponse) -> &LoreEntry {
        self.next_id = self.next_id.wrapping_add(1);
        let content = if response.content.trim().is_empty() {
            EMPTY_LORE.to_string()
        } else {
            response.content
        };
        self.entries.push_front(LoreEntry {
            id: self.next_id,
            title: response.title,
            content,
            category: response.category,
        });
        &self.entries[0]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoreEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
