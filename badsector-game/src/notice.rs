//! Short-lived player notices (the toast feed).
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::time::Duration;

use crate::constants::NOTICE_LIFETIME;

/// Notices raised by a single action, stored inline.
pub type NoticeSet = SmallVec<[Notice; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    /// Session clock reading after which the notice is dropped.
    pub expires_at: Duration,
}

/// Rolling feed of live notices.
#[derive(Debug, Clone, Default)]
pub struct NoticeFeed {
    next_id: u64,
    live: VecDeque<Notice>,
}

impl NoticeFeed {
    /// Raise a notice at session time `now`, returning a copy for the caller.
    pub fn raise(&mut self, kind: NoticeKind, message: impl Into<String>, now: Duration) -> Notice {
        self.next_id = self.next_id.wrapping_add(1);
        let notice = Notice {
            id: self.next_id,
            kind,
            message: message.into(),
            expires_at: now + NOTICE_LIFETIME,
        };
        self.live.push_back(notice.clone());
        notice
    }

    /// Drop every notice whose lifetime has passed.
    pub fn expire(&mut self, now: Duration) {
        self.live.retain(|notice| notice.expires_at > now);
    }

    #[must_use]
    pub fn live(&self) -> &VecDeque<Notice> {
        &self.live
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Notice> {
        self.live.back()
    }

    /// Id of the most recently raised notice, live or not.
    #[must_use]
    pub const fn last_id(&self) -> u64 {
        self.next_id
    }

    /// Live notices raised after notice `id`.
    #[must_use]
    pub fn raised_after(&self, id: u64) -> NoticeSet {
        self.live
            .iter()
            .filter(|notice| notice.id > id)
            .cloned()
            .collect()
    }
}
