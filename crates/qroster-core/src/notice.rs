//! Short-lived user-facing notices derived from operation outcomes.

use std::time::{Duration, Instant};

use crate::reconciler::{EditOutcome, SyncOutcome};

pub const EDIT_NOTICE_TTL: Duration = Duration::from_secs(3);
pub const SYNC_NOTICE_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: &'static str,
    pub expires_at: Instant,
}

impl Notice {
    pub fn for_edit(outcome: EditOutcome, now: Instant) -> Self {
        let (level, text) = match outcome {
            EditOutcome::Synced => (NoticeLevel::Success, "saved and synced"),
            EditOutcome::LocalOnly => (NoticeLevel::Success, "saved locally only"),
            EditOutcome::NotFound => (NoticeLevel::Error, "school not found"),
        };
        Self {
            level,
            text,
            expires_at: now + EDIT_NOTICE_TTL,
        }
    }

    pub fn for_sync(outcome: &SyncOutcome, now: Instant) -> Self {
        let (level, text) = match outcome {
            SyncOutcome::Replaced { .. } | SyncOutcome::EmptyIgnored => {
                (NoticeLevel::Success, "refreshed")
            }
            SyncOutcome::Malformed { .. } => (NoticeLevel::Error, "remote data rejected"),
            SyncOutcome::Failed { .. } | SyncOutcome::Unreachable => {
                (NoticeLevel::Error, "you are offline")
            }
        };
        Self {
            level,
            text,
            expires_at: now + SYNC_NOTICE_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
