//! Access control for activity reports
//!
//! A caller may only see counts for groups they are currently a member of.
//! Membership is checked live against Telegram for every tracked group; any
//! failure for a single group simply hides that group.

use crate::report::GroupActivity;
use crate::storage::{ActivityStore, StorageError, TrackedGroup};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::UserId;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from a single membership lookup
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Telegram rejected or failed the request
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    /// The lookup did not complete in time
    #[error("membership check timed out after {0:?}")]
    Timeout(Duration),
}

/// Answers whether a user currently belongs to a group
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipProbe: Send + Sync {
    /// `Ok(true)` if `user_id` is present in `group_id` (not left or banned)
    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, ProbeError>;
}

/// Membership probe backed by the Bot API `getChatMember` call
#[derive(Clone)]
pub struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    /// Wrap a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipProbe for TelegramMembership {
    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, ProbeError> {
        let member = self
            .bot
            .get_chat_member(ChatId(group_id), UserId(user_id.cast_unsigned()))
            .await?;
        Ok(member.kind.is_present())
    }
}

/// Result of a report request after access filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The caller is not a member of any tracked group
    NoAccess,
    /// Counts for every group the caller can see, in tracked-group order
    Report(Vec<GroupActivity>),
}

/// Filters tracked groups down to those visible to a caller
#[derive(Clone)]
pub struct AccessGate {
    probe: Arc<dyn MembershipProbe>,
    check_timeout: Duration,
    concurrency: usize,
}

impl AccessGate {
    /// Create a gate.
    ///
    /// `concurrency` bounds the number of in-flight membership checks and is
    /// clamped to at least one.
    #[must_use]
    pub fn new(probe: Arc<dyn MembershipProbe>, check_timeout: Duration, concurrency: usize) -> Self {
        Self {
            probe,
            check_timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Groups from `groups` in which `caller_id` is currently present.
    ///
    /// Order of `groups` is preserved. Failed or timed-out checks exclude
    /// the group.
    pub async fn visible_groups(&self, caller_id: i64, groups: Vec<TrackedGroup>) -> Vec<TrackedGroup> {
        stream::iter(groups)
            .map(|group| self.check_group(caller_id, group))
            .buffered(self.concurrency)
            .filter_map(|visible| async move { visible })
            .collect()
            .await
    }

    async fn check_group(&self, caller_id: i64, group: TrackedGroup) -> Option<TrackedGroup> {
        let result = tokio::time::timeout(
            self.check_timeout,
            self.probe.is_member(group.group_id, caller_id),
        )
        .await
        .unwrap_or(Err(ProbeError::Timeout(self.check_timeout)));

        match result {
            Ok(true) => Some(group),
            Ok(false) => {
                debug!(
                    "User {caller_id} is not a member of group {}; hiding it",
                    group.group_id
                );
                None
            }
            Err(e) => {
                warn!(
                    "Membership check for user {caller_id} in group {} failed: {e}",
                    group.group_id
                );
                None
            }
        }
    }

    /// Build the activity report of `target` as seen by `caller_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable. Membership failures
    /// never produce an error.
    pub async fn activity_report(
        &self,
        store: &dyn ActivityStore,
        caller_id: i64,
        target: &str,
    ) -> Result<ReportOutcome, StorageError> {
        let groups = store.list_groups().await?;
        let visible = self.visible_groups(caller_id, groups).await;

        if visible.is_empty() {
            return Ok(ReportOutcome::NoAccess);
        }

        let mut rows = Vec::with_capacity(visible.len());
        for group in visible {
            let counts = store.count_for_user(target, group.group_id).await?;
            rows.push(GroupActivity {
                group_title: group.title,
                counts,
            });
        }
        Ok(ReportOutcome::Report(rows))
    }
}
