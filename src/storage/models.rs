//! Row types for the activity tables.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single observed group text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Telegram id of the sender
    pub user_id: i64,
    /// Sender handle at the time of posting (without `@`)
    pub username: String,
    /// Chat id of the group the message was posted in
    pub group_id: i64,
    /// Group title at the time of posting
    pub group_title: String,
    /// When the message was observed
    pub timestamp: DateTime<Utc>,
}

impl MessageEvent {
    /// Creates an event stamped with the current UTC time.
    #[must_use]
    pub fn now(
        user_id: i64,
        username: impl Into<String>,
        group_id: i64,
        group_title: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            group_id,
            group_title: group_title.into(),
            timestamp: Utc::now(),
        }
    }

    /// Overrides the event timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A group the bot tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackedGroup {
    /// Telegram chat id
    pub group_id: i64,
    /// First title the group was seen with
    pub title: String,
}

/// Message counts for one user in one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCount {
    /// All recorded messages
    pub total: i64,
    /// Messages within the trailing 24 hours
    pub last_24h: i64,
}

/// Encodes a timestamp as fixed-width RFC 3339 text.
///
/// Every value has the same length and a `Z` suffix, so string comparison in
/// SQL orders timestamps chronologically.
#[must_use]
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn encoded_timestamps_sort_chronologically() {
        let base = Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 59).unwrap();
        let later = base + Duration::microseconds(1);
        let much_later = base + Duration::days(400);

        let a = encode_timestamp(base);
        let b = encode_timestamp(later);
        let c = encode_timestamp(much_later);

        assert_eq!(a.len(), b.len());
        assert_eq!(a.len(), c.len());
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, "2026-03-09T23:59:59.000000Z");
    }

    #[test]
    fn at_overrides_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let event = MessageEvent::now(1, "alice", 100, "Team").at(ts);
        assert_eq!(event.timestamp, ts);
        assert_eq!(event.username, "alice");
    }
}
