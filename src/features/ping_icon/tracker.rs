//! Ping counter state
//!
//! Per-guild ping counts plus the cooldown that guards them. The icon I/O sits behind
//! `IconStore` so the state rules can be exercised without a guild.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::debug;

use crate::features::cooldown::{Admission, GuildCooldown};

/// Once a guild has been pinged this many times, the command stops changing the icon.
pub const PING_CEILING: u32 = 10_000;

pub const EVERYONE_COOLDOWN_MINUTES: i64 = 5;

/// Where guild icons are backed up, rendered and published
#[async_trait]
pub trait IconStore: Send + Sync {
    /// Save the guild's current icon as the base for later badges.
    ///
    /// Returns `false` when the guild has no custom icon to work from.
    async fn backup(&self, guild_id: u64) -> Result<bool>;

    /// Render `count` over the saved base and make it the guild icon.
    async fn publish(&self, guild_id: u64, count: u32) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    /// Icon now shows this count
    Pinged(u32),
    TooSoon { eligible_at: DateTime<Utc> },
    /// Another run for the same guild has not finished yet
    Busy,
    /// First run, and the guild has no icon to back up
    NoIcon,
    /// The ceiling was reached earlier
    Exhausted,
}

pub struct PingTracker {
    cooldown: GuildCooldown,
    counts: DashMap<u64, u32>,
}

impl Default for PingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PingTracker {
    pub fn new() -> Self {
        Self {
            cooldown: GuildCooldown::new(Duration::minutes(EVERYONE_COOLDOWN_MINUTES)),
            counts: DashMap::new(),
        }
    }

    pub fn count(&self, guild_id: u64) -> Option<u32> {
        self.counts.get(&guild_id).map(|entry| *entry.value())
    }

    /// One `everyone` run for `guild_id`.
    ///
    /// The cooldown is consumed as soon as the run is admitted, before the icon work. The
    /// guild's lock stays held until the icon is published, so a concurrent run for the
    /// same guild is rejected rather than queued.
    pub async fn ping(
        &self,
        guild_id: u64,
        now: DateTime<Utc>,
        icons: &dyn IconStore,
    ) -> Result<PingOutcome> {
        let _permit = match self.cooldown.try_acquire(guild_id, now) {
            Admission::Granted(permit) => permit,
            Admission::TooSoon { eligible_at } => return Ok(PingOutcome::TooSoon { eligible_at }),
            Admission::Busy => return Ok(PingOutcome::Busy),
        };

        match self.count(guild_id) {
            None => {
                debug!("Backing up icon for guild {guild_id}");
                if !icons.backup(guild_id).await? {
                    return Ok(PingOutcome::NoIcon);
                }
            }
            Some(count) if count >= PING_CEILING => return Ok(PingOutcome::Exhausted),
            Some(_) => {}
        }

        let count = {
            let mut entry = self.counts.entry(guild_id).or_insert(0);
            *entry += 1;
            *entry
        };

        icons.publish(guild_id, count).await?;
        Ok(PingOutcome::Pinged(count))
    }

    #[cfg(test)]
    fn set_count(&self, guild_id: u64, count: u32) {
        self.counts.insert(guild_id, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct SpyIcons {
        no_icon: bool,
        backups: AtomicUsize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl IconStore for SpyIcons {
        async fn backup(&self, _guild_id: u64) -> Result<bool> {
            self.backups.fetch_add(1, Ordering::SeqCst);
            Ok(!self.no_icon)
        }

        async fn publish(&self, _guild_id: u64, _count: u32) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 4, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_first_ping_backs_up_and_publishes() {
        let tracker = PingTracker::new();
        let icons = SpyIcons::default();

        assert_eq!(tracker.ping(1, t0(), &icons).await.unwrap(), PingOutcome::Pinged(1));
        assert_eq!(icons.backups.load(Ordering::SeqCst), 1);
        assert_eq!(icons.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_ping_within_cooldown_changes_nothing() {
        let tracker = PingTracker::new();
        let icons = SpyIcons::default();
        tracker.ping(1, t0(), &icons).await.unwrap();

        let outcome = tracker
            .ping(1, t0() + Duration::minutes(4), &icons)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PingOutcome::TooSoon {
                eligible_at: t0() + Duration::minutes(5)
            }
        );
        assert_eq!(tracker.count(1), Some(1));
        assert_eq!(icons.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ping_after_cooldown_increments() {
        let tracker = PingTracker::new();
        let icons = SpyIcons::default();
        tracker.ping(1, t0(), &icons).await.unwrap();

        let outcome = tracker
            .ping(1, t0() + Duration::minutes(5), &icons)
            .await
            .unwrap();

        assert_eq!(outcome, PingOutcome::Pinged(2));
        // The backup only happens once per guild.
        assert_eq!(icons.backups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ceiling_rejects_without_writing() {
        let tracker = PingTracker::new();
        let icons = SpyIcons::default();
        tracker.set_count(1, PING_CEILING);

        assert_eq!(tracker.ping(1, t0(), &icons).await.unwrap(), PingOutcome::Exhausted);
        assert_eq!(tracker.count(1), Some(PING_CEILING));
        assert_eq!(icons.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_last_ping_below_ceiling_reaches_it() {
        let tracker = PingTracker::new();
        let icons = SpyIcons::default();
        tracker.set_count(1, PING_CEILING - 1);

        assert_eq!(
            tracker.ping(1, t0(), &icons).await.unwrap(),
            PingOutcome::Pinged(PING_CEILING)
        );
    }

    #[tokio::test]
    async fn test_guild_without_icon() {
        let tracker = PingTracker::new();
        let icons = SpyIcons {
            no_icon: true,
            ..SpyIcons::default()
        };

        assert_eq!(tracker.ping(1, t0(), &icons).await.unwrap(), PingOutcome::NoIcon);
        assert_eq!(tracker.count(1), None);
        assert_eq!(icons.writes.load(Ordering::SeqCst), 0);
    }
}
