//! Guild cooldown limiter
//!
//! Two maps keyed by guild id, both held in `DashMap`s for concurrent access:
//! the next time the guild may run the guarded action, and a lock that is held
//! for the whole duration of an admitted run. A second invocation for the same
//! guild while the first is still running fails `try_lock` and is rejected; it
//! never waits.
//!
//! Entries are never removed. One timestamp and one lock per guild is bounded by
//! the number of guilds the bot is in.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held by an admitted invocation; other invocations for the guild are rejected until dropped.
#[derive(Debug)]
pub struct CooldownPermit {
    _guard: OwnedMutexGuard<()>,
}

/// Result of asking to run the guarded action
#[derive(Debug)]
pub enum Admission {
    Granted(CooldownPermit),
    /// Still cooling down; eligible again at the given time
    TooSoon { eligible_at: DateTime<Utc> },
    /// Another invocation for the same guild is in progress
    Busy,
}

impl Admission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted(_))
    }
}

pub struct GuildCooldown {
    window: Duration,
    next_eligible: DashMap<u64, DateTime<Utc>>,
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl GuildCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            next_eligible: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit one invocation for `guild_id` at `now`.
    ///
    /// On success the next-eligible time moves to `now + window` before the permit is
    /// handed out, so the cooldown starts even if the caller's work later fails.
    pub fn try_acquire(&self, guild_id: u64, now: DateTime<Utc>) -> Admission {
        let lock = Arc::clone(
            self.locks
                .entry(guild_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );

        let Ok(guard) = lock.try_lock_owned() else {
            return Admission::Busy;
        };

        if let Some(eligible_at) = self.eligible_at(guild_id) {
            if now < eligible_at {
                return Admission::TooSoon { eligible_at };
            }
        }

        self.next_eligible.insert(guild_id, now + self.window);
        Admission::Granted(CooldownPermit { _guard: guard })
    }

    /// When the guild may next run the action, if it has ever run it
    pub fn eligible_at(&self, guild_id: u64) -> Option<DateTime<Utc>> {
        self.next_eligible.get(&guild_id).map(|entry| *entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 4, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_first_invocation_is_granted() {
        let cooldown = GuildCooldown::new(Duration::minutes(5));
        assert!(cooldown.try_acquire(1, t0()).is_granted());
        assert_eq!(cooldown.eligible_at(1), Some(t0() + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_second_invocation_within_window_is_rejected() {
        let cooldown = GuildCooldown::new(Duration::minutes(5));
        drop(cooldown.try_acquire(1, t0()));

        match cooldown.try_acquire(1, t0() + Duration::minutes(4)) {
            Admission::TooSoon { eligible_at } => {
                assert_eq!(eligible_at, t0() + Duration::minutes(5));
            }
            other => panic!("expected TooSoon, got {other:?}"),
        }
        // A rejection does not push the window further out.
        assert_eq!(cooldown.eligible_at(1), Some(t0() + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_invocation_after_window_is_granted() {
        let cooldown = GuildCooldown::new(Duration::minutes(5));
        drop(cooldown.try_acquire(1, t0()));
        assert!(cooldown
            .try_acquire(1, t0() + Duration::minutes(5))
            .is_granted());
    }

    #[tokio::test]
    async fn test_concurrent_invocation_for_same_guild_is_busy() {
        let cooldown = GuildCooldown::new(Duration::zero());
        let permit = cooldown.try_acquire(1, t0());
        assert!(permit.is_granted());

        assert!(matches!(cooldown.try_acquire(1, t0()), Admission::Busy));
        drop(permit);
        assert!(cooldown.try_acquire(1, t0()).is_granted());
    }

    #[tokio::test]
    async fn test_guilds_are_independent() {
        let cooldown = GuildCooldown::new(Duration::minutes(5));
        let _first = cooldown.try_acquire(1, t0());
        assert!(cooldown.try_acquire(2, t0()).is_granted());
    }
}
