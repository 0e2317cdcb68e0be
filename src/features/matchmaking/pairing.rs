//! Shuffle and partition for member matching

use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Pause between thread creations so a round stays under the platform's request rate
pub const THREAD_CREATION_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("need at least 2 members to match, found {0}")]
    TooFewMembers(usize),
}

/// Fisher-Yates shuffle: every permutation is equally likely.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Split `members` into groups from the front: three while the remaining count is odd,
/// two otherwise. The trio can only happen once, on the first take.
///
/// A single member cannot be matched. Zero members yields no groups.
pub fn partition<T>(members: Vec<T>) -> Result<Vec<Vec<T>>, MatchError> {
    if members.len() == 1 {
        return Err(MatchError::TooFewMembers(1));
    }

    let mut groups = Vec::with_capacity(members.len() / 2);
    let mut remaining = members.into_iter();
    loop {
        let left = remaining.len();
        if left == 0 {
            break;
        }
        let take = if left % 2 == 1 { 3 } else { 2 };
        groups.push(remaining.by_ref().take(take).collect());
    }
    Ok(groups)
}

/// Shuffle then partition.
pub fn make_groups<T, R: Rng + ?Sized>(
    mut members: Vec<T>,
    rng: &mut R,
) -> Result<Vec<Vec<T>>, MatchError> {
    shuffle(&mut members, rng);
    partition(members)
}

/// When a matching round last ran. Display only.
#[derive(Debug, Default)]
pub struct LastRun {
    at: RwLock<Option<DateTime<Utc>>>,
}

impl LastRun {
    pub async fn get(&self) -> Option<DateTime<Utc>> {
        *self.at.read().await
    }

    pub async fn record(&self, at: DateTime<Utc>) {
        *self.at.write().await = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sizes(groups: &[Vec<u32>]) -> Vec<usize> {
        let mut sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        sizes
    }

    #[test]
    fn test_seven_members_one_trio() {
        let groups = partition((0..7).collect()).unwrap();
        assert_eq!(sizes(&groups), vec![2, 2, 3]);
        // The trio comes first since seven is odd.
        assert_eq!(groups[0], vec![0, 1, 2]);
    }

    #[test]
    fn test_eight_members_all_pairs() {
        let groups = partition((0..8).collect()).unwrap();
        assert_eq!(sizes(&groups), vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_three_members_single_trio() {
        assert_eq!(partition(vec![1, 2, 3]).unwrap(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_single_member_is_refused() {
        assert_eq!(partition(vec![9]), Err(MatchError::TooFewMembers(1)));
    }

    #[test]
    fn test_no_members_no_groups() {
        assert!(partition(Vec::<u32>::new()).unwrap().is_empty());
    }

    #[test]
    fn test_partition_invariants_hold_for_every_size() {
        for n in 2..=101u32 {
            let groups = partition((0..n).collect()).unwrap();

            assert!(groups.iter().all(|g| g.len() == 2 || g.len() == 3), "n={n}");
            assert!(groups.iter().filter(|g| g.len() == 3).count() <= 1, "n={n}");
            assert_eq!(groups.len(), (n as usize).div_ceil(2) - (n as usize % 2), "n={n}");

            let mut covered: Vec<u32> = groups.into_iter().flatten().collect();
            covered.sort_unstable();
            assert_eq!(covered, (0..n).collect::<Vec<_>>(), "n={n}");
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(0xD0_9875);
        let mut items: Vec<u32> = (0..20).collect();
        shuffle(&mut items, &mut rng);

        assert_ne!(items, (0..20).collect::<Vec<_>>());
        items.sort_unstable();
        assert_eq!(items, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_reproducible_with_seed() {
        let mut a: Vec<u32> = (0..10).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut StdRng::seed_from_u64(42));
        shuffle(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_make_groups_covers_everyone() {
        let mut rng = StdRng::seed_from_u64(7);
        let groups = make_groups((0..9u32).collect(), &mut rng).unwrap();
        assert_eq!(sizes(&groups), vec![2, 2, 2, 3]);
    }

    #[tokio::test]
    async fn test_last_run_records_time() {
        let last = LastRun::default();
        assert_eq!(last.get().await, None);
        let now = Utc::now();
        last.record(now).await;
        assert_eq!(last.get().await, Some(now));
    }
}
