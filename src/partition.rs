/// One shard's share of the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardShare {
    /// Shard index, starting at 0.
    pub index: usize,
    /// Number of blobs assigned to the shard.
    pub count: u64,
    /// Number of the first blob the shard writes. Numbering starts at 1.
    pub first: u64,
}

/// Near-equal division of a blob count across a fixed number of shards.
///
/// Every shard receives `total / shards` blobs; the `total % shards` leftover blobs are
/// handed out one at a time starting from shard 0. Shares are contiguous: shard `i`
/// starts numbering right after shard `i - 1` ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPartition {
    shares: Vec<ShardShare>,
}

impl WorkPartition {
    /// Splits `total` blobs across `shards` shards.
    ///
    /// # Panics
    ///
    /// Panics if `shards` is zero. [`BenchmarkConfig`](crate::BenchmarkConfig) never
    /// allows a zero thread or process count.
    pub fn new(total: u64, shards: usize) -> Self {
        assert!(shards > 0, "cannot partition work across zero shards");

        let base = total / shards as u64;
        let remainder = total % shards as u64;
        let mut next = 1;
        let shares = (0..shards)
            .map(|index| {
                let count = base + u64::from((index as u64) < remainder);
                let share = ShardShare {
                    index,
                    count,
                    first: next,
                };
                // Only saturates once the last blob is u64::MAX; no later share is nonempty.
                next = next.saturating_add(count);
                share
            })
            .collect();

        Self { shares }
    }

    /// Shares in shard index order.
    pub fn shares(&self) -> &[ShardShare] {
        &self.shares
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Sum of every shard's count.
    pub fn total(&self) -> u64 {
        self.shares.iter().map(|share| share.count).sum()
    }
}

impl<'a> IntoIterator for &'a WorkPartition {
    type Item = &'a ShardShare;
    type IntoIter = std::slice::Iter<'a, ShardShare>;

    fn into_iter(self) -> Self::IntoIter {
        self.shares.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn counts(partition: &WorkPartition) -> Vec<u64> {
        partition.shares().iter().map(|share| share.count).collect()
    }

    #[test]
    fn test_even_split() {
        let partition = WorkPartition::new(100_000, 10);
        assert_eq!(partition.len(), 10);
        assert!(counts(&partition).iter().all(|&count| count == 10_000));
        assert_eq!(partition.total(), 100_000);
    }

    #[test]
    fn test_uneven_split_favors_lowest_indices() {
        let partition = WorkPartition::new(100_003, 10);
        let counts = counts(&partition);
        assert_eq!(&counts[..3], &[10_001, 10_001, 10_001]);
        assert!(counts[3..].iter().all(|&count| count == 10_000));
        assert_eq!(partition.total(), 100_003);
    }

    #[test]
    fn test_fewer_blobs_than_shards() {
        let partition = WorkPartition::new(3, 5);
        assert_eq!(counts(&partition), vec![1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_zero_total() {
        let partition = WorkPartition::new(0, 4);
        assert_eq!(partition.len(), 4);
        assert_eq!(partition.total(), 0);
    }

    #[test]
    fn test_shares_are_contiguous() {
        let partition = WorkPartition::new(23, 4);
        let mut expected_first = 1;
        for share in &partition {
            assert_eq!(share.first, expected_first);
            expected_first += share.count;
        }
        assert_eq!(expected_first, 24);
    }

    #[test]
    fn test_max_total_in_one_shard() {
        let partition = WorkPartition::new(u64::MAX, 1);
        let share = partition.shares()[0];
        assert_eq!(share.first, 1);
        assert_eq!(share.count, u64::MAX);
    }

    #[test]
    fn test_max_total_across_shards() {
        let partition = WorkPartition::new(u64::MAX, 3);
        let shares = partition.shares();
        assert_eq!(partition.total(), u64::MAX);
        assert_eq!(shares[0].first, 1);
        for pair in shares.windows(2) {
            assert_eq!(pair[1].first, pair[0].first + pair[0].count);
        }
        let last = shares[2];
        assert_eq!(last.first + (last.count - 1), u64::MAX);
    }

    #[test]
    #[should_panic(expected = "zero shards")]
    fn test_zero_shards_panics() {
        let _ = WorkPartition::new(10, 0);
    }

    #[test]
    fn test_random_partitions_hold_invariants() {
        let mut rng = rand::rng();
        for _ in 0..1000 {
            let total: u64 = rng.random_range(0..1_000_000);
            let shards: usize = rng.random_range(1..64);
            let partition = WorkPartition::new(total, shards);

            let base = total / shards as u64;
            let remainder = (total % shards as u64) as usize;
            assert_eq!(partition.total(), total);
            for share in &partition {
                let expected = if share.index < remainder { base + 1 } else { base };
                assert_eq!(share.count, expected, "total={total} shards={shards}");
            }
        }
    }
}
