//! Splitting must-compile modules into worker batches.

use ohm_config::PartitionPolicy;

/// Splits `items` into at most `workers` batches.
///
/// With fewer items than workers every item gets its own batch. Items keep
/// their relative order within a batch under round-robin; under size
/// balancing they are assigned largest first, each to the batch with the
/// smallest running total, so no batch exceeds the lightest one by more
/// than the largest single item.
pub fn partition<T>(
    items: Vec<T>,
    workers: usize,
    policy: PartitionPolicy,
    size: impl Fn(&T) -> u64,
) -> Vec<Vec<T>> {
    let count = workers.max(1).min(items.len());
    if count == 0 {
        return Vec::new();
    }
    let mut batches: Vec<Vec<T>> = (0..count).map(|_| Vec::new()).collect();

    match policy {
        PartitionPolicy::RoundRobin => {
            for (i, item) in items.into_iter().enumerate() {
                batches[i % count].push(item);
            }
        }
        PartitionPolicy::SizeBalanced => {
            let mut sized: Vec<(u64, T)> = items.into_iter().map(|t| (size(&t), t)).collect();
            sized.sort_by(|a, b| b.0.cmp(&a.0));
            let mut totals = vec![0u64; count];
            for (s, item) in sized {
                let lightest = (0..count).min_by_key(|&i| (totals[i], i)).unwrap_or(0);
                totals[lightest] += s;
                batches[lightest].push(item);
            }
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_robin_by_index() {
        let b = partition((0..7).collect(), 3, PartitionPolicy::RoundRobin, |_| 0);
        assert_eq!(b, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
    }

    #[test]
    fn fewer_items_than_workers() {
        let b = partition(vec!["a", "b"], 3, PartitionPolicy::SizeBalanced, |_| 1);
        assert_eq!(b.len(), 2);
        assert!(b.iter().all(|batch| batch.len() == 1));
    }

    #[test]
    fn empty_input_has_no_batches() {
        let b: Vec<Vec<u64>> = partition(Vec::new(), 3, PartitionPolicy::RoundRobin, |s| *s);
        assert!(b.is_empty());
    }

    #[test]
    fn size_balanced_packs_largest_first() {
        let b = partition(vec![5u64, 1, 8, 3, 3], 2, PartitionPolicy::SizeBalanced, |s| *s);
        assert_eq!(b, vec![vec![8, 3], vec![5, 3, 1]]);
    }

    proptest! {
        #[test]
        fn size_balanced_bound(
            sizes in prop::collection::vec(0u64..10_000, 1..60),
            workers in 1usize..6,
        ) {
            let largest = *sizes.iter().max().unwrap();
            let n = sizes.len();
            let batches = partition(sizes, workers, PartitionPolicy::SizeBalanced, |s| *s);
            let totals: Vec<u64> = batches.iter().map(|b| b.iter().sum()).collect();
            let max = *totals.iter().max().unwrap();
            let min = *totals.iter().min().unwrap();
            prop_assert!(max <= min + largest);
            prop_assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), n);
            prop_assert_eq!(batches.len(), workers.min(n));
        }
    }
}
