//! Tests for shard partitioning

use gibbs_core::shard::Shard;
use proptest::prelude::*;

proptest! {
    #[test]
    fn partition_exactly_covers_variable_range(
        (n_variables, n_shards) in (1usize..5000).prop_flat_map(|v| (Just(v), 1usize..=v.min(64)))
    ) {
        let shards = Shard::partition(n_variables, n_shards);

        prop_assert_eq!(shards.len(), n_shards);
        prop_assert_eq!(shards[0].start(), 0);
        prop_assert_eq!(shards[n_shards - 1].end(), n_variables);

        // Contiguous and sorted: each shard starts where the previous ended
        for pair in shards.windows(2) {
            prop_assert_eq!(pair[0].end(), pair[1].start());
        }

        // Pairwise disjoint with exact coverage
        let mut owner = vec![None; n_variables];
        for (i, shard) in shards.iter().enumerate() {
            prop_assert!(!shard.is_empty(), "T <= V leaves no shard empty");
            for id in shard.ids() {
                prop_assert!(owner[id].is_none(), "variable {} owned twice", id);
                owner[id] = Some(i);
            }
        }
        prop_assert!(owner.iter().all(Option::is_some));
    }

    #[test]
    fn shards_are_near_equal(n_variables in 1usize..5000, n_shards in 1usize..64) {
        prop_assume!(n_shards <= n_variables);
        let shards = Shard::partition(n_variables, n_shards);
        let base = n_variables / n_shards;

        for shard in &shards[..n_shards - 1] {
            prop_assert_eq!(shard.len(), base);
        }
        prop_assert_eq!(shards[n_shards - 1].len(), base + n_variables % n_shards);
    }
}

#[test]
fn test_nth_matches_partition() {
    let shards = Shard::partition(101, 7);
    for (i, shard) in shards.iter().enumerate() {
        assert_eq!(*shard, Shard::nth(101, 7, i));
    }
}
