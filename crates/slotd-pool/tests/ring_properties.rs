//! `RingBufferPool` 性质测试。
//!
//! 对任意 `capacity ≥ 1`、`slot_size ≥ 1`：
//! 1. 连续 `capacity` 次租借按轮转顺序访问 `capacity` 个不同槽位，第 `capacity + 1` 次回到第一次的槽位；
//! 2. 无论之前写入什么，借出的槽位总是全零。

use std::collections::BTreeSet;

use proptest::prelude::*;
use slotd_pool::RingBufferPool;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_round_robin_visits_every_slot_once(capacity in 1usize..32, slot_size in 1usize..64) {
        let mut pool = RingBufferPool::new(capacity, slot_size).expect("创建缓冲池失败");
        let mut addresses = Vec::with_capacity(capacity + 1);
        for step in 0..=capacity {
            let slot = pool.acquire();
            prop_assert_eq!(slot.len(), slot_size);
            addresses.push(slot.as_ptr() as usize);
            prop_assert_eq!(pool.cursor(), (step + 1) % capacity);
        }

        let distinct: BTreeSet<usize> = addresses[..capacity].iter().copied().collect();
        prop_assert_eq!(distinct.len(), capacity);
        prop_assert_eq!(addresses[0], addresses[capacity]);
    }

    #[test]
    fn prop_acquired_slot_is_always_zeroed(
        capacity in 1usize..8,
        writes in proptest::collection::vec(any::<u8>(), 1..48),
    ) {
        let mut pool = RingBufferPool::new(capacity, 16).expect("创建缓冲池失败");
        for fill in writes {
            let slot = pool.acquire();
            prop_assert!(slot.iter().all(|byte| *byte == 0));
            slot.fill(fill);
        }
    }
}
