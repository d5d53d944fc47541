/*!
 * Arena Property Tests
 */

use hierarchical_arena::{Arena, ArenaConfig, ArenaLedger};
use proptest::prelude::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Property: duplicates are equal copies at a distinct address
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn duplicate_copies_content(bytes in prop::collection::vec(any::<u8>(), 1..512)) {
        let arena = Arena::with_capacity(64).unwrap();
        let copy = arena.duplicate(&bytes).unwrap();

        prop_assert_eq!(&*copy, bytes.as_slice());
        prop_assert_ne!(copy.as_ptr(), bytes.as_ptr());
    }
}

proptest! {
    #[test]
    fn duplicate_str_copies_content(chars in prop::collection::vec(any::<char>(), 1..64)) {
        let s: String = chars.into_iter().collect();
        let arena = Arena::new().unwrap();
        let copy = arena.duplicate_str(&s).unwrap();

        prop_assert_eq!(&*copy, s.as_str());
        prop_assert_ne!(copy.as_ptr(), s.as_ptr());
    }
}

// ---------------------------------------------------------------------------
// Property: live allocations never overlap
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn live_allocations_are_disjoint(sizes in prop::collection::vec(1usize..2048, 1..64)) {
        let arena = Arena::with_capacity(256).unwrap();
        let mut ranges = Vec::with_capacity(sizes.len());

        for &size in &sizes {
            let bytes = arena.allocate(size).unwrap();
            prop_assert!(bytes.iter().all(|&b| b == 0));
            bytes.fill(0x5A);
            let start = bytes.as_ptr() as usize;
            ranges.push((start, start + size));
        }

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            prop_assert!(
                pair[0].1 <= pair[1].0,
                "Allocations overlap: {:?} and {:?}",
                pair[0],
                pair[1],
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property: clearing keeps the arena usable and the ledger exact
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn clear_then_allocate_succeeds(
        before in prop::collection::vec(1usize..4096, 0..32),
        after in 1usize..4096,
    ) {
        let ledger = Arc::new(ArenaLedger::unbounded());
        let mut arena =
            Arena::with_config(ArenaConfig::small().with_ledger(ledger.clone())).unwrap();

        for &size in &before {
            arena.allocate(size).unwrap();
        }
        arena.clear();

        let fresh = arena.allocate(after).unwrap();
        prop_assert_eq!(fresh.len(), after);
        prop_assert_eq!(ledger.reserved_bytes(), arena.reserved_bytes());

        drop(arena);
        prop_assert_eq!(ledger.reserved_bytes(), 0);
    }
}
