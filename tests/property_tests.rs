//! Property tests for the ledger arithmetic.

use donorlift_api::services::inventory::remaining;
use proptest::prelude::*;

proptest! {
    /// With nothing dispatched, availability equals the full amount.
    #[test]
    fn untouched_amount_is_fully_available(amount in 0i32..=1_000_000) {
        prop_assert_eq!(remaining(amount, 0), i64::from(amount));
    }

    /// Availability decreases by exactly what was dispatched.
    #[test]
    fn dispatches_subtract_exactly(amount in 0i32..=1_000_000, sent in 0i64..=1_000_000) {
        prop_assert_eq!(remaining(amount, sent), i64::from(amount) - sent);
    }

    /// A sequence of dispatches that never exceeds the running
    /// availability can never push the total over the amount.
    #[test]
    fn guarded_dispatches_never_overcommit(
        amount in 1i32..=10_000,
        draws in proptest::collection::vec(1i64..=10_000, 0..32),
    ) {
        let mut sent = 0i64;
        for draw in draws {
            // The assignment guard: reject anything over the remainder.
            if draw <= remaining(amount, sent) {
                sent += draw;
            }
        }
        prop_assert!(sent <= i64::from(amount));
        prop_assert!(remaining(amount, sent) >= 0);
    }

    /// Over-commitment surfaces as a negative remainder, never wraps.
    #[test]
    fn overcommit_is_negative_not_clamped(amount in 0i32..=1_000, excess in 1i64..=1_000) {
        let sent = i64::from(amount) + excess;
        prop_assert_eq!(remaining(amount, sent), -excess);
    }
}
