// =============================================================================
// Futures Intelligence Module
// =============================================================================
//
// Three independent readings of the daily seat position table:
//
//   1. Position Change    — aggregate long/short flow across all seats
//   2. Spiderweb          — informed vs uninformed positioning gap (MSD)
//   3. Retail Reversal    — contrarian fade of configured retail brokers
//
// Each is a pure function of a `VarietySnapshot` (plus the retail seat config
// for the third) and yields one `Signal` per variety.

pub mod position_change;
pub mod retail_reversal;
pub mod spiderweb;

pub use position_change::{PositionChangeEvidence, PositionChangeStrategy};
pub use retail_reversal::{RetailReversalEvidence, RetailSeatReversalStrategy};
pub use spiderweb::{SpiderwebEvidence, SpiderwebStrategy};

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::market_data::Seat;
    use crate::test_helpers::{seat, snapshot};

    fn seats_strategy() -> impl Strategy<Value = Vec<Seat>> {
        prop::collection::vec(
            (0u64..5_000, 0u64..5_000, -500i64..500, -500i64..500),
            5..40,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (l, s, lc, sc))| seat(&format!("seat{i:02}"), l, s, lc, sc))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn seat_order_does_not_change_signals(
            seats in seats_strategy(),
            rotation in 0usize..40,
        ) {
            let mut permuted = seats.clone();
            permuted.reverse();
            let len = permuted.len();
            permuted.rotate_left(rotation % len);

            let a = snapshot("rb", seats);
            let b = snapshot("rb", permuted);

            let pc = PositionChangeStrategy::new(20);
            let (pa, pb) = (pc.evaluate(&a), pc.evaluate(&b));
            prop_assert_eq!(pa.direction, pb.direction);
            prop_assert_eq!(pa.strength, pb.strength);

            let web = SpiderwebStrategy::new(10, 0.05, 0.10);
            let (wa, wb) = (web.evaluate(&a), web.evaluate(&b));
            prop_assert_eq!(wa.direction, wb.direction);
            prop_assert_eq!(wa.strength, wb.strength);
        }
    }
}
