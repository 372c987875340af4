//! Property-based tests for RTP sequence validation.

use proptest::prelude::*;

use ipfec::tracker::{SeqVerdict, SequenceTracker, TrackerConfig};
use ipfec::Seq16;

/// Feed `start`, `start + 1` so the source completes probation.
fn validated(start: u16) -> SequenceTracker {
    let mut t = SequenceTracker::new(TrackerConfig::default());
    assert_eq!(t.update(Seq16::new(start)), SeqVerdict::Probationary);
    assert_eq!(t.update(Seq16::new(start).next()), SeqVerdict::Accepted);
    t
}

proptest! {
    /// An unbroken stream is accepted in full and reports no loss, including
    /// across the 16-bit wrap.
    #[test]
    fn contiguous_stream_has_no_loss(start in any::<u16>(), len in 2u32..5000) {
        let mut t = validated(start);
        let mut seq = Seq16::new(start).next();
        for _ in 2..len {
            seq = seq.next();
            prop_assert_eq!(t.update(seq), SeqVerdict::Accepted);
        }
        prop_assert!(t.is_valid());
        prop_assert_eq!(t.lost(), 0);
        prop_assert_eq!(t.expected(), len - 1);
    }

    /// Forward gaps below the dropout limit are counted as loss, exactly.
    #[test]
    fn small_gaps_count_as_loss(
        start in any::<u16>(),
        steps in proptest::collection::vec(1u16..=20, 1..300),
    ) {
        let mut t = validated(start);
        let mut seq = Seq16::new(start).next();
        let mut skipped = 0i64;
        for step in steps {
            seq = seq.wrapping_add(step);
            skipped += i64::from(step - 1);
            prop_assert_eq!(t.update(seq), SeqVerdict::Accepted);
        }
        prop_assert_eq!(t.lost(), skipped);
        prop_assert_eq!(t.state().max_seq, seq.value());
    }

    /// A large jump is rejected once, then believed when the sender follows
    /// it with the next sequence number.
    #[test]
    fn large_jump_needs_confirmation(start in any::<u16>(), jump in 3000u16..65000) {
        let mut t = validated(start);
        let base = Seq16::new(start).next();
        let landed = base.wrapping_add(jump);
        prop_assert_eq!(t.update(landed), SeqVerdict::Rejected);
        prop_assert_eq!(t.update(landed.next()), SeqVerdict::Resynced);
        prop_assert_eq!(t.state().base_seq, landed.next().value());
        prop_assert_eq!(t.lost(), 0);
    }

    /// Reordered packets inside the misorder window never disturb the
    /// highest sequence seen.
    #[test]
    fn reordering_keeps_max(start in any::<u16>(), back in 1u16..100) {
        let mut t = validated(start);
        let top = Seq16::new(start).wrapping_add(200);
        for n in 2..=200u16 {
            t.update(Seq16::new(start).wrapping_add(n));
        }
        prop_assert_eq!(t.update(top.wrapping_sub(back)), SeqVerdict::Accepted);
        prop_assert_eq!(t.state().max_seq, top.value());
    }
}
