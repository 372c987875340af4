//! # Loss Locator
//!
//! Works out which sequence number a hole in the media window stood for, and
//! which queued FEC block protects that sequence number.

use crate::config::FecMatrixConfig;
use crate::error::RecoveryError;
use crate::media::MediaWindow;
use crate::ring::FecRing;
use crate::seq::{RingIndex, Seq16};

/// FEC block chosen to rebuild a lost packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMatch {
    /// Ring slot of the FEC packet.
    pub slot: RingIndex,
    /// First media sequence number of the protected column.
    pub sn_base: Seq16,
}

/// Infer the sequence number of the packet missing at `lost_idx`.
///
/// Neighbours are consulted in a fixed order: one column back, one slot
/// back, one slot forward, one column forward.
pub fn infer_sequence(
    window: &MediaWindow,
    lost_idx: RingIndex,
    matrix: &FecMatrixConfig,
) -> Result<Seq16, RecoveryError> {
    let l = i64::from(matrix.column_count());
    let probes = [(-l, l), (-1, 1), (1, -1), (l, -l)];

    probes
        .iter()
        .find_map(|&(slot_offset, seq_offset)| {
            window
                .seq_at(lost_idx.offset(slot_offset))
                .map(|seq| seq.wrapping_add(seq_offset as u16))
        })
        .ok_or(RecoveryError::Unresolvable)
}

/// Find the queued FEC block whose column contains `lost_seq`.
///
/// Candidate bases are `lost_seq - (D-1)·L`, `... + L`, up to `lost_seq`
/// itself; for each the ring is scanned from head to tail.
pub fn locate_block(
    ring: &FecRing,
    lost_seq: Seq16,
    matrix: &FecMatrixConfig,
) -> Result<BlockMatch, RecoveryError> {
    let l = matrix.column_count();
    let d = matrix.row_count();
    let seq_min = lost_seq.wrapping_sub(d.saturating_sub(1).wrapping_mul(l));

    (0..d)
        .map(|k| seq_min.wrapping_add(k.wrapping_mul(l)))
        .find_map(|sn_base| {
            ring.find_by_sn_base(sn_base)
                .map(|slot| BlockMatch { slot, sn_base })
        })
        .ok_or(RecoveryError::NotFound(lost_seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::FecHeader;
    use crate::media::MediaPacket;
    use bytes::{Bytes, BytesMut};

    fn window_with(capacity: usize, entries: &[(usize, u16)]) -> MediaWindow {
        let mut w = MediaWindow::new(capacity);
        for &(pos, seq) in entries {
            w.insert(
                w.index(pos),
                MediaPacket::new(Seq16::new(seq), Bytes::from_static(b"m")),
            );
        }
        w
    }

    fn matrix() -> FecMatrixConfig {
        FecMatrixConfig::new(4, 3).unwrap()
    }

    #[test]
    fn prefers_previous_column_neighbour() {
        // lost at 10; column-back neighbour at 6 (seq 100), forward at 11 (seq 111).
        let w = window_with(32, &[(6, 100), (11, 111)]);
        let seq = infer_sequence(&w, w.index(10), &matrix()).unwrap();
        assert_eq!(seq, Seq16::new(104));
    }

    #[test]
    fn falls_back_through_neighbours_in_order() {
        let w = window_with(32, &[(9, 50), (11, 70)]);
        assert_eq!(
            infer_sequence(&w, w.index(10), &matrix()).unwrap(),
            Seq16::new(51)
        );

        let w = window_with(32, &[(11, 70), (14, 90)]);
        assert_eq!(
            infer_sequence(&w, w.index(10), &matrix()).unwrap(),
            Seq16::new(69)
        );

        let w = window_with(32, &[(14, 90)]);
        assert_eq!(
            infer_sequence(&w, w.index(10), &matrix()).unwrap(),
            Seq16::new(86)
        );
    }

    #[test]
    fn inference_wraps_slots_and_sequences() {
        // lost at slot 1 of 8; column-back neighbour wraps to slot 5.
        let w = window_with(8, &[(5, 65534)]);
        assert_eq!(
            infer_sequence(&w, w.index(1), &matrix()).unwrap(),
            Seq16::new(2)
        );
    }

    #[test]
    fn no_neighbours_is_unresolvable() {
        let w = window_with(32, &[(0, 1)]);
        assert_eq!(
            infer_sequence(&w, w.index(10), &matrix()),
            Err(RecoveryError::Unresolvable)
        );
    }

    fn ring_with(bases: &[u16]) -> FecRing {
        let mut ring = FecRing::new(16);
        let mut m = matrix();
        for &sn in bases {
            let mut buf = BytesMut::new();
            FecHeader::column(Seq16::new(sn), 4, 4, 3).encode(&mut buf);
            buf.extend_from_slice(b"pppp");
            ring.admit(buf.freeze(), &mut m);
        }
        ring
    }

    #[test]
    fn locates_column_covering_lost_sequence() {
        let ring = ring_with(&[100, 101, 102, 103]);
        let hit = locate_block(&ring, Seq16::new(109), &matrix()).unwrap();
        assert_eq!(hit.sn_base, Seq16::new(101));
        assert_eq!(ring.get(hit.slot).unwrap().sn_base, Seq16::new(101));
    }

    #[test]
    fn lost_packet_may_be_column_base() {
        let ring = ring_with(&[104]);
        let hit = locate_block(&ring, Seq16::new(104), &matrix()).unwrap();
        assert_eq!(hit.sn_base, Seq16::new(104));
    }

    #[test]
    fn locates_across_sequence_wrap() {
        let ring = ring_with(&[65534]);
        let hit = locate_block(&ring, Seq16::new(6), &matrix()).unwrap();
        assert_eq!(hit.sn_base, Seq16::new(65534));
    }

    #[test]
    fn missing_block_is_not_found() {
        let ring = ring_with(&[100]);
        assert_eq!(
            locate_block(&ring, Seq16::new(101), &matrix()),
            Err(RecoveryError::NotFound(Seq16::new(101)))
        );
    }
}
