//! # FEC Ring
//!
//! Bounded FIFO of admitted column-FEC packets. The producer side admits at
//! `tail`; the consumer side evicts from `head` as the media horizon moves on.
//!
//! `head == tail` means empty. An admission that would move `tail` onto
//! `head` is an overflow and is refused before any state changes, so the
//! backing store keeps one spare slot beyond the usable capacity.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::FecMatrixConfig;
use crate::error::HeaderError;
use crate::header::{FecHeader, FEC_HEADER_LEN};
use crate::seq::{RingIndex, Seq16};

// ─── Slot ───────────────────────────────────────────────────────────────────

/// One admitted FEC packet.
#[derive(Debug, Clone)]
pub struct FecRingSlot {
    /// FEC payload as received: FEC header followed by the parity bytes.
    pub payload: Bytes,
    pub header: FecHeader,
    /// Sequence number of the first media packet in the protected column.
    pub sn_base: Seq16,
    /// XOR of the protected payload lengths.
    pub len_rec: u16,
}

impl FecRingSlot {
    fn from_header(payload: Bytes, header: FecHeader) -> Self {
        FecRingSlot {
            sn_base: header.sn_base,
            len_rec: header.length_recovery,
            header,
            payload,
        }
    }

    /// Parity bytes following the FEC header.
    pub fn parity(&self) -> &[u8] {
        &self.payload[FEC_HEADER_LEN..]
    }
}

// ─── Outcomes ───────────────────────────────────────────────────────────────

/// Result of offering an FEC payload to the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Stored at the given slot.
    Admitted(RingIndex),
    /// Row FEC: not for this engine.
    PassThrough,
    /// Header could not be used.
    Malformed(HeaderError),
    /// Ring full; nothing was changed.
    Overflow,
}

/// Result of an eviction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    /// Nothing queued.
    Empty,
    /// Number of slots released (possibly zero).
    Evicted(usize),
}

// ─── Ring ───────────────────────────────────────────────────────────────────

pub struct FecRing {
    slots: Vec<Option<FecRingSlot>>,
    head: RingIndex,
    tail: RingIndex,
}

impl FecRing {
    /// Create a ring able to hold `capacity` FEC blocks.
    pub fn new(capacity: usize) -> Self {
        let storage = capacity.max(1) + 1;
        FecRing {
            slots: (0..storage).map(|_| None).collect(),
            head: RingIndex::new(0, storage),
            tail: RingIndex::new(0, storage),
        }
    }

    /// Validate an FEC payload and queue it at `tail`.
    ///
    /// A column header whose geometry differs from `matrix` updates it
    /// before the capacity check.
    pub fn admit(&mut self, payload: Bytes, matrix: &mut FecMatrixConfig) -> Admission {
        let header = match FecHeader::decode(&payload) {
            Ok(h) => h,
            Err(HeaderError::UnsupportedScheme) => return Admission::PassThrough,
            Err(e) => return Admission::Malformed(e),
        };
        if let Err(e) = matrix.on_header_parsed(&header) {
            warn!(error = %e, "ignoring FEC header with unusable geometry");
            return Admission::Malformed(HeaderError::Geometry {
                columns: header.offset,
                rows: header.na,
            });
        }

        let next_tail = self.tail.advance(1);
        if next_tail == self.head {
            warn!(
                sn_base = header.sn_base.value(),
                capacity = self.capacity(),
                "FEC ring overflow, dropping block"
            );
            return Admission::Overflow;
        }

        let at = self.tail;
        self.slots[at.value()] = Some(FecRingSlot::from_header(payload, header));
        self.tail = next_tail;
        Admission::Admitted(at)
    }

    /// Release slots from `head` whose `sn_base` lags `end_marker` by at
    /// least two full matrices.
    pub fn evict_up_to(&mut self, end_marker: Seq16, matrix_size: u32) -> Eviction {
        if self.is_empty() {
            return Eviction::Empty;
        }
        let horizon = 2 * i64::from(matrix_size);
        let mut evicted = 0;
        while self.head != self.tail {
            let stale = match &self.slots[self.head.value()] {
                Some(slot) => i64::from(end_marker.diff(slot.sn_base)) >= horizon,
                None => true,
            };
            if !stale {
                break;
            }
            self.slots[self.head.value()] = None;
            self.head = self.head.advance(1);
            evicted += 1;
        }
        if evicted > 0 {
            debug!(evicted, end_marker = end_marker.value(), "evicted FEC blocks");
        }
        Eviction::Evicted(evicted)
    }

    /// Release every queued slot and rewind both cursors.
    pub fn drain(&mut self) -> usize {
        let released = self.len();
        for slot in &mut self.slots {
            *slot = None;
        }
        let storage = self.slots.len();
        self.head = RingIndex::new(0, storage);
        self.tail = RingIndex::new(0, storage);
        released
    }

    /// First queued slot (scanning head → tail) protecting the column that
    /// starts at `sn_base`.
    pub fn find_by_sn_base(&self, sn_base: Seq16) -> Option<RingIndex> {
        self.iter()
            .find(|(_, slot)| slot.sn_base == sn_base)
            .map(|(idx, _)| idx)
    }

    pub fn get(&self, idx: RingIndex) -> Option<&FecRingSlot> {
        if idx.capacity() != self.slots.len() {
            return None;
        }
        self.slots[idx.value()].as_ref()
    }

    /// Iterate queued slots in admission order.
    pub fn iter(&self) -> impl Iterator<Item = (RingIndex, &FecRingSlot)> + '_ {
        let len = self.len();
        let head = self.head;
        (0..len).filter_map(move |i| {
            let idx = head.advance(i);
            self.slots[idx.value()].as_ref().map(|slot| (idx, slot))
        })
    }

    pub fn len(&self) -> usize {
        self.head.distance_to(self.tail)
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Usable capacity in FEC blocks.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn head(&self) -> RingIndex {
        self.head
    }

    pub fn tail(&self) -> RingIndex {
        self.tail
    }
}
