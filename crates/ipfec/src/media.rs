//! # Media Window
//!
//! Fixed-capacity ring of received media packets, owned by the receive
//! pipeline. Holes (`None`) are packets that never arrived; the FEC session
//! reads the window to infer what a hole should have contained.

use bytes::Bytes;

use crate::seq::{RingIndex, Seq16};

/// A received (or rebuilt) media packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPacket {
    pub seq: Seq16,
    /// Packet bytes, with or without the RTP header.
    pub data: Bytes,
    /// Whether the packet was rebuilt from FEC.
    pub recovered: bool,
}

impl MediaPacket {
    pub fn new(seq: Seq16, data: Bytes) -> Self {
        MediaPacket {
            seq,
            data,
            recovered: false,
        }
    }
}

pub struct MediaWindow {
    slots: Vec<Option<MediaPacket>>,
    /// Most recent placement, used to map sequence numbers to slots.
    anchor: Option<(Seq16, RingIndex)>,
}

impl MediaWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        MediaWindow {
            slots: (0..capacity).map(|_| None).collect(),
            anchor: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot position `pos` in this window.
    pub fn index(&self, pos: usize) -> RingIndex {
        RingIndex::new(pos, self.slots.len())
    }

    /// Slot a packet with sequence `seq` belongs in, relative to the most
    /// recent placement. The first placement lands in slot 0.
    pub fn slot_for(&self, seq: Seq16) -> RingIndex {
        match self.anchor {
            Some((anchor_seq, anchor_idx)) => anchor_idx.offset(i64::from(seq.diff(anchor_seq))),
            None => self.index(0),
        }
    }

    /// Store a packet at the slot its sequence number maps to.
    pub fn place(&mut self, packet: MediaPacket) -> RingIndex {
        let idx = self.slot_for(packet.seq);
        let newer = match self.anchor {
            Some((anchor_seq, _)) => packet.seq.is_after(anchor_seq),
            None => true,
        };
        if newer {
            self.anchor = Some((packet.seq, idx));
        }
        self.slots[idx.value()] = Some(packet);
        idx
    }

    /// Store a packet at an explicit slot, returning what it replaced.
    pub fn insert(&mut self, idx: RingIndex, packet: MediaPacket) -> Option<MediaPacket> {
        let slot = self.local(idx);
        self.slots[slot].replace(packet)
    }

    /// Fill a hole with a packet rebuilt from FEC.
    pub fn insert_recovered(&mut self, idx: RingIndex, seq: Seq16, data: Bytes) {
        let slot = self.local(idx);
        self.slots[slot] = Some(MediaPacket {
            seq,
            data,
            recovered: true,
        });
    }

    /// Remove and return the packet at `idx`.
    pub fn take(&mut self, idx: RingIndex) -> Option<MediaPacket> {
        let slot = self.local(idx);
        self.slots[slot].take()
    }

    pub fn get(&self, idx: RingIndex) -> Option<&MediaPacket> {
        self.slots[self.local(idx)].as_ref()
    }

    pub fn seq_at(&self, idx: RingIndex) -> Option<Seq16> {
        self.get(idx).map(|p| p.seq)
    }

    pub fn is_populated(&self, idx: RingIndex) -> bool {
        self.get(idx).is_some()
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.anchor = None;
    }

    /// Re-express an index from any ring in this window's modulus.
    fn local(&self, idx: RingIndex) -> usize {
        if idx.capacity() == self.slots.len() {
            idx.value()
        } else {
            idx.value() % self.slots.len()
        }
    }
}
