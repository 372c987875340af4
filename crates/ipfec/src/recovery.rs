//! # XOR Column Recovery
//!
//! Column FEC protects every `L`-th media packet of a D×L matrix with one
//! parity packet:
//!
//! ```text
//!   sn_base      sn_base+1    ...  sn_base+L-1
//!   sn_base+L    sn_base+L+1  ...
//!   ...
//!   ───────────────────────────────────────────
//!   FEC(col 0)   FEC(col 1)   ...  FEC(col L-1)
//! ```
//!
//! Parity bytes are the XOR of the column's payloads (shorter payloads
//! zero-extended) and `length_recovery` is the XOR of their lengths. With
//! exactly one member missing, XOR-ing the parity with the survivors yields
//! the missing payload and its length.
//!
//! [`ColumnEncoder`] is the sending side, used by the simulator and tests.

use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;

use crate::config::{FecMatrixConfig, PacketLayout};
use crate::error::{ConfigError, RecoveryError};
use crate::header::FecHeader;
use crate::locate::BlockMatch;
use crate::media::MediaWindow;
use crate::ring::FecRing;
use crate::seq::{RingIndex, Seq16};

// ─── Query / Result ─────────────────────────────────────────────────────────

/// Working state for one recovery attempt. Filled in step by step; it never
/// owns payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingPacketQuery {
    /// Media window slot of the hole.
    pub lost_idx: RingIndex,
    /// Inferred sequence number of the hole.
    pub seq: Option<Seq16>,
    /// FEC block covering the hole.
    pub block: Option<BlockMatch>,
    /// Rebuilt payload length.
    pub length: Option<usize>,
}

impl MissingPacketQuery {
    pub fn new(lost_idx: RingIndex) -> Self {
        MissingPacketQuery {
            lost_idx,
            seq: None,
            block: None,
            length: None,
        }
    }
}

/// A media payload rebuilt from FEC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredPacket {
    pub seq: Seq16,
    /// Media window slot the packet belongs in.
    pub idx: RingIndex,
    /// Protected payload (no RTP header).
    pub payload: Bytes,
}

impl RecoveredPacket {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// XOR recovery over one column of the media window.
#[derive(Debug, Clone, Copy)]
pub struct XorRecoveryEngine {
    layout: PacketLayout,
}

impl XorRecoveryEngine {
    pub fn new(layout: PacketLayout) -> Self {
        XorRecoveryEngine { layout }
    }

    /// Rebuild the packet at `lost_seq` from the FEC block in `block`.
    ///
    /// Every other member of the column must be present in `window` with the
    /// expected sequence number, otherwise the attempt is `Incomplete`.
    pub fn recover(
        &self,
        ring: &FecRing,
        window: &MediaWindow,
        matrix: &FecMatrixConfig,
        block: BlockMatch,
        lost_idx: RingIndex,
        lost_seq: Seq16,
    ) -> Result<RecoveredPacket, RecoveryError> {
        let slot = ring.get(block.slot).ok_or(RecoveryError::NotFound(lost_seq))?;
        let l = usize::from(matrix.column_count());
        let d = usize::from(matrix.row_count());

        let lost_offset = usize::from(lost_seq.distance_from(block.sn_base));
        let lost_row = lost_offset / l.max(1);
        let snb_ref = lost_idx.retreat(lost_offset);

        let mut members: Vec<&[u8]> = Vec::with_capacity(d.saturating_sub(1));
        for row in (0..d).filter(|&row| row != lost_row) {
            let expected = block.sn_base.wrapping_add((row * l) as u16);
            let packet = window
                .get(snb_ref.advance(row * l))
                .filter(|p| p.seq == expected)
                .ok_or(RecoveryError::Incomplete {
                    lost: lost_seq,
                    missing: expected,
                })?;
            let offset = self.layout.payload_offset(packet.data.len());
            members.push(&packet.data[offset..]);
        }

        let length = members.iter().try_fold(slot.len_rec, |acc, m| {
            u16::try_from(m.len())
                .map(|len| acc ^ len)
                .map_err(|_| RecoveryError::LengthMismatch {
                    length: m.len(),
                    available: usize::from(u16::MAX),
                })
        })?;
        let length = usize::from(length);

        let parity = slot.parity();
        if length > parity.len() {
            return Err(RecoveryError::LengthMismatch {
                length,
                available: parity.len(),
            });
        }

        let mut out = BytesMut::from(&parity[..length]);
        for member in &members {
            let n = member.len().min(length);
            xor_into(&mut out[..n], &member[..n]);
        }

        Ok(RecoveredPacket {
            seq: lost_seq,
            idx: lost_idx,
            payload: out.freeze(),
        })
    }
}

/// `dst ^= src`, byte-wise over the common prefix.
pub fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

// ─── Encoder ────────────────────────────────────────────────────────────────

struct ColumnAccumulator {
    parity: Vec<u8>,
    len_rec: u16,
    members: u16,
}

/// Builds column FEC payloads (header + parity) from outgoing media payloads.
pub struct ColumnEncoder {
    columns: u16,
    rows: u16,
    /// Open columns keyed by their `sn_base`.
    open: BTreeMap<u16, ColumnAccumulator>,
    matrix_start: Option<Seq16>,
}

impl ColumnEncoder {
    pub fn new(columns: u8, rows: u8) -> Result<Self, ConfigError> {
        FecMatrixConfig::new(columns.into(), rows.into())?;
        Ok(ColumnEncoder {
            columns: columns.into(),
            rows: rows.into(),
            open: BTreeMap::new(),
            matrix_start: None,
        })
    }

    /// Feed the protected payload of the media packet `seq`. Returns the FEC
    /// payloads of any columns this packet completes.
    pub fn add_media(&mut self, seq: Seq16, payload: &[u8]) -> Vec<Bytes> {
        let size = self.columns * self.rows;
        let mut start = *self.matrix_start.get_or_insert(seq);
        while seq.distance_from(start) >= size {
            start = start.wrapping_add(size);
        }
        self.matrix_start = Some(start);

        let row = seq.distance_from(start) / self.columns;
        let sn_base = seq.wrapping_sub(row * self.columns);

        let acc = self
            .open
            .entry(sn_base.value())
            .or_insert_with(|| ColumnAccumulator {
                parity: Vec::new(),
                len_rec: 0,
                members: 0,
            });
        if acc.parity.len() < payload.len() {
            acc.parity.resize(payload.len(), 0);
        }
        xor_into(&mut acc.parity, payload);
        acc.len_rec ^= payload.len() as u16;
        acc.members += 1;

        if acc.members < self.rows {
            return Vec::new();
        }
        match self.open.remove(&sn_base.value()) {
            Some(done) => vec![self.emit(sn_base, done)],
            None => Vec::new(),
        }
    }

    fn emit(&self, sn_base: Seq16, acc: ColumnAccumulator) -> Bytes {
        let header = FecHeader::column(sn_base, acc.len_rec, self.columns as u8, self.rows as u8);
        let mut buf = BytesMut::with_capacity(crate::header::FEC_HEADER_LEN + acc.parity.len());
        header.encode(&mut buf);
        buf.extend_from_slice(&acc.parity);
        buf.freeze()
    }

    /// Columns still waiting for members.
    pub fn open_columns(&self) -> usize {
        self.open.len()
    }
}
