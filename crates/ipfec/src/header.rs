//! # Wire Headers
//!
//! Fixed-layout FEC header (SMPTE 2022-1 / Pro-MPEG CoP #3) carried as the
//! RTP payload prefix of every FEC packet, plus the 12-byte RTP fixed header.
//!
//! ## FEC Header (16 bytes)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      SNBase low bits          |        Length Recovery        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |E| PT recovery |                    Mask                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          TS recovery                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |N|D|type |index|    Offset     |      NA       |SNBase ext bits|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! For column FEC (`D = 0`), `Offset` is the column count L and `NA` the row
//! count D of the matrix.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::HeaderError;
use crate::seq::Seq16;

/// Encoded size of the FEC header.
pub const FEC_HEADER_LEN: usize = 16;

/// Size of the RTP fixed header without CSRCs.
pub const RTP_HEADER_LEN: usize = 12;

/// MPEG transport stream packet size.
pub const TS_PACKET_SIZE: usize = 188;

/// RTP protocol version.
pub const RTP_VERSION: u8 = 2;

// ─── FEC Scheme ─────────────────────────────────────────────────────────────

/// Which dimension of the matrix an FEC packet protects (`D` bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecScheme {
    Column,
    Row,
}

// ─── FEC Header ─────────────────────────────────────────────────────────────

/// Decoded FEC header. Fields the engine does not interpret (`mask`,
/// `pt_recovery`, `ts_recovery`, `fec_type`, `index`) are kept as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecHeader {
    pub sn_base: Seq16,
    pub length_recovery: u16,
    pub extension: bool,
    pub pt_recovery: u8,
    /// 24-bit mask, zero for SMPTE 2022-1.
    pub mask: u32,
    pub ts_recovery: u32,
    /// N flag, reserved for further header extension.
    pub n: bool,
    pub scheme: FecScheme,
    pub fec_type: u8,
    pub index: u8,
    pub offset: u8,
    pub na: u8,
    pub sn_base_ext: u8,
}

impl FecHeader {
    /// Column header for a block starting at `sn_base` over an L×D matrix.
    pub fn column(sn_base: Seq16, length_recovery: u16, columns: u8, rows: u8) -> Self {
        FecHeader {
            sn_base,
            length_recovery,
            extension: true,
            pt_recovery: 0,
            mask: 0,
            ts_recovery: 0,
            n: false,
            scheme: FecScheme::Column,
            fec_type: 0,
            index: 0,
            offset: columns,
            na: rows,
            sn_base_ext: 0,
        }
    }

    /// Parse the raw fields without judging them.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < FEC_HEADER_LEN {
            return Err(HeaderError::TooShort(buf.len()));
        }
        let mut b = buf;
        let sn_base = Seq16::new(b.get_u16());
        let length_recovery = b.get_u16();
        let e_pt = b.get_u8();
        let mask = (u32::from(b.get_u8()) << 16) | u32::from(b.get_u16());
        let ts_recovery = b.get_u32();
        let flags = b.get_u8();
        let offset = b.get_u8();
        let na = b.get_u8();
        let sn_base_ext = b.get_u8();

        Ok(FecHeader {
            sn_base,
            length_recovery,
            extension: e_pt & 0x80 != 0,
            pt_recovery: e_pt & 0x7F,
            mask,
            ts_recovery,
            n: flags & 0x80 != 0,
            scheme: if flags & 0x40 != 0 {
                FecScheme::Row
            } else {
                FecScheme::Column
            },
            fec_type: (flags >> 3) & 0x07,
            index: flags & 0x07,
            offset,
            na,
            sn_base_ext,
        })
    }

    /// Parse and validate a header for the column engine.
    ///
    /// Row headers yield [`HeaderError::UnsupportedScheme`], which callers must
    /// treat as "not ours" rather than as a malformed packet.
    pub fn decode(buf: &[u8]) -> Result<Self, HeaderError> {
        let hdr = Self::parse(buf)?;
        if hdr.scheme == FecScheme::Row {
            return Err(HeaderError::UnsupportedScheme);
        }
        if !hdr.extension {
            return Err(HeaderError::ExtensionFlagNotSet);
        }
        if hdr.offset == 0 {
            return Err(HeaderError::ZeroOffset);
        }
        if hdr.na == 0 {
            return Err(HeaderError::ZeroNumberAssociated);
        }
        Ok(hdr)
    }

    /// Encode the header into a buffer.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.sn_base.value());
        buf.put_u16(self.length_recovery);
        buf.put_u8(((self.extension as u8) << 7) | (self.pt_recovery & 0x7F));
        buf.put_u8((self.mask >> 16) as u8);
        buf.put_u16(self.mask as u16);
        buf.put_u32(self.ts_recovery);
        let flags = ((self.n as u8) << 7)
            | (((self.scheme == FecScheme::Row) as u8) << 6)
            | ((self.fec_type & 0x07) << 3)
            | (self.index & 0x07);
        buf.put_u8(flags);
        buf.put_u8(self.offset);
        buf.put_u8(self.na);
        buf.put_u8(self.sn_base_ext);
    }

    /// Column count L (column scheme only).
    pub fn column_count(&self) -> u16 {
        u16::from(self.offset)
    }

    /// Row count D (column scheme only).
    pub fn row_count(&self) -> u16 {
        u16::from(self.na)
    }

    /// 24-bit base sequence number including the extension bits.
    pub fn sn_base_extended(&self) -> u32 {
        (u32::from(self.sn_base_ext) << 16) | u32::from(self.sn_base.value())
    }
}

// ─── RTP Header ─────────────────────────────────────────────────────────────

/// Parsed RTP fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: Seq16,
    pub timestamp: u32,
    pub ssrc: u32,
    /// Total header length including CSRCs and extension.
    pub header_len: usize,
}

impl RtpHeader {
    /// A plain 12-byte header.
    pub fn new(payload_type: u8, sequence: Seq16, timestamp: u32, ssrc: u32) -> Self {
        RtpHeader {
            marker: false,
            payload_type,
            sequence,
            timestamp,
            ssrc,
            header_len: RTP_HEADER_LEN,
        }
    }

    /// Decode from the start of a UDP payload. Returns `None` if the buffer is
    /// too short or not RTP version 2.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < RTP_HEADER_LEN {
            return None;
        }
        let mut b = buf;
        let first = b.get_u8();
        if first >> 6 != RTP_VERSION {
            return None;
        }
        let csrc_count = usize::from(first & 0x0F);
        let has_extension = first & 0x10 != 0;
        let second = b.get_u8();
        let sequence = Seq16::new(b.get_u16());
        let timestamp = b.get_u32();
        let ssrc = b.get_u32();

        let mut header_len = RTP_HEADER_LEN + 4 * csrc_count;
        if has_extension {
            if buf.len() < header_len + 4 {
                return None;
            }
            let mut ext = &buf[header_len + 2..header_len + 4];
            header_len += 4 + 4 * usize::from(ext.get_u16());
        }
        if buf.len() < header_len {
            return None;
        }

        Some(RtpHeader {
            marker: second & 0x80 != 0,
            payload_type: second & 0x7F,
            sequence,
            timestamp,
            ssrc,
            header_len,
        })
    }

    /// Encode as a 12-byte fixed header (no CSRCs, no extension).
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(RTP_VERSION << 6);
        buf.put_u8(((self.marker as u8) << 7) | (self.payload_type & 0x7F));
        buf.put_u16(self.sequence.value());
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);
    }
}
