//! # ipfec
//!
//! Column-based SMPTE 2022-1 FEC recovery for RTP media over IP.
//!
//! FEC parity packets arrive interleaved with media. When a media packet is
//! lost, the session rebuilds it by XOR-ing the parity of its column with the
//! surviving column members.
//!
//! ## Crate structure
//!
//! - [`seq`] — 16-bit sequence and ring-slot arithmetic
//! - [`tracker`] — RTP sequence validation (probation, wrap, resync)
//! - [`header`] — SMPTE 2022-1 FEC header and RTP fixed-header codecs
//! - [`ring`] — Bounded ring of admitted FEC blocks
//! - [`media`] — Window of received media packets
//! - [`locate`] — Lost-sequence inference and FEC block lookup
//! - [`recovery`] — XOR reconstruction and the column encoder
//! - [`stats`] — Session counters
//! - [`config`] — TOML configuration and matrix geometry
//! - [`error`] — Error types
//! - [`session`] — Lifecycle, locking, and the admit/evict/recover surface

pub mod config;
pub mod error;
pub mod header;
pub mod locate;
pub mod media;
pub mod recovery;
pub mod ring;
pub mod seq;
pub mod session;
pub mod stats;
pub mod tracker;

pub use config::{FecConfig, FecMatrixConfig, PacketLayout};
pub use error::{ConfigError, HeaderError, RecoveryError, SessionError};
pub use header::{FecHeader, FecScheme, RtpHeader};
pub use media::{MediaPacket, MediaWindow};
pub use recovery::{ColumnEncoder, RecoveredPacket};
pub use seq::{RingIndex, Seq16};
pub use session::{Disposition, FecSession, SessionState, StopOutcome};
pub use stats::SessionStats;
