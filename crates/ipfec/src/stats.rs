//! # Session Statistics
//!
//! Counters kept by an FEC session. Serializable for JSON export from the
//! simulator and from any embedding receiver.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// FEC blocks admitted to the ring.
    pub packet_count: u64,
    /// Media packets rebuilt from FEC.
    pub corrected_packet_count: u64,
    /// Media packets reported lost that no FEC block could address.
    pub lost_packet_count: u64,
    /// Recovery attempts abandoned after a block was found.
    pub rejected_packet_count: u64,
    /// FEC packets dropped because the ring was full.
    pub overflow_count: u64,
    /// Eviction passes that found the ring empty.
    pub empty_dequeue_count: u64,
    /// Row FEC packets handed back to the caller.
    pub passthrough_count: u64,
    /// FEC packets with unusable headers.
    pub malformed_count: u64,
    /// FEC packets whose RTP sequence was rejected by the tracker.
    pub out_of_sequence_count: u64,
    /// Duration of the last successful recovery, in µs.
    pub last_recovery_us: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = SessionStats::default();
    }

    /// Share of recovery attempts that produced a packet.
    pub fn recovery_ratio(&self) -> f64 {
        let attempts =
            self.corrected_packet_count + self.lost_packet_count + self.rejected_packet_count;
        if attempts == 0 {
            0.0
        } else {
            self.corrected_packet_count as f64 / attempts as f64
        }
    }
}
