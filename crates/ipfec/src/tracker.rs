//! # RTP Sequence Tracker
//!
//! Source-validity tracking in the style of RFC 3550 Appendix A.1. A new
//! source stays on probation until it has delivered `min_sequential`
//! consecutive packets; after that, small forward gaps are accepted, moderate
//! reordering is tolerated, and a large jump is only believed once the sender
//! confirms it with the very next sequence number.

use tracing::debug;

use crate::seq::{Seq16, SEQ_SPACE};

/// Sentinel for `bad_seq`: outside the 16-bit space, never equal to a real seq.
const NO_BAD_SEQ: u32 = SEQ_SPACE;

// ─── Configuration ──────────────────────────────────────────────────────────

/// Thresholds for the validity algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Largest forward gap still treated as loss rather than a restart.
    pub max_dropout: u16,
    /// Largest backward step still treated as reordering.
    pub max_misorder: u16,
    /// Consecutive packets required before a new source is valid.
    pub min_sequential: u16,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            max_dropout: 3000,
            max_misorder: 100,
            min_sequential: 2,
        }
    }
}

// ─── State ──────────────────────────────────────────────────────────────────

/// Per-source sequence state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RtpSequenceState {
    pub base_seq: u16,
    pub max_seq: u16,
    /// Last "bad" sequence + 1, or `0x10000` when unset.
    pub bad_seq: u32,
    /// Shifted count of sequence wraps (a multiple of 65536).
    pub cycles: u32,
    /// Packets still required before the source is valid.
    pub probation: u16,
    pub received: u32,
    pub received_prior: u32,
    pub expected_prior: u32,
}

/// Outcome of feeding one sequence number to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqVerdict {
    /// The packet belongs to a valid source.
    Accepted,
    /// The source is still on probation.
    Probationary,
    /// Large jump not (yet) confirmed by the sender.
    Rejected,
    /// A previously rejected jump was confirmed; the tracker re-based on it.
    Resynced,
}

// ─── Tracker ────────────────────────────────────────────────────────────────

/// Validates and smooths one RTP sequence stream.
#[derive(Debug, Clone)]
pub struct SequenceTracker {
    config: TrackerConfig,
    state: RtpSequenceState,
    started: bool,
}

impl SequenceTracker {
    pub fn new(config: TrackerConfig) -> Self {
        SequenceTracker {
            config,
            state: RtpSequenceState {
                bad_seq: NO_BAD_SEQ,
                ..Default::default()
            },
            started: false,
        }
    }

    /// Re-base the tracker on `seq`. Probation is left untouched.
    pub fn init(&mut self, seq: Seq16) {
        let s = &mut self.state;
        s.base_seq = seq.value();
        s.max_seq = seq.value();
        s.bad_seq = NO_BAD_SEQ;
        s.cycles = 0;
        s.received = 0;
        s.received_prior = 0;
        s.expected_prior = 0;
        self.started = true;
    }

    /// First packet of a previously unseen source: start probation.
    fn probe(&mut self, seq: Seq16) {
        self.init(seq);
        if self.config.min_sequential > 0 {
            self.state.max_seq = seq.wrapping_sub(1).value();
            self.state.probation = self.config.min_sequential;
        }
    }

    /// Feed the next sequence number and classify it.
    pub fn update(&mut self, seq: Seq16) -> SeqVerdict {
        if !self.started {
            self.probe(seq);
        }

        if self.state.probation > 0 {
            if seq == Seq16::new(self.state.max_seq).next() {
                self.state.probation -= 1;
                self.state.max_seq = seq.value();
                if self.state.probation == 0 {
                    self.init(seq);
                    self.state.received += 1;
                    return SeqVerdict::Accepted;
                }
            } else {
                self.state.probation = self.config.min_sequential.saturating_sub(1);
                self.state.max_seq = seq.value();
            }
            return SeqVerdict::Probationary;
        }

        let udelta = seq.distance_from(Seq16::new(self.state.max_seq));
        if udelta < self.config.max_dropout {
            if seq.value() < self.state.max_seq {
                self.state.cycles = self.state.cycles.wrapping_add(SEQ_SPACE);
            }
            self.state.max_seq = seq.value();
        } else if u32::from(udelta) <= SEQ_SPACE - u32::from(self.config.max_misorder) {
            if u32::from(seq.value()) == self.state.bad_seq {
                debug!(seq = seq.value(), "sequence resync after confirmed jump");
                self.init(seq);
                self.state.received += 1;
                return SeqVerdict::Resynced;
            } else {
                self.state.bad_seq = u32::from(seq.next().value());
                return SeqVerdict::Rejected;
            }
        }
        // Otherwise: duplicate or reordered, already accounted for.

        self.state.received += 1;
        SeqVerdict::Accepted
    }

    /// Forget the source entirely; the next packet starts probation again.
    pub fn reset(&mut self) {
        *self = SequenceTracker::new(self.config);
    }

    pub fn state(&self) -> &RtpSequenceState {
        &self.state
    }

    pub fn probation(&self) -> u16 {
        self.state.probation
    }

    /// Whether the source has completed probation.
    pub fn is_valid(&self) -> bool {
        self.started && self.state.probation == 0
    }

    /// Highest sequence number seen, extended with the wrap count.
    pub fn extended_max(&self) -> u32 {
        self.state.cycles.wrapping_add(u32::from(self.state.max_seq))
    }

    /// Number of packets expected since `base_seq`.
    pub fn expected(&self) -> u32 {
        self.extended_max()
            .wrapping_sub(u32::from(self.state.base_seq))
            .wrapping_add(1)
    }

    /// Cumulative packets lost (negative when duplicates outnumber losses).
    pub fn lost(&self) -> i64 {
        i64::from(self.expected()) - i64::from(self.state.received)
    }

    /// Fraction lost since the previous call, as an 8-bit fixed-point value.
    pub fn fraction_lost(&mut self) -> u8 {
        let expected = self.expected();
        let expected_interval = expected.wrapping_sub(self.state.expected_prior);
        self.state.expected_prior = expected;
        let received_interval = self.state.received.wrapping_sub(self.state.received_prior);
        self.state.received_prior = self.state.received;

        let lost_interval = i64::from(expected_interval) - i64::from(received_interval);
        if expected_interval == 0 || lost_interval <= 0 {
            0
        } else {
            ((lost_interval << 8) / i64::from(expected_interval)).min(255) as u8
        }
    }
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}
