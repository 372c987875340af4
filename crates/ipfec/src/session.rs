//! # FEC Session
//!
//! Orchestrates one media stream's column FEC: validates and admits FEC
//! packets, evicts them as media is consumed, and rebuilds lost media packets
//! on request. The lifecycle is:
//!
//! ```text
//!   Initialized ──start──▶ Started ──stop──▶ Stopped ──start──▶ Started
//!        │                    │                 │
//!        └────────────────────┴──────term───────┴──▶ Terminated
//! ```
//!
//! Admission, eviction, and recovery run from different threads. All mutable
//! state sits behind one mutex so an eviction can never release a slot that
//! a recovery is reading. The `enabled` flag is checked before locking so a
//! stopped session turns packets away without contending for the lock.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use quanta::Instant;
use tracing::{debug, info, warn};

use crate::config::{FecConfig, FecMatrixConfig};
use crate::error::{HeaderError, RecoveryError, SessionError};
use crate::header::RtpHeader;
use crate::locate::{infer_sequence, locate_block};
use crate::media::MediaWindow;
use crate::recovery::{MissingPacketQuery, RecoveredPacket, XorRecoveryEngine};
use crate::ring::{Admission, Eviction, FecRing};
use crate::seq::{RingIndex, Seq16};
use crate::stats::SessionStats;
use crate::tracker::{SeqVerdict, SequenceTracker};

// ─── Outcomes ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Started,
    Stopped,
    Terminated,
}

/// What happened to an FEC packet offered to [`FecSession::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Queued for recovery.
    Consumed,
    /// Row FEC; the caller should forward it untouched.
    PassThrough,
    /// Ring full; the packet was dropped.
    Overflow,
    /// The FEC stream's sequence number was rejected.
    OutOfSequence,
    /// Header unusable; the packet was dropped.
    Malformed(HeaderError),
    /// Session not started; the packet was dropped.
    Inactive,
}

/// Result of [`FecSession::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The ring was drained; carries the number of released blocks.
    Drained(usize),
    /// The ring stayed busy for every retry. It is drained by whichever
    /// caller takes the lock next.
    TimedOut,
}

// ─── Core ───────────────────────────────────────────────────────────────────

struct SessionCore {
    config: FecConfig,
    matrix: FecMatrixConfig,
    ring: FecRing,
    tracker: SequenceTracker,
    stats: SessionStats,
    state: SessionState,
    engine: XorRecoveryEngine,
    /// Newest admitted `sn_base`.
    horizon: Option<Seq16>,
}

impl SessionCore {
    fn new(config: FecConfig) -> Self {
        SessionCore {
            matrix: config.matrix,
            ring: FecRing::new(config.ring_capacity),
            tracker: SequenceTracker::new(config.sequence),
            stats: SessionStats::new(),
            state: SessionState::Initialized,
            engine: XorRecoveryEngine::new(config.layout),
            horizon: None,
            config,
        }
    }

    fn drain(&mut self) -> usize {
        self.tracker.reset();
        self.forget_blocks()
    }

    /// Drop every queued block and the horizon, keeping the tracker.
    fn forget_blocks(&mut self) -> usize {
        self.horizon = None;
        self.ring.drain()
    }

    fn evict(&mut self, end_marker: Seq16) -> Eviction {
        let outcome = self.ring.evict_up_to(end_marker, self.matrix.matrix_size());
        if outcome == Eviction::Empty {
            self.stats.empty_dequeue_count += 1;
        }
        outcome
    }

    fn recover(
        &self,
        window: &MediaWindow,
        query: &mut MissingPacketQuery,
    ) -> Result<RecoveredPacket, RecoveryError> {
        let seq = infer_sequence(window, query.lost_idx, &self.matrix)?;
        query.seq = Some(seq);
        let block = locate_block(&self.ring, seq, &self.matrix)?;
        query.block = Some(block);
        let packet = self.engine.recover(
            &self.ring,
            window,
            &self.matrix,
            block,
            query.lost_idx,
            seq,
        )?;
        query.length = Some(packet.len());
        Ok(packet)
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Column FEC engine for one stream. Share it between threads with `Arc`.
pub struct FecSession {
    enabled: AtomicBool,
    /// Set by a timed-out `stop`; honoured by the next lock holder.
    pending_drain: AtomicBool,
    /// Stop retry policy, readable while the lock is held elsewhere.
    stop_retries: AtomicU32,
    stop_interval_us: AtomicU64,
    core: Mutex<SessionCore>,
}

impl FecSession {
    pub fn new(config: FecConfig) -> Result<Self, SessionError> {
        config.validate()?;
        debug!(
            columns = config.matrix.column_count(),
            rows = config.matrix.row_count(),
            ring_capacity = config.ring_capacity,
            "FEC session created"
        );
        Ok(FecSession {
            enabled: AtomicBool::new(false),
            pending_drain: AtomicBool::new(false),
            stop_retries: AtomicU32::new(config.stop_retries),
            stop_interval_us: AtomicU64::new(config.stop_retry_interval.as_micros() as u64),
            core: Mutex::new(SessionCore::new(config)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        let guard = self.core.lock().unwrap_or_else(|e| e.into_inner());
        self.settle(guard)
    }

    /// Run a drain left behind by a timed-out stop.
    fn settle<'a>(&self, mut core: MutexGuard<'a, SessionCore>) -> MutexGuard<'a, SessionCore> {
        if self.pending_drain.swap(false, Ordering::AcqRel) {
            let released = core.drain();
            if core.state == SessionState::Started {
                core.state = SessionState::Stopped;
            }
            debug!(released, "completed deferred FEC ring drain");
        }
        core
    }

    /// Replace the configuration and start over from a fresh ring and zeroed
    /// statistics. Not allowed while started.
    pub fn init(&self, config: FecConfig) -> Result<(), SessionError> {
        config.validate()?;
        let mut core = self.lock();
        if core.state == SessionState::Started {
            return Err(SessionError::Busy);
        }
        self.stop_retries.store(config.stop_retries, Ordering::Release);
        self.stop_interval_us.store(
            config.stop_retry_interval.as_micros() as u64,
            Ordering::Release,
        );
        *core = SessionCore::new(config);
        info!("FEC session initialised");
        Ok(())
    }

    pub fn start(&self) -> Result<(), SessionError> {
        let mut core = self.lock();
        match core.state {
            SessionState::Terminated => return Err(SessionError::Terminated),
            SessionState::Started => return Ok(()),
            SessionState::Initialized | SessionState::Stopped => {}
        }
        core.state = SessionState::Started;
        self.enabled.store(true, Ordering::Release);
        info!(
            columns = core.matrix.column_count(),
            rows = core.matrix.row_count(),
            "FEC session started"
        );
        Ok(())
    }

    /// Stop accepting packets and drain the ring.
    ///
    /// Never blocks for longer than `stop_retries × stop_retry_interval`.
    pub fn stop(&self) -> StopOutcome {
        self.enabled.store(false, Ordering::Release);

        let retries = self.stop_retries.load(Ordering::Acquire).max(1);
        let interval = Duration::from_micros(self.stop_interval_us.load(Ordering::Acquire));

        for attempt in 0..retries {
            let guard = match self.core.try_lock() {
                Ok(guard) => Some(guard),
                Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
                Err(TryLockError::WouldBlock) => None,
            };
            if let Some(guard) = guard {
                let mut core = self.settle(guard);
                let released = core.drain();
                if core.state != SessionState::Terminated {
                    core.state = SessionState::Stopped;
                }
                info!(released, attempt, "FEC session stopped");
                return StopOutcome::Drained(released);
            }
            thread::sleep(interval);
        }

        self.pending_drain.store(true, Ordering::Release);
        warn!(
            retries,
            interval_ms = interval.as_millis() as u64,
            "FEC ring busy, stop timed out; drain deferred"
        );
        StopOutcome::TimedOut
    }

    /// Release everything and zero the configuration. Idempotent.
    pub fn term(&self) {
        self.enabled.store(false, Ordering::Release);
        let mut core = self.lock();
        if core.state == SessionState::Terminated {
            return;
        }
        let released = core.drain();
        core.config = FecConfig::zeroed();
        core.matrix = FecMatrixConfig::zeroed();
        core.state = SessionState::Terminated;
        info!(released, "FEC session terminated");
    }

    pub fn reset_stats(&self) {
        self.lock().stats.reset();
    }

    pub fn get_stats(&self) -> SessionStats {
        self.lock().stats.clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn config(&self) -> FecConfig {
        self.lock().config.clone()
    }

    /// Current matrix geometry (as last announced by an FEC header).
    pub fn matrix(&self) -> FecMatrixConfig {
        self.lock().matrix
    }

    /// Newest `sn_base` admitted so far.
    pub fn horizon(&self) -> Option<Seq16> {
        self.lock().horizon
    }

    /// Number of FEC blocks currently queued.
    pub fn queued(&self) -> usize {
        self.lock().ring.len()
    }

    // ─── Data path ──────────────────────────────────────────────────────

    /// Offer one FEC packet. `rtp` is the already-parsed RTP header of the
    /// FEC stream; `payload` is everything after it.
    pub fn enqueue(&self, rtp: &RtpHeader, payload: Bytes) -> Disposition {
        if !self.is_enabled() {
            return Disposition::Inactive;
        }
        let mut guard = self.lock();
        let core = &mut *guard;
        if core.state != SessionState::Started {
            return Disposition::Inactive;
        }

        match core.tracker.update(rtp.sequence) {
            SeqVerdict::Rejected => {
                core.stats.out_of_sequence_count += 1;
                debug!(seq = rtp.sequence.value(), "FEC packet out of sequence");
                return Disposition::OutOfSequence;
            }
            SeqVerdict::Resynced => {
                // Blocks of the previous stream would never age out.
                let released = core.forget_blocks();
                info!(
                    seq = rtp.sequence.value(),
                    released, "FEC stream restarted, ring flushed"
                );
            }
            SeqVerdict::Accepted | SeqVerdict::Probationary => {}
        }

        match core.ring.admit(payload, &mut core.matrix) {
            Admission::Admitted(idx) => {
                core.stats.packet_count += 1;
                if let Some(sn_base) = core.ring.get(idx).map(|slot| slot.sn_base) {
                    let newer = match core.horizon {
                        Some(h) => sn_base.is_after(h),
                        None => true,
                    };
                    if newer {
                        core.horizon = Some(sn_base);
                    }
                }
                Disposition::Consumed
            }
            Admission::PassThrough => {
                core.stats.passthrough_count += 1;
                Disposition::PassThrough
            }
            Admission::Malformed(e) => {
                core.stats.malformed_count += 1;
                warn!(error = %e, seq = rtp.sequence.value(), "dropping malformed FEC packet");
                Disposition::Malformed(e)
            }
            Admission::Overflow => {
                core.stats.overflow_count += 1;
                Disposition::Overflow
            }
        }
    }

    /// Media up to `end_seq` has been consumed; release FEC blocks that can
    /// no longer help.
    pub fn release_media(&self, end_seq: Seq16) -> Eviction {
        if !self.is_enabled() {
            return Eviction::Empty;
        }
        let mut core = self.lock();
        if core.state != SessionState::Started {
            return Eviction::Empty;
        }
        core.evict(end_seq)
    }

    /// Evict against the newest admitted `sn_base`.
    pub fn evict_stale(&self) -> Eviction {
        if !self.is_enabled() {
            return Eviction::Empty;
        }
        let mut core = self.lock();
        if core.state != SessionState::Started {
            return Eviction::Empty;
        }
        match core.horizon {
            Some(horizon) => core.evict(horizon),
            None => Eviction::Empty,
        }
    }

    /// Rebuild the media packet missing at `lost_idx` of `window`.
    pub fn recover_lost(
        &self,
        window: &MediaWindow,
        lost_idx: RingIndex,
    ) -> Result<RecoveredPacket, RecoveryError> {
        if !self.is_enabled() {
            return Err(RecoveryError::Inactive);
        }
        let mut core = self.lock();
        if core.state != SessionState::Started {
            return Err(RecoveryError::Inactive);
        }

        let started = Instant::now();
        let mut query = MissingPacketQuery::new(lost_idx);
        let result = core.recover(window, &mut query);

        match &result {
            Ok(packet) => {
                let elapsed_us = started.elapsed().as_micros() as u64;
                core.stats.corrected_packet_count += 1;
                core.stats.last_recovery_us = elapsed_us;
                debug!(
                    seq = packet.seq.value(),
                    len = packet.len(),
                    elapsed_us,
                    "recovered media packet"
                );
            }
            Err(RecoveryError::Unresolvable | RecoveryError::NotFound(_)) => {
                core.stats.lost_packet_count += 1;
                debug!(slot = %lost_idx, seq = ?query.seq, "lost packet not covered by FEC");
            }
            Err(e @ (RecoveryError::Incomplete { .. } | RecoveryError::LengthMismatch { .. })) => {
                core.stats.rejected_packet_count += 1;
                warn!(error = %e, slot = %lost_idx, "FEC recovery abandoned");
            }
            Err(RecoveryError::Inactive) => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaPacket;
    use crate::recovery::ColumnEncoder;
    use std::sync::Arc;

    fn fec_rtp(seq: u16) -> RtpHeader {
        RtpHeader::new(96, Seq16::new(seq), 0, 0xFEC0)
    }

    fn started(columns: u16, rows: u16, capacity: usize) -> FecSession {
        let config = FecConfig {
            ring_capacity: capacity,
            ..FecConfig::with_matrix(columns, rows).unwrap()
        };
        let session = FecSession::new(config).unwrap();
        session.start().unwrap();
        session
    }

    fn column_fec(sn_base: u16, columns: u8, rows: u8, parity: &[u8], len_rec: u16) -> Bytes {
        let mut buf = bytes::BytesMut::new();
        crate::header::FecHeader::column(Seq16::new(sn_base), len_rec, columns, rows)
            .encode(&mut buf);
        buf.extend_from_slice(parity);
        buf.freeze()
    }

    #[test]
    fn scenario_recovers_dropped_column_member() {
        let session = started(4, 3, 8);
        let k = 20;
        let a = vec![0xA1u8; k];
        let b = vec![0xB2u8; k];
        let c = vec![0xC3u8; k];
        let parity: Vec<u8> = (0..k).map(|i| a[i] ^ b[i] ^ c[i]).collect();
        assert_eq!(
            session.enqueue(&fec_rtp(1), column_fec(100, 4, 3, &parity, k as u16)),
            Disposition::Consumed
        );

        let mut window = MediaWindow::new(24);
        for seq in 100u16..112 {
            let data = match seq {
                100 => a.clone(),
                108 => c.clone(),
                _ => vec![seq as u8; k],
            };
            if seq != 104 {
                window.place(MediaPacket::new(Seq16::new(seq), Bytes::from(data)));
            }
        }
        let lost_idx = window.slot_for(Seq16::new(104));
        let rec = session.recover_lost(&window, lost_idx).unwrap();
        assert_eq!(rec.seq, Seq16::new(104));
        assert_eq!(rec.payload.as_ref(), b.as_slice());
        assert_eq!(rec.len(), k);
        assert_eq!(session.get_stats().corrected_packet_count, 1);
    }

    #[test]
    fn overflow_counts_and_keeps_head() {
        let session = started(4, 3, 3);
        for (i, sn) in [0u16, 1, 2].into_iter().enumerate() {
            assert_eq!(
                session.enqueue(&fec_rtp(i as u16), column_fec(sn, 4, 3, b"pp", 2)),
                Disposition::Consumed
            );
        }
        assert_eq!(
            session.enqueue(&fec_rtp(3), column_fec(3, 4, 3, b"pp", 2)),
            Disposition::Overflow
        );
        let stats = session.get_stats();
        assert_eq!(stats.packet_count, 3);
        assert_eq!(stats.overflow_count, 1);
        assert_eq!(session.queued(), 3);
        assert_eq!(session.horizon(), Some(Seq16::new(2)));
    }

    #[test]
    fn row_fec_passes_through() {
        let session = started(4, 3, 8);
        let mut hdr = crate::header::FecHeader::column(Seq16::new(0), 0, 4, 1);
        hdr.scheme = crate::header::FecScheme::Row;
        let mut buf = bytes::BytesMut::new();
        hdr.encode(&mut buf);
        assert_eq!(
            session.enqueue(&fec_rtp(0), buf.freeze()),
            Disposition::PassThrough
        );
        assert_eq!(session.get_stats().passthrough_count, 1);
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn sequence_jump_is_rejected_until_confirmed() {
        let session = started(4, 3, 8);
        for seq in 10..13u16 {
            session.enqueue(&fec_rtp(seq), column_fec(seq * 4, 4, 3, b"p", 1));
        }
        assert_eq!(
            session.enqueue(&fec_rtp(20_000), column_fec(400, 4, 3, b"p", 1)),
            Disposition::OutOfSequence
        );
        assert_eq!(session.get_stats().out_of_sequence_count, 1);
        assert_eq!(
            session.enqueue(&fec_rtp(20_001), column_fec(404, 4, 3, b"p", 1)),
            Disposition::Consumed
        );
        assert_eq!(session.queued(), 1);
        assert_eq!(session.horizon(), Some(Seq16::new(404)));
    }

    #[test]
    fn confirmed_restart_flushes_old_blocks() {
        let session = started(4, 3, 4);
        for (i, sn) in (10_000u16..10_004).enumerate() {
            assert_eq!(
                session.enqueue(&fec_rtp(500 + i as u16), column_fec(sn, 4, 3, b"p", 1)),
                Disposition::Consumed
            );
        }
        assert_eq!(
            session.enqueue(&fec_rtp(60_000), column_fec(100, 4, 3, b"p", 1)),
            Disposition::OutOfSequence
        );

        // Every block of the new stream is admitted once the restart is confirmed.
        for n in 0..4u16 {
            assert_eq!(
                session.enqueue(&fec_rtp(60_001 + n), column_fec(100 + n, 4, 3, b"p", 1)),
                Disposition::Consumed,
                "block {n}"
            );
        }
        let stats = session.get_stats();
        assert_eq!(stats.overflow_count, 0);
        assert_eq!(stats.packet_count, 8);
        assert_eq!(session.queued(), 4);
        assert_eq!(session.horizon(), Some(Seq16::new(103)));

        // Old-stream parity no longer answers for its sequence numbers.
        let mut window = MediaWindow::new(24);
        for seq in 10_000u16..10_012 {
            if seq != 10_004 {
                window.place(MediaPacket::new(Seq16::new(seq), Bytes::from_static(b"m")));
            }
        }
        let lost = window.slot_for(Seq16::new(10_004));
        assert_eq!(
            session.recover_lost(&window, lost),
            Err(RecoveryError::NotFound(Seq16::new(10_004)))
        );
    }

    #[test]
    fn malformed_headers_are_counted() {
        let session = started(4, 3, 8);
        assert_eq!(
            session.enqueue(&fec_rtp(0), Bytes::from_static(&[0x80, 0x00, 0x01])),
            Disposition::Malformed(HeaderError::TooShort(3))
        );

        let mut raw = column_fec(0, 4, 3, b"p", 1).to_vec();
        raw[4] &= 0x7F;
        assert_eq!(
            session.enqueue(&fec_rtp(1), Bytes::from(raw)),
            Disposition::Malformed(HeaderError::ExtensionFlagNotSet)
        );

        let stats = session.get_stats();
        assert_eq!(stats.malformed_count, 2);
        assert_eq!(stats.packet_count, 0);
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn inactive_session_refuses_work() {
        let session = FecSession::new(FecConfig::default()).unwrap();
        assert_eq!(
            session.enqueue(&fec_rtp(0), column_fec(0, 10, 10, b"p", 1)),
            Disposition::Inactive
        );
        let window = MediaWindow::new(4);
        assert_eq!(
            session.recover_lost(&window, window.index(0)),
            Err(RecoveryError::Inactive)
        );
    }

    #[test]
    fn missing_neighbours_count_as_lost() {
        let session = started(4, 3, 8);
        let window = MediaWindow::new(16);
        assert_eq!(
            session.recover_lost(&window, window.index(3)),
            Err(RecoveryError::Unresolvable)
        );
        assert_eq!(session.get_stats().lost_packet_count, 1);
    }

    #[test]
    fn lifecycle_transitions() {
        let session = started(4, 3, 8);
        session.enqueue(&fec_rtp(0), column_fec(0, 4, 3, b"p", 1));
        assert_eq!(
            session.init(FecConfig::default()),
            Err(SessionError::Busy)
        );
        assert_eq!(session.stop(), StopOutcome::Drained(1));
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(!session.is_enabled());

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Started);

        session.term();
        session.term();
        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(session.matrix().matrix_size(), 0);
        assert_eq!(session.config().ring_capacity, 0);
        assert_eq!(session.config().matrix.matrix_size(), 0);
        assert_eq!(session.start(), Err(SessionError::Terminated));

        session.init(FecConfig::default()).unwrap();
        assert_eq!(session.state(), SessionState::Initialized);
    }

    #[test]
    fn stop_times_out_while_ring_is_held() {
        let config = FecConfig {
            stop_retries: 3,
            stop_retry_interval: Duration::from_millis(1),
            ..FecConfig::with_matrix(4, 3).unwrap()
        };
        let session = Arc::new(FecSession::new(config).unwrap());
        session.start().unwrap();
        session.enqueue(&fec_rtp(0), column_fec(0, 4, 3, b"p", 1));

        let guard = session.core.lock().unwrap();
        let stopper = {
            let session = Arc::clone(&session);
            thread::spawn(move || session.stop())
        };
        let outcome = stopper.join().unwrap();
        drop(guard);

        assert_eq!(outcome, StopOutcome::TimedOut);
        assert!(!session.is_enabled());
        // Next lock holder performs the drain.
        assert_eq!(session.queued(), 0);
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn release_media_evicts_and_counts_empty() {
        let session = started(4, 3, 8);
        assert_eq!(session.release_media(Seq16::new(0)), Eviction::Empty);
        assert_eq!(session.get_stats().empty_dequeue_count, 1);

        session.enqueue(&fec_rtp(0), column_fec(0, 4, 3, b"p", 1));
        session.enqueue(&fec_rtp(1), column_fec(30, 4, 3, b"p", 1));
        assert_eq!(session.release_media(Seq16::new(24)), Eviction::Evicted(1));
        assert_eq!(session.evict_stale(), Eviction::Evicted(0));
        assert_eq!(session.queued(), 1);
    }

    #[test]
    fn eviction_is_inert_once_stopped() {
        let session = started(4, 3, 8);
        session.stop();
        assert_eq!(session.release_media(Seq16::new(0)), Eviction::Empty);
        assert_eq!(session.evict_stale(), Eviction::Empty);
        assert_eq!(session.get_stats().empty_dequeue_count, 0);

        session.term();
        assert_eq!(session.release_media(Seq16::new(0)), Eviction::Empty);
        assert_eq!(session.get_stats().empty_dequeue_count, 0);
    }

    #[test]
    fn encoder_round_trip_through_session() {
        let session = started(5, 4, 16);
        let mut encoder = ColumnEncoder::new(5, 4).unwrap();
        let mut window = MediaWindow::new(40);
        let mut fec_seq = 0u16;
        for seq in 1000u16..1020 {
            let payload = vec![(seq % 251) as u8; 100 + usize::from(seq % 7)];
            for fec in encoder.add_media(Seq16::new(seq), &payload) {
                assert_eq!(session.enqueue(&fec_rtp(fec_seq), fec), Disposition::Consumed);
                fec_seq += 1;
            }
            window.place(MediaPacket::new(Seq16::new(seq), Bytes::from(payload)));
        }

        let lost = window.slot_for(Seq16::new(1013));
        let original = window.take(lost).unwrap();
        let rec = session.recover_lost(&window, lost).unwrap();
        assert_eq!(rec.payload, original.data);
    }

    #[test]
    fn reset_stats_zeroes_counters() {
        let session = started(4, 3, 8);
        session.enqueue(&fec_rtp(0), column_fec(0, 4, 3, b"p", 1));
        session.reset_stats();
        assert_eq!(session.get_stats(), SessionStats::default());
    }

    #[test]
    fn session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FecSession>();
    }
}
