//! # Sequence and Slot Arithmetic
//!
//! Two wraparound spaces coexist in the engine: the 16-bit RTP sequence space
//! (modulus 65536) and the slot space of each fixed-capacity ring (modulus =
//! ring capacity). Both are kept as distinct types so an index can never be
//! combined with a sequence number by accident.

use std::fmt;

/// Size of the RTP sequence space.
pub const SEQ_SPACE: u32 = 1 << 16;

// ─── Seq16 ──────────────────────────────────────────────────────────────────

/// A 16-bit RTP sequence number. All arithmetic wraps modulo 65536.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Seq16(u16);

impl Seq16 {
    #[inline]
    pub const fn new(value: u16) -> Self {
        Seq16(value)
    }

    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn wrapping_add(self, n: u16) -> Self {
        Seq16(self.0.wrapping_add(n))
    }

    #[inline]
    pub fn wrapping_sub(self, n: u16) -> Self {
        Seq16(self.0.wrapping_sub(n))
    }

    #[inline]
    pub fn next(self) -> Self {
        self.wrapping_add(1)
    }

    /// Unsigned forward distance from `earlier` to `self` (`self - earlier` mod 2^16).
    #[inline]
    pub fn distance_from(self, earlier: Seq16) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Signed difference `self - other`, interpreted in the half-open range
    /// `[-32768, 32767]`.
    #[inline]
    pub fn diff(self, other: Seq16) -> i32 {
        self.0.wrapping_sub(other.0) as i16 as i32
    }

    /// Whether `self` is strictly later than `other` in serial-number order.
    #[inline]
    pub fn is_after(self, other: Seq16) -> bool {
        self.diff(other) > 0
    }
}

impl From<u16> for Seq16 {
    fn from(v: u16) -> Self {
        Seq16(v)
    }
}

impl From<Seq16> for u16 {
    fn from(s: Seq16) -> Self {
        s.0
    }
}

impl fmt::Debug for Seq16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq16({})", self.0)
    }
}

impl fmt::Display for Seq16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ─── RingIndex ──────────────────────────────────────────────────────────────

/// A slot position inside a ring of fixed capacity.
///
/// The capacity travels with the index, so stepping forward or backward can
/// only ever wrap by the ring's own modulus.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingIndex {
    pos: usize,
    capacity: usize,
}

impl RingIndex {
    /// Create an index, normalising `pos` into `0..capacity`.
    pub fn new(pos: usize, capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring capacity must be non-zero");
        let capacity = capacity.max(1);
        RingIndex {
            pos: pos % capacity,
            capacity,
        }
    }

    #[inline]
    pub fn value(self) -> usize {
        self.pos
    }

    #[inline]
    pub fn capacity(self) -> usize {
        self.capacity
    }

    /// Step forward `n` slots.
    pub fn advance(self, n: usize) -> Self {
        let n = n % self.capacity;
        RingIndex {
            pos: (self.pos + n) % self.capacity,
            capacity: self.capacity,
        }
    }

    /// Step backward `n` slots.
    pub fn retreat(self, n: usize) -> Self {
        let n = n % self.capacity;
        RingIndex {
            pos: (self.pos + self.capacity - n) % self.capacity,
            capacity: self.capacity,
        }
    }

    /// Step by a signed offset.
    pub fn offset(self, delta: i64) -> Self {
        if delta >= 0 {
            self.advance(delta as usize)
        } else {
            self.retreat(delta.unsigned_abs() as usize)
        }
    }

    /// Forward slot distance from `self` to `other`.
    pub fn distance_to(self, other: RingIndex) -> usize {
        debug_assert_eq!(self.capacity, other.capacity);
        (other.pos + self.capacity - self.pos) % self.capacity
    }
}

impl fmt::Debug for RingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RingIndex({}/{})", self.pos, self.capacity)
    }
}

impl fmt::Display for RingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pos.fmt(f)
    }
}
