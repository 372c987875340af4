use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::header::{FecHeader, RTP_HEADER_LEN, TS_PACKET_SIZE};
use crate::seq::SEQ_SPACE;
use crate::tracker::TrackerConfig;

pub const CONFIG_VERSION: u32 = 1;

// ─── TOML input layer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FecConfigInput {
    pub version: u32,
    pub matrix: MatrixConfigInput,
    pub ring: RingConfigInput,
    pub sequence: SequenceConfigInput,
    pub stop: StopConfigInput,
    pub layout: LayoutConfigInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatrixConfigInput {
    pub columns: Option<u16>,
    pub rows: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RingConfigInput {
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SequenceConfigInput {
    pub max_dropout: Option<u16>,
    pub max_misorder: Option<u16>,
    pub min_sequential: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StopConfigInput {
    pub retries: Option<u32>,
    pub retry_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayoutConfigInput {
    pub transport_packet_size: Option<usize>,
    pub rtp_header_size: Option<usize>,
}

// ─── Matrix geometry ────────────────────────────────────────────────────────

/// D×L matrix geometry. `matrix_size` always equals `rows * columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecMatrixConfig {
    column_count: u16,
    row_count: u16,
    matrix_size: u32,
}

impl FecMatrixConfig {
    pub fn new(column_count: u16, row_count: u16) -> Result<Self, ConfigError> {
        if column_count == 0 {
            return Err(ConfigError::ZeroColumns);
        }
        if row_count == 0 {
            return Err(ConfigError::ZeroRows);
        }
        let matrix_size = u32::from(column_count) * u32::from(row_count);
        // Eviction keeps two matrices behind the horizon; both must fit the
        // forward half of the sequence space.
        if 2 * matrix_size > SEQ_SPACE / 2 {
            return Err(ConfigError::MatrixTooLarge(matrix_size));
        }
        Ok(FecMatrixConfig {
            column_count,
            row_count,
            matrix_size,
        })
    }

    /// All-zero geometry left behind by session termination.
    pub(crate) fn zeroed() -> Self {
        FecMatrixConfig {
            column_count: 0,
            row_count: 0,
            matrix_size: 0,
        }
    }

    pub fn column_count(&self) -> u16 {
        self.column_count
    }

    pub fn row_count(&self) -> u16 {
        self.row_count
    }

    pub fn matrix_size(&self) -> u32 {
        self.matrix_size
    }

    /// Adopt the geometry announced by a column FEC header. The header is
    /// authoritative over local defaults. Returns whether anything changed.
    pub fn on_header_parsed(&mut self, hdr: &FecHeader) -> Result<bool, ConfigError> {
        if hdr.column_count() == self.column_count && hdr.row_count() == self.row_count {
            return Ok(false);
        }
        let updated = FecMatrixConfig::new(hdr.column_count(), hdr.row_count())?;
        debug!(
            columns = updated.column_count,
            rows = updated.row_count,
            matrix_size = updated.matrix_size,
            "FEC matrix geometry updated from header"
        );
        *self = updated;
        Ok(true)
    }
}

impl Default for FecMatrixConfig {
    fn default() -> Self {
        FecMatrixConfig {
            column_count: 10,
            row_count: 10,
            matrix_size: 100,
        }
    }
}

// ─── Packet layout ──────────────────────────────────────────────────────────

/// How media packet lengths relate to their RTP framing.
///
/// A media buffer whose length modulo `transport_packet_size` equals
/// `rtp_header_size` still carries its RTP header; its payload starts after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketLayout {
    pub transport_packet_size: usize,
    pub rtp_header_size: usize,
}

impl PacketLayout {
    /// Byte offset at which the protected payload of a media buffer starts.
    pub fn payload_offset(&self, raw_len: usize) -> usize {
        if self.transport_packet_size > 0
            && raw_len >= self.rtp_header_size
            && raw_len % self.transport_packet_size == self.rtp_header_size
        {
            self.rtp_header_size
        } else {
            0
        }
    }

    /// Protected payload length of a media buffer.
    pub fn payload_len(&self, raw_len: usize) -> usize {
        raw_len - self.payload_offset(raw_len)
    }
}

impl Default for PacketLayout {
    fn default() -> Self {
        PacketLayout {
            transport_packet_size: TS_PACKET_SIZE,
            rtp_header_size: RTP_HEADER_LEN,
        }
    }
}

// ─── Resolved configuration ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FecConfig {
    pub version: u32,
    /// Initial geometry; replaced by the first header that disagrees.
    pub matrix: FecMatrixConfig,
    /// Number of FEC blocks the ring can hold.
    pub ring_capacity: usize,
    pub sequence: TrackerConfig,
    /// Attempts to acquire the ring when stopping before giving up.
    pub stop_retries: u32,
    pub stop_retry_interval: Duration,
    pub layout: PacketLayout,
}

impl Default for FecConfig {
    fn default() -> Self {
        FecConfig {
            version: CONFIG_VERSION,
            matrix: FecMatrixConfig::default(),
            ring_capacity: 64,
            sequence: TrackerConfig::default(),
            stop_retries: 10,
            stop_retry_interval: Duration::from_millis(10),
            layout: PacketLayout::default(),
        }
    }
}

impl FecConfig {
    /// Configuration for an explicit L×D geometry, other settings default.
    pub fn with_matrix(column_count: u16, row_count: u16) -> Result<Self, ConfigError> {
        Ok(FecConfig {
            matrix: FecMatrixConfig::new(column_count, row_count)?,
            ..FecConfig::default()
        })
    }

    /// Configuration left behind by session termination: no geometry, no
    /// ring, no stop retries.
    pub(crate) fn zeroed() -> Self {
        FecConfig {
            matrix: FecMatrixConfig::zeroed(),
            ring_capacity: 0,
            stop_retries: 0,
            stop_retry_interval: Duration::ZERO,
            ..FecConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        FecMatrixConfig::new(self.matrix.column_count, self.matrix.row_count)?;
        if self.ring_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(FecConfig::default());
        }
        let parsed: FecConfigInput =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        parsed.resolve()
    }
}

impl FecConfigInput {
    pub fn resolve(self) -> Result<FecConfig, ConfigError> {
        let defaults = FecConfig::default();
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };

        let matrix = FecMatrixConfig::new(
            self.matrix
                .columns
                .unwrap_or(defaults.matrix.column_count()),
            self.matrix.rows.unwrap_or(defaults.matrix.row_count()),
        )?;

        let sequence = TrackerConfig {
            max_dropout: self
                .sequence
                .max_dropout
                .unwrap_or(defaults.sequence.max_dropout),
            max_misorder: self
                .sequence
                .max_misorder
                .unwrap_or(defaults.sequence.max_misorder),
            min_sequential: self
                .sequence
                .min_sequential
                .unwrap_or(defaults.sequence.min_sequential),
        };

        let layout = PacketLayout {
            transport_packet_size: self
                .layout
                .transport_packet_size
                .unwrap_or(defaults.layout.transport_packet_size),
            rtp_header_size: self
                .layout
                .rtp_header_size
                .unwrap_or(defaults.layout.rtp_header_size),
        };

        let config = FecConfig {
            version,
            matrix,
            ring_capacity: self.ring.capacity.unwrap_or(defaults.ring_capacity),
            sequence,
            stop_retries: self.stop.retries.unwrap_or(defaults.stop_retries).max(1),
            stop_retry_interval: self
                .stop
                .retry_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.stop_retry_interval),
            layout,
        };
        config.validate()?;
        Ok(config)
    }
}
