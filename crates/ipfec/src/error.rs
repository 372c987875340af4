//! Error types for the FEC engine.

use thiserror::Error;

use crate::seq::Seq16;

/// Why an FEC header could not be used by the column engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("FEC header too short: {0} bytes")]
    TooShort(usize),
    #[error("FEC header extension flag not set")]
    ExtensionFlagNotSet,
    #[error("FEC header offset is zero")]
    ZeroOffset,
    #[error("FEC header NA is zero")]
    ZeroNumberAssociated,
    #[error("FEC header announces unusable {columns}x{rows} matrix")]
    Geometry { columns: u8, rows: u8 },
    /// Row FEC (D = 1). Not consumed by this engine; callers pass the packet through.
    #[error("row FEC scheme is not supported")]
    UnsupportedScheme,
}

/// Why a lost media packet could not be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("FEC session is not started")]
    Inactive,
    #[error("no populated neighbour to infer the lost sequence number from")]
    Unresolvable,
    #[error("no FEC block covers sequence {0}")]
    NotFound(Seq16),
    #[error("column member {missing} needed to rebuild {lost} is absent")]
    Incomplete { lost: Seq16, missing: Seq16 },
    #[error("recovered length {length} exceeds FEC payload of {available} bytes")]
    LengthMismatch { length: usize, available: usize },
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("column count must be non-zero")]
    ZeroColumns,
    #[error("row count must be non-zero")]
    ZeroRows,
    #[error("matrix of {0} packets does not fit half the sequence space")]
    MatrixTooLarge(u32),
    #[error("FEC ring capacity must be non-zero")]
    ZeroCapacity,
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid config TOML: {0}")]
    Parse(String),
}

/// Session control-surface failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("session must be stopped before it can be re-initialised")]
    Busy,
    #[error("session has been terminated")]
    Terminated,
}
