//! LIFT-prefixed error types with structured error codes.

#![allow(missing_docs)]

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, LiftError>;

/// Top-level error type for the elevator dispatcher.
#[derive(Debug, Error)]
pub enum LiftError {
    #[error("[LIFT-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[LIFT-1002] missing configuration file: {path}")]
    MissingConfig { path: std::path::PathBuf },

    #[error("[LIFT-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[LIFT-1004] failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LIFT-2001] malformed input line {line_number}: {details}")]
    MalformedInputLine { line_number: usize, details: String },

    #[error("[LIFT-2002] malformed event on the wire: {details}")]
    MalformedEvent { details: String },

    #[error("[LIFT-2003] event payload of {len} bytes exceeds the {max}-byte datagram limit")]
    EventTooLarge { len: usize, max: usize },

    #[error("[LIFT-2004] failed to read input script {path}: {source}")]
    InputFileRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LIFT-3001] failed to bind datagram socket on {addr}: {source}")]
    SocketBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[LIFT-3002] datagram send failure to {addr}: {source}")]
    SendFailure {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[LIFT-3003] datagram receive failure on {component}: {source}")]
    RecvFailure {
        component: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("[LIFT-4001] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[LIFT-4002] car {car_id} decommissioned and cannot accept assignments")]
    CarDecommissioned { car_id: u32 },

    #[error("[LIFT-9000] runtime failure: {details}")]
    Runtime { details: String },
}

impl LiftError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "LIFT-1001",
            Self::MissingConfig { .. } => "LIFT-1002",
            Self::ConfigParse { .. } => "LIFT-1003",
            Self::ConfigRead { .. } => "LIFT-1004",
            Self::MalformedInputLine { .. } => "LIFT-2001",
            Self::MalformedEvent { .. } => "LIFT-2002",
            Self::EventTooLarge { .. } => "LIFT-2003",
            Self::InputFileRead { .. } => "LIFT-2004",
            Self::SocketBind { .. } => "LIFT-3001",
            Self::SendFailure { .. } => "LIFT-3002",
            Self::RecvFailure { .. } => "LIFT-3003",
            Self::ChannelClosed { .. } => "LIFT-4001",
            Self::CarDecommissioned { .. } => "LIFT-4002",
            Self::Runtime { .. } => "LIFT-9000",
        }
    }

    /// Whether the failure is transient (transport/parse) and safe to log-and-continue,
    /// as opposed to fatal to the whole run.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SendFailure { .. } | Self::RecvFailure { .. } | Self::ChannelClosed { .. }
        )
    }
}

impl From<toml::de::Error> for LiftError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for LiftError {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigParse {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}
