use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// A market-data frame that could not be turned into quotes.
///
/// Always non-fatal: the shard drops the frame and keeps reading.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to decompress frame: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame does not match the feed schema: {reason}")]
    Schema { reason: String },

    #[error("invalid {field}: {value}")]
    InvalidPrice { field: &'static str, value: String },

    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}

/// Spread derivation failures. The pair stays pending.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationError {
    #[error("spot bid is zero")]
    ZeroSpotBid,

    #[error("futures bid is zero")]
    ZeroFuturesBid,
}

/// Failures talking to the external store.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("store rejected credentials (status {status})")]
    Unauthorized { status: u16 },

    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected store response: {0}")]
    Response(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("monitor is no longer running")]
    MonitorStopped,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}
