use http::StatusCode;

/// Errors surfaced across the store, replica, and coordinator crate boundaries.
///
/// Variants map onto the error taxonomy of the write path: [`Error::Conflict`],
/// [`Error::PrepareNack`] and [`Error::StaleCommit`] are recovered locally and
/// turned into a protocol outcome (vote, ack, or HTTP status); [`Error::Storage`]
/// is the only variant that is fatal to the current request.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("another open transaction already targets this object")]
    Conflict,

    #[error("prepare phase did not reach unanimous agreement")]
    PrepareNack,

    #[error("do_commit received for unknown transaction {0}")]
    StaleCommit(u64),

    #[error("durability failure: {0}")]
    Storage(#[from] sled::Error),

    #[error("failed to encode or decode a stored record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Maps a store/protocol error onto the HTTP status the front-end contract
    /// promises: exactly one of {200, 409, 5xx}.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Conflict | Error::PrepareNack | Error::StaleCommit(_) => StatusCode::CONFLICT,
            Error::Storage(_) | Error::Codec(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
