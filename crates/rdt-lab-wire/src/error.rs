use thiserror::Error;

/// Errors produced while encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// The delimiter split produced fewer header fields than expected.
    #[error("expected 5 delimiter-separated header fields, found {found}")]
    MissingFields { found: usize },

    /// A header field that must be text was not valid UTF-8.
    #[error("header field `{field}` is not valid UTF-8")]
    FieldNotText { field: &'static str },

    /// An address field did not parse as an IP address.
    #[error("invalid address field `{value}`")]
    InvalidAddress { value: String },

    /// A port field did not parse as a 16-bit integer.
    #[error("invalid port field `{value}`")]
    InvalidPort { value: String },

    /// The segment text is neither a well-formed data segment nor an ack.
    #[error("malformed segment text")]
    MalformedSegment,

    /// The encoded header does not fit into the configured frame capacity.
    #[error("encoded frame is {len} bytes but capacity is {capacity}")]
    FrameOverflow { len: usize, capacity: usize },
}
