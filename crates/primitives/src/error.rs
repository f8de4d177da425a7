/// Errors raised while building chain types from user input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrimitivesError {
    #[error("invalid balance `{input}`: {reason}")]
    InvalidBalance { input: String, reason: String },

    #[error("invalid MPC address `{input}`: {reason}")]
    InvalidMpcAddress { input: String, reason: String },

    #[error("invalid hex `{input}`: {reason}")]
    InvalidHex { input: String, reason: String },

    #[error("general key is {0} bytes, at most 32 are allowed")]
    GeneralKeyTooLong(usize),

    #[error("a location holds at most 8 junctions, got {0}")]
    TooManyJunctions(usize),

    #[error("unknown fee handler `{0}`")]
    UnknownFeeHandler(String),
}
