use thiserror::Error;

/// Errors produced while decoding bytes received from the network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The buffer ended before the value could be read
    #[error("Unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A tag byte did not match any known variant (SECURITY: possibly a malicious packet)
    #[error("Invalid {kind} tag {value}. This may indicate a malformed or malicious packet")]
    InvalidTag { kind: &'static str, value: u32 },

    /// A string field was not valid UTF-8
    #[error("String field is not valid UTF-8")]
    InvalidUtf8,
}
