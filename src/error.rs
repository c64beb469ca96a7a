//! Error types for cipher keying and for the random generator.
//!
//! Digest, HMAC, and CBC over well-formed buffers never fail; contract
//! violations (wrong buffer sizes, malformed descriptors) panic instead of
//! surfacing here.

/// Errors raised by block cipher primitives and the modes built on them.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    /// Key material has a length the primitive cannot schedule.
    #[error("invalid key length: {len} bytes")]
    InvalidKeyLength {
        /// Length of the rejected key.
        len: usize,
    },
    /// The underlying single-block transform reported a failure.
    #[error("cipher primitive failure: {reason}")]
    Primitive {
        /// Primitive-specific description.
        reason: String,
    },
}

/// Errors raised while drawing random bytes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RngError {
    /// The entropy source could not be opened or read.
    #[error("entropy source unavailable: {reason}")]
    EntropyUnavailable {
        /// Source-specific description.
        reason: String,
    },
    /// The entropy source produced fewer bytes than requested.
    #[error("entropy source returned {got} bytes, expected {expected}")]
    ShortEntropy {
        /// Bytes requested from the source.
        expected: usize,
        /// Bytes actually produced.
        got: usize,
    },
    /// Generator limits are out of range.
    #[error("invalid random generator config: {reason}")]
    InvalidConfig {
        /// Which limit was rejected.
        reason: String,
    },
    /// A previous holder of the generator lock panicked.
    #[error("random generator state poisoned")]
    Poisoned,
}
