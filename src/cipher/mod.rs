//! Block cipher primitives and the CBC chaining mode built on them.

mod cbc;
mod des;

pub use cbc::CbcContext;
pub use des::{Des, TripleDes};

use crate::error::CipherError;

/// A keyed single-block transform.
///
/// Implementations are key-scheduled once by [`BlockCipher::with_key`] and
/// are read-only afterwards, so one keyed instance can be shared across
/// threads.
pub trait BlockCipher: Send + Sync {
    /// Schedule `key` into a ready-to-use primitive.
    fn with_key(key: &[u8]) -> Result<Self, CipherError>
    where
        Self: Sized;

    /// Bytes per block.
    fn block_size(&self) -> usize;

    /// Encrypt exactly one block from `input` into `output`.
    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError>;

    /// Decrypt exactly one block from `input` into `output`.
    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError>;
}
