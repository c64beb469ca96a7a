//! Cipher block chaining over any [`BlockCipher`].
//!
//! The chaining value lives in the caller's IV buffer and is updated after
//! every block, so a long stream can be processed across several calls by
//! passing the same IV buffer back in.

use tracing::{debug, instrument};

use super::BlockCipher;
use crate::ct::secure_zero;
use crate::error::CipherError;

/// A keyed block cipher plus one scratch block for chaining.
pub struct CbcContext<C: BlockCipher> {
    cipher: C,
    scratch: Vec<u8>,
}

impl<C: BlockCipher> CbcContext<C> {
    /// Key-schedule a fresh primitive and wrap it.
    ///
    /// # Errors
    ///
    /// Returns whatever the primitive reports for unusable key material,
    /// typically [`CipherError::InvalidKeyLength`].
    pub fn init(key: &[u8]) -> Result<Self, CipherError> {
        let cipher = C::with_key(key)?;
        Ok(Self::from_cipher(cipher))
    }

    /// Wrap an already keyed primitive.
    ///
    /// # Panics
    ///
    /// Panics if the primitive reports a zero block size.
    #[must_use]
    pub fn from_cipher(cipher: C) -> Self {
        let block_size = cipher.block_size();
        assert!(block_size > 0, "block size must be non-zero");
        Self {
            cipher,
            scratch: vec![0u8; block_size],
        }
    }

    /// The wrapped primitive.
    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Bytes per block.
    pub fn block_size(&self) -> usize {
        self.scratch.len()
    }

    /// Encrypt `n_blocks` whole blocks from `input` into `output`.
    ///
    /// On return `iv` holds the last ciphertext block written.
    ///
    /// # Errors
    ///
    /// Stops at the first block the primitive fails on; output written up to
    /// that point is unspecified.
    ///
    /// # Panics
    ///
    /// Panics if `iv` is not exactly one block or either buffer is shorter
    /// than `n_blocks` blocks.
    #[instrument(level = "trace", skip(self, iv, input, output))]
    pub fn encrypt(
        &mut self,
        iv: &mut [u8],
        n_blocks: usize,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(), CipherError> {
        let span = self.check_buffers(iv, n_blocks, input.len(), output.len());
        let bs = self.block_size();

        for (index, (plain, out)) in input[..span]
            .chunks_exact(bs)
            .zip(output[..span].chunks_exact_mut(bs))
            .enumerate()
        {
            xor_into(&mut self.scratch, plain, iv);
            if let Err(err) = self.cipher.encrypt_block(&self.scratch, out) {
                return Err(self.abort(index, err));
            }
            iv.copy_from_slice(out);
        }

        secure_zero(&mut self.scratch);
        Ok(())
    }

    /// Decrypt `n_blocks` whole blocks from `input` into `output`.
    ///
    /// On return `iv` holds the last ciphertext block consumed.
    ///
    /// # Errors
    ///
    /// Stops at the first block the primitive fails on; output written up to
    /// that point is unspecified.
    ///
    /// # Panics
    ///
    /// Panics if `iv` is not exactly one block or either buffer is shorter
    /// than `n_blocks` blocks.
    #[instrument(level = "trace", skip(self, iv, input, output))]
    pub fn decrypt(
        &mut self,
        iv: &mut [u8],
        n_blocks: usize,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(), CipherError> {
        let span = self.check_buffers(iv, n_blocks, input.len(), output.len());
        let bs = self.block_size();

        for (index, (cipher_block, out)) in input[..span]
            .chunks_exact(bs)
            .zip(output[..span].chunks_exact_mut(bs))
            .enumerate()
        {
            if let Err(err) = self.cipher.decrypt_block(cipher_block, &mut self.scratch) {
                return Err(self.abort(index, err));
            }
            xor_into(out, &self.scratch, iv);
            iv.copy_from_slice(cipher_block);
        }

        secure_zero(&mut self.scratch);
        Ok(())
    }

    /// Encrypt the first `n_blocks` blocks of `buf` in place.
    ///
    /// # Errors
    ///
    /// As [`CbcContext::encrypt`].
    ///
    /// # Panics
    ///
    /// As [`CbcContext::encrypt`].
    #[instrument(level = "trace", skip(self, iv, buf))]
    pub fn encrypt_in_place(
        &mut self,
        iv: &mut [u8],
        n_blocks: usize,
        buf: &mut [u8],
    ) -> Result<(), CipherError> {
        let span = self.check_buffers(iv, n_blocks, buf.len(), buf.len());
        let bs = self.block_size();

        for (index, block) in buf[..span].chunks_exact_mut(bs).enumerate() {
            xor_into(&mut self.scratch, block, iv);
            if let Err(err) = self.cipher.encrypt_block(&self.scratch, block) {
                return Err(self.abort(index, err));
            }
            iv.copy_from_slice(block);
        }

        secure_zero(&mut self.scratch);
        Ok(())
    }

    /// Decrypt the first `n_blocks` blocks of `buf` in place.
    ///
    /// # Errors
    ///
    /// As [`CbcContext::decrypt`].
    ///
    /// # Panics
    ///
    /// As [`CbcContext::decrypt`].
    #[instrument(level = "trace", skip(self, iv, buf))]
    pub fn decrypt_in_place(
        &mut self,
        iv: &mut [u8],
        n_blocks: usize,
        buf: &mut [u8],
    ) -> Result<(), CipherError> {
        let span = self.check_buffers(iv, n_blocks, buf.len(), buf.len());
        let bs = self.block_size();

        for (index, block) in buf[..span].chunks_exact_mut(bs).enumerate() {
            if let Err(err) = self.cipher.decrypt_block(block, &mut self.scratch) {
                return Err(self.abort(index, err));
            }
            // Chain must advance to the ciphertext, which is overwritten here.
            for ((b, chain), s) in block.iter_mut().zip(iv.iter_mut()).zip(&self.scratch) {
                let ciphertext = *b;
                *b = s ^ *chain;
                *chain = ciphertext;
            }
        }

        secure_zero(&mut self.scratch);
        Ok(())
    }

    /// Clear the scratch block before handing a primitive failure back.
    fn abort(&mut self, block: usize, err: CipherError) -> CipherError {
        secure_zero(&mut self.scratch);
        debug!(block, error = %err, "CBC aborted by primitive failure");
        err
    }

    fn check_buffers(&self, iv: &[u8], n_blocks: usize, input: usize, output: usize) -> usize {
        let bs = self.block_size();
        assert_eq!(iv.len(), bs, "IV must be exactly one block");
        assert!(n_blocks <= usize::MAX / bs, "block count overflows usize");
        let span = n_blocks * bs;
        assert!(input >= span, "input shorter than {n_blocks} blocks");
        assert!(output >= span, "output shorter than {n_blocks} blocks");
        span
    }
}

fn xor_into(dst: &mut [u8], a: &[u8], b: &[u8]) {
    for ((d, x), y) in dst.iter_mut().zip(a).zip(b) {
        *d = x ^ y;
    }
}

impl<C: BlockCipher> Drop for CbcContext<C> {
    fn drop(&mut self) {
        secure_zero(&mut self.scratch);
    }
}

impl<C: BlockCipher> core::fmt::Debug for CbcContext<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CbcContext")
            .field("block_size", &self.block_size())
            .finish_non_exhaustive()
    }
}
