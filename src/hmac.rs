//! HMAC (RFC 2104) over any [`DigestAlgorithm`].

use crate::ct::{constant_time_equal, secure_zero};
use crate::digest::{DigestAlgorithm, DigestContext};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Keyed message authentication state.
///
/// The inner and outer digests are seeded with the padded key during
/// [`HmacContext::init`]; no raw key bytes are retained afterwards.
pub struct HmacContext<'d, D: DigestAlgorithm> {
    inner: DigestContext<'d, D>,
    outer: DigestContext<'d, D>,
    scratch: Vec<u8>,
}

impl<'d, D: DigestAlgorithm> HmacContext<'d, D> {
    /// Derive the pad blocks from `key` and seed both digest contexts.
    ///
    /// Keys longer than the block size are hashed first.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor's output is larger than its block.
    #[must_use]
    pub fn init(descriptor: &'d D, key: &[u8]) -> Self {
        let block_size = descriptor.block_size();
        let output_size = descriptor.output_size();
        assert!(
            output_size <= block_size,
            "HMAC needs output size {output_size} <= block size {block_size}"
        );

        let mut scratch = vec![0u8; block_size];
        if key.len() > block_size {
            let mut key_ctx = DigestContext::init(descriptor);
            key_ctx.update(key);
            key_ctx.finalize_into(&mut scratch[..output_size]);
        } else {
            scratch[..key.len()].copy_from_slice(key);
        }

        for byte in &mut scratch {
            *byte ^= IPAD;
        }
        let inner = DigestContext::with_prefix_block(descriptor, &scratch);

        for byte in &mut scratch {
            *byte ^= IPAD ^ OPAD;
        }
        let outer = DigestContext::with_prefix_block(descriptor, &scratch);

        secure_zero(&mut scratch);

        Self {
            inner,
            outer,
            scratch,
        }
    }

    /// Append `data` to the authenticated message.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Write the authentication tag to `out` and consume the context.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the descriptor's output size.
    pub fn finalize_into(mut self, out: &mut [u8]) {
        self.finish(out);
    }

    /// Recompute the tag and compare it with `expected` in constant time.
    #[must_use]
    pub fn verify(mut self, expected: &[u8]) -> bool {
        let output_size = self.tag_into_scratch();
        let matches = constant_time_equal(&self.scratch[..output_size], expected);
        secure_zero(&mut self.scratch);
        matches
    }

    fn finish(&mut self, out: &mut [u8]) {
        let output_size = self.inner.descriptor().output_size();
        assert_eq!(out.len(), output_size, "digest output buffer size");
        self.tag_into_scratch();
        out.copy_from_slice(&self.scratch[..output_size]);
        secure_zero(&mut self.scratch);
    }

    /// Run both digests, leaving the tag at the front of `scratch`.
    fn tag_into_scratch(&mut self) -> usize {
        let output_size = self.inner.descriptor().output_size();
        let buf = &mut self.scratch[..output_size];
        self.inner.finish(buf);
        self.outer.update(buf);
        self.outer.finish(buf);
        output_size
    }
}

impl<D: DigestAlgorithm> Drop for HmacContext<'_, D> {
    fn drop(&mut self) {
        secure_zero(&mut self.scratch);
    }
}

impl<D: DigestAlgorithm> core::fmt::Debug for HmacContext<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HmacContext")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Authenticate `data` under `key` in one call.
///
/// # Panics
///
/// Panics if `out.len()` differs from the descriptor's output size.
pub fn hmac_into<D: DigestAlgorithm>(descriptor: &D, key: &[u8], data: &[u8], out: &mut [u8]) {
    let mut ctx = HmacContext::init(descriptor, key);
    ctx.update(data);
    ctx.finalize_into(out);
}
