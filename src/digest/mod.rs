//! Streaming message-digest engine over a pluggable compression function.
//!
//! A [`DigestAlgorithm`] describes one hash: its block and output sizes, its
//! initial state, its compression function, and its length-field rule. The
//! engine owns partial-block buffering and Merkle-Damgard finalization, so an
//! algorithm only has to supply the per-block transform.

mod sha256;

pub use sha256::{Sha224, Sha256};

use tracing::trace;

use crate::ct::secure_zero;

/// Padding marker appended right after the message.
const PAD_MARKER: u8 = 0x80;

/// Byte order of the encoded message bit length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first (SHA-1, SHA-2).
    Big,
    /// Least significant byte first (MD4, MD5, RIPEMD).
    Little,
}

/// Finalization rule: how the total message length is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthField {
    width: usize,
    order: ByteOrder,
}

impl LengthField {
    /// 64-bit big-endian bit count (SHA-1, SHA-224, SHA-256).
    pub const U64_BE: Self = Self::new(8, ByteOrder::Big);
    /// 64-bit little-endian bit count (MD5 family).
    pub const U64_LE: Self = Self::new(8, ByteOrder::Little);
    /// 128-bit big-endian bit count (SHA-384, SHA-512).
    pub const U128_BE: Self = Self::new(16, ByteOrder::Big);

    /// Build a length field of `width` bytes (8 or 16).
    ///
    /// # Panics
    ///
    /// Panics if `width` is neither 8 nor 16.
    #[must_use]
    pub const fn new(width: usize, order: ByteOrder) -> Self {
        assert!(width == 8 || width == 16, "length field must be 8 or 16 bytes");
        Self { width, order }
    }

    /// Number of bytes reserved at the end of the final block.
    #[must_use]
    pub const fn width(self) -> usize {
        self.width
    }

    /// Byte order of the encoded length.
    #[must_use]
    pub const fn order(self) -> ByteOrder {
        self.order
    }

    fn encode(self, bits: u128, dst: &mut [u8]) {
        debug_assert_eq!(dst.len(), self.width);
        match (self.width, self.order) {
            (8, ByteOrder::Big) => dst.copy_from_slice(&(bits as u64).to_be_bytes()),
            (8, ByteOrder::Little) => dst.copy_from_slice(&(bits as u64).to_le_bytes()),
            (_, ByteOrder::Big) => dst.copy_from_slice(&bits.to_be_bytes()),
            (_, ByteOrder::Little) => dst.copy_from_slice(&bits.to_le_bytes()),
        }
    }
}

/// Description of one hash algorithm.
///
/// Descriptors are immutable once built and are shared read-only by every
/// context created from them.
pub trait DigestAlgorithm: Send + Sync {
    /// Internal accumulator carried between compression calls.
    type State: Clone + Send;

    /// Bytes consumed per compression call.
    fn block_size(&self) -> usize;

    /// Length of the final digest in bytes.
    fn output_size(&self) -> usize;

    /// Size of the internal accumulator in bytes.
    fn state_size(&self) -> usize;

    /// Fresh accumulator for a new message.
    fn initial_state(&self) -> Self::State;

    /// Absorb `num_blocks` whole blocks.
    ///
    /// `data` is exactly `num_blocks * block_size()` bytes long.
    fn compress(&self, state: &mut Self::State, num_blocks: usize, data: &[u8]);

    /// Serialize the first `output_size()` bytes of the digest into `out`.
    fn write_output(&self, state: &Self::State, out: &mut [u8]);

    /// How the message length is encoded during finalization.
    fn length_field(&self) -> LengthField {
        LengthField::U64_BE
    }
}

/// Incremental hashing state for one message.
///
/// A context is owned by a single caller from [`DigestContext::init`] until
/// [`DigestContext::finalize_into`] consumes it.
#[derive(Clone)]
pub struct DigestContext<'d, D: DigestAlgorithm> {
    descriptor: &'d D,
    state: D::State,
    partial_block: Vec<u8>,
    partial_len: usize,
    total_bits: u128,
}

impl<'d, D: DigestAlgorithm> DigestContext<'d, D> {
    /// Start a new message for `descriptor`.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor is malformed: zero block or output size, or a
    /// block too small to hold the padding marker and the length field.
    #[must_use]
    pub fn init(descriptor: &'d D) -> Self {
        let block_size = descriptor.block_size();
        assert!(block_size > 0, "digest block size must be positive");
        assert!(descriptor.output_size() > 0, "digest output size must be positive");
        assert!(
            block_size > descriptor.length_field().width(),
            "digest block size {block_size} cannot hold the length field"
        );

        Self {
            descriptor,
            state: descriptor.initial_state(),
            partial_block: vec![0u8; block_size],
            partial_len: 0,
            total_bits: 0,
        }
    }

    /// Start a message whose first block has already been chosen.
    ///
    /// `block` is compressed in a single call and accounted as one full block
    /// of input. HMAC seeds its inner and outer contexts this way.
    pub(crate) fn with_prefix_block(descriptor: &'d D, block: &[u8]) -> Self {
        let mut ctx = Self::init(descriptor);
        assert_eq!(block.len(), descriptor.block_size(), "prefix must be one block");
        descriptor.compress(&mut ctx.state, 1, block);
        ctx.total_bits = bits(block.len());
        ctx
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &D::State {
        &self.state
    }

    /// Descriptor this context was created from.
    #[must_use]
    pub fn descriptor(&self) -> &'d D {
        self.descriptor
    }

    /// Append `data` to the message.
    pub fn update(&mut self, mut data: &[u8]) {
        let block_size = self.descriptor.block_size();

        while !data.is_empty() {
            if self.partial_len == 0 && data.len() >= block_size {
                let num_blocks = data.len() / block_size;
                let len = num_blocks * block_size;
                trace!(blocks = num_blocks, "bulk compress");
                self.descriptor.compress(&mut self.state, num_blocks, &data[..len]);
                self.total_bits = self.total_bits.wrapping_add(bits(len));
                data = &data[len..];
            } else {
                let take = (block_size - self.partial_len).min(data.len());
                let (head, tail) = data.split_at(take);
                self.partial_block[self.partial_len..self.partial_len + take].copy_from_slice(head);
                self.partial_len += take;
                data = tail;

                if self.partial_len == block_size {
                    self.descriptor.compress(&mut self.state, 1, &self.partial_block);
                    self.total_bits = self.total_bits.wrapping_add(bits(block_size));
                    self.partial_len = 0;
                }
            }
        }
    }

    /// Pad the message, write the digest to `out`, and consume the context.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the descriptor's output size.
    pub fn finalize_into(mut self, out: &mut [u8]) {
        self.finish(out);
    }

    /// Discard the current message and start over with the same descriptor.
    pub fn reset(&mut self) {
        self.state = self.descriptor.initial_state();
        secure_zero(&mut self.partial_block);
        self.partial_len = 0;
        self.total_bits = 0;
    }

    /// Finalization body shared with HMAC, which owns its contexts by value
    /// and cannot move them out.
    pub(crate) fn finish(&mut self, out: &mut [u8]) {
        let descriptor = self.descriptor;
        let block_size = descriptor.block_size();
        let length_field = descriptor.length_field();
        let reserve = length_field.width();
        assert_eq!(out.len(), descriptor.output_size(), "digest output buffer size");

        let total_bits = self.total_bits.wrapping_add(bits(self.partial_len));
        let mut len = self.partial_len;

        self.partial_block[len] = PAD_MARKER;
        len += 1;

        if len > block_size - reserve {
            self.partial_block[len..].fill(0);
            descriptor.compress(&mut self.state, 1, &self.partial_block);
            len = 0;
        }

        self.partial_block[len..block_size - reserve].fill(0);
        length_field.encode(total_bits, &mut self.partial_block[block_size - reserve..]);
        descriptor.compress(&mut self.state, 1, &self.partial_block);
        descriptor.write_output(&self.state, out);

        secure_zero(&mut self.partial_block);
        self.partial_len = 0;
    }
}

impl<D: DigestAlgorithm> Drop for DigestContext<'_, D> {
    fn drop(&mut self) {
        secure_zero(&mut self.partial_block);
    }
}

impl<D: DigestAlgorithm> core::fmt::Debug for DigestContext<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DigestContext")
            .field("block_size", &self.descriptor.block_size())
            .field("partial_len", &self.partial_len)
            .field("total_bits", &self.total_bits)
            .finish_non_exhaustive()
    }
}

/// Digest `data` in one call.
///
/// # Panics
///
/// Panics if `out.len()` differs from the descriptor's output size.
pub fn digest_into<D: DigestAlgorithm>(descriptor: &D, data: &[u8], out: &mut [u8]) {
    let mut ctx = DigestContext::init(descriptor);
    ctx.update(data);
    ctx.finalize_into(out);
}

#[inline]
fn bits(bytes: usize) -> u128 {
    (bytes as u128) << 3
}


#[cfg(test)]
mod tests {
    use super::testing::{Fold, Recorder};
    use super::*;

    fn fold(block_size: usize, length_field: LengthField) -> Fold {
        Fold {
            block_size,
            length_field,
        }
    }

    fn one_shot<D: DigestAlgorithm>(descriptor: &D, data: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; descriptor.output_size()];
        digest_into(descriptor, data, &mut out);
        out
    }

    #[test]
    fn whole_blocks_are_compressed_in_one_call() {
        let recorder = Recorder { block_size: 16 };
        let mut ctx = DigestContext::init(&recorder);
        ctx.update(&[7u8; 16 * 5 + 3]);

        assert_eq!(ctx.state.len(), 1);
        assert_eq!(ctx.state[0].0, 5);
        assert_eq!(ctx.state[0].1.len(), 80);
        assert_eq!(ctx.partial_len, 3);
        assert_eq!(ctx.total_bits, 80 * 8);
    }

    #[test]
    fn partial_block_is_topped_up_before_bulk_path() {
        let recorder = Recorder { block_size: 16 };
        let mut ctx = DigestContext::init(&recorder);
        ctx.update(&[1u8; 5]);
        assert!(ctx.state.is_empty());
        assert_eq!(ctx.total_bits, 0, "buffered bytes are not counted");

        ctx.update(&[2u8; 11 + 32 + 1]);
        let calls: Vec<usize> = ctx.state.iter().map(|(n, _)| *n).collect();
        assert_eq!(calls, vec![1, 2]);
        assert_eq!(&ctx.state[0].1[..5], &[1u8; 5]);
        assert_eq!(&ctx.state[0].1[5..], &[2u8; 11]);
        assert_eq!(ctx.partial_len, 1);
        assert_eq!(ctx.total_bits, 48 * 8);
    }

    #[test]
    fn final_block_layout_big_endian() {
        let recorder = Recorder { block_size: 16 };
        let mut ctx = DigestContext::init(&recorder);
        ctx.update(b"abc");
        let mut out = [0u8; 1];
        ctx.finish(&mut out);

        assert_eq!(out[0], 1);
        let last = &ctx.state[0].1;
        assert_eq!(&last[..4], b"abc\x80");
        assert_eq!(&last[4..8], &[0u8; 4]);
        assert_eq!(&last[8..], &24u64.to_be_bytes());
    }

    #[test]
    fn spill_into_extra_block_when_length_does_not_fit() {
        let recorder = Recorder { block_size: 16 };
        let mut ctx = DigestContext::init(&recorder);
        ctx.update(&[0xaa; 8]);
        let mut out = [0u8; 1];
        ctx.finish(&mut out);

        assert_eq!(ctx.state.len(), 2);
        assert_eq!(ctx.state[0].1[8], PAD_MARKER);
        assert!(ctx.state[0].1[9..].iter().all(|&b| b == 0));
        assert_eq!(&ctx.state[1].1[..8], &[0u8; 8]);
        assert_eq!(&ctx.state[1].1[8..], &64u64.to_be_bytes());
    }

    #[test]
    fn seven_pending_bytes_still_fit_length() {
        let recorder = Recorder { block_size: 16 };
        let mut ctx = DigestContext::init(&recorder);
        ctx.update(&[0xaa; 7]);
        let mut out = [0u8; 1];
        ctx.finish(&mut out);
        assert_eq!(ctx.state.len(), 1);
    }

    #[test]
    fn little_endian_and_wide_length_fields() {
        let recorder = Recorder { block_size: 32 };
        let mut ctx = DigestContext::init(&recorder);
        ctx.update(&[0u8; 33]);
        let mut out = [0u8; 1];
        ctx.finish(&mut out);
        let last = &ctx.state[1].1;
        assert_eq!(&last[24..], &(33u64 * 8).to_be_bytes());

        let mut le = [0u8; 8];
        LengthField::U64_LE.encode(264, &mut le);
        assert_eq!(le, 264u64.to_le_bytes());

        let mut wide = [0u8; 16];
        LengthField::U128_BE.encode(264, &mut wide);
        assert_eq!(&wide[..14], &[0u8; 14]);
        assert_eq!(&wide[14..], &[0x01, 0x08]);
    }

    #[test]
    fn length_field_byte_order_changes_digest() {
        let message = b"length field sensitivity";
        let be = one_shot(&fold(64, LengthField::U64_BE), message);
        let le = one_shot(&fold(64, LengthField::U64_LE), message);
        assert_ne!(be, le);
    }

    #[test]
    fn wide_field_matches_narrow_until_it_spills() {
        let narrow = fold(64, LengthField::U64_BE);
        let wide = fold(64, LengthField::U128_BE);

        // Upper half of a 128-bit count is zero, same as the narrow padding.
        for len in [0usize, 24, 47] {
            let data = vec![0x3cu8; len];
            assert_eq!(one_shot(&narrow, &data), one_shot(&wide, &data), "length {len}");
        }

        // 48..=55 pending bytes leave room for 8 length bytes but not 16.
        for len in [48usize, 50, 55] {
            let data = vec![0x3cu8; len];
            assert_ne!(one_shot(&narrow, &data), one_shot(&wide, &data), "length {len}");
        }
    }

    #[test]
    fn wide_length_field_with_large_blocks() {
        let descriptor = fold(128, LengthField::U128_BE);
        for len in [0usize, 110, 111, 112, 127, 128, 300] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let mut ctx = DigestContext::init(&descriptor);
            for byte in &data {
                ctx.update(core::slice::from_ref(byte));
            }
            let mut streamed = [0u8; 16];
            ctx.finalize_into(&mut streamed);
            assert_eq!(streamed.to_vec(), one_shot(&descriptor, &data), "length {len}");
        }
    }

    #[test]
    fn reset_starts_a_fresh_message() {
        let descriptor = fold(64, LengthField::U64_BE);
        let mut ctx = DigestContext::init(&descriptor);
        ctx.update(b"discarded prefix that spans more than one block of input, surely");
        ctx.reset();
        ctx.update(b"kept");
        let mut out = [0u8; 16];
        ctx.finalize_into(&mut out);
        assert_eq!(out.to_vec(), one_shot(&descriptor, b"kept"));
    }

    #[test]
    fn empty_updates_are_no_ops() {
        let descriptor = fold(64, LengthField::U64_BE);
        let mut ctx = DigestContext::init(&descriptor);
        ctx.update(&[]);
        ctx.update(b"x");
        ctx.update(&[]);
        let mut out = [0u8; 16];
        ctx.finalize_into(&mut out);
        assert_eq!(out.to_vec(), one_shot(&descriptor, b"x"));
    }

    #[test]
    #[should_panic(expected = "digest output buffer size")]
    fn wrong_output_length_panics() {
        let descriptor = fold(64, LengthField::U64_BE);
        let ctx = DigestContext::init(&descriptor);
        let mut out = [0u8; 15];
        ctx.finalize_into(&mut out);
    }

    #[test]
    #[should_panic(expected = "block size must be positive")]
    fn zero_block_size_panics() {
        let descriptor = fold(0, LengthField::U64_BE);
        let _ = DigestContext::init(&descriptor);
    }

    #[test]
    #[should_panic(expected = "cannot hold the length field")]
    fn block_smaller_than_length_field_panics() {
        let descriptor = fold(16, LengthField::U128_BE);
        let _ = DigestContext::init(&descriptor);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn chunked(descriptor: &Fold, data: &[u8], cuts: &[usize]) -> Vec<u8> {
            let mut ctx = DigestContext::init(descriptor);
            let mut rest = data;
            for &cut in cuts {
                let at = cut.min(rest.len());
                let (head, tail) = rest.split_at(at);
                ctx.update(head);
                rest = tail;
            }
            ctx.update(rest);
            let mut out = vec![0u8; 16];
            ctx.finalize_into(&mut out);
            out
        }

        proptest! {
            /// Property: chunk boundaries never affect the digest.
            #[test]
            fn prop_chunking_is_invisible(
                data in prop::collection::vec(any::<u8>(), 0..1024),
                cuts in prop::collection::vec(0usize..200, 0..24),
                block_size in prop_oneof![Just(32usize), Just(64), Just(128)],
            ) {
                let descriptor = fold(block_size, LengthField::U64_LE);
                prop_assert_eq!(chunked(&descriptor, &data, &cuts), one_shot(&descriptor, &data));
            }
        }
    }
}
