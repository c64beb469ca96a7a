//! SHA-256 and SHA-224 descriptors (FIPS 180-4) for the digest engine.

use super::{DigestAlgorithm, DigestContext};

const BLOCK_SIZE: usize = 64;
const STATE_WORDS: usize = 8;
const SCHEDULE_WORDS: usize = 64;

const SHA256_INITIAL_STATE: [u32; STATE_WORDS] = [
    0x6A09_E667,
    0xBB67_AE85,
    0x3C6E_F372,
    0xA54F_F53A,
    0x510E_527F,
    0x9B05_688C,
    0x1F83_D9AB,
    0x5BE0_CD19,
];

const SHA224_INITIAL_STATE: [u32; STATE_WORDS] = [
    0xC105_9ED8,
    0x367C_D507,
    0x3070_DD17,
    0xF70E_5939,
    0xFFC0_0B31,
    0x6858_1511,
    0x64F9_8FA7,
    0xBEFA_4FA4,
];

const ROUND_CONSTANTS: [u32; SCHEDULE_WORDS] = [
    0x428A_2F98, 0x7137_4491, 0xB5C0_FBCF, 0xE9B5_DBA5, 0x3956_C25B, 0x59F1_11F1, 0x923F_82A4,
    0xAB1C_5ED5, 0xD807_AA98, 0x1283_5B01, 0x2431_85BE, 0x550C_7DC3, 0x72BE_5D74, 0x80DE_B1FE,
    0x9BDC_06A7, 0xC19B_F174, 0xE49B_69C1, 0xEFBE_4786, 0x0FC1_9DC6, 0x240C_A1CC, 0x2DE9_2C6F,
    0x4A74_84AA, 0x5CB0_A9DC, 0x76F9_88DA, 0x983E_5152, 0xA831_C66D, 0xB003_27C8, 0xBF59_7FC7,
    0xC6E0_0BF3, 0xD5A7_9147, 0x06CA_6351, 0x1429_2967, 0x27B7_0A85, 0x2E1B_2138, 0x4D2C_6DFC,
    0x5338_0D13, 0x650A_7354, 0x766A_0ABB, 0x81C2_C92E, 0x9272_2C85, 0xA2BF_E8A1, 0xA81A_664B,
    0xC24B_8B70, 0xC76C_51A3, 0xD192_E819, 0xD699_0624, 0xF40E_3585, 0x106A_A070, 0x19A4_C116,
    0x1E37_6C08, 0x2748_774C, 0x34B0_BCB5, 0x391C_0CB3, 0x4ED8_AA4A, 0x5B9C_CA4F, 0x682E_6FF3,
    0x748F_82EE, 0x78A5_636F, 0x84C8_7814, 0x8CC7_0208, 0x90BE_FFFA, 0xA450_6CEB, 0xBEF9_A3F7,
    0xC671_78F2,
];

/// SHA-256 descriptor: 64-byte blocks, 32-byte digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256;

/// SHA-224 descriptor: SHA-256 compression with its own IV, 28-byte digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha224;

impl Sha256 {
    /// Digest length in bytes.
    pub const OUTPUT_SIZE: usize = 32;

    /// Hash `data` in one call.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; Self::OUTPUT_SIZE] {
        let mut out = [0u8; Self::OUTPUT_SIZE];
        let mut ctx = DigestContext::init(&Sha256);
        ctx.update(data);
        ctx.finalize_into(&mut out);
        out
    }
}

impl Sha224 {
    /// Digest length in bytes.
    pub const OUTPUT_SIZE: usize = 28;

    /// Hash `data` in one call.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; Self::OUTPUT_SIZE] {
        let mut out = [0u8; Self::OUTPUT_SIZE];
        let mut ctx = DigestContext::init(&Sha224);
        ctx.update(data);
        ctx.finalize_into(&mut out);
        out
    }
}

impl DigestAlgorithm for Sha256 {
    type State = [u32; STATE_WORDS];

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn output_size(&self) -> usize {
        Self::OUTPUT_SIZE
    }

    fn state_size(&self) -> usize {
        STATE_WORDS * 4
    }

    fn initial_state(&self) -> Self::State {
        SHA256_INITIAL_STATE
    }

    fn compress(&self, state: &mut Self::State, num_blocks: usize, data: &[u8]) {
        compress_blocks(state, num_blocks, data);
    }

    fn write_output(&self, state: &Self::State, out: &mut [u8]) {
        write_be_words(state, out);
    }
}

impl DigestAlgorithm for Sha224 {
    type State = [u32; STATE_WORDS];

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn output_size(&self) -> usize {
        Self::OUTPUT_SIZE
    }

    fn state_size(&self) -> usize {
        STATE_WORDS * 4
    }

    fn initial_state(&self) -> Self::State {
        SHA224_INITIAL_STATE
    }

    fn compress(&self, state: &mut Self::State, num_blocks: usize, data: &[u8]) {
        compress_blocks(state, num_blocks, data);
    }

    fn write_output(&self, state: &Self::State, out: &mut [u8]) {
        write_be_words(&state[..7], out);
    }
}

fn write_be_words(words: &[u32], out: &mut [u8]) {
    for (chunk, value) in out.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&value.to_be_bytes());
    }
}

fn compress_blocks(state: &mut [u32; STATE_WORDS], num_blocks: usize, data: &[u8]) {
    debug_assert_eq!(data.len(), num_blocks * BLOCK_SIZE);
    for block in data.chunks_exact(BLOCK_SIZE) {
        process_block(state, block);
    }
}

#[inline(always)]
fn small_sigma0(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline(always)]
fn small_sigma1(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

#[inline(always)]
fn big_sigma0(x: u32) -> u32 {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline(always)]
fn big_sigma1(x: u32) -> u32 {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline(always)]
fn choice(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (!x & z)
}

#[inline(always)]
fn majority(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (x & z) ^ (y & z)
}

fn process_block(state: &mut [u32; STATE_WORDS], block: &[u8]) {
    let mut w = [0u32; SCHEDULE_WORDS];
    for (word, chunk) in w.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    for t in 16..SCHEDULE_WORDS {
        w[t] = w[t - 16]
            .wrapping_add(small_sigma0(w[t - 15]))
            .wrapping_add(w[t - 7])
            .wrapping_add(small_sigma1(w[t - 2]));
    }

    let mut v = *state;
    for t in 0..SCHEDULE_WORDS {
        let [a, b, c, d, e, f, g, h] = v;
        let t1 = h
            .wrapping_add(big_sigma1(e))
            .wrapping_add(choice(e, f, g))
            .wrapping_add(ROUND_CONSTANTS[t])
            .wrapping_add(w[t]);
        let t2 = big_sigma0(a).wrapping_add(majority(a, b, c));
        v = [t1.wrapping_add(t2), a, b, c, d.wrapping_add(t1), e, f, g];
    }

    for (word, value) in state.iter_mut().zip(v) {
        *word = word.wrapping_add(value);
    }
}
