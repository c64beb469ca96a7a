//! DES and two/three-key Triple-DES (EDE) block primitives.
//!
//! The round function uses combined S-box/P-box tables (one lookup per
//! six-bit group); key schedules are expanded once at keying time and zeroed on
//! drop. Parity bits in the key are ignored.

use super::BlockCipher;
use crate::ct::secure_zero;
use crate::error::CipherError;

const BLOCK_SIZE: usize = 8;
const KEY_SIZE: usize = 8;
const SCHEDULE_WORDS: usize = 32;

type Schedule = [u32; SCHEDULE_WORDS];

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

const SP1: [u32; 64] = [
    0x0101_0400, 0x0000_0000, 0x0001_0000, 0x0101_0404, 0x0101_0004, 0x0001_0404,
    0x0000_0004, 0x0001_0000, 0x0000_0400, 0x0101_0400, 0x0101_0404, 0x0000_0400,
    0x0100_0404, 0x0101_0004, 0x0100_0000, 0x0000_0004, 0x0000_0404, 0x0100_0400,
    0x0100_0400, 0x0001_0400, 0x0001_0400, 0x0101_0000, 0x0101_0000, 0x0100_0404,
    0x0001_0004, 0x0100_0004, 0x0100_0004, 0x0001_0004, 0x0000_0000, 0x0000_0404,
    0x0001_0404, 0x0100_0000, 0x0001_0000, 0x0101_0404, 0x0000_0004, 0x0101_0000,
    0x0101_0400, 0x0100_0000, 0x0100_0000, 0x0000_0400, 0x0101_0004, 0x0001_0000,
    0x0001_0400, 0x0100_0004, 0x0000_0400, 0x0000_0004, 0x0100_0404, 0x0001_0404,
    0x0101_0404, 0x0001_0004, 0x0101_0000, 0x0100_0404, 0x0100_0004, 0x0000_0404,
    0x0001_0404, 0x0101_0400, 0x0000_0404, 0x0100_0400, 0x0100_0400, 0x0000_0000,
    0x0001_0004, 0x0001_0400, 0x0000_0000, 0x0101_0004,
];

const SP2: [u32; 64] = [
    0x8010_8020, 0x8000_8000, 0x0000_8000, 0x0010_8020, 0x0010_0000, 0x0000_0020,
    0x8010_0020, 0x8000_8020, 0x8000_0020, 0x8010_8020, 0x8010_8000, 0x8000_0000,
    0x8000_8000, 0x0010_0000, 0x0000_0020, 0x8010_0020, 0x0010_8000, 0x0010_0020,
    0x8000_8020, 0x0000_0000, 0x8000_0000, 0x0000_8000, 0x0010_8020, 0x8010_0000,
    0x0010_0020, 0x8000_0020, 0x0000_0000, 0x0010_8000, 0x0000_8020, 0x8010_8000,
    0x8010_0000, 0x0000_8020, 0x0000_0000, 0x0010_8020, 0x8010_0020, 0x0010_0000,
    0x8000_8020, 0x8010_0000, 0x8010_8000, 0x0000_8000, 0x8010_0000, 0x8000_8000,
    0x0000_0020, 0x8010_8020, 0x0010_8020, 0x0000_0020, 0x0000_8000, 0x8000_0000,
    0x0000_8020, 0x8010_8000, 0x0010_0000, 0x8000_0020, 0x0010_0020, 0x8000_8020,
    0x8000_0020, 0x0010_0020, 0x0010_8000, 0x0000_0000, 0x8000_8000, 0x0000_8020,
    0x8000_0000, 0x8010_0020, 0x8010_8020, 0x0010_8000,
];

const SP3: [u32; 64] = [
    0x0000_0208, 0x0802_0200, 0x0000_0000, 0x0802_0008, 0x0800_0200, 0x0000_0000,
    0x0002_0208, 0x0800_0200, 0x0002_0008, 0x0800_0008, 0x0800_0008, 0x0002_0000,
    0x0802_0208, 0x0002_0008, 0x0802_0000, 0x0000_0208, 0x0800_0000, 0x0000_0008,
    0x0802_0200, 0x0000_0200, 0x0002_0200, 0x0802_0000, 0x0802_0008, 0x0002_0208,
    0x0800_0208, 0x0002_0200, 0x0002_0000, 0x0800_0208, 0x0000_0008, 0x0802_0208,
    0x0000_0200, 0x0800_0000, 0x0802_0200, 0x0800_0000, 0x0002_0008, 0x0000_0208,
    0x0002_0000, 0x0802_0200, 0x0800_0200, 0x0000_0000, 0x0000_0200, 0x0002_0008,
    0x0802_0208, 0x0800_0200, 0x0800_0008, 0x0000_0200, 0x0000_0000, 0x0802_0008,
    0x0800_0208, 0x0002_0000, 0x0800_0000, 0x0802_0208, 0x0000_0008, 0x0002_0208,
    0x0002_0200, 0x0800_0008, 0x0802_0000, 0x0800_0208, 0x0000_0208, 0x0802_0000,
    0x0002_0208, 0x0000_0008, 0x0802_0008, 0x0002_0200,
];

const SP4: [u32; 64] = [
    0x0080_2001, 0x0000_2081, 0x0000_2081, 0x0000_0080, 0x0080_2080, 0x0080_0081,
    0x0080_0001, 0x0000_2001, 0x0000_0000, 0x0080_2000, 0x0080_2000, 0x0080_2081,
    0x0000_0081, 0x0000_0000, 0x0080_0080, 0x0080_0001, 0x0000_0001, 0x0000_2000,
    0x0080_0000, 0x0080_2001, 0x0000_0080, 0x0080_0000, 0x0000_2001, 0x0000_2080,
    0x0080_0081, 0x0000_0001, 0x0000_2080, 0x0080_0080, 0x0000_2000, 0x0080_2080,
    0x0080_2081, 0x0000_0081, 0x0080_0080, 0x0080_0001, 0x0080_2000, 0x0080_2081,
    0x0000_0081, 0x0000_0000, 0x0000_0000, 0x0080_2000, 0x0000_2080, 0x0080_0080,
    0x0080_0081, 0x0000_0001, 0x0080_2001, 0x0000_2081, 0x0000_2081, 0x0000_0080,
    0x0080_2081, 0x0000_0081, 0x0000_0001, 0x0000_2000, 0x0080_0001, 0x0000_2001,
    0x0080_2080, 0x0080_0081, 0x0000_2001, 0x0000_2080, 0x0080_0000, 0x0080_2001,
    0x0000_0080, 0x0080_0000, 0x0000_2000, 0x0080_2080,
];

const SP5: [u32; 64] = [
    0x0000_0100, 0x0208_0100, 0x0208_0000, 0x4200_0100, 0x0008_0000, 0x0000_0100,
    0x4000_0000, 0x0208_0000, 0x4008_0100, 0x0008_0000, 0x0200_0100, 0x4008_0100,
    0x4200_0100, 0x4208_0000, 0x0008_0100, 0x4000_0000, 0x0200_0000, 0x4008_0000,
    0x4008_0000, 0x0000_0000, 0x4000_0100, 0x4208_0100, 0x4208_0100, 0x0200_0100,
    0x4208_0000, 0x4000_0100, 0x0000_0000, 0x4200_0000, 0x0208_0100, 0x0200_0000,
    0x4200_0000, 0x0008_0100, 0x0008_0000, 0x4200_0100, 0x0000_0100, 0x0200_0000,
    0x4000_0000, 0x0208_0000, 0x4200_0100, 0x4008_0100, 0x0200_0100, 0x4000_0000,
    0x4208_0000, 0x0208_0100, 0x4008_0100, 0x0000_0100, 0x0200_0000, 0x4208_0000,
    0x4208_0100, 0x0008_0100, 0x4200_0000, 0x4208_0100, 0x0208_0000, 0x0000_0000,
    0x4008_0000, 0x4200_0000, 0x0008_0100, 0x0200_0100, 0x4000_0100, 0x0008_0000,
    0x0000_0000, 0x4008_0000, 0x0208_0100, 0x4000_0100,
];

const SP6: [u32; 64] = [
    0x2000_0010, 0x2040_0000, 0x0000_4000, 0x2040_4010, 0x2040_0000, 0x0000_0010,
    0x2040_4010, 0x0040_0000, 0x2000_4000, 0x0040_4010, 0x0040_0000, 0x2000_0010,
    0x0040_0010, 0x2000_4000, 0x2000_0000, 0x0000_4010, 0x0000_0000, 0x0040_0010,
    0x2000_4010, 0x0000_4000, 0x0040_4000, 0x2000_4010, 0x0000_0010, 0x2040_0010,
    0x2040_0010, 0x0000_0000, 0x0040_4010, 0x2040_4000, 0x0000_4010, 0x0040_4000,
    0x2040_4000, 0x2000_0000, 0x2000_4000, 0x0000_0010, 0x2040_0010, 0x0040_4000,
    0x2040_4010, 0x0040_0000, 0x0000_4010, 0x2000_0010, 0x0040_0000, 0x2000_4000,
    0x2000_0000, 0x0000_4010, 0x2000_0010, 0x2040_4010, 0x0040_4000, 0x2040_0000,
    0x0040_4010, 0x2040_4000, 0x0000_0000, 0x2040_0010, 0x0000_0010, 0x0000_4000,
    0x2040_0000, 0x0040_4010, 0x0000_4000, 0x0040_0010, 0x2000_4010, 0x0000_0000,
    0x2040_4000, 0x2000_0000, 0x0040_0010, 0x2000_4010,
];

const SP7: [u32; 64] = [
    0x0020_0000, 0x0420_0002, 0x0400_0802, 0x0000_0000, 0x0000_0800, 0x0400_0802,
    0x0020_0802, 0x0420_0800, 0x0420_0802, 0x0020_0000, 0x0000_0000, 0x0400_0002,
    0x0000_0002, 0x0400_0000, 0x0420_0002, 0x0000_0802, 0x0400_0800, 0x0020_0802,
    0x0020_0002, 0x0400_0800, 0x0400_0002, 0x0420_0000, 0x0420_0800, 0x0020_0002,
    0x0420_0000, 0x0000_0800, 0x0000_0802, 0x0420_0802, 0x0020_0800, 0x0000_0002,
    0x0400_0000, 0x0020_0800, 0x0400_0000, 0x0020_0800, 0x0020_0000, 0x0400_0802,
    0x0400_0802, 0x0420_0002, 0x0420_0002, 0x0000_0002, 0x0020_0002, 0x0400_0000,
    0x0400_0800, 0x0020_0000, 0x0420_0800, 0x0000_0802, 0x0020_0802, 0x0420_0800,
    0x0000_0802, 0x0400_0002, 0x0420_0802, 0x0420_0000, 0x0020_0800, 0x0000_0000,
    0x0000_0002, 0x0420_0802, 0x0000_0000, 0x0020_0802, 0x0420_0000, 0x0000_0800,
    0x0400_0002, 0x0400_0800, 0x0000_0800, 0x0020_0002,
];

const SP8: [u32; 64] = [
    0x1000_1040, 0x0000_1000, 0x0004_0000, 0x1004_1040, 0x1000_0000, 0x1000_1040,
    0x0000_0040, 0x1000_0000, 0x0004_0040, 0x1004_0000, 0x1004_1040, 0x0004_1000,
    0x1004_1000, 0x0004_1040, 0x0000_1000, 0x0000_0040, 0x1004_0000, 0x1000_0040,
    0x1000_1000, 0x0000_1040, 0x0004_1000, 0x0004_0040, 0x1004_0040, 0x1004_1000,
    0x0000_1040, 0x0000_0000, 0x0000_0000, 0x1004_0040, 0x1000_0040, 0x1000_1000,
    0x0004_1040, 0x0004_0000, 0x0004_1040, 0x0004_0000, 0x1004_1000, 0x0000_1000,
    0x0000_0040, 0x1004_0040, 0x0000_1000, 0x0004_1040, 0x1000_1000, 0x0000_0040,
    0x1000_0040, 0x1004_0000, 0x1004_0040, 0x1000_0000, 0x0004_0000, 0x1000_1040,
    0x0000_0000, 0x1004_1040, 0x0004_0040, 0x1000_0040, 0x1004_0000, 0x1000_1000,
    0x1000_1040, 0x0000_0000, 0x1004_1040, 0x0004_1000, 0x0004_1000, 0x0000_1040,
    0x0000_1040, 0x0004_0040, 0x1000_0000, 0x1004_1000,
];

const PC1: [u8; 56] = [
    56, 48, 40, 32, 24, 16, 8, 0, 57, 49, 41, 33, 25, 17,
    9, 1, 58, 50, 42, 34, 26, 18, 10, 2, 59, 51, 43, 35,
    62, 54, 46, 38, 30, 22, 14, 6, 61, 53, 45, 37, 29, 21,
    13, 5, 60, 52, 44, 36, 28, 20, 12, 4, 27, 19, 11, 3,
];

const TOTROT: [u8; 16] = [
    1, 2, 4, 6, 8, 10, 12, 14, 15, 17, 19, 21, 23, 25,
    27, 28,
];

const PC2: [u8; 48] = [
    13, 16, 10, 23, 0, 4, 2, 27, 14, 5, 20, 9, 22, 18,
    11, 3, 25, 7, 15, 6, 26, 19, 12, 1, 40, 51, 30, 36,
    46, 54, 29, 39, 50, 44, 32, 47, 43, 48, 38, 55, 33, 52,
    45, 41, 49, 35, 28, 31,
];

const BYTEBIT: [u8; 8] = [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01];

const BIGBYTE: [u32; 24] = [
    0x0080_0000, 0x0040_0000, 0x0020_0000, 0x0010_0000, 0x0008_0000, 0x0004_0000,
    0x0002_0000, 0x0001_0000, 0x0000_8000, 0x0000_4000, 0x0000_2000, 0x0000_1000,
    0x0000_0800, 0x0000_0400, 0x0000_0200, 0x0000_0100, 0x0000_0080, 0x0000_0040,
    0x0000_0020, 0x0000_0010, 0x0000_0008, 0x0000_0004, 0x0000_0002, 0x0000_0001,
];

/// Expand an 8-byte key into the 16 round subkeys for one direction.
fn key_schedule(key: &[u8], direction: Direction) -> Schedule {
    let mut pc1m = [0u8; 56];
    let mut pcr = [0u8; 56];
    let mut kn: Schedule = [0; SCHEDULE_WORDS];

    for (bit, &pos) in pc1m.iter_mut().zip(PC1.iter()) {
        let pos = usize::from(pos);
        *bit = u8::from(key[pos >> 3] & BYTEBIT[pos & 7] != 0);
    }

    for (round, &rotation) in TOTROT.iter().enumerate() {
        let m = match direction {
            Direction::Encrypt => round << 1,
            Direction::Decrypt => (15 - round) << 1,
        };
        let n = m + 1;
        let rotation = usize::from(rotation);

        for (j, slot) in pcr.iter_mut().enumerate() {
            let l = j + rotation;
            let limit = if j < 28 { 28 } else { 56 };
            *slot = if l < limit { pc1m[l] } else { pc1m[l - 28] };
        }

        kn[m] = 0;
        kn[n] = 0;
        for (j, &mask) in BIGBYTE.iter().enumerate() {
            if pcr[usize::from(PC2[j])] != 0 {
                kn[m] |= mask;
            }
            if pcr[usize::from(PC2[j + 24])] != 0 {
                kn[n] |= mask;
            }
        }
    }

    let cooked = cook(&kn);
    secure_zero(&mut pc1m);
    secure_zero(&mut pcr);
    secure_zero(&mut kn);
    cooked
}

/// Rearrange raw subkey pairs into the layout the round function indexes.
fn cook(raw: &Schedule) -> Schedule {
    let mut out: Schedule = [0; SCHEDULE_WORDS];
    for (dst, src) in out.chunks_exact_mut(2).zip(raw.chunks_exact(2)) {
        let (raw0, raw1) = (src[0], src[1]);
        dst[0] = ((raw0 & 0x00fc_0000) << 6)
            | ((raw0 & 0x0000_0fc0) << 10)
            | ((raw1 & 0x00fc_0000) >> 10)
            | ((raw1 & 0x0000_0fc0) >> 6);
        dst[1] = ((raw0 & 0x0003_f000) << 12)
            | ((raw0 & 0x0000_003f) << 16)
            | ((raw1 & 0x0003_f000) >> 4)
            | (raw1 & 0x0000_003f);
    }
    out
}

#[inline(always)]
fn sp(table: &[u32; 64], work: u32, shift: u32) -> u32 {
    table[((work >> shift) & 0x3f) as usize]
}

/// Initial permutation, 16 Feistel rounds, final permutation.
fn des_rounds(block: &mut [u32; 2], keys: &Schedule) {
    let mut left = block[0];
    let mut right = block[1];

    let mut work = ((left >> 4) ^ right) & 0x0f0f_0f0f;
    right ^= work;
    left ^= work << 4;

    work = ((left >> 16) ^ right) & 0x0000_ffff;
    right ^= work;
    left ^= work << 16;

    work = ((right >> 2) ^ left) & 0x3333_3333;
    left ^= work;
    right ^= work << 2;

    work = ((right >> 8) ^ left) & 0x00ff_00ff;
    left ^= work;
    right ^= work << 8;

    right = right.rotate_left(1);
    work = (left ^ right) & 0xaaaa_aaaa;
    left ^= work;
    right ^= work;
    left = left.rotate_left(1);

    for subkeys in keys.chunks_exact(4) {
        work = right.rotate_right(4) ^ subkeys[0];
        left ^= sp(&SP7, work, 0) ^ sp(&SP5, work, 8) ^ sp(&SP3, work, 16) ^ sp(&SP1, work, 24);
        work = right ^ subkeys[1];
        left ^= sp(&SP8, work, 0) ^ sp(&SP6, work, 8) ^ sp(&SP4, work, 16) ^ sp(&SP2, work, 24);

        work = left.rotate_right(4) ^ subkeys[2];
        right ^= sp(&SP7, work, 0) ^ sp(&SP5, work, 8) ^ sp(&SP3, work, 16) ^ sp(&SP1, work, 24);
        work = left ^ subkeys[3];
        right ^= sp(&SP8, work, 0) ^ sp(&SP6, work, 8) ^ sp(&SP4, work, 16) ^ sp(&SP2, work, 24);
    }

    right = right.rotate_right(1);
    work = (left ^ right) & 0xaaaa_aaaa;
    left ^= work;
    right ^= work;
    left = left.rotate_right(1);

    work = ((left >> 8) ^ right) & 0x00ff_00ff;
    right ^= work;
    left ^= work << 8;

    work = ((left >> 2) ^ right) & 0x3333_3333;
    right ^= work;
    left ^= work << 2;

    work = ((right >> 16) ^ left) & 0x0000_ffff;
    left ^= work;
    right ^= work << 16;

    work = ((right >> 4) ^ left) & 0x0f0f_0f0f;
    left ^= work;
    right ^= work << 4;

    block[0] = right;
    block[1] = left;
}

fn check_block(input: &[u8], output: &[u8]) {
    assert_eq!(input.len(), BLOCK_SIZE, "DES input must be one block");
    assert_eq!(output.len(), BLOCK_SIZE, "DES output must be one block");
}

fn load(input: &[u8]) -> [u32; 2] {
    [
        u32::from_be_bytes([input[0], input[1], input[2], input[3]]),
        u32::from_be_bytes([input[4], input[5], input[6], input[7]]),
    ]
}

fn store(block: [u32; 2], output: &mut [u8]) {
    output[..4].copy_from_slice(&block[0].to_be_bytes());
    output[4..].copy_from_slice(&block[1].to_be_bytes());
}

/// Single DES with an 8-byte key.
pub struct Des {
    encrypt: Schedule,
    decrypt: Schedule,
}

impl BlockCipher for Des {
    fn with_key(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_SIZE {
            return Err(CipherError::InvalidKeyLength { len: key.len() });
        }
        Ok(Self {
            encrypt: key_schedule(key, Direction::Encrypt),
            decrypt: key_schedule(key, Direction::Decrypt),
        })
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError> {
        check_block(input, output);
        let mut block = load(input);
        des_rounds(&mut block, &self.encrypt);
        store(block, output);
        Ok(())
    }

    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError> {
        check_block(input, output);
        let mut block = load(input);
        des_rounds(&mut block, &self.decrypt);
        store(block, output);
        Ok(())
    }
}

impl Drop for Des {
    fn drop(&mut self) {
        secure_zero(&mut self.encrypt);
        secure_zero(&mut self.decrypt);
    }
}

impl core::fmt::Debug for Des {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Des").finish_non_exhaustive()
    }
}

/// Triple-DES in encrypt-decrypt-encrypt form.
///
/// A 24-byte key supplies three independent subkeys; a 16-byte key reuses
/// the first subkey as the third.
pub struct TripleDes {
    encrypt: [Schedule; 3],
    decrypt: [Schedule; 3],
}

impl BlockCipher for TripleDes {
    fn with_key(key: &[u8]) -> Result<Self, CipherError> {
        let (k1, k2, k3) = match key.len() {
            16 => (&key[..8], &key[8..16], &key[..8]),
            24 => (&key[..8], &key[8..16], &key[16..]),
            len => return Err(CipherError::InvalidKeyLength { len }),
        };

        Ok(Self {
            encrypt: [
                key_schedule(k1, Direction::Encrypt),
                key_schedule(k2, Direction::Decrypt),
                key_schedule(k3, Direction::Encrypt),
            ],
            decrypt: [
                key_schedule(k3, Direction::Decrypt),
                key_schedule(k2, Direction::Encrypt),
                key_schedule(k1, Direction::Decrypt),
            ],
        })
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError> {
        check_block(input, output);
        let mut block = load(input);
        for schedule in &self.encrypt {
            des_rounds(&mut block, schedule);
        }
        store(block, output);
        Ok(())
    }

    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError> {
        check_block(input, output);
        let mut block = load(input);
        for schedule in &self.decrypt {
            des_rounds(&mut block, schedule);
        }
        store(block, output);
        Ok(())
    }
}

impl Drop for TripleDes {
    fn drop(&mut self) {
        for schedule in self.encrypt.iter_mut().chain(self.decrypt.iter_mut()) {
            secure_zero(schedule);
        }
    }
}

impl core::fmt::Debug for TripleDes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TripleDes").finish_non_exhaustive()
    }
}
