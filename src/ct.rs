//! Constant-time helpers for handling secret material.

use core::hint::black_box;
use core::sync::atomic::{Ordering, compiler_fence};

/// Compare two byte slices without branching on their contents.
///
/// Every byte pair is visited regardless of where the first difference
/// occurs. Slice lengths are treated as public: slices of different length
/// compare unequal immediately. Two empty slices are equal.
#[must_use]
pub fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= black_box(x ^ y);
    }
    black_box(diff) == 0
}

/// Overwrite `buf` with zeros in a way the optimizer cannot remove.
///
/// Works on any slice of plain integer words; each element is reset to
/// `T::default()`.
pub fn secure_zero<T: Copy + Default>(buf: &mut [T]) {
    for slot in buf.iter_mut() {
        // SAFETY: `slot` is a valid, aligned, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(slot, T::default()) };
    }
    compiler_fence(Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slices_are_equal() {
        assert!(constant_time_equal(&[], &[]));
    }

    #[test]
    fn length_mismatch_is_unequal() {
        assert!(!constant_time_equal(&[1, 2, 3], &[1, 2]));
        assert!(!constant_time_equal(&[], &[0]));
    }

    #[test]
    fn every_single_byte_difference_is_detected() {
        for value in 0..=255u8 {
            let a = [0x5au8, value, 0xa5];
            let b = [0x5au8, 0x7f, 0xa5];
            assert_eq!(constant_time_equal(&a, &b), value == 0x7f, "value {value:#04x}");
        }
    }

    #[test]
    fn large_buffers_differing_at_any_position() {
        let base: Vec<u8> = (0..16 * 1024).map(|i| (i * 31 % 251) as u8).collect();
        assert!(constant_time_equal(&base, &base.clone()));

        for pos in (0..base.len()).step_by(97).chain([0, base.len() - 1]) {
            let mut other = base.clone();
            other[pos] ^= 0x01;
            assert!(!constant_time_equal(&base, &other), "difference at {pos}");
        }
    }

    #[test]
    fn secure_zero_clears_every_length() {
        for len in 0..=4096usize {
            let mut buf: Vec<u8> = (0..len).map(|i| (i as u8) | 0x01).collect();
            secure_zero(&mut buf);
            assert!(buf.iter().all(|&b| b == 0), "length {len}");
        }
    }

    #[test]
    fn secure_zero_clears_words() {
        let mut words = [0xdead_beefu32; 32];
        secure_zero(&mut words);
        assert_eq!(words, [0u32; 32]);
    }
}
