//! HMAC_DRBG (NIST SP 800-90A, section 10.1.2) over HMAC-SHA-256.

use crate::ct::secure_zero;
use crate::digest::Sha256;
use crate::hmac::HmacContext;

const OUTLEN: usize = Sha256::OUTPUT_SIZE;

/// Largest single request the construction permits (2^19 bits).
pub const MAX_REQUEST_BYTES: usize = 1 << 16;

/// Deterministic generator state: key, chaining value and request counter.
///
/// The caller owns entropy collection and decides when to reseed; see
/// [`HmacDrbg::reseed_counter`].
pub struct HmacDrbg {
    key: [u8; OUTLEN],
    value: [u8; OUTLEN],
    reseed_counter: u64,
}

impl HmacDrbg {
    /// Seed a fresh generator from `entropy || nonce || personalization`.
    #[must_use]
    pub fn instantiate(entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> Self {
        let mut drbg = Self {
            key: [0x00; OUTLEN],
            value: [0x01; OUTLEN],
            reseed_counter: 1,
        };
        drbg.update(&[entropy, nonce, personalization]);
        drbg
    }

    /// Mix fresh `entropy` (and optional `additional` input) into the state.
    pub fn reseed(&mut self, entropy: &[u8], additional: &[u8]) {
        self.update(&[entropy, additional]);
        self.reseed_counter = 1;
    }

    /// Number of generate calls since the last (re)seed, starting at 1.
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    /// Fill `out` and advance the state.
    ///
    /// # Panics
    ///
    /// Panics if `out` exceeds [`MAX_REQUEST_BYTES`].
    pub fn generate(&mut self, out: &mut [u8], additional: &[u8]) {
        assert!(
            out.len() <= MAX_REQUEST_BYTES,
            "DRBG request of {} bytes exceeds {MAX_REQUEST_BYTES}",
            out.len()
        );

        if !additional.is_empty() {
            self.update(&[additional]);
        }

        for chunk in out.chunks_mut(OUTLEN) {
            self.advance_value();
            chunk.copy_from_slice(&self.value[..chunk.len()]);
        }

        self.update(&[additional]);
        self.reseed_counter += 1;
    }

    fn advance_value(&mut self) {
        let mut mac = HmacContext::init(&Sha256, &self.key);
        mac.update(&self.value);
        mac.finalize_into(&mut self.value);
    }

    fn update(&mut self, provided: &[&[u8]]) {
        let has_input = provided.iter().any(|part| !part.is_empty());
        for separator in [0x00u8, 0x01] {
            if separator == 0x01 && !has_input {
                break;
            }
            let mut mac = HmacContext::init(&Sha256, &self.key);
            mac.update(&self.value);
            mac.update(&[separator]);
            for part in provided {
                mac.update(part);
            }
            mac.finalize_into(&mut self.key);
            self.advance_value();
        }
    }
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        secure_zero(&mut self.key);
        secure_zero(&mut self.value);
    }
}

impl core::fmt::Debug for HmacDrbg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HmacDrbg")
            .field("reseed_counter", &self.reseed_counter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmac::hmac_into;

    fn seeded() -> HmacDrbg {
        HmacDrbg::instantiate(&[0x11; 32], &[0x22; 16], b"unit test")
    }

    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("hex"))
            .collect()
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn cavp_sha256_no_reseed_count_0() {
        let entropy = unhex("ca851911349384bffe89de1cbdc46e6831e44d34a4fb935ee285dd14b71a7488");
        let nonce = unhex("659ba96c601dc69fc902940805ec0ca8");
        let mut drbg = HmacDrbg::instantiate(&entropy, &nonce, &[]);

        let mut out = [0u8; 128];
        drbg.generate(&mut out, &[]);
        drbg.generate(&mut out, &[]);
        let expected = concat!(
            "e528e9abf2dece54d47c7e75e5fe302149f817ea9fb4bee6f4199697d04d5b89",
            "d54fbb978a15b5c443c9ec21036d2460b6f73ebad0dc2aba6e624abf07745bc1",
            "07694bb7547bb0995f70de25d6b29e2d3011bb19d27676c07162c8b5ccde0668",
            "961df86803482cb37ed6d5c0bb8d50cf1f50d476aa0458bdaba806f48be9dcb8",
        );
        assert_eq!(hex(&out), expected);
    }

    #[test]
    fn known_answer_with_personalization() {
        let mut drbg = seeded();
        let mut out = [0u8; 100];
        drbg.generate(&mut out, &[]);
        let expected = concat!(
            "d647db636ea64fbad7494aec6c400870ab99199edc26ed24c4ea3c10e175c1f1",
            "6c5cd93194eaf886dc702ad5ad26ff583b00d5ebd9165e93a8cb46f625e874c2",
            "fb782940ca6ccd7a6ee403b197f3aa08b734dfae173d46de08dde5b866400ac4",
            "8cda3d27",
        );
        assert_eq!(hex(&out), expected);

        let mut next = [0u8; 32];
        drbg.generate(&mut next, &[]);
        assert_eq!(
            hex(&next),
            "0e74256cc8d15bf7ec61795a90cb04abd5c5222488dce5f65681eb67865e8f8b"
        );
    }

    #[test]
    fn same_seed_same_stream() {
        let (mut a, mut b) = (seeded(), seeded());
        let (mut x, mut y) = ([0u8; 100], [0u8; 100]);
        a.generate(&mut x, &[]);
        b.generate(&mut y, &[]);
        assert_eq!(x, y);

        a.generate(&mut x, &[]);
        assert_ne!(x, y, "state advances between requests");
    }

    #[test]
    fn personalization_separates_streams() {
        let mut a = HmacDrbg::instantiate(&[0x11; 32], &[0x22; 16], b"one");
        let mut b = HmacDrbg::instantiate(&[0x11; 32], &[0x22; 16], b"two");
        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.generate(&mut x, &[]);
        b.generate(&mut y, &[]);
        assert_ne!(x, y);
    }

    #[test]
    fn first_block_is_hmac_of_value() {
        let mut drbg = seeded();
        let (key, value) = (drbg.key, drbg.value);
        let mut expected = [0u8; 32];
        hmac_into(&Sha256, &key, &value, &mut expected);

        let mut out = [0u8; 32];
        drbg.generate(&mut out, &[]);
        assert_eq!(out, expected);
    }

    #[test]
    fn shorter_request_is_prefix_of_longer() {
        let (mut a, mut b) = (seeded(), seeded());
        let mut long = [0u8; 80];
        let mut short = [0u8; 45];
        a.generate(&mut long, &[]);
        b.generate(&mut short, &[]);
        assert_eq!(&long[..45], &short[..]);
    }

    #[test]
    fn additional_input_changes_output() {
        let (mut a, mut b) = (seeded(), seeded());
        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.generate(&mut x, b"extra");
        b.generate(&mut y, &[]);
        assert_ne!(x, y);
    }

    #[test]
    fn reseed_resets_counter_and_diverges() {
        let (mut a, mut b) = (seeded(), seeded());
        let mut sink = [0u8; 16];
        a.generate(&mut sink, &[]);
        a.generate(&mut sink, &[]);
        assert_eq!(a.reseed_counter(), 3);

        b.generate(&mut sink, &[]);
        b.generate(&mut sink, &[]);
        a.reseed(&[0x33; 32], &[]);
        assert_eq!(a.reseed_counter(), 1);

        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.generate(&mut x, &[]);
        b.generate(&mut y, &[]);
        assert_ne!(x, y);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn oversized_request_panics() {
        let mut drbg = seeded();
        let mut out = vec![0u8; MAX_REQUEST_BYTES + 1];
        drbg.generate(&mut out, &[]);
    }
}
