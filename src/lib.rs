//! Cryptocore - streaming digests, HMAC, CBC chaining and a CSPRNG facade
//!
//! This library provides a small cryptographic core built around pluggable
//! algorithm descriptors. Callers pick a descriptor, create a context sized
//! for it, stream data through it and write the result into their own buffer.
//!
//! # Quick Start
//!
//! ```rust
//! use cryptocore::{DigestContext, HmacContext, Sha256};
//!
//! // Streaming digest
//! let mut ctx = DigestContext::init(&Sha256);
//! ctx.update(b"hello ");
//! ctx.update(b"world");
//! let mut digest = [0u8; 32];
//! ctx.finalize_into(&mut digest);
//! assert_eq!(digest, Sha256::digest(b"hello world"));
//!
//! // Message authentication
//! let mut mac = HmacContext::init(&Sha256, b"key");
//! mac.update(b"message");
//! let mut tag = [0u8; 32];
//! mac.finalize_into(&mut tag);
//! ```
//!
//! # Features
//!
//! - **Merkle-Damgard engine** - any block-oriented compression function via
//!   [`DigestAlgorithm`], with bulk compression of aligned input
//! - **HMAC** - RFC 2104 over any descriptor whose output fits its block
//! - **CBC** - whole-block chaining over any [`BlockCipher`], DES and 3DES
//!   included
//! - **Random bytes** - HMAC-DRBG seeded from the operating system
//! - **Secret hygiene** - constant-time comparison and non-elidable zeroing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cipher;
pub mod ct;
pub mod digest;
pub mod error;
pub mod hmac;
pub mod rng;

pub use cipher::{BlockCipher, CbcContext, Des, TripleDes};
pub use ct::{constant_time_equal, secure_zero};
pub use digest::{ByteOrder, DigestAlgorithm, DigestContext, LengthField, Sha224, Sha256, digest_into};
pub use error::{CipherError, RngError};
pub use hmac::{HmacContext, hmac_into};
pub use rng::{EntropySource, OsEntropy, RngConfig, RngHandle, fill_random, process_rng};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
