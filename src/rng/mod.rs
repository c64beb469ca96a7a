//! Cryptographically secure random bytes.
//!
//! An [`RngHandle`] couples an [`HmacDrbg`] with the [`EntropySource`] that
//! seeds it. [`process_rng`] hands out one lazily opened, process-wide
//! handle fed by the operating system.

mod drbg;

pub use drbg::{HmacDrbg, MAX_REQUEST_BYTES};

use std::sync::{Mutex, OnceLock};

use tracing::{debug, instrument, trace};

use crate::error::RngError;

/// Fresh entropy drawn per (re)seed.
const SEED_ENTROPY_BYTES: usize = 32;
/// Extra bytes drawn as the instantiation nonce.
const SEED_NONCE_BYTES: usize = 16;
const PERSONALIZATION: &[u8] = b"cryptocore rng handle";

/// A provider of raw seed material.
pub trait EntropySource: Send {
    /// Fill as much of `buf` as possible and return the number of bytes
    /// written. `buf` is never longer than [`EntropySource::max_request`].
    ///
    /// # Errors
    ///
    /// Returns [`RngError::EntropyUnavailable`] when the source cannot be read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, RngError>;

    /// Largest buffer a single [`EntropySource::fill`] call accepts.
    fn max_request(&self) -> usize {
        256
    }
}

/// Entropy from the operating system via `getrandom`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl OsEntropy {
    /// A handle on the operating system's entropy pool.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for OsEntropy {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, RngError> {
        getrandom::getrandom(buf).map_err(|err| RngError::EntropyUnavailable {
            reason: err.to_string(),
        })?;
        Ok(buf.len())
    }
}

/// Tuning for an [`RngHandle`].
///
/// Limits are checked on every construction path, including
/// deserialization, so a handle never sees an unusable config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RngConfigFields"))]
pub struct RngConfig {
    reseed_interval: u64,
    max_request_bytes: usize,
}

impl RngConfig {
    /// Validated limits.
    ///
    /// # Panics
    ///
    /// Panics if either limit is zero or `max_request_bytes` exceeds
    /// [`MAX_REQUEST_BYTES`].
    #[must_use]
    pub fn new(reseed_interval: u64, max_request_bytes: usize) -> Self {
        match Self::try_new(reseed_interval, max_request_bytes) {
            Ok(config) => config,
            Err(err) => panic!("{err}"),
        }
    }

    /// Validated limits, reporting bad values instead of panicking.
    pub fn try_new(reseed_interval: u64, max_request_bytes: usize) -> Result<Self, RngError> {
        let config = Self {
            reseed_interval,
            max_request_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate calls allowed between reseeds.
    pub fn reseed_interval(&self) -> u64 {
        self.reseed_interval
    }

    /// Bytes produced per DRBG request; larger fills are chunked.
    pub fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    fn validate(&self) -> Result<(), RngError> {
        if self.reseed_interval == 0 {
            return Err(RngError::InvalidConfig {
                reason: "reseed interval must be non-zero".into(),
            });
        }
        if self.max_request_bytes == 0 || self.max_request_bytes > MAX_REQUEST_BYTES {
            return Err(RngError::InvalidConfig {
                reason: format!(
                    "max request must be in 1..={MAX_REQUEST_BYTES}, got {}",
                    self.max_request_bytes
                ),
            });
        }
        Ok(())
    }
}

impl Default for RngConfig {
    fn default() -> Self {
        Self::new(1 << 20, 4096)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RngConfigFields {
    reseed_interval: u64,
    max_request_bytes: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RngConfigFields> for RngConfig {
    type Error = RngError;

    fn try_from(fields: RngConfigFields) -> Result<Self, Self::Error> {
        Self::try_new(fields.reseed_interval, fields.max_request_bytes)
    }
}

struct Inner {
    drbg: HmacDrbg,
    source: Box<dyn EntropySource>,
}

/// A thread-safe generator: a DRBG and its entropy source behind a mutex.
pub struct RngHandle {
    inner: Mutex<Inner>,
    config: RngConfig,
}

impl RngHandle {
    /// Draw seed material from `source` and instantiate the generator.
    ///
    /// # Errors
    ///
    /// Returns [`RngError::InvalidConfig`] for unusable limits, and
    /// propagates any failure or short read from `source`.
    pub fn open<S>(mut source: S, config: RngConfig) -> Result<Self, RngError>
    where
        S: EntropySource + 'static,
    {
        config.validate()?;

        let mut seed = [0u8; SEED_ENTROPY_BYTES + SEED_NONCE_BYTES];
        let drawn = draw_entropy(&mut source, &mut seed);
        let result = drawn.map(|()| {
            let (entropy, nonce) = seed.split_at(SEED_ENTROPY_BYTES);
            HmacDrbg::instantiate(entropy, nonce, PERSONALIZATION)
        });
        crate::ct::secure_zero(&mut seed);
        let drbg = result?;

        debug!(
            reseed_interval = config.reseed_interval,
            max_request_bytes = config.max_request_bytes,
            "random generator opened"
        );
        Ok(Self {
            inner: Mutex::new(Inner {
                drbg,
                source: Box::new(source),
            }),
            config,
        })
    }

    /// Limits this handle was opened with.
    pub fn config(&self) -> RngConfig {
        self.config
    }

    /// Fill all of `out` with random bytes.
    ///
    /// # Errors
    ///
    /// Fails if a needed reseed cannot draw entropy, or if the lock was
    /// poisoned by a panicking holder.
    #[instrument(level = "trace", skip(self, out), fields(len = out.len()))]
    pub fn generate(&self, out: &mut [u8]) -> Result<(), RngError> {
        let mut guard = self.inner.lock().map_err(|_| RngError::Poisoned)?;
        let Inner { drbg, source } = &mut *guard;

        for chunk in out.chunks_mut(self.config.max_request_bytes) {
            if drbg.reseed_counter() > self.config.reseed_interval {
                reseed(drbg, source.as_mut())?;
            }
            trace!(bytes = chunk.len(), "drbg request");
            drbg.generate(chunk, &[]);
        }
        Ok(())
    }
}

impl core::fmt::Debug for RngHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RngHandle")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn reseed<S>(drbg: &mut HmacDrbg, source: &mut S) -> Result<(), RngError>
where
    S: EntropySource + ?Sized,
{
    let mut entropy = [0u8; SEED_ENTROPY_BYTES];
    let drawn = draw_entropy(source, &mut entropy);
    if drawn.is_ok() {
        drbg.reseed(&entropy, &[]);
        debug!("random generator reseeded");
    }
    crate::ct::secure_zero(&mut entropy);
    drawn
}

/// Fill `buf` from `source`, honouring its per-call limit.
fn draw_entropy<S>(source: &mut S, buf: &mut [u8]) -> Result<(), RngError>
where
    S: EntropySource + ?Sized,
{
    let step = source.max_request().max(1);
    for chunk in buf.chunks_mut(step) {
        let got = source.fill(chunk)?;
        if got != chunk.len() {
            return Err(RngError::ShortEntropy {
                expected: chunk.len(),
                got,
            });
        }
    }
    Ok(())
}

static PROCESS_RNG: OnceLock<RngHandle> = OnceLock::new();
static PROCESS_RNG_INIT: Mutex<()> = Mutex::new(());

/// The process-wide generator, opened over [`OsEntropy`] on first use.
///
/// Concurrent first callers serialize; exactly one opens the source. A
/// failed open is reported and attempted again by the next call.
///
/// # Errors
///
/// Returns the entropy source's error if opening fails.
pub fn process_rng() -> Result<&'static RngHandle, RngError> {
    init_once(&PROCESS_RNG, &PROCESS_RNG_INIT, || {
        RngHandle::open(OsEntropy::new(), RngConfig::default())
    })
}

/// Fill `out` from the process-wide generator.
///
/// # Errors
///
/// As [`process_rng`] and [`RngHandle::generate`].
pub fn fill_random(out: &mut [u8]) -> Result<(), RngError> {
    process_rng()?.generate(out)
}

fn init_once<'a, F>(
    cell: &'a OnceLock<RngHandle>,
    lock: &Mutex<()>,
    open: F,
) -> Result<&'a RngHandle, RngError>
where
    F: FnOnce() -> Result<RngHandle, RngError>,
{
    if let Some(handle) = cell.get() {
        return Ok(handle);
    }

    let _guard = lock.lock().map_err(|_| RngError::Poisoned)?;
    if let Some(handle) = cell.get() {
        return Ok(handle);
    }

    let handle = open().inspect_err(|err| debug!(error = %err, "random generator open failed"))?;
    Ok(cell.get_or_init(|| handle))
}
