//! RNG streams for the sampling workers.
//!
//! [`RngKey`] is a functional-style key (as in JAX) that is split into one
//! independent key per worker. Each worker then draws from its own
//! [`Rand48`], a 48-bit linear congruential stream with `erand48` semantics
//! whose state is exposed as a re-seedable triple of 16-bit words.

use rand::{Error, Rng, RngCore, SeedableRng};
use rand_chacha::rand_core::impls;
use rand_chacha::ChaCha8Rng;

/// An RNG key for deterministic random number generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RngKey(pub u64);

impl RngKey {
    /// Create a new RNG key from a seed.
    pub fn new(seed: u64) -> Self {
        RngKey(seed)
    }

    /// A key seeded from the thread-local generator.
    pub fn random() -> Self {
        RngKey(rand::thread_rng().gen())
    }

    /// Split this key into multiple independent keys.
    pub fn split(self, n: usize) -> Vec<RngKey> {
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![self];
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.0);
        (0..n).map(|_| RngKey(rng.next_u64())).collect()
    }

    /// Get the seed value.
    pub fn seed(&self) -> u64 {
        self.0
    }
}

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const INCREMENT: u64 = 0xB;
const STATE_MASK: u64 = (1 << 48) - 1;
const STATE_SCALE: f64 = (1u64 << 48) as f64;

/// 48-bit linear congruential generator, `x' = (a·x + c) mod 2^48`.
///
/// [`Rand48::next_f64`] matches `erand48`: the new state divided by `2^48`,
/// uniform on `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rand48 {
    state: u64,
}

impl Rand48 {
    /// Seed from a `[low, mid, high]` triple of 16-bit words.
    pub fn from_triple(seed: [u16; 3]) -> Self {
        let mut rng = Rand48 { state: 0 };
        rng.reseed(seed);
        rng
    }

    /// Seed from the low 48 bits of a key.
    pub fn from_key(key: RngKey) -> Self {
        Rand48 {
            state: key.seed() & STATE_MASK,
        }
    }

    pub fn reseed(&mut self, seed: [u16; 3]) {
        self.state = u64::from(seed[0]) | u64::from(seed[1]) << 16 | u64::from(seed[2]) << 32;
    }

    /// Current state as a `[low, mid, high]` triple.
    pub fn triple(&self) -> [u16; 3] {
        [
            self.state as u16,
            (self.state >> 16) as u16,
            (self.state >> 32) as u16,
        ]
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.state = MULTIPLIER
            .wrapping_mul(self.state)
            .wrapping_add(INCREMENT)
            & STATE_MASK;
        self.state
    }

    /// Uniform draw on `[0, 1)` with 48 bits of resolution.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.step() as f64 / STATE_SCALE
    }
}

impl RngCore for Rand48 {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 16) as u32
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Rand48 {
    type Seed = [u8; 6];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut bytes = [0u8; 8];
        bytes[..6].copy_from_slice(&seed);
        Rand48 {
            state: u64::from_le_bytes(bytes),
        }
    }
}
