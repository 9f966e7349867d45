//! Randomness for DH exponents, proof nonces and signature nonces.

use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;
use rand_core::{CryptoRng, RngCore};

enum Source {
    Os(OsRng),
    Seeded(Box<StdRng>),
}

/// Cryptographically secure random number generator.
///
/// Sessions draw from the operating system. A seeded generator reproduces an
/// exchange byte for byte, which is what benchmarks and regression fixtures
/// need; never seed a generator used against a real peer.
pub struct SecureRng(Source);

impl SecureRng {
    /// Operating-system randomness.
    pub fn new() -> Self {
        Self(Source::Os(OsRng))
    }

    /// Deterministic ChaCha stream derived from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self(Source::Seeded(Box::new(StdRng::seed_from_u64(seed))))
    }

    /// Whether this generator replays a fixed seed.
    pub fn is_deterministic(&self) -> bool {
        matches!(self.0, Source::Seeded(_))
    }
}

impl Default for SecureRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for SecureRng {
    fn next_u32(&mut self) -> u32 {
        match &mut self.0 {
            Source::Os(rng) => rng.next_u32(),
            Source::Seeded(rng) => rng.next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        match &mut self.0 {
            Source::Os(rng) => rng.next_u64(),
            Source::Seeded(rng) => rng.next_u64(),
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        match &mut self.0 {
            Source::Os(rng) => rng.fill_bytes(dest),
            Source::Seeded(rng) => rng.fill_bytes(dest),
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        match &mut self.0 {
            Source::Os(rng) => rng.try_fill_bytes(dest),
            Source::Seeded(rng) => rng.try_fill_bytes(dest),
        }
    }
}

impl CryptoRng for SecureRng {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_source_fills_distinct_buffers() {
        let mut rng = SecureRng::new();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        rng.fill_bytes(&mut a);
        rng.fill_bytes(&mut b);
        assert_ne!(a, b);
        assert!(!rng.is_deterministic());
    }

    #[test]
    fn seeded_source_replays() {
        let mut a = SecureRng::seeded(7);
        let mut b = SecureRng::seeded(7);
        let mut c = SecureRng::seeded(8);
        let (x, y, z) = (a.next_u64(), b.next_u64(), c.next_u64());
        assert_eq!(x, y);
        assert_ne!(x, z);
        assert!(a.is_deterministic());
    }
}
