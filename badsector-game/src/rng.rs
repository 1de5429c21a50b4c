//! Seeded random streams segregated by simulation domain.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use sha2::Sha256;

/// Deterministic bundle of RNG streams segregated by simulation domain.
///
/// Each domain draws from its own stream so that, for example, an extra
/// combat roll never shifts the outcome of the next salvage.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    salvage: CountingRng<SmallRng>,
    combat: CountingRng<SmallRng>,
    escape: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            salvage: CountingRng::new(derive_stream_seed(seed, b"salvage")),
            combat: CountingRng::new(derive_stream_seed(seed, b"combat")),
            escape: CountingRng::new(derive_stream_seed(seed, b"escape")),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used by the encounter resolver and salvage rewards.
    pub fn salvage(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.salvage
    }

    /// Stream used for damage rolls.
    pub fn combat(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.combat
    }

    /// Stream used for the low-stamina escape coin flip.
    pub fn escape(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.escape
    }

    /// Total draws across all streams.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.salvage
            .draws()
            .saturating_add(self.combat.draws())
            .saturating_add(self.escape.draws())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
