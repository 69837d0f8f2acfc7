//! Random streams for the Monte Carlo estimator and the recommendation search.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    /// Stream seeded from a fixed value.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::wrap(SmallRng::seed_from_u64(seed))
    }

    /// Stream seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::wrap(SmallRng::from_entropy())
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    pub const fn wrap(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
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

/// Stream type used throughout the engine.
pub type SimRng = CountingRng<SmallRng>;

/// Independent streams for primary evaluation and recommendation search.
#[derive(Debug, Clone)]
pub struct RngStreams {
    simulation: SimRng,
    recommendation: SimRng,
}

impl RngStreams {
    /// Deterministic streams derived from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            simulation: SimRng::seeded(derive_stream_seed(seed, b"simulation")),
            recommendation: SimRng::seeded(derive_stream_seed(seed, b"recommendation")),
        }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            simulation: SimRng::from_entropy(),
            recommendation: SimRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is present, entropy-backed otherwise.
    #[must_use]
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_user_seed)
    }

    pub fn simulation(&mut self) -> &mut SimRng {
        &mut self.simulation
    }

    pub fn recommendation(&mut self) -> &mut SimRng {
        &mut self.recommendation
    }

    /// Total draws across both streams.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.simulation
            .draws()
            .saturating_add(self.recommendation.draws())
    }
}

/// Derive a per-domain seed from a user seed with HMAC-SHA256.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed ^ 0x9E37_79B9_7F4A_7C15;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
