//! Seeded random streams for draws and identifier generation.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;

use crate::constants::{RNG_DOMAIN_DRAW, RNG_DOMAIN_IDS};

/// Stream used by the weighted sampler.
pub type DrawRng = CountingRng<SmallRng>;
/// Stream used to mint inventory identifiers.
pub type IdRng = CountingRng<ChaCha8Rng>;

/// The purposes a user seed is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Draw,
    Ids,
}

impl Stream {
    const fn domain(self) -> &'static [u8] {
        match self {
            Self::Draw => RNG_DOMAIN_DRAW,
            Self::Ids => RNG_DOMAIN_IDS,
        }
    }

    /// Seed for this stream: HMAC-SHA256 keyed by the domain tag over the
    /// little-endian user seed, first eight digest bytes read little-endian.
    fn seed(self, user_seed: u64) -> u64 {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.domain())
            .expect("hmac accepts keys of any length");
        mac.update(&user_seed.to_le_bytes());
        mac.finalize()
            .into_bytes()
            .iter()
            .take(8)
            .rev()
            .fold(0_u64, |word, byte| (word << 8) | u64::from(*byte))
    }
}

/// Independent draw and id streams derived from one user-visible seed.
///
/// Minting an identifier never shifts which item the next draw selects.
#[derive(Debug, Clone)]
pub struct RngBundle {
    draw: DrawRng,
    ids: IdRng,
}

impl RngBundle {
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            draw: CountingRng::seeded(Stream::Draw.seed(seed)),
            ids: CountingRng::seeded(Stream::Ids.seed(seed)),
        }
    }

    pub fn draw_mut(&mut self) -> &mut DrawRng {
        &mut self.draw
    }

    pub fn ids_mut(&mut self) -> &mut IdRng {
        &mut self.ids
    }

    /// Split into the draw stream and the id stream.
    #[must_use]
    pub fn into_streams(self) -> (DrawRng, IdRng) {
        (self.draw, self.ids)
    }
}

/// RNG wrapper that counts how many times the stream was pulled.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    inner: R,
    pulls: u64,
}

impl<R: SeedableRng> CountingRng<R> {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: R::seed_from_u64(seed),
            pulls: 0,
        }
    }
}

impl<R> CountingRng<R> {
    /// Calls made against this stream so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.pulls
    }

    fn pull(&mut self) -> &mut R {
        self.pulls = self.pulls.saturating_add(1);
        &mut self.inner
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.pull().next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.pull().next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.pull().fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.pull().try_fill_bytes(dest)
    }
}
