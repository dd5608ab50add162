use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

/// Session-scoped randomness source. Production sessions draw from OS
/// entropy; tests inject a seeded generator to make shuffles reproducible.
/// One generator per session keeps advancing across reloads, so no two
/// reshuffles of a deck ever reuse a seed.
pub struct GameRng {
    inner: Box<dyn RngCore + Send>,
}

impl GameRng {
    pub fn new() -> Self {
        Self {
            inner: Box::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Box::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform random permutation in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut *self.inner);
    }

    /// Uniform pick of an index into a non-empty slice.
    pub fn pick_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "cannot pick from an empty collection");
        (&mut *self.inner).random_range(0..len)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new()
    }
}
