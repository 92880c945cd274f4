use serde::{Deserialize, Serialize};

/// Constants for a linear congruential generator: `state = (a * state + c) mod m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcgParams {
    pub multiplier: u64,
    pub increment: u64,
    pub modulus: u64,
}

impl LcgParams {
    /// The small-modulus generator traditionally used for decorative jitter.
    /// Period is short, which is fine for phase seeding.
    pub const CLASSIC: Self = Self {
        multiplier: 9301,
        increment: 49297,
        modulus: 233_280,
    };
}

impl Default for LcgParams {
    fn default() -> Self {
        Self::CLASSIC
    }
}

/// Deterministic phase generator shared by every instanced field.
///
/// The same seed always yields the same sequence; nothing reads the wall
/// clock, so field construction is reproducible in tests.
#[derive(Debug, Clone)]
pub struct Lcg {
    params: LcgParams,
    seed: u64,
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self::with_params(seed, LcgParams::CLASSIC)
    }

    /// # Panics
    /// If `params.modulus` is zero.
    pub fn with_params(seed: u64, params: LcgParams) -> Self {
        assert!(params.modulus > 0, "LCG modulus must be positive");
        let state = seed % params.modulus;
        Self {
            params,
            seed,
            state,
        }
    }

    /// Seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewind to the start of the sequence.
    pub fn reset(&mut self) {
        self.state = self.seed % self.params.modulus;
    }

    pub fn next_u64(&mut self) -> u64 {
        let p = self.params;
        self.state = (p.multiplier.wrapping_mul(self.state).wrapping_add(p.increment)) % p.modulus;
        self.state
    }

    /// Next value in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() as f64 / self.params.modulus as f64;
        (v as f32).min(1.0 - f32::EPSILON)
    }

    /// Next value in `[lo, hi)`.
    pub fn next_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Lcg::new(1);
        let mut b = Lcg::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn values_in_unit_interval() {
        let mut rng = Lcg::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn reset_replays_sequence() {
        let mut rng = Lcg::new(99);
        let first: Vec<u64> = (0..16).map(|_| rng.next_u64()).collect();
        rng.reset();
        let again: Vec<u64> = (0..16).map(|_| rng.next_u64()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn classic_constants_known_value() {
        // (9301 * 1 + 49297) % 233280
        let mut rng = Lcg::new(1);
        assert_eq!(rng.next_u64(), 58_598);
    }

    #[test]
    fn custom_params() {
        let params = LcgParams {
            multiplier: 1_103_515_245,
            increment: 12_345,
            modulus: 1 << 31,
        };
        let mut rng = Lcg::with_params(5, params);
        let v = rng.next_range(-1.0, 1.0);
        assert!((-1.0..1.0).contains(&v));
    }
}
