//! String-seeded pseudo-random generator.
//!
//! Schedules and palette shuffles are reproducible from a seed string
//! alone and match those produced by other clients of the same game. The
//! generator is a fixed 32-bit linear-congruential generator:
//!
//! - seed hash: `h = h * 31 + unit` over the UTF-16 code units, mod 2³²
//! - step: `h = h * 1664525 + 1013904223`, mod 2³²
//! - output: `h / 0xFFFF_FFFF`, a float in `[0, 1]`
//!
//! ```
//! use officesim_logic::rng::SeedRng;
//!
//! let mut a = SeedRng::from_seed("acme-2024-01-01-3");
//! let mut b = SeedRng::from_seed("acme-2024-01-01-3");
//! assert_eq!(a.next_f64(), b.next_f64());
//! ```

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;

/// Hash a string into a 32-bit generator state.
pub fn hash_seed(seed: &str) -> u32 {
    seed.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as u32))
}

/// Linear-congruential generator seeded from a string hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRng {
    state: u32,
}

impl SeedRng {
    pub fn from_seed(seed: &str) -> Self {
        Self {
            state: hash_seed(seed),
        }
    }

    /// Current internal state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance and return a float in `[0, 1]`. Both ends are reachable.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state as f64 / u32::MAX as f64
    }

    /// `floor(next * n)`, clamped into `0..n`.
    ///
    /// Always advances, even for `n == 0` (which yields 0), so call
    /// sequences stay aligned with other clients.
    pub fn below(&mut self, n: usize) -> usize {
        let pick = (self.next_f64() * n as f64).floor() as usize;
        pick.min(n.saturating_sub(1))
    }
}

/// Fisher–Yates shuffle walking from the back.
pub fn shuffle<T>(items: &mut [T], rng: &mut SeedRng) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}
