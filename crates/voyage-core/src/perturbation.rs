//! Perturbation sources: bounded randomness injected into phase updates.
//!
//! Phase update rules are pure functions of the current state and one
//! perturbation sample -- all randomness enters through an injected
//! [`PerturbationSource`], never through a hidden global generator. This
//! is what makes phase outcomes reproducible: swap the production source
//! for a seeded or scripted one and the same phase list produces the same
//! observation sequence.
//!
//! # Sources
//!
//! - [`SeededSource`] -- `xorshift64` stream seeded from a `u64`; the
//!   default for reproducible runs.
//! - [`SequenceSource`] -- scripted sample list for tests; echoes its
//!   values verbatim regardless of the requested kind.
//! - [`ThreadRngSource`] -- thread-local entropy via `rand`, for runs
//!   where reproducibility does not matter.

use rand::Rng;

/// What a phase asks the source for on each tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PerturbationKind {
    /// The phase is fully deterministic; the sample is ignored.
    None,
    /// A uniformly distributed value in `[low, high]`.
    Uniform {
        /// Inclusive lower bound.
        low: f64,
        /// Inclusive upper bound.
        high: f64,
    },
    /// A categorical pick over weighted options; the sample is the chosen
    /// index as a float. Used by phases that branch on random events
    /// rather than physical noise.
    Choice {
        /// Relative weight per option. Non-positive weights are never
        /// selected.
        weights: Vec<f64>,
    },
}

/// A source of per-tick perturbation samples.
///
/// Implementations must be deterministic functions of their own internal
/// state: given the same construction and the same sequence of calls,
/// they produce the same samples. The production [`ThreadRngSource`] is
/// the one deliberate exception.
pub trait PerturbationSource {
    /// Draw one sample of the requested kind.
    ///
    /// For [`PerturbationKind::Uniform`] the result lies in `[low, high]`;
    /// for [`PerturbationKind::Choice`] it is the selected option index as
    /// a float; for [`PerturbationKind::None`] it is `0.0`.
    fn sample(&mut self, kind: &PerturbationKind) -> f64;
}

/// Select an index from cumulative weights given a roll in `[0, total)`.
///
/// Returns the last positively-weighted index as a fallback if the roll
/// somehow exceeds the accumulated total.
fn select_weighted(weights: &[f64], roll: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (index, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        last_positive = index;
        cumulative += weight;
        if roll < cumulative {
            return index;
        }
    }
    last_positive
}

/// Sum of the positive weights.
fn total_weight(weights: &[f64]) -> f64 {
    weights.iter().filter(|w| **w > 0.0).sum()
}

// Option indices are small; the u64 -> f64 conversions below are exact
// for every value this module produces (<= 53 bits).
#[allow(clippy::cast_precision_loss)]
const fn index_to_f64(index: usize) -> f64 {
    index as f64
}

// ---------------------------------------------------------------------------
// SeededSource
// ---------------------------------------------------------------------------

/// Deterministic perturbation stream using `xorshift64`.
///
/// The same seed always yields the same sample sequence, enabling
/// reproducible simulation runs and event replay. The seed is mixed with
/// a well-known constant so that small seeds do not produce trivially
/// correlated streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededSource {
    /// Current generator state (never zero).
    state: u64,
}

impl SeededSource {
    /// Create a seeded source. A zero seed is remapped to a fixed
    /// non-zero constant (`xorshift` requires non-zero state).
    pub const fn new(seed: u64) -> Self {
        // The constant 0x517cc1b727220a95 is a well-known mixing constant.
        let mut state = seed.wrapping_mul(0x517c_c1b7_2722_0a95);
        if state == 0 {
            state = 0xdead_beef_cafe_babe;
        }
        Self { state }
    }

    /// Advance the generator and return the next raw value.
    const fn next_u64(&mut self) -> u64 {
        // xorshift64 algorithm
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// The next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64 {
        // Keep the top 53 bits so the u64 -> f64 conversion is exact.
        #[allow(clippy::cast_precision_loss)]
        let mantissa = (self.next_u64() >> 11) as f64;
        #[allow(clippy::cast_precision_loss)]
        let scale = (1_u64 << 53) as f64;
        mantissa / scale
    }
}

impl PerturbationSource for SeededSource {
    fn sample(&mut self, kind: &PerturbationKind) -> f64 {
        match kind {
            PerturbationKind::None => 0.0,
            PerturbationKind::Uniform { low, high } => {
                if *high <= *low {
                    // Degenerate range: the only value it contains.
                    return *low;
                }
                low + (high - low) * self.next_unit()
            }
            PerturbationKind::Choice { weights } => {
                let total = total_weight(weights);
                if total <= 0.0 {
                    return 0.0;
                }
                let roll = self.next_unit() * total;
                index_to_f64(select_weighted(weights, roll))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SequenceSource
// ---------------------------------------------------------------------------

/// A scripted perturbation source for tests.
///
/// Returns its sample list in order, verbatim and regardless of the
/// requested kind, then repeats the final value once exhausted. This lets
/// a test state "fixed perturbation 0" or "gain 2.5 per tick" literally.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSource {
    /// Scripted samples, replayed in order.
    samples: Vec<f64>,
    /// Index of the next sample to return.
    cursor: usize,
}

impl SequenceSource {
    /// Create a source that replays the given samples.
    ///
    /// An empty list behaves like `constant(0.0)`.
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples, cursor: 0 }
    }

    /// Create a source that returns the same value on every draw.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl PerturbationSource for SequenceSource {
    fn sample(&mut self, _kind: &PerturbationKind) -> f64 {
        let Some(&value) = self
            .samples
            .get(self.cursor)
            .or_else(|| self.samples.last())
        else {
            return 0.0;
        };
        self.cursor = self.cursor.saturating_add(1);
        value
    }
}

// ---------------------------------------------------------------------------
// ThreadRngSource
// ---------------------------------------------------------------------------

/// Production perturbation source backed by thread-local entropy.
///
/// Runs using this source are not reproducible; prefer [`SeededSource`]
/// wherever replay matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl ThreadRngSource {
    /// Create a new entropy-backed source.
    pub const fn new() -> Self {
        Self
    }
}

impl PerturbationSource for ThreadRngSource {
    fn sample(&mut self, kind: &PerturbationKind) -> f64 {
        let mut rng = rand::rng();
        match kind {
            PerturbationKind::None => 0.0,
            PerturbationKind::Uniform { low, high } => {
                if *high <= *low {
                    return *low;
                }
                rng.random_range(*low..=*high)
            }
            PerturbationKind::Choice { weights } => {
                let total = total_weight(weights);
                if total <= 0.0 {
                    return 0.0;
                }
                let roll = rng.random_range(0.0..total);
                index_to_f64(select_weighted(weights, roll))
            }
        }
    }
}
