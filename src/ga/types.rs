//! Chromosome and population member types.
//!
//! A [`Chromosome`] is the raw bit-vector encoding; an [`Individual`] is a
//! chromosome together with the derived fields computed by the
//! [`Evaluator`](super::Evaluator). Individuals are only ever built by the
//! evaluator, so the derived fields always match the bits.

use crate::error::KnapsackError;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Anything selection and elitism can rank.
///
/// Higher fitness is better (maximization).
pub trait Scored {
    /// Fitness used for ranking.
    fn fitness(&self) -> f64;
}

/// Fixed-length bit vector, one bit per item position. `true` = included.
///
/// # Examples
///
/// ```
/// use knapsack_ga::ga::Chromosome;
///
/// let c: Chromosome = "1010".parse().unwrap();
/// assert_eq!(c.count_ones(), 2);
/// assert_eq!(c.to_string(), "1010");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct Chromosome {
    bits: Vec<bool>,
}

impl Chromosome {
    /// Wraps an explicit bit vector.
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// All-zero chromosome (empty knapsack).
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Samples each bit independently as Bernoulli(`density`).
    ///
    /// # Panics
    /// Panics if `density` is outside `[0, 1]`.
    pub fn random<R: Rng>(len: usize, density: f64, rng: &mut R) -> Self {
        Self {
            bits: (0..len).map(|_| rng.random_bool(density)).collect(),
        }
    }

    /// Chromosome length.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the chromosome has zero length.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bits.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Bit at `pos`.
    pub fn get(&self, pos: usize) -> bool {
        self.bits[pos]
    }

    /// Sets the bit at `pos`.
    pub fn set(&mut self, pos: usize, included: bool) {
        self.bits[pos] = included;
    }

    /// Flips the bit at `pos`.
    pub fn flip(&mut self, pos: usize) {
        self.bits[pos] = !self.bits[pos];
    }

    /// Number of included items.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Positions of included items, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| i)
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Chromosome {
    type Err = KnapsackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '1' => Ok(true),
                '0' => Ok(false),
                other => Err(KnapsackError::data(format!(
                    "invalid chromosome character {other:?}"
                ))),
            })
            .collect::<Result<Vec<bool>, _>>()
            .map(Chromosome::new)
    }
}

impl From<Chromosome> for String {
    fn from(c: Chromosome) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Chromosome {
    type Error = KnapsackError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A population member: chromosome plus its evaluated fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// The (possibly repaired) chromosome.
    pub chromosome: Chromosome,
    /// Fitness under the run's constraint handling.
    pub fitness: f64,
    /// Sum of included weights.
    pub weight: f64,
    /// Sum of included values.
    pub value: f64,
    /// `weight <= capacity`.
    pub feasible: bool,
}

impl Scored for Individual {
    fn fitness(&self) -> f64 {
        self.fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_parse_and_display() {
        let c: Chromosome = "0110".parse().unwrap();
        assert_eq!(c.bits(), &[false, true, true, false]);
        assert_eq!(c.to_string(), "0110");
        assert_eq!(c.ones().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_parse_rejects_other_chars() {
        assert!("01x1".parse::<Chromosome>().is_err());
    }

    #[test]
    fn test_flip_and_set() {
        let mut c = Chromosome::zeros(3);
        c.flip(1);
        c.set(2, true);
        assert_eq!(c.to_string(), "011");
        c.flip(1);
        assert_eq!(c.count_ones(), 1);
    }

    #[test]
    fn test_random_density_extremes() {
        let mut rng = create_rng(42);
        assert_eq!(Chromosome::random(50, 0.0, &mut rng).count_ones(), 0);
        assert_eq!(Chromosome::random(50, 1.0, &mut rng).count_ones(), 50);
    }

    #[test]
    fn test_random_half_density_is_balanced() {
        let mut rng = create_rng(7);
        let c = Chromosome::random(10_000, 0.5, &mut rng);
        let ones = c.count_ones();
        assert!((4_500..5_500).contains(&ones), "got {ones} ones");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_bit_string() {
        let c: Chromosome = "101".parse().unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"101\"");
        let back: Chromosome = serde_json::from_str("\"101\"").unwrap();
        assert_eq!(back, c);
    }
}
