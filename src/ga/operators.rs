//! Bit-string genetic operators.
//!
//! Crossover, mutation and elitism for [`Chromosome`]s. Every random
//! decision is drawn from the `rng` argument, so operators are reproducible
//! for a given generator state.
//!
//! # Crossover Operators
//!
//! - [`one_point_crossover`]: single cut in `[1, n-1]`, tails exchanged
//! - [`uniform_crossover`]: independent fair coin per position
//!
//! # Mutation Operators
//!
//! - [`bit_flip_mutation`]: flip each bit with probability `pm`
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - Bäck (1993), "Optimal Mutation Rates in Genetic Search" (the `1/n` rule)

use super::types::{Chromosome, Scored};
use crate::error::{KnapsackError, Result};
use rand::Rng;

// ============================================================================
// Strategy enums
// ============================================================================

/// Crossover strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Crossover {
    /// [`one_point_crossover`].
    #[default]
    OnePoint,
    /// [`uniform_crossover`].
    Uniform,
}

impl Crossover {
    /// With probability `pc` recombines the parents, otherwise clones them.
    ///
    /// One uniform draw decides; for one-point crossover on chromosomes
    /// shorter than 2 bits nothing is drawn and the parents are cloned.
    pub fn apply<R: Rng>(
        &self,
        parent1: &Chromosome,
        parent2: &Chromosome,
        pc: f64,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        match self {
            Crossover::OnePoint => {
                if parent1.len() < 2 || rng.random::<f64>() >= pc {
                    return (parent1.clone(), parent2.clone());
                }
                one_point_crossover(parent1, parent2, rng)
            }
            Crossover::Uniform => {
                if rng.random::<f64>() >= pc {
                    return (parent1.clone(), parent2.clone());
                }
                uniform_crossover(parent1, parent2, rng)
            }
        }
    }
}

/// Mutation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mutation {
    /// [`bit_flip_mutation`].
    #[default]
    BitFlip,
}

impl Mutation {
    /// Mutates `chromosome` in place with per-bit probability `pm`.
    /// Returns the number of flipped bits.
    pub fn apply<R: Rng>(&self, chromosome: &mut Chromosome, pm: f64, rng: &mut R) -> usize {
        match self {
            Mutation::BitFlip => bit_flip_mutation(chromosome, pm, rng),
        }
    }
}

/// Per-bit mutation probability, as configured.
///
/// Resolved once per run into a concrete probability with
/// [`resolve`](Self::resolve). Serialized as a bare number or `"1/n"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "MutationRateRepr", into = "MutationRateRepr")
)]
pub enum MutationRate {
    /// A literal probability in `[0, 1]`.
    Fixed(f64),

    /// `1 / chromosome length`.
    #[default]
    InverseLength,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum MutationRateRepr {
    Probability(f64),
    Rule(String),
}

#[cfg(feature = "serde")]
impl From<MutationRate> for MutationRateRepr {
    fn from(rate: MutationRate) -> Self {
        match rate {
            MutationRate::Fixed(p) => MutationRateRepr::Probability(p),
            MutationRate::InverseLength => MutationRateRepr::Rule("1/n".to_string()),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<MutationRateRepr> for MutationRate {
    type Error = KnapsackError;

    fn try_from(repr: MutationRateRepr) -> Result<Self> {
        match repr {
            MutationRateRepr::Probability(p) => Ok(MutationRate::Fixed(p)),
            MutationRateRepr::Rule(rule) if rule.trim() == "1/n" => Ok(MutationRate::InverseLength),
            MutationRateRepr::Rule(other) => Err(KnapsackError::config(
                "pm",
                format!("expected a number or \"1/n\", got {other:?}"),
            )),
        }
    }
}

impl MutationRate {
    /// The concrete probability for a chromosome of `len` bits.
    ///
    /// A zero length is treated as 1.
    pub fn resolve(&self, len: usize) -> f64 {
        match *self {
            MutationRate::Fixed(p) => p,
            MutationRate::InverseLength => 1.0 / len.max(1) as f64,
        }
    }

    /// Rejects fixed probabilities outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if let MutationRate::Fixed(p) = *self {
            if !(0.0..=1.0).contains(&p) {
                return Err(KnapsackError::config(
                    "pm",
                    format!("must be \"1/n\" or a probability in [0, 1], got {p}"),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Crossover operators
// ============================================================================

/// One-point crossover with a uniformly random cut in `[1, n-1]`.
///
/// # Panics
/// Panics if parents have different lengths or fewer than 2 bits.
pub fn one_point_crossover<R: Rng>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let n = parent1.len();
    assert!(n >= 2, "one-point crossover needs at least 2 bits");
    let cut = rng.random_range(1..n);
    one_point_crossover_at(parent1, parent2, cut)
}

/// One-point crossover at a fixed `cut`.
///
/// Child A = `parent1[..cut] + parent2[cut..]`, child B the complement.
///
/// # Panics
/// Panics if parents have different lengths or `cut > len`.
pub fn one_point_crossover_at(
    parent1: &Chromosome,
    parent2: &Chromosome,
    cut: usize,
) -> (Chromosome, Chromosome) {
    let (a, b) = (parent1.bits(), parent2.bits());
    assert_eq!(a.len(), b.len(), "parents must have equal length");

    let child1 = [&a[..cut], &b[cut..]].concat();
    let child2 = [&b[..cut], &a[cut..]].concat();
    (Chromosome::new(child1), Chromosome::new(child2))
}

/// Uniform crossover: per position, child A takes parent1's bit with
/// probability 0.5 (else parent2's) and child B takes the other one.
///
/// # Panics
/// Panics if parents have different lengths.
pub fn uniform_crossover<R: Rng>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let (a, b) = (parent1.bits(), parent2.bits());
    assert_eq!(a.len(), b.len(), "parents must have equal length");

    let mut child1 = Vec::with_capacity(a.len());
    let mut child2 = Vec::with_capacity(a.len());
    for (&x, &y) in a.iter().zip(b) {
        if rng.random_bool(0.5) {
            child1.push(x);
            child2.push(y);
        } else {
            child1.push(y);
            child2.push(x);
        }
    }
    (Chromosome::new(child1), Chromosome::new(child2))
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Bit-flip mutation: flip each bit independently with probability `pm`.
///
/// Returns the number of flipped bits.
///
/// # Panics
/// Panics if `pm` is outside `[0, 1]`.
pub fn bit_flip_mutation<R: Rng>(chromosome: &mut Chromosome, pm: f64, rng: &mut R) -> usize {
    let mut flips = 0;
    for pos in 0..chromosome.len() {
        if rng.random_bool(pm) {
            chromosome.flip(pos);
            flips += 1;
        }
    }
    flips
}

// ============================================================================
// Elitism
// ============================================================================

/// Indices of the `count` fittest individuals, best first.
///
/// Equal fitness keeps the lower index first.
pub fn elite_indices<I: Scored>(population: &[I], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..population.len()).collect();
    // stable: equal fitness keeps ascending index
    order.sort_by(|&a, &b| population[b].fitness().total_cmp(&population[a].fitness()));
    order.truncate(count);
    order
}

// ============================================================================
// Tests
// ============================================================================
