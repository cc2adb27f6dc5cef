//! Selection strategies for the GA.
//!
//! Selection determines which individuals are chosen as parents for
//! crossover. Both strategies assume **maximization** (higher fitness =
//! better) and return an index into the current population.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::types::Scored;
use crate::error::{KnapsackError, Result};
use rand::Rng;

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use knapsack_ga::ga::Selection;
///
/// // Tournament with size 3 (moderate selection pressure)
/// let sel = Selection::Tournament(3);
///
/// // Roulette wheel (fitness-proportionate)
/// let sel = Selection::Roulette;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "SelectionRepr", into = "SelectionRepr"))]
pub enum Selection {
    /// Tournament selection: draw `k` individuals uniformly with
    /// replacement, keep the fittest. Ties go to the lowest population
    /// index.
    ///
    /// Higher `k` = stronger selection pressure.
    /// - k=2: light pressure (good for diversity)
    /// - k=3-5: moderate pressure (typical default)
    /// - k>5: strong pressure (risk of premature convergence)
    ///
    /// # Complexity
    /// O(k) per selection
    Tournament(usize),

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// P(i) = max(f_i, 0) / Σ max(f_j, 0). When no individual has positive
    /// fitness the choice is uniform.
    ///
    /// **Warning**: Susceptible to super-individual dominance when
    /// fitness variance is high.
    ///
    /// # Complexity
    /// O(n) per selection (linear scan)
    Roulette,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

/// Wire layout: `{"type": "tournament", "k": 3}` or `{"type": "roulette"}`.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SelectionRepr {
    Tournament {
        #[serde(default = "default_tournament_size")]
        k: usize,
    },
    Roulette,
}

#[cfg(feature = "serde")]
fn default_tournament_size() -> usize {
    3
}

#[cfg(feature = "serde")]
impl From<SelectionRepr> for Selection {
    fn from(repr: SelectionRepr) -> Self {
        match repr {
            SelectionRepr::Tournament { k } => Selection::Tournament(k),
            SelectionRepr::Roulette => Selection::Roulette,
        }
    }
}

#[cfg(feature = "serde")]
impl From<Selection> for SelectionRepr {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Tournament(k) => SelectionRepr::Tournament { k },
            Selection::Roulette => SelectionRepr::Roulette,
        }
    }
}

impl Selection {
    /// Rejects a tournament size below 1.
    pub fn validate(&self) -> Result<()> {
        if let Selection::Tournament(0) = self {
            return Err(KnapsackError::config("selection.k", "must be at least 1"));
        }
        Ok(())
    }

    /// Select a parent index from the population.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<I: Scored, R: Rng>(&self, population: &[I], rng: &mut R) -> usize {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );

        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Roulette => roulette(population, rng),
        }
    }
}

/// Tournament selection: draw k indices, return the fittest (lowest index on ties).
fn tournament<I: Scored, R: Rng>(population: &[I], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        let (f, best_f) = (population[idx].fitness(), population[best_idx].fitness());
        if f > best_f || (f == best_f && idx < best_idx) {
            best_idx = idx;
        }
    }
    best_idx
}

/// Roulette wheel selection over the positive part of the fitness.
fn roulette<I: Scored, R: Rng>(population: &[I], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let weights: Vec<f64> = population
        .iter()
        .map(|ind| ind.fitness().max(0.0))
        .collect();

    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = i;
        if cumulative > threshold {
            return i;
        }
    }

    last_positive // floating-point fallback
}
