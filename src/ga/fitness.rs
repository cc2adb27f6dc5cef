//! Fitness evaluation under the capacity constraint.
//!
//! Two constraint-handling strategies are supported:
//!
//! - **Repair**: infeasible chromosomes are made feasible by dropping
//!   included items in ascending value/weight ratio (ties by ascending
//!   index). The chromosome is modified in place and fitness is the value
//!   of the repaired chromosome.
//! - **Penalty**: the chromosome is never touched; fitness is
//!   `value - lambda * max(0, weight - capacity)` and may be negative.
//!
//! # References
//!
//! - Michalewicz (1996), *Genetic Algorithms + Data Structures = Evolution
//!   Programs*, ch. 4 (knapsack repair and penalty functions)

use super::types::{Chromosome, Individual};
use crate::error::{KnapsackError, Result};
use crate::model::{Instance, Item};

/// Constraint-handling strategy.
///
/// Serialized as `{"mode": "repair"}` or `{"mode": "penalty", "lambda": 10.0}`;
/// a missing `lambda` defaults to 10.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum ConstraintHandling {
    /// Drop the weakest items until feasible.
    #[default]
    Repair,

    /// Subtract `lambda` per unit of excess weight.
    Penalty {
        /// Non-negative penalty coefficient.
        #[cfg_attr(feature = "serde", serde(default = "default_lambda"))]
        lambda: f64,
    },
}

#[cfg(feature = "serde")]
fn default_lambda() -> f64 {
    10.0
}

impl ConstraintHandling {
    /// Rejects negative or non-finite `lambda`.
    pub fn validate(&self) -> Result<()> {
        if let ConstraintHandling::Penalty { lambda } = *self {
            if !lambda.is_finite() || lambda < 0.0 {
                return Err(KnapsackError::config(
                    "constraint.lambda",
                    format!("must be a non-negative finite number, got {lambda}"),
                ));
            }
        }
        Ok(())
    }
}

/// Sums `(weight, value)` of the included items in bit-position order.
pub fn totals(bits: &[bool], items: &[Item]) -> (f64, f64) {
    bits.iter()
        .zip(items)
        .filter(|(b, _)| **b)
        .fold((0.0, 0.0), |(w, v), (_, item)| (w + item.weight, v + item.value))
}

/// Total weight of the included items.
pub fn total_weight(bits: &[bool], items: &[Item]) -> f64 {
    totals(bits, items).0
}

/// Total value of the included items.
pub fn total_value(bits: &[bool], items: &[Item]) -> f64 {
    totals(bits, items).1
}

/// `value - lambda * max(0, weight - capacity)`.
pub fn penalty_fitness(value: f64, weight: f64, capacity: f64, lambda: f64) -> f64 {
    value - lambda * (weight - capacity).max(0.0)
}

/// Evaluates chromosomes against one instance.
///
/// The repair removal order (ascending ratio, then ascending index) is
/// computed once at construction.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    instance: &'a Instance,
    constraint: ConstraintHandling,
    removal_order: Vec<usize>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator for `instance`.
    pub fn new(instance: &'a Instance, constraint: ConstraintHandling) -> Self {
        let items = instance.items();
        let mut removal_order: Vec<usize> = (0..items.len()).collect();
        removal_order.sort_by(|&a, &b| {
            items[a]
                .ratio()
                .total_cmp(&items[b].ratio())
                .then(a.cmp(&b))
        });
        Self {
            instance,
            constraint,
            removal_order,
        }
    }

    /// The instance being evaluated against.
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// The constraint-handling strategy.
    pub fn constraint(&self) -> ConstraintHandling {
        self.constraint
    }

    /// Makes `chromosome` feasible in place and returns how many items were
    /// dropped. A feasible chromosome is left untouched.
    pub fn repair(&self, chromosome: &mut Chromosome) -> usize {
        let items = self.instance.items();
        let capacity = self.instance.capacity();

        let initial = total_weight(chromosome.bits(), items);
        if initial <= capacity {
            return 0;
        }
        // Running subtraction drifts by at most a few ulps of the initial
        // sum; inside this band the exact sum decides.
        let band = initial * 1e-9;

        let mut weight = initial;
        let mut dropped = 0;
        for &j in &self.removal_order {
            if !chromosome.get(j) {
                continue;
            }
            if weight <= capacity + band {
                weight = total_weight(chromosome.bits(), items);
                if weight <= capacity {
                    break;
                }
            }
            chromosome.set(j, false);
            weight -= items[j].weight;
            dropped += 1;
        }
        dropped
    }

    /// Evaluates (and, in repair mode, repairs) a chromosome.
    pub fn evaluate(&self, mut chromosome: Chromosome) -> Individual {
        if self.constraint == ConstraintHandling::Repair {
            self.repair(&mut chromosome);
        }

        let capacity = self.instance.capacity();
        let (weight, value) = totals(chromosome.bits(), self.instance.items());
        let fitness = match self.constraint {
            ConstraintHandling::Repair => value,
            ConstraintHandling::Penalty { lambda } => {
                penalty_fitness(value, weight, capacity, lambda)
            }
        };

        Individual {
            chromosome,
            fitness,
            weight,
            value,
            feasible: weight <= capacity,
        }
    }

    /// Evaluates every chromosome, preserving order.
    pub fn evaluate_all(&self, chromosomes: Vec<Chromosome>) -> Vec<Individual> {
        chromosomes.into_iter().map(|c| self.evaluate(c)).collect()
    }
}
