//! Genetic Algorithm for the 0/1 knapsack problem.
//!
//! Candidates are fixed-length bit strings ([`Chromosome`]), one bit per
//! item. An [`Evaluator`] turns a chromosome into an [`Individual`] under
//! the configured [`ConstraintHandling`]: either greedy repair (drop the
//! lowest value/weight items until the capacity is met) or a linear
//! penalty on the overweight amount.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, operators, presets)
//! - [`GaRunner`]: Executes one seeded run
//! - [`RunResult`]: Best solution, termination reason and per-generation trace
//!
//! # Submodules
//!
//! - [`operators`]: Bit-string crossover, mutation and elite selection
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Michalewicz (1996), *Genetic Algorithms + Data Structures = Evolution Programs*,
//!   ch. 4 (knapsack repair vs. penalty)

mod config;
mod fitness;
pub mod operators;
mod runner;
mod selection;
mod types;

pub use config::{EarlyStop, GaConfig, TraceConfig};
pub use fitness::{
    penalty_fitness, total_value, total_weight, totals, ConstraintHandling, Evaluator,
};
pub use operators::{Crossover, Mutation, MutationRate};
pub use runner::{GaRunner, GenerationStats, RunResult, TerminationReason};
pub use selection::Selection;
pub use types::{Chromosome, Individual, Scored};
