//! Reproducible genetic-algorithm experiments for the 0/1 knapsack problem.
//!
//! - **Model** ([`model`]): validated instances and reproducible subset
//!   sampling that keeps track of original item ids.
//! - **Genetic Algorithm** ([`ga`]): bit-string GA with tournament or
//!   roulette selection, one-point or uniform crossover, bit-flip mutation,
//!   elitism, greedy repair or linear penalty constraint handling, early
//!   stopping and an optional wall-clock limit.
//! - **Experiments** ([`experiment`]): every instance crossed with every
//!   seed, one independent run each, records streamed to a sink.
//!
//! Every run owns a generator seeded from its seed alone
//! ([`random::create_rng`]), so identical (instance, configuration, seed)
//! triples produce identical traces and results.
//!
//! # Example
//!
//! ```
//! use knapsack_ga::ga::{ConstraintHandling, GaConfig, GaRunner};
//! use knapsack_ga::model::{Instance, Item};
//!
//! let instance = Instance::new(50.0, vec![
//!     Item::new(1, 10.0, 60.0),
//!     Item::new(2, 20.0, 100.0),
//!     Item::new(3, 30.0, 120.0),
//! ]).unwrap();
//!
//! let config = GaConfig::fast().with_constraint(ConstraintHandling::Repair);
//! let result = GaRunner::run(&instance, &config, 7).unwrap();
//! assert!(result.feasible);
//! assert_eq!(result.best_value, 220.0);
//! assert_eq!(result.selected_ids, vec![2, 3]);
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for instances, configurations and
//!   results.
//! - `parallel`: [`experiment::Experiment::run_parallel`] on the rayon pool.
//!
//! Progress is reported through `tracing` events; install a subscriber to
//! see them.

pub mod error;
pub mod experiment;
pub mod ga;
pub mod model;
pub mod random;

pub use error::{KnapsackError, Result};
pub use experiment::{Experiment, ExperimentConfig, ResultSink, RunRecord};
pub use ga::{GaConfig, GaRunner, RunResult};
pub use model::{Instance, Item};
