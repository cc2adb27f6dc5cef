//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control a single run. Everything
//! is resolved before the run starts and stays fixed for its duration.

use super::fitness::ConstraintHandling;
use super::operators::{Crossover, Mutation, MutationRate};
use super::selection::Selection;
use crate::error::{KnapsackError, Result};
use crate::model::SubsetPolicy;
use std::time::Duration;

/// Early-stopping policy.
///
/// The run converges once the generation best has failed to beat the
/// reference best by a strictly positive amount of at least `min_delta`
/// for `patience` consecutive generations.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EarlyStop {
    /// Generations without sufficient improvement before stopping.
    ///
    /// Set to 0 to disable early stopping.
    pub patience: usize,

    /// Minimum absolute fitness improvement that resets the counter.
    pub min_delta: f64,
}

impl Default for EarlyStop {
    fn default() -> Self {
        Self {
            patience: 50,
            min_delta: 0.0,
        }
    }
}

impl EarlyStop {
    /// Early stopping switched off.
    pub fn disabled() -> Self {
        Self {
            patience: 0,
            min_delta: 0.0,
        }
    }

    /// Whether `improvement` over the reference best resets patience.
    pub fn is_improvement(&self, improvement: f64) -> bool {
        improvement > 0.0 && improvement >= self.min_delta
    }
}

/// Which per-generation statistics a run records in its trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TraceConfig {
    /// Record the best fitness of each generation.
    pub store_best_per_gen: bool,
    /// Record the mean fitness of each generation.
    pub store_avg_per_gen: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            store_best_per_gen: true,
            store_avg_per_gen: true,
        }
    }
}

impl TraceConfig {
    /// Whether anything is recorded at all.
    pub fn is_enabled(&self) -> bool {
        self.store_best_per_gen || self.store_avg_per_gen
    }
}

/// Configuration for the knapsack Genetic Algorithm.
///
/// Controls population size, operators and their rates, constraint
/// handling, termination conditions and subset sampling.
///
/// # Defaults
///
/// ```
/// use knapsack_ga::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 500);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use knapsack_ga::ga::{ConstraintHandling, GaConfig, MutationRate, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(200)
///     .with_selection(Selection::Tournament(5))
///     .with_elitism(4)
///     .with_mutation_rate(MutationRate::Fixed(0.01))
///     .with_constraint(ConstraintHandling::Penalty { lambda: 10.0 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GaConfig {
    /// Number of individuals in the population.
    ///
    /// Larger populations increase diversity but slow down each generation.
    /// Typical range: 50–500.
    #[cfg_attr(feature = "serde", serde(alias = "population"))]
    pub population_size: usize,

    /// Maximum number of generations after generation 0.
    pub max_generations: usize,

    /// Selection strategy for choosing parents.
    pub selection: Selection,

    /// Crossover operator.
    pub crossover: Crossover,

    /// Mutation operator.
    pub mutation: Mutation,

    /// Number of top individuals copied unchanged into the next generation.
    ///
    /// Must be smaller than `population_size`.
    pub elitism: usize,

    /// Probability of recombining a pair of parents (0.0–1.0).
    ///
    /// When crossover is not applied, both parents are cloned.
    #[cfg_attr(feature = "serde", serde(alias = "pc"))]
    pub crossover_rate: f64,

    /// Per-bit flip probability.
    #[cfg_attr(feature = "serde", serde(alias = "pm"))]
    pub mutation_rate: MutationRate,

    /// Repair or penalty constraint handling.
    pub constraint: ConstraintHandling,

    /// Early-stopping policy.
    pub early_stop: EarlyStop,

    /// Item subset the run optimizes over.
    pub subset: SubsetPolicy,

    /// Probability of a 1-bit in the initial population (0.0–1.0).
    pub initial_density: f64,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked at the end of each generation, so the actual runtime may
    /// exceed this limit by one generation's worth of work.
    ///
    /// `None` or `Some(0)` disables time-based termination (the default).
    pub time_limit_ms: Option<u64>,

    /// Emit a progress event every `log_every` generations (0 disables).
    pub log_every: usize,

    /// Per-generation statistics kept in the result trace.
    pub trace: TraceConfig,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            selection: Selection::default(),
            crossover: Crossover::default(),
            mutation: Mutation::default(),
            elitism: 2,
            crossover_rate: 0.9,
            mutation_rate: MutationRate::default(),
            constraint: ConstraintHandling::default(),
            early_stop: EarlyStop::default(),
            subset: SubsetPolicy::default(),
            initial_density: 0.5,
            time_limit_ms: None,
            log_every: 50,
            trace: TraceConfig::default(),
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Convenience builder for tournament selection of size `k`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the mutation operator.
    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Sets the elite count.
    pub fn with_elitism(mut self, count: usize) -> Self {
        self.elitism = count;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the per-bit mutation probability.
    pub fn with_mutation_rate(mut self, rate: MutationRate) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the constraint-handling strategy.
    pub fn with_constraint(mut self, constraint: ConstraintHandling) -> Self {
        self.constraint = constraint;
        self
    }

    /// Sets the early-stopping policy.
    pub fn with_early_stop(mut self, patience: usize, min_delta: f64) -> Self {
        self.early_stop = EarlyStop {
            patience,
            min_delta,
        };
        self
    }

    /// Sets the subset policy.
    pub fn with_subset(mut self, subset: SubsetPolicy) -> Self {
        self.subset = subset;
        self
    }

    /// Sets the initial 1-bit probability.
    pub fn with_initial_density(mut self, density: f64) -> Self {
        self.initial_density = density;
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the progress-logging interval (0 disables).
    pub fn with_log_every(mut self, generations: usize) -> Self {
        self.log_every = generations;
        self
    }

    /// Selects which statistics the trace keeps.
    pub fn with_trace(mut self, store_best_per_gen: bool, store_avg_per_gen: bool) -> Self {
        self.trace = TraceConfig {
            store_best_per_gen,
            store_avg_per_gen,
        };
        self
    }

    /// Preset for fast runs: small population, few generations.
    ///
    /// - Population: 50, Generations: 100
    /// - Patience: 20
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            early_stop: EarlyStop {
                patience: 20,
                min_delta: 0.0,
            },
            ..Self::default()
        }
    }

    /// Preset balancing solution quality and computation time.
    ///
    /// - Population: 100, Generations: 300
    /// - Patience: 50
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 300,
            early_stop: EarlyStop {
                patience: 50,
                min_delta: 0.0,
            },
            ..Self::default()
        }
    }

    /// Preset for quality: large population, many generations.
    ///
    /// - Population: 150, Generations: 500
    /// - Patience: 80, Elitism: 4
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            max_generations: 500,
            elitism: 4,
            early_stop: EarlyStop {
                patience: 80,
                min_delta: 0.0,
            },
            ..Self::default()
        }
    }

    /// The effective wall-clock limit; zero means none.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Picks a preset from the number of items.
    ///
    /// - `item_count < 50` → [`fast()`](Self::fast)
    /// - `50 ≤ item_count < 200` → [`balanced()`](Self::balanced)
    /// - `item_count ≥ 200` → [`quality()`](Self::quality)
    pub fn auto_select(item_count: usize) -> Self {
        if item_count < 50 {
            Self::fast()
        } else if item_count < 200 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Validates the configuration.
    ///
    /// Subset sizes depend on the instance and are checked when the subset
    /// is applied.
    ///
    /// # Errors
    /// [`KnapsackError::Configuration`] naming the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(KnapsackError::config(
                "population",
                "must be at least 2",
            ));
        }
        if self.max_generations == 0 {
            return Err(KnapsackError::config(
                "max_generations",
                "must be at least 1",
            ));
        }
        if self.elitism >= self.population_size {
            return Err(KnapsackError::config(
                "elitism",
                format!(
                    "{} must be smaller than the population size {}",
                    self.elitism, self.population_size
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(KnapsackError::config(
                "pc",
                format!("must be in [0, 1], got {}", self.crossover_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_density) {
            return Err(KnapsackError::config(
                "initial_density",
                format!("must be in [0, 1], got {}", self.initial_density),
            ));
        }
        if !self.early_stop.min_delta.is_finite() || self.early_stop.min_delta < 0.0 {
            return Err(KnapsackError::config(
                "early_stop.min_delta",
                "must be a non-negative finite number",
            ));
        }
        self.selection.validate()?;
        self.mutation_rate.validate()?;
        self.constraint.validate()?;
        if let SubsetPolicy::Random { size: 0, .. } | SubsetPolicy::FirstK { size: 0 } =
            self.subset
        {
            return Err(KnapsackError::config("subset.size", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 500);
        assert_eq!(config.selection, Selection::Tournament(3));
        assert_eq!(config.crossover, Crossover::OnePoint);
        assert_eq!(config.mutation, Mutation::BitFlip);
        assert_eq!(config.elitism, 2);
        assert!((config.crossover_rate - 0.9).abs() < 1e-10);
        assert_eq!(config.mutation_rate, MutationRate::InverseLength);
        assert_eq!(config.constraint, ConstraintHandling::Repair);
        assert_eq!(config.early_stop.patience, 50);
        assert_eq!(config.subset, SubsetPolicy::None);
        assert!(config.time_limit_ms.is_none());
        assert_eq!(config.log_every, 50);
        assert_eq!(config.trace, TraceConfig::default());
        assert!(config.trace.store_best_per_gen && config.trace.store_avg_per_gen);
    }

    #[test]
    fn test_builder_pattern() {
        let config = GaConfig::default()
            .with_population_size(200)
            .with_max_generations(1000)
            .with_selection(Selection::Roulette)
            .with_crossover(Crossover::Uniform)
            .with_elitism(5)
            .with_crossover_rate(0.8)
            .with_mutation_rate(MutationRate::Fixed(0.05))
            .with_constraint(ConstraintHandling::Penalty { lambda: 3.0 })
            .with_early_stop(10, 0.5)
            .with_subset(SubsetPolicy::FirstK { size: 10 })
            .with_initial_density(0.2)
            .with_log_every(0);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.selection, Selection::Roulette);
        assert_eq!(config.crossover, Crossover::Uniform);
        assert_eq!(config.elitism, 5);
        assert!((config.crossover_rate - 0.8).abs() < 1e-10);
        assert_eq!(config.mutation_rate, MutationRate::Fixed(0.05));
        assert_eq!(config.constraint, ConstraintHandling::Penalty { lambda: 3.0 });
        assert_eq!(config.early_stop.patience, 10);
        assert!((config.early_stop.min_delta - 0.5).abs() < 1e-15);
        assert_eq!(config.subset, SubsetPolicy::FirstK { size: 10 });
        assert!((config.initial_density - 0.2).abs() < 1e-15);
        assert_eq!(config.log_every, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ok() {
        assert!(GaConfig::default().validate().is_ok());
    }

    fn invalid_parameter(config: GaConfig) -> String {
        config
            .validate()
            .unwrap_err()
            .parameter()
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = GaConfig::default().with_population_size(1).with_elitism(0);
        assert_eq!(invalid_parameter(config), "population");
    }

    #[test]
    fn test_validate_zero_generations() {
        let config = GaConfig::default().with_max_generations(0);
        assert_eq!(invalid_parameter(config), "max_generations");
    }

    #[test]
    fn test_validate_elitism_fills_population() {
        let config = GaConfig::default().with_population_size(10).with_elitism(10);
        assert_eq!(invalid_parameter(config), "elitism");
        let config = GaConfig::default().with_population_size(10).with_elitism(9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_tournament_k() {
        let config = GaConfig::default().with_tournament_size(0);
        assert_eq!(invalid_parameter(config), "selection.k");
    }

    #[test]
    fn test_validate_rates() {
        assert_eq!(
            invalid_parameter(GaConfig::default().with_crossover_rate(1.5)),
            "pc"
        );
        assert_eq!(
            invalid_parameter(GaConfig::default().with_mutation_rate(MutationRate::Fixed(-0.1))),
            "pm"
        );
        assert_eq!(
            invalid_parameter(GaConfig::default().with_initial_density(2.0)),
            "initial_density"
        );
    }

    #[test]
    fn test_validate_negative_lambda() {
        let config =
            GaConfig::default().with_constraint(ConstraintHandling::Penalty { lambda: -2.0 });
        assert_eq!(invalid_parameter(config), "constraint.lambda");
    }

    #[test]
    fn test_validate_min_delta() {
        let config = GaConfig::default().with_early_stop(5, -1.0);
        assert_eq!(invalid_parameter(config), "early_stop.min_delta");
    }

    #[test]
    fn test_zero_time_limit_is_valid() {
        let config = GaConfig::default().with_time_limit_ms(0);
        assert!(config.validate().is_ok());
        assert_eq!(config.time_limit(), None);

        let config = GaConfig::default().with_time_limit_ms(250);
        assert!(config.validate().is_ok());
        assert_eq!(config.time_limit(), Some(Duration::from_millis(250)));
        assert_eq!(GaConfig::default().time_limit(), None);
    }

    #[test]
    fn test_presets_have_no_time_limit() {
        for config in [GaConfig::fast(), GaConfig::balanced(), GaConfig::quality()] {
            assert_eq!(config.time_limit(), None);
        }
    }

    #[test]
    fn test_validate_zero_subset() {
        let config = GaConfig::default().with_subset(SubsetPolicy::Random { size: 0, seed: 1 });
        assert_eq!(invalid_parameter(config), "subset.size");
    }

    // ---- Early stop ----

    #[test]
    fn test_improvement_requires_positive_gain() {
        let es = EarlyStop {
            patience: 1,
            min_delta: 0.0,
        };
        assert!(!es.is_improvement(0.0));
        assert!(es.is_improvement(1e-9));

        let es = EarlyStop {
            patience: 1,
            min_delta: 2.0,
        };
        assert!(!es.is_improvement(1.5));
        assert!(es.is_improvement(2.0));
    }

    // ---- Presets ----

    #[test]
    fn test_preset_fast() {
        let config = GaConfig::fast();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.max_generations, 100);
        assert_eq!(config.early_stop.patience, 20);
        assert_eq!(config.time_limit_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preset_balanced() {
        let config = GaConfig::balanced();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 300);
        assert_eq!(config.early_stop.patience, 50);
        assert_eq!(config.time_limit_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preset_quality() {
        let config = GaConfig::quality();
        assert_eq!(config.population_size, 150);
        assert_eq!(config.max_generations, 500);
        assert_eq!(config.elitism, 4);
        assert_eq!(config.early_stop.patience, 80);
        assert_eq!(config.time_limit_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_auto_select_boundaries() {
        assert_eq!(GaConfig::auto_select(49).population_size, 50);
        assert_eq!(GaConfig::auto_select(50).population_size, 100);
        assert_eq!(GaConfig::auto_select(199).population_size, 100);
        assert_eq!(GaConfig::auto_select(200).population_size, 150);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial_config() {
        let json = r#"{
            "population_size": 40,
            "crossover_rate": 0.7,
            "mutation_rate": "1/n",
            "selection": {"type": "tournament", "k": 4},
            "crossover": "uniform",
            "constraint": {"mode": "penalty", "lambda": 10.0},
            "early_stop": {"patience": 15},
            "subset": {"mode": "random", "size": 100, "seed": 3}
        }"#;
        let config: GaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.population_size, 40);
        assert_eq!(config.mutation_rate, MutationRate::InverseLength);
        assert_eq!(config.selection, Selection::Tournament(4));
        assert_eq!(config.crossover, Crossover::Uniform);
        assert_eq!(config.constraint, ConstraintHandling::Penalty { lambda: 10.0 });
        assert_eq!(config.early_stop.patience, 15);
        assert_eq!(config.early_stop.min_delta, 0.0);
        assert_eq!(config.subset, SubsetPolicy::Random { size: 100, seed: 3 });
        assert_eq!(config.max_generations, 500);

        let fixed: GaConfig = serde_json::from_str(r#"{"mutation_rate": 0.01}"#).unwrap();
        assert_eq!(fixed.mutation_rate, MutationRate::Fixed(0.01));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_short_parameter_names() {
        let json = r#"{
            "population": 60,
            "pc": 0.8,
            "pm": 0.01,
            "elitism": 1,
            "max_generations": 200,
            "selection": {"type": "roulette"},
            "constraint": {"mode": "penalty"}
        }"#;
        let config: GaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.population_size, 60);
        assert!((config.crossover_rate - 0.8).abs() < 1e-12);
        assert_eq!(config.mutation_rate, MutationRate::Fixed(0.01));
        assert_eq!(config.selection, Selection::Roulette);
        assert_eq!(config.constraint, ConstraintHandling::Penalty { lambda: 10.0 });
        assert!(config.validate().is_ok());

        let repair: GaConfig = serde_json::from_str(r#"{"constraint": {"mode": "repair"}}"#).unwrap();
        assert_eq!(repair.constraint, ConstraintHandling::Repair);

        assert!(serde_json::from_str::<GaConfig>(r#"{"pm": "1/k"}"#).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_round_trips_layout() {
        let config = GaConfig::default().with_mutation_rate(MutationRate::Fixed(0.02));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["mutation_rate"], 0.02);
        assert_eq!(value["selection"], serde_json::json!({"type": "tournament", "k": 3}));
        assert_eq!(value["constraint"], serde_json::json!({"mode": "repair"}));
        let back: GaConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);

        let inverse = serde_json::to_value(GaConfig::default()).unwrap();
        assert_eq!(inverse["mutation_rate"], "1/n");
    }
}
