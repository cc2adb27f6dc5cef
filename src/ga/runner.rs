//! GA evolutionary loop execution.
//!
//! [`GaRunner`] drives one run through its states:
//!
//! ```text
//! INITIALIZING → EVOLVING → (CONVERGED | MAX_GENERATIONS | TIME_LIMIT) → DONE
//! ```
//!
//! Initialization validates the configuration, applies the subset policy,
//! seeds the run generator and evaluates generation 0. Each generation is
//! built by elitism followed by selection → crossover → mutation, then
//! evaluated as a whole. Termination is checked at the end of every
//! generation in this order: time limit, generation cap, early stop.

use super::config::{GaConfig, TraceConfig};
use super::fitness::Evaluator;
use super::operators::elite_indices;
use super::types::{Chromosome, Individual};
use crate::error::Result;
use crate::model::{Instance, ItemId, Meta};
use crate::random::create_rng;
use rand::Rng;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TerminationReason {
    /// No sufficient improvement for `patience` generations.
    Converged,
    /// `max_generations` generations were executed.
    MaxGenerations,
    /// The wall-clock limit elapsed.
    TimeLimit,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerminationReason::Converged => "converged",
            TerminationReason::MaxGenerations => "max_generations",
            TerminationReason::TimeLimit => "time_limit",
        })
    }
}

/// One trace entry: fitness statistics of a completed generation.
///
/// A statistic switched off in [`TraceConfig`] is `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// Generation index (0 = initial population).
    pub generation: usize,
    /// Highest fitness in the population.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub best: Option<f64>,
    /// Mean fitness of the population.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub avg: Option<f64>,
}

/// Best and mean fitness of a population.
#[derive(Clone, Copy)]
struct FitnessSummary {
    best: f64,
    avg: f64,
}

impl FitnessSummary {
    fn of(population: &[Individual]) -> Self {
        let best = population
            .iter()
            .map(|ind| ind.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = population.iter().map(|ind| ind.fitness).sum();
        Self {
            best,
            avg: sum / population.len() as f64,
        }
    }

    fn record(self, generation: usize, trace: &mut Vec<GenerationStats>, config: &TraceConfig) {
        if config.is_enabled() {
            trace.push(GenerationStats {
                generation,
                best: config.store_best_per_gen.then_some(self.best),
                avg: config.store_avg_per_gen.then_some(self.avg),
            });
        }
    }
}

/// Result of a single run.
///
/// Reports the best feasible individual seen during the run. In penalty
/// mode, if no feasible individual ever appeared, the best-fitness
/// individual is reported instead with `feasible == false`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunResult {
    /// Seed of the run generator.
    pub seed: u64,

    /// Number of items optimized over (after subset sampling).
    pub n_items: usize,

    /// Knapsack capacity.
    pub capacity: f64,

    /// Metadata of the instance optimized over, including the
    /// `subset_*` entries when a subset was sampled.
    pub instance_meta: Meta,

    /// Configuration of the run.
    pub params: GaConfig,

    /// Per-bit mutation probability after resolving `1/n`.
    pub mutation_probability: f64,

    /// Total value of the best individual.
    pub best_value: f64,

    /// Total weight of the best individual.
    pub best_weight: f64,

    /// Fitness of the best individual.
    pub best_fitness: f64,

    /// Whether the best individual fits the capacity.
    pub feasible: bool,

    /// Bits of the best individual (after repair, in repair mode).
    pub best_chromosome: Chromosome,

    /// Original ids of the items packed by the best individual.
    pub selected_ids: Vec<ItemId>,

    /// Generation at which the best individual was first seen.
    pub best_generation: usize,

    /// Generations executed after generation 0.
    pub generations: usize,

    /// Wall-clock duration of the run in seconds.
    pub elapsed_secs: f64,

    /// Why the run stopped.
    pub termination: TerminationReason,

    /// Statistics of every generation, starting at 0. Empty when
    /// [`TraceConfig`] records nothing.
    pub trace: Vec<GenerationStats>,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```
/// use knapsack_ga::ga::{GaConfig, GaRunner};
/// use knapsack_ga::model::{Instance, Item};
///
/// let instance = Instance::new(10.0, vec![
///     Item::new(0, 5.0, 10.0),
///     Item::new(1, 4.0, 40.0),
///     Item::new(2, 6.0, 30.0),
///     Item::new(3, 3.0, 50.0),
/// ]).unwrap();
///
/// let config = GaConfig::default().with_population_size(20).with_max_generations(30);
/// let result = GaRunner::run(&instance, &config, 42).unwrap();
/// assert!(result.feasible);
/// assert_eq!(result.best_value, 90.0);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA on `instance` with a generator seeded from `seed` only.
    ///
    /// # Errors
    /// [`KnapsackError::Configuration`](crate::KnapsackError::Configuration)
    /// if the configuration or the subset policy is invalid. Nothing is
    /// evolved in that case.
    pub fn run(instance: &Instance, config: &GaConfig, seed: u64) -> Result<RunResult> {
        let started = Instant::now();

        // INITIALIZING
        config.validate()?;
        let view = config.subset.apply(instance)?;
        let problem = view.instance();
        let n = problem.len();
        let pm = config.mutation_rate.resolve(n);
        let evaluator = Evaluator::new(problem, config.constraint);
        let time_limit = config.time_limit();
        let mut rng = create_rng(seed);

        let label = instance.name().unwrap_or("?");
        info!(
            instance = label,
            seed,
            n_items = n,
            population = config.population_size,
            pm,
            "run started"
        );

        let mut population: Vec<Individual> = (0..config.population_size)
            .map(|_| evaluator.evaluate(Chromosome::random(n, config.initial_density, &mut rng)))
            .collect();

        let mut trace = Vec::new();
        let initial = FitnessSummary::of(&population);
        initial.record(0, &mut trace, &config.trace);

        let mut best = BestSoFar::new(&population[0]);
        best.observe(&population, 0);

        let mut reference = initial.best;
        let mut no_improvement = 0usize;
        let mut generation = 0usize;

        // EVOLVING
        let termination = loop {
            generation += 1;
            population = next_generation(&population, config, pm, &evaluator, &mut rng);

            let stats = FitnessSummary::of(&population);
            stats.record(generation, &mut trace, &config.trace);
            best.observe(&population, generation);

            if config.log_every > 0 && generation % config.log_every == 0 {
                info!(
                    instance = label,
                    seed,
                    generation,
                    max_generations = config.max_generations,
                    best = stats.best,
                    avg = stats.avg,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "generation"
                );
            }

            if time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                break TerminationReason::TimeLimit;
            }
            if generation >= config.max_generations {
                break TerminationReason::MaxGenerations;
            }
            if config.early_stop.patience > 0 {
                if config.early_stop.is_improvement(stats.best - reference) {
                    reference = stats.best;
                    no_improvement = 0;
                } else {
                    no_improvement += 1;
                    if no_improvement >= config.early_stop.patience {
                        break TerminationReason::Converged;
                    }
                }
            }
        };

        // DONE
        let elapsed_secs = started.elapsed().as_secs_f64();
        let (champion, best_generation) = best.into_best();

        info!(
            instance = label,
            seed,
            generations = generation,
            %termination,
            best_value = champion.value,
            feasible = champion.feasible,
            elapsed_secs,
            "run finished"
        );

        Ok(RunResult {
            seed,
            n_items: n,
            capacity: problem.capacity(),
            instance_meta: problem.meta().clone(),
            params: config.clone(),
            mutation_probability: pm,
            best_value: champion.value,
            best_weight: champion.weight,
            best_fitness: champion.fitness,
            feasible: champion.feasible,
            selected_ids: view.selected_ids(champion.chromosome.bits()),
            best_chromosome: champion.chromosome,
            best_generation,
            generations: generation,
            elapsed_secs,
            termination,
            trace,
        })
    }
}

/// Builds and evaluates the next population.
///
/// Elites are copied unchanged to the front; the rest is filled with
/// mutated crossover offspring. With an odd remainder the second child of
/// the last pair is dropped.
fn next_generation<R: Rng>(
    population: &[Individual],
    config: &GaConfig,
    pm: f64,
    evaluator: &Evaluator<'_>,
    rng: &mut R,
) -> Vec<Individual> {
    let size = config.population_size;
    let mut next: Vec<Individual> = elite_indices(population, config.elitism)
        .into_iter()
        .map(|i| population[i].clone())
        .collect();

    let mut offspring = Vec::with_capacity(size - next.len());
    while next.len() + offspring.len() < size {
        let p1 = config.selection.select(population, rng);
        let p2 = config.selection.select(population, rng);

        let (mut c1, mut c2) = config.crossover.apply(
            &population[p1].chromosome,
            &population[p2].chromosome,
            config.crossover_rate,
            rng,
        );
        config.mutation.apply(&mut c1, pm, rng);
        config.mutation.apply(&mut c2, pm, rng);

        offspring.push(c1);
        if next.len() + offspring.len() < size {
            offspring.push(c2);
        }
    }

    next.extend(evaluator.evaluate_all(offspring));
    next
}

/// Best-ever tracking: best feasible by value, plus best-fitness fallback.
struct BestSoFar {
    feasible: Option<(Individual, usize)>,
    any: (Individual, usize),
}

impl BestSoFar {
    fn new(first: &Individual) -> Self {
        Self {
            feasible: None,
            any: (first.clone(), 0),
        }
    }

    fn observe(&mut self, population: &[Individual], generation: usize) {
        for ind in population {
            if ind.feasible
                && self
                    .feasible
                    .as_ref()
                    .map_or(true, |(best, _)| ind.value > best.value)
            {
                self.feasible = Some((ind.clone(), generation));
            }
            if ind.fitness > self.any.0.fitness {
                self.any = (ind.clone(), generation);
            }
        }
        debug!(
            generation,
            best_feasible = self.feasible.as_ref().map(|(b, _)| b.value),
            "best so far"
        );
    }

    fn into_best(self) -> (Individual, usize) {
        self.feasible.unwrap_or(self.any)
    }
}

// ============================================================================
// Tests
// ============================================================================
