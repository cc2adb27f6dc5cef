//! Batch experiments: every instance crossed with every seed.
//!
//! An [`Experiment`] runs one independent [`GaRunner`] per (instance, seed)
//! pair and hands each outcome to a [`ResultSink`] as a [`RunRecord`]. A
//! failing run yields an `Err` outcome and the batch moves on.
//!
//! ```
//! use knapsack_ga::experiment::{Experiment, ExperimentConfig, RunRecord};
//! use knapsack_ga::ga::GaConfig;
//! use knapsack_ga::model::{Instance, Item};
//!
//! let instance = Instance::new(5.0, vec![Item::new(0, 2.0, 3.0), Item::new(1, 3.0, 4.0)])
//!     .unwrap();
//! let config = ExperimentConfig::default()
//!     .with_ga(GaConfig::fast().with_log_every(0))
//!     .with_seeds(vec![1, 2, 3]);
//!
//! let mut records: Vec<RunRecord> = Vec::new();
//! let summary = Experiment::new(config).unwrap().run(&[instance], &mut records);
//! assert_eq!(summary.completed, 3);
//! assert_eq!(records.len(), 3);
//! ```

use crate::error::{KnapsackError, Result};
use crate::ga::{GaConfig, GaRunner, RunResult};
use crate::model::{Instance, InstanceSpec, Meta};
use tracing::{info, warn};

/// Experiment-level configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExperimentConfig {
    /// Configuration shared by every run.
    pub ga: GaConfig,

    /// Runs per instance.
    pub runs: usize,

    /// Seeds, one per run. Padded with `len..runs` when shorter than `runs`.
    pub seeds: Vec<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            ga: GaConfig::default(),
            runs: 1,
            seeds: vec![0],
        }
    }
}

impl ExperimentConfig {
    /// Sets the per-run GA configuration.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the number of runs per instance.
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    /// Replaces the seed list; `runs` becomes its length.
    pub fn with_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.runs = seeds.len();
        self.seeds = seeds;
        self
    }

    /// Small budget for smoke tests.
    pub fn fast() -> Self {
        Self::default().with_ga(GaConfig::fast())
    }

    /// Default GA settings over five seeds.
    pub fn balanced() -> Self {
        Self::default()
            .with_ga(GaConfig::balanced())
            .with_seeds((0..5).collect())
    }

    /// Larger budget over ten seeds.
    pub fn quality() -> Self {
        Self::default()
            .with_ga(GaConfig::quality())
            .with_seeds((0..10).collect())
    }

    /// Seeds actually used, exactly `runs` of them.
    ///
    /// ```
    /// use knapsack_ga::experiment::ExperimentConfig;
    ///
    /// let config = ExperimentConfig { seeds: vec![7], runs: 3, ..Default::default() };
    /// assert_eq!(config.resolved_seeds(), vec![7, 1, 2]);
    /// ```
    pub fn resolved_seeds(&self) -> Vec<u64> {
        let mut seeds: Vec<u64> = self.seeds.iter().copied().take(self.runs).collect();
        let start = seeds.len();
        seeds.extend((start..self.runs).map(|i| i as u64));
        seeds
    }

    /// Validates the run count and the instance-independent GA parameters.
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(KnapsackError::config("runs", "must be at least 1"));
        }
        self.ga.validate()
    }
}

/// Outcome of one (instance, seed) run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunRecord {
    /// Position of the instance in the batch.
    pub instance_index: usize,
    /// The instance's `name` metadata, if any.
    pub instance_name: Option<String>,
    /// The instance's metadata as given, before subset sampling.
    pub instance_meta: Meta,
    /// Position of the seed in the resolved seed list.
    pub run_index: usize,
    /// Seed of the run.
    pub seed: u64,
    /// Result, or the error that prevented the run.
    pub outcome: std::result::Result<RunResult, KnapsackError>,
}

impl RunRecord {
    /// Whether the run completed.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Destination for run records, fed in (instance, seed) order.
pub trait ResultSink {
    /// Receives one record.
    fn accept(&mut self, record: RunRecord);
}

impl ResultSink for Vec<RunRecord> {
    fn accept(&mut self, record: RunRecord) {
        self.push(record);
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn accept(&mut self, record: RunRecord) {
        (**self).accept(record);
    }
}

/// Adapts a closure into a [`ResultSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(RunRecord)> ResultSink for FnSink<F> {
    fn accept(&mut self, record: RunRecord) {
        (self.0)(record);
    }
}

/// Counts of a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Runs that produced a result.
    pub completed: usize,
    /// Runs that produced an error.
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, record: &RunRecord) {
        if record.is_ok() {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Runs a validated [`ExperimentConfig`] over batches of instances.
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,
    seeds: Vec<u64>,
}

impl Experiment {
    /// Validates `config` and resolves its seed list.
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let seeds = config.resolved_seeds();
        Ok(Self { config, seeds })
    }

    /// The configuration.
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// The resolved seeds.
    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// Runs every instance with every seed, sequentially.
    pub fn run<S: ResultSink>(&self, instances: &[Instance], sink: &mut S) -> BatchSummary {
        info!(
            instances = instances.len(),
            runs = self.seeds.len(),
            "experiment started"
        );
        let mut summary = BatchSummary::default();
        for (instance_index, instance) in instances.iter().enumerate() {
            for (run_index, &seed) in self.seeds.iter().enumerate() {
                let record = self.run_one(instance_index, instance, run_index, seed);
                summary.record(&record);
                sink.accept(record);
            }
        }
        self.finish(summary)
    }

    /// Like [`run`](Self::run), validating raw instance descriptions first.
    ///
    /// An invalid description yields one `Err` record per seed for that
    /// instance; the other instances still run.
    pub fn run_specs<S: ResultSink>(&self, specs: &[InstanceSpec], sink: &mut S) -> BatchSummary {
        info!(
            instances = specs.len(),
            runs = self.seeds.len(),
            "experiment started"
        );
        let mut summary = BatchSummary::default();
        for (instance_index, spec) in specs.iter().enumerate() {
            match Instance::try_from(spec.clone()) {
                Ok(instance) => {
                    for (run_index, &seed) in self.seeds.iter().enumerate() {
                        let record = self.run_one(instance_index, &instance, run_index, seed);
                        summary.record(&record);
                        sink.accept(record);
                    }
                }
                Err(err) => {
                    let name = spec
                        .meta
                        .get("name")
                        .and_then(|v| v.as_str())
                        .map(str::to_owned);
                    warn!(instance_index, error = %err, "instance rejected");
                    for (run_index, &seed) in self.seeds.iter().enumerate() {
                        let record = RunRecord {
                            instance_index,
                            instance_name: name.clone(),
                            instance_meta: spec.meta.clone(),
                            run_index,
                            seed,
                            outcome: Err(err.clone()),
                        };
                        summary.record(&record);
                        sink.accept(record);
                    }
                }
            }
        }
        self.finish(summary)
    }

    /// Runs the batch on the rayon pool.
    ///
    /// Records reach `sink` from the calling thread in the same order as
    /// [`run`](Self::run), and each run is identical to its sequential
    /// counterpart.
    #[cfg(feature = "parallel")]
    pub fn run_parallel<S: ResultSink>(&self, instances: &[Instance], sink: &mut S) -> BatchSummary {
        use rayon::prelude::*;

        info!(
            instances = instances.len(),
            runs = self.seeds.len(),
            "experiment started (parallel)"
        );
        let jobs: Vec<(usize, usize)> = (0..instances.len())
            .flat_map(|i| (0..self.seeds.len()).map(move |r| (i, r)))
            .collect();
        let records: Vec<RunRecord> = jobs
            .par_iter()
            .map(|&(i, r)| self.run_one(i, &instances[i], r, self.seeds[r]))
            .collect();

        let mut summary = BatchSummary::default();
        for record in records {
            summary.record(&record);
            sink.accept(record);
        }
        self.finish(summary)
    }

    fn run_one(
        &self,
        instance_index: usize,
        instance: &Instance,
        run_index: usize,
        seed: u64,
    ) -> RunRecord {
        let outcome = GaRunner::run(instance, &self.config.ga, seed);
        if let Err(err) = &outcome {
            warn!(instance_index, seed, error = %err, "run failed");
        }
        RunRecord {
            instance_index,
            instance_name: instance.name().map(str::to_owned),
            instance_meta: instance.meta().clone(),
            run_index,
            seed,
            outcome,
        }
    }

    fn finish(&self, summary: BatchSummary) -> BatchSummary {
        info!(
            completed = summary.completed,
            failed = summary.failed,
            "experiment finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::TerminationReason;
    use crate::model::{Item, SubsetPolicy};
    use serde_json::json;

    fn small(name: &str, n: u64) -> Instance {
        let items = (0..n)
            .map(|i| Item::new(i, 1.0 + (i % 5) as f64, 2.0 + (i % 7) as f64))
            .collect();
        Instance::new(n as f64, items).unwrap().with_meta("name", name)
    }

    fn quick() -> GaConfig {
        GaConfig::fast()
            .with_population_size(10)
            .with_max_generations(10)
            .with_log_every(0)
    }

    #[test]
    fn test_resolved_seeds_padding() {
        let config = ExperimentConfig {
            seeds: vec![42],
            runs: 4,
            ..Default::default()
        };
        assert_eq!(config.resolved_seeds(), vec![42, 1, 2, 3]);

        let config = ExperimentConfig {
            seeds: vec![5, 6, 7],
            runs: 2,
            ..Default::default()
        };
        assert_eq!(config.resolved_seeds(), vec![5, 6]);

        let config = ExperimentConfig::default().with_seeds(vec![9, 8, 7]);
        assert_eq!(config.runs, 3);
        assert_eq!(config.resolved_seeds(), vec![9, 8, 7]);
    }

    #[test]
    fn test_zero_runs_rejected() {
        let err = Experiment::new(ExperimentConfig::default().with_runs(0)).unwrap_err();
        assert_eq!(err.parameter(), Some("runs"));
    }

    #[test]
    fn test_invalid_ga_config_rejected_upfront() {
        let config = ExperimentConfig::default().with_ga(GaConfig::default().with_crossover_rate(2.0));
        let err = Experiment::new(config).unwrap_err();
        assert_eq!(err.parameter(), Some("pc"));
    }

    #[test]
    fn test_cross_product_order() {
        let instances = [small("a", 8), small("b", 12)];
        let config = ExperimentConfig::default()
            .with_ga(quick())
            .with_seeds(vec![3, 1, 2]);
        let mut records = Vec::new();
        let summary = Experiment::new(config).unwrap().run(&instances, &mut records);

        assert_eq!(summary, BatchSummary { completed: 6, failed: 0 });
        let keys: Vec<_> = records
            .iter()
            .map(|r| (r.instance_index, r.run_index, r.seed))
            .collect();
        assert_eq!(
            keys,
            vec![(0, 0, 3), (0, 1, 1), (0, 2, 2), (1, 0, 3), (1, 1, 1), (1, 2, 2)]
        );
        assert_eq!(records[0].instance_name.as_deref(), Some("a"));
        assert_eq!(records[5].instance_name.as_deref(), Some("b"));
    }

    #[test]
    fn test_runs_match_direct_runner() {
        let instance = small("a", 15);
        let config = ExperimentConfig::default().with_ga(quick()).with_seeds(vec![17]);
        let mut records = Vec::new();
        Experiment::new(config.clone())
            .unwrap()
            .run(std::slice::from_ref(&instance), &mut records);

        let direct = GaRunner::run(&instance, &config.ga, 17).unwrap();
        let recorded = records[0].outcome.as_ref().unwrap();
        assert_eq!(recorded.trace, direct.trace);
        assert_eq!(recorded.best_chromosome, direct.best_chromosome);
    }

    #[test]
    fn test_failed_run_does_not_abort_batch() {
        // subset size 10 is fine for the 12-item instance, too large for the 8-item one
        let instances = [small("short", 8), small("long", 12)];
        let config = ExperimentConfig::default()
            .with_ga(quick().with_subset(SubsetPolicy::FirstK { size: 10 }))
            .with_seeds(vec![0, 1]);
        let mut records = Vec::new();
        let summary = Experiment::new(config).unwrap().run(&instances, &mut records);

        assert_eq!(summary, BatchSummary { completed: 2, failed: 2 });
        for record in &records[..2] {
            let err = record.outcome.as_ref().unwrap_err();
            assert_eq!(err.parameter(), Some("subset.size"));
        }
        for record in &records[2..] {
            assert_eq!(record.outcome.as_ref().unwrap().n_items, 10);
        }
    }

    #[test]
    fn test_invalid_instance_spec_yields_data_errors() {
        let good = InstanceSpec::from(small("good", 6));
        let bad = InstanceSpec {
            capacity: 5.0,
            items: vec![Item::new(0, -1.0, 2.0)],
            meta: Meta::from([
                ("name".to_string(), json!("bad")),
                ("n_items".to_string(), json!(1)),
            ]),
        };
        let config = ExperimentConfig::default()
            .with_ga(quick())
            .with_seeds(vec![4, 5]);
        let mut records = Vec::new();
        let summary = Experiment::new(config)
            .unwrap()
            .run_specs(&[bad, good], &mut records);

        assert_eq!(summary, BatchSummary { completed: 2, failed: 2 });
        assert!(records[0].outcome.as_ref().unwrap_err().is_data());
        assert_eq!(records[1].seed, 5);
        assert_eq!(records[1].instance_name.as_deref(), Some("bad"));
        assert_eq!(records[1].instance_meta["n_items"], 1);
        assert!(records[2].is_ok() && records[3].is_ok());
    }

    #[test]
    fn test_closure_sink() {
        let mut terminations = Vec::new();
        let config = ExperimentConfig::default()
            .with_ga(quick().with_early_stop(0, 0.0))
            .with_seeds(vec![1, 2]);
        Experiment::new(config).unwrap().run(
            &[small("a", 10)],
            &mut FnSink(|record: RunRecord| {
                terminations.push(record.outcome.map(|r| r.termination));
            }),
        );
        assert_eq!(
            terminations,
            vec![
                Ok(TerminationReason::MaxGenerations),
                Ok(TerminationReason::MaxGenerations)
            ]
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let instances = [small("a", 20), small("b", 25)];
        let config = ExperimentConfig::default()
            .with_ga(quick())
            .with_seeds(vec![1, 2, 3]);
        let experiment = Experiment::new(config).unwrap();

        let mut sequential = Vec::new();
        experiment.run(&instances, &mut sequential);
        let mut parallel = Vec::new();
        experiment.run_parallel(&instances, &mut parallel);

        assert_eq!(sequential.len(), parallel.len());
        for (s, p) in sequential.iter().zip(&parallel) {
            assert_eq!((s.instance_index, s.seed), (p.instance_index, p.seed));
            let (s, p) = (s.outcome.as_ref().unwrap(), p.outcome.as_ref().unwrap());
            assert_eq!(s.trace, p.trace);
            assert_eq!(s.best_chromosome, p.best_chromosome);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let config: ExperimentConfig = serde_json::from_str(
            r#"{"ga": {"population": 30, "pm": "1/n"}, "seeds": [1, 2], "runs": 2}"#,
        )
        .unwrap();
        assert_eq!(config.ga.population_size, 30);
        assert_eq!(config.resolved_seeds(), vec![1, 2]);
    }
}
