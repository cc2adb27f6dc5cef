//! Deterministic subset sampling of large instances.

use super::instance::{Instance, ItemId};
use crate::error::{KnapsackError, Result};
use crate::random::create_rng;
use rand::seq::SliceRandom;

/// How to reduce an instance before a run.
///
/// # Examples
///
/// ```
/// use knapsack_ga::model::{Instance, Item, SubsetPolicy};
///
/// let items = (0..5).map(|i| Item::new(i, 1.0, 1.0)).collect();
/// let instance = Instance::new(3.0, items).unwrap();
///
/// let view = SubsetPolicy::FirstK { size: 2 }.apply(&instance).unwrap();
/// assert_eq!(view.original_indices(), &[0, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum SubsetPolicy {
    /// Use every item.
    #[default]
    None,

    /// Shuffle item indices with a generator seeded by `seed`, keep the
    /// first `size`, and restore their original order.
    Random {
        /// Number of items to keep.
        size: usize,
        /// Seed of the sampling generator (independent of run seeds).
        seed: u64,
    },

    /// Keep the first `size` items in original order.
    FirstK {
        /// Number of items to keep.
        size: usize,
    },
}

impl SubsetPolicy {
    /// Short lowercase name, as used in instance metadata.
    pub fn mode_name(&self) -> &'static str {
        match self {
            SubsetPolicy::None => "none",
            SubsetPolicy::Random { .. } => "random",
            SubsetPolicy::FirstK { .. } => "first_k",
        }
    }

    /// Checks the requested size against an instance of `n_items`.
    pub fn validate(&self, n_items: usize) -> Result<()> {
        let size = match self {
            SubsetPolicy::None => return Ok(()),
            SubsetPolicy::Random { size, .. } | SubsetPolicy::FirstK { size } => *size,
        };
        if size == 0 {
            return Err(KnapsackError::config("subset.size", "must be at least 1"));
        }
        if size > n_items {
            return Err(KnapsackError::config(
                "subset.size",
                format!("{size} exceeds the instance item count {n_items}"),
            ));
        }
        Ok(())
    }

    /// Produces the view a run optimizes over.
    ///
    /// A size equal to the item count yields the identity view.
    ///
    /// # Errors
    /// [`KnapsackError::Configuration`] if `size` is 0 or larger than the
    /// item count.
    pub fn apply(&self, instance: &Instance) -> Result<SubsetView> {
        let n = instance.len();
        self.validate(n)?;

        let picked: Vec<usize> = match *self {
            SubsetPolicy::None => return Ok(SubsetView::identity(instance)),
            SubsetPolicy::FirstK { size } if size == n => {
                return Ok(SubsetView::identity(instance))
            }
            SubsetPolicy::Random { size, .. } if size == n => {
                return Ok(SubsetView::identity(instance))
            }
            SubsetPolicy::FirstK { size } => (0..size).collect(),
            SubsetPolicy::Random { size, seed } => {
                let mut rng = create_rng(seed);
                let mut indices: Vec<usize> = (0..n).collect();
                indices.shuffle(&mut rng);
                indices.truncate(size);
                indices.sort_unstable();
                indices
            }
        };

        let items = picked.iter().map(|&i| instance.items()[i]).collect();
        let mut meta = instance.meta().clone();
        meta.insert("subset_applied".into(), true.into());
        meta.insert("subset_mode".into(), self.mode_name().into());
        meta.insert("subset_size".into(), picked.len().into());

        Ok(SubsetView {
            instance: Instance::from_parts(instance.capacity(), items, meta),
            original_indices: picked,
        })
    }
}

/// The instance a run actually optimizes over, plus the map back to the
/// instance it was sampled from.
#[derive(Debug, Clone)]
pub struct SubsetView {
    instance: Instance,
    original_indices: Vec<usize>,
}

impl SubsetView {
    /// A view over every item of `instance`.
    pub fn identity(instance: &Instance) -> Self {
        Self {
            instance: instance.clone(),
            original_indices: (0..instance.len()).collect(),
        }
    }

    /// The (possibly reduced) instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// `original_indices()[pos]` is the original index of bit position `pos`.
    pub fn original_indices(&self) -> &[usize] {
        &self.original_indices
    }

    /// Original index of bit position `pos`.
    pub fn original_index(&self, pos: usize) -> Option<usize> {
        self.original_indices.get(pos).copied()
    }

    /// Whether the view keeps every item.
    pub fn is_identity(&self) -> bool {
        self.original_indices
            .iter()
            .enumerate()
            .all(|(pos, &orig)| pos == orig)
    }

    /// Ids of the items selected by `bits`, in bit-position order.
    pub fn selected_ids(&self, bits: &[bool]) -> Vec<ItemId> {
        bits.iter()
            .zip(self.instance.items())
            .filter(|(bit, _)| **bit)
            .map(|(_, item)| item.id)
            .collect()
    }
}
