//! Items and instances.

use crate::error::{KnapsackError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Identifier of an item, unique within its instance.
pub type ItemId = u64;

/// Free-form instance metadata: any JSON value per key.
pub type Meta = BTreeMap<String, Value>;

/// A single item that may be packed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    /// Unique identifier within the instance.
    pub id: ItemId,
    /// Non-negative weight.
    pub weight: f64,
    /// Non-negative value.
    pub value: f64,
}

impl Item {
    /// Creates an item.
    pub fn new(id: ItemId, weight: f64, value: f64) -> Self {
        Self { id, weight, value }
    }

    /// Value per unit of weight, with the weight floored at `1e-12`.
    ///
    /// Zero-weight items therefore rank as the most efficient ones.
    pub fn ratio(&self) -> f64 {
        self.value / self.weight.max(1e-12)
    }
}

/// Unvalidated instance data, as it appears in instance files.
///
/// Convert with [`Instance::try_from`] (or [`Instance::new`]) to obtain a
/// validated [`Instance`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceSpec {
    /// Knapsack capacity.
    pub capacity: f64,
    /// Items in bit-position order.
    pub items: Vec<Item>,
    /// Opaque metadata.
    #[cfg_attr(feature = "serde", serde(default))]
    pub meta: Meta,
}

/// A validated 0/1 knapsack instance.
///
/// Item order defines chromosome bit positions. Capacity, weights and
/// values are kept exactly as given.
///
/// # Examples
///
/// ```
/// use knapsack_ga::model::{Instance, Item};
///
/// let instance = Instance::new(10.0, vec![
///     Item::new(1, 4.0, 5.0),
///     Item::new(2, 6.0, 4.0),
/// ])
/// .unwrap()
/// .with_meta("name", "tiny");
///
/// assert_eq!(instance.len(), 2);
/// assert_eq!(instance.name(), Some("tiny"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "InstanceSpec", into = "InstanceSpec")
)]
pub struct Instance {
    capacity: f64,
    items: Vec<Item>,
    meta: Meta,
}

impl Instance {
    /// Creates a validated instance.
    ///
    /// # Errors
    /// [`KnapsackError::Data`] if there are no items, the capacity is
    /// negative or not finite, an item weight or value is negative or not
    /// finite, or two items share an id.
    pub fn new(capacity: f64, items: Vec<Item>) -> Result<Self> {
        if items.is_empty() {
            return Err(KnapsackError::data("instance has no items"));
        }
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(KnapsackError::data(format!(
                "capacity must be a non-negative finite number, got {capacity}"
            )));
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !item.weight.is_finite() || item.weight < 0.0 {
                return Err(KnapsackError::data(format!(
                    "item {} has invalid weight {}",
                    item.id, item.weight
                )));
            }
            if !item.value.is_finite() || item.value < 0.0 {
                return Err(KnapsackError::data(format!(
                    "item {} has invalid value {}",
                    item.id, item.value
                )));
            }
            if !seen.insert(item.id) {
                return Err(KnapsackError::data(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
        }

        Ok(Self {
            capacity,
            items,
            meta: Meta::new(),
        })
    }

    /// Adds or replaces a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Knapsack capacity.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Items in bit-position order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of items (chromosome length).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false` for a validated instance.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Opaque metadata carried through unchanged.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// The `name` metadata entry, if present.
    pub fn name(&self) -> Option<&str> {
        self.meta.get("name").and_then(Value::as_str)
    }

    /// Sum of all item weights.
    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(|it| it.weight).sum()
    }

    /// Builds a reduced instance from already validated parts.
    pub(crate) fn from_parts(
        capacity: f64,
        items: Vec<Item>,
        meta: Meta,
    ) -> Self {
        Self {
            capacity,
            items,
            meta,
        }
    }
}

impl TryFrom<InstanceSpec> for Instance {
    type Error = KnapsackError;

    fn try_from(spec: InstanceSpec) -> Result<Self> {
        let mut instance = Instance::new(spec.capacity, spec.items)?;
        instance.meta = spec.meta;
        Ok(instance)
    }
}

impl From<Instance> for InstanceSpec {
    fn from(instance: Instance) -> Self {
        Self {
            capacity: instance.capacity,
            items: instance.items,
            meta: instance.meta,
        }
    }
}
