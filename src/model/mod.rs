//! Knapsack problem model.
//!
//! - [`Item`] and [`Instance`]: the immutable, validated item set and capacity
//! - [`SubsetPolicy`] and [`SubsetView`]: deterministic reduction of a large
//!   instance to a smaller item set, keeping the map back to original indices

mod instance;
mod subset;

pub use instance::{Instance, InstanceSpec, Item, ItemId, Meta};
pub use subset::{SubsetPolicy, SubsetView};
