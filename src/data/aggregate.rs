use std::collections::HashMap;
use std::collections::hash_map::Entry;

use rand::Rng;
use rand::seq::IndexedRandom;

use super::format::thousands;
use super::model::Listing;

/// How many of the most frequent models the startup pick is drawn from.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Number of listings per (manufacturer, model) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCount {
    pub manufacturer: String,
    pub model: String,
    pub count: usize,
}

impl ModelCount {
    /// Dropdown label, e.g. `"Kia - Picanto, ~1,204"`.
    pub fn display_label(&self) -> String {
        format!(
            "{} - {}, ~{}",
            self.manufacturer,
            self.model,
            thousands(self.count)
        )
    }
}

/// Count listings per (manufacturer, model), most frequent first.
///
/// Listings without a model are skipped. Equal counts keep the order in
/// which their group was first seen.
pub fn model_counts(listings: &[Listing]) -> Vec<ModelCount> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut counts: Vec<ModelCount> = Vec::new();

    for listing in listings {
        if listing.model.is_empty() {
            continue;
        }
        match index.entry((listing.manufacturer.as_str(), listing.model.as_str())) {
            Entry::Occupied(slot) => counts[*slot.get()].count += 1,
            Entry::Vacant(slot) => {
                slot.insert(counts.len());
                counts.push(ModelCount {
                    manufacturer: listing.manufacturer.clone(),
                    model: listing.model.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Pick a model uniformly at random among the `pool_size` most frequent ones.
pub fn default_selection<'a, R: Rng + ?Sized>(
    counts: &'a [ModelCount],
    pool_size: usize,
    rng: &mut R,
) -> Option<&'a ModelCount> {
    let pool = &counts[..counts.len().min(pool_size.max(1))];
    pool.choose(rng)
}
