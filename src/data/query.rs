use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use super::format::thousands;
use super::model::Listing;

// ---------------------------------------------------------------------------
// Plotting window
// ---------------------------------------------------------------------------

// Fixed policy bounds for plottable listings. All three are exclusive.
pub const MAX_KILOMETERS: f64 = 500_000.0;
pub const MIN_PRICE: f64 = 1_000.0;
pub const MAX_PRICE: f64 = 3_000_000.0;

/// Value of the synthetic leading option that stands for "every sub-model".
pub const ALL: &str = "ALL";

/// Owned rows handed to callers, free to be reordered or annotated.
pub type RowSet = Vec<Listing>;

/// Whether a listing's price and mileage fall inside the plotting window.
pub fn within_plot_bounds(listing: &Listing) -> bool {
    let km_ok = listing.kilometers.is_some_and(|km| km < MAX_KILOMETERS);
    let price_ok = listing
        .price
        .is_some_and(|price| MIN_PRICE < price && price < MAX_PRICE);
    km_ok && price_ok
}

/// Rows of `model` inside the plotting window. Unknown models give an empty set.
pub fn filter_by_model(listings: &[Listing], model: &str) -> RowSet {
    listings
        .iter()
        .filter(|l| l.model == model && within_plot_bounds(l))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Sub-model options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubModelOption {
    pub value: String,
    pub display_label: String,
    pub max_year: Option<i32>,
    pub count: usize,
}

/// One entry of the sub-model control, including the leading [`ALL`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub label: String,
    pub value: String,
}

/// Group rows by sub-model, newest and most common first.
///
/// Rows without a sub-model are left out. Groups tied on both year and count
/// are ordered by name.
pub fn sub_model_options(rows: &[Listing]) -> Vec<SubModelOption> {
    let mut groups: HashMap<&str, (Option<i32>, usize)> = HashMap::new();
    for row in rows {
        let Some(sub_model) = row.sub_model.as_deref() else {
            continue;
        };
        let (max_year, count) = groups.entry(sub_model).or_insert((None, 0));
        *max_year = (*max_year).max(row.year);
        *count += 1;
    }

    let mut options: Vec<SubModelOption> = groups
        .into_iter()
        .map(|(value, (max_year, count))| SubModelOption {
            value: value.to_string(),
            display_label: format!("{value}  ~{}", thousands(count)),
            max_year,
            count,
        })
        .collect();
    options.sort_by(|a, b| {
        (Reverse(a.max_year), Reverse(a.count), &a.value)
            .cmp(&(Reverse(b.max_year), Reverse(b.count), &b.value))
    });
    options
}

/// Entries for the sub-model control: [`ALL`] first, then `options` in order.
pub fn option_entries(options: &[SubModelOption]) -> Vec<OptionEntry> {
    std::iter::once(OptionEntry {
        label: "All".to_string(),
        value: ALL.to_string(),
    })
    .chain(options.iter().map(|o| OptionEntry {
        label: o.display_label.clone(),
        value: o.value.clone(),
    }))
    .collect()
}

// ---------------------------------------------------------------------------
// Sub-model selection
// ---------------------------------------------------------------------------

/// Which sub-models are shown.
///
/// `Only` with an empty set is the cleared state: nothing is ticked, and the
/// plot falls back to every row until something is picked again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubModelSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl SubModelSelection {
    #[cfg(test)]
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SubModelSelection::Only(values.into_iter().map(Into::into).collect())
    }

    pub fn cleared() -> Self {
        SubModelSelection::Only(BTreeSet::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SubModelSelection::All)
    }

    /// True when nothing at all is selected.
    pub fn is_cleared(&self) -> bool {
        matches!(self, SubModelSelection::Only(set) if set.is_empty())
    }

    /// Whether `value` is shown. [`ALL`] is contained only in `All`.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            SubModelSelection::All => true,
            SubModelSelection::Only(_) if value == ALL => false,
            SubModelSelection::Only(set) => set.contains(value),
        }
    }

    /// The selection after the user flips one entry of the control.
    ///
    /// Unticking a single sub-model while `All` is active keeps every other
    /// available one ticked.
    pub fn toggled(&self, value: &str, available: &[SubModelOption]) -> SubModelSelection {
        if value == ALL {
            return match self {
                SubModelSelection::All => SubModelSelection::cleared(),
                SubModelSelection::Only(_) => SubModelSelection::All,
            };
        }
        let mut set: BTreeSet<String> = match self {
            SubModelSelection::All => available.iter().map(|o| o.value.clone()).collect(),
            SubModelSelection::Only(set) => set.clone(),
        };
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        SubModelSelection::Only(set)
    }
}

/// Outcome of [`filter_by_sub_models`]: the rows to plot and the selection
/// that matches what is plotted.
#[derive(Debug, Clone, PartialEq)]
pub struct SubModelFilter {
    pub rows: RowSet,
    pub selection: SubModelSelection,
}

impl SubModelFilter {
    /// Whether the requested selection matched nothing and was replaced.
    pub fn fell_back(&self, requested: &SubModelSelection) -> bool {
        self.selection != *requested
    }
}

/// Keep the rows whose sub-model is selected.
///
/// A non-empty selection that matches no row is stale: the full `rows` are
/// returned and the selection resets to `All`. The cleared selection also
/// shows every row but is kept as is.
pub fn filter_by_sub_models(rows: &[Listing], selection: &SubModelSelection) -> SubModelFilter {
    let set = match selection {
        SubModelSelection::All => {
            return SubModelFilter {
                rows: rows.to_vec(),
                selection: SubModelSelection::All,
            };
        }
        SubModelSelection::Only(set) if set.is_empty() => {
            return SubModelFilter {
                rows: rows.to_vec(),
                selection: selection.clone(),
            };
        }
        SubModelSelection::Only(set) => set,
    };

    let filtered: RowSet = rows
        .iter()
        .filter(|row| row.sub_model.as_ref().is_some_and(|s| set.contains(s)))
        .cloned()
        .collect();

    if filtered.is_empty() {
        SubModelFilter {
            rows: rows.to_vec(),
            selection: SubModelSelection::All,
        }
    } else {
        SubModelFilter {
            rows: filtered,
            selection: selection.clone(),
        }
    }
}
