use rand::Rng;

use crate::data::aggregate::{ModelCount, default_selection};
use crate::data::query::{SubModelFilter, SubModelSelection};

/// A user interaction that may change what is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    ModelChanged(String),
    SubModelsChanged(SubModelSelection),
    /// Consume a pending click of the clear / select-all button.
    ClearToggled,
}

/// Session memory carried from one interaction to the next.
///
/// Transitions take the state by value and hand back the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_model: String,
    pub sub_models: SubModelSelection,
    /// Pending clear / select-all clicks. Zero once consumed.
    pub toggle_counter: u32,
}

impl SelectionState {
    pub fn new(model: impl Into<String>) -> Self {
        SelectionState {
            selected_model: model.into(),
            sub_models: SubModelSelection::All,
            toggle_counter: 0,
        }
    }

    /// Startup state: a random pick among the `pool_size` most frequent models.
    pub fn initial<R: Rng + ?Sized>(counts: &[ModelCount], pool_size: usize, rng: &mut R) -> Self {
        let model = default_selection(counts, pool_size, rng)
            .map(|c| c.model.clone())
            .unwrap_or_default();
        SelectionState::new(model)
    }

    /// Record one click of the clear / select-all button.
    pub fn request_clear_toggle(mut self) -> Self {
        self.toggle_counter = self.toggle_counter.saturating_add(1);
        self
    }

    pub fn apply(mut self, event: SelectionEvent) -> Self {
        match event {
            SelectionEvent::ModelChanged(model) => {
                if model != self.selected_model {
                    self.selected_model = model;
                    self.sub_models = SubModelSelection::All;
                }
            }
            SelectionEvent::SubModelsChanged(selection) => {
                if selection.is_cleared() {
                    self.sub_models = SubModelSelection::All;
                } else if selection != self.sub_models {
                    self.sub_models = selection;
                }
            }
            SelectionEvent::ClearToggled => {
                if self.toggle_counter == 0 {
                    return self;
                }
                self.sub_models = if self.sub_models.is_cleared() {
                    SubModelSelection::All
                } else {
                    SubModelSelection::cleared()
                };
                self.toggle_counter = 0;
            }
        }
        self
    }

    /// Adopt the selection the query engine actually applied.
    pub fn reconcile(mut self, filter: &SubModelFilter) -> Self {
        if filter.fell_back(&self.sub_models) {
            log::warn!(
                "Sub-model selection {:?} matched nothing for {}; showing all",
                self.sub_models,
                self.selected_model
            );
            self.sub_models = filter.selection.clone();
        }
        self
    }
}
