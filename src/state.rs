use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::color::ColorMap;
use crate::data::aggregate::ModelCount;
use crate::data::model::ListingSet;
use crate::data::query::SubModelSelection;
use crate::selection::{SelectionEvent, SelectionState};
use crate::view::{ColorBy, DashboardView, ScatterPoint};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded once at startup, read-only afterwards.
    pub listings: ListingSet,

    /// (manufacturer, model) counts for the model dropdown.
    pub model_counts: Vec<ModelCount>,

    pub selection: SelectionState,

    /// Cached result of the last recomputation.
    pub view: DashboardView,

    pub color_by: ColorBy,

    /// Colours for the current points under `color_by`.
    pub color_map: ColorMap,

    /// Legend groups the user switched off; their points are neither drawn
    /// nor clickable.
    pub hidden_groups: BTreeSet<String>,

    /// Most recent `date_updated` in the dataset.
    pub latest_update: Option<NaiveDateTime>,

    /// Last listing the user clicked.
    pub clicked: Option<ScatterPoint>,

    listing_host: String,
}

impl AppState {
    pub fn new(
        listings: ListingSet,
        model_counts: Vec<ModelCount>,
        selection: SelectionState,
        listing_host: String,
    ) -> Self {
        let latest_update = listings.latest_update();
        let color_by = ColorBy::default();
        let mut state = Self {
            listings,
            model_counts,
            selection,
            view: DashboardView::default(),
            color_by,
            color_map: ColorMap::new(color_by, &[]),
            hidden_groups: BTreeSet::new(),
            latest_update,
            clicked: None,
            listing_host,
        };
        state.refresh();
        state
    }

    /// Recompute rows, options and colours for the current selection.
    pub fn refresh(&mut self) {
        let (selection, view) = DashboardView::refresh(
            self.listings.as_slice(),
            self.selection.clone(),
            &self.listing_host,
        );
        self.selection = selection;
        self.view = view;
        self.rebuild_color_map();
    }

    fn dispatch(&mut self, event: SelectionEvent) {
        let next = self.selection.clone().apply(event);
        if next != self.selection {
            self.selection = next;
            self.refresh();
        }
    }

    pub fn rebuild_color_map(&mut self) {
        self.color_map = ColorMap::new(self.color_by, &self.view.points);
        let present = self.color_map.legend_entries();
        self.hidden_groups
            .retain(|hidden| present.iter().any(|(label, _)| label == hidden));
    }

    /// Show or hide one legend group.
    pub fn toggle_group(&mut self, label: &str) {
        if !self.hidden_groups.remove(label) {
            self.hidden_groups.insert(label.to_string());
        }
    }

    pub fn is_point_visible(&self, point: &ScatterPoint) -> bool {
        !self.hidden_groups.contains(&point.color_key(self.color_by))
    }

    pub fn select_model(&mut self, model: &str) {
        self.dispatch(SelectionEvent::ModelChanged(model.to_string()));
    }

    /// Flip one entry of the sub-model control.
    pub fn toggle_sub_model(&mut self, value: &str) {
        let next = self.selection.sub_models.toggled(value, &self.view.options);
        self.dispatch(SelectionEvent::SubModelsChanged(next));
    }

    /// One click of the clear / select-all button.
    pub fn clear_toggle(&mut self) {
        self.selection = self.selection.clone().request_clear_toggle();
        self.dispatch(SelectionEvent::ClearToggled);
    }

    pub fn set_color_by(&mut self, color_by: ColorBy) {
        if self.color_by != color_by {
            self.color_by = color_by;
            self.rebuild_color_map();
        }
    }

    /// Open the clicked listing in the browser and remember it.
    pub fn click_point(&mut self, index: usize) {
        let Some(point) = self.view.points.get(index).cloned() else {
            return;
        };
        log::info!("Opening listing {}", point.link);
        if let Err(e) = open::that(&point.link) {
            log::warn!("Failed to open {}: {e}", point.link);
        }
        self.clicked = Some(point);
    }

    pub fn is_sub_model_selected(&self, value: &str) -> bool {
        self.selection.sub_models.contains(value)
    }

    pub fn sub_models(&self) -> &SubModelSelection {
        &self.selection.sub_models
    }
}
