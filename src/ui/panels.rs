use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::data::format::thousands;
use crate::data::query::option_entries;
use crate::state::AppState;
use crate::view::ColorBy;

// ---------------------------------------------------------------------------
// Left side panel – selectors
// ---------------------------------------------------------------------------

/// Render the left selector panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Vehicle Explorer");
    ui.separator();

    // ---- Model selector ----
    ui.strong("Select a model");
    let current = state.selection.selected_model.clone();
    let mut picked: Option<String> = None;
    egui::ComboBox::from_id_salt("model")
        .selected_text(&current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for count in &state.model_counts {
                if ui
                    .selectable_label(count.model == current, count.display_label())
                    .clicked()
                {
                    picked = Some(count.model.clone());
                }
            }
        });
    if let Some(model) = picked {
        state.select_model(&model);
    }
    ui.separator();

    // ---- Sub-model checklist ----
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Select sub-models");
        let toggle_label = if state.sub_models().is_cleared() {
            "Select all"
        } else {
            "Clear"
        };
        if ui.small_button(toggle_label).clicked() {
            state.clear_toggle();
        }
    });

    let entries = option_entries(&state.view.options);
    let mut flipped: Option<String> = None;
    ScrollArea::vertical()
        .id_salt("sub_models")
        .max_height(ui.available_height() * 0.6)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            for entry in &entries {
                let mut checked = state.is_sub_model_selected(&entry.value);
                if ui.checkbox(&mut checked, &entry.label).changed() {
                    flipped = Some(entry.value.clone());
                }
            }
        });
    if let Some(value) = flipped {
        state.toggle_sub_model(&value);
    }
    ui.separator();

    // ---- Colour-by selector ----
    ui.strong("Color by");
    let mut color_by = state.color_by;
    ui.horizontal(|ui: &mut Ui| {
        for option in ColorBy::ALL {
            ui.radio_value(&mut color_by, option, option.label());
        }
    });
    state.set_color_by(color_by);

    // ---- Legend (click to hide a group) ----
    ui.add_space(4.0);
    let mut switched: Option<String> = None;
    for (label, color) in state.color_map.legend_entries() {
        let text = if label.is_empty() { "(none)" } else { label.as_str() };
        let mut text = RichText::new(text).color(*color);
        if state.hidden_groups.contains(label) {
            text = text.strikethrough().weak();
        }
        if ui.selectable_label(false, text).clicked() {
            switched = Some(label.clone());
        }
    }
    if let Some(label) = switched {
        state.toggle_group(&label);
    }

    if let Some(updated) = state.latest_update {
        ui.separator();
        ui.weak(format!("Updated {updated}"));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the summary strip above the plot.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!(
            "{} listings loaded, {} plotted",
            thousands(state.listings.len()),
            thousands(state.view.points.len())
        ));
        ui.separator();
        if state.sub_models().is_all() {
            ui.label("all sub-models");
        } else if state.sub_models().is_cleared() {
            ui.label("no sub-model picked, showing all");
        } else {
            ui.label("filtered by sub-model");
        }
    });
}

// ---------------------------------------------------------------------------
// Bottom panel – clicked listing
// ---------------------------------------------------------------------------

/// Render details of the last clicked listing.
pub fn details_panel(ui: &mut Ui, state: &AppState) {
    let Some(point) = &state.clicked else {
        ui.weak("Click a point to open its listing.");
        return;
    };
    egui::Grid::new("clicked_listing")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.strong("Listing");
            ui.hyperlink_to(&point.id, &point.link);
            ui.end_row();

            ui.strong("Price");
            ui.label(format!("{:.0}", point.price));
            ui.end_row();

            ui.strong("Kilometers");
            ui.label(format!("{:.0}", point.kilometers));
            ui.end_row();

            ui.strong("Details");
            ui.label(&point.hover);
            ui.end_row();
        });
}
