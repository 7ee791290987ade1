use eframe::egui::{Color32, Pos2, Ui};
use egui_plot::{MarkerShape, Plot, PlotPoint, PlotPoints, Points};

use crate::state::AppState;
use crate::view::ScatterPoint;

/// Pointer distance (in screen points) within which a marker counts as hit.
const PICK_RADIUS: f32 = 8.0;
const MARKER_RADIUS: f32 = 4.0;

// ---------------------------------------------------------------------------
// Listing scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Render price vs. kilometers for the current view and handle point clicks.
pub fn listing_plot(ui: &mut Ui, state: &mut AppState) {
    ui.heading(&state.view.title);

    if state.view.points.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No listings to show for this selection.");
        });
        return;
    }

    let points = &state.view.points;
    let color_map = &state.color_map;
    let hidden = &state.hidden_groups;
    let highlighted = state
        .clicked
        .as_ref()
        .filter(|c| points.iter().any(|p| p.id == c.id))
        .map(|c| [c.price, c.kilometers]);

    // Groups are shown and hidden from the sidebar legend, so the plot keeps
    // no legend of its own.
    let response = Plot::new("listing_plot")
        .x_axis_label("price")
        .y_axis_label("kilometers")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (group, (label, color)) in color_map.legend_entries().iter().enumerate() {
                if hidden.contains(label) {
                    continue;
                }
                let series: PlotPoints = points
                    .iter()
                    .filter(|p| color_map.group_of(p) == Some(group))
                    .map(|p| [p.price, p.kilometers])
                    .collect();
                let name = if label.is_empty() { "(none)" } else { label.as_str() };

                plot_ui.points(
                    Points::new(series)
                        .name(name)
                        .color(*color)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(MARKER_RADIUS),
                );
            }
            if let Some(at) = highlighted {
                plot_ui.points(
                    Points::new(vec![at])
                        .shape(MarkerShape::Circle)
                        .filled(false)
                        .radius(MARKER_RADIUS * 2.0)
                        .color(Color32::DARK_GRAY),
                );
            }
        });

    let hovered = response
        .response
        .hover_pos()
        .and_then(|pos| {
            nearest_point(
                points,
                |p| state.is_point_visible(p),
                |p| {
                    response
                        .transform
                        .position_from_point(&PlotPoint::new(p.price, p.kilometers))
                },
                pos,
            )
        });

    let clicked = if response.response.clicked() {
        hovered
    } else {
        None
    };

    if let Some(index) = hovered {
        let point = &points[index];
        let text = format!("{}\n{:.0} / {:.0} km", point.hover, point.price, point.kilometers);
        response.response.on_hover_text_at_pointer(text);
    }

    if let Some(index) = clicked {
        state.click_point(index);
    }
}

/// Index of the visible point closest to `pointer`, if any lies within
/// [`PICK_RADIUS`]. Points in hidden legend groups are never hit.
fn nearest_point(
    points: &[ScatterPoint],
    is_visible: impl Fn(&ScatterPoint) -> bool,
    to_screen: impl Fn(&ScatterPoint) -> Pos2,
    pointer: Pos2,
) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| is_visible(p))
        .map(|(i, p)| (i, to_screen(p).distance(pointer)))
        .filter(|(_, distance)| *distance <= PICK_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
