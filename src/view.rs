use std::cmp::Reverse;

use crate::data::model::Listing;
use crate::data::query::{SubModelOption, filter_by_model, filter_by_sub_models, sub_model_options};
use crate::selection::SelectionState;

/// Info text longer than this many characters is cut and marked with `...`.
const INFO_TEXT_LIMIT: usize = 200;
/// A line break goes after every this many words of info text.
const INFO_TEXT_WORDS_PER_LINE: usize = 15;

/// Which attribute picks a point's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorBy {
    #[default]
    Year,
    SubModel,
}

impl ColorBy {
    pub const ALL: [ColorBy; 2] = [ColorBy::Year, ColorBy::SubModel];

    pub fn label(self) -> &'static str {
        match self {
            ColorBy::Year => "year",
            ColorBy::SubModel => "sub_model",
        }
    }
}

/// `https://<host>/item/<id>`
pub fn listing_url(host: &str, id: &str) -> String {
    format!("https://{host}/item/{id}")
}

/// Truncate long info text and break it into lines of a few words each.
pub fn wrap_info_text(text: &str) -> String {
    let mut clipped: String = text.chars().take(INFO_TEXT_LIMIT).collect();
    if text.chars().count() > INFO_TEXT_LIMIT {
        clipped.push_str("...");
    }
    let mut out = String::with_capacity(clipped.len());
    for (i, word) in clipped.split_whitespace().enumerate() {
        if i > 0 {
            let sep = if i % INFO_TEXT_WORDS_PER_LINE == 0 { '\n' } else { ' ' };
            out.push(sep);
        }
        out.push_str(word);
    }
    out
}

/// One plotted listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub id: String,
    pub price: f64,
    pub kilometers: f64,
    pub year: Option<i32>,
    pub sub_model: Option<String>,
    pub hover: String,
    pub link: String,
}

impl ScatterPoint {
    /// `None` for rows without a price or mileage; those cannot be placed.
    pub fn from_listing(listing: &Listing, host: &str) -> Option<Self> {
        let price = listing.price?;
        let kilometers = listing.kilometers?;

        let year = listing.year.map(|y| y.to_string()).unwrap_or_default();
        let merchant = if listing.merchant { "(merchant)" } else { "" };
        let sub_model = listing.sub_model.as_deref().unwrap_or("");
        let mut hover = [year.as_str(), merchant, sub_model]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(info) = listing.info_text.as_deref() {
            let wrapped = wrap_info_text(info);
            if !wrapped.is_empty() {
                hover.push('\n');
                hover.push_str(&wrapped);
            }
        }

        Some(ScatterPoint {
            id: listing.id.clone(),
            price,
            kilometers,
            year: listing.year,
            sub_model: listing.sub_model.clone(),
            hover,
            link: listing_url(host, &listing.id),
        })
    }

    /// Legend group of this point under `color_by`.
    pub fn color_key(&self, color_by: ColorBy) -> String {
        match color_by {
            ColorBy::Year => self.year.map(|y| y.to_string()).unwrap_or_default(),
            ColorBy::SubModel => self.sub_model.clone().unwrap_or_default(),
        }
    }
}

/// Everything the presentation layer needs after one interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub title: String,
    pub options: Vec<SubModelOption>,
    /// Newest year first.
    pub points: Vec<ScatterPoint>,
}

impl DashboardView {
    /// Re-run the queries for `selection` and reconcile it with what is shown.
    pub fn refresh(
        listings: &[Listing],
        selection: SelectionState,
        host: &str,
    ) -> (SelectionState, DashboardView) {
        let model_rows = filter_by_model(listings, &selection.selected_model);
        let options = sub_model_options(&model_rows);
        let filtered = filter_by_sub_models(&model_rows, &selection.sub_models);
        let selection = selection.reconcile(&filtered);

        let mut rows = filtered.rows;
        rows.sort_by_key(|row| Reverse(row.year));

        let title = match rows.first() {
            Some(row) => format!("{}, {}", row.manufacturer, selection.selected_model),
            None => selection.selected_model.clone(),
        };
        let points: Vec<ScatterPoint> = rows
            .iter()
            .filter_map(|row| ScatterPoint::from_listing(row, host))
            .collect();

        log::debug!(
            "model={} sub_models={:?} rows={}",
            selection.selected_model,
            selection.sub_models,
            points.len()
        );

        (
            selection,
            DashboardView {
                title,
                options,
                points,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::query::SubModelSelection;
    use crate::selection::SelectionEvent;

    fn listing(id: &str, sub_model: &str, year: i32) -> Listing {
        Listing {
            id: id.into(),
            manufacturer: "Kia".into(),
            model: "Rio".into(),
            sub_model: Some(sub_model.into()),
            year: Some(year),
            price: Some(40_000.0),
            kilometers: Some(80_000.0),
            merchant: false,
            info_text: None,
            date_updated: None,
        }
    }

    #[test]
    fn info_text_is_clipped_and_wrapped() {
        let words: Vec<String> = (0..20).map(|i| format!("w{i}")).collect();
        let wrapped = wrap_info_text(&words.join(" "));
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(' ').count(), 15);

        let long = "א".repeat(250);
        let clipped = wrap_info_text(&long);
        assert_eq!(clipped.chars().count(), INFO_TEXT_LIMIT + 3);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn hover_marks_merchants_and_skips_missing_info() {
        let mut row = listing("9", "LX", 2019);
        row.merchant = true;
        let point = ScatterPoint::from_listing(&row, "cars.example").unwrap();
        assert_eq!(point.hover, "2019 (merchant) LX");
        assert_eq!(point.link, "https://cars.example/item/9");

        row.merchant = false;
        row.info_text = Some("  one owner  ".into());
        let point = ScatterPoint::from_listing(&row, "cars.example").unwrap();
        assert_eq!(point.hover, "2019 LX\none owner");
    }

    #[test]
    fn refresh_orders_points_by_year_and_titles_with_manufacturer() {
        let rows = vec![
            listing("1", "LX", 2015),
            listing("2", "EX", 2021),
            listing("3", "LX", 2018),
        ];
        let (_, view) = DashboardView::refresh(&rows, SelectionState::new("Rio"), "h");
        assert_eq!(view.title, "Kia, Rio");
        let years: Vec<_> = view.points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![Some(2021), Some(2018), Some(2015)]);
        assert_eq!(view.options[0].value, "EX");
    }

    #[test]
    fn refresh_resets_stale_selection() {
        let rows = vec![listing("1", "LX", 2015)];
        let selection = SelectionState::new("Rio")
            .apply(SelectionEvent::SubModelsChanged(SubModelSelection::only(["GT"])));
        let (selection, view) = DashboardView::refresh(&rows, selection, "h");
        assert_eq!(selection.sub_models, SubModelSelection::All);
        assert_eq!(view.points.len(), 1);
    }

    #[test]
    fn refresh_for_unknown_model_is_empty() {
        let rows = vec![listing("1", "LX", 2015)];
        let (_, view) = DashboardView::refresh(&rows, SelectionState::new("Nope"), "h");
        assert!(view.points.is_empty());
        assert!(view.options.is_empty());
        assert_eq!(view.title, "Nope");
    }

    #[test]
    fn color_keys_follow_dimension() {
        let point = ScatterPoint::from_listing(&listing("1", "LX", 2015), "h").unwrap();
        assert_eq!(point.color_key(ColorBy::Year), "2015");
        assert_eq!(point.color_key(ColorBy::SubModel), "LX");
    }
}
