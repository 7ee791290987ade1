use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as read from a snapshot file, before it is
/// coerced into the typed [`Listing`] fields.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // Whole floats print without a fractional part so that a numeric
            // model code such as `320.0` normalizes to "320".
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.0}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Timestamp(t) => write!(f, "{t}"),
            CellValue::Null => Ok(()),
        }
    }
}

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

impl CellValue {
    /// Coerce any cell into text. `Null` becomes the empty string.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Like [`CellValue::to_text`] but maps `Null` and blank text to `None`.
    pub fn to_text_opt(&self) -> Option<String> {
        let text = self.to_text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_f64()
            .filter(|v| *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
            .map(|v| v as i32)
    }

    /// Truthiness for flag columns. Anything unrecognised counts as `false`.
    pub fn as_bool(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Integer(i) => *i != 0,
            CellValue::Float(v) => *v != 0.0 && !v.is_nan(),
            CellValue::String(s) => matches!(s.trim(), "true" | "True" | "TRUE" | "1"),
            _ => false,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Timestamp(t) => Some(*t),
            CellValue::String(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// One raw row: column name → cell.
pub type Record = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Listing – one vehicle-for-sale record
// ---------------------------------------------------------------------------

/// Columns a snapshot must carry. Everything else is optional.
pub const REQUIRED_COLUMNS: [&str; 5] = ["id", "manufacturer", "model", "price", "kilometers"];

/// A single vehicle listing (one row of the snapshot).
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: String,
    pub manufacturer: String,
    /// Empty when the source cell was null.
    pub model: String,
    pub sub_model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub kilometers: Option<f64>,
    pub merchant: bool,
    pub info_text: Option<String>,
    pub date_updated: Option<NaiveDateTime>,
}

impl Listing {
    /// Build a listing from a raw row, coercing every cell to its field type.
    /// Malformed or missing cells degrade to `None` / empty values.
    pub fn from_record(record: &Record) -> Self {
        let cell = |key: &str| record.get(key).unwrap_or(&CellValue::Null);
        Listing {
            id: cell("id").to_text(),
            manufacturer: cell("manufacturer").to_text(),
            model: cell("model").to_text(),
            sub_model: cell("sub_model").to_text_opt(),
            year: cell("year").as_i32(),
            price: cell("price").as_f64(),
            kilometers: cell("kilometers").as_f64(),
            merchant: cell("merchant").as_bool(),
            info_text: cell("info_text").to_text_opt(),
            date_updated: cell("date_updated").as_datetime(),
        }
    }
}

// ---------------------------------------------------------------------------
// ListingSet – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full, read-only set of listings loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct ListingSet {
    listings: Vec<Listing>,
}

impl ListingSet {
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        ListingSet { listings }
    }

    pub fn as_slice(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Most recent `date_updated` across all listings.
    pub fn latest_update(&self) -> Option<NaiveDateTime> {
        self.listings.iter().filter_map(|l| l.date_updated).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, CellValue)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn numeric_model_codes_normalize_to_text() {
        let listing = Listing::from_record(&record(&[
            ("id", CellValue::Integer(17)),
            ("manufacturer", CellValue::String("BMW".into())),
            ("model", CellValue::Float(320.0)),
            ("price", CellValue::Integer(50_000)),
        ]));
        assert_eq!(listing.id, "17");
        assert_eq!(listing.model, "320");
        assert_eq!(listing.price, Some(50_000.0));
        assert_eq!(listing.kilometers, None);
    }

    #[test]
    fn null_cells_degrade_instead_of_failing() {
        let listing = Listing::from_record(&record(&[
            ("model", CellValue::Null),
            ("sub_model", CellValue::String("   ".into())),
            ("info_text", CellValue::Null),
            ("price", CellValue::String("n/a".into())),
            ("merchant", CellValue::Null),
        ]));
        assert_eq!(listing.model, "");
        assert_eq!(listing.sub_model, None);
        assert_eq!(listing.info_text, None);
        assert_eq!(listing.price, None);
        assert!(!listing.merchant);
    }

    #[test]
    fn dates_parse_from_common_text_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        for text in ["2024-03-01T12:30:00", "2024-03-01 12:30:00.000"] {
            assert_eq!(
                CellValue::String(text.into()).as_datetime(),
                Some(expected),
                "{text}"
            );
        }
        assert_eq!(
            CellValue::String("2024-03-01".into()).as_datetime(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn latest_update_ignores_missing_dates() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0);
        let mut a = Listing::from_record(&Record::new());
        a.date_updated = day(3);
        let mut b = a.clone();
        b.date_updated = day(9);
        let mut c = a.clone();
        c.date_updated = None;
        let set = ListingSet::from_listings(vec![a, b, c]);
        assert_eq!(set.latest_update(), day(9));
    }

    #[test]
    fn empty_set_reports_empty() {
        let set = ListingSet::default();
        assert!(set.is_empty());
        assert_eq!(set.latest_update(), None);
        let one = ListingSet::from_listings(vec![Listing::from_record(&Record::new())]);
        assert!(!one.is_empty());
    }
}
