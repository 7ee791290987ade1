use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray, TimestampNanosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// (manufacturer, model, sub-models, base price when new)
const CATALOGUE: &[(&str, &str, &[&str], f64)] = &[
    ("Kia", "Picanto", &["LX", "EX", "GT-Line"], 75_000.0),
    ("Kia", "Sportage", &["Urban", "Premium", "GT-Line"], 160_000.0),
    ("Hyundai", "i10", &["Inspire", "Prime"], 70_000.0),
    ("Hyundai", "Tucson", &["Luxury", "Panoramic", "Hybrid"], 170_000.0),
    ("Toyota", "Corolla", &["Sun", "GLI", "Hybrid Club", "Executive"], 130_000.0),
    ("Mazda", "3", &["Comfort", "Pure", "Spirit"], 125_000.0),
    ("Skoda", "Octavia", &["Ambition", "Style", "RS"], 140_000.0),
];

const PHRASES: &[&str] = &[
    "single owner",
    "garage kept",
    "new tires",
    "full service history",
    "minor scratch on rear bumper",
    "test valid for a year",
    "no accidents",
    "leasing return",
];

const ROWS: usize = 3_000;
const OUTPUT_PATH: &str = "listings.parquet";

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let now = chrono::Utc::now().naive_utc();

    let mut ids = Vec::with_capacity(ROWS);
    let mut manufacturers = Vec::with_capacity(ROWS);
    let mut models = Vec::with_capacity(ROWS);
    let mut sub_models: Vec<Option<&str>> = Vec::with_capacity(ROWS);
    let mut years = Vec::with_capacity(ROWS);
    let mut prices = Vec::with_capacity(ROWS);
    let mut kilometers = Vec::with_capacity(ROWS);
    let mut merchants = Vec::with_capacity(ROWS);
    let mut info_texts: Vec<Option<String>> = Vec::with_capacity(ROWS);
    let mut updated = Vec::with_capacity(ROWS);

    for _ in 0..ROWS {
        // Earlier catalogue entries are more common.
        let index = rng.random_range(0..CATALOGUE.len()).min(rng.random_range(0..CATALOGUE.len()));
        let (manufacturer, model, trims, base_price) = CATALOGUE[index];

        let age: i32 = rng.random_range(0..15);
        let km = (age as f64 * rng.random_range(8_000.0..22_000.0)).max(50.0);
        let price = base_price * 0.88_f64.powi(age) * rng.random_range(0.85..1.15);

        ids.push(format!("{:08x}", rng.random::<u32>()));
        manufacturers.push(manufacturer);
        models.push(model);
        sub_models.push(if rng.random_bool(0.95) {
            trims.choose(&mut rng).copied()
        } else {
            None
        });
        years.push(2024 - age as i64);
        prices.push(price.round());
        kilometers.push(km.round());
        merchants.push(rng.random_bool(0.3));
        info_texts.push(if rng.random_bool(0.8) {
            let n = rng.random_range(1..4);
            Some(
                PHRASES
                    .choose_multiple(&mut rng, n)
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        } else {
            None
        });
        let minutes_ago = rng.random_range(0..60 * 24 * 30);
        let stamp = now - chrono::Duration::minutes(minutes_ago);
        updated.push(stamp.and_utc().timestamp_nanos_opt());
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("manufacturer", DataType::Utf8, false),
        Field::new("model", DataType::Utf8, false),
        Field::new("sub_model", DataType::Utf8, true),
        Field::new("year", DataType::Int64, false),
        Field::new("price", DataType::Float64, false),
        Field::new("kilometers", DataType::Float64, false),
        Field::new("merchant", DataType::Boolean, false),
        Field::new("info_text", DataType::Utf8, true),
        Field::new("date_updated", DataType::Timestamp(TimeUnit::Nanosecond, None), true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(manufacturers)),
            Arc::new(StringArray::from(models)),
            Arc::new(StringArray::from(sub_models)),
            Arc::new(Int64Array::from(years)),
            Arc::new(Float64Array::from(prices)),
            Arc::new(Float64Array::from(kilometers)),
            Arc::new(BooleanArray::from(merchants)),
            Arc::new(StringArray::from(info_texts)),
            Arc::new(TimestampNanosecondArray::from(updated)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(OUTPUT_PATH)
        .with_context(|| format!("creating {OUTPUT_PATH}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing listings")?;
    writer.close().context("closing parquet writer")?;

    println!("Wrote {ROWS} listings to {OUTPUT_PATH}");
    Ok(())
}
