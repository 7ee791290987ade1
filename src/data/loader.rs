use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use url::Url;

use super::error::LoadError;
use super::model::{CellValue, Listing, ListingSet, Record, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Where a snapshot can be obtained from when the local cache is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(Url),
    Local(PathBuf),
}

impl Source {
    /// `http(s)://` is remote, `file://` and anything that is not a URL is a
    /// local path.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Source::Remote(url),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Source::Local)
                .unwrap_or_else(|_| Source::Local(PathBuf::from(raw))),
            _ => Source::Local(PathBuf::from(raw)),
        }
    }
}

/// What [`ensure_cached`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    AlreadyPresent,
    Written,
}

/// Make sure a snapshot exists at `cache_path`, then load it.
///
/// This is the startup path: any error here is fatal for the process.
pub fn load(source: Option<&Source>, cache_path: &Path) -> Result<ListingSet> {
    ensure_cached(source, cache_path)?;
    let listings = load_file(cache_path)
        .with_context(|| format!("loading snapshot {}", cache_path.display()))?;
    log::info!(
        "Loaded {} listings from {}",
        listings.len(),
        cache_path.display()
    );
    Ok(listings)
}

/// Populate `cache_path` from `source` unless it already exists.
///
/// An existing cache is never overwritten. The snapshot is written to a
/// sibling `.part` file first so a failed transfer leaves no cache behind.
pub fn ensure_cached(source: Option<&Source>, cache_path: &Path) -> Result<CacheStatus, LoadError> {
    if cache_path.exists() {
        log::debug!("Using cached snapshot {}", cache_path.display());
        return Ok(CacheStatus::AlreadyPresent);
    }
    let Some(source) = source else {
        return Err(LoadError::NoSource {
            path: cache_path.to_path_buf(),
        });
    };

    let partial = partial_path(cache_path);
    match source {
        Source::Remote(url) => {
            log::info!("Downloading snapshot {url}");
            let response = match ureq::get(url.as_str()).call() {
                Ok(response) => response,
                Err(ureq::Error::Status(status, _)) => {
                    return Err(LoadError::HttpStatus {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(ureq::Error::Transport(transport)) => {
                    return Err(LoadError::Transport {
                        url: url.to_string(),
                        source: Box::new(transport),
                    });
                }
            };
            let mut reader = response.into_reader();
            let mut file = File::create(&partial).map_err(|e| LoadError::io(&partial, e))?;
            if let Err(e) = io::copy(&mut reader, &mut file) {
                drop(file);
                let _ = std::fs::remove_file(&partial);
                return Err(LoadError::io(&partial, e));
            }
        }
        Source::Local(path) => {
            log::info!("Copying snapshot from {}", path.display());
            std::fs::copy(path, &partial).map_err(|e| LoadError::io(path, e))?;
        }
    }
    std::fs::rename(&partial, cache_path).map_err(|e| LoadError::io(cache_path, e))?;
    log::info!("Cached snapshot at {}", cache_path.display());
    Ok(CacheStatus::Written)
}

fn partial_path(cache_path: &Path) -> PathBuf {
    let mut name = cache_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    cache_path.with_file_name(name)
}

/// Load a listing snapshot from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Parquet file, one listing per row (recommended)
/// * `.json`    – `[{ "id": ..., "model": ..., ... }, ...]`
/// * `.csv`     – header row with column names
pub fn load_file(path: &Path) -> Result<ListingSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (columns, records) = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    };

    check_columns(&columns)?;
    let listings = records.iter().map(Listing::from_record).collect();
    Ok(ListingSet::from_listings(listings))
}

fn check_columns(columns: &[String]) -> Result<(), LoadError> {
    match REQUIRED_COLUMNS
        .iter()
        .find(|required| !columns.iter().any(|c| c.as_str() == **required))
    {
        Some(missing) => Err(LoadError::MissingColumn(*missing)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "id": "abc123", "manufacturer": "Kia", "model": "Picanto",
///     "sub_model": "LX", "year": 2019, "price": 52000, "kilometers": 61000,
///     "merchant": false, "info_text": "...", "date_updated": "2024-03-01 12:30:00" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut record = BTreeMap::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            record.insert(key.clone(), json_to_cell(val));
        }
        records.push(record);
    }

    // An empty array carries no schema to validate against.
    if records.is_empty() {
        columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    }
    Ok((columns, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one listing per record.
fn load_csv(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.clone(), csv_cell(value)))
            .collect();
        records.push(record);
    }

    Ok((headers, records))
}

/// CSV cells stay text; numeric and flag fields are parsed when the typed
/// listing is built, so text columns keep their exact spelling.
fn csv_cell(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet snapshot, one listing per row.
///
/// Categorical (dictionary-encoded) columns written by Pandas are decoded to
/// their value type, integer columns are widened to `Int64` and float columns
/// to `Float64` before the per-row cells are read.
fn load_parquet(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let file = File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let normalized: Vec<(String, ArrayRef)> = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, col)| {
                normalize_column(col)
                    .with_context(|| format!("decoding column '{}'", field.name()))
                    .map(|col| (field.name().clone(), col))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let record: Record = normalized
                .iter()
                .map(|(name, col)| (name.clone(), extract_cell(col, row)))
                .collect();
            records.push(record);
        }
    }

    Ok((columns, records))
}

// -- Parquet / Arrow helpers --

fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Dictionary(_, value_type) => Some(value_type.as_ref().clone()),
        t if t.is_integer() && *t != DataType::Int64 => Some(DataType::Int64),
        t if t.is_floating() && *t != DataType::Float64 => Some(DataType::Float64),
        _ => None,
    };
    match target {
        Some(target) => {
            let casted = cast(col.as_ref(), &target)?;
            // A dictionary of small ints still needs widening.
            if casted.data_type().is_integer() && *casted.data_type() != DataType::Int64 {
                return Ok(cast(casted.as_ref(), &DataType::Int64)?);
            }
            Ok(casted)
        }
        None => Ok(Arc::clone(col)),
    }
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
                TimeUnit::Millisecond => col
                    .as_primitive::<TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => col
                    .as_primitive::<TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => col
                    .as_primitive::<TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            datetime.map_or(CellValue::Null, CellValue::Timestamp)
        }
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_datetime(row)
            .map_or(CellValue::Null, CellValue::Timestamp),
        other => {
            log::debug!("Unsupported parquet column type {other:?}; reading as null");
            CellValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use arrow::array::{
        BooleanArray, DictionaryArray, Float64Array, Int32Array, StringArray,
        TimestampNanosecondArray,
    };
    use arrow::datatypes::{Field, Int32Type, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const JSON_SNAPSHOT: &str = r#"[
        {"id": 101, "manufacturer": "Kia", "model": "Picanto", "sub_model": "LX",
         "year": 2019, "price": 52000, "kilometers": 61000.5, "merchant": true,
         "info_text": null, "date_updated": "2024-03-01 12:30:00"},
        {"id": "x-2", "manufacturer": "Mazda", "model": 3, "sub_model": null,
         "year": 2016, "price": 41000, "kilometers": 120000, "merchant": false}
    ]"#;

    fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(&response);
            }
        });
        format!("http://{addr}/snapshot.json")
    }

    #[test]
    fn source_parse_distinguishes_remote_and_local() {
        assert!(matches!(
            Source::parse("https://example.com/df.parquet"),
            Source::Remote(_)
        ));
        assert_eq!(
            Source::parse("data/df.parquet"),
            Source::Local(PathBuf::from("data/df.parquet"))
        );
    }

    #[test]
    fn json_snapshot_loads_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        std::fs::write(&path, JSON_SNAPSHOT).unwrap();

        let set = load_file(&path).unwrap();
        let rows = set.as_slice();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "101");
        assert!(rows[0].merchant);
        assert_eq!(rows[0].info_text, None);
        assert_eq!(rows[0].kilometers, Some(61000.5));
        assert!(rows[0].date_updated.is_some());
        assert_eq!(rows[1].model, "3");
        assert_eq!(rows[1].sub_model, None);
    }

    #[test]
    fn csv_snapshot_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        std::fs::write(
            &path,
            "id,manufacturer,model,sub_model,year,price,kilometers,merchant\n\
             7,Toyota,Corolla,GLI,2018,61000,90000,False\n\
             8,Toyota,Corolla,,2020,75000,30000,True\n",
        )
        .unwrap();

        let set = load_file(&path).unwrap();
        let rows = set.as_slice();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sub_model.as_deref(), Some("GLI"));
        assert_eq!(rows[1].sub_model, None);
        assert!(rows[1].merchant);
        assert_eq!(rows[1].year, Some(2020));
    }

    #[test]
    fn csv_text_columns_keep_their_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        std::fs::write(
            &path,
            "id,manufacturer,model,sub_model,year,price,kilometers\n\
             00123,Kia,Rio,1.50,2019,50000,1000\n",
        )
        .unwrap();

        let set = load_file(&path).unwrap();
        let row = &set.as_slice()[0];
        assert_eq!(row.id, "00123");
        assert_eq!(row.sub_model.as_deref(), Some("1.50"));
        assert_eq!(row.year, Some(2019));
        assert_eq!(row.price, Some(50_000.0));
        assert_eq!(row.kilometers, Some(1_000.0));
    }

    #[test]
    fn parquet_snapshot_decodes_categorical_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.parquet");

        let models: DictionaryArray<Int32Type> = vec!["Octavia", "Fabia"].into_iter().collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("manufacturer", DataType::Utf8, false),
            Field::new(
                "model",
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                false,
            ),
            Field::new("year", DataType::Int32, true),
            Field::new("price", DataType::Float64, true),
            Field::new("kilometers", DataType::Float64, true),
            Field::new("merchant", DataType::Boolean, true),
            Field::new(
                "date_updated",
                DataType::Timestamp(TimeUnit::Nanosecond, None),
                true,
            ),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["a", "b"])),
                Arc::new(StringArray::from(vec!["Skoda", "Skoda"])),
                Arc::new(models),
                Arc::new(Int32Array::from(vec![Some(2021), None])),
                Arc::new(Float64Array::from(vec![Some(90_000.0), Some(40_000.0)])),
                Arc::new(Float64Array::from(vec![Some(20_000.0), None])),
                Arc::new(BooleanArray::from(vec![true, false])),
                Arc::new(TimestampNanosecondArray::from(vec![
                    Some(1_700_000_000_000_000_000),
                    None,
                ])),
            ],
        )
        .unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let set = load_file(&path).unwrap();
        let rows = set.as_slice();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model, "Octavia");
        assert_eq!(rows[1].model, "Fabia");
        assert_eq!(rows[0].year, Some(2021));
        assert_eq!(rows[1].year, None);
        assert_eq!(rows[1].kilometers, None);
        assert!(rows[0].merchant);
        assert!(rows[0].date_updated.is_some());
        assert_eq!(rows[1].date_updated, None);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        std::fs::write(&path, "id,manufacturer,model,price\n1,Kia,Rio,1\n").unwrap();

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MissingColumn("kilometers"))
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("listings.pk")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::UnsupportedExtension(ext)) if ext == "pk"
        ));
    }

    #[test]
    fn missing_cache_without_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("listings.json");
        let err = ensure_cached(None, &cache).unwrap_err();
        assert!(matches!(err, LoadError::NoSource { .. }));
    }

    #[test]
    fn existing_cache_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("listings.json");
        std::fs::write(&cache, "[]").unwrap();
        let other = dir.path().join("other.json");
        std::fs::write(&other, JSON_SNAPSHOT).unwrap();

        let status = ensure_cached(Some(&Source::Local(other)), &cache).unwrap();
        assert_eq!(status, CacheStatus::AlreadyPresent);
        assert_eq!(std::fs::read_to_string(&cache).unwrap(), "[]");
    }

    #[test]
    fn local_source_is_copied_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("download.json");
        std::fs::write(&src, JSON_SNAPSHOT).unwrap();
        let cache = dir.path().join("listings.json");

        let set = load(Some(&Source::Local(src)), &cache).unwrap();
        assert_eq!(set.len(), 2);
        assert!(cache.exists());
        assert!(!partial_path(&cache).exists());
    }

    #[test]
    fn remote_source_is_downloaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("listings.json");
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            JSON_SNAPSHOT.len(),
            JSON_SNAPSHOT
        );
        let url = serve_once(response.into_bytes());
        let source = Source::parse(&url);

        let status = ensure_cached(Some(&source), &cache).unwrap();
        assert_eq!(status, CacheStatus::Written);
        assert_eq!(load_file(&cache).unwrap().len(), 2);

        // The one-shot server is gone; a second call must not touch the network.
        let status = ensure_cached(Some(&source), &cache).unwrap();
        assert_eq!(status, CacheStatus::AlreadyPresent);
    }

    #[test]
    fn failed_download_leaves_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("listings.json");
        let url = serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_vec());

        let err = ensure_cached(Some(&Source::parse(&url)), &cache).unwrap_err();
        assert!(matches!(err, LoadError::HttpStatus { status: 404, .. }));
        assert!(!cache.exists());
        assert!(!partial_path(&cache).exists());
    }
}
