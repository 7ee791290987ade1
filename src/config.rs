use std::path::PathBuf;

use clap::Parser;

use crate::data::aggregate::DEFAULT_POOL_SIZE;
use crate::data::loader::Source;

pub const DEFAULT_CACHE_PATH: &str = "listings.parquet";
pub const DEFAULT_LISTING_HOST: &str = "www.yad2.co.il";

/// Browse used-vehicle listings by model, sub-model, price and mileage.
#[derive(Parser, Debug)]
#[command(name = "vehicle-explorer", version, about)]
pub struct Cli {
    /// URI or path of the listing snapshot, fetched only when the cache is absent
    pub source: Option<String>,

    /// Local snapshot cache (.parquet, .json or .csv)
    #[arg(long, default_value = DEFAULT_CACHE_PATH)]
    pub cache: PathBuf,

    /// Host used to build listing links (`https://<host>/item/<id>`)
    #[arg(long, default_value = DEFAULT_LISTING_HOST)]
    pub listing_host: String,

    /// Number of most frequent models the startup model is drawn from
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE)]
    pub pool_size: usize,
}

/// Runtime settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Option<Source>,
    pub cache_path: PathBuf,
    pub listing_host: String,
    pub pool_size: usize,
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Settings {
            source: cli.source.as_deref().map(Source::parse),
            cache_path: cli.cache,
            listing_host: cli.listing_host,
            pool_size: cli.pool_size.max(1),
        }
    }
}
