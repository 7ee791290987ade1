mod app;
mod color;
mod config;
mod data;
mod selection;
mod state;
mod ui;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use app::VehicleExplorerApp;
use config::{Cli, Settings};
use selection::SelectionState;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::from(Cli::parse());

    let listings = match data::loader::load(settings.source.as_ref(), &settings.cache_path) {
        Ok(listings) => listings,
        Err(e) => {
            log::error!("Failed to load listings: {e:#}");
            return Err(e);
        }
    };

    if listings.is_empty() {
        log::warn!("Snapshot {} holds no listings", settings.cache_path.display());
    }

    let counts = data::aggregate::model_counts(listings.as_slice());
    let selection = SelectionState::initial(&counts, settings.pool_size, &mut rand::rng());
    log::info!(
        "{} models available, starting with {}",
        counts.len(),
        selection.selected_model
    );
    let state = AppState::new(listings, counts, selection, settings.listing_host);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vehicle Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(VehicleExplorerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("running the UI")
}
