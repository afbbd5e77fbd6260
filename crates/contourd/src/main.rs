use anyhow::Result;
use contour_core::{Analyzer, CalibrationConfig, Catalog, Explanations, OnnxShapeClassifier};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod analysis;
mod config;
mod dbus_interface;
mod engine;

const BUS_NAME: &str = "org.contour.Contour1";
const OBJECT_PATH: &str = "/org/contour/Contour1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("contourd starting");

    let config = config::Config::from_env();

    let calibration = match &config.calibration_path {
        Some(path) => CalibrationConfig::load(path)?,
        None => CalibrationConfig::default(),
    };
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    let explanations = Explanations::builtin()?;
    let analyzer = Analyzer::from_parts(&calibration, Arc::new(catalog), Arc::new(explanations))?;

    // A missing model leaves the daemon on landmark geometry alone
    let engine = if config.model_enabled {
        match OnnxShapeClassifier::load(&config.model_dir) {
            Ok(classifier) => Some(engine::spawn_engine(classifier)?),
            Err(e) => {
                tracing::warn!(error = %e, "image classifier unavailable; serving geometric results only");
                None
            }
        }
    } else {
        tracing::info!("image classifier disabled by CONTOUR_MODEL_ENABLED");
        None
    };

    let hybrid = analysis::HybridAnalyzer::new(analyzer, engine, config.model_timeout);
    let service = dbus_interface::ContourService::new(hybrid, config.default_limit);

    let _conn = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "contourd ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("contourd shutting down");

    Ok(())
}
