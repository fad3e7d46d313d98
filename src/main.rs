// src/main.rs
//! geomap - location provider and map module registry in the terminal

use clap::Parser;
use geomap::{
    config::{GeoConfig, LiveSource},
    display::{TerminalDisplay, TextMapSurface},
    location::LocationProvider,
    map::{modules, ExtraProps, MapSurface, MapView, ModuleRegistry},
};
use log::{info, warn};
use serde_json::json;
use std::{
    path::PathBuf,
    sync::{atomic::AtomicBool, Arc},
};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Live position source
    #[arg(long, value_enum)]
    source: Option<LiveSource>,

    /// Host of the gpsd or NMEA feed
    #[arg(long)]
    host: Option<String>,

    /// Port of the gpsd or NMEA feed
    #[arg(long)]
    port: Option<u16>,

    /// Endpoint answering the approximate location lookup
    #[arg(long)]
    approximate_url: Option<String>,

    /// Do not add the navigation control
    #[arg(long)]
    no_control: bool,

    /// Disable the style attribution
    #[arg(long)]
    no_attribution: bool,

    /// Hide a style layer on load (repeatable)
    #[arg(long = "hide-layer")]
    hide_layer: Vec<String>,

    /// Write the effective configuration back to disk
    #[arg(long)]
    save_config: bool,
}

fn apply_args(config: &mut GeoConfig, args: &Args) {
    if let Some(source) = args.source {
        config.update_source(source);
    }
    match config.source_type {
        LiveSource::Gpsd => {
            let host = args.host.clone().unwrap_or_else(|| config.gpsd_host.clone());
            config.update_gpsd(host, args.port.unwrap_or(config.gpsd_port));
        }
        LiveSource::Nmea => {
            let host = args.host.clone().unwrap_or_else(|| config.nmea_host.clone());
            config.update_nmea(host, args.port.unwrap_or(config.nmea_port));
        }
        LiveSource::None => {}
    }
    if let Some(url) = &args.approximate_url {
        config.approximate_url = Some(url.clone());
    }
    config.no_control |= args.no_control;
    config.no_attribution |= args.no_attribution;
    for layer in &args.hide_layer {
        if !config.hidden_layers.contains(layer) {
            config.hidden_layers.push(layer.clone());
        }
    }
}

fn props(value: serde_json::Value) -> Option<ExtraProps> {
    match value {
        serde_json::Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GeoConfig::load_from(path)?,
        None => GeoConfig::load().unwrap_or_else(|e| {
            warn!("Using default configuration: {}", e);
            GeoConfig::default()
        }),
    };
    apply_args(&mut config, &args);

    if args.save_config {
        match &args.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        info!("Configuration saved");
    }

    info!("Using {} source", config.source_type);

    let locator = config.approximate_locator()?;
    let watcher = config.position_watcher();
    let provider = Arc::new(LocationProvider::start(locator, &*watcher, config.watch_options()));

    let registry = ModuleRegistry::new();
    let view = MapView::new(registry.clone(), &provider, config.view_options());

    let layers = config.style_layers.clone();
    view.mount(|init| Ok(Box::new(TextMapSurface::new(init, &layers)) as Box<dyn MapSurface>));
    let report = view.on_load();
    info!(
        "Map loaded: control={}, hidden={:?}, skipped={:?}",
        report.control_added, report.hidden_layers, report.skipped_layers
    );

    let slots = vec![
        registry.register_module(
            modules::POSITION_MARKER,
            modules::position_marker(Arc::clone(&provider)),
            props(json!({ "label": "You are here" })),
        ),
        registry.register_module(
            modules::TRACKING_STATUS,
            modules::tracking_status(Arc::clone(&provider)),
            props(json!({ "hint": "Enable location permissions" })),
        ),
        registry.register_module(modules::ATTRIBUTION, modules::attribution(), None),
    ];
    info!("{} map modules registered", registry.len());

    let running = Arc::new(AtomicBool::new(true));
    TerminalDisplay::new()
        .run(&provider, &view, running)
        .await?;

    drop(slots);
    view.unmount();
    provider.shutdown();

    Ok(())
}
