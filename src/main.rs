// =============================================================================
// duskgreet — Main entry point
//
// A minimal multi-monitor login greeter: paints one background surface per
// monitor, a centered credential panel on the primary monitor and an
// optional battery panel, themed entirely from a JSON configuration, and
// hands submitted credentials to the session manager.
// =============================================================================

mod app;
mod auth;
mod battery;
mod config;
mod input;
mod layout;
mod monitor;
mod render;
mod style;
mod text;
mod ui;
mod widget;

use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::Greeter;
use crate::config::Config;

const DEFAULT_CONFIG_PATH: &str = "/etc/duskgreet/config.json";

fn main() {
    // Structured logging with RUST_LOG support.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("duskgreet=info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!("duskgreet starting for user {:?}", config.login_user);

    match Greeter::run(config) {
        Ok(()) => info!("duskgreet shut down cleanly."),
        Err(e) => {
            error!("duskgreet encountered a fatal error: {e}");
            std::process::exit(1);
        }
    }
}
