mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::ExplorerApp;
use config::{DashboardConfig, Startup};
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let state = initial_state(std::env::args().nth(1).as_deref());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tabular Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp::new(state)))),
    )
}

/// Load whatever the command line asks for. Failures are shown in the
/// window rather than aborting, so the user can pick another file.
fn initial_state(arg: Option<&str>) -> AppState {
    let startup = match config::resolve_startup(arg) {
        Ok(startup) => startup,
        Err(e) => {
            log::error!("{e:#}");
            let mut state = AppState::new(DashboardConfig::vdem());
            state.status_message = Some(format!("Error: {e:#}"));
            return state;
        }
    };

    let (mut state, result) = match startup {
        Startup::Dashboard(config) => {
            let mut state = AppState::new(config.clone());
            let result = state.load_dashboard(config);
            (state, result)
        }
        Startup::DataFile(path) => {
            let mut state = AppState::new(DashboardConfig::vdem());
            let result = state.open_data_file(&path);
            (state, result)
        }
    };
    if let Err(e) = result {
        log::error!("Failed to load: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
    state
}
