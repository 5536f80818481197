mod app;
mod color;
mod config;
mod data;
mod state;
mod stats;
mod ui;

use app::ReadingLogApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::from_env();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Reading Log",
        options,
        Box::new(move |cc| Ok(Box::new(ReadingLogApp::new(cc, &config)))),
    )
}
