use eframe::egui;

use crate::color;
use crate::config::{DashboardConfig, Tab};
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ReadingLogApp {
    pub state: AppState,
}

impl ReadingLogApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &DashboardConfig) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = color::BACKGROUND;
        visuals.selection.bg_fill = color::SELECTED;
        cc.egui_ctx.set_visuals(visuals);

        Self {
            state: AppState::from_config(config),
        }
    }
}

impl eframe::App for ReadingLogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu + tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        match self.state.tab {
            Tab::BooksRead => {
                // ---- Left side panel: filters ----
                egui::SidePanel::left("filter_panel")
                    .default_width(260.0)
                    .resizable(true)
                    .show(ctx, |ui| {
                        panels::filter_panel(ui, &mut self.state);
                    });

                // ---- Central panel: books table ----
                egui::CentralPanel::default().show(ctx, |ui| {
                    table::books_table(ui, &self.state);
                });
            }
            Tab::Stats => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    plot::stats_view(ui, &self.state);
                });
            }
        }
    }
}
