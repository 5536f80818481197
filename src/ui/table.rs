use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Books table (central panel of the "Books Read" tab)
// ---------------------------------------------------------------------------

pub fn books_table(ui: &mut Ui, state: &AppState) {
    ui.heading("Books I've Read");
    ui.add_space(4.0);

    if state.books.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a reading log to view books  (File → Open books…)");
        });
        return;
    }

    let table = &state.table;
    if table.is_empty() {
        ui.label(RichText::new("No rows match the current filters.").italics());
        return;
    }

    let n_cols = table.headers.len();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(40.0))
        .columns(Column::remainder().at_least(80.0).clip(true), n_cols.saturating_sub(1))
        .header(ROW_HEIGHT, |mut header| {
            for name in &table.headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, table.len(), |mut row| {
                let cells = &table.rows[row.index()];
                for cell in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
