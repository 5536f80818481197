use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::color;
use crate::config::Tab;
use crate::data::filter::{date_bounds, ColumnInput, Kind, NumericDomain, TextMatch};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel of the "Books Read" tab.
pub fn filter_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(books) = &state.books else {
        ui.label("No books loaded.");
        return;
    };
    let columns = books.column_names();

    let mut enabled = state.enable_filtering;
    if ui.checkbox(&mut enabled, "Add filters").changed() {
        state.set_filtering(enabled);
    }
    if !state.enable_filtering {
        return;
    }

    ui.add_space(4.0);
    ui.strong("Filter dataframe on");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for col in &columns {
            let picked = state.filter_columns.contains(col);
            if ui.selectable_label(picked, col).clicked() {
                if picked {
                    state.remove_filter_column(col);
                } else {
                    state.add_filter_column(col);
                }
            }
        }
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for col in state.filter_columns.clone() {
                let Some(kind) = state.kind_of(&col) else {
                    continue;
                };
                egui::CollapsingHeader::new(RichText::new(format!("Values for {col}")).strong())
                    .id_salt(&col)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| match kind {
                        Kind::Categorical => categorical_widget(ui, state, &col),
                        Kind::Numeric => numeric_widget(ui, state, &col),
                        Kind::Temporal => temporal_widget(ui, state, &col),
                        Kind::Text => text_widget(ui, state, &col),
                    });
            }
        });
}

fn categorical_widget(ui: &mut Ui, state: &mut AppState, col: &str) {
    let Some(all_values) = state
        .books
        .as_ref()
        .and_then(|b| b.column(col))
        .map(|c| c.distinct())
    else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all(col);
        }
        if ui.small_button("None").clicked() {
            state.select_none(col);
        }
    });

    for val in &all_values {
        let mut checked = matches!(
            state.inputs.get(col),
            Some(ColumnInput::Categories(selected)) if selected.contains(val)
        );
        if ui.checkbox(&mut checked, val.to_string()).changed() {
            state.toggle_category(col, val);
        }
    }
}

fn numeric_widget(ui: &mut Ui, state: &mut AppState, col: &str) {
    let Some(domain) = state
        .books
        .as_ref()
        .and_then(|b| b.column(col))
        .and_then(NumericDomain::of)
    else {
        ui.label("No values.");
        return;
    };
    let Some(ColumnInput::Range(mut lo, mut hi)) = state.inputs.get(col).cloned() else {
        return;
    };

    let range = domain.min..=domain.max;
    ui.add(
        egui::Slider::new(&mut lo, range.clone())
            .step_by(domain.step)
            .text("min"),
    );
    ui.add(egui::Slider::new(&mut hi, range).step_by(domain.step).text("max"));
    state.set_input(col, ColumnInput::Range(domain.snap(lo), domain.snap(hi)));
}

fn temporal_widget(ui: &mut Ui, state: &mut AppState, col: &str) {
    let Some((first, last)) = state
        .books
        .as_ref()
        .and_then(|b| b.column(col))
        .and_then(date_bounds)
    else {
        ui.label("No dates.");
        return;
    };
    let Some(ColumnInput::Dates(start, end)) = state.inputs.get(col).cloned() else {
        return;
    };

    let start = date_endpoint(ui, col, "from", start, first);
    let end = date_endpoint(ui, col, "to", end, last);
    if start.is_none() || end.is_none() {
        ui.label(RichText::new("Pick both dates to filter").weak());
    }
    state.set_input(col, ColumnInput::Dates(start, end));
}

/// One end of a date range: a toggle plus a picker while the toggle is on.
fn date_endpoint(
    ui: &mut Ui,
    col: &str,
    label: &str,
    value: Option<chrono::NaiveDate>,
    fallback: chrono::NaiveDate,
) -> Option<chrono::NaiveDate> {
    let mut set = value.is_some();
    let mut date = value.unwrap_or(fallback);
    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut set, label);
        if set {
            ui.add(DatePickerButton::new(&mut date).id_salt(&format!("{col}_{label}")));
        }
    });
    set.then_some(date)
}

fn text_widget(ui: &mut Ui, state: &mut AppState, col: &str) {
    let Some(ColumnInput::Pattern(mut pattern, mut mode)) = state.inputs.get(col).cloned() else {
        return;
    };

    ui.label(format!("Substring or regex in {col}"));
    ui.text_edit_singleline(&mut pattern);
    let mut regex = mode == TextMatch::Regex;
    if ui.checkbox(&mut regex, "Regex").changed() {
        mode = if regex {
            TextMatch::Regex
        } else {
            TextMatch::Substring
        };
    }
    state.set_input(col, ColumnInput::Pattern(pattern, mode));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / tab bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open books…").clicked() {
                open_books_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open page log…").clicked() {
                open_page_log_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for (tab, label) in [(Tab::BooksRead, "Books Read"), (Tab::Stats, "Stats")] {
            let text = RichText::new(label).color(if state.tab == tab {
                color::ACCENT
            } else {
                Color32::WHITE
            });
            if ui.selectable_label(state.tab == tab, text).clicked() {
                state.tab = tab;
            }
        }

        ui.separator();

        if let Some(books) = &state.books {
            ui.label(format!(
                "{} books loaded, {} visible",
                books.n_rows(),
                state.table.len()
            ));
        }

        if let Some(msg) = state.status_message() {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_books_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open reading log")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_books(&path);
    }
}

pub fn open_page_log_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open daily page log")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_page_log(&path);
    }
}
