use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Align2, FontId, Rect, ScrollArea, Sense, Ui, Vec2};
use egui_plot::{Bar, BarChart, Plot};

use crate::color::{self, Colorscale};
use crate::state::AppState;
use crate::stats::{self, CalendarGrid, YearMonth};

const CELL: f32 = 14.0;
const GAP: f32 = 3.0;
const WEEKDAY_LABEL_WIDTH: f32 = 30.0;
const CHART_HEIGHT: f32 = 220.0;

// ---------------------------------------------------------------------------
// Stats tab (central panel)
// ---------------------------------------------------------------------------

pub fn stats_view(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Book Stats");
            ui.add_space(8.0);

            if state.page_log.is_empty() {
                ui.label("Open a page log to see daily pages  (File → Open page log…)");
            } else {
                ui.strong("Daily Pages Read");
                let scale = Colorscale::purpor();
                for year in stats::years(&state.stats.pages_per_day) {
                    if let Some(grid) = CalendarGrid::build(&state.stats.pages_per_day, year) {
                        calendar_heatmap(ui, &grid, &scale);
                    }
                }
                ui.add_space(8.0);
                ui.strong("Total Pages per Month");
                month_chart(ui, "pages_per_month", "pages", &state.stats.pages_per_month);
            }

            ui.add_space(8.0);
            if state.books.is_none() {
                ui.label("Open a reading log to see books per month and year.");
                return;
            }
            ui.strong("Books Read per Month");
            month_chart(ui, "books_per_month", "books", &state.stats.books_per_month);

            ui.add_space(8.0);
            ui.strong("Books Read per Year");
            year_chart(ui, &state.stats.books_per_year);
        });
}

// ---------------------------------------------------------------------------
// Calendar heatmap
// ---------------------------------------------------------------------------

fn calendar_heatmap(ui: &mut Ui, grid: &CalendarGrid, scale: &Colorscale) {
    ui.label(grid.year.to_string());
    let size = Vec2::new(
        WEEKDAY_LABEL_WIDTH + grid.n_weeks as f32 * (CELL + GAP),
        7.0 * (CELL + GAP),
    );

    ScrollArea::horizontal()
        .id_salt(("calendar", grid.year))
        .show(ui, |ui: &mut Ui| {
            let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 4.0, color::BACKGROUND);

            for (row, day) in ["Mon", "", "Wed", "", "Fri", "", "Sun"].iter().enumerate() {
                painter.text(
                    rect.min + Vec2::new(0.0, row as f32 * (CELL + GAP) + CELL / 2.0),
                    Align2::LEFT_CENTER,
                    *day,
                    FontId::proportional(10.0),
                    ui.visuals().weak_text_color(),
                );
            }

            let mut hovered = None;
            for cell in &grid.cells {
                let min = rect.min
                    + Vec2::new(
                        WEEKDAY_LABEL_WIDTH + cell.week as f32 * (CELL + GAP),
                        cell.weekday as f32 * (CELL + GAP),
                    );
                let cell_rect = Rect::from_min_size(min, Vec2::splat(CELL));
                painter.rect_filled(cell_rect, 2.0, scale.heat_color(cell.value, grid.max));

                if response
                    .hover_pos()
                    .is_some_and(|pos| cell_rect.contains(pos))
                {
                    hovered = Some(cell);
                }
            }

            if let Some(cell) = hovered {
                response.on_hover_text(format!(
                    "{}: {} pages",
                    cell.date.format("%Y-%m-%d"),
                    cell.value
                ));
            }
        });
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

fn month_chart(ui: &mut Ui, id: &str, unit: &str, data: &BTreeMap<YearMonth, f64>) {
    let bars: Vec<Bar> = data
        .iter()
        .map(|(ym, &v)| {
            Bar::new(ym.ordinal() as f64, v)
                .width(0.8)
                .name(format!("{ym}: {v} {unit}"))
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_formatter(|mark, _range| month_label(mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color::ACCENT));
        });
}

fn year_chart(ui: &mut Ui, data: &BTreeMap<i32, usize>) {
    let bars: Vec<Bar> = data
        .iter()
        .map(|(&year, &n)| Bar::new(year as f64, n as f64).width(0.6).name(year.to_string()))
        .collect();

    Plot::new("books_per_year")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .y_axis_label("amount")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color::ACCENT));
        });
}

/// Axis label for a month ordinal (see [`YearMonth::ordinal`]).
fn month_label(ordinal: f64) -> String {
    if ordinal.fract() != 0.0 {
        return String::new();
    }
    let ordinal = ordinal as i64;
    let year = ordinal.div_euclid(12) as i32;
    let month = ordinal.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| format!("{} {}", d.format("%b"), d.year()))
        .unwrap_or_default()
}
