use anyhow::Result;
use eframe::egui::{self, Color32, Label, RichText, ScrollArea, Slider, Ui};

use crate::color;
use crate::config::{DashboardConfig, PRESET_NAMES};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.pipeline.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Category selector ----
            if let Some(col) = state.config.category_column.clone() {
                ui.strong(format!("Select {col}"));
                let current = state
                    .selected_category
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                let mut chosen = None;
                egui::ComboBox::from_id_salt("category")
                    .selected_text(current)
                    .show_ui(ui, |ui: &mut Ui| {
                        for value in &state.categories {
                            let mut text = RichText::new(value.to_string());
                            if let Some(cm) = &state.color_map {
                                text = text.color(cm.color_for(value));
                            }
                            let is_selected = state.selected_category.as_ref() == Some(value);
                            if ui.selectable_label(is_selected, text).clicked() {
                                chosen = Some(value.clone());
                            }
                        }
                    });
                if let Some(value) = chosen {
                    state.select_category(value);
                }
                ui.separator();
            }

            // ---- Range sliders ----
            if let Some(range) = state.range.clone() {
                ui.strong(format!("Select {} range", range.column));
                let (min, max) = range.bounds;
                let (mut lo, mut hi) = range.selected;
                let step = if range.integer { 1.0 } else { 0.0 };
                let lo_changed = ui
                    .add(Slider::new(&mut lo, min..=max).text("from").step_by(step))
                    .changed();
                let hi_changed = ui
                    .add(Slider::new(&mut hi, min..=max).text("to").step_by(step))
                    .changed();
                if lo_changed || hi_changed {
                    state.set_range(lo, hi);
                }
                ui.separator();
            } else if let Some(note) = &state.range_note {
                ui.add_enabled(false, Label::new(format!("Range filter unavailable: {note}")));
                ui.separator();
            }

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
            ui.separator();

            // ---- Appearance ----
            ui.strong("Pick a color");
            let mut accent = state.accent;
            if ui.color_edit_button_srgba(&mut accent).changed() {
                state.set_accent(accent);
            }
            ui.label(format!("You picked: {}", color::to_hex(state.accent)));
            ui.separator();

            ui.checkbox(&mut state.charts_follow_filters, "Charts follow filters");
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                open_data_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open dashboard…").clicked() {
                open_dashboard_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Presets", |ui: &mut Ui| {
            for name in PRESET_NAMES {
                if ui.button(name).clicked() {
                    if let Some(config) = DashboardConfig::preset(name) {
                        let result = state.load_dashboard(config);
                        show_result(state, result);
                    }
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        if let Some(line) = state.summary_line() {
            let response = ui.label(line);
            if let Some(details) = state.rejected_rows_text() {
                response.on_hover_text(details);
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_data_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        let result = state.open_data_file(&path);
        show_result(state, result);
    }
}

pub fn open_dashboard_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dashboard configuration")
        .add_filter("Dashboard", &["json"])
        .pick_file();

    if let Some(path) = file {
        let result =
            DashboardConfig::from_file(&path).and_then(|config| state.load_dashboard(config));
        show_result(state, result);
    }
}

/// Surface a load failure in the status line; the previous dataset stays.
fn show_result(state: &mut AppState, result: Result<()>) {
    if let Err(e) = result {
        log::error!("Failed to load: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}
