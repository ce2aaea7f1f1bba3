use eframe::egui::{Color32, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::Projection;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

/// Render the dashboard's tables, restricted to the table columns.
pub fn data_tables(ui: &mut Ui, state: &AppState) {
    for (heading, view) in state.table_views() {
        ui.heading(heading.as_str());

        let projection = match view.project(state.config.table_columns.as_slice()) {
            Ok(p) => p,
            Err(e) => {
                ui.colored_label(Color32::RED, e.to_string());
                continue;
            }
        };
        if projection.is_empty() {
            ui.label("No rows match the current filters.");
        } else {
            ui.push_id(&heading, |ui: &mut Ui| rows_table(ui, &projection));
        }
        ui.add_space(12.0);
    }
}

/// One table; the first column is the row number in the loaded file.
fn rows_table(ui: &mut Ui, projection: &Projection<'_>) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(360.0)
        .column(Column::auto().at_least(40.0))
        .columns(Column::auto().at_least(60.0), projection.width())
        .header(ROW_HEIGHT + 2.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            for name in projection.headers() {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, projection.len(), |mut row| {
                let position = row.index();
                let (Some(index), Some(cells)) =
                    (projection.row_index(position), projection.row(position))
                else {
                    return;
                };
                row.col(|ui| {
                    ui.weak(index.to_string());
                });
                for cell in cells {
                    row.col(|ui| {
                        ui.label(cell.to_string());
                    });
                }
            });
        });
}
