use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints};

use crate::config::ValueColumn;
use crate::data::filter::FilteredView;
use crate::data::model::Value;
use crate::data::summary::{grouped_box_summaries, grouped_series, numeric_series, BoxSummary};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 220.0;

// ---------------------------------------------------------------------------
// Report (central panel)
// ---------------------------------------------------------------------------

/// Render the title, description and charts of the active dashboard.
pub fn report(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.chart_view() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore it  (File → Open data…)");
        });
        return;
    };

    ui.heading(&state.config.title);
    if !state.config.description.is_empty() {
        ui.label(&state.config.description);
    }
    ui.add_space(8.0);

    for value in &state.config.value_columns {
        ui.label(RichText::new(&value.name).heading().strong());
        if !value.description.is_empty() {
            ui.label(&value.description);
        }
        line_chart(ui, state, &view, value);
        ui.add_space(8.0);
    }

    if let Some(first) = state.config.value_columns.first() {
        ui.label(RichText::new(format!("{} by row", first.name)).heading().strong());
        bar_chart(ui, state, &view, first);
        ui.add_space(8.0);

        let heading = match state.config.category_column.as_deref() {
            Some(category) => format!("{} by {category}", first.name),
            None => format!("{} distribution", first.name),
        };
        ui.label(RichText::new(heading).heading().strong());
        box_plot(ui, state, &view, first);
    }
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// One line per category value, over the range column (or row position).
fn line_chart(ui: &mut Ui, state: &AppState, view: &FilteredView, value: &ValueColumn) {
    let x_column = state.range.as_ref().map(|r| r.column.as_str());
    let series = match state.config.category_column.as_deref() {
        Some(category) => grouped_series(view, category, x_column, &value.name),
        None => numeric_series(view, x_column, &value.name)
            .map(|points| vec![(value.name.as_str().into(), points)]),
    };
    let series = match series {
        Ok(series) => series,
        Err(e) => {
            ui.colored_label(Color32::RED, e.to_string());
            return;
        }
    };

    Plot::new(("line", &value.name))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(x_column.unwrap_or("row"))
        .y_axis_label(&value.name)
        .allow_drag(true)
        .allow_zoom(true)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (category, points) in series {
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(&category))
                    .unwrap_or(state.accent);
                plot_ui.line(
                    Line::new(PlotPoints::from(points))
                        .name(category.to_string())
                        .color(color)
                        .width(1.5),
                );
            }
        });
}

/// One bar per row, in view order.
fn bar_chart(ui: &mut Ui, state: &AppState, view: &FilteredView, value: &ValueColumn) {
    let points = match numeric_series(view, None, &value.name) {
        Ok(points) => points,
        Err(e) => {
            ui.colored_label(Color32::RED, e.to_string());
            return;
        }
    };
    let bars: Vec<Bar> = points
        .iter()
        .map(|&[x, y]| Bar::new(x, y).fill(state.accent))
        .collect();

    Plot::new(("bar", &value.name))
        .height(CHART_HEIGHT)
        .x_axis_label("row")
        .y_axis_label(&value.name)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(&value.name));
        });
}

/// Box and whiskers of the value column per category, or one box for the
/// whole view when the dashboard has no category column.
fn box_plot(ui: &mut Ui, state: &AppState, view: &FilteredView, value: &ValueColumn) {
    let category = state.config.category_column.as_deref();
    let groups: Result<Vec<(Value, BoxSummary)>, _> = match category {
        Some(category) => grouped_box_summaries(view, category, &value.name),
        None => view.numeric_column(&value.name).map(|values| {
            BoxSummary::from_values(&values)
                .map(|summary| (Value::from(value.name.as_str()), summary))
                .into_iter()
                .collect()
        }),
    };
    let groups = match groups {
        Ok(groups) => groups,
        Err(e) => {
            ui.colored_label(Color32::RED, e.to_string());
            return;
        }
    };

    Plot::new(("box", &value.name))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(category.unwrap_or(""))
        .y_axis_label(&value.name)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (cat, summary)) in groups.iter().enumerate() {
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(cat))
                    .unwrap_or(state.accent);
                let elem = BoxElem::new(
                    i as f64,
                    BoxSpread::new(
                        summary.lower_whisker,
                        summary.q1,
                        summary.median,
                        summary.q3,
                        summary.upper_whisker,
                    ),
                )
                .name(format!("{cat} (n={})", summary.count))
                .box_width(0.5)
                .fill(color.gamma_multiply(0.3))
                .stroke(Stroke::new(1.5, color));

                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(cat.to_string()));
            }
        });

    if groups.is_empty() {
        ui.label(RichText::new("No numeric values to summarise.").italics());
    }
}
