use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::Color32;

use crate::color::{self, ColorMap};
use crate::config::{ChartSource, DashboardConfig};
use crate::data::error::QueryError;
use crate::data::filter::{FilterParams, FilteredView};
use crate::data::loader::{self, LoadOptions};
use crate::data::model::{ColumnType, Value};
use crate::data::pipeline::TabularFilterPipeline;

// ---------------------------------------------------------------------------
// Range slider state
// ---------------------------------------------------------------------------

/// Slider extent and selection for the range column.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeControl {
    pub column: String,
    /// Observed `(min, max)` of the column.
    pub bounds: (f64, f64),
    pub selected: (f64, f64),
    /// Snap the slider to whole numbers.
    pub integer: bool,
}

impl RangeControl {
    fn to_value(&self, v: f64) -> Value {
        if self.integer {
            Value::Integer(v.round() as i64)
        } else {
            Value::Float(v)
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Active dashboard description.
    pub config: DashboardConfig,

    /// Loaded dataset (None until a load succeeds).
    pub pipeline: Option<TabularFilterPipeline>,

    /// Options of the category drop-down.
    pub categories: Vec<Value>,

    pub selected_category: Option<Value>,

    /// None when there is no range column or it has no comparable values.
    pub range: Option<RangeControl>,

    /// Why the range control is disabled, if it is.
    pub range_note: Option<String>,

    /// Rows passing the category filter alone; `view` narrows it by range.
    category_view: Option<FilteredView>,

    /// Rows passing the current filters (cached).
    pub view: Option<FilteredView>,

    /// Colours per category value, seeded from `accent`.
    pub color_map: Option<ColorMap>,

    pub accent: Color32,

    /// Draw charts from `view` instead of the whole dataset.
    pub charts_follow_filters: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let accent = color::parse_hex(&config.accent_color);
        let charts_follow_filters = config.chart_source == ChartSource::Filtered;
        Self {
            config,
            pipeline: None,
            categories: Vec::new(),
            selected_category: None,
            range: None,
            range_note: None,
            category_view: None,
            view: None,
            color_map: None,
            accent,
            charts_follow_filters,
            status_message: None,
        }
    }

    /// Load the data file a dashboard points at, checking every column it names.
    /// On failure the previously loaded dashboard stays active.
    pub fn load_dashboard(&mut self, config: DashboardConfig) -> Result<()> {
        let pipeline = TabularFilterPipeline::load(
            &config.source,
            config.load,
            config.required_columns(),
        )
        .with_context(|| format!("loading '{}'", config.title))?;
        self.set_pipeline(config, pipeline);
        Ok(())
    }

    /// Open a bare data file with a dashboard inferred from its columns.
    pub fn open_data_file(&mut self, path: &Path) -> Result<()> {
        let dataset = loader::load_file(path, LoadOptions::default())
            .with_context(|| format!("loading {}", path.display()))?;
        let config = DashboardConfig::inferred(path, &dataset);
        self.set_pipeline(config, TabularFilterPipeline::from_dataset(dataset));
        Ok(())
    }

    /// Ingest a newly loaded dataset, initialise filters and colour.
    pub fn set_pipeline(&mut self, config: DashboardConfig, pipeline: TabularFilterPipeline) {
        log::info!(
            "Dashboard '{}' ready: {} rows, columns {:?}",
            config.title,
            pipeline.dataset().len(),
            pipeline.dataset().schema().names().collect::<Vec<_>>()
        );
        if pipeline.dataset().is_empty() {
            log::warn!("'{}' has no rows", config.source.display());
        }

        self.categories = config
            .category_column
            .as_deref()
            .and_then(|col| category_values(&pipeline, col))
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        self.selected_category = self.categories.first().cloned();

        self.range = None;
        self.range_note = None;
        if let Some(col) = config.range_column.as_deref() {
            match pipeline.bounds(col) {
                Ok((min, max)) => match (min.as_f64(), max.as_f64()) {
                    (Some(lo), Some(hi)) => {
                        self.range = Some(RangeControl {
                            column: col.to_string(),
                            bounds: (lo, hi),
                            selected: default_selection(
                                &pipeline,
                                col,
                                config.default_range,
                                (lo, hi),
                            ),
                            integer: pipeline.dataset().schema().column_type(col).ok()
                                == Some(ColumnType::Integer),
                        });
                    }
                    _ => self.range_note = Some(format!("'{col}' is not numeric")),
                },
                Err(e) => self.range_note = Some(e.to_string()),
            }
        }

        self.accent = color::parse_hex(&config.accent_color);
        self.charts_follow_filters = config.chart_source == ChartSource::Filtered;
        self.config = config;
        self.pipeline = Some(pipeline);
        self.status_message = None;
        self.rebuild_color_map();
        self.refilter();
    }

    /// The category selection as pipeline parameters.
    fn category_params(&self) -> FilterParams {
        match (
            self.config.category_column.as_deref(),
            self.selected_category.as_ref(),
        ) {
            (Some(col), Some(value)) => FilterParams::new().with_category(col, value.clone()),
            _ => FilterParams::new(),
        }
    }

    /// The range selection as pipeline parameters. The slider keeps the
    /// selection inside the column bounds.
    fn range_params(&self) -> FilterParams {
        match &self.range {
            Some(range) => FilterParams::new().with_range(
                &range.column,
                range.to_value(range.selected.0),
                range.to_value(range.selected.1),
            ),
            None => FilterParams::new(),
        }
    }

    /// Recompute both cached views after a category change.
    pub fn refilter(&mut self) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        match pipeline.filter(&self.category_params()) {
            Ok(view) => {
                self.category_view = Some(view);
                self.refine_range();
            }
            Err(e) => self.filter_failed(e),
        }
    }

    /// Narrow the cached category view by the range selection.
    fn refine_range(&mut self) {
        let Some(category_view) = &self.category_view else {
            return;
        };
        match category_view.refine(&self.range_params()) {
            Ok(view) => self.view = Some(view),
            Err(e) => self.filter_failed(e),
        }
    }

    fn filter_failed(&mut self, e: QueryError) {
        log::error!("Filter failed: {e}");
        self.status_message = Some(format!("Error: {e}"));
    }

    /// Rows the charts should draw.
    pub fn chart_view(&self) -> Option<FilteredView> {
        if self.charts_follow_filters {
            self.view.clone()
        } else {
            self.pipeline.as_ref().map(TabularFilterPipeline::full_view)
        }
    }

    pub fn select_category(&mut self, value: Value) {
        self.selected_category = Some(value);
        self.refilter();
    }

    /// Set the range selection, keeping `lo <= hi` inside the bounds.
    /// The category is unchanged, so only the range is re-applied.
    pub fn set_range(&mut self, lo: f64, hi: f64) {
        if let Some(range) = &mut self.range {
            let (min, max) = range.bounds;
            let lo = lo.clamp(min, max);
            let hi = hi.clamp(min, max);
            range.selected = (lo.min(hi), lo.max(hi));
        }
        self.refine_range();
    }

    /// Back to the first category and the configured default range.
    pub fn reset_filters(&mut self) {
        self.selected_category = self.categories.first().cloned();
        if let (Some(range), Some(pipeline)) = (&mut self.range, &self.pipeline) {
            range.selected = default_selection(
                pipeline,
                &range.column,
                self.config.default_range,
                range.bounds,
            );
        }
        self.refilter();
    }

    pub fn set_accent(&mut self, accent: Color32) {
        self.accent = accent;
        self.config.accent_color = color::to_hex(accent);
        self.rebuild_color_map();
    }

    fn rebuild_color_map(&mut self) {
        self.color_map = self
            .config
            .category_column
            .as_deref()
            .zip(self.pipeline.as_ref())
            .and_then(|(col, p)| category_values(p, col))
            .map(|vals| ColorMap::new(&vals, self.accent));
    }

    /// Tables to list under the charts, with their headings: every row
    /// first when the dashboard asks for it, then the filtered rows.
    pub fn table_views(&self) -> Vec<(String, FilteredView)> {
        let mut tables = Vec::new();
        if self.config.show_full_table {
            if let Some(pipeline) = &self.pipeline {
                tables.push(("Full dataset".to_string(), pipeline.full_view()));
            }
        }
        if let Some(view) = &self.view {
            let heading = match (
                self.config.category_column.as_deref(),
                self.selected_category.as_ref(),
            ) {
                (Some(col), Some(value)) => format!("Rows with {col} = {value}"),
                _ => "Filtered rows".to_string(),
            };
            tables.push((heading, view.clone()));
        }
        tables
    }

    /// One line per row skipped while loading, for a hover tooltip.
    pub fn rejected_rows_text(&self) -> Option<String> {
        let report = self.pipeline.as_ref()?.dataset().report();
        if report.is_clean() {
            return None;
        }
        Some(
            report
                .rejected
                .iter()
                .map(|r| format!("line {}: {}", r.line, r.reason))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// "N rows loaded, M visible", plus rejected rows if any.
    pub fn summary_line(&self) -> Option<String> {
        let pipeline = self.pipeline.as_ref()?;
        let ds = pipeline.dataset();
        let visible = self.view.as_ref().map_or(0, FilteredView::len);
        let mut line = format!("{} rows loaded, {} visible", ds.len(), visible);
        let rejected = ds.report().rejected.len();
        if rejected > 0 {
            line.push_str(&format!(" ({rejected} malformed rows skipped)"));
        }
        Some(line)
    }
}

/// Distinct values of the category column, or `None` with a warning when
/// the column cannot be read.
fn category_values(pipeline: &TabularFilterPipeline, column: &str) -> Option<BTreeSet<Value>> {
    match pipeline.distinct_values(column) {
        Ok(values) => Some(values),
        Err(e) => {
            log::warn!("Category filter disabled: {e}");
            None
        }
    }
}

/// The configured default range, pulled inside the column's observed extent.
/// Falls back to the full extent.
fn default_selection(
    pipeline: &TabularFilterPipeline,
    column: &str,
    default_range: Option<(f64, f64)>,
    bounds: (f64, f64),
) -> (f64, f64) {
    let (want_lo, want_hi) = default_range.unwrap_or(bounds);
    match pipeline.clamped_range(column, want_lo, want_hi) {
        Ok(range) => (
            range.lower.as_f64().unwrap_or(bounds.0),
            range.upper.as_f64().unwrap_or(bounds.1),
        ),
        Err(e) => {
            log::warn!("Default range ignored: {e}");
            bounds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_csv;

    const VDEM_CSV: &str = "\
country_name,year,v2x_libdem
Kenya,1985,0.1
Ghana,1988,0.2
Ghana,1995,0.4
Kenya,2001,0.3
Ghana,2003,0.6
";

    fn loaded(config: DashboardConfig) -> AppState {
        let ds = load_csv(VDEM_CSV.as_bytes(), LoadOptions::default()).unwrap();
        let mut state = AppState::new(config.clone());
        state.set_pipeline(config, TabularFilterPipeline::from_dataset(ds));
        state
    }

    fn vdem_like() -> DashboardConfig {
        let mut config = DashboardConfig::vdem();
        config.value_columns.truncate(1);
        config.table_columns.truncate(2);
        config
    }

    fn years(view: &FilteredView) -> Vec<f64> {
        view.numeric_column("year").unwrap()
    }

    #[test]
    fn test_defaults_follow_config() {
        let state = loaded(vdem_like());
        assert_eq!(state.categories, vec![Value::from("Ghana"), Value::from("Kenya")]);
        assert_eq!(state.selected_category, Some(Value::from("Ghana")));

        let range = state.range.as_ref().unwrap();
        assert!(range.integer);
        assert_eq!(range.bounds, (1985.0, 2003.0));
        assert_eq!(range.selected, (1990.0, 2003.0));

        assert_eq!(years(state.view.as_ref().unwrap()), vec![1995.0, 2003.0]);
        assert_eq!(state.summary_line().unwrap(), "5 rows loaded, 2 visible");
    }

    #[test]
    fn test_selection_changes_refilter() {
        let mut state = loaded(vdem_like());
        state.select_category(Value::from("Kenya"));
        assert_eq!(years(state.view.as_ref().unwrap()), vec![2001.0]);

        state.set_range(2010.0, 1980.0);
        assert_eq!(state.range.as_ref().unwrap().selected, (1985.0, 2003.0));
        assert_eq!(years(state.view.as_ref().unwrap()), vec![1985.0, 2001.0]);

        state.reset_filters();
        assert_eq!(state.selected_category, Some(Value::from("Ghana")));
        assert_eq!(years(state.view.as_ref().unwrap()), vec![1995.0, 2003.0]);
    }

    #[test]
    fn test_chart_view_source() {
        let mut state = loaded(vdem_like());
        assert_eq!(state.chart_view().unwrap().len(), 2);
        state.charts_follow_filters = false;
        assert_eq!(state.chart_view().unwrap().len(), 5);
    }

    #[test]
    fn test_non_numeric_range_column_disables_control() {
        let mut config = vdem_like();
        config.range_column = Some("country_name".to_string());
        let state = loaded(config);
        assert!(state.range.is_none());
        assert!(state.range_note.is_some());
        assert_eq!(state.view.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let mut state = loaded(vdem_like());
        let mut missing = DashboardConfig::salary();
        missing.source = "no/such/file.csv".into();
        assert!(state.load_dashboard(missing).is_err());
        assert_eq!(state.config.title, "V-Dem Democracy Indices Explorer");
        assert_eq!(state.pipeline.as_ref().unwrap().dataset().len(), 5);
    }

    #[test]
    fn test_accent_recolors_categories() {
        let mut state = loaded(vdem_like());
        let ghana = Value::from("Ghana");
        let before = state.color_map.as_ref().unwrap().color_for(&ghana);
        state.set_accent(Color32::from_rgb(255, 0, 0));
        assert_eq!(state.config.accent_color, "#ff0000");
        assert_ne!(state.color_map.as_ref().unwrap().color_for(&ghana), before);
    }

    #[test]
    fn test_cached_views_match_a_fresh_filter() {
        let mut state = loaded(vdem_like());
        let fresh = |state: &AppState, country: &str, lo: i64, hi: i64| {
            let params = FilterParams::new()
                .with_category("country_name", country)
                .with_range("year", lo, hi);
            state.pipeline.as_ref().unwrap().filter(&params).unwrap()
        };

        state.set_range(1990.0, 2001.0);
        assert_eq!(state.view, Some(fresh(&state, "Ghana", 1990, 2001)));

        state.select_category(Value::from("Kenya"));
        assert_eq!(state.view, Some(fresh(&state, "Kenya", 1990, 2001)));

        state.set_range(1980.0, 1990.0);
        assert_eq!(state.view, Some(fresh(&state, "Kenya", 1985, 1990)));
        assert_eq!(years(state.view.as_ref().unwrap()), vec![1985.0]);
    }

    #[test]
    fn test_missing_category_column_disables_dropdown() {
        let mut config = vdem_like();
        config.category_column = Some("region".to_string());
        let state = loaded(config);
        assert!(state.categories.is_empty());
        assert!(state.selected_category.is_none());
        assert!(state.color_map.is_none());
        assert_eq!(years(state.view.as_ref().unwrap()), vec![1995.0, 2001.0, 2003.0]);
    }

    #[test]
    fn test_table_views() {
        let state = loaded(vdem_like());
        let tables = state.table_views();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0, "Rows with country_name = Ghana");
        assert_eq!(tables[0].1.len(), 2);

        let mut config = vdem_like();
        config.show_full_table = true;
        let state = loaded(config);
        let tables = state.table_views();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].0, "Full dataset");
        assert_eq!(tables[0].1.len(), 5);
        assert_eq!(tables[1].1, *state.view.as_ref().unwrap());
    }
}
