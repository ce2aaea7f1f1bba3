use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::data::loader::LoadOptions;
use crate::data::model::{ColumnType, Dataset};

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Whether charts draw the filtered rows or the whole dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSource {
    #[default]
    Filtered,
    Full,
}

/// A numeric column that gets its own chart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValueColumn {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ValueColumn {
    fn new(name: &str, description: &str) -> Self {
        ValueColumn {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Everything one dashboard needs: which file, which filters, which charts.
///
/// ```json
/// {
///   "title": "V-Dem Democracy Indices Explorer",
///   "source": "data/vdem_subset.csv",
///   "category_column": "country_name",
///   "range_column": "year",
///   "default_range": [1990, 2023],
///   "value_columns": [{ "name": "v2x_libdem", "description": "..." }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Data file; relative paths are resolved against the config file.
    pub source: PathBuf,
    #[serde(default)]
    pub category_column: Option<String>,
    #[serde(default)]
    pub range_column: Option<String>,
    /// Initial `[lo, hi]` of the range filter, clamped to the column bounds.
    #[serde(default)]
    pub default_range: Option<(f64, f64)>,
    #[serde(default)]
    pub value_columns: Vec<ValueColumn>,
    /// Columns shown in the table; empty means all.
    #[serde(default)]
    pub table_columns: Vec<String>,
    /// Also list every row above the filtered table.
    #[serde(default)]
    pub show_full_table: bool,
    #[serde(default)]
    pub chart_source: ChartSource,
    /// `#rrggbb`
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default)]
    pub load: LoadOptions,
}

fn default_accent_color() -> String {
    "#00f900".to_string()
}

pub const PRESET_NAMES: [&str; 2] = ["salary", "vdem"];

impl DashboardConfig {
    /// Parse a JSON configuration. Relative `source` paths are joined to `base_dir`.
    pub fn from_json_str(text: &str, base_dir: &Path) -> Result<Self> {
        let mut config: DashboardConfig =
            serde_json::from_str(text).context("parsing dashboard configuration")?;
        if config.source.is_relative() {
            config.source = base_dir.join(&config.source);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&text, base_dir)
            .with_context(|| format!("in configuration {}", path.display()))
    }

    /// Built-in dashboards.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "salary" => Some(Self::salary()),
            "vdem" => Some(Self::vdem()),
            _ => None,
        }
    }

    /// People by city with their salaries, charted over the whole file.
    pub fn salary() -> Self {
        DashboardConfig {
            title: "My First EDA App".to_string(),
            description: "Pick a city to list the people who live there.".to_string(),
            source: PathBuf::from("sample_data-1.csv"),
            category_column: Some("City".to_string()),
            range_column: None,
            default_range: None,
            value_columns: vec![ValueColumn::new("Salary", "")],
            table_columns: Vec::new(),
            show_full_table: true,
            chart_source: ChartSource::Full,
            accent_color: default_accent_color(),
            load: LoadOptions::default(),
        }
    }

    /// Five core V-Dem democracy indices by country and year.
    pub fn vdem() -> Self {
        let indices = vec![
            ValueColumn::new(
                "v2x_libdem",
                "Liberal Democracy Index: captures the extent to which individual and minority rights are protected and government power is constrained.",
            ),
            ValueColumn::new(
                "v2x_polyarchy",
                "Electoral Democracy (Polyarchy): measures the extent to which leaders are chosen through free and fair elections.",
            ),
            ValueColumn::new(
                "v2x_partipdem",
                "Participatory Democracy: reflects the degree to which citizens actively participate in political processes.",
            ),
            ValueColumn::new(
                "v2x_delibdem",
                "Deliberative Democracy: measures the extent to which political decisions are made through reasoned, inclusive deliberation.",
            ),
            ValueColumn::new(
                "v2x_egaldem",
                "Egalitarian Democracy: captures the extent to which political power is distributed equally across social groups.",
            ),
        ];
        let mut table_columns = vec!["country_name".to_string()];
        table_columns.extend(indices.iter().map(|c| c.name.clone()));

        DashboardConfig {
            title: "V-Dem Democracy Indices Explorer".to_string(),
            description: "This app explores five core democracy indices from the Varieties of \
                          Democracy (V-Dem) dataset.\n\nUse the controls in the sidebar to filter \
                          by country and year."
                .to_string(),
            source: PathBuf::from("data").join("vdem_subset.csv"),
            category_column: Some("country_name".to_string()),
            range_column: Some("year".to_string()),
            default_range: Some((1990.0, f64::INFINITY)),
            value_columns: indices,
            table_columns,
            show_full_table: false,
            chart_source: ChartSource::Filtered,
            accent_color: default_accent_color(),
            load: LoadOptions::default(),
        }
    }

    /// A generic dashboard for an arbitrary data file: the first string
    /// column becomes the category, the first integer column the range,
    /// and the remaining numeric columns are charted.
    pub fn inferred(source: &Path, dataset: &Dataset) -> Self {
        let columns = dataset.schema().columns();
        let category_column = columns
            .iter()
            .find(|c| c.ty == ColumnType::String)
            .map(|c| c.name.clone());
        let range_column = columns
            .iter()
            .find(|c| c.ty == ColumnType::Integer)
            .map(|c| c.name.clone());
        let value_columns = columns
            .iter()
            .filter(|c| c.ty.is_numeric() && Some(&c.name) != range_column.as_ref())
            .map(|c| ValueColumn::new(&c.name, ""))
            .collect();

        DashboardConfig {
            title: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Data Explorer".to_string()),
            description: String::new(),
            source: source.to_path_buf(),
            category_column,
            range_column,
            default_range: None,
            value_columns,
            table_columns: Vec::new(),
            show_full_table: false,
            chart_source: ChartSource::Filtered,
            accent_color: default_accent_color(),
            load: LoadOptions::default(),
        }
    }

    /// Every column this dashboard refers to, in first-mention order.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let mentioned = self
            .category_column
            .iter()
            .chain(self.range_column.iter())
            .chain(self.value_columns.iter().map(|c| &c.name))
            .chain(self.table_columns.iter());
        for name in mentioned {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        names
    }
}

// ---------------------------------------------------------------------------
// Startup argument
// ---------------------------------------------------------------------------

/// What the first command-line argument asks to open.
#[derive(Debug, Clone, PartialEq)]
pub enum Startup {
    Dashboard(DashboardConfig),
    DataFile(PathBuf),
}

/// Interpret the first command-line argument: a preset name, a `.json`
/// configuration file, or a data file. No argument selects the `vdem` preset.
pub fn resolve_startup(arg: Option<&str>) -> Result<Startup> {
    let Some(arg) = arg else {
        return Ok(Startup::Dashboard(DashboardConfig::vdem()));
    };
    if let Some(config) = DashboardConfig::preset(arg) {
        return Ok(Startup::Dashboard(config));
    }

    let path = PathBuf::from(arg);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" if looks_like_config(&path) => {
            Ok(Startup::Dashboard(DashboardConfig::from_file(&path)?))
        }
        "json" | "csv" | "parquet" | "pq" => Ok(Startup::DataFile(path)),
        _ => bail!(
            "'{arg}' is neither a preset ({}) nor a .json/.csv/.parquet file",
            PRESET_NAMES.join(", ")
        ),
    }
}

/// A JSON object (configuration) rather than a JSON array (records).
fn looks_like_config(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|text| text.trim_start().starts_with('{'))
        .unwrap_or(true)
}
