use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use super::error::{DataLoadError, QueryError};
use super::filter::{self, FilterParams, FilteredView, RangeFilter};
use super::loader::{self, LoadOptions};
use super::model::{Dataset, Value};

/// Owns one loaded dataset and answers read-only queries against it.
#[derive(Debug, Clone)]
pub struct TabularFilterPipeline {
    dataset: Arc<Dataset>,
}

impl TabularFilterPipeline {
    /// Load `path` and check that every name in `required_columns` exists.
    pub fn load<'a>(
        path: &Path,
        options: LoadOptions,
        required_columns: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, DataLoadError> {
        let dataset = loader::load_file(path, options)?;
        dataset.schema().require(required_columns)?;
        Ok(Self::from_dataset(dataset))
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        TabularFilterPipeline {
            dataset: Arc::new(dataset),
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Sorted, duplicate-free values of `column`, nulls excluded.
    pub fn distinct_values(&self, column: &str) -> Result<BTreeSet<Value>, QueryError> {
        let col = self.dataset.schema().index_of(column)?;
        Ok(self
            .dataset
            .rows()
            .iter()
            .map(|r| r.get(col))
            .filter(|v| !v.is_null())
            .cloned()
            .collect())
    }

    /// Smallest and largest comparable value of `column`.
    pub fn bounds(&self, column: &str) -> Result<(Value, Value), QueryError> {
        let col = self.dataset.schema().index_of(column)?;
        let mut extent: Option<(&Value, &Value)> = None;

        for value in self.dataset.rows().iter().map(|r| r.get(col)) {
            // Null and NaN compare with nothing, including themselves.
            if value.compare(value).is_none() {
                continue;
            }
            extent = Some(match extent {
                None => (value, value),
                Some((min, max)) => {
                    let min = match value.compare(min) {
                        Some(Ordering::Less) => value,
                        _ => min,
                    };
                    let max = match value.compare(max) {
                        Some(Ordering::Greater) => value,
                        _ => max,
                    };
                    (min, max)
                }
            });
        }

        extent
            .map(|(min, max)| (min.clone(), max.clone()))
            .ok_or_else(|| QueryError::EmptyRange(column.to_string()))
    }

    /// Range filter over `column` with bounds clamped to its observed extent.
    pub fn clamped_range(
        &self,
        column: &str,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Result<RangeFilter, QueryError> {
        let bounds = self.bounds(column)?;
        Ok(RangeFilter::new(column, lower, upper).clamped(&bounds))
    }

    /// Rows matching `params`, in dataset order.
    pub fn filter(&self, params: &FilterParams) -> Result<FilteredView, QueryError> {
        filter::apply(&self.dataset, params)
    }

    pub fn full_view(&self) -> FilteredView {
        FilteredView::full(Arc::clone(&self.dataset))
    }
}
