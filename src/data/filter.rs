use std::cmp::Ordering;
use std::sync::Arc;

use super::error::QueryError;
use super::model::{Dataset, Row, Value};

// ---------------------------------------------------------------------------
// Filter parameters
// ---------------------------------------------------------------------------

/// Keep rows whose value in `column` equals `value` exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalFilter {
    pub column: String,
    pub value: Value,
}

/// Keep rows whose value in `column` lies in `[lower, upper]`, both inclusive.
/// Null and incomparable cells never match.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub lower: Value,
    pub upper: Value,
}

impl RangeFilter {
    pub fn new(
        column: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        RangeFilter {
            column: column.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Pull both bounds inside the observed `(min, max)` extent of the column.
    pub fn clamped(mut self, (min, max): &(Value, Value)) -> Self {
        let clamp = |v: Value| -> Value {
            match (v.compare(min), v.compare(max)) {
                (Some(Ordering::Less), _) => min.clone(),
                (_, Some(Ordering::Greater)) => max.clone(),
                _ => v,
            }
        };
        self.lower = clamp(self.lower);
        self.upper = clamp(self.upper);
        self
    }

    pub fn contains(&self, value: &Value) -> bool {
        matches!(
            value.compare(&self.lower),
            Some(Ordering::Greater | Ordering::Equal)
        ) && matches!(
            value.compare(&self.upper),
            Some(Ordering::Less | Ordering::Equal)
        )
    }
}

/// The current selection: at most one categorical and one range filter,
/// combined with AND. The default selects every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    pub category: Option<CategoricalFilter>,
    pub range: Option<RangeFilter>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.category = Some(CategoricalFilter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_range(
        mut self,
        column: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        self.range = Some(RangeFilter::new(column, lower, upper));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.range.is_none()
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// Rows of a shared dataset that passed a filter, in original order.
#[derive(Debug, Clone)]
pub struct FilteredView {
    dataset: Arc<Dataset>,
    /// Ascending row indices into `dataset`.
    indices: Vec<usize>,
}

impl PartialEq for FilteredView {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.dataset, &other.dataset) && self.indices == other.indices
    }
}

impl FilteredView {
    /// A view over every row.
    pub fn full(dataset: Arc<Dataset>) -> Self {
        let indices = (0..dataset.len()).collect();
        FilteredView { dataset, indices }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Row at a position within the view.
    pub fn row(&self, position: usize) -> Option<&Row> {
        self.indices.get(position).map(|&i| self.dataset.row(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.indices.iter().map(move |&i| self.dataset.row(i))
    }

    /// Values of one column, in view order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, QueryError> {
        let col = self.dataset.schema().index_of(column)?;
        Ok(self.rows().map(|r| r.get(col)).collect())
    }

    /// Numeric values of one column, skipping nulls and text.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<f64>, QueryError> {
        Ok(self
            .column_values(column)?
            .into_iter()
            .filter_map(Value::as_f64)
            .collect())
    }

    /// Apply `params` to the rows of this view.
    pub fn refine(&self, params: &FilterParams) -> Result<FilteredView, QueryError> {
        let predicate = Predicate::compile(&self.dataset, params)?;
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| predicate.matches(self.dataset.row(i)))
            .collect();
        Ok(FilteredView {
            dataset: Arc::clone(&self.dataset),
            indices,
        })
    }

    /// Restrict the view to a list of columns. An empty list keeps all columns.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Result<Projection<'_>, QueryError> {
        let schema = self.dataset.schema();
        let columns = if columns.is_empty() {
            schema
                .names()
                .enumerate()
                .map(|(i, name)| (name.to_string(), i))
                .collect()
        } else {
            columns
                .iter()
                .map(|name| {
                    let name = name.as_ref();
                    Ok((name.to_string(), schema.index_of(name)?))
                })
                .collect::<Result<Vec<_>, QueryError>>()?
        };
        Ok(Projection { view: self, columns })
    }
}

/// A column subset of a [`FilteredView`], for tabular display.
#[derive(Debug)]
pub struct Projection<'a> {
    view: &'a FilteredView,
    columns: Vec<(String, usize)>,
}

impl<'a> Projection<'a> {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Dataset row number of the row at `position` within the view.
    pub fn row_index(&self, position: usize) -> Option<usize> {
        self.view.indices().get(position).copied()
    }

    /// Cells of the row at `position` within the view, in projected order.
    pub fn row(&self, position: usize) -> Option<Vec<&'a Value>> {
        let row = self.view.row(position)?;
        Some(self.columns.iter().map(|&(_, i)| row.get(i)).collect())
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// `FilterParams` with column names resolved against a schema.
struct Predicate<'p> {
    category: Option<(usize, &'p Value)>,
    range: Option<(usize, &'p RangeFilter)>,
}

impl<'p> Predicate<'p> {
    fn compile(dataset: &Dataset, params: &'p FilterParams) -> Result<Self, QueryError> {
        let schema = dataset.schema();
        let category = params
            .category
            .as_ref()
            .map(|c| Ok::<_, QueryError>((schema.index_of(&c.column)?, &c.value)))
            .transpose()?;
        let range = params
            .range
            .as_ref()
            .map(|r| Ok::<_, QueryError>((schema.index_of(&r.column)?, r)))
            .transpose()?;
        Ok(Predicate { category, range })
    }

    fn matches(&self, row: &Row) -> bool {
        if let Some((col, value)) = self.category {
            if row.get(col) != value {
                return false;
            }
        }
        if let Some((col, range)) = self.range {
            if !range.contains(row.get(col)) {
                return false;
            }
        }
        true
    }
}

/// Stable filter of `dataset` by `params`.
pub fn apply(dataset: &Arc<Dataset>, params: &FilterParams) -> Result<FilteredView, QueryError> {
    let predicate = Predicate::compile(dataset, params)?;
    let indices: Vec<usize> = if params.is_empty() {
        (0..dataset.len()).collect()
    } else {
        dataset
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| predicate.matches(row))
            .map(|(i, _)| i)
            .collect()
    };
    log::debug!(
        "Filter {:?} kept {} of {} rows",
        params,
        indices.len(),
        dataset.len()
    );
    Ok(FilteredView {
        dataset: Arc::clone(dataset),
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_csv, LoadOptions};

    fn scenario() -> Arc<Dataset> {
        let csv = "\
City,Salary,Year
Lagos,100,1988
Lagos,200,2001
Accra,150,1995
";
        Arc::new(load_csv(csv.as_bytes(), LoadOptions::default()).unwrap())
    }

    fn cities(view: &FilteredView) -> Vec<String> {
        view.column_values("City")
            .unwrap()
            .into_iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn test_no_predicates_returns_everything() {
        let ds = scenario();
        let view = apply(&ds, &FilterParams::new()).unwrap();
        assert_eq!(view, FilteredView::full(Arc::clone(&ds)));
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_categorical_filter_keeps_matching_rows_in_order() {
        let ds = scenario();
        let view = apply(&ds, &FilterParams::new().with_category("City", "Lagos")).unwrap();
        assert_eq!(view.indices(), &[0, 1]);
        assert_eq!(view.numeric_column("Salary").unwrap(), vec![100.0, 200.0]);
    }

    #[test]
    fn test_categorical_filter_is_exact() {
        let ds = scenario();
        let view = apply(&ds, &FilterParams::new().with_category("City", "lagos")).unwrap();
        assert!(view.is_empty());
        let view = apply(&ds, &FilterParams::new().with_category("City", "Lago")).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_categorical_filter_on_special_floats() {
        let csv = "Score,Name\nNaN,a\n1.5,b\nNaN,c\n-0.0,d\n0.0,e\n";
        let ds = Arc::new(load_csv(csv.as_bytes(), LoadOptions::default()).unwrap());

        let nan = apply(&ds, &FilterParams::new().with_category("Score", f64::NAN)).unwrap();
        assert_eq!(nan.indices(), &[0, 2]);

        let zero = apply(&ds, &FilterParams::new().with_category("Score", 0.0)).unwrap();
        assert_eq!(zero.indices(), &[4]);
        let neg_zero = apply(&ds, &FilterParams::new().with_category("Score", -0.0)).unwrap();
        assert_eq!(neg_zero.indices(), &[3]);
    }

    #[test]
    fn test_range_filter_is_inclusive() {
        let ds = scenario();
        let view = apply(&ds, &FilterParams::new().with_range("Year", 1990, 2001)).unwrap();
        assert_eq!(view.indices(), &[1, 2]);

        let view = apply(&ds, &FilterParams::new().with_range("Year", 1996, 2001)).unwrap();
        assert_eq!(view.indices(), &[1]);
        assert_eq!(view.dataset().value(1, "Year").unwrap(), &Value::Integer(2001));

        let view = apply(&ds, &FilterParams::new().with_range("Year", 2002, 2010)).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_combined_filters_are_anded() {
        let ds = scenario();
        let params = FilterParams::new()
            .with_category("City", "Lagos")
            .with_range("Year", 1990, 2010);
        let view = apply(&ds, &params).unwrap();
        assert_eq!(view.indices(), &[1]);
        assert_eq!(cities(&view), vec!["Lagos"]);
    }

    #[test]
    fn test_range_skips_null_cells() {
        let csv = "City,Year\nLagos,1988\nAccra,\nAbuja,1999\n";
        let ds = Arc::new(load_csv(csv.as_bytes(), LoadOptions::default()).unwrap());
        let view = apply(&ds, &FilterParams::new().with_range("Year", 1988, 1999)).unwrap();
        assert_eq!(cities(&view), vec!["Lagos", "Abuja"]);
    }

    #[test]
    fn test_unknown_column_is_reported() {
        let ds = scenario();
        let err = apply(&ds, &FilterParams::new().with_category("Country", "Ghana")).unwrap_err();
        assert_eq!(err, QueryError::ColumnNotFound("Country".to_string()));
    }

    #[test]
    fn test_refine_with_same_params_is_idempotent() {
        let ds = scenario();
        let params = FilterParams::new()
            .with_category("City", "Lagos")
            .with_range("Year", 1980, 2001);
        let once = apply(&ds, &params).unwrap();
        let twice = once.refine(&params).unwrap();
        assert_eq!(once, twice);
        assert_eq!(apply(&ds, &params).unwrap(), once);
    }

    #[test]
    fn test_clamped_range() {
        let bounds = (Value::Integer(1988), Value::Integer(2001));
        let range = RangeFilter::new("Year", 1900, 2050).clamped(&bounds);
        assert_eq!(range.lower, Value::Integer(1988));
        assert_eq!(range.upper, Value::Integer(2001));

        let range = RangeFilter::new("Year", 1990, 1995).clamped(&bounds);
        assert_eq!(range.lower, Value::Integer(1990));
        assert_eq!(range.upper, Value::Integer(1995));
    }

    #[test]
    fn test_projection() {
        let ds = scenario();
        let view = apply(&ds, &FilterParams::new().with_category("City", "Accra")).unwrap();
        let table = view.project(&["Year", "Salary"]).unwrap();
        assert_eq!(table.headers().collect::<Vec<_>>(), vec!["Year", "Salary"]);
        assert_eq!(
            table.row(0).unwrap(),
            vec![&Value::Integer(1995), &Value::Integer(150)]
        );
        assert!(table.row(1).is_none());
        assert_eq!(table.row_index(0), Some(2));
        assert_eq!(table.row_index(1), None);
        assert_eq!(view.project::<&str>(&[]).unwrap().width(), 3);
        assert!(view.project(&["Country"]).is_err());
    }
}
