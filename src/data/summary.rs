//! Values derived from a [`FilteredView`] for charting.

use std::collections::BTreeMap;

use super::error::QueryError;
use super::filter::FilteredView;
use super::model::Value;

/// `(x, y)` points of `y_column` against `x_column`, or against the row
/// position within the view when `x_column` is `None`.
///
/// Rows where either coordinate is null or non-numeric are skipped.
pub fn numeric_series(
    view: &FilteredView,
    x_column: Option<&str>,
    y_column: &str,
) -> Result<Vec<[f64; 2]>, QueryError> {
    let schema = view.dataset().schema();
    let y = schema.index_of(y_column)?;
    let x = x_column.map(|name| schema.index_of(name)).transpose()?;

    Ok(view
        .rows()
        .enumerate()
        .filter_map(|(position, row)| {
            let xv = match x {
                Some(col) => row.get(col).as_f64()?,
                None => position as f64,
            };
            Some([xv, row.get(y).as_f64()?])
        })
        .collect())
}

/// [`numeric_series`] split by the value of `category_column`, one series
/// per category in ascending order.
pub fn grouped_series(
    view: &FilteredView,
    category_column: &str,
    x_column: Option<&str>,
    y_column: &str,
) -> Result<Vec<(Value, Vec<[f64; 2]>)>, QueryError> {
    let schema = view.dataset().schema();
    let cat = schema.index_of(category_column)?;
    let y = schema.index_of(y_column)?;
    let x = x_column.map(|name| schema.index_of(name)).transpose()?;

    let mut groups: BTreeMap<&Value, Vec<[f64; 2]>> = BTreeMap::new();
    for (position, row) in view.rows().enumerate() {
        let xv = match x {
            Some(col) => row.get(col).as_f64(),
            None => Some(position as f64),
        };
        if let (Some(xv), Some(yv)) = (xv, row.get(y).as_f64()) {
            groups.entry(row.get(cat)).or_default().push([xv, yv]);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(category, points)| (category.clone(), points))
        .collect())
}

/// Five-number summary plus mean, as drawn by a box plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub count: usize,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub mean: f64,
}

impl BoxSummary {
    /// Summarise `values`; `None` when there are no finite values.
    ///
    /// Whiskers extend to the most extreme observations within 1.5 × IQR
    /// of the quartiles.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = percentile(&sorted, 25.0);
        let median = percentile(&sorted, 50.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - 1.5 * iqr)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + 1.5 * iqr)
            .unwrap_or(q3);
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Some(BoxSummary {
            count: sorted.len(),
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            mean,
        })
    }
}

/// Percentile of sorted values using linear interpolation (NumPy compatible).
pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_values[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted_values[lower]
    } else {
        sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
    }
}

/// One box summary of `value_column` per distinct `category_column` value,
/// in ascending category order. Categories without numeric values are omitted.
pub fn grouped_box_summaries(
    view: &FilteredView,
    category_column: &str,
    value_column: &str,
) -> Result<Vec<(Value, BoxSummary)>, QueryError> {
    let schema = view.dataset().schema();
    let cat = schema.index_of(category_column)?;
    let val = schema.index_of(value_column)?;

    let mut groups: BTreeMap<&Value, Vec<f64>> = BTreeMap::new();
    for row in view.rows() {
        let entry = groups.entry(row.get(cat)).or_default();
        if let Some(v) = row.get(val).as_f64() {
            entry.push(v);
        }
    }

    Ok(groups
        .into_iter()
        .filter_map(|(category, values)| {
            BoxSummary::from_values(&values).map(|summary| (category.clone(), summary))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::filter::FilterParams;
    use crate::data::loader::{load_csv, LoadOptions};

    fn view(csv: &str) -> FilteredView {
        let ds = Arc::new(load_csv(csv.as_bytes(), LoadOptions::default()).unwrap());
        FilteredView::full(ds)
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 50.0), 2.5);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_box_summary_whiskers_exclude_outliers() {
        let summary = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.mean, 22.0);
        assert!(BoxSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_numeric_series_skips_nulls() {
        let v = view("year,v2x_libdem\n1990,0.5\n1991,\n1992,0.7\n");
        let series = numeric_series(&v, Some("year"), "v2x_libdem").unwrap();
        assert_eq!(series, vec![[1990.0, 0.5], [1992.0, 0.7]]);

        let by_position = numeric_series(&v, None, "v2x_libdem").unwrap();
        assert_eq!(by_position, vec![[0.0, 0.5], [2.0, 0.7]]);

        assert!(numeric_series(&v, Some("Year"), "v2x_libdem").is_err());
    }

    #[test]
    fn test_grouped_series_splits_by_category() {
        let v = view(
            "country_name,year,v2x_libdem\nKenya,1990,0.1\nGhana,1990,0.2\nGhana,1991,0.3\n",
        );
        let series = grouped_series(&v, "country_name", Some("year"), "v2x_libdem").unwrap();
        assert_eq!(
            series,
            vec![
                (Value::from("Ghana"), vec![[1990.0, 0.2], [1991.0, 0.3]]),
                (Value::from("Kenya"), vec![[1990.0, 0.1]]),
            ]
        );
    }

    #[test]
    fn test_grouped_box_summaries_follow_view() {
        let csv = "City,Salary\nLagos,100\nAccra,150\nLagos,200\nAbuja,\n";
        let full = view(csv);
        let groups = grouped_box_summaries(&full, "City", "Salary").unwrap();
        let names: Vec<String> = groups.iter().map(|(c, _)| c.to_string()).collect();
        assert_eq!(names, vec!["Accra", "Lagos"]);
        assert_eq!(groups[1].1.median, 150.0);

        let lagos = full
            .refine(&FilterParams::new().with_category("City", "Lagos"))
            .unwrap();
        let groups = grouped_box_summaries(&lagos, "City", "Salary").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1.count, 2);
    }
}
