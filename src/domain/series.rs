// Chart series - ordered rows with a uniform column set
use super::aggregate::{AggregationMode, Buckets, HOTSPOT_COLUMN};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub key: String,
    pub values: BTreeMap<String, f64>,
}

impl ChartRow {
    pub fn value(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(0.0)
    }
}

/// Materialized output consumed by chart renderers.
///
/// Every row carries every column in `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub key_field: &'static str,
    pub columns: Vec<String>,
    pub rows: Vec<ChartRow>,
}

impl ChartSeries {
    pub fn empty(mode: AggregationMode) -> Self {
        Self {
            key_field: mode.key_field(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }
}

/// Materializes buckets into a chart series.
///
/// Time-partitioned modes order rows ascending by temporal key with the
/// column set fixed to the union of observed categories. Activity mode
/// orders rows descending by total (ties by name) and keeps at most
/// `top_n` rows when given.
pub fn materialize(buckets: &Buckets, mode: AggregationMode, top_n: Option<usize>) -> ChartSeries {
    match mode.granularity() {
        Some(_) => materialize_timeline(buckets, mode),
        None => materialize_ranking(buckets, mode, top_n),
    }
}

fn materialize_timeline(buckets: &Buckets, mode: AggregationMode) -> ChartSeries {
    let columns: Vec<String> = buckets.categories().into_iter().map(str::to_string).collect();

    let mut keys: Vec<&str> = buckets.temporal_keys().collect();
    keys.sort_by(|a, b| compare_temporal_keys(a, b));

    let rows = keys
        .into_iter()
        .map(|key| ChartRow {
            key: key.to_string(),
            values: columns
                .iter()
                .map(|column| (column.clone(), buckets.total(key, column)))
                .collect(),
        })
        .collect();

    ChartSeries {
        key_field: mode.key_field(),
        columns,
        rows,
    }
}

fn materialize_ranking(buckets: &Buckets, mode: AggregationMode, top_n: Option<usize>) -> ChartSeries {
    if buckets.is_empty() {
        return ChartSeries::empty(mode);
    }

    let mut ranked: BTreeMap<&str, f64> = BTreeMap::new();
    for key in buckets.temporal_keys() {
        for category in buckets.categories() {
            *ranked.entry(category).or_default() += buckets.total(key, category);
        }
    }

    let mut ranked: Vec<(&str, f64)> = ranked.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    if let Some(n) = top_n {
        ranked.truncate(n);
    }

    let rows = ranked
        .into_iter()
        .map(|(category, total)| ChartRow {
            key: category.to_string(),
            values: BTreeMap::from([(HOTSPOT_COLUMN.to_string(), total)]),
        })
        .collect();

    ChartSeries {
        key_field: mode.key_field(),
        columns: vec![HOTSPOT_COLUMN.to_string()],
        rows,
    }
}

/// Orders `YYYY` / `YYYY-MM` keys numerically by year, then month.
///
/// Keys whose year component is not numeric sort after all numeric keys.
pub fn compare_temporal_keys(a: &str, b: &str) -> Ordering {
    temporal_sort_key(a)
        .cmp(&temporal_sort_key(b))
        .then_with(|| a.cmp(b))
}

fn temporal_sort_key(key: &str) -> (u64, u64) {
    let mut parts = key.splitn(2, '-');
    let year = parts
        .next()
        .and_then(|y| y.trim().parse::<u64>().ok())
        .unwrap_or(u64::MAX);
    let month = parts
        .next()
        .and_then(|m| m.trim().parse::<u64>().ok())
        .unwrap_or(0);
    (year, month)
}

struct RowView<'a> {
    key_field: &'static str,
    columns: &'a [String],
    row: &'a ChartRow,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry(self.key_field, &self.row.key)?;
        for column in self.columns {
            map.serialize_entry(column, &self.row.value(column))?;
        }
        map.end()
    }
}

impl Serialize for ChartSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<RowView<'_>> = self
            .rows
            .iter()
            .map(|row| RowView {
                key_field: self.key_field,
                columns: &self.columns,
                row,
            })
            .collect();

        let mut state = serializer.serialize_struct("ChartSeries", 3)?;
        state.serialize_field("key_field", self.key_field)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
