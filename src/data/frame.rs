//! Column-oriented feature table.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};

/// A typed column. Missing numeric values are NaN.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<DateTime<Utc>>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Text(_) => "text",
            Column::Timestamp(_) => "timestamp",
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            Column::Timestamp(v) => Column::Timestamp(rows.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// Parse the timestamp spellings found in feature exports: RFC 3339,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render a numeric identifier without a trailing `.0`.
fn numeric_label(v: f64) -> Option<String> {
    if !v.is_finite() {
        None
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        Some(format!("{}", v as i64))
    } else {
        Some(v.to_string())
    }
}

/// Feature table keyed by column name; every column has the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureFrame {
    len: usize,
    columns: BTreeMap<String, Column>,
}

impl FeatureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from named columns, checking that lengths agree.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut frame = Self::new();
        for (name, column) in columns {
            frame.insert(name, column)?;
        }
        Ok(frame)
    }

    /// Add or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        let replacing_only = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only && column.len() != self.len {
            return Err(Error::Dataset(format!(
                "column '{name}' has {} rows, frame has {}",
                column.len(),
                self.len
            )));
        }
        self.len = column.len();
        self.columns.insert(name, column);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Finite values of a numeric column; NaN and ±inf are dropped.
    pub fn finite_values(&self, name: &str) -> Option<Vec<f64>> {
        match self.columns.get(name)? {
            Column::Numeric(v) => Some(v.iter().copied().filter(|x| x.is_finite()).collect()),
            _ => None,
        }
    }

    /// String labels of a column (text as-is, integral numbers without decimals).
    pub fn labels(&self, name: &str) -> Option<Vec<Option<String>>> {
        match self.columns.get(name)? {
            Column::Text(v) => Some(v.clone()),
            Column::Numeric(v) => Some(v.iter().map(|&x| numeric_label(x)).collect()),
            Column::Timestamp(_) => None,
        }
    }

    /// Timestamps of a column, parsing text columns on the fly.
    ///
    /// Numeric columns are read as epoch milliseconds, the unit pandas uses
    /// when writing datetimes to JSON.
    pub fn timestamps(&self, name: &str) -> Option<Vec<Option<DateTime<Utc>>>> {
        match self.columns.get(name)? {
            Column::Timestamp(v) => Some(v.clone()),
            Column::Text(v) => {
                Some(v.iter().map(|s| s.as_deref().and_then(parse_timestamp)).collect())
            }
            Column::Numeric(v) => Some(
                v.iter()
                    .map(|&ms| {
                        if ms.is_finite() {
                            DateTime::from_timestamp_millis(ms as i64)
                        } else {
                            None
                        }
                    })
                    .collect(),
            ),
        }
    }

    /// Distinct, non-empty entity identifiers in a column.
    pub fn entity_ids(&self, name: &str) -> BTreeSet<String> {
        self.labels(name)
            .map(|labels| labels.into_iter().flatten().filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Row indices per entity identifier.
    pub fn group_rows(&self, name: &str) -> BTreeMap<String, Vec<usize>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        if let Some(labels) = self.labels(name) {
            for (row, label) in labels.into_iter().enumerate() {
                if let Some(label) = label.filter(|s| !s.is_empty()) {
                    groups.entry(label).or_default().push(row);
                }
            }
        }
        groups
    }

    /// New frame holding only the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> FeatureFrame {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col.take(rows)))
            .collect();
        FeatureFrame { len: rows.len(), columns }
    }

    /// Latest timestamp in a column, ignoring missing values.
    pub fn max_timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.timestamps(name)?.into_iter().flatten().max()
    }

    /// Rows whose timestamp lies within `lookback` of the column's own
    /// maximum (not wall-clock time). Rows without a timestamp are dropped.
    /// A lookback reaching past the representable range keeps every
    /// timestamped row.
    ///
    /// Returns `None` if the column is missing or not timestamp-like.
    pub fn filter_recent(&self, name: &str, lookback: Duration) -> Option<FeatureFrame> {
        let stamps = self.timestamps(name)?;
        let Some(max) = stamps.iter().flatten().max().copied() else {
            return Some(self.take(&[]));
        };
        let cutoff = max.checked_sub_signed(lookback);
        let rows: Vec<usize> = stamps
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| ts.filter(|t| cutoff.map_or(true, |c| *t >= c)).map(|_| i))
            .collect();
        Some(self.take(&rows))
    }
}
