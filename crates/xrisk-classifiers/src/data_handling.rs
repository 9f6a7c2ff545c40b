//! In-memory observation tables.
//!
//! A `Table` is an ordered set of equally long, named columns. Each column is
//! either numeric (missing values are NaN), a factor with a fixed, sorted
//! level set, or free text. Tables are treated as values: every operation
//! that changes cells returns a new table, except for the explicit
//! `set_value` used by the explainers on their own scratch copies.
use std::collections::BTreeMap;
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{Result, XriskError};

/// A single cell value, also used for profile grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Level(String),
    Missing,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Level(l) => write!(f, "{}", l),
            Value::Missing => write!(f, "NA"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else {
            Value::Number(v)
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Level(v.to_string())
    }
}

/// Declared or observed type of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    /// `levels: None` in a declared schema means "infer the levels".
    Factor { levels: Option<Vec<String>> },
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

/// Ordered column names and types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn numeric(mut self, name: &str) -> Self {
        self.columns.push(ColumnSchema {
            name: name.to_string(),
            column_type: ColumnType::Numeric,
        });
        self
    }

    pub fn factor(mut self, name: &str, levels: Option<&[&str]>) -> Self {
        self.columns.push(ColumnSchema {
            name: name.to_string(),
            column_type: ColumnType::Factor {
                levels: levels.map(|l| l.iter().map(|s| s.to_string()).collect()),
            },
        });
        self
    }

    pub fn text(mut self, name: &str) -> Self {
        self.columns.push(ColumnSchema {
            name: name.to_string(),
            column_type: ColumnType::Text,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.column_type)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Check that `other` carries the same type (and factor levels) as `self`
    /// for each of `names`.
    pub fn ensure_compatible<S: AsRef<str>>(&self, other: &Schema, names: &[S]) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            let ours = self.get(name).ok_or_else(|| {
                XriskError::SchemaMismatch(format!("column '{}' is not part of the schema", name))
            })?;
            let theirs = other.get(name).ok_or_else(|| {
                XriskError::SchemaMismatch(format!("column '{}' is missing", name))
            })?;
            if ours != theirs {
                return Err(XriskError::SchemaMismatch(format!(
                    "column '{}' is {:?}, expected {:?}",
                    name, theirs, ours
                )));
            }
        }
        Ok(())
    }
}

/// Column storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Factor {
        levels: Vec<String>,
        codes: Vec<Option<u32>>,
    },
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Factor { codes, .. } => codes.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Numeric(_) => ColumnType::Numeric,
            ColumnData::Factor { levels, .. } => ColumnType::Factor {
                levels: Some(levels.clone()),
            },
            ColumnData::Text(_) => ColumnType::Text,
        }
    }

    pub fn value(&self, row: usize) -> Value {
        match self {
            ColumnData::Numeric(v) => Value::from(v[row]),
            ColumnData::Factor { levels, codes } => match codes[row] {
                Some(code) => Value::Level(levels[code as usize].clone()),
                None => Value::Missing,
            },
            ColumnData::Text(v) => match &v[row] {
                Some(s) => Value::Level(s.clone()),
                None => Value::Missing,
            },
        }
    }

    fn select(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Factor { levels, codes } => ColumnData::Factor {
                levels: levels.clone(),
                codes: indices.iter().map(|&i| codes[i]).collect(),
            },
            ColumnData::Text(v) => ColumnData::Text(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Numeric view of a cell used for model input: factor cells become their
    /// level code, missing cells NaN.
    fn encoded(&self, row: usize) -> Option<f32> {
        match self {
            ColumnData::Numeric(v) => Some(v[row] as f32),
            ColumnData::Factor { codes, .. } => Some(codes[row].map_or(f32::NAN, |c| c as f32)),
            ColumnData::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: &str, values: Vec<f64>) -> Self {
        Column {
            name: name.to_string(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Build a factor column with explicit levels; every value must be one of
    /// them (or "NA").
    pub fn factor(name: &str, levels: &[&str], values: &[&str]) -> Result<Self> {
        let levels: Vec<String> = levels.iter().map(|s| s.to_string()).collect();
        let codes = values
            .iter()
            .map(|v| encode_level(name, &levels, v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Column {
            name: name.to_string(),
            data: ColumnData::Factor { levels, codes },
        })
    }

    /// Build a factor column whose levels are the sorted distinct values.
    pub fn factor_from_values(name: &str, values: &[&str]) -> Self {
        let mut levels: Vec<&str> = values.iter().copied().filter(|v| !is_missing(v)).collect();
        levels.sort_unstable();
        levels.dedup();
        // Levels are derived from the values themselves, so encoding cannot fail.
        let levels: Vec<String> = levels.iter().map(|s| s.to_string()).collect();
        let codes = values
            .iter()
            .map(|v| {
                if is_missing(v) {
                    None
                } else {
                    levels.iter().position(|l| l == v).map(|p| p as u32)
                }
            })
            .collect();
        Column {
            name: name.to_string(),
            data: ColumnData::Factor { levels, codes },
        }
    }

    pub fn text(name: &str, values: &[&str]) -> Self {
        Column {
            name: name.to_string(),
            data: ColumnData::Text(
                values
                    .iter()
                    .map(|v| if is_missing(v) { None } else { Some(v.to_string()) })
                    .collect(),
            ),
        }
    }
}

pub(crate) fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw == "NA"
}

pub(crate) fn encode_level(column: &str, levels: &[String], raw: &str) -> Result<Option<u32>> {
    if is_missing(raw) {
        return Ok(None);
    }
    levels
        .iter()
        .position(|l| l == raw)
        .map(|p| Some(p as u32))
        .ok_or_else(|| {
            XriskError::schema(column, format!("value '{}' is not one of the levels {:?}", raw, levels))
        })
}

/// An ordered collection of equally long named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    nrows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let nrows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for column in &columns {
            if column.data.len() != nrows {
                return Err(XriskError::schema(
                    &column.name,
                    format!("has {} rows, expected {}", column.data.len(), nrows),
                ));
            }
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(XriskError::schema(&column.name, "duplicate column name"));
            }
        }
        Ok(Table { columns, nrows })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| XriskError::MissingColumn(name.to_string()))
    }

    fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| XriskError::MissingColumn(name.to_string()))
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match &self.column(name)?.data {
            ColumnData::Numeric(v) => Ok(v),
            other => Err(XriskError::schema(
                name,
                format!("expected a numeric column, found {:?}", other.column_type()),
            )),
        }
    }

    pub fn value(&self, row: usize, name: &str) -> Result<Value> {
        if row >= self.nrows {
            return Err(XriskError::InvalidInput(format!(
                "row {} out of range ({} rows)",
                row, self.nrows
            )));
        }
        Ok(self.column(name)?.data.value(row))
    }

    /// A one-row table holding row `index`.
    pub fn row(&self, index: usize) -> Result<Table> {
        if index >= self.nrows {
            return Err(XriskError::InvalidInput(format!(
                "row {} out of range ({} rows)",
                index, self.nrows
            )));
        }
        Ok(self.select_rows(&[index]))
    }

    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(indices),
                })
                .collect(),
            nrows: indices.len(),
        }
    }

    /// Projection onto `names`, in the requested order.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|n| self.column(n.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    /// Copy of the table with every row of `name` set to `value`.
    pub fn with_value(&self, name: &str, value: &Value) -> Result<Table> {
        let mut table = self.clone();
        table.set_value(name, value)?;
        Ok(table)
    }

    /// Set every row of `name` to `value` in place.
    pub fn set_value(&mut self, name: &str, value: &Value) -> Result<()> {
        let nrows = self.nrows;
        let column = self.column_mut(name)?;
        match (&mut column.data, value) {
            (ColumnData::Numeric(v), Value::Number(x)) => v.iter_mut().for_each(|c| *c = *x),
            (ColumnData::Numeric(v), Value::Missing) => v.iter_mut().for_each(|c| *c = f64::NAN),
            (ColumnData::Factor { levels, codes }, Value::Level(l)) => {
                let code = encode_level(name, levels, l)
                    .map_err(|_| XriskError::SchemaMismatch(format!("'{}' is not a level of '{}'", l, name)))?;
                codes.iter_mut().for_each(|c| *c = code);
            }
            (ColumnData::Factor { codes, .. }, Value::Missing) => codes.iter_mut().for_each(|c| *c = None),
            (ColumnData::Text(v), Value::Level(l)) => *v = vec![Some(l.clone()); nrows],
            (ColumnData::Text(v), Value::Missing) => *v = vec![None; nrows],
            (data, value) => {
                return Err(XriskError::SchemaMismatch(format!(
                    "cannot assign {:?} to column '{}' of type {:?}",
                    value,
                    name,
                    data.column_type()
                )))
            }
        }
        Ok(())
    }

    /// Copy of the table where `name` takes, at row `i`, the value that was
    /// at row `order[i]`. Every other column is left untouched.
    pub fn with_column_permuted(&self, name: &str, order: &[usize]) -> Result<Table> {
        if order.len() != self.nrows {
            return Err(XriskError::InvalidInput(format!(
                "permutation has {} entries for {} rows",
                order.len(),
                self.nrows
            )));
        }
        let mut table = self.clone();
        let column = table.column_mut(name)?;
        column.data = column.data.select(order);
        Ok(table)
    }

    pub fn schema(&self) -> Schema {
        Schema {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnSchema {
                    name: c.name.clone(),
                    column_type: c.data.column_type(),
                })
                .collect(),
        }
    }

    /// Re-code this table's factor columns onto the level sets of
    /// `reference`, so that level codes mean the same thing in both.
    ///
    /// Both tables must carry the same column names in the same order and
    /// the same column kinds; a value whose level is unknown to `reference`
    /// is a schema mismatch.
    pub fn conform_to(&self, reference: &Table) -> Result<Table> {
        if self.column_names() != reference.column_names() {
            return Err(XriskError::SchemaMismatch(format!(
                "columns {:?} do not match reference columns {:?}",
                self.column_names(),
                reference.column_names()
            )));
        }
        let mut columns = Vec::with_capacity(self.columns.len());
        for (ours, theirs) in self.columns.iter().zip(reference.columns.iter()) {
            let data = match (&ours.data, &theirs.data) {
                (ColumnData::Numeric(v), ColumnData::Numeric(_)) => ColumnData::Numeric(v.clone()),
                (ColumnData::Text(v), ColumnData::Text(_)) => ColumnData::Text(v.clone()),
                (ColumnData::Factor { levels, codes }, ColumnData::Factor { levels: ref_levels, .. }) => {
                    let mapping = levels
                        .iter()
                        .map(|l| {
                            ref_levels.iter().position(|r| r == l).ok_or_else(|| {
                                XriskError::SchemaMismatch(format!(
                                    "level '{}' of column '{}' is not present in the reference table",
                                    l, ours.name
                                ))
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    ColumnData::Factor {
                        levels: ref_levels.clone(),
                        codes: codes
                            .iter()
                            .map(|c| c.map(|c| mapping[c as usize] as u32))
                            .collect(),
                    }
                }
                (a, b) => {
                    return Err(XriskError::SchemaMismatch(format!(
                        "column '{}' is {:?}, reference is {:?}",
                        ours.name,
                        a.column_type(),
                        b.column_type()
                    )))
                }
            };
            columns.push(Column {
                name: ours.name.clone(),
                data,
            });
        }
        Table::new(columns)
    }

    /// 0/1 labels from a factor (or text) outcome column: 1 where the value
    /// equals `positive`.
    pub fn binary_labels(&self, column: &str, positive: &str) -> Result<Vec<i32>> {
        let col = self.column(column)?;
        match &col.data {
            ColumnData::Factor { levels, .. } if !levels.iter().any(|l| l == positive) => {
                Err(XriskError::schema(
                    column,
                    format!("positive level '{}' not among {:?}", positive, levels),
                ))
            }
            ColumnData::Numeric(_) => Err(XriskError::schema(column, "outcome column must be categorical")),
            data => (0..self.nrows)
                .map(|row| match data.value(row) {
                    Value::Level(l) => Ok(i32::from(l == positive)),
                    _ => Err(XriskError::InvalidInput(format!(
                        "missing outcome in column '{}' at row {}",
                        column, row
                    ))),
                })
                .collect(),
        }
    }

    /// Row-major model input for `features`: numeric values as-is, factor
    /// cells as their level code.
    pub fn design_matrix<S: AsRef<str>>(&self, features: &[S]) -> Result<Array2<f32>> {
        let columns = features
            .iter()
            .map(|f| self.column(f.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if let Some(text) = columns.iter().find(|c| matches!(c.data, ColumnData::Text(_))) {
            return Err(XriskError::schema(&text.name, "text columns cannot be used as model input"));
        }
        let mut data = Vec::with_capacity(self.nrows * columns.len());
        for row in 0..self.nrows {
            for column in &columns {
                data.push(column.data.encoded(row).unwrap_or(f32::NAN));
            }
        }
        Array2::from_shape_vec((self.nrows, columns.len()), data)
            .map_err(|e| XriskError::InvalidInput(e.to_string()))
    }
}

/// Mean, spread and range of a numeric column (missing values skipped).
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl NumericSummary {
    fn from_values<'a>(values: impl Iterator<Item = &'a f64>) -> Self {
        let present: Vec<f64> = values.copied().filter(|v| !v.is_nan()).collect();
        NumericSummary {
            count: present.len(),
            mean: present.iter().mean(),
            std_dev: present.iter().std_dev(),
            min: present.iter().copied().fold(f64::INFINITY, f64::min),
            max: present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric {
        name: String,
        overall: NumericSummary,
        by_outcome: Vec<(String, NumericSummary)>,
    },
    Factor {
        name: String,
        counts: Vec<(String, usize)>,
        by_outcome: Vec<(String, Vec<(String, usize)>)>,
    },
    Text {
        name: String,
        distinct: usize,
    },
}

/// Exploration summary of a table, optionally stratified by an outcome.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub outcome: Option<String>,
    pub columns: Vec<ColumnSummary>,
}

/// Summarise every column of `table`, stratified by the levels of `outcome`
/// when given.
pub fn describe(table: &Table, outcome: Option<&str>) -> Result<TableSummary> {
    let strata: Vec<(String, Vec<usize>)> = match outcome {
        Some(name) => {
            let column = table.column(name)?;
            let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            for row in 0..table.nrows() {
                groups.entry(column.data.value(row).to_string()).or_default().push(row);
            }
            groups.into_iter().collect()
        }
        None => Vec::new(),
    };

    let mut columns = Vec::with_capacity(table.ncols());
    for column in table.columns() {
        if Some(column.name.as_str()) == outcome {
            continue;
        }
        let summary = match &column.data {
            ColumnData::Numeric(v) => ColumnSummary::Numeric {
                name: column.name.clone(),
                overall: NumericSummary::from_values(v.iter()),
                by_outcome: strata
                    .iter()
                    .map(|(level, rows)| {
                        (level.clone(), NumericSummary::from_values(rows.iter().map(|&r| &v[r])))
                    })
                    .collect(),
            },
            ColumnData::Factor { levels, codes } => {
                let count = |rows: &mut dyn Iterator<Item = usize>| {
                    let mut counts = vec![0usize; levels.len()];
                    let mut missing = 0usize;
                    for r in rows {
                        match codes[r] {
                            Some(c) => counts[c as usize] += 1,
                            None => missing += 1,
                        }
                    }
                    let mut out: Vec<(String, usize)> = levels.iter().cloned().zip(counts).collect();
                    if missing > 0 {
                        out.push(("NA".to_string(), missing));
                    }
                    out
                };
                ColumnSummary::Factor {
                    name: column.name.clone(),
                    counts: count(&mut (0..table.nrows())),
                    by_outcome: strata
                        .iter()
                        .map(|(level, rows)| (level.clone(), count(&mut rows.iter().copied())))
                        .collect(),
                }
            }
            ColumnData::Text(v) => {
                let mut distinct: Vec<&Option<String>> = v.iter().collect();
                distinct.sort();
                distinct.dedup();
                ColumnSummary::Text {
                    name: column.name.clone(),
                    distinct: distinct.len(),
                }
            }
        };
        columns.push(summary);
    }

    Ok(TableSummary {
        rows: table.nrows(),
        outcome: outcome.map(str::to_string),
        columns,
    })
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "----- Table Summary ({} rows) -----", self.rows)?;
        for column in &self.columns {
            match column {
                ColumnSummary::Numeric { name, overall, by_outcome } => {
                    writeln!(
                        f,
                        "{:<28} mean {:>10.3}  sd {:>10.3}  range [{}, {}]",
                        name, overall.mean, overall.std_dev, overall.min, overall.max
                    )?;
                    for (level, s) in by_outcome {
                        writeln!(f, "    {:<24} mean {:>10.3}  sd {:>10.3}  n {}", level, s.mean, s.std_dev, s.count)?;
                    }
                }
                ColumnSummary::Factor { name, counts, by_outcome } => {
                    let overall: Vec<String> = counts.iter().map(|(l, n)| format!("{}: {}", l, n)).collect();
                    writeln!(f, "{:<28} {}", name, overall.join(", "))?;
                    for (level, c) in by_outcome {
                        let parts: Vec<String> = c.iter().map(|(l, n)| format!("{}: {}", l, n)).collect();
                        writeln!(f, "    {:<24} {}", level, parts.join(", "))?;
                    }
                }
                ColumnSummary::Text { name, distinct } => {
                    writeln!(f, "{:<28} {} distinct values", name, distinct)?;
                }
            }
        }
        write!(f, "-----------------------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> Table {
        Table::new(vec![
            Column::factor_from_values("Gender", &["Male", "Female", "Male"]),
            Column::numeric("Age", vec![25.0, 45.0, 85.0]),
            Column::factor_from_values("Death", &["No", "No", "Yes"]),
        ])
        .unwrap()
    }

    #[test]
    fn factor_levels_are_sorted() {
        let table = small_table();
        match &table.column("Gender").unwrap().data {
            ColumnData::Factor { levels, codes } => {
                assert_eq!(levels, &vec!["Female".to_string(), "Male".to_string()]);
                assert_eq!(codes, &vec![Some(1), Some(0), Some(1)]);
            }
            _ => panic!("expected factor"),
        }
    }

    #[test]
    fn unequal_columns_are_rejected() {
        let err = Table::new(vec![
            Column::numeric("a", vec![1.0, 2.0]),
            Column::numeric("b", vec![1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, XriskError::Schema { .. }));
    }

    #[test]
    fn with_value_leaves_other_columns() {
        let table = small_table();
        let changed = table.with_value("Age", &Value::Number(60.0)).unwrap();
        assert_eq!(changed.numeric("Age").unwrap(), &[60.0, 60.0, 60.0]);
        assert_eq!(changed.column("Gender").unwrap(), table.column("Gender").unwrap());
        // the source table is untouched
        assert_eq!(table.numeric("Age").unwrap(), &[25.0, 45.0, 85.0]);
    }

    #[test]
    fn unknown_level_assignment_is_mismatch() {
        let table = small_table();
        let err = table.with_value("Gender", &Value::from("Other")).unwrap_err();
        assert!(matches!(err, XriskError::SchemaMismatch(_)));
    }

    #[test]
    fn conform_recodes_levels() {
        let reference = small_table();
        let other = Table::new(vec![
            Column::factor_from_values("Gender", &["Male"]),
            Column::numeric("Age", vec![30.0]),
            Column::factor_from_values("Death", &["No"]),
        ])
        .unwrap();
        let conformed = other.conform_to(&reference).unwrap();
        assert_eq!(conformed.value(0, "Gender").unwrap(), Value::from("Male"));
        assert_eq!(conformed.schema(), reference.schema());
    }

    #[test]
    fn binary_labels_from_outcome() {
        let table = small_table();
        assert_eq!(table.binary_labels("Death", "Yes").unwrap(), vec![0, 0, 1]);
        assert!(table.binary_labels("Death", "Maybe").is_err());
    }

    #[test]
    fn design_matrix_encodes_factors() {
        let table = small_table();
        let x = table.design_matrix(&["Age", "Gender"]).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x[[0, 0]], 25.0);
        assert_eq!(x[[1, 1]], 0.0);
    }

    #[test]
    fn describe_stratifies_by_outcome() {
        let summary = describe(&small_table(), Some("Death")).unwrap();
        assert_eq!(summary.columns.len(), 2);
        match &summary.columns[1] {
            ColumnSummary::Numeric { overall, by_outcome, .. } => {
                assert!((overall.mean - 155.0 / 3.0).abs() < 1e-9);
                assert_eq!(by_outcome.len(), 2);
                assert_eq!(by_outcome[1].1.count, 1);
            }
            other => panic!("unexpected summary {:?}", other),
        }
        assert!(summary.to_string().contains("Age"));
    }
}
