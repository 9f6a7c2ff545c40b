//! Delimited text reader (semicolon separated by default, header row
//! required).
use std::path::Path;

use crate::data_handling::{is_missing, Column, ColumnData, ColumnType, Schema, Table};
use crate::error::{Result, XriskError};

/// Options for reading a delimited observation file.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: u8,
    /// Text columns without a declared type become factors when set,
    /// plain text otherwise.
    pub strings_as_factors: bool,
    /// Optional declared types; undeclared columns are inferred.
    pub schema: Option<Schema>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            strings_as_factors: true,
            schema: None,
        }
    }
}

/// Read a semicolon separated file, turning text columns into factors.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    read_table_with_options(path, &ReadOptions::default())
}

pub fn read_table_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Table> {
    let file = std::fs::File::open(&path)?;
    let table = read_table_from_reader(file, options)?;
    log::debug!(
        "Loaded {} rows x {} columns from {}",
        table.nrows(),
        table.ncols(),
        path.as_ref().display()
    );
    Ok(table)
}

/// Parse a delimited table from any reader.
pub fn read_table_from_reader<R: std::io::Read>(reader: R, options: &ReadOptions) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(XriskError::Parse {
            line: 1,
            message: "empty header row".to_string(),
        });
    }

    if let Some(schema) = &options.schema {
        let absent = schema
            .names()
            .into_iter()
            .find(|n| !headers.iter().any(|h| h.as_str() == *n));
        if let Some(absent) = absent {
            return Err(XriskError::schema(absent, "declared column not present in the header"));
        }
    }

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != headers.len() {
            return Err(XriskError::Parse {
                line,
                message: format!("expected {} fields, found {}", headers.len(), record.len()),
            });
        }
        for (column, field) in raw.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .iter()
        .zip(raw.iter())
        .map(|(name, values)| {
            let declared = options.schema.as_ref().and_then(|s| s.get(name));
            build_column(name, values, declared, options.strings_as_factors)
        })
        .collect::<Result<Vec<_>>>()?;

    Table::new(columns)
}

fn build_column(
    name: &str,
    values: &[String],
    declared: Option<&ColumnType>,
    strings_as_factors: bool,
) -> Result<Column> {
    let refs: Vec<&str> = values.iter().map(String::as_str).collect();
    match declared {
        Some(ColumnType::Numeric) => Ok(Column {
            name: name.to_string(),
            data: ColumnData::Numeric(parse_numeric(&refs).map_err(|(row, raw)| {
                XriskError::schema(name, format!("row {}: '{}' is not numeric", row + 1, raw))
            })?),
        }),
        Some(ColumnType::Factor { levels: Some(levels) }) => {
            let levels: Vec<&str> = levels.iter().map(String::as_str).collect();
            Column::factor(name, &levels, &refs)
        }
        Some(ColumnType::Factor { levels: None }) => Ok(Column::factor_from_values(name, &refs)),
        Some(ColumnType::Text) => Ok(Column::text(name, &refs)),
        None => match parse_numeric(&refs) {
            Ok(numbers) if refs.iter().any(|v| !is_missing(v)) => Ok(Column::numeric(name, numbers)),
            _ if strings_as_factors => Ok(Column::factor_from_values(name, &refs)),
            _ => Ok(Column::text(name, &refs)),
        },
    }
}

/// Parse every value as a number, `NA`/empty as NaN. On failure returns the
/// offending row and text.
fn parse_numeric<'a>(values: &[&'a str]) -> std::result::Result<Vec<f64>, (usize, &'a str)> {
    values
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            if is_missing(raw) {
                Ok(f64::NAN)
            } else {
                raw.parse::<f64>().map_err(|_| (row, *raw))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::Value;

    const COVID: &str = "Gender;Age;Cancer;Death\nMale;25;No;No\nFemale;45;Yes;No\nMale;85;No;Yes\n";

    #[test]
    fn infers_numeric_and_factor_columns() {
        let table = read_table_from_reader(COVID.as_bytes(), &ReadOptions::default()).unwrap();
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.column_names(), vec!["Gender", "Age", "Cancer", "Death"]);
        assert_eq!(table.numeric("Age").unwrap(), &[25.0, 45.0, 85.0]);
        assert_eq!(table.value(1, "Gender").unwrap(), Value::from("Female"));
    }

    #[test]
    fn text_columns_without_factor_flag() {
        let options = ReadOptions {
            strings_as_factors: false,
            ..ReadOptions::default()
        };
        let table = read_table_from_reader(COVID.as_bytes(), &options).unwrap();
        assert!(matches!(table.column("Gender").unwrap().data, ColumnData::Text(_)));
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let data = "a;b\n1;2\n3\n";
        let err = read_table_from_reader(data.as_bytes(), &ReadOptions::default()).unwrap_err();
        match err {
            XriskError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn declared_numeric_column_must_parse() {
        let options = ReadOptions {
            schema: Some(Schema::new().numeric("Gender")),
            ..ReadOptions::default()
        };
        let err = read_table_from_reader(COVID.as_bytes(), &options).unwrap_err();
        assert!(matches!(err, XriskError::Schema { .. }));
    }

    #[test]
    fn declared_column_must_be_in_header() {
        let options = ReadOptions {
            schema: Some(Schema::new().numeric("Age").factor("Smoker", None)),
            ..ReadOptions::default()
        };
        match read_table_from_reader(COVID.as_bytes(), &options).unwrap_err() {
            XriskError::Schema { column, .. } => assert_eq!(column, "Smoker"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn declared_levels_reject_unknown_values() {
        let options = ReadOptions {
            schema: Some(Schema::new().factor("Cancer", Some(&["No"]))),
            ..ReadOptions::default()
        };
        let err = read_table_from_reader(COVID.as_bytes(), &options).unwrap_err();
        assert!(matches!(err, XriskError::Schema { .. }));
    }

    #[test]
    fn missing_values_become_nan() {
        let data = "Age;Death\nNA;No\n40;Yes\n";
        let table = read_table_from_reader(data.as_bytes(), &ReadOptions::default()).unwrap();
        let ages = table.numeric("Age").unwrap();
        assert!(ages[0].is_nan());
        assert_eq!(ages[1], 40.0);
    }
}
