//! `xrisk explore`: load one table and summarise it.
use anyhow::{Context, Result};

use xrisk_classifiers::data_handling::{describe, TableSummary};
use xrisk_classifiers::io::{read_table_with_options, ReadOptions};

use crate::util::{parse_delimiter, validate_delimited_file};

pub fn run_explore(path: &str, delimiter: &str, outcome: Option<&str>) -> Result<TableSummary> {
    validate_delimited_file(path)?;
    let options = ReadOptions {
        delimiter: parse_delimiter(delimiter)?,
        ..ReadOptions::default()
    };
    let table = read_table_with_options(path, &options).with_context(|| format!("Failed to load {}", path))?;
    log::info!("Loaded {} rows x {} columns from {}", table.nrows(), table.ncols(), path);
    let summary = describe(&table, outcome)?;
    Ok(summary)
}
