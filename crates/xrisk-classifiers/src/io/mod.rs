//! Readers for delimited observation files.
pub mod delimited;

pub use delimited::{read_table, read_table_from_reader, read_table_with_options, ReadOptions};
