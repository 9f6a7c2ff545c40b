use std::path::{Path, PathBuf};

use anyhow::Result;

/// Accept existing delimited text files (.csv, .tsv or .txt).
pub fn validate_delimited_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb.extension().and_then(|s| s.to_str()).map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("csv") | Some("tsv") | Some("txt") => {}
        _ => anyhow::bail!("File must have a .csv, .tsv or .txt extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Delimiter byte for a one-character delimiter string; `\t` is accepted
/// for tabs.
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "\t" | "tab" => Ok(b'\t'),
        s if s.len() == 1 => Ok(s.as_bytes()[0]),
        _ => anyhow::bail!("Delimiter must be a single ASCII character, got '{}'", raw),
    }
}

/// Create `dir` (and parents) if needed.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        log::debug!("Created output directory {}", dir.display());
    }
    Ok(())
}
