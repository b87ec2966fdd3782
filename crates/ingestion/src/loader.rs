//! Multi-file ingestion with delimiter sniffing.
//!
//! Every file in the input directory with an accepted extension is parsed
//! with each delimiter candidate in priority order; the first delimiter that
//! yields more than one column wins. Files that fail under every candidate
//! are skipped with a warning. Parsed tables are stacked by row.

use pm10_core::config::IngestionConfig;
use pm10_core::{Error, RawTable, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of parsing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// File path.
    pub path: PathBuf,
    /// Delimiter that produced the accepted parse.
    pub delimiter: char,
    /// Number of data rows.
    pub rows: usize,
    /// Number of columns.
    pub columns: usize,
}

/// Result of ingesting a directory.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// All parsed rows stacked in file order.
    pub table: RawTable,
    /// Files that parsed successfully.
    pub files: Vec<FileReport>,
    /// Files that were skipped, with the reason.
    pub warnings: Vec<String>,
}

/// Reads and merges all tabular files in a directory.
pub struct Ingestor {
    /// Accepted extensions (lowercase).
    extensions: Vec<String>,
    /// Delimiter candidates in priority order.
    delimiters: Vec<char>,
}

impl Ingestor {
    /// Create an ingestor from configuration.
    pub fn new(config: &IngestionConfig) -> Self {
        Self {
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
            delimiters: config.delimiters.clone(),
        }
    }

    /// List candidate files in sorted path order.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::ingestion(format!("cannot read directory {}: {}", dir.display(), e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.accepts(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x == &e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Ingest every accepted file under `dir`.
    ///
    /// Fails only when no file could be parsed.
    pub fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let paths = self.discover(dir)?;
        if paths.is_empty() {
            return Err(Error::ingestion(format!(
                "no tabular files found in {}",
                dir.display()
            )));
        }
        info!(files = paths.len(), dir = %dir.display(), "discovered input files");

        let mut table: Option<RawTable> = None;
        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for path in paths {
            match self.parse_file(&path) {
                Ok((parsed, delimiter)) => {
                    debug!(
                        file = %path.display(),
                        rows = parsed.len(),
                        columns = parsed.columns.len(),
                        delimiter = ?delimiter,
                        "parsed file"
                    );
                    files.push(FileReport {
                        path: path.clone(),
                        delimiter,
                        rows: parsed.len(),
                        columns: parsed.columns.len(),
                    });
                    match table.as_mut() {
                        Some(t) => t.append(parsed),
                        None => table = Some(parsed),
                    }
                }
                Err(reason) => {
                    let msg = format!("skipped {}: {}", path.display(), reason);
                    warn!("{}", msg);
                    warnings.push(msg);
                }
            }
        }

        let table = table.ok_or_else(|| {
            Error::ingestion(format!(
                "none of the files in {} could be parsed",
                dir.display()
            ))
        })?;

        info!(files = files.len(), rows = table.len(), "merged input tables");

        Ok(IngestReport {
            table,
            files,
            warnings,
        })
    }

    /// Parse a single file, trying each delimiter candidate in turn.
    pub fn parse_file(&self, path: &Path) -> std::result::Result<(RawTable, char), String> {
        let bytes = std::fs::read(path).map_err(|e| e.to_string())?;

        for &delimiter in &self.delimiters {
            let Ok(byte) = u8::try_from(delimiter) else {
                continue;
            };
            match parse_delimited(&bytes, byte) {
                Ok(table) if table.columns.len() > 1 => return Ok((table, delimiter)),
                Ok(_) => continue,
                Err(e) => {
                    debug!(file = %path.display(), delimiter = ?delimiter, error = %e, "delimiter rejected");
                    continue;
                }
            }
        }

        Err("no delimiter candidate produced more than one column".to_string())
    }
}

/// Parse delimited bytes with a header row.
///
/// Short rows are padded with missing cells. A row wider than the header
/// rejects the delimiter.
fn parse_delimited(bytes: &[u8], delimiter: u8) -> std::result::Result<RawTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = RawTable::new(columns);
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > table.columns.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(format!(
                "line {} has {} fields, header has {}",
                line,
                record.len(),
                table.columns.len()
            ));
        }
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();
        table.push_row(row);
    }
    Ok(table)
}
