//! Reading uploaded tables and serialising annotated results.

use std::{fs::File, io::Cursor, path::Path};

use clap::ValueEnum;
use polars::prelude::{
    CsvParseOptions, CsvReadOptions, CsvWriter, DataFrame, ParquetReader, ParquetWriter,
    SerReader, SerWriter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PipelineError;

const SEPARATORS: &[u8] = b",;\t";

/// On-disk and on-the-wire table encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Parquet,
}

impl TableFormat {
    /// Guess the encoding from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") | Some("txt") | Some("tsv") => Ok(Self::Csv),
            Some("parquet") | Some("pq") => Ok(Self::Parquet),
            other => Err(PipelineError::MalformedInput(format!(
                "unsupported table extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Parquet => "application/vnd.apache.parquet",
        }
    }
}

/// Read a table from disk, picking the decoder from the extension.
pub fn read_path(path: &Path) -> Result<DataFrame, PipelineError> {
    let format = TableFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|err| {
        PipelineError::MalformedInput(format!("cannot read {}: {err}", path.display()))
    })?;
    let frame = read_bytes(bytes, format)?;
    info!(path = %path.display(), rows = frame.height(), columns = frame.width(), "loaded table");
    Ok(frame)
}

/// Decode an in-memory upload.
pub fn read_bytes(bytes: Vec<u8>, format: TableFormat) -> Result<DataFrame, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::MalformedInput("upload is empty".into()));
    }
    let frame = match format {
        TableFormat::Csv => {
            let separator = sniff_separator(&bytes);
            debug!(separator = %(separator as char).escape_default(), "parsing csv upload");
            CsvReadOptions::default()
                .with_has_header(true)
                .with_parse_options(CsvParseOptions::default().with_separator(separator))
                .into_reader_with_file_handle(Cursor::new(bytes))
                .finish()
        }
        TableFormat::Parquet => ParquetReader::new(Cursor::new(bytes)).finish(),
    }
    .map_err(|err| PipelineError::MalformedInput(err.to_string()))?;
    normalize_headers(frame)
}

/// Encode a table into a byte stream.
pub fn to_bytes(frame: &mut DataFrame, format: TableFormat) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    match format {
        TableFormat::Csv => CsvWriter::new(&mut buf).include_header(true).finish(frame)?,
        TableFormat::Parquet => {
            ParquetWriter::new(&mut buf).finish(frame)?;
        }
    }
    Ok(buf)
}

/// Write a table to disk, picking the encoder from the extension.
pub fn write_path(frame: &mut DataFrame, path: &Path) -> Result<(), PipelineError> {
    let format = TableFormat::from_path(path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| PipelineError::Processing(format!("create {parent:?}: {err}")))?;
    }
    let mut file = File::create(path)
        .map_err(|err| PipelineError::Processing(format!("create {path:?}: {err}")))?;
    match format {
        TableFormat::Csv => CsvWriter::new(&mut file).include_header(true).finish(frame)?,
        TableFormat::Parquet => {
            ParquetWriter::new(file).finish(frame)?;
        }
    }
    info!(path = %path.display(), rows = frame.height(), "wrote table");
    Ok(())
}

/// Pick the most frequent candidate separator on the header line.
fn sniff_separator(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    SEPARATORS
        .iter()
        .map(|sep| (*sep, header.iter().filter(|b| *b == sep).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(sep, _)| sep)
        .unwrap_or(b',')
}

/// Spreadsheet exports carry stray whitespace and byte-order marks in headers.
fn normalize_headers(mut frame: DataFrame) -> Result<DataFrame, PipelineError> {
    let names: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for name in names {
        let clean = name.trim().trim_matches('\u{feff}').trim();
        if clean != name {
            if frame.get_column_index(clean).is_some() {
                return Err(PipelineError::MalformedInput(format!(
                    "header `{clean}` appears more than once"
                )));
            }
            frame.rename(&name, clean.into())?;
        }
    }
    Ok(frame)
}
