use std::path::Path;

use anyhow::Context;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Serialize, Serializer};

use super::error::ImportError;

/// One data record of an uploaded file, keyed by trimmed header in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub line: usize,
    #[serde(serialize_with = "serialize_cells")]
    pub cells: Vec<(String, String)>,
}

impl RawRow {
    #[cfg(test)]
    pub fn from_pairs(line: usize, pairs: &[(&str, &str)]) -> Self {
        Self {
            line,
            cells: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// First non-empty trimmed value among the header aliases, compared
    /// case-insensitively.
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.cells
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(alias))
                .map(|(_, v)| v.trim())
                .filter(|v| !v.is_empty())
        })
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

/// Writes cells as a JSON object, keeping column order.
pub fn serialize_cells<S: Serializer>(cells: &[(String, String)], s: S) -> Result<S::Ok, S::Error> {
    s.collect_map(cells.iter().map(|(k, v)| (k, v)))
}

#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedCsv {
    pub fn has_column(&self, aliases: &[&str]) -> bool {
        self.headers
            .iter()
            .any(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
    }

    /// Every group must be present under one of its aliases.
    pub fn require_columns(&self, groups: &[&[&str]]) -> Result<(), ImportError> {
        let missing = groups
            .iter()
            .filter(|aliases| !self.has_column(aliases))
            .map(|aliases| aliases.join("/"))
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::Parse(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )))
        }
    }
}

pub fn check_file_type(path: &Path) -> Result<(), ImportError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        Ok(())
    } else {
        Err(ImportError::InvalidFileType {
            path: path.to_string_lossy().to_string(),
        })
    }
}

pub fn parse_rows(text: &str) -> Result<ParsedCsv, ImportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::Parse("file has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);
        let mut cells: Vec<(String, String)> = Vec::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() || cells.iter().any(|(k, _)| k == header) {
                continue;
            }
            cells.push((header.clone(), record.get(i).unwrap_or("").trim().to_string()));
        }
        rows.push(RawRow { line, cells });
    }
    Ok(ParsedCsv { headers, rows })
}

pub fn read_csv_file(path: &Path) -> Result<ParsedCsv, ImportError> {
    check_file_type(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| ImportError::Parse(format!("{}: {}", path.to_string_lossy(), e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ImportError::Parse("file is not valid UTF-8 text".to_string()))?;
    parse_rows(&text)
}

pub fn write_table(headers: &[String], rows: &[Vec<String>], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.to_string_lossy()))?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
