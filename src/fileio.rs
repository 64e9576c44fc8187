use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use fasttable::record::{Record, RecordId};

use crate::config::AppConfig;

/// Detected file format
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
}

impl FileFormat {
    /// Detect format from file extension
    fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" | "tab" => Some(FileFormat::Tsv),
            _ => None,
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv => b',',
            FileFormat::Tsv => b'\t',
        }
    }
}

/// Result of loading a file, including any warnings
pub struct LoadResult {
    /// Column names from the first row
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    pub warnings: Vec<String>,
}

pub struct FileIO {
    pub file_path: PathBuf,
    delimiter: u8,
}

impl FileIO {
    pub fn new(file_path: PathBuf, delimiter: Option<u8>) -> Self {
        let delimiter = delimiter
            .or_else(|| FileFormat::from_extension(&file_path).map(|f| f.delimiter()))
            .unwrap_or(b',');
        Self { file_path, delimiter }
    }

    pub fn file_name(&self) -> String {
        self.file_path.display().to_string()
    }

    pub fn delimiter_name(&self) -> String {
        match self.delimiter {
            b',' => "comma".to_string(),
            b'\t' => "tab".to_string(),
            b';' => "semicolon".to_string(),
            b'|' => "pipe".to_string(),
            c => format!("'{}'", c as char),
        }
    }

    pub fn modified(&self) -> io::Result<SystemTime> {
        fs::metadata(&self.file_path)?.modified()
    }

    /// Read every row after the header into a record keyed by column name
    pub fn load(&self, config: &AppConfig) -> io::Result<LoadResult> {
        let file = File::open(&self.file_path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Fields)
            .from_reader(BufReader::new(file));

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut warnings = Vec::new();

        let id_index = match &config.id_column {
            Some(name) => {
                let index = headers.iter().position(|h| h == name);
                if index.is_none() {
                    warnings.push(format!("No id column '{}', numbering rows", name));
                }
                index
            }
            None => None,
        };

        let mut default_fields: Vec<&str> = config
            .default_fields
            .iter()
            .filter(|f| headers.contains(*f))
            .map(String::as_str)
            .collect();
        if default_fields.is_empty() {
            default_fields = headers.iter().map(String::as_str).collect();
        }

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut padded = 0;

        for (row_no, result) in reader.records().enumerate() {
            let row = result.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            if row.len() < headers.len() {
                padded += 1;
            }

            let id = match id_index.and_then(|i| row.get(i)) {
                Some(raw) => parse_id(raw),
                None => RecordId::Int(row_no as i64 + 1),
            };
            if !seen.insert(id.clone()) {
                warn!(%id, row = row_no + 1, "duplicate record id");
                warnings.push(format!("Duplicate id {} on row {}", id, row_no + 1));
                continue;
            }

            let values = headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), row.get(i).unwrap_or("")));
            records.push(Record::with_values(id, values, &default_fields));
        }

        if padded > 0 {
            warnings.push(format!("Padded {} short row(s) with empty cells", padded));
        }

        debug!(
            file = %self.file_path.display(),
            columns = headers.len(),
            records = records.len(),
            "loaded file"
        );

        Ok(LoadResult { headers, records, warnings })
    }
}

/// Numeric ids stay numeric so they sort and compare as numbers
fn parse_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Int)
        .unwrap_or_else(|_| RecordId::Str(raw.to_string()))
}
