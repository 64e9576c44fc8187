use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use fasttable::controller::TableOptions;

/// Front end settings, read from a TOML file. Table options sit at the top
/// level next to the loader settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub table: TableOptions,
    /// How often `--watch` looks at the file's modification time
    pub refresh_secs: u64,
    /// Columns searched by terms without a field name; empty means all
    pub default_fields: Vec<String>,
    /// Column holding record ids; rows are numbered when unset
    pub id_column: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            table: TableOptions::default(),
            refresh_secs: 2,
            default_fields: Vec::new(),
            id_column: None,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> io::Result<Self> {
        toml::from_str(text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
