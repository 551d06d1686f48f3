//! Roster export import: header aliasing and numeric cleanup into canonical
//! snapshot rows.

mod mapping;
mod normalizer;
mod parser;

use crate::workflows::dkp::PlayerSnapshotRow;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingIdColumn,
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::MissingIdColumn => {
                write!(f, "roster export has no player id column")
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::MissingIdColumn => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<PlayerSnapshotRow>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses a CSV export. Unrecognized columns are ignored and rows with a
    /// blank ID are dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<PlayerSnapshotRow>, RosterImportError> {
        let parsed = parser::parse_rows(reader)?;
        if !parsed.has_id_column {
            return Err(RosterImportError::MissingIdColumn);
        }
        info!(
            rows = parsed.rows.len(),
            dropped = parsed.dropped,
            "roster export parsed"
        );
        Ok(parsed.rows)
    }

    pub fn from_csv_str(csv: &str) -> Result<Vec<PlayerSnapshotRow>, RosterImportError> {
        Self::from_reader(csv.as_bytes())
    }
}
