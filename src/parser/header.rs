use csv::StringRecord;
use std::collections::HashMap;

use crate::error::{IngestError, Result};
use crate::schema::TableSchema;

/// Column positions for one source file, resolved once from its header row
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    file: String,
    positions: HashMap<&'static str, usize>,
}

impl HeaderIndex {
    /// Match every sourced column of `schema` against the header row.
    ///
    /// Accepted names are tried in order; the first one present wins.
    pub fn resolve(file: &str, headers: &StringRecord, schema: &TableSchema) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize).collect();
        let mut positions = HashMap::new();

        for col in schema.sourced_columns() {
            let found = col.headers.iter().find_map(|accepted| {
                let wanted = normalize(accepted);
                normalized.iter().position(|h| *h == wanted)
            });

            match found {
                Some(idx) => {
                    positions.insert(col.name, idx);
                }
                None => {
                    return Err(IngestError::MissingColumn {
                        file: file.to_string(),
                        column: col.name,
                        accepted: col.headers.join(", "),
                    })
                }
            }
        }

        Ok(Self {
            file: file.to_string(),
            positions,
        })
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Raw cell for a resolved column. Cells past the end of a short row read as blank.
    pub fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.position(column)
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
    }
}

/// Case-folded header with separators (and any BOM) removed
fn normalize(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
