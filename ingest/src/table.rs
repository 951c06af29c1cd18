use crate::errors::{IngestError, Result};
use docstore::Document;
use serde_json::Value;

/// A parsed tabular payload: one header row defining the field names, and
/// the data rows positionally aligned with it.
#[derive(Debug)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Parse a request body into a table.
    ///
    /// The body must be a JSON array of arrays; `value[0]` is the header row
    /// and every header cell must be a string. The header row must name at
    /// least one field, otherwise no row could carry an identifier.
    pub fn parse(bytes: &[u8]) -> Result<Table> {
        let raw: Vec<Vec<Value>> = serde_json::from_slice(bytes)
            .map_err(|e| IngestError::MalformedTable(e.to_string()))?;

        let mut rows = raw.into_iter();
        let header_row = rows.next().ok_or(IngestError::MissingHeaderRow)?;
        if header_row.is_empty() {
            return Err(IngestError::EmptyHeaderRow);
        }

        let headers = header_row
            .into_iter()
            .enumerate()
            .map(|(index, cell)| match cell {
                Value::String(name) => Ok(name),
                _ => Err(IngestError::NonStringHeader { index }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Table {
            headers,
            rows: rows.collect(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Turn the data rows into keyed documents.
    ///
    /// Every row must have exactly as many values as the header has fields;
    /// a mismatch fails the whole table rather than producing a document
    /// with silently missing fields. The document key is the lowercased
    /// string form of the row's first value. Row indices in errors count
    /// from the header row, so the first data row is row 1.
    pub fn into_documents(self) -> Result<Vec<(String, Document)>> {
        let expected = self.headers.len();
        let mut documents = Vec::with_capacity(self.rows.len());

        for (i, row) in self.rows.into_iter().enumerate() {
            let row_index = i + 1;
            if row.len() != expected {
                return Err(IngestError::RowLengthMismatch {
                    row: row_index,
                    expected,
                    got: row.len(),
                });
            }

            let key = derive_key(&row[0]).ok_or(IngestError::MissingRowKey { row: row_index })?;

            let document: Document = self.headers.iter().cloned().zip(row).collect();
            documents.push((key, document));
        }

        Ok(documents)
    }
}

/// Lowercased string form of a row's first value. Strings are lowercased
/// directly; other scalars use their JSON rendering. Null and empty strings
/// carry no identifier.
fn derive_key(value: &Value) -> Option<String> {
    let key = match value {
        Value::Null => return None,
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    };

    if key.is_empty() { None } else { Some(key) }
}
