//! Bulk upsert of a tabular payload into the document store.

use crate::errors::Result;
use crate::metrics_defs;
use crate::table::Table;
use docstore::{Document, DocumentRef, Store, StoreError};
use serde::Serialize;
use shared::counter;
use tokio::task::JoinSet;

/// Per-row outcome of one bulk load.
///
/// Writes are issued concurrently and all of them are allowed to settle;
/// a rejected row does not discard the outcome of its siblings. Rows left
/// alone because their document already existed are reported separately.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<WriteFailure>,
}

#[derive(Debug, Serialize)]
pub struct WriteFailure {
    pub key: String,
    pub error: String,
}

impl BatchReport {
    pub fn all_written(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parse a tabular request body and upsert one document per data row.
///
/// Validation failures reject the whole payload before anything is written.
/// Write failures do not: the returned report carries the outcome of every
/// row. With `skip_existing`, rows whose document is already present are
/// left untouched instead of overwritten.
pub async fn load_table(
    store: &Store,
    collection: &str,
    body: &[u8],
    skip_existing: bool,
) -> Result<BatchReport> {
    let table = Table::parse(body)?;
    let documents = table.into_documents()?;

    tracing::debug!(
        collection = %collection,
        rows = documents.len(),
        skip_existing,
        "loading table into collection"
    );

    Ok(write_all(store, collection, documents, skip_existing).await)
}

enum RowOutcome {
    Written,
    Skipped,
}

/// Upsert a single row, or leave it alone if the document already exists
/// and the caller asked for existing documents to be kept.
///
/// The existence check and the write are two store calls, not a
/// transaction; a concurrent writer can still land between them.
async fn upsert_row(
    doc_ref: &DocumentRef,
    document: &Document,
    skip_existing: bool,
) -> Result<RowOutcome, StoreError> {
    if skip_existing && doc_ref.get().await?.is_some() {
        return Ok(RowOutcome::Skipped);
    }

    doc_ref.set(document).await?;
    Ok(RowOutcome::Written)
}

/// Write all documents concurrently and wait for every write to settle.
///
/// No ordering guarantee between writes: rows that derive the same key race
/// and the final stored value is whichever write commits last.
async fn write_all(
    store: &Store,
    collection: &str,
    documents: Vec<(String, Document)>,
    skip_existing: bool,
) -> BatchReport {
    let mut join_set = JoinSet::new();

    for (key, document) in documents {
        let doc_ref = store.collection(collection).doc(&key);
        join_set.spawn(async move {
            let result = upsert_row(&doc_ref, &document, skip_existing).await;
            (key, result)
        });
    }

    let mut report = BatchReport {
        written: Vec::new(),
        skipped: Vec::new(),
        failed: Vec::new(),
    };

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((key, Ok(RowOutcome::Written))) => report.written.push(key),
            Ok((key, Ok(RowOutcome::Skipped))) => report.skipped.push(key),
            Ok((key, Err(e))) => {
                tracing::error!(key = %key, error = %e, "document write failed");
                report.failed.push(WriteFailure {
                    key,
                    error: e.to_string(),
                });
            }
            Err(e) => tracing::error!("Write task panicked: {}", e),
        }
    }

    counter!(metrics_defs::ROWS_WRITTEN).increment(report.written.len() as u64);
    counter!(metrics_defs::ROWS_SKIPPED).increment(report.skipped.len() as u64);
    counter!(metrics_defs::ROWS_FAILED).increment(report.failed.len() as u64);

    // Settle order is arbitrary; sort so reports are stable
    report.written.sort();
    report.skipped.sort();
    report.failed.sort_by(|a, b| a.key.cmp(&b.key));

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IngestError;
    use docstore::MemoryStore;
    use std::sync::Arc;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn doc(fields: &[(&str, &str)]) -> Document {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn test_load_writes_one_document_per_row() {
        let store = Store::in_memory();
        let payload = body(serde_json::json!([
            ["id", "name"],
            ["AAA", "Acme"],
            ["bbb", "Beta"]
        ]));

        let report = load_table(&store, "companies", &payload, false).await.unwrap();
        assert!(report.all_written());
        assert_eq!(report.written, ["aaa", "bbb"]);

        let companies = store.collection("companies");
        let acme = companies.doc("aaa").get().await.unwrap().unwrap();
        assert_eq!(acme["id"], "AAA");
        assert_eq!(acme["name"], "Acme");

        let beta = companies.doc("bbb").get().await.unwrap().unwrap();
        assert_eq!(beta["id"], "bbb");
        assert_eq!(beta["name"], "Beta");

        assert_eq!(companies.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resubmitting_payload_is_idempotent() {
        let store = Store::in_memory();
        let payload = body(serde_json::json!([["id", "name"], ["AAA", "Acme"]]));

        load_table(&store, "companies", &payload, false).await.unwrap();
        let first = store
            .collection("companies")
            .doc("aaa")
            .get()
            .await
            .unwrap();

        load_table(&store, "companies", &payload, false).await.unwrap();
        let second = store
            .collection("companies")
            .doc("aaa")
            .get()
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.collection("companies").list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_keys_leave_one_document() {
        let store = Store::in_memory();
        // "AAA" and "aaa" derive the same key; the writes race and either
        // row may win
        let payload = body(serde_json::json!([
            ["id", "name"],
            ["AAA", "Acme"],
            ["aaa", "Shadow"]
        ]));

        let report = load_table(&store, "companies", &payload, false).await.unwrap();
        assert!(report.all_written());
        assert_eq!(report.written, ["aaa", "aaa"]);

        let docs = store.collection("companies").list().await.unwrap();
        assert_eq!(docs.len(), 1);
        let name = docs[0]["name"].as_str().unwrap();
        assert!(name == "Acme" || name == "Shadow");
    }

    #[tokio::test]
    async fn test_skip_existing_keeps_present_documents() {
        let store = Store::in_memory();
        store
            .collection("companies")
            .doc("aaa")
            .set(&doc(&[("id", "aaa"), ("name", "Original")]))
            .await
            .unwrap();

        let payload = body(serde_json::json!([
            ["id", "name"],
            ["AAA", "Scraped"],
            ["bbb", "Beta"]
        ]));

        let report = load_table(&store, "companies", &payload, true)
            .await
            .unwrap();
        assert!(report.all_written());
        assert_eq!(report.written, ["bbb"]);
        assert_eq!(report.skipped, ["aaa"]);

        // The existing document was not overwritten
        let existing = store
            .collection("companies")
            .doc("aaa")
            .get()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(existing["name"], "Original");

        // Without the flag the same payload overwrites it
        let report = load_table(&store, "companies", &payload, false)
            .await
            .unwrap();
        assert_eq!(report.written, ["aaa", "bbb"]);
        assert!(report.skipped.is_empty());

        let replaced = store
            .collection("companies")
            .doc("aaa")
            .get()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced["name"], "Scraped");
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let store = Store::in_memory();
        let payload = body(serde_json::json!([["id", "name"], ["aaa", "Acme"], ["bbb"]]));

        let err = load_table(&store, "companies", &payload, false).await.unwrap_err();
        assert!(matches!(err, IngestError::RowLengthMismatch { row: 2, .. }));

        // Fail fast: the well-formed row was not written either
        assert!(store.collection("companies").list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_write_reports_per_row_outcome() {
        let memory = Arc::new(MemoryStore::new());
        memory.deny_writes("companies", "bbb");
        let store = Store::new(memory);

        let payload = body(serde_json::json!([
            ["id", "name"],
            ["AAA", "Acme"],
            ["bbb", "Beta"]
        ]));

        let report = load_table(&store, "companies", &payload, false).await.unwrap();
        assert!(!report.all_written());
        assert_eq!(report.written, ["aaa"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "bbb");
        assert!(report.failed[0].error.contains("permission denied"));

        // The sibling write still committed
        assert!(
            store
                .collection("companies")
                .doc("aaa")
                .get()
                .await
                .unwrap()
                .is_some()
        );
    }
}
