use crate::client::{Document, DocumentStore, StoreError};
use crate::config::StoreConfig;
use async_trait::async_trait;
use http::StatusCode;

/// Document store backed by a managed REST endpoint.
///
/// Documents live at `{base_url}/v1/{project_id}/{collection}/{id}`; `set`
/// issues a full-document replace, which gives the store its upsert
/// semantics.
pub struct RestStore {
    client: reqwest::Client,
    base: String,
    project_id: String,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Self {
        RestStore {
            client: reqwest::Client::new(),
            base: config.base_url.as_str().trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/{}/{}", self.base, self.project_id, collection)
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let url = self.doc_url(collection, id);
        let response = self.with_auth(self.client.put(&url)).json(doc).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::PermissionDenied {
                path: format!("{collection}/{id}"),
            }),
            status => Err(StoreError::UnexpectedStatus {
                path: format!("{collection}/{id}"),
                status,
            }),
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.doc_url(collection, id);
        let response = self.with_auth(self.client.get(&url)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<Document>().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::PermissionDenied {
                path: format!("{collection}/{id}"),
            }),
            status => Err(StoreError::UnexpectedStatus {
                path: format!("{collection}/{id}"),
                status,
            }),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let url = self.collection_url(collection);
        let response = self.with_auth(self.client.get(&url)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<Vec<Document>>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::PermissionDenied {
                path: collection.to_string(),
            }),
            status => Err(StoreError::UnexpectedStatus {
                path: collection.to_string(),
                status,
            }),
        }
    }
}
