pub mod config;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod table;

use crate::errors::IngestError;
use docstore::Store;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use shared::histogram;
use shared::http::{make_error_response, make_text_response, run_http_service};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Run the ingestion service until the listener fails.
///
/// The store handle is constructed by the caller and passed in; the service
/// never builds its own store connection.
pub async fn run(config: config::Config, store: Store) -> Result<(), IngestError> {
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        collection = %config.collection,
        "starting ingestion service"
    );

    let service = IngestService::new(store, &config.collection);
    run_http_service(&config.listener.host, config.listener.port, service).await
}

type ServiceBody = BoxBody<Bytes, IngestError>;

/// HTTP surface of the ingestion service.
///
/// Routes:
/// - `POST /{collection}/load` — bulk upsert of a tabular payload;
///   `?skip_existing=true` keeps documents that are already present
/// - `GET /{collection}` — list all documents in the collection
/// - `GET /health` — liveness
#[derive(Clone)]
pub struct IngestService {
    store: Store,
    collection: Arc<str>,
    list_path: Arc<str>,
    load_path: Arc<str>,
}

impl IngestService {
    pub fn new(store: Store, collection: &str) -> Self {
        IngestService {
            store,
            collection: collection.into(),
            list_path: format!("/{collection}").into(),
            load_path: format!("/{collection}/load").into(),
        }
    }

    async fn route(self, req: Request<Incoming>) -> Response<ServiceBody> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        if method == Method::POST && path == *self.load_path {
            return self.handle_load(req).await;
        }
        if method == Method::GET && path == *self.list_path {
            return self.handle_list().await;
        }
        if method == Method::GET && path == "/health" {
            return make_text_response(StatusCode::OK, "ok\n");
        }

        tracing::warn!(method = %method, path = %path, "No route matched");
        make_error_response(StatusCode::NOT_FOUND)
    }

    async fn handle_load(&self, req: Request<Incoming>) -> Response<ServiceBody> {
        let skip_existing = skip_existing_requested(req.uri().query());
        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => return error_response(&IngestError::RequestBodyError(e.to_string())),
        };

        match handler::load_table(&self.store, &self.collection, &body, skip_existing).await {
            Ok(report) if report.all_written() => make_text_response(StatusCode::OK, "OK"),
            Ok(report) => {
                tracing::error!(
                    written = report.written.len(),
                    failed = report.failed.len(),
                    "bulk load completed with failures"
                );
                json_response(StatusCode::INTERNAL_SERVER_ERROR, &report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected bulk load");
                error_response(&e)
            }
        }
    }

    async fn handle_list(&self) -> Response<ServiceBody> {
        match self.store.collection(&*self.collection).list().await {
            Ok(documents) => json_response(StatusCode::OK, &documents),
            Err(e) => {
                tracing::error!(error = %e, "listing collection failed");
                error_response(&IngestError::Store(e))
            }
        }
    }
}

impl Service<Request<Incoming>> for IngestService {
    type Response = Response<ServiceBody>;
    type Error = IngestError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move {
            let started = Instant::now();
            let response = service.route(req).await;
            histogram!(metrics_defs::REQUEST_DURATION).record(started.elapsed().as_secs_f64());
            Ok(response)
        })
    }
}

fn skip_existing_requested(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        q.split('&')
            .any(|pair| pair == "skip_existing=true" || pair == "skip_existing=1")
    })
}

fn error_response(error: &IngestError) -> Response<ServiceBody> {
    let mut response = Response::new(
        Full::new(Bytes::from(format!("{error}\n")))
            .map_err(|e: Infallible| match e {})
            .boxed(),
    );
    *response.status_mut() = error.status();
    response
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<ServiceBody> {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => Bytes::from(bytes),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            return make_error_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut response = Response::new(Full::new(bytes).map_err(|e: Infallible| match e {}).boxed());
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}
