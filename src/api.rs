use crate::{
    statistics::{self, Statistic},
    store::{RejectedTimestamp, TransactionStore},
    Amount,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Build the HTTP application around a shared store. Taking the store as an
/// argument (instead of a process-wide singleton) lets every test, and every
/// server, run against its own isolated instance.
pub fn app(store: Arc<TransactionStore>) -> Router {
    Router::new()
        .route("/transactions", post(add_transaction).delete(delete_transactions))
        .route("/statistics", get(get_statistics))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// The inbound wire shape. The amount deserialises into a decimal from either
/// a JSON string or a number; the timestamp is RFC 3339 UTC.
///
/// Malformed bodies never reach the handlers: axum's `Json` extractor answers
/// 400 for broken JSON and 422 for well-formed JSON whose values don't parse,
/// which is exactly the contract we want for this endpoint.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    amount: Amount,
    timestamp: DateTime<Utc>,
}

impl IntoResponse for RejectedTimestamp {
    fn into_response(self) -> Response {
        match self {
            // Stale data is dropped silently: the client did nothing wrong,
            // we just have no use for it. Success-shaped, no body.
            RejectedTimestamp::TooOld => StatusCode::NO_CONTENT.into_response(),
            RejectedTimestamp::TooFuture => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()).into_response()
            }
        }
    }
}

async fn add_transaction(
    State(store): State<Arc<TransactionStore>>,
    Json(request): Json<TransactionRequest>,
) -> Response {
    match store.add(request.amount, request.timestamp) {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(rejection) => {
            debug!("rejected transaction: {rejection}");
            rejection.into_response()
        }
    }
}

async fn delete_transactions(State(store): State<Arc<TransactionStore>>) -> StatusCode {
    store.delete_all();
    StatusCode::NO_CONTENT
}

async fn get_statistics(State(store): State<Arc<TransactionStore>>) -> Json<Statistic> {
    Json(statistics::compute(&store.snapshot(), Utc::now()))
}
