//! Axum routes for the quote server.
//!
//!   GET /{proof}   -> quote for a fresh, valid proof
//!
//! Outcomes map to distinct status codes so a client can tell "do more work"
//! (403) from "stop resending this proof" (429).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tracing::error;

use crate::error::VerifyError;
use crate::gate::{GateError, QuoteGate, QuoteStore, ReplayCache};

/// Quote routes with every request bounded by `request_timeout`.
pub fn router<C, Q>(gate: Arc<QuoteGate<C, Q>>, request_timeout: Duration) -> Router
where
    C: ReplayCache + 'static,
    Q: QuoteStore + 'static,
{
    let routes = Router::new()
        .route("/:proof", get(fetch_quote::<C, Q>))
        .with_state(gate);
    with_request_timeout(routes, request_timeout)
}

/// Requests still running after `timeout` are answered with 408.
fn with_request_timeout(routes: Router, timeout: Duration) -> Router {
    routes.layer(TimeoutLayer::new(timeout))
}

/// Status code for each rejection.
pub fn status_for(err: &GateError) -> StatusCode {
    match err {
        GateError::Verify(VerifyError::Decode(_))
        | GateError::Verify(VerifyError::MalformedProof { .. }) => StatusCode::BAD_REQUEST,
        GateError::Verify(VerifyError::PredicateFailed) => StatusCode::FORBIDDEN,
        GateError::DuplicateProof => StatusCode::TOO_MANY_REQUESTS,
        GateError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn fetch_quote<C, Q>(
    State(gate): State<Arc<QuoteGate<C, Q>>>,
    Path(proof): Path<String>,
) -> Response
where
    C: ReplayCache + 'static,
    Q: QuoteStore + 'static,
{
    match gate.fetch(&proof) {
        Ok(quote) => (StatusCode::OK, quote.to_owned()).into_response(),
        Err(err) => {
            if let GateError::Cache(source) = &err {
                error!(%source, "replay cache failure");
            }
            (status_for(&err), err.to_string()).into_response()
        }
    }
}
