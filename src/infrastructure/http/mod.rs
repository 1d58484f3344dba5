//! HTTP transport for the query router
//!
//! `POST /query` takes a route envelope and `POST /invoke` a method
//! invocation message. A success answers `200` with the reply text, a
//! failure answers `500` with `{ "code": n, "message": "..." }`.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use std::future::Future;
use tracing::{error, info, warn};

use crate::routing::{GENERIC_ERROR_CODE, QueryReply, QueryRouter};

#[derive(Debug, Serialize)]
struct FailureBody {
    code: i32,
    message: String,
}

impl IntoResponse for QueryReply {
    fn into_response(self) -> Response {
        match self {
            QueryReply::Success { response } => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                response,
            )
                .into_response(),
            QueryReply::Failure { code, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureBody { code, message }),
            )
                .into_response(),
        }
    }
}

/// Builds the transport routes around a shared router
pub fn router(query_router: Arc<QueryRouter>) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/invoke", post(invoke))
        .with_state(query_router)
}

async fn query(State(router): State<Arc<QueryRouter>>, body: String) -> QueryReply {
    let (tx, rx) = oneshot::channel();
    router.dispatch_async(body, tx).await;
    await_reply(rx).await
}

async fn invoke(State(router): State<Arc<QueryRouter>>, body: String) -> QueryReply {
    let (tx, rx) = oneshot::channel();
    router.invoke_async(body, tx).await;
    await_reply(rx).await
}

async fn await_reply(rx: oneshot::Receiver<QueryReply>) -> QueryReply {
    rx.await.unwrap_or_else(|_| {
        error!("Query finished without a reply");
        QueryReply::failure(GENERIC_ERROR_CODE, "Internal error: no reply")
    })
}

/// Serves the transport on a bound listener until ctrl-c
pub async fn serve(query_router: Arc<QueryRouter>, listener: TcpListener) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "Query transport listening");

    axum::serve(listener, router(query_router))
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await
}

/// Resolves when `signal` fires. If the signal cannot be installed the
/// failure is logged and the transport keeps running.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutting down query transport"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
