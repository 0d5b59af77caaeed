//! HTTP server the brain calls into
//!
//! ```text
//! /health
//! /db/search?q=..  /db/{id}  /db/adapterdefinition/{adapterName}
//! /device/{adapterName}/{component}/{deviceId}[/{value}|/action]
//! /device/{adapterName}/discover[/{deviceId}]
//! /device/{adapterName}/registered  /device/{adapterName}/register
//! /device/{adapterName}/subscribe/{deviceId}/{eventUriPrefix}
//! /device/{adapterName}/unsubscribe/{deviceId}
//! ```

pub mod db;
pub mod device;
pub mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::database::DeviceDatabase;
use crate::dispatch::RequestDispatcher;
use crate::{Error, Result};

/// Shared state for all routes
#[derive(Debug)]
pub struct ApiState {
    pub database: Arc<DeviceDatabase>,
    pub dispatcher: RequestDispatcher,
    /// Name the adapter server registered under
    pub sdk_name: String,
}

impl ApiState {
    /// State whose dispatcher registers dynamic devices in `database`
    #[must_use]
    pub fn new(database: Arc<DeviceDatabase>, sdk_name: impl Into<String>) -> Self {
        let dispatcher = RequestDispatcher::new(database.clone());
        Self {
            database,
            dispatcher,
            sdk_name: sdk_name.into(),
        }
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(health::router(state.clone()))
        .nest("/db", db::router(state.clone()))
        .nest("/device", device::router(state))
        .layer(TraceLayer::new_for_http())
}

/// Crate error rendered as `{error: {code, message}}`
///
/// Request validation errors map to 404, everything else to 500.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let status = if self.0.is_dispatch_error() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::warn!(code = self.0.code(), error = %self.0, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.0.code(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Bound adapter server
pub struct ApiServer {
    listener: TcpListener,
    state: Arc<ApiState>,
}

impl ApiServer {
    /// Bind to `port` on all interfaces (`0` picks a free port)
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound
    pub async fn bind(state: Arc<ApiState>, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| Error::Config(format!("failed to bind adapter server: {e}")))?;
        Ok(Self { listener, state })
    }

    /// Address the server is bound to
    ///
    /// # Errors
    ///
    /// Returns error if the socket address cannot be read
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve in a background task until `shutdown` fires
    #[must_use]
    pub fn spawn(self, shutdown: oneshot::Receiver<()>) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move {
            let port = self.listener.local_addr().map(|a| a.port()).unwrap_or_default();
            tracing::info!(port, "adapter server listening");

            axum::serve(self.listener, router(self.state))
                .with_graceful_shutdown(async {
                    let _ = shutdown.await;
                })
                .await
                .map_err(|e| Error::Config(format!("adapter server error: {e}")))
        })
    }
}
