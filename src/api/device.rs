//! Capability routes of every adapter
//!
//! Requests are resolved to a capability handler through the device
//! database and handed to the dispatcher. A missing handler is passed on as
//! `None` so the dispatcher reports it with its own error code.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::{Value, json};

use super::{ApiError, ApiState};
use crate::capability::{
    CapabilityHandler, DEVICE_SUBSCRIPTION_COMPONENT, DISCOVER_COMPONENT, REGISTER_COMPONENT,
};
use crate::dispatch::{ActionRequest, DiscoverRequest, GetRequest, SetRequest};
use crate::list::BrowseParams;
use crate::{Error, Result};

type ApiResult = std::result::Result<Json<Value>, ApiError>;

async fn lookup(
    state: &ApiState,
    adapter_name: &str,
    component: &str,
    device_id: &str,
) -> Result<Option<Arc<CapabilityHandler>>> {
    if state.database.adapter(adapter_name).is_none() {
        return Err(Error::NotFound(format!("adapter {adapter_name}")));
    }
    Ok(state
        .database
        .handler(adapter_name, component, device_id)
        .await)
}

fn json_body<T: serde::de::DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

async fn get_value(
    State(state): State<Arc<ApiState>>,
    Path((adapter_name, component, device_id)): Path<(String, String, String)>,
) -> ApiResult {
    let handler = lookup(&state, &adapter_name, &component, &device_id).await?;
    let value = state
        .dispatcher
        .handle_get(GetRequest {
            handler,
            device_id,
            browse: None,
        })
        .await?;
    Ok(Json(value))
}

/// POST alias of the get route; directories read browse parameters from the body
async fn browse(
    State(state): State<Arc<ApiState>>,
    Path((adapter_name, component, device_id)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult {
    let params: BrowseParams = json_body(&body)?;
    let handler = lookup(&state, &adapter_name, &component, &device_id).await?;
    let value = state
        .dispatcher
        .handle_get(GetRequest {
            handler,
            device_id,
            browse: Some(params),
        })
        .await?;
    Ok(Json(value))
}

async fn set_value(
    State(state): State<Arc<ApiState>>,
    Path((adapter_name, component, device_id, value)): Path<(String, String, String, String)>,
) -> ApiResult {
    let handler = lookup(&state, &adapter_name, &component, &device_id).await?;
    let result = state
        .dispatcher
        .handle_set(SetRequest {
            handler,
            device_id,
            value,
        })
        .await?;
    Ok(Json(result))
}

async fn action(
    State(state): State<Arc<ApiState>>,
    Path((adapter_name, component, device_id)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult {
    let body: Value = json_body(&body)?;
    let handler = lookup(&state, &adapter_name, &component, &device_id).await?;
    let result = state
        .dispatcher
        .handle_action(ActionRequest {
            handler,
            device_id,
            body,
        })
        .await?;
    Ok(Json(result))
}

async fn run_discovery(state: &ApiState, adapter_name: String, device_id: Option<String>) -> ApiResult {
    let handler = lookup(state, &adapter_name, DISCOVER_COMPONENT, "").await?;
    let devices = state
        .dispatcher
        .discover(DiscoverRequest {
            handler,
            adapter_name,
            device_id,
        })
        .await?;
    Ok(Json(serde_json::to_value(devices).map_err(Error::from)?))
}

async fn discover(
    State(state): State<Arc<ApiState>>,
    Path(adapter_name): Path<String>,
) -> ApiResult {
    run_discovery(&state, adapter_name, None).await
}

async fn discover_device(
    State(state): State<Arc<ApiState>>,
    Path((adapter_name, device_id)): Path<(String, String)>,
) -> ApiResult {
    run_discovery(&state, adapter_name, Some(device_id)).await
}

async fn registered(
    State(state): State<Arc<ApiState>>,
    Path(adapter_name): Path<String>,
) -> ApiResult {
    let handler = lookup(&state, &adapter_name, REGISTER_COMPONENT, "").await?;
    Ok(Json(state.dispatcher.is_registered(handler).await?))
}

async fn register(
    State(state): State<Arc<ApiState>>,
    Path(adapter_name): Path<String>,
    body: Bytes,
) -> ApiResult {
    let credentials: Value = json_body(&body)?;
    let handler = lookup(&state, &adapter_name, REGISTER_COMPONENT, "").await?;
    Ok(Json(state.dispatcher.register(handler, credentials).await?))
}

/// Adapters without subscription callbacks acknowledge without doing anything
async fn subscribe(
    State(state): State<Arc<ApiState>>,
    Path((adapter_name, device_id, _event_prefix)): Path<(String, String, String)>,
) -> ApiResult {
    let handler = lookup(&state, &adapter_name, DEVICE_SUBSCRIPTION_COMPONENT, "").await?;
    if handler.is_none() {
        return Ok(Json(json!({ "success": true })));
    }
    Ok(Json(state.dispatcher.device_added(handler, device_id).await?))
}

async fn unsubscribe(
    State(state): State<Arc<ApiState>>,
    Path((adapter_name, device_id)): Path<(String, String)>,
) -> ApiResult {
    let handler = lookup(&state, &adapter_name, DEVICE_SUBSCRIPTION_COMPONENT, "").await?;
    if handler.is_none() {
        return Ok(Json(json!({ "success": true })));
    }
    Ok(Json(state.dispatcher.device_removed(handler, device_id).await?))
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/{adapter_name}/discover", get(discover))
        .route("/{adapter_name}/discover/{device_id}", get(discover_device))
        .route("/{adapter_name}/registered", get(registered))
        .route("/{adapter_name}/register", post(register))
        .route(
            "/{adapter_name}/subscribe/{device_id}/{event_prefix}",
            get(subscribe),
        )
        .route("/{adapter_name}/unsubscribe/{device_id}", get(unsubscribe))
        .route(
            "/{adapter_name}/{component}/{device_id}",
            get(get_value).post(browse),
        )
        .route(
            "/{adapter_name}/{component}/{device_id}/action",
            post(action),
        )
        .route(
            "/{adapter_name}/{component}/{device_id}/{value}",
            get(set_value),
        )
        .with_state(state)
}
