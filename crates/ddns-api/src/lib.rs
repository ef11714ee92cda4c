// # Configuration API
//
// HTTP control plane for the `api` startup variant.
//
// Provides:
// - `GET  /api/config`: current record as JSON, `{}` when nothing is stored
// - `POST /api/config`: validate, store, then fire the activation gate
//
// Any other method on the path is answered with 405 by the router.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use ddns_core::config::DdnsConfig;
use ddns_core::gate::ActivationTrigger;
use ddns_core::traits::ConfigStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Path of the configuration resource
pub const CONFIG_PATH: &str = "/api/config";

/// Shared handles for the handlers
#[derive(Clone)]
pub struct ApiState {
    /// Record shared with the engine
    pub store: Arc<dyn ConfigStore>,
    /// Wakes a dormant engine after the first accepted record
    pub trigger: ActivationTrigger,
}

impl ApiState {
    pub fn new(store: Arc<dyn ConfigStore>, trigger: ActivationTrigger) -> Self {
        Self { store, trigger }
    }
}

/// Build the router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route(
            CONFIG_PATH,
            routing::get(handlers::get_config).post(handlers::post_config),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

/// Serve on an already bound listener until the task is dropped
pub async fn serve_on(tcp: TcpListener, state: ApiState) -> anyhow::Result<()> {
    tracing::info!("Configuration API listening on {}", tcp.local_addr()?);
    axum::serve(tcp, router(state)).await?;
    anyhow::bail!("configuration API returned unexpectedly")
}

mod handlers {
    use super::*;

    pub(crate) async fn get_config(
        Extension(state): Extension<ApiState>,
    ) -> ServerResult<Response> {
        match state.store.load().await? {
            Some(config) => Ok(Json(config).into_response()),
            None => Ok(Json(serde_json::json!({})).into_response()),
        }
    }

    pub(crate) async fn post_config(
        Extension(state): Extension<ApiState>,
        body: String,
    ) -> ServerResult<impl IntoResponse> {
        let config: DdnsConfig = serde_json::from_str(&body)
            .map_err(|e| ServerError::BadRequest(format!("invalid configuration: {}", e)))?;
        let config = config.normalized();
        config
            .validate()
            .map_err(|e| ServerError::BadRequest(format!("invalid configuration: {}", e)))?;

        state.store.save(&config).await?;
        tracing::info!(
            "Configuration saved: {} domain(s), ip type {}",
            config.domain_list.domains.len(),
            config.global_settings.ip_type
        );

        if state.trigger.fire() {
            tracing::info!("First configuration received, activating updates");
        }

        Ok((StatusCode::OK, "Configuration saved"))
    }
}

/// Handler error, rendered as a plain-text body
#[derive(Debug)]
pub enum ServerError {
    /// Body could not be parsed or failed validation
    BadRequest(String),
    /// Storage or other internal failure
    Internal(anyhow::Error),
}

/// return error result
pub type ServerResult<T> = Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ServerError::Internal(err) => {
                tracing::error!("Configuration API error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
            }
        }
    }
}

impl From<ddns_core::Error> for ServerError {
    fn from(err: ddns_core::Error) -> Self {
        Self::Internal(err.into())
    }
}
