//! Request layer: routes, error-to-status mapping, and response rendering.
//!
//! Requests are JSON objects tagged by `route`, one per line on the wire.
//! Responses carry an HTTP-style `status` and a JSON `body`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use seven_core::{Clock, SystemClock, TaskCatalog};
use seven_progress::{CatalogError, CatalogService, ProgressEngine, ProgressError};
use seven_storage::Storage;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;

/// A request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRequest {
    /// Echoed back on the response
    #[serde(default)]
    pub id: Option<Value>,
    /// Origin of the calling client, checked against the allow-list
    #[serde(default)]
    pub origin: Option<String>,
    /// The route and its parameters
    #[serde(flatten)]
    pub route: Route,
}

/// Routes served by the request layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// Liveness probe
    Health,

    /// Load (or lazily create) a user's progress
    GetUser {
        /// User identifier
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Complete the user's current day
    CompleteDay {
        /// User identifier
        #[serde(rename = "userId")]
        user_id: String,
        /// Day being completed
        day: u32,
        /// Optional note stored with the day
        #[serde(default)]
        note: Option<String>,
    },

    /// Start the user's attempt over
    Reset {
        /// User identifier
        #[serde(rename = "userId")]
        user_id: String,
    },

    /// Tasks for one day
    GetTasks {
        /// Day number
        day: u32,
    },

    /// The whole catalog
    ListTasks,

    /// Replace the whole catalog
    PutTasks {
        /// Replacement catalog
        tasks: TaskCatalog,
    },
}

impl Route {
    fn name(&self) -> &'static str {
        match self {
            Route::Health => "health",
            Route::GetUser { .. } => "get_user",
            Route::CompleteDay { .. } => "complete_day",
            Route::Reset { .. } => "reset",
            Route::GetTasks { .. } => "get_tasks",
            Route::ListTasks => "list_tasks",
            Route::PutTasks { .. } => "put_tasks",
        }
    }
}

/// A response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Request id, if the request had one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// HTTP-style status code
    pub status: u16,
    /// Response payload
    pub body: Value,
}

impl ApiResponse {
    fn ok(id: Option<Value>, body: Value) -> Self {
        Self { id, status: 200, body }
    }

    fn from_error(id: Option<Value>, err: &ApiError) -> Self {
        Self {
            id,
            status: err.status(),
            body: json!({ "error": err.public_message() }),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors surfaced to callers of the request layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request could not be parsed
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Origin is not in the allow-list
    #[error("origin not allowed: {0}")]
    Forbidden(String),

    /// Progress engine rejection or failure
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Catalog rejection or failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Response could not be rendered
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::Progress(ProgressError::NotFound(_)) => 404,
            ApiError::Progress(ProgressError::InvalidDay { .. }) => 400,
            ApiError::Catalog(CatalogError::NotFound(_)) => 404,
            ApiError::Progress(ProgressError::Storage(_))
            | ApiError::Catalog(CatalogError::Storage(_))
            | ApiError::Internal(_) => 500,
        }
    }

    /// Message safe to show to the caller. Store failures stay generic.
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => format!("Bad request: {}", msg),
            ApiError::Forbidden(_) => "Origin not allowed".to_string(),
            ApiError::Progress(ProgressError::NotFound(_)) => "User not found".to_string(),
            ApiError::Progress(ProgressError::InvalidDay { .. }) => {
                "Invalid day completion".to_string()
            }
            ApiError::Catalog(CatalogError::NotFound(_)) => {
                "Tasks not found for this day".to_string()
            }
            ApiError::Progress(ProgressError::Storage(_))
            | ApiError::Catalog(CatalogError::Storage(_))
            | ApiError::Internal(_) => "Server error".to_string(),
        }
    }
}

/// Maps requests onto the progress engine and task catalog.
#[derive(Clone)]
pub struct Api {
    engine: ProgressEngine,
    catalog: CatalogService,
    clock: Arc<dyn Clock>,
    config: Arc<ServerConfig>,
}

impl Api {
    /// Create a request layer over `storage`.
    pub fn new(storage: Arc<dyn Storage>, config: ServerConfig) -> Self {
        Self {
            engine: ProgressEngine::new(storage.clone()),
            catalog: CatalogService::new(storage),
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Use a different clock for the engine and the health timestamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.engine = self.engine.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Parse one request line and handle it.
    pub async fn handle_line(&self, line: &str) -> ApiResponse {
        match serde_json::from_str::<ApiRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                ApiResponse::from_error(None, &ApiError::BadRequest(e.to_string()))
            }
        }
    }

    /// Handle a parsed request.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let ApiRequest { id, origin, route } = request;
        let name = route.name();
        debug!("Request: {}", name);

        if let Some(origin) = origin {
            if !self.config.allows_origin(&origin) {
                warn!("Rejected {} from origin {}", name, origin);
                return ApiResponse::from_error(id, &ApiError::Forbidden(origin));
            }
        }

        match self.dispatch(route).await {
            Ok(body) => ApiResponse::ok(id, body),
            Err(err) => {
                if err.status() >= 500 {
                    error!("Error in {}: {}", name, err);
                } else {
                    debug!("Rejected {}: {}", name, err);
                }
                ApiResponse::from_error(id, &err)
            }
        }
    }

    async fn dispatch(&self, route: Route) -> Result<Value, ApiError> {
        match route {
            Route::Health => Ok(json!({
                "status": "ok",
                "server": self.config.server_name,
                "version": self.config.version,
                "timestamp": self.clock.now().to_rfc3339(),
            })),

            Route::GetUser { user_id } => {
                let view = self.engine.get_or_init(&user_id).await?;
                to_body(&view)
            }

            Route::CompleteDay { user_id, day, note } => {
                let outcome = self
                    .engine
                    .complete_day(&user_id, day, note.as_deref())
                    .await?;
                let mut body = to_body(&outcome)?;
                body["success"] = json!(true);
                Ok(body)
            }

            Route::Reset { user_id } => {
                self.engine.reset_progress(&user_id).await?;
                Ok(json!({ "success": true, "message": "Progress reset successfully" }))
            }

            Route::GetTasks { day } => {
                let tasks = self.catalog.get_tasks(day).await?;
                Ok(json!({ "tasks": tasks }))
            }

            Route::ListTasks => {
                let catalog = self.catalog.all_tasks().await?;
                to_body(&catalog)
            }

            Route::PutTasks { tasks } => {
                self.catalog.put_tasks(&tasks).await?;
                Ok(json!({ "success": true, "message": "Tasks updated successfully" }))
            }
        }
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}
