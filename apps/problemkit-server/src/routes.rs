//! Demo API: an in-memory item catalog.
//!
//! Handlers answer errors with bare status codes or invalid model state and
//! leave the response body to the problem details middleware.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use problemkit::{ApiBehavior, ApiContext, ModelState, problem_details_middleware};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Default)]
struct Catalog {
    next_id: AtomicU64,
    items: RwLock<BTreeMap<u64, Item>>,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    catalog: Arc<Catalog>,
}

impl AppState {
    pub async fn insert(&self, name: impl Into<String>, quantity: u32) -> Item {
        let id = self.catalog.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let item = Item {
            id,
            name: name.into(),
            quantity,
        };
        self.catalog.items.write().await.insert(id, item.clone());
        item
    }
}

/// Router with the demo API behind the problem details middleware.
pub fn router(behavior: ApiBehavior, state: AppState) -> Router {
    let api = Router::new()
        .route("/api/items", axum::routing::post(create_item))
        .route("/api/items/{id}", get(get_item))
        .route("/api/teapot", get(teapot))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            behavior,
            problem_details_middleware,
        ));

    api.route("/health", get(health))
}

async fn get_item(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.catalog.items.read().await.get(&id) {
        Some(item) => Json(item.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn validate(input: &NewItem) -> Result<(String, u32), ModelState> {
    let mut errors = ModelState::new();

    let name = input.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        errors.add_error("name", "The name field is required.");
    }

    let quantity = input.quantity.unwrap_or(0);
    let quantity = u32::try_from(quantity).unwrap_or_else(|_| {
        errors.add_error("quantity", "The quantity must be between 0 and 4294967295.");
        0
    });

    if errors.is_valid() {
        Ok((name.to_owned(), quantity))
    } else {
        Err(errors)
    }
}

async fn create_item(
    State(state): State<AppState>,
    ctx: ApiContext,
    body: Result<Json<NewItem>, JsonRejection>,
) -> Response {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => {
            let errors = ModelState::new().with_error("$", rejection.body_text());
            return ctx.invalid_model_state(errors).into_response();
        }
    };

    match validate(&input) {
        Ok((name, quantity)) => {
            let item = state.insert(name, quantity).await;
            tracing::info!(id = item.id, "item created");
            let location = format!("/api/items/{}", item.id);
            (StatusCode::CREATED, [(LOCATION, location)], Json(item)).into_response()
        }
        Err(errors) => {
            tracing::debug!(errors = errors.error_count(), "item rejected");
            ctx.invalid_model_state(errors).into_response()
        }
    }
}

async fn teapot() -> StatusCode {
    StatusCode::IM_A_TEAPOT
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
