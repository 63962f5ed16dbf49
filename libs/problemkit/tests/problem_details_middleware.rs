#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use problemkit::{
    ActionOutcome, ApiBehavior, ApiBehaviorConfig, ApiBehaviorOptionsSetup, ApiContext,
    CompatibilityVersion, ModelState, ObjectResult, Problem, ResultExecutingContext, ResultFilter,
    problem_details_middleware,
};
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

async fn missing() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn teapot() -> StatusCode {
    StatusCode::IM_A_TEAPOT
}

async fn unauthorized() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        [("www-authenticate", "Bearer realm=\"api\"")],
    )
}

async fn crash() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn gone() -> ActionOutcome {
    ActionOutcome::Status(StatusCode::CONFLICT)
}

async fn item() -> Json<Value> {
    Json(json!({"id": 1, "name": "widget"}))
}

async fn create(ctx: ApiContext) -> ActionOutcome {
    ctx.invalid_model_state(ModelState::new().with_error("name", "The name field is required."))
}

fn app(behavior: ApiBehavior) -> Router {
    Router::new()
        .route("/missing", get(missing))
        .route("/teapot", get(teapot))
        .route("/unauthorized", get(unauthorized))
        .route("/crash", get(crash))
        .route("/conflict", get(gone))
        .route("/item", get(item))
        .route("/items", post(create))
        .layer(middleware::from_fn_with_state(
            behavior,
            problem_details_middleware,
        ))
}

fn behavior_for(version: CompatibilityVersion) -> ApiBehavior {
    ApiBehavior::new(ApiBehaviorOptionsSetup::new(version).build(|_| {}))
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_owned())
        .unwrap_or_default()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn bare_not_found_becomes_problem_json() {
    let request = Request::builder()
        .uri("/missing")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = send(app(behavior_for(CompatibilityVersion::Latest)), request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), "application/problem+json");
    let body = body_json(response).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["title"], "Not Found");
    assert_eq!(body["type"], "https://tools.ietf.org/html/rfc7231#section-6.5.4");
    assert_eq!(body["instance"], "/missing");
    assert_eq!(body["trace_id"], "req-42");
}

#[tokio::test]
async fn unmapped_status_passes_through() {
    let response = send(
        app(behavior_for(CompatibilityVersion::Latest)),
        get_req("/teapot"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn accept_xml_renders_problem_xml() {
    let request = Request::builder()
        .uri("/missing")
        .header("accept", "application/xml")
        .body(Body::empty())
        .unwrap();
    let response = send(app(behavior_for(CompatibilityVersion::Latest)), request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), "application/problem+xml");
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("<problem xmlns=\"urn:ietf:rfc:7807\">"));
    assert!(body.contains("<status>404</status>"));
}

#[tokio::test]
async fn handler_headers_are_kept() {
    let response = send(
        app(behavior_for(CompatibilityVersion::Latest)),
        get_req("/unauthorized"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(content_type(&response), "application/problem+json");
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer realm=\"api\""
    );
}

#[tokio::test]
async fn returned_status_outcome_is_mapped() {
    let response = send(
        app(behavior_for(CompatibilityVersion::Latest)),
        get_req("/conflict"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Conflict");
}

#[tokio::test]
async fn successful_responses_are_untouched() {
    let response = send(
        app(behavior_for(CompatibilityVersion::Latest)),
        get_req("/item"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/json");
    assert_eq!(body_json(response).await, json!({"id": 1, "name": "widget"}));
}

#[tokio::test]
async fn invalid_model_state_is_validation_problem_from_2_2() {
    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .body(Body::empty())
        .unwrap();
    let response = send(app(behavior_for(CompatibilityVersion::Version2_2)), request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&response), "application/problem+json");
    let body = body_json(response).await;
    assert_eq!(body["title"], "One or more validation errors occurred.");
    assert_eq!(body["instance"], "/items");
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
}

#[tokio::test]
async fn invalid_model_state_is_plain_before_2_2() {
    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .body(Body::empty())
        .unwrap();
    let response = send(app(behavior_for(CompatibilityVersion::Version2_1)), request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&response), "application/json");
    assert_eq!(
        body_json(response).await,
        json!({"name": ["The name field is required."]})
    );
}

#[tokio::test]
async fn suppressed_mapping_leaves_bare_status() {
    let config = ApiBehaviorConfig {
        suppress_map_client_errors: true,
        ..ApiBehaviorConfig::default()
    };
    let behavior = ApiBehavior::new(config.build_options().unwrap());
    let response = send(app(behavior), get_req("/missing")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
}

#[tokio::test]
async fn version_2_0_leaves_bare_status() {
    let response = send(
        app(behavior_for(CompatibilityVersion::Version2_0)),
        get_req("/missing"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn version_2_0_maps_when_problem_details_are_allowed() {
    let options = ApiBehaviorOptionsSetup::new(CompatibilityVersion::Version2_0)
        .build(|o| o.set_allow_use_problem_details_for_client_error_responses(true));
    let response = send(app(ApiBehavior::new(options)), get_req("/missing")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), "application/problem+json");
    assert_eq!(body_json(response).await["title"], "Not Found");
}

#[tokio::test]
async fn configured_client_error_mapping_is_used() {
    let config: ApiBehaviorConfig = serde_json::from_value(json!({
        "client_errors": {
            "418": { "title": "Short and stout", "link": "https://example.com/teapot" }
        }
    }))
    .unwrap();
    let behavior = ApiBehavior::new(config.build_options().unwrap());
    let response = send(app(behavior), get_req("/teapot")).await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Short and stout");
    assert_eq!(body["type"], "https://example.com/teapot");
}

/// Turns any bare status into a problem; not always-run.
struct CatchAll;

impl ResultFilter for CatchAll {
    fn on_result_executing(&self, ctx: &mut ResultExecutingContext<'_>) {
        if let ActionOutcome::Status(status) = ctx.result {
            ctx.result = ObjectResult::new(status, Problem::new(status, "caught")).into();
        }
    }
}

#[tokio::test]
async fn server_errors_only_run_always_run_filters() {
    let behavior =
        behavior_for(CompatibilityVersion::Latest).with_filter(Arc::new(CatchAll));

    let response = send(app(behavior.clone()), get_req("/crash")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());

    let response = send(app(behavior), get_req("/teapot")).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_json(response).await["title"], "caught");
}

/// Cancels the remaining filters; runs before the problem details filter.
struct Cancel;

impl ResultFilter for Cancel {
    fn order(&self) -> i32 {
        -2000
    }

    fn on_result_executing(&self, ctx: &mut ResultExecutingContext<'_>) {
        ctx.cancel = true;
    }
}

#[tokio::test]
async fn canceled_pipeline_writes_status_only() {
    let behavior = behavior_for(CompatibilityVersion::Latest)
        .with_filter(Arc::new(Cancel))
        .with_filter(Arc::new(CatchAll));
    let response = send(app(behavior), get_req("/teapot")).await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn api_context_without_middleware_is_rejected() {
    let app = Router::new().route("/items", post(create));
    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), "application/problem+json");
}
